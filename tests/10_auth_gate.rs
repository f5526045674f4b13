use std::sync::Arc;

use anyhow::Result;

use mediconnect::routing::{AdminPage, DoctorPage, PatientPage, RedirectReason, LOGIN_PATH};
use mediconnect::session::FileSessionStore;
use mediconnect::types::{RecordId, Role};
use mediconnect::{Navigation, Route, Router, SessionContext};

fn router_over(dir: &tempfile::TempDir, content: Option<&str>) -> Result<Router> {
    let path = dir.path().join("session.json");
    if let Some(content) = content {
        std::fs::write(&path, content)?;
    }
    let session = SessionContext::new(Arc::new(FileSessionStore::new(path)));
    Ok(Router::new(session))
}

fn session_file(role: &str) -> String {
    let user = format!(r#"{{"role":"{}","email":"someone@clinic.test"}}"#, role);
    serde_json::json!({ "token": "t-1", "user": user }).to_string()
}

#[test]
fn no_session_redirects_every_protected_partition() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let router = router_over(&dir, None)?;

    for path in ["/admin/users", "/doctor/availability", "/patient/booking?doctor=3"] {
        match router.navigate(path) {
            Navigation::Redirect { to, reason } => {
                assert_eq!(to, LOGIN_PATH);
                assert_eq!(reason, RedirectReason::NoSession);
            }
            other => panic!("{} should redirect, got {:?}", path, other),
        }
    }
    Ok(())
}

#[test]
fn wrong_role_is_sent_to_login() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let router = router_over(&dir, Some(&session_file("Doctor")))?;

    assert!(router.navigate("/patient/dashboard").is_redirect_to(LOGIN_PATH));
    assert!(router.navigate("/admin/dashboard").is_redirect_to(LOGIN_PATH));

    match router.navigate("/doctor/dashboard") {
        Navigation::Render { route, session } => {
            assert_eq!(route, Route::Doctor(DoctorPage::Dashboard));
            assert_eq!(session.map(|s| s.role()), Some(Role::Doctor));
        }
        other => panic!("doctor should enter own partition, got {:?}", other),
    }
    Ok(())
}

#[test]
fn corrupt_user_record_counts_as_logged_out() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let content = serde_json::json!({ "token": "t-1", "user": "{not json" }).to_string();
    let router = router_over(&dir, Some(&content))?;

    match router.navigate("/admin/doctors") {
        Navigation::Redirect { reason, .. } => assert_eq!(reason, RedirectReason::NoSession),
        other => panic!("expected redirect, got {:?}", other),
    }
    Ok(())
}

#[test]
fn unreadable_session_file_counts_as_logged_out() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let router = router_over(&dir, Some("this is not a session file"))?;
    assert!(router.navigate("/patient/profile").is_redirect_to(LOGIN_PATH));
    Ok(())
}

#[test]
fn each_role_enters_only_its_own_partition() -> Result<()> {
    let partitions = [
        (Role::Admin, "/admin/appointments"),
        (Role::Doctor, "/doctor/profile"),
        (Role::Patient, "/patient/search"),
    ];

    for role in Role::ALL {
        let dir = tempfile::tempdir()?;
        let router = router_over(&dir, Some(&session_file(role.as_str())))?;
        for (owner, path) in partitions {
            let rendered = matches!(router.navigate(path), Navigation::Render { .. });
            assert_eq!(rendered, owner == role, "{} visiting {}", role, path);
        }
    }
    Ok(())
}

#[test]
fn public_and_fallback_routes() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let router = router_over(&dir, None)?;

    assert!(matches!(
        router.navigate("/"),
        Navigation::Redirect { reason: RedirectReason::Root, .. }
    ));
    assert!(matches!(router.navigate("/auth/register"), Navigation::Render { session: None, .. }));

    match router.navigate("/billing/invoices") {
        Navigation::Render { route, .. } => assert!(route.is_not_found()),
        other => panic!("unknown path should render not-found, got {:?}", other),
    }
    Ok(())
}

#[test]
fn unknown_page_inside_partition_is_still_gated() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let anonymous = router_over(&dir, None)?;
    assert!(anonymous.navigate("/admin/reports").is_redirect_to(LOGIN_PATH));

    let dir = tempfile::tempdir()?;
    let admin = router_over(&dir, Some(&session_file("Admin")))?;
    match admin.navigate("/admin/reports") {
        Navigation::Render { route, .. } => {
            assert_eq!(route, Route::Admin(AdminPage::NotFound("reports".into())));
        }
        other => panic!("expected not-found render, got {:?}", other),
    }
    Ok(())
}

#[test]
fn booking_query_survives_the_gate() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let router = router_over(&dir, Some(&session_file("Patient")))?;

    match router.navigate("/patient/booking?doctor=7&id=12&reschedule=true") {
        Navigation::Render {
            route: Route::Patient(PatientPage::Booking(query)),
            ..
        } => {
            assert_eq!(query.doctor, Some(RecordId::Int(7)));
            assert_eq!(query.rescheduling(), Some(&RecordId::Int(12)));
        }
        other => panic!("expected booking render, got {:?}", other),
    }
    Ok(())
}
