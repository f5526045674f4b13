mod common;

use anyhow::Result;

use mediconnect::api::models::ImageUpload;
use mediconnect::pages::auth::{AdminLoginPage, LoginPage, RegisterPage, ADMIN_ONLY_MESSAGE};
use mediconnect::routing::{RedirectReason, ADMIN_LOGIN_PATH, LOGIN_PATH};
use mediconnect::types::Role;
use mediconnect::validation::{LoginForm, RegistrationForm};
use mediconnect::{ClientError, Navigation, Router, SessionContext};

use common::{multipart_field, MockBackend, PASSWORD};

fn registration(email: &str, role: Role) -> RegistrationForm {
    RegistrationForm {
        name: "  Pat Patient ".into(),
        email: email.into(),
        password: "Str0ng!pass".into(),
        confirm_password: "Str0ng!pass".into(),
        role,
        image: Some(ImageUpload {
            file_name: "me.png".into(),
            content_type: "image/png".into(),
            bytes: vec![0x89, b'P', b'N', b'G'],
        }),
    }
}

#[tokio::test]
async fn login_stores_session_and_lands_on_role_home() -> Result<()> {
    let backend = MockBackend::start().await?;
    let session = SessionContext::in_memory();
    let api = backend.client(session.clone());

    for (email, role) in [
        ("admin@clinic.test", Role::Admin),
        ("doctor@clinic.test", Role::Doctor),
        ("patient@clinic.test", Role::Patient),
    ] {
        let navigation = LoginPage.submit(&api, &LoginForm::new(email, PASSWORD)).await?;
        assert_eq!(
            navigation,
            Navigation::Redirect {
                to: role.home_path().to_string(),
                reason: RedirectReason::LoggedIn { role },
            }
        );
        assert_eq!(session.current().map(|s| s.role()), Some(role));

        // The stored session now opens the role's partition
        let router = Router::new(session.clone());
        assert!(matches!(router.navigate(role.home_path()), Navigation::Render { .. }));
    }
    Ok(())
}

#[tokio::test]
async fn invalid_login_form_never_reaches_the_backend() -> Result<()> {
    let backend = MockBackend::start().await?;
    let api = backend.client(SessionContext::in_memory());

    let err = LoginPage
        .submit(&api, &LoginForm::new("not-an-email", "123"))
        .await
        .expect_err("invalid form");
    let fields = err.field_errors().expect("field errors");
    assert!(fields.contains_key("email"));
    assert!(fields.contains_key("password"));
    assert!(backend.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn rejected_credentials_store_nothing() -> Result<()> {
    let backend = MockBackend::start().await?;
    let session = SessionContext::in_memory();
    let api = backend.client(session.clone());

    let err = LoginPage
        .submit(&api, &LoginForm::new("patient@clinic.test", "wrong-password"))
        .await
        .expect_err("bad password");
    match err {
        ClientError::Unauthorized(message) => {
            assert_eq!(message, "No active account found with the given credentials")
        }
        other => panic!("expected unauthorized, got {:?}", other),
    }
    assert!(session.current().is_none());
    Ok(())
}

#[tokio::test]
async fn empty_access_token_is_a_failed_login() -> Result<()> {
    let backend = MockBackend::start().await?;
    let session = SessionContext::in_memory();
    let api = backend.client(session.clone());

    let err = LoginPage
        .submit(&api, &LoginForm::new("blank@clinic.test", PASSWORD))
        .await
        .expect_err("blank token");
    assert!(err.is_auth_failure());
    assert!(!session.is_authenticated());
    Ok(())
}

#[tokio::test]
async fn registration_posts_multipart_and_returns_to_login() -> Result<()> {
    let backend = MockBackend::start().await?;
    let api = backend.client(SessionContext::in_memory());

    let navigation = RegisterPage
        .submit(&api, &registration("new@clinic.test", Role::Doctor))
        .await?;
    assert!(navigation.is_redirect_to(LOGIN_PATH));

    let sent = backend.requests_to("POST", "/api/accounts/register/");
    assert_eq!(sent.len(), 1);
    assert_eq!(multipart_field(&sent[0].body, "name").as_deref(), Some("Pat Patient"));
    assert_eq!(multipart_field(&sent[0].body, "role").as_deref(), Some("Doctor"));
    assert!(sent[0].body.contains("filename=\"me.png\""));
    Ok(())
}

#[tokio::test]
async fn duplicate_email_reports_backend_message() -> Result<()> {
    let backend = MockBackend::start().await?;
    let api = backend.client(SessionContext::in_memory());

    let err = RegisterPage
        .submit(&api, &registration("taken@clinic.test", Role::Patient))
        .await
        .expect_err("duplicate");
    match err {
        ClientError::Status { status, message } => {
            assert_eq!(status, 400);
            assert_eq!(message, "user with this email already exists.");
        }
        other => panic!("expected status error, got {:?}", other),
    }
    Ok(())
}

#[tokio::test]
async fn admin_cannot_self_register() -> Result<()> {
    let backend = MockBackend::start().await?;
    let api = backend.client(SessionContext::in_memory());

    let mut form = registration("boss@clinic.test", Role::Admin);
    form.confirm_password = "different".into();
    let err = RegisterPage.submit(&api, &form).await.expect_err("invalid");
    let fields = err.field_errors().expect("field errors");
    assert!(fields.contains_key("role"));
    assert!(fields.contains_key("confirm_password"));
    assert!(backend.requests().is_empty());
    Ok(())
}

#[tokio::test]
async fn admin_login_refuses_other_roles_without_storing() -> Result<()> {
    let backend = MockBackend::start().await?;
    let session = SessionContext::in_memory();
    let api = backend.client(session.clone());

    // Reachable while logged out
    let router = Router::new(session.clone());
    assert!(matches!(router.navigate(ADMIN_LOGIN_PATH), Navigation::Render { session: None, .. }));

    let err = AdminLoginPage
        .submit(&api, &LoginForm::new("doctor@clinic.test", PASSWORD))
        .await
        .expect_err("doctor refused");
    match err {
        ClientError::Unauthorized(message) => assert_eq!(message, ADMIN_ONLY_MESSAGE),
        other => panic!("expected unauthorized, got {:?}", other),
    }
    assert!(session.current().is_none());

    let navigation = AdminLoginPage
        .submit(&api, &LoginForm::new("admin@clinic.test", PASSWORD))
        .await?;
    assert!(navigation.is_redirect_to("/admin/dashboard"));
    assert_eq!(session.current().map(|s| s.role()), Some(Role::Admin));
    Ok(())
}
