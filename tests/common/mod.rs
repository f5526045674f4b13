#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use axum::body::{Body, Bytes};
use axum::extract::{Path, Query, Request, State};
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, patch, post, put};
use axum::{Json, Router};
use serde_json::{json, Value};

use mediconnect::session::{Session, SessionUser};
use mediconnect::types::{RecordId, Role};
use mediconnect::{ApiClient, SessionContext};

/// Password the mock accepts for every account
pub const PASSWORD: &str = "secret123";

#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub auth: Option<String>,
    pub body: String,
}

impl Recorded {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or(Value::Null)
    }
}

pub struct MockState {
    pub base_url: String,
    pub users: Vec<Value>,
    pub doctors: Vec<Value>,
    pub doctor_page_size: usize,
    /// Serve doctors as one bare array instead of pages
    pub doctors_as_bare_array: bool,
    /// Every page's `next` points back at page 1
    pub doctors_next_loops: bool,
    /// Host that page links point at instead of this backend
    pub doctors_next_host: Option<String>,
    pub specialties: Vec<Value>,
    pub appointments: Vec<Value>,
    pub availability: HashMap<String, Value>,
    pub my_availability: Value,
    pub doctor_profile: Value,
    pub patient_profile: Value,
    pub requests: Vec<Recorded>,
    next_id: i64,
}

pub type Shared = Arc<Mutex<MockState>>;

impl MockState {
    fn seeded(base_url: String) -> Self {
        let mut availability = HashMap::new();
        availability.insert(
            "10".to_string(),
            json!({"monday": ["09:00-10:00", "10:00-11:00"], "wednesday": ["14:00-15:00"]}),
        );
        availability.insert("11".to_string(), json!({}));

        Self {
            base_url,
            users: vec![
                json!({"id": 1, "name": "Admin User", "email": "admin@clinic.test", "role": "Admin"}),
                json!({"id": 2, "name": "Pat Patient", "email": "patient@clinic.test", "role": "Patient"}),
                json!({"id": 3, "name": "Gregory House", "email": "doctor@clinic.test", "role": "Doctor"}),
            ],
            doctors: vec![
                json!({"id": 10, "name": "Gregory House", "email": "house@clinic.test", "specialty": "Diagnostics"}),
                json!({"id": 11, "name": "Lisa Cuddy", "username": "cuddy", "email": "cuddy@clinic.test", "specialty": "Endocrinology"}),
                json!({"id": 12, "name": "James Wilson", "email": "wilson@clinic.test", "specialty": "Oncology"}),
                json!({"id": 13, "name": "Eric Foreman", "email": "foreman@clinic.test", "specialty": "Diagnostics"}),
                json!({"id": 14, "name": "Allison Cameron", "email": "cameron@clinic.test", "specialty": "Immunology"}),
            ],
            doctor_page_size: 3,
            doctors_as_bare_array: false,
            doctors_next_loops: false,
            doctors_next_host: None,
            specialties: vec![
                json!({"id": 1, "name": "Diagnostics"}),
                json!({"id": 2, "name": "Endocrinology"}),
                json!({"id": 3, "name": "Oncology"}),
                json!({"id": 4, "name": "Immunology"}),
            ],
            appointments: vec![
                json!({"id": 100, "doctor": 10, "patient": {"id": 2, "name": "Pat Patient"},
                       "date": "2030-01-07", "time": "09:00:00", "status": "pending"}),
                json!({"id": 101, "doctor": {"id": 11, "username": "cuddy"}, "patient": 2,
                       "date": "2030-01-08", "time": "10:00:00", "status": "confirmed"}),
                json!({"id": 102, "doctor": 99, "patient": 2,
                       "date": "2029-12-01", "time": "11:00:00", "status": "cancelled"}),
            ],
            availability,
            my_availability: json!({"monday": ["09:00-10:00"], "friday": ["13:00-14:00"]}),
            doctor_profile: json!({"id": 10, "name": "Gregory House", "email": "doctor@clinic.test",
                                   "specialty": "Diagnostics", "bio": "Diagnostician"}),
            patient_profile: json!({"name": "Pat Patient", "email": "patient@clinic.test", "phone": "555-0100"}),
            requests: Vec::new(),
            next_id: 1000,
        }
    }

    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

/// In-process stand-in for the clinic REST backend
pub struct MockBackend {
    pub base_url: String,
    pub state: Shared,
}

impl MockBackend {
    pub async fn start() -> Result<Self> {
        init_tracing();

        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);
        let state: Shared = Arc::new(Mutex::new(MockState::seeded(base_url.clone())));

        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .context("failed to bind mock backend")?;
        let app = router(state.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self { base_url, state })
    }

    pub fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap()
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.state().requests.clone()
    }

    pub fn requests_to(&self, method: &str, path: &str) -> Vec<Recorded> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Requests other than reads
    pub fn writes(&self) -> Vec<Recorded> {
        self.requests().into_iter().filter(|r| r.method != "GET").collect()
    }

    pub fn client(&self, session: SessionContext) -> ApiClient {
        ApiClient::new(&self.base_url, session).expect("client")
    }

    pub fn client_as(&self, role: Role) -> ApiClient {
        self.client(session_as(role))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// An in-memory session holding the token the mock accepts for `role`
pub fn session_as(role: Role) -> SessionContext {
    let session = SessionContext::in_memory();
    session
        .establish(&Session {
            token: format!("token-{}", role.as_str().to_lowercase()),
            user: SessionUser {
                id: Some(RecordId::Int(1)),
                email: format!("{}@clinic.test", role.as_str().to_lowercase()),
                role,
                name: format!("{} User", role),
                image: None,
            },
        })
        .expect("establish session");
    session
}

fn error(status: StatusCode, body: Value) -> Response {
    (status, Json(body)).into_response()
}

fn not_found() -> Response {
    error(StatusCode::NOT_FOUND, json!({"detail": "Not found."}))
}

fn same_id(value: &Value, id: &str) -> bool {
    match &value["id"] {
        Value::Number(n) => n.to_string() == id,
        Value::String(s) => s == id,
        _ => false,
    }
}

/// Pull a text field out of a multipart body
pub fn multipart_field(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"", name);
    let start = body.find(&marker)? + marker.len();
    let rest = &body[start..];
    let value_start = rest.find("\r\n\r\n")? + 4;
    let rest = &rest[value_start..];
    let end = rest.find("\r\n")?;
    Some(rest[..end].to_string())
}

/// The `filename` given for a multipart file field
pub fn multipart_file_name(body: &str, name: &str) -> Option<String> {
    let marker = format!("name=\"{}\"; filename=\"", name);
    let start = body.find(&marker)? + marker.len();
    let rest = &body[start..];
    Some(rest[..rest.find('"')?].to_string())
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap_or_default();
    let auth = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let path = parts.uri.path().to_string();
    {
        let mut st = state.lock().unwrap();
        st.requests.push(Recorded {
            method: parts.method.to_string(),
            path: path.clone(),
            query: parts.uri.query().map(str::to_string),
            auth: auth.clone(),
            body: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    let public = path == "/api/accounts/login/" || path == "/api/accounts/register/";
    let authorized = auth.as_deref().map_or(false, |a| a.starts_with("Bearer token-"));
    if !public && !authorized {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "Authentication credentials were not provided."}),
        );
    }
    next.run(Request::from_parts(parts, Body::from(bytes))).await
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/accounts/login/", post(login))
        .route("/api/accounts/register/", post(register))
        .route("/api/accounts/users/", get(list_users))
        .route("/api/accounts/users/:id/", delete(delete_user))
        .route("/api/accounts/doctors", get(list_doctors).post(create_doctor))
        .route("/api/accounts/doctors/:id", put(update_doctor).delete(delete_doctor))
        .route("/api/accounts/specialtiesData/", get(list_specialties).post(create_specialty))
        .route(
            "/api/accounts/specialtiesData/:id/",
            put(rename_specialty).delete(delete_specialty),
        )
        .route("/api/appointments/", get(all_appointments))
        .route("/api/doctors/my_profile/", get(get_doctor_profile).patch(patch_doctor_profile))
        .route("/api/doctors/appointments/", get(doctor_appointments))
        .route("/api/doctors/appointments/:id/", patch(update_doctor_appointment))
        .route("/api/doctors/availability/", get(get_my_availability).put(put_my_availability))
        .route("/api/doctors/availability/:day/", delete(delete_my_availability_day))
        .route("/api/doctors/:id/availability/", get(doctor_availability))
        .route("/api/patients/profile/", get(get_patient_profile).patch(patch_patient_profile))
        .route("/api/patients/appointments/", get(patient_appointments).post(book))
        .route("/api/patients/appointments/:id/", get(patient_appointment).put(reschedule))
        .route("/api/patients/appointments/:id/cancel/", post(cancel))
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

async fn login(Json(body): Json<Value>) -> Response {
    let email = body["email"].as_str().unwrap_or_default().to_string();
    if body["password"].as_str() != Some(PASSWORD) {
        return error(
            StatusCode::UNAUTHORIZED,
            json!({"detail": "No active account found with the given credentials"}),
        );
    }
    let role = if email.starts_with("admin") {
        "Admin"
    } else if email.starts_with("doctor") {
        "Doctor"
    } else {
        "Patient"
    };
    let access = if email.starts_with("blank") {
        String::new()
    } else {
        format!("token-{}", role.to_lowercase())
    };
    Json(json!({
        "access": access,
        "refresh": "refresh-token",
        "user": {"id": 1, "email": email, "role": role, "name": format!("{} User", role)}
    }))
    .into_response()
}

async fn register(State(state): State<Shared>, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body).into_owned();
    let email = multipart_field(&body, "email").unwrap_or_default();
    if email == "taken@clinic.test" {
        return error(
            StatusCode::BAD_REQUEST,
            json!({"email": ["user with this email already exists."]}),
        );
    }
    let mut st = state.lock().unwrap();
    let id = st.next_id();
    let user = json!({
        "id": id,
        "name": multipart_field(&body, "name").unwrap_or_default(),
        "email": email,
        "role": multipart_field(&body, "role").unwrap_or_default(),
    });
    st.users.push(user.clone());
    (StatusCode::CREATED, Json(user)).into_response()
}

async fn list_users(State(state): State<Shared>) -> Response {
    Json(Value::Array(state.lock().unwrap().users.clone())).into_response()
}

async fn delete_user(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut st = state.lock().unwrap();
    let before = st.users.len();
    st.users.retain(|u| !same_id(u, &id));
    if st.users.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_doctors(State(state): State<Shared>, Query(query): Query<HashMap<String, String>>) -> Response {
    let st = state.lock().unwrap();
    if st.doctors_as_bare_array {
        return Json(Value::Array(st.doctors.clone())).into_response();
    }
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1).max(1);
    let size = st.doctor_page_size;
    let start = (page - 1) * size;
    let results: Vec<Value> = st.doctors.iter().skip(start).take(size).cloned().collect();
    let host = st.doctors_next_host.as_deref().unwrap_or(&st.base_url);
    let next = if st.doctors_next_loops {
        json!(format!("{}/api/accounts/doctors?page=1", host))
    } else if start + size < st.doctors.len() {
        json!(format!("{}/api/accounts/doctors?page={}", host, page + 1))
    } else {
        Value::Null
    };
    Json(json!({"count": st.doctors.len(), "next": next, "results": results})).into_response()
}

fn doctor_from_multipart(body: &str, id: Value) -> Value {
    json!({
        "id": id,
        "name": multipart_field(body, "name").unwrap_or_default(),
        "email": multipart_field(body, "email").unwrap_or_default(),
        "specialty": multipart_field(body, "specialty").unwrap_or_default(),
        "role": multipart_field(body, "role").unwrap_or_default(),
    })
}

async fn create_doctor(State(state): State<Shared>, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body).into_owned();
    let mut st = state.lock().unwrap();
    let id = st.next_id();
    let doctor = doctor_from_multipart(&body, json!(id));
    st.doctors.push(doctor.clone());
    (StatusCode::CREATED, Json(doctor)).into_response()
}

async fn update_doctor(State(state): State<Shared>, Path(id): Path<String>, body: Bytes) -> Response {
    let body = String::from_utf8_lossy(&body).into_owned();
    let mut st = state.lock().unwrap();
    let Some(existing) = st.doctors.iter_mut().find(|d| same_id(d, &id)) else {
        return not_found();
    };
    let updated = doctor_from_multipart(&body, existing["id"].clone());
    merge(existing, &updated);
    Json(existing.clone()).into_response()
}

async fn delete_doctor(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut st = state.lock().unwrap();
    st.doctors.retain(|d| !same_id(d, &id));
    StatusCode::NO_CONTENT.into_response()
}

async fn list_specialties(State(state): State<Shared>) -> Response {
    Json(json!({"results": state.lock().unwrap().specialties.clone(), "next": null})).into_response()
}

async fn create_specialty(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut st = state.lock().unwrap();
    let id = st.next_id();
    let specialty = json!({"id": id, "name": body["name"].clone()});
    st.specialties.push(specialty.clone());
    (StatusCode::CREATED, Json(specialty)).into_response()
}

async fn rename_specialty(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = state.lock().unwrap();
    let Some(existing) = st.specialties.iter_mut().find(|s| same_id(s, &id)) else {
        return not_found();
    };
    existing["name"] = body["name"].clone();
    Json(existing.clone()).into_response()
}

async fn delete_specialty(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    state.lock().unwrap().specialties.retain(|s| !same_id(s, &id));
    StatusCode::NO_CONTENT.into_response()
}

async fn all_appointments(State(state): State<Shared>) -> Response {
    Json(json!({"results": state.lock().unwrap().appointments.clone(), "next": null})).into_response()
}

async fn get_doctor_profile(State(state): State<Shared>) -> Response {
    Json(state.lock().unwrap().doctor_profile.clone()).into_response()
}

/// JSON patches merge fields; a multipart body carries a new image
async fn patch_doctor_profile(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    let multipart = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("multipart/form-data"));
    let patch = if multipart {
        let body = String::from_utf8_lossy(&body);
        let Some(file_name) = multipart_file_name(&body, "image") else {
            return error(StatusCode::BAD_REQUEST, json!({"image": ["No file was submitted."]}));
        };
        json!({ "image": format!("/media/doctors/{}", file_name) })
    } else {
        match serde_json::from_slice(&body) {
            Ok(patch) => patch,
            Err(_) => return error(StatusCode::BAD_REQUEST, json!({"detail": "JSON parse error"})),
        }
    };
    let mut st = state.lock().unwrap();
    merge(&mut st.doctor_profile, &patch);
    Json(st.doctor_profile.clone()).into_response()
}

async fn doctor_appointments(State(state): State<Shared>) -> Response {
    Json(json!({"results": state.lock().unwrap().appointments.clone(), "next": null})).into_response()
}

async fn update_doctor_appointment(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    let mut st = state.lock().unwrap();
    let Some(existing) = st.appointments.iter_mut().find(|a| same_id(a, &id)) else {
        return not_found();
    };
    merge(existing, &body);
    Json(existing.clone()).into_response()
}

async fn get_my_availability(State(state): State<Shared>) -> Response {
    Json(state.lock().unwrap().my_availability.clone()).into_response()
}

async fn put_my_availability(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut st = state.lock().unwrap();
    st.my_availability = body.clone();
    Json(body).into_response()
}

async fn delete_my_availability_day(State(state): State<Shared>, Path(day): Path<String>) -> Response {
    let mut st = state.lock().unwrap();
    if let Some(days) = st.my_availability.as_object_mut() {
        days.remove(&day);
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn doctor_availability(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    match state.lock().unwrap().availability.get(&id) {
        Some(availability) => Json(availability.clone()).into_response(),
        None => not_found(),
    }
}

async fn get_patient_profile(State(state): State<Shared>) -> Response {
    Json(state.lock().unwrap().patient_profile.clone()).into_response()
}

async fn patch_patient_profile(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let mut st = state.lock().unwrap();
    merge(&mut st.patient_profile, &body);
    Json(json!({})).into_response()
}

async fn patient_appointments(State(state): State<Shared>) -> Response {
    Json(Value::Array(state.lock().unwrap().appointments.clone())).into_response()
}

async fn patient_appointment(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let st = state.lock().unwrap();
    match st.appointments.iter().find(|a| same_id(a, &id)) {
        Some(appointment) => Json(appointment.clone()).into_response(),
        None => not_found(),
    }
}

fn booking_errors(body: &Value) -> Option<Response> {
    let mut errors = BTreeMap::new();
    for field in ["doctor_id", "date", "time"] {
        if body[field].is_null() {
            errors.insert(field, json!(["This field is required."]));
        }
    }
    if errors.is_empty() {
        None
    } else {
        Some(error(StatusCode::BAD_REQUEST, json!(errors)))
    }
}

async fn book(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    if let Some(response) = booking_errors(&body) {
        return response;
    }
    let mut st = state.lock().unwrap();
    let id = st.next_id();
    let appointment = json!({
        "id": id,
        "doctor": body["doctor_id"].clone(),
        "patient": 2,
        "date": body["date"].clone(),
        "time": body["time"].clone(),
        "status": "pending",
    });
    st.appointments.push(appointment.clone());
    (StatusCode::CREATED, Json(appointment)).into_response()
}

async fn reschedule(
    State(state): State<Shared>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(response) = booking_errors(&body) {
        return response;
    }
    let mut st = state.lock().unwrap();
    let Some(existing) = st.appointments.iter_mut().find(|a| same_id(a, &id)) else {
        return not_found();
    };
    existing["doctor"] = body["doctor_id"].clone();
    existing["date"] = body["date"].clone();
    existing["time"] = body["time"].clone();
    Json(existing.clone()).into_response()
}

async fn cancel(State(state): State<Shared>, Path(id): Path<String>) -> Response {
    let mut st = state.lock().unwrap();
    let Some(existing) = st.appointments.iter_mut().find(|a| same_id(a, &id)) else {
        return not_found();
    };
    existing["status"] = json!("cancelled");
    Json(json!({"status": "cancelled"})).into_response()
}
