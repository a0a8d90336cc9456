#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use agenda_client::{
    ClientConfig, Collaborators, Confirmer, GeoPicker, GeolocationError, HeadlessMap,
    LocationProvider, Notifier, RecordManager, Severity,
};
use agenda_net::{GeocodeError, ReverseGeocoder};
use agenda_shared::Coordinates;

pub const TOKEN: &str = "test-csrf-token";

#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub body: Option<Value>,
}

#[derive(Default)]
pub struct MockState {
    pub records: Vec<Value>,
    pub next_id: u64,
    pub requests: Vec<Seen>,
    pub delay: Duration,
    pub fail_next: Option<(StatusCode, Value)>,
}

type Shared = Arc<Mutex<MockState>>;

/// In-process REST backend for `/records/` and `/participants/`.
pub struct Backend {
    pub addr: SocketAddr,
    pub state: Shared,
}

impl Backend {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState {
            next_id: 42,
            ..MockState::default()
        }));

        let app = Router::new()
            .route("/records/", get(list).post(create))
            .route("/records/:id/", get(fetch).put(update).delete(destroy))
            .route("/participants/", get(participants))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn seed(&self, id: u64, title: &str) {
        self.seed_at(id, title, Coordinates::new(-1.4558, -48.5039));
    }

    pub fn seed_at(&self, id: u64, title: &str, at: Coordinates) {
        let mut state = self.state.lock().unwrap();
        state.records.push(json!({
            "id": id,
            "title": title,
            "description": "Seeded",
            "start_at": "2024-03-01T12:00:00Z",
            "end_at": "2024-03-01T13:00:00Z",
            "location": "Hall A",
            "coordinates": {"lat": at.lat, "lng": at.lng},
            "tags": ["clima"],
            "flagged": true,
            "participants": [1, 2]
        }));
        state.next_id = state.next_id.max(id + 1);
    }

    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn fail_next(&self, status: StatusCode, body: Value) {
        self.state.lock().unwrap().fail_next = Some((status, body));
    }

    pub fn requests(&self, method: &str) -> Vec<Seen> {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|r| r.method == method)
            .cloned()
            .collect()
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

async fn intercept(
    shared: &Shared,
    method: &str,
    path: String,
    headers: &HeaderMap,
    body: Option<Value>,
) -> Option<Response> {
    let (delay, failure) = {
        let mut state = shared.lock().unwrap();
        state.requests.push(Seen {
            method: method.to_string(),
            path,
            body,
        });
        (state.delay, state.fail_next.take())
    };

    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let token = headers.get("x-csrftoken").and_then(|v| v.to_str().ok());
    if method != "GET" && token != Some(TOKEN) {
        return Some((StatusCode::FORBIDDEN, Json(json!({"detail": "CSRF Failed"}))).into_response());
    }

    failure.map(|(status, body)| (status, Json(body)).into_response())
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({"detail": "Not found."}))).into_response()
}

async fn list(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(r) = intercept(&shared, "GET", "/records/".into(), &headers, None).await {
        return r;
    }
    let records = shared.lock().unwrap().records.clone();
    Json(Value::Array(records)).into_response()
}

async fn create(State(shared): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if let Some(r) = intercept(&shared, "POST", "/records/".into(), &headers, Some(body.clone())).await {
        return r;
    }
    let mut state = shared.lock().unwrap();
    let mut record = body;
    record["id"] = json!(state.next_id);
    state.next_id += 1;
    state.records.push(record.clone());
    (StatusCode::CREATED, Json(record)).into_response()
}

async fn fetch(State(shared): State<Shared>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    if let Some(r) = intercept(&shared, "GET", format!("/records/{id}/"), &headers, None).await {
        return r;
    }
    let state = shared.lock().unwrap();
    match state.records.iter().find(|r| r["id"] == json!(id)) {
        Some(record) => Json(record.clone()).into_response(),
        None => not_found(),
    }
}

async fn update(
    State(shared): State<Shared>,
    Path(id): Path<u64>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if let Some(r) = intercept(&shared, "PUT", format!("/records/{id}/"), &headers, Some(body.clone())).await {
        return r;
    }
    let mut state = shared.lock().unwrap();
    match state.records.iter_mut().find(|r| r["id"] == json!(id)) {
        Some(slot) => {
            let mut record = body;
            record["id"] = json!(id);
            *slot = record.clone();
            Json(record).into_response()
        }
        None => not_found(),
    }
}

async fn destroy(State(shared): State<Shared>, Path(id): Path<u64>, headers: HeaderMap) -> Response {
    if let Some(r) = intercept(&shared, "DELETE", format!("/records/{id}/"), &headers, None).await {
        return r;
    }
    let mut state = shared.lock().unwrap();
    let before = state.records.len();
    state.records.retain(|r| r["id"] != json!(id));
    if state.records.len() == before {
        return not_found();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn participants(State(shared): State<Shared>, headers: HeaderMap) -> Response {
    if let Some(r) = intercept(&shared, "GET", "/participants/".into(), &headers, None).await {
        return r;
    }
    Json(json!([{"id": 1, "name": "Ana Souza"}, {"id": 2, "name": "Bruno Lima"}])).into_response()
}

// ---------------------------------------------------------------------------
// Presentation fakes
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingNotifier {
    pub shown: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    pub fn last(&self) -> Option<(String, Severity)> {
        self.shown.lock().unwrap().last().cloned()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.shown
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, s)| *s == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn show(&self, message: &str, severity: Severity) {
        self.shown.lock().unwrap().push((message.to_string(), severity));
    }
}

pub struct ScriptedConfirmer {
    pub answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

#[async_trait]
impl Confirmer for ScriptedConfirmer {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.answer
    }
}

pub struct FixedGeocoder {
    pub reply: Result<String, GeocodeError>,
    pub calls: AtomicUsize,
}

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn reverse(&self, _at: Coordinates) -> Result<String, GeocodeError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.reply.clone()
    }
}

pub struct FixedLocator(pub Result<Coordinates, GeolocationError>);

#[async_trait]
impl LocationProvider for FixedLocator {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        self.0
    }
}

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

pub struct Harness {
    pub backend: Backend,
    pub manager: RecordManager,
    pub notifier: Arc<RecordingNotifier>,
    pub confirmer: Arc<ScriptedConfirmer>,
    pub geocoder: Arc<FixedGeocoder>,
}

pub struct Options {
    pub confirm: bool,
    pub with_cookie: bool,
    pub geocode: Result<String, GeocodeError>,
    pub locate: Result<Coordinates, GeolocationError>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            confirm: true,
            with_cookie: true,
            geocode: Err(GeocodeError::NoAddress),
            locate: Err(GeolocationError::Unavailable),
        }
    }
}

pub async fn harness(options: Options) -> Harness {
    let backend = Backend::spawn().await;
    let config = ClientConfig {
        base_url: backend.url(),
        ..ClientConfig::default()
    };

    let api = config.records_api().unwrap();
    if options.with_cookie {
        api.gateway().set_cookie("csrftoken", TOKEN);
    }

    let geo = GeoPicker::init(
        "map",
        config.default_position,
        config.default_zoom,
        Box::new(HeadlessMap::default()),
    )
    .with_locator(Arc::new(FixedLocator(options.locate)), Duration::from_secs(1));

    let notifier = Arc::new(RecordingNotifier::default());
    let confirmer = Arc::new(ScriptedConfirmer {
        answer: options.confirm,
        prompts: Mutex::new(Vec::new()),
    });
    let geocoder = Arc::new(FixedGeocoder {
        reply: options.geocode,
        calls: AtomicUsize::new(0),
    });

    let manager = RecordManager::new(
        &config,
        api,
        geo,
        Collaborators {
            notifier: notifier.clone(),
            confirmer: confirmer.clone(),
            geocoder: Some(geocoder.clone() as Arc<dyn ReverseGeocoder>),
        },
    );

    Harness {
        backend,
        manager,
        notifier,
        confirmer,
        geocoder,
    }
}

/// Type a valid "Kickoff" event into the form.
pub fn fill_kickoff(manager: &RecordManager) {
    manager
        .update_form(|form| {
            form.title = "Kickoff".into();
            form.start_date = "2024-03-01".into();
            form.start_time = "09:00".into();
            form.end_date = "2024-03-01".into();
            form.end_time = "10:00".into();
            form.location = "Hall A".into();
        })
        .unwrap();
}
