//! In-process stand-in for the Dyn REST API, used by tests.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::config::{Credentials, Settings};
use crate::provider::types::{CnameRecordRequest, PublishRequest, SessionRequest};

pub const CUSTOMER: &str = "financialtimes";
pub const USER: &str = "georgeangel";
pub const PASSWORD: &str = "secret";

pub struct FakeState {
    /// Token handed out on login.
    pub token: String,
    /// Record paths that currently exist, in lookup order.
    pub records: Vec<String>,
    /// Answer login with a non-JSON 502.
    pub garbage_login: bool,
    /// Fail every create and update.
    pub reject_writes: bool,
    pub reject_publish: bool,
    /// `METHOD path` of every request, in arrival order.
    pub calls: Vec<String>,
    /// Record bodies written since the last publish, by record path.
    pub staged: HashMap<String, CnameRecordRequest>,
    /// Record bodies visible after publish, by record path.
    pub published: HashMap<String, CnameRecordRequest>,
    pub rejected_tokens: usize,
    /// Treat every session token as expired.
    pub expire_tokens: bool,
    /// Id handed to the next created record.
    pub next_id: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            token: "fake-session-token".to_string(),
            records: Vec::new(),
            garbage_login: false,
            reject_writes: false,
            reject_publish: false,
            calls: Vec::new(),
            staged: HashMap::new(),
            published: HashMap::new(),
            rejected_tokens: 0,
            expire_tokens: false,
            next_id: 1000,
        }
    }
}

type Shared = Arc<Mutex<FakeState>>;

pub struct FakeDyn {
    addr: SocketAddr,
    state: Shared,
}

impl FakeDyn {
    pub async fn start(state: FakeState) -> Self {
        let state = Arc::new(Mutex::new(state));
        let app = Router::new()
            .route("/REST/Session/", post(login))
            .route(
                "/REST/CNAMERecord/{zone}/{fqdn}/",
                get(lookup).post(create),
            )
            .route("/REST/CNAMERecord/{zone}/{fqdn}/{id}/", put(update))
            .route("/REST/Zone/{zone}/", put(publish))
            .with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn settings(&self, host: &str, fqdn: &str, zone: &str) -> Settings {
        let mut settings = Self::settings_for(&format!("http://{}", self.addr));
        settings.host = host.to_string();
        settings.fqdn = fqdn.to_string();
        settings.zone = zone.to_string();
        settings
    }

    /// Settings with the fake's credentials, pointed at `api_base`.
    pub fn settings_for(api_base: &str) -> Settings {
        Settings {
            credentials: Credentials {
                customer_name: CUSTOMER.to_string(),
                user_name: USER.to_string(),
                password: PASSWORD.to_string(),
            },
            host: "lb.aws.com".to_string(),
            fqdn: "www.ft.com".to_string(),
            zone: "ft.com".to_string(),
            api_base: api_base.to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap()
    }

    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }
}

fn success(data: Value) -> Response {
    (
        StatusCode::OK,
        Json(json!({"status": "success", "data": data, "msgs": []})),
    )
        .into_response()
}

fn failure(code: StatusCode, err_cd: &str, info: &str) -> Response {
    (
        code,
        Json(json!({
            "status": "failure",
            "data": {},
            "msgs": [{"INFO": info, "SOURCE": "BLL", "ERR_CD": err_cd, "LVL": "ERROR"}]
        })),
    )
        .into_response()
}

/// Records the call and checks the session token. Returns the rejection
/// response when the token is wrong.
fn enter(state: &mut FakeState, call: String, headers: &HeaderMap) -> Option<Response> {
    state.calls.push(call);
    let token = headers.get("Auth-Token").and_then(|v| v.to_str().ok());
    if state.expire_tokens || token != Some(state.token.as_str()) {
        state.rejected_tokens += 1;
        return Some(failure(
            StatusCode::BAD_REQUEST,
            "INVALID_DATA",
            "login: Bad or expired credentials",
        ));
    }
    None
}

async fn login(State(state): State<Shared>, Json(body): Json<SessionRequest>) -> Response {
    let mut state = state.lock().unwrap();
    state.calls.push("POST /REST/Session/".to_string());

    if state.garbage_login {
        return (StatusCode::BAD_GATEWAY, "Bad Gateway").into_response();
    }
    if body.customer_name != CUSTOMER || body.user_name != USER || body.password != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"status": "failure", "data": {}, "msgs": ["bad password"]})),
        )
            .into_response();
    }
    success(json!({"token": state.token, "version": "3.7.0"}))
}

async fn lookup(
    State(state): State<Shared>,
    Path((zone, fqdn)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    let mut state = state.lock().unwrap();
    let prefix = format!("/REST/CNAMERecord/{}/{}/", zone, fqdn);
    if let Some(rejection) = enter(&mut state, format!("GET {}", prefix), &headers) {
        return rejection;
    }

    let found: Vec<&String> = state
        .records
        .iter()
        .filter(|r| r.starts_with(&prefix))
        .collect();
    if found.is_empty() {
        return failure(
            StatusCode::NOT_FOUND,
            "NOT_FOUND",
            "node: Not in zone",
        );
    }
    success(json!(found))
}

async fn create(
    State(state): State<Shared>,
    Path((zone, fqdn)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<CnameRecordRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let prefix = format!("/REST/CNAMERecord/{}/{}/", zone, fqdn);
    if let Some(rejection) = enter(&mut state, format!("POST {}", prefix), &headers) {
        return rejection;
    }
    if state.reject_writes {
        return failure(StatusCode::BAD_REQUEST, "OPERATION_FAILED", "create: rejected");
    }

    state.next_id += 1;
    let path = format!("{}{}/", prefix, state.next_id);
    state.records.push(path.clone());
    state.staged.insert(path, body.clone());
    success(json!({"zone": zone, "fqdn": fqdn, "rdata": body.rdata, "ttl": body.ttl}))
}

async fn update(
    State(state): State<Shared>,
    Path((zone, fqdn, id)): Path<(String, String, String)>,
    headers: HeaderMap,
    Json(body): Json<CnameRecordRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    let path = format!("/REST/CNAMERecord/{}/{}/{}/", zone, fqdn, id);
    if let Some(rejection) = enter(&mut state, format!("PUT {}", path), &headers) {
        return rejection;
    }
    if state.reject_writes {
        return failure(StatusCode::BAD_REQUEST, "OPERATION_FAILED", "update: rejected");
    }
    if !state.records.contains(&path) {
        return failure(StatusCode::NOT_FOUND, "NOT_FOUND", "record: No such record");
    }

    state.staged.insert(path, body.clone());
    success(json!({"zone": zone, "fqdn": fqdn, "rdata": body.rdata, "ttl": body.ttl}))
}

async fn publish(
    State(state): State<Shared>,
    Path(zone): Path<String>,
    headers: HeaderMap,
    Json(body): Json<PublishRequest>,
) -> Response {
    let mut state = state.lock().unwrap();
    if let Some(rejection) = enter(&mut state, format!("PUT /REST/Zone/{}/", zone), &headers) {
        return rejection;
    }
    if state.reject_publish || body.publish != "true" {
        return failure(StatusCode::BAD_REQUEST, "OPERATION_FAILED", "publish: rejected");
    }

    let staged: Vec<(String, CnameRecordRequest)> = state.staged.drain().collect();
    state.published.extend(staged);
    success(json!({"zone": zone, "serial": 1}))
}
