#![allow(dead_code)]

//! In-process stand-in for the Task API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

#[derive(Default)]
pub struct BackendData {
    pub tasks: BTreeMap<u64, Value>,
    pub next_id: u64,
    /// "METHOD path?query" for every request served.
    pub requests: Vec<String>,
}

#[derive(Clone, Default)]
pub struct Backend {
    pub data: Arc<Mutex<BackendData>>,
}

impl Backend {
    pub fn seed(&self, title: &str, description: Option<&str>, status: &str) -> u64 {
        let mut data = self.data.lock().unwrap();
        data.next_id += 1;
        let id = data.next_id;
        data.tasks.insert(
            id,
            json!({
                "id": id,
                "title": title,
                "description": description,
                "status": status,
                "created_at": format!("2025-01-{:02}T10:00:00", id.min(28)),
                "updated_at": null,
            }),
        );
        id
    }

    pub fn requests(&self) -> Vec<String> {
        self.data.lock().unwrap().requests.clone()
    }

    pub fn task_count(&self) -> usize {
        self.data.lock().unwrap().tasks.len()
    }

    fn record(&self, entry: String) {
        self.data.lock().unwrap().requests.push(entry);
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub backend: Backend,
}

#[derive(Deserialize)]
struct StatusQuery {
    status: Option<String>,
}

async fn welcome(State(backend): State<Backend>) -> Json<Value> {
    backend.record("GET /".into());
    Json(json!({ "message": "Welcome to Tasky - Task Management API" }))
}

async fn stats(State(backend): State<Backend>) -> Json<Value> {
    backend.record("GET /stats".into());
    let data = backend.data.lock().unwrap();
    let total = data.tasks.len();
    let completed = data
        .tasks
        .values()
        .filter(|t| t["status"] == "done" || t["status"] == "completed")
        .count();
    let pending = data.tasks.values().filter(|t| t["status"] == "pending").count();
    let rate = if total > 0 {
        completed as f64 / total as f64 * 100.0
    } else {
        0.0
    };
    Json(json!({
        "total_tasks": total,
        "completed_tasks": completed,
        "pending_tasks": pending,
        "completion_rate": rate,
    }))
}

async fn list_tasks(
    State(backend): State<Backend>,
    Query(query): Query<StatusQuery>,
) -> Json<Value> {
    match &query.status {
        Some(status) => backend.record(format!("GET /tasks?status={status}")),
        None => backend.record("GET /tasks".into()),
    }
    let data = backend.data.lock().unwrap();
    let tasks: Vec<Value> = data
        .tasks
        .values()
        .rev()
        .filter(|t| query.status.as_deref().is_none_or(|s| t["status"] == s))
        .cloned()
        .collect();
    Json(Value::Array(tasks))
}

async fn create_task(
    State(backend): State<Backend>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    backend.record("POST /tasks".into());
    let title = body["title"].as_str().unwrap_or_default();
    if title.is_empty() {
        return Err((StatusCode::UNPROCESSABLE_ENTITY, "title required".into()));
    }
    check_status(&body)?;
    let id = backend.seed(
        title,
        body["description"].as_str(),
        body["status"].as_str().unwrap_or("pending"),
    );
    let task = backend.data.lock().unwrap().tasks[&id].clone();
    Ok(Json(task))
}

/// The real API only knows `pending` and `done`.
fn check_status(body: &Value) -> Result<(), (StatusCode, String)> {
    match body["status"].as_str() {
        None | Some("pending") | Some("done") => Ok(()),
        Some(other) => Err((
            StatusCode::UNPROCESSABLE_ENTITY,
            format!(r#"{{"detail":"invalid status '{other}'"}}"#),
        )),
    }
}

fn not_found() -> (StatusCode, String) {
    (
        StatusCode::NOT_FOUND,
        r#"{"detail":"Task not found"}"#.to_string(),
    )
}

async fn get_task(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    backend.record(format!("GET /tasks/{id}"));
    let data = backend.data.lock().unwrap();
    data.tasks.get(&id).cloned().map(Json).ok_or_else(not_found)
}

async fn update_task(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    backend.record(format!("PUT /tasks/{id}"));
    check_status(&body)?;
    let mut data = backend.data.lock().unwrap();
    let task = data.tasks.get_mut(&id).ok_or_else(not_found)?;
    for field in ["title", "description", "status"] {
        task[field] = body[field].clone();
    }
    task["updated_at"] = json!("2025-02-01T12:00:00");
    Ok(Json(task.clone()))
}

async fn delete_task(
    State(backend): State<Backend>,
    Path(id): Path<u64>,
) -> Result<Json<Value>, (StatusCode, String)> {
    backend.record(format!("DELETE /tasks/{id}"));
    let mut data = backend.data.lock().unwrap();
    data.tasks.remove(&id).ok_or_else(not_found)?;
    Ok(Json(json!({ "message": "Task deleted successfully" })))
}

async fn metrics(State(backend): State<Backend>) -> String {
    backend.record("GET /metrics".into());
    let total = backend.data.lock().unwrap().tasks.len();
    format!("# HELP tasks_total Total number of tasks\n# TYPE tasks_total gauge\ntasks_total {total}.0\n")
}

pub fn backend_router(backend: Backend) -> Router {
    Router::new()
        .route("/", get(welcome))
        .route("/stats", get(stats))
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task).put(update_task).delete(delete_task),
        )
        .route("/metrics", get(metrics))
        .with_state(backend)
}

/// Serves the mock on the current runtime.
pub async fn spawn_backend() -> MockBackend {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let backend = Backend::default();
    let app = backend_router(backend.clone());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    MockBackend {
        base_url: format!("http://{addr}"),
        backend,
    }
}

/// Serves the mock on its own thread so it outlives any single test runtime.
pub fn spawn_backend_thread() -> MockBackend {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let mock = spawn_backend().await;
            tx.send(mock).unwrap();
            std::future::pending::<()>().await;
        });
    });
    rx.recv().unwrap()
}

/// A base URL nothing listens on.
pub fn closed_base_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

pub fn unique_settings_path(tag: &str) -> std::path::PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let mut path = std::env::temp_dir();
    path.push(format!(
        "tasky_dashboard_{tag}_{}_{nanos}.json",
        std::process::id()
    ));
    path
}
