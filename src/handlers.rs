use crate::dashboard::{Section, ViewState};
use crate::errors::AppError;
use crate::models::{FilterQuery, SettingsForm, TaskForm, TaskStatus};
use crate::notify::Notification;
use crate::state::AppState;
use crate::storage::Settings;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Form, Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ViewSnapshot {
    pub view: ViewState,
    pub settings: Settings,
    pub notification: Option<Notification>,
    pub loading: bool,
    pub auto_refresh: bool,
}

pub async fn index(State(state): State<AppState>) -> Html<String> {
    Html(state.dashboard.render().await)
}

pub async fn get_view(State(state): State<AppState>) -> Json<ViewSnapshot> {
    let dashboard = &state.dashboard;
    Json(ViewSnapshot {
        view: dashboard.view().await,
        settings: dashboard.settings().await,
        notification: dashboard.notifier().current(),
        loading: dashboard.client().is_loading(),
        auto_refresh: dashboard.scheduler().is_running(),
    })
}

pub async fn show_section(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Redirect, AppError> {
    let section: Section = name.parse().map_err(AppError::bad_request)?;
    state.dashboard.show_section(section).await;
    Ok(Redirect::to("/"))
}

pub async fn refresh(State(state): State<AppState>) -> Redirect {
    state.dashboard.refresh_data().await;
    Redirect::to("/")
}

pub async fn filter_tasks(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Redirect, AppError> {
    let filter = match query.status.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => Some(raw.parse::<TaskStatus>().map_err(AppError::bad_request)?),
    };
    state.dashboard.filter_tasks(filter).await;
    Ok(Redirect::to("/"))
}

pub async fn create_task(State(state): State<AppState>, Form(form): Form<TaskForm>) -> Redirect {
    state.dashboard.create_task(form).await;
    Redirect::to("/")
}

pub async fn edit_task(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    state.dashboard.edit_task(id).await;
    Redirect::to("/")
}

pub async fn cancel_edit(State(state): State<AppState>) -> Redirect {
    state.dashboard.close_edit().await;
    Redirect::to("/")
}

pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<TaskForm>,
) -> Result<Redirect, AppError> {
    let editing = state.dashboard.view().await.editing.map(|task| task.id);
    if editing.is_some_and(|open| open != id) {
        return Err(AppError::bad_request(format!("task {id} is not being edited")));
    }
    state.dashboard.update_task(form).await;
    Ok(Redirect::to("/"))
}

pub async fn delete_task(State(state): State<AppState>, Path(id): Path<u64>) -> Redirect {
    state.dashboard.delete_task(id).await;
    Redirect::to("/")
}

pub async fn save_settings(
    State(state): State<AppState>,
    Form(form): Form<SettingsForm>,
) -> Redirect {
    state.dashboard.save_settings(form).await;
    Redirect::to("/")
}
