use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/section/:name", get(handlers::show_section))
        .route("/refresh", post(handlers::refresh))
        .route("/tasks", post(handlers::create_task))
        .route("/tasks/filter", get(handlers::filter_tasks))
        .route("/tasks/edit/cancel", post(handlers::cancel_edit))
        .route("/tasks/:id", post(handlers::update_task))
        .route("/tasks/:id/edit", get(handlers::edit_task))
        .route("/tasks/:id/delete", post(handlers::delete_task))
        .route("/settings", post(handlers::save_settings))
        .route("/api/view", get(handlers::get_view))
        .with_state(state)
}
