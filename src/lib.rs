pub mod app;
pub mod client;
pub mod dashboard;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod notify;
pub mod scheduler;
pub mod storage;
pub mod ui;
pub mod state;

pub use app::router;
pub use dashboard::{Dashboard, Section};
pub use state::AppState;
pub use storage::{load_settings, resolve_settings_path, Settings};
