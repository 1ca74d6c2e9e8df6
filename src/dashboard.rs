//! View controller: keeps the rendered containers for each section and
//! reloads them from the Task API on navigation, mutations and timer ticks.

use crate::client::ApiClient;
use crate::errors::ApiError;
use crate::models::{SettingsForm, Task, TaskForm, TaskStats, TaskStatus};
use crate::notify::Notifier;
use crate::scheduler::{PollScheduler, parse_refresh_secs};
use crate::storage::{Settings, persist_settings};
use crate::ui::{self, PageView};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const RECENT_TASK_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Section {
    #[default]
    Dashboard,
    Tasks,
    Metrics,
    Settings,
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Dashboard => "dashboard",
            Self::Tasks => "tasks",
            Self::Metrics => "metrics",
            Self::Settings => "settings",
        })
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "dashboard" => Ok(Self::Dashboard),
            "tasks" => Ok(Self::Tasks),
            "metrics" => Ok(Self::Metrics),
            "settings" => Ok(Self::Settings),
            other => Err(format!("unknown section '{other}'")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ViewState {
    pub section: Section,
    pub status_filter: Option<TaskStatus>,
    pub stats: Option<TaskStats>,
    /// Contents of `recent-tasks-list`.
    pub recent_tasks: String,
    /// Contents of `tasks-grid`.
    pub tasks_grid: String,
    pub metrics_text: Option<String>,
    pub editing: Option<Task>,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            section: Section::Dashboard,
            status_filter: None,
            stats: None,
            recent_tasks: ui::EMPTY_RECENT_TASKS.to_string(),
            tasks_grid: ui::EMPTY_TASKS_GRID.to_string(),
            metrics_text: None,
            editing: None,
        }
    }
}

pub struct Dashboard {
    client: ApiClient,
    notifier: Notifier,
    scheduler: PollScheduler,
    settings_path: PathBuf,
    settings: Mutex<Settings>,
    view: Mutex<ViewState>,
}

impl Dashboard {
    pub fn new(settings: Settings, settings_path: PathBuf) -> Result<Arc<Self>, ApiError> {
        let client = ApiClient::new(settings.api_base_url.clone())?;
        Ok(Arc::new(Self {
            client,
            notifier: Notifier::new(),
            scheduler: PollScheduler::new(),
            settings_path,
            settings: Mutex::new(settings),
            view: Mutex::new(ViewState::default()),
        }))
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn settings(&self) -> Settings {
        self.settings.lock().await.clone()
    }

    pub async fn view(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    pub async fn render(&self) -> String {
        let view = self.view().await;
        let settings = self.settings().await;
        let notification = self.notifier.current();
        ui::render_page(&PageView {
            view: &view,
            settings: &settings,
            notification: notification.as_ref(),
            loading: self.client.is_loading(),
        })
    }

    /// Startup sequence: check the backend, then load and schedule refreshes.
    pub async fn start(self: &Arc<Self>) {
        if self.test_connection().await {
            self.load_dashboard().await;
            self.setup_auto_refresh().await;
        } else {
            self.notifier
                .error("Backend not running. Please start the backend server first.");
        }
    }

    pub async fn test_connection(&self) -> bool {
        info!(base_url = %self.client.base_url(), "testing backend connection");
        match self.client.welcome().await {
            Ok(welcome) => {
                info!("backend is reachable: {}", welcome.message);
                self.notifier.success("Backend connection successful!");
                true
            }
            Err(ApiError::Status { status, .. }) => {
                warn!(status, "backend responded with error");
                self.notifier.error(format!("Backend error: {status}"));
                false
            }
            Err(err) => {
                warn!("cannot reach backend: {err}");
                self.notifier
                    .error("Cannot reach backend server. Please start the backend first.");
                false
            }
        }
    }

    pub async fn show_section(&self, section: Section) {
        self.view.lock().await.section = section;
        self.load_section(section).await;
    }

    /// Returns whether the section's data loaded.
    async fn load_section(&self, section: Section) -> bool {
        match section {
            Section::Dashboard => self.load_dashboard().await,
            Section::Tasks => self.load_tasks().await,
            Section::Metrics => self.load_metrics().await,
            Section::Settings => true,
        }
    }

    pub async fn load_dashboard(&self) -> bool {
        let result = tokio::try_join!(self.client.stats(), self.client.tasks(None));
        match result {
            Ok((stats, tasks)) => {
                let end = tasks.len().min(RECENT_TASK_LIMIT);
                let recent = ui::render_recent_tasks(&tasks[..end]);
                let mut view = self.view.lock().await;
                view.stats = Some(stats);
                view.recent_tasks = recent;
                true
            }
            Err(err) => {
                self.report("load dashboard", &err);
                false
            }
        }
    }

    pub async fn load_tasks(&self) -> bool {
        let filter = self.view.lock().await.status_filter;
        match self.client.tasks(filter).await {
            Ok(tasks) => {
                let grid = ui::render_tasks_grid(&tasks);
                self.view.lock().await.tasks_grid = grid;
                true
            }
            Err(err) => {
                self.report("load tasks", &err);
                false
            }
        }
    }

    pub async fn filter_tasks(&self, filter: Option<TaskStatus>) {
        self.view.lock().await.status_filter = filter;
        self.load_tasks().await;
    }

    pub async fn load_metrics(&self) -> bool {
        match self.client.metrics().await {
            Ok(text) => {
                info!(bytes = text.len(), "metrics loaded");
                self.view.lock().await.metrics_text = Some(text);
                self.notifier.info("Metrics loaded successfully!");
                true
            }
            Err(err) => {
                error!("failed to load metrics: {err}");
                self.notifier.error("Failed to load metrics");
                false
            }
        }
    }

    pub async fn refresh_data(&self) {
        let section = self.view.lock().await.section;
        if self.load_section(section).await {
            self.notifier.info("Data refreshed!");
        }
    }

    pub async fn create_task(&self, form: TaskForm) {
        let Some(payload) = form.into_payload() else {
            self.notifier.error("Please enter a task title");
            return;
        };

        match self.client.create_task(&payload).await {
            Ok(task) => {
                info!(id = task.id, "task created");
                self.notifier.success("Task created successfully!");
                self.refresh_data().await;
            }
            Err(err) => self.report("create task", &err),
        }
    }

    pub async fn edit_task(&self, id: u64) {
        match self.client.task(id).await {
            Ok(task) => self.view.lock().await.editing = Some(task),
            Err(err) => self.report("load task", &err),
        }
    }

    pub async fn close_edit(&self) {
        self.view.lock().await.editing = None;
    }

    pub async fn update_task(&self, form: TaskForm) {
        let Some(id) = self.view.lock().await.editing.as_ref().map(|task| task.id) else {
            return;
        };
        let Some(payload) = form.into_payload() else {
            self.notifier.error("Please enter a task title");
            return;
        };

        match self.client.update_task(id, &payload).await {
            Ok(_) => {
                info!(id, "task updated");
                self.close_edit().await;
                self.notifier.success("Task updated successfully!");
                self.refresh_data().await;
            }
            Err(err) => self.report("update task", &err),
        }
    }

    pub async fn delete_task(&self, id: u64) {
        match self.client.delete_task(id).await {
            Ok(()) => {
                info!(id, "task deleted");
                self.notifier.success("Task deleted successfully!");
                self.refresh_data().await;
            }
            Err(err) => self.report("delete task", &err),
        }
    }

    pub async fn save_settings(self: &Arc<Self>, form: SettingsForm) {
        let api_url = form.api_url.trim();
        if api_url.is_empty() {
            self.notifier.error("Please enter API URL");
            return;
        }

        let updated = Settings {
            api_base_url: api_url.to_string(),
            refresh_interval_secs: parse_refresh_secs(&form.refresh_interval),
        };
        if let Err(err) = persist_settings(&self.settings_path, &updated).await {
            error!("failed to persist settings: {err}");
            self.notifier.error(format!("Failed to save settings: {err}"));
            return;
        }

        self.client.set_base_url(&updated.api_base_url);
        *self.settings.lock().await = updated;
        self.setup_auto_refresh().await;
        self.notifier.success("Settings saved!");
    }

    /// (Re)starts the refresh timer from the current settings.
    pub async fn setup_auto_refresh(self: &Arc<Self>) {
        let secs = self.settings.lock().await.refresh_interval_secs;
        let weak: Weak<Self> = Arc::downgrade(self);
        self.scheduler.start(Duration::from_secs(secs), move || {
            let weak = weak.clone();
            async move {
                let Some(dashboard) = weak.upgrade() else {
                    return false;
                };
                dashboard.refresh_data().await;
                true
            }
        });
    }

    fn report(&self, action: &str, err: &ApiError) {
        error!("failed to {action}: {err}");
        self.notifier
            .error(err.notification_text(&self.client.base_url()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_names_round_trip() {
        for section in [
            Section::Dashboard,
            Section::Tasks,
            Section::Metrics,
            Section::Settings,
        ] {
            assert_eq!(section.to_string().parse::<Section>(), Ok(section));
        }
        assert!("reports".parse::<Section>().is_err());
    }

    #[tokio::test]
    async fn blank_title_is_rejected_without_a_request() {
        let dashboard = Dashboard::new(
            Settings {
                api_base_url: "http://127.0.0.1:9".into(),
                refresh_interval_secs: 30,
            },
            std::env::temp_dir().join("tasky_unused_settings.json"),
        )
        .unwrap();

        dashboard
            .create_task(TaskForm {
                title: "   ".into(),
                ..TaskForm::default()
            })
            .await;

        assert_eq!(dashboard.notifier().count(), 1);
        assert_eq!(
            dashboard.notifier().current().unwrap().message,
            "Please enter a task title"
        );
    }

    #[tokio::test]
    async fn update_without_open_edit_is_a_no_op() {
        let dashboard = Dashboard::new(
            Settings {
                api_base_url: "http://127.0.0.1:9".into(),
                refresh_interval_secs: 30,
            },
            std::env::temp_dir().join("tasky_unused_settings.json"),
        )
        .unwrap();

        dashboard
            .update_task(TaskForm {
                title: "x".into(),
                ..TaskForm::default()
            })
            .await;
        assert_eq!(dashboard.notifier().count(), 0);
    }
}
