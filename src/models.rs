use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task state. On the wire a finished task is `done`; `completed` is read
/// too. `in-progress` is display-only: the API never accepts it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum TaskStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in-progress")]
    InProgress,
    #[serde(rename = "done", alias = "completed")]
    Completed,
}

impl TaskStatus {
    /// Values the Task API accepts in create/update bodies and `?status=`.
    pub const SUBMITTABLE: [TaskStatus; 2] = [Self::Pending, Self::Completed];

    /// Wire value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "done",
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::InProgress => "In progress",
            Self::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "pending" => Ok(Self::Pending),
            "in-progress" => Ok(Self::InProgress),
            "completed" | "done" => Ok(Self::Completed),
            other => Err(format!("unknown task status '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub status: TaskStatus,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /tasks` and `PUT /tasks/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskPayload {
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStats {
    pub total_tasks: u64,
    pub completed_tasks: u64,
    pub pending_tasks: u64,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WelcomeResponse {
    pub message: String,
}

/// Raw task form as submitted by the page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub status: String,
}

impl TaskForm {
    /// Trims the fields and turns the form into a request body.
    /// Returns `None` when the title is blank.
    pub fn into_payload(self) -> Option<TaskPayload> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return None;
        }
        let description = self.description.trim();
        Some(TaskPayload {
            title,
            description: (!description.is_empty()).then(|| description.to_string()),
            status: self.status.parse().unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SettingsForm {
    #[serde(default)]
    pub api_url: String,
    #[serde(default)]
    pub refresh_interval: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilterQuery {
    #[serde(default)]
    pub status: Option<String>,
}
