use axum::http::StatusCode;

/// Failures talking to the Task API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Failed to fetch {url}")]
    Connection { url: String },

    #[error("HTTP error! status: {status} - {body}")]
    Status { status: u16, body: String },

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
}

impl ApiError {
    pub fn is_connect(&self) -> bool {
        matches!(self, Self::Connection { .. })
    }

    /// Text shown to the user for a failed call against `base_url`.
    pub fn notification_text(&self, base_url: &str) -> String {
        if self.is_connect() {
            format!(
                "API Error: Cannot connect to backend server. Please check if the backend is running on {base_url}"
            )
        } else {
            format!("API Error: {self}")
        }
    }
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::internal(err)
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
