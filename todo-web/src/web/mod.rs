use axum::Router;
use axum::http::StatusCode;
use axum::response::Html;
use std::sync::Arc;
use todo_list::{StorageError, TodoStorage};
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;

use crate::config::Config;

pub mod tasks;

/// State shared by every handler.
///
/// The storage sits behind one mutex so that each load-act-save cycle runs
/// without another request's write interleaving with it.
#[derive(Clone)]
pub struct AppState {
    pub storage: Arc<Mutex<TodoStorage>>,
}

impl AppState {
    pub fn new(storage: TodoStorage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }
}

/// Custom error type for web handler operations.
#[derive(Debug, thiserror::Error)]
pub enum WebError {
    /// Represents an error during template rendering.
    #[error("Template rendering failed")]
    Template(#[from] askama::Error),
    /// Represents a failure reading or writing the task store.
    #[error("Task storage failed")]
    Storage(#[from] StorageError),
}

impl axum::response::IntoResponse for WebError {
    fn into_response(self) -> axum::response::Response {
        tracing::error!("Request failed: {:?}", self);
        let user_facing_error_message =
            "An unexpected error occurred while processing your request. Please try again later.";
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Html(format!(
                "<h1>Internal Server Error</h1><p>{}</p>",
                user_facing_error_message
            )),
        )
            .into_response()
    }
}

/// Builds the application router with all routes.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", axum::routing::get(health_check_handler))
        .merge(tasks::create_task_router(state))
}

#[tracing::instrument(skip(config))]
pub async fn start_web_server(config: Config) -> anyhow::Result<()> {
    let storage = TodoStorage::open(config.db_path.clone())?;
    tracing::info!("Using task store at {}", storage.path().display());

    let app = create_router(AppState::new(storage)).layer(TraceLayer::new_for_http());

    let server_address = config.address();
    let listener = tokio::net::TcpListener::bind(&server_address).await?;
    tracing::info!("Web server running on http://{}", server_address);

    axum::serve(listener, app).await?;
    Ok(())
}

#[tracing::instrument]
pub async fn health_check_handler() -> &'static str {
    "OK"
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn can_handle_template_error_with_internal_server_error() {
        let template_error = askama::Error::Custom("Simulated template rendering failure".into());

        let web_error = WebError::Template(template_error);
        let response = axum::response::IntoResponse::into_response(web_error);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body_text = std::str::from_utf8(&body).unwrap();

        assert_eq!(
            body_text,
            "<h1>Internal Server Error</h1><p>An unexpected error occurred while processing your request. Please try again later.</p>"
        );
    }

    #[tokio::test]
    async fn can_handle_storage_error_with_internal_server_error() {
        let storage_error = StorageError::Io {
            path: "/nowhere/todos.json".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };

        let response = axum::response::IntoResponse::into_response(WebError::from(storage_error));

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
