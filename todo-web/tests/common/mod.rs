use assert_fs::TempDir;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, header};
use todo_list::TodoStorage;
use todo_web::web::{AppState, create_router};

/// Test context for endpoint tests.
pub struct TestContext {
    #[allow(dead_code)] // dir is kept so the store is not deleted
    pub dir: TempDir,
    pub app: Router,
    /// A second handle on the same file, for inspecting what the server wrote.
    pub storage: TodoStorage,
}

/// Builds the full router over a fresh store in a temporary directory.
pub fn setup() -> anyhow::Result<TestContext> {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().try_init();
    let dir = TempDir::new()?;
    let path = dir.path().join("todos.json");
    let app = create_router(AppState::new(TodoStorage::at(&path)?));
    let storage = TodoStorage::at(&path)?;
    Ok(TestContext { dir, app, storage })
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

pub fn post_form(uri: &str, form: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(form.to_string()))
        .unwrap()
}

pub async fn body_text(response: axum::response::Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}
