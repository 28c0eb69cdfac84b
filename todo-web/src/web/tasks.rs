use askama::Template;
use axum::{
    Form, Router,
    extract::{Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
};
use serde::Deserialize;
use todo_list::{Task, TaskFilter};

use super::{AppState, WebError};

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    filter: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TitleForm {
    #[serde(default)]
    title: String,
}

/// Unknown or missing filters fall back to showing pending tasks.
fn parse_filter(raw: Option<&str>) -> TaskFilter {
    raw.and_then(|value| value.parse().ok()).unwrap_or_default()
}

fn non_empty(title: &str) -> Option<&str> {
    Some(title.trim()).filter(|title| !title.is_empty())
}

/// One of the "show all / pending / completed" links above the list.
struct FilterLink {
    value: &'static str,
    label: &'static str,
    active: bool,
}

impl FilterLink {
    fn all_for(current: TaskFilter) -> Vec<Self> {
        [
            (TaskFilter::Pending, "Pending"),
            (TaskFilter::Completed, "Completed"),
            (TaskFilter::All, "All"),
        ]
        .into_iter()
        .map(|(filter, label)| FilterLink {
            value: filter.as_str(),
            label,
            active: filter == current,
        })
        .collect()
    }
}

#[derive(Template)]
#[template(path = "index.html")]
struct IndexTemplate {
    tasks: Vec<Task>,
    current_filter: &'static str,
    filter_links: Vec<FilterLink>,
}

impl IndexTemplate {
    pub fn new(tasks: Vec<Task>, filter: TaskFilter) -> Self {
        Self {
            tasks,
            current_filter: filter.as_str(),
            filter_links: FilterLink::all_for(filter),
        }
    }
}

#[derive(Template)]
#[template(path = "edit.html")]
struct EditTemplate {
    task: Task,
}

impl EditTemplate {
    pub fn new(task: Task) -> Self {
        Self { task }
    }
}

/// Handler for the task list, filtered by the `filter` query parameter.
#[tracing::instrument(skip(state))]
async fn index_handler(
    State(state): State<AppState>,
    Query(query): Query<FilterQuery>,
) -> Result<Html<String>, WebError> {
    let filter = parse_filter(query.filter.as_deref());
    let tasks = state.storage.lock().await.list_tasks(filter)?;
    let template = IndexTemplate::new(tasks, filter);
    template.render().map(Html).map_err(WebError::from)
}

/// Handler for creating a new task via POST request.
#[tracing::instrument(skip(state))]
async fn add_task_handler(
    State(state): State<AppState>,
    Form(form): Form<TitleForm>,
) -> Result<Redirect, WebError> {
    if let Some(title) = non_empty(&form.title) {
        state.storage.lock().await.add_task(title)?;
    }
    Ok(Redirect::to("/"))
}

/// Handler for flipping a task between pending and completed. The current
/// filter is carried over to the redirect.
#[tracing::instrument(skip(state))]
async fn toggle_task_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Query(query): Query<FilterQuery>,
) -> Result<Redirect, WebError> {
    {
        let storage = state.storage.lock().await;
        if let Some(task) = storage.get_task(id)? {
            storage.upsert_task(task.with_completed(!task.completed()))?;
        }
    }
    let location = match query.filter.as_deref() {
        Some(raw) => format!("/?filter={}", parse_filter(Some(raw)).as_str()),
        None => "/".to_string(),
    };
    Ok(Redirect::to(&location))
}

/// Handler for serving the edit form of a task.
#[tracing::instrument(skip(state))]
async fn edit_form_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Response, WebError> {
    let Some(task) = state.storage.lock().await.get_task(id)? else {
        return Ok(Redirect::to("/").into_response());
    };
    let template = EditTemplate::new(task);
    Ok(Html(template.render()?).into_response())
}

/// Handler for saving an edited title via POST request.
#[tracing::instrument(skip(state))]
async fn edit_task_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Form(form): Form<TitleForm>,
) -> Result<Redirect, WebError> {
    let storage = state.storage.lock().await;
    if let (Some(task), Some(title)) = (storage.get_task(id)?, non_empty(&form.title)) {
        storage.upsert_task(task.with_title(title))?;
    }
    Ok(Redirect::to("/"))
}

/// Handler for deleting a task via POST request.
#[tracing::instrument(skip(state))]
async fn delete_task_handler(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Redirect, WebError> {
    state.storage.lock().await.delete_task(id)?;
    Ok(Redirect::to("/"))
}

/// Creates and returns the task router with all task-related routes.
pub fn create_task_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/add", post(add_task_handler))
        .route("/toggle/{id}", post(toggle_task_handler))
        .route("/edit/{id}", get(edit_form_handler).post(edit_task_handler))
        .route("/delete/{id}", post(delete_task_handler))
        .with_state(state)
}
