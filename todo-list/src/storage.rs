use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::task::Task;

/// Environment variable that overrides the default store location.
pub const DB_PATH_ENV: &str = "TODO_DB_PATH";

const APP_DIR: &str = "todo_cli";
const DB_FILE: &str = "todos.json";

/// Error type for storage operations.
///
/// Unreadable store contents are not an error: they are treated as an empty
/// store. Only genuine I/O failures reach the caller.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to encode task store: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("No task ids left: id {0} is already taken")]
    IdsExhausted(u64),
}

pub type Result<T> = std::result::Result<T, StorageError>;

fn io_error(path: &Path) -> impl FnOnce(io::Error) -> StorageError + '_ {
    move |source| StorageError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Which tasks a listing returns.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum TaskFilter {
    All,
    Completed,
    #[default]
    Pending,
}

impl TaskFilter {
    pub fn matches(&self, task: &Task) -> bool {
        match self {
            TaskFilter::All => true,
            TaskFilter::Completed => task.completed(),
            TaskFilter::Pending => !task.completed(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TaskFilter::All => "all",
            TaskFilter::Completed => "completed",
            TaskFilter::Pending => "pending",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown task filter '{0}'")]
pub struct UnknownFilter(String);

impl FromStr for TaskFilter {
    type Err = UnknownFilter;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "all" => Ok(TaskFilter::All),
            "completed" => Ok(TaskFilter::Completed),
            "pending" => Ok(TaskFilter::Pending),
            other => Err(UnknownFilter(other.to_string())),
        }
    }
}

/// The complete persisted structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct Store {
    #[serde(default = "first_id")]
    next_id: u64,
    #[serde(default)]
    tasks: Vec<Task>,
}

fn first_id() -> u64 {
    1
}

impl Default for Store {
    fn default() -> Self {
        Self {
            next_id: first_id(),
            tasks: Vec::new(),
        }
    }
}

impl Store {
    /// Parses store contents. Blank input is an empty store; anything that
    /// does not parse is reported as `None`.
    fn parse(contents: &[u8]) -> Option<Self> {
        if contents.iter().all(u8::is_ascii_whitespace) {
            return Some(Self::default());
        }
        let mut store: Store = serde_json::from_slice(contents).ok()?;
        store.next_id = store.next_id.max(store.max_id().saturating_add(1));
        Some(store)
    }

    fn max_id(&self) -> u64 {
        self.tasks.iter().map(Task::id).max().unwrap_or(0)
    }

    fn position(&self, id: u64) -> Option<usize> {
        self.tasks.iter().position(|task| task.id() == id)
    }
}

/// Picks the store location: explicit path, then the environment override,
/// then `<data dir>/todo_cli/todos.json`.
pub fn resolve_db_path(
    explicit: Option<PathBuf>,
    env_override: Option<OsString>,
    data_dir: Option<PathBuf>,
) -> PathBuf {
    explicit
        .or_else(|| {
            env_override
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        })
        .unwrap_or_else(|| data_dir.unwrap_or_default().join(APP_DIR).join(DB_FILE))
}

fn default_data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|dirs| dirs.data_dir().to_path_buf())
}

/// Task storage backed by a single JSON file.
///
/// Every operation reads the whole file, acts on it in memory, and writes the
/// whole file back if anything changed.
#[derive(Debug, Clone)]
pub struct TodoStorage {
    path: PathBuf,
}

impl TodoStorage {
    /// Opens the store at the resolved location, creating it if it does not exist.
    ///
    /// # Arguments
    ///
    /// * `db_path` - An explicit location. When `None`, `TODO_DB_PATH` and then
    ///   the per-user data directory are consulted.
    pub fn open(db_path: Option<PathBuf>) -> Result<Self> {
        let path = resolve_db_path(
            db_path,
            std::env::var_os(DB_PATH_ENV),
            default_data_dir(),
        );
        Self::at(path)
    }

    /// Opens the store at exactly `path`, creating it if it does not exist.
    pub fn at(path: impl Into<PathBuf>) -> Result<Self> {
        let storage = Self { path: path.into() };
        if !storage.path.exists() {
            tracing::debug!("Creating task store at {}", storage.path.display());
            storage.save(&Store::default())?;
        }
        Ok(storage)
    }

    /// Returns the location of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lists tasks matching `filter`, in store order.
    #[tracing::instrument(skip(self))]
    pub fn list_tasks(&self, filter: TaskFilter) -> Result<Vec<Task>> {
        let store = self.load()?;
        Ok(store
            .tasks
            .into_iter()
            .filter(|task| filter.matches(task))
            .collect())
    }

    /// Creates a task with the next free id and persists it.
    #[tracing::instrument(skip(self))]
    pub fn add_task(&self, title: &str) -> Result<Task> {
        let mut store = self.load()?;
        // next_id saturates at u64::MAX, which may already be taken.
        if store.position(store.next_id).is_some() {
            return Err(StorageError::IdsExhausted(store.next_id));
        }
        let task = Task::create(store.next_id, title);
        store.tasks.push(task.clone());
        store.next_id = store.next_id.saturating_add(1);
        self.save(&store)?;
        tracing::info!("Added task {}", task.id());
        Ok(task)
    }

    /// Looks up a task by id.
    #[tracing::instrument(skip(self))]
    pub fn get_task(&self, id: u64) -> Result<Option<Task>> {
        let store = self.load()?;
        Ok(store.tasks.into_iter().find(|task| task.id() == id))
    }

    /// Replaces the task with the same id in place, or appends it if there is
    /// none. Always persists.
    #[tracing::instrument(skip(self, task), fields(id = task.id()))]
    pub fn upsert_task(&self, task: Task) -> Result<()> {
        let mut store = self.load()?;
        match store.position(task.id()) {
            Some(index) => store.tasks[index] = task,
            None => {
                store.next_id = store.next_id.max(task.id().saturating_add(1));
                store.tasks.push(task);
            }
        }
        self.save(&store)
    }

    /// Removes the task with the given id. Returns whether one was removed;
    /// the file is only rewritten when it was.
    #[tracing::instrument(skip(self))]
    pub fn delete_task(&self, id: u64) -> Result<bool> {
        let mut store = self.load()?;
        let Some(index) = store.position(id) else {
            return Ok(false);
        };
        store.tasks.remove(index);
        self.save(&store)?;
        tracing::info!("Deleted task {}", id);
        Ok(true)
    }

    fn load(&self) -> Result<Store> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => Vec::new(),
            Err(err) => return Err(io_error(&self.path)(err)),
        };
        Ok(Store::parse(&contents).unwrap_or_else(|| {
            tracing::warn!(
                "Task store at {} is unreadable, treating it as empty",
                self.path.display()
            );
            Store::default()
        }))
    }

    // Writes to a sibling file and renames it over the target so readers
    // never see a partial store.
    fn save(&self, store: &Store) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(io_error(parent))?;
        }
        let json = serde_json::to_string_pretty(store)?;
        let temp_path = self.temp_path();
        fs::write(&temp_path, json).map_err(io_error(&temp_path))?;
        fs::rename(&temp_path, &self.path).map_err(io_error(&self.path))
    }

    /// `<file>.<pid>.tmp` next to the store. Writers in different processes
    /// never share a temp file.
    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(format!(".{}.tmp", std::process::id()));
        self.path.with_file_name(name)
    }
}
