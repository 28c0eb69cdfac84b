//! Task records and the JSON file store shared by the `todo` command-line
//! tool and the `todo-web` server.

pub mod storage;
pub mod task;

pub use storage::{DB_PATH_ENV, StorageError, TaskFilter, TodoStorage};
pub use task::Task;
