use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single to-do item, saved as an entry in the store's `tasks` array.
#[derive(Debug, Eq, PartialEq, Serialize, Deserialize, Clone)]
#[serde(from = "TaskRecord")]
pub struct Task {
    id: u64,
    title: String,
    completed: bool,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Task {
    /// Creates a pending task whose timestamps are both set to now.
    pub fn create(id: u64, title: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            title: title.into(),
            completed: false,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns a copy with the title replaced and `updated_at` refreshed.
    pub fn with_title(&self, new_title: impl Into<String>) -> Self {
        Self {
            title: new_title.into(),
            updated_at: self.refreshed_at(),
            ..self.clone()
        }
    }

    /// Returns a copy with the completion flag replaced and `updated_at` refreshed.
    pub fn with_completed(&self, completed: bool) -> Self {
        Self {
            completed,
            updated_at: self.refreshed_at(),
            ..self.clone()
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    // Never moves backwards, even if the wall clock does.
    fn refreshed_at(&self) -> DateTime<Utc> {
        Utc::now().max(self.updated_at)
    }
}

/// On-disk shape of a task as written by every known format variant.
///
/// Older files spell the timestamps in camelCase and some omit one or both of
/// them. snake_case wins when both spellings are present.
#[derive(Deserialize)]
struct TaskRecord {
    id: u64,
    title: String,
    #[serde(default)]
    completed: bool,
    created_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    created_at_camel: Option<DateTime<Utc>>,
    updated_at: Option<DateTime<Utc>>,
    #[serde(rename = "updatedAt")]
    updated_at_camel: Option<DateTime<Utc>>,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let updated_at = record.updated_at.or(record.updated_at_camel);
        // A record with no timestamps at all is dated to the epoch rather
        // than dropped, so the rest of the store stays readable.
        let created_at = record
            .created_at
            .or(record.created_at_camel)
            .or(updated_at)
            .unwrap_or_default();
        Task {
            id: record.id,
            title: record.title,
            completed: record.completed,
            created_at,
            updated_at: updated_at.unwrap_or(created_at),
        }
    }
}
