use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use todo_list::{Task, TaskFilter, TodoStorage};

#[derive(Parser, Debug)]
#[command(name = "todo", about = "Simple To-Do List CLI")]
pub struct Cli {
    /// Path to the JSON database file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Add a new task
    Add { title: String },
    /// List tasks
    List {
        #[command(flatten)]
        filter: ListFilter,
        /// Raw output without header
        #[arg(long)]
        raw: bool,
    },
    /// Mark a task as completed
    Done { id: u64 },
    /// Mark a task as not completed
    Undone { id: u64 },
    /// Delete a task
    Delete { id: u64 },
    /// Edit a task's title
    Edit { id: u64, title: String },
}

#[derive(Debug, Clone, Default, Args)]
#[group(multiple = false)]
pub struct ListFilter {
    /// Show all tasks
    #[arg(short, long)]
    pub all: bool,
    /// Show only completed tasks
    #[arg(short, long)]
    pub completed: bool,
    /// Show only pending tasks
    #[arg(short, long)]
    pub pending: bool,
}

impl From<&ListFilter> for TaskFilter {
    fn from(flags: &ListFilter) -> Self {
        if flags.all {
            TaskFilter::All
        } else if flags.completed {
            TaskFilter::Completed
        } else {
            TaskFilter::Pending
        }
    }
}

/// How a command ended, mapped onto the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    NotFound,
}

impl From<Outcome> for ExitCode {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Success => ExitCode::SUCCESS,
            Outcome::NotFound => ExitCode::from(1),
        }
    }
}

/// Runs one command against the store, writing user-facing lines to `out`.
pub fn run(cli: Cli, out: &mut impl Write) -> anyhow::Result<Outcome> {
    let storage = TodoStorage::open(cli.db).context("Failed to open task store")?;
    tracing::debug!("Using task store at {}", storage.path().display());
    execute(&storage, cli.command, out)
}

fn execute(
    storage: &TodoStorage,
    command: Commands,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    match command {
        Commands::Add { title } => {
            let Some(title) = non_empty(&title) else {
                return rejected_title(out);
            };
            let task = storage.add_task(title)?;
            writeln!(out, "Added #{}: {}", task.id(), task.title())?;
        }
        Commands::List { filter, raw } => {
            let tasks = storage.list_tasks(TaskFilter::from(&filter))?;
            print_tasks(out, &tasks, raw)?;
        }
        Commands::Done { id } => {
            return set_completed(storage, id, true, out);
        }
        Commands::Undone { id } => {
            return set_completed(storage, id, false, out);
        }
        Commands::Delete { id } => {
            if !storage.delete_task(id)? {
                return not_found(id, out);
            }
            writeln!(out, "Deleted #{}", id)?;
        }
        Commands::Edit { id, title } => {
            let Some(title) = non_empty(&title) else {
                return rejected_title(out);
            };
            let Some(task) = storage.get_task(id)? else {
                return not_found(id, out);
            };
            storage.upsert_task(task.with_title(title))?;
            writeln!(out, "Edited #{}", id)?;
        }
    }
    Ok(Outcome::Success)
}

fn set_completed(
    storage: &TodoStorage,
    id: u64,
    completed: bool,
    out: &mut impl Write,
) -> anyhow::Result<Outcome> {
    let Some(task) = storage.get_task(id)? else {
        return not_found(id, out);
    };
    storage.upsert_task(task.with_completed(completed))?;
    if completed {
        writeln!(out, "Marked #{} as completed", id)?;
    } else {
        writeln!(out, "Marked #{} as not completed", id)?;
    }
    Ok(Outcome::Success)
}

fn not_found(id: u64, out: &mut impl Write) -> anyhow::Result<Outcome> {
    writeln!(out, "Task #{} not found", id)?;
    Ok(Outcome::NotFound)
}

// A blank title is refused before the store is touched. It is not a failure.
fn rejected_title(out: &mut impl Write) -> anyhow::Result<Outcome> {
    writeln!(out, "Title must not be empty")?;
    Ok(Outcome::Success)
}

fn non_empty(title: &str) -> Option<&str> {
    Some(title.trim()).filter(|title| !title.is_empty())
}

fn print_tasks(out: &mut impl Write, tasks: &[Task], raw: bool) -> std::io::Result<()> {
    if !raw {
        writeln!(out, "ID  Status  Title")?;
        writeln!(out, "--  ------  -----")?;
    }
    for task in tasks {
        let status = if task.completed() { "x" } else { " " };
        writeln!(out, "{:<3}[{}]    {}", task.id(), status, task.title())?;
    }
    Ok(())
}
