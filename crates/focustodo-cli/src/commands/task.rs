//! Task management commands for CLI.

use chrono::{DateTime, Utc};
use clap::Subcommand;
use focustodo_core::storage::Database;
use focustodo_core::task::{Priority, TaskPatch};
use focustodo_core::{Task, TaskStore};

use super::{print_json, resolve_id, CliResult};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task title
        title: String,
        /// Task description
        #[arg(long)]
        description: Option<String>,
        /// Project ID (or unique prefix) to associate with
        #[arg(long)]
        project: Option<String>,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (RFC 3339)
        #[arg(long)]
        due: Option<DateTime<Utc>>,
    },
    /// List tasks in order
    List {
        /// Filter by project ID (or unique prefix)
        #[arg(long)]
        project: Option<String>,
        /// Include completed tasks
        #[arg(long)]
        all: bool,
    },
    /// Update a task
    Edit {
        /// Task ID or unique prefix
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New description
        #[arg(long)]
        description: Option<String>,
        /// New project ID (or unique prefix)
        #[arg(long, conflicts_with = "no_project")]
        project: Option<String>,
        /// Detach from its project
        #[arg(long)]
        no_project: bool,
        /// New priority
        #[arg(long)]
        priority: Option<Priority>,
        /// New due date (RFC 3339)
        #[arg(long)]
        due: Option<DateTime<Utc>>,
    },
    /// Mark a task completed
    Done {
        /// Task ID or unique prefix
        id: String,
    },
    /// Mark a task not completed
    Undo {
        /// Task ID or unique prefix
        id: String,
    },
    /// Delete a task
    Remove {
        /// Task ID or unique prefix
        id: String,
    },
    /// Move a task to a position in the list (0-based)
    Move {
        /// Task ID or unique prefix
        id: String,
        position: usize,
    },
}

fn task_id(tasks: &TaskStore, prefix: &str) -> Result<String, String> {
    resolve_id("task", prefix, tasks.tasks().iter().map(|t| t.id.as_str()))
}

fn project_id(db: &Database, prefix: &str) -> Result<String, Box<dyn std::error::Error>> {
    let projects = db.load_projects()?;
    Ok(resolve_id(
        "project",
        prefix,
        projects.projects().iter().map(|p| p.id.as_str()),
    )?)
}

fn set_completed(db: &Database, prefix: &str, completed: bool) -> CliResult {
    let mut tasks = db.load_tasks()?;
    let id = task_id(&tasks, prefix)?;
    let patch = TaskPatch {
        completed: Some(completed),
        ..TaskPatch::default()
    };
    let task = tasks.update(&id, patch, Utc::now())?.clone();
    db.save_tasks(&tasks)?;
    print_json(&task)
}

pub fn run(action: TaskAction) -> CliResult {
    let db = Database::open()?;

    match action {
        TaskAction::Add {
            title,
            description,
            project,
            priority,
            due,
        } => {
            let mut task = Task::new(title, Utc::now()).with_priority(priority);
            task.description = description;
            task.due_date = due;
            if let Some(prefix) = project {
                task.project_id = Some(project_id(&db, &prefix)?);
            }

            let mut tasks = db.load_tasks()?;
            let task = tasks.add(task).clone();
            db.save_tasks(&tasks)?;
            eprintln!("Task created: {}", task.id);
            print_json(&task)?;
        }
        TaskAction::List { project, all } => {
            let project = project.map(|p| project_id(&db, &p)).transpose()?;
            let tasks = db.load_tasks()?;
            let filtered: Vec<&Task> = tasks
                .tasks()
                .iter()
                .filter(|t| all || !t.completed)
                .filter(|t| project.is_none() || t.project_id == project)
                .collect();
            print_json(&filtered)?;
        }
        TaskAction::Edit {
            id,
            title,
            description,
            project,
            no_project,
            priority,
            due,
        } => {
            let project_patch = match (project, no_project) {
                (_, true) => Some(None),
                (Some(prefix), false) => Some(Some(project_id(&db, &prefix)?)),
                (None, false) => None,
            };
            let patch = TaskPatch {
                title,
                description: description.map(Some),
                completed: None,
                due_date: due.map(Some),
                priority,
                project_id: project_patch,
            };

            let mut tasks = db.load_tasks()?;
            let id = task_id(&tasks, &id)?;
            let task = tasks.update(&id, patch, Utc::now())?.clone();
            db.save_tasks(&tasks)?;
            print_json(&task)?;
        }
        TaskAction::Done { id } => set_completed(&db, &id, true)?,
        TaskAction::Undo { id } => set_completed(&db, &id, false)?,
        TaskAction::Remove { id } => {
            let mut tasks = db.load_tasks()?;
            let id = task_id(&tasks, &id)?;
            tasks.remove(&id);
            db.save_tasks(&tasks)?;
            println!("Task deleted: {id}");
        }
        TaskAction::Move { id, position } => {
            let mut tasks = db.load_tasks()?;
            let id = task_id(&tasks, &id)?;
            tasks.move_to(&id, position)?;
            db.save_tasks(&tasks)?;
            let order: Vec<&str> = tasks.tasks().iter().map(|t| t.id.as_str()).collect();
            print_json(&order)?;
        }
    }
    Ok(())
}
