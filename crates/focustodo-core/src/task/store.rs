use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::collections::HashMap;

use super::{Priority, Task};
use crate::error::{Result, ValidationError};
use crate::ports::TaskLedger;

/// Field updates for [`TaskStore::update`]. `None` leaves a field alone;
/// `Some(None)` clears an optional field.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    pub priority: Option<Priority>,
    pub project_id: Option<Option<String>>,
}

/// Ordered task list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskStore {
    tasks: Vec<Task>,
    #[serde(default)]
    last_sync: Option<DateTime<Utc>>,
}

impl TaskStore {
    /// Replace every task, sorted by `order`.
    pub fn set_tasks(&mut self, mut tasks: Vec<Task>, now: DateTime<Utc>) {
        tasks.sort_by_key(|t| t.order);
        self.tasks = tasks;
        self.last_sync = Some(now);
    }

    /// Append a task at the end of the list.
    pub fn add(&mut self, mut task: Task) -> &Task {
        task.order = self.tasks.len() as i64;
        self.tasks.push(task);
        &self.tasks[self.tasks.len() - 1]
    }

    /// Insert a task keeping its own `order`, after any task with the same
    /// order.
    pub fn insert(&mut self, task: Task) -> &Task {
        let idx = self.tasks.partition_point(|t| t.order <= task.order);
        self.tasks.insert(idx, task);
        &self.tasks[idx]
    }

    pub fn update(&mut self, id: &str, patch: TaskPatch, now: DateTime<Utc>) -> Result<&Task> {
        let task = self.get_mut(id)?;
        if let Some(title) = patch.title {
            task.title = title;
        }
        if let Some(description) = patch.description {
            task.description = description;
        }
        if let Some(completed) = patch.completed {
            task.completed = completed;
        }
        if let Some(due_date) = patch.due_date {
            task.due_date = due_date;
        }
        if let Some(priority) = patch.priority {
            task.priority = priority;
        }
        if let Some(project_id) = patch.project_id {
            task.project_id = project_id;
        }
        task.updated_at = now;
        Ok(&*task)
    }

    pub fn remove(&mut self, id: &str) -> Option<Task> {
        let idx = self.tasks.iter().position(|t| t.id == id)?;
        Some(self.tasks.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Tasks in list order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn last_sync(&self) -> Option<DateTime<Utc>> {
        self.last_sync
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Assign new `order` values and re-sort. Unknown ids are ignored; tasks
    /// not mentioned keep their current order value.
    pub fn reorder(&mut self, orders: &[(String, i64)]) {
        let wanted: HashMap<&str, i64> = orders.iter().map(|(id, o)| (id.as_str(), *o)).collect();
        for task in &mut self.tasks {
            if let Some(order) = wanted.get(task.id.as_str()) {
                task.order = *order;
            }
        }
        self.tasks.sort_by_key(|t| t.order);
    }

    /// Move a task to `position` (0-based) and renumber the whole list.
    pub fn move_to(&mut self, id: &str, position: usize) -> Result<()> {
        let from = self
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| not_found(id))?;
        let task = self.tasks.remove(from);
        let to = position.min(self.tasks.len());
        self.tasks.insert(to, task);
        for (i, task) in self.tasks.iter_mut().enumerate() {
            task.order = i as i64;
        }
        Ok(())
    }

    /// Clear `project_id` on every task of a deleted project. `updated_at` is
    /// left alone so focus time stays on the day it was earned. Returns the
    /// number of tasks detached.
    pub fn detach_project(&mut self, project_id: &str) -> usize {
        let mut detached = 0;
        for task in &mut self.tasks {
            if task.project_id.as_deref() == Some(project_id) {
                task.project_id = None;
                detached += 1;
            }
        }
        detached
    }

    /// Credit one pomodoro. Returns whether the task exists.
    pub fn increment_completed_pomodoros(&mut self, id: &str, at: DateTime<Utc>) -> bool {
        match self.get_mut(id) {
            Ok(task) => {
                task.completed_pomodoros += 1;
                task.updated_at = at;
                true
            }
            Err(_) => false,
        }
    }

    fn get_mut(&mut self, id: &str) -> Result<&mut Task> {
        self.tasks
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found(id).into())
    }
}

fn not_found(id: &str) -> ValidationError {
    ValidationError::NotFound {
        kind: "task",
        id: id.to_string(),
    }
}

/// In-process task store shared with a timer controller.
impl TaskLedger for RefCell<TaskStore> {
    fn find_task(&self, id: &str) -> Result<Option<Task>> {
        Ok(self.borrow().get(id).cloned())
    }

    fn increment_completed_intervals(&self, id: &str, at: DateTime<Utc>) -> Result<()> {
        if self.borrow_mut().increment_completed_pomodoros(id, at) {
            Ok(())
        } else {
            Err(not_found(id).into())
        }
    }
}
