use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub order: i64,
    pub created_at: DateTime<Utc>,
}

/// Projects ordered by `order`, then by creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectStore {
    projects: Vec<Project>,
    #[serde(default)]
    last_sync: Option<DateTime<Utc>>,
}

impl ProjectStore {
    pub fn set_projects(&mut self, mut projects: Vec<Project>, now: DateTime<Utc>) {
        sort_projects(&mut projects);
        self.projects = projects;
        self.last_sync = Some(now);
    }

    /// Create a project after the last one.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        color: Option<String>,
        now: DateTime<Utc>,
    ) -> &Project {
        let order = self.projects.iter().map(|p| p.order).max().unwrap_or(-1) + 1;
        self.insert(Project {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            color,
            order,
            created_at: now,
        })
    }

    /// Insert a project keeping its own `order`.
    pub fn insert(&mut self, project: Project) -> &Project {
        let key = (project.order, project.created_at);
        let idx = self
            .projects
            .partition_point(|p| (p.order, p.created_at) <= key);
        self.projects.insert(idx, project);
        &self.projects[idx]
    }

    pub fn rename(&mut self, id: &str, name: impl Into<String>) -> Result<&Project> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        project.name = name.into();
        Ok(&*project)
    }

    pub fn set_color(&mut self, id: &str, color: Option<String>) -> Result<&Project> {
        let project = self
            .projects
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| not_found(id))?;
        project.color = color;
        Ok(&*project)
    }

    pub fn remove(&mut self, id: &str) -> Option<Project> {
        let idx = self.projects.iter().position(|p| p.id == id)?;
        Some(self.projects.remove(idx))
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id == id)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Display name for a project id; unknown ids are shown as-is.
    pub fn name_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.get(id).map(|p| p.name.as_str()).unwrap_or(id)
    }

    pub fn reorder(&mut self, orders: &[(String, i64)]) {
        let wanted: HashMap<&str, i64> = orders.iter().map(|(id, o)| (id.as_str(), *o)).collect();
        for project in &mut self.projects {
            if let Some(order) = wanted.get(project.id.as_str()) {
                project.order = *order;
            }
        }
        sort_projects(&mut self.projects);
    }
}

fn sort_projects(projects: &mut [Project]) {
    projects.sort_by(|a, b| a.order.cmp(&b.order).then(a.created_at.cmp(&b.created_at)));
}

fn not_found(id: &str) -> crate::error::CoreError {
    ValidationError::NotFound {
        kind: "project",
        id: id.to_string(),
    }
    .into()
}
