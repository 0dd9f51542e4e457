//! Project management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use focustodo_core::storage::Database;
use focustodo_core::ProjectStore;

use super::{print_json, resolve_id, CliResult};

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Add {
        /// Project name
        name: String,
        /// Display color, e.g. "#10b981"
        #[arg(long)]
        color: Option<String>,
    },
    /// List all projects in order
    List,
    /// Rename a project
    Rename {
        /// Project ID or unique prefix
        id: String,
        name: String,
    },
    /// Delete a project; its tasks become uncategorized
    Remove {
        /// Project ID or unique prefix
        id: String,
    },
    /// Move a project to a position in the list (0-based)
    Move {
        /// Project ID or unique prefix
        id: String,
        position: usize,
    },
}

fn project_id(projects: &ProjectStore, prefix: &str) -> Result<String, String> {
    resolve_id(
        "project",
        prefix,
        projects.projects().iter().map(|p| p.id.as_str()),
    )
}

/// New `(id, order)` pairs with `id` moved to `position`.
fn moved_order(projects: &ProjectStore, id: &str, position: usize) -> Vec<(String, i64)> {
    let mut ids: Vec<&str> = projects
        .projects()
        .iter()
        .map(|p| p.id.as_str())
        .filter(|p| *p != id)
        .collect();
    ids.insert(position.min(ids.len()), id);
    ids.into_iter()
        .enumerate()
        .map(|(i, id)| (id.to_string(), i as i64))
        .collect()
}

pub fn run(action: ProjectAction) -> CliResult {
    let db = Database::open()?;
    let mut projects = db.load_projects()?;

    match action {
        ProjectAction::Add { name, color } => {
            let project = projects.add(name, color, Utc::now()).clone();
            db.save_projects(&projects)?;
            eprintln!("Project created: {}", project.id);
            print_json(&project)?;
        }
        ProjectAction::List => print_json(projects.projects())?,
        ProjectAction::Rename { id, name } => {
            let id = project_id(&projects, &id)?;
            let project = projects.rename(&id, name)?.clone();
            db.save_projects(&projects)?;
            print_json(&project)?;
        }
        ProjectAction::Remove { id } => {
            let id = project_id(&projects, &id)?;
            projects.remove(&id);

            let mut tasks = db.load_tasks()?;
            let detached = tasks.detach_project(&id);
            db.save_tasks(&tasks)?;
            db.save_projects(&projects)?;
            println!("Project deleted: {id} ({detached} tasks uncategorized)");
        }
        ProjectAction::Move { id, position } => {
            let id = project_id(&projects, &id)?;
            let order = moved_order(&projects, &id, position);
            projects.reorder(&order);
            db.save_projects(&projects)?;
            let order: Vec<&str> = projects.projects().iter().map(|p| p.id.as_str()).collect();
            print_json(&order)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn moved_order_places_project() {
        let mut store = ProjectStore::default();
        let t = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let a = store.add("a", None, t).id.clone();
        let b = store.add("b", None, t).id.clone();
        let c = store.add("c", None, t).id.clone();

        let order = moved_order(&store, &c, 0);
        store.reorder(&order);
        let names: Vec<&str> = store.projects().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);

        let order = moved_order(&store, &c, 99);
        store.reorder(&order);
        let ids: Vec<&str> = store.projects().iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec![a.as_str(), b.as_str(), c.as_str()]);
    }
}
