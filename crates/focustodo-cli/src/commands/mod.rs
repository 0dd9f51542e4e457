pub mod config;
pub mod project;
pub mod stats;
pub mod task;
pub mod timer;

use serde::Serialize;

pub type CliResult = Result<(), Box<dyn std::error::Error>>;

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Resolve a full id from a unique prefix.
pub fn resolve_id<'a, I>(kind: &str, prefix: &str, ids: I) -> Result<String, String>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut matches = ids.into_iter().filter(|id| id.starts_with(prefix));
    match (matches.next(), matches.next()) {
        (Some(id), None) => Ok(id.to_string()),
        (None, _) => Err(format!("no {kind} matches '{prefix}'")),
        (Some(_), Some(_)) => Err(format!("'{prefix}' matches more than one {kind}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_unique_prefix() {
        let ids = ["3f2a-1", "3f9b-2", "a001"];
        assert_eq!(resolve_id("task", "3f2", ids).unwrap(), "3f2a-1");
        assert_eq!(resolve_id("task", "a001", ids).unwrap(), "a001");
        assert!(resolve_id("task", "3f", ids).unwrap_err().contains("more than one"));
        assert!(resolve_id("task", "zz", ids).unwrap_err().contains("no task"));
    }
}
