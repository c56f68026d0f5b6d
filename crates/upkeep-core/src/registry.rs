//! Ordered, immutable task registry.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{CoreError, TaskDescriptor};

/// Ordered list of task descriptors for one run.
///
/// Declaration order is execution order. Names are unique.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<TaskDescriptor>", into = "Vec<TaskDescriptor>")]
pub struct TaskRegistry {
    tasks: Vec<TaskDescriptor>,
}

impl TaskRegistry {
    /// Build a registry, validating names and commands.
    pub fn new(tasks: Vec<TaskDescriptor>) -> Result<Self, CoreError> {
        let mut seen = HashSet::new();
        for task in &tasks {
            if task.name.trim().is_empty() {
                return Err(CoreError::InvalidTask {
                    name: task.name.clone(),
                    reason: "name is empty".to_string(),
                });
            }
            if task.command.program.trim().is_empty() {
                return Err(CoreError::InvalidTask {
                    name: task.name.clone(),
                    reason: "program is empty".to_string(),
                });
            }
            if !seen.insert(task.name.as_str()) {
                return Err(CoreError::DuplicateTask(task.name.clone()));
            }
        }
        Ok(Self { tasks })
    }

    /// Parse a registry from a JSON array of descriptors.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        let tasks: Vec<TaskDescriptor> = serde_json::from_str(json)?;
        Self::new(tasks)
    }

    /// Keep only the named tasks, preserving registry order.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, CoreError> {
        for name in names {
            if self.get(name.as_ref()).is_none() {
                return Err(CoreError::TaskNotFound(name.as_ref().to_string()));
            }
        }
        let tasks = self
            .tasks
            .iter()
            .filter(|t| names.iter().any(|n| n.as_ref() == t.name))
            .cloned()
            .collect();
        Ok(Self { tasks })
    }

    /// Look up a descriptor by name.
    pub fn get(&self, name: &str) -> Option<&TaskDescriptor> {
        self.tasks.iter().find(|t| t.name == name)
    }

    /// Iterate descriptors in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, TaskDescriptor> {
        self.tasks.iter()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TryFrom<Vec<TaskDescriptor>> for TaskRegistry {
    type Error = CoreError;

    fn try_from(tasks: Vec<TaskDescriptor>) -> Result<Self, Self::Error> {
        Self::new(tasks)
    }
}

impl From<TaskRegistry> for Vec<TaskDescriptor> {
    fn from(registry: TaskRegistry) -> Self {
        registry.tasks
    }
}

impl<'a> IntoIterator for &'a TaskRegistry {
    type Item = &'a TaskDescriptor;
    type IntoIter = std::slice::Iter<'a, TaskDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TaskCommand;

    fn task(name: &str) -> TaskDescriptor {
        TaskDescriptor::new(name, TaskCommand::new("true"), format!("{} job", name))
    }

    #[test]
    fn test_preserves_declaration_order() {
        let registry = TaskRegistry::new(vec![task("c"), task("a"), task("b")]).unwrap();
        let names: Vec<_> = registry.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }

    #[test]
    fn test_rejects_duplicate_names() {
        let result = TaskRegistry::new(vec![task("a"), task("a")]);
        assert!(matches!(result, Err(CoreError::DuplicateTask(name)) if name == "a"));
    }

    #[test]
    fn test_rejects_empty_program() {
        let bad = TaskDescriptor::new("a", TaskCommand::new(" "), "");
        let result = TaskRegistry::new(vec![bad]);
        assert!(matches!(result, Err(CoreError::InvalidTask { .. })));
    }

    #[test]
    fn test_select_keeps_registry_order() {
        let registry = TaskRegistry::new(vec![task("a"), task("b"), task("c")]).unwrap();
        let subset = registry.select(&["c", "a"]).unwrap();
        let names: Vec<_> = subset.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["a", "c"]);
    }

    #[test]
    fn test_select_unknown_name() {
        let registry = TaskRegistry::new(vec![task("a")]).unwrap();
        let result = registry.select(&["missing"]);
        assert!(matches!(result, Err(CoreError::TaskNotFound(name)) if name == "missing"));
    }

    #[test]
    fn test_from_json() {
        let json = r#"[
            {"name": "prices", "command": {"program": "refresh", "args": ["--all"]}},
            {"name": "news", "command": {"program": "ingest"}, "description": "pull feeds"}
        ]"#;
        let registry = TaskRegistry::from_json(json).unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.get("news").unwrap().description, "pull feeds");
    }

    #[test]
    fn test_from_json_validates() {
        let json = r#"[
            {"name": "x", "command": {"program": "a"}},
            {"name": "x", "command": {"program": "b"}}
        ]"#;
        assert!(TaskRegistry::from_json(json).is_err());
    }
}
