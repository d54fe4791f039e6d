//! Keyword classification of captured user input.
//!
//! Classification is an ordered cascade of case-insensitive substring tests.
//! The order is the contract: keyword sets overlap, and the first matching
//! rule wins (an input containing both "create" and "help" is `Create`).

/// The category assigned to a line of captured input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskCategory {
    Create,
    Read,
    Update,
    Delete,
    Help,
    General,
}

/// Classify user input by ordered substring match.
///
/// Pure function; the only normalization is lower-casing.
pub fn classify(input: &str) -> TaskCategory {
    let lower = input.to_lowercase();

    if lower.contains("create") {
        TaskCategory::Create
    } else if lower.contains("read") || lower.contains("analyze") {
        TaskCategory::Read
    } else if lower.contains("update") || lower.contains("edit") {
        TaskCategory::Update
    } else if lower.contains("delete") || lower.contains("remove") {
        TaskCategory::Delete
    } else if lower.contains("help") {
        TaskCategory::Help
    } else {
        TaskCategory::General
    }
}

impl TaskCategory {
    /// Canned response message for this category
    pub fn message(&self, input: &str) -> String {
        match self {
            TaskCategory::Create => format!("Creating task based on: \"{input}\""),
            TaskCategory::Read => format!("Reading/analyzing task: \"{input}\""),
            TaskCategory::Update => format!("Updating task: \"{input}\""),
            TaskCategory::Delete => format!("Deleting task: \"{input}\""),
            TaskCategory::Help => {
                "Help requested: Available commands - create, read, update, delete, stop"
                    .to_string()
            }
            TaskCategory::General => format!("Processing general task: \"{input}\""),
        }
    }
}
