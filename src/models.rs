// To-do data types and input validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest title accepted, in characters
pub const TITLE_MAX_LENGTH: usize = 200;

/// Rejected to-do input
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("タイトルを入力してください")]
    EmptyTitle,

    #[error("タイトルは200文字以内で入力してください")]
    TitleTooLong,
}

/// Trim a title and check its length
pub fn validate_title(raw: &str) -> Result<String, ValidationError> {
    let title = raw.trim();

    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    if title.chars().count() > TITLE_MAX_LENGTH {
        return Err(ValidationError::TitleTooLong);
    }

    Ok(title.to_string())
}

/// A stored to-do item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub title: String,
    pub completed: bool,
}

/// Validated input for creating a to-do
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoCreate {
    title: String,
}

impl TodoCreate {
    pub fn new(title: &str) -> Result<Self, ValidationError> {
        Ok(Self {
            title: validate_title(title)?,
        })
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn into_title(self) -> String {
        self.title
    }
}

/// Partial update; `None` fields are left unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
}

impl TodoUpdate {
    pub fn new(title: Option<&str>, completed: Option<bool>) -> Result<Self, ValidationError> {
        Ok(Self {
            title: title.map(validate_title).transpose()?,
            completed,
        })
    }

    pub fn completed(completed: bool) -> Self {
        Self {
            title: None,
            completed: Some(completed),
        }
    }
}

/// Body of `POST /todos`
#[derive(Debug, Default, Deserialize)]
pub struct TodoForm {
    #[serde(default)]
    pub title: String,
}
