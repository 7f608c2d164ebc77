use serde::{Deserialize, Serialize};
use validator::Validate;

/// A directory entry. Records are never updated after creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub id: String,
    pub name: String,
    pub nation: String,
}

/// Input for a new club, trimmed before validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct NewClub {
    #[validate(length(min = 1, message = "name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "nation cannot be empty"))]
    pub nation: String,
}

impl NewClub {
    pub fn new(name: impl Into<String>, nation: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            nation: nation.into().trim().to_string(),
        }
    }
}
