use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An operating city. Only active locations are offered to customers.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Location {
    pub id: Uuid,
    pub name: String,
    pub active: bool,
}

impl Location {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            active: true,
        }
    }
}
