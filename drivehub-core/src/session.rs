use crate::{CoreError, CoreResult};

/// Who is calling. Built by the adapter layer from the request and handed to every
/// service call that needs a privilege check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Actor {
    Customer,
    Admin { subject: String },
}

impl Actor {
    pub fn admin(subject: impl Into<String>) -> Self {
        Actor::Admin {
            subject: subject.into(),
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin { .. })
    }

    pub fn require_admin(&self) -> CoreResult<&str> {
        match self {
            Actor::Admin { subject } => Ok(subject),
            Actor::Customer => Err(CoreError::Forbidden("administrator session required".to_string())),
        }
    }
}
