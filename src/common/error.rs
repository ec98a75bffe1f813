//! Errors surfaced at the world's API boundary. Nothing inside `advance` fails.

use std::fmt;

use crate::objects::BodyHandle;

#[derive(Debug)]
pub enum PhysicsError {
    /// The handle was never issued by this world, or its body was removed.
    UnknownBody(BodyHandle),
    /// A body was submitted with a NaN or infinite component.
    NonFiniteState { field: &'static str },
    /// A config document could not be parsed.
    Config(serde_json::Error),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PhysicsError::UnknownBody(handle) => write!(f, "unknown body {handle}"),
            PhysicsError::NonFiniteState { field } => {
                write!(f, "body {field} must be finite")
            }
            PhysicsError::Config(err) => write!(f, "invalid physics config: {err}"),
        }
    }
}

impl std::error::Error for PhysicsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PhysicsError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for PhysicsError {
    fn from(err: serde_json::Error) -> Self {
        PhysicsError::Config(err)
    }
}
