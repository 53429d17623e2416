//! Errors raised by the actor plumbing itself.

use std::error::Error;

/// Errors that can occur within the actor framework.
#[derive(Debug, thiserror::Error)]
pub enum FrameworkError {
    #[error("Actor closed")]
    ActorClosed,
    #[error("Actor dropped response channel")]
    ActorDropped,
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Item already exists: {0}")]
    AlreadyExists(String),
    #[error("Entity error: {0}")]
    EntityError(Box<dyn Error + Send + Sync>),
}

impl FrameworkError {
    /// Borrows the entity error if it is of type `E`.
    pub fn entity_error<E: Error + 'static>(&self) -> Option<&E> {
        match self {
            FrameworkError::EntityError(inner) => inner.downcast_ref::<E>(),
            _ => None,
        }
    }

    /// Recovers an owned entity error of type `E`, handing `self` back otherwise.
    pub fn into_entity_error<E: Error + 'static>(self) -> Result<E, FrameworkError> {
        match self {
            FrameworkError::EntityError(inner) => match inner.downcast::<E>() {
                Ok(typed) => Ok(*typed),
                Err(other) => Err(FrameworkError::EntityError(other)),
            },
            other => Err(other),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, FrameworkError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq, thiserror::Error)]
    #[error("node busy")]
    struct Busy;

    #[derive(Debug, thiserror::Error)]
    #[error("other")]
    struct Other;

    #[test]
    fn test_entity_error_downcast_round_trip() {
        let err = FrameworkError::EntityError(Box::new(Busy));
        assert_eq!(err.entity_error::<Busy>(), Some(&Busy));
        assert!(err.entity_error::<Other>().is_none());
        assert_eq!(err.into_entity_error::<Busy>().unwrap(), Busy);
    }

    #[test]
    fn test_into_entity_error_keeps_plumbing_errors() {
        let err = FrameworkError::NotFound("node_7".into()).into_entity_error::<Busy>();
        assert!(matches!(err, Err(FrameworkError::NotFound(id)) if id == "node_7"));
    }
}
