//! Timeout wrapper applied to every collaborator call.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use crate::domain::errors::{Collaborator, CollaboratorError};

/// Await `call` for at most `limit`.
///
/// A collaborator error or an elapsed timeout both come back as a
/// [`CollaboratorError`]; callers decide how to degrade.
pub async fn bounded<T, E, F>(
    collaborator: Collaborator,
    limit: Duration,
    call: F,
) -> Result<T, CollaboratorError>
where
    F: Future<Output = Result<T, E>>,
    E: Display,
{
    match tokio::time::timeout(limit, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(CollaboratorError::unavailable(collaborator, err.to_string())),
        Err(_) => Err(CollaboratorError::Timeout {
            collaborator,
            after: limit,
        }),
    }
}
