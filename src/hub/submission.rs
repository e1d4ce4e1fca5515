//! Connectionless Submissions
//!
//! A submission injects `"{username}: {message}"` into the broadcast flow.
//! There is no originating connection, so every open connection receives it.

use thiserror::Error;

use super::broadcaster::{BroadcastReport, Broadcaster};

/// Errors returned by [`Broadcaster::submit`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    /// Username or message missing or empty
    #[error("Username and message are required")]
    Validation,
}

/// Build the broadcast payload for a submission
pub fn compose_message(username: Option<&str>, message: Option<&str>) -> Result<String, SubmitError> {
    match (username, message) {
        (Some(username), Some(message)) if !username.is_empty() && !message.is_empty() => {
            Ok(format!("{}: {}", username, message))
        }
        _ => Err(SubmitError::Validation),
    }
}

impl Broadcaster {
    /// Validate and broadcast a submission to all open connections
    pub async fn submit(
        &self,
        username: Option<&str>,
        message: Option<&str>,
    ) -> Result<BroadcastReport, SubmitError> {
        let payload = compose_message(username, message)?;

        tracing::info!(payload = %payload, "Broadcasting submission");
        Ok(self.broadcast(&payload, None).await)
    }
}
