//! Error types for chat orchestration.

use std::error::Error;
use std::fmt::{Display, Formatter};

use hprovider::{ProviderError, ProviderErrorKind};

use crate::store::{StoreError, StoreErrorKind};

/// Broad classification of a chat-layer failure.
///
/// The first four variants are produced by the controller itself before
/// any backend is involved. `Provider` and `Store` wrap failures bubbled
/// up from the layers below, keeping the original kind visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatErrorKind {
    /// The caller handed the controller something it refuses to act on.
    InvalidRequest,
    /// A dispatch is in flight and the operation cannot run concurrently.
    RequestInFlight,
    /// The operation needs a one-time user acknowledgement first.
    AcknowledgementRequired,
    /// No adapter is registered for the requested backend.
    UnknownProvider,
    /// A backend adapter failed.
    Provider(ProviderErrorKind),
    /// A persistence backend failed.
    Store(StoreErrorKind),
}

/// An error surfaced by the chat controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatError {
    pub kind: ChatErrorKind,
    pub message: String,
}

impl ChatError {
    pub fn new(kind: ChatErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::InvalidRequest, message)
    }

    pub fn request_in_flight(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::RequestInFlight, message)
    }

    pub fn acknowledgement_required(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::AcknowledgementRequired, message)
    }

    pub fn unknown_provider(message: impl Into<String>) -> Self {
        Self::new(ChatErrorKind::UnknownProvider, message)
    }
}

impl Display for ChatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ChatError {}

impl From<ProviderError> for ChatError {
    fn from(value: ProviderError) -> Self {
        ChatError::new(ChatErrorKind::Provider(value.kind), value.message)
    }
}

impl From<StoreError> for ChatError {
    fn from(value: StoreError) -> Self {
        ChatError::new(ChatErrorKind::Store(value.kind), value.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_keep_their_kind() {
        let source = ProviderError::model_not_found("no such model");
        let error = ChatError::from(source);

        assert_eq!(
            error.kind,
            ChatErrorKind::Provider(ProviderErrorKind::ModelNotFound)
        );
        assert_eq!(error.message, "no such model");
    }

    #[test]
    fn display_includes_kind_and_message() {
        let error = ChatError::request_in_flight("a dispatch is already in flight");
        assert_eq!(
            error.to_string(),
            "RequestInFlight: a dispatch is already in flight"
        );
    }
}
