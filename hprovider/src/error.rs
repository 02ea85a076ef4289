//! Shared provider error kinds, raw collaborator faults, and fault classifiers.
//!
//! ```rust
//! use hprovider::{ProviderError, classify_engine_fault};
//!
//! let unreachable = ProviderError::endpoint_unreachable("connection refused");
//! assert!(unreachable.retryable);
//!
//! let oom = classify_engine_fault("Cannot allocate memory for model weights");
//! assert!(!oom.message.is_empty());
//! ```

use std::error::Error;
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderErrorKind {
    EndpointUnreachable,
    ModelNotFound,
    EngineUnavailable,
    DownloadFailure,
    OutOfMemory,
    DeviceLost,
    EmptyResponse,
    UnsupportedLanguageOutput,
    InvalidRequest,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub kind: ProviderErrorKind,
    pub message: String,
    pub retryable: bool,
}

impl ProviderError {
    pub fn new(kind: ProviderErrorKind, message: impl Into<String>, retryable: bool) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable,
        }
    }

    pub fn endpoint_unreachable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::EndpointUnreachable, message, true)
    }

    pub fn model_not_found(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::ModelNotFound, message, false)
    }

    pub fn engine_unavailable(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::EngineUnavailable, message, false)
    }

    pub fn download_failure(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::DownloadFailure, message, true)
    }

    pub fn out_of_memory(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::OutOfMemory, message, true)
    }

    pub fn device_lost(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::DeviceLost, message, true)
    }

    pub fn empty_response(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::EmptyResponse, message, true)
    }

    pub fn unsupported_language_output(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::UnsupportedLanguageOutput, message, false)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::InvalidRequest, message, false)
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorKind::Other, message, false)
    }
}

impl Display for ProviderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl Error for ProviderError {}

/// Raw fault reported by an inference collaborator (engine runtime or
/// system model). Collaborators only speak human-readable messages; the
/// adapters turn those into structured [`ProviderError`] kinds before
/// anything crosses the dispatch boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineFault {
    pub message: String,
}

impl EngineFault {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Display for EngineFault {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for EngineFault {}

/// Classify a fault from the in-process engine into a structured error.
pub fn classify_engine_fault(message: &str) -> ProviderError {
    let lowered = message.to_lowercase();

    if lowered.contains("webgpu") {
        ProviderError::engine_unavailable(message)
    } else if lowered.contains("download") {
        ProviderError::download_failure(message)
    } else if lowered.contains("memory") {
        ProviderError::out_of_memory(message)
    } else if lowered.contains("device lost") {
        ProviderError::device_lost(message)
    } else {
        ProviderError::other(message)
    }
}

/// Classify a fault from the platform's on-device model into a structured error.
pub fn classify_system_fault(message: &str) -> ProviderError {
    let lowered = message.to_lowercase();

    if lowered.contains("untested language") {
        ProviderError::unsupported_language_output(message)
    } else if lowered.contains("unavailable") || lowered.contains("not available") {
        ProviderError::engine_unavailable(message)
    } else {
        ProviderError::other(message)
    }
}
