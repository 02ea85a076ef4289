//! Streaming dispatch event contracts and in-memory stream utilities.
//!
//! ```rust
//! use hprovider::{BoxedDispatchStream, DispatchEvent, VecDispatchStream};
//!
//! let stream = VecDispatchStream::new(vec![Ok(DispatchEvent::ContentDelta("hello".into()))]);
//! let _boxed: BoxedDispatchStream<'static> = Box::pin(stream);
//! ```

use std::collections::VecDeque;
use std::fmt::{Display, Formatter};
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::{ProviderError, Turn};

/// Human-readable lifecycle stage derived from a load fraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Preparing,
    Downloading,
    Loading,
    Complete,
}

impl LoadStage {
    /// Stage thresholds: `0` preparing, `(0, 0.9)` downloading,
    /// `[0.9, 1)` loading, `1` complete.
    pub fn from_fraction(fraction: f32) -> Self {
        if fraction <= 0.0 {
            Self::Preparing
        } else if fraction < 0.9 {
            Self::Downloading
        } else if fraction < 1.0 {
            Self::Loading
        } else {
            Self::Complete
        }
    }
}

impl Display for LoadStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Preparing => "preparing",
            Self::Downloading => "downloading",
            Self::Loading => "loading",
            Self::Complete => "complete",
        };

        f.write_str(label)
    }
}

/// One engine-load progress report: a fraction in `[0, 1]`, the stage
/// label derived from it, and an optional collaborator-provided note.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadProgress {
    pub fraction: f32,
    pub stage: LoadStage,
    pub detail: Option<String>,
}

impl LoadProgress {
    pub fn at(fraction: f32) -> Self {
        Self {
            fraction,
            stage: LoadStage::from_fraction(fraction),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DispatchEvent {
    Progress(LoadProgress),
    ContentDelta(String),
    Complete(Turn),
}

/// Dispatch stream contract.
///
/// Invariants for consumers:
/// - Events are emitted in source order.
/// - `Progress` and `ContentDelta` may appear zero or more times.
/// - Exactly one `Complete` event or one `Err` item terminates the
///   stream, never both; nothing follows the terminator.
/// - The concatenation of `ContentDelta` payloads in emission order is
///   the full assistant response carried by `Complete`.
pub trait DispatchStream: Stream<Item = Result<DispatchEvent, ProviderError>> + Send {}

impl<T> DispatchStream for T where T: Stream<Item = Result<DispatchEvent, ProviderError>> + Send {}

pub type BoxedDispatchStream<'a> = Pin<Box<dyn DispatchStream + 'a>>;

#[derive(Debug)]
pub struct VecDispatchStream {
    events: VecDeque<Result<DispatchEvent, ProviderError>>,
}

impl VecDispatchStream {
    pub fn new(events: Vec<Result<DispatchEvent, ProviderError>>) -> Self {
        Self {
            events: events.into(),
        }
    }
}

impl Stream for VecDispatchStream {
    type Item = Result<DispatchEvent, ProviderError>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<DispatchEvent, ProviderError>>> {
        Poll::Ready(self.events.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::{LoadProgress, LoadStage};

    #[test]
    fn stages_follow_the_fraction_thresholds() {
        assert_eq!(LoadStage::from_fraction(0.0), LoadStage::Preparing);
        assert_eq!(LoadStage::from_fraction(0.01), LoadStage::Downloading);
        assert_eq!(LoadStage::from_fraction(0.89), LoadStage::Downloading);
        assert_eq!(LoadStage::from_fraction(0.9), LoadStage::Loading);
        assert_eq!(LoadStage::from_fraction(0.99), LoadStage::Loading);
        assert_eq!(LoadStage::from_fraction(1.0), LoadStage::Complete);
    }

    #[test]
    fn progress_snapshots_derive_their_stage() {
        let progress = LoadProgress::at(0.5).with_detail("fetching shard 3 of 12");
        assert_eq!(progress.stage, LoadStage::Downloading);
        assert_eq!(progress.detail.as_deref(), Some("fetching shard 3 of 12"));

        let done = LoadProgress::at(1.0);
        assert_eq!(done.stage, LoadStage::Complete);
        assert_eq!(done.stage.to_string(), "complete");
    }
}
