use std::future::Future;
use std::pin::Pin;

use crate::{BoxedDispatchStream, DispatchRequest, ProviderKind};

pub type ProviderFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Common contract implemented by all three backend adapters.
///
/// `dispatch` never fails eagerly: every fault, including request
/// validation, is delivered as the terminating `Err` item of the
/// returned stream.
pub trait ProviderAdapter: Send + Sync {
    fn kind(&self) -> ProviderKind;

    fn dispatch<'a>(&'a self, request: DispatchRequest) -> BoxedDispatchStream<'a>;

    /// Discard the adapter's engine instance and any per-conversation
    /// state. Used on explicit conversation clear and on provider switch.
    fn reset<'a>(&'a self) -> ProviderFuture<'a, ()>;
}
