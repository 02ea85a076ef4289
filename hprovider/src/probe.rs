//! Connectivity probe contract for the HTTP model server.

use crate::{ProviderError, ProviderFuture};

/// Outcome of one successful round-trip to the server: its reported
/// version and whether the configured model appears in its catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeReport {
    pub version: String,
    pub model_present: bool,
}

/// One-shot reachability check against a configured endpoint. An `Err`
/// means the endpoint could not be reached at all; a report with
/// `model_present: false` means the server answered but does not serve
/// the requested model.
pub trait ServerProbe: Send + Sync {
    fn probe<'a>(
        &'a self,
        endpoint: &'a str,
        model: &'a str,
    ) -> ProviderFuture<'a, Result<ProbeReport, ProviderError>>;
}
