//! Production-friendly observability hooks for the chat and adapter layers.
//!
//! ```rust
//! use hobserve::{MetricsObservabilityHooks, SafeChatHooks, TracingObservabilityHooks};
//!
//! let _chat_hooks = SafeChatHooks::new(TracingObservabilityHooks);
//! let _metrics = MetricsObservabilityHooks;
//! ```

mod metrics_hooks;
mod safe_hooks;
mod tracing_hooks;

pub use metrics_hooks::MetricsObservabilityHooks;
pub use safe_hooks::{SafeAdapterHooks, SafeChatHooks};
pub use tracing_hooks::TracingObservabilityHooks;

pub mod prelude {
    pub use crate::{
        MetricsObservabilityHooks, SafeAdapterHooks, SafeChatHooks, TracingObservabilityHooks,
    };
}

#[cfg(test)]
mod tests;
