//! Provider abstractions and backend adapters for local chat inference.
//!
//! Everything a chat surface needs to talk to an inference backend
//! lives here: the dispatch request and event types, the adapter
//! contract, the static model catalog, and one adapter per supported
//! backend. Adapters stream their work; each dispatch yields load
//! progress and content deltas and terminates with exactly one
//! completion or one error.
//!
//! ```rust
//! use hprovider::{AdapterRegistry, ProviderKind, catalog};
//!
//! let registry = AdapterRegistry::new();
//! assert!(registry.get(ProviderKind::HttpServer).is_none());
//!
//! let providers = catalog::list_providers();
//! assert_eq!(providers.len(), 3);
//! ```

pub mod adapter;
pub mod adapters;
pub mod catalog;
pub mod error;
pub mod hooks;
pub mod model;
pub mod probe;
pub mod registry;
pub mod stream;

pub use adapter::{ProviderAdapter, ProviderFuture};
pub use error::{
    EngineFault, ProviderError, ProviderErrorKind, classify_engine_fault, classify_system_fault,
};
pub use hooks::{AdapterHooks, NoopAdapterHooks};
pub use model::{
    DEFAULT_SERVER_ENDPOINT, DEFAULT_SERVER_MODEL, DispatchRequest, HttpServerConfig,
    LocalEngineConfig, ProviderConfig, ProviderKind, SystemModelConfig, Turn, TurnRole,
};
pub use probe::{ProbeReport, ServerProbe};
pub use registry::AdapterRegistry;
pub use stream::{
    BoxedDispatchStream, DispatchEvent, DispatchStream, LoadProgress, LoadStage, VecDispatchStream,
};
