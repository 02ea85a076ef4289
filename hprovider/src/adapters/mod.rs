//! Adapter implementations for the concrete inference backends.
//!
//! Each adapter is feature gated so downstreams can compile only the
//! backends they ship. All three are enabled by default.

#[cfg(feature = "adapter-engine")]
pub mod engine;

#[cfg(feature = "adapter-http")]
pub mod http;

#[cfg(feature = "adapter-native")]
pub mod native;
