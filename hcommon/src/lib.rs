//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use hcommon::{Registry, SamplingOptions};
//!
//! let sampling = SamplingOptions::default().with_temperature(0.3).with_top_p(0.9);
//! let mut endpoints = Registry::new();
//! endpoints.insert("http-server".to_string(), "http://localhost:11435");
//!
//! assert_eq!(sampling.temperature, Some(0.3));
//! assert!(endpoints.contains_key("http-server"));
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use hcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod model {
    //! Shared sampling settings used by model configurations.
    //!
    //! ```rust
    //! use hcommon::SamplingOptions;
    //!
    //! let sampling = SamplingOptions::default()
    //!     .with_temperature(0.7)
    //!     .with_top_p(0.9)
    //!     .with_presence_penalty(0.2);
    //!
    //! assert_eq!(sampling.temperature, Some(0.7));
    //! assert_eq!(sampling.top_p, Some(0.9));
    //! assert_eq!(sampling.frequency_penalty, None);
    //! ```

    #[derive(Debug, Clone, Copy, PartialEq, Default)]
    pub struct SamplingOptions {
        pub temperature: Option<f32>,
        pub top_p: Option<f32>,
        pub presence_penalty: Option<f32>,
        pub frequency_penalty: Option<f32>,
    }

    impl SamplingOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = Some(temperature);
            self
        }

        pub fn with_top_p(mut self, top_p: f32) -> Self {
            self.top_p = Some(top_p);
            self
        }

        pub fn with_presence_penalty(mut self, presence_penalty: f32) -> Self {
            self.presence_penalty = Some(presence_penalty);
            self
        }

        pub fn with_frequency_penalty(mut self, frequency_penalty: f32) -> Self {
            self.frequency_penalty = Some(frequency_penalty);
            self
        }
    }
}

pub mod registry {
    //! Generic keyed collection backing the provider adapter registry.
    //!
    //! Keys are usually small enums (a provider kind) or model
    //! identifiers; `Borrow`-keyed lookups let a `String`-keyed registry
    //! answer `&str` queries.
    //!
    //! ```rust
    //! use hcommon::Registry;
    //!
    //! let mut models = Registry::new();
    //! models.insert("qwen2.5:14b".to_string(), 0.3_f32);
    //!
    //! assert_eq!(models.get("qwen2.5:14b"), Some(&0.3));
    //! assert!(models.contains_key("qwen2.5:14b"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.remove(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn values(&self) -> impl Iterator<Item = &V> {
            self.items.values()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use future::BoxFuture;
pub use model::SamplingOptions;
pub use registry::Registry;
