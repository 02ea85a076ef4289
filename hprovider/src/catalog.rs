//! Static catalog of selectable backends and downloadable engine models.
//!
//! Pure lookups over compiled-in data; nothing here touches the network
//! or an engine.
//!
//! ```rust
//! use hprovider::{ProviderKind, catalog};
//!
//! let providers = catalog::list_providers();
//! assert_eq!(providers.len(), 3);
//!
//! let default = catalog::default_model(ProviderKind::LocalEngine).expect("engine default");
//! assert_eq!(default.id, catalog::DEFAULT_ENGINE_MODEL);
//! ```

use std::fmt::{Display, Formatter};

use hcommon::SamplingOptions;

use crate::{ProviderError, ProviderKind};

/// Engine model loaded when the user has never picked one.
pub const DEFAULT_ENGINE_MODEL: &str = "Qwen2.5-0.5B-Instruct-q4f16_1-MLC";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelFamily {
    Llama,
    Phi,
    Mistral,
    Gemma,
    Qwen,
    SmolLm,
    TinyLlama,
    QwenCoder,
    QwenMath,
}

impl Display for ModelFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = match self {
            Self::Llama => "llama",
            Self::Phi => "phi",
            Self::Mistral => "mistral",
            Self::Gemma => "gemma",
            Self::Qwen => "qwen",
            Self::SmolLm => "smollm",
            Self::TinyLlama => "tinyllama",
            Self::QwenCoder => "qwen-coder",
            Self::QwenMath => "qwen-math",
        };

        f.write_str(id)
    }
}

/// Static descriptive record for one downloadable engine model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelCatalogEntry {
    pub id: &'static str,
    pub name: &'static str,
    pub display_name: &'static str,
    pub vendor: &'static str,
    pub family: ModelFamily,
    pub size: &'static str,
    pub description: &'static str,
    pub category: &'static str,
    pub quantization: &'static str,
    /// Context window in thousands of tokens.
    pub context_window_k: u32,
    pub newly_added: bool,
    pub recommended: SamplingOptions,
}

/// Named grouping of catalog entries for selection UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelCategory {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
}

/// Display metadata for one selectable backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProviderDescriptor {
    pub kind: ProviderKind,
    pub name: &'static str,
    pub blurb: &'static str,
}

const fn sampling(temperature: f32, top_p: f32) -> SamplingOptions {
    SamplingOptions {
        temperature: Some(temperature),
        top_p: Some(top_p),
        presence_penalty: None,
        frequency_penalty: None,
    }
}

const fn sampling_full(
    temperature: f32,
    top_p: f32,
    presence_penalty: f32,
    frequency_penalty: f32,
) -> SamplingOptions {
    SamplingOptions {
        temperature: Some(temperature),
        top_p: Some(top_p),
        presence_penalty: Some(presence_penalty),
        frequency_penalty: Some(frequency_penalty),
    }
}

static PROVIDERS: [ProviderDescriptor; 3] = [
    ProviderDescriptor {
        kind: ProviderKind::HttpServer,
        name: "Local server",
        blurb: "Chat with a model served by a locally hosted HTTP model server.",
    },
    ProviderDescriptor {
        kind: ProviderKind::LocalEngine,
        name: "In-process engine",
        blurb: "Download a model once and run it on the local accelerator.",
    },
    ProviderDescriptor {
        kind: ProviderKind::SystemModel,
        name: "System model",
        blurb: "Use the platform's built-in on-device model. Experimental.",
    },
];

static MODEL_CATEGORIES: [ModelCategory; 9] = [
    ModelCategory {
        id: "qwen",
        name: "Qwen",
        description: "Qwen series models",
    },
    ModelCategory {
        id: "qwen-coder",
        name: "Qwen Coder",
        description: "Qwen code generation models",
    },
    ModelCategory {
        id: "qwen-math",
        name: "Qwen Math",
        description: "Qwen mathematical reasoning models",
    },
    ModelCategory {
        id: "llama",
        name: "Llama",
        description: "Llama series models",
    },
    ModelCategory {
        id: "tinyllama",
        name: "TinyLlama",
        description: "TinyLlama lightweight models",
    },
    ModelCategory {
        id: "mistral",
        name: "Mistral",
        description: "Mistral series models",
    },
    ModelCategory {
        id: "phi",
        name: "Phi",
        description: "Phi series models",
    },
    ModelCategory {
        id: "gemma",
        name: "Gemma",
        description: "Gemma series models",
    },
    ModelCategory {
        id: "smollm",
        name: "SmolLM",
        description: "SmolLM lightweight models",
    },
];

static ENGINE_MODELS: [ModelCatalogEntry; 13] = [
    ModelCatalogEntry {
        id: "Qwen2.5-7B-Instruct-q4f16_1-MLC",
        name: "Qwen2.5-7B-Instruct",
        display_name: "Qwen",
        vendor: "Alibaba",
        family: ModelFamily::Qwen,
        size: "7B",
        description: "Qwen 2.5 7B instruct model",
        category: "qwen",
        quantization: "Q4F16",
        context_window_k: 32,
        newly_added: false,
        recommended: sampling(0.7, 0.8),
    },
    ModelCatalogEntry {
        id: "SmolLM2-135M-Instruct-q0f16-MLC",
        name: "SmolLM2-135M-Instruct",
        display_name: "SmolLM",
        vendor: "HuggingFaceTB",
        family: ModelFamily::SmolLm,
        size: "135M",
        description: "Lightweight 135M-parameter instruct model",
        category: "smollm",
        quantization: "Q0F16",
        context_window_k: 4,
        newly_added: true,
        recommended: sampling_full(1.0, 1.0, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "SmolLM2-360M-Instruct-q0f16-MLC",
        name: "SmolLM2-360M-Instruct",
        display_name: "SmolLM",
        vendor: "HuggingFaceTB",
        family: ModelFamily::SmolLm,
        size: "360M",
        description: "Lightweight 360M-parameter instruct model",
        category: "smollm",
        quantization: "Q0F16",
        context_window_k: 4,
        newly_added: true,
        recommended: sampling_full(1.0, 1.0, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "TinyLlama-1.1B-Chat-v1.0-q4f16_1-MLC",
        name: "TinyLlama-1.1B-Chat",
        display_name: "TinyLlama",
        vendor: "Zhang Peiyuan",
        family: ModelFamily::TinyLlama,
        size: "1.1B",
        description: "Lightweight 1.1B-parameter chat model",
        category: "tinyllama",
        quantization: "Q4F16",
        context_window_k: 4,
        newly_added: true,
        recommended: sampling_full(1.0, 1.0, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "Qwen2.5-0.5B-Instruct-q4f16_1-MLC",
        name: "Qwen2.5-0.5B-Instruct",
        display_name: "Qwen",
        vendor: "Alibaba",
        family: ModelFamily::Qwen,
        size: "0.5B",
        description: "Alibaba's latest lightweight instruct model",
        category: "qwen",
        quantization: "Q4F16",
        context_window_k: 32,
        newly_added: true,
        recommended: sampling_full(0.7, 0.8, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "Qwen2.5-Coder-0.5B-Instruct-q4f16_1-MLC",
        name: "Qwen2.5-Coder-0.5B-Instruct",
        display_name: "Qwen Coder",
        vendor: "Alibaba",
        family: ModelFamily::QwenCoder,
        size: "0.5B",
        description: "Alibaba's lightweight code generation model",
        category: "qwen-coder",
        quantization: "Q4F16",
        context_window_k: 32,
        newly_added: true,
        recommended: sampling_full(0.7, 0.8, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "Qwen2-Math-1.5B-Instruct-q4f16_1-MLC",
        name: "Qwen2-Math-1.5B-Instruct",
        display_name: "Qwen Math",
        vendor: "Alibaba",
        family: ModelFamily::QwenMath,
        size: "1.5B",
        description: "Alibaba's mathematical reasoning model",
        category: "qwen-math",
        quantization: "Q4F16",
        context_window_k: 32,
        newly_added: true,
        recommended: sampling_full(1.0, 0.8, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "Phi-3-mini-4k-instruct-q4f16_1-MLC",
        name: "Phi-3-mini",
        display_name: "Phi",
        vendor: "Microsoft",
        family: ModelFamily::Phi,
        size: "3B",
        description: "Microsoft's latest small efficient model",
        category: "phi",
        quantization: "Q4F16",
        context_window_k: 4,
        newly_added: true,
        recommended: sampling_full(0.7, 1.0, 0.0, 0.0),
    },
    ModelCatalogEntry {
        id: "Qwen2.5-4B-Instruct-q4f16_1-MLC",
        name: "Qwen2.5-4B-Instruct",
        display_name: "Qwen",
        vendor: "Alibaba",
        family: ModelFamily::Qwen,
        size: "4B",
        description: "Qwen 2.5 4B instruct model",
        category: "qwen",
        quantization: "Q4F16",
        context_window_k: 32,
        newly_added: false,
        recommended: sampling(0.7, 0.8),
    },
    ModelCatalogEntry {
        id: "Llama-2-7b-chat-hf-q4f16_1-MLC",
        name: "Llama-2-7B-Chat",
        display_name: "Llama",
        vendor: "Meta",
        family: ModelFamily::Llama,
        size: "7B",
        description: "Llama 2 7B chat model",
        category: "llama",
        quantization: "Q4F16",
        context_window_k: 4,
        newly_added: false,
        recommended: sampling(0.6, 0.9),
    },
    ModelCatalogEntry {
        id: "Mistral-7B-Instruct-v0.2-q4f16_1-MLC",
        name: "Mistral-7B-Instruct",
        display_name: "Mistral",
        vendor: "Mistral AI",
        family: ModelFamily::Mistral,
        size: "7B",
        description: "Mistral 7B instruct model",
        category: "mistral",
        quantization: "Q4F16",
        context_window_k: 8,
        newly_added: false,
        recommended: sampling(0.7, 0.95),
    },
    ModelCatalogEntry {
        id: "Phi-2-q4f16_1-MLC",
        name: "Phi-2",
        display_name: "Phi",
        vendor: "Microsoft",
        family: ModelFamily::Phi,
        size: "2.7B",
        description: "Phi-2 model",
        category: "phi",
        quantization: "Q4F16",
        context_window_k: 4,
        newly_added: false,
        recommended: sampling(0.7, 0.95),
    },
    ModelCatalogEntry {
        id: "gemma-2-2b-it-q4f16_1-MLC",
        name: "Gemma-2B-IT",
        display_name: "Gemma",
        vendor: "Google",
        family: ModelFamily::Gemma,
        size: "2B",
        description: "Gemma 2B IT model",
        category: "gemma",
        quantization: "Q4F16",
        context_window_k: 8,
        newly_added: false,
        recommended: sampling(0.7, 0.95),
    },
];

/// The fixed set of selectable backends.
pub fn list_providers() -> &'static [ProviderDescriptor] {
    &PROVIDERS
}

/// Every model the in-process engine can download and run.
pub fn engine_models() -> &'static [ModelCatalogEntry] {
    &ENGINE_MODELS
}

/// Catalog entries for one backend. Only the local engine has a model
/// catalog; the server reports its own models and the system model has
/// exactly one implicit choice.
pub fn models_for(kind: ProviderKind) -> &'static [ModelCatalogEntry] {
    match kind {
        ProviderKind::LocalEngine => &ENGINE_MODELS,
        ProviderKind::HttpServer | ProviderKind::SystemModel => &[],
    }
}

pub fn default_model(kind: ProviderKind) -> Option<&'static ModelCatalogEntry> {
    match kind {
        ProviderKind::LocalEngine => find_model(DEFAULT_ENGINE_MODEL),
        ProviderKind::HttpServer | ProviderKind::SystemModel => None,
    }
}

pub fn find_model(id: &str) -> Option<&'static ModelCatalogEntry> {
    ENGINE_MODELS.iter().find(|entry| entry.id == id)
}

/// Look up an engine model, failing with `ModelNotFound` when the id is
/// not in the catalog.
pub fn require_engine_model(id: &str) -> Result<&'static ModelCatalogEntry, ProviderError> {
    find_model(id)
        .ok_or_else(|| ProviderError::model_not_found(format!("no engine model named '{id}'")))
}

pub fn model_categories() -> &'static [ModelCategory] {
    &MODEL_CATEGORIES
}

pub fn models_in_category<'a>(
    category: &'a str,
) -> impl Iterator<Item = &'static ModelCatalogEntry> + 'a {
    ENGINE_MODELS.iter().filter(move |entry| entry.category == category)
}
