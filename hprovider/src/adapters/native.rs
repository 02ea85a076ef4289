//! Adapter for the platform's built-in on-device text model.
//!
//! The platform API takes one flattened prompt string rather than a
//! structured transcript, so the adapter renders the conversation into
//! a prompt template. Streaming from these models is unreliable: when
//! the streaming call faults or produces nothing, the adapter retries
//! once with a single non-streaming call before giving up.

use std::pin::Pin;
use std::sync::{Arc, Mutex};

use async_stream::try_stream;
use futures_core::Stream;
use futures_util::StreamExt;

use crate::{
    AdapterHooks, BoxedDispatchStream, DispatchEvent, DispatchRequest, EngineFault,
    NoopAdapterHooks, ProviderAdapter, ProviderError, ProviderFuture, ProviderKind, Turn,
    TurnRole, classify_system_fault,
};

pub type SystemTextStream<'a> =
    Pin<Box<dyn Stream<Item = Result<String, EngineFault>> + Send + 'a>>;

/// The platform's built-in text model. One prompt string in, text out;
/// the platform owns whatever session state it needs.
pub trait SystemTextModel: Send + Sync {
    /// Create or reuse the platform session and run a minimal test
    /// prompt. An `Err` means the model cannot be used at all.
    fn probe<'a>(&'a self) -> ProviderFuture<'a, Result<(), EngineFault>>;

    fn stream_text<'a>(
        &'a self,
        prompt: &'a str,
    ) -> ProviderFuture<'a, Result<SystemTextStream<'a>, EngineFault>>;

    /// Single-shot generation used when streaming misbehaves.
    fn generate_text<'a>(
        &'a self,
        prompt: &'a str,
    ) -> ProviderFuture<'a, Result<String, EngineFault>>;

    fn discard<'a>(&'a self) -> ProviderFuture<'a, ()>;
}

/// Adapter for the system model backend.
pub struct SystemModelAdapter {
    model: Arc<dyn SystemTextModel>,
    /// Probe outcome cached until the next reset. `Err` holds the
    /// platform's reason for refusing the session.
    availability: Mutex<Option<Result<(), String>>>,
    hooks: Arc<dyn AdapterHooks>,
}

impl SystemModelAdapter {
    pub fn new(model: Arc<dyn SystemTextModel>) -> Self {
        Self::with_hooks(model, Arc::new(NoopAdapterHooks))
    }

    pub fn with_hooks(model: Arc<dyn SystemTextModel>, hooks: Arc<dyn AdapterHooks>) -> Self {
        Self {
            model,
            availability: Mutex::new(None),
            hooks,
        }
    }

    async fn ensure_available(&self) -> Result<(), ProviderError> {
        if let Some(cached) = self.cached_availability() {
            return cached.map_err(ProviderError::engine_unavailable);
        }

        let outcome: Result<(), String> =
            self.model.probe().await.map_err(|fault| fault.message);

        if let Ok(mut availability) = self.availability.lock() {
            *availability = Some(outcome.clone());
        }

        if outcome.is_ok() {
            self.hooks.on_engine_ready("system-model");
        }

        outcome.map_err(ProviderError::engine_unavailable)
    }

    fn cached_availability(&self) -> Option<Result<(), String>> {
        self.availability.lock().ok().and_then(|guard| guard.clone())
    }

    async fn recover_without_streaming(
        &self,
        prompt: &str,
        streamed: &str,
        fault: EngineFault,
    ) -> Result<String, ProviderError> {
        let error = classify_system_fault(&fault.message);

        // Deltas already reached the consumer; a retry would duplicate
        // them, so the fault is surfaced instead.
        if !streamed.is_empty() {
            return Err(error);
        }

        self.hooks.on_stream_fallback(ProviderKind::SystemModel, &error);

        let raw = self
            .model
            .generate_text(prompt)
            .await
            .map_err(|fault| classify_system_fault(&fault.message))?;
        let cleaned = strip_assistant_prefix(&raw).trim();

        if cleaned.is_empty() {
            return Err(ProviderError::empty_response(
                "the on-device model returned no content",
            ));
        }

        Ok(cleaned.to_string())
    }
}

impl ProviderAdapter for SystemModelAdapter {
    fn kind(&self) -> ProviderKind {
        ProviderKind::SystemModel
    }

    fn dispatch<'a>(&'a self, request: DispatchRequest) -> BoxedDispatchStream<'a> {
        let stream = try_stream! {
            prepare(&request)?;
            self.ensure_available().await?;

            let prompt = build_prompt(&request.transcript);

            let mut content = String::new();
            let mut stream_fault: Option<EngineFault> = None;

            match self.model.stream_text(&prompt).await {
                Ok(mut chunks) => {
                    while let Some(item) = chunks.next().await {
                        match item {
                            Ok(chunk) => {
                                let cleaned = strip_assistant_prefix(&chunk);
                                if cleaned.is_empty() {
                                    continue;
                                }

                                content.push_str(cleaned);
                                yield DispatchEvent::ContentDelta(cleaned.to_string());
                            }
                            Err(fault) => {
                                stream_fault = Some(fault);
                                break;
                            }
                        }
                    }

                    if stream_fault.is_none() && content.is_empty() {
                        stream_fault =
                            Some(EngineFault::new("streaming call produced no content"));
                    }
                }
                Err(fault) => stream_fault = Some(fault),
            }

            if let Some(fault) = stream_fault {
                content = self.recover_without_streaming(&prompt, &content, fault).await?;
                yield DispatchEvent::ContentDelta(content.clone());
            }

            yield DispatchEvent::Complete(Turn::assistant(content));
        };

        Box::pin(stream)
    }

    fn reset<'a>(&'a self) -> ProviderFuture<'a, ()> {
        Box::pin(async move {
            if let Ok(mut availability) = self.availability.lock() {
                *availability = None;
            }

            self.model.discard().await;
            self.hooks.on_engine_discarded("system-model", "reset");
        })
    }
}

fn prepare(request: &DispatchRequest) -> Result<(), ProviderError> {
    request.validate()?;
    request.config.clone().into_system_model()?;
    Ok(())
}

/// Render the transcript into the platform prompt template. The last
/// turn is the question; everything before it becomes labelled history.
fn build_prompt(transcript: &[Turn]) -> String {
    let (question, history) = match transcript.split_last() {
        Some((last, rest)) => (last.content.as_str(), rest),
        None => ("", transcript),
    };

    let lines = history
        .iter()
        .map(history_line)
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a helpful AI assistant. Please provide a response based on the \
         following conversation history and the user's latest question.\n\
         Maintain a friendly and professional tone.\n\n\
         Conversation history:\n{lines}\n\n\
         User's question: {question}\n\n\
         Assistant:"
    )
}

fn history_line(turn: &Turn) -> String {
    match turn.role {
        TurnRole::User => format!("User: {}", turn.content),
        TurnRole::Assistant => format!("Assistant: {}", turn.content),
    }
}

/// Platform models sometimes echo a role label at the start of their
/// output. Both the English and the Chinese label are removed.
fn strip_assistant_prefix(text: &str) -> &str {
    for label in ["Assistant:", "助手:"] {
        if let Some(head) = text.get(..label.len())
            && head.eq_ignore_ascii_case(label)
        {
            return text[label.len()..].trim_start();
        }
    }

    text
}

#[cfg(test)]
mod tests {
    use super::{build_prompt, strip_assistant_prefix};
    use crate::Turn;

    #[test]
    fn prompts_label_history_and_isolate_the_question() {
        let transcript = vec![
            Turn::user("What is Rust?"),
            Turn::assistant("A systems language."),
            Turn::user("Who makes it?"),
        ];

        let prompt = build_prompt(&transcript);
        assert!(prompt.contains(
            "Conversation history:\nUser: What is Rust?\nAssistant: A systems language.\n\n"
        ));
        assert!(prompt.contains("User's question: Who makes it?"));
        assert!(prompt.ends_with("Assistant:"));
    }

    #[test]
    fn single_turn_prompts_have_empty_history() {
        let prompt = build_prompt(&[Turn::user("hello")]);
        assert!(prompt.contains("Conversation history:\n\n\nUser's question: hello"));
    }

    #[test]
    fn role_labels_are_stripped_case_insensitively() {
        assert_eq!(strip_assistant_prefix("Assistant: hi"), "hi");
        assert_eq!(strip_assistant_prefix("ASSISTANT:hi"), "hi");
        assert_eq!(strip_assistant_prefix("助手: 你好"), "你好");
        assert_eq!(strip_assistant_prefix("plain text"), "plain text");
        assert_eq!(strip_assistant_prefix("中文开头的回答"), "中文开头的回答");
    }
}
