/// Creates a single [`Turn`](crate::Turn) from a role shorthand.
///
/// ```rust
/// use hush::{TurnRole, hush_turn};
///
/// let turn = hush_turn!(assistant => "Done.");
/// assert_eq!(turn.role, TurnRole::Assistant);
/// assert_eq!(turn.content, "Done.");
/// ```
#[macro_export]
macro_rules! hush_turn {
    (user => $content:expr $(,)?) => {
        $crate::Turn::user($content)
    };
    (assistant => $content:expr $(,)?) => {
        $crate::Turn::assistant($content)
    };
    ($role:ident => $content:expr $(,)?) => {
        compile_error!("unsupported role: use user or assistant");
    };
}

/// Creates a `Vec<Turn>` from role/content pairs.
///
/// ```rust
/// use hush::{TurnRole, hush_transcript};
///
/// let transcript = hush_transcript![
///     user => "What is the tallest mountain?",
///     assistant => "Mount Everest.",
/// ];
///
/// assert_eq!(transcript.len(), 2);
/// assert_eq!(transcript[0].role, TurnRole::User);
/// assert_eq!(transcript[1].role, TurnRole::Assistant);
/// ```
#[macro_export]
macro_rules! hush_transcript {
    () => {
        Vec::<$crate::Turn>::new()
    };
    ($($role:ident => $content:expr),+ $(,)?) => {
        vec![$($crate::hush_turn!($role => $content)),+]
    };
}

/// Creates a [`ChatSettings`](crate::ChatSettings) with provider shorthand
/// support.
///
/// ```rust
/// use hush::{ProviderKind, hush_settings};
///
/// let settings = hush_settings!(engine, "Qwen2.5-0.5B-Instruct-q4f16_1-MLC");
/// assert_eq!(settings.provider, ProviderKind::LocalEngine);
/// assert_eq!(settings.engine.model, "Qwen2.5-0.5B-Instruct-q4f16_1-MLC");
/// ```
#[macro_export]
macro_rules! hush_settings {
    (server $(,)?) => {
        $crate::ChatSettings {
            provider: $crate::ProviderKind::HttpServer,
            ..Default::default()
        }
    };
    (http $(,)?) => {
        $crate::hush_settings!(server)
    };
    (engine $(,)?) => {
        $crate::ChatSettings {
            provider: $crate::ProviderKind::LocalEngine,
            ..Default::default()
        }
    };
    (local $(,)?) => {
        $crate::hush_settings!(engine)
    };
    (native $(,)?) => {
        $crate::ChatSettings {
            provider: $crate::ProviderKind::SystemModel,
            ..Default::default()
        }
    };
    (system $(,)?) => {
        $crate::hush_settings!(native)
    };
    ($provider:expr $(,)?) => {
        $crate::ChatSettings {
            provider: $provider,
            ..Default::default()
        }
    };
    (server, $model:expr $(,)?) => {{
        let mut settings = $crate::hush_settings!(server);
        settings.server.model = $model.into();
        settings
    }};
    (http, $model:expr $(,)?) => {
        $crate::hush_settings!(server, $model)
    };
    (engine, $model:expr $(,)?) => {{
        let mut settings = $crate::hush_settings!(engine);
        settings.engine.model = $model.into();
        settings
    }};
    (local, $model:expr $(,)?) => {
        $crate::hush_settings!(engine, $model)
    };
    (engine, $model:expr, $temperature:expr $(,)?) => {{
        let mut settings = $crate::hush_settings!(engine, $model);
        settings.engine.temperature = $temperature;
        settings
    }};
    (local, $model:expr, $temperature:expr $(,)?) => {
        $crate::hush_settings!(engine, $model, $temperature)
    };
}
