use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use hchat::ChatSettings;
use hcommon::BoxFuture;
use hprovider::{HttpServerConfig, LocalEngineConfig, ProviderKind, Turn, TurnRole};
use rusqlite::{Connection, OptionalExtension, params};

use crate::backend::StorageBackend;
use crate::error::StorageError;

/// Backend that keeps the conversation in a SQLite database file.
#[derive(Debug)]
pub struct SqliteStorageBackend {
    connection: Mutex<Connection>,
}

impl SqliteStorageBackend {
    pub fn new(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|error| {
                StorageError::storage(format!(
                    "failed to create sqlite parent directory: {error}"
                ))
            })?;
        }

        let connection = Connection::open(path).map_err(|error| {
            StorageError::storage(format!("failed to open sqlite database: {error}"))
        })?;
        Self::with_connection(connection)
    }

    pub fn new_in_memory() -> Result<Self, StorageError> {
        let connection = Connection::open_in_memory().map_err(|error| {
            StorageError::storage(format!("failed to open in-memory sqlite database: {error}"))
        })?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self, StorageError> {
        connection
            .busy_timeout(Duration::from_secs(5))
            .map_err(|error| {
                StorageError::storage(format!("failed to configure sqlite busy timeout: {error}"))
            })?;
        let backend = Self {
            connection: Mutex::new(connection),
        };
        backend.initialize_schema()?;
        Ok(backend)
    }

    fn connection(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StorageError> {
        self.connection
            .lock()
            .map_err(|_| StorageError::storage("sqlite backend lock poisoned"))
    }

    fn initialize_schema(&self) -> Result<(), StorageError> {
        let conn = self.connection()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;

            CREATE TABLE IF NOT EXISTS chat_settings (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                provider TEXT NOT NULL,
                server_endpoint TEXT NOT NULL,
                server_model TEXT NOT NULL,
                server_temperature REAL NOT NULL,
                engine_model TEXT NOT NULL,
                engine_temperature REAL NOT NULL,
                system_model_acknowledged INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS transcript_turns (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                position INTEGER NOT NULL,
                role TEXT NOT NULL,
                content TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_transcript_position
            ON transcript_turns(position, id);
            ",
        )
        .map_err(|error| {
            StorageError::storage(format!("failed to initialize sqlite schema: {error}"))
        })?;

        Ok(())
    }
}

impl StorageBackend for SqliteStorageBackend {
    // The schema statements are all IF NOT EXISTS, so re-running them
    // against an already-open database is harmless.
    fn initialize<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move { self.initialize_schema() })
    }

    fn load_transcript<'a>(&'a self) -> BoxFuture<'a, Result<Vec<Turn>, StorageError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let mut stmt = conn
                .prepare(
                    "
                    SELECT role, content
                    FROM transcript_turns
                    ORDER BY position ASC, id ASC
                    ",
                )
                .map_err(|error| {
                    StorageError::storage(format!("failed to prepare transcript query: {error}"))
                })?;
            let rows = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })
                .map_err(|error| {
                    StorageError::storage(format!("failed to query transcript rows: {error}"))
                })?;

            let mut turns = Vec::new();
            for row in rows {
                let (role, content) = row.map_err(|error| {
                    StorageError::storage(format!("failed to read transcript row: {error}"))
                })?;
                turns.push(Turn::new(role_from_str(&role)?, content));
            }
            Ok(turns)
        })
    }

    fn replace_transcript<'a>(
        &'a self,
        transcript: Vec<Turn>,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let mut conn = self.connection()?;
            let tx = conn.transaction().map_err(|error| {
                StorageError::storage(format!("failed to start transcript transaction: {error}"))
            })?;

            tx.execute("DELETE FROM transcript_turns", [])
                .map_err(|error| {
                    StorageError::storage(format!("failed to clear transcript rows: {error}"))
                })?;

            for (position, turn) in transcript.iter().enumerate() {
                tx.execute(
                    "
                    INSERT INTO transcript_turns (position, role, content)
                    VALUES (?1, ?2, ?3)
                    ",
                    params![position as i64, role_to_str(turn.role), &turn.content],
                )
                .map_err(|error| {
                    StorageError::storage(format!("failed to write transcript row: {error}"))
                })?;
            }

            tx.commit().map_err(|error| {
                StorageError::storage(format!("failed to commit transcript replace: {error}"))
            })
        })
    }

    fn clear_transcript<'a>(&'a self) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            conn.execute("DELETE FROM transcript_turns", [])
                .map_err(|error| {
                    StorageError::storage(format!("failed to clear transcript rows: {error}"))
                })?;
            Ok(())
        })
    }

    fn load_settings<'a>(&'a self) -> BoxFuture<'a, Result<Option<ChatSettings>, StorageError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            let row = conn
                .query_row(
                    "
                    SELECT
                        provider,
                        server_endpoint,
                        server_model,
                        server_temperature,
                        engine_model,
                        engine_temperature,
                        system_model_acknowledged
                    FROM chat_settings
                    WHERE id = 1
                    ",
                    [],
                    |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            row.get::<_, String>(2)?,
                            row.get::<_, f64>(3)?,
                            row.get::<_, String>(4)?,
                            row.get::<_, f64>(5)?,
                            row.get::<_, i64>(6)?,
                        ))
                    },
                )
                .optional()
                .map_err(|error| {
                    StorageError::storage(format!("failed to load settings row: {error}"))
                })?;

            let Some((
                provider,
                server_endpoint,
                server_model,
                server_temperature,
                engine_model,
                engine_temperature,
                acknowledged,
            )) = row
            else {
                return Ok(None);
            };

            Ok(Some(ChatSettings {
                provider: provider_from_str(&provider)?,
                server: HttpServerConfig {
                    endpoint: server_endpoint,
                    model: server_model,
                    temperature: server_temperature as f32,
                },
                engine: LocalEngineConfig {
                    model: engine_model,
                    temperature: engine_temperature as f32,
                },
                system_model_acknowledged: acknowledged != 0,
            }))
        })
    }

    fn save_settings<'a>(
        &'a self,
        settings: ChatSettings,
    ) -> BoxFuture<'a, Result<(), StorageError>> {
        Box::pin(async move {
            let conn = self.connection()?;
            conn.execute(
                "
                INSERT INTO chat_settings (
                    id,
                    provider,
                    server_endpoint,
                    server_model,
                    server_temperature,
                    engine_model,
                    engine_temperature,
                    system_model_acknowledged
                )
                VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    provider = excluded.provider,
                    server_endpoint = excluded.server_endpoint,
                    server_model = excluded.server_model,
                    server_temperature = excluded.server_temperature,
                    engine_model = excluded.engine_model,
                    engine_temperature = excluded.engine_temperature,
                    system_model_acknowledged = excluded.system_model_acknowledged
                ",
                params![
                    provider_to_str(settings.provider),
                    &settings.server.endpoint,
                    &settings.server.model,
                    f64::from(settings.server.temperature),
                    &settings.engine.model,
                    f64::from(settings.engine.temperature),
                    if settings.system_model_acknowledged {
                        1_i64
                    } else {
                        0_i64
                    },
                ],
            )
            .map_err(|error| {
                StorageError::storage(format!("failed to upsert settings row: {error}"))
            })?;
            Ok(())
        })
    }
}

fn provider_to_str(provider: ProviderKind) -> &'static str {
    match provider {
        ProviderKind::HttpServer => "http-server",
        ProviderKind::LocalEngine => "local-engine",
        ProviderKind::SystemModel => "system-model",
    }
}

fn provider_from_str(value: &str) -> Result<ProviderKind, StorageError> {
    match value {
        "http-server" => Ok(ProviderKind::HttpServer),
        "local-engine" => Ok(ProviderKind::LocalEngine),
        "system-model" => Ok(ProviderKind::SystemModel),
        _ => Err(StorageError::serialization(format!(
            "unknown provider value '{value}'"
        ))),
    }
}

fn role_to_str(role: TurnRole) -> &'static str {
    match role {
        TurnRole::User => "user",
        TurnRole::Assistant => "assistant",
    }
}

fn role_from_str(value: &str) -> Result<TurnRole, StorageError> {
    match value {
        "user" => Ok(TurnRole::User),
        "assistant" => Ok(TurnRole::Assistant),
        _ => Err(StorageError::serialization(format!(
            "unknown transcript role value '{value}'"
        ))),
    }
}

pub(crate) fn default_sqlite_path() -> PathBuf {
    if let Some(explicit) = std::env::var_os("HSTORE_SQLITE_PATH") {
        return PathBuf::from(explicit);
    }

    if let Some(home) = std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        return PathBuf::from(home).join(".hush").join("hstore.sqlite3");
    }

    PathBuf::from("hstore.sqlite3")
}
