/**
 * Server Configuration
 *
 * Configuration comes from environment variables, with defaults that work
 * for local development. `dotenv` is loaded by the binary before this runs,
 * so a `.env` file works too.
 *
 * # Variables
 *
 * - `SERVER_PORT` - TCP port to listen on (default 3000)
 * - `DATABASE_URL` - SQLite database location (default `sqlite://ripple.db`,
 *   created if missing)
 */

use std::str::FromStr;
use std::time::Duration;

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::SqlitePool;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_DATABASE_URL: &str = "sqlite://ripple.db";

/// Server configuration loaded from the environment
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port the HTTP server binds to
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// Malformed values fall back to the defaults with a warning rather
    /// than preventing startup.
    pub fn from_env() -> Self {
        let port = match std::env::var("SERVER_PORT") {
            Ok(raw) => raw.parse().unwrap_or_else(|_| {
                tracing::warn!(
                    "[Server] Invalid SERVER_PORT {:?}, using {}",
                    raw,
                    DEFAULT_PORT
                );
                DEFAULT_PORT
            }),
            Err(_) => DEFAULT_PORT,
        };

        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        Self { port, database_url }
    }
}

/// Build the SQLite connection pool
///
/// The database file is created if it does not exist. WAL mode keeps
/// readers unblocked during the store's transactional writes, and the busy
/// timeout lets concurrent writers queue instead of failing immediately.
pub async fn build_pool(config: &ServerConfig) -> Result<SqlitePool, sqlx::Error> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        // Run with a clean environment view: only assert the fallbacks when
        // the variables are absent.
        if std::env::var("SERVER_PORT").is_err() && std::env::var("DATABASE_URL").is_err() {
            let config = ServerConfig::from_env();
            assert_eq!(config.port, DEFAULT_PORT);
            assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        }
    }

    #[tokio::test]
    async fn test_in_memory_pool() {
        let config = ServerConfig {
            port: 0,
            database_url: "sqlite::memory:".to_string(),
        };
        let pool = build_pool(&config).await.unwrap();
        let row: (i64,) = sqlx::query_as("SELECT 1").fetch_one(&pool).await.unwrap();
        assert_eq!(row.0, 1);
    }
}
