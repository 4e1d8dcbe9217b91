use std::time::Duration;

use sqlx::mysql::{MySqlPool, MySqlPoolOptions};
use sqlx::{Executor, MySql, Transaction};
use tracing::error;

use crate::config::Config;
use crate::engine::error::EngineError;

/// Session settings applied to every pooled connection.
///
/// READ COMMITTED: reads issued after the employee row lock must see rows
/// committed by the previous lock holder, not a snapshot taken before the wait.
/// `innodb_lock_wait_timeout`: a blocked `SELECT ... FOR UPDATE` comes back as
/// contention instead of hanging.
pub fn session_statements(lock_wait_timeout_secs: u64) -> [String; 2] {
    [
        "SET SESSION TRANSACTION ISOLATION LEVEL READ COMMITTED".to_string(),
        format!("SET SESSION innodb_lock_wait_timeout = {lock_wait_timeout_secs}"),
    ]
}

pub async fn init_db(config: &Config) -> Result<MySqlPool, sqlx::Error> {
    let lock_wait = config.lock_wait_timeout_secs;
    MySqlPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(Duration::from_secs(10))
        .after_connect(move |conn, _meta| {
            Box::pin(async move {
                for statement in session_statements(lock_wait) {
                    conn.execute(statement.as_str()).await?;
                }
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
}

/// Open the transaction a write request runs in.
pub async fn begin(pool: &MySqlPool) -> Result<Transaction<'static, MySql>, EngineError> {
    pool.begin().await.map_err(|e| {
        error!(error = %e, "Failed to open transaction");
        EngineError::from(e)
    })
}

pub async fn commit(tx: Transaction<'static, MySql>) -> Result<(), EngineError> {
    tx.commit().await.map_err(|e| {
        error!(error = %e, "Failed to commit transaction");
        EngineError::from(e)
    })
}
