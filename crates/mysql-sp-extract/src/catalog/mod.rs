//! Catalog access: one session against the target database, plus the two
//! read queries the exporter needs.

mod types;

pub use types::{RoutineDefinition, RoutineKind, RoutineRef};

use crate::config::ConnectionConfig;
use crate::error::{ExtractError, Result};
use crate::identifier;
use async_trait::async_trait;
use sqlx::mysql::{MySqlConnectOptions, MySqlConnection, MySqlRow, MySqlSslMode};
use sqlx::{ConnectOptions, Connection, Row};
use tracing::{debug, info};

/// Read access to the routine catalog.
///
/// Implemented by [`CatalogReader`] against a live session; tests substitute
/// in-memory sources.
#[async_trait]
pub trait RoutineSource: Send {
    /// List all routines of one kind in the session's database, ordered by
    /// name ascending. An empty catalog yields an empty list, not an error.
    async fn list_routines(&mut self, kind: RoutineKind) -> Result<Vec<RoutineRef>>;

    /// Fetch the DDL for one routine.
    ///
    /// `Ok(None)` means the server reported no usable definition: the object
    /// vanished between enumeration and fetch, the row came back short, or
    /// the definition column is NULL because the login lacks privileges on
    /// the routine body. `Err` means the query itself failed. Callers treat
    /// both as per-object conditions.
    async fn fetch_definition(
        &mut self,
        name: &str,
        kind: RoutineKind,
    ) -> Result<Option<RoutineDefinition>>;
}

/// One live session against the target database. The run is strictly
/// sequential, so this is the only connection the tool ever opens.
pub struct CatalogReader {
    conn: MySqlConnection,
    database: String,
}

impl CatalogReader {
    /// Open a session using the connection profile. Does not retry.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.user)
            .password(&config.password)
            .ssl_mode(MySqlSslMode::Preferred);

        let conn = options
            .connect()
            .await
            .map_err(|e| ExtractError::connect(e, "opening MySQL session"))?;

        info!(
            "Connected to {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self {
            conn,
            database: config.database.clone(),
        })
    }

    /// Database this session is scoped to.
    pub fn database(&self) -> &str {
        &self.database
    }

    /// Cheap liveness probe.
    pub async fn ping(&mut self) -> Result<()> {
        sqlx::query("SELECT 1").fetch_one(&mut self.conn).await?;
        Ok(())
    }

    /// Server version string, for diagnostics.
    pub async fn server_version(&mut self) -> Result<String> {
        let row = sqlx::query("SELECT VERSION()")
            .fetch_one(&mut self.conn)
            .await?;
        Ok(row.try_get::<String, _>(0)?)
    }

    /// Close the session. Dropping the reader without calling this still
    /// tears the connection down, but an explicit close surfaces shutdown
    /// errors.
    pub async fn close(self) -> Result<()> {
        self.conn.close().await?;
        debug!("Session closed");
        Ok(())
    }
}

#[async_trait]
impl RoutineSource for CatalogReader {
    async fn list_routines(&mut self, kind: RoutineKind) -> Result<Vec<RoutineRef>> {
        // CAST to CHAR so servers that expose information_schema columns as
        // VARBINARY under odd collations still decode as text.
        let query = r#"
            SELECT CAST(ROUTINE_NAME AS CHAR(255)) AS ROUTINE_NAME
            FROM INFORMATION_SCHEMA.ROUTINES
            WHERE ROUTINE_SCHEMA = ? AND ROUTINE_TYPE = ?
            ORDER BY ROUTINE_NAME
        "#;

        let rows: Vec<MySqlRow> = sqlx::query(query)
            .bind(&self.database)
            .bind(kind.sql_keyword())
            .fetch_all(&mut self.conn)
            .await?;

        let routines = rows
            .iter()
            .map(|row| {
                Ok(RoutineRef {
                    name: row.try_get::<String, _>("ROUTINE_NAME")?,
                    kind,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Catalog lists {} {}(s) in '{}'", routines.len(), kind, self.database);
        Ok(routines)
    }

    async fn fetch_definition(
        &mut self,
        name: &str,
        kind: RoutineKind,
    ) -> Result<Option<RoutineDefinition>> {
        // SHOW CREATE takes no bind parameters; the name is validated and
        // backtick-quoted before being spliced in.
        let query = format!(
            "SHOW CREATE {} {}",
            kind.sql_keyword(),
            identifier::quote_mysql(name)?
        );

        let row: Option<MySqlRow> = sqlx::query(&query)
            .fetch_optional(&mut self.conn)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        // The DDL is the third positional column. Servers return fewer
        // columns for objects they cannot describe, and NULL when the login
        // lacks privileges on the body.
        if row.len() < 3 {
            return Ok(None);
        }
        let Some(sql_text) = row.try_get::<Option<String>, _>(2)? else {
            return Ok(None);
        };

        Ok(Some(RoutineDefinition {
            name: name.to_string(),
            kind,
            sql_text,
        }))
    }
}
