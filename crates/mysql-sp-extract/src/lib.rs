//! # mysql-sp-extract
//!
//! Export stored procedures and functions from a MySQL-protocol database
//! (MemSQL/SingleStore/MySQL) as individual, re-runnable SQL files.
//!
//! Each routine becomes one `.sql` file containing a `DROP ... IF EXISTS`
//! guard and the definition wrapped in `DELIMITER` switches, so the file can
//! be replayed through the `mysql` client as-is. Two routines only collide
//! on disk when a procedure and a function share a name, which is why
//! function files carry a `_FUNC` suffix.
//!
//! ## Example
//!
//! ```rust,no_run
//! use mysql_sp_extract::{CatalogReader, Config, Exporter};
//!
//! #[tokio::main]
//! async fn main() -> mysql_sp_extract::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     config.validate()?;
//!
//!     let mut reader = CatalogReader::connect(&config.connection).await?;
//!     let exporter = Exporter::new(
//!         config.export.output_dir.clone(),
//!         config.connection.database.clone(),
//!     );
//!     let report = exporter
//!         .extract_all(&mut reader, config.export.include_functions)
//!         .await?;
//!     reader.close().await?;
//!
//!     println!("{} routine(s) written", report.total_written());
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod error;
pub mod export;
pub mod identifier;

pub use catalog::{CatalogReader, RoutineDefinition, RoutineKind, RoutineRef, RoutineSource};
pub use config::{Config, ConnectionConfig, ExportConfig};
pub use error::{ExtractError, Result};
pub use export::{Exporter, ExtractionReport};
