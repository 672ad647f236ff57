//! Extraction loop and file materialization.

mod template;

use crate::catalog::{RoutineDefinition, RoutineKind, RoutineSource};
use crate::error::Result;
use crate::identifier;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Aggregate outcome of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionReport {
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub duration_seconds: f64,
    pub procedures_written: usize,
    pub functions_written: usize,
    /// Routines the server would not hand a definition for.
    pub fetch_failed: usize,
    /// Routines whose file could not be written.
    pub write_failed: usize,
    /// Names of skipped routines, annotated with their kind.
    pub skipped_routines: Vec<String>,
    pub output_dir: PathBuf,
}

impl ExtractionReport {
    fn new(output_dir: PathBuf) -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            completed_at: now,
            duration_seconds: 0.0,
            procedures_written: 0,
            functions_written: 0,
            fetch_failed: 0,
            write_failed: 0,
            skipped_routines: Vec::new(),
            output_dir,
        }
    }

    pub fn total_written(&self) -> usize {
        self.procedures_written + self.functions_written
    }

    pub fn total_skipped(&self) -> usize {
        self.fetch_failed + self.write_failed
    }

    /// Serialize the report as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Walks the catalog kind by kind and materializes one file per routine.
pub struct Exporter {
    output_dir: PathBuf,
    database: String,
}

impl Exporter {
    pub fn new(output_dir: impl Into<PathBuf>, database: impl Into<String>) -> Self {
        Self {
            output_dir: output_dir.into(),
            database: database.into(),
        }
    }

    /// Extract every procedure, and every function when enabled, to one SQL
    /// file each.
    ///
    /// A routine the server will not describe, or whose file cannot be
    /// written, is logged and counted in the report but never aborts the
    /// run. Enumeration failures abort the run.
    pub async fn extract_all<S>(
        &self,
        source: &mut S,
        include_functions: bool,
    ) -> Result<ExtractionReport>
    where
        S: RoutineSource + ?Sized,
    {
        let timer = Instant::now();
        let mut report = ExtractionReport::new(self.output_dir.clone());

        std::fs::create_dir_all(&self.output_dir)?;

        self.extract_kind(source, RoutineKind::Procedure, &mut report)
            .await?;
        if include_functions {
            self.extract_kind(source, RoutineKind::Function, &mut report)
                .await?;
        }

        report.completed_at = Utc::now();
        report.duration_seconds = timer.elapsed().as_secs_f64();
        // Report the resolved path; keep the configured one if the
        // filesystem cannot canonicalize it.
        report.output_dir =
            std::fs::canonicalize(&self.output_dir).unwrap_or_else(|_| self.output_dir.clone());

        info!(
            "Extraction finished: {} procedure(s), {} function(s) written, {} skipped in {:.1}s",
            report.procedures_written,
            report.functions_written,
            report.total_skipped(),
            report.duration_seconds
        );

        Ok(report)
    }

    async fn extract_kind<S>(
        &self,
        source: &mut S,
        kind: RoutineKind,
        report: &mut ExtractionReport,
    ) -> Result<()>
    where
        S: RoutineSource + ?Sized,
    {
        let routines = source.list_routines(kind).await?;
        if routines.is_empty() {
            warn!("No {} routines found in '{}'", kind, self.database);
            return Ok(());
        }

        info!(
            "Extracting {} {} routine(s) from '{}'",
            routines.len(),
            kind,
            self.database
        );

        for routine in routines {
            match source.fetch_definition(&routine.name, kind).await {
                Ok(Some(def)) => match self.write_routine(&def) {
                    Ok(path) => {
                        debug!("Wrote {}", path.display());
                        match kind {
                            RoutineKind::Procedure => report.procedures_written += 1,
                            RoutineKind::Function => report.functions_written += 1,
                        }
                    }
                    Err(e) => {
                        warn!("Skipping {} {}: {}", kind, routine.name, e);
                        report.write_failed += 1;
                        report
                            .skipped_routines
                            .push(format!("{} ({})", routine.name, kind));
                    }
                },
                Ok(None) => {
                    warn!(
                        "Skipping {} {}: server returned no definition",
                        kind, routine.name
                    );
                    report.fetch_failed += 1;
                    report
                        .skipped_routines
                        .push(format!("{} ({})", routine.name, kind));
                }
                Err(e) => {
                    warn!("Skipping {} {}: {}", kind, routine.name, e);
                    report.fetch_failed += 1;
                    report
                        .skipped_routines
                        .push(format!("{} ({})", routine.name, kind));
                }
            }
        }

        Ok(())
    }

    fn write_routine(&self, def: &RoutineDefinition) -> Result<PathBuf> {
        identifier::validate_file_stem(&def.name)?;
        let path = self.output_dir.join(template::file_name(def));
        let content = template::render(def, &self.database)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::RoutineRef;
    use crate::error::ExtractError;
    use async_trait::async_trait;
    use tempfile::TempDir;

    #[derive(Clone)]
    enum Outcome {
        Body(&'static str),
        Missing,
        QueryError,
    }

    #[derive(Default)]
    struct MockSource {
        routines: Vec<(RoutineKind, &'static str, Outcome)>,
        list_calls: Vec<RoutineKind>,
    }

    impl MockSource {
        fn with(mut self, kind: RoutineKind, name: &'static str, outcome: Outcome) -> Self {
            self.routines.push((kind, name, outcome));
            self
        }
    }

    #[async_trait]
    impl RoutineSource for MockSource {
        async fn list_routines(&mut self, kind: RoutineKind) -> Result<Vec<RoutineRef>> {
            self.list_calls.push(kind);
            Ok(self
                .routines
                .iter()
                .filter(|(k, _, _)| *k == kind)
                .map(|(k, name, _)| RoutineRef {
                    name: name.to_string(),
                    kind: *k,
                })
                .collect())
        }

        async fn fetch_definition(
            &mut self,
            name: &str,
            kind: RoutineKind,
        ) -> Result<Option<RoutineDefinition>> {
            let outcome = self
                .routines
                .iter()
                .find(|(k, n, _)| *k == kind && *n == name)
                .map(|(_, _, outcome)| outcome.clone());
            match outcome {
                Some(Outcome::Body(body)) => Ok(Some(RoutineDefinition {
                    name: name.to_string(),
                    kind,
                    sql_text: body.to_string(),
                })),
                Some(Outcome::Missing) | None => Ok(None),
                Some(Outcome::QueryError) => {
                    Err(ExtractError::Database(sqlx::Error::RowNotFound))
                }
            }
        }
    }

    fn exporter(dir: &TempDir) -> Exporter {
        Exporter::new(dir.path(), "testdb")
    }

    #[tokio::test]
    async fn test_extracts_procedures_and_functions() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default()
            .with(
                RoutineKind::Procedure,
                "proc_a",
                Outcome::Body("CREATE PROCEDURE proc_a()\nBEGIN\nEND"),
            )
            .with(
                RoutineKind::Procedure,
                "proc_b",
                Outcome::Body("CREATE PROCEDURE proc_b()\nBEGIN\nEND"),
            )
            .with(
                RoutineKind::Function,
                "func_x",
                Outcome::Body("CREATE FUNCTION func_x() RETURNS INT RETURN 1"),
            );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.procedures_written, 2);
        assert_eq!(report.functions_written, 1);
        assert_eq!(report.total_written(), 3);
        assert_eq!(report.total_skipped(), 0);
        assert!(report.output_dir.is_absolute());
        assert!(tmp.path().join("proc_a.sql").exists());
        assert!(tmp.path().join("proc_b.sql").exists());
        assert!(tmp.path().join("func_x_FUNC.sql").exists());
    }

    #[tokio::test]
    async fn test_written_file_matches_template() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default().with(
            RoutineKind::Procedure,
            "get_users",
            Outcome::Body("CREATE PROCEDURE get_users()\nBEGIN\n  SELECT 1;\nEND"),
        );

        exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        let content = std::fs::read_to_string(tmp.path().join("get_users.sql")).unwrap();
        let expected = "-- ============================================\n\
                        -- PROCEDURE: get_users\n\
                        -- Base de datos: testdb\n\
                        -- ============================================\n\
                        \n\
                        DROP PROCEDURE IF EXISTS `get_users`;\n\
                        \n\
                        DELIMITER $$\n\
                        \n\
                        CREATE PROCEDURE get_users()\nBEGIN\n  SELECT 1;\nEND$$\n\
                        \n\
                        DELIMITER ;\n";
        assert_eq!(content, expected);
    }

    #[tokio::test]
    async fn test_missing_definition_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default()
            .with(
                RoutineKind::Procedure,
                "proc_a",
                Outcome::Body("CREATE PROCEDURE proc_a()"),
            )
            .with(RoutineKind::Procedure, "proc_b", Outcome::Missing);

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.procedures_written, 1);
        assert_eq!(report.fetch_failed, 1);
        assert_eq!(report.skipped_routines, vec!["proc_b (PROCEDURE)"]);
        assert!(tmp.path().join("proc_a.sql").exists());
        assert!(!tmp.path().join("proc_b.sql").exists());
    }

    #[tokio::test]
    async fn test_definition_query_error_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default()
            .with(RoutineKind::Procedure, "broken", Outcome::QueryError)
            .with(
                RoutineKind::Procedure,
                "good",
                Outcome::Body("CREATE PROCEDURE good()"),
            );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.procedures_written, 1);
        assert_eq!(report.fetch_failed, 1);
        assert!(tmp.path().join("good.sql").exists());
    }

    #[tokio::test]
    async fn test_empty_procedures_still_checks_functions() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default().with(
            RoutineKind::Function,
            "func_x",
            Outcome::Body("CREATE FUNCTION func_x() RETURNS INT RETURN 1"),
        );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.procedures_written, 0);
        assert_eq!(report.functions_written, 1);
        assert_eq!(
            source.list_calls,
            vec![RoutineKind::Procedure, RoutineKind::Function]
        );
    }

    #[tokio::test]
    async fn test_functions_not_listed_when_disabled() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default()
            .with(
                RoutineKind::Procedure,
                "proc_a",
                Outcome::Body("CREATE PROCEDURE proc_a()"),
            )
            .with(
                RoutineKind::Function,
                "func_x",
                Outcome::Body("CREATE FUNCTION func_x() RETURNS INT RETURN 1"),
            );

        let report = exporter(&tmp)
            .extract_all(&mut source, false)
            .await
            .unwrap();

        assert_eq!(report.procedures_written, 1);
        assert_eq!(report.functions_written, 0);
        assert_eq!(source.list_calls, vec![RoutineKind::Procedure]);
        assert!(!tmp.path().join("func_x_FUNC.sql").exists());
    }

    #[tokio::test]
    async fn test_procedure_and_function_sharing_a_name_do_not_collide() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default()
            .with(
                RoutineKind::Procedure,
                "calc_total",
                Outcome::Body("CREATE PROCEDURE calc_total()"),
            )
            .with(
                RoutineKind::Function,
                "calc_total",
                Outcome::Body("CREATE FUNCTION calc_total() RETURNS INT RETURN 1"),
            );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.total_written(), 2);
        let proc_file = std::fs::read_to_string(tmp.path().join("calc_total.sql")).unwrap();
        let func_file = std::fs::read_to_string(tmp.path().join("calc_total_FUNC.sql")).unwrap();
        assert!(proc_file.contains("DROP PROCEDURE IF EXISTS"));
        assert!(func_file.contains("DROP FUNCTION IF EXISTS"));
    }

    #[tokio::test]
    async fn test_unsafe_name_is_not_written() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default().with(
            RoutineKind::Procedure,
            "evil/name",
            Outcome::Body("CREATE PROCEDURE x()"),
        );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        assert_eq!(report.procedures_written, 0);
        assert_eq!(report.write_failed, 1);
        assert_eq!(report.skipped_routines, vec!["evil/name (PROCEDURE)"]);
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[tokio::test]
    async fn test_existing_file_is_overwritten() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("proc_a.sql"), "stale contents").unwrap();
        let mut source = MockSource::default().with(
            RoutineKind::Procedure,
            "proc_a",
            Outcome::Body("CREATE PROCEDURE proc_a()"),
        );

        exporter(&tmp).extract_all(&mut source, true).await.unwrap();

        let content = std::fs::read_to_string(tmp.path().join("proc_a.sql")).unwrap();
        assert!(content.starts_with("-- ="));
        assert!(!content.contains("stale contents"));
    }

    #[tokio::test]
    async fn test_creates_output_dir_with_parents() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a").join("b");
        let mut source = MockSource::default().with(
            RoutineKind::Procedure,
            "proc_a",
            Outcome::Body("CREATE PROCEDURE proc_a()"),
        );

        Exporter::new(&nested, "testdb")
            .extract_all(&mut source, true)
            .await
            .unwrap();

        assert!(nested.join("proc_a.sql").exists());
    }

    #[tokio::test]
    async fn test_report_serializes_to_json() {
        let tmp = TempDir::new().unwrap();
        let mut source = MockSource::default().with(
            RoutineKind::Procedure,
            "proc_a",
            Outcome::Body("CREATE PROCEDURE proc_a()"),
        );

        let report = exporter(&tmp).extract_all(&mut source, true).await.unwrap();
        let json = report.to_json().unwrap();

        assert!(json.contains("\"procedures_written\": 1"));
        assert!(json.contains("\"functions_written\": 0"));
        assert!(json.contains("\"output_dir\""));
    }
}
