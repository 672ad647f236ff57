//! Catalog object types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of stored routine, as named by `INFORMATION_SCHEMA.ROUTINES`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoutineKind {
    Procedure,
    Function,
}

impl RoutineKind {
    /// SQL keyword used in `SHOW CREATE` and `DROP` statements.
    pub fn sql_keyword(self) -> &'static str {
        match self {
            RoutineKind::Procedure => "PROCEDURE",
            RoutineKind::Function => "FUNCTION",
        }
    }

    /// Suffix appended to the output file stem, so a procedure and a
    /// function sharing a name never collide on disk.
    pub fn file_suffix(self) -> &'static str {
        match self {
            RoutineKind::Procedure => "",
            RoutineKind::Function => "_FUNC",
        }
    }
}

impl fmt::Display for RoutineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sql_keyword())
    }
}

/// One routine as listed by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutineRef {
    pub name: String,
    pub kind: RoutineKind,
}

/// The DDL text that recreates one routine.
#[derive(Debug, Clone)]
pub struct RoutineDefinition {
    pub name: String,
    pub kind: RoutineKind,
    /// `CREATE PROCEDURE ...` / `CREATE FUNCTION ...` body, exactly as the
    /// server reports it.
    pub sql_text: String,
}
