//! Output file rendering.
//!
//! The layout is fixed: a banner comment, a `DROP ... IF EXISTS` guard, and
//! the definition wrapped in `DELIMITER` switches, so each file replays
//! through the `mysql` client unchanged.

use crate::catalog::RoutineDefinition;
use crate::error::Result;
use crate::identifier;

/// Output file name for one routine, including the kind suffix.
pub fn file_name(def: &RoutineDefinition) -> String {
    format!("{}{}.sql", def.name, def.kind.file_suffix())
}

/// Render the full file contents for one routine.
pub fn render(def: &RoutineDefinition, database: &str) -> Result<String> {
    let keyword = def.kind.sql_keyword();
    let quoted = identifier::quote_mysql(&def.name)?;

    Ok(format!(
        "-- ============================================\n\
         -- {keyword}: {name}\n\
         -- Base de datos: {database}\n\
         -- ============================================\n\
         \n\
         DROP {keyword} IF EXISTS {quoted};\n\
         \n\
         DELIMITER $$\n\
         \n\
         {body}$$\n\
         \n\
         DELIMITER ;\n",
        name = def.name,
        body = def.sql_text,
    ))
}
