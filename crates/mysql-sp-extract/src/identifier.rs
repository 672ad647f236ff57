//! Identifier validation and quoting.
//!
//! Routine names come out of the server's own catalog, but they still have to
//! be validated: MySQL permits characters inside a quoted identifier (`/`,
//! backslash) that are unsafe as file names, and quoting is required before a
//! name is spliced into a `SHOW CREATE` or `DROP` statement.

use crate::error::{ExtractError, Result};

/// MySQL's identifier length limit, in bytes.
const MAX_IDENTIFIER_LENGTH: usize = 64;

/// Validate that a string is usable as a MySQL identifier.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(ExtractError::identifier(name, "identifier cannot be empty"));
    }
    if name.contains('\0') {
        return Err(ExtractError::identifier(
            name,
            "identifier contains a NUL byte",
        ));
    }
    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ExtractError::identifier(
            name,
            format!(
                "identifier exceeds {} bytes ({} bytes)",
                MAX_IDENTIFIER_LENGTH,
                name.len()
            ),
        ));
    }
    Ok(())
}

/// Quote an identifier for MySQL using backticks.
///
/// Backticks inside the name are escaped by doubling.
pub fn quote_mysql(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Validate a routine name for use as an output file stem.
///
/// Everything [`validate_identifier`] rejects, plus path separators.
pub fn validate_file_stem(name: &str) -> Result<()> {
    validate_identifier(name)?;
    if name.contains('/') || name.contains('\\') {
        return Err(ExtractError::identifier(
            name,
            "name contains a path separator",
        ));
    }
    Ok(())
}
