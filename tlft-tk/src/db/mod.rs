//! Repository layer: one module per table
//!
//! Guids are stored as TEXT; these helpers centralize the string round-trip
//! so malformed stored values surface as Internal errors instead of panics.

pub mod comments;
pub mod efforts;
pub mod items;
pub mod tags;
pub mod trackers;
pub mod users;

use tlft_common::{Error, Result};
use uuid::Uuid;

/// Parse a guid column read back from the database
pub(crate) fn parse_guid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| Error::Internal(format!("malformed guid in database: {e}")))
}

/// Parse an optional guid column
pub(crate) fn parse_opt_guid(s: Option<String>) -> Result<Option<Uuid>> {
    match s {
        Some(s) => Ok(Some(parse_guid(&s)?)),
        None => Ok(None),
    }
}
