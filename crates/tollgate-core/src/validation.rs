//! Input validation applied before any storage access.

use uuid::Uuid;

use crate::error::{TollgateError, TollgateResult};

/// Scope IDs and group names: non-empty, ASCII, no whitespace or control
/// characters.
pub fn scope_id(id: &str) -> TollgateResult<()> {
    if id.is_empty() {
        return Err(TollgateError::invalid("scope id must not be empty"));
    }
    if !id.bytes().all(|b| b.is_ascii_graphic()) {
        return Err(TollgateError::invalid(format!(
            "scope id {id:?} must be printable ASCII without whitespace"
        )));
    }
    Ok(())
}

pub fn group_name(name: &str) -> TollgateResult<()> {
    if name.trim().is_empty() {
        return Err(TollgateError::invalid("scope group must not be empty"));
    }
    Ok(())
}

pub fn non_empty(field: &str, value: &str) -> TollgateResult<()> {
    if value.trim().is_empty() {
        return Err(TollgateError::invalid(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Rejects the nil UUID, which stands in for "not provided".
pub fn required_id(field: &str, id: Uuid) -> TollgateResult<()> {
    if id.is_nil() {
        return Err(TollgateError::invalid(format!("{field} is required")));
    }
    Ok(())
}
