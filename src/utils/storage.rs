//! sessionStorage helpers.
//!
//! Session-scoped on purpose: saved state is cleared when the tab closes, so
//! a new visit starts fresh while reloads within the session keep it.

use navstack_core::{NavError, Result};
use serde::{Serialize, de::DeserializeOwned};

use super::dom;

/// Get stored data from sessionStorage.
///
/// `Ok(None)` if the key is absent.
pub fn get<T: DeserializeOwned>(key: &str) -> Result<Option<T>> {
    let storage = dom::session_storage().ok_or(NavError::StorageUnavailable)?;
    let Some(json) = storage
        .get_item(key)
        .map_err(|_| NavError::StorageUnavailable)?
    else {
        return Ok(None);
    };
    Ok(Some(serde_json::from_str(&json)?))
}

/// Store data in sessionStorage.
pub fn set<T: Serialize>(key: &str, data: &T) -> Result<()> {
    let storage = dom::session_storage().ok_or(NavError::StorageUnavailable)?;
    let json = serde_json::to_string(data)?;
    storage
        .set_item(key, &json)
        .map_err(|_| NavError::StorageWrite)
}
