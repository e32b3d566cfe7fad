use chrono::prelude::*;
use gloo::storage::{LocalStorage, Storage};
use powercard_core::{KeyValueStore, StorageError};
use std::time::Duration;
use wasm_bindgen::JsValue;

pub(crate) fn utc_now() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
}

/// Whole seconds, `"3s"`.
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    format!("{}s", elapsed.as_secs_f64().round() as u64)
}

/// Browser `localStorage`, the history's durable store.
#[derive(Copy, Clone, Debug, Default)]
pub(crate) struct LocalStorageStore;

impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Option<String> {
        match LocalStorage::raw().get_item(key) {
            Ok(value) => value,
            Err(err) => {
                log::warn!("failed to read {}: {:?}", key, err);
                None
            }
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        LocalStorage::raw()
            .set_item(key, value)
            .map_err(|err| storage_error(&err))
    }
}

fn storage_error(err: &JsValue) -> StorageError {
    let name = js_sys::Reflect::get(err, &JsValue::from_str("name"))
        .ok()
        .and_then(|name| name.as_string());
    storage_error_named(name.as_deref(), err)
}

fn storage_error_named(name: Option<&str>, detail: impl std::fmt::Debug) -> StorageError {
    match name {
        // Firefox used its own name before adopting the standard one
        Some("QuotaExceededError" | "NS_ERROR_DOM_QUOTA_REACHED") => StorageError::QuotaExceeded,
        _ => StorageError::Unavailable(format!("{detail:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_rounds_to_whole_seconds() {
        assert_eq!(format_elapsed(Duration::from_millis(0)), "0s");
        assert_eq!(format_elapsed(Duration::from_millis(2_400)), "2s");
        assert_eq!(format_elapsed(Duration::from_millis(2_600)), "3s");
    }

    #[test]
    fn quota_errors_are_recognized_by_name() {
        assert_eq!(
            storage_error_named(Some("QuotaExceededError"), "x"),
            StorageError::QuotaExceeded
        );
        assert_eq!(
            storage_error_named(Some("NS_ERROR_DOM_QUOTA_REACHED"), "x"),
            StorageError::QuotaExceeded
        );
        assert!(matches!(
            storage_error_named(Some("SecurityError"), "x"),
            StorageError::Unavailable(_)
        ));
        assert!(matches!(
            storage_error_named(None, "x"),
            StorageError::Unavailable(_)
        ));
    }
}
