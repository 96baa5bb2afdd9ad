//! Freshness of stored responses.
//!
//! A [`Slot`] is a single storage key observed at one instant with one time to
//! live. Reading a slot answers whether its stored content may still be
//! served; writing a slot records a response together with the creation and
//! expiry instants derived from its headers.
//!
//! A stored entry is valid iff both hold at `current_date`:
//!
//! - `expires >= current_date`
//! - `created + storage_expires >= current_date`
//!
//! Entries lacking `created` or `expires` (written by something else) get
//! `current_date` substituted for the missing field.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FFError;
use crate::io::HttpResponse;
use crate::storage::Storage;
use crate::time::{self, Seconds};
use crate::Result;
use crate::{log_debug, log_info, log_warn};

pub const LAST_MODIFIED: &str = "last-modified";
pub const DATE: &str = "date";
pub const EXPIRES: &str = "expires";

/// The record persisted under a storage key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StoredContent {
    /// `None` means the content must not be served.
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires: Option<String>,
}

impl StoredContent {
    pub fn from_json(data: &str) -> Result<Self> {
        serde_json::from_str(data).map_err(|err| {
            FFError::StoredContentParseError(format!("{err}: {data}")).into()
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn created_at(&self, current_date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        stored_date(self.created.as_deref(), current_date)
    }

    pub fn expires_at(&self, current_date: DateTime<Utc>) -> Result<DateTime<Utc>> {
        stored_date(self.expires.as_deref(), current_date)
    }

    pub fn is_fresh(&self, current_date: DateTime<Utc>, storage_expires: Seconds) -> Result<bool> {
        let expires_at = self.expires_at(current_date)?;
        let created_at = self.created_at(current_date)?;
        Ok(expires_at >= current_date && created_at + storage_expires >= current_date)
    }
}

fn stored_date(value: Option<&str>, current_date: DateTime<Utc>) -> Result<DateTime<Utc>> {
    match value {
        Some(value) => time::parse_timestamp(value),
        None => Ok(current_date),
    }
}

pub struct Slot<'a> {
    key: Option<&'a str>,
    current_date: DateTime<Utc>,
    storage_expires: Seconds,
}

impl<'a> Slot<'a> {
    pub fn new(key: Option<&'a str>, current_date: DateTime<Utc>, storage_expires: Seconds) -> Self {
        Slot {
            key,
            current_date,
            storage_expires,
        }
    }

    /// Stored content if present and still valid. Stale entries are left in
    /// storage untouched.
    pub fn read<S: Storage>(&self, storage: &S) -> Result<Option<StoredContent>> {
        let Some(key) = self.key else {
            return Ok(None);
        };
        let Some(stored_value) = storage.get(key)? else {
            log_debug!("Storage miss for key {}", key);
            return Ok(None);
        };
        let stored_content = StoredContent::from_json(&stored_value)?;
        if !stored_content.is_fresh(self.current_date, self.storage_expires)? {
            log_debug!(
                "Stale entry for key {} created {:?} expires {:?} ttl {}s",
                key,
                stored_content.created,
                stored_content.expires,
                self.storage_expires
            );
            return Ok(None);
        }
        log_debug!("Fresh entry for key {}", key);
        Ok(Some(stored_content))
    }

    /// Build the entry for `response` and persist it if the response is ok.
    /// The entry is returned either way; without a key nothing is derived and
    /// storage is not touched.
    pub fn write<S: Storage>(&self, storage: &S, response: &HttpResponse) -> Result<StoredContent> {
        let Some(key) = self.key else {
            return Ok(StoredContent::default());
        };
        let created_at = self.created_at(response);
        let expires_at = self.expires_at(response);

        let mut stored_content = StoredContent {
            content: None,
            created: Some(time::to_iso_string(&created_at)),
            expires: Some(time::to_iso_string(&expires_at)),
        };

        if !response.ok() {
            log_info!(
                "Not storing response with status {} for key {}",
                response.status,
                key
            );
            return Ok(stored_content);
        }
        stored_content.content = Some(response.text().to_string());
        storage.set(key, &stored_content.to_json()?)?;
        log_debug!(
            "Stored key {} created {} expires {}",
            key,
            time::to_iso_string(&created_at),
            time::to_iso_string(&expires_at)
        );
        Ok(stored_content)
    }

    fn created_at(&self, response: &HttpResponse) -> DateTime<Utc> {
        [LAST_MODIFIED, DATE]
            .iter()
            .filter_map(|name| header_date(response, name))
            .next()
            .unwrap_or(self.current_date)
    }

    fn expires_at(&self, response: &HttpResponse) -> DateTime<Utc> {
        match response.header(EXPIRES) {
            // An Expires value that is not a date means already expired.
            Some(_) => header_date(response, EXPIRES).unwrap_or(self.current_date),
            None => self.current_date + self.storage_expires,
        }
    }
}

fn header_date(response: &HttpResponse, name: &str) -> Option<DateTime<Utc>> {
    let value = response.header(name)?;
    match time::parse_timestamp(value) {
        Ok(date) => Some(date),
        Err(err) => {
            log_warn!("Ignoring {} header: {}", name, err);
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    use crate::http::Headers;
    use crate::storage::InMemoryStorage;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
    }

    fn response(status: u16, body: &str, headers: &[(&str, &str)]) -> HttpResponse {
        let mut h = Headers::new();
        for (name, value) in headers {
            h.set(*name, *value);
        }
        HttpResponse::builder()
            .status(status)
            .body(body)
            .headers(h)
            .build()
            .unwrap()
    }

    #[test]
    fn test_write_without_headers_uses_current_date_and_ttl() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot.write(&storage, &response(200, "hello", &[])).unwrap();
        assert_eq!(Some("hello".to_string()), stored.content);
        assert_eq!(Some("2024-01-01T00:00:00.000Z".to_string()), stored.created);
        assert_eq!(Some("2024-01-01T00:01:00.000Z".to_string()), stored.expires);
        assert_eq!(
            r#"{"content":"hello","created":"2024-01-01T00:00:00.000Z","expires":"2024-01-01T00:01:00.000Z"}"#,
            storage.get("k").unwrap().unwrap()
        );
    }

    #[test]
    fn test_write_prefers_last_modified_over_date() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot
            .write(
                &storage,
                &response(
                    200,
                    "hello",
                    &[
                        ("Last-Modified", "Sun, 31 Dec 2023 23:00:00 GMT"),
                        ("Date", "Sun, 31 Dec 2023 23:59:00 GMT"),
                    ],
                ),
            )
            .unwrap();
        assert_eq!(Some("2023-12-31T23:00:00.000Z".to_string()), stored.created);
    }

    #[test]
    fn test_write_falls_back_to_date_header() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot
            .write(
                &storage,
                &response(200, "hello", &[("Date", "Sun, 31 Dec 2023 23:59:00 GMT")]),
            )
            .unwrap();
        assert_eq!(Some("2023-12-31T23:59:00.000Z".to_string()), stored.created);
    }

    #[test]
    fn test_write_invalid_last_modified_falls_back_to_date_header() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot
            .write(
                &storage,
                &response(
                    200,
                    "hello",
                    &[
                        ("Last-Modified", "not a date"),
                        ("Date", "Sun, 31 Dec 2023 23:59:00 GMT"),
                    ],
                ),
            )
            .unwrap();
        assert_eq!(Some("2023-12-31T23:59:00.000Z".to_string()), stored.created);
    }

    #[test]
    fn test_write_expires_header_wins_over_ttl() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot
            .write(
                &storage,
                &response(200, "hello", &[("Expires", "Mon, 01 Jan 2024 00:00:05 GMT")]),
            )
            .unwrap();
        assert_eq!(Some("2024-01-01T00:00:05.000Z".to_string()), stored.expires);
    }

    #[test]
    fn test_write_invalid_expires_header_is_already_expired() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot
            .write(&storage, &response(200, "hello", &[("Expires", "0")]))
            .unwrap();
        assert_eq!(Some("2024-01-01T00:00:00.000Z".to_string()), stored.expires);
    }

    #[test]
    fn test_write_failed_response_is_not_stored() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot.write(&storage, &response(500, "boom", &[])).unwrap();
        assert_eq!(None, stored.content);
        assert!(stored.created.is_some());
        assert!(stored.expires.is_some());
        assert!(storage.get("k").unwrap().is_none());
    }

    #[test]
    fn test_write_failed_response_keeps_previous_value() {
        let storage = InMemoryStorage::default();
        storage.set("k", r#"{"content":"old"}"#).unwrap();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        slot.write(&storage, &response(404, "", &[])).unwrap();
        assert_eq!(
            Some(r#"{"content":"old"}"#.to_string()),
            storage.get("k").unwrap()
        );
    }

    #[test]
    fn test_write_without_key_is_noop() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(None, t0(), Seconds::new(60));
        let stored = slot.write(&storage, &response(200, "hello", &[])).unwrap();
        assert_eq!(StoredContent::default(), stored);
        assert!(storage.is_empty());
    }

    #[test]
    fn test_read_without_key_is_none() {
        let storage = InMemoryStorage::default();
        storage.set("k", r#"{"content":"hello"}"#).unwrap();
        let slot = Slot::new(None, t0(), Seconds::new(60));
        assert!(slot.read(&storage).unwrap().is_none());
    }

    #[test]
    fn test_read_missing_key_is_none() {
        let storage = InMemoryStorage::default();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        assert!(slot.read(&storage).unwrap().is_none());
    }

    #[test]
    fn test_read_within_ttl_is_fresh() {
        let storage = InMemoryStorage::default();
        Slot::new(Some("k"), t0(), Seconds::new(300))
            .write(&storage, &response(200, "hello", &[]))
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(100), Seconds::new(300));
        let stored = slot.read(&storage).unwrap().unwrap();
        assert_eq!(Some("hello".to_string()), stored.content);
    }

    #[test]
    fn test_read_at_exact_expiry_is_fresh() {
        let storage = InMemoryStorage::default();
        Slot::new(Some("k"), t0(), Seconds::new(10))
            .write(&storage, &response(200, "hello", &[]))
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(10), Seconds::new(10));
        assert!(slot.read(&storage).unwrap().is_some());
    }

    #[test]
    fn test_read_past_ttl_is_none_and_entry_kept() {
        let storage = InMemoryStorage::default();
        Slot::new(Some("k"), t0(), Seconds::new(10))
            .write(&storage, &response(200, "hello", &[]))
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(11), Seconds::new(10));
        assert!(slot.read(&storage).unwrap().is_none());
        assert!(storage.get("k").unwrap().is_some());
    }

    #[test]
    fn test_read_ttl_bounds_a_far_expires_header() {
        let storage = InMemoryStorage::default();
        storage
            .set(
                "k",
                r#"{"content":"hello","created":"2024-01-01T00:00:00.000Z","expires":"2025-01-01T00:00:00.000Z"}"#,
            )
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(61), Seconds::new(60));
        assert!(slot.read(&storage).unwrap().is_none());
    }

    #[test]
    fn test_read_shorter_ttl_at_read_time_applies() {
        let storage = InMemoryStorage::default();
        Slot::new(Some("k"), t0(), Seconds::new(300))
            .write(&storage, &response(200, "hello", &[]))
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(30), Seconds::new(10));
        assert!(slot.read(&storage).unwrap().is_none());
    }

    #[test]
    fn test_read_header_driven_expiry() {
        let storage = InMemoryStorage::default();
        Slot::new(Some("k"), t0(), Seconds::new(300))
            .write(
                &storage,
                &response(200, "hello", &[("Expires", "Mon, 01 Jan 2024 00:00:05 GMT")]),
            )
            .unwrap();
        let slot = Slot::new(Some("k"), t0() + Seconds::new(3), Seconds::new(300));
        assert!(slot.read(&storage).unwrap().is_some());
        let slot = Slot::new(Some("k"), t0() + Seconds::new(6), Seconds::new(300));
        assert!(slot.read(&storage).unwrap().is_none());
    }

    #[test]
    fn test_read_obsolete_http_date_expiry() {
        let test_table = vec![
            "Monday, 01-Jan-24 00:00:05 GMT",
            "Mon Jan  1 00:00:05 2024",
        ];
        for expires in test_table {
            let storage = InMemoryStorage::default();
            let stored = Slot::new(Some("k"), t0(), Seconds::new(300))
                .write(&storage, &response(200, "hello", &[("Expires", expires)]))
                .unwrap();
            assert_eq!(
                Some("2024-01-01T00:00:05.000Z".to_string()),
                stored.expires,
                "Expires {expires}"
            );
            let slot = Slot::new(Some("k"), t0() + Seconds::new(3), Seconds::new(300));
            assert!(slot.read(&storage).unwrap().is_some(), "Expires {expires}");
            let slot = Slot::new(Some("k"), t0() + Seconds::new(6), Seconds::new(300));
            assert!(slot.read(&storage).unwrap().is_none(), "Expires {expires}");
        }
    }

    #[test]
    fn test_read_entry_without_timestamps_is_fresh() {
        let storage = InMemoryStorage::default();
        storage.set("k", r#"{"content":"seeded"}"#).unwrap();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(0));
        let stored = slot.read(&storage).unwrap().unwrap();
        assert_eq!(Some("seeded".to_string()), stored.content);
        assert_eq!(None, stored.created);
    }

    #[test]
    fn test_read_null_content_entry_is_returned() {
        let storage = InMemoryStorage::default();
        storage.set("k", r#"{"content":null}"#).unwrap();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let stored = slot.read(&storage).unwrap().unwrap();
        assert_eq!(None, stored.content);
    }

    #[test]
    fn test_read_malformed_json_is_error() {
        let storage = InMemoryStorage::default();
        storage.set("k", "{not json").unwrap();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let err = slot.read(&storage).unwrap_err();
        match err.downcast_ref::<FFError>() {
            Some(FFError::StoredContentParseError(_)) => (),
            _ => panic!("Expected StoredContentParseError"),
        }
    }

    #[test]
    fn test_read_unparsable_stored_timestamp_is_error() {
        let storage = InMemoryStorage::default();
        storage
            .set("k", r#"{"content":"hello","expires":"someday"}"#)
            .unwrap();
        let slot = Slot::new(Some("k"), t0(), Seconds::new(60));
        let err = slot.read(&storage).unwrap_err();
        match err.downcast_ref::<FFError>() {
            Some(FFError::TimeConversionError(_)) => (),
            _ => panic!("Expected TimeConversionError"),
        }
    }

    #[test]
    fn test_stored_content_without_timestamps_serializes_content_only() {
        let stored = StoredContent {
            content: None,
            created: None,
            expires: None,
        };
        assert_eq!(r#"{"content":null}"#, stored.to_json().unwrap());
    }
}
