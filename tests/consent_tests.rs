// Tests for the parental consent store

use chrono::{Duration, Utc};
use draw_and_tell::{ConsentRecord, ConsentStore, CONSENT_VALID_DAYS};
use tempfile::TempDir;

fn store_in(dir: &TempDir) -> ConsentStore {
    ConsentStore::new(dir.path().join("consent.json"))
}

#[test]
fn save_and_load_roundtrip() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let record = ConsentRecord::new("Alex P.".to_string(), "alex@example.com".to_string(), 6);
    store.save(&record).unwrap();

    let loaded = store.load().unwrap().expect("record present");
    assert_eq!(loaded.parent_name, "Alex P.");
    assert_eq!(loaded.email, "alex@example.com");
    assert_eq!(loaded.child_age, 6);
    assert_eq!(loaded.session_id, record.session_id);
}

#[test]
fn missing_record_loads_as_none() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert!(store.load().unwrap().is_none());
}

#[test]
fn expired_record_is_cleared_and_reprompts() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    let record = ConsentRecord::new("Sam".to_string(), "sam@example.com".to_string(), 7);
    store.save(&record).unwrap();

    let after_expiry = Utc::now() + Duration::days(CONSENT_VALID_DAYS + 1);
    assert!(store.load_at(after_expiry).unwrap().is_none());

    // The stored file is gone: the next check also finds nothing
    assert!(!store.path().exists());
    assert!(store.load().unwrap().is_none());
}

#[test]
fn record_is_valid_until_the_boundary() {
    let record = ConsentRecord::new("Kim".to_string(), "kim@example.com".to_string(), 5);

    let just_before = record.consent_date + Duration::days(CONSENT_VALID_DAYS) - Duration::seconds(1);
    let at_boundary = record.consent_date + Duration::days(CONSENT_VALID_DAYS);

    assert!(!record.is_expired_at(just_before));
    assert!(record.is_expired_at(at_boundary));
}
