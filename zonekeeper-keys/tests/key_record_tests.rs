//! Key record parsing and lifecycle state tests

use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use std::path::Path;
use zonekeeper_keys::{
    KeyError, KeyIdentity, KeyRecord, KeyResult, KeyState, KeyType, NextTransition,
};

const RECORD_TEXT: &str = "\
; This is a zone-signing key, keyid 24848, for example.com.
; Created: 20231101000000 (Wed Nov  1 00:00:00 2023)
; Publish: 20240101000000 (Mon Jan  1 00:00:00 2024)
; Activate: 20240201000000 (Thu Feb  1 00:00:00 2024)
; Inactive: 20240601000000 (Sat Jun  1 00:00:00 2024)
; Delete: 20240701000000 (Mon Jul  1 00:00:00 2024)
example.com. IN DNSKEY 256 3 8 AwEAAcw5QLr0IjC0wKbGoBPQv4qmeqHy9mvL
";

fn parse_record(stem: &str, text: &str) -> KeyResult<KeyRecord> {
    let identity = KeyIdentity::from_stem(stem)?;
    KeyRecord::parse(identity, text, Path::new(&format!("{stem}.key")))
}

fn at(y: i32, mo: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, mo, d, 0, 0, 0).unwrap()
}

#[test]
fn test_parse_full_record() {
    let record = parse_record("Kexample.com.+008+24848", RECORD_TEXT).unwrap();
    assert_eq!(record.identity.zone, "example.com.");
    assert_eq!(record.identity.algorithm, 8);
    assert_eq!(record.identity.key_id, 24848);
    assert_eq!(record.key_type, Some(KeyType::Zsk));
    assert_eq!(record.created, Some(at(2023, 11, 1)));
    assert_eq!(record.published, Some(at(2024, 1, 1)));
    assert_eq!(record.activated, Some(at(2024, 2, 1)));
    assert_eq!(record.inactivated, Some(at(2024, 6, 1)));
    assert_eq!(record.deleted, Some(at(2024, 7, 1)));
    assert_eq!(record.base_name(), "Kexample.com.+008+24848");
    assert_eq!(record.to_string(), "example.com.+008+24848");
    assert_eq!(
        record.private_path.file_name().unwrap().to_str().unwrap(),
        "Kexample.com.+008+24848.private"
    );
}

#[test]
fn test_state_priority_chain() {
    let record = parse_record("Kexample.com.+008+24848", RECORD_TEXT).unwrap();
    assert_eq!(record.state(at(2023, 12, 1)), KeyState::Unscheduled);
    assert_eq!(record.state(at(2024, 1, 15)), KeyState::Published);
    assert_eq!(record.state(at(2024, 3, 1)), KeyState::Active);
    assert_eq!(record.state(at(2024, 6, 15)), KeyState::Inactive);
    assert_eq!(record.state(at(2024, 8, 1)), KeyState::Deleted);
}

#[test]
fn test_state_boundary_is_inclusive() {
    let record = parse_record("Kexample.com.+008+24848", RECORD_TEXT).unwrap();
    // A timestamp equal to the reference counts as reached
    assert_eq!(record.state(at(2024, 2, 1)), KeyState::Active);
}

#[test]
fn test_state_future_key() {
    let text = "\
; This is a zone-signing key, keyid 24848, for example.com.
; Created: 20990101000000 (future)
";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    assert_eq!(record.state(at(2024, 1, 1)), KeyState::Future);
    assert_eq!(record.state(at(2024, 1, 1)).label(), "FUT");
}

#[test]
fn test_next_transition_ordered_schedule() {
    let record = parse_record("Kexample.com.+008+24848", RECORD_TEXT).unwrap();
    assert_eq!(
        record.next_transition(at(2023, 12, 1)),
        NextTransition::At(at(2024, 1, 1))
    );
    assert_eq!(
        record.next_transition(at(2024, 3, 1)),
        NextTransition::At(at(2024, 6, 1))
    );
    // A reference equal to a transition skips past it
    assert_eq!(
        record.next_transition(at(2024, 7, 1)),
        NextTransition::Exhausted
    );
    assert_eq!(
        record.next_transition(at(2025, 1, 1)),
        NextTransition::Exhausted
    );
}

#[test]
fn test_next_transition_inconsistent_schedule() {
    let text = "\
; This is a zone-signing key, keyid 24848, for example.com.
; Publish: 20240101000000 (x)
; Activate: 20240601000000 (x)
; Inactive: 20240201000000 (x)
";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    for reference in [at(2023, 1, 1), at(2024, 3, 1), at(2030, 1, 1)] {
        assert_eq!(
            record.next_transition(reference),
            NextTransition::InconsistentSchedule
        );
    }
}

#[test]
fn test_next_transition_ignores_created() {
    // Created after every other timestamp must not trip the ordering check
    let text = "\
; This is a zone-signing key, keyid 24848, for example.com.
; Created: 20250101000000 (x)
; Publish: 20240101000000 (x)
; Activate: 20240201000000 (x)
";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    assert_eq!(
        record.next_transition(at(2024, 1, 15)),
        NextTransition::At(at(2024, 2, 1))
    );
}

#[test]
fn test_keyid_mismatch_fails_construction() {
    let text = "; This is a zone-signing key, keyid 11111, for example.com.\n";
    let err = parse_record("Kexample.com.+008+24848", text).unwrap_err();
    assert!(matches!(
        err,
        KeyError::KeyIdMismatch {
            claimed: 11111,
            actual: 24848,
            ..
        }
    ));
}

#[test]
fn test_zone_mismatch_fails_construction() {
    let text = "; This is a zone-signing key, keyid 24848, for other.org.\n";
    let err = parse_record("Kexample.com.+008+24848", text).unwrap_err();
    assert!(matches!(err, KeyError::ZoneMismatch { .. }));
}

#[test]
fn test_unrecognized_type_word() {
    let text = "; This is a universal-signing key, keyid 24848, for example.com.\n";
    let err = parse_record("Kexample.com.+008+24848", text).unwrap_err();
    match err {
        KeyError::UnrecognizedType(word) => assert_eq!(word, "universal-signing"),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_malformed_date_token() {
    let text = "; Publish: 2024010100000 (13 characters)\n";
    let err = parse_record("Kexample.com.+008+24848", text).unwrap_err();
    assert!(matches!(err, KeyError::MalformedDate(_)));
}

#[test]
fn test_missing_comment_leaves_type_unset() {
    let text = "; Publish: 20240101000000 (x)\n";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    assert_eq!(record.key_type, None);
}

#[test]
fn test_dnskey_rdata_extraction() {
    let text = "\
; This is a key-signing key, keyid 24848, for example.com.
; Comment mentioning DNSKEY must not be captured
example.com. IN DNSKEY 257 3 8 AwEAAbbbbb
example.com. IN DNSKEY 257 3 8 AwEAAccccc
";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    assert_eq!(
        record.dnskey_rdata(),
        "257 3 8 AwEAAbbbbb\n257 3 8 AwEAAccccc"
    );
}

#[test]
fn test_dnskey_rdata_empty_without_record_lines() {
    let text = "; Publish: 20240101000000 (x)\n";
    let record = parse_record("Kexample.com.+008+24848", text).unwrap();
    assert_eq!(record.dnskey_rdata(), "");
}

#[test]
fn test_sort_order_groups_by_zone_then_role() {
    let zsk = "; This is a zone-signing key, keyid 10, for a.test.\n";
    let ksk = "; This is a key-signing key, keyid 20, for a.test.\n";
    let untyped = "; Publish: 20240101000000 (x)\n";
    let other_zone = "; This is a key-signing key, keyid 5, for b.test.\n";

    let mut records = vec![
        parse_record("Kb.test.+008+00005", other_zone).unwrap(),
        parse_record("Ka.test.+008+00010", zsk).unwrap(),
        parse_record("Ka.test.+008+00020", ksk).unwrap(),
        parse_record("Ka.test.+008+00030", untyped).unwrap(),
    ];
    records.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));

    let order: Vec<(String, Option<KeyType>)> = records
        .iter()
        .map(|r| (r.identity.zone.clone(), r.key_type))
        .collect();
    assert_eq!(
        order,
        vec![
            ("a.test.".to_string(), None),
            ("a.test.".to_string(), Some(KeyType::Ksk)),
            ("a.test.".to_string(), Some(KeyType::Zsk)),
            ("b.test.".to_string(), Some(KeyType::Ksk)),
        ]
    );
}

#[test]
fn test_from_record_file_reads_disk() -> Result<()> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("Kexample.com.+008+24848.key");
    std::fs::write(&path, RECORD_TEXT)?;

    let record = KeyRecord::from_record_file(&path)?;
    assert_eq!(record.identity.key_id, 24848);
    assert_eq!(record.record_path, path);
    assert_eq!(record.private_path, path.with_extension("private"));
    #[cfg(unix)]
    assert!(record.ownership.is_some());
    Ok(())
}

#[test]
fn test_record_serializes_to_json() -> Result<()> {
    let record = parse_record("Kexample.com.+008+24848", RECORD_TEXT).unwrap();
    let json = serde_json::to_value(&record)?;
    assert_eq!(json["identity"]["zone"], "example.com.");
    assert_eq!(json["identity"]["algorithm"], 8);
    assert_eq!(json["key_type"], "ZSK");
    Ok(())
}
