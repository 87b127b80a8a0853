//! Sharded JSON record storage.
//!
//! Records are stored one-per-directory under a two-level hex shard derived
//! from the record's UUID:
//!
//! `root/<u[0..2]>/<u[2..4]>/<32hex-uuid>/<file>.json`
//!
//! where `u` is the canonical 32-character lowercase hex form of the UUID
//! (`Uuid::simple()`). Sharding keeps per-directory fan-out bounded as the
//! record count grows.
//!
//! Writes go to a temporary file in the record directory and are renamed into
//! place, so a crashed write never leaves a half-written record behind.

use crate::{ReferralError, ReferralResult};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Returns the sharded directory for a record id under `root`.
pub(crate) fn sharded_record_dir(root: &Path, id: Uuid) -> PathBuf {
    let canonical = id.simple().to_string();
    root.join(&canonical[0..2])
        .join(&canonical[2..4])
        .join(&canonical)
}

/// Serialises `record` and writes it into its sharded directory.
///
/// Creates the shard directories as needed. The write is temp-then-rename so
/// readers never observe a partial file.
///
/// # Errors
///
/// Returns [`ReferralError::StorageDirCreation`], [`ReferralError::Serialization`]
/// or [`ReferralError::FileWrite`] on failure; the previous on-disk state is
/// left intact.
pub(crate) fn write_record<T: Serialize>(
    root: &Path,
    id: Uuid,
    file_name: &str,
    record: &T,
) -> ReferralResult<()> {
    let record_dir = sharded_record_dir(root, id);
    fs::create_dir_all(&record_dir).map_err(ReferralError::StorageDirCreation)?;

    let json = serde_json::to_string_pretty(record).map_err(ReferralError::Serialization)?;

    let final_path = record_dir.join(file_name);
    let tmp_path = record_dir.join(format!("{file_name}.tmp"));
    fs::write(&tmp_path, json).map_err(ReferralError::FileWrite)?;
    fs::rename(&tmp_path, &final_path).map_err(ReferralError::FileWrite)?;

    Ok(())
}

/// Removes a record's sharded directory, if present.
///
/// Removing a record that was never written is a no-op, so deletes stay
/// idempotent for retrying callers.
pub(crate) fn remove_record(root: &Path, id: Uuid) -> ReferralResult<()> {
    let record_dir = sharded_record_dir(root, id);
    match fs::remove_dir_all(&record_dir) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(ReferralError::FileWrite(err)),
    }
}

/// Loads every record of one kind from under `root`.
///
/// A missing `root` is an empty store, not an error. Individual files that
/// fail to parse are logged as warnings and skipped so one corrupt record
/// cannot take the whole directory offline.
pub(crate) fn load_records<T: DeserializeOwned>(
    root: &Path,
    file_name: &str,
) -> ReferralResult<Vec<T>> {
    let mut records = Vec::new();

    let s1_iter = match fs::read_dir(root) {
        Ok(it) => it,
        Err(_) => return Ok(records),
    };

    for s1 in s1_iter.flatten() {
        let s1_path = s1.path();
        if !s1_path.is_dir() {
            continue;
        }

        let s2_iter = match fs::read_dir(&s1_path) {
            Ok(it) => it,
            Err(_) => continue,
        };

        for s2 in s2_iter.flatten() {
            let s2_path = s2.path();
            if !s2_path.is_dir() {
                continue;
            }

            let id_iter = match fs::read_dir(&s2_path) {
                Ok(it) => it,
                Err(_) => continue,
            };

            for id_ent in id_iter.flatten() {
                let record_path = id_ent.path().join(file_name);
                if !record_path.is_file() {
                    continue;
                }

                let contents =
                    fs::read_to_string(&record_path).map_err(ReferralError::FileRead)?;
                match serde_json::from_str::<T>(&contents) {
                    Ok(record) => records.push(record),
                    Err(err) => {
                        tracing::warn!(
                            "skipping unparsable record {}: {err}",
                            record_path.display()
                        );
                    }
                }
            }
        }
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Probe {
        id: Uuid,
        label: String,
    }

    #[test]
    fn write_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let probe = Probe {
            id: Uuid::new_v4(),
            label: "ward 7".to_string(),
        };

        write_record(dir.path(), probe.id, "probe.json", &probe).unwrap();
        let loaded: Vec<Probe> = load_records(dir.path(), "probe.json").unwrap();
        assert_eq!(loaded, vec![probe]);
    }

    #[test]
    fn sharding_uses_first_four_hex_chars() {
        let id: Uuid = "550e8400-e29b-41d4-a716-446655440000".parse().unwrap();
        let dir = sharded_record_dir(Path::new("/data/referrals"), id);
        assert_eq!(
            dir,
            Path::new("/data/referrals/55/0e/550e8400e29b41d4a716446655440000")
        );
    }

    #[test]
    fn missing_root_is_an_empty_store() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let loaded: Vec<Probe> = load_records(&missing, "probe.json").unwrap();
        assert!(loaded.is_empty());
    }

    #[test]
    fn corrupt_records_are_skipped() {
        let dir = TempDir::new().unwrap();
        let good = Probe {
            id: Uuid::new_v4(),
            label: "ok".to_string(),
        };
        write_record(dir.path(), good.id, "probe.json", &good).unwrap();

        let bad_id = Uuid::new_v4();
        let bad_dir = sharded_record_dir(dir.path(), bad_id);
        fs::create_dir_all(&bad_dir).unwrap();
        fs::write(bad_dir.join("probe.json"), "{not json").unwrap();

        let loaded: Vec<Probe> = load_records(dir.path(), "probe.json").unwrap();
        assert_eq!(loaded, vec![good]);
    }
}
