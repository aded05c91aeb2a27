//! Persisted decisions for one input file.
//!
//! The settings file is CSV with a variable field count. Record 1 lists the
//! terms to remove; every later record is an `old,new` rename pair. Finding the
//! file means the interactive session is skipped and the decisions are replayed.

use std::{
    fs::{self, File},
    io::{BufReader, ErrorKind},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use csv::QuoteStyle;
use log::debug;

use crate::{decisions::DecisionLog, error::ReconcileError, io_utils};

/// Loads the decisions stored at `path`. A missing file is `Ok(None)`; any
/// malformed record fails the whole load.
pub fn load(path: &Path) -> Result<Option<DecisionLog>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            debug!("No settings file at {path:?}");
            return Ok(None);
        }
        Err(err) => {
            return Err(err).with_context(|| format!("Opening settings file {path:?}"));
        }
    };
    let mut reader = io_utils::open_csv_reader(BufReader::new(file), true);

    let corrupt = |record: usize, reason: String| ReconcileError::CorruptSettings {
        path: path.to_path_buf(),
        record,
        reason,
    };

    let mut removals = Vec::new();
    let mut renames = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let number = idx + 1;
        let record = record.map_err(|err| corrupt(number, err.to_string()))?;
        let fields =
            io_utils::decode_record(&record).map_err(|err| corrupt(number, err.to_string()))?;
        if idx == 0 {
            removals = fields
                .into_iter()
                .filter(|field| !field.is_empty())
                .collect();
            continue;
        }
        match <[String; 2]>::try_from(fields) {
            Ok([from, to]) if !from.is_empty() && !to.is_empty() => renames.push((from, to)),
            Ok(_) => return Err(corrupt(number, "rename pair has an empty name".into()).into()),
            Err(fields) => {
                return Err(corrupt(
                    number,
                    format!("expected an old,new pair but found {} field(s)", fields.len()),
                )
                .into());
            }
        }
    }

    let log = DecisionLog::new(removals, renames);
    debug!(
        "Loaded {} decision(s) from {path:?}",
        log.decisions().len()
    );
    Ok(Some(log))
}

/// Writes `log` to `path`, replacing any previous settings. The records are
/// staged next to `path` and only renamed into place once fully written.
pub fn save(path: &Path, log: &DecisionLog) -> Result<()> {
    let staging = staging_path(path);
    let saved = write_decisions(&staging, log).and_then(|()| {
        fs::rename(&staging, path)
            .with_context(|| format!("Moving settings into place at {path:?}"))
    });
    if saved.is_err() && staging.is_file() {
        let _ = fs::remove_file(&staging);
    }
    saved
}

pub fn staging_path(path: &Path) -> PathBuf {
    let mut staged = path.as_os_str().to_os_string();
    staged.push(".tmp");
    PathBuf::from(staged)
}

fn write_decisions(path: &Path, log: &DecisionLog) -> Result<()> {
    let mut writer = io_utils::create_csv_writer(path, QuoteStyle::Always)
        .with_context(|| format!("Creating settings file {path:?}"))?;
    let mut removals = log.removals().collect::<Vec<_>>();
    if removals.is_empty() {
        removals.push("");
    }
    writer
        .write_record(&removals)
        .context("Writing removal record")?;
    for (from, to) in log.renames() {
        writer
            .write_record([from, to])
            .with_context(|| format!("Writing rename of '{from}'"))?;
    }
    writer
        .flush()
        .with_context(|| format!("Flushing settings file {path:?}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn corrupt_record(err: &anyhow::Error) -> Option<usize> {
        match err.downcast_ref::<ReconcileError>() {
            Some(ReconcileError::CorruptSettings { record, .. }) => Some(*record),
            _ => None,
        }
    }

    #[test]
    fn missing_file_means_no_decisions() {
        let dir = tempdir().expect("temp dir");
        let loaded = load(&dir.path().join("absent.csv.settings")).expect("load");
        assert!(loaded.is_none());
    }

    #[test]
    fn saved_log_loads_back_unchanged() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        let log = DecisionLog::new(
            vec!["Specimen number".to_string(), "notes, misc".to_string()],
            vec![("Catalogue number".to_string(), "catalogNumber".to_string())],
        );
        save(&path, &log).expect("save");
        assert_eq!(load(&path).expect("load"), Some(log));
    }

    #[test]
    fn empty_removal_list_keeps_its_record() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        let log = DecisionLog::new(
            Vec::new(),
            vec![("gnawing_damage".to_string(), "gnawingDamage".to_string())],
        );
        save(&path, &log).expect("save");
        let raw = fs::read_to_string(&path).expect("read");
        assert!(raw.starts_with("\"\""));
        assert_eq!(load(&path).expect("load"), Some(log));
    }

    #[test]
    fn save_replaces_previous_settings_without_leftovers() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, "stale\n").expect("write");
        let log = DecisionLog::new(vec!["locality".to_string()], Vec::new());
        save(&path, &log).expect("save");
        assert_eq!(load(&path).expect("load"), Some(log));
        assert!(!staging_path(&path).exists());
    }

    #[test]
    fn failed_save_keeps_previous_settings() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, "locality\n").expect("write");
        fs::create_dir(staging_path(&path)).expect("block staging file");

        let log = DecisionLog::new(vec!["country".to_string()], Vec::new());
        assert!(save(&path, &log).is_err());
        assert_eq!(fs::read_to_string(&path).expect("read"), "locality\n");
    }

    #[test]
    fn empty_file_is_an_empty_log() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, "").expect("write");
        assert_eq!(load(&path).expect("load"), Some(DecisionLog::default()));
    }

    #[test]
    fn rename_records_need_two_fields() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, "a,b\nold,new\nonly-one\n").expect("write");
        let err = load(&path).unwrap_err();
        assert_eq!(corrupt_record(&err), Some(3));

        fs::write(&path, "a\nold,new,extra\n").expect("write");
        let err = load(&path).unwrap_err();
        assert_eq!(corrupt_record(&err), Some(2));
    }

    #[test]
    fn rename_records_need_names() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, "a\n\"\",new\n").expect("write");
        let err = load(&path).unwrap_err();
        assert_eq!(corrupt_record(&err), Some(2));
    }

    #[test]
    fn invalid_utf8_is_corrupt() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("input.csv.settings");
        fs::write(&path, b"a\nold,\xff\xfe\n").expect("write");
        let err = load(&path).unwrap_err();
        assert_eq!(corrupt_record(&err), Some(2));
    }
}
