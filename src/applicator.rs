// src/applicator.rs

use crate::error::Error;
use crate::model::StampMap;
use chrono::{DateTime, Utc};
use filetime::FileTime;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// The filesystem side of applying stamps. Kept behind a trait so the
/// application loop can be exercised without touching a real disk.
pub trait CreationTimeSink {
    fn exists(&self, path: &Path) -> bool;
    fn set_created(&mut self, path: &Path, when: DateTime<Utc>) -> io::Result<()>;
}

/// Writes to the real filesystem. On Windows this sets the creation
/// attribute; elsewhere the closest writable attribute is the
/// modification time.
pub struct DiskSink;

impl CreationTimeSink for DiskSink {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    #[cfg(windows)]
    fn set_created(&mut self, path: &Path, when: DateTime<Utc>) -> io::Result<()> {
        filetime_creation::set_file_ctime(path, FileTime::from_system_time(SystemTime::from(when)))
    }

    #[cfg(not(windows))]
    fn set_created(&mut self, path: &Path, when: DateTime<Utc>) -> io::Result<()> {
        filetime::set_file_mtime(path, FileTime::from_system_time(SystemTime::from(when)))
    }
}

#[derive(Debug, Default)]
pub struct ApplySummary {
    pub updated: usize,
    pub warnings: Vec<String>,
}

/// Sets the creation time of every tracked file to its resolved stamp,
/// in UTC. A path with no resolved stamp, or a file missing on disk, is
/// recorded as a warning and the run continues; sink I/O failures
/// propagate.
pub fn apply_stamps(
    workdir: &Path,
    files: &[String],
    map: &StampMap,
    sink: &mut dyn CreationTimeSink,
) -> Result<ApplySummary, Error> {
    let mut summary = ApplySummary::default();
    for file in files {
        let stamp = match map.get(file) {
            Some(stamp) => stamp,
            None => {
                summary
                    .warnings
                    .push(format!("no creation date resolved for {file}"));
                continue;
            }
        };
        let full: PathBuf = workdir.join(file);
        if !sink.exists(&full) {
            summary
                .warnings
                .push(format!("{file} is missing from the working tree"));
            continue;
        }
        sink.set_created(&full, stamp.with_timezone(&Utc))?;
        summary.updated += 1;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};
    use std::collections::HashSet;

    #[derive(Default)]
    struct FakeSink {
        missing: HashSet<PathBuf>,
        written: Vec<(PathBuf, DateTime<Utc>)>,
    }

    impl CreationTimeSink for FakeSink {
        fn exists(&self, path: &Path) -> bool {
            !self.missing.contains(path)
        }

        fn set_created(&mut self, path: &Path, when: DateTime<Utc>) -> io::Result<()> {
            self.written.push((path.to_path_buf(), when));
            Ok(())
        }
    }

    fn stamp(secs: i64) -> crate::model::Stamp {
        FixedOffset::east_opt(3600)
            .unwrap()
            .timestamp_opt(secs, 0)
            .unwrap()
    }

    #[test]
    fn counts_one_update_and_two_warnings() {
        let mut map = StampMap::new();
        map.set("a.txt", stamp(100));
        map.set("gone.txt", stamp(200));
        let files = vec![
            "a.txt".to_string(),
            "unknown.txt".to_string(),
            "gone.txt".to_string(),
        ];
        let mut sink = FakeSink::default();
        sink.missing.insert(Path::new("/repo").join("gone.txt"));

        let summary = apply_stamps(Path::new("/repo"), &files, &map, &mut sink).unwrap();

        assert_eq!(summary.updated, 1);
        assert_eq!(summary.warnings.len(), 2);
        assert_eq!(sink.written.len(), 1);
        assert_eq!(sink.written[0].0, Path::new("/repo").join("a.txt"));
    }

    #[test]
    fn stamps_are_applied_in_utc() {
        let mut map = StampMap::new();
        map.set("a.txt", stamp(100)); // +01:00 offset, same instant
        let files = vec!["a.txt".to_string()];
        let mut sink = FakeSink::default();

        apply_stamps(Path::new("/repo"), &files, &map, &mut sink).unwrap();

        assert_eq!(sink.written[0].1, Utc.timestamp_opt(100, 0).unwrap());
    }

    #[test]
    fn lookup_tolerates_case_differences() {
        let mut map = StampMap::new();
        map.set("Docs/Readme.txt", stamp(100));
        let files = vec!["docs/readme.txt".to_string()];
        let mut sink = FakeSink::default();

        let summary = apply_stamps(Path::new("/repo"), &files, &map, &mut sink).unwrap();

        assert_eq!(summary.updated, 1);
        assert!(summary.warnings.is_empty());
    }

    #[test]
    fn empty_file_list_yields_an_empty_summary() {
        let map = StampMap::new();
        let mut sink = FakeSink::default();
        let summary = apply_stamps(Path::new("/repo"), &[], &map, &mut sink).unwrap();
        assert_eq!(summary.updated, 0);
        assert!(summary.warnings.is_empty());
    }
}
