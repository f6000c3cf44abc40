// src/stamp_file.rs

use crate::error::Error;
use crate::model::{Stamp, StampMap};
use chrono::DateTime;
use std::io::BufRead;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ImportCounts {
    pub imported: usize,
    pub skipped: usize,
}

/// Imports `path:RFC3339-date` records into `map`, keeping only lines
/// under `prefix` (with the prefix stripped). `/` imports every line
/// unchanged. Lines outside the prefix are counted as skipped; a
/// malformed line aborts the whole import, naming its 0-based line
/// number. Within this pass the last line for a path wins.
pub fn import_text_stamps<R: BufRead>(
    reader: R,
    prefix: &str,
    map: &mut StampMap,
) -> Result<ImportCounts, Error> {
    let mut prefix = prefix.replace('\\', "/");
    let whole_source = prefix == "/";
    if !whole_source && !prefix.ends_with('/') {
        prefix.push('/');
    }

    let mut counts = ImportCounts::default();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let line = line.replace('\\', "/");

        let record = if whole_source {
            line.as_str()
        } else {
            match strip_prefix_ignore_case(&line, &prefix) {
                Some(rest) => rest,
                None => {
                    counts.skipped += 1;
                    continue;
                }
            }
        };

        let (path, timestamp) = record.split_once(':').ok_or_else(|| Error::StampLine {
            line: line_no,
            reason: "missing ':' separator".to_string(),
        })?;
        let stamp: Stamp =
            DateTime::parse_from_rfc3339(timestamp.trim()).map_err(|e| Error::StampLine {
                line: line_no,
                reason: e.to_string(),
            })?;

        map.set(path, stamp);
        counts.imported += 1;
    }
    Ok(counts)
}

fn strip_prefix_ignore_case<'a>(line: &'a str, prefix: &str) -> Option<&'a str> {
    let head = line.get(..prefix.len())?;
    if head.eq_ignore_ascii_case(prefix) {
        Some(&line[prefix.len()..])
    } else {
        None
    }
}
