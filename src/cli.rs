// src/cli.rs

use chrono::{DateTime, FixedOffset};
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory from which the git repository is discovered (searched upward)
    #[arg(short, long, default_value = ".")]
    pub repo: PathBuf,

    /// RFC 3339 date to use for the initial commit instead of its committer date
    #[arg(long, value_parser = parse_stamp)]
    pub initial_date: Option<DateTime<FixedOffset>>,

    /// Text stamp file with one `path:RFC3339-date` record per line
    #[arg(long)]
    pub stamp_file: Option<PathBuf>,

    /// Binary stamp tree captured before this repository's history began
    #[arg(long)]
    pub tree_file: Option<PathBuf>,

    /// Subtree of the stamp source to import; `/` imports everything
    #[arg(long)]
    pub prefix: Option<String>,
}

fn parse_stamp(s: &str) -> Result<DateTime<FixedOffset>, String> {
    DateTime::parse_from_rfc3339(s).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offset_aware_dates() {
        let parsed = parse_stamp("2001-02-03T00:00:00+02:00").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2001-02-03T00:00:00+02:00");
    }

    #[test]
    fn rejects_dates_without_offset() {
        assert!(parse_stamp("2001-02-03").is_err());
    }
}
