// src/main.rs

mod applicator;
mod cli;
mod error;
mod model;
mod scanner;
mod stamp_file;
mod stamp_tree;

use applicator::DiskSink;
use clap::Parser;
use cli::Args;
use error::Error;
use git2::Repository;
use model::StampMap;
use stamp_tree::SerializedTree;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

fn main() {
    let args = Args::parse();
    if let Err(e) = run(&args) {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

enum StampSource<'a> {
    Text(&'a Path, &'a str),
    Tree(&'a Path, &'a str),
}

/// Validates the stamp-file options before anything is opened or mutated.
fn stamp_source(args: &Args) -> Result<Option<StampSource<'_>>, Error> {
    let prefix_for = |flag: &str| {
        args.prefix.as_deref().ok_or_else(|| {
            Error::Config(format!("--prefix is required when {flag} is given (use / for everything)"))
        })
    };
    match (&args.stamp_file, &args.tree_file) {
        (Some(_), Some(_)) => Err(Error::Config(
            "--stamp-file and --tree-file are mutually exclusive".to_string(),
        )),
        (Some(path), None) => Ok(Some(StampSource::Text(path, prefix_for("--stamp-file")?))),
        (None, Some(path)) => Ok(Some(StampSource::Tree(path, prefix_for("--tree-file")?))),
        (None, None) => Ok(None),
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let source = stamp_source(args)?;

    let repo = Repository::discover(&args.repo)
        .map_err(|_| Error::NoRepository(args.repo.clone()))?;
    let workdir = repo.workdir().ok_or(Error::BareRepository)?.to_path_buf();

    let mut stamps = StampMap::new();
    match source {
        Some(StampSource::Text(path, prefix)) => {
            let reader = BufReader::new(File::open(path)?);
            let counts = stamp_file::import_text_stamps(reader, prefix, &mut stamps)?;
            println!(
                "Imported {} stamps from {} ({} outside prefix).",
                counts.imported,
                path.display(),
                counts.skipped
            );
        }
        Some(StampSource::Tree(path, prefix)) => {
            let tree = SerializedTree::decode(BufReader::new(File::open(path)?))?;
            let entries = tree.creation_stamps(prefix)?;
            let count = entries.len();
            for (entry_path, stamp) in entries {
                stamps.set(&entry_path, stamp);
            }
            println!("Imported {} stamps from {}.", count, path.display());
        }
        None => {}
    }

    let added = scanner::scan_history(&repo, &mut stamps, args.initial_date)?;
    println!(
        "Resolved {added} creation dates from history ({} paths total).",
        stamps.len()
    );

    let files = scanner::tracked_files(&repo)?;
    let summary = applicator::apply_stamps(&workdir, &files, &stamps, &mut DiskSink)?;
    for warning in &summary.warnings {
        eprintln!("Warning: {warning}");
    }
    println!(
        "Updated {} of {} files, {} warnings.",
        summary.updated,
        files.len(),
        summary.warnings.len()
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn args(stamp_file: Option<&str>, tree_file: Option<&str>, prefix: Option<&str>) -> Args {
        Args {
            repo: PathBuf::from("."),
            initial_date: None,
            stamp_file: stamp_file.map(PathBuf::from),
            tree_file: tree_file.map(PathBuf::from),
            prefix: prefix.map(str::to_string),
        }
    }

    #[test]
    fn both_stamp_sources_is_a_config_error() {
        let parsed = args(Some("a.txt"), Some("b.bin"), Some("/"));
        let result = stamp_source(&parsed);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn stamp_file_without_prefix_is_a_config_error() {
        let parsed = args(Some("a.txt"), None, None);
        let result = stamp_source(&parsed);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn tree_file_without_prefix_is_a_config_error() {
        let parsed = args(None, Some("b.bin"), None);
        let result = stamp_source(&parsed);
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn no_stamp_source_is_fine() {
        let parsed = args(None, None, None);
        assert!(matches!(stamp_source(&parsed), Ok(None)));
    }
}
