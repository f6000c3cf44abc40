// src/scanner.rs

use crate::error::Error;
use crate::model::{Stamp, StampMap};
use chrono::{DateTime, FixedOffset, Offset, Utc};
use git2::{Commit, Delta, DiffFindOptions, DiffOptions, ObjectType, Repository, Sort};
use git2::{Status, StatusOptions, TreeWalkMode, TreeWalkResult};
use indicatif::ProgressBar;
use std::path::Path;

/// Walks the first-parent ancestry oldest-first and records, for every
/// path first observed in history, the date it appeared. Entries already
/// in `map` (imported stamps, or earlier appearances) always win; history
/// only fills gaps. `initial_date`, when given, replaces the oldest
/// commit's committer date. Returns the number of newly added entries.
pub fn scan_history(
    repo: &Repository,
    map: &mut StampMap,
    initial_date: Option<Stamp>,
) -> Result<usize, Error> {
    // 1. Collect the first-parent chain, oldest commit first
    let mut revwalk = repo.revwalk()?;
    revwalk.push_head()?;
    revwalk.simplify_first_parent()?;
    revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME | Sort::REVERSE)?;
    let oids = revwalk.collect::<Result<Vec<_>, _>>()?;

    let bar = ProgressBar::new(oids.len() as u64);
    bar.set_message("Scanning commits");

    // 2. Diff each commit against its parent and attribute new paths
    let mut added = 0;
    for (i, oid) in oids.iter().enumerate() {
        let commit = repo.find_commit(*oid)?;
        let date = match (i, initial_date) {
            (0, Some(date)) => date,
            _ => commit_date(&commit)?,
        };

        let parent_tree = if commit.parent_count() > 0 {
            Some(commit.parent(0)?.tree()?)
        } else {
            None // the initial commit diffs against the empty tree
        };
        let tree = commit.tree()?;

        let mut diff_opts = DiffOptions::new();
        diff_opts.ignore_filemode(true);
        let mut diff =
            repo.diff_tree_to_tree(parent_tree.as_ref(), Some(&tree), Some(&mut diff_opts))?;
        let mut find_opts = DiffFindOptions::new();
        find_opts.renames(true);
        diff.find_similar(Some(&mut find_opts))?;

        for delta in diff.deltas() {
            match delta.status() {
                Delta::Added => {
                    if let Some(path) = delta.new_file().path().and_then(Path::to_str) {
                        if map.insert_if_absent(path, date) {
                            added += 1;
                        }
                    }
                }
                Delta::Renamed => {
                    let old = delta.old_file().path().and_then(Path::to_str);
                    let new = delta.new_file().path().and_then(Path::to_str);
                    if let (Some(old), Some(new)) = (old, new) {
                        // the destination keeps the source's creation date;
                        // the renamed-away path drops out of the map
                        let stamp = map.remove(old).unwrap_or(date);
                        if map.insert_if_absent(new, stamp) {
                            added += 1;
                        }
                    }
                }
                _ => {}
            }
        }

        bar.inc(1);
    }
    bar.finish_with_message("History scan complete");

    Ok(added)
}

fn commit_date(commit: &Commit) -> Result<Stamp, Error> {
    let time = commit.time();
    let offset = FixedOffset::east_opt(time.offset_minutes() * 60).unwrap_or_else(|| Utc.fix());
    DateTime::from_timestamp(time.seconds(), 0)
        .map(|utc| utc.with_timezone(&offset))
        .ok_or_else(|| Error::CommitTime(commit.id()))
}

/// Lists the files the repository currently tracks: blob paths in the tip
/// commit's tree, minus paths the working copy has deleted. The deletion
/// filter matches by path only; it has no awareness of rename chains.
pub fn tracked_files(repo: &Repository) -> Result<Vec<String>, Error> {
    let tree = repo.head()?.peel_to_commit()?.tree()?;
    let mut files = Vec::new();
    tree.walk(TreeWalkMode::PreOrder, |dir, entry| {
        if entry.kind() == Some(ObjectType::Blob) {
            if let Some(name) = entry.name() {
                files.push(format!("{dir}{name}"));
            }
        }
        TreeWalkResult::Ok
    })?;

    let mut status_opts = StatusOptions::new();
    status_opts.include_untracked(false);
    let statuses = repo.statuses(Some(&mut status_opts))?;
    let deleted: Vec<String> = statuses
        .iter()
        .filter(|entry| entry.status().contains(Status::WT_DELETED))
        .filter_map(|entry| entry.path().map(str::to_owned))
        .collect();
    files.retain(|file| !deleted.iter().any(|gone| gone.eq_ignore_ascii_case(file)));

    Ok(files)
}
