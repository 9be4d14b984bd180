//! Parallel, deterministic discovery of `.rs` files.
//!
//! Directories are pruned with `WalkDir::filter_entry` before their
//! contents are visited; the remaining entries are filtered in parallel
//! with Rayon's `par_bridge` and sorted afterwards so reports come out in
//! the same order on every run.

use anyhow::{bail, Context, Result};
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Directories never descended into.
pub const EXCLUDED_DIRS: &[&str] = &["target", ".git", "node_modules", ".cargo"];

#[inline]
fn is_excluded_dir(entry: &walkdir::DirEntry, excludes: &HashSet<&str>) -> bool {
    // the walk root itself is never pruned
    entry.depth() > 0
        && entry.file_type().is_dir()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| excludes.contains(name))
}

fn is_rust_file(path: &Path) -> bool {
    path.is_file() && path.extension().is_some_and(|ext| ext == "rs")
}

/// All `.rs` files below `root`, skipping default and custom excludes.
pub fn gather_rs_files(root: &Path, excludes: &[&str]) -> Result<Vec<PathBuf>> {
    let all_excludes: HashSet<&str> = EXCLUDED_DIRS
        .iter()
        .copied()
        .chain(excludes.iter().copied())
        .collect();

    let mut files = WalkDir::new(root)
        .into_iter()
        .filter_entry(|e| !is_excluded_dir(e, &all_excludes))
        .par_bridge()
        .filter_map(|entry| match entry {
            Ok(e) if is_rust_file(e.path()) => Some(Ok(e.into_path())),
            Ok(_) => None,
            Err(e) => Some(Err(e.into())),
        })
        .collect::<Result<Vec<_>>>()
        .with_context(|| format!("Failed to gather .rs files from {}", root.display()))?;

    files.sort();
    Ok(files)
}

/// Expand command-line paths into the list of files to analyse.
///
/// Directories are walked; files are taken as given, whatever their
/// extension. Duplicates are removed while keeping the first position.
pub fn collect_source_files(paths: &[PathBuf], excludes: &[&str]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for path in paths {
        let found = if path.is_dir() {
            gather_rs_files(path, excludes)?
        } else if path.is_file() {
            vec![path.clone()]
        } else {
            bail!("No such file or directory: {}", path.display());
        };
        files.extend(found.into_iter().filter(|f| seen.insert(f.clone())));
    }

    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::create_temp_dir;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "fn main() {}").unwrap();
    }

    #[test]
    fn test_gather_prunes_default_excludes() {
        let root = create_temp_dir("scan_default");
        touch(&root.join("src/main.rs"));
        touch(&root.join("src/a/b.rs"));
        touch(&root.join("target/debug/build.rs"));
        touch(&root.join(".git/hooks/x.rs"));
        touch(&root.join("README.md"));

        let files = gather_rs_files(&root, &[]).unwrap();
        assert_eq!(files, vec![root.join("src/a/b.rs"), root.join("src/main.rs")]);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_gather_custom_excludes() {
        let root = create_temp_dir("scan_custom");
        touch(&root.join("src/lib.rs"));
        touch(&root.join("generated/out.rs"));

        let files = gather_rs_files(&root, &["generated"]).unwrap();
        assert_eq!(files, vec![root.join("src/lib.rs")]);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_collect_accepts_explicit_files() {
        let root = create_temp_dir("scan_explicit");
        touch(&root.join("src/lib.rs"));
        let odd = root.join("snippet.txt");
        fs::write(&odd, "fn f() {}").unwrap();

        let files =
            collect_source_files(&[odd.clone(), root.clone(), root.join("src/lib.rs")], &[])
                .unwrap();
        assert_eq!(files, vec![odd, root.join("src/lib.rs")]);
        fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn test_collect_missing_path_fails() {
        let root = create_temp_dir("scan_missing");
        let err = collect_source_files(&[root.join("nope")], &[]).unwrap_err();
        assert!(err.to_string().contains("No such file"));
        fs::remove_dir_all(&root).ok();
    }
}
