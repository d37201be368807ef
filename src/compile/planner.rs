//! Task planning: walk a source root and mirror it under an output root.

use anyhow::{Context, Result};
use ignore::WalkBuilder;
use std::ffi::{OsStr, OsString};
use std::path::Path;

use super::CompileTask;

/// Every file under `source_root` whose name ends with `extension`, mapped
/// to `output_root/<relative dir>/<stem>.pdf`.
///
/// The match is a case-sensitive suffix test on the raw file name, so names
/// that are not valid UTF-8 are planned too. A file named exactly like the
/// extension keeps its whole name as the stem (`.tex` becomes `.tex.pdf`).
/// Hidden files and ignore files are not special. Symlinked files are included, symlinked directories are
/// not followed. Traversal is sorted by file name so the same tree always
/// gives the same list.
pub fn plan(source_root: &Path, extension: &str, output_root: &Path) -> Result<Vec<CompileTask>> {
    let metadata = std::fs::metadata(source_root)
        .with_context(|| format!("Cannot read source directory {}", source_root.display()))?;
    if !metadata.is_dir() {
        anyhow::bail!("Source path {} is not a directory", source_root.display());
    }

    let mut builder = WalkBuilder::new(source_root);
    builder
        .standard_filters(false)
        .follow_links(false)
        .sort_by_file_name(|a, b| a.cmp(b));

    let mut tasks = Vec::new();
    for entry in builder.build() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("Skipping unreadable entry under {}: {}", source_root.display(), e);
                continue;
            }
        };

        let path = entry.path();
        let Some(file_name) = path.file_name() else {
            continue;
        };
        let Some(stem) = strip_extension(file_name, extension) else {
            continue;
        };
        if !path.is_file() {
            continue;
        }
        let stem = if stem.is_empty() {
            tracing::debug!("{} has nothing before the extension, keeping the full name", path.display());
            file_name
        } else {
            stem
        };

        let relative_dir = path
            .parent()
            .and_then(|parent| parent.strip_prefix(source_root).ok())
            .unwrap_or_else(|| Path::new(""));
        let working_dir = if relative_dir.as_os_str().is_empty() {
            output_root.to_path_buf()
        } else {
            output_root.join(relative_dir)
        };

        let mut pdf_name = OsString::from(stem);
        pdf_name.push(".pdf");
        let output_path = working_dir.join(pdf_name);

        tasks.push(CompileTask::new(path, output_path, working_dir));
    }

    tracing::debug!("Planned {} '{}' tasks under {}", tasks.len(), extension, source_root.display());
    Ok(tasks)
}

/// `name` without the trailing `extension`, compared byte for byte
#[cfg(unix)]
fn strip_extension<'a>(name: &'a OsStr, extension: &str) -> Option<&'a OsStr> {
    use std::os::unix::ffi::OsStrExt;

    name.as_bytes()
        .strip_suffix(extension.as_bytes())
        .map(OsStr::from_bytes)
}

#[cfg(not(unix))]
fn strip_extension<'a>(name: &'a OsStr, extension: &str) -> Option<&'a OsStr> {
    match name.to_str() {
        Some(name) => name.strip_suffix(extension).map(OsStr::new),
        None => {
            tracing::warn!("Skipping {:?}: file name is not valid Unicode", name);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn touch(root: &Path, relative: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "content").unwrap();
    }

    #[test]
    fn test_mirrored_output_paths() {
        let src = TempDir::new().unwrap();
        touch(src.path(), "a/x.tex");
        touch(src.path(), "a/b/y.tex");
        touch(src.path(), "a/notes.md");

        let tasks = plan(src.path(), ".tex", Path::new("out")).unwrap();
        let outputs: BTreeSet<PathBuf> = tasks.iter().map(|t| t.output_path.clone()).collect();

        assert_eq!(tasks.len(), 2);
        assert_eq!(
            outputs,
            BTreeSet::from([PathBuf::from("out/a/x.pdf"), PathBuf::from("out/a/b/y.pdf")])
        );
        for task in &tasks {
            assert_eq!(task.output_path.parent(), Some(task.working_dir.as_path()));
        }
    }

    #[test]
    fn test_relative_dirs_match_source_tree() {
        let src = TempDir::new().unwrap();
        for file in ["top.typ", "one/a.typ", "one/two/b.typ", "three/c.typ", "three/skip.txt"] {
            touch(src.path(), file);
        }

        let tasks = plan(src.path(), ".typ", Path::new("/o")).unwrap();
        let dirs: BTreeSet<PathBuf> = tasks
            .iter()
            .map(|t| t.working_dir.strip_prefix("/o").unwrap().to_path_buf())
            .collect();

        assert_eq!(tasks.len(), 4);
        assert_eq!(
            dirs,
            BTreeSet::from([
                PathBuf::from(""),
                PathBuf::from("one"),
                PathBuf::from("one/two"),
                PathBuf::from("three"),
            ])
        );
    }

    #[test]
    fn test_suffix_match_is_case_sensitive() {
        let src = TempDir::new().unwrap();
        touch(src.path(), "upper.TEX");
        touch(src.path(), "lower.tex");
        touch(src.path(), "lower.tex.bak");

        let tasks = plan(src.path(), ".tex", Path::new("out")).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].file_name(), "lower.tex");
    }

    #[test]
    fn test_stem_keeps_inner_dots() {
        let src = TempDir::new().unwrap();
        touch(src.path(), "report.v2.md");

        let tasks = plan(src.path(), ".md", Path::new("out")).unwrap();
        assert_eq!(tasks[0].output_path, PathBuf::from("out/report.v2.pdf"));
    }

    #[test]
    fn test_hidden_and_ignored_files_are_planned() {
        let src = TempDir::new().unwrap();
        touch(src.path(), ".gitignore");
        fs::write(src.path().join(".gitignore"), "ignored/\n").unwrap();
        touch(src.path(), "ignored/a.rst");
        touch(src.path(), ".hidden/b.rst");

        let tasks = plan(src.path(), ".rst", Path::new("out")).unwrap();
        assert_eq!(tasks.len(), 2);
    }

    #[test]
    fn test_planning_is_repeatable() {
        let src = TempDir::new().unwrap();
        for file in ["z.tex", "a.tex", "m/n.tex", "b/c.tex"] {
            touch(src.path(), file);
        }

        let first = plan(src.path(), ".tex", Path::new("out")).unwrap();
        let second = plan(src.path(), ".tex", Path::new("out")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_no_matches_is_not_an_error() {
        let src = TempDir::new().unwrap();
        touch(src.path(), "readme.txt");

        let tasks = plan(src.path(), ".tex", Path::new("out")).unwrap();
        assert!(tasks.is_empty());
    }

    #[test]
    fn test_missing_root_is_an_error() {
        let src = TempDir::new().unwrap();
        let missing = src.path().join("missing");
        let err = plan(&missing, ".tex", Path::new("out")).unwrap_err();
        assert!(err.to_string().contains("Cannot read source directory"));
    }

    #[test]
    fn test_file_root_is_an_error() {
        let src = TempDir::new().unwrap();
        touch(src.path(), "single.tex");
        let err = plan(&src.path().join("single.tex"), ".tex", Path::new("out")).unwrap_err();
        assert!(err.to_string().contains("is not a directory"));
    }

    #[test]
    fn test_bare_extension_keeps_full_name() {
        let src = TempDir::new().unwrap();
        touch(src.path(), ".tex");
        touch(src.path(), "sub/.tex");

        let tasks = plan(src.path(), ".tex", Path::new("out")).unwrap();
        let outputs: BTreeSet<PathBuf> = tasks.iter().map(|t| t.output_path.clone()).collect();
        assert_eq!(
            outputs,
            BTreeSet::from([PathBuf::from("out/.tex.pdf"), PathBuf::from("out/sub/.tex.pdf")])
        );
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_non_utf8_names_are_planned() {
        use std::os::unix::ffi::OsStrExt;

        let src = TempDir::new().unwrap();
        let latin1 = OsStr::from_bytes(b"caf\xe9.tex");
        fs::write(src.path().join(latin1), "content").unwrap();
        touch(src.path(), "ok.tex");

        let tasks = plan(src.path(), ".tex", Path::new("out")).unwrap();
        assert_eq!(tasks.len(), 2);

        let expected_pdf = Path::new("out").join(OsStr::from_bytes(b"caf\xe9.pdf"));
        assert!(tasks.iter().any(|t| t.output_path == expected_pdf));
        assert!(tasks.iter().any(|t| t.output_path == Path::new("out/ok.pdf")));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinked_files_are_included() {
        let src = TempDir::new().unwrap();
        let elsewhere = TempDir::new().unwrap();
        touch(elsewhere.path(), "real.typ");
        std::os::unix::fs::symlink(elsewhere.path().join("real.typ"), src.path().join("link.typ")).unwrap();

        let tasks = plan(src.path(), ".typ", Path::new("out")).unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].output_path, PathBuf::from("out/link.pdf"));
    }
}
