use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info};
use ursa_core::{split_lines, FileSet};
use walkdir::{DirEntry, WalkDir};

/// Directories never worth analyzing.
const SKIPPED_DIRS: &[&str] = &["target", "node_modules"];

fn is_skipped(entry: &DirEntry) -> bool {
    if entry.depth() == 0 {
        return false;
    }
    let name = entry.file_name().to_string_lossy();
    entry.file_type().is_dir() && (name.starts_with('.') || SKIPPED_DIRS.iter().any(|dir| name == *dir))
}

/// Load every UTF-8 text file under `root` into a file set keyed by the
/// path relative to `root`, with `/` separators.
///
/// Files that are not valid UTF-8 are skipped.
pub fn load_dir(root: &Path) -> Result<FileSet> {
    let mut files = FileSet::new();
    let walker = WalkDir::new(root).follow_links(false).into_iter();

    for entry in walker.filter_entry(|e| !is_skipped(e)) {
        let entry = entry.with_context(|| format!("failed to walk {}", root.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let bytes = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
        let Ok(content) = String::from_utf8(bytes) else {
            debug!(path = %path.display(), "skipping non-UTF-8 file");
            continue;
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        let key = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        files.insert(key, split_lines(&content));
    }

    info!(root = %root.display(), files = files.len(), "loaded files");
    Ok(files)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ursa-loader-{}-{}", name, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn loads_nested_text_files() {
        let dir = scratch_dir("nested");
        fs::create_dir_all(dir.join("src/bin")).unwrap();
        fs::write(dir.join("README.md"), "hello\nworld\n").unwrap();
        fs::write(dir.join("src/bin/main.rs"), "fn main() {}").unwrap();
        fs::write(dir.join("blob.bin"), [0xff, 0xfe, 0x00]).unwrap();

        let files = load_dir(&dir).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["README.md", "src/bin/main.rs"]);
        assert_eq!(files["README.md"], vec!["hello\n", "world\n"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn skips_hidden_and_build_dirs() {
        let dir = scratch_dir("skips");
        fs::create_dir_all(dir.join(".git")).unwrap();
        fs::create_dir_all(dir.join("target/debug")).unwrap();
        fs::write(dir.join(".git/HEAD"), "ref").unwrap();
        fs::write(dir.join("target/debug/out.txt"), "x").unwrap();
        fs::write(dir.join("lib.rs"), "").unwrap();

        let files = load_dir(&dir).unwrap();
        assert_eq!(files.keys().collect::<Vec<_>>(), vec!["lib.rs"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn missing_root_is_an_error() {
        assert!(load_dir(Path::new("/nonexistent/ursa/root")).is_err());
    }
}
