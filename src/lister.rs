use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Lists the media files of a directory.
///
/// Implementations never fail: an unreadable or missing directory is the
/// same as an empty one to the caller.
pub trait Lister {
    fn list(&self, dir: &Path, extensions: &[String]) -> Vec<PathBuf>;
}

/// Lists regular files in one directory (no recursion) whose extension
/// matches, case-insensitively. Results are absolute and sorted.
#[derive(Debug, Default, Clone, Copy)]
pub struct DirLister;

impl Lister for DirLister {
    fn list(&self, dir: &Path, extensions: &[String]) -> Vec<PathBuf> {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read directory {}: {}", dir.display(), e);
                return Vec::new();
            }
        };

        let mut paths = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry in {}: {}", dir.display(), e);
                    continue;
                }
            };
            let path = entry.path();
            if path.is_file() && has_extension(&path, extensions) {
                paths.push(std::path::absolute(&path).unwrap_or(path));
            }
        }
        paths.sort();
        paths
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    extensions.iter().any(|wanted| wanted.eq_ignore_ascii_case(&ext))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn exts(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn lists_matching_files_sorted() {
        let dir = tempdir().expect("tempdir");
        for name in ["b.JPG", "a.png", "notes.txt", "c.jpeg", "noext"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("d.png")).unwrap();

        let paths = DirLister.list(dir.path(), &exts(&["png", "jpg", "jpeg"]));
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.png", "b.JPG", "c.jpeg"]);
        assert!(paths.iter().all(|p| p.is_absolute()));
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        let gone = dir.path().join("unmounted");
        assert!(DirLister.list(&gone, &exts(&["png"])).is_empty());
    }

    #[test]
    fn empty_directory_is_empty() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("readme.md"), b"x").unwrap();
        assert!(DirLister.list(dir.path(), &exts(&["png"])).is_empty());
    }
}
