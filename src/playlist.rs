use std::path::{Path, PathBuf};

/// Ordered list of media files plus a cursor that wraps around.
///
/// `index == None` means nothing has been picked yet; the next
/// [`Playlist::advance`] starts at the first entry.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Playlist {
    paths: Vec<PathBuf>,
    index: Option<usize>,
}

impl Playlist {
    pub fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths, index: None }
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn index(&self) -> Option<usize> {
        self.index
    }

    pub fn current(&self) -> Option<&Path> {
        self.index.and_then(|i| self.paths.get(i)).map(PathBuf::as_path)
    }

    /// Moves to the next entry, wrapping at the end.
    pub fn advance(&mut self) -> Option<&Path> {
        if self.paths.is_empty() {
            return None;
        }
        let next = match self.index {
            Some(i) => (i + 1) % self.paths.len(),
            None => 0,
        };
        self.index = Some(next);
        self.current()
    }

    /// Swaps in a fresh listing and finds the cursor's path in it. When that
    /// path is gone, `fallback` is tried; otherwise the cursor is unset.
    pub fn replace_anchored(&mut self, paths: Vec<PathBuf>, fallback: Option<&Path>) {
        let anchor = self.current().map(Path::to_path_buf);
        self.paths = paths;
        self.index = anchor
            .as_deref()
            .and_then(|p| self.position(p))
            .or_else(|| fallback.and_then(|p| self.position(p)));
    }

    /// Swaps in a fresh listing keeping the numeric cursor. A cursor past the
    /// end goes back to the first entry.
    pub fn replace_keep_index(&mut self, paths: Vec<PathBuf>) {
        self.paths = paths;
        self.index = match self.index {
            _ if self.paths.is_empty() => None,
            Some(i) if i >= self.paths.len() => Some(0),
            other => other,
        };
    }

    fn position(&self, path: &Path) -> Option<usize> {
        self.paths.iter().position(|p| p == path)
    }
}
