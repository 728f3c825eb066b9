use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File-system access used by the locator and patcher.
///
/// The patch workflow only ever needs four capabilities: read a file, write a
/// file, walk a tree, and list immediate subdirectories. Keeping them behind a
/// trait lets the whole locate/patch pipeline run against an in-memory store
/// in unit tests.
pub trait FileStore {
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Overwrite `path` with `contents`.
    fn write(&self, path: &Path, contents: &str) -> io::Result<()>;

    fn is_dir(&self, path: &Path) -> bool;

    /// All regular files under `root`, recursively, sorted.
    ///
    /// A missing `root` yields an empty list rather than an error: a search
    /// strategy pointed at a directory that does not exist simply finds
    /// nothing.
    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>>;

    /// Immediate subdirectories of `root`, sorted. Missing `root` yields an
    /// empty list.
    fn subdirs(&self, root: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Disk-backed [`FileStore`].
///
/// Writes are atomic (tempfile + fsync + rename) and bump the file mtime so
/// CocoaPods cache checks notice the rewrite. Directory walks follow symlinks
/// because the conventional plugins root (`.symlinks/plugins`) is a tree of
/// symlinks into the package cache.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiskStore;

impl FileStore for DiskStore {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        atomic_write(path, contents.as_bytes())?;

        let now = filetime::FileTime::now();
        filetime::set_file_mtime(path, now)?;

        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_file() {
                files.push(entry.into_path());
            }
        }

        files.sort();
        Ok(files)
    }

    fn subdirs(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Ok(Vec::new());
        }

        let mut dirs = Vec::new();
        for entry in WalkDir::new(root)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
        {
            let entry = entry.map_err(io::Error::from)?;
            if entry.file_type().is_dir() {
                dirs.push(entry.into_path());
            }
        }

        dirs.sort();
        Ok(dirs)
    }
}

/// Atomic file write: tempfile in the same directory, fsync, rename.
///
/// Either the full write succeeds or the original manifest is untouched.
fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let parent = path.parent().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "path has no parent directory")
    })?;

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

/// In-memory [`FileStore`] for unit tests.
///
/// Tracks how many reads were issued so tests can assert that short-circuited
/// search strategies never touched file contents.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct MemStore {
    files: std::cell::RefCell<std::collections::BTreeMap<PathBuf, String>>,
    reads: std::cell::Cell<usize>,
}

#[cfg(test)]
impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, path: impl Into<PathBuf>, contents: impl Into<String>) {
        self.files.borrow_mut().insert(path.into(), contents.into());
    }

    pub fn contents(&self, path: &Path) -> Option<String> {
        self.files.borrow().get(path).cloned()
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

#[cfg(test)]
impl FileStore for MemStore {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.reads.set(self.reads.get() + 1);
        self.files.borrow().get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no such file: {}", path.display()),
            )
        })
    }

    fn write(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.files
            .borrow_mut()
            .insert(path.to_path_buf(), contents.to_string());
        Ok(())
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.files
            .borrow()
            .keys()
            .any(|p| p != path && p.starts_with(path))
    }

    fn walk_files(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        Ok(self
            .files
            .borrow()
            .keys()
            .filter(|p| p.starts_with(root))
            .cloned()
            .collect())
    }

    fn subdirs(&self, root: &Path) -> io::Result<Vec<PathBuf>> {
        let mut dirs = std::collections::BTreeSet::new();
        for path in self.files.borrow().keys() {
            if let Ok(rest) = path.strip_prefix(root) {
                let mut components = rest.components();
                if let (Some(first), Some(_)) = (components.next(), components.next()) {
                    dirs.insert(root.join(first));
                }
            }
        }
        Ok(dirs.into_iter().collect())
    }
}
