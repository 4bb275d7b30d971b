// Store module - category-partitioned spreadsheet storage

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::info;

use crate::error::{DigestError, Result};
use crate::importers::{is_spreadsheet_name, SPREADSHEET_EXTENSION};

/// Maximum number of files accepted by one upload batch
pub const MAX_UPLOAD_FILES: usize = 5;

const FILES_DIR: &str = "excel-files";

/// Product line a stored file belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Lubricants,
    Petroleum,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Lubricants, Category::Petroleum];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Lubricants => "lubricants",
            Category::Petroleum => "petroleum",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = DigestError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lubricants" => Ok(Category::Lubricants),
            "petroleum" => Ok(Category::Petroleum),
            _ => Err(DigestError::invalid(format!(
                "invalid category '{}'. Allowed: lubricants, petroleum",
                s
            ))),
        }
    }
}

/// A file entry as listed by a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredFile {
    pub name: String,
}

/// Stored file names for both categories
#[derive(Debug, Clone, Default, Serialize)]
pub struct FileListing {
    pub lubricants: Vec<StoredFile>,
    pub petroleum: Vec<StoredFile>,
}

/// Read access to stored spreadsheets, as needed by the aggregation engine
pub trait FileStore {
    fn list_files(&self, category: Category) -> Result<Vec<StoredFile>>;
    fn read_file(&self, category: Category, name: &str) -> Result<Vec<u8>>;
}

/// Filesystem store rooted at `<root>/excel-files/<category>/`
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Open the store, creating both category directories when missing
    pub fn open<P: AsRef<Path>>(root: P) -> Result<Self> {
        let store = Self {
            root: root.as_ref().to_path_buf(),
        };
        for category in Category::ALL {
            let dir = store.category_dir(category);
            if !dir.exists() {
                fs::create_dir_all(&dir).map_err(|e| DigestError::store(&dir, e))?;
                info!("Created directory: {:?}", dir);
            }
        }
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(FILES_DIR).join(category.as_str())
    }

    /// Copy a spreadsheet into the store as `<unix-millis>-<original name>`
    pub fn upload(&self, category: Category, source: &Path) -> Result<String> {
        let original = source
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| DigestError::invalid(format!("not a file path: {:?}", source)))?;
        if !is_spreadsheet_name(original) {
            return Err(DigestError::invalid(format!(
                "'{}' is not a .{} spreadsheet",
                original, SPREADSHEET_EXTENSION
            )));
        }

        let mut input = File::open(source).map_err(|e| DigestError::store(source, e))?;
        let stamp = chrono::Utc::now().timestamp_millis();
        let dir = self.category_dir(category);

        // Never replace an existing file: a name taken within the same
        // millisecond gets a counter after the timestamp
        let mut attempt = 0u32;
        let (stored_name, target, mut output) = loop {
            let stored_name = if attempt == 0 {
                format!("{}-{}", stamp, original)
            } else {
                format!("{}-{}-{}", stamp, attempt, original)
            };
            let target = dir.join(&stored_name);
            match OpenOptions::new().write(true).create_new(true).open(&target) {
                Ok(file) => break (stored_name, target, file),
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
                Err(e) => return Err(DigestError::store(&target, e)),
            }
        };

        if let Err(e) = io::copy(&mut input, &mut output) {
            let _ = fs::remove_file(&target);
            return Err(DigestError::store(&target, e));
        }
        info!("Stored {:?} as {}/{}", source, category, stored_name);
        Ok(stored_name)
    }

    /// Upload a batch of at most `MAX_UPLOAD_FILES` spreadsheets
    pub fn upload_many<P: AsRef<Path>>(
        &self,
        category: Category,
        sources: &[P],
    ) -> Result<Vec<String>> {
        if sources.is_empty() {
            return Err(DigestError::invalid("no files to upload"));
        }
        if sources.len() > MAX_UPLOAD_FILES {
            return Err(DigestError::invalid(format!(
                "too many files: {} (at most {} per upload)",
                sources.len(),
                MAX_UPLOAD_FILES
            )));
        }
        if let Some(bad) = sources.iter().map(|p| p.as_ref()).find(|p| {
            !p.file_name()
                .and_then(|n| n.to_str())
                .map(is_spreadsheet_name)
                .unwrap_or(false)
        }) {
            return Err(DigestError::invalid(format!(
                "{:?} is not a .{} spreadsheet",
                bad, SPREADSHEET_EXTENSION
            )));
        }
        sources
            .iter()
            .map(|p| self.upload(category, p.as_ref()))
            .collect()
    }

    pub fn delete(&self, category: Category, name: &str) -> Result<()> {
        let path = self.file_path(category, name)?;
        if !path.is_file() {
            return Err(DigestError::NotFound(format!("{}/{}", category, name)));
        }
        fs::remove_file(&path).map_err(|e| DigestError::store(&path, e))?;
        info!("Deleted {}/{}", category, name);
        Ok(())
    }

    /// Remove every file of a category, returning how many were deleted
    pub fn delete_all(&self, category: Category) -> Result<usize> {
        let dir = self.category_dir(category);
        if !dir.exists() {
            return Err(DigestError::NotFound(format!("folder {:?}", dir)));
        }
        let files = self.list_files(category)?;
        for file in &files {
            let path = dir.join(&file.name);
            fs::remove_file(&path).map_err(|e| DigestError::store(&path, e))?;
        }
        info!("Deleted {} files from {}", files.len(), category);
        Ok(files.len())
    }

    pub fn listing(&self) -> Result<FileListing> {
        Ok(FileListing {
            lubricants: self.list_files(Category::Lubricants)?,
            petroleum: self.list_files(Category::Petroleum)?,
        })
    }

    fn file_path(&self, category: Category, name: &str) -> Result<PathBuf> {
        let name = name.trim();
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            return Err(DigestError::invalid(format!("invalid file name '{}'", name)));
        }
        Ok(self.category_dir(category).join(name))
    }
}

impl FileStore for DirectoryStore {
    fn list_files(&self, category: Category) -> Result<Vec<StoredFile>> {
        let dir = self.category_dir(category);
        let entries = fs::read_dir(&dir).map_err(|e| DigestError::store(&dir, e))?;

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| DigestError::store(&dir, e))?;
            let meta = entry.metadata().map_err(|e| DigestError::store(entry.path(), e))?;
            if !meta.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                files.push(StoredFile {
                    name: name.to_string(),
                });
            }
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }

    fn read_file(&self, category: Category, name: &str) -> Result<Vec<u8>> {
        let path = self.file_path(category, name)?;
        fs::read(&path).map_err(|e| DigestError::store(&path, e))
    }
}

/// In-memory store, for embedding the engine without a filesystem
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    files: BTreeMap<(Category, String), Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, category: Category, name: impl Into<String>, bytes: Vec<u8>) {
        self.files.insert((category, name.into()), bytes);
    }
}

impl FileStore for MemoryStore {
    fn list_files(&self, category: Category) -> Result<Vec<StoredFile>> {
        Ok(self
            .files
            .iter()
            .filter(|((c, _), _)| *c == category)
            .map(|((_, name), _)| StoredFile { name: name.clone() })
            .collect())
    }

    fn read_file(&self, category: Category, name: &str) -> Result<Vec<u8>> {
        self.files
            .get(&(category, name.to_string()))
            .cloned()
            .ok_or_else(|| DigestError::NotFound(format!("{}/{}", category, name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_source(dir: &TempDir, name: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, b"xlsx bytes").unwrap();
        path
    }

    #[test]
    fn test_category_parsing() {
        assert_eq!("Lubricants".parse::<Category>().unwrap(), Category::Lubricants);
        assert_eq!(" petroleum ".parse::<Category>().unwrap(), Category::Petroleum);
        assert!("diesel".parse::<Category>().unwrap_err().is_invalid_argument());
        assert!("".parse::<Category>().is_err());
    }

    #[test]
    fn test_open_creates_category_directories() {
        let root = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();
        for category in Category::ALL {
            assert!(store.category_dir(category).is_dir());
            assert!(store.list_files(category).unwrap().is_empty());
        }
    }

    #[test]
    fn test_upload_list_read_delete() {
        let root = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();

        let stored = store
            .upload(Category::Petroleum, &write_source(&src, "march.xlsx"))
            .unwrap();
        assert!(stored.ends_with("-march.xlsx"));

        let listed = store.list_files(Category::Petroleum).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, stored);
        assert_eq!(store.read_file(Category::Petroleum, &stored).unwrap(), b"xlsx bytes");
        assert!(store.list_files(Category::Lubricants).unwrap().is_empty());

        store.delete(Category::Petroleum, &stored).unwrap();
        assert!(store.list_files(Category::Petroleum).unwrap().is_empty());
        assert!(matches!(
            store.delete(Category::Petroleum, &stored),
            Err(DigestError::NotFound(_))
        ));
    }

    #[test]
    fn test_upload_rejects_other_extensions_and_large_batches() {
        let root = TempDir::new().unwrap();
        let src = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();

        let csv = write_source(&src, "sales.csv");
        assert!(store.upload(Category::Lubricants, &csv).unwrap_err().is_invalid_argument());

        let batch: Vec<PathBuf> = (0..6)
            .map(|i| write_source(&src, &format!("f{}.xlsx", i)))
            .collect();
        assert!(store
            .upload_many(Category::Lubricants, &batch)
            .unwrap_err()
            .is_invalid_argument());
        assert!(store.list_files(Category::Lubricants).unwrap().is_empty());

        let stored = store.upload_many(Category::Lubricants, &batch[..2]).unwrap();
        assert_eq!(stored.len(), 2);
    }

    #[test]
    fn test_same_named_uploads_never_overwrite() {
        let root = TempDir::new().unwrap();
        let first_dir = TempDir::new().unwrap();
        let second_dir = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();

        let first = first_dir.path().join("sales.xlsx");
        let second = second_dir.path().join("sales.xlsx");
        fs::write(&first, b"first batch").unwrap();
        fs::write(&second, b"second batch").unwrap();

        let stored = store
            .upload_many(Category::Lubricants, &[first.clone(), second, first])
            .unwrap();
        assert_eq!(stored.len(), 3);
        assert!(stored.iter().all(|name| name.ends_with("-sales.xlsx")));
        assert_ne!(stored[0], stored[1]);
        assert_ne!(stored[1], stored[2]);
        assert_ne!(stored[0], stored[2]);

        assert_eq!(store.list_files(Category::Lubricants).unwrap().len(), 3);
        let read = |name: &str| store.read_file(Category::Lubricants, name).unwrap();
        assert_eq!(read(&stored[0]), b"first batch");
        assert_eq!(read(&stored[1]), b"second batch");
        assert_eq!(read(&stored[2]), b"first batch");
    }

    #[test]
    fn test_delete_all_and_path_traversal() {
        let root = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();
        let dir = store.category_dir(Category::Lubricants);
        fs::write(dir.join("a.xlsx"), b"a").unwrap();
        fs::write(dir.join("notes.txt"), b"n").unwrap();

        assert!(store
            .delete(Category::Lubricants, "../petroleum/x.xlsx")
            .unwrap_err()
            .is_invalid_argument());
        assert_eq!(store.delete_all(Category::Lubricants).unwrap(), 2);
        assert!(store.listing().unwrap().lubricants.is_empty());
    }

    #[test]
    fn test_missing_directory_is_store_access_failure() {
        let root = TempDir::new().unwrap();
        let store = DirectoryStore::open(root.path()).unwrap();
        fs::remove_dir_all(store.category_dir(Category::Petroleum)).unwrap();
        assert!(matches!(
            store.list_files(Category::Petroleum),
            Err(DigestError::StoreAccess { .. })
        ));
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        store.insert(Category::Lubricants, "a.xlsx", vec![1, 2]);
        assert_eq!(store.list_files(Category::Lubricants).unwrap().len(), 1);
        assert!(store.list_files(Category::Petroleum).unwrap().is_empty());
        assert_eq!(store.read_file(Category::Lubricants, "a.xlsx").unwrap(), vec![1, 2]);
    }
}
