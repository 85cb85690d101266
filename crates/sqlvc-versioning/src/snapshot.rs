//! On-disk snapshot store
//!
//! Layout: `<root>/<schema>/<kind>/<name>.sql`, one file per object whose
//! contents are exactly the object's definition. `<kind>` is one of
//! `tables`, `views`, `procedures`, `functions`, `triggers`.
//!
//! Writing replaces the whole tree, so it refuses any root that holds a
//! repository (`.git` at any depth) or, when bounded with
//! [`SnapshotStore::within`], any root that is not strictly inside the
//! bounding directory after symlinks and `..` are resolved.

use anyhow::{Context, Result, bail};
use sqlvc_schema::{ObjectKey, ObjectKind, SchemaObject};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "sql";

/// Characters that cannot appear verbatim in a path segment
const RESERVED: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|', '%'];

/// Reads and writes a snapshot directory tree
#[derive(Clone, Debug)]
pub struct SnapshotStore {
    root: PathBuf,
    boundary: Option<PathBuf>,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            boundary: None,
        }
    }

    /// Only allow writes to a root strictly inside `dir`
    pub fn within(mut self, dir: impl Into<PathBuf>) -> Self {
        self.boundary = Some(dir.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    /// File path of an object within this store
    pub fn object_path(&self, key: &ObjectKey) -> PathBuf {
        self.root
            .join(encode_segment(&key.schema))
            .join(key.kind.dir_name())
            .join(format!("{}.{}", encode_segment(&key.name), EXTENSION))
    }

    /// Read every object under the root
    ///
    /// A missing root yields an empty snapshot. Hidden entries, stray files
    /// and non-`.sql` files are ignored; unknown kind directories are skipped
    /// with a warning. Entries are visited in name order.
    #[tracing::instrument(skip(self), fields(root = %self.root.display()))]
    pub fn read(&self) -> Result<Vec<SchemaObject>> {
        if !self.root.exists() {
            tracing::debug!("snapshot root does not exist; treating as empty");
            return Ok(Vec::new());
        }

        let mut objects = Vec::new();
        for schema_dir in sorted_entries(&self.root)? {
            let Some(schema) = visible_dir_name(&schema_dir) else {
                continue;
            };
            let schema = decode_segment(&schema);

            for kind_dir in sorted_entries(&schema_dir)? {
                let Some(kind_name) = visible_dir_name(&kind_dir) else {
                    continue;
                };
                let Some(kind) = ObjectKind::from_dir_name(&kind_name) else {
                    tracing::warn!(
                        path = %kind_dir.display(),
                        "skipping unknown object kind directory"
                    );
                    continue;
                };

                for file in sorted_entries(&kind_dir)? {
                    let Some(name) = object_file_name(&file) else {
                        continue;
                    };
                    let definition = fs::read_to_string(&file)
                        .with_context(|| format!("Failed to read {}", file.display()))?;
                    objects.push(SchemaObject::new(
                        schema.clone(),
                        decode_segment(&name),
                        kind,
                        definition,
                    ));
                }
            }
        }

        tracing::debug!(object_count = objects.len(), "read snapshot");
        Ok(objects)
    }

    /// Replace the tree under the root with one file per object
    ///
    /// The previous tree is removed first. A failure part-way leaves a
    /// partial tree; the next successful write replaces it. Nothing is
    /// touched if the root is unsafe to replace or if two objects would
    /// share a file on a case-insensitive file system.
    #[tracing::instrument(
        skip(self, objects),
        fields(root = %self.root.display(), object_count = objects.len())
    )]
    pub fn write(&self, objects: &[SchemaObject]) -> Result<()> {
        self.check_replaceable()?;
        let files = self.planned_files(objects)?;

        if self.root.exists() {
            fs::remove_dir_all(&self.root)
                .with_context(|| format!("Failed to remove {}", self.root.display()))?;
        }
        fs::create_dir_all(&self.root)
            .with_context(|| format!("Failed to create {}", self.root.display()))?;

        for (path, object) in files {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            fs::write(&path, &object.definition)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }

        tracing::debug!("wrote snapshot");
        Ok(())
    }

    fn check_replaceable(&self) -> Result<()> {
        let root = resolve(&self.root)?;
        if let Some(boundary) = &self.boundary {
            let boundary = fs::canonicalize(boundary)
                .with_context(|| format!("Failed to resolve {}", boundary.display()))?;
            if root == boundary || !root.starts_with(&boundary) {
                bail!(
                    "Refusing to replace {}: it is not inside {}",
                    self.root.display(),
                    boundary.display()
                );
            }
        }
        if let Some(marker) = find_repository(&root)? {
            bail!(
                "Refusing to replace {}: it contains a repository at {}",
                self.root.display(),
                marker.display()
            );
        }
        Ok(())
    }

    /// Target file of every object, rejecting names that differ only in case
    fn planned_files<'a>(
        &self,
        objects: &'a [SchemaObject],
    ) -> Result<Vec<(PathBuf, &'a SchemaObject)>> {
        let mut seen: HashMap<String, ObjectKey> = HashMap::with_capacity(objects.len());
        let mut files = Vec::with_capacity(objects.len());
        for object in objects {
            let key = object.key();
            let path = self.object_path(&key);
            let folded = path.to_string_lossy().to_lowercase();
            if let Some(other) = seen.insert(folded, key.clone()) {
                bail!(
                    "{other} and {key} would share the file {} on a case-insensitive file system",
                    path.display()
                );
            }
            files.push((path, object));
        }
        Ok(files)
    }
}

/// Absolute, symlink-free form of `path`, which need not exist yet
fn resolve(path: &Path) -> Result<PathBuf> {
    let mut existing = path.to_path_buf();
    let mut missing = Vec::new();
    loop {
        if existing.as_os_str().is_empty() {
            existing = PathBuf::from(".");
        }
        if existing.exists() {
            break;
        }
        let Some(name) = existing.file_name().map(|n| n.to_os_string()) else {
            bail!("Cannot resolve snapshot root {}", path.display());
        };
        missing.push(name);
        existing.pop();
    }

    let mut resolved = fs::canonicalize(&existing)
        .with_context(|| format!("Failed to resolve {}", existing.display()))?;
    resolved.extend(missing.iter().rev());
    Ok(resolved)
}

/// First `.git` entry at or below `dir`, without following symlinks
fn find_repository(dir: &Path) -> Result<Option<PathBuf>> {
    if !dir.is_dir() {
        return Ok(None);
    }
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to list {}", dir.display()))? {
        let entry = entry.with_context(|| format!("Failed to list {}", dir.display()))?;
        let path = entry.path();
        if entry.file_name() == ".git" {
            return Ok(Some(path));
        }
        let is_dir = entry
            .file_type()
            .with_context(|| format!("Failed to inspect {}", path.display()))?
            .is_dir();
        if is_dir && let Some(found) = find_repository(&path)? {
            return Ok(Some(found));
        }
    }
    Ok(None)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to list {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

fn visible_dir_name(path: &Path) -> Option<String> {
    let name = path.file_name()?.to_str()?;
    (!is_hidden(name) && path.is_dir()).then(|| name.to_string())
}

fn object_file_name(path: &Path) -> Option<String> {
    let file_name = path.file_name()?.to_str()?;
    if is_hidden(file_name) || !path.is_file() {
        return None;
    }
    if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
        return None;
    }
    path.file_stem()?.to_str().map(str::to_string)
}

/// Encode a schema or object name as a single path segment
///
/// Reserved characters and a leading `.` become `%XX`.
pub fn encode_segment(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for (i, c) in name.chars().enumerate() {
        if RESERVED.contains(&c) || (i == 0 && c == '.') {
            out.push_str(&format!("%{:02X}", c as u32));
        } else {
            out.push(c);
        }
    }
    out
}

/// Inverse of `encode_segment`; malformed escapes are kept literally
pub fn decode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    let mut rest = segment;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escaped = rest
            .get(pos + 1..pos + 3)
            .and_then(|hex| u8::from_str_radix(hex, 16).ok())
            .filter(u8::is_ascii);
        match escaped {
            Some(byte) => {
                out.push(byte as char);
                rest = &rest[pos + 3..];
            }
            None => {
                out.push('%');
                rest = &rest[pos + 1..];
            }
        }
    }
    out.push_str(rest);
    out
}
