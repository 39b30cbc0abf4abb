//! In-memory filesystem tree.
//!
//! Serializes to the nested `{"file": {"contents": ..}}` /
//! `{"directory": {..}}` shape sandboxed runtimes mount directly.

use std::collections::BTreeMap;
use std::collections::btree_map::Entry;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileEntry {
    File { contents: String },
    Directory(FileSystemTree),
}

impl FileEntry {
    pub fn is_file(&self) -> bool {
        matches!(self, FileEntry::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self, FileEntry::Directory(_))
    }
}

/// A directory's entries by name. A name maps to exactly one entry, so it is
/// never both a file and a directory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileSystemTree {
    entries: BTreeMap<String, FileEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InsertError {
    #[error("Invalid file path")]
    InvalidPath,
    #[error("{path} has already been defined as a file")]
    FileInTheWay { path: String },
    #[error("{path} has already been defined as a directory")]
    DirectoryInTheWay { path: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeConflict {
    #[error("{path} is defined as both a file and a directory")]
    FileAndDirectory { path: String },
    #[error("{path} is defined more than once with different contents")]
    DivergentFile { path: String },
}

/// A sanitized path: zero or more directories and a file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathParts {
    pub dirs: Vec<String>,
    pub basename: String,
}

impl PathParts {
    /// Sanitize `raw`: leading and trailing runs of `.` and `/` go, as do
    /// empty and `.` segments; every segment is trimmed. `None` when nothing
    /// is left.
    pub fn parse(raw: &str) -> Option<Self> {
        let mut dirs: Vec<String> = raw
            .trim_matches(|c| c == '.' || c == '/')
            .split('/')
            .map(str::trim)
            .filter(|segment| !segment.is_empty() && *segment != ".")
            .map(str::to_string)
            .collect();
        let basename = dirs.pop()?;
        Some(PathParts { dirs, basename })
    }
}

impl fmt::Display for PathParts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for dir in &self.dirs {
            write!(f, "{}/", dir)?;
        }
        f.write_str(&self.basename)
    }
}

impl FileSystemTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of direct entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FileEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    /// Builder used to spell out expected trees.
    pub fn with_file(mut self, name: impl Into<String>, contents: impl Into<String>) -> Self {
        self.entries.insert(
            name.into(),
            FileEntry::File {
                contents: contents.into(),
            },
        );
        self
    }

    pub fn with_directory(mut self, name: impl Into<String>, children: FileSystemTree) -> Self {
        self.entries
            .insert(name.into(), FileEntry::Directory(children));
        self
    }

    /// Look up an entry by slash-separated path.
    pub fn get(&self, path: &str) -> Option<&FileEntry> {
        let parts = PathParts::parse(path)?;
        let mut dir = self;
        for segment in &parts.dirs {
            match dir.entries.get(segment)? {
                FileEntry::Directory(children) => dir = children,
                FileEntry::File { .. } => return None,
            }
        }
        dir.entries.get(&parts.basename)
    }

    /// Contents of the file at `path`.
    pub fn file(&self, path: &str) -> Option<&str> {
        match self.get(path)? {
            FileEntry::File { contents } => Some(contents),
            FileEntry::Directory(_) => None,
        }
    }

    /// Every file as `(path, contents)`, sorted by path.
    pub fn files(&self) -> Vec<(String, &str)> {
        let mut out = Vec::new();
        self.collect_files("", &mut out);
        out
    }

    fn collect_files<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a str)>) {
        for (name, entry) in &self.entries {
            let path = join(prefix, name);
            match entry {
                FileEntry::File { contents } => out.push((path, contents.as_str())),
                FileEntry::Directory(children) => children.collect_files(&path, out),
            }
        }
    }

    /// Write `contents` at the sanitized `raw_path`, creating directories on
    /// the way. An existing file at the leaf is overwritten. A file standing
    /// where a directory is needed, or a directory where the file goes,
    /// rejects the write and leaves the tree untouched.
    pub fn insert(&mut self, raw_path: &str, contents: &str) -> Result<(), InsertError> {
        let parts = PathParts::parse(raw_path).ok_or(InsertError::InvalidPath)?;

        let mut dir = self;
        for (i, segment) in parts.dirs.iter().enumerate() {
            // A clash can only sit on a segment that already existed, so
            // nothing has been created yet when this returns.
            dir = match dir
                .entries
                .entry(segment.clone())
                .or_insert_with(|| FileEntry::Directory(FileSystemTree::default()))
            {
                FileEntry::Directory(children) => children,
                FileEntry::File { .. } => {
                    return Err(InsertError::FileInTheWay {
                        path: parts.dirs[..=i].join("/"),
                    });
                }
            };
        }

        if dir.entries.get(&parts.basename).is_some_and(FileEntry::is_directory) {
            return Err(InsertError::DirectoryInTheWay {
                path: parts.to_string(),
            });
        }

        dir.entries.insert(
            parts.basename,
            FileEntry::File {
                contents: contents.to_string(),
            },
        );
        Ok(())
    }

    /// Fold `other` into `self` entry by entry. Clashing entries keep the
    /// value already in `self` and are reported; everything else is merged.
    pub fn merge(&mut self, other: FileSystemTree) -> Vec<MergeConflict> {
        let mut conflicts = Vec::new();
        self.merge_into(other, "", &mut conflicts);
        conflicts
    }

    fn merge_into(&mut self, other: FileSystemTree, prefix: &str, conflicts: &mut Vec<MergeConflict>) {
        for (name, incoming) in other.entries {
            match self.entries.entry(name) {
                Entry::Vacant(slot) => {
                    slot.insert(incoming);
                }
                Entry::Occupied(mut slot) => {
                    let path = join(prefix, slot.key());
                    match (slot.get_mut(), incoming) {
                        (FileEntry::Directory(mine), FileEntry::Directory(theirs)) => {
                            mine.merge_into(theirs, &path, conflicts);
                        }
                        (FileEntry::File { contents: mine }, FileEntry::File { contents: theirs }) => {
                            if *mine != theirs {
                                conflicts.push(MergeConflict::DivergentFile { path });
                            }
                        }
                        _ => conflicts.push(MergeConflict::FileAndDirectory { path }),
                    }
                }
            }
        }
    }

    /// Indented listing, directories suffixed with `/`.
    pub fn render_tree(&self) -> String {
        let mut out = String::new();
        self.render_into(0, &mut out);
        out
    }

    fn render_into(&self, indent: usize, out: &mut String) {
        for (name, entry) in &self.entries {
            out.push_str(&"  ".repeat(indent));
            out.push_str(name);
            match entry {
                FileEntry::File { .. } => out.push('\n'),
                FileEntry::Directory(children) => {
                    out.push_str("/\n");
                    children.render_into(indent + 1, out);
                }
            }
        }
    }
}

fn join(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", prefix, name)
    }
}
