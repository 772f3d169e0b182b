/// In-memory container for synthetic sources.
use super::{ContainerOpener, CoordinateContainer, Node, normalize_path};
use crate::error::{Result, SamplerError};
use std::collections::{BTreeMap, HashMap};
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Entry {
    Group(BTreeMap<String, Entry>),
    Array {
        shape: Vec<usize>,
        rows: Arc<Vec<[f64; 3]>>,
    },
}

/// Nested tree of arrays held in memory. Children are visited in name order,
/// like an HDF5 group. Every `read_rows` call is recorded.
#[derive(Debug, Clone)]
pub struct MemoryContainer {
    name: String,
    root: Entry,
    reads: Vec<Range<usize>>,
}

impl MemoryContainer {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            root: Entry::Group(BTreeMap::new()),
            reads: Vec::new(),
        }
    }

    /// Adds an (N, 3) coordinate array at `path`, creating parent groups.
    pub fn with_coordinates(mut self, path: &str, rows: Vec<[f64; 3]>) -> Self {
        let shape = vec![rows.len(), 3];
        self.insert(
            path,
            Entry::Array {
                shape,
                rows: Arc::new(rows),
            },
        );
        self
    }

    /// Adds an array that only carries a shape. Reading rows from it fails.
    pub fn with_shape(mut self, path: &str, shape: Vec<usize>) -> Self {
        self.insert(
            path,
            Entry::Array {
                shape,
                rows: Arc::new(Vec::new()),
            },
        );
        self
    }

    pub fn with_group(mut self, path: &str) -> Self {
        self.insert(path, Entry::Group(BTreeMap::new()));
        self
    }

    /// Range reads issued so far, in call order.
    pub fn reads(&self) -> &[Range<usize>] {
        &self.reads
    }

    fn insert(&mut self, path: &str, entry: Entry) {
        let normalized = normalize_path(path);
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        let Some((leaf, parents)) = segments.split_last() else {
            return;
        };

        let mut current = &mut self.root;
        for segment in parents {
            let Entry::Group(children) = current else {
                return;
            };
            current = children
                .entry(segment.to_string())
                .or_insert_with(|| Entry::Group(BTreeMap::new()));
        }

        if let Entry::Group(children) = current {
            children.insert(leaf.to_string(), entry);
        }
    }

    fn lookup(&self, path: &str) -> Option<&Entry> {
        let normalized = normalize_path(path);
        let mut current = &self.root;
        for segment in normalized.split('/').filter(|s| !s.is_empty()) {
            match current {
                Entry::Group(children) => current = children.get(segment)?,
                Entry::Array { .. } => return None,
            }
        }
        Some(current)
    }
}

impl CoordinateContainer for MemoryContainer {
    fn name(&self) -> &str {
        &self.name
    }

    fn node(&self, path: &str) -> Result<Option<Node>> {
        Ok(self.lookup(path).map(|entry| match entry {
            Entry::Group(children) => Node::Group(children.keys().cloned().collect()),
            Entry::Array { shape, .. } => Node::Array(shape.clone()),
        }))
    }

    fn read_rows(&mut self, path: &str, rows: Range<usize>) -> Result<Vec<[f64; 3]>> {
        let data = match self.lookup(path) {
            Some(Entry::Array { shape, rows: data }) if shape.len() == 2 && shape[1] == 3 => {
                Arc::clone(data)
            }
            _ => return Err(SamplerError::not_found(format!("{}:{}", self.name, path))),
        };

        if rows.end > data.len() {
            return Err(SamplerError::IndexOutOfRange {
                index: rows.end.saturating_sub(1),
                len: data.len(),
            });
        }

        self.reads.push(rows.clone());
        Ok(data[rows].to_vec())
    }
}

/// Serves `MemoryContainer`s by path. Paths without a registered container
/// do not exist.
#[derive(Debug, Default, Clone)]
pub struct MemoryOpener {
    containers: HashMap<PathBuf, MemoryContainer>,
}

impl MemoryOpener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<PathBuf>, container: MemoryContainer) {
        self.containers.insert(path.into(), container);
    }

    pub fn with(mut self, path: impl Into<PathBuf>, container: MemoryContainer) -> Self {
        self.insert(path, container);
        self
    }
}

impl ContainerOpener for MemoryOpener {
    fn exists(&self, path: &Path) -> bool {
        self.containers.contains_key(path)
    }

    fn open(&self, path: &Path) -> Result<Box<dyn CoordinateContainer>> {
        match self.containers.get(path) {
            Some(container) => Ok(Box::new(container.clone())),
            None => Err(SamplerError::MissingInput {
                paths: vec![path.to_path_buf()],
            }),
        }
    }
}
