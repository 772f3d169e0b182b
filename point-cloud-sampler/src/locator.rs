/// Locates the (N, 3) coordinate array inside a container.
use crate::container::{CoordinateContainer, Node, join_path, normalize_path};
use crate::error::{Result, SamplerError};
use tracing::debug;

/// A resolved coordinate array: its path and row count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetHandle {
    pub path: String,
    pub len: usize,
}

/// One lookup strategy. `Ok(None)` means "not here", leaving the next
/// strategy to try; errors are reserved for a container that cannot be read.
pub trait PathResolver: Send + Sync {
    fn resolve(&self, container: &dyn CoordinateContainer) -> Result<Option<DatasetHandle>>;
}

/// Resolves a single conventional path.
#[derive(Debug, Clone)]
pub struct CandidatePath {
    path: String,
}

impl CandidatePath {
    pub fn new(path: &str) -> Self {
        Self {
            path: normalize_path(path),
        }
    }
}

impl PathResolver for CandidatePath {
    fn resolve(&self, container: &dyn CoordinateContainer) -> Result<Option<DatasetHandle>> {
        Ok(container
            .node(&self.path)?
            .and_then(|node| node.coordinate_rows())
            .map(|len| DatasetHandle {
                path: self.path.clone(),
                len,
            }))
    }
}

/// Pre-order walk of the whole container, returning the first coordinate
/// array met in traversal order.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralScan;

impl StructuralScan {
    fn visit(
        container: &dyn CoordinateContainer,
        path: &str,
    ) -> Result<Option<DatasetHandle>> {
        let Some(node) = container.node(path)? else {
            return Ok(None);
        };
        if let Some(len) = node.coordinate_rows() {
            return Ok(Some(DatasetHandle {
                path: path.to_string(),
                len,
            }));
        }
        let Node::Group(children) = node else {
            return Ok(None);
        };
        for child in children {
            if let Some(found) = Self::visit(container, &join_path(path, &child))? {
                return Ok(Some(found));
            }
        }
        Ok(None)
    }
}

impl PathResolver for StructuralScan {
    fn resolve(&self, container: &dyn CoordinateContainer) -> Result<Option<DatasetHandle>> {
        Self::visit(container, "/")
    }
}

/// Ordered resolvers tried in sequence until one finds the array.
pub struct DatasetLocator {
    resolvers: Vec<Box<dyn PathResolver>>,
}

impl DatasetLocator {
    /// Candidate paths in the given order, then a structural scan.
    pub fn with_candidates<S: AsRef<str>>(candidates: &[S]) -> Self {
        let mut resolvers: Vec<Box<dyn PathResolver>> = candidates
            .iter()
            .map(|c| Box::new(CandidatePath::new(c.as_ref())) as Box<dyn PathResolver>)
            .collect();
        resolvers.push(Box::new(StructuralScan));
        Self { resolvers }
    }

    /// First array any resolver finds, or `NotFound` once all are exhausted.
    pub fn locate(&self, container: &dyn CoordinateContainer) -> Result<DatasetHandle> {
        for resolver in &self.resolvers {
            if let Some(handle) = resolver.resolve(container)? {
                debug!(
                    container = container.name(),
                    path = %handle.path,
                    rows = handle.len,
                    "located coordinate array"
                );
                return Ok(handle);
            }
        }
        Err(SamplerError::not_found(container.name()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::MemoryContainer;
    use constants::dataset_paths::POSITION_CANDIDATES;

    fn rows(n: usize) -> Vec<[f64; 3]> {
        vec![[0.0; 3]; n]
    }

    #[test]
    fn first_matching_candidate_wins() {
        let container = MemoryContainer::new("snap")
            .with_coordinates("/pos", rows(5))
            .with_coordinates("/PartType1/Coordinates", rows(7));

        let handle = DatasetLocator::with_candidates(POSITION_CANDIDATES)
            .locate(&container)
            .unwrap();
        assert_eq!(
            handle,
            DatasetHandle {
                path: "/PartType1/Coordinates".into(),
                len: 7
            }
        );
    }

    #[test]
    fn candidates_with_wrong_shape_are_passed_over() {
        let container = MemoryContainer::new("snap")
            .with_shape("/PartType1/Coordinates", vec![7, 4])
            .with_coordinates("/particles/pos", rows(3));

        let handle = DatasetLocator::with_candidates(POSITION_CANDIDATES)
            .locate(&container)
            .unwrap();
        assert_eq!(handle.path, "/particles/pos");
        assert_eq!(handle.len, 3);
    }

    #[test]
    fn falls_back_to_structural_scan_in_traversal_order() {
        let container = MemoryContainer::new("volume")
            .with_shape("/a/masses", vec![10])
            .with_shape("/a/velocities", vec![10, 2])
            .with_coordinates("/b/inner/xyz", rows(10))
            .with_coordinates("/c/xyz", rows(4));

        let handle = DatasetLocator::with_candidates(POSITION_CANDIDATES)
            .locate(&container)
            .unwrap();
        assert_eq!(handle.path, "/b/inner/xyz");
        assert_eq!(handle.len, 10);
    }

    #[test]
    fn exhaustion_is_not_found() {
        let container = MemoryContainer::new("empty.hdf5")
            .with_group("/Header")
            .with_shape("/PartType1/Masses", vec![100]);

        let err = DatasetLocator::with_candidates(POSITION_CANDIDATES)
            .locate(&container)
            .unwrap_err();
        assert!(matches!(err, SamplerError::NotFound { ref container } if container == "empty.hdf5"));
    }

    #[test]
    fn empty_arrays_still_resolve() {
        let container = MemoryContainer::new("snap").with_coordinates("/pos", Vec::new());
        let handle = DatasetLocator::with_candidates(&["/pos"]).locate(&container).unwrap();
        assert_eq!(handle.len, 0);
    }
}
