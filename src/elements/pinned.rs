//! Pinned node constraints

use crate::error::{SolverError, SolverResult};

/// Lookup of which nodes are pinned
///
/// A pinned node gets an isolated identity row in the viscosity matrix, so
/// it is decoupled from all of its neighbours.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PinnedNodes {
    pinned: Vec<bool>,
    count: usize,
}

impl PinnedNodes {
    /// No pinned nodes
    pub fn none(num_nodes: usize) -> Self {
        Self {
            pinned: vec![false; num_nodes],
            count: 0,
        }
    }

    /// Union of an explicit pinned list and the nodes pinned by binding sites
    pub fn from_sources(
        num_nodes: usize,
        explicit: &[usize],
        binding_sites: impl IntoIterator<Item = usize>,
    ) -> SolverResult<Self> {
        let mut pinned = Self::none(num_nodes);
        for node in explicit.iter().copied().chain(binding_sites) {
            pinned.pin(node)?;
        }
        Ok(pinned)
    }

    /// Pin a single node. Pinning twice is a no-op.
    pub fn pin(&mut self, node: usize) -> SolverResult<()> {
        let num_nodes = self.pinned.len();
        let slot = self
            .pinned
            .get_mut(node)
            .ok_or(SolverError::NodeNotFound { node, num_nodes })?;
        if !*slot {
            *slot = true;
            self.count += 1;
        }
        Ok(())
    }

    #[inline]
    pub fn is_pinned(&self, node: usize) -> bool {
        self.pinned.get(node).copied().unwrap_or(false)
    }

    /// Number of distinct pinned nodes
    pub fn count(&self) -> usize {
        self.count
    }

    /// Number of nodes covered by the lookup
    pub fn num_nodes(&self) -> usize {
        self.pinned.len()
    }

    /// Pinned node indices in ascending order
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.pinned
            .iter()
            .enumerate()
            .filter_map(|(i, &p)| p.then_some(i))
    }
}
