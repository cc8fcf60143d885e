//! Rewrite protocol for the resolved tree.
//!
//! Mapping passes restructure a resolved tree after resolution and before
//! emission. A [`Rewriter`] holds the registered passes and runs one
//! best-effort sweep:
//!
//! 1. Snapshot the tree in preorder.
//! 2. For each element that is still attached, test every pass's filter in
//!    registration order.
//! 3. Apply the results of each matching pass immediately.
//!
//! There is no fixed point and no rollback. A failing handler aborts the
//! sweep and leaves the edits made so far in place.

pub mod passes;
pub mod scope;

pub use passes::{DeclarativePass, FnPass, MappingAction, MappingConfig};
pub use scope::MappingScope;

use anyhow::{anyhow, Result};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::filter::Filter;
use crate::core::resolved::{Resolved, ResolvedTree};
use crate::core::tree::{Detached, NodeId};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// One edit requested by a pass.
///
/// Child variants act on the matched element inside its parent; parent
/// variants act on the parent inside the grandparent.
#[derive(Debug, Clone, PartialEq)]
pub enum MapResult {
    NoChange,
    RemoveChild,
    RemoveParent,
    /// Append under the matched element.
    AddToChild(Detached<Resolved>),
    /// Append a sibling under the matched element's parent.
    AddToParent(Detached<Resolved>),
    /// Replace the matched element, keeping its position.
    ReplaceChild(Detached<Resolved>),
    ReplaceParent(Detached<Resolved>),
}

/// The element a pass is invoked on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapRequest {
    pub element: NodeId,
    /// The element's parent, the module root for classes.
    pub parent: NodeId,
    /// Position of `element` among `parent`'s children.
    pub index: usize,
}

/// An external mapping pass.
pub trait MappingPass {
    /// Name used in logs and errors.
    fn name(&self) -> &str;

    /// Elements the pass applies to.
    fn filter(&self) -> &Filter;

    /// Compute the edits for one matched element.
    fn map(&self, tree: &ResolvedTree, request: &MapRequest) -> Result<Vec<MapResult>>;
}

/// Errors raised by a rewrite sweep.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("mapping pass `{pass}` failed on {element}: {message}")]
    PassFailed {
        pass: String,
        element: String,
        message: String,
    },
}

impl RewriteError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            RewriteError::PassFailed { pass, element, .. } => {
                let mut diag = Diagnostic::error(self.to_string());
                diag = diag.with_context(format!("while applying `{}` to {}", pass, element));
                diag = diag.with_suggestion(suggestions::GENERATION_FAILED);
                diag
            }
        }
    }
}

/// Counters from one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub visited: usize,
    pub matched: usize,
    pub applied: usize,
}

/// The registered passes of a session.
#[derive(Default)]
pub struct Rewriter {
    passes: Vec<Box<dyn MappingPass>>,
}

impl Rewriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a pass. Passes run in registration order.
    pub fn add_pass(&mut self, pass: Box<dyn MappingPass>) {
        self.passes.push(pass);
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    /// Run one sweep over `tree`.
    pub fn sweep(&self, tree: &mut ResolvedTree) -> Result<SweepStats, RewriteError> {
        self.sweep_from(0, tree)
    }

    /// Run one sweep with the passes registered at `first` and later.
    pub fn sweep_from(
        &self,
        first: usize,
        tree: &mut ResolvedTree,
    ) -> Result<SweepStats, RewriteError> {
        let mut stats = SweepStats::default();
        let passes = self.passes.get(first..).unwrap_or_default();
        if passes.is_empty() {
            return Ok(stats);
        }

        let snapshot = tree.preorder();
        info!(
            "rewriting {} elements with {} passes",
            snapshot.len(),
            passes.len()
        );

        for id in snapshot {
            // An earlier edit may have taken the element out of the tree.
            if !tree.is_attached(id) {
                continue;
            }
            stats.visited += 1;
            for pass in passes {
                if !tree.is_attached(id) {
                    break;
                }
                if !pass.filter().matches(&*tree, id) {
                    continue;
                }
                stats.matched += 1;

                let (Some(parent), Some(index)) = (tree.parent(id), tree.index_in_parent(id))
                else {
                    break;
                };
                let request = MapRequest {
                    element: id,
                    parent,
                    index,
                };
                let results = pass
                    .map(tree, &request)
                    .map_err(|e| failed(tree, pass.as_ref(), id, e))?;
                for result in results {
                    let changed = apply(tree, &request, result)
                        .map_err(|e| failed(tree, pass.as_ref(), id, e))?;
                    if changed {
                        stats.applied += 1;
                    }
                }
            }
        }

        debug!(
            "sweep matched {} elements, applied {} edits",
            stats.matched, stats.applied
        );
        Ok(stats)
    }
}

fn failed(tree: &ResolvedTree, pass: &dyn MappingPass, id: NodeId, err: anyhow::Error) -> RewriteError {
    RewriteError::PassFailed {
        pass: pass.name().to_string(),
        element: tree.get(id).to_string(),
        message: format!("{:#}", err),
    }
}

/// Apply one result. Returns whether the tree changed.
fn apply(tree: &mut ResolvedTree, request: &MapRequest, result: MapResult) -> Result<bool> {
    let MapRequest {
        element, parent, ..
    } = *request;

    Ok(match result {
        MapResult::NoChange => false,
        MapResult::RemoveChild => tree.remove_child(parent, element),
        MapResult::ReplaceChild(node) => tree.replace_child(parent, element, node).is_some(),
        MapResult::AddToChild(node) => {
            tree.add_child(element, node);
            true
        }
        MapResult::AddToParent(node) => {
            tree.add_child(parent, node);
            true
        }
        MapResult::RemoveParent => {
            let grandparent = grandparent(tree, request)?;
            tree.remove_child(grandparent, parent)
        }
        MapResult::ReplaceParent(node) => {
            let grandparent = grandparent(tree, request)?;
            tree.replace_child(grandparent, parent, node).is_some()
        }
    })
}

fn grandparent(tree: &ResolvedTree, request: &MapRequest) -> Result<NodeId> {
    tree.parent(request.parent)
        .ok_or_else(|| anyhow!("{} has no parent to edit", tree.get(request.element)))
}
