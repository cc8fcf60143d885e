//! Built-in mapping passes.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{MapRequest, MapResult, MappingPass, MappingScope};
use crate::core::filter::Filter;
use crate::core::resolved::ResolvedTree;

/// A pass backed by a closure that records edits in a [`MappingScope`].
pub struct FnPass<F> {
    name: String,
    filter: Filter,
    handler: F,
}

impl<F> FnPass<F>
where
    F: Fn(&ResolvedTree, &MapRequest, &mut MappingScope) -> Result<()>,
{
    pub fn new(name: impl Into<String>, filter: Filter, handler: F) -> Self {
        FnPass {
            name: name.into(),
            filter,
            handler,
        }
    }
}

impl<F> MappingPass for FnPass<F>
where
    F: Fn(&ResolvedTree, &MapRequest, &mut MappingScope) -> Result<()>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn filter(&self) -> &Filter {
        &self.filter
    }

    fn map(&self, tree: &ResolvedTree, request: &MapRequest) -> Result<Vec<MapResult>> {
        let mut scope = MappingScope::new();
        (self.handler)(tree, request, &mut scope)?;
        Ok(scope.finish())
    }
}

/// Edit applied by a [`DeclarativePass`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MappingAction {
    Remove,
    RemoveParent,
}

/// A `[[mapping]]` entry of `Shimsmith.toml`.
///
/// ```toml
/// [[mapping]]
/// name = "no-internal"
/// action = "remove"
/// filter = { type = "string", selector = "method-name", matcher = "starts-with", value = "internal" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingConfig {
    pub name: String,
    pub filter: Filter,
    pub action: MappingAction,
}

/// A pass configured from TOML.
#[derive(Debug, Clone)]
pub struct DeclarativePass {
    config: MappingConfig,
}

impl DeclarativePass {
    pub fn new(config: MappingConfig) -> Self {
        DeclarativePass { config }
    }
}

impl MappingPass for DeclarativePass {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn filter(&self) -> &Filter {
        &self.config.filter
    }

    fn map(&self, _tree: &ResolvedTree, _request: &MapRequest) -> Result<Vec<MapResult>> {
        Ok(vec![match self.config.action {
            MappingAction::Remove => MapResult::RemoveChild,
            MappingAction::RemoveParent => MapResult::RemoveParent,
        }])
    }
}
