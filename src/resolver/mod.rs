//! Type resolution.
//!
//! This module turns the classes a session asks for into a closed resolved
//! tree. Every type a surviving element mentions either names a class of the
//! module, is a native/pointer/void terminal, or was handled by the
//! [`ReferencePolicy`]. Resolution is pure and deterministic: the same
//! declarations, policy and initial classes always produce the same tree and
//! the same C names.

pub mod abi;
pub mod element;
pub mod errors;
mod tracker;
pub mod type_mapping;

pub use errors::ResolveError;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::core::decl::{Decl, MethodKind};
use crate::core::namer::Namer;
use crate::core::resolved::{new_resolved_tree, ResolvedTree};
use crate::core::tree::{Detached, NodeId};
use crate::sources::DeclarationProvider;
use abi::AbiConverter;
use element::ElementMapper;
use tracker::Tracker;
use type_mapping::TypeMapper;

/// What to do with a type that names no known class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferencePolicy {
    /// Remove the element that mentions the type.
    #[default]
    IgnoreMissing,
    /// Keep the type as written and carry it across the C boundary as `void*`.
    OpaqueMissing,
    /// Fail resolution.
    ThrowMissing,
    /// Look the class up and add it to the module.
    IncludeMissing,
}

impl ReferencePolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReferencePolicy::IgnoreMissing => "ignore-missing",
            ReferencePolicy::OpaqueMissing => "opaque-missing",
            ReferencePolicy::ThrowMissing => "throw-missing",
            ReferencePolicy::IncludeMissing => "include-missing",
        }
    }
}

impl FromStr for ReferencePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ignore-missing" | "ignore" => Ok(ReferencePolicy::IgnoreMissing),
            "opaque-missing" | "opaque" => Ok(ReferencePolicy::OpaqueMissing),
            "throw-missing" | "throw" => Ok(ReferencePolicy::ThrowMissing),
            "include-missing" | "include" => Ok(ReferencePolicy::IncludeMissing),
            _ => Err(format!(
                "unknown reference policy `{}`: expected ignore-missing, opaque-missing, \
                 throw-missing or include-missing",
                s
            )),
        }
    }
}

impl fmt::Display for ReferencePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Options for one resolution call.
#[derive(Debug, Clone, Default)]
pub struct ResolveOptions {
    pub policy: ReferencePolicy,
    /// Kotlin package for classes declared in the global namespace.
    pub package: String,
}

impl ResolveOptions {
    pub fn new(policy: ReferencePolicy) -> Self {
        ResolveOptions {
            policy,
            package: String::new(),
        }
    }

    pub fn with_package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }
}

/// Resolve `initial` and everything the policy pulls in.
///
/// Classes are registered before their members are mapped, so classes that
/// refer to each other resolve without recursion. Classes discovered while
/// mapping are appended after the initial ones, in discovery order.
pub fn resolve_all<P: DeclarationProvider + ?Sized>(
    initial: &[NodeId],
    provider: &P,
    options: &ResolveOptions,
    namer: &mut Namer,
) -> Result<ResolvedTree, ResolveError> {
    let tree = provider.tree();
    let mut tracker = Tracker::new();
    for id in initial {
        if let Decl::Class(class) = tree.get(*id) {
            tracker.register(class.spelling(), *id);
        }
    }
    info!(
        "resolving {} classes with {}",
        tracker.len(),
        options.policy
    );

    let mut mapped: Vec<(String, Detached<Decl>)> = Vec::new();
    let mut index = 0;
    while let Some((spelling, id)) = tracker.entry(index).map(|(s, id)| (s.to_string(), id)) {
        let class = {
            let mut types = TypeMapper::new(provider, &mut tracker, options.policy);
            ElementMapper::new(tree, &mut types).map_class(id, &spelling)?
        };
        debug!("mapped {} ({} members)", spelling, class.children.len());
        mapped.push((spelling, class));
        index += 1;
    }

    let with_constructor: HashMap<&str, bool> = mapped
        .iter()
        .map(|(spelling, class)| (spelling.as_str(), declares_constructor(class)))
        .collect();
    let module_classes: HashSet<String> = tracker.spellings().iter().cloned().collect();
    let converter =
        AbiConverter::new(&module_classes, &options.package).with_opaque(tracker.opaque());

    let mut resolved = new_resolved_tree();
    let root = resolved.root();
    for (spelling, class) in &mapped {
        let base_has_constructor = class.children.iter().any(|member| match &member.kind {
            Decl::Base(base) => with_constructor
                .get(base.ty.unqualified().spelling().as_str())
                .copied()
                .unwrap_or(false),
            _ => false,
        });
        let fixed = abi::fix_up(class.clone(), base_has_constructor);
        match converter.convert_class(&fixed, namer) {
            Some(node) => {
                resolved.add_child(root, node);
            }
            None => debug!("{} is not a class, skipping", spelling),
        }
    }

    if !tracker.otherwise_resolvable().is_empty() {
        debug!(
            "template instantiations kept opaque: {}",
            tracker
                .otherwise_resolvable()
                .iter()
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        );
    }
    info!("resolved {} classes", mapped.len());
    Ok(resolved)
}

fn declares_constructor(class: &Detached<Decl>) -> bool {
    let flagged = matches!(&class.kind, Decl::Class(c) if c.has_constructor);
    flagged
        || class
            .children
            .iter()
            .any(|m| matches!(&m.kind, Decl::Method(m) if m.kind == MethodKind::Constructor))
}
