//! Local name allocation.

use std::collections::HashSet;

/// Names reserved in every scope.
const RESERVED: &[&str] = &["object"];

/// A chain of allocated-name sets, one per open block.
///
/// A name is free only if no enclosing block uses it; a taken name is
/// shadowed by prefixing `_` until it is free.
#[derive(Debug)]
pub struct Scope {
    frames: Vec<HashSet<String>>,
}

impl Default for Scope {
    fn default() -> Self {
        Scope {
            frames: vec![Self::frame()],
        }
    }
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    fn frame() -> HashSet<String> {
        RESERVED.iter().map(|s| s.to_string()).collect()
    }

    pub fn push(&mut self) {
        self.frames.push(Self::frame());
    }

    /// Close the innermost block. The outermost frame is never popped.
    pub fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }

    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    pub fn is_used(&self, name: &str) -> bool {
        self.frames.iter().any(|f| f.contains(name))
    }

    /// Allocate `desired`, or the first free `_`-prefixed form of it.
    pub fn allocate(&mut self, desired: &str) -> String {
        let mut name = if desired.is_empty() {
            "v".to_string()
        } else {
            desired.to_string()
        };
        while self.is_used(&name) {
            name.insert(0, '_');
        }
        if let Some(frame) = self.frames.last_mut() {
            frame.insert(name.clone());
        }
        name
    }
}
