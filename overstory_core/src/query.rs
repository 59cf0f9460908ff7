// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Path queries over element trees.
//!
//! The adapter that lets `overstory_opaq` patterns resolve against live
//! elements: a query starting from the context matches its first token
//! against the roots; starting from an element, against that element's
//! children. See the opaq crate for the pattern syntax.

use std::sync::Arc;

use overstory_opaq::{ChildLookup, MatchBy, Pattern, PatternOptions};

use crate::context::Context;
use crate::element::Element;

struct ElementChildren;

impl ChildLookup<Arc<Element>> for ElementChildren {
    fn children_of(&self, node: &Arc<Element>) -> Vec<Arc<Element>> {
        node.children()
    }

    fn label_of(&self, node: &Arc<Element>, by: MatchBy) -> String {
        match by {
            MatchBy::Name => node.name(),
            MatchBy::Id => node.id().to_string(),
        }
    }
}

impl Context {
    /// Resolve a path pattern against the root elements.
    #[must_use]
    pub fn find(&self, path: &str) -> Vec<Arc<Element>> {
        self.find_with(path, &PatternOptions::default())
    }

    /// Resolve a path pattern against the root elements with explicit
    /// options (separator, id matching).
    #[must_use]
    pub fn find_with(&self, path: &str, options: &PatternOptions) -> Vec<Arc<Element>> {
        Pattern::parse(path, options).resolve(&self.roots(), &ElementChildren)
    }
}

impl Element {
    /// Resolve a path pattern against this element's children.
    #[must_use]
    pub fn find(&self, path: &str) -> Vec<Arc<Element>> {
        self.find_with(path, &PatternOptions::default())
    }

    /// Resolve a path pattern against this element's children with
    /// explicit options.
    #[must_use]
    pub fn find_with(&self, path: &str, options: &PatternOptions) -> Vec<Arc<Element>> {
        Pattern::parse(path, options).resolve(&self.children(), &ElementChildren)
    }
}
