// Copyright 2026 the Overstory Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Overstory Opaq: glob-style hierarchical path queries.
//!
//! Opaq resolves slash-separated path patterns against any tree that can
//! answer "what are this node's children and what are they called". It does
//! not assume a particular element type, tree representation, or ownership
//! model; callers implement [`ChildLookup`] and hand the resolver a set of
//! starting nodes.
//!
//! ## Pattern syntax
//!
//! - Tokens are separated by the configured separator (default `/`).
//! - A token matches a child's *name* by default, or its *id* when
//!   [`MatchBy::Id`] is configured.
//! - `*` inside a token matches any run of characters; a bare `*` matches
//!   any one segment. `?` matches a single character.
//! - `**` as a whole token matches any number of segments, including zero.
//! - `{a,b}` alternation expands within a token: `btn_{ok,cancel}`.
//!
//! ## Minimal example
//!
//! ```
//! use overstory_opaq::{ChildLookup, MatchBy, Pattern, PatternOptions};
//!
//! // A toy tree: 0 → (1 "menu", 2 "body"), 1 → (3 "item_a", 4 "item_b").
//! struct Toy;
//! impl ChildLookup<u32> for Toy {
//!     fn children_of(&self, node: &u32) -> Vec<u32> {
//!         match node {
//!             0 => vec![1, 2],
//!             1 => vec![3, 4],
//!             _ => Vec::new(),
//!         }
//!     }
//!     fn label_of(&self, node: &u32, _by: MatchBy) -> String {
//!         match node {
//!             1 => "menu".into(),
//!             2 => "body".into(),
//!             3 => "item_a".into(),
//!             4 => "item_b".into(),
//!             n => n.to_string(),
//!         }
//!     }
//! }
//!
//! let pattern = Pattern::parse("menu/item_*", &PatternOptions::default());
//! assert_eq!(pattern.resolve(&[1, 2], &Toy), vec![3, 4]);
//! ```

#![no_std]

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

/// Whether tokens match a child's name or its id.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum MatchBy {
    /// Match against the node's name (the default).
    #[default]
    Name,
    /// Match against the node's id rendered as text.
    Id,
}

/// Parsing and matching options for a [`Pattern`].
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PatternOptions {
    /// Token separator.
    pub separator: char,
    /// What tokens match against.
    pub match_by: MatchBy,
}

impl Default for PatternOptions {
    fn default() -> Self {
        Self {
            separator: '/',
            match_by: MatchBy::Name,
        }
    }
}

/// Supplies children and labels for resolution.
///
/// The resolver never assumes it can enumerate the whole tree; it only ever
/// asks for the children of nodes it has reached.
pub trait ChildLookup<K> {
    /// The children of `node`, in discovery order.
    fn children_of(&self, node: &K) -> Vec<K>;
    /// The label of `node` under the given match mode.
    fn label_of(&self, node: &K, by: MatchBy) -> String;
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Token {
    /// `**`: any number of segments, including zero.
    AnyDepth,
    /// A literal-with-wildcards segment, pre-expanded over alternations.
    Segment(Vec<String>),
}

/// A parsed path pattern.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    tokens: Vec<Token>,
    options: PatternOptions,
}

impl Pattern {
    /// Parse a path into a pattern.
    ///
    /// Empty tokens (leading, trailing, or doubled separators) are dropped.
    #[must_use]
    pub fn parse(path: &str, options: &PatternOptions) -> Self {
        let tokens = path
            .split(options.separator)
            .filter(|t| !t.is_empty())
            .map(|t| {
                if t == "**" {
                    Token::AnyDepth
                } else {
                    Token::Segment(expand_alternations(t))
                }
            })
            .collect();
        Self {
            tokens,
            options: *options,
        }
    }

    /// Whether the pattern has no tokens.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Resolve the pattern against a set of starting nodes.
    ///
    /// The first token is matched against the starting nodes themselves
    /// (context roots, or the children of the element the query starts
    /// from). Matches are returned in depth-first discovery order, without
    /// duplicates.
    #[must_use]
    pub fn resolve<K, L>(&self, start: &[K], lookup: &L) -> Vec<K>
    where
        K: Clone + PartialEq,
        L: ChildLookup<K>,
    {
        let mut out = Vec::new();
        if self.tokens.is_empty() {
            return out;
        }
        for node in start {
            self.step(node, 0, lookup, &mut out);
        }
        out
    }

    fn step<K, L>(&self, node: &K, idx: usize, lookup: &L, out: &mut Vec<K>)
    where
        K: Clone + PartialEq,
        L: ChildLookup<K>,
    {
        match &self.tokens[idx] {
            Token::AnyDepth => {
                if idx + 1 == self.tokens.len() {
                    // Trailing `**` matches this node and everything below.
                    push_unique(out, node.clone());
                    for child in lookup.children_of(node) {
                        self.step(&child, idx, lookup, out);
                    }
                } else {
                    // Zero segments: try the rest here.
                    self.step(node, idx + 1, lookup, out);
                    // One-or-more: stay on `**` for each child.
                    for child in lookup.children_of(node) {
                        self.step(&child, idx, lookup, out);
                    }
                }
            }
            Token::Segment(alternatives) => {
                let label = lookup.label_of(node, self.options.match_by);
                if !alternatives.iter().any(|a| wildcard_match(a, &label)) {
                    return;
                }
                if idx + 1 == self.tokens.len() {
                    push_unique(out, node.clone());
                } else {
                    // A tail of `**` tokens can match zero segments, in
                    // which case the path ends right here.
                    if self.tokens[idx + 1..].iter().all(|t| *t == Token::AnyDepth) {
                        push_unique(out, node.clone());
                    }
                    for child in lookup.children_of(node) {
                        self.step(&child, idx + 1, lookup, out);
                    }
                }
            }
        }
    }
}

fn push_unique<K: PartialEq>(out: &mut Vec<K>, node: K) {
    if !out.contains(&node) {
        out.push(node);
    }
}

/// Expand the first top-level `{a,b}` group, recursing for nested groups.
fn expand_alternations(token: &str) -> Vec<String> {
    let bytes = token.as_bytes();
    let Some(open) = token.find('{') else {
        return alloc::vec![String::from(token)];
    };

    let mut depth = 0_usize;
    let mut close = None;
    let mut splits = Vec::new();
    for (i, &b) in bytes.iter().enumerate().skip(open) {
        match b {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    close = Some(i);
                    break;
                }
            }
            b',' if depth == 1 => splits.push(i),
            _ => {}
        }
    }
    let Some(close) = close else {
        // Unbalanced brace: treat literally.
        return alloc::vec![String::from(token)];
    };

    let prefix = &token[..open];
    let suffix = &token[close + 1..];
    let mut out = Vec::new();
    let mut begin = open + 1;
    for end in splits.iter().copied().chain([close]) {
        let choice = &token[begin..end];
        let mut candidate = String::from(prefix);
        candidate.push_str(choice);
        candidate.push_str(suffix);
        out.extend(expand_alternations(&candidate));
        begin = end + 1;
    }
    out
}

/// Iterative `*`/`?` wildcard match.
fn wildcard_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0_usize, 0_usize);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::borrow::ToOwned;
    use alloc::string::ToString;
    use alloc::vec;

    // A fixed tree:
    //   1 "root"
    //   ├── 2 "menu"
    //   │   ├── 4 "item_ok"
    //   │   └── 5 "item_cancel"
    //   └── 3 "body"
    //       └── 6 "menu"
    struct Tree;

    impl ChildLookup<u32> for Tree {
        fn children_of(&self, node: &u32) -> Vec<u32> {
            match node {
                1 => vec![2, 3],
                2 => vec![4, 5],
                3 => vec![6],
                _ => Vec::new(),
            }
        }

        fn label_of(&self, node: &u32, by: MatchBy) -> String {
            if by == MatchBy::Id {
                return node.to_string();
            }
            match node {
                1 => "root",
                2 | 6 => "menu",
                3 => "body",
                4 => "item_ok",
                5 => "item_cancel",
                _ => "",
            }
            .to_owned()
        }
    }

    fn resolve(path: &str) -> Vec<u32> {
        Pattern::parse(path, &PatternOptions::default()).resolve(&[1], &Tree)
    }

    #[test]
    fn literal_path() {
        assert_eq!(resolve("root/menu/item_ok"), vec![4]);
    }

    #[test]
    fn single_star_matches_one_segment() {
        assert_eq!(resolve("root/*/item_ok"), vec![4]);
        assert_eq!(resolve("root/*"), vec![2, 3]);
    }

    #[test]
    fn in_token_wildcards() {
        assert_eq!(resolve("root/menu/item_*"), vec![4, 5]);
        assert_eq!(resolve("root/menu/item_o?"), vec![4]);
    }

    #[test]
    fn double_star_any_depth() {
        // Both "menu" nodes, at different depths.
        assert_eq!(resolve("**/menu"), vec![2, 6]);
        // Zero-depth: `**` may match nothing before the literal.
        assert_eq!(resolve("root/**/item_ok"), vec![4]);
    }

    #[test]
    fn trailing_double_star_matches_subtree() {
        assert_eq!(resolve("root/menu/**"), vec![2, 4, 5]);
    }

    #[test]
    fn alternation() {
        assert_eq!(resolve("root/menu/item_{ok,cancel}"), vec![4, 5]);
        assert_eq!(resolve("root/{menu,body}"), vec![2, 3]);
    }

    #[test]
    fn match_by_id() {
        let options = PatternOptions {
            match_by: MatchBy::Id,
            ..Default::default()
        };
        let found = Pattern::parse("1/2/*", &options).resolve(&[1], &Tree);
        assert_eq!(found, vec![4, 5]);
    }

    #[test]
    fn custom_separator() {
        let options = PatternOptions {
            separator: '.',
            ..Default::default()
        };
        let found = Pattern::parse("root.menu.item_ok", &options).resolve(&[1], &Tree);
        assert_eq!(found, vec![4]);
    }

    #[test]
    fn empty_tokens_are_dropped() {
        assert_eq!(resolve("/root//menu/"), vec![2]);
    }

    #[test]
    fn empty_pattern_matches_nothing() {
        assert!(resolve("").is_empty());
        assert!(Pattern::parse("", &PatternOptions::default()).is_empty());
    }

    #[test]
    fn no_duplicates_from_overlapping_expansions() {
        // `**` and alternation can reach the same nodes; results stay unique.
        assert_eq!(resolve("**/item_*"), vec![4, 5]);
        assert_eq!(resolve("root/{menu,men*}/item_ok"), vec![4]);
    }

    #[test]
    fn wildcard_match_basics() {
        assert!(wildcard_match("*", "anything"));
        assert!(wildcard_match("a*c", "abc"));
        assert!(wildcard_match("a*c", "ac"));
        assert!(!wildcard_match("a*c", "ab"));
        assert!(wildcard_match("???", "abc"));
        assert!(!wildcard_match("??", "abc"));
        assert!(wildcard_match("", ""));
        assert!(!wildcard_match("", "x"));
    }

    #[test]
    fn nested_alternation_expands() {
        let expanded = expand_alternations("a{b,c{d,e}}f");
        assert_eq!(
            expanded,
            vec![
                String::from("abf"),
                String::from("acdf"),
                String::from("acef")
            ]
        );
    }

    #[test]
    fn unbalanced_brace_is_literal() {
        assert_eq!(expand_alternations("a{b"), vec![String::from("a{b")]);
        assert!(wildcard_match("a{b", "a{b"));
    }
}
