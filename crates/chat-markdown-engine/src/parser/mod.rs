//! # Parsing
//!
//! A first-match recursive-descent driver over an ordered [`RuleSet`].
//!
//! ## Loop
//!
//! At each position the rules are tried in priority order. The first rule whose
//! matcher returns a [`Capture`] wins: its parse step turns the capture into
//! nodes, the captured prefix is consumed, and the loop continues on the
//! remainder. There is no longest-match or quality scoring.
//!
//! Matchers see the previously consumed capture (`prev`) so that line-start
//! constructs such as headings, block quotes and lists can check what precedes
//! them. Nested parses start from the parent's `prev`.
//!
//! ## Guarantees
//!
//! - Every step consumes at least one char, so the loop always terminates.
//! - Adjacent text nodes are merged.
//! - Nesting is bounded by [`Options::max_depth`](crate::Options::max_depth);
//!   past the bound the remaining substring is kept as literal text.

mod capture;
mod cursor;

pub use capture::Capture;
pub use cursor::Cursor;

use std::borrow::Cow;

use crate::{
    ast::{Node, push_merged},
    context::Context,
    rules::RuleSet,
};

/// The output of a rule's parse step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Parsed {
    One(Node),
    /// Spliced into the parent in place of a wrapper node.
    Many(Vec<Node>),
}

impl From<Node> for Parsed {
    fn from(node: Node) -> Self {
        Parsed::One(node)
    }
}

/// Handle given to parse steps for parsing a captured substring.
pub struct Recurse<'a> {
    parser: &'a Parser,
    prev: Option<&'a str>,
}

impl Recurse<'_> {
    /// Parses `source` one level deeper under `ctx`.
    pub fn parse(&self, source: &str, ctx: &Context) -> Vec<Node> {
        self.parser.parse_nested(source, ctx, self.prev)
    }
}

#[derive(Debug, Clone)]
pub struct Parser {
    rules: RuleSet,
}

impl Parser {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Parses a whole input.
    ///
    /// Line endings are normalised first. In block mode two newlines are
    /// appended so that trailing block constructs close.
    pub fn parse(&self, source: &str, ctx: &Context) -> Vec<Node> {
        let mut source = preprocess(source);
        if !ctx.inline {
            source.to_mut().push_str("\n\n");
        }
        self.run(&source, ctx, None)
    }

    fn parse_nested(&self, source: &str, ctx: &Context, prev: Option<&str>) -> Vec<Node> {
        let max_depth = ctx.options().max_depth;
        if ctx.depth >= max_depth {
            log::warn!(
                "nesting limit of {max_depth} reached, keeping {} bytes as text",
                source.len()
            );
            if source.is_empty() {
                return vec![];
            }
            return vec![Node::text(source)];
        }
        let child = Context {
            depth: ctx.depth + 1,
            ..ctx.clone()
        };
        self.run(source, &child, prev)
    }

    fn run(&self, source: &str, ctx: &Context, prev: Option<&str>) -> Vec<Node> {
        let mut out = Vec::new();
        let mut rest = source;
        let mut prev: Option<Cow<'_, str>> = prev.map(Cow::Borrowed);
        let mut stalled = false;

        while !rest.is_empty() {
            let found = self.rules.iter().find_map(|rule| {
                let capture = rule.try_match(rest, ctx, prev.as_deref())?;
                // a second empty capture in a row would never advance
                if capture.is_empty() && stalled {
                    return None;
                }
                Some((rule, capture))
            });

            let Some((rule, capture)) = found else {
                let Some(c) = rest.chars().next() else { break };
                log::warn!("no rule matched {c:?}, emitting it as text");
                push_merged(&mut out, Node::text(c));
                rest = &rest[c.len_utf8()..];
                prev = Some(Cow::Owned(c.to_string()));
                stalled = false;
                continue;
            };

            log::trace!("rule {} consumed {} bytes", rule.name, capture.len());
            let parsed = {
                let recurse = Recurse {
                    parser: self,
                    prev: prev.as_deref(),
                };
                (rule.parse)(&capture, &recurse, ctx)
            };
            match parsed {
                Parsed::One(node) => push_merged(&mut out, node),
                Parsed::Many(nodes) => {
                    for node in nodes {
                        push_merged(&mut out, node);
                    }
                }
            }

            stalled = capture.is_empty();
            rest = &rest[capture.len()..];
            prev = Some(Cow::Owned(capture.into_full()));
        }
        out
    }
}

/// Normalises line endings, drops form feeds and expands tabs to four spaces.
pub fn preprocess(source: &str) -> Cow<'_, str> {
    if !source.contains(['\r', '\u{c}', '\t']) {
        return Cow::Borrowed(source);
    }
    Cow::Owned(
        source
            .replace("\r\n", "\n")
            .replace('\r', "\n")
            .replace('\u{c}', "")
            .replace('\t', "    "),
    )
}
