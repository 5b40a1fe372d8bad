//! # Rules
//!
//! The grammar as an ordered registry of plain [`Rule`] values.
//!
//! ## Structure
//!
//! A rule is a match/parse/render triple plus a name, a priority and a
//! [`Scope`]. Rules are `Copy`, so a variant is built from an existing rule
//! with struct-update syntax:
//!
//! ```
//! use chat_markdown_engine::rules::{Rule, RuleSet, inline};
//!
//! let base = inline::strong();
//! let louder = Rule { priority: 5, ..base };
//! let set = RuleSet::full().with_rule(louder);
//! assert_eq!(set.get("strong").map(|r| r.priority), Some(5));
//! ```
//!
//! ## Modules
//!
//! - **`block`**: line-start constructs (headings, code fences, quotes, lists, newlines)
//! - **`inline`**: emphasis family, links, code spans, spoilers and the catch-all text rule
//! - **`entity`**: mentions, channel and role references, broadcasts and custom emoji
//!
//! ## Ordering
//!
//! A [`RuleSet`] sorts by `(priority, name)` once, at construction. The parser
//! takes the first rule that matches; priority is the only tie-breaker.

pub mod block;
pub mod entity;
pub mod inline;

use std::fmt;

use crate::{
    ast::{Node, NodeKind},
    context::{Context, Options},
    parser::{Capture, Parsed, Recurse},
    render::Children,
};

/// Recognises a construct at the start of the remaining input.
pub type MatchFn = fn(&str, &Context, Option<&str>) -> Option<Capture>;
/// Builds nodes from a capture, recursing into sub-strings as needed.
pub type ParseFn = fn(&Capture, &Recurse<'_>, &Context) -> Parsed;
/// Renders one node to HTML.
pub type RenderFn = fn(&Node, &Children<'_>, &Context) -> String;

/// Which parsing mode a rule is active in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Inline,
    Block,
    Any,
}

impl Scope {
    pub fn admits(self, inline: bool) -> bool {
        match self {
            Scope::Inline => inline,
            Scope::Block => !inline,
            Scope::Any => true,
        }
    }
}

#[derive(Clone, Copy)]
pub struct Rule {
    pub name: &'static str,
    pub priority: u16,
    pub scope: Scope,
    pub matcher: MatchFn,
    pub parse: ParseFn,
    /// The node kind this rule renders, if any.
    pub render: Option<(NodeKind, RenderFn)>,
}

impl Rule {
    pub fn new(
        name: &'static str,
        priority: u16,
        scope: Scope,
        matcher: MatchFn,
        parse: ParseFn,
    ) -> Self {
        Self {
            name,
            priority,
            scope,
            matcher,
            parse,
            render: None,
        }
    }

    pub fn rendering(self, kind: NodeKind, render: RenderFn) -> Self {
        Self {
            render: Some((kind, render)),
            ..self
        }
    }

    /// Runs the matcher if the rule's scope admits the context's mode.
    pub fn try_match(&self, src: &str, ctx: &Context, prev: Option<&str>) -> Option<Capture> {
        if !self.scope.admits(ctx.inline) {
            return None;
        }
        (self.matcher)(src, ctx, prev)
    }
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .field("scope", &self.scope)
            .field("renders", &self.render.map(|(kind, _)| kind))
            .finish()
    }
}

/// An ordered, immutable grammar.
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl RuleSet {
    pub fn new(mut rules: Vec<Rule>) -> Self {
        rules.sort_by_key(|rule| (rule.priority, rule.name));
        Self { rules }
    }

    /// All markdown and entity rules.
    pub fn full() -> Self {
        Self::new(vec![
            block::heading(),
            inline::spoiler(),
            block::code_block(),
            block::block_quote(),
            block::list(),
            block::newline(),
            inline::escape(),
            inline::autolink(),
            inline::url(),
            inline::link(),
            inline::em(),
            inline::strong(),
            inline::underline(),
            entity::channel(),
            entity::emoji(),
            entity::everyone(),
            entity::here(),
            entity::role(),
            entity::user(),
            inline::strike(),
            inline::inline_code(),
            inline::br(),
            inline::shrug(),
            inline::text(),
        ])
    }

    /// Entity references plus line breaks and plain text.
    pub fn entities_only() -> Self {
        Self::new(vec![
            entity::channel(),
            entity::emoji(),
            entity::everyone(),
            entity::here(),
            entity::role(),
            entity::user(),
            inline::br(),
            inline::text(),
        ])
    }

    pub fn for_options(options: &Options) -> Self {
        if options.entities_only {
            Self::entities_only()
        } else {
            Self::full()
        }
    }

    /// Adds `rule`, replacing any rule with the same name.
    pub fn with_rule(self, rule: Rule) -> Self {
        let mut rules = self.without(rule.name).rules;
        rules.push(rule);
        Self::new(rules)
    }

    pub fn without(mut self, name: &str) -> Self {
        self.rules.retain(|rule| rule.name != name);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|rule| rule.name).collect()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The render function of the first rule that renders `kind`.
    pub fn renderer_for(&self, kind: NodeKind) -> Option<RenderFn> {
        self.rules.iter().find_map(|rule| match rule.render {
            Some((k, render)) if k == kind => Some(render),
            _ => None,
        })
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}
