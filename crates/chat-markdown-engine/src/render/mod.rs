//! # Rendering
//!
//! Folds a node sequence into an HTML string. Each node is dispatched to the
//! render function registered for its [`NodeKind`] in the active rule set;
//! container renderers recurse through [`Children`] before wrapping.
//!
//! Attribute values always go through
//! [`escape_attribute`](crate::sanitize::escape_attribute), whatever the
//! context's text escaping flag says. Use [`html_tag`] and [`void_tag`] rather
//! than formatting attributes by hand.

use std::{collections::HashMap, fmt};

use crate::{
    ast::{Node, NodeKind},
    context::Context,
    rules::{RenderFn, RuleSet},
    sanitize::escape_attribute,
};

#[derive(Clone)]
pub struct Renderer {
    table: HashMap<NodeKind, RenderFn>,
}

impl fmt::Debug for Renderer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.table.keys()).finish()
    }
}

impl Renderer {
    /// Takes, per node kind, the render function of the first rule in `rules`
    /// that renders it.
    pub fn new(rules: &RuleSet) -> Self {
        let mut table = HashMap::new();
        for rule in rules {
            if let Some((kind, render)) = rule.render {
                table.entry(kind).or_insert(render);
            }
        }
        Self { table }
    }

    pub fn render(&self, nodes: &[Node], ctx: &Context) -> String {
        Children { renderer: self }.render(nodes, ctx)
    }

    fn render_node(&self, node: &Node, ctx: &Context) -> String {
        let Some(render) = self.table.get(&node.kind()) else {
            log::warn!("no renderer for {:?} node, dropping it", node.kind());
            return String::new();
        };
        render(node, &Children { renderer: self }, ctx)
    }
}

/// Callback handed to render functions for rendering child sequences.
pub struct Children<'a> {
    renderer: &'a Renderer,
}

impl Children<'_> {
    pub fn render(&self, nodes: &[Node], ctx: &Context) -> String {
        nodes
            .iter()
            .map(|node| self.renderer.render_node(node, ctx))
            .collect()
    }
}

/// `<tag attrs>content</tag>`. Attributes with no value are left out.
///
/// `content` is inserted as is; it must already be rendered or escaped.
pub fn html_tag(tag: &str, content: &str, attrs: &[(&str, Option<&str>)]) -> String {
    format!("<{tag}{}>{content}</{tag}>", attributes(attrs))
}

/// `<tag attrs>` with no closing tag.
pub fn void_tag(tag: &str, attrs: &[(&str, Option<&str>)]) -> String {
    format!("<{tag}{}>", attributes(attrs))
}

fn attributes(attrs: &[(&str, Option<&str>)]) -> String {
    attrs
        .iter()
        .filter_map(|(name, value)| {
            value.map(|value| format!(" {name}=\"{}\"", escape_attribute(value)))
        })
        .collect()
}
