//! # chat-markdown-engine
//!
//! Converts chat-flavoured markdown (emphasis, links, lists, quotes and code
//! plus user/role/channel mentions, custom emoji and `||spoilers||`) into
//! sanitized HTML.
//!
//! ```
//! use chat_markdown_engine::{Options, to_html};
//!
//! let html = to_html("**hi** <@1> ||secret||", &Options::default());
//! assert_eq!(
//!     html,
//!     r#"<strong>hi</strong> @1 <span data-mx-spoiler="">secret</span>"#
//! );
//! ```
//!
//! ## Architecture
//!
//! - **`rules`**: the grammar, an ordered [`RuleSet`] of match/parse/render triples
//! - **`parser`**: first-match recursive descent over a rule set
//! - **`ast`**: the [`Node`] tree the parser produces
//! - **`render`**: per-kind dispatch from nodes to HTML
//! - **`sanitize`**: text and attribute escaping, URL vetting
//! - **`context`**: caller [`Options`] and the per-level [`Context`]
//!
//! There is no global engine. [`to_html`] builds one from the options on each
//! call; callers that render a lot can keep an [`Engine`] around instead.

pub mod ast;
pub mod context;
pub mod error;
pub mod parser;
pub mod render;
pub mod rules;
pub mod sanitize;

#[cfg(test)]
pub mod tests;

pub use ast::{Node, NodeKind};
pub use context::{Context, EntityKind, EntityResolvers, Options};
pub use error::Error;
pub use parser::Parser;
pub use render::Renderer;
pub use rules::{Rule, RuleSet, Scope};

/// A parser and renderer built from the same rule set.
#[derive(Debug, Clone)]
pub struct Engine {
    parser: Parser,
    renderer: Renderer,
}

impl Engine {
    pub fn new(rules: RuleSet) -> Self {
        log::debug!("building engine from rules {:?}", rules.names());
        let renderer = Renderer::new(&rules);
        Self {
            parser: Parser::new(rules),
            renderer,
        }
    }

    pub fn full() -> Self {
        Self::new(RuleSet::full())
    }

    pub fn entities_only() -> Self {
        Self::new(RuleSet::entities_only())
    }

    /// Pairs a parser and renderer that were built separately.
    pub fn from_parts(parser: Parser, renderer: Renderer) -> Self {
        Self { parser, renderer }
    }

    pub fn parser(&self) -> &Parser {
        &self.parser
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn parse(&self, source: &str, ctx: &Context) -> Vec<Node> {
        self.parser.parse(source, ctx)
    }

    pub fn render(&self, nodes: &[Node], ctx: &Context) -> String {
        self.renderer.render(nodes, ctx)
    }

    /// Parses and renders `source` in inline mode.
    pub fn to_html(&self, source: &str, options: &Options) -> String {
        render_with(&self.parser, &self.renderer, source, options)
    }
}

/// Renders `source` with the full grammar, or the entities-only grammar when
/// [`Options::entities_only`] is set.
pub fn to_html(source: &str, options: &Options) -> String {
    Engine::new(RuleSet::for_options(options)).to_html(source, options)
}

/// Like [`to_html`], but with a caller-supplied parser and renderer.
///
/// Both or neither must be given. Supplying only one is a usage error.
pub fn to_html_with(
    source: &str,
    options: &Options,
    parser: Option<&Parser>,
    renderer: Option<&Renderer>,
) -> Result<String, Error> {
    match (parser, renderer) {
        (Some(parser), Some(renderer)) => Ok(render_with(parser, renderer, source, options)),
        (None, None) => Ok(to_html(source, options)),
        (Some(_), None) => Err(Error::IncompleteEngine {
            missing: "renderer",
            given: "parser",
        }),
        (None, Some(_)) => Err(Error::IncompleteEngine {
            missing: "parser",
            given: "renderer",
        }),
    }
}

/// Parses `source` with the full grammar, in inline mode and with default options.
pub fn parse(source: &str) -> Vec<Node> {
    Parser::new(RuleSet::full()).parse(source, &Context::default())
}

fn render_with(parser: &Parser, renderer: &Renderer, source: &str, options: &Options) -> String {
    let ctx = Context::new(options.clone());
    let nodes = parser.parse(source, &ctx);
    renderer.render(&nodes, &ctx)
}
