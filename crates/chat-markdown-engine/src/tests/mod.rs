//! End-to-end tests: markdown in, HTML out.
//!
//! Per-rule parse tests live next to each rule; these cover whole renders,
//! option handling and the escaping guarantees.


use std::time::{Duration, Instant};

use insta::assert_snapshot;
use pretty_assertions::assert_eq;
use rstest::rstest;

use crate::{
    Context, Engine, Error, Node, NodeKind, Options, Parser, Renderer, RuleSet, parse,
    render::Children, rules::inline, to_html, to_html_with,
};

pub(crate) fn html(source: &str) -> String {
    to_html(source, &Options::default())
}

#[rstest]
#[case("**bold**", "<strong>bold</strong>")]
#[case("> quote", "<blockquote>quote</blockquote>")]
#[case("`<b>`", "<code>&lt;b&gt;</code>")]
#[case("\n\n", "<br><br>")]
#[case("1. a\n2. b", r#"<ol start="1"><li>a</li><li>b</li></ol>"#)]
fn core_scenarios(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(html(source), expected);
}

#[test]
fn triple_quote_runs_to_end_of_input() {
    assert_snapshot!(html(">>> x\n\ny"), @"<blockquote>x<br><br>y</blockquote>");
}

#[test]
fn quote_spans_consecutive_lines() {
    assert_snapshot!(html("> a\n> b"), @"<blockquote>a<br>b</blockquote>");
}

#[test]
fn quote_needs_space_after_marker() {
    assert_eq!(html(">text"), "&gt;text");
}

#[test]
fn nested_emphasis_collapses() {
    assert_snapshot!(html("_a *b* c_"), @"<em>a b c</em>");
}

#[rstest]
#[case("||a||b||", r#"<span data-mx-spoiler="">a</span>b||"#)]
#[case("||a||||", r#"<span data-mx-spoiler="">a</span>||"#)]
fn spoiler_takes_shortest_match(#[case] source: &str, #[case] expected: &str) {
    assert_eq!(html(source), expected);
}

#[test]
fn empty_input_renders_nothing() {
    assert_eq!(html(""), "");
}

#[test]
fn parse_returns_tree() {
    assert_eq!(
        parse("**a** b"),
        vec![
            Node::Strong {
                content: vec![Node::text("a")]
            },
            Node::text(" b")
        ]
    );
}

#[test]
fn nodes_are_serializable() {
    fn assert_serialize<T: serde::Serialize>(_: &T) {}
    assert_serialize(&parse("**a** <@1>"));
}

#[test]
fn custom_pair_is_used() {
    let rules = RuleSet::full().without("strong");
    let parser = Parser::new(rules.clone());
    let renderer = Renderer::new(&rules);
    let out = to_html_with("**a**", &Options::default(), Some(&parser), Some(&renderer));
    assert_eq!(out, Ok("**a**".to_string()));
}

#[test]
fn no_custom_pair_uses_defaults() {
    let out = to_html_with("**a**", &Options::default(), None, None);
    assert_eq!(out, Ok("<strong>a</strong>".to_string()));
}

#[test]
fn parser_without_renderer_is_rejected() {
    let parser = Parser::new(RuleSet::full());
    let err = to_html_with("a", &Options::default(), Some(&parser), None).unwrap_err();
    assert_eq!(
        err,
        Error::IncompleteEngine {
            missing: "renderer",
            given: "parser"
        }
    );
    assert_eq!(
        err.to_string(),
        "a custom renderer is required when a custom parser is supplied"
    );
}

#[test]
fn renderer_without_parser_is_rejected() {
    let renderer = Renderer::new(&RuleSet::full());
    let err = to_html_with("a", &Options::default(), None, Some(&renderer)).unwrap_err();
    assert!(matches!(
        err,
        Error::IncompleteEngine {
            missing: "parser",
            ..
        }
    ));
}

#[test]
fn engine_can_be_reused() {
    let engine = Engine::full();
    let options = Options::default();
    assert_eq!(engine.to_html("*a*", &options), "<em>a</em>");
    assert_eq!(engine.to_html("~~b~~", &options), "<del>b</del>");
}

#[test]
fn engine_parse_then_render() {
    let engine = Engine::entities_only();
    let ctx = Context::default();
    let nodes = engine.parse("*a* <@1>", &ctx);
    assert_eq!(engine.render(&nodes, &ctx), "*a* @1");
}

#[test]
fn depth_limit_fails_closed() {
    let options = Options {
        max_depth: 0,
        ..Options::default()
    };
    assert_eq!(to_html("**__a__**", &options), "<strong>__a__</strong>");
}

#[test]
fn deeply_nested_lists_terminate() {
    let source: String = (0..300).map(|i| format!("{}* a\n", " ".repeat(i))).collect();
    let out = html(&source);
    assert!(out.starts_with("<ul><li>a"));
}

#[test]
fn engines_are_shareable_across_threads() {
    let engine = std::sync::Arc::new(Engine::full());
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = engine.clone();
            std::thread::spawn(move || engine.to_html(&format!("**{i}**"), &Options::default()))
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), format!("<strong>{i}</strong>"));
    }
}

fn shout(node: &Node, _children: &Children<'_>, _ctx: &Context) -> String {
    match node {
        Node::Text { content } => content.to_uppercase(),
        _ => String::new(),
    }
}

fn plain_link(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    match node {
        Node::Link {
            target, content, ..
        } => format!("{} ({target})", children.render(content, ctx)),
        _ => String::new(),
    }
}

#[test]
fn overridden_renderers_apply_to_full_grammar() {
    let rules = RuleSet::full()
        .with_rule(inline::text().rendering(NodeKind::Text, shout))
        .with_rule(inline::link().rendering(NodeKind::Link, plain_link));
    let engine = Engine::new(rules);
    let options = Options::default();
    assert_eq!(engine.to_html("hello", &options), "HELLO");
    assert_eq!(
        engine.to_html("[label](http://x.y)", &options),
        "LABEL (http://x.y)"
    );
    // escaped chars and bare URLs go through the same renderers
    assert_eq!(
        engine.to_html(r"see https://x.y \*", &options),
        "SEE HTTPS://X.Y (https://x.y) *"
    );
}

#[rstest]
#[case("*a ")]
#[case("_a ")]
#[case("**a ")]
#[case("[a ")]
#[case("~~a ")]
fn repeated_openers_render_quickly(#[case] unit: &str) {
    let source = unit.repeat(2000);
    let started = Instant::now();
    let out = html(&source);
    let elapsed = started.elapsed();
    assert!(!out.is_empty());
    assert!(
        elapsed < Duration::from_secs(5),
        "{unit:?} x 2000 took {elapsed:?}"
    );
}
