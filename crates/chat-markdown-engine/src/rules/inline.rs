//! Inline rules: spoilers, escapes, links, the emphasis family, code spans,
//! line breaks and the catch-all text rule.

use std::sync::OnceLock;

use fancy_regex::Regex as FancyRegex;
use regex::Regex;

use super::{Rule, Scope};
use crate::{
    ast::{Node, NodeKind},
    context::Context,
    parser::{Capture, Cursor, Parsed, Recurse},
    render::{Children, html_tag, void_tag},
    sanitize::{escape_text, is_escapable, sanitize_url, unescape_url},
};

/// Recognised whole so its backslash and underscores stay literal.
pub const SHRUG: &str = r"¯\_(ツ)_/¯";

fn spoiler_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)^\|\|(.+?)\|\|").expect("Invalid spoiler regex"))
}

fn autolink_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<([^: >]+:/[^ >]+)>").expect("Invalid autolink regex"))
}

fn url_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"^(https?://[^\s<]+[^<.,:;"')\]\s])"#).expect("Invalid URL regex")
    })
}

fn link_re() -> &'static FancyRegex {
    static RE: OnceLock<FancyRegex> = OnceLock::new();
    RE.get_or_init(|| {
        FancyRegex::new(concat!(
            r"^\[((?:\[[^\]]*\]|[^\[\]]|\](?=[^\[]*\]))*)\]",
            r#"\(\s*<?((?:\([^)]*\)|[^\s\\]|\\.)*?)>?(?:\s+['"]([\s\S]*?)['"])?\s*\)"#,
        ))
        .expect("Invalid link regex")
    })
}

/// `link_re` up to the opening paren, without the lookahead.
fn link_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[(?:\[[^\]]*\]|[^\[\]]|\])*\]\(").expect("Invalid link start regex")
    })
}

// The closing delimiter of each emphasis pattern is followed by one char of
// lookahead, consumed here and given back by `capture_closed`.

fn em_underscore_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^_((?:__|\\[\s\S]|[^\\_])+?)_(?:[^0-9A-Za-z_]|$)")
            .expect("Invalid emphasis regex")
    })
}

fn em_star_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\*((?:\*\*|\\[\s\S]|\s+(?:\\[\s\S]|[^\s\*\\]|\*\*)|[^\s\*\\])+?)\*(?:[^\*]|$)",
        )
        .expect("Invalid emphasis regex")
    })
}

fn strong_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\*\*([\s\S]+?)\*\*(?:[^\*]|$)").expect("Invalid strong regex"))
}

fn underline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^__([\s\S]+?)__(?:[^_]|$)").expect("Invalid underline regex"))
}

fn strike_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^~~([\s\S]+?)~~(?:[^_]|$)").expect("Invalid strike regex"))
}

fn inline_code_re() -> &'static FancyRegex {
    static RE: OnceLock<FancyRegex> = OnceLock::new();
    RE.get_or_init(|| {
        FancyRegex::new(r"^(`+)([\s\S]*?[^`])\1(?!`)").expect("Invalid inline code regex")
    })
}

/// `inline_code_re` with any closing run accepted.
fn inline_code_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^`+[\s\S]*?[^`]`+").expect("Invalid inline code start regex")
    })
}

/// Runs a delimited-span pattern: group 1 is the content, followed by a
/// closing delimiter `close` bytes long and one char of lookahead.
fn capture_closed(re: &Regex, src: &str, close: usize) -> Option<Capture> {
    let caps = re.captures(src)?;
    let content = caps.get(1)?;
    let end = content.end() + close;
    Some(Capture::new(&src[..end], [Some(content.as_str())]))
}

// --- spoiler ---

pub fn spoiler() -> Rule {
    Rule::new("spoiler", 1, Scope::Any, match_spoiler, parse_spoiler)
        .rendering(NodeKind::Spoiler, render_spoiler)
}

fn match_spoiler(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("||") {
        return None;
    }
    Capture::regex(spoiler_re(), src)
}

fn parse_spoiler(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::Spoiler {
        content: recurse.parse(cap.group_or_empty(1), ctx),
    }
    .into()
}

fn render_spoiler(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    let inner = children.render(node.children(), &ctx.with_spoiler());
    html_tag("span", &inner, &[("data-mx-spoiler", Some(""))])
}

// --- escape ---

pub fn escape() -> Rule {
    Rule::new("escape", 50, Scope::Inline, match_escape, parse_as_text)
}

fn match_escape(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    let rest = src.strip_prefix('\\')?;
    let escaped = rest.chars().next().filter(|c| is_escapable(*c))?;
    let width = escaped.len_utf8();
    Some(Capture::new(&src[..1 + width], [Some(&rest[..width])]))
}

/// Group 1 as a literal text node.
fn parse_as_text(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::text(cap.group_or_empty(1)).into()
}

// --- links ---

pub fn autolink() -> Rule {
    Rule::new("autolink", 60, Scope::Inline, match_autolink, parse_bare_link)
}

fn match_autolink(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('<') {
        return None;
    }
    Capture::regex(autolink_re(), src)
}

pub fn url() -> Rule {
    Rule::new("url", 70, Scope::Inline, match_url, parse_bare_link)
}

fn match_url(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("http") {
        return None;
    }
    Capture::regex(url_re(), src)
}

/// A link whose label is its own target.
fn parse_bare_link(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    let target = cap.group_or_empty(1);
    Node::Link {
        target: target.to_string(),
        title: None,
        content: vec![Node::text(target)],
    }
    .into()
}

pub fn link() -> Rule {
    Rule::new("link", 80, Scope::Inline, match_link, parse_link)
        .rendering(NodeKind::Link, render_link)
}

fn match_link(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('[') || !src.contains("](") {
        return None;
    }
    Capture::fancy_checked(link_start_re(), link_re(), src)
}

fn parse_link(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::Link {
        target: unescape_url(cap.group_or_empty(2)),
        title: cap.group(3).map(str::to_string),
        content: recurse.parse(cap.group_or_empty(1), ctx),
    }
    .into()
}

fn render_link(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    let Node::Link {
        target,
        title,
        content,
    } = node
    else {
        return String::new();
    };
    html_tag(
        "a",
        &children.render(content, ctx),
        &[
            ("href", sanitize_url(target).filter(|url| !url.is_empty())),
            ("title", title.as_deref().filter(|title| !title.is_empty())),
        ],
    )
}

// --- emphasis family ---

pub fn em() -> Rule {
    Rule::new("em", 90, Scope::Inline, match_em, parse_em).rendering(NodeKind::Em, render_em)
}

/// `_a_` needs a non-word ASCII char or the end after the closing `_`;
/// `*a*` needs a non-space right after the opening `*`.
fn match_em(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    let re = match src.chars().next()? {
        '_' => em_underscore_re(),
        '*' if !src[1..].starts_with(char::is_whitespace) => em_star_re(),
        _ => return None,
    };
    capture_closed(re, src, 1)
}

/// Nested emphasis collapses: inside an emphasis only the children are kept.
fn parse_em(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    let content = recurse.parse(cap.group_or_empty(1), &ctx.with_emphasis());
    if ctx.in_emphasis {
        Parsed::Many(content)
    } else {
        Node::Em { content }.into()
    }
}

fn render_em(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    html_tag("em", &children.render(node.children(), ctx), &[])
}

pub fn strong() -> Rule {
    Rule::new("strong", 91, Scope::Inline, match_strong, parse_strong)
        .rendering(NodeKind::Strong, render_strong)
}

fn match_strong(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("**") {
        return None;
    }
    capture_closed(strong_re(), src, 2)
}

fn parse_strong(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::Strong {
        content: recurse.parse(cap.group_or_empty(1), ctx),
    }
    .into()
}

fn render_strong(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    html_tag("strong", &children.render(node.children(), ctx), &[])
}

pub fn underline() -> Rule {
    Rule::new("underline", 92, Scope::Inline, match_underline, parse_underline)
        .rendering(NodeKind::Underline, render_underline)
}

fn match_underline(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("__") {
        return None;
    }
    capture_closed(underline_re(), src, 2)
}

fn parse_underline(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::Underline {
        content: recurse.parse(cap.group_or_empty(1), ctx),
    }
    .into()
}

fn render_underline(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    html_tag("u", &children.render(node.children(), ctx), &[])
}

pub fn strike() -> Rule {
    Rule::new("strike", 110, Scope::Inline, match_strike, parse_strike)
        .rendering(NodeKind::Strike, render_strike)
}

fn match_strike(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("~~") {
        return None;
    }
    capture_closed(strike_re(), src, 2)
}

fn parse_strike(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::Strike {
        content: recurse.parse(cap.group_or_empty(1), ctx),
    }
    .into()
}

fn render_strike(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    html_tag("del", &children.render(node.children(), ctx), &[])
}

// --- inline code ---

pub fn inline_code() -> Rule {
    Rule::new("inline_code", 120, Scope::Any, match_inline_code, parse_inline_code)
        .rendering(NodeKind::InlineCode, render_inline_code)
}

fn match_inline_code(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('`') {
        return None;
    }
    Capture::fancy_checked(inline_code_start_re(), inline_code_re(), src)
}

fn parse_inline_code(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::InlineCode {
        content: strip_code_padding(cap.group_or_empty(2)).to_string(),
    }
    .into()
}

/// Drops the single space that pads a backtick at either edge, as in `` `` ` `` ``.
fn strip_code_padding(code: &str) -> &str {
    let mut code = code;
    if let Some(rest) = code.strip_prefix(' ')
        && rest.trim_start_matches(' ').starts_with('`')
    {
        code = rest;
    }
    if let Some(rest) = code.strip_suffix(' ')
        && rest.trim_end_matches(' ').ends_with('`')
    {
        code = rest;
    }
    code
}

fn render_inline_code(node: &Node, _children: &Children<'_>, _ctx: &Context) -> String {
    let Node::InlineCode { content } = node else {
        return String::new();
    };
    html_tag("code", &escape_text(content.trim()), &[])
}

// --- br, shrug, text ---

pub fn br() -> Rule {
    Rule::new("br", 130, Scope::Any, match_br, parse_br).rendering(NodeKind::Br, render_br)
}

fn match_br(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    src.starts_with('\n').then(|| Capture::new("\n", []))
}

fn parse_br(_cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Br.into()
}

fn render_br(_node: &Node, _children: &Children<'_>, _ctx: &Context) -> String {
    void_tag("br", &[])
}

pub fn shrug() -> Rule {
    Rule::new("shrug", 140, Scope::Any, match_shrug, parse_full_as_text)
}

fn match_shrug(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    src.starts_with(SHRUG).then(|| Capture::new(SHRUG, []))
}

pub fn text() -> Rule {
    Rule::new("text", 150, Scope::Any, match_text, parse_full_as_text)
        .rendering(NodeKind::Text, render_text)
}

/// Takes at least one char, then runs until a special char, a newline, or the
/// start of something shaped like `scheme:rest`.
fn match_text(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    let mut cur = Cursor::new(src);
    cur.bump()?;
    while let Some(c) = cur.peek() {
        if c == '\n' || is_special(c) {
            break;
        }
        if c.is_ascii_alphanumeric() {
            // every position in an alphanumeric run shares the same word end
            let rest = cur.rest();
            let word = rest
                .bytes()
                .take_while(|b| b.is_ascii_alphanumeric() || *b == b'_')
                .count();
            if opens_scheme(&rest[word..]) {
                break;
            }
            cur.bump_while(|c| c.is_ascii_alphanumeric());
            continue;
        }
        cur.bump();
    }
    Some(Capture::new(cur.consumed(), []))
}

/// Punctuation and symbols below U+00C0 end a text run.
fn is_special(c: char) -> bool {
    (c as u32) < 0xC0 && !c.is_ascii_alphanumeric() && !c.is_whitespace() && c != '-'
}

fn opens_scheme(after_word: &str) -> bool {
    after_word
        .strip_prefix(':')
        .and_then(|rest| rest.chars().next())
        .is_some_and(|c| !c.is_whitespace())
}

fn parse_full_as_text(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::text(cap.full()).into()
}

fn render_text(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::Text { content } = node else {
        return String::new();
    };
    if ctx.escape_html() {
        escape_text(content).into_owned()
    } else {
        content.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{parser::Parser, rules::RuleSet};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn parse(src: &str) -> Vec<Node> {
        Parser::new(RuleSet::full()).parse(src, &Context::default())
    }

    fn text_len(src: &str) -> usize {
        match_text(src, &Context::default(), None).map_or(0, |c| c.len())
    }

    #[rstest]
    #[case("hello world", 11)]
    #[case("hello*world", 5)]
    #[case("a\nb", 1)]
    #[case("*", 1)]
    #[case("see http://x", 4)]
    #[case("abc:d", 1)]
    #[case("abc: d", 3)]
    #[case("naïve café", "naïve café".len())]
    #[case("well-known", 10)]
    fn text_run_length(#[case] src: &str, #[case] len: usize) {
        assert_eq!(text_len(src), len);
    }

    #[test]
    fn spoiler_takes_first_closing_pair() {
        assert_eq!(
            parse("||a||b||"),
            vec![
                Node::Spoiler {
                    content: vec![Node::text("a")]
                },
                Node::text("b||")
            ]
        );
        assert_eq!(
            parse("||a||||"),
            vec![
                Node::Spoiler {
                    content: vec![Node::text("a")]
                },
                Node::text("||")
            ]
        );
    }

    #[test]
    fn emphasis_collapses_when_nested() {
        assert_eq!(
            parse("_a *b* c_"),
            vec![Node::Em {
                content: vec![Node::text("a b c")]
            }]
        );
    }

    #[test]
    fn strong_closes_at_first_pair() {
        assert_eq!(
            parse("**a **b** c**"),
            vec![
                Node::Strong {
                    content: vec![Node::text("a ")]
                },
                Node::text("b"),
                Node::Strong {
                    content: vec![Node::text(" c")]
                }
            ]
        );
    }

    #[rstest]
    #[case("**a**", Node::Strong { content: vec![Node::text("a")] })]
    #[case("__a__", Node::Underline { content: vec![Node::text("a")] })]
    #[case("~~a~~", Node::Strike { content: vec![Node::text("a")] })]
    #[case("*a*", Node::Em { content: vec![Node::text("a")] })]
    #[case("_a_", Node::Em { content: vec![Node::text("a")] })]
    fn delimited_spans(#[case] src: &str, #[case] expected: Node) {
        assert_eq!(parse(src), vec![expected]);
    }

    #[test]
    fn intraword_underscore_is_not_emphasis() {
        assert_eq!(parse("snake_case_name"), vec![Node::text("snake_case_name")]);
    }

    #[test]
    fn escape_produces_literal() {
        assert_eq!(parse(r"\*a\*"), vec![Node::text("*a*")]);
    }

    #[test]
    fn backslash_before_letter_is_kept() {
        assert_eq!(parse(r"\a"), vec![Node::text(r"\a")]);
    }

    #[test]
    fn shrug_is_literal() {
        assert_eq!(parse(SHRUG), vec![Node::text(SHRUG)]);
    }

    #[rstest]
    #[case("`a`", "a")]
    #[case("`` a`b ``", "a`b")]
    #[case("`` `a` ``", "`a`")]
    #[case("`<b>`", "<b>")]
    fn inline_code_content(#[case] src: &str, #[case] content: &str) {
        let nodes = parse(src);
        let [Node::InlineCode { content: got }] = nodes.as_slice() else {
            panic!("expected one code span, got {nodes:?}");
        };
        assert_eq!(got.trim(), content);
    }

    #[test]
    fn bare_url_becomes_link() {
        assert_eq!(
            parse("see https://example.com."),
            vec![
                Node::text("see "),
                Node::Link {
                    target: "https://example.com".into(),
                    title: None,
                    content: vec![Node::text("https://example.com")]
                },
                Node::text(".")
            ]
        );
    }

    #[test]
    fn autolink() {
        assert_eq!(
            parse("<https://a.b/c>"),
            vec![Node::Link {
                target: "https://a.b/c".into(),
                title: None,
                content: vec![Node::text("https://a.b/c")]
            }]
        );
    }

    #[test]
    fn labelled_link_with_title() {
        assert_eq!(
            parse(r#"[a **b**](/x\_y "t")"#),
            vec![Node::Link {
                target: "/x_y".into(),
                title: Some("t".into()),
                content: vec![
                    Node::text("a "),
                    Node::Strong {
                        content: vec![Node::text("b")]
                    }
                ]
            }]
        );
    }

    #[test]
    fn line_break() {
        assert_eq!(parse("a\nb"), vec![Node::text("a"), Node::Br, Node::text("b")]);
    }
}
