//! Line-start constructs: headings, code fences, block quotes, lists and
//! block-mode newlines.
//!
//! Headings, quotes and lists only open at the start of a line. They check the
//! previously consumed capture for that, since the remaining input alone does
//! not say what came before.

use std::sync::OnceLock;

use fancy_regex::Regex as FancyRegex;
use regex::Regex;

use super::{Rule, Scope};
use crate::{
    ast::{Node, NodeKind},
    context::Context,
    parser::{Capture, Parsed, Recurse},
    render::{Children, html_tag},
    sanitize::escape_text,
};

/// Bullet or ordered-list marker, as accepted when splitting items.
const ITEM_BULLET: &str = r"(?:[*+-]|[0-9]+\.)";

fn heading_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(#{1,3}) +([^#\n].*?)#* *(?:\n *)*(?:\n|$)").expect("Invalid heading regex")
    })
}

fn code_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^```(([a-z0-9-]+?)\n+)?\n*((?s:.+?))\n*```")
            .expect("Invalid code block regex")
    })
}

fn block_quote_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^( *>>> ((?s:.*)))|^( *> [^\n]*(\n *> [^\n]*)*\n?)")
            .expect("Invalid block quote regex")
    })
}

fn quote_block_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^ *>>> ?").expect("Invalid quote marker regex"))
}

fn quote_line_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^ *> ?").expect("Invalid quote marker regex"))
}

fn line_start_indent_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:^|\n)( *)$").expect("Invalid indent regex"))
}

fn list_re() -> &'static FancyRegex {
    static RE: OnceLock<FancyRegex> = OnceLock::new();
    RE.get_or_init(|| {
        FancyRegex::new(
            r"^( *)((?:[*-]|[0-9]+\.)) [\s\S]+?(?:\n{1,}(?! )(?!\1(?:[*-]|[0-9]+\.) )\n*|\s*\n*$)",
        )
        .expect("Invalid list regex")
    })
}

/// Bullet plus one char: every such input is accepted by `list_re`.
fn list_start_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^ *(?:[*-]|[0-9]+\.) [\s\S]").expect("Invalid list start regex")
    })
}

fn list_item_re() -> &'static FancyRegex {
    static RE: OnceLock<FancyRegex> = OnceLock::new();
    RE.get_or_init(|| {
        FancyRegex::new(&format!(
            r"(?m)( *)({ITEM_BULLET}) +[^\n]*(?:\n(?!\1{ITEM_BULLET} )[^\n]*)*(\n|$)"
        ))
        .expect("Invalid list item regex")
    })
}

fn list_item_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(&format!(r"^( *)({ITEM_BULLET}) +")).expect("Invalid list prefix regex")
    })
}

fn list_block_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\n{2,}$").expect("Invalid list end regex"))
}

fn list_item_end_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r" *\n+$").expect("Invalid list item end regex"))
}

fn newline_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(?:\n *)*\n").expect("Invalid newline regex"))
}

// --- heading ---

pub fn heading() -> Rule {
    Rule::new("heading", 0, Scope::Any, match_heading, parse_heading)
        .rendering(NodeKind::Heading, render_heading)
}

fn match_heading(src: &str, _ctx: &Context, prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('#') || !prev.is_none_or(|p| p.is_empty() || p.ends_with('\n')) {
        return None;
    }
    Capture::regex(heading_re(), src)
}

fn parse_heading(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    let level = cap.group_or_empty(1).len() as u8;
    let text = cap.group_or_empty(2).trim();
    Node::Heading {
        level,
        content: recurse.parse(text, &ctx.with_inline(true)),
    }
    .into()
}

fn render_heading(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    let Node::Heading { level, content } = node else {
        return String::new();
    };
    html_tag(&format!("h{level}"), &children.render(content, ctx), &[])
}

// --- code block ---

pub fn code_block() -> Rule {
    Rule::new("code_block", 10, Scope::Inline, match_code_block, parse_code_block)
        .rendering(NodeKind::CodeBlock, render_code_block)
}

fn match_code_block(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("```") {
        return None;
    }
    Capture::regex(code_block_re(), src)
}

fn parse_code_block(cap: &Capture, _recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    Node::CodeBlock {
        lang: cap.group_or_empty(2).trim().to_string(),
        content: cap.group_or_empty(3).to_string(),
        in_quote: ctx.in_quote,
    }
    .into()
}

fn render_code_block(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::CodeBlock { lang, content, .. } = node else {
        return String::new();
    };
    let class = ctx
        .options()
        .code_class
        .as_ref()
        .and_then(|hook| hook(lang.as_str(), ctx));
    let code = html_tag("code", &escape_text(content), &[("class", class.as_deref())]);
    html_tag("pre", &code, &[])
}

// --- block quote ---

pub fn block_quote() -> Rule {
    Rule::new("block_quote", 20, Scope::Any, match_block_quote, parse_block_quote)
        .rendering(NodeKind::BlockQuote, render_block_quote)
}

fn match_block_quote(src: &str, ctx: &Context, prev: Option<&str>) -> Option<Capture> {
    if ctx.in_quote || !src.trim_start_matches(' ').starts_with('>') {
        return None;
    }
    let prev = prev.unwrap_or_default();
    if !prev.is_empty() && !prev.trim_end_matches(' ').ends_with('\n') {
        return None;
    }
    Capture::regex(block_quote_re(), src)
}

fn parse_block_quote(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    let all = cap.full();
    let content = if quote_block_marker_re().is_match(all) {
        quote_block_marker_re().replace(all, "")
    } else {
        quote_line_marker_re().replace_all(all, "")
    };
    Node::BlockQuote {
        content: recurse.parse(&content, &ctx.with_quote()),
    }
    .into()
}

fn render_block_quote(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    html_tag("blockquote", &children.render(node.children(), ctx), &[])
}

// --- list ---

pub fn list() -> Rule {
    Rule::new("list", 30, Scope::Any, match_list, parse_list)
        .rendering(NodeKind::List, render_list)
}

/// Matches a list at a line start, re-attaching the indentation that the
/// previous capture left at the end of its line.
///
/// Group 1 holds the matched block including that indentation, group 2 the
/// first bullet. The consumed length excludes the indentation.
fn match_list(src: &str, _ctx: &Context, prev: Option<&str>) -> Option<Capture> {
    let first = src.trim_start_matches(' ').chars().next();
    if !first.is_some_and(|c| c == '*' || c == '-' || c.is_ascii_digit()) {
        return None;
    }
    let indent_caps = line_start_indent_re().captures(prev.unwrap_or_default())?;
    let indent = indent_caps.get(1).map_or("", |m| m.as_str());
    let joined = format!("{indent}{src}");
    let cap = Capture::fancy_checked(list_start_re(), list_re(), &joined)?;
    let consumed = src.get(..cap.len().checked_sub(indent.len())?)?;
    Some(Capture::new(consumed, [Some(cap.full()), cap.group(2)]))
}

fn parse_list(cap: &Capture, recurse: &Recurse<'_>, ctx: &Context) -> Parsed {
    let bullet = cap.group_or_empty(2);
    let ordered = bullet.len() > 1;
    let start = if ordered {
        bullet.trim_end_matches('.').parse().ok()
    } else {
        None
    };

    let block = list_block_end_re().replace(cap.group_or_empty(1), "\n");
    let items = split_items(&block);
    let mut last_was_paragraph = false;
    let items = items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let content = strip_item_prefix(item);
            let is_last = i + 1 == items.len();
            let is_paragraph = content.contains("\n\n") || (is_last && last_was_paragraph);
            last_was_paragraph = is_paragraph;
            if is_paragraph {
                let adjusted = list_item_end_re().replace(&content, "\n\n");
                recurse.parse(&adjusted, &ctx.with_inline(false))
            } else {
                let adjusted = list_item_end_re().replace(&content, "");
                recurse.parse(&adjusted, &ctx.with_inline(true))
            }
        })
        .collect();

    Node::List {
        ordered,
        start,
        items,
    }
    .into()
}

fn split_items(block: &str) -> Vec<&str> {
    list_item_re()
        .find_iter(block)
        .filter_map(|found| match found {
            Ok(m) => Some(m.as_str()),
            Err(err) => {
                log::warn!("list item split failed: {err}");
                None
            }
        })
        .collect()
}

/// Removes up to the bullet prefix's width of indentation from every line,
/// then the bullet prefix itself.
fn strip_item_prefix(item: &str) -> String {
    let width = list_item_prefix_re()
        .find(item)
        .map_or(0, |m| m.as_str().len());
    let dedented: String = item
        .split_inclusive('\n')
        .map(|line| {
            let spaces = line.len() - line.trim_start_matches(' ').len();
            &line[spaces.min(width)..]
        })
        .collect();
    list_item_prefix_re().replace(&dedented, "").into_owned()
}

fn render_list(node: &Node, children: &Children<'_>, ctx: &Context) -> String {
    let Node::List {
        ordered,
        start,
        items,
    } = node
    else {
        return String::new();
    };
    let items: String = items
        .iter()
        .map(|item| html_tag("li", &children.render(item, ctx), &[]))
        .collect();
    if *ordered {
        let start = start.filter(|n| *n != 0).map(|n| n.to_string());
        html_tag("ol", &items, &[("start", start.as_deref())])
    } else {
        html_tag("ul", &items, &[])
    }
}

// --- newline ---

pub fn newline() -> Rule {
    Rule::new("newline", 40, Scope::Block, match_newline, parse_newline)
        .rendering(NodeKind::Newline, render_newline)
}

fn match_newline(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    Capture::regex(newline_re(), src)
}

fn parse_newline(_cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Newline.into()
}

fn render_newline(_node: &Node, _children: &Children<'_>, _ctx: &Context) -> String {
    "\n".to_string()
}
