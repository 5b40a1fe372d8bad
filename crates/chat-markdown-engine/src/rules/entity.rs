//! Chat entity references: user, role and channel mentions, `@everyone` and
//! `@here` broadcasts, and custom emoji.
//!
//! Ids and names are taken verbatim. Rendering goes to the caller's resolver
//! for the entity kind when one is set, and to a bare-text default otherwise.
//! Resolver output is inserted as is.

use std::sync::OnceLock;

use regex::Regex;

use super::{Rule, Scope};
use crate::{
    ast::{Node, NodeKind},
    context::{Context, EntityKind},
    parser::{Capture, Parsed, Recurse},
    render::{Children, void_tag},
    sanitize::escape_text,
};

fn channel_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<#?([0-9]*)>").expect("Invalid channel regex"))
}

fn emoji_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^<(a?):([A-Za-z0-9_]+):([0-9]+)>").expect("Invalid emoji regex")
    })
}

fn role_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<@&([0-9]*)>").expect("Invalid role regex"))
}

fn user_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^<@!?([0-9]*)>").expect("Invalid user regex"))
}

/// Hands `node` to the caller's resolver for `kind`, if there is one.
fn resolve(node: &Node, kind: EntityKind, ctx: &Context) -> Option<String> {
    ctx.resolver(kind).map(|resolver| resolver(node))
}

pub fn channel() -> Rule {
    Rule::new("channel", 100, Scope::Any, match_channel, parse_channel)
        .rendering(NodeKind::Channel, render_channel)
}

fn match_channel(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('<') {
        return None;
    }
    Capture::regex(channel_re(), src)
}

fn parse_channel(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Channel {
        id: cap.group_or_empty(1).to_string(),
    }
    .into()
}

fn render_channel(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::Channel { id } = node else {
        return String::new();
    };
    resolve(node, EntityKind::Channel, ctx).unwrap_or_else(|| format!("#{}", escape_text(id)))
}

pub fn emoji() -> Rule {
    Rule::new("emoji", 101, Scope::Any, match_emoji, parse_emoji)
        .rendering(NodeKind::Emoji, render_emoji)
}

fn match_emoji(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with('<') {
        return None;
    }
    Capture::regex(emoji_re(), src)
}

fn parse_emoji(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Emoji {
        animated: cap.group_or_empty(1) == "a",
        name: cap.group_or_empty(2).to_string(),
        id: cap.group_or_empty(3).to_string(),
    }
    .into()
}

/// Without a resolver, an `<img>` pointing at the configured emoji location.
fn render_emoji(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::Emoji { id, name, animated } = node else {
        return String::new();
    };
    if let Some(html) = resolve(node, EntityKind::Emoji, ctx) {
        return html;
    }
    let (class, extension) = if *animated {
        ("d-emoji d-emoji-animated", "gif")
    } else {
        ("d-emoji", "png")
    };
    let src = format!("{}{id}.{extension}", ctx.options().emoji_base_url);
    let alt = format!(":{name}:");
    void_tag(
        "img",
        &[
            ("class", Some(class)),
            ("src", Some(src.as_str())),
            ("alt", Some(alt.as_str())),
        ],
    )
}

pub fn everyone() -> Rule {
    Rule::new("everyone", 102, Scope::Any, match_everyone, parse_everyone)
        .rendering(NodeKind::Everyone, render_everyone)
}

fn match_everyone(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    src.starts_with("@everyone").then(|| Capture::new("@everyone", []))
}

fn parse_everyone(_cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Everyone.into()
}

fn render_everyone(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    resolve(node, EntityKind::BroadcastEveryone, ctx).unwrap_or_else(|| "@everyone".to_string())
}

pub fn here() -> Rule {
    Rule::new("here", 103, Scope::Any, match_here, parse_here)
        .rendering(NodeKind::Here, render_here)
}

fn match_here(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    src.starts_with("@here").then(|| Capture::new("@here", []))
}

fn parse_here(_cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Here.into()
}

fn render_here(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    resolve(node, EntityKind::BroadcastHere, ctx).unwrap_or_else(|| "@here".to_string())
}

pub fn role() -> Rule {
    Rule::new("role", 104, Scope::Any, match_role, parse_role)
        .rendering(NodeKind::Role, render_role)
}

fn match_role(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("<@&") {
        return None;
    }
    Capture::regex(role_re(), src)
}

fn parse_role(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::Role {
        id: cap.group_or_empty(1).to_string(),
    }
    .into()
}

fn render_role(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::Role { id } = node else {
        return String::new();
    };
    resolve(node, EntityKind::Role, ctx)
        .unwrap_or_else(|| escape_text(&format!("&{id}")).into_owned())
}

pub fn user() -> Rule {
    Rule::new("user", 105, Scope::Any, match_user, parse_user)
        .rendering(NodeKind::User, render_user)
}

fn match_user(src: &str, _ctx: &Context, _prev: Option<&str>) -> Option<Capture> {
    if !src.starts_with("<@") {
        return None;
    }
    Capture::regex(user_re(), src)
}

fn parse_user(cap: &Capture, _recurse: &Recurse<'_>, _ctx: &Context) -> Parsed {
    Node::User {
        id: cap.group_or_empty(1).to_string(),
    }
    .into()
}

fn render_user(node: &Node, _children: &Children<'_>, ctx: &Context) -> String {
    let Node::User { id } = node else {
        return String::new();
    };
    resolve(node, EntityKind::User, ctx).unwrap_or_else(|| format!("@{}", escape_text(id)))
}
