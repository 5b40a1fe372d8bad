use serde::Serialize;

/// A node in the parsed tree.
///
/// Nodes are built once by the parser and never modified afterwards. Container
/// variants own their children outright; leaf variants hold literal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Node {
    /// Literal text, escaped at render time according to the context.
    Text { content: String },
    /// A newline run between blocks (block mode only).
    Newline,
    /// A literal line break.
    Br,
    Em { content: Vec<Node> },
    Strong { content: Vec<Node> },
    Underline { content: Vec<Node> },
    Strike { content: Vec<Node> },
    /// `||hidden||` text revealed client-side.
    Spoiler { content: Vec<Node> },
    /// Backtick code span. Content is raw, never parsed.
    InlineCode { content: String },
    /// Triple-backtick fence. Content is raw, never parsed.
    CodeBlock {
        lang: String,
        content: String,
        in_quote: bool,
    },
    BlockQuote { content: Vec<Node> },
    Heading { level: u8, content: Vec<Node> },
    List {
        ordered: bool,
        /// First item number of an ordered list.
        start: Option<u64>,
        items: Vec<Vec<Node>>,
    },
    /// Labelled link, autolink or bare URL.
    Link {
        target: String,
        title: Option<String>,
        content: Vec<Node>,
    },
    User { id: String },
    Channel { id: String },
    Role { id: String },
    Everyone,
    Here,
    Emoji {
        id: String,
        name: String,
        animated: bool,
    },
}

/// The tag of a [`Node`], used to look up its renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Text,
    Newline,
    Br,
    Em,
    Strong,
    Underline,
    Strike,
    Spoiler,
    InlineCode,
    CodeBlock,
    BlockQuote,
    Heading,
    List,
    Link,
    User,
    Channel,
    Role,
    Everyone,
    Here,
    Emoji,
}

impl Node {
    pub fn text(content: impl Into<String>) -> Self {
        Node::Text {
            content: content.into(),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::Text { .. } => NodeKind::Text,
            Node::Newline => NodeKind::Newline,
            Node::Br => NodeKind::Br,
            Node::Em { .. } => NodeKind::Em,
            Node::Strong { .. } => NodeKind::Strong,
            Node::Underline { .. } => NodeKind::Underline,
            Node::Strike { .. } => NodeKind::Strike,
            Node::Spoiler { .. } => NodeKind::Spoiler,
            Node::InlineCode { .. } => NodeKind::InlineCode,
            Node::CodeBlock { .. } => NodeKind::CodeBlock,
            Node::BlockQuote { .. } => NodeKind::BlockQuote,
            Node::Heading { .. } => NodeKind::Heading,
            Node::List { .. } => NodeKind::List,
            Node::Link { .. } => NodeKind::Link,
            Node::User { .. } => NodeKind::User,
            Node::Channel { .. } => NodeKind::Channel,
            Node::Role { .. } => NodeKind::Role,
            Node::Everyone => NodeKind::Everyone,
            Node::Here => NodeKind::Here,
            Node::Emoji { .. } => NodeKind::Emoji,
        }
    }

    /// Child nodes of a container variant, or an empty slice for leaves.
    ///
    /// Lists are not covered: their children are grouped per item.
    pub fn children(&self) -> &[Node] {
        match self {
            Node::Em { content }
            | Node::Strong { content }
            | Node::Underline { content }
            | Node::Strike { content }
            | Node::Spoiler { content }
            | Node::BlockQuote { content }
            | Node::Heading { content, .. }
            | Node::Link { content, .. } => content,
            _ => &[],
        }
    }
}

/// Appends `node` to `out`, folding it into a preceding text node if both are text.
pub(crate) fn push_merged(out: &mut Vec<Node>, node: Node) {
    if let Node::Text { content } = &node
        && let Some(Node::Text { content: last }) = out.last_mut()
    {
        last.push_str(content);
        return;
    }
    out.push(node);
}
