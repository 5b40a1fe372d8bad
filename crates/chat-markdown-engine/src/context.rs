//! # Context and Options
//!
//! [`Options`] is what a caller passes to a render call. [`Context`] is the
//! per-recursion-level value threaded through parsing and rendering: the
//! nesting flags plus a shared handle to the options.
//!
//! A context is never mutated. Rules that need a different flag for their
//! children derive a copy with that one field overridden:
//!
//! ```
//! use chat_markdown_engine::{Context, Options};
//!
//! let ctx = Context::new(Options::default());
//! let quoted = ctx.with_quote();
//! assert!(!ctx.in_quote);
//! assert!(quoted.in_quote);
//! ```

use std::{collections::HashMap, fmt, sync::Arc};

use crate::ast::Node;

/// Default location of custom emoji images, keyed by `{id}.{png|gif}`.
pub const DEFAULT_EMOJI_BASE_URL: &str = "https://cdn.discordapp.com/emojis/";

/// Default bound on nested parse depth.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// The kinds of entity reference a caller can resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Channel,
    Role,
    BroadcastEveryone,
    BroadcastHere,
    Emoji,
}

/// Renders an entity node to an HTML string. The output is inserted verbatim.
pub type Resolver = Arc<dyn Fn(&Node) -> String + Send + Sync>;

/// Picks a `class` for a code block's `<code>` element from its language tag.
pub type CodeClassHook = Arc<dyn Fn(&str, &Context) -> Option<String> + Send + Sync>;

/// Caller-supplied renderers per entity kind. Missing kinds use built-in defaults.
#[derive(Clone, Default)]
pub struct EntityResolvers {
    resolvers: HashMap<EntityKind, Resolver>,
}

impl EntityResolvers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(
        mut self,
        kind: EntityKind,
        resolver: impl Fn(&Node) -> String + Send + Sync + 'static,
    ) -> Self {
        self.resolvers.insert(kind, Arc::new(resolver));
        self
    }

    pub fn get(&self, kind: EntityKind) -> Option<&Resolver> {
        self.resolvers.get(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl fmt::Debug for EntityResolvers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.resolvers.keys()).finish()
    }
}

/// Options for a single render call.
#[derive(Clone)]
pub struct Options {
    /// Escape raw text in the output. Code and attributes are escaped regardless.
    pub escape_html: bool,
    /// Recognise only entity references instead of full markdown.
    pub entities_only: bool,
    pub resolvers: EntityResolvers,
    /// Prefix for default emoji image URLs.
    pub emoji_base_url: String,
    pub code_class: Option<CodeClassHook>,
    pub max_depth: usize,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            escape_html: true,
            entities_only: false,
            resolvers: EntityResolvers::default(),
            emoji_base_url: DEFAULT_EMOJI_BASE_URL.to_string(),
            code_class: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Options {
    pub fn with_resolver(
        mut self,
        kind: EntityKind,
        resolver: impl Fn(&Node) -> String + Send + Sync + 'static,
    ) -> Self {
        self.resolvers = self.resolvers.with(kind, resolver);
        self
    }

    pub fn with_code_class(
        mut self,
        hook: impl Fn(&str, &Context) -> Option<String> + Send + Sync + 'static,
    ) -> Self {
        self.code_class = Some(Arc::new(hook));
        self
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("escape_html", &self.escape_html)
            .field("entities_only", &self.entities_only)
            .field("resolvers", &self.resolvers)
            .field("emoji_base_url", &self.emoji_base_url)
            .field("code_class", &self.code_class.is_some())
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

/// Nesting state for one level of parsing or rendering.
#[derive(Clone, Debug)]
pub struct Context {
    /// Inline mode. Block-only rules match only when this is false.
    pub inline: bool,
    pub in_quote: bool,
    pub in_emphasis: bool,
    /// Set by the spoiler renderer for its children.
    pub in_spoiler: bool,
    /// Nested parse depth, maintained by the parser.
    pub(crate) depth: usize,
    pub(crate) options: Arc<Options>,
}

impl Context {
    pub fn new(options: Options) -> Self {
        Self::from_shared(Arc::new(options))
    }

    pub fn from_shared(options: Arc<Options>) -> Self {
        Self {
            inline: true,
            in_quote: false,
            in_emphasis: false,
            in_spoiler: false,
            depth: 0,
            options,
        }
    }

    /// A block-mode context: emphasis, links and code are not recognised.
    pub fn block(options: Options) -> Self {
        Self {
            inline: false,
            ..Self::new(options)
        }
    }

    pub fn with_quote(&self) -> Self {
        Self {
            in_quote: true,
            ..self.clone()
        }
    }

    pub fn with_emphasis(&self) -> Self {
        Self {
            in_emphasis: true,
            ..self.clone()
        }
    }

    pub fn with_spoiler(&self) -> Self {
        Self {
            in_spoiler: true,
            ..self.clone()
        }
    }

    pub fn with_inline(&self, inline: bool) -> Self {
        Self {
            inline,
            ..self.clone()
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn escape_html(&self) -> bool {
        self.options.escape_html
    }

    pub fn resolver(&self, kind: EntityKind) -> Option<&Resolver> {
        self.options.resolvers.get(kind)
    }

    pub fn depth(&self) -> usize {
        self.depth
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new(Options::default())
    }
}
