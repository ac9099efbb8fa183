//! Prismic rich-text fields.
//!
//! A rich-text field is an array of typed blocks. Text-bearing blocks carry a
//! `text` string plus `spans` that mark formatted ranges of it:
//!
//! ```json
//! [
//!   { "type": "heading2", "text": "Proin et varius", "spans": [] },
//!   { "type": "paragraph", "text": "Nullam dolor sapien",
//!     "spans": [{ "start": 0, "end": 6, "type": "strong" }] }
//! ]
//! ```
//!
//! Span offsets count UTF-16 code units (they come from JavaScript strings),
//! so they are translated to byte offsets before slicing.
//!
//! Two renderers are provided: [`as_text`] for word counting and plain
//! listings, and [`as_html`] / [`to_markup`] for post bodies. Block types this
//! module does not know are kept in the model as [`NodeKind::Unsupported`]
//! and render to nothing.

use maud::{Markup, PreEscaped, html};
use serde::{Deserialize, Serialize};

/// Separator placed between blocks by [`as_text`].
const TEXT_SEPARATOR: &str = " ";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "heading1")]
    Heading1,
    #[serde(rename = "heading2")]
    Heading2,
    #[serde(rename = "heading3")]
    Heading3,
    #[serde(rename = "heading4")]
    Heading4,
    #[serde(rename = "heading5")]
    Heading5,
    #[serde(rename = "heading6")]
    Heading6,
    #[serde(rename = "paragraph")]
    Paragraph,
    #[serde(rename = "preformatted")]
    Preformatted,
    #[serde(rename = "list-item")]
    ListItem,
    #[serde(rename = "o-list-item")]
    OrderedListItem,
    #[serde(rename = "image")]
    Image,
    #[serde(rename = "embed")]
    Embed,
    #[serde(other)]
    Unsupported,
}

impl NodeKind {
    fn is_list_item(self) -> bool {
        matches!(self, NodeKind::ListItem | NodeKind::OrderedListItem)
    }
}

/// One block of a rich-text field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RichTextNode {
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub spans: Vec<Span>,
    /// Image source (image blocks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    /// Provider payload (embed blocks only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oembed: Option<Oembed>,
}

impl RichTextNode {
    /// A text block with no formatting.
    pub fn text(kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            spans: Vec::new(),
            url: None,
            alt: None,
            oembed: None,
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::text(NodeKind::Paragraph, text)
    }

    fn has_text(&self) -> bool {
        !matches!(
            self.kind,
            NodeKind::Image | NodeKind::Embed | NodeKind::Unsupported
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Oembed {
    #[serde(default)]
    pub html: Option<String>,
    #[serde(default)]
    pub embed_url: Option<String>,
}

/// A formatted range inside a text block, in UTF-16 code units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    #[serde(rename = "type")]
    pub kind: SpanKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<SpanData>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpanKind {
    Strong,
    Em,
    Hyperlink,
    Label,
    #[serde(other)]
    Unsupported,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SpanData {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
}

/// Plain text of a rich-text field: block texts joined by a single space.
pub fn as_text(nodes: &[RichTextNode]) -> String {
    nodes
        .iter()
        .filter(|n| n.has_text())
        .map(|n| n.text.as_str())
        .collect::<Vec<_>>()
        .join(TEXT_SEPARATOR)
}

/// HTML of a rich-text field as a string.
pub fn as_html(nodes: &[RichTextNode]) -> String {
    to_markup(nodes).into_string()
}

/// HTML of a rich-text field. Consecutive list items share one `ul`/`ol`.
pub fn to_markup(nodes: &[RichTextNode]) -> Markup {
    let mut blocks = Vec::new();
    let mut i = 0;
    while i < nodes.len() {
        let kind = nodes[i].kind;
        if kind.is_list_item() {
            let run = nodes[i..].iter().take_while(|n| n.kind == kind).count();
            let items = &nodes[i..i + run];
            blocks.push(if kind == NodeKind::OrderedListItem {
                html! { ol { @for item in items { li { (inline(item)) } } } }
            } else {
                html! { ul { @for item in items { li { (inline(item)) } } } }
            });
            i += run;
        } else {
            blocks.push(render_block(&nodes[i]));
            i += 1;
        }
    }
    html! { @for block in &blocks { (block) } }
}

fn render_block(node: &RichTextNode) -> Markup {
    match node.kind {
        NodeKind::Heading1 => html! { h1 { (inline(node)) } },
        NodeKind::Heading2 => html! { h2 { (inline(node)) } },
        NodeKind::Heading3 => html! { h3 { (inline(node)) } },
        NodeKind::Heading4 => html! { h4 { (inline(node)) } },
        NodeKind::Heading5 => html! { h5 { (inline(node)) } },
        NodeKind::Heading6 => html! { h6 { (inline(node)) } },
        NodeKind::Paragraph => html! { p { (inline(node)) } },
        NodeKind::Preformatted => html! { pre { (inline(node)) } },
        NodeKind::ListItem | NodeKind::OrderedListItem => html! { li { (inline(node)) } },
        NodeKind::Image => match node.url.as_deref().filter(|u| is_safe_url(u)) {
            Some(url) => html! {
                p.block-img { img src=(url) alt=(node.alt.as_deref().unwrap_or_default()); }
            },
            None => html! {},
        },
        NodeKind::Embed => match &node.oembed {
            // Provider markup comes from the repository editors and is trusted.
            Some(oembed) => html! {
                div data-oembed=[oembed.embed_url.as_deref()] {
                    (PreEscaped(oembed.html.as_deref().unwrap_or_default()))
                }
            },
            None => html! {},
        },
        NodeKind::Unsupported => html! {},
    }
}

/// A span resolved to byte offsets of the block text.
#[derive(Debug, Clone, Copy)]
struct ByteSpan<'a> {
    start: usize,
    end: usize,
    span: &'a Span,
}

fn inline(node: &RichTextNode) -> Markup {
    let text = node.text.as_str();
    let mut spans: Vec<ByteSpan> = node
        .spans
        .iter()
        .filter_map(|span| {
            let start = utf16_to_byte(text, span.start)?;
            let end = utf16_to_byte(text, span.end)?;
            (start < end).then_some(ByteSpan { start, end, span })
        })
        .collect();
    // Outer spans first: earliest start, then longest.
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    render_range(text, 0, text.len(), &spans)
}

/// Render `text[start..end]`, nesting every span that starts inside an
/// earlier one. A span that straddles its parent's end is clipped; one that
/// overlaps a previous sibling is dropped.
fn render_range(text: &str, start: usize, end: usize, spans: &[ByteSpan]) -> Markup {
    let mut pieces = Vec::new();
    let mut cursor = start;
    let mut i = 0;
    while i < spans.len() {
        let outer = spans[i];
        if outer.start >= end {
            break;
        }
        if outer.start < cursor {
            i += 1;
            continue;
        }
        pieces.push(with_breaks(&text[cursor..outer.start]));
        let outer_end = outer.end.min(end);
        let children_end = i + 1 + spans[i + 1..]
            .iter()
            .take_while(|s| s.start < outer_end)
            .count();
        let children: Vec<ByteSpan> = spans[i + 1..children_end]
            .iter()
            .map(|s| ByteSpan {
                end: s.end.min(outer_end),
                ..*s
            })
            .collect();
        let inner = render_range(text, outer.start, outer_end, &children);
        pieces.push(wrap(outer.span, inner));
        cursor = outer_end;
        i = children_end;
    }
    pieces.push(with_breaks(&text[cursor..end]));
    html! { @for piece in &pieces { (piece) } }
}

fn wrap(span: &Span, inner: Markup) -> Markup {
    let data = span.data.as_ref();
    match span.kind {
        SpanKind::Strong => html! { strong { (inner) } },
        SpanKind::Em => html! { em { (inner) } },
        SpanKind::Hyperlink => match data.and_then(|d| d.url.as_deref()).filter(|u| is_safe_url(u)) {
            Some(url) => {
                let target = data.and_then(|d| d.target.as_deref());
                html! {
                    a href=(url) target=[target] rel=[target.map(|_| "noopener noreferrer")] {
                        (inner)
                    }
                }
            }
            None => inner,
        },
        SpanKind::Label => match data.and_then(|d| d.label.as_deref()) {
            Some(label) => html! { span class=(label) { (inner) } },
            None => inner,
        },
        SpanKind::Unsupported => inner,
    }
}

/// Escaped text with `\n` rendered as `<br>`.
fn with_breaks(text: &str) -> Markup {
    html! {
        @for (i, line) in text.split('\n').enumerate() {
            @if i > 0 { br; }
            (line)
        }
    }
}

/// Byte offset of the given UTF-16 offset, or `None` when it lies past the
/// end of `text` or inside a surrogate pair.
fn utf16_to_byte(text: &str, offset: usize) -> Option<usize> {
    let mut units = 0;
    for (idx, ch) in text.char_indices() {
        if units == offset {
            return Some(idx);
        }
        if units > offset {
            return None;
        }
        units += ch.len_utf16();
    }
    (units == offset).then_some(text.len())
}

/// Schemes are case-insensitive.
fn is_safe_url(url: &str) -> bool {
    let has_prefix = |prefix: &str| {
        url.get(..prefix.len())
            .is_some_and(|head| head.eq_ignore_ascii_case(prefix))
    };
    has_prefix("https://")
        || has_prefix("http://")
        || has_prefix("mailto:")
        || (url.starts_with('/') && !url.starts_with("//"))
}
