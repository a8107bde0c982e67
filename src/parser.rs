//! Reading markup into a [`Node`] tree.
//!
//! The html5ever tokenizer is driven directly, without the HTML tree
//! builder, so `mj-*` tags are never moved around to fit HTML's content
//! model.  The content of ending tags is cut out before tokenizing and put
//! back verbatim afterwards.

use std::cell::RefCell;

use html5ever::tokenizer::{
    BufferQueue, Tag, TagKind, Token, TokenSink, TokenSinkResult, Tokenizer, TokenizerOpts,
};
use tendril::StrTendril;

use crate::render::Registry;
use crate::{Error, Node, Result};

/// Stands in for the content of an ending tag while tokenizing.
const PLACEHOLDER: &str = "mj-ending-content-";

/// HTML elements which never have an end tag.
const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// Parse markup using the tags of `registry` to decide which contents are
/// opaque.  With `keep_comments`, comments in the body become `mj-raw`
/// nodes.
pub fn parse_with(input: &str, registry: &Registry, keep_comments: bool) -> Result<Node> {
    let (masked, contents) = extract_ending_contents(input, registry);
    render_trace!(
        "parse: {} bytes, {} ending tag contents",
        input.len(),
        contents.len()
    );

    let sink = TreeSink {
        registry,
        keep_comments,
        state: RefCell::new(TreeState {
            stack: Vec::new(),
            root: None,
            contents,
        }),
    };
    let tokenizer = Tokenizer::new(sink, TokenizerOpts::default());
    let queue = BufferQueue::default();
    queue.push_back(StrTendril::from_slice(&masked));
    let _ = tokenizer.feed(&queue);
    tokenizer.end();

    let mut state = tokenizer.sink.state.take();
    while !state.stack.is_empty() {
        state.close_top(registry);
    }
    state.root.ok_or(Error::NoRootElement)
}

/// Replace the content of every ending tag with a numbered placeholder.
/// Returns the rewritten input and the contents, trimmed, in order.
fn extract_ending_contents(input: &str, registry: &Registry) -> (String, Vec<String>) {
    let lower = input.to_ascii_lowercase();
    let mut out = String::with_capacity(input.len());
    let mut contents = Vec::new();
    let mut pos = 0;

    while let Some(offset) = input[pos..].find('<') {
        let name_start = pos + offset + 1;
        let name_len = lower[name_start..]
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
            .unwrap_or(lower.len() - name_start);
        let name = &lower[name_start..name_start + name_len];
        if name.is_empty() || !registry.is_ending_tag(name) {
            out.push_str(&input[pos..name_start]);
            pos = name_start;
            continue;
        }

        let start_end = match start_tag_end(input, name_start + name_len) {
            Some(end) => end,
            None => break,
        };
        out.push_str(&input[pos..start_end]);
        pos = start_end;
        if input[..start_end].ends_with("/>") {
            continue;
        }

        let close = match find_end_tag(&lower, name, start_end) {
            Some(close) => close,
            None => break,
        };
        out.push_str(PLACEHOLDER);
        out.push_str(&contents.len().to_string());
        contents.push(input[start_end..close].trim().to_string());
        pos = close;
    }
    out.push_str(&input[pos..]);
    (out, contents)
}

/// The index just past the `>` closing a start tag, skipping quoted
/// attribute values.
fn start_tag_end(input: &str, from: usize) -> Option<usize> {
    let mut quote = None;
    for (i, c) in input[from..].char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(c),
            (None, '>') => return Some(from + i + 1),
            _ => {}
        }
    }
    None
}

/// The index of the `</name>` ending an ending tag.
fn find_end_tag(lower: &str, name: &str, from: usize) -> Option<usize> {
    let pattern = format!("</{}", name);
    let mut pos = from;
    while let Some(offset) = lower[pos..].find(&pattern) {
        let at = pos + offset;
        let after = &lower[at + pattern.len()..];
        if after.starts_with(|c: char| c == '>' || c.is_ascii_whitespace()) {
            return Some(at);
        }
        pos = at + pattern.len();
    }
    None
}

#[derive(Default)]
struct TreeState {
    stack: Vec<Node>,
    root: Option<Node>,
    contents: Vec<String>,
}

impl TreeState {
    /// Pop the innermost open node and attach it to its parent.
    fn close_top(&mut self, registry: &Registry) {
        let mut node = match self.stack.pop() {
            Some(node) => node,
            None => return,
        };
        let text = node.content.trim();
        node.content = match text.strip_prefix(PLACEHOLDER) {
            Some(index) if registry.is_ending_tag(&node.tag_name) => index
                .parse::<usize>()
                .ok()
                .and_then(|i| self.contents.get_mut(i))
                .map(std::mem::take)
                .unwrap_or_default(),
            _ => text.to_string(),
        };

        if let Some(parent) = self.stack.last_mut() {
            parent.children.push(node);
        } else if self.root.is_none() {
            self.root = Some(node);
        } else {
            render_trace_quiet!("ignoring second root element <{}>", node.tag_name);
        }
    }
}

struct TreeSink<'r> {
    registry: &'r Registry,
    keep_comments: bool,
    state: RefCell<TreeState>,
}

impl TreeSink<'_> {
    fn start_tag(&self, state: &mut TreeState, tag: Tag) {
        let mut node = Node::new(&tag.name);
        for attr in tag.attrs {
            node.attributes
                .entry(attr.name.local.to_string())
                .or_insert_with(|| attr.value.to_string());
        }
        state.stack.push(node);
        if tag.self_closing || VOID_ELEMENTS.contains(&&*tag.name) {
            state.close_top(self.registry);
        }
    }

    fn end_tag(&self, state: &mut TreeState, tag: Tag) {
        match state.stack.iter().rposition(|n| n.tag_name == *tag.name) {
            Some(depth) => {
                while state.stack.len() > depth {
                    state.close_top(self.registry);
                }
            }
            None => {
                render_trace_quiet!("ignoring stray </{}>", &*tag.name);
            }
        }
    }

    /// Comments survive as raw markup, except in the head and directly
    /// under the root.
    fn comment(&self, state: &mut TreeState, text: &str) {
        if !self.keep_comments {
            return;
        }
        let in_head = state.stack.iter().any(|n| n.tag_name == "mj-head");
        match state.stack.last_mut() {
            Some(parent) if !in_head && parent.tag_name != "mjml" => {
                parent
                    .children
                    .push(Node::new("mj-raw").with_content(format!("<!--{}-->", text)));
            }
            _ => {}
        }
    }
}

impl TokenSink for TreeSink<'_> {
    type Handle = ();

    fn process_token(&self, token: Token, _line_number: u64) -> TokenSinkResult<()> {
        let mut state = self.state.borrow_mut();
        match token {
            Token::TagToken(tag) => match tag.kind {
                TagKind::StartTag => self.start_tag(&mut state, tag),
                TagKind::EndTag => self.end_tag(&mut state, tag),
            },
            Token::CharacterTokens(text) => {
                if let Some(node) = state.stack.last_mut() {
                    node.content.push_str(&text);
                }
            }
            Token::CommentToken(text) => self.comment(&mut state, &text),
            Token::ParseError(message) => {
                render_trace_quiet!("tokenizer: {}", message);
            }
            _ => {}
        }
        TokenSinkResult::Continue
    }
}
