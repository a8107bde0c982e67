//! Compile MJML email markup into HTML.
//!
//! This crate turns a tree of `mj-*` tags into a self-contained HTML
//! document which renders consistently across email clients: tables and
//! Outlook conditional comments for the desktop clients, media queries for
//! the mobile ones.
//!
//! # Examples
//!
//! ```rust
//! # use mjml2html::mjml2html;
//! let output = mjml2html(
//!     r#"<mjml>
//!          <mj-body>
//!            <mj-section>
//!              <mj-column>
//!                <mj-text>Hello world</mj-text>
//!              </mj-column>
//!            </mj-section>
//!          </mj-body>
//!        </mjml>"#,
//! )
//! .unwrap();
//! assert!(output.html.contains("Hello world"));
//! assert!(output.errors.is_empty());
//! ```
//!
//! The [`config`] module has the options: breakpoint, fonts, extra CSS
//! and custom components.

#![deny(missing_docs)]

#[macro_use]
mod macros;

pub mod css;
pub mod parser;
pub mod render;
pub mod skeleton;

use std::collections::BTreeMap;

use css::LayoutWidth;
use render::{resolve_attributes, selected_classes, BodyComponent, Context, Element, Props, Registry};

/// Attribute name to value, ordered by name.
pub type Attributes = BTreeMap<String, String>;

/// One tag of the input tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Node {
    /// The (lower-case) tag name.
    pub tag_name: String,
    /// The tag's attributes.
    pub attributes: Attributes,
    /// Child tags, in document order.
    pub children: Vec<Node>,
    /// Text content; for ending tags, the raw inner markup.
    pub content: String,
}

impl Node {
    /// A node with no attributes, children or content.
    pub fn new(tag_name: &str) -> Node {
        Node {
            tag_name: tag_name.to_string(),
            ..Default::default()
        }
    }

    /// Add an attribute.
    pub fn with_attribute(mut self, name: &str, value: &str) -> Node {
        self.attributes.insert(name.to_string(), value.to_string());
        self
    }

    /// Append a child.
    pub fn with_child(mut self, child: Node) -> Node {
        self.children.push(child);
        self
    }

    /// Set the text content.
    pub fn with_content(mut self, content: impl Into<String>) -> Node {
        self.content = content.into();
        self
    }

    /// A non-empty attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// Errors which stop a compile.  Anything less serious is reported in
/// [`Output::errors`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The input contained no element at all.
    #[error("no root element found")]
    NoRootElement,
    /// The root element wasn't `<mjml>`.
    #[error("the root element must be <mjml>, not <{0}>")]
    InvalidRoot(String),
}

/// Result type for this crate.
pub type Result<T> = std::result::Result<T, Error>;

/// The result of a compile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Output {
    /// The complete HTML document.
    pub html: String,
    /// Non-fatal problems found while compiling.
    pub errors: Vec<String>,
    /// CSS from `mj-style inline="inline"`, to be inlined by the caller.
    pub inline_style_rules: Vec<String>,
    /// Attributes from `mj-html-attributes`, per selector, to be applied by
    /// the caller.
    pub html_attributes: Vec<(String, Attributes)>,
}

/// A reducer which combines results from mapping children into
/// the result for the current node.
type ResultReducer<'a, C, R> = dyn FnOnce(&mut C, Vec<R>) -> Option<R> + 'a;

/// The result of trying to build one node.
enum TreeMapResult<'a, C, N, R> {
    /// A completed result.
    Finished(R),
    /// Deferred completion - can be turned into a result
    /// once the vector of children are processed.
    PendingChildren {
        children: Vec<N>,
        cons: Box<ResultReducer<'a, C, R>>,
    },
}

/// Map a tree pre-order and reduce it bottom-up, with an explicit stack
/// instead of recursion.
fn tree_map_reduce<'a, C, N, R, M>(context: &mut C, top: N, mut process_node: M) -> Option<R>
where
    M: FnMut(&mut C, N) -> TreeMapResult<'a, C, N, R>,
{
    /// A node partially built, waiting for its children.
    struct PendingNode<'a, C, R, N> {
        /// How to make the node once finished
        construct: Box<ResultReducer<'a, C, R>>,
        /// Children already processed
        children: Vec<R>,
        /// Iterator of child nodes not yet processed
        to_process: std::vec::IntoIter<N>,
    }

    let mut pending_stack = vec![PendingNode {
        // We only expect one child, which we'll just return.
        construct: Box::new(|_, mut cs| cs.pop()),
        children: Vec::new(),
        to_process: vec![top].into_iter(),
    }];
    loop {
        let current = match pending_stack.last_mut() {
            Some(current) => current,
            None => break None,
        };
        if let Some(node) = current.to_process.next() {
            match process_node(context, node) {
                TreeMapResult::Finished(result) => current.children.push(result),
                TreeMapResult::PendingChildren { children, cons } => {
                    pending_stack.push(PendingNode {
                        construct: cons,
                        children: Vec::new(),
                        to_process: children.into_iter(),
                    });
                }
            }
        } else {
            // No more children, so finally construct the parent.
            let completed = match pending_stack.pop() {
                Some(completed) => completed,
                None => break None,
            };
            let reduced = (completed.construct)(context, completed.children);
            match (reduced, pending_stack.last_mut()) {
                (Some(node), Some(parent)) => parent.children.push(node),
                // Finished the whole stack!
                (Some(node), None) => break Some(node),
                (None, None) => break None,
                (None, Some(_)) => {}
            }
        }
    }
}

/// A body node waiting to be built, with what its parent decided for it.
struct BuildItem<'n> {
    node: &'n Node,
    component: &'static dyn BodyComponent,
    attributes: Attributes,
    props: Props,
    context: Context,
}

/// The registered body children of `node`, with their positions.  Unknown
/// tags are dropped and don't count as siblings.  The non-raw children
/// share the width of `context` in order: each is offered what the earlier
/// ones left.
fn child_items<'n>(registry: &Registry, node: &'n Node, context: &Context) -> Vec<BuildItem<'n>> {
    let known: Vec<(&'n Node, &'static dyn BodyComponent)> = node
        .children
        .iter()
        .filter_map(|child| match registry.body(&child.tag_name) {
            Some(component) => Some((child, component)),
            None => {
                log::debug!(
                    "skipping unknown tag <{}> in <{}>",
                    child.tag_name,
                    node.tag_name
                );
                None
            }
        })
        .collect();
    let sibling_count = known.len();
    let non_raw = known.iter().filter(|(_, c)| !c.is_raw_element()).count();

    let resolved: Vec<Attributes> = known
        .iter()
        .map(|(child, component)| resolve_attributes(*component, child, context))
        .collect();
    let wanted: Vec<f64> = known
        .iter()
        .zip(&resolved)
        .filter(|((_, component), _)| !component.is_raw_element())
        .map(|(_, attributes)| {
            LayoutWidth::resolve(
                attributes.get("width").map(String::as_str),
                context.container_width,
                non_raw,
            )
            .outer_px()
        })
        .collect();
    let mut available = css::remaining_widths(&wanted, context.container_width).into_iter();

    known
        .into_iter()
        .zip(resolved)
        .enumerate()
        .map(|(index, ((node, component), attributes))| {
            let mut props = Props::new(index, sibling_count, non_raw);
            if !component.is_raw_element() {
                if let Some(width) = available.next() {
                    props = props.with_available_width(width);
                }
            }
            BuildItem {
                node,
                component,
                attributes,
                props,
                context: context.clone(),
            }
        })
        .collect()
}

/// Fonts named in `font-family` declarations inside raw content.
fn record_inline_fonts(content: &str, context: &Context) {
    let mut global = context.global_mut();
    for family in css::parser::font_family_declarations(content) {
        global.record_font_usage(&family);
    }
}

fn build_element<'n>(
    registry: &Registry,
    item: BuildItem<'n>,
) -> TreeMapResult<'static, (), BuildItem<'n>, Element> {
    let BuildItem {
        node,
        component,
        attributes,
        props,
        context,
    } = item;
    render_trace!("build <{}> at {:?}", node.tag_name, props);

    if component.is_ending_tag() {
        record_inline_fonts(&node.content, &context);
        return TreeMapResult::Finished(Element::new(
            component,
            attributes,
            props,
            node.content.clone(),
            context,
        ));
    }

    let mut child_context =
        context.derive_child(component.child_context(&attributes, &props, &context));
    let classes = selected_classes(node, &context.head_attributes);
    if !classes.is_empty() {
        child_context.inherited_classes = classes;
    }
    let children = child_items(registry, node, &child_context);
    let content = node.content.clone();
    TreeMapResult::PendingChildren {
        children,
        cons: Box::new(move |_, children| {
            Some(Element::new(component, attributes, props, content, context).with_children(children))
        }),
    }
}

/// Build the element tree under `body`, whose context is `context`.
fn build_body(
    registry: &Registry,
    body: &Node,
    component: &'static dyn BodyComponent,
    context: &Context,
) -> Option<Element> {
    let top = BuildItem {
        node: body,
        component,
        attributes: resolve_attributes(component, body, context),
        props: Props::new(0, 1, 1),
        context: context.clone(),
    };
    tree_map_reduce(&mut (), top, |_, item| build_element(registry, item))
}

pub mod config {
    //! Configure the compile using the [`Config`] builder.

    use super::{build_body, parser, skeleton, Error, Node, Output, Result};
    use crate::css;
    use crate::render::{resolve_attributes, ComponentKind, Context, Registry};

    /// The fonts declared unless [`Config::no_default_fonts`] is used.
    pub const DEFAULT_FONTS: &[(&str, &str)] = &[
        (
            "Open Sans",
            "https://fonts.googleapis.com/css?family=Open+Sans:300,400,500,700",
        ),
        (
            "Droid Sans",
            "https://fonts.googleapis.com/css?family=Droid+Sans:300,400,500,700",
        ),
        (
            "Lato",
            "https://fonts.googleapis.com/css?family=Lato:300,400,500,700",
        ),
        (
            "Roboto",
            "https://fonts.googleapis.com/css?family=Roboto:300,400,500,700",
        ),
        (
            "Ubuntu",
            "https://fonts.googleapis.com/css?family=Ubuntu:300,400,500,700",
        ),
    ];

    /// Default width below which columns stack.
    pub const DEFAULT_BREAKPOINT: u32 = 480;

    /// Default width of the body.
    pub const DEFAULT_CONTAINER_WIDTH: u32 = 600;

    /// Compile options.
    #[derive(Debug, Clone)]
    pub struct Config {
        registry: Registry,
        breakpoint: u32,
        container_width: u32,
        fonts: Vec<(String, String)>,
        keep_comments: bool,
        custom_styles: Vec<String>,
    }

    impl Default for Config {
        fn default() -> Config {
            Config {
                registry: Registry::default(),
                breakpoint: DEFAULT_BREAKPOINT,
                container_width: DEFAULT_CONTAINER_WIDTH,
                fonts: DEFAULT_FONTS
                    .iter()
                    .map(|(name, href)| (name.to_string(), href.to_string()))
                    .collect(),
                keep_comments: true,
                custom_styles: Vec::new(),
            }
        }
    }

    impl Config {
        /// The width in pixels below which columns stack, unless the
        /// document sets `mj-breakpoint`.
        pub fn breakpoint(mut self, width: u32) -> Self {
            self.breakpoint = width;
            self
        }

        /// The width of the body when `mj-body` doesn't set one.
        pub fn container_width(mut self, width: u32) -> Self {
            self.container_width = width.max(1);
            self
        }

        /// Declare a font, replacing any font of the same name.
        pub fn add_font(mut self, name: &str, href: &str) -> Self {
            match self.fonts.iter_mut().find(|(n, _)| n == name) {
                Some(slot) => slot.1 = href.to_string(),
                None => self.fonts.push((name.to_string(), href.to_string())),
            }
            self
        }

        /// Start without the default web fonts.
        pub fn no_default_fonts(mut self) -> Self {
            self.fonts.clear();
            self
        }

        /// Whether comments in the body are kept in the output.
        pub fn keep_comments(mut self, keep: bool) -> Self {
            self.keep_comments = keep;
            self
        }

        /// Extra CSS for the document head.
        pub fn add_css(mut self, css: &str) -> Self {
            self.custom_styles.push(css.to_string());
            self
        }

        /// Register a component, replacing any built-in of the same tag.
        pub fn register(mut self, tag_name: &str, kind: ComponentKind) -> Self {
            self.registry.register(tag_name, kind);
            self
        }

        /// Parse markup into a tag tree, using the registered ending tags.
        pub fn parse(&self, input: &str) -> Result<Node> {
            parser::parse_with(input, &self.registry, self.keep_comments)
        }

        /// Parse and compile markup.
        pub fn render_str(&self, input: &str) -> Result<Output> {
            self.render(&self.parse(input)?)
        }

        /// Compile a tag tree into an HTML document.
        pub fn render(&self, root: &Node) -> Result<Output> {
            if root.tag_name != "mjml" {
                return Err(Error::InvalidRoot(root.tag_name.clone()));
            }

            let mut context = Context::new(self.container_width, self.breakpoint);
            if let Some(lang) = root.attribute("lang") {
                context.language = lang.to_string();
            }
            if let Some(dir) = root.attribute("dir") {
                context.direction = dir.to_string();
            }
            for (name, href) in &self.fonts {
                context.add_font(name, href);
            }
            context.custom_styles = self.custom_styles.clone();

            for head in root.children.iter().filter(|c| c.tag_name == "mj-head") {
                for node in &head.children {
                    match self.registry.head(&node.tag_name) {
                        Some(component) => component.handle(node, &mut context),
                        None => log::debug!("skipping unknown tag <{}> in <mj-head>", node.tag_name),
                    }
                }
            }

            let body = root
                .children
                .iter()
                .find(|c| c.tag_name == "mj-body")
                .and_then(|node| self.registry.body(&node.tag_name).map(|c| (node, c)));
            let content = match body {
                Some((node, component)) => {
                    let attributes = resolve_attributes(component, node, &context);
                    if let Some(width) = attributes.get("width").and_then(|w| css::parse_px(w)) {
                        context.container_width = width.max(1);
                    }
                    context.background_color = attributes
                        .get("background-color")
                        .filter(|c| !c.is_empty())
                        .cloned();
                    build_body(&self.registry, node, component, &context)
                        .map(|element| element.render())
                        .unwrap_or_default()
                }
                None => {
                    log::debug!("no <mj-body> to render");
                    String::new()
                }
            };

            let html = skeleton::build_document(&context, &content);
            let (errors, inline_style_rules, html_attributes) =
                context.take_global().into_parts();
            Ok(Output {
                html,
                errors,
                inline_style_rules,
                html_attributes,
            })
        }
    }

    /// A `Config` with the default settings.
    pub fn standard() -> Config {
        Config::default()
    }
}

/// Parse markup into a tag tree with the built-in components.
pub fn parse(input: &str) -> Result<Node> {
    config::standard().parse(input)
}

/// Compile a tag tree with the default settings.
pub fn render(root: &Node) -> Result<Output> {
    config::standard().render(root)
}

/// Parse and compile markup with the default settings.
pub fn mjml2html(input: &str) -> Result<Output> {
    config::standard().render_str(input)
}

#[cfg(test)]
mod tests;
