//! Module containing the component contract, the tag registry and the
//! built-in components.

use std::collections::HashMap;
use std::fmt;

use crate::css::{self, BoxWidths, Side, Style, Styles};
use crate::{Attributes, Node};

pub mod content;
pub mod context;
pub mod head;
pub mod layout;
pub mod navbar;

pub use context::{Context, ContextOverrides, GlobalData, HeadAttributes, MjClass};

/// A component handling a tag inside `mj-head`.  It changes the top-level
/// context or the global data once and produces no markup.
pub trait HeadComponent {
    /// The tag this component handles.
    fn tag_name(&self) -> &'static str;

    /// True if the tag's content is opaque text rather than nested markup.
    fn is_ending_tag(&self) -> bool {
        false
    }

    /// Apply the head node to the document context.
    fn handle(&self, node: &Node, context: &mut Context);
}

/// A component rendering a tag inside `mj-body`.
///
/// Implementations are stateless; the per-node data lives in an
/// [`Element`], which is passed back to `styles` and `render`.
pub trait BodyComponent {
    /// The tag this component renders.
    fn tag_name(&self) -> &'static str;

    /// True if the tag's content is opaque text/HTML, kept byte for byte.
    fn is_ending_tag(&self) -> bool {
        false
    }

    /// True if the output is spliced in verbatim.  Raw elements take no
    /// share of their parent's width.
    fn is_raw_element(&self) -> bool {
        false
    }

    /// Attribute values used when nothing else sets them.
    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[]
    }

    /// The context changes this component makes for its children.
    ///
    /// This must only depend on its arguments: it is called before the
    /// children are built.
    fn child_context(
        &self,
        _attributes: &Attributes,
        _props: &Props,
        _context: &Context,
    ) -> ContextOverrides {
        ContextOverrides::new()
    }

    /// The named inline styles of the component.
    fn styles(&self, _element: &Element) -> Styles {
        Styles::new()
    }

    /// Produce the markup of the component and its children.
    fn render(&self, element: &Element) -> String;
}

/// Position of an element among its siblings.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Props {
    /// Index among the (known) siblings.
    pub index: usize,
    /// First sibling
    pub is_first: bool,
    /// Last sibling
    pub is_last: bool,
    /// Number of siblings, including this one.
    pub sibling_count: usize,
    /// Number of siblings which aren't raw elements.
    pub non_raw_sibling_count: usize,
    /// Pixels of the parent's width not taken by the earlier siblings.
    /// `None` when the element doesn't share a row.
    pub available_width: Option<f64>,
}

impl Props {
    /// Props for the `index`th of `sibling_count` siblings.
    pub fn new(index: usize, sibling_count: usize, non_raw_sibling_count: usize) -> Props {
        Props {
            index,
            is_first: index == 0,
            is_last: index + 1 == sibling_count,
            sibling_count,
            non_raw_sibling_count,
            available_width: None,
        }
    }

    /// The same position, limited to `width` pixels of the row.
    pub fn with_available_width(mut self, width: f64) -> Props {
        self.available_width = Some(width);
        self
    }
}

/// A body component instance: the resolved attributes of one node, its
/// built children, and the context it was placed in.
pub struct Element {
    kind: &'static dyn BodyComponent,
    /// Attributes after applying defaults and `mj-attributes`.
    pub attributes: Attributes,
    /// Position among siblings.
    pub props: Props,
    /// Child elements (empty for ending tags).
    pub children: Vec<Element>,
    /// Text content.
    pub content: String,
    /// The context this element was given by its parent.
    pub context: Context,
}

impl Element {
    /// Create an element with no children.
    pub fn new(
        kind: &'static dyn BodyComponent,
        attributes: Attributes,
        props: Props,
        content: String,
        context: Context,
    ) -> Element {
        Element {
            kind,
            attributes,
            props,
            children: Vec::new(),
            content,
            context,
        }
    }

    /// Attach built children.
    pub fn with_children(mut self, children: Vec<Element>) -> Element {
        self.children = children;
        self
    }

    /// The tag name of the component.
    pub fn tag_name(&self) -> &'static str {
        self.kind.tag_name()
    }

    /// True if this is a raw element.
    pub fn is_raw(&self) -> bool {
        self.kind.is_raw_element()
    }

    /// A non-empty attribute value.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .get(name)
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    /// The overrides this element makes for its children.
    pub fn child_context(&self) -> ContextOverrides {
        self.kind
            .child_context(&self.attributes, &self.props, &self.context)
    }

    /// The style table of the element.  Font families used by it are
    /// recorded in the global data.
    pub fn styles(&self) -> Styles {
        let styles = self.kind.styles(self);
        let mut global = self.context.global_mut();
        for (_, style) in styles.iter() {
            if let Some(families) = style.get("font-family") {
                for family in css::parser::font_families(families) {
                    global.record_font_usage(&family);
                }
            }
        }
        styles
    }

    /// One named style of the element.
    pub fn style(&self, name: &str) -> Style {
        self.styles().get(name)
    }

    /// Render the element.
    pub fn render(&self) -> String {
        render_trace!("render <{}>", self.tag_name());
        self.kind.render(self)
    }

    /// Render the children, letting `wrap` surround each non-raw child.
    /// Raw children are always spliced in verbatim.
    pub fn render_children<F>(&self, mut wrap: F) -> String
    where
        F: FnMut(&Element) -> String,
    {
        let mut out = String::new();
        for child in &self.children {
            if child.is_raw() {
                out.push_str(&child.render());
            } else {
                out.push_str(&wrap(child));
            }
        }
        out
    }

    /// One side of a shorthand attribute family such as `padding`.
    pub fn shorthand(&self, name: &str, side: Side) -> f64 {
        css::shorthand_side(&self.attributes, name, side)
    }

    /// The element's box within its container.
    pub fn box_widths(&self) -> BoxWidths {
        BoxWidths::compute(&self.attributes, self.context.container_width)
    }
}

impl fmt::Debug for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("tag", &self.tag_name())
            .field("attributes", &self.attributes)
            .field("props", &self.props)
            .field("children", &self.children)
            .finish()
    }
}

/// What a registered tag is handled by.
#[derive(Copy, Clone)]
pub enum ComponentKind {
    /// A tag valid in `mj-head`.
    Head(&'static dyn HeadComponent),
    /// A tag valid in `mj-body`.
    Body(&'static dyn BodyComponent),
}

impl ComponentKind {
    /// True if the tag's content is opaque.
    pub fn is_ending_tag(&self) -> bool {
        match self {
            ComponentKind::Head(h) => h.is_ending_tag(),
            ComponentKind::Body(b) => b.is_ending_tag(),
        }
    }
}

/// Maps tag names to the components handling them.
#[derive(Clone)]
pub struct Registry {
    components: HashMap<String, ComponentKind>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Registry {
        Registry {
            components: HashMap::new(),
        }
    }

    /// Register (or replace) the component for `tag_name`.
    pub fn register(&mut self, tag_name: &str, kind: ComponentKind) {
        self.components.insert(tag_name.to_string(), kind);
    }

    /// Register a body component under its own tag name.
    pub fn register_body(&mut self, component: &'static dyn BodyComponent) {
        self.register(component.tag_name(), ComponentKind::Body(component));
    }

    /// Register a head component under its own tag name.
    pub fn register_head(&mut self, component: &'static dyn HeadComponent) {
        self.register(component.tag_name(), ComponentKind::Head(component));
    }

    /// Look up a tag.
    pub fn get(&self, tag_name: &str) -> Option<ComponentKind> {
        self.components.get(tag_name).copied()
    }

    /// Look up a body component.
    pub fn body(&self, tag_name: &str) -> Option<&'static dyn BodyComponent> {
        match self.get(tag_name) {
            Some(ComponentKind::Body(b)) => Some(b),
            _ => None,
        }
    }

    /// Look up a head component.
    pub fn head(&self, tag_name: &str) -> Option<&'static dyn HeadComponent> {
        match self.get(tag_name) {
            Some(ComponentKind::Head(h)) => Some(h),
            _ => None,
        }
    }

    /// True if `tag_name` is registered with opaque content.
    pub fn is_ending_tag(&self, tag_name: &str) -> bool {
        self.get(tag_name).map_or(false, |k| k.is_ending_tag())
    }
}

impl Default for Registry {
    /// A registry with every built-in component.
    fn default() -> Registry {
        let mut registry = Registry::new();
        for component in head::COMPONENTS {
            registry.register_head(*component);
        }
        for component in layout::COMPONENTS
            .iter()
            .chain(content::COMPONENTS)
            .chain(navbar::COMPONENTS)
        {
            registry.register_body(*component);
        }
        registry
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<_> = self.components.keys().collect();
        tags.sort();
        f.debug_struct("Registry").field("tags", &tags).finish()
    }
}

/// The classes an element selects from `mj-attributes`: its `mj-class`
/// list, plus any `css-class` names which are also declared classes.
pub fn selected_classes(node: &Node, head: &HeadAttributes) -> Vec<String> {
    let mut classes: Vec<String> = node
        .attribute("mj-class")
        .map(|v| v.split_whitespace().map(str::to_string).collect())
        .unwrap_or_default();
    if let Some(css_class) = node.attribute("css-class") {
        for name in css_class.split_whitespace() {
            if head.classes.contains_key(name) && !classes.iter().any(|c| c == name) {
                classes.push(name.to_string());
            }
        }
    }
    classes
}

/// Resolve the attributes of `node`, from lowest to highest precedence:
/// component defaults, `mj-all`, the parent's inherited bundle, per-tag
/// defaults, selected classes, nested class defaults of the ancestors'
/// classes, and finally the node's own attributes.
pub fn resolve_attributes(
    component: &dyn BodyComponent,
    node: &Node,
    context: &Context,
) -> Attributes {
    let head = &context.head_attributes;
    let mut attributes: Attributes = component
        .default_attributes()
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    attributes.extend(head.all.clone());
    attributes.extend(context.inherited_attributes.clone());
    if let Some(defaults) = head.tags.get(&node.tag_name) {
        attributes.extend(defaults.clone());
    }

    let mut from_classes = Attributes::new();
    for name in selected_classes(node, head) {
        if let Some(class) = head.classes.get(&name) {
            for (key, value) in &class.attributes {
                let value = match (key.as_str(), from_classes.get(key)) {
                    ("css-class", Some(previous)) => format!("{} {}", previous, value),
                    _ => value.clone(),
                };
                from_classes.insert(key.clone(), value);
            }
        }
    }
    attributes.extend(from_classes);

    for name in &context.inherited_classes {
        if let Some(defaults) = head
            .classes
            .get(name)
            .and_then(|class| class.defaults.get(&node.tag_name))
        {
            attributes.extend(defaults.clone());
        }
    }

    for (key, value) in &node.attributes {
        if key != "mj-class" {
            attributes.insert(key.clone(), value.clone());
        }
    }
    attributes
}

/// Builder for the attribute list of an HTML start tag.  Formats with a
/// leading space per attribute so it can follow the tag name directly.
#[derive(Debug, Clone, Default)]
pub struct HtmlAttrs(Vec<(&'static str, String)>);

impl HtmlAttrs {
    /// An empty list.
    pub fn new() -> HtmlAttrs {
        HtmlAttrs(Vec::new())
    }

    /// Add an attribute.
    pub fn set(mut self, name: &'static str, value: impl fmt::Display) -> HtmlAttrs {
        self.0.push((name, value.to_string()));
        self
    }

    /// Add an attribute if a non-empty value is present.
    pub fn opt<S: AsRef<str>>(self, name: &'static str, value: Option<S>) -> HtmlAttrs {
        match value {
            Some(v) if !v.as_ref().is_empty() => self.set(name, v.as_ref()),
            _ => self,
        }
    }

    /// Add a `style` attribute unless the style is empty.
    pub fn style(self, style: &Style) -> HtmlAttrs {
        if style.is_empty() {
            self
        } else {
            self.set("style", style)
        }
    }
}

impl fmt::Display for HtmlAttrs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (name, value) in &self.0 {
            write!(f, " {}=\"{}\"", name, value.replace('"', "&quot;"))?;
        }
        Ok(())
    }
}

/// Wrap markup in an Outlook / IE conditional comment.
pub fn conditional_tag(content: &str) -> String {
    format!("<!--[if mso | IE]>{}<![endif]-->", content)
}

/// Add `-<suffix>` to every class in a class list.
pub fn suffix_css_classes(classes: Option<&str>, suffix: &str) -> Option<String> {
    let classes = classes?;
    let suffixed: Vec<String> = classes
        .split_whitespace()
        .map(|c| format!("{}-{}", c, suffix))
        .collect();
    if suffixed.is_empty() {
        None
    } else {
        Some(suffixed.join(" "))
    }
}

/// Escape text for use in HTML content or attribute values.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Escape text for HTML content.  Character references already in the
/// text, such as `&amp;` or `&#169;`, are kept as they are.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for (i, c) in text.char_indices() {
        match c {
            '&' if css::parser::starts_with_entity(&text[i..]) => out.push('&'),
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Sample;
    impl BodyComponent for Sample {
        fn tag_name(&self) -> &'static str {
            "mj-sample"
        }
        fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
            &[("color", "black"), ("padding", "1px")]
        }
        fn render(&self, _element: &Element) -> String {
            String::new()
        }
    }
    static SAMPLE: Sample = Sample;

    fn head() -> HeadAttributes {
        let mut head = HeadAttributes::default();
        head.all.insert("color".into(), "all".into());
        head.all.insert("font-size".into(), "all".into());
        head.tags.insert(
            "mj-sample".into(),
            [("color".to_string(), "tag".to_string())].into_iter().collect(),
        );
        let mut class = MjClass::default();
        class.attributes.insert("padding".into(), "class".into());
        class.attributes.insert("css-class".into(), "one".into());
        class.defaults.insert(
            "mj-sample".into(),
            [("align".to_string(), "nested".to_string())].into_iter().collect(),
        );
        head.classes.insert("a".into(), class);
        let mut other = MjClass::default();
        other.attributes.insert("css-class".into(), "two".into());
        head.classes.insert("b".into(), other);
        head
    }

    #[test]
    fn test_attribute_precedence() {
        let mut context = Context::new(600, 480);
        context.head_attributes = std::rc::Rc::new(head());
        let node = Node::new("mj-sample").with_attribute("mj-class", "a b");
        let attrs = resolve_attributes(&SAMPLE, &node, &context);
        assert_eq!(attrs["color"], "tag");
        assert_eq!(attrs["font-size"], "all");
        assert_eq!(attrs["padding"], "class");
        assert_eq!(attrs["css-class"], "one two");
        assert!(!attrs.contains_key("mj-class"));
        assert!(!attrs.contains_key("align"));

        // Nested defaults come from the ancestors' classes.
        context.inherited_classes = vec!["a".into()];
        let node = Node::new("mj-sample");
        let attrs = resolve_attributes(&SAMPLE, &node, &context);
        assert_eq!(attrs["align"], "nested");
        let node = Node::new("mj-sample").with_attribute("align", "left");
        let attrs = resolve_attributes(&SAMPLE, &node, &context);
        assert_eq!(attrs["align"], "left");
    }

    #[test]
    fn test_registry() {
        let mut registry = Registry::new();
        assert!(registry.get("mj-sample").is_none());
        registry.register_body(&SAMPLE);
        assert!(registry.body("mj-sample").is_some());
        assert!(registry.head("mj-sample").is_none());

        let registry = Registry::default();
        assert!(registry.body("mj-column").is_some());
        assert!(registry.head("mj-font").is_some());
        assert!(registry.is_ending_tag("mj-text"));
        assert!(!registry.is_ending_tag("mj-section"));
        assert!(registry.get("mj-unknown").is_none());
    }

    #[test]
    fn test_html_helpers() {
        let attrs = HtmlAttrs::new()
            .set("border", 0)
            .opt("class", None::<&str>)
            .opt("title", Some("a \"b\""))
            .style(&Style::new());
        assert_eq!(attrs.to_string(), " border=\"0\" title=\"a &quot;b&quot;\"");
        assert_eq!(
            suffix_css_classes(Some("a b"), "outlook").as_deref(),
            Some("a-outlook b-outlook")
        );
        assert_eq!(suffix_css_classes(Some(" "), "outlook"), None);
        assert_eq!(escape_html("<a & b>"), "&lt;a &amp; b&gt;");
    }

    #[test]
    fn test_escape_text_keeps_references() {
        assert_eq!(escape_text("Tom &amp; Jerry & co"), "Tom &amp; Jerry &amp; co");
        assert_eq!(escape_text("&#169; <b>"), "&#169; &lt;b&gt;");
        assert_eq!(escape_text("a &b c"), "a &amp;b c");
    }

    #[test]
    fn test_child_context_ignores_children() {
        let context = Context::new(600, 480);
        let attributes: Attributes = [
            ("width".to_string(), "50%".to_string()),
            ("padding".to_string(), "0 20px".to_string()),
        ]
        .into_iter()
        .collect();
        let props = Props::new(0, 2, 2).with_available_width(600.0);
        let column = Element::new(
            &layout::Column,
            attributes.clone(),
            props,
            String::new(),
            context.clone(),
        );
        let before = context.derive_child(column.child_context());
        assert_eq!(before.container_width, 260);

        let text = Element::new(
            &content::Text,
            Attributes::new(),
            Props::new(0, 1, 1),
            "x".into(),
            before.clone(),
        );
        let column = column.with_children(vec![text]);
        let after = context.derive_child(column.child_context());
        assert_eq!(after.container_width, before.container_width);
        assert_eq!(after.inherited_attributes, before.inherited_attributes);

        let group = Element::new(&layout::Group, attributes, props, String::new(), context.clone());
        let before = context.derive_child(group.child_context());
        let group = group.with_children(vec![Element::new(
            &layout::Column,
            Attributes::new(),
            Props::new(0, 1, 1),
            String::new(),
            before.clone(),
        )]);
        let after = context.derive_child(group.child_context());
        assert_eq!(after.container_width, before.container_width);
        assert_eq!(after.inherited_attributes, before.inherited_attributes);
        assert!(after.inherited_attributes.contains_key(layout::MOBILE_WIDTH));
    }
}
