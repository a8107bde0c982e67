//! The render context handed down the tree, and the document-wide data
//! shared between every context of one compile.

use std::any::Any;
use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::rc::Rc;

use crate::css::{self, CssLength};
use crate::Attributes;

/// Document-wide accumulator.  One instance exists per compile; every
/// context of that compile refers to the same one.
#[derive(Debug, Default)]
pub struct GlobalData {
    media_queries: Vec<(String, String)>,
    component_head_style: Vec<String>,
    head_style: Vec<(String, String)>,
    inline_style_rules: Vec<String>,
    html_attributes: Vec<(String, Attributes)>,
    used_font_names: BTreeSet<String>,
    errors: Vec<String>,
    next_id: usize,
}

impl GlobalData {
    /// Register the responsive width rule for `class_name`.  The first
    /// registration of a class wins; later ones are ignored.
    pub fn add_media_query(&mut self, class_name: &str, width: &CssLength) {
        if self.media_queries.iter().any(|(c, _)| c == class_name) {
            return;
        }
        self.media_queries
            .push((class_name.to_string(), css::media_query_rule(width)));
    }

    /// Append a block of head CSS.
    pub fn add_component_head_style(&mut self, css: impl Into<String>) {
        self.component_head_style.push(css.into());
    }

    /// Set the head CSS for `key`, keeping the position of the first
    /// registration.
    pub fn add_head_style(&mut self, key: &str, css: impl Into<String>) {
        let css = css.into();
        match self.head_style.iter_mut().find(|(k, _)| k == key) {
            Some(slot) => slot.1 = css,
            None => self.head_style.push((key.to_string(), css)),
        }
    }

    /// Append a CSS rule to be inlined into matching elements.
    pub fn add_inline_style_rule(&mut self, css: impl Into<String>) {
        self.inline_style_rules.push(css.into());
    }

    /// Merge attributes to be applied to every element matching `selector`.
    pub fn add_html_attributes(&mut self, selector: &str, attributes: Attributes) {
        match self.html_attributes.iter_mut().find(|(s, _)| s == selector) {
            Some((_, existing)) => existing.extend(attributes),
            None => self
                .html_attributes
                .push((selector.to_string(), attributes)),
        }
    }

    /// Note that some rendered element uses the font family `name`.
    pub fn record_font_usage(&mut self, name: &str) {
        self.used_font_names.insert(name.to_string());
    }

    /// Record a non-fatal error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{}", message);
        self.errors.push(message);
    }

    /// A document-unique identifier starting with `prefix`.
    pub fn unique_id(&mut self, prefix: &str) -> String {
        self.next_id += 1;
        format!("{}-{}", prefix, self.next_id)
    }

    /// The responsive rules, as `(class name, CSS block)` in registration
    /// order.
    pub fn media_queries(&self) -> &[(String, String)] {
        &self.media_queries
    }

    /// Appended head CSS blocks.
    pub fn component_head_style(&self) -> &[String] {
        &self.component_head_style
    }

    /// Keyed head CSS blocks.
    pub fn head_style(&self) -> &[(String, String)] {
        &self.head_style
    }

    /// Rules for the CSS inliner.
    pub fn inline_style_rules(&self) -> &[String] {
        &self.inline_style_rules
    }

    /// Attributes to apply per selector.
    pub fn html_attributes(&self) -> &[(String, Attributes)] {
        &self.html_attributes
    }

    /// True if `name` has been used by a rendered element.
    pub fn is_font_used(&self, name: &str) -> bool {
        self.used_font_names.contains(name)
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub(crate) fn into_parts(self) -> (Vec<String>, Vec<String>, Vec<(String, Attributes)>) {
        (self.errors, self.inline_style_rules, self.html_attributes)
    }
}

/// A class declared with `mj-class` in `mj-attributes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MjClass {
    /// Attributes applied to any element using the class.
    pub attributes: Attributes,
    /// Per-tag defaults applied to descendants of an element using the
    /// class.
    pub defaults: BTreeMap<String, Attributes>,
}

/// The attribute defaults collected from `mj-attributes`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadAttributes {
    /// Defaults for every tag (`mj-all`).
    pub all: Attributes,
    /// Defaults per tag name.
    pub tags: BTreeMap<String, Attributes>,
    /// Named classes.
    pub classes: BTreeMap<String, MjClass>,
}

/// The fields a component may change for its children.
#[derive(Default)]
pub struct ContextOverrides {
    /// Narrowed width available to the children.
    pub container_width: Option<u32>,
    /// Data published for descendants, keyed by the publishing tag.
    pub component_data: Vec<(&'static str, Rc<dyn Any>)>,
    /// Attribute defaults for the direct children only.
    pub inherited_attributes: Option<Attributes>,
}

impl ContextOverrides {
    /// No overrides.
    pub fn new() -> ContextOverrides {
        Default::default()
    }

    /// Narrow the container width.
    pub fn container_width(mut self, width: u32) -> ContextOverrides {
        self.container_width = Some(width);
        self
    }

    /// Publish `data` under `type_tag` for descendants.
    pub fn publish<T: Any>(mut self, type_tag: &'static str, data: T) -> ContextOverrides {
        self.component_data.push((type_tag, Rc::new(data)));
        self
    }

    /// Hand attribute defaults to the direct children.
    pub fn inherit_attributes(mut self, attributes: Attributes) -> ContextOverrides {
        self.inherited_attributes = Some(attributes);
        self
    }
}

impl fmt::Debug for ContextOverrides {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContextOverrides")
            .field("container_width", &self.container_width)
            .field(
                "component_data",
                &self.component_data.iter().map(|(k, _)| *k).collect::<Vec<_>>(),
            )
            .field("inherited_attributes", &self.inherited_attributes)
            .finish()
    }
}

/// Everything a component knows about its position in the document which
/// it did not author itself.
#[derive(Clone)]
pub struct Context {
    /// Document title (unescaped).
    pub title: String,
    /// Preview text (unescaped).
    pub preview: String,
    /// `lang` of the document.
    pub language: String,
    /// `dir` of the document.
    pub direction: String,
    /// Width in pixels available to the component.
    pub container_width: u32,
    /// Width in pixels below which the layout stacks.
    pub breakpoint: u32,
    /// Body background colour.
    pub background_color: Option<String>,
    /// Declared fonts, name to stylesheet URL, in declaration order.
    pub fonts: Vec<(String, String)>,
    /// Extra head CSS supplied through configuration.
    pub custom_styles: Vec<String>,
    /// Defaults from `mj-attributes`.
    pub head_attributes: Rc<HeadAttributes>,
    /// The `mj-class` list of the closest ancestor which set one.
    pub inherited_classes: Vec<String>,
    /// Attribute defaults handed down by the parent.
    pub inherited_attributes: Attributes,
    component_data: BTreeMap<&'static str, Rc<dyn Any>>,
    global: Rc<RefCell<GlobalData>>,
}

impl Context {
    /// A fresh top-level context with its own `GlobalData`.
    pub fn new(container_width: u32, breakpoint: u32) -> Context {
        Context {
            title: String::new(),
            preview: String::new(),
            language: "und".into(),
            direction: "auto".into(),
            container_width: container_width.max(1),
            breakpoint,
            background_color: None,
            fonts: Vec::new(),
            custom_styles: Vec::new(),
            head_attributes: Rc::new(HeadAttributes::default()),
            inherited_classes: Vec::new(),
            inherited_attributes: Attributes::new(),
            component_data: BTreeMap::new(),
            global: Rc::new(RefCell::new(GlobalData::default())),
        }
    }

    /// Make the context for a component's children.  Scoped fields are
    /// copied and overridden; the global data is shared.
    pub fn derive_child(&self, overrides: ContextOverrides) -> Context {
        let mut child = self.clone();
        if let Some(width) = overrides.container_width {
            child.container_width = width.min(self.container_width).max(1);
        }
        for (tag, data) in overrides.component_data {
            child.component_data.insert(tag, data);
        }
        child.inherited_attributes = overrides.inherited_attributes.unwrap_or_default();
        child
    }

    /// Data published by the closest ancestor of type `type_tag`, if it is
    /// of type `T`.
    pub fn read_component_data<T: Any>(&self, type_tag: &str) -> Option<&T> {
        self.component_data
            .get(type_tag)
            .and_then(|data| data.downcast_ref::<T>())
    }

    /// Add or replace a declared font.
    pub fn add_font(&mut self, name: &str, href: &str) {
        match self.fonts.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = href.to_string(),
            None => self.fonts.push((name.to_string(), href.to_string())),
        }
    }

    /// Mutable access to the document-wide data.
    pub fn global_mut(&self) -> RefMut<'_, GlobalData> {
        self.global.borrow_mut()
    }

    /// Read access to the document-wide data.
    pub fn global(&self) -> Ref<'_, GlobalData> {
        self.global.borrow()
    }

    /// True if both contexts belong to the same compile.
    pub fn shares_global_with(&self, other: &Context) -> bool {
        Rc::ptr_eq(&self.global, &other.global)
    }

    pub(crate) fn take_global(&self) -> GlobalData {
        std::mem::take(&mut *self.global.borrow_mut())
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("title", &self.title)
            .field("language", &self.language)
            .field("direction", &self.direction)
            .field("container_width", &self.container_width)
            .field("breakpoint", &self.breakpoint)
            .field("inherited_classes", &self.inherited_classes)
            .field(
                "component_data",
                &self.component_data.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}
