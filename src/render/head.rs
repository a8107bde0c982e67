//! Components valid inside `mj-head`.

use std::rc::Rc;

use super::{Context, HeadComponent, MjClass};
use crate::css::{self, parser::is_valid_selector};
use crate::{Attributes, Node};

/// Every built-in head component.
pub const COMPONENTS: &[&dyn HeadComponent] = &[
    &MjAttributes,
    &Breakpoint,
    &Font,
    &HtmlAttributes,
    &Preview,
    &Style,
    &Title,
];

/// `mj-breakpoint`: sets the width below which columns stack.
#[derive(Debug)]
pub struct Breakpoint;

impl HeadComponent for Breakpoint {
    fn tag_name(&self) -> &'static str {
        "mj-breakpoint"
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        if let Some(width) = node.attribute("width").and_then(css::parse_px) {
            context.breakpoint = width;
        }
    }
}

/// `mj-font`: declares a web font.  It is only linked from the document
/// if some rendered element uses it.
#[derive(Debug)]
pub struct Font;

impl HeadComponent for Font {
    fn tag_name(&self) -> &'static str {
        "mj-font"
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        if let (Some(name), Some(href)) = (node.attribute("name"), node.attribute("href")) {
            context.add_font(name, href);
        }
    }
}

/// `mj-preview`: the text shown by clients next to the subject.
#[derive(Debug)]
pub struct Preview;

impl HeadComponent for Preview {
    fn tag_name(&self) -> &'static str {
        "mj-preview"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        context.preview = node.content.clone();
    }
}

/// `mj-title`: the document `<title>`.
#[derive(Debug)]
pub struct Title;

impl HeadComponent for Title {
    fn tag_name(&self) -> &'static str {
        "mj-title"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        context.title = node.content.clone();
    }
}

/// `mj-style`: CSS for the document head, or for inlining when
/// `inline="inline"`.
#[derive(Debug)]
pub struct Style;

impl HeadComponent for Style {
    fn tag_name(&self) -> &'static str {
        "mj-style"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        let css = node.content.trim();
        if css.is_empty() {
            return;
        }
        let mut global = context.global_mut();
        if node.attribute("inline") == Some("inline") {
            global.add_inline_style_rule(css);
        } else {
            global.add_component_head_style(css);
        }
    }
}

/// `mj-attributes`: attribute defaults for every tag (`mj-all`), for
/// named classes (`mj-class`) and for individual tags.
#[derive(Debug)]
pub struct MjAttributes;

const ALL_TAGS: &str = "mj-all";
const CLASS: &str = "mj-class";

fn merge(target: &mut Attributes, source: &Attributes) {
    target.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
}

impl HeadComponent for MjAttributes {
    fn tag_name(&self) -> &'static str {
        "mj-attributes"
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        let head = Rc::make_mut(&mut context.head_attributes);
        for child in &node.children {
            match child.tag_name.as_str() {
                ALL_TAGS => merge(&mut head.all, &child.attributes),
                CLASS => {
                    let name = match child.attribute("name") {
                        Some(name) => name.to_string(),
                        None => {
                            render_trace!("mj-class without a name skipped");
                            continue;
                        }
                    };
                    let class = head.classes.entry(name).or_insert_with(MjClass::default);
                    for (key, value) in &child.attributes {
                        if key != "name" {
                            class.attributes.insert(key.clone(), value.clone());
                        }
                    }
                    for nested in &child.children {
                        merge(
                            class.defaults.entry(nested.tag_name.clone()).or_default(),
                            &nested.attributes,
                        );
                    }
                }
                tag => merge(
                    head.tags.entry(tag.to_string()).or_default(),
                    &child.attributes,
                ),
            }
        }
    }
}

/// `mj-html-attributes`: arbitrary HTML attributes to set on every
/// element of the output matching a selector.
#[derive(Debug)]
pub struct HtmlAttributes;

impl HeadComponent for HtmlAttributes {
    fn tag_name(&self) -> &'static str {
        "mj-html-attributes"
    }

    fn handle(&self, node: &Node, context: &mut Context) {
        for selector in node.children.iter().filter(|c| c.tag_name == "mj-selector") {
            let path = match selector.attribute("path") {
                Some(path) => path,
                None => continue,
            };
            if !is_valid_selector(path) {
                context.global_mut().add_error(format!(
                    "mj-selector has an invalid path \"{}\" in mj-html-attributes",
                    path
                ));
                continue;
            }
            let attributes: Attributes = selector
                .children
                .iter()
                .filter(|c| c.tag_name == "mj-html-attribute")
                .filter_map(|c| {
                    c.attribute("name")
                        .map(|name| (name.to_string(), c.content.clone()))
                })
                .collect();
            context.global_mut().add_html_attributes(path, attributes);
        }
    }
}
