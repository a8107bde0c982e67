//! Layout components: the body, wrappers, sections, groups and columns.
//!
//! These are the components which divide the available width between
//! their children, using the box model in [`crate::css`].

use super::{
    conditional_tag, suffix_css_classes, BodyComponent, Context, ContextOverrides, Element,
    HtmlAttrs, Props,
};
use crate::css::{self, BoxWidths, LayoutWidth, Side, Style, Styles};
use crate::Attributes;

/// Every built-in layout component.
pub const COMPONENTS: &[&dyn BodyComponent] = &[&Body, &Wrapper, &Section, &Group, &Column];

/// The type tag under which `mj-wrapper` publishes its gap.
pub const WRAPPER_DATA: &str = "mj-wrapper";

/// Vertical space between the sections of a wrapper.
#[derive(Debug, Clone, PartialEq)]
pub struct WrapperGap(pub String);

/// Attribute handed by `mj-group` to its columns.
pub const MOBILE_WIDTH: &str = "mobile-width";

/// `mj-body`: the root of the rendered content.
#[derive(Debug)]
pub struct Body;

impl BodyComponent for Body {
    fn tag_name(&self) -> &'static str {
        "mj-body"
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        _props: &Props,
        context: &Context,
    ) -> ContextOverrides {
        let width = attributes
            .get("width")
            .and_then(|w| css::parse_px(w))
            .unwrap_or(context.container_width);
        ContextOverrides::new().container_width(width)
    }

    fn styles(&self, element: &Element) -> Styles {
        Styles::new().with(
            "div",
            Style::new().opt("background-color", element.attribute("background-color")),
        )
    }

    fn render(&self, element: &Element) -> String {
        let attrs = HtmlAttrs::new()
            .opt("class", element.attribute("css-class"))
            .style(&element.style("div"))
            .set("lang", &element.context.language)
            .set("dir", &element.context.direction);
        format!(
            "<div{}>{}</div>",
            attrs,
            element.render_children(|child| child.render())
        )
    }
}

const SECTION_DEFAULTS: &[(&str, &str)] = &[
    ("background-position", "top center"),
    ("background-repeat", "repeat"),
    ("background-size", "auto"),
    ("direction", "ltr"),
    ("padding", "20px 0"),
    ("text-align", "center"),
    ("text-padding", "4px 4px 4px 0"),
];

fn is_full_width(element: &Element) -> bool {
    element.attribute("full-width") == Some("full-width")
}

/// The content box of a section-like component is what its children get.
fn section_child_context(attributes: &Attributes, context: &Context) -> ContextOverrides {
    let boxes = BoxWidths::compute(attributes, context.container_width);
    ContextOverrides::new().container_width(boxes.content)
}

fn section_styles(element: &Element) -> Styles {
    let full_width = is_full_width(element);
    let background = |style: Style| {
        style
            .opt("background", element.attribute("background-color"))
            .opt("background-color", element.attribute("background-color"))
    };
    let radius = element.attribute("border-radius");

    let mut table_full = Style::new();
    let mut table = Style::new();
    let mut div = Style::new();
    if full_width {
        table_full = background(table_full);
    } else {
        table = background(table);
        div = background(div);
    }
    let mut div = div
        .set("margin", "0px auto")
        .opt("border-radius", radius)
        .set("max-width", format!("{}px", element.context.container_width));
    if !element.props.is_first {
        if let Some(WrapperGap(gap)) = element
            .context
            .read_component_data::<WrapperGap>(WRAPPER_DATA)
        {
            div = div.set("margin-top", gap.clone());
        }
    }

    let mut td = Style::new();
    for prop in [
        "border",
        "border-bottom",
        "border-left",
        "border-right",
        "border-top",
    ] {
        td = td.opt(prop, element.attribute(prop));
    }
    let td = td
        .opt("direction", element.attribute("direction"))
        .set("font-size", "0px")
        .opt("padding", element.attribute("padding"))
        .opt("padding-bottom", element.attribute("padding-bottom"))
        .opt("padding-left", element.attribute("padding-left"))
        .opt("padding-right", element.attribute("padding-right"))
        .opt("padding-top", element.attribute("padding-top"))
        .opt("text-align", element.attribute("text-align"));

    Styles::new()
        .with(
            "tableFullwidth",
            table_full.set("width", "100%").opt("border-radius", radius),
        )
        .with("table", table.set("width", "100%").opt("border-radius", radius))
        .with("td", td)
        .with("div", div)
}

fn render_before(element: &Element) -> String {
    let width = element.context.container_width;
    let table = HtmlAttrs::new()
        .set("align", "center")
        .set("border", 0)
        .set("cellpadding", 0)
        .set("cellspacing", 0)
        .opt(
            "class",
            suffix_css_classes(element.attribute("css-class"), "outlook"),
        )
        .set("role", "presentation")
        .style(&Style::new().set("width", format!("{}px", width)))
        .set("width", width)
        .opt("bgcolor", element.attribute("background-color"));
    conditional_tag(&format!(
        "<table{}><tr><td style=\"line-height:0px;font-size:0px;mso-line-height-rule:exactly;\">",
        table
    ))
}

fn render_after() -> String {
    conditional_tag("</td></tr></table>")
}

/// The common frame of sections and wrappers, around already wrapped
/// children.
fn render_section_frame(element: &Element, wrapped_children: String) -> String {
    let full_width = is_full_width(element);
    let styles = element.styles();
    let div = HtmlAttrs::new()
        .opt(
            "class",
            if full_width {
                None
            } else {
                element.attribute("css-class")
            },
        )
        .style(&styles.get("div"));
    let table = HtmlAttrs::new()
        .set("align", "center")
        .set("border", 0)
        .set("cellpadding", 0)
        .set("cellspacing", 0)
        .set("role", "presentation")
        .style(&styles.get("table"));
    let section = format!(
        "<div{}><table{}><tbody><tr><td{}>{}{}{}</td></tr></tbody></table></div>",
        div,
        table,
        HtmlAttrs::new().style(&styles.get("td")),
        conditional_tag("<table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\">"),
        wrapped_children,
        conditional_tag("</table>"),
    );

    if full_width {
        let outer = HtmlAttrs::new()
            .set("align", "center")
            .opt("class", element.attribute("css-class"))
            .set("role", "presentation")
            .style(&styles.get("tableFullwidth"));
        format!(
            "<table{}><tbody><tr><td>{}{}{}</td></tr></tbody></table>",
            outer,
            render_before(element),
            section,
            render_after()
        )
    } else {
        format!("{}{}{}", render_before(element), section, render_after())
    }
}

/// `mj-section`: a row of columns.
#[derive(Debug)]
pub struct Section;

impl BodyComponent for Section {
    fn tag_name(&self) -> &'static str {
        "mj-section"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        SECTION_DEFAULTS
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        _props: &Props,
        context: &Context,
    ) -> ContextOverrides {
        section_child_context(attributes, context)
    }

    fn styles(&self, element: &Element) -> Styles {
        section_styles(element)
    }

    fn render(&self, element: &Element) -> String {
        let children = element.render_children(|child| {
            let td = HtmlAttrs::new()
                .opt("align", child.attribute("align"))
                .opt(
                    "class",
                    suffix_css_classes(child.attribute("css-class"), "outlook"),
                )
                .style(&child.style("tdOutlook"));
            format!(
                "{}{}{}",
                conditional_tag(&format!("<td{}>", td)),
                child.render(),
                conditional_tag("</td>")
            )
        });
        let wrapped = format!(
            "{}{}{}",
            conditional_tag("<tr>"),
            children,
            conditional_tag("</tr>")
        );
        render_section_frame(element, wrapped)
    }
}

/// `mj-wrapper`: a section whose children are sections, optionally
/// separated by a `gap`.
#[derive(Debug)]
pub struct Wrapper;

impl BodyComponent for Wrapper {
    fn tag_name(&self) -> &'static str {
        "mj-wrapper"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        SECTION_DEFAULTS
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        _props: &Props,
        context: &Context,
    ) -> ContextOverrides {
        let overrides = section_child_context(attributes, context);
        match attributes.get("gap").filter(|g| !g.is_empty()) {
            Some(gap) => overrides.publish(WRAPPER_DATA, WrapperGap(gap.clone())),
            None => overrides,
        }
    }

    fn styles(&self, element: &Element) -> Styles {
        section_styles(element)
    }

    fn render(&self, element: &Element) -> String {
        let width = element.context.container_width;
        let wrapped = element.render_children(|child| {
            let td = HtmlAttrs::new()
                .opt(
                    "class",
                    suffix_css_classes(child.attribute("css-class"), "outlook"),
                )
                .set("width", format!("{}px", width));
            format!(
                "{}{}{}",
                conditional_tag(&format!("<tr><td{}>", td)),
                child.render(),
                conditional_tag("</td></tr>")
            )
        });
        render_section_frame(element, wrapped)
    }
}

fn layout_width(attributes: &Attributes, props: &Props, context: &Context) -> LayoutWidth {
    let width = LayoutWidth::resolve(
        attributes.get("width").map(String::as_str),
        context.container_width,
        props.non_raw_sibling_count,
    );
    match props.available_width {
        Some(available) => width.within(available),
        None => width,
    }
}

fn element_layout_width(element: &Element) -> LayoutWidth {
    layout_width(&element.attributes, &element.props, &element.context)
}

/// Register the responsive rule for an element's width and return the
/// class list of its outer `div`, with `fixes` before the user's classes.
fn column_classes(element: &Element, fixes: &[&str]) -> String {
    let width = element_layout_width(element);
    let class_name = width.class_name();
    element
        .context
        .global_mut()
        .add_media_query(&class_name, &width.declared);
    let mut classes = vec![class_name.as_str()];
    classes.extend_from_slice(fixes);
    classes.extend(element.attribute("css-class"));
    classes.join(" ")
}

fn width_as_pixels(element: &Element) -> String {
    format!("{}px", css::format_number(element_layout_width(element).outer_px()))
}

/// `mj-group`: columns which stay side by side on mobile.
#[derive(Debug)]
pub struct Group;

impl BodyComponent for Group {
    fn tag_name(&self) -> &'static str {
        "mj-group"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("direction", "ltr")]
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        props: &Props,
        context: &Context,
    ) -> ContextOverrides {
        let paddings = css::shorthand_side(attributes, "padding", Side::Left)
            + css::shorthand_side(attributes, "padding", Side::Right);
        let width = layout_width(attributes, props, context).content_width(paddings);
        let mut bundle = Attributes::new();
        bundle.insert(MOBILE_WIDTH.to_string(), MOBILE_WIDTH.to_string());
        ContextOverrides::new()
            .container_width(width)
            .inherit_attributes(bundle)
    }

    fn styles(&self, element: &Element) -> Styles {
        Styles::new()
            .with(
                "div",
                Style::new()
                    .set("font-size", "0")
                    .set("line-height", "0")
                    .set("text-align", "left")
                    .set("display", "inline-block")
                    .set("width", "100%")
                    .opt("direction", element.attribute("direction"))
                    .opt("vertical-align", element.attribute("vertical-align"))
                    .opt("background-color", element.attribute("background-color")),
            )
            .with(
                "tdOutlook",
                Style::new()
                    .opt("vertical-align", element.attribute("vertical-align"))
                    .set("width", width_as_pixels(element)),
            )
    }

    fn render(&self, element: &Element) -> String {
        let classes = column_classes(element, &["mj-outlook-group-fix"]);
        let table = HtmlAttrs::new()
            .opt("bgcolor", element.attribute("background-color"))
            .set("border", 0)
            .set("cellpadding", 0)
            .set("cellspacing", 0)
            .set("role", "presentation");
        let children = element.render_children(|child| {
            let td = HtmlAttrs::new().style(&child.style("tdOutlook"));
            format!(
                "{}{}{}",
                conditional_tag(&format!("<td{}>", td)),
                child.render(),
                conditional_tag("</td>")
            )
        });
        format!(
            "<div{}>{}{}{}</div>",
            HtmlAttrs::new()
                .set("class", classes)
                .style(&element.style("div")),
            conditional_tag(&format!("<table{}><tr>", table)),
            children,
            conditional_tag("</tr></table>")
        )
    }
}

const GUTTER_ATTRIBUTES: &[&str] = &[
    "padding",
    "padding-bottom",
    "padding-left",
    "padding-right",
    "padding-top",
];

/// `mj-column`: a vertical stack of content blocks.
#[derive(Debug)]
pub struct Column;

impl Column {
    fn has_gutter(element: &Element) -> bool {
        GUTTER_ATTRIBUTES
            .iter()
            .any(|attr| element.attribute(attr).is_some())
    }

    fn render_column(element: &Element) -> String {
        let table = HtmlAttrs::new()
            .set("border", 0)
            .set("cellpadding", 0)
            .set("cellspacing", 0)
            .set("role", "presentation")
            .style(&element.style("table"))
            .set("width", "100%");
        let rows = element.render_children(|child| {
            let td = HtmlAttrs::new()
                .opt("align", child.attribute("align"))
                .opt("vertical-align", child.attribute("vertical-align"))
                .opt("class", child.attribute("css-class"))
                .style(
                    &Style::new()
                        .opt("background", child.attribute("container-background-color"))
                        .set("font-size", "0px")
                        .opt("padding", child.attribute("padding"))
                        .opt("padding-top", child.attribute("padding-top"))
                        .opt("padding-right", child.attribute("padding-right"))
                        .opt("padding-bottom", child.attribute("padding-bottom"))
                        .opt("padding-left", child.attribute("padding-left"))
                        .set("word-break", "break-word"),
                );
            format!("<tr><td{}>{}</td></tr>", td, child.render())
        });
        format!("<table{}><tbody>{}</tbody></table>", table, rows)
    }
}

impl BodyComponent for Column {
    fn tag_name(&self) -> &'static str {
        "mj-column"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("direction", "ltr"), ("vertical-align", "top")]
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        props: &Props,
        context: &Context,
    ) -> ContextOverrides {
        let boxes = BoxWidths::compute(attributes, context.container_width);
        let inner_borders = css::parser::border_width(
            attributes
                .get("inner-border-left")
                .or_else(|| attributes.get("inner-border"))
                .map_or("", String::as_str),
        ) + css::parser::border_width(
            attributes
                .get("inner-border-right")
                .or_else(|| attributes.get("inner-border"))
                .map_or("", String::as_str),
        );
        let deductions = boxes.paddings as f64 + boxes.borders as f64 + inner_borders;
        let width = layout_width(attributes, props, context).content_width(deductions);
        ContextOverrides::new().container_width(width)
    }

    fn styles(&self, element: &Element) -> Styles {
        let width = element_layout_width(element);
        let in_group = element.attribute(MOBILE_WIDTH).is_some();
        let borders = |style: Style, prefix: &str| {
            let mut style = style;
            for side in ["", "-bottom", "-left", "-right", "-top"] {
                let name = format!("{}border{}", prefix, side);
                let property: &'static str = match side {
                    "" => "border",
                    "-bottom" => "border-bottom",
                    "-left" => "border-left",
                    "-right" => "border-right",
                    _ => "border-top",
                };
                style = style.opt(property, element.attribute(&name));
            }
            style.opt("border-radius", element.attribute(&format!("{}border-radius", prefix)))
        };

        let table = if Column::has_gutter(element) {
            borders(
                Style::new().opt(
                    "background-color",
                    element.attribute("inner-background-color"),
                ),
                "inner-",
            )
        } else {
            borders(
                Style::new().opt("background-color", element.attribute("background-color")),
                "",
            )
            .opt("vertical-align", element.attribute("vertical-align"))
        };

        let mut gutter = borders(
            Style::new().opt("background-color", element.attribute("background-color")),
            "",
        )
        .opt("vertical-align", element.attribute("vertical-align"));
        for attr in GUTTER_ATTRIBUTES {
            let property: &'static str = attr;
            gutter = gutter.opt(property, element.attribute(attr));
        }

        Styles::new()
            .with(
                "div",
                Style::new()
                    .set("font-size", "0px")
                    .set("text-align", "left")
                    .opt("direction", element.attribute("direction"))
                    .set("display", "inline-block")
                    .opt("vertical-align", element.attribute("vertical-align"))
                    .set(
                        "width",
                        width.mobile_width(in_group, element.props.non_raw_sibling_count),
                    ),
            )
            .with("table", table)
            .with("gutter", gutter)
            .with(
                "tdOutlook",
                Style::new()
                    .opt("vertical-align", element.attribute("vertical-align"))
                    .set("width", width_as_pixels(element)),
            )
    }

    fn render(&self, element: &Element) -> String {
        let classes = column_classes(element, &["mj-outlook-group-fix"]);
        let inner = if Column::has_gutter(element) {
            format!(
                "<table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" width=\"100%\"><tbody><tr><td{}>{}</td></tr></tbody></table>",
                HtmlAttrs::new().style(&element.style("gutter")),
                Column::render_column(element)
            )
        } else {
            Column::render_column(element)
        };
        format!(
            "<div{}>{}</div>",
            HtmlAttrs::new()
                .set("class", classes)
                .style(&element.style("div")),
            inner
        )
    }
}
