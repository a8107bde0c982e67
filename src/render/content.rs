//! Content components: the blocks stacked inside a column.

use super::{conditional_tag, BodyComponent, Element, HtmlAttrs};
use crate::css::{self, CssLength, LengthUnit, Side, Style, Styles};

/// Every built-in content component.
pub const COMPONENTS: &[&dyn BodyComponent] = &[&Text, &Raw, &Spacer, &Divider, &Image, &Button];

const DEFAULT_FONT_FAMILY: &str = "Ubuntu, Helvetica, Arial, sans-serif";

/// `mj-text`: a block of HTML text.
#[derive(Debug)]
pub struct Text;

impl BodyComponent for Text {
    fn tag_name(&self) -> &'static str {
        "mj-text"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "left"),
            ("color", "#000000"),
            ("font-family", DEFAULT_FONT_FAMILY),
            ("font-size", "13px"),
            ("line-height", "1"),
            ("padding", "10px 25px"),
        ]
    }

    fn styles(&self, element: &Element) -> Styles {
        let mut text = Style::new();
        for (property, attribute) in [
            ("font-family", "font-family"),
            ("font-size", "font-size"),
            ("font-style", "font-style"),
            ("font-weight", "font-weight"),
            ("letter-spacing", "letter-spacing"),
            ("line-height", "line-height"),
            ("text-align", "align"),
            ("text-decoration", "text-decoration"),
            ("text-transform", "text-transform"),
            ("color", "color"),
            ("height", "height"),
        ] {
            text = text.opt(property, element.attribute(attribute));
        }
        Styles::new().with("text", text)
    }

    fn render(&self, element: &Element) -> String {
        let div = format!(
            "<div{}>{}</div>",
            HtmlAttrs::new().style(&element.style("text")),
            element.content
        );
        match element.attribute("height") {
            Some(height) => format!(
                "{}{}{}",
                conditional_tag(&format!(
                    "<table role=\"presentation\" border=\"0\" cellpadding=\"0\" cellspacing=\"0\"><tr><td height=\"{}\" style=\"vertical-align:top;height:{};\">",
                    css::parse_px(height).unwrap_or(0),
                    height
                )),
                div,
                conditional_tag("</td></tr></table>")
            ),
            None => div,
        }
    }
}

/// `mj-raw`: markup passed through untouched.
#[derive(Debug)]
pub struct Raw;

impl BodyComponent for Raw {
    fn tag_name(&self) -> &'static str {
        "mj-raw"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn is_raw_element(&self) -> bool {
        true
    }

    fn render(&self, element: &Element) -> String {
        element.content.clone()
    }
}

/// `mj-spacer`: vertical blank space.
#[derive(Debug)]
pub struct Spacer;

impl BodyComponent for Spacer {
    fn tag_name(&self) -> &'static str {
        "mj-spacer"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("height", "20px")]
    }

    fn styles(&self, element: &Element) -> Styles {
        let height = element.attribute("height");
        Styles::new().with(
            "div",
            Style::new()
                .opt("height", height)
                .opt("line-height", height),
        )
    }

    fn render(&self, element: &Element) -> String {
        format!(
            "<div{}>&#8202;</div>",
            HtmlAttrs::new().style(&element.style("div"))
        )
    }
}

/// `mj-divider`: a horizontal rule.
#[derive(Debug)]
pub struct Divider;

impl Divider {
    fn margin(element: &Element) -> &'static str {
        match element.attribute("align") {
            Some("left") => "0px",
            Some("right") => "0px 0px 0px auto",
            _ => "0px auto",
        }
    }

    /// The rule's width in pixels, for clients without percentage support.
    fn outlook_width(element: &Element) -> u32 {
        let content = element.box_widths().content;
        match element.attribute("width").and_then(CssLength::parse) {
            Some(CssLength {
                value,
                unit: LengthUnit::Percent,
            }) => (content as f64 * value / 100.0).max(0.0) as u32,
            Some(CssLength { value, .. }) => (value.max(0.0) as u32).min(content),
            None => content,
        }
    }
}

impl BodyComponent for Divider {
    fn tag_name(&self) -> &'static str {
        "mj-divider"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("border-color", "#000000"),
            ("border-style", "solid"),
            ("border-width", "4px"),
            ("padding", "10px 25px"),
            ("width", "100%"),
        ]
    }

    fn styles(&self, element: &Element) -> Styles {
        let border_top = ["border-style", "border-width", "border-color"]
            .iter()
            .filter_map(|attr| element.attribute(attr))
            .collect::<Vec<_>>()
            .join(" ");
        let p = Style::new()
            .set("border-top", border_top)
            .set("font-size", "1px")
            .set("margin", Divider::margin(element));
        let outlook = p
            .clone()
            .set("width", format!("{}px", Divider::outlook_width(element)));
        Styles::new()
            .with("p", p.opt("width", element.attribute("width")))
            .with("outlook", outlook)
    }

    fn render(&self, element: &Element) -> String {
        let styles = element.styles();
        let table = HtmlAttrs::new()
            .opt("align", element.attribute("align"))
            .set("border", 0)
            .set("cellpadding", 0)
            .set("cellspacing", 0)
            .style(&styles.get("outlook"))
            .set("role", "presentation")
            .set("width", format!("{}px", Divider::outlook_width(element)));
        format!(
            "<p{}></p>{}",
            HtmlAttrs::new().style(&styles.get("p")),
            conditional_tag(&format!(
                "<table{}><tr><td style=\"height:0;line-height:0;\"> &nbsp;\n</td></tr></table>",
                table
            ))
        )
    }
}

/// The head style key under which `mj-image` registers its mobile rules.
pub const IMAGE_HEAD_STYLE: &str = "mj-image";

const FULL_WIDTH_MOBILE: &str = "mj-full-width-mobile";

/// `mj-image`: a responsive image, optionally linked.
#[derive(Debug)]
pub struct Image;

impl Image {
    fn is_full_width(element: &Element) -> bool {
        element.attribute("full-width") == Some("full-width")
    }

    fn is_fluid_on_mobile(element: &Element) -> bool {
        element.attribute("fluid-on-mobile") == Some("true")
    }

    /// The image is as wide as its box, or narrower if asked.
    fn content_width(element: &Element) -> u32 {
        let available = element.box_widths().content;
        match element.attribute("width").and_then(css::parse_px) {
            Some(width) => width.min(available),
            None => available,
        }
    }

    fn head_style(breakpoint: u32) -> String {
        format!(
            "@media only screen and (max-width:{}px) {{\n  table.{cls} {{ width: 100% !important; }}\n  td.{cls} {{ width: auto !important; }}\n}}\n",
            breakpoint.saturating_sub(1),
            cls = FULL_WIDTH_MOBILE
        )
    }

    fn render_image(element: &Element, styles: &Styles) -> String {
        let height = match element.attribute("height") {
            Some("auto") | None => "auto".to_string(),
            Some(h) => css::parse_px(h).map_or_else(|| h.to_string(), |n| n.to_string()),
        };
        let img = HtmlAttrs::new()
            .set("alt", element.attribute("alt").unwrap_or(""))
            .set("height", height)
            .opt("src", element.attribute("src"))
            .opt("srcset", element.attribute("srcset"))
            .opt("sizes", element.attribute("sizes"))
            .style(&styles.get("img"))
            .opt("title", element.attribute("title"))
            .set("width", Image::content_width(element))
            .opt("usemap", element.attribute("usemap"));
        let img = format!("<img{} />", img);
        match element.attribute("href") {
            Some(href) => format!(
                "<a{}>{}</a>",
                HtmlAttrs::new()
                    .set("href", href)
                    .opt("target", element.attribute("target"))
                    .opt("rel", element.attribute("rel"))
                    .opt("name", element.attribute("name"))
                    .opt("title", element.attribute("title")),
                img
            ),
            None => img,
        }
    }
}

impl BodyComponent for Image {
    fn tag_name(&self) -> &'static str {
        "mj-image"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("border", "0"),
            ("height", "auto"),
            ("padding", "10px 25px"),
            ("target", "_blank"),
            ("font-size", "13px"),
        ]
    }

    fn styles(&self, element: &Element) -> Styles {
        let full_width = Image::is_full_width(element);
        let mut img = Style::new();
        for prop in [
            "border",
            "border-left",
            "border-right",
            "border-top",
            "border-bottom",
            "border-radius",
        ] {
            img = img.opt(prop, element.attribute(prop));
        }
        let img = img
            .set("display", "block")
            .set("outline", "none")
            .set("text-decoration", "none")
            .opt("height", element.attribute("height"))
            .opt("max-height", element.attribute("max-height"))
            .opt("min-width", full_width.then_some("100%"))
            .set("width", "100%")
            .opt("max-width", full_width.then_some("100%"))
            .opt("font-size", element.attribute("font-size"));

        let width = format!("{}px", Image::content_width(element));
        let td = Style::new().opt("width", (!full_width).then_some(width.as_str()));
        let table = if full_width {
            Style::new()
                .set("min-width", "100%")
                .set("max-width", "100%")
                .set("width", width.as_str())
        } else {
            Style::new()
        }
        .set("border-collapse", "collapse")
        .set("border-spacing", "0px");

        Styles::new()
            .with("img", img)
            .with("td", td)
            .with("table", table)
    }

    fn render(&self, element: &Element) -> String {
        element.context.global_mut().add_head_style(
            IMAGE_HEAD_STYLE,
            Image::head_style(element.context.breakpoint),
        );
        let styles = element.styles();
        let fluid = Image::is_fluid_on_mobile(element).then_some(FULL_WIDTH_MOBILE);
        format!(
            "<table{}><tbody><tr><td{}>{}</td></tr></tbody></table>",
            HtmlAttrs::new()
                .set("border", 0)
                .set("cellpadding", 0)
                .set("cellspacing", 0)
                .set("role", "presentation")
                .style(&styles.get("table"))
                .opt("class", fluid),
            HtmlAttrs::new().style(&styles.get("td")).opt("class", fluid),
            Image::render_image(element, &styles)
        )
    }
}

/// `mj-button`: a link styled as a button.
#[derive(Debug)]
pub struct Button;

impl Button {
    /// The anchor's own width: a pixel `width` less the inner padding and
    /// the borders.  Other widths are left to the table.
    fn anchor_width(element: &Element) -> Option<String> {
        let width = CssLength::parse(element.attribute("width")?)?;
        if width.unit != LengthUnit::Px {
            return None;
        }
        let paddings = element.shorthand("inner-padding", Side::Left)
            + element.shorthand("inner-padding", Side::Right);
        let borders = css::border_side(&element.attributes, Side::Left)
            + css::border_side(&element.attributes, Side::Right);
        let inner = (width.value - paddings - borders).max(0.0);
        Some(format!("{}px", css::format_number(inner.trunc())))
    }
}

impl BodyComponent for Button {
    fn tag_name(&self) -> &'static str {
        "mj-button"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("background-color", "#414141"),
            ("border", "none"),
            ("border-radius", "3px"),
            ("color", "#ffffff"),
            ("font-family", DEFAULT_FONT_FAMILY),
            ("font-size", "13px"),
            ("font-weight", "normal"),
            ("inner-padding", "10px 25px"),
            ("line-height", "120%"),
            ("padding", "10px 25px"),
            ("target", "_blank"),
            ("text-decoration", "none"),
            ("text-transform", "none"),
            ("vertical-align", "middle"),
        ]
    }

    fn styles(&self, element: &Element) -> Styles {
        let table = Style::new()
            .set("border-collapse", "separate")
            .opt("width", element.attribute("width"))
            .set("line-height", "100%");

        let mut td = Style::new();
        for prop in [
            "border",
            "border-bottom",
            "border-left",
            "border-radius",
            "border-right",
            "border-top",
        ] {
            td = td.opt(prop, element.attribute(prop));
        }
        let td = td
            .set("cursor", "auto")
            .opt("font-style", element.attribute("font-style"))
            .opt("height", element.attribute("height"))
            .opt("mso-padding-alt", element.attribute("inner-padding"))
            .opt("text-align", element.attribute("text-align"))
            .opt("background", element.attribute("background-color"));

        let content = Style::new()
            .set("display", "inline-block")
            .opt("width", Button::anchor_width(element))
            .opt("background", element.attribute("background-color"))
            .opt("color", element.attribute("color"))
            .opt("font-family", element.attribute("font-family"))
            .opt("font-size", element.attribute("font-size"))
            .opt("font-style", element.attribute("font-style"))
            .opt("font-weight", element.attribute("font-weight"))
            .opt("line-height", element.attribute("line-height"))
            .opt("letter-spacing", element.attribute("letter-spacing"))
            .set("margin", "0")
            .opt("text-decoration", element.attribute("text-decoration"))
            .opt("text-transform", element.attribute("text-transform"))
            .opt("padding", element.attribute("inner-padding"))
            .set("mso-padding-alt", "0px")
            .opt("border-radius", element.attribute("border-radius"));

        Styles::new()
            .with("table", table)
            .with("td", td)
            .with("content", content)
    }

    fn render(&self, element: &Element) -> String {
        let styles = element.styles();
        let href = element.attribute("href");
        let tag = if href.is_some() { "a" } else { "p" };
        let mut link = HtmlAttrs::new()
            .opt("href", href)
            .opt("rel", element.attribute("rel"))
            .opt("name", element.attribute("name"))
            .opt("title", element.attribute("title"))
            .style(&styles.get("content"));
        if href.is_some() {
            link = link.opt("target", element.attribute("target"));
        }
        let td = HtmlAttrs::new()
            .set("align", "center")
            .opt("bgcolor", element.attribute("background-color"))
            .set("role", "presentation")
            .style(&styles.get("td"))
            .opt("valign", element.attribute("vertical-align"));
        format!(
            "<table{}><tbody><tr><td{}><{tag}{}>{}</{tag}></td></tr></tbody></table>",
            HtmlAttrs::new()
                .set("border", 0)
                .set("cellpadding", 0)
                .set("cellspacing", 0)
                .set("role", "presentation")
                .style(&styles.get("table")),
            td,
            link,
            element.content,
            tag = tag
        )
    }
}
