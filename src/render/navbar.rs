//! `mj-navbar` and its links, with the optional mobile hamburger menu.

use super::{
    conditional_tag, suffix_css_classes, BodyComponent, Context, ContextOverrides, Element,
    HtmlAttrs, Props,
};
use crate::css::{Style, Styles};
use crate::Attributes;

/// Every built-in navigation component.
pub const COMPONENTS: &[&dyn BodyComponent] = &[&Navbar, &NavbarLink];

/// The type tag under which `mj-navbar` publishes its base URL.
pub const NAVBAR_DATA: &str = "mj-navbar";

/// Prefix for the relative `href`s of a navbar's links.
#[derive(Debug, Clone, PartialEq)]
pub struct NavbarBaseUrl(pub String);

/// The head style key for the hamburger menu rules.
pub const NAVBAR_HEAD_STYLE: &str = "mj-navbar";

/// `mj-navbar`: a row of links, collapsible into a menu on mobile.
#[derive(Debug)]
pub struct Navbar;

impl Navbar {
    fn head_style(breakpoint: u32) -> String {
        format!(
            r#"noinput.mj-menu-checkbox {{ display:block!important; max-height:none!important; visibility:visible!important; }}
@media only screen and (max-width:{}px) {{
  .mj-menu-checkbox[type="checkbox"] ~ .mj-inline-links {{ display:none!important; }}
  .mj-menu-checkbox[type="checkbox"]:checked ~ .mj-inline-links,
  .mj-menu-checkbox[type="checkbox"] ~ .mj-menu-trigger {{ display:block!important; max-width:none!important; max-height:none!important; font-size:inherit!important; }}
  .mj-menu-checkbox[type="checkbox"] ~ .mj-inline-links > a {{ display:block!important; }}
  .mj-menu-checkbox[type="checkbox"]:checked ~ .mj-menu-trigger .mj-menu-icon-close {{ display:block!important; }}
  .mj-menu-checkbox[type="checkbox"]:checked ~ .mj-menu-trigger .mj-menu-icon-open {{ display:none!important; }}
}}
"#,
            breakpoint.saturating_sub(1)
        )
    }

    fn render_hamburger(element: &Element, styles: &Styles) -> String {
        let key = element.context.global_mut().unique_id("mj-menu");
        let checkbox = format!(
            "<!--[if !mso]><!--><input type=\"checkbox\" id=\"{}\" class=\"mj-menu-checkbox\" style=\"display:none !important; max-height:0; visibility:hidden;\" /><!--<![endif]-->",
            key
        );
        let label = HtmlAttrs::new()
            .set("for", &key)
            .set("class", "mj-menu-label")
            .style(&styles.get("label"))
            .opt("align", element.attribute("ico-align"));
        let trigger = styles.get("trigger");
        format!(
            "{}<div class=\"mj-menu-trigger\" style=\"display:none;max-height:0px;max-width:0px;font-size:0px;overflow:hidden;\"><label{}><span class=\"mj-menu-icon-open\"{}>{}</span><span class=\"mj-menu-icon-close\"{}>{}</span></label></div>",
            checkbox,
            label,
            HtmlAttrs::new().style(&trigger),
            element.attribute("ico-open").unwrap_or_default(),
            HtmlAttrs::new().style(&Style::new().set("display", "none").merged(&trigger)),
            element.attribute("ico-close").unwrap_or_default(),
        )
    }
}

impl BodyComponent for Navbar {
    fn tag_name(&self) -> &'static str {
        "mj-navbar"
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("align", "center"),
            ("ico-align", "center"),
            ("ico-open", "&#9776;"),
            ("ico-close", "&#8855;"),
            ("ico-color", "#000000"),
            ("ico-font-size", "30px"),
            ("ico-font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
            ("ico-text-transform", "uppercase"),
            ("ico-padding", "10px"),
            ("ico-text-decoration", "none"),
            ("ico-line-height", "30px"),
        ]
    }

    fn child_context(
        &self,
        attributes: &Attributes,
        _props: &Props,
        _context: &Context,
    ) -> ContextOverrides {
        match attributes.get("base-url").filter(|u| !u.is_empty()) {
            Some(url) => ContextOverrides::new().publish(NAVBAR_DATA, NavbarBaseUrl(url.clone())),
            None => ContextOverrides::new(),
        }
    }

    fn styles(&self, element: &Element) -> Styles {
        let label = Style::new()
            .set("display", "block")
            .set("cursor", "pointer")
            .set("mso-hide", "all")
            .set("-moz-user-select", "none")
            .set("user-select", "none")
            .opt("color", element.attribute("ico-color"))
            .opt("font-size", element.attribute("ico-font-size"))
            .opt("font-family", element.attribute("ico-font-family"))
            .opt("text-transform", element.attribute("ico-text-transform"))
            .opt("text-decoration", element.attribute("ico-text-decoration"))
            .opt("line-height", element.attribute("ico-line-height"))
            .opt("padding", element.attribute("ico-padding"))
            .opt("padding-top", element.attribute("ico-padding-top"))
            .opt("padding-right", element.attribute("ico-padding-right"))
            .opt("padding-bottom", element.attribute("ico-padding-bottom"))
            .opt("padding-left", element.attribute("ico-padding-left"));
        let trigger = Style::new()
            .opt("font-size", element.attribute("ico-font-size"))
            .opt("line-height", element.attribute("ico-line-height"));
        Styles::new()
            .with("label", label)
            .with("trigger", trigger)
            .with(
                "inlineLinks",
                Style::new().opt("text-align", element.attribute("align")),
            )
    }

    fn render(&self, element: &Element) -> String {
        let styles = element.styles();
        let hamburger = element.attribute("hamburger") == Some("hamburger");
        let menu = if hamburger {
            element.context.global_mut().add_head_style(
                NAVBAR_HEAD_STYLE,
                Navbar::head_style(element.context.breakpoint),
            );
            Navbar::render_hamburger(element, &styles)
        } else {
            String::new()
        };
        let table = HtmlAttrs::new()
            .opt("align", element.attribute("align"))
            .set("border", 0)
            .set("cellpadding", 0)
            .set("cellspacing", 0)
            .set("role", "presentation");
        format!(
            "{}<div class=\"mj-inline-links\"{}>{}{}{}</div>",
            menu,
            HtmlAttrs::new().style(&styles.get("inlineLinks")),
            conditional_tag(&format!("<table{}><tr>", table)),
            element.render_children(|child| child.render()),
            conditional_tag("</tr></table>")
        )
    }
}

/// `mj-navbar-link`: one link of a navbar.
#[derive(Debug)]
pub struct NavbarLink;

impl NavbarLink {
    /// The link target, prefixed with the navbar's base URL when one was
    /// given.
    fn href(element: &Element) -> Option<String> {
        let href = element.attribute("href")?;
        match element
            .context
            .read_component_data::<NavbarBaseUrl>(NAVBAR_DATA)
        {
            Some(NavbarBaseUrl(base)) => Some(format!("{}{}", base, href)),
            None => Some(href.to_string()),
        }
    }
}

impl BodyComponent for NavbarLink {
    fn tag_name(&self) -> &'static str {
        "mj-navbar-link"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[
            ("color", "#000000"),
            ("font-family", "Ubuntu, Helvetica, Arial, sans-serif"),
            ("font-size", "13px"),
            ("font-weight", "normal"),
            ("line-height", "22px"),
            ("padding", "15px 10px"),
            ("target", "_blank"),
            ("text-decoration", "none"),
            ("text-transform", "uppercase"),
        ]
    }

    fn styles(&self, element: &Element) -> Styles {
        let mut a = Style::new().set("display", "inline-block");
        for prop in [
            "color",
            "font-family",
            "font-size",
            "font-style",
            "font-weight",
            "letter-spacing",
            "line-height",
            "text-decoration",
            "text-transform",
        ] {
            a = a.opt(prop, element.attribute(prop));
        }
        let mut td = Style::new();
        for prop in [
            "padding",
            "padding-top",
            "padding-right",
            "padding-bottom",
            "padding-left",
        ] {
            a = a.opt(prop, element.attribute(prop));
            td = td.opt(prop, element.attribute(prop));
        }
        Styles::new().with("a", a).with("td", td)
    }

    fn render(&self, element: &Element) -> String {
        let styles = element.styles();
        let class = match element.attribute("css-class") {
            Some(extra) => format!("mj-link {}", extra),
            None => "mj-link".to_string(),
        };
        let link = HtmlAttrs::new()
            .set("class", class)
            .opt("href", NavbarLink::href(element))
            .opt("rel", element.attribute("rel"))
            .opt("target", element.attribute("target"))
            .opt("name", element.attribute("name"))
            .opt("title", element.attribute("title"))
            .style(&styles.get("a"));
        let td = HtmlAttrs::new()
            .opt(
                "class",
                suffix_css_classes(element.attribute("css-class"), "outlook"),
            )
            .style(&styles.get("td"));
        format!(
            "{}<a{}>{}</a>{}",
            conditional_tag(&format!("<td{}>", td)),
            link,
            element.content,
            conditional_tag("</td>")
        )
    }
}
