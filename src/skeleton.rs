//! Assembly of the final HTML document around the rendered body.

use std::fmt::Write;

use crate::render::{escape_html, escape_text, Context, GlobalData};

const RESET_CSS: &str = "<style type=\"text/css\">
#outlook a { padding:0; }
body { margin:0;padding:0;-webkit-text-size-adjust:100%;-ms-text-size-adjust:100%; }
table, td { border-collapse:collapse;mso-table-lspace:0pt;mso-table-rspace:0pt; }
img { border:0;height:auto;line-height:100%; outline:none;text-decoration:none;-ms-interpolation-mode:bicubic; }
p { display:block;margin:13px 0; }
</style>
";

const OUTLOOK_SETTINGS: &str = "<!--[if mso]>
<noscript>
<xml>
<o:OfficeDocumentSettings>
<o:AllowPNG/>
<o:PixelsPerInch>96</o:PixelsPerInch>
</o:OfficeDocumentSettings>
</xml>
</noscript>
<![endif]-->
<!--[if lte mso 11]>
<style type=\"text/css\">
.mj-outlook-group-fix { width:100% !important; }
</style>
<![endif]-->
";

const PREVIEW_STYLE: &str = "display:none;font-size:1px;color:#ffffff;line-height:1px;max-height:0px;max-width:0px;opacity:0;overflow:hidden;";

/// Links to the declared fonts which some element used, each URL once.
fn font_links(context: &Context, global: &GlobalData) -> String {
    let mut hrefs: Vec<&str> = Vec::new();
    for (name, href) in &context.fonts {
        if global.is_font_used(name) && !hrefs.contains(&href.as_str()) {
            hrefs.push(href);
        }
    }
    if hrefs.is_empty() {
        return String::new();
    }
    let mut out = String::from("<!--[if !mso]><!-->\n");
    for href in &hrefs {
        let _ = writeln!(
            out,
            "<link href=\"{}\" rel=\"stylesheet\" type=\"text/css\">",
            escape_html(href)
        );
    }
    out.push_str("<style type=\"text/css\">\n");
    for href in &hrefs {
        let _ = writeln!(out, "@import url({});", href);
    }
    out.push_str("</style>\n<!--<![endif]-->\n");
    out
}

/// The responsive width rules, applied above the breakpoint, plus the same
/// rules scoped for Thunderbird.
fn media_queries(context: &Context, global: &GlobalData) -> String {
    let queries = global.media_queries();
    if queries.is_empty() {
        return String::new();
    }
    let mut out = format!(
        "<style type=\"text/css\">\n@media only screen and (min-width:{}px) {{\n",
        context.breakpoint
    );
    for (class, rule) in queries {
        let _ = writeln!(out, ".{} {}", class, rule);
    }
    let _ = write!(
        out,
        "}}\n</style>\n<style media=\"screen and (min-width:{}px)\">\n",
        context.breakpoint
    );
    for (class, rule) in queries {
        let _ = writeln!(out, ".moz-text-html .{} {}", class, rule);
    }
    out.push_str("</style>\n");
    out
}

fn style_block<'a>(blocks: impl Iterator<Item = &'a str>) -> String {
    let css: Vec<&str> = blocks.filter(|b| !b.trim().is_empty()).collect();
    if css.is_empty() {
        String::new()
    } else {
        format!("<style type=\"text/css\">\n{}\n</style>\n", css.join("\n"))
    }
}

/// Build the complete document: the head collected in `context`'s global
/// data and the rendered `content` of the body.
pub fn build_document(context: &Context, content: &str) -> String {
    let global = context.global();
    let head_styles = style_block(
        global
            .head_style()
            .iter()
            .map(|(_, css)| css.as_str())
            .chain(global.component_head_style().iter().map(String::as_str)),
    );
    let custom_styles = style_block(context.custom_styles.iter().map(String::as_str));

    let mut body_style = String::from("word-spacing:normal;");
    if let Some(color) = context.background_color.as_deref().filter(|c| !c.is_empty()) {
        let _ = write!(body_style, "background-color:{};", color);
    }
    let preview = if context.preview.is_empty() {
        String::new()
    } else {
        format!(
            "<div style=\"{}\">{}</div>",
            PREVIEW_STYLE,
            escape_text(&context.preview)
        )
    };

    format!(
        "<!doctype html>
<html lang=\"{lang}\" dir=\"{dir}\" xmlns=\"http://www.w3.org/1999/xhtml\" xmlns:v=\"urn:schemas-microsoft-com:vml\" xmlns:o=\"urn:schemas-microsoft-com:office:office\">
<head>
<title>{title}</title>
<!--[if !mso]><!-->
<meta http-equiv=\"X-UA-Compatible\" content=\"IE=edge\">
<!--<![endif]-->
<meta http-equiv=\"Content-Type\" content=\"text/html; charset=UTF-8\">
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">
{reset}{outlook}{fonts}{media}{head_styles}{custom_styles}</head>
<body style=\"{body_style}\">
{preview}{content}
</body>
</html>
",
        lang = escape_html(&context.language),
        dir = escape_html(&context.direction),
        title = escape_text(&context.title),
        reset = RESET_CSS,
        outlook = OUTLOOK_SETTINGS,
        fonts = font_links(context, &global),
        media = media_queries(context, &global),
        head_styles = head_styles,
        custom_styles = custom_styles,
        body_style = body_style,
        preview = preview,
        content = content,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::CssLength;

    #[test]
    fn test_minimal_document() {
        let mut context = Context::new(600, 480);
        context.title = "Tom & Jerry &copy; 2024".into();
        let html = build_document(&context, "<div>x</div>");
        assert!(html.starts_with("<!doctype html>\n<html lang=\"und\" dir=\"auto\""));
        assert!(html.contains("<title>Tom &amp; Jerry &copy; 2024</title>"));
        assert!(html.contains("<body style=\"word-spacing:normal;\">"));
        assert!(html.contains("<div>x</div>"));
        assert!(!html.contains("@media"));
        assert!(!html.contains("<link"));
        assert!(!html.contains("display:none;font-size:1px"));
    }

    #[test]
    fn test_used_fonts_only_once() {
        let mut context = Context::new(600, 480);
        context.add_font("Lato", "https://fonts.example/lato");
        context.add_font("Lato Bold", "https://fonts.example/lato");
        context.add_font("Roboto", "https://fonts.example/roboto");
        context.global_mut().record_font_usage("Lato");
        context.global_mut().record_font_usage("Lato Bold");
        let html = build_document(&context, "");
        assert_eq!(html.matches("<link href=\"https://fonts.example/lato\"").count(), 1);
        assert_eq!(html.matches("@import url(https://fonts.example/lato);").count(), 1);
        assert!(!html.contains("roboto"));
    }

    #[test]
    fn test_media_queries_and_styles() {
        let mut context = Context::new(600, 320);
        context.background_color = Some("#eeeeee".into());
        context.preview = "<Hi>".into();
        context.custom_styles.push(".custom { color: red; }".into());
        {
            let mut global = context.global_mut();
            global.add_media_query("mj-column-per-50", &CssLength::percent(50.0));
            global.add_component_head_style(".appended {}");
            global.add_head_style("mj-image", ".keyed {}");
        }
        let html = build_document(&context, "");
        assert!(html.contains(
            "@media only screen and (min-width:320px) {\n.mj-column-per-50 { width:50% !important; max-width: 50%; }\n}"
        ));
        assert!(html.contains(".moz-text-html .mj-column-per-50 { width:50% !important; max-width: 50%; }"));
        assert!(html.contains("<style type=\"text/css\">\n.keyed {}\n.appended {}\n</style>"));
        assert!(html.contains(".custom { color: red; }"));
        assert!(html.contains("<body style=\"word-spacing:normal;background-color:#eeeeee;\">"));
        assert!(html.contains(">&lt;Hi&gt;</div>"));
    }
}
