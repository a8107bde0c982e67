use crate::config::{self, Config};
use crate::render::{BodyComponent, ComponentKind, Element};
use crate::{mjml2html, parse, render, Error, Node, Output};

/// Like assert_eq!(), but prints out the results normally as well
macro_rules! assert_eq_str {
    ($a:expr, $b:expr) => {
        if $a != $b {
            println!("<<<\n{}===\n{}>>>", $a, $b);
            assert_eq!($a, $b);
        }
    };
}

fn init() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[track_caller]
fn compile(input: &str) -> Output {
    compile_conf(input, |conf| conf)
}

#[track_caller]
fn compile_conf<F>(input: &str, conf: F) -> Output
where
    F: Fn(Config) -> Config,
{
    init();
    conf(config::standard()).render_str(input).unwrap()
}

fn doc(head: &str, body: &str) -> String {
    format!(
        "<mjml><mj-head>{}</mj-head><mj-body>{}</mj-body></mjml>",
        head, body
    )
}

fn section(columns: &str) -> String {
    format!("<mj-section>{}</mj-section>", columns)
}

#[track_caller]
fn assert_contains(html: &str, needle: &str) {
    if !html.contains(needle) {
        println!("<<<\n{}\n>>>", html);
        panic!("output does not contain {:?}", needle);
    }
}

#[track_caller]
fn assert_count(html: &str, needle: &str, count: usize) {
    let found = html.matches(needle).count();
    if found != count {
        println!("<<<\n{}\n>>>", html);
        panic!("found {:?} {} times, expected {}", needle, found, count);
    }
}

#[test]
fn test_single_text() {
    let out = compile(
        "<mjml><mj-body><mj-section><mj-column><mj-text>Hello</mj-text></mj-column></mj-section></mj-body></mjml>",
    );
    assert!(out.errors.is_empty());
    assert_contains(
        &out.html,
        "<div class=\"mj-column-per-100 mj-outlook-group-fix\" style=\"font-size:0px;text-align:left;direction:ltr;display:inline-block;vertical-align:top;width:100%;\"><table border=\"0\" cellpadding=\"0\" cellspacing=\"0\" role=\"presentation\" style=\"vertical-align:top;\" width=\"100%\"><tbody><tr><td align=\"left\" style=\"font-size:0px;padding:10px 25px;word-break:break-word;\"><div style=\"font-family:Ubuntu, Helvetica, Arial, sans-serif;font-size:13px;line-height:1;text-align:left;color:#000000;\">Hello</div></td></tr></tbody></table></div>",
    );
    assert_contains(&out.html, "<div lang=\"und\" dir=\"auto\">");
    assert_contains(&out.html, "<div style=\"margin:0px auto;max-width:600px;\">");
    assert_contains(
        &out.html,
        "<td style=\"direction:ltr;font-size:0px;padding:20px 0;text-align:center;\">",
    );
    assert_contains(&out.html, "<td style=\"vertical-align:top;width:600px;\">");
    assert_contains(
        &out.html,
        ".mj-column-per-100 { width:100% !important; max-width: 100%; }",
    );
    assert_count(
        &out.html,
        "https://fonts.googleapis.com/css?family=Ubuntu:300,400,500,700",
        2,
    );
    assert!(!out.html.contains("Roboto"));
}

#[test]
fn test_document_shell() {
    let out = compile(r#"<mjml lang="fr" dir="ltr"><mj-body></mj-body></mjml>"#);
    assert!(out
        .html
        .starts_with("<!doctype html>\n<html lang=\"fr\" dir=\"ltr\""));
    assert_contains(&out.html, "<title></title>");
    assert_contains(&out.html, "<o:PixelsPerInch>96</o:PixelsPerInch>");
    assert_contains(&out.html, ".mj-outlook-group-fix { width:100% !important; }");
    assert_contains(&out.html, "<body style=\"word-spacing:normal;\">");
    assert!(!out.html.contains("@media"));
    assert!(!out.html.contains("<link"));
}

#[test]
fn test_no_body() {
    let out = compile("<mjml><mj-head><mj-title>x</mj-title></mj-head></mjml>");
    assert_contains(&out.html, "<title>x</title>");
    assert!(out.errors.is_empty());
}

#[test]
fn test_columns_share_width() {
    let out = compile(&doc(
        "",
        &section("<mj-column><mj-text>a</mj-text></mj-column><mj-column><mj-text>b</mj-text></mj-column>"),
    ));
    assert_count(&out.html, "<td style=\"vertical-align:top;width:300px;\">", 2);
    assert_count(&out.html, "class=\"mj-column-per-50 mj-outlook-group-fix\"", 2);
    assert_contains(
        &out.html,
        ".mj-column-per-50 { width:50% !important; max-width: 50%; }",
    );
}

#[test]
fn test_width_sums_after_padding() {
    let out = compile(&doc(
        "",
        r#"<mj-section padding="0 50px"><mj-column/><mj-column/></mj-section>"#,
    ));
    assert_count(&out.html, "width:250px;", 2);
}

#[test]
fn test_pixel_column() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column width="200px"><mj-text>a</mj-text></mj-column><mj-column/>"#),
    ));
    assert_contains(&out.html, "class=\"mj-column-px-200 mj-outlook-group-fix\"");
    assert_contains(&out.html, "<td style=\"vertical-align:top;width:200px;\">");
    assert_contains(
        &out.html,
        ".mj-column-px-200 { width:200px !important; max-width: 200px; }",
    );
    // Fractional widths get a class name without a dot.
    let out = compile(&doc("", &section(r#"<mj-column width="33.5%"/>"#)));
    assert_contains(&out.html, "class=\"mj-column-per-33-5 mj-outlook-group-fix\"");
}

/// The pixel widths of the Outlook cells around each column.
fn outlook_column_widths(html: &str) -> Vec<f64> {
    const CELL: &str = "<td style=\"vertical-align:top;width:";
    html.match_indices(CELL)
        .filter_map(|(at, _)| {
            let rest = &html[at + CELL.len()..];
            rest.split("px").next().and_then(|n| n.parse().ok())
        })
        .collect()
}

#[test]
fn test_columns_never_overflow_section() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column width="400px"><mj-text>a</mj-text></mj-column><mj-column width="400px"><mj-text>b</mj-text></mj-column>"#),
    ));
    assert_eq!(outlook_column_widths(&out.html), vec![400.0, 200.0]);
    // Both keep the class of the width they asked for.
    assert_count(&out.html, "class=\"mj-column-px-400 mj-outlook-group-fix\"", 2);

    let out = compile(&doc(
        "",
        &section(r#"<mj-column width="80%"/><mj-column/><mj-column/>"#),
    ));
    let widths = outlook_column_widths(&out.html);
    assert_eq!(widths, vec![480.0, 120.0, 0.0]);
    assert!(widths.iter().sum::<f64>() <= 600.0);

    // Even shares are untouched.
    let out = compile(&doc("", &section("<mj-column/><mj-column/><mj-column/>")));
    let widths = outlook_column_widths(&out.html);
    assert_eq!(widths.len(), 3);
    assert!(widths.iter().all(|w| w.round() == 200.0));
}

#[test]
fn test_media_query_registered_once() {
    let columns = "<mj-column/><mj-column/>";
    let out = compile(&doc(
        "",
        &format!("{}{}", section(columns), section(columns)),
    ));
    // One rule in the media query and one in the Thunderbird block.
    assert_count(&out.html, "{ width:50% !important; max-width: 50%; }", 2);
}

#[test]
fn test_unknown_and_raw_siblings() {
    let out = compile(&doc(
        "",
        &section("<mj-column/><mj-unknown>x</mj-unknown><mj-raw><p>raw</p></mj-raw><mj-column/>"),
    ));
    assert_count(&out.html, "class=\"mj-column-per-50 mj-outlook-group-fix\"", 2);
    assert_contains(&out.html, "<p>raw</p>");
    assert!(!out.html.contains("mj-unknown"));
    assert!(out.errors.is_empty());
}

#[test]
fn test_column_gutter() {
    let out = compile(&doc(
        "",
        &section(r##"<mj-column padding="10px" inner-background-color="#ff0000"><mj-text>a</mj-text></mj-column>"##),
    ));
    assert_contains(&out.html, "<td style=\"vertical-align:top;padding:10px;\">");
    assert_contains(&out.html, "style=\"background-color:#ff0000;\" width=\"100%\"");
}

#[test]
fn test_group_keeps_columns_side_by_side() {
    let out = compile(&doc(
        "",
        &section("<mj-group><mj-column/><mj-column/></mj-group>"),
    ));
    assert_contains(&out.html, "class=\"mj-column-per-100 mj-outlook-group-fix\"");
    // The group and both of its columns get the Outlook width fix.
    assert_count(&out.html, " mj-outlook-group-fix\"", 3);
    assert_count(&out.html, "display:inline-block;vertical-align:top;width:50%;", 2);
    assert_count(&out.html, "<td style=\"vertical-align:top;width:300px;\">", 2);
}

#[test]
fn test_wrapper_gap() {
    let out = compile(&doc(
        "",
        r#"<mj-wrapper gap="10px"><mj-section/><mj-section/></mj-wrapper>"#,
    ));
    assert_count(&out.html, "margin-top:10px;", 1);
    assert_count(&out.html, "<td width=\"600px\">", 2);
}

#[test]
fn test_full_width_section() {
    let out = compile(&doc(
        "",
        r##"<mj-section full-width="full-width" background-color="#eeeeee"/>"##,
    ));
    assert_contains(
        &out.html,
        "<table align=\"center\" role=\"presentation\" style=\"background:#eeeeee;background-color:#eeeeee;width:100%;\">",
    );
}

#[test]
fn test_body_attributes() {
    let input = doc("", "<mj-section/>").replace(
        "<mj-body>",
        r##"<mj-body width="800px" background-color="#f0f0f0">"##,
    );
    let out = compile(&input);
    assert_contains(&out.html, "max-width:800px;");
    assert_contains(
        &out.html,
        "<body style=\"word-spacing:normal;background-color:#f0f0f0;\">",
    );
    assert_contains(
        &out.html,
        "<div style=\"background-color:#f0f0f0;\" lang=\"und\" dir=\"auto\">",
    );
}

#[test]
fn test_configured_container_width() {
    let input = doc("", &section("<mj-column><mj-text>a</mj-text></mj-column>"));
    let out = compile_conf(&input, |conf| conf.container_width(800));
    assert_contains(&out.html, "<div style=\"margin:0px auto;max-width:800px;\">");
    assert_contains(&out.html, "<td style=\"vertical-align:top;width:800px;\">");
    assert!(!out.html.contains("600px"));

    // The document's own width still wins.
    let input = input.replace("<mj-body>", "<mj-body width=\"500px\">");
    let out = compile_conf(&input, |conf| conf.container_width(800));
    assert_contains(&out.html, "max-width:500px;");
    assert!(!out.html.contains("800px"));
}

#[test]
fn test_head_metadata() {
    let out = compile(&doc(
        "<mj-title>Tom &amp; Jerry</mj-title><mj-preview>Read <this></mj-preview><mj-breakpoint width=\"320px\"/>",
        &section("<mj-column/>"),
    ));
    // Character references in the title are kept, not escaped twice.
    assert_contains(&out.html, "<title>Tom &amp; Jerry</title>");
    assert_contains(&out.html, ">Read &lt;this&gt;</div>");
    assert_contains(&out.html, "@media only screen and (min-width:320px)");
}

#[test]
fn test_bare_ampersand_in_title() {
    let out = compile(&doc("<mj-title>A & B</mj-title>", ""));
    assert_contains(&out.html, "<title>A &amp; B</title>");
}

#[test]
fn test_fonts_only_when_used() {
    let head = r#"<mj-font name="Raleway" href="https://fonts.example/raleway"/><mj-font name="Unused" href="https://fonts.example/unused"/>"#;
    let out = compile(&doc(
        head,
        &section(r#"<mj-column><mj-text font-family="Raleway, Arial">a</mj-text><mj-text font-family="Raleway">b</mj-text></mj-column>"#),
    ));
    assert_count(&out.html, "<link href=\"https://fonts.example/raleway\"", 1);
    assert_count(&out.html, "@import url(https://fonts.example/raleway);", 1);
    assert!(!out.html.contains("unused"));
    assert!(!out.html.contains("Ubuntu:300"));
}

#[test]
fn test_fonts_in_raw_content() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column><mj-text font-family="Arial"><span style="font-family: 'Lato', sans-serif">x</span></mj-text></mj-column>"#),
    ));
    assert_contains(&out.html, "family=Lato:300,400,500,700");
    assert!(!out.html.contains("family=Roboto"));
}

#[test]
fn test_fonts_in_raw_css_any_case() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column><mj-raw><style>p { FONT-FAMILY : Roboto; }</style></mj-raw><mj-text font-family="Arial"><p style="font-family:&quot;Lato&quot;">x</p></mj-text></mj-column>"#),
    ));
    assert_contains(&out.html, "family=Roboto:300,400,500,700");
    assert_contains(&out.html, "family=Lato:300,400,500,700");
}

#[test]
fn test_font_configuration() {
    let input = doc("", &section("<mj-column><mj-text>a</mj-text></mj-column>"));
    let out = compile_conf(&input, |conf| conf.no_default_fonts());
    assert!(!out.html.contains("<link"));
    let out = compile_conf(&input, |conf| {
        conf.add_font("Ubuntu", "https://fonts.example/ubuntu")
    });
    assert_contains(&out.html, "<link href=\"https://fonts.example/ubuntu\"");
    assert!(!out.html.contains("family=Ubuntu"));
}

#[test]
fn test_nested_class_defaults() {
    let head = r#"<mj-attributes><mj-class name="red" padding="5px"><mj-text color="red"/></mj-class><mj-text font-size="20px"/></mj-attributes>"#;
    let out = compile(&doc(
        head,
        &section(r#"<mj-column mj-class="red"><mj-text>a</mj-text><mj-text color="blue">b</mj-text></mj-column><mj-column><mj-text>c</mj-text></mj-column>"#),
    ));
    assert_count(&out.html, "font-size:20px;", 3);
    assert_count(&out.html, "color:red;\">a</div>", 1);
    assert_count(&out.html, "color:blue;\">b</div>", 1);
    assert_count(&out.html, "color:#000000;\">c</div>", 1);
    // The class's own attributes apply to the column itself.
    assert_contains(&out.html, "<td style=\"vertical-align:top;padding:5px;\">");
}

#[test]
fn test_nested_class_defaults_via_css_class() {
    let head = r#"<mj-attributes><mj-class name="red"><mj-text color="red"/></mj-class></mj-attributes>"#;
    let out = compile(&doc(
        head,
        &section(r#"<mj-column css-class="red"><mj-text>a</mj-text><mj-text color="blue">b</mj-text></mj-column><mj-column><mj-text>c</mj-text></mj-column>"#),
    ));
    assert_count(&out.html, "color:red;\">a</div>", 1);
    assert_count(&out.html, "color:blue;\">b</div>", 1);
    assert_count(&out.html, "color:#000000;\">c</div>", 1);
    assert_contains(&out.html, "class=\"mj-column-per-50 mj-outlook-group-fix red\"");
}

#[test]
fn test_mj_all_and_tag_defaults() {
    let head = r##"<mj-attributes><mj-all font-family="Lato"/><mj-text color="#123456"/></mj-attributes>"##;
    let out = compile(&doc(
        head,
        &section("<mj-column><mj-text>a</mj-text><mj-button>b</mj-button></mj-column>"),
    ));
    assert_count(&out.html, "font-family:Lato;", 2);
    assert_contains(&out.html, "color:#123456;\">a</div>");
    assert_contains(&out.html, "family=Lato:300");
}

#[test]
fn test_keyed_head_style_once() {
    let out = compile(&doc(
        "<mj-style>.a { color: red; }</mj-style>",
        &section(r#"<mj-column><mj-image src="a.png"/><mj-image src="b.png"/></mj-column>"#),
    ));
    assert_count(&out.html, "table.mj-full-width-mobile", 1);
    assert_contains(&out.html, "@media only screen and (max-width:479px)");
    let keyed = out.html.find("table.mj-full-width-mobile").unwrap();
    let appended = out.html.find(".a { color: red; }").unwrap();
    assert!(keyed < appended);
}

#[test]
fn test_image() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column><mj-image src="a.png" alt="A" href="https://example.com"/></mj-column>"#),
    ));
    assert_contains(
        &out.html,
        "<a href=\"https://example.com\" target=\"_blank\"><img alt=\"A\" height=\"auto\" src=\"a.png\"",
    );
    // 600px less the default 25px side padding.
    assert_contains(&out.html, "width=\"550\"");
}

#[test]
fn test_button_divider_spacer() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column><mj-button href="https://example.com">Go</mj-button><mj-divider/><mj-spacer height="30px"/></mj-column>"#),
    ));
    assert_contains(&out.html, ">Go</a>");
    assert_contains(&out.html, "border-top:solid 4px #000000;");
    assert_contains(&out.html, "width=\"550px\"");
    assert_contains(&out.html, "<div style=\"height:30px;line-height:30px;\">&#8202;</div>");
}

#[test]
fn test_navbar() {
    let out = compile(&doc(
        "",
        &section(r#"<mj-column><mj-navbar base-url="https://example.com" hamburger="hamburger"><mj-navbar-link href="/a">A</mj-navbar-link><mj-navbar-link href="/b">B</mj-navbar-link></mj-navbar></mj-column>"#),
    ));
    assert_contains(&out.html, "href=\"https://example.com/a\"");
    assert_contains(&out.html, "href=\"https://example.com/b\"");
    assert_count(&out.html, "noinput.mj-menu-checkbox", 1);
    assert_contains(&out.html, "id=\"mj-menu-1\"");
}

#[test]
fn test_comments() {
    let input = doc("", "<!-- kept --><mj-section/>");
    let out = compile(&input);
    assert_contains(&out.html, "<!-- kept -->");
    let out = compile_conf(&input, |conf| conf.keep_comments(false));
    assert!(!out.html.contains("kept"));
}

#[test]
fn test_inline_styles_and_html_attributes() {
    let head = r#"<mj-style inline="inline">.red { color: red; }</mj-style>
        <mj-html-attributes>
          <mj-selector path=".custom div"><mj-html-attribute name="data-id">42</mj-html-attribute></mj-selector>
          <mj-selector path="div >"><mj-html-attribute name="x">1</mj-html-attribute></mj-selector>
        </mj-html-attributes>"#;
    let out = compile(&doc(head, ""));
    assert_eq!(out.inline_style_rules, vec![".red { color: red; }".to_string()]);
    assert!(!out.html.contains(".red"));
    assert_eq!(out.html_attributes.len(), 1);
    assert_eq!(out.html_attributes[0].0, ".custom div");
    assert_eq!(out.html_attributes[0].1["data-id"], "42");
    assert_eq!(out.errors.len(), 1);
    assert_contains(&out.errors[0], "div >");
}

#[test]
fn test_custom_css() {
    let out = compile_conf(&doc("", ""), |conf| conf.add_css(".extra { margin: 0; }"));
    assert_contains(&out.html, ".extra { margin: 0; }");
}

struct Banner;

impl BodyComponent for Banner {
    fn tag_name(&self) -> &'static str {
        "mj-banner"
    }

    fn is_ending_tag(&self) -> bool {
        true
    }

    fn default_attributes(&self) -> &'static [(&'static str, &'static str)] {
        &[("tone", "loud")]
    }

    fn render(&self, element: &Element) -> String {
        format!(
            "<div class=\"banner-{}\" data-width=\"{}\">{}</div>",
            element.attribute("tone").unwrap_or_default(),
            element.context.container_width,
            element.content
        )
    }
}

static BANNER: Banner = Banner;

#[test]
fn test_custom_component() {
    let input = doc(
        "",
        &section("<mj-column><mj-banner>Sale <b>now</b></mj-banner></mj-column>"),
    );
    let out = compile_conf(&input, |conf| {
        conf.register("mj-banner", ComponentKind::Body(&BANNER))
    });
    assert_contains(
        &out.html,
        "<div class=\"banner-loud\" data-width=\"600\">Sale <b>now</b></div>",
    );
    let out = compile(&input);
    assert!(!out.html.contains("banner"));
}

#[test]
fn test_errors() {
    init();
    assert_eq!(mjml2html("").unwrap_err(), Error::NoRootElement);
    assert_eq!(
        mjml2html("<mj-body></mj-body>").unwrap_err(),
        Error::InvalidRoot("mj-body".to_string())
    );
    assert_eq!(
        render(&Node::new("html")).unwrap_err().to_string(),
        "the root element must be <mjml>, not <html>"
    );
}

#[test]
fn test_render_node_tree() {
    init();
    let root = Node::new("mjml").with_child(
        Node::new("mj-body").with_child(
            Node::new("mj-section")
                .with_child(Node::new("mj-column").with_child(Node::new("mj-text").with_content("Hi"))),
        ),
    );
    let from_tree = render(&root).unwrap();
    let from_text = mjml2html(
        "<mjml><mj-body><mj-section><mj-column><mj-text>Hi</mj-text></mj-column></mj-section></mj-body></mjml>",
    )
    .unwrap();
    assert_eq_str!(from_tree.html, from_text.html);
    assert_eq!(parse("<mjml/>").unwrap(), Node::new("mjml"));
}

#[test]
fn test_no_state_between_compiles() {
    let input = doc(
        r#"<mj-html-attributes><mj-selector path="div >"></mj-selector></mj-html-attributes>"#,
        &section("<mj-column><mj-navbar hamburger=\"hamburger\"></mj-navbar></mj-column>"),
    );
    let conf = config::standard();
    let first = conf.render_str(&input).unwrap();
    let second = conf.render_str(&input).unwrap();
    assert_eq!(first.errors.len(), 1);
    assert_eq_str!(first.html, second.html);
    assert_eq!(first, second);
}
