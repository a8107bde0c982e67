//! CSS values, inline style tables and the box-model width resolver shared
//! by every layout component.
use std::collections::BTreeMap;
use std::fmt;

use crate::Attributes;

pub mod parser;

/// The unit of a parsed length.  Anything that isn't a percentage is
/// treated as pixels.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LengthUnit {
    /// Absolute pixels (also used for unitless and unknown units).
    Px,
    /// Percentage of the containing width.
    Percent,
}

impl LengthUnit {
    fn suffix(self) -> &'static str {
        match self {
            LengthUnit::Px => "px",
            LengthUnit::Percent => "%",
        }
    }
}

/// A parsed width such as `50%` or `300px`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CssLength {
    /// The numeric part.
    pub value: f64,
    /// The unit.
    pub unit: LengthUnit,
}

impl CssLength {
    /// A pixel length.
    pub fn px(value: f64) -> CssLength {
        CssLength {
            value,
            unit: LengthUnit::Px,
        }
    }

    /// A percentage length.
    pub fn percent(value: f64) -> CssLength {
        CssLength {
            value,
            unit: LengthUnit::Percent,
        }
    }

    /// Parse a length; returns `None` if there is no numeric part.
    pub fn parse(text: &str) -> Option<CssLength> {
        parser::parse_length(text).filter(|len| len.value.is_finite())
    }

    /// Resolve against the width of the container, in pixels.
    pub fn to_px(&self, container: f64) -> f64 {
        match self.unit {
            LengthUnit::Px => self.value,
            LengthUnit::Percent => container * self.value / 100.0,
        }
    }
}

impl fmt::Display for CssLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", format_number(self.value), self.unit.suffix())
    }
}

/// Format a number the way it appears in generated CSS: no trailing `.0`.
pub fn format_number(n: f64) -> String {
    if n == n.trunc() && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse a pixel value, truncating any fraction (`600px` -> 600).
pub fn parse_px(text: &str) -> Option<u32> {
    parser::leading_number(text)
        .filter(|n| n.is_finite() && *n >= 0.0)
        .map(|n| n as u32)
}

/// One side of a box.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Side {
    /// Top
    Top,
    /// Right
    Right,
    /// Bottom
    Bottom,
    /// Left
    Left,
}

impl Side {
    /// The CSS suffix for this side (`padding-<side>`).
    pub fn name(self) -> &'static str {
        match self {
            Side::Top => "top",
            Side::Right => "right",
            Side::Bottom => "bottom",
            Side::Left => "left",
        }
    }
}

/// Four side values, as given by a CSS shorthand.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Sides {
    /// Top
    pub top: f64,
    /// Right
    pub right: f64,
    /// Bottom
    pub bottom: f64,
    /// Left
    pub left: f64,
}

impl Sides {
    /// Expand a 1 to 4 value shorthand (`10px`, `10px 25px`, ...).
    pub fn from_shorthand(text: &str) -> Option<Sides> {
        let v = parser::shorthand_values(text);
        let (top, right, bottom, left) = match v.len() {
            1 => (v[0], v[0], v[0], v[0]),
            2 => (v[0], v[1], v[0], v[1]),
            3 => (v[0], v[1], v[2], v[1]),
            4 => (v[0], v[1], v[2], v[3]),
            _ => return None,
        };
        Some(Sides {
            top,
            right,
            bottom,
            left,
        })
    }

    /// The value for one side.
    pub fn get(&self, side: Side) -> f64 {
        match side {
            Side::Top => self.top,
            Side::Right => self.right,
            Side::Bottom => self.bottom,
            Side::Left => self.left,
        }
    }
}

/// Read one side of a shorthand attribute family such as `padding`; the
/// explicit `padding-<side>` attribute always wins over the shorthand.
pub fn shorthand_side(attributes: &Attributes, name: &str, side: Side) -> f64 {
    let specific = format!("{}-{}", name, side.name());
    if let Some(value) = attributes.get(&specific).filter(|v| !v.is_empty()) {
        return parser::leading_number(value).unwrap_or(0.0);
    }
    attributes
        .get(name)
        .and_then(|value| Sides::from_shorthand(value))
        .map(|sides| sides.get(side))
        .unwrap_or(0.0)
}

/// Border width on one side: `border-<side>` if set, else `border`.
pub fn border_side(attributes: &Attributes, side: Side) -> f64 {
    let specific = format!("border-{}", side.name());
    let value = attributes
        .get(&specific)
        .filter(|v| !v.is_empty())
        .or_else(|| attributes.get("border"));
    value.map(|v| parser::border_width(v)).unwrap_or(0.0)
}

/// The horizontal decomposition of a component's box.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BoxWidths {
    /// The width available to the component.
    pub total: u32,
    /// Left plus right padding.
    pub paddings: u32,
    /// Left plus right border.
    pub borders: u32,
    /// What is left for the content.
    pub content: u32,
}

impl BoxWidths {
    /// Compute the box of a component given its attributes and the
    /// container width it received.
    pub fn compute(attributes: &Attributes, container_width: u32) -> BoxWidths {
        let paddings = shorthand_side(attributes, "padding", Side::Left)
            + shorthand_side(attributes, "padding", Side::Right);
        let borders =
            border_side(attributes, Side::Left) + border_side(attributes, Side::Right);
        let content = (container_width as f64 - paddings - borders).max(0.0);
        BoxWidths {
            total: container_width,
            paddings: paddings.max(0.0) as u32,
            borders: borders.max(0.0) as u32,
            content: content as u32,
        }
    }
}

/// The resolved width of a layout component which shares its parent's
/// width with its siblings (columns and groups).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LayoutWidth {
    /// The declared width, or the even split when none was declared or it
    /// could not be parsed.
    pub declared: CssLength,
    /// Whether `declared` came from the component's own attribute.
    pub explicit: bool,
    /// The width of the parent's content box.
    pub parent: u32,
    /// What the earlier siblings left of the parent's width.
    pub available: f64,
}

impl LayoutWidth {
    /// Resolve the width of one of `non_raw_siblings` layout siblings.
    pub fn resolve(width: Option<&str>, parent: u32, non_raw_siblings: usize) -> LayoutWidth {
        let explicit = width
            .and_then(CssLength::parse)
            .filter(|len| len.value >= 0.0);
        match explicit {
            Some(declared) => LayoutWidth {
                declared,
                explicit: true,
                parent,
                available: parent as f64,
            },
            None => {
                let siblings = non_raw_siblings.max(1) as f64;
                LayoutWidth {
                    declared: CssLength::percent(100.0 / siblings),
                    explicit: false,
                    parent,
                    available: parent as f64,
                }
            }
        }
    }

    /// Limit the width to what is left of the row.
    pub fn within(mut self, available: f64) -> LayoutWidth {
        self.available = available.clamp(0.0, self.parent as f64);
        self
    }

    /// The outer width in pixels, never wider than the parent or than
    /// what the earlier siblings left.
    pub fn outer_px(&self) -> f64 {
        let px = self.declared.to_px(self.parent as f64).min(self.parent as f64);
        if px > self.available + WIDTH_TOLERANCE {
            self.available
        } else {
            px
        }
    }

    /// The integer width left for children once `deductions` (paddings,
    /// borders) are removed.
    pub fn content_width(&self, deductions: f64) -> u32 {
        (self.outer_px() - deductions).max(0.0).trunc() as u32
    }

    /// The responsive class name registered for this width.
    pub fn class_name(&self) -> String {
        let n = format_number(self.declared.value).replace('.', "-");
        match self.declared.unit {
            LengthUnit::Percent => format!("mj-column-per-{}", n),
            LengthUnit::Px => format!("mj-column-px-{}", n),
        }
    }

    /// The width used when the layout is stacked on mobile.  Columns stack
    /// at 100%, except inside a group where they keep their share.
    pub fn mobile_width(&self, in_group: bool, non_raw_siblings: usize) -> String {
        if !in_group {
            return "100%".to_string();
        }
        if !self.explicit {
            return format!("{}%", 100 / non_raw_siblings.max(1));
        }
        match self.declared.unit {
            LengthUnit::Percent => self.declared.to_string(),
            LengthUnit::Px => {
                let parent = self.parent.max(1) as f64;
                format!("{}%", format_number(self.declared.value * 100.0 / parent))
            }
        }
    }
}

/// Rounding noise allowed when comparing a width with what is left of a
/// row: three `33.333%` columns must still fit in 600px.
const WIDTH_TOLERANCE: f64 = 0.001;

/// The width each of a row of siblings may take, given the outer widths
/// they ask for in order.  Later siblings get what the earlier ones left,
/// so the row never overflows `parent`.
pub fn remaining_widths(outer: &[f64], parent: u32) -> Vec<f64> {
    let mut remaining = parent as f64;
    outer
        .iter()
        .map(|&wanted| {
            let available = remaining.max(0.0);
            if wanted <= available + WIDTH_TOLERANCE {
                remaining -= wanted.max(0.0);
            } else {
                remaining = 0.0;
            }
            available
        })
        .collect()
}

/// The CSS fragment stored for a responsive width class.
pub fn media_query_rule(width: &CssLength) -> String {
    format!("{{ width:{} !important; max-width: {}; }}", width, width)
}

/// An ordered set of CSS declarations destined for a `style` attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Style(Vec<(&'static str, String)>);

impl Style {
    /// An empty style.
    pub fn new() -> Style {
        Style(Vec::new())
    }

    /// Add a declaration, replacing any earlier value for the property.
    pub fn set(mut self, property: &'static str, value: impl Into<String>) -> Style {
        let value = value.into();
        if let Some(slot) = self.0.iter_mut().find(|(p, _)| *p == property) {
            slot.1 = value;
        } else {
            self.0.push((property, value));
        }
        self
    }

    /// Add a declaration if a non-empty value is present.
    pub fn opt<S: AsRef<str>>(self, property: &'static str, value: Option<S>) -> Style {
        match value {
            Some(v) if !v.as_ref().is_empty() => self.set(property, v.as_ref()),
            _ => self,
        }
    }

    /// Add every declaration of `other`, which wins on conflicts.
    pub fn merged(self, other: &Style) -> Style {
        other
            .iter()
            .fold(self, |style, (property, value)| style.set(property, value))
    }

    /// Look up a declaration.
    pub fn get(&self, property: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }

    /// Iterate over `(property, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.0.iter().map(|(p, v)| (*p, v.as_str()))
    }

    /// True if there are no declarations.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for Style {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (property, value) in &self.0 {
            write!(f, "{}:{};", property, value)?;
        }
        Ok(())
    }
}

/// The named style table of a component ("div", "td", "tdOutlook", ...).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Styles(BTreeMap<&'static str, Style>);

impl Styles {
    /// An empty table.
    pub fn new() -> Styles {
        Styles(BTreeMap::new())
    }

    /// Add a named style.
    pub fn with(mut self, name: &'static str, style: Style) -> Styles {
        self.0.insert(name, style);
        self
    }

    /// The style for a slot; empty if the component has none.
    pub fn get(&self, name: &str) -> Style {
        self.0.get(name).cloned().unwrap_or_default()
    }

    /// Iterate over every declared style.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Style)> {
        self.0.iter().map(|(k, v)| (*k, v))
    }
}
