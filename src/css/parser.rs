//! Parsing for the small subset of CSS values the layout code needs.

use nom::{
    branch::alt,
    bytes::complete::{tag, tag_no_case, take_while, take_while1},
    character::complete::{
        alphanumeric1, anychar, char, digit0, digit1, multispace0, multispace1, none_of, one_of,
    },
    combinator::{all_consuming, map, opt, recognize, value},
    multi::{many0, many1, separated_list1},
    sequence::{delimited, preceded},
    IResult, Parser,
};

use super::{CssLength, LengthUnit};

fn decimal(text: &str) -> IResult<&str, &str> {
    recognize((
        opt(one_of("+-")),
        alt((
            recognize((digit1, opt((char('.'), digit0)))),
            recognize((char('.'), digit1)),
        )),
    ))
    .parse(text)
}

/// A signed decimal number, such as `-1`, `33.5` or `.5`.
fn number(text: &str) -> IResult<&str, f64> {
    let (rest, digits) = decimal(text)?;
    match digits.parse::<f64>() {
        Ok(n) => Ok((rest, n)),
        Err(_) => Err(nom::Err::Error(nom::error::Error::new(
            text,
            nom::error::ErrorKind::Float,
        ))),
    }
}

/// Anything following the number.  `%` is the only unit with its own
/// meaning; every other unit (including none) is read as pixels.
fn unit(text: &str) -> IResult<&str, LengthUnit> {
    alt((
        value(LengthUnit::Percent, char('%')),
        value(
            LengthUnit::Px,
            take_while(|c: char| c.is_ascii_alphabetic()),
        ),
    ))
    .parse(text)
}

fn length(text: &str) -> IResult<&str, CssLength> {
    map((number, unit), |(value, unit)| CssLength { value, unit }).parse(text)
}

/// Parse a complete length value such as `600px`, `50%` or `320`.
pub fn parse_length(text: &str) -> Option<CssLength> {
    all_consuming(delimited(multispace0, length, multispace0))
        .parse(text)
        .ok()
        .map(|(_, len)| len)
}

/// The leading number of a token, the way `parseInt`-style readers see
/// it: `10px` is 10, `auto` is nothing.
pub fn leading_number(text: &str) -> Option<f64> {
    number(text.trim_start()).ok().map(|(_, n)| n)
}

/// Split a shorthand value (`10px 25px`) into at most four numbers.
/// Tokens without a leading number count as zero.
pub fn shorthand_values(text: &str) -> Vec<f64> {
    text.split_whitespace()
        .take(4)
        .map(|tok| leading_number(tok).unwrap_or(0.0))
        .collect()
}

/// The width part of a border shorthand: the first whitespace-separated
/// token that starts with a digit (`1px solid #000` is 1, `none` is 0).
pub fn border_width(text: &str) -> f64 {
    text.split_whitespace()
        .find(|tok| tok.starts_with(|c: char| c.is_ascii_digit()))
        .and_then(leading_number)
        .unwrap_or(0.0)
}

/// The individual family names of a `font-family` value, unquoted.
pub fn font_families(text: &str) -> Vec<String> {
    text.split(',')
        .map(|name| name.trim().trim_matches(|c| c == '"' || c == '\'').trim())
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// A character reference such as `&quot;` or `&#39;`.
fn entity(text: &str) -> IResult<&str, &str> {
    recognize((char('&'), opt(char('#')), alphanumeric1, char(';'))).parse(text)
}

/// True if `text` starts with a character reference.
pub fn starts_with_entity(text: &str) -> bool {
    entity(text).is_ok()
}

/// A `font-family` declaration in any case, returning its value.  The
/// value ends at the end of the declaration, rule or attribute.
fn font_family_declaration(text: &str) -> IResult<&str, &str> {
    preceded(
        (tag_no_case("font-family"), multispace0, char(':'), multispace0),
        recognize(many0(alt((entity, recognize(none_of(";\"<>}")))))),
    )
    .parse(text)
}

/// The font families named by every `font-family` declaration in a piece
/// of markup or CSS, in order.
pub fn font_family_declarations(text: &str) -> Vec<String> {
    let scan = many0(alt((
        map(font_family_declaration, Some),
        value(None, anychar),
    )))
    .parse(text);
    let values = match scan {
        Ok((_, values)) => values,
        Err(_) => return Vec::new(),
    };
    values
        .into_iter()
        .flatten()
        .flat_map(|value| {
            let value = value
                .replace("&quot;", "\"")
                .replace("&#34;", "\"")
                .replace("&#39;", "'")
                .replace("&apos;", "'");
            let value = value.split('!').next().unwrap_or_default().to_string();
            font_families(&value)
        })
        .collect()
}

fn ident(text: &str) -> IResult<&str, &str> {
    recognize((
        opt(char('-')),
        take_while1(|c: char| c.is_alphabetic() || c == '_' || c == '\\'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '\\'),
    ))
    .parse(text)
}

fn attribute_value(text: &str) -> IResult<&str, &str> {
    alt((
        delimited(char('"'), recognize(many0(none_of("\""))), char('"')),
        delimited(char('\''), recognize(many0(none_of("'"))), char('\'')),
        ident,
        decimal,
    ))
    .parse(text)
}

fn attribute_selector(text: &str) -> IResult<&str, ()> {
    let operator = alt((tag("~="), tag("|="), tag("^="), tag("$="), tag("*="), tag("=")));
    value(
        (),
        delimited(
            (char('['), multispace0),
            (
                ident,
                multispace0,
                opt((operator, multispace0, attribute_value, multispace0)),
            ),
            char(']'),
        ),
    )
    .parse(text)
}

fn pseudo(text: &str) -> IResult<&str, ()> {
    value(
        (),
        (
            char(':'),
            opt(char(':')),
            ident,
            opt(delimited(char('('), many0(none_of(")")), char(')'))),
        ),
    )
    .parse(text)
}

fn subclass(text: &str) -> IResult<&str, ()> {
    alt((
        value((), preceded(char('.'), ident)),
        value((), preceded(char('#'), ident)),
        attribute_selector,
        pseudo,
    ))
    .parse(text)
}

fn compound(text: &str) -> IResult<&str, ()> {
    alt((
        value((), (alt((ident, tag("*"))), many0(subclass))),
        value((), many1(subclass)),
    ))
    .parse(text)
}

fn combinator(text: &str) -> IResult<&str, ()> {
    alt((
        value((), delimited(multispace0, one_of(">+~"), multispace0)),
        value((), multispace1),
    ))
    .parse(text)
}

fn complex(text: &str) -> IResult<&str, ()> {
    value((), (compound, many0(preceded(combinator, compound)))).parse(text)
}

/// Check that `text` is a selector list this crate can hand on to an
/// attribute applier: type, class, id, attribute and pseudo selectors
/// joined by combinators and commas.
pub fn is_valid_selector(text: &str) -> bool {
    all_consuming(delimited(
        multispace0,
        separated_list1(delimited(multispace0, char(','), multispace0), complex),
        multispace0,
    ))
    .parse(text)
    .is_ok()
}
