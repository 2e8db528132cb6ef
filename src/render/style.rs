//! Inline `style` parsing for text-layer elements.

use cssparser::{Parser, ParserInput, Token};
use serde::Serialize;

/// Font size as declared on a text element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "unit", content = "value", rename_all = "lowercase")]
pub enum FontSize {
    Px(f64),
    Pt(f64),
    /// Percentage of the viewport height.
    Vh(f64),
    /// Percentage of the inherited size.
    Percent(f64),
}

impl FontSize {
    /// Base size percentages resolve against.
    pub const BASE_PX: f64 = 16.0;

    /// Size in CSS pixels for a viewport `viewport_height` pixels tall.
    pub fn to_px(self, viewport_height: f64) -> f64 {
        match self {
            FontSize::Px(v) => v,
            FontSize::Pt(v) => v * 4.0 / 3.0,
            FontSize::Vh(v) => v * viewport_height / 100.0,
            FontSize::Percent(v) => v * Self::BASE_PX / 100.0,
        }
    }
}

/// Positioning declarations of a text element. Offsets are percentages of
/// the page container; other units are ignored.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InlineStyle {
    pub left: Option<f64>,
    pub top: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub font_size: Option<FontSize>,
}

/// Parse a `style` attribute. Unknown properties and malformed
/// declarations are skipped.
pub fn parse_inline_style(style: &str) -> InlineStyle {
    let mut input = ParserInput::new(style);
    let mut parser = Parser::new(&mut input);
    let mut out = InlineStyle::default();

    loop {
        parser.skip_whitespace();
        if parser.is_exhausted() {
            break;
        }

        let result: Result<(), cssparser::ParseError<'_, ()>> = parser.try_parse(|i| {
            let property = match i.next()? {
                Token::Ident(name) => name.to_ascii_lowercase(),
                _ => return Err(i.new_custom_error(())),
            };
            i.skip_whitespace();
            match i.next()? {
                Token::Colon => {}
                _ => return Err(i.new_custom_error(())),
            }
            i.skip_whitespace();

            let mut values: Vec<Token> = Vec::new();
            loop {
                match i.next() {
                    Ok(Token::Semicolon) | Err(_) => break,
                    Ok(t) => values.push(t.clone()),
                }
            }

            apply_property(&mut out, &property, &values);
            Ok(())
        });

        if result.is_err() {
            loop {
                match parser.next() {
                    Ok(Token::Semicolon) | Err(_) => break,
                    Ok(_) => continue,
                }
            }
        }
    }

    out
}

fn apply_property(style: &mut InlineStyle, property: &str, values: &[Token]) {
    match property {
        "left" => style.left = percentage(values),
        "top" => style.top = percentage(values),
        "width" => style.width = percentage(values),
        "height" => style.height = percentage(values),
        "font-size" => style.font_size = values.iter().find_map(font_size),
        _ => {}
    }
}

fn percentage(values: &[Token]) -> Option<f64> {
    values.iter().find_map(|token| match token {
        Token::Percentage { unit_value, .. } => Some(widen(*unit_value * 100.0)),
        Token::Number { value, .. } if *value == 0.0 => Some(0.0),
        _ => None,
    })
}

fn font_size(token: &Token) -> Option<FontSize> {
    match token {
        Token::Dimension { value, unit, .. } => {
            let value = widen(*value);
            match unit.to_ascii_lowercase().as_str() {
                "px" => Some(FontSize::Px(value)),
                "pt" => Some(FontSize::Pt(value)),
                "vh" => Some(FontSize::Vh(value)),
                _ => None,
            }
        }
        Token::Percentage { unit_value, .. } => Some(FontSize::Percent(widen(*unit_value * 100.0))),
        _ => None,
    }
}

/// cssparser hands out `f32`; drop the widening noise past four decimals.
fn widen(value: f32) -> f64 {
    (f64::from(value) * 10_000.0).round() / 10_000.0
}
