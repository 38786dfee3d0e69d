//! Normalisation of raw operator input.
//!
//! Form fields arrive as free text (`"$1,234.50"`, `" 120 sqft"`, multi-line
//! descriptions). The lenient parsers here never fail: anything that does not
//! look like a number becomes zero and is rejected later by the entry
//! constructors. Descriptions are the only input with a hard rule at this
//! stage.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::{
    EngineError, InputField, MoneyCents, Quantity, ResultEngine,
    money::{QUANTITY_SCALE, div_round_half_away},
};

/// Minimum length of a description when a detailed one is required.
pub const DETAILED_DESCRIPTION_MIN_CHARS: usize = 5;

/// Parses operator currency input into cents.
///
/// Strips everything except digits, `-` and `.`, then reads the longest
/// numeric prefix. Extra fraction digits are rounded to the cent. Returns
/// zero for empty or unparseable input.
///
/// ```rust
/// use engine::{MoneyCents, parse_currency};
///
/// assert_eq!(parse_currency("$1,234.50"), MoneyCents::new(123_450));
/// assert_eq!(parse_currency(""), MoneyCents::ZERO);
/// assert_eq!(parse_currency("abc"), MoneyCents::ZERO);
/// ```
pub fn parse_currency(raw: &str) -> MoneyCents {
    MoneyCents::new(lenient_fixed(raw, 2))
}

/// Parses operator quantity input (`"120"`, `"12.5 sqft"`). Zero on failure.
pub fn parse_quantity(raw: &str) -> Quantity {
    Quantity::from_thousandths(lenient_fixed(raw, QUANTITY_SCALE))
}

fn lenient_fixed(raw: &str, scale: u32) -> i64 {
    let filtered: String = raw
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '-' || *c == '.')
        .collect();

    let (negative, rest) = match filtered.strip_prefix('-') {
        Some(stripped) => (true, stripped),
        None => (false, filtered.as_str()),
    };

    let mut whole = String::new();
    let mut frac = String::new();
    let mut seen_point = false;
    for c in rest.chars() {
        match c {
            '0'..='9' if seen_point => frac.push(c),
            '0'..='9' => whole.push(c),
            '.' if !seen_point => seen_point = true,
            _ => break,
        }
    }
    if whole.is_empty() && frac.is_empty() {
        return 0;
    }

    let Some(magnitude) = fixed_magnitude(&whole, &frac, scale) else {
        return 0;
    };
    let Ok(value) = i64::try_from(magnitude) else {
        return 0;
    };
    if negative { -value } else { value }
}

fn fixed_magnitude(whole: &str, frac: &str, scale: u32) -> Option<i128> {
    let whole: i128 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    // Keep one extra digit so the last kept digit can be rounded.
    let kept = (scale + 1) as usize;
    let mut digits: i128 = 0;
    for position in 0..kept {
        let digit = frac
            .as_bytes()
            .get(position)
            .map_or(0, |b| i128::from(b - b'0'));
        digits = digits * 10 + digit;
    }
    let frac_scaled = div_round_half_away(digits, 10);
    whole
        .checked_mul(10_i128.pow(scale))?
        .checked_add(frac_scaled)
}

/// How strict a caller is about descriptions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptionRule {
    /// Anything non-blank.
    Required,
    /// At least [`DETAILED_DESCRIPTION_MIN_CHARS`] characters after trimming.
    Detailed,
}

/// A trimmed, validated description. Internal line breaks are kept verbatim.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Description(String);

impl TryFrom<String> for Description {
    type Error = EngineError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        normalize_description(&value, DescriptionRule::Required)
    }
}

impl From<Description> for String {
    fn from(value: Description) -> Self {
        value.0
    }
}

impl Description {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.0.lines()
    }
}

impl fmt::Display for Description {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Description {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Trims and validates a description.
pub fn normalize_description(raw: &str, rule: DescriptionRule) -> ResultEngine<Description> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(EngineError::validation(
            InputField::Description,
            "description must not be empty",
        ));
    }
    if rule == DescriptionRule::Detailed
        && trimmed.chars().count() < DETAILED_DESCRIPTION_MIN_CHARS
    {
        return Err(EngineError::validation(
            InputField::Description,
            format!(
                "please provide a detailed description (at least {DETAILED_DESCRIPTION_MIN_CHARS} characters)"
            ),
        ));
    }
    Ok(Description(trimmed.to_string()))
}

/// HTML-safe rendering of a description.
///
/// Only produced by [`render_description_for_display`], which takes the raw
/// [`Description`]; markup can't be fed back in and escaped twice.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayMarkup(String);

impl DisplayMarkup {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for DisplayMarkup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Escapes HTML-significant characters and turns line breaks into `<br>`.
pub fn render_description_for_display(description: &Description) -> DisplayMarkup {
    let mut out = String::with_capacity(description.0.len());
    let mut chars = description.0.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\r' | '\n' => out.push_str("<br>"),
            other => out.push(other),
        }
    }
    DisplayMarkup(out)
}
