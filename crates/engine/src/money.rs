use std::{
    fmt,
    ops::{Add, AddAssign, Neg, Sub, SubAssign},
    str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::{EngineError, InputField};

/// Fraction digits carried by [`Quantity`].
pub(crate) const QUANTITY_SCALE: u32 = 3;

/// Signed money amount represented as **integer cents**.
///
/// Use this type for **all** monetary values in the engine (rates, flat
/// amounts, line amounts, totals) to avoid floating-point drift.
///
/// # Examples
///
/// ```rust
/// use engine::MoneyCents;
///
/// let amount = MoneyCents::new(540_00);
/// assert_eq!(amount.cents(), 54000);
/// assert_eq!(amount.to_string(), "$540.00");
/// ```
///
/// Parsing from a clean decimal (accepts `.` or `,` as decimal separator;
/// rejects > 2 decimals). For raw form input use [`parse_currency`].
///
/// ```rust
/// use engine::MoneyCents;
///
/// assert_eq!("10".parse::<MoneyCents>().unwrap().cents(), 1000);
/// assert_eq!("4,5".parse::<MoneyCents>().unwrap().cents(), 450);
/// assert!("12.345".parse::<MoneyCents>().is_err());
/// ```
///
/// [`parse_currency`]: crate::parse_currency
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct MoneyCents(i64);

impl MoneyCents {
    pub const ZERO: MoneyCents = MoneyCents(0);

    /// Creates a new amount from integer cents.
    #[must_use]
    pub const fn new(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns the raw value in cents.
    #[must_use]
    pub const fn cents(self) -> i64 {
        self.0
    }

    /// Returns `true` if the amount is 0.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if the amount is positive.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Checked addition (returns `None` on overflow).
    #[must_use]
    pub fn checked_add(self, rhs: MoneyCents) -> Option<MoneyCents> {
        self.0.checked_add(rhs.0).map(MoneyCents)
    }

    /// Sums `amounts`, returning `None` as soon as the running total
    /// overflows.
    #[must_use]
    pub fn checked_sum<I>(amounts: I) -> Option<MoneyCents>
    where
        I: IntoIterator<Item = MoneyCents>,
    {
        amounts
            .into_iter()
            .try_fold(MoneyCents::ZERO, MoneyCents::checked_add)
    }

    /// Multiplies a rate by a quantity.
    ///
    /// The product is exact in thousandths of a cent and rounded half away
    /// from zero to whole cents, so whole quantities never round. Returns
    /// `None` on overflow.
    #[must_use]
    pub fn checked_mul_quantity(self, quantity: Quantity) -> Option<MoneyCents> {
        let product = i128::from(self.0).checked_mul(i128::from(quantity.thousandths()))?;
        let cents = div_round_half_away(product, i128::from(Quantity::ONE.0));
        i64::try_from(cents).ok().map(MoneyCents)
    }

    /// Applies a rate expressed in basis points, rounding half away from zero.
    #[must_use]
    pub fn checked_mul_bps(self, bps: u32) -> Option<MoneyCents> {
        let product = i128::from(self.0).checked_mul(i128::from(bps))?;
        let cents = div_round_half_away(product, 10_000);
        i64::try_from(cents).ok().map(MoneyCents)
    }
}

pub(crate) fn div_round_half_away(numerator: i128, denominator: i128) -> i128 {
    let quotient = numerator / denominator;
    let remainder = numerator % denominator;
    if remainder.abs() * 2 >= denominator.abs() {
        if (numerator < 0) != (denominator < 0) {
            quotient - 1
        } else {
            quotient + 1
        }
    } else {
        quotient
    }
}

impl fmt::Display for MoneyCents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let dollars = abs / 100;
        let cents = abs % 100;
        write!(f, "{sign}${dollars}.{cents:02}")
    }
}

impl From<i64> for MoneyCents {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl From<MoneyCents> for i64 {
    fn from(value: MoneyCents) -> Self {
        value.0
    }
}

impl Add for MoneyCents {
    type Output = MoneyCents;

    fn add(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 + rhs.0)
    }
}

impl AddAssign for MoneyCents {
    fn add_assign(&mut self, rhs: MoneyCents) {
        self.0 += rhs.0;
    }
}

impl Sub for MoneyCents {
    type Output = MoneyCents;

    fn sub(self, rhs: MoneyCents) -> Self::Output {
        MoneyCents(self.0 - rhs.0)
    }
}

impl SubAssign for MoneyCents {
    fn sub_assign(&mut self, rhs: MoneyCents) {
        self.0 -= rhs.0;
    }
}

impl Neg for MoneyCents {
    type Output = MoneyCents;

    fn neg(self) -> Self::Output {
        MoneyCents(-self.0)
    }
}

impl FromStr for MoneyCents {
    type Err = EngineError;

    /// Parses a decimal string into cents.
    ///
    /// Accepts `.` or `,` as decimal separator and an optional leading `+`/`-`.
    ///
    /// Validation rules:
    /// - max 2 fractional digits (rejects `12.345`)
    /// - rejects empty/invalid strings
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, 2)
            .map(MoneyCents)
            .map_err(|reason| EngineError::validation(InputField::Amount, reason))
    }
}

/// Non-negative fixed-point quantity with three fraction digits.
///
/// ```rust
/// use engine::Quantity;
///
/// let area: Quantity = "12.5".parse().unwrap();
/// assert_eq!(area.thousandths(), 12_500);
/// assert_eq!(area.to_string(), "12.5");
/// assert_eq!(Quantity::whole(120).to_string(), "120");
/// ```
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
#[repr(transparent)]
pub struct Quantity(i64);

impl Quantity {
    pub const ZERO: Quantity = Quantity(0);
    pub const ONE: Quantity = Quantity(1_000);

    #[must_use]
    pub const fn from_thousandths(value: i64) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn whole(units: i64) -> Self {
        Self(units * 1_000)
    }

    #[must_use]
    pub const fn thousandths(self) -> i64 {
        self.0
    }

    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let units = abs / 1_000;
        let frac = abs % 1_000;
        if frac == 0 {
            return write!(f, "{sign}{units}");
        }
        let digits = format!("{frac:03}");
        write!(f, "{sign}{units}.{}", digits.trim_end_matches('0'))
    }
}

impl FromStr for Quantity {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fixed(s, QUANTITY_SCALE)
            .map(Quantity)
            .map_err(|reason| EngineError::validation(InputField::Quantity, reason))
    }
}

/// Strict fixed-point parser shared by [`MoneyCents`] and [`Quantity`].
fn parse_fixed(s: &str, scale: u32) -> Result<i64, &'static str> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return Err("empty value");
    }

    let (negative, rest) = if let Some(stripped) = trimmed.strip_prefix('-') {
        (true, stripped)
    } else if let Some(stripped) = trimmed.strip_prefix('+') {
        (false, stripped)
    } else {
        (false, trimmed)
    };

    let rest = rest.trim();
    if rest.is_empty() {
        return Err("empty value");
    }

    let rest = rest.replace(',', ".");
    let mut parts = rest.split('.');
    let whole_str = parts.next().ok_or("invalid value")?;
    let frac_str = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err("invalid value");
    }

    if whole_str.is_empty() || !whole_str.chars().all(|c| c.is_ascii_digit()) {
        return Err("invalid value");
    }
    if !frac_str.chars().all(|c| c.is_ascii_digit()) {
        return Err("invalid value");
    }
    if frac_str.len() > scale as usize {
        return Err("too many decimals");
    }

    let whole: i64 = whole_str.parse().map_err(|_| "value too large")?;
    let mut frac: i64 = 0;
    for position in 0..scale as usize {
        let digit = frac_str
            .as_bytes()
            .get(position)
            .map_or(0, |b| i64::from(b - b'0'));
        frac = frac * 10 + digit;
    }

    let total = whole
        .checked_mul(10_i64.pow(scale))
        .and_then(|v| v.checked_add(frac))
        .ok_or("value too large")?;

    Ok(if negative { -total } else { total })
}
