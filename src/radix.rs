//! Conversion between exact rationals and positional text in radices 2 to 36.
//!
//! ## Literal grammar
//!
//! ```text
//! literal  := ws* sign? body ws*
//! body     := digits "/" digits+
//!           | digits ("." digits)? (("e" | "E") sign? digits+)?
//! ```
//!
//! The body must start with a digit or with `.` followed by a digit. Digits are
//! `0-9` in every radix plus the letters valid in the radix (`a` is ten, up to
//! `z` in radix 36, case-insensitive). Decimal digits keep their value even
//! when it is not below the radix, so `5` still means five after switching to
//! binary. Fraction digits and the exponent are read in the same radix.
//! Because `e` is itself a digit from radix 15 upwards, the exponent marker
//! only exists in radices 2 to 14.
//!
//! ## Output
//!
//! Fraction mode is exact and always reparses to the same value. Positional
//! mode truncates after `precision` fractional digits, so it only round-trips
//! when the denominator divides `radix^precision`.

use crate::BaseError;
use nom::{
    IResult,
    branch::alt,
    bytes::complete::{take_while, take_while1},
    character::complete::{char, multispace0, one_of, satisfy},
    combinator::{map, opt, peek, recognize},
    sequence::{pair, preceded},
};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use thiserror::Error;

/// Largest exponent accepted in a literal such as `1e20`
pub const MAX_LITERAL_EXPONENT: u32 = 1 << 16;

/// A validated positional base
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Radix(u32);

impl Radix {
    pub const MIN: u32 = 2;
    pub const MAX: u32 = 36;
    pub const DECIMAL: Radix = Radix(10);

    pub fn new(base: u32) -> Result<Self, BaseError> {
        match base {
            b if b < Self::MIN => Err(BaseError::TooSmall),
            b if b > Self::MAX => Err(BaseError::TooLarge),
            b => Ok(Radix(b)),
        }
    }

    /// Radix from an already-rounded stack value
    pub fn from_integer(n: &BigInt) -> Result<Self, BaseError> {
        if n < &BigInt::from(Self::MIN) {
            Err(BaseError::TooSmall)
        } else {
            // anything above MAX fails in new(), including values too wide for u32
            Self::new(n.to_u32().unwrap_or(u32::MAX))
        }
    }

    /// Radix from one of the short names accepted by the `base` operator
    pub fn from_name(name: &str) -> Result<Self, BaseError> {
        let base = match name {
            "bin" | "b" => 2,
            "sex" | "s" => 6,
            "oct" | "o" => 8,
            "dec" | "d" => 10,
            "doz" => 12,
            "hex" | "h" | "x" => 16,
            _ => return Err(BaseError::UnknownName(name.to_string())),
        };
        Ok(Radix(base))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl Default for Radix {
    fn default() -> Self {
        Radix::DECIMAL
    }
}

/// Failure to read a literal
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseRationalError {
    /// The text does not match the literal grammar. Callers treat this as "try
    /// something else" rather than as a failure.
    #[error("{0} is not a valid rational")]
    NotANumber(String),
    #[error("zero denominator")]
    ZeroDenominator,
    #[error("exponent out of range")]
    ExponentOutOfRange,
}

enum Tail<'a> {
    Denominator(&'a str),
    Positional {
        fraction: Option<&'a str>,
        exponent: Option<(bool, &'a str)>,
    },
}

struct Literal<'a> {
    negative: bool,
    integer: &'a str,
    tail: Tail<'a>,
}

fn sign(input: &str) -> IResult<&str, bool> {
    map(opt(one_of("+-")), |s| s == Some('-'))(input)
}

fn literal(input: &str, base: u32) -> IResult<&str, Literal<'_>> {
    let is_digit = move |c: char| c.is_ascii_digit() || c.is_digit(base);

    let (input, _) = multispace0(input)?;
    let (input, negative) = sign(input)?;
    let (input, _) = peek(alt((
        recognize(satisfy(is_digit)),
        recognize(pair(char('.'), satisfy(is_digit))),
    )))(input)?;
    let (input, integer) = take_while(is_digit)(input)?;
    let (input, tail) = alt((
        map(preceded(char('/'), take_while1(is_digit)), Tail::Denominator),
        map(
            pair(
                opt(preceded(char('.'), take_while(is_digit))),
                opt(preceded(one_of("eE"), pair(sign, take_while1(is_digit)))),
            ),
            |(fraction, exponent)| Tail::Positional { fraction, exponent },
        ),
    ))(input)?;
    let (input, _) = multispace0(input)?;

    Ok((
        input,
        Literal {
            negative,
            integer,
            tail,
        },
    ))
}

/// Positional value of a digit run already accepted by the grammar
fn digits_value(digits: &str, base: u32) -> BigInt {
    digits
        .chars()
        .filter_map(|c| c.to_digit(Radix::MAX))
        .fold(BigInt::zero(), |acc, d| acc * base + d)
}

/// Read `text` as an exact rational in `radix`
pub fn parse_rational(text: &str, radix: Radix) -> Result<BigRational, ParseRationalError> {
    let base = radix.get();
    let literal = match literal(text, base) {
        Ok(("", literal)) => literal,
        _ => return Err(ParseRationalError::NotANumber(text.to_string())),
    };

    let mut numer = digits_value(literal.integer, base);
    let mut denom = BigInt::one();
    match literal.tail {
        Tail::Denominator(digits) => denom = digits_value(digits, base),
        Tail::Positional { fraction, exponent } => {
            if let Some(fraction) = fraction.filter(|f| !f.is_empty()) {
                let scale = BigInt::from(base).pow(fraction.len() as u32);
                numer = numer * &scale + digits_value(fraction, base);
                denom = scale;
            }
            if let Some((negative, digits)) = exponent {
                let exp = digits_value(digits, base)
                    .to_u32()
                    .filter(|e| *e <= MAX_LITERAL_EXPONENT)
                    .ok_or(ParseRationalError::ExponentOutOfRange)?;
                let power = BigInt::from(base).pow(exp);
                if negative {
                    denom *= power;
                } else {
                    numer *= power;
                }
            }
        }
    }

    if denom.is_zero() {
        return Err(ParseRationalError::ZeroDenominator);
    }
    if literal.negative {
        numer = -numer;
    }
    Ok(BigRational::new(numer, denom))
}

/// Read `text` and round it to the nearest integer
pub fn parse_integer(text: &str, radix: Radix) -> Result<BigInt, ParseRationalError> {
    parse_rational(text, radix).map(|r| round_to_integer(&r))
}

/// Nearest integer, ties to even
pub fn round_to_integer(value: &BigRational) -> BigInt {
    let floor = value.floor();
    let diff = value - &floor;
    let half = BigRational::new(BigInt::one(), BigInt::from(2));
    let floor = floor.to_integer();
    match diff.cmp(&half) {
        std::cmp::Ordering::Less => floor,
        std::cmp::Ordering::Greater => floor + 1,
        std::cmp::Ordering::Equal if floor.is_even() => floor,
        std::cmp::Ordering::Equal => floor + 1,
    }
}

/// Signed integer in `radix`, lowercase digits
pub fn format_integer(n: &BigInt, radix: Radix) -> String {
    n.to_str_radix(radix.get())
}

/// Render a rational either as `num[/den]` or as a radix-point expansion
/// truncated to `precision` fractional digits with trailing zeros removed.
pub fn format_rational(
    value: &BigRational,
    radix: Radix,
    fraction_mode: bool,
    precision: usize,
) -> String {
    if fraction_mode {
        return if value.is_integer() {
            format_integer(value.numer(), radix)
        } else {
            format!(
                "{}/{}",
                format_integer(value.numer(), radix),
                format_integer(value.denom(), radix)
            )
        };
    }

    let magnitude = value.abs();
    let (integral, remainder) = magnitude.numer().div_rem(magnitude.denom());
    let scale = BigInt::from(radix.get()).pow(precision as u32);
    let scaled = remainder * scale / magnitude.denom();

    let mut text = format_integer(&integral, radix);
    if !scaled.is_zero() {
        let digits = format_integer(&scaled, radix);
        let padded = format!("{:0>width$}", digits, width = precision);
        text.push('.');
        text.push_str(padded.trim_end_matches('0'));
    }
    if value.is_negative() && (text != "0") {
        text.insert(0, '-');
    }
    text
}
