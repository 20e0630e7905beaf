use std::fmt;

/// Money is held as integer cents so sums over many transactions stay exact.
/// 1 unit = 100 cents, so 50.00 = 5000 cents.
pub type Cents = i64;

/// Largest accepted amount, 100 billion units. Sums of capped amounts stay
/// far from `i64::MAX` and every capped value is exact as an `f64`.
pub const MAX_AMOUNT_CENTS: Cents = 10_000_000_000_000;

/// Reject amounts whose magnitude exceeds [`MAX_AMOUNT_CENTS`].
pub fn check_amount(cents: Cents) -> Result<Cents, ParseCentsError> {
    if cents.checked_abs().is_none_or(|abs| abs > MAX_AMOUNT_CENTS) {
        return Err(ParseCentsError::Overflow);
    }
    Ok(cents)
}

/// Format cents as a plain decimal string.
/// Example: 5000 -> "50.00", -1234 -> "-12.34"
pub fn format_cents(cents: Cents) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs_cents = cents.abs();
    format!("{}{}.{:02}", sign, abs_cents / 100, abs_cents % 100)
}

/// Parse a decimal string into cents.
/// Example: "50.00" -> 5000, "12.5" -> 1250, "100" -> 10000.
/// Digits past the second decimal place must be zeros.
pub fn parse_cents(input: &str) -> Result<Cents, ParseCentsError> {
    let input = input.trim();
    let (negative, digits) = match input.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, input),
    };

    let (units_str, fraction_str) = match digits.split_once('.') {
        Some((units, fraction)) => (units, fraction),
        None => (digits, ""),
    };

    if units_str.is_empty() && fraction_str.is_empty() {
        return Err(ParseCentsError::InvalidFormat);
    }
    if !units_str.chars().all(|c| c.is_ascii_digit())
        || !fraction_str.chars().all(|c| c.is_ascii_digit())
    {
        return Err(ParseCentsError::InvalidFormat);
    }

    let units: i64 = if units_str.is_empty() {
        0
    } else {
        units_str.parse().map_err(|_| ParseCentsError::Overflow)?
    };

    if fraction_str.len() > 2 && fraction_str[2..].chars().any(|c| c != '0') {
        return Err(ParseCentsError::TooPrecise);
    }
    let fraction: i64 = match fraction_str.len() {
        0 => 0,
        1 => fraction_str.parse::<i64>().map_err(|_| ParseCentsError::InvalidFormat)? * 10,
        _ => fraction_str[..2]
            .parse()
            .map_err(|_| ParseCentsError::InvalidFormat)?,
    };

    let cents = units
        .checked_mul(100)
        .and_then(|c| c.checked_add(fraction))
        .ok_or(ParseCentsError::Overflow)?;
    check_amount(if negative { -cents } else { cents })
}

/// Convert a floating point amount (as sent by JSON clients) into cents.
/// Only binary representation noise is rounded away; a genuine third
/// decimal place is rejected.
pub fn cents_from_f64(amount: f64) -> Result<Cents, ParseCentsError> {
    if !amount.is_finite() {
        return Err(ParseCentsError::InvalidFormat);
    }
    let scaled = amount * 100.0;
    let cents = scaled.round();
    if cents.abs() > MAX_AMOUNT_CENTS as f64 {
        return Err(ParseCentsError::Overflow);
    }
    if (scaled - cents).abs() > 1e-6 {
        return Err(ParseCentsError::TooPrecise);
    }
    Ok(cents as Cents)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseCentsError {
    InvalidFormat,
    TooPrecise,
    Overflow,
}

impl fmt::Display for ParseCentsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseCentsError::InvalidFormat => write!(f, "invalid money format"),
            ParseCentsError::TooPrecise => {
                write!(f, "amounts are limited to two decimal places")
            }
            ParseCentsError::Overflow => write!(
                f,
                "amount must not exceed {}",
                format_cents(MAX_AMOUNT_CENTS)
            ),
        }
    }
}

impl std::error::Error for ParseCentsError {}

/// Serde adapter that exposes a `Cents` field as a decimal number.
///
/// Accepts JSON integers (`30`), floats (`12.5`) and decimal strings
/// (`"12.50"`) on input; always writes a number (`12.5`).
pub mod decimal {
    use serde::{Deserialize, Deserializer, Serializer, de};

    use super::{Cents, ParseCentsError, cents_from_f64, check_amount, parse_cents};

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAmount {
        Integer(i64),
        Float(f64),
        Text(String),
    }

    pub fn serialize<S>(cents: &Cents, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(*cents as f64 / 100.0)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Cents, D::Error>
    where
        D: Deserializer<'de>,
    {
        match RawAmount::deserialize(deserializer)? {
            RawAmount::Integer(units) => units
                .checked_mul(100)
                .ok_or(ParseCentsError::Overflow)
                .and_then(check_amount)
                .map_err(de::Error::custom),
            RawAmount::Float(value) => cents_from_f64(value).map_err(de::Error::custom),
            RawAmount::Text(text) => parse_cents(&text).map_err(de::Error::custom),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Priced {
        #[serde(with = "decimal")]
        amount: Cents,
    }

    #[test]
    fn test_format_cents() {
        assert_eq!(format_cents(5000), "50.00");
        assert_eq!(format_cents(1234), "12.34");
        assert_eq!(format_cents(1), "0.01");
        assert_eq!(format_cents(0), "0.00");
        assert_eq!(format_cents(-1), "-0.01");
    }

    #[test]
    fn test_parse_cents() {
        assert_eq!(parse_cents("50.00"), Ok(5000));
        assert_eq!(parse_cents("50"), Ok(5000));
        assert_eq!(parse_cents("12.5"), Ok(1250));
        assert_eq!(parse_cents(".50"), Ok(50));
        assert_eq!(parse_cents("-50.00"), Ok(-5000));
        assert_eq!(parse_cents("12.500"), Ok(1250));
    }

    #[test]
    fn test_sub_cent_input_is_rejected() {
        assert_eq!(parse_cents("100.999"), Err(ParseCentsError::TooPrecise));
        assert_eq!(parse_cents("12.349"), Err(ParseCentsError::TooPrecise));
        assert_eq!(cents_from_f64(12.349), Err(ParseCentsError::TooPrecise));
        assert_eq!(cents_from_f64(0.004), Err(ParseCentsError::TooPrecise));
        // 0.29 * 100 is 28.999999999999996 in binary floating point
        assert_eq!(cents_from_f64(0.29), Ok(29));
        assert!(serde_json::from_str::<Priced>(r#"{"amount": "12.349"}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"amount": 12.349}"#).is_err());
    }

    #[test]
    fn test_amounts_above_cap_are_rejected() {
        assert_eq!(check_amount(MAX_AMOUNT_CENTS), Ok(MAX_AMOUNT_CENTS));
        assert_eq!(check_amount(-MAX_AMOUNT_CENTS), Ok(-MAX_AMOUNT_CENTS));
        assert_eq!(check_amount(MAX_AMOUNT_CENTS + 1), Err(ParseCentsError::Overflow));
        assert_eq!(check_amount(i64::MIN), Err(ParseCentsError::Overflow));
        assert_eq!(parse_cents("100000000000.01"), Err(ParseCentsError::Overflow));
        assert_eq!(cents_from_f64(1e12), Err(ParseCentsError::Overflow));

        let max = serde_json::from_str::<Priced>(r#"{"amount": 100000000000}"#).unwrap();
        assert_eq!(max.amount, MAX_AMOUNT_CENTS);
        assert!(serde_json::from_str::<Priced>(r#"{"amount": 100000000001}"#).is_err());
        assert!(serde_json::from_str::<Priced>(r#"{"amount": 92233720368547758}"#).is_err());
    }

    #[test]
    fn test_parse_cents_invalid() {
        assert!(parse_cents("abc").is_err());
        assert!(parse_cents("12.34.56").is_err());
        assert!(parse_cents("").is_err());
        assert!(parse_cents("1e5").is_err());
        assert_eq!(
            parse_cents("99999999999999999999"),
            Err(ParseCentsError::Overflow)
        );
    }

    #[test]
    fn test_decimal_accepts_numbers_and_strings() {
        let from_int: Priced = serde_json::from_str(r#"{"amount": 30}"#).unwrap();
        assert_eq!(from_int.amount, 3000);

        let from_float: Priced = serde_json::from_str(r#"{"amount": 12.5}"#).unwrap();
        assert_eq!(from_float.amount, 1250);

        let from_text: Priced = serde_json::from_str(r#"{"amount": "0.10"}"#).unwrap();
        assert_eq!(from_text.amount, 10);

        assert!(serde_json::from_str::<Priced>(r#"{"amount": "ten"}"#).is_err());
    }

    #[test]
    fn test_decimal_serializes_as_number() {
        let json = serde_json::to_value(Priced { amount: 1999 }).unwrap();
        assert_eq!(json["amount"], serde_json::json!(19.99));
    }
}
