use std::str::FromStr;

use rust_decimal::Decimal;

use crate::ir::Scalar;
use crate::locale::Locale;
use crate::value::Value;

/// Parse an already-stringified, unquoted scalar.
pub fn parse_scalar(kind: Scalar, s: &str, locale: &Locale) -> Result<Value, String> {
    match kind {
        Scalar::Bool => parse_bool(s).map(Value::Bool),
        Scalar::Char => parse_char(s).map(Value::Char),
        Scalar::I8 => parse_int::<i8>(s, locale).map(|v| Value::Int(v.into())),
        Scalar::I16 => parse_int::<i16>(s, locale).map(|v| Value::Int(v.into())),
        Scalar::I32 => parse_int::<i32>(s, locale).map(|v| Value::Int(v.into())),
        Scalar::I64 => parse_int::<i64>(s, locale).map(Value::Int),
        Scalar::U8 => parse_int::<u8>(s, locale).map(|v| Value::UInt(v.into())),
        Scalar::U16 => parse_int::<u16>(s, locale).map(|v| Value::UInt(v.into())),
        Scalar::U32 => parse_int::<u32>(s, locale).map(|v| Value::UInt(v.into())),
        Scalar::U64 => parse_int::<u64>(s, locale).map(Value::UInt),
        Scalar::F32 => parse_float::<f32>(s, locale).map(|v| Value::Float(v.into())),
        Scalar::F64 => parse_float::<f64>(s, locale).map(Value::Float),
    }
}

fn parse_bool(s: &str) -> Result<bool, String> {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if t.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err("expected `true` or `false`".into())
    }
}

fn parse_char(s: &str) -> Result<char, String> {
    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err("expected exactly one character".into()),
    }
}

// integers never accept group separators
fn parse_int<T>(s: &str, locale: &Locale) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    locale
        .delocalize_number(s, false)
        .parse::<T>()
        .map_err(|e| e.to_string())
}

fn parse_float<T>(s: &str, locale: &Locale) -> Result<T, String>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    locale
        .delocalize_number(s, true)
        .parse::<T>()
        .map_err(|e| e.to_string())
}

pub fn parse_decimal(s: &str, locale: &Locale) -> Result<Decimal, String> {
    let plain = locale.delocalize_number(s, true);
    Decimal::from_str(&plain)
        .or_else(|_| Decimal::from_scientific(&plain))
        .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_respect_range_and_sign() {
        let inv = Locale::INVARIANT;
        assert_eq!(parse_scalar(Scalar::I8, "-128", &inv), Ok(Value::Int(-128)));
        assert!(parse_scalar(Scalar::I8, "128", &inv).is_err());
        assert!(parse_scalar(Scalar::U32, "-1", &inv).is_err());
        assert_eq!(parse_scalar(Scalar::U64, " +18446744073709551615 ", &inv), Ok(Value::UInt(u64::MAX)));
        assert!(parse_scalar(Scalar::I32, "1,000", &inv).is_err());
        assert!(parse_scalar(Scalar::I32, "4.2", &inv).is_err());
    }

    #[test]
    fn floats_allow_grouping() {
        let inv = Locale::INVARIANT;
        assert_eq!(parse_scalar(Scalar::F64, "1,000.25", &inv), Ok(Value::Float(1000.25)));
        assert_eq!(parse_scalar(Scalar::F32, "0.5", &inv), Ok(Value::Float(0.5)));
        assert!(parse_scalar(Scalar::F64, "abc", &inv).is_err());
    }

    #[test]
    fn bools_and_chars() {
        let inv = Locale::INVARIANT;
        assert_eq!(parse_scalar(Scalar::Bool, "True", &inv), Ok(Value::Bool(true)));
        assert!(parse_scalar(Scalar::Bool, "1", &inv).is_err());
        assert_eq!(parse_scalar(Scalar::Char, "é", &inv), Ok(Value::Char('é')));
        assert!(parse_scalar(Scalar::Char, "ab", &inv).is_err());
    }

    #[test]
    fn decimals_under_locale() {
        let de = Locale::from_tag("de-DE").unwrap();
        assert_eq!(parse_decimal("1.234,50", &de), Ok(Decimal::new(123450, 2)));
        assert_eq!(parse_decimal("12.5", &Locale::INVARIANT), Ok(Decimal::new(125, 1)));
        assert_eq!(parse_decimal("1e3", &Locale::INVARIANT), Ok(Decimal::new(1000, 0)));
        assert!(parse_decimal("twelve", &Locale::INVARIANT).is_err());
    }
}
