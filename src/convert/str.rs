use std::borrow::Cow;

use serde_json::Value;
use url::Url;
use uuid::Uuid;

use crate::ir::EnumTy;
use crate::locale::Locale;
use crate::naming::name_variants;
use crate::value::{EnumValue, UriRef};

/// Text form of a node as every scalar conversion sees it. Strings are returned
/// as-is, floats use the locale's decimal separator, null is empty, and containers
/// render as compact JSON.
pub fn stringify<'n>(node: &'n Value, locale: &Locale) -> Cow<'n, str> {
    match node {
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Borrowed(if *b { "true" } else { "false" }),
        Value::String(s) => Cow::Borrowed(s),
        Value::Number(n) => {
            if n.is_i64() || n.is_u64() {
                Cow::Owned(n.to_string())
            } else {
                Cow::Owned(n.as_f64().map(|f| locale.format_float(f)).unwrap_or_else(|| n.to_string()))
            }
        }
        Value::Array(_) | Value::Object(_) => Cow::Owned(node.to_string()),
    }
}

/// Strip surrounding `"` characters; scalars never legitimately contain them.
pub fn unquote(s: &str) -> &str {
    s.trim_matches('"')
}

pub fn resolve_enum(ty: &EnumTy, raw: &str, locale: &Locale) -> Result<EnumValue, String> {
    let wanted = raw.trim();
    let by_name = ty.variants.iter().find(|(name, _)| {
        name_variants(name, locale)
            .iter()
            .any(|v| locale.eq_ignore_case(v, wanted))
    });
    if let Some((variant, discriminant)) = by_name {
        return Ok(EnumValue { variant: variant.clone(), discriminant: *discriminant });
    }
    if let Ok(n) = locale.delocalize_number(unquote(wanted), false).parse::<i64>() {
        if let Some((variant, discriminant)) = ty.variants.iter().find(|(_, v)| *v == n) {
            return Ok(EnumValue { variant: variant.clone(), discriminant: *discriminant });
        }
        return Err(format!("no variant of {} has value {n}", ty.name));
    }
    Err(format!("no variant of {} is named {wanted:?}", ty.name))
}

/// Absolute URL when it parses as one, otherwise a relative reference.
pub fn parse_uri(raw: &str) -> Result<UriRef, String> {
    match Url::parse(raw) {
        Ok(url) => Ok(UriRef::Absolute(url)),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            if raw.chars().any(|c| c.is_whitespace() || c.is_control()) {
                return Err("relative reference contains whitespace or control characters".into());
            }
            Ok(UriRef::Relative(raw.to_owned()))
        }
        Err(e) => Err(e.to_string()),
    }
}

pub fn parse_uuid(raw: &str) -> Result<Uuid, String> {
    let t = raw.trim();
    if t.is_empty() {
        return Ok(Uuid::nil());
    }
    Uuid::parse_str(t).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn color() -> EnumTy {
        EnumTy {
            name: "Color".into(),
            variants: vec![("Red".into(), 1), ("DarkBlue".into(), 2), ("Green".into(), 4)],
        }
    }

    #[test]
    fn stringify_by_kind() {
        let inv = Locale::INVARIANT;
        assert_eq!(stringify(&json!(null), &inv), "");
        assert_eq!(stringify(&json!(false), &inv), "false");
        assert_eq!(stringify(&json!(-3), &inv), "-3");
        assert_eq!(stringify(&json!(42.0), &inv), "42");
        assert_eq!(stringify(&json!(0.25), &inv), "0.25");
        assert_eq!(stringify(&json!({"a": [1]}), &inv), r#"{"a":[1]}"#);
        assert_eq!(unquote(r#""7""#), "7");
    }

    #[test]
    fn enums_by_name_or_value() {
        let inv = Locale::INVARIANT;
        let e = color();
        assert_eq!(resolve_enum(&e, "red", &inv).unwrap().variant, "Red");
        assert_eq!(resolve_enum(&e, "dark_blue", &inv).unwrap().variant, "DarkBlue");
        assert_eq!(resolve_enum(&e, "DARK-BLUE", &inv).unwrap().variant, "DarkBlue");
        assert_eq!(resolve_enum(&e, "4", &inv).unwrap().variant, "Green");
        assert!(resolve_enum(&e, "3", &inv).is_err());
        assert!(resolve_enum(&e, "purple", &inv).is_err());
    }

    #[test]
    fn uris_absolute_and_relative() {
        assert!(parse_uri("https://example.com/a?b=1").unwrap().is_absolute());
        assert_eq!(parse_uri("/orders/7").unwrap(), UriRef::Relative("/orders/7".into()));
        assert!(parse_uri("not a uri").is_err());
        assert!(parse_uri("http://[::1").is_err());
    }

    #[test]
    fn uuids() {
        assert_eq!(parse_uuid("").unwrap(), Uuid::nil());
        assert_eq!(
            parse_uuid("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap().to_string(),
            "67e55044-10b1-426f-9247-bb680e5fe0c8"
        );
        assert!(parse_uuid("67e55044").is_err());
    }
}
