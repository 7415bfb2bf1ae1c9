//! Value converter.
//!
//! Walks a generic tree node and a declared [`Ty`] in lock-step and produces a typed
//! [`Value`]. Dispatch is a single exhaustive `match` on the descriptor; the node is
//! only inspected once the descriptor has decided what it must look like.
//!
//! Policy per kind:
//! - scalars: stringify, strip surrounding quotes, parse under the locale
//! - strings: stringify verbatim
//! - enums: case-insensitive variant name, else numeric value
//! - dates: configured pattern (strict) or best-effort, ISO-8601 first
//! - containers and records: the node must already have the matching kind
pub mod arr;
pub mod num;
pub mod obj;
pub mod str;
pub mod time;

use crate::de::Options;
use crate::error::{ErrorKind, Path};
use crate::handler::HandlerRegistry;
use crate::ir::Ty;
use crate::registry::TypeRegistry;
use crate::value::Value;
use crate::{trace, Node};

/// Everything one mapping run reads. Borrowed for the duration of a call, never
/// mutated.
#[derive(Clone, Copy)]
pub(crate) struct Converter<'a> {
    pub options: &'a Options,
    pub types: &'a TypeRegistry,
    pub handlers: &'a HandlerRegistry,
}

impl Converter<'_> {
    pub fn convert(&self, ty: &Ty, node: &Node, path: &Path) -> Result<Value, ErrorKind> {
        trace!("convert {ty} at `{path}`");
        let locale = &self.options.locale;
        match ty {
            Ty::Scalar(kind) => {
                let raw = str::stringify(node, locale);
                num::parse_scalar(*kind, str::unquote(&raw), locale)
                    .map_err(|reason| ErrorKind::conversion(path, kind.name(), &*raw, reason))
            }
            Ty::Enum(name) => {
                let raw = str::stringify(node, locale);
                let Some(enum_ty) = self.types.get_enum(name) else {
                    return Err(ErrorKind::unsupported(path, format!("enum `{name}` is not registered")));
                };
                str::resolve_enum(enum_ty, &raw, locale)
                    .map(Value::Enum)
                    .map_err(|reason| ErrorKind::conversion(path, name.as_str(), &*raw, reason))
            }
            Ty::Uri => {
                let raw = str::stringify(node, locale);
                str::parse_uri(&raw)
                    .map(Value::Uri)
                    .map_err(|reason| ErrorKind::conversion(path, "uri", &*raw, reason))
            }
            Ty::String => Ok(Value::String(str::stringify(node, locale).into_owned())),
            Ty::DateTime | Ty::DateTimeOffset => {
                let raw = str::stringify(node, locale);
                let moment = match self.options.date_format.as_deref() {
                    Some(format) => time::parse_exact(&raw, format),
                    None => time::parse_loose(&raw),
                }
                .map_err(|reason| ErrorKind::conversion(path, ty.to_string(), &*raw, reason))?;
                Ok(match ty {
                    Ty::DateTime => Value::DateTime(moment.naive()),
                    _ => Value::DateTimeOffset(moment.fixed()),
                })
            }
            Ty::Decimal => {
                let raw = str::stringify(node, locale);
                num::parse_decimal(&raw, locale)
                    .map(Value::Decimal)
                    .map_err(|reason| ErrorKind::conversion(path, "decimal", &*raw, reason))
            }
            Ty::Uuid => {
                let raw = str::stringify(node, locale);
                str::parse_uuid(&raw)
                    .map(Value::Uuid)
                    .map_err(|reason| ErrorKind::conversion(path, "uuid", &*raw, reason))
            }
            Ty::Duration => {
                let raw = str::stringify(node, locale);
                time::parse_duration(&raw)
                    .map(Value::Duration)
                    .map_err(|reason| ErrorKind::conversion(path, "duration", &*raw, reason))
            }
            Ty::List(item) => self.build_list(item, node, path),
            Ty::Map { key, value } => self.build_map(key, value, node, path),
            Ty::Record(name) => self.create_and_map(name, node, path),
            Ty::Nullable(inner) => {
                if node.is_null() {
                    Ok(Value::Null)
                } else {
                    self.convert(inner, node, path)
                }
            }
        }
    }

    /// Convert a sequence element or map value. Null stays null for types that
    /// permit it and is a conversion failure otherwise.
    pub(crate) fn element(&self, ty: &Ty, node: &Node, path: &Path) -> Result<Value, ErrorKind> {
        if !node.is_null() {
            return self.convert(ty, node, path);
        }
        if ty.permits_null() {
            Ok(Value::Null)
        } else {
            Err(ErrorKind::conversion(path, ty.to_string(), "null", "null is not a valid value of this type"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Scalar;
    use crate::locale::Locale;
    use serde_json::json;

    fn run(options: &Options, ty: &Ty, node: &Node) -> Result<Value, ErrorKind> {
        let types = TypeRegistry::new();
        let handlers = HandlerRegistry::new();
        Converter { options, types: &types, handlers: &handlers }.convert(ty, node, &Path::root())
    }

    #[test]
    fn quoted_numbers_coerce() {
        let opts = Options::default();
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::I32), &json!("42")).unwrap(), Value::Int(42));
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::I32), &json!("\"42\"")).unwrap(), Value::Int(42));
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::F64), &json!(1.5)).unwrap(), Value::Float(1.5));
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::Bool), &json!(true)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn strings_are_verbatim() {
        let opts = Options::default();
        assert_eq!(run(&opts, &Ty::String, &json!("\"hi\"")).unwrap(), Value::String("\"hi\"".into()));
        assert_eq!(run(&opts, &Ty::String, &json!(12)).unwrap(), Value::String("12".into()));
    }

    #[test]
    fn locale_drives_float_round_trip() {
        let opts = Options::default().with_locale(Locale::from_tag("de-DE").unwrap());
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::F64), &json!(2.5)).unwrap(), Value::Float(2.5));
        assert_eq!(run(&opts, &Ty::Scalar(Scalar::F64), &json!("1.234,5")).unwrap(), Value::Float(1234.5));
        assert_eq!(run(&opts, &Ty::String, &json!(2.5)).unwrap(), Value::String("2,5".into()));
    }

    #[test]
    fn nullable_passes_null_through() {
        let opts = Options::default();
        let ty = Ty::nullable(Ty::Scalar(Scalar::I64));
        assert_eq!(run(&opts, &ty, &json!(null)).unwrap(), Value::Null);
        assert_eq!(run(&opts, &ty, &json!(7)).unwrap(), Value::Int(7));
    }

    #[test]
    fn failures_carry_raw_value_and_target() {
        let opts = Options::default();
        let err = run(&opts, &Ty::Scalar(Scalar::U8), &json!(300)).unwrap_err();
        match err {
            ErrorKind::Conversion { target, raw, .. } => {
                assert_eq!(target, "u8");
                assert_eq!(raw, "300");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn unregistered_enum_is_unsupported() {
        let err = run(&Options::default(), &Ty::enumeration("Color"), &json!("Red")).unwrap_err();
        assert!(matches!(err, ErrorKind::UnsupportedShape { .. }));
    }
}
