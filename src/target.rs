//! Bridge between Rust types and descriptors.
//!
//! A [`Target`] names its descriptor, registers whatever named types that
//! descriptor refers to, and rebuilds itself from the typed [`Value`] the converter
//! produced. Records are described by hand:
//!
//! ```
//! use json_typemap::{ErrorKind, Target, Ty, TypeRegistry, Value};
//!
//! struct Point { x: f64, y: f64 }
//!
//! impl Target for Point {
//!     fn ty() -> Ty { Ty::record("Point") }
//!     fn register(types: &mut TypeRegistry) {
//!         if let Some(rec) = types.record("Point") {
//!             rec.field::<f64>("X").field::<f64>("Y").finish();
//!         }
//!     }
//!     fn from_value(value: Value) -> Result<Self, ErrorKind> {
//!         let mut rec = value.into_record()?;
//!         Ok(Point { x: rec.take_as("X")?, y: rec.take_as("Y")? })
//!     }
//! }
//! ```
use std::collections::{BTreeMap, HashMap};
use std::hash::BuildHasher;

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta, Utc};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ErrorKind, Path};
use crate::ir::{Scalar, Ty};
use crate::registry::TypeRegistry;
use crate::value::{EnumValue, Record, UriRef, Value};

pub trait Target: Sized {
    fn ty() -> Ty;

    /// Register named records/enums reachable from [`ty`](Target::ty).
    fn register(_types: &mut TypeRegistry) {}

    fn from_value(value: Value) -> Result<Self, ErrorKind>;
}

fn unexpected(expected: &str, value: &Value) -> ErrorKind {
    ErrorKind::ShapeMismatch {
        path: Path::root(),
        expected: expected.to_owned(),
        found: value.kind().to_owned(),
    }
}

impl Value {
    pub fn into_record(self) -> Result<Record, ErrorKind> {
        match self {
            Value::Record(rec) => Ok(rec),
            other => Err(unexpected("record", &other)),
        }
    }
}

impl Record {
    /// Move field `name` out and convert it; errors point below the field.
    pub fn take_as<T: Target>(&mut self, name: &str) -> Result<T, ErrorKind> {
        T::from_value(self.take(name)).map_err(|e| e.prefixed(&Path::root().field(name)))
    }
}

// ------------------------------ Scalars ---------------------------------- //

macro_rules! int_target {
    ($($t:ty => $scalar:ident),* $(,)?) => {$(
        impl Target for $t {
            fn ty() -> Ty { Ty::Scalar(Scalar::$scalar) }

            fn from_value(value: Value) -> Result<Self, ErrorKind> {
                let name = Scalar::$scalar.name();
                let converted = match value {
                    Value::Int(i) => <$t>::try_from(i).map_err(|e| (i.to_string(), e.to_string())),
                    Value::UInt(u) => <$t>::try_from(u).map_err(|e| (u.to_string(), e.to_string())),
                    other => return Err(unexpected(name, &other)),
                };
                converted.map_err(|(raw, e)| ErrorKind::conversion(&Path::root(), name, raw, e))
            }
        }
    )*};
}

int_target!(
    i8 => I8, i16 => I16, i32 => I32, i64 => I64,
    u8 => U8, u16 => U16, u32 => U32, u64 => U64,
);

macro_rules! simple_target {
    ($($t:ty => $ty:expr, $variant:ident, $expected:literal);* $(;)?) => {$(
        impl Target for $t {
            fn ty() -> Ty { $ty }

            fn from_value(value: Value) -> Result<Self, ErrorKind> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(unexpected($expected, &other)),
                }
            }
        }
    )*};
}

simple_target! {
    bool => Ty::Scalar(Scalar::Bool), Bool, "bool";
    char => Ty::Scalar(Scalar::Char), Char, "char";
    f64 => Ty::Scalar(Scalar::F64), Float, "f64";
    String => Ty::String, String, "string";
    NaiveDateTime => Ty::DateTime, DateTime, "datetime";
    DateTime<FixedOffset> => Ty::DateTimeOffset, DateTimeOffset, "datetimeoffset";
    Decimal => Ty::Decimal, Decimal, "decimal";
    Uuid => Ty::Uuid, Uuid, "uuid";
    TimeDelta => Ty::Duration, Duration, "duration";
    UriRef => Ty::Uri, Uri, "uri";
}

impl Target for f32 {
    fn ty() -> Ty { Ty::Scalar(Scalar::F32) }

    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Float(f) => Ok(f as f32),
            other => Err(unexpected("f32", &other)),
        }
    }
}

impl Target for DateTime<Utc> {
    fn ty() -> Ty { Ty::DateTimeOffset }

    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        DateTime::<FixedOffset>::from_value(value).map(|dt| dt.with_timezone(&Utc))
    }
}

// ----------------------------- Containers -------------------------------- //

impl<T: Target> Target for Option<T> {
    fn ty() -> Ty {
        match T::ty() {
            ty @ Ty::Nullable(_) => ty,
            ty => Ty::nullable(ty),
        }
    }

    fn register(types: &mut TypeRegistry) { T::register(types) }

    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl<T: Target> Target for Box<T> {
    fn ty() -> Ty { T::ty() }
    fn register(types: &mut TypeRegistry) { T::register(types) }
    fn from_value(value: Value) -> Result<Self, ErrorKind> { T::from_value(value).map(Box::new) }
}

impl<T: Target> Target for Vec<T> {
    fn ty() -> Ty { Ty::list(T::ty()) }

    fn register(types: &mut TypeRegistry) { T::register(types) }

    fn from_value(value: Value) -> Result<Self, ErrorKind> {
        let items = match value {
            Value::List(items) => items,
            other => return Err(unexpected("list", &other)),
        };
        items
            .into_iter()
            .enumerate()
            .map(|(i, item)| T::from_value(item).map_err(|e| e.prefixed(&Path::root().index(i))))
            .collect()
    }
}

fn map_entries<T: Target>(value: Value) -> Result<impl Iterator<Item = Result<(String, T), ErrorKind>>, ErrorKind> {
    let entries = match value {
        Value::Map(entries) => entries,
        other => return Err(unexpected("map", &other)),
    };
    Ok(entries.into_iter().map(|(k, v)| {
        let converted = T::from_value(v).map_err(|e| e.prefixed(&Path::root().key(&k)))?;
        Ok((k, converted))
    }))
}

impl<T: Target> Target for IndexMap<String, T> {
    fn ty() -> Ty { Ty::map(Ty::String, T::ty()) }
    fn register(types: &mut TypeRegistry) { T::register(types) }
    fn from_value(value: Value) -> Result<Self, ErrorKind> { map_entries(value)?.collect() }
}

impl<T: Target, S: BuildHasher + Default> Target for HashMap<String, T, S> {
    fn ty() -> Ty { Ty::map(Ty::String, T::ty()) }
    fn register(types: &mut TypeRegistry) { T::register(types) }
    fn from_value(value: Value) -> Result<Self, ErrorKind> { map_entries(value)?.collect() }
}

impl<T: Target> Target for BTreeMap<String, T> {
    fn ty() -> Ty { Ty::map(Ty::String, T::ty()) }
    fn register(types: &mut TypeRegistry) { T::register(types) }
    fn from_value(value: Value) -> Result<Self, ErrorKind> { map_entries(value)?.collect() }
}

/// Enums described at runtime: the Rust side picks the variant from its name.
pub trait EnumTarget: Sized {
    const NAME: &'static str;
    const VARIANTS: &'static [(&'static str, i64)];

    fn from_variant(variant: &str) -> Option<Self>;
}

/// Implements [`Target`] for an [`EnumTarget`] type.
#[macro_export]
macro_rules! enum_target {
    ($t:ty) => {
        impl $crate::Target for $t {
            fn ty() -> $crate::Ty { $crate::Ty::enumeration(<$t as $crate::EnumTarget>::NAME) }

            fn register(types: &mut $crate::TypeRegistry) {
                if types.get_enum(<$t as $crate::EnumTarget>::NAME).is_none() {
                    types.insert_enum(
                        <$t as $crate::EnumTarget>::NAME,
                        <$t as $crate::EnumTarget>::VARIANTS.iter().copied(),
                    );
                }
            }

            fn from_value(value: $crate::Value) -> Result<Self, $crate::ErrorKind> {
                $crate::target::enum_from_value(value)
            }
        }
    };
}

#[doc(hidden)]
pub fn enum_from_value<E: EnumTarget>(value: Value) -> Result<E, ErrorKind> {
    let variant = match value {
        Value::Enum(EnumValue { variant, .. }) => variant,
        other => return Err(unexpected(E::NAME, &other)),
    };
    E::from_variant(&variant).ok_or_else(|| {
        ErrorKind::conversion(&Path::root(), E::NAME, variant.as_str(), "variant has no Rust counterpart")
    })
}
