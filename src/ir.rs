// Type descriptors: the declared shape a tree is mapped onto. No serde_json::Value here.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Bool,
    I8, I16, I32, I64,
    U8, U16, U32, U64,
    F32, F64,
    Char,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Ty {
    Scalar(Scalar),
    Enum(String),            // resolved through the registry
    String,
    Uri,                     // absolute or relative reference
    DateTime,                // no offset
    DateTimeOffset,          // fixed offset
    Decimal,
    Uuid,
    Duration,
    List(Box<Ty>),
    Map { key: Box<Ty>, value: Box<Ty> },
    Record(String),          // resolved through the registry
    Nullable(Box<Ty>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: Ty,
    pub writable: bool,      // read-only fields keep their default
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordTy {
    pub name: String,
    pub base: Option<String>,
    pub fields: Vec<Field>,  // own fields only, declaration order
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumTy {
    pub name: String,
    pub variants: Vec<(String, i64)>,
}

impl Scalar {
    pub fn name(self) -> &'static str {
        match self {
            Scalar::Bool => "bool",
            Scalar::I8 => "i8",
            Scalar::I16 => "i16",
            Scalar::I32 => "i32",
            Scalar::I64 => "i64",
            Scalar::U8 => "u8",
            Scalar::U16 => "u16",
            Scalar::U32 => "u32",
            Scalar::U64 => "u64",
            Scalar::F32 => "f32",
            Scalar::F64 => "f64",
            Scalar::Char => "char",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => Scalar::Bool,
            "i8" => Scalar::I8,
            "i16" => Scalar::I16,
            "i32" => Scalar::I32,
            "i64" => Scalar::I64,
            "u8" => Scalar::U8,
            "u16" => Scalar::U16,
            "u32" => Scalar::U32,
            "u64" => Scalar::U64,
            "f32" => Scalar::F32,
            "f64" => Scalar::F64,
            "char" => Scalar::Char,
            _ => return None,
        })
    }
}

impl Ty {
    pub fn list(item: Ty) -> Self { Ty::List(Box::new(item)) }
    pub fn map(key: Ty, value: Ty) -> Self { Ty::Map { key: Box::new(key), value: Box::new(value) } }
    pub fn nullable(inner: Ty) -> Self { Ty::Nullable(Box::new(inner)) }
    pub fn record(name: impl Into<String>) -> Self { Ty::Record(name.into()) }
    pub fn enumeration(name: impl Into<String>) -> Self { Ty::Enum(name.into()) }

    /// `Nullable(T)` → `T`; anything else unchanged. Only one layer is removed.
    pub fn unwrap_nullable(&self) -> &Ty {
        match self {
            Ty::Nullable(inner) => inner,
            other => other,
        }
    }

    /// Whether a null element/value may stand in for this type inside a container.
    pub fn permits_null(&self) -> bool {
        matches!(
            self,
            Ty::Nullable(_) | Ty::String | Ty::Uri | Ty::Record(_) | Ty::List(_) | Ty::Map { .. }
        )
    }
}

impl fmt::Display for Ty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ty::Scalar(s) => f.write_str(s.name()),
            Ty::Enum(name) | Ty::Record(name) => f.write_str(name),
            Ty::String => f.write_str("string"),
            Ty::Uri => f.write_str("uri"),
            Ty::DateTime => f.write_str("datetime"),
            Ty::DateTimeOffset => f.write_str("datetimeoffset"),
            Ty::Decimal => f.write_str("decimal"),
            Ty::Uuid => f.write_str("uuid"),
            Ty::Duration => f.write_str("duration"),
            Ty::List(item) => write!(f, "list<{item}>"),
            Ty::Map { key, value } => write!(f, "map<{key}, {value}>"),
            Ty::Nullable(inner) => write!(f, "{inner}?"),
        }
    }
}

impl Field {
    pub fn new(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, writable: true }
    }

    pub fn read_only(name: impl Into<String>, ty: Ty) -> Self {
        Self { name: name.into(), ty, writable: false }
    }
}

impl EnumTy {
    /// Variant a fresh instance starts with: the one valued 0, else the first.
    pub fn default_variant(&self) -> Option<&(String, i64)> {
        self.variants
            .iter()
            .find(|(_, v)| *v == 0)
            .or_else(|| self.variants.first())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_a_type_expression() {
        let ty = Ty::map(Ty::String, Ty::list(Ty::nullable(Ty::Scalar(Scalar::I32))));
        assert_eq!(ty.to_string(), "map<string, list<i32?>>");
        assert_eq!(Ty::record("Order").to_string(), "Order");
    }

    #[test]
    fn unwraps_one_nullable_layer() {
        let ty = Ty::nullable(Ty::nullable(Ty::Uuid));
        assert_eq!(ty.unwrap_nullable(), &Ty::nullable(Ty::Uuid));
        assert_eq!(Ty::Uuid.unwrap_nullable(), &Ty::Uuid);
    }

    #[test]
    fn enum_default_prefers_zero() {
        let e = EnumTy { name: "E".into(), variants: vec![("A".into(), 3), ("B".into(), 0)] };
        assert_eq!(e.default_variant().map(|(n, _)| n.as_str()), Some("B"));
    }
}
