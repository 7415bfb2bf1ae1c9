//! Typed output of a mapping run.
//!
//! A [`Value`] always conforms to the descriptor it was produced from: a `Ty::List`
//! yields `Value::List`, a `Ty::Record` yields `Value::Record` of the record type or of
//! a registered descendant, and so on. `Null` stands for absent optional data.
use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::ser::{Serialize, SerializeMap, Serializer};
use url::Url;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Char(char),
    String(String),
    Enum(EnumValue),
    Uri(UriRef),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<FixedOffset>),
    Decimal(Decimal),
    Uuid(Uuid),
    Duration(TimeDelta),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    Record(Record),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    pub variant: String,
    pub discriminant: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UriRef {
    Absolute(Url),
    Relative(String),
}

/// An instance of a described record: concrete type name plus field values in
/// declaration order (inherited fields first).
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    type_name: String,
    fields: IndexMap<String, Value>,
}

impl Value {
    pub fn is_null(&self) -> bool { matches!(self, Value::Null) }

    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "signed integer",
            Value::UInt(_) => "unsigned integer",
            Value::Float(_) => "float",
            Value::Char(_) => "char",
            Value::String(_) => "string",
            Value::Enum(_) => "enum",
            Value::Uri(_) => "uri",
            Value::DateTime(_) => "datetime",
            Value::DateTimeOffset(_) => "datetimeoffset",
            Value::Decimal(_) => "decimal",
            Value::Uuid(_) => "uuid",
            Value::Duration(_) => "duration",
            Value::List(_) => "list",
            Value::Map(_) => "map",
            Value::Record(_) => "record",
        }
    }

    pub fn as_record(&self) -> Option<&Record> {
        match self {
            Value::Record(r) => Some(r),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(xs) => Some(xs),
            _ => None,
        }
    }
}

impl UriRef {
    pub fn as_str(&self) -> &str {
        match self {
            UriRef::Absolute(url) => url.as_str(),
            UriRef::Relative(s) => s,
        }
    }

    pub fn is_absolute(&self) -> bool { matches!(self, UriRef::Absolute(_)) }

    /// The absolute URL, if this is one. Relative references have no base to
    /// resolve against.
    pub fn into_url(self) -> Option<Url> {
        match self {
            UriRef::Absolute(url) => Some(url),
            UriRef::Relative(_) => None,
        }
    }
}

impl Record {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self { type_name: type_name.into(), fields: IndexMap::new() }
    }

    pub fn type_name(&self) -> &str { &self.type_name }

    pub fn get(&self, field: &str) -> Option<&Value> { self.fields.get(field) }

    /// Assign a field, keeping its declaration position when it already exists.
    pub fn set(&mut self, field: impl Into<String>, value: Value) {
        self.fields.insert(field.into(), value);
    }

    /// Move a field's value out, leaving `Null` in its place.
    pub fn take(&mut self, field: &str) -> Value {
        self.fields
            .get_mut(field)
            .map(|v| std::mem::replace(v, Value::Null))
            .unwrap_or(Value::Null)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize { self.fields.len() }
    pub fn is_empty(&self) -> bool { self.fields.is_empty() }
}

// ------------------------------ Rendering -------------------------------- //

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(i) => serializer.serialize_i64(*i),
            Value::UInt(u) => serializer.serialize_u64(*u),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::Char(c) => serializer.serialize_char(*c),
            Value::String(s) => serializer.serialize_str(s),
            Value::Enum(e) => serializer.serialize_str(&e.variant),
            Value::Uri(u) => serializer.serialize_str(u.as_str()),
            Value::DateTime(dt) => serializer.collect_str(&dt.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::DateTimeOffset(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::Decimal(d) => serializer.collect_str(d),
            Value::Uuid(u) => serializer.collect_str(&u.hyphenated()),
            Value::Duration(d) => serializer.collect_str(d),
            Value::List(xs) => serializer.collect_seq(xs),
            Value::Map(m) => serializer.collect_map(m),
            Value::Record(r) => r.serialize(serializer),
        }
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn take_leaves_null_behind() {
        let mut r = Record::new("Order");
        r.set("id", Value::Int(7));
        r.set("note", Value::String("x".into()));
        assert_eq!(r.take("id"), Value::Int(7));
        assert_eq!(r.get("id"), Some(&Value::Null));
        assert_eq!(r.take("missing"), Value::Null);
        assert_eq!(r.fields().map(|(k, _)| k).collect::<Vec<_>>(), ["id", "note"]);
    }

    #[test]
    fn renders_as_json() {
        let mut r = Record::new("Order");
        r.set("id", Value::Int(7));
        r.set("tags", Value::List(vec![Value::String("a".into()), Value::Null]));
        let json = serde_json::to_value(Value::Record(r)).unwrap();
        assert_eq!(json, serde_json::json!({ "id": 7, "tags": ["a", null] }));
    }
}
