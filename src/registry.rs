//! Named record and enum descriptors, plus the reachability check run before a
//! tree is mapped.
use std::collections::HashSet;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{ErrorKind, Path};
use crate::handler::HandlerRegistry;
use crate::ir::{EnumTy, Field, RecordTy, Scalar, Ty};
use crate::target::Target;
use crate::value::{EnumValue, Record, UriRef, Value};

#[derive(Debug, Clone)]
enum Named {
    Record(RecordTy),
    Enum(EnumTy),
}

#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    types: IndexMap<String, Named>,
    pending: HashSet<String>,
}

impl TypeRegistry {
    pub fn new() -> Self { Self::default() }

    /// Start describing record `name`. Returns `None` when the record is already
    /// registered or currently being described, which lets self-referential
    /// `Target::register` impls terminate.
    pub fn record(&mut self, name: &str) -> Option<RecordBuilder<'_>> {
        if self.types.contains_key(name) || !self.pending.insert(name.to_owned()) {
            return None;
        }
        Some(RecordBuilder {
            types: self,
            rec: RecordTy { name: name.to_owned(), base: None, fields: Vec::new() },
        })
    }

    pub fn insert_record(&mut self, rec: RecordTy) {
        self.pending.remove(&rec.name);
        self.types.insert(rec.name.clone(), Named::Record(rec));
    }

    pub fn insert_enum<N: Into<String>>(&mut self, name: &str, variants: impl IntoIterator<Item = (N, i64)>) {
        let variants = variants.into_iter().map(|(n, v)| (n.into(), v)).collect();
        self.types.insert(name.to_owned(), Named::Enum(EnumTy { name: name.to_owned(), variants }));
    }

    pub fn get_record(&self, name: &str) -> Option<&RecordTy> {
        match self.types.get(name) {
            Some(Named::Record(r)) => Some(r),
            _ => None,
        }
    }

    pub fn get_enum(&self, name: &str) -> Option<&EnumTy> {
        match self.types.get(name) {
            Some(Named::Enum(e)) => Some(e),
            _ => None,
        }
    }

    pub fn is_record(&self, name: &str) -> bool { self.get_record(name).is_some() }

    /// Base chain of `name`, starting with `name` itself.
    fn lineage<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a RecordTy> + use<'a> {
        let mut next = self.get_record(name);
        let mut seen = HashSet::new();
        std::iter::from_fn(move || {
            let cur = next.take()?;
            if !seen.insert(cur.name.as_str()) {
                return None;
            }
            next = cur.base.as_deref().and_then(|b| self.get_record(b));
            Some(cur)
        })
    }

    /// True when `name` is `base` or inherits from it.
    pub fn is_descendant(&self, name: &str, base: &str) -> bool {
        self.lineage(name).any(|r| r.name == base)
    }

    /// Full field list of a record: inherited fields first, an own field replacing
    /// an inherited one of the same name in place.
    pub fn fields_of(&self, name: &str) -> Vec<&Field> {
        let chain: Vec<&RecordTy> = self.lineage(name).collect();
        let mut out: IndexMap<&str, &Field> = IndexMap::new();
        for rec in chain.into_iter().rev() {
            for field in &rec.fields {
                out.insert(field.name.as_str(), field);
            }
        }
        out.into_values().collect()
    }

    /// Fresh instance of record `name` with every field at its default. Nested
    /// records start as default instances of their declared type.
    pub fn instantiate(&self, name: &str) -> Record {
        self.instantiate_in(name, &mut Vec::new())
    }

    pub fn default_value(&self, ty: &Ty) -> Value {
        self.default_in(ty, &mut Vec::new())
    }

    fn instantiate_in<'a>(&'a self, name: &'a str, open: &mut Vec<&'a str>) -> Record {
        open.push(name);
        let mut rec = Record::new(name);
        for field in self.fields_of(name) {
            rec.set(field.name.clone(), self.default_in(&field.ty, open));
        }
        open.pop();
        rec
    }

    fn default_in<'a>(&'a self, ty: &'a Ty, open: &mut Vec<&'a str>) -> Value {
        match ty {
            Ty::Scalar(Scalar::Bool) => Value::Bool(false),
            Ty::Scalar(Scalar::I8 | Scalar::I16 | Scalar::I32 | Scalar::I64) => Value::Int(0),
            Ty::Scalar(Scalar::U8 | Scalar::U16 | Scalar::U32 | Scalar::U64) => Value::UInt(0),
            Ty::Scalar(Scalar::F32 | Scalar::F64) => Value::Float(0.0),
            Ty::Scalar(Scalar::Char) => Value::Char('\0'),
            Ty::Enum(name) => self
                .get_enum(name)
                .and_then(EnumTy::default_variant)
                .map(|(variant, discriminant)| Value::Enum(EnumValue {
                    variant: variant.clone(),
                    discriminant: *discriminant,
                }))
                .unwrap_or(Value::Null),
            Ty::String => Value::String(String::new()),
            Ty::Uri => Value::Uri(UriRef::Relative(String::new())),
            Ty::DateTime => Value::DateTime(NaiveDateTime::default()),
            Ty::DateTimeOffset => Value::DateTimeOffset(DateTime::default()),
            Ty::Decimal => Value::Decimal(Decimal::ZERO),
            Ty::Uuid => Value::Uuid(Uuid::nil()),
            Ty::Duration => Value::Duration(TimeDelta::zero()),
            Ty::List(_) => Value::List(Vec::new()),
            Ty::Map { .. } => Value::Map(IndexMap::new()),
            // a record already open on this chain would never terminate
            Ty::Record(name) if self.is_record(name) && !open.contains(&name.as_str()) => {
                Value::Record(self.instantiate_in(name, open))
            }
            Ty::Record(_) | Ty::Nullable(_) => Value::Null,
        }
    }

    // ---------------------------- Checking ------------------------------- //

    /// Resolve every descriptor reachable from `root`, including the concrete
    /// types of any handler met on the way.
    pub fn check(&self, root: &Ty, handlers: &HandlerRegistry) -> Result<(), ErrorKind> {
        let mut seen = HashSet::new();
        self.check_ty(root, handlers, &Path::root(), &mut seen)
    }

    fn check_ty<'a>(
        &'a self,
        ty: &'a Ty,
        handlers: &'a HandlerRegistry,
        path: &Path,
        seen: &mut HashSet<&'a str>,
    ) -> Result<(), ErrorKind> {
        match ty {
            Ty::Scalar(_)
            | Ty::String
            | Ty::Uri
            | Ty::DateTime
            | Ty::DateTimeOffset
            | Ty::Decimal
            | Ty::Uuid
            | Ty::Duration => Ok(()),
            Ty::Enum(name) => match self.types.get(name) {
                Some(Named::Enum(_)) => Ok(()),
                Some(Named::Record(_)) => Err(ErrorKind::unsupported(path, format!("`{name}` is a record, not an enum"))),
                None => Err(ErrorKind::unsupported(path, format!("enum `{name}` is not registered"))),
            },
            Ty::List(item) => self.check_ty(item, handlers, &path.index(0), seen),
            Ty::Nullable(inner) => self.check_ty(inner, handlers, path, seen),
            Ty::Map { key, value } => {
                if **key != Ty::String {
                    return Err(ErrorKind::unsupported(path, format!("map keys must be strings, found `{key}`")));
                }
                self.check_ty(value, handlers, path, seen)
            }
            Ty::Record(name) => self.check_record(name, handlers, path, seen),
        }
    }

    fn check_record<'a>(
        &'a self,
        name: &'a str,
        handlers: &'a HandlerRegistry,
        path: &Path,
        seen: &mut HashSet<&'a str>,
    ) -> Result<(), ErrorKind> {
        if !seen.insert(name) {
            return Ok(());
        }
        let rec = match self.types.get(name) {
            Some(Named::Record(rec)) => rec,
            Some(Named::Enum(_)) => {
                return Err(ErrorKind::unsupported(path, format!("`{name}` is an enum, not a record")));
            }
            None => return Err(ErrorKind::unsupported(path, format!("record `{name}` is not registered"))),
        };

        let mut ancestors = HashSet::new();
        let mut cur = rec;
        while let Some(base) = cur.base.as_deref() {
            if !ancestors.insert(cur.name.as_str()) || base == name {
                return Err(ErrorKind::unsupported(path, format!("inheritance chain of `{name}` is cyclic")));
            }
            cur = self.get_record(base).ok_or_else(|| {
                ErrorKind::unsupported(path, format!("base record `{base}` of `{}` is not registered", cur.name))
            })?;
        }

        for field in self.fields_of(name) {
            self.check_ty(&field.ty, handlers, &path.field(&field.name), seen)?;
        }

        if let Some(handler) = handlers.get(name) {
            for concrete in handler.concrete_types() {
                if !self.is_record(concrete) {
                    return Err(ErrorKind::unsupported(
                        path,
                        format!("handler for `{name}` maps to unregistered record `{concrete}`"),
                    ));
                }
                if !self.is_descendant(concrete, name) {
                    return Err(ErrorKind::unsupported(
                        path,
                        format!("handler for `{name}` maps to `{concrete}`, which does not extend it"),
                    ));
                }
                self.check_record(concrete, handlers, path, seen)?;
            }
        }
        Ok(())
    }
}

// ---------------------------- RecordBuilder -------------------------------- //

/// Collects a record's fields; registers it on [`finish`](RecordBuilder::finish).
pub struct RecordBuilder<'r> {
    types: &'r mut TypeRegistry,
    rec: RecordTy,
}

impl RecordBuilder<'_> {
    pub fn extends<T: Target>(mut self) -> Self {
        T::register(self.types);
        if let Ty::Record(base) = T::ty() {
            self.rec.base = Some(base);
        }
        self
    }

    pub fn field<T: Target>(mut self, name: &str) -> Self {
        T::register(self.types);
        self.rec.fields.push(Field::new(name, T::ty()));
        self
    }

    pub fn read_only<T: Target>(mut self, name: &str) -> Self {
        T::register(self.types);
        self.rec.fields.push(Field::read_only(name, T::ty()));
        self
    }

    pub fn finish(self) {
        self.types.insert_record(self.rec);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zoo() -> TypeRegistry {
        let mut types = TypeRegistry::new();
        types.insert_record(RecordTy {
            name: "Animal".into(),
            base: None,
            fields: vec![Field::new("name", Ty::String), Field::new("legs", Ty::Scalar(Scalar::U8))],
        });
        types.insert_record(RecordTy {
            name: "Dog".into(),
            base: Some("Animal".into()),
            fields: vec![Field::new("good", Ty::Scalar(Scalar::Bool)), Field::new("legs", Ty::Scalar(Scalar::I32))],
        });
        types
    }

    #[test]
    fn inherited_fields_come_first() {
        let types = zoo();
        let fields: Vec<_> = types.fields_of("Dog").iter().map(|f| (f.name.as_str(), f.ty.clone())).collect();
        assert_eq!(
            fields,
            [
                ("name", Ty::String),
                ("legs", Ty::Scalar(Scalar::I32)),
                ("good", Ty::Scalar(Scalar::Bool)),
            ]
        );
        assert!(types.is_descendant("Dog", "Animal"));
        assert!(!types.is_descendant("Animal", "Dog"));
    }

    #[test]
    fn instances_start_at_defaults() {
        let rec = zoo().instantiate("Dog");
        assert_eq!(rec.type_name(), "Dog");
        assert_eq!(rec.get("name"), Some(&Value::String(String::new())));
        assert_eq!(rec.get("legs"), Some(&Value::Int(0)));
        assert_eq!(rec.get("good"), Some(&Value::Bool(false)));
    }

    #[test]
    fn nested_records_start_as_default_instances() {
        let mut types = zoo();
        types.insert_record(RecordTy {
            name: "Owner".into(),
            base: None,
            fields: vec![
                Field::new("pet", Ty::record("Animal")),
                Field::new("spare", Ty::nullable(Ty::record("Animal"))),
                Field::new("site", Ty::Uri),
                Field::new("boss", Ty::record("Owner")),
            ],
        });
        let rec = types.instantiate("Owner");
        let pet = rec.get("pet").and_then(Value::as_record).unwrap();
        assert_eq!(pet.type_name(), "Animal");
        assert_eq!(pet.get("legs"), Some(&Value::UInt(0)));
        assert_eq!(rec.get("spare"), Some(&Value::Null));
        assert_eq!(rec.get("site"), Some(&Value::Uri(UriRef::Relative(String::new()))));
        // self-reference stops at the first repeat
        assert_eq!(rec.get("boss"), Some(&Value::Null));
    }

    #[test]
    fn check_rejects_unknown_names_and_keys() {
        let types = zoo();
        let handlers = HandlerRegistry::new();
        assert!(types.check(&Ty::list(Ty::record("Dog")), &handlers).is_ok());
        assert!(matches!(
            types.check(&Ty::record("Cat"), &handlers),
            Err(ErrorKind::UnsupportedShape { .. })
        ));
        assert!(matches!(
            types.check(&Ty::map(Ty::Scalar(Scalar::I32), Ty::String), &handlers),
            Err(ErrorKind::UnsupportedShape { .. })
        ));
        assert!(matches!(
            types.check(&Ty::enumeration("Animal"), &handlers),
            Err(ErrorKind::UnsupportedShape { .. })
        ));
    }

    #[test]
    fn check_rejects_inheritance_cycles() {
        let mut types = TypeRegistry::new();
        types.insert_record(RecordTy { name: "A".into(), base: Some("B".into()), fields: vec![] });
        types.insert_record(RecordTy { name: "B".into(), base: Some("A".into()), fields: vec![] });
        let err = types.check(&Ty::record("A"), &HandlerRegistry::new()).unwrap_err();
        assert!(err.to_string().contains("cyclic"), "{err}");
    }
}
