//! Descriptor documents: records, enums and handlers declared in JSON, for callers
//! that have no Rust types to register.
//!
//! ```json
//! {
//!   "root": "list<Animal>",
//!   "records": {
//!     "Animal": { "fields": { "Name": "string", "Id": { "type": "i64", "readonly": true } } },
//!     "Dog": { "extends": "Animal", "fields": { "Color": "Color?" } }
//!   },
//!   "enums": { "Color": { "Black": 0, "Brown": 1 } },
//!   "handlers": { "Animal": { "field": "$type", "types": { "dog": "Dog" } } }
//! }
//! ```
use indexmap::IndexMap;
use serde::Deserialize;
use thiserror::Error;

use crate::de::{Deserializer, Parser};
use crate::handler::TypeNameHandler;
use crate::ir::{Field, RecordTy, Scalar, Ty};
use crate::path_de::{from_str_with_path, PathError};

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Json(#[from] PathError),
    #[error("bad type expression {expr:?}: {reason}")]
    TypeExpr { expr: String, reason: String },
    #[error("handler for `{base}`: {reason}")]
    Handler { base: String, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct SchemaDoc {
    #[serde(default)]
    root: Option<String>,
    #[serde(default)]
    records: IndexMap<String, RecordDoc>,
    #[serde(default)]
    enums: IndexMap<String, IndexMap<String, i64>>,
    #[serde(default)]
    handlers: IndexMap<String, HandlerDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct RecordDoc {
    #[serde(default)]
    extends: Option<String>,
    #[serde(default)]
    fields: IndexMap<String, FieldDoc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum FieldDoc {
    Expr(String),
    Full {
        #[serde(rename = "type")]
        ty: String,
        #[serde(default)]
        readonly: bool,
    },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
struct HandlerDoc {
    #[serde(default = "default_discriminator")]
    field: String,
    #[serde(default)]
    types: IndexMap<String, String>,
    #[serde(default)]
    by_name: bool,
}

fn default_discriminator() -> String { "$type".to_owned() }

/// A loaded, fully parsed descriptor document.
#[derive(Debug, Clone)]
pub struct Schema {
    pub root: Option<Ty>,
    records: Vec<RecordTy>,
    enums: Vec<(String, Vec<(String, i64)>)>,
    handlers: IndexMap<String, HandlerDoc>,
}

impl Schema {
    pub fn from_json(src: &str) -> Result<Self, SchemaError> {
        let doc: SchemaDoc = from_str_with_path(src)?;
        let is_enum = |name: &str| doc.enums.contains_key(name);

        let root = doc.root.as_deref().map(|e| parse_type_expr(e, is_enum)).transpose()?;
        let mut records = Vec::with_capacity(doc.records.len());
        for (name, rec) in &doc.records {
            let mut fields = Vec::with_capacity(rec.fields.len());
            for (field, decl) in &rec.fields {
                fields.push(match decl {
                    FieldDoc::Expr(expr) => Field::new(field.as_str(), parse_type_expr(expr, is_enum)?),
                    FieldDoc::Full { ty, readonly: false } => Field::new(field.as_str(), parse_type_expr(ty, is_enum)?),
                    FieldDoc::Full { ty, readonly: true } => Field::read_only(field.as_str(), parse_type_expr(ty, is_enum)?),
                });
            }
            records.push(RecordTy { name: name.clone(), base: rec.extends.clone(), fields });
        }
        for (base, h) in &doc.handlers {
            if h.by_name && !h.types.is_empty() {
                return Err(SchemaError::Handler {
                    base: base.clone(),
                    reason: "`by_name` and `types` are mutually exclusive".into(),
                });
            }
        }
        let enums = doc
            .enums
            .iter()
            .map(|(name, variants)| (name.clone(), variants.iter().map(|(v, n)| (v.clone(), *n)).collect()))
            .collect();
        Ok(Schema { root, records, enums, handlers: doc.handlers })
    }

    /// Register every record, enum and handler on `de`.
    pub fn apply<P: Parser>(&self, de: &mut Deserializer<P>) {
        let types = de.types_mut();
        for (name, variants) in &self.enums {
            types.insert_enum(name, variants.iter().cloned());
        }
        for rec in &self.records {
            types.insert_record(rec.clone());
        }
        for (base, h) in &self.handlers {
            if h.by_name {
                de.register_type_handler(base, TypeNameHandler::new(h.field.as_str()));
            } else {
                de.register_handler(base, &h.field, h.types.iter().map(|(k, v)| (k.as_str(), v.as_str())));
            }
        }
    }
}

/// Parse `list<T>`, `map<K, V>`, `option<T>`, `T?`, scalar and well-known keywords,
/// and record/enum names.
pub fn parse_type_expr(expr: &str, is_enum: impl Fn(&str) -> bool) -> Result<Ty, SchemaError> {
    let mut p = TyParser { rest: expr, is_enum };
    let ty = p.ty().and_then(|ty| {
        p.skip_ws();
        if p.rest.is_empty() { Ok(ty) } else { Err(format!("unexpected trailing {:?}", p.rest)) }
    });
    ty.map_err(|reason| SchemaError::TypeExpr { expr: expr.to_owned(), reason })
}

struct TyParser<'s, F> {
    rest: &'s str,
    is_enum: F,
}

impl<'s, F: Fn(&str) -> bool> TyParser<'s, F> {
    fn skip_ws(&mut self) {
        self.rest = self.rest.trim_start();
    }

    fn eat(&mut self, c: char) -> bool {
        self.skip_ws();
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn expect(&mut self, c: char) -> Result<(), String> {
        if self.eat(c) { Ok(()) } else { Err(format!("expected `{c}` before {:?}", self.rest)) }
    }

    fn ident(&mut self) -> Result<&'s str, String> {
        self.skip_ws();
        let end = self
            .rest
            .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest.len());
        if end == 0 {
            return Err(format!("expected a type name before {:?}", self.rest));
        }
        let (ident, rest) = self.rest.split_at(end);
        self.rest = rest;
        Ok(ident)
    }

    fn generic(&mut self) -> Result<Ty, String> {
        self.expect('<')?;
        let ty = self.ty()?;
        self.expect('>')?;
        Ok(ty)
    }

    fn ty(&mut self) -> Result<Ty, String> {
        let mut ty = match self.ident()? {
            "string" => Ty::String,
            "uri" => Ty::Uri,
            "datetime" => Ty::DateTime,
            "datetimeoffset" => Ty::DateTimeOffset,
            "decimal" => Ty::Decimal,
            "uuid" => Ty::Uuid,
            "duration" => Ty::Duration,
            "list" => Ty::list(self.generic()?),
            "option" => Ty::nullable(self.generic()?),
            "map" => {
                self.expect('<')?;
                let key = self.ty()?;
                self.expect(',')?;
                let value = self.ty()?;
                self.expect('>')?;
                Ty::map(key, value)
            }
            name => match Scalar::from_name(name) {
                Some(s) => Ty::Scalar(s),
                None if (self.is_enum)(name) => Ty::enumeration(name),
                None => Ty::record(name),
            },
        };
        while self.eat('?') {
            if !matches!(ty, Ty::Nullable(_)) {
                ty = Ty::nullable(ty);
            }
        }
        Ok(ty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    fn parse(expr: &str) -> Result<Ty, SchemaError> {
        parse_type_expr(expr, |n| n == "Color")
    }

    #[test]
    fn type_expressions() {
        assert_eq!(parse("map<string, list<i32?>>").unwrap().to_string(), "map<string, list<i32?>>");
        assert_eq!(parse("option<Color>").unwrap(), Ty::nullable(Ty::enumeration("Color")));
        assert_eq!(parse(" Order ?").unwrap(), Ty::nullable(Ty::record("Order")));
        assert_eq!(parse("datetimeoffset").unwrap(), Ty::DateTimeOffset);
        assert!(parse("list<").is_err());
        assert!(parse("list<i32> x").is_err());
        assert!(parse("").is_err());
    }

    #[test]
    fn loads_documents() {
        let schema = Schema::from_json(indoc! {r#"
            {
              "root": "list<Animal>",
              "records": {
                "Animal": { "fields": { "Name": "string", "Id": { "type": "i64", "readonly": true } } },
                "Dog": { "extends": "Animal", "fields": { "Color": "Color?" } }
              },
              "enums": { "Color": { "Black": 0, "Brown": 1 } },
              "handlers": { "Animal": { "types": { "dog": "Dog" } } }
            }
        "#})
        .unwrap();
        assert_eq!(schema.root, Some(Ty::list(Ty::record("Animal"))));

        let mut de = Deserializer::new();
        schema.apply(&mut de);
        assert!(de.check(&Ty::list(Ty::record("Animal"))).is_ok());
        let fields: Vec<_> = de.types().fields_of("Dog").iter().map(|f| (f.name.clone(), f.writable)).collect();
        assert_eq!(
            fields,
            [("Name".to_owned(), true), ("Id".to_owned(), false), ("Color".to_owned(), true)]
        );
        assert_eq!(
            de.types().fields_of("Dog")[2].ty,
            Ty::nullable(Ty::enumeration("Color"))
        );
    }

    #[test]
    fn errors_point_into_the_document() {
        let err = Schema::from_json(r#"{"records": {"A": {"fields": {"x": 1}}}}"#).unwrap_err();
        match err {
            SchemaError::Json(e) => assert!(e.path.starts_with("records.A.fields"), "{}", e.path),
            other => panic!("unexpected {other}"),
        }
        let err = Schema::from_json(r#"{"handlers": {"A": {"by_name": true, "types": {"a": "A"}}}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::Handler { .. }));
        let err = Schema::from_json(r#"{"records": {"A": {"fields": {"x": "list<"}}}}"#).unwrap_err();
        assert!(matches!(err, SchemaError::TypeExpr { .. }));
    }
}
