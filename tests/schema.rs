use indoc::indoc;
use json_typemap::schema::{parse_type_expr, Schema, SchemaError};
use json_typemap::{Deserializer, ErrorKind, Ty, Value};

const SHOP: &str = indoc! {r#"
    {
      "root": "list<Item>",
      "records": {
        "Item": {
          "fields": {
            "Sku": "string",
            "Price": "decimal",
            "Added": "datetimeoffset?",
            "Created": { "type": "datetime", "readonly": true }
          }
        },
        "Book": { "extends": "Item", "fields": { "Pages": "u32", "Format": "Format" } },
        "Gadget": { "extends": "Item", "fields": { "Specs": "map<string, string>" } }
      },
      "enums": { "Format": { "Paperback": 0, "Hardcover": 1, "Ebook": 2 } },
      "handlers": { "Item": { "field": "kind", "types": { "book": "Book", "gadget": "Gadget" } } }
    }
"#};

fn shop() -> (Deserializer, Ty) {
    let schema = Schema::from_json(SHOP).unwrap();
    let mut de = Deserializer::new();
    schema.apply(&mut de);
    let ty = schema.root.clone().unwrap();
    (de, ty)
}

#[test]
fn schema_driven_mapping() {
    let (de, ty) = shop();
    de.check(&ty).unwrap();
    let payload = indoc! {r#"
        [
          { "kind": "book", "sku": "B-1", "price": "12.50", "pages": 320, "format": "hardcover" },
          { "kind": "gadget", "sku": "G-1", "price": 99, "specs": { "color": "red", "weight": 1.5 } },
          { "sku": "X-1", "added": "2024-03-01T10:00:00Z", "created": "2020-01-01" }
        ]
    "#};
    let value = de.deserialize_ty(payload, &ty).unwrap();
    let items = value.as_list().unwrap();
    assert_eq!(items.len(), 3);

    let book = items[0].as_record().unwrap();
    assert_eq!(book.type_name(), "Book");
    assert_eq!(book.fields().map(|(k, _)| k).collect::<Vec<_>>(), ["Sku", "Price", "Added", "Created", "Pages", "Format"]);
    assert_eq!(book.get("Pages"), Some(&Value::UInt(320)));
    assert_eq!(book.get("Added"), Some(&Value::Null));

    let gadget = items[1].as_record().unwrap();
    assert_eq!(gadget.type_name(), "Gadget");
    let json = serde_json::to_value(gadget).unwrap();
    assert_eq!(json["Specs"], serde_json::json!({"color": "red", "weight": "1.5"}));

    let plain = items[2].as_record().unwrap();
    assert_eq!(plain.type_name(), "Item");
    assert!(matches!(plain.get("Added"), Some(Value::DateTimeOffset(_))));
    // read-only fields keep their default
    let json = serde_json::to_value(plain).unwrap();
    assert_eq!(json["Created"], "1970-01-01T00:00:00");
}

#[test]
fn type_expressions_use_schema_enums() {
    let (de, _) = shop();
    let ty = parse_type_expr("map<string, Format>", |n| de.types().get_enum(n).is_some()).unwrap();
    let value = de.deserialize_ty(r#"{"a": "ebook", "b": 0}"#, &ty).unwrap();
    assert_eq!(serde_json::to_value(&value).unwrap(), serde_json::json!({"a": "Ebook", "b": "Paperback"}));
}

#[test]
fn unknown_references_fail_the_check() {
    let schema = Schema::from_json(r#"{"root": "Order", "records": {"Order": {"fields": {"Lines": "list<Line>"}}}}"#).unwrap();
    let mut de = Deserializer::new();
    schema.apply(&mut de);
    let err = de.check(schema.root.as_ref().unwrap()).unwrap_err();
    match err.kind() {
        ErrorKind::UnsupportedShape { path, reason } => {
            assert_eq!(path.to_string(), "Lines[0]");
            assert!(reason.contains("Line"), "{reason}");
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn unknown_schema_keys_are_rejected() {
    let err = Schema::from_json(r#"{"records": {"A": {"feilds": {}}}}"#).unwrap_err();
    assert!(matches!(err, SchemaError::Json(_)));
    assert!(err.to_string().contains("records.A"), "{err}");
}
