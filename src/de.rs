//! Entry point: configuration, the parser seam, and the [`Deserializer`] that ties
//! parsing, root location and conversion together.
use serde_json::Map;

use crate::convert::Converter;
use crate::error::{Error, ErrorKind, Path};
use crate::handler::{DiscriminatorHandler, HandlerRegistry, TypeHandler};
use crate::ir::Ty;
use crate::locale::Locale;
use crate::registry::TypeRegistry;
use crate::target::Target;
use crate::value::{Record, Value};
use crate::{debug, Node};

// ------------------------------ Options ---------------------------------- //

/// What to do when a discriminator is present but names no registered subtype of
/// the base record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DiscriminatorPolicy {
    /// Build the base type.
    #[default]
    Permissive,
    /// Fail with a conversion error naming the tag.
    FailClosed,
}

#[derive(Debug, Clone, Default)]
pub struct Options {
    /// Top-level key whose value is mapped instead of the whole document.
    pub root_element: Option<String>,
    /// chrono `strftime` pattern; when set, dates must match it exactly.
    pub date_format: Option<String>,
    pub locale: Locale,
    pub discriminators: DiscriminatorPolicy,
}

impl Options {
    pub fn with_root_element(mut self, key: impl Into<String>) -> Self {
        self.root_element = Some(key.into());
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn with_locale(mut self, locale: Locale) -> Self {
        self.locale = locale;
        self
    }

    pub fn with_discriminators(mut self, policy: DiscriminatorPolicy) -> Self {
        self.discriminators = policy;
        self
    }
}

// ------------------------------- Parser ---------------------------------- //

/// Turns raw text into a generic tree.
pub trait Parser {
    fn parse(&self, text: &str) -> Result<Node, ErrorKind>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct JsonParser;

impl Parser for JsonParser {
    fn parse(&self, text: &str) -> Result<Node, ErrorKind> {
        Ok(serde_json::from_str(text)?)
    }
}

// ---------------------------- Root locator ------------------------------- //

/// The value under `key` when the tree is a mapping that has it, else the tree.
pub fn find_root<'n>(tree: &'n Node, key: Option<&str>) -> &'n Node {
    match (tree, key) {
        (Node::Object(entries), Some(key)) => entries.get(key).unwrap_or(tree),
        _ => tree,
    }
}

// ---------------------------- Deserializer ------------------------------- //

/// Registration (`&mut self`) happens before mapping (`&self`); a configured
/// deserializer can be shared across threads.
#[derive(Debug, Default)]
pub struct Deserializer<P = JsonParser> {
    options: Options,
    types: TypeRegistry,
    handlers: HandlerRegistry,
    parser: P,
}

impl Deserializer {
    pub fn new() -> Self { Self::default() }

    pub fn with_options(options: Options) -> Self {
        Self { options, ..Self::default() }
    }
}

impl<P: Parser> Deserializer<P> {
    pub fn with_parser(parser: P, options: Options) -> Self {
        Self { options, types: TypeRegistry::new(), handlers: HandlerRegistry::new(), parser }
    }

    pub fn options(&self) -> &Options { &self.options }
    pub fn options_mut(&mut self) -> &mut Options { &mut self.options }
    pub fn types(&self) -> &TypeRegistry { &self.types }
    pub fn types_mut(&mut self) -> &mut TypeRegistry { &mut self.types }
    pub fn handlers(&self) -> &HandlerRegistry { &self.handlers }

    /// Register the descriptors `T` needs.
    pub fn register<T: Target>(&mut self) -> &mut Self {
        T::register(&mut self.types);
        self
    }

    /// Bind a discriminator table to `base`: `mapping` is `(tag, concrete type)`.
    pub fn register_handler<K, V>(
        &mut self,
        base: &str,
        field: &str,
        mapping: impl IntoIterator<Item = (K, V)>,
    ) -> &mut Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.handlers.register(base, DiscriminatorHandler::new(field, mapping));
        self
    }

    pub fn register_type_handler(&mut self, base: &str, handler: impl TypeHandler + 'static) -> &mut Self {
        self.handlers.register(base, handler);
        self
    }

    /// Write the discriminator of `concrete` into `out` using the handler bound to
    /// `base`. `false` when there is no handler or it has no tag for the type.
    pub fn tag(&self, base: &str, concrete: &str, out: &mut Map<String, Node>) -> bool {
        self.handlers.get(base).is_some_and(|h| h.tag(concrete, out))
    }

    /// Resolve every descriptor reachable from `ty` without mapping anything.
    pub fn check(&self, ty: &Ty) -> Result<(), Error> {
        self.types.check(ty, &self.handlers).map_err(|kind| wrap(ty, kind))
    }

    /// Map `payload` onto `T`. `T`'s descriptors must already be registered.
    pub fn deserialize<T: Target>(&self, payload: &str) -> Result<T, Error> {
        let ty = T::ty();
        let value = self.deserialize_ty(payload, &ty)?;
        T::from_value(value).map_err(|kind| wrap(&ty, kind))
    }

    pub fn deserialize_ty(&self, payload: &str, ty: &Ty) -> Result<Value, Error> {
        self.types
            .check(ty, &self.handlers)
            .and_then(|()| self.parser.parse(payload))
            .and_then(|tree| self.map_root(&tree, ty))
            .map_err(|kind| wrap(ty, kind))
    }

    /// Same as [`deserialize_ty`](Self::deserialize_ty) for an already parsed tree.
    pub fn map_node(&self, tree: &Node, ty: &Ty) -> Result<Value, Error> {
        self.types
            .check(ty, &self.handlers)
            .and_then(|()| self.map_root(tree, ty))
            .map_err(|kind| wrap(ty, kind))
    }

    /// Fill an existing record from a mapping node. Unmatched and null fields keep
    /// their current values, so mapping the same node twice changes nothing.
    pub fn map_into(&self, record: &mut Record, node: &Node) -> Result<(), Error> {
        let ty = Ty::record(record.type_name());
        self.types
            .check(&ty, &self.handlers)
            .and_then(|()| self.converter().map_record(record, node, &Path::root()))
            .map_err(|kind| wrap(&ty, kind))
    }

    fn map_root(&self, tree: &Node, ty: &Ty) -> Result<Value, ErrorKind> {
        let root = find_root(tree, self.options.root_element.as_deref());
        debug!("mapping {ty} (root element {:?})", self.options.root_element);
        self.converter().convert(ty, root, &Path::root())
    }

    fn converter(&self) -> Converter<'_> {
        Converter { options: &self.options, types: &self.types, handlers: &self.handlers }
    }
}

fn wrap(ty: &Ty, kind: ErrorKind) -> Error {
    Error { target: ty.to_string(), kind }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Scalar;
    use serde_json::json;

    #[test]
    fn root_locator_is_transparent() {
        let tree = json!({"data": [1, 2], "meta": {}});
        assert_eq!(find_root(&tree, Some("data")), &json!([1, 2]));
        assert_eq!(find_root(&tree, Some("missing")), &tree);
        assert_eq!(find_root(&tree, None), &tree);
        let list = json!([1]);
        assert_eq!(find_root(&list, Some("data")), &list);
    }

    #[test]
    fn syntax_errors_are_wrapped_with_the_target() {
        let de = Deserializer::new();
        let err = de.deserialize_ty("{", &Ty::list(Ty::String)).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Syntax(_)));
        assert!(err.to_string().starts_with("deserializing list<string>: syntax error"), "{err}");
    }

    #[test]
    fn descriptor_is_checked_before_parsing() {
        let de = Deserializer::new();
        let err = de.deserialize_ty("not json", &Ty::record("Nope")).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::UnsupportedShape { .. }));
    }

    #[test]
    fn scalar_roots_convert_directly() {
        let de = Deserializer::with_options(Options::default().with_root_element("data"));
        assert_eq!(de.deserialize::<i32>(r#"{"data": "42"}"#).unwrap(), 42);
        assert_eq!(de.deserialize_ty("true", &Ty::Scalar(Scalar::Bool)).unwrap(), Value::Bool(true));
    }

    #[test]
    fn deserializer_is_shareable() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Deserializer>();
    }
}
