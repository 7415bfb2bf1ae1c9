//! Polymorphic record resolution.
//!
//! A [`TypeHandler`] is bound to one base record type. When a mapping node is about
//! to be built as that base type, the handler looks at the node's discriminator field
//! and names the concrete record type to build instead. The inverse, [`TypeHandler::tag`],
//! writes the discriminator for a concrete type into an output mapping so the two
//! directions stay symmetric.
use std::borrow::Cow;
use std::collections::HashMap;
use std::fmt;

use indexmap::IndexMap;
use serde_json::{Map, Value};

/// Outcome of inspecting a node's discriminator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution<'h> {
    /// No discriminator, or an empty one: build the base type.
    Untagged,
    /// The discriminator names a concrete type. The registry still has to know it
    /// and it has to extend the base type.
    Resolved(Cow<'h, str>),
    /// A discriminator is present but maps to nothing; carries the raw tag.
    Unmatched(String),
}

pub trait TypeHandler: fmt::Debug + Send + Sync {
    fn resolve(&self, node: &Map<String, Value>) -> Resolution<'_>;

    /// Write the discriminator for `concrete` into `out`. Returns `false`, leaving
    /// `out` untouched, when the handler has no tag for that type.
    fn tag(&self, concrete: &str, out: &mut Map<String, Value>) -> bool;

    /// Concrete types this handler can produce, when it knows them up front.
    fn concrete_types(&self) -> Vec<&str> { Vec::new() }
}

/// Stringified discriminator, or `None` when absent/null/empty.
fn discriminator<'n>(node: &'n Map<String, Value>, field: &str) -> Option<Cow<'n, str>> {
    let tag = match node.get(field)? {
        Value::Null => return None,
        Value::String(s) => Cow::Borrowed(s.as_str()),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        other => Cow::Owned(other.to_string()),
    };
    if tag.is_empty() { None } else { Some(tag) }
}

// ------------------------- DiscriminatorHandler ------------------------------ //

/// Discriminator field plus an explicit `tag → type` table. The reverse index is
/// built once at construction; when several tags name the same type, the first one
/// is used for tagging.
#[derive(Debug, Clone)]
pub struct DiscriminatorHandler {
    field: String,
    by_tag: IndexMap<String, String>,
    by_type: HashMap<String, String>,
}

impl DiscriminatorHandler {
    pub fn new<K, V>(field: impl Into<String>, mapping: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let by_tag: IndexMap<String, String> = mapping
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let mut by_type = HashMap::with_capacity(by_tag.len());
        for (tag, ty) in &by_tag {
            by_type.entry(ty.clone()).or_insert_with(|| tag.clone());
        }
        Self { field: field.into(), by_tag, by_type }
    }

    pub fn field(&self) -> &str { &self.field }

    pub fn tag_of(&self, concrete: &str) -> Option<&str> {
        self.by_type.get(concrete).map(String::as_str)
    }
}

impl TypeHandler for DiscriminatorHandler {
    fn resolve(&self, node: &Map<String, Value>) -> Resolution<'_> {
        let Some(tag) = discriminator(node, &self.field) else {
            return Resolution::Untagged;
        };
        match self.by_tag.get(&*tag) {
            Some(ty) => Resolution::Resolved(Cow::Borrowed(ty.as_str())),
            None => Resolution::Unmatched(tag.into_owned()),
        }
    }

    fn tag(&self, concrete: &str, out: &mut Map<String, Value>) -> bool {
        match self.by_type.get(concrete) {
            Some(tag) => {
                out.insert(self.field.clone(), Value::String(tag.clone()));
                true
            }
            None => false,
        }
    }

    fn concrete_types(&self) -> Vec<&str> {
        self.by_tag.values().map(String::as_str).collect()
    }
}

// --------------------------- TypeNameHandler --------------------------------- //

/// The discriminator value is the registered record name itself.
#[derive(Debug, Clone)]
pub struct TypeNameHandler {
    field: String,
}

impl TypeNameHandler {
    pub fn new(field: impl Into<String>) -> Self { Self { field: field.into() } }
}

impl Default for TypeNameHandler {
    fn default() -> Self { Self::new("$type") }
}

impl TypeHandler for TypeNameHandler {
    fn resolve(&self, node: &Map<String, Value>) -> Resolution<'_> {
        match discriminator(node, &self.field) {
            None => Resolution::Untagged,
            Some(tag) => Resolution::Resolved(Cow::Owned(tag.into_owned())),
        }
    }

    fn tag(&self, concrete: &str, out: &mut Map<String, Value>) -> bool {
        out.insert(self.field.clone(), Value::String(concrete.to_owned()));
        true
    }
}

// --------------------------- HandlerRegistry --------------------------------- //

#[derive(Debug, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Box<dyn TypeHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self { Self::default() }

    /// Bind `handler` to `base`, replacing any previous binding.
    pub fn register(&mut self, base: impl Into<String>, handler: impl TypeHandler + 'static) {
        self.handlers.insert(base.into(), Box::new(handler));
    }

    pub fn get(&self, base: &str) -> Option<&dyn TypeHandler> {
        self.handlers.get(base).map(Box::as_ref)
    }

    pub fn len(&self) -> usize { self.handlers.len() }
    pub fn is_empty(&self) -> bool { self.handlers.is_empty() }
}
