use serde_json::Map;

use super::Converter;
use crate::de::DiscriminatorPolicy;
use crate::error::{ErrorKind, Path};
use crate::handler::Resolution;
use crate::ir::Ty;
use crate::locale::Locale;
use crate::naming::name_variants;
use crate::value::{Record, Value};
use crate::{debug, trace, Node};

impl Converter<'_> {
    /// Associative builder. Keys are copied unchanged, values converted.
    pub(crate) fn build_map(&self, key: &Ty, value: &Ty, node: &Node, path: &Path) -> Result<Value, ErrorKind> {
        if *key != Ty::String {
            return Err(ErrorKind::unsupported(path, format!("map keys must be strings, found `{key}`")));
        }
        let Node::Object(entries) = node else {
            return Err(ErrorKind::mismatch(path, format!("mapping of {value}"), node));
        };
        let mut out = indexmap::IndexMap::with_capacity(entries.len());
        for (k, v) in entries {
            out.insert(k.clone(), self.element(value, v, &path.key(k))?);
        }
        Ok(Value::Map(out))
    }

    /// Polymorphic construction: pick the concrete type, allocate it at its
    /// defaults, then fill it from the node.
    pub(crate) fn create_and_map(&self, base: &str, node: &Node, path: &Path) -> Result<Value, ErrorKind> {
        let Node::Object(entries) = node else {
            return Err(ErrorKind::mismatch(path, format!("mapping for {base}"), node));
        };
        if !self.types.is_record(base) {
            return Err(ErrorKind::unsupported(path, format!("record `{base}` is not registered")));
        }
        let concrete = self.resolve_concrete(base, entries, path)?;
        let mut record = self.types.instantiate(&concrete);
        self.fill(&mut record, entries, path)?;
        Ok(Value::Record(record))
    }

    fn resolve_concrete(&self, base: &str, entries: &Map<String, Node>, path: &Path) -> Result<String, ErrorKind> {
        let Some(handler) = self.handlers.get(base) else {
            return Ok(base.to_owned());
        };
        let unmatched = match handler.resolve(entries) {
            Resolution::Untagged => return Ok(base.to_owned()),
            Resolution::Resolved(name) if self.types.is_descendant(&name, base) => {
                trace!("`{path}` resolved {base} as {name}");
                return Ok(name.into_owned());
            }
            Resolution::Resolved(name) => name.into_owned(),
            Resolution::Unmatched(tag) => tag,
        };
        match self.options.discriminators {
            DiscriminatorPolicy::Permissive => {
                debug!("`{path}`: discriminator {unmatched:?} names no subtype of {base}, keeping the base type");
                Ok(base.to_owned())
            }
            DiscriminatorPolicy::FailClosed => Err(ErrorKind::conversion(
                path,
                base,
                unmatched,
                format!("discriminator names no registered subtype of {base}"),
            )),
        }
    }

    /// Object mapper. Fields without a matching key, or whose value is null, keep
    /// what the record already holds.
    pub(crate) fn map_record(&self, record: &mut Record, node: &Node, path: &Path) -> Result<(), ErrorKind> {
        let Node::Object(entries) = node else {
            return Err(ErrorKind::mismatch(path, format!("mapping for {}", record.type_name()), node));
        };
        self.fill(record, entries, path)
    }

    fn fill(&self, record: &mut Record, entries: &Map<String, Node>, path: &Path) -> Result<(), ErrorKind> {
        let locale = &self.options.locale;
        for field in self.types.fields_of(record.type_name()) {
            if !field.writable {
                continue;
            }
            let Some(found) = find_key(entries, &field.name, locale) else {
                continue;
            };
            if found.is_null() {
                continue;
            }
            let value = self.convert(field.ty.unwrap_nullable(), found, &path.field(&field.name))?;
            record.set(field.name.clone(), value);
        }
        Ok(())
    }
}

/// First key matching one of the name variants exactly, else the first key (in
/// document order) equal to a variant ignoring case.
pub(crate) fn find_key<'n>(entries: &'n Map<String, Node>, name: &str, locale: &Locale) -> Option<&'n Node> {
    let variants = name_variants(name, locale);
    if let Some(found) = variants.iter().find_map(|v| entries.get(v)) {
        return Some(found);
    }
    entries
        .iter()
        .find(|(k, _)| variants.iter().any(|v| locale.eq_ignore_case(k, v)))
        .map(|(_, v)| v)
}
