use super::Converter;
use crate::error::{ErrorKind, Path};
use crate::ir::Ty;
use crate::value::Value;
use crate::Node;

impl Converter<'_> {
    /// Sequence builder: one output element per input element, same order.
    pub(crate) fn build_list(&self, item: &Ty, node: &Node, path: &Path) -> Result<Value, ErrorKind> {
        let Node::Array(elements) = node else {
            return Err(ErrorKind::mismatch(path, format!("sequence of {item}"), node));
        };
        let mut out = Vec::with_capacity(elements.len());
        for (i, el) in elements.iter().enumerate() {
            out.push(self.element(item, el, &path.index(i))?);
        }
        Ok(Value::List(out))
    }
}
