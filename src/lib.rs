//! Type-directed mapping of parsed JSON trees onto declared record, enum and
//! container descriptors.
//!
//! Register the descriptors once (`&mut Deserializer`), then map any number of
//! payloads concurrently (`&Deserializer`):
//!
//! ```
//! use json_typemap::{Deserializer, Options};
//!
//! let de = Deserializer::with_options(Options::default().with_root_element("data"));
//! let ids: Vec<u32> = de.deserialize(r#"{ "data": ["1", 2, 3] }"#).unwrap();
//! assert_eq!(ids, [1, 2, 3]);
//! ```
pub mod convert;
pub mod de;
pub mod error;
pub mod handler;
pub mod ir;
pub mod locale;
pub mod naming;
pub mod path_de;
pub mod registry;
pub mod schema;
pub mod target;
pub mod value;

#[cfg(feature = "tracing")]
#[allow(unused_imports)]
pub(crate) use tracing::{debug, trace};

#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::trace when the tracing feature is enabled
macro_rules! trace {
    ($($tt:tt)*) => {};
}
#[cfg(not(feature = "tracing"))]
#[macro_export]
#[doc(hidden)]
/// Forwards to tracing::debug when the tracing feature is enabled
macro_rules! debug {
    ($($tt:tt)*) => {};
}

/// Generic tree produced by the parser.
pub type Node = serde_json::Value;

pub use de::{find_root, Deserializer, DiscriminatorPolicy, JsonParser, Options, Parser};
pub use error::{Error, ErrorKind, Path, Segment};
pub use handler::{DiscriminatorHandler, HandlerRegistry, Resolution, TypeHandler, TypeNameHandler};
pub use ir::{EnumTy, Field, RecordTy, Scalar, Ty};
pub use locale::Locale;
pub use registry::{RecordBuilder, TypeRegistry};
pub use target::{EnumTarget, Target};
pub use value::{EnumValue, Record, UriRef, Value};
