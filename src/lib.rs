//! A routing trie that resolves URL paths to application models.
//!
//! Paths are declared as patterns such as `/documents/{id}/{name}-{version}`.
//! All patterns are compiled into one trie. A request path is resolved by
//! walking the trie segment by segment, extracting and converting variables
//! on the way, until a segment starts with the reserved marker `+` or no
//! step matches. What is left over names a view of the model that was found.
//!
//! ```rust
//! use traject::{path_stack, Traject, Value};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut traject = Traject::new();
//! traject.insert("/documents", "index")?;
//! traject.insert("/documents/{id:int}", "document")?;
//! traject.insert("/documents/{name}-{version}", "versioned")?;
//!
//! let matched = traject.consume(path_stack("/documents/1"));
//! assert_eq!(matched.value, Some(&"document"));
//! assert_eq!(matched.variables.get("id"), Some(&Value::Int(1)));
//!
//! let matched = traject.consume(path_stack("/documents/foo-2/+edit"));
//! assert_eq!(matched.value, Some(&"versioned"));
//! assert_eq!(matched.variables.get_str("version"), Some("2"));
//! assert_eq!(matched.unconsumed, ["+edit"]);
//! # Ok(())
//! # }
//! ```
//!
//! Most applications register models on a [`PathRegistry`] and resolve
//! requests with the [`Router`] it builds; see the [`router`] module.
#![deny(clippy::all)]
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

mod config;
mod converter;
mod error;
mod params;
mod path;
mod query;
mod request;
mod route;
pub mod router;
mod step;
mod tree;
mod value;

pub use config::RouterConfig;
pub use converter::{Codec, Converter, ConverterRegistry, Converters};
pub use error::{ConfigError, ConvertError, LinkError, ParameterError, TrajectError};
pub use params::Variables;
pub use path::{create_path, normalize_path, parse_path, path_stack, Path};
pub use query::{ParameterFactory, Query, EXTRA_PARAMETERS};
pub use request::Request;
pub use route::ModelPath;
pub use router::{PathRegistry, Resolved, RouteId, Router};
pub use step::{is_identifier, parse_variables, Step};
pub use tree::{Match, Traject, VIEW_PREFIX};
pub use value::Value;
