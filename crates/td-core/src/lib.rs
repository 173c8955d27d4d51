pub mod camera;
pub mod emitter;
pub mod id;
pub mod json;
pub mod mermaid;
pub mod model;
pub mod parser;
pub mod sql;
pub mod validate;

pub use camera::{Camera, MAX_ZOOM, MIN_ZOOM, Viewport};
pub use emitter::emit_schema;
pub use id::EntityId;
pub use json::{JsonError, tables_from_json, tables_to_json};
pub use mermaid::emit_mermaid;
pub use model::*;
pub use parser::{Diagnostic, parse_schema};
pub use sql::emit_sql;
pub use validate::{Finding, Severity, validate_schema};
