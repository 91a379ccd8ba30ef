//! Resource schemas and path evaluation.
//!
//! - [`SearchParameterRegistry`] - per-type element schema and search parameter definitions
//! - [`SchemaLoader`] - embedded and runtime-supplied schemas
//! - [`PathEvaluator`], [`JsonPathEvaluator`] - locate typed values inside a resource
//! - [`ElementValue`] - the tagged values the evaluator yields

mod element;
mod evaluator;
mod loader;
mod registry;
mod value;

pub use element::{DataType, ElementDefinition};
pub use evaluator::{JsonPathEvaluator, PathEvaluator};
pub use loader::SchemaLoader;
pub use registry::{ResourceSchema, SearchParamDef, SearchParameterRegistry};
pub use value::{CodingValue, ElementValue};
