//! Converts a DTD into a nested column schema for loading XML/SGML
//! documents into a columnar table.

pub mod ast;
pub mod error;
pub mod index;
pub mod parser;
pub mod resolver;
pub mod schema;

pub use error::{Error, ParseError, ResolveError, Result};
pub use index::{DeclarationIndex, build_index};
pub use parser::parse_dtd;
pub use resolver::{Resolution, ResolveOptions, resolve};
pub use schema::{Cardinality, Column, ColumnType, RecordColumn, SchemaField, UnitColumn};

pub fn convert(input: &str, root: &str, options: &ResolveOptions) -> Result<Resolution> {
    let decls = parse_dtd(input)?;
    let index = build_index(decls);
    Ok(resolve(&index, root, options)?)
}
