use thiserror::Error;

use crate::ast::RepeatKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Resolve(#[from] ResolveError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("syntax error in DTD at line {line}, column {column}: unexpected `{context}`")]
pub struct ParseError {
    pub line: usize,
    pub column: usize,
    pub context: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Element,
    Entity,
}

impl std::fmt::Display for RefKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RefKind::Element => f.write_str("element"),
            RefKind::Entity => f.write_str("entity"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error("root element `{0}` is not declared")]
    UndeclaredRoot(String),
    #[error("content model operator `{0}` has no column cardinality")]
    UnsupportedOperator(RepeatKind),
    #[error("cyclic {kind} reference: {}", path.join(" -> "))]
    CyclicReference { kind: RefKind, path: Vec<String> },
}
