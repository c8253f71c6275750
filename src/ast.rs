use crate::error::ResolveError;
use crate::schema::{Cardinality, Column, ColumnType, UnitColumn};

#[derive(Debug, Clone, PartialEq)]
pub enum TopLevelDecl {
    Element(ElementDecl),
    Attributes(ElementAttributes),
    Entity(EntityDecl),
    Availability(EntityAvailability),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementDecl {
    pub name: String,
    pub content: ContentNode,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContentNode {
    Primitive(PrimitiveKind),
    ElementRef(String),
    EntityRef(String),
    Group(GroupKind, Vec<ContentNode>),
    Repeated(RepeatKind, Box<ContentNode>),
}

impl ContentNode {
    pub fn element(name: impl Into<String>) -> Self {
        ContentNode::ElementRef(name.into())
    }

    pub fn entity(name: impl Into<String>) -> Self {
        ContentNode::EntityRef(name.into())
    }

    pub fn repeated(kind: RepeatKind, child: ContentNode) -> Self {
        ContentNode::Repeated(kind, Box::new(child))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Pcdata,
    Cdata,
    Number,
    Id,
    Name,
    Idref,
    Idrefs,
    Empty,
    Any,
}

impl PrimitiveKind {
    /// `None` for EMPTY and ANY, which have no storable scalar.
    pub fn value_type(self) -> Option<ColumnType> {
        match self {
            PrimitiveKind::Empty | PrimitiveKind::Any => None,
            PrimitiveKind::Number => Some(ColumnType::Integer),
            PrimitiveKind::Pcdata
            | PrimitiveKind::Cdata
            | PrimitiveKind::Id
            | PrimitiveKind::Name
            | PrimitiveKind::Idref
            | PrimitiveKind::Idrefs => Some(ColumnType::String),
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "#PCDATA" => Some(PrimitiveKind::Pcdata),
            "CDATA" => Some(PrimitiveKind::Cdata),
            "NUMBER" => Some(PrimitiveKind::Number),
            "ID" => Some(PrimitiveKind::Id),
            "NAME" => Some(PrimitiveKind::Name),
            "IDREF" => Some(PrimitiveKind::Idref),
            "IDREFS" => Some(PrimitiveKind::Idrefs),
            "EMPTY" => Some(PrimitiveKind::Empty),
            "ANY" => Some(PrimitiveKind::Any),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKind {
    Sequence,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepeatKind {
    ZeroOrMore,
    OneOrMore,
    ZeroOrOne,
    MustInclude,
    MustExclude,
}

impl RepeatKind {
    /// Cardinality of a column (or escalated scalar) wrapped by this operator.
    pub fn apply(self, inner: Cardinality) -> Result<Cardinality, ResolveError> {
        match self {
            RepeatKind::ZeroOrMore | RepeatKind::OneOrMore => Ok(Cardinality::Repeated),
            RepeatKind::ZeroOrOne => match inner {
                Cardinality::Repeated => Ok(Cardinality::Repeated),
                Cardinality::Required | Cardinality::Nullable => Ok(Cardinality::Nullable),
            },
            RepeatKind::MustInclude | RepeatKind::MustExclude => {
                Err(ResolveError::UnsupportedOperator(self))
            }
        }
    }
}

impl std::fmt::Display for RepeatKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let symbol = match self {
            RepeatKind::ZeroOrMore => "*",
            RepeatKind::OneOrMore => "+",
            RepeatKind::ZeroOrOne => "?",
            RepeatKind::MustInclude => "+(...)",
            RepeatKind::MustExclude => "-(...)",
        };
        f.write_str(symbol)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDecl {
    pub attr_name: String,
    pub attr_type: AttrType,
    pub pattern: AttrPattern,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrType {
    Constant(PrimitiveKind),
    /// A declared-value keyword with no scalar mapping, e.g. `NMTOKEN`.
    Reference(String),
    Enumerated(Vec<String>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttrPattern {
    Implied,
    Required,
    Fixed(String),
    EnumeratedValue(String),
}

impl AttributeDecl {
    pub fn value_type(&self) -> ColumnType {
        match &self.attr_type {
            AttrType::Constant(kind) => kind.value_type().unwrap_or(ColumnType::String),
            AttrType::Reference(_) | AttrType::Enumerated(_) => ColumnType::String,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self.pattern {
            AttrPattern::Required => Cardinality::Required,
            AttrPattern::Implied | AttrPattern::Fixed(_) | AttrPattern::EnumeratedValue(_) => {
                Cardinality::Nullable
            }
        }
    }

    pub fn to_column(&self) -> Column {
        Column::Unit(UnitColumn::new(
            &self.attr_name,
            self.value_type(),
            self.cardinality(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElementAttributes {
    pub element_name: String,
    pub attributes: Vec<AttributeDecl>,
}

impl ElementAttributes {
    pub fn to_columns(&self) -> Vec<Column> {
        self.attributes.iter().map(AttributeDecl::to_column).collect()
    }

    pub fn summary_cardinality(&self) -> Cardinality {
        if self
            .attributes
            .iter()
            .any(|a| a.cardinality() == Cardinality::Required)
        {
            Cardinality::Required
        } else {
            Cardinality::Nullable
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityDecl {
    pub entity_name: String,
    pub body: EntityBody,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EntityBody {
    Content(ContentNode),
    /// `PUBLIC`/`SYSTEM` identifiers, never expanded.
    External(Vec<String>),
    /// Replacement text that is not a content fragment.
    Literal(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityAvailability {
    pub entity_name: String,
    pub state: Availability,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    Include,
    Ignore,
}
