use std::collections::BTreeSet;

use tracing::{debug, instrument, warn};

use crate::ast::{ContentNode, ElementAttributes, ElementDecl, EntityBody};
use crate::error::{RefKind, ResolveError};
use crate::index::DeclarationIndex;
use crate::schema::{Cardinality, Column, ColumnType, RecordColumn, UnitColumn};

pub const DEFAULT_DETAIL_FIELD: &str = "detail";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveOptions {
    /// Name of the scalar field added next to attribute columns.
    pub detail_field: String,
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            detail_field: DEFAULT_DETAIL_FIELD.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub column: Option<Column>,
    /// Element names referenced somewhere under the root but never declared.
    pub unresolved: BTreeSet<String>,
}

/// Outcome of expanding a content model fragment.
#[derive(Debug, Clone, PartialEq)]
enum Expansion {
    Columns(Vec<Column>),
    /// A bare scalar was reached; the owning element becomes a constant column.
    Escalate {
        value_type: Option<ColumnType>,
        cardinality: Cardinality,
    },
}

#[derive(Debug, Default)]
struct Trail {
    unresolved: BTreeSet<String>,
    elements: Vec<String>,
    entities: Vec<String>,
}

impl Trail {
    fn enter(&mut self, kind: RefKind, name: &str) -> Result<(), ResolveError> {
        let stack = match kind {
            RefKind::Element => &mut self.elements,
            RefKind::Entity => &mut self.entities,
        };
        if let Some(pos) = stack.iter().position(|n| n == name) {
            let mut path: Vec<String> = stack.iter().skip(pos).cloned().collect();
            path.push(name.to_string());
            return Err(ResolveError::CyclicReference { kind, path });
        }
        stack.push(name.to_string());
        Ok(())
    }

    fn leave(&mut self, kind: RefKind) {
        match kind {
            RefKind::Element => self.elements.pop(),
            RefKind::Entity => self.entities.pop(),
        };
    }
}

struct Resolver<'a> {
    index: &'a DeclarationIndex,
    options: &'a ResolveOptions,
}

#[instrument(skip(index, options))]
pub fn resolve(
    index: &DeclarationIndex,
    root: &str,
    options: &ResolveOptions,
) -> Result<Resolution, ResolveError> {
    let decl = index
        .element(root)
        .ok_or_else(|| ResolveError::UndeclaredRoot(root.to_string()))?;

    let resolver = Resolver { index, options };
    let mut trail = Trail::default();
    let column = resolver.resolve_element(decl, &mut trail)?;

    if column.is_none() {
        warn!(root, "root element has no representable content");
    }
    if !trail.unresolved.is_empty() {
        warn!(
            count = trail.unresolved.len(),
            "element references left unresolved"
        );
    }

    Ok(Resolution {
        column,
        unresolved: trail.unresolved,
    })
}

impl Resolver<'_> {
    fn resolve_element(
        &self,
        decl: &ElementDecl,
        trail: &mut Trail,
    ) -> Result<Option<Column>, ResolveError> {
        trail.enter(RefKind::Element, &decl.name)?;
        // Entity substitution is scoped to a single content model.
        let outer_entities = std::mem::take(&mut trail.entities);
        debug!(element = %decl.name, "resolving element");

        let attrs = self.index.attributes(&decl.name);
        let column = match &decl.content {
            ContentNode::Primitive(kind) => Some(self.constant_element(
                &decl.name,
                kind.value_type(),
                Cardinality::Required,
                attrs,
            )),
            content => match self.resolve_content(content, trail)? {
                Expansion::Escalate {
                    value_type,
                    cardinality,
                } => Some(self.constant_element(&decl.name, value_type, cardinality, attrs)),
                Expansion::Columns(columns) => record_element(&decl.name, columns, attrs),
            },
        };

        trail.entities = outer_entities;
        trail.leave(RefKind::Element);
        Ok(column)
    }

    fn constant_element(
        &self,
        name: &str,
        value_type: Option<ColumnType>,
        cardinality: Cardinality,
        attrs: Option<&ElementAttributes>,
    ) -> Column {
        match (value_type, attrs) {
            (None, None) => Column::Unit(UnitColumn::new(name, ColumnType::String, cardinality)),
            (None, Some(attrs)) => Column::Record(RecordColumn::new(
                name,
                attrs.to_columns(),
                attrs.summary_cardinality(),
            )),
            (Some(value_type), None) => {
                Column::Unit(UnitColumn::new(name, value_type, cardinality))
            }
            (Some(value_type), Some(attrs)) => {
                let mut fields = attrs.to_columns();
                fields.push(Column::Unit(UnitColumn::new(
                    &self.options.detail_field,
                    value_type,
                    cardinality,
                )));
                Column::Record(RecordColumn::new(name, fields, Cardinality::Required))
            }
        }
    }

    fn resolve_content(
        &self,
        node: &ContentNode,
        trail: &mut Trail,
    ) -> Result<Expansion, ResolveError> {
        match node {
            ContentNode::Primitive(kind) => Ok(Expansion::Escalate {
                value_type: kind.value_type(),
                cardinality: Cardinality::Required,
            }),
            ContentNode::ElementRef(name) => match self.index.element(name) {
                Some(decl) => {
                    let column = self.resolve_element(decl, trail)?;
                    Ok(Expansion::Columns(column.into_iter().collect()))
                }
                None => {
                    debug!(element = %name, "dangling element reference");
                    trail.unresolved.insert(name.clone());
                    Ok(Expansion::Columns(Vec::new()))
                }
            },
            ContentNode::EntityRef(name) => self.resolve_entity(name, trail),
            ContentNode::Group(_, children) => {
                let mut columns = Vec::new();
                for child in children {
                    match self.resolve_content(child, trail)? {
                        Expansion::Columns(more) => columns.extend(more),
                        escalate @ Expansion::Escalate { .. } => return Ok(escalate),
                    }
                }
                Ok(Expansion::Columns(columns))
            }
            ContentNode::Repeated(kind, child) => match self.resolve_content(child, trail)? {
                Expansion::Escalate {
                    value_type,
                    cardinality,
                } => Ok(Expansion::Escalate {
                    value_type,
                    cardinality: kind.apply(cardinality)?,
                }),
                Expansion::Columns(columns) => {
                    let columns = columns
                        .into_iter()
                        .map(|c| {
                            let cardinality = kind.apply(c.cardinality())?;
                            Ok(c.with_cardinality(cardinality))
                        })
                        .collect::<Result<Vec<_>, ResolveError>>()?;
                    Ok(Expansion::Columns(columns))
                }
            },
        }
    }

    fn resolve_entity(&self, name: &str, trail: &mut Trail) -> Result<Expansion, ResolveError> {
        let Some(entity) = self.index.entity(name) else {
            if self.index.availability(name).is_some() {
                debug!(entity = name, "availability marker used as content");
            } else {
                debug!(entity = name, "undeclared entity reference");
            }
            return Ok(Expansion::Columns(Vec::new()));
        };

        match &entity.body {
            EntityBody::Content(body) => {
                trail.enter(RefKind::Entity, name)?;
                let expansion = self.resolve_content(body, trail)?;
                trail.leave(RefKind::Entity);
                Ok(expansion)
            }
            EntityBody::External(_) | EntityBody::Literal(_) => {
                debug!(entity = name, "entity body is not expandable");
                Ok(Expansion::Columns(Vec::new()))
            }
        }
    }
}

fn record_element(
    name: &str,
    columns: Vec<Column>,
    attrs: Option<&ElementAttributes>,
) -> Option<Column> {
    // Attributes alone do not keep an element whose content vanished.
    if columns.is_empty() {
        return None;
    }
    let column = match attrs {
        None => RecordColumn::new(name, columns, Cardinality::Nullable),
        Some(attrs) => {
            let mut fields = attrs.to_columns();
            fields.extend(columns);
            RecordColumn::new(name, fields, Cardinality::Required)
        }
    };
    Some(Column::Record(column))
}
