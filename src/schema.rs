use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    #[serde(rename = "STRING")]
    String,
    #[serde(rename = "INT64")]
    Integer,
    #[serde(rename = "FLOAT")]
    Float,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "DATETIME")]
    DateTime,
    #[serde(rename = "RECORD")]
    Record,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Cardinality {
    Required,
    Nullable,
    Repeated,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Unit(UnitColumn),
    Record(RecordColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnitColumn {
    pub name: String,
    pub value_type: ColumnType,
    pub cardinality: Cardinality,
}

impl UnitColumn {
    pub fn new(name: impl Into<String>, value_type: ColumnType, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            value_type,
            cardinality,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordColumn {
    pub name: String,
    pub cardinality: Cardinality,
    fields: Vec<Column>,
}

impl RecordColumn {
    /// Fields sharing a name collapse into one; see [`dedup_fields`].
    pub fn new(name: impl Into<String>, fields: Vec<Column>, cardinality: Cardinality) -> Self {
        Self {
            name: name.into(),
            cardinality,
            fields: dedup_fields(fields),
        }
    }

    pub fn fields(&self) -> &[Column] {
        &self.fields
    }
}

/// Keeps the first field of each name, except that a REQUIRED field is
/// replaced by a later one of the same name with a different cardinality.
pub fn dedup_fields(fields: Vec<Column>) -> Vec<Column> {
    let mut kept: Vec<Column> = Vec::with_capacity(fields.len());
    for field in fields {
        match kept.iter_mut().find(|k| k.name() == field.name()) {
            Some(before) => {
                if before.cardinality() == Cardinality::Required
                    && before.cardinality() != field.cardinality()
                {
                    *before = field;
                }
            }
            None => kept.push(field),
        }
    }
    kept
}

impl Column {
    pub fn name(&self) -> &str {
        match self {
            Column::Unit(unit) => &unit.name,
            Column::Record(record) => &record.name,
        }
    }

    pub fn value_type(&self) -> ColumnType {
        match self {
            Column::Unit(unit) => unit.value_type,
            Column::Record(_) => ColumnType::Record,
        }
    }

    pub fn cardinality(&self) -> Cardinality {
        match self {
            Column::Unit(unit) => unit.cardinality,
            Column::Record(record) => record.cardinality,
        }
    }

    pub fn with_cardinality(mut self, cardinality: Cardinality) -> Self {
        match &mut self {
            Column::Unit(unit) => unit.cardinality = cardinality,
            Column::Record(record) => record.cardinality = cardinality,
        }
        self
    }

    pub fn fields(&self) -> Option<&[Column]> {
        match self {
            Column::Unit(_) => None,
            Column::Record(record) => Some(record.fields()),
        }
    }

    pub fn to_output_tree(&self) -> SchemaField {
        SchemaField {
            name: self.name().to_string(),
            value_type: self.value_type(),
            mode: self.cardinality(),
            fields: self
                .fields()
                .map(|fields| fields.iter().map(Column::to_output_tree).collect()),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.to_output_tree())
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.to_output_tree())
    }
}

/// Serializable projection of a [`Column`] tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ColumnType,
    pub mode: Cardinality,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<SchemaField>>,
}
