//! Input schema and its mapping onto Tableau column kinds.

use std::fmt;

use crate::error::ExtractError;

/// Type of an input column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueType {
    Boolean,
    Integer,
    Long,
    Double,
    String,
    /// Anything without a Tableau counterpart (dates, collections, ...).
    Other(String),
}

/// One column of the input table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    pub name: String,
    pub value_type: ValueType,
}

impl ColumnSpec {
    pub fn new(name: &str, value_type: ValueType) -> Self {
        Self {
            name: name.to_string(),
            value_type,
        }
    }
}

/// One input cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Missing,
    Boolean(bool),
    Integer(i32),
    Long(i64),
    Double(f64),
    String(String),
    /// A value of a type without a Tableau counterpart.
    Other(String),
}

/// Column kinds supported by the extract backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnKind {
    Boolean,
    Integer,
    Double,
    CharString,
}

impl ColumnKind {
    /// Kind for an input type, or `None` if the column is not exported.
    pub fn for_type(value_type: &ValueType) -> Option<Self> {
        match value_type {
            ValueType::Boolean => Some(Self::Boolean),
            ValueType::Integer => Some(Self::Integer),
            ValueType::Long | ValueType::Double => Some(Self::Double),
            ValueType::String => Some(Self::CharString),
            ValueType::Other(_) => None,
        }
    }
}

impl fmt::Display for ColumnKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::Double => "double",
            Self::CharString => "char string",
        };
        f.write_str(name)
    }
}

/// Value handed to the backend for one cell.
#[derive(Debug, Clone, PartialEq)]
pub enum TableauValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    CharString(String),
}

/// An exported input column: where to read it and how to write it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnBinding {
    pub source_index: usize,
    pub name: String,
    pub kind: ColumnKind,
}

impl ColumnBinding {
    /// Converts an input cell for this column.
    pub fn convert(&self, row: u64, cell: &Cell) -> Result<TableauValue, ExtractError> {
        let value = match (self.kind, cell) {
            (_, Cell::Missing) => TableauValue::Null,
            (ColumnKind::Boolean, Cell::Boolean(b)) => TableauValue::Boolean(*b),
            (ColumnKind::Integer, Cell::Integer(i)) => TableauValue::Integer(i64::from(*i)),
            (ColumnKind::Double, Cell::Double(d)) => TableauValue::Double(*d),
            (ColumnKind::Double, Cell::Long(l)) => TableauValue::Double(*l as f64),
            (ColumnKind::Double, Cell::Integer(i)) => TableauValue::Double(f64::from(*i)),
            (ColumnKind::CharString, Cell::String(s)) => TableauValue::CharString(s.clone()),
            (kind, _) => {
                return Err(ExtractError::CellMismatch {
                    row,
                    column: self.name.clone(),
                    expected: kind,
                });
            }
        };
        Ok(value)
    }
}

/// Maps an input schema to the columns written to the extract.
///
/// Columns without a Tableau kind are dropped silently.
pub fn resolve_bindings(schema: &[ColumnSpec]) -> Vec<ColumnBinding> {
    schema
        .iter()
        .enumerate()
        .filter_map(|(source_index, column)| {
            ColumnKind::for_type(&column.value_type).map(|kind| ColumnBinding {
                source_index,
                name: column.name.clone(),
                kind,
            })
        })
        .collect()
}

/// Column layout of the extract table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableDefinition {
    pub columns: Vec<(String, ColumnKind)>,
}

impl TableDefinition {
    pub fn from_bindings(bindings: &[ColumnBinding]) -> Self {
        Self {
            columns: bindings
                .iter()
                .map(|b| (b.name.clone(), b.kind))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<ColumnSpec> {
        vec![
            ColumnSpec::new("flag", ValueType::Boolean),
            ColumnSpec::new("count", ValueType::Integer),
            ColumnSpec::new("when", ValueType::Other("LocalDate".into())),
            ColumnSpec::new("big", ValueType::Long),
            ColumnSpec::new("ratio", ValueType::Double),
            ColumnSpec::new("label", ValueType::String),
        ]
    }

    #[test]
    fn bindings_skip_unsupported_columns() {
        let bindings = resolve_bindings(&schema());
        let summary: Vec<(usize, &str, ColumnKind)> = bindings
            .iter()
            .map(|b| (b.source_index, b.name.as_str(), b.kind))
            .collect();
        assert_eq!(
            summary,
            [
                (0, "flag", ColumnKind::Boolean),
                (1, "count", ColumnKind::Integer),
                (3, "big", ColumnKind::Double),
                (4, "ratio", ColumnKind::Double),
                (5, "label", ColumnKind::CharString),
            ]
        );
    }

    #[test]
    fn table_definition_follows_bindings() {
        let def = TableDefinition::from_bindings(&resolve_bindings(&schema()));
        assert_eq!(def.columns.len(), 5);
        assert_eq!(def.columns[2], ("big".to_string(), ColumnKind::Double));
    }

    #[test]
    fn missing_cells_become_null() {
        for binding in resolve_bindings(&schema()) {
            assert_eq!(binding.convert(0, &Cell::Missing).unwrap(), TableauValue::Null);
        }
    }

    #[test]
    fn cells_convert_to_their_kind() {
        let b = resolve_bindings(&schema());
        assert_eq!(b[0].convert(0, &Cell::Boolean(true)).unwrap(), TableauValue::Boolean(true));
        assert_eq!(b[1].convert(0, &Cell::Integer(-7)).unwrap(), TableauValue::Integer(-7));
        assert_eq!(
            b[2].convert(0, &Cell::Long(1 << 40)).unwrap(),
            TableauValue::Double((1u64 << 40) as f64)
        );
        assert_eq!(b[3].convert(0, &Cell::Double(0.5)).unwrap(), TableauValue::Double(0.5));
        assert_eq!(
            b[4].convert(0, &Cell::String("x".into())).unwrap(),
            TableauValue::CharString("x".into())
        );
    }

    #[test]
    fn mismatched_cell_is_an_error() {
        let b = resolve_bindings(&schema());
        let err = b[1].convert(3, &Cell::String("seven".into())).unwrap_err();
        match err {
            ExtractError::CellMismatch {
                row,
                column,
                expected,
            } => {
                assert_eq!(row, 3);
                assert_eq!(column, "count");
                assert_eq!(expected, ColumnKind::Integer);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
