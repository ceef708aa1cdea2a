// src/process/schema.rs

/// One positional slot of a fixed-width record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// A column that is decoded, trimmed and returned.
    Keep { name: &'static str, width: usize },
    /// Filler that is consumed and discarded.
    Skip(usize),
}

impl Field {
    pub const fn width(&self) -> usize {
        match self {
            Field::Keep { width, .. } => *width,
            Field::Skip(width) => *width,
        }
    }
}

/// Ordered field layout of one record type.
#[derive(Debug, PartialEq, Eq)]
pub struct FieldWidthSchema {
    fields: &'static [Field],
}

impl FieldWidthSchema {
    pub const fn new(fields: &'static [Field]) -> Self {
        Self { fields }
    }

    pub fn fields(&self) -> &'static [Field] {
        self.fields
    }

    /// Total byte span covered by the layout, filler included.
    pub fn span(&self) -> usize {
        self.fields.iter().map(Field::width).sum()
    }

    /// Byte offset where the final slot begins.
    pub fn last_offset(&self) -> usize {
        self.span() - self.fields.last().map(Field::width).unwrap_or(0)
    }

    /// Number of fields a decode yields.
    pub fn kept(&self) -> usize {
        self.fields
            .iter()
            .filter(|f| matches!(f, Field::Keep { .. }))
            .count()
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.fields
            .iter()
            .filter_map(|f| match f {
                Field::Keep { name, .. } => Some(*name),
                Field::Skip(_) => None,
            })
            .collect()
    }
}

const fn keep(name: &'static str, width: usize) -> Field {
    Field::Keep { name, width }
}

pub static COMPANY_SCHEMA: FieldWidthSchema = FieldWidthSchema::new(&[
    keep("record_type", 2),
    keep("national_id", 14),
    keep("legal_name", 150),
]);

pub static SHAREHOLDER_SCHEMA: FieldWidthSchema = FieldWidthSchema::new(&[
    keep("record_type", 2),
    keep("national_id", 14),
    keep("id_type_indicator", 1),
    keep("id_type_national_id", 14),
    keep("qualification_code", 2),
    keep("shareholder_name", 150),
]);
