//! Columns projected from schema facts into a dialog.

use serde::{Deserialize, Serialize};

/// Textual sizes above this many characters get a multi-line editor.
const LONG_TEXT_THRESHOLD: i64 = 256;

const NUMERIC_TYPES: &[&str] = &[
    "int",
    "bigint",
    "smallint",
    "tinyint",
    "decimal",
    "numeric",
    "float",
    "real",
    "money",
    "smallmoney",
];
const DATETIME_TYPES: &[&str] = &["datetime", "datetime2", "smalldatetime", "datetimeoffset"];
const BOOLEAN_TYPES: &[&str] = &["bit", "bool", "boolean"];
const BINARY_TYPES: &[&str] = &["image", "varbinary", "binary"];
const TEXT_TYPES: &[&str] = &["char", "varchar", "nchar", "nvarchar", "text", "ntext"];
const UNBOUNDED_TEXT_TYPES: &[&str] = &["text", "ntext"];

fn is_false(value: &bool) -> bool {
    !*value
}

fn default_true() -> bool {
    true
}

// =============================================================================
// FOREIGN KEY
// =============================================================================

/// A foreign-key reference from a column to another object's column.
///
/// A logical foreign key (`enforce_relation == false`) exists only in the
/// dialog; the database does not enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKey {
    pub name: String,
    pub target_table: String,
    pub target_column: String,
    #[serde(default = "default_true")]
    pub enforce_relation: bool,
}

impl ForeignKey {
    /// A physical, enforced foreign key.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            target_table: target_table.into(),
            target_column: target_column.into(),
            enforce_relation: true,
        }
    }

    /// A logical foreign key, declared in the dialog only.
    #[must_use]
    pub fn logical(
        name: impl Into<String>,
        target_table: impl Into<String>,
        target_column: impl Into<String>,
    ) -> Self {
        Self {
            enforce_relation: false,
            ..Self::new(name, target_table, target_column)
        }
    }

    #[must_use]
    pub const fn is_logical(&self) -> bool {
        !self.enforce_relation
    }
}

// =============================================================================
// UI PROPERTIES
// =============================================================================

/// Editor widget bound to a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UiWidget {
    Textbox,
    Textarea,
    Number,
    Checkbox,
    Combo,
    Radio,
    DatePicker,
    DateTimePicker,
    ImageView,
    FileUpload,
}

/// Search strategy offered for a column in list views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SearchType {
    None,
    Fast,
    Expandable,
}

/// UI properties computed by the column classifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiProps {
    pub ui_widget: UiWidget,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_disabled: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    pub search_type: SearchType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_rule: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

// =============================================================================
// COLUMN
// =============================================================================

/// One schema column as projected into a dialog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub db_type: String,
    /// Declared size (`"50"`, `"MAX"`), absent for fixed-size types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default = "default_true")]
    pub allow_null: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_primary_key: bool,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_identity: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fk: Option<ForeignKey>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_human_id: bool,
    /// Name of the update query that currently owns this column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ui_props: Option<UiProps>,
}

impl Column {
    /// Create a nullable column with the given type.
    #[must_use]
    pub fn new(name: impl Into<String>, db_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            db_type: db_type.into(),
            size: None,
            allow_null: true,
            is_primary_key: false,
            is_identity: false,
            fk: None,
            is_human_id: false,
            update_group: None,
            ui_props: None,
        }
    }

    #[must_use]
    pub fn with_size(mut self, size: impl Into<String>) -> Self {
        self.size = Some(size.into());
        self
    }

    #[must_use]
    pub fn not_null(mut self) -> Self {
        self.allow_null = false;
        self
    }

    /// Mark as primary key (implies not null).
    #[must_use]
    pub fn primary_key(mut self) -> Self {
        self.is_primary_key = true;
        self.allow_null = false;
        self
    }

    #[must_use]
    pub fn identity(mut self) -> Self {
        self.is_identity = true;
        self
    }

    #[must_use]
    pub fn with_fk(mut self, fk: ForeignKey) -> Self {
        self.fk = Some(fk);
        self
    }

    fn type_is(&self, names: &[&str]) -> bool {
        names.iter().any(|n| n.eq_ignore_ascii_case(&self.db_type))
    }

    /// Declared size as a number; `None` for `MAX` or missing sizes.
    #[must_use]
    pub fn size_value(&self) -> Option<i64> {
        self.size.as_deref().and_then(|s| s.trim().parse().ok())
    }

    #[must_use]
    pub fn is_numeric(&self) -> bool {
        self.type_is(NUMERIC_TYPES)
    }

    #[must_use]
    pub fn is_date(&self) -> bool {
        self.db_type.eq_ignore_ascii_case("date")
    }

    #[must_use]
    pub fn is_datetime(&self) -> bool {
        self.type_is(DATETIME_TYPES)
    }

    #[must_use]
    pub fn is_temporal(&self) -> bool {
        self.is_date() || self.is_datetime()
    }

    #[must_use]
    pub fn is_boolean(&self) -> bool {
        self.type_is(BOOLEAN_TYPES)
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.type_is(BINARY_TYPES)
    }

    #[must_use]
    pub fn is_textual(&self) -> bool {
        self.type_is(TEXT_TYPES)
    }

    /// Text without an upper bound (`nvarchar(MAX)`, `-1`, `text`).
    #[must_use]
    pub fn is_unbounded_text(&self) -> bool {
        if !self.is_textual() {
            return false;
        }
        if self.type_is(UNBOUNDED_TEXT_TYPES) {
            return true;
        }
        match self.size.as_deref() {
            Some(size) => size.eq_ignore_ascii_case("max") || self.size_value() == Some(-1),
            None => false,
        }
    }

    /// Text that deserves a multi-line editor.
    #[must_use]
    pub fn is_long_text(&self) -> bool {
        self.is_unbounded_text()
            || (self.is_textual() && self.size_value().is_some_and(|s| s > LONG_TEXT_THRESHOLD))
    }
}

// =============================================================================
// TESTS
// =============================================================================
