//! # Column Classifier
//!
//! Pure, total classification of one column: which standard queries it
//! participates in and which UI properties it gets. Depends only on the
//! column's own attributes and the naming conventions.

use crate::conventions::{self, AUDITING_GROUP, RULE_DATE, RULE_DATETIME, RULE_NUMERIC};
use crate::types::{Column, SearchType, UiProps, UiWidget};

/// Participation of a column in the standard query set, plus its UI properties.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub in_create: bool,
    pub in_read_list: bool,
    pub in_read_by_key: bool,
    pub in_update_by_key: bool,
    pub in_delete: bool,
    pub ui_props: UiProps,
}

/// Classify a column.
#[must_use]
pub fn classify(column: &Column) -> Classification {
    Classification {
        in_create: in_create(column),
        in_read_list: in_read_list(column),
        in_read_by_key: true,
        in_update_by_key: in_update_by_key(column),
        in_delete: column.is_primary_key,
        ui_props: ui_props(column),
    }
}

/// Recompute and store the column's UI properties.
pub fn apply(column: &mut Column) {
    column.ui_props = Some(ui_props(column));
}

// =============================================================================
// PARTICIPATION
// =============================================================================

#[must_use]
pub fn in_create(column: &Column) -> bool {
    !column.is_identity && !conventions::is_updated_audit(&column.name)
}

/// Bulky payloads stay out of list responses; thumbnails are kept.
#[must_use]
pub fn in_read_list(column: &Column) -> bool {
    if column.is_binary() {
        return conventions::is_thumbnail(&column.name);
    }
    !column.is_unbounded_text()
}

#[must_use]
pub fn in_update_by_key(column: &Column) -> bool {
    column.is_primary_key
        || (!column.is_identity && !conventions::is_created_audit(&column.name))
}

// =============================================================================
// UI PROPERTIES
// =============================================================================

/// Human-readable identifier of a row.
#[must_use]
pub fn is_display_column(column: &Column) -> bool {
    !column.is_primary_key
        && column.is_textual()
        && conventions::is_display_name(&column.name)
        && !conventions::is_file_meta(&column.name)
}

#[must_use]
pub fn best_widget(column: &Column) -> UiWidget {
    if let Some(fk) = &column.fk {
        return if conventions::is_base_info(&fk.target_table) {
            UiWidget::Radio
        } else {
            UiWidget::Combo
        };
    }
    if column.is_boolean() {
        UiWidget::Checkbox
    } else if column.is_date() {
        UiWidget::DatePicker
    } else if column.is_datetime() {
        UiWidget::DateTimePicker
    } else if column.is_binary() {
        if conventions::is_thumbnail(&column.name) {
            UiWidget::ImageView
        } else {
            UiWidget::FileUpload
        }
    } else if column.is_numeric() {
        UiWidget::Number
    } else if column.is_long_text() {
        UiWidget::Textarea
    } else {
        UiWidget::Textbox
    }
}

#[must_use]
pub fn search_type(column: &Column, widget: UiWidget) -> SearchType {
    if column.is_human_id || is_display_column(column) || matches!(widget, UiWidget::Combo | UiWidget::Radio) {
        SearchType::Fast
    } else if column.is_binary() || column.is_temporal() {
        SearchType::None
    } else {
        SearchType::Expandable
    }
}

#[must_use]
pub fn validation_rule(column: &Column) -> Option<String> {
    if column.fk.is_some() {
        None
    } else if column.is_numeric() {
        Some(RULE_NUMERIC.to_string())
    } else if column.is_datetime() {
        Some(RULE_DATETIME.to_string())
    } else if column.is_date() {
        Some(RULE_DATE.to_string())
    } else {
        None
    }
}

#[must_use]
pub fn ui_props(column: &Column) -> UiProps {
    let ui_widget = best_widget(column);
    let audit = conventions::is_audit_column(&column.name);
    UiProps {
        ui_widget,
        is_disabled: column.is_identity || audit,
        required: !column.allow_null,
        search_type: search_type(column, ui_widget),
        validation_rule: validation_rule(column),
        group: audit.then(|| AUDITING_GROUP.to_string()),
    }
}

// =============================================================================
// TESTS
// =============================================================================
