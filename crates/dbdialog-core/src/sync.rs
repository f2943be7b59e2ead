//! # Schema Sync
//!
//! Reconciles a dialog with the live columns of its object. New columns are
//! classified and appended; vanished columns are removed together with every
//! reference to them.

use crate::classifier;
use crate::types::{Column, Dialog};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

/// Columns added to and removed from a dialog by one reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl SyncReport {
    #[must_use]
    pub fn is_unchanged(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Bring the dialog's columns in line with `live`.
pub fn reconcile(dialog: &mut Dialog, live: &[Column]) -> SyncReport {
    let live_names: BTreeSet<&str> = live.iter().map(|c| c.name.as_str()).collect();
    let known: BTreeSet<String> = dialog.columns.iter().map(|c| c.name.clone()).collect();

    let mut report = SyncReport::default();

    for column in live.iter().filter(|c| !known.contains(&c.name)) {
        let mut added = column.clone();
        added.is_human_id = classifier::is_display_column(&added);
        classifier::apply(&mut added);
        report.added.push(added.name.clone());
        dialog.columns.push(added);
    }

    dialog.columns.retain(|c| {
        let keep = live_names.contains(c.name.as_str());
        if !keep {
            report.removed.push(c.name.clone());
        }
        keep
    });

    for name in &report.removed {
        for query in &mut dialog.queries {
            query.remove_column(name);
        }
        for reference in [
            &mut dialog.note_column,
            &mut dialog.view_order_column,
            &mut dialog.ui_color_column,
            &mut dialog.ui_icon_column,
        ] {
            if reference.as_deref() == Some(name.as_str()) {
                *reference = None;
            }
        }
    }

    if !report.is_unchanged() {
        debug!(
            "Reconciled {}: +{:?} -{:?}",
            dialog.object_name, report.added, report.removed
        );
    }
    report
}

// =============================================================================
// TESTS
// =============================================================================
