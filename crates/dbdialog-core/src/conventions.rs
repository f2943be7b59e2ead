//! # Naming Conventions
//!
//! Column and table names carry behavior. This module is the single table
//! of those conventions (`pattern -> role`) and of every constant the
//! synthesis rules depend on, so tests can enumerate them.
//!
//! | Pattern        | Match     | Role            |
//! |----------------|-----------|-----------------|
//! | `_xs`          | suffix    | Thumbnail       |
//! | `CreatedBy`    | exact     | CreatedBy       |
//! | `CreatedOn`    | exact     | CreatedOn       |
//! | `UpdatedBy`    | suffix    | UpdatedBy       |
//! | `UpdatedOn`    | suffix    | UpdatedOn       |
//! | `BaseInfo`     | suffix    | BaseInfo        |
//! | `Title`/`Name` | contains  | DisplayName     |
//! | `tags`         | contains  | Tagging         |
//! | `_FileName`... | suffix    | FileMeta        |
//! | `ParentId`     | exact     | TreeParent      |
//! | `Note`...      | exact     | display columns |

// =============================================================================
// CONSTANTS
// =============================================================================

/// Rows returned per page by list queries.
pub const PAGINATION_MAX_SIZE: u32 = 100;

/// Thumbnail edge length for resized images.
pub const THUMBNAIL_SIZE: u32 = 75;

/// Log-table identity seed, above any legacy id range.
pub const LOG_TABLE_IDENTITY_START: &str = "10000";
pub const LOG_TABLE_IDENTITY_STEP: &str = "1";

/// Context key of the acting user.
pub const CONTEXT_USER_ID: &str = "UserId";

/// Default pause after DDL before re-reading schema facts.
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

pub const RULE_NUMERIC: &str = ":=i(0,10000)";
pub const RULE_DATETIME: &str = "dt(1900-01-01 00:01:00,2100-12-30 11:59:59)";
pub const RULE_DATE: &str = "d(1900-01-01,2100-12-30)";

pub const AUDITING_GROUP: &str = "Auditing";

pub const ICON_TREE: &str = "fa-tree";
pub const ICON_LIST: &str = "fa-list";

pub const TREE_LIST_TEMPLATE: &str = "ReadTreeList";

/// Name of the main update query.
pub const MAIN_UPDATE_QUERY: &str = "UpdateByKey";
/// Name of the standard read-by-key query.
pub const READ_BY_KEY_QUERY: &str = "ReadByKey";

pub const COUNT_AGGREGATION: &str = "Count";
pub const COUNT_PHRASE: &str = "COUNT(*)";

pub const THUMBNAIL_SUFFIX: &str = "_xs";
pub const TREE_PARENT_COLUMN: &str = "ParentId";

pub const CREATED_BY: &str = "CreatedBy";
pub const CREATED_ON: &str = "CreatedOn";
pub const UPDATED_BY: &str = "UpdatedBy";
pub const UPDATED_ON: &str = "UpdatedOn";

pub const LOG_ID_COLUMN: &str = "Id";
pub const LOG_MASTER_COLUMN: &str = "MasterId";

/// Type of the identity key of log tables.
pub const IDENTITY_TYPE: &str = "INT";

/// Types used for audit columns created on demand.
pub const ACTOR_TYPE: &str = "INT";
pub const TIMESTAMP_TYPE: &str = "DATETIME";

// =============================================================================
// CONVENTION TABLE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    Exact,
    Suffix,
    ContainsIgnoreCase,
}

/// Semantic role a name pattern assigns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConventionRole {
    Thumbnail,
    CreatedBy,
    CreatedOn,
    UpdatedBy,
    UpdatedOn,
    BaseInfo,
    DisplayName,
    Tagging,
    FileMeta,
    TreeParent,
    NoteColumn,
    ViewOrderColumn,
    UiColorColumn,
    UiIconColumn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Convention {
    pub pattern: &'static str,
    pub kind: MatchKind,
    pub role: ConventionRole,
}

impl Convention {
    const fn new(pattern: &'static str, kind: MatchKind, role: ConventionRole) -> Self {
        Self {
            pattern,
            kind,
            role,
        }
    }

    #[must_use]
    pub fn matches(&self, name: &str) -> bool {
        match self.kind {
            MatchKind::Exact => name == self.pattern,
            MatchKind::Suffix => name.ends_with(self.pattern),
            MatchKind::ContainsIgnoreCase => name
                .to_ascii_lowercase()
                .contains(&self.pattern.to_ascii_lowercase()),
        }
    }
}

/// Every naming convention.
pub const CONVENTIONS: &[Convention] = &[
    Convention::new(THUMBNAIL_SUFFIX, MatchKind::Suffix, ConventionRole::Thumbnail),
    Convention::new(CREATED_BY, MatchKind::Exact, ConventionRole::CreatedBy),
    Convention::new(CREATED_ON, MatchKind::Exact, ConventionRole::CreatedOn),
    Convention::new(UPDATED_BY, MatchKind::Suffix, ConventionRole::UpdatedBy),
    Convention::new(UPDATED_ON, MatchKind::Suffix, ConventionRole::UpdatedOn),
    Convention::new("BaseInfo", MatchKind::Suffix, ConventionRole::BaseInfo),
    Convention::new("Title", MatchKind::ContainsIgnoreCase, ConventionRole::DisplayName),
    Convention::new("Name", MatchKind::ContainsIgnoreCase, ConventionRole::DisplayName),
    Convention::new("tags", MatchKind::ContainsIgnoreCase, ConventionRole::Tagging),
    Convention::new("_FileName", MatchKind::Suffix, ConventionRole::FileMeta),
    Convention::new("_FileSize", MatchKind::Suffix, ConventionRole::FileMeta),
    Convention::new("_FileMime", MatchKind::Suffix, ConventionRole::FileMeta),
    Convention::new(TREE_PARENT_COLUMN, MatchKind::Exact, ConventionRole::TreeParent),
    Convention::new("Note", MatchKind::Exact, ConventionRole::NoteColumn),
    Convention::new("ViewOrder", MatchKind::Exact, ConventionRole::ViewOrderColumn),
    Convention::new("UiColor", MatchKind::Exact, ConventionRole::UiColorColumn),
    Convention::new("UiIcon", MatchKind::Exact, ConventionRole::UiIconColumn),
];

/// Whether any convention assigns `role` to `name`.
#[must_use]
pub fn has_role(name: &str, role: ConventionRole) -> bool {
    CONVENTIONS
        .iter()
        .any(|c| c.role == role && c.matches(name))
}

/// Pattern of the convention that assigns `role` (first one).
#[must_use]
pub fn pattern_of(role: ConventionRole) -> Option<&'static str> {
    CONVENTIONS.iter().find(|c| c.role == role).map(|c| c.pattern)
}

#[must_use]
pub fn is_thumbnail(name: &str) -> bool {
    has_role(name, ConventionRole::Thumbnail)
}

/// Name of the full-size image a thumbnail is resized from.
#[must_use]
pub fn thumbnail_source(name: &str) -> &str {
    name.strip_suffix(THUMBNAIL_SUFFIX).unwrap_or(name)
}

#[must_use]
pub fn is_created_audit(name: &str) -> bool {
    has_role(name, ConventionRole::CreatedBy) || has_role(name, ConventionRole::CreatedOn)
}

#[must_use]
pub fn is_updated_audit(name: &str) -> bool {
    has_role(name, ConventionRole::UpdatedBy) || has_role(name, ConventionRole::UpdatedOn)
}

/// Created/updated by/on columns.
#[must_use]
pub fn is_audit_column(name: &str) -> bool {
    is_created_audit(name) || is_updated_audit(name)
}

#[must_use]
pub fn is_base_info(table: &str) -> bool {
    has_role(table, ConventionRole::BaseInfo)
}

#[must_use]
pub fn is_display_name(name: &str) -> bool {
    has_role(name, ConventionRole::DisplayName)
}

#[must_use]
pub fn is_tagging(table: &str) -> bool {
    has_role(table, ConventionRole::Tagging)
}

#[must_use]
pub fn is_file_meta(name: &str) -> bool {
    has_role(name, ConventionRole::FileMeta)
}

/// Candidate by/on column names for the auxiliary update of `column`.
#[must_use]
pub fn auxiliary_audit_candidates(column: &str) -> ([String; 2], [String; 2]) {
    (
        [format!("{}{}", column, UPDATED_BY), format!("{}By", column)],
        [format!("{}{}", column, UPDATED_ON), format!("{}On", column)],
    )
}

/// Name of the auxiliary single-column update query of `column`.
#[must_use]
pub fn auxiliary_update_name(column: &str) -> String {
    format!("{}Update", column)
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_role_has_a_convention() {
        let roles = [
            ConventionRole::Thumbnail,
            ConventionRole::CreatedBy,
            ConventionRole::CreatedOn,
            ConventionRole::UpdatedBy,
            ConventionRole::UpdatedOn,
            ConventionRole::BaseInfo,
            ConventionRole::DisplayName,
            ConventionRole::Tagging,
            ConventionRole::FileMeta,
            ConventionRole::TreeParent,
            ConventionRole::NoteColumn,
            ConventionRole::ViewOrderColumn,
            ConventionRole::UiColorColumn,
            ConventionRole::UiIconColumn,
        ];
        for role in roles {
            assert!(pattern_of(role).is_some(), "{:?} has no pattern", role);
        }
    }

    #[test]
    fn every_convention_matches_its_own_pattern() {
        for convention in CONVENTIONS {
            assert!(
                convention.matches(convention.pattern),
                "{} does not match itself",
                convention.pattern
            );
        }
    }

    #[test]
    fn audit_names() {
        assert!(is_audit_column("CreatedBy"));
        assert!(is_audit_column("UpdatedOn"));
        assert!(is_audit_column("StatusUpdatedOn"));
        assert!(!is_audit_column("MyCreatedBy"));
        assert!(!is_audit_column("createdby"));
    }

    #[test]
    fn thumbnail_source_strips_suffix() {
        assert!(is_thumbnail("Picture_xs"));
        assert_eq!(thumbnail_source("Picture_xs"), "Picture");
        assert_eq!(thumbnail_source("Picture"), "Picture");
    }

    #[test]
    fn display_and_tag_matching_ignore_case() {
        assert!(is_display_name("ProductTitle"));
        assert!(is_display_name("username"));
        assert!(!is_display_name("Price"));
        assert!(is_tagging("PostTags"));
        assert!(is_base_info("CountryBaseInfo"));
        assert!(!is_base_info("BaseInfoCountry"));
    }

    #[test]
    fn auxiliary_names() {
        let (by, on) = auxiliary_audit_candidates("Status");
        assert_eq!(by, ["StatusUpdatedBy".to_string(), "StatusBy".to_string()]);
        assert_eq!(on, ["StatusUpdatedOn".to_string(), "StatusOn".to_string()]);
        assert_eq!(auxiliary_update_name("Status"), "StatusUpdate");
    }
}
