use std::fmt;

/// Column every per-entity file is keyed on.
pub const ENTITY_COLUMN: &str = "class_id";

/// Scalar type a column is expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Utf8,
    Int64,
    Float64,
    Boolean,
}

pub type ColumnSpec = (&'static str, ScalarType);

/// Closed vocabulary of record types an export bundle may contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordType {
    Manifest,
    Classes,
    Responses,
    MediaViews,
    PageViews,
    // legacy
    Tags,
    Items,
}

impl RecordType {
    pub const CURRENT: [RecordType; 5] = [
        RecordType::Manifest,
        RecordType::Classes,
        RecordType::Responses,
        RecordType::MediaViews,
        RecordType::PageViews,
    ];

    pub const LEGACY: [RecordType; 2] = [RecordType::Tags, RecordType::Items];

    /// Current types first, then legacy. Classification walks this order.
    pub fn all() -> impl Iterator<Item = RecordType> {
        Self::CURRENT.into_iter().chain(Self::LEGACY)
    }

    pub fn tag(self) -> &'static str {
        match self {
            RecordType::Manifest => "manifest",
            RecordType::Classes => "classes",
            RecordType::Responses => "responses",
            RecordType::MediaViews => "media_views",
            RecordType::PageViews => "page_views",
            RecordType::Tags => "tags",
            RecordType::Items => "items",
        }
    }

    pub fn is_legacy(self) -> bool {
        matches!(self, RecordType::Tags | RecordType::Items)
    }

    /// Aggregate types hold many entities per file and are merged, not deduplicated.
    pub fn is_aggregate(self) -> bool {
        matches!(self, RecordType::Manifest | RecordType::Classes)
    }

    /// Whether a file of this type must be owned by exactly one entity.
    pub fn is_per_entity(self) -> bool {
        matches!(
            self,
            RecordType::Responses | RecordType::MediaViews | RecordType::PageViews
        )
    }

    /// Columns that identify a row when every file of this type is merged into one.
    pub fn unique_keys(self) -> &'static [&'static str] {
        match self {
            RecordType::Responses => &["class_id", "student_id", "dt_submitted"],
            RecordType::PageViews => &["class_id", "student_id", "chapter", "page", "dt_accessed"],
            RecordType::MediaViews => &["class_id", "student_id", "chapter", "page", "media_id"],
            RecordType::Manifest | RecordType::Classes => &[ENTITY_COLUMN],
            RecordType::Tags | RecordType::Items => &[],
        }
    }

    pub fn schema(self) -> &'static [ColumnSpec] {
        match self {
            RecordType::Manifest => MANIFEST_SCHEMA,
            RecordType::Classes => CLASSES_SCHEMA,
            RecordType::Responses => RESPONSES_SCHEMA,
            RecordType::MediaViews => MEDIA_VIEWS_SCHEMA,
            RecordType::PageViews => PAGE_VIEWS_SCHEMA,
            RecordType::Tags => TAGS_SCHEMA,
            RecordType::Items => ITEMS_SCHEMA,
        }
    }

    pub fn has_column(self, name: &str) -> bool {
        self.schema().iter().any(|(column, _)| *column == name)
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

use ScalarType::{Boolean, Float64, Int64, Utf8};

const CLASSES_SCHEMA: &[ColumnSpec] = &[
    ("institution_id", Utf8),
    ("class_id", Utf8),
    ("course_name", Utf8),
    ("release", Utf8),
    ("book", Utf8),
    ("teacher_id", Utf8),
    ("lms", Utf8),
    ("setup_yaml", Utf8),
];

const MANIFEST_SCHEMA: &[ColumnSpec] = &[
    ("class_id", Utf8),
    ("department", Utf8),
    ("type", Utf8),
    ("institution_funding", Utf8),
    ("institution_level", Utf8),
    ("institution_tier_number", Int64),
    ("institution_tier_name", Utf8),
    ("state", Utf8),
    ("lms", Utf8),
    ("course", Utf8),
    ("version", Utf8),
    ("book", Utf8),
    ("experiment", Utf8),
    ("status", Utf8),
    ("students", Int64),
    ("n_opted_out", Int64),
    ("class_type", Utf8),
    ("has_supplementary_materials", Utf8),
    ("date_created", Utf8),
    ("first_response", Utf8),
    ("last_response", Utf8),
    ("completed_at", Utf8),
    ("instructor_id", Utf8),
    ("institution_id", Utf8),
    ("school_district_id", Int64),
];

const RESPONSES_SCHEMA: &[ColumnSpec] = &[
    ("institution_id", Utf8),
    ("class_id", Utf8),
    ("course_name", Utf8),
    ("release", Utf8),
    ("book", Utf8),
    ("branch", Utf8),
    ("student_id", Utf8),
    ("lms_id", Utf8),
    ("item_id", Utf8),
    ("item_type", Utf8),
    ("chapter", Utf8),
    ("page", Utf8),
    ("response", Utf8),
    ("prompt", Utf8),
    ("points_possible", Int64),
    ("points_earned", Int64),
    ("dt_submitted", Utf8),
    ("completes_page", Boolean),
    ("attempt", Int64),
    ("user_agent", Utf8),
    ("lrn_session_id", Utf8),
    ("lrn_response_id", Utf8),
    ("lrn_activity_reference", Utf8),
    ("lrn_question_reference", Utf8),
    ("lrn_question_position", Int64),
    ("lrn_type", Utf8),
    ("lrn_dt_started", Utf8),
    ("lrn_dt_saved", Utf8),
    ("lrn_status", Utf8),
    ("lrn_response_json", Utf8),
    ("lrn_option_0", Utf8),
    ("lrn_option_1", Utf8),
    ("lrn_option_2", Utf8),
    ("lrn_option_3", Utf8),
    ("lrn_option_4", Utf8),
    ("lrn_option_5", Utf8),
    ("lrn_option_6", Utf8),
    ("lrn_option_7", Utf8),
    ("lrn_option_8", Utf8),
    ("lrn_option_9", Utf8),
    ("lrn_option_10", Utf8),
    ("lrn_option_11", Utf8),
    ("lrn_items_api_version", Utf8),
    ("lrn_response_api_version", Utf8),
];

const PAGE_VIEWS_SCHEMA: &[ColumnSpec] = &[
    ("institution_id", Utf8),
    ("class_id", Utf8),
    ("student_id", Utf8),
    ("chapter", Utf8),
    ("page", Utf8),
    ("dt_accessed", Utf8),
    ("tried_again_dt", Utf8),
    ("tried_again_clicks", Int64),
    ("was_complete", Boolean),
    ("engaged", Int64),
    ("idle_brief", Int64),
    ("idle_long", Int64),
    ("off_page_brief", Int64),
    ("off_page_long", Int64),
    ("trace", Utf8),
];

const MEDIA_VIEWS_SCHEMA: &[ColumnSpec] = &[
    ("institution_id", Utf8),
    ("class_id", Utf8),
    ("student_id", Utf8),
    ("chapter", Utf8),
    ("page", Utf8),
    ("type", Utf8),
    ("media_id", Utf8),
    ("dt_started", Utf8),
    ("dt_last_event", Utf8),
    ("access_count", Int64),
    ("proportion_video", Float64),
    ("proportion_time", Float64),
    ("log_json", Utf8),
];

const TAGS_SCHEMA: &[ColumnSpec] = &[("tag_type", Utf8), ("tag", Utf8), ("item_id", Utf8)];

const ITEMS_SCHEMA: &[ColumnSpec] = &[
    ("institution_id", Utf8),
    ("class_id", Utf8),
    ("item_id", Utf8),
    ("learnosity_id", Utf8),
    ("item_type", Utf8),
    ("chapter", Utf8),
    ("page", Utf8),
    ("dcl_pre_exercise_code", Utf8),
    ("dcl_sample_code", Utf8),
    ("dcl_solution", Utf8),
    ("dcl_sct", Utf8),
    ("dcl_hint", Utf8),
    ("lrn_activity_reference", Utf8),
    ("learnosity_question_reference", Utf8),
    ("learnosity_question_position", Utf8),
    ("learnosity_question_type", Utf8),
    ("learnosity_template_name", Utf8),
    ("learnosity_template_reference", Utf8),
    ("learnosity_item_status", Utf8),
    ("learnosity_question_data", Utf8),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_type_is_exactly_one_kind() {
        for record_type in RecordType::all() {
            let kinds = [
                record_type.is_legacy(),
                record_type.is_aggregate(),
                record_type.is_per_entity(),
            ];
            assert_eq!(
                kinds.iter().filter(|k| **k).count(),
                1,
                "{} should be exactly one of legacy/aggregate/per-entity",
                record_type
            );
        }
    }

    #[test]
    fn test_per_entity_schemas_carry_entity_column() {
        for record_type in RecordType::all().filter(|t| t.is_per_entity() || t.is_aggregate()) {
            assert!(record_type.has_column(ENTITY_COLUMN), "{}", record_type);
        }
    }

    #[test]
    fn test_unique_keys_are_schema_columns() {
        for record_type in RecordType::all() {
            for key in record_type.unique_keys() {
                assert!(record_type.has_column(key), "{} lacks {}", record_type, key);
            }
        }
    }
}
