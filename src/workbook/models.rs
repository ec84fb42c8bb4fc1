// Record types and column names shared by the reader, writer and report.

/// Column names assigned positionally to the first four input columns.
pub const COL_PROFESSION: &str = "PROFESSIONE";
pub const COL_CODE: &str = "ID_CP2011_LVL4";
pub const COL_PLANNED_HIRES: &str = "ENTRATE_PROGRAMMATE";
pub const COL_HARD_TO_FILL: &str = "DI_CUI_DI_DIFFICILE_REPERIMENTO";

/// Extra columns added by the analysis.
pub const COL_LEVEL: &str = "LIVELLO_PROFESSIONE";
pub const COL_KEYWORDS: &str = "KEYWORD_CORRELATE";

/// Input columns in sheet order.
pub const INPUT_COLUMNS: [&str; 4] = [
    COL_PROFESSION,
    COL_CODE,
    COL_PLANNED_HIRES,
    COL_HARD_TO_FILL,
];

/// One row of the occupational demand sheet (CP2011 level-4 occupation).
#[derive(Debug, Clone, PartialEq)]
pub struct OccupationRecord {
    /// Occupation title; cleaned before classification and correlation.
    pub profession: String,
    /// CP2011 level-4 classification code, e.g. "2.1.1.4".
    pub code: String,
    /// Planned hires for the period.
    pub planned_hires: f64,
    /// Of which, hires the employers expect to be hard to fill.
    pub hard_to_fill: f64,
}
