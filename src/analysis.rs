// Ranking, level split and keyword statistics over analyzed occupations.
//
// Everything here is pure: the pipeline feeds in records plus their
// correlation results and gets back the tables the writer and the report
// render.

use std::collections::HashMap;

use crate::classify::ProfessionLevel;
use crate::correlation::MatchSet;
use crate::workbook::models::OccupationRecord;

/// Number of rows in the "top" tables.
pub const TOP_N: usize = 10;

/// Numeric column used for ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankBy {
    PlannedHires,
    HardToFill,
}

impl RankBy {
    pub fn value(&self, record: &OccupationRecord) -> f64 {
        match self {
            Self::PlannedHires => record.planned_hires,
            Self::HardToFill => record.hard_to_fill,
        }
    }
}

/// An occupation after classification and correlation.
#[derive(Debug, Clone)]
pub struct AnalyzedOccupation {
    pub record: OccupationRecord,
    pub level: ProfessionLevel,
    /// `None` when correlation failed for this occupation.
    pub matches: Option<MatchSet>,
}

impl AnalyzedOccupation {
    pub fn keywords(&self) -> &[String] {
        self.matches
            .as_ref()
            .map(|m| m.keywords.as_slice())
            .unwrap_or(&[])
    }
}

/// Sort descending by `by`. Stable, so ties keep sheet order.
pub fn sort_desc<T>(items: &mut [T], by: RankBy, record: impl Fn(&T) -> &OccupationRecord) {
    items.sort_by(|a, b| by.value(record(b)).total_cmp(&by.value(record(a))));
}

/// The `n` highest records by `by`.
pub fn top_n(records: &[OccupationRecord], by: RankBy, n: usize) -> Vec<OccupationRecord> {
    let mut sorted = records.to_vec();
    sort_desc(&mut sorted, by, |r| r);
    sorted.truncate(n);
    sorted
}

/// All tables produced by one run.
#[derive(Debug, Clone)]
pub struct Analysis {
    pub top_planned_hires: Vec<OccupationRecord>,
    pub top_hard_to_fill: Vec<OccupationRecord>,
    /// Managerial occupations, most hard-to-fill first.
    pub managerial: Vec<AnalyzedOccupation>,
    /// Operational occupations, most hard-to-fill first.
    pub operational: Vec<AnalyzedOccupation>,
}

impl Analysis {
    pub fn new(occupations: Vec<AnalyzedOccupation>) -> Self {
        let records: Vec<OccupationRecord> =
            occupations.iter().map(|o| o.record.clone()).collect();

        let (mut managerial, mut operational): (Vec<_>, Vec<_>) = occupations
            .into_iter()
            .partition(|o| o.level == ProfessionLevel::Managerial);

        sort_desc(&mut managerial, RankBy::HardToFill, |o| &o.record);
        sort_desc(&mut operational, RankBy::HardToFill, |o| &o.record);

        Self {
            top_planned_hires: top_n(&records, RankBy::PlannedHires, TOP_N),
            top_hard_to_fill: top_n(&records, RankBy::HardToFill, TOP_N),
            managerial,
            operational,
        }
    }

    pub fn total(&self) -> usize {
        self.managerial.len() + self.operational.len()
    }

    /// Managerial occupations with at least one correlated keyword.
    pub fn managerial_with_keywords(&self) -> Vec<&AnalyzedOccupation> {
        with_keywords(&self.managerial)
    }

    /// Operational occupations with at least one correlated keyword.
    pub fn operational_with_keywords(&self) -> Vec<&AnalyzedOccupation> {
        with_keywords(&self.operational)
    }

    /// Occupations whose correlation failed.
    pub fn failed_count(&self) -> usize {
        self.managerial
            .iter()
            .chain(&self.operational)
            .filter(|o| o.matches.is_none())
            .count()
    }

    /// How many occupations matched each catalog keyword.
    ///
    /// Most frequent first; ties keep catalog order. Keywords nobody matched
    /// are omitted.
    pub fn keyword_frequency(&self, catalog: &[String]) -> Vec<(String, usize)> {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for occupation in self.managerial.iter().chain(&self.operational) {
            for keyword in occupation.keywords() {
                *counts.entry(keyword.as_str()).or_insert(0) += 1;
            }
        }

        let mut frequency: Vec<(String, usize)> = catalog
            .iter()
            .filter_map(|k| counts.get(k.as_str()).map(|&n| (k.clone(), n)))
            .collect();
        frequency.sort_by(|a, b| b.1.cmp(&a.1));
        frequency
    }
}

fn with_keywords(occupations: &[AnalyzedOccupation]) -> Vec<&AnalyzedOccupation> {
    occupations
        .iter()
        .filter(|o| !o.keywords().is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, planned: f64, hard: f64) -> OccupationRecord {
        OccupationRecord {
            profession: name.to_string(),
            code: String::new(),
            planned_hires: planned,
            hard_to_fill: hard,
        }
    }

    #[test]
    fn test_top_n_descending_and_truncated() {
        let records: Vec<_> = (0..15)
            .map(|i| record(&format!("p{i}"), i as f64, 0.0))
            .collect();
        let top = top_n(&records, RankBy::PlannedHires, TOP_N);
        assert_eq!(top.len(), 10);
        assert_eq!(top[0].profession, "p14");
        assert_eq!(top[9].profession, "p5");
    }

    #[test]
    fn test_top_n_ties_keep_input_order() {
        let records = vec![record("a", 1.0, 5.0), record("b", 1.0, 5.0), record("c", 2.0, 1.0)];
        let top = top_n(&records, RankBy::HardToFill, 3);
        let names: Vec<_> = top.iter().map(|r| r.profession.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_top_n_shorter_than_n() {
        let records = vec![record("a", 1.0, 1.0)];
        assert_eq!(top_n(&records, RankBy::PlannedHires, TOP_N).len(), 1);
    }
}
