// Profession name cleaning and managerial/operational classification.
//
// Classification is purely lexical: a title is managerial when it contains
// one of the managerial terms as a whole word, in singular or plural form.

use regex_lite::Regex;

/// Singular/plural pairs of Italian (and English) managerial terms.
pub const MANAGERIAL_TERMS: &[(&str, &str)] = &[
    ("direttore", "direttori"),
    ("dirigente", "dirigenti"),
    ("imprenditore", "imprenditori"),
    ("responsabile", "responsabili"),
    ("manager", "managers"),
    ("coordinatore", "coordinatori"),
    ("amministratore", "amministratori"),
    ("capo", "capi"),
    ("gestore", "gestori"),
    ("direzione", "direzioni"),
    ("gestione", "gestioni"),
    ("coordinamento", "coordinamenti"),
];

/// Professional level assigned to an occupation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProfessionLevel {
    Managerial,
    Operational,
}

impl ProfessionLevel {
    /// Label used in the output workbook and reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Managerial => "Gestionale",
            Self::Operational => "Operativa",
        }
    }
}

impl std::fmt::Display for ProfessionLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Whole-word, case-insensitive matcher over the managerial terms.
pub struct ProfessionClassifier {
    /// `None` when there are no non-empty terms: nothing is managerial.
    pattern: Option<Regex>,
}

impl ProfessionClassifier {
    pub fn new() -> Self {
        Self::with_terms(MANAGERIAL_TERMS)
    }

    /// Build from singular/plural pairs. Blank terms are ignored.
    pub fn with_terms(terms: &[(&str, &str)]) -> Self {
        let alternatives: Vec<String> = terms
            .iter()
            .flat_map(|(singular, plural)| [*singular, *plural])
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(regex_lite::escape)
            .collect();
        if alternatives.is_empty() {
            return Self { pattern: None };
        }

        let source = format!(r"(?i)\b({})\b", alternatives.join("|"));
        // Every alternative is escaped, so the pattern always compiles
        let pattern = Regex::new(&source).expect("managerial term pattern");
        Self {
            pattern: Some(pattern),
        }
    }

    pub fn classify(&self, profession: &str) -> ProfessionLevel {
        match &self.pattern {
            Some(pattern) if pattern.is_match(profession) => ProfessionLevel::Managerial,
            _ => ProfessionLevel::Operational,
        }
    }
}

impl Default for ProfessionClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Strip everything but word characters and whitespace, then trim.
///
/// Word characters are Unicode alphanumerics and `_`, so accented letters
/// ("Tecnici dell'ingegneria àèì") survive while punctuation goes.
pub fn clean_profession_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_string()
}
