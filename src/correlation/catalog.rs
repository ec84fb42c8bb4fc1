// The built-in skill keyword catalog.
//
// Italian and English terms are mixed, mirroring the vocabulary of the job
// postings the occupations are compared against. Match sets are reported in
// catalog order, so the order here is significant.

pub const DEFAULT_KEYWORDS: &[&str] = &[
    "Risk Management",
    "Eccellenza operativa",
    "Metodologie agili",
    "Leadership",
    "Ricerca e Sviluppo",
    "Testing",
    "Verifica e validazione",
    "Management",
    "Project Management",
    "Programming",
    "Python",
    "Project delivery",
    "Coaching",
    "Key Performance Indicator",
    "Trasformazione digitale",
    "Direttore",
    "Lavoro di squadra",
    "Operations",
    "Commissioning",
    "Ingegneria dei processi",
    "Strategy",
    "Analisi dei dati",
    "Functional test",
    "Negoziazione",
    "Troubleshooting",
    "Ingegnere elettronico",
    "Produzione industriale",
    "Dirigente",
    "analisi dati",
    "intelligenza artificiale",
    "statistica",
    "Comunicazione",
    "Machinery",
    "Mentoring",
    "Team Management",
    "Gestione dei dati",
    "Training",
    "Conduzione training",
    "Automotive",
    "Electrification",
    "SW Engineering",
    "Data Analyst",
];

/// The default catalog as owned strings, ready for [`KeywordCorrelator::build`](super::KeywordCorrelator::build).
pub fn default_keywords() -> Vec<String> {
    DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect()
}
