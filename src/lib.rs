// Fabbisogni: occupational demand analysis with semantic skill correlation.
//
// This is the library root. The core is `correlation`; the other modules
// read the demand workbook, classify occupations, and render the results.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod correlation;
pub mod embedding;
pub mod output;
pub mod pipeline;
pub mod workbook;
