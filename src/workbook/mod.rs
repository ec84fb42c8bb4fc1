// Spreadsheet input and output.
//
// The input workbook is read with calamine (xlsx, xls, ods); the results
// workbook is written with rust_xlsxwriter.

pub mod models;
pub mod reader;
pub mod writer;
