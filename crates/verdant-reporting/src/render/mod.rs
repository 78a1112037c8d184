//! Report exports.

mod csv_export;
mod error;
mod pdf;

pub use csv_export::render_csv;
pub use error::ReportError;
pub use pdf::{PdfOptions, render_pdf};
