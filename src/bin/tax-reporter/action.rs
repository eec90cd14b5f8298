use std::path::PathBuf;

use tax_reporter::report::ReportFormat;
use tax_reporter::valuation::RateChoice;

pub enum Action {
    Report {
        paths: Vec<PathBuf>,
        format: ReportFormat,
    },
    Declaration {
        year: i32,
        rate: RateChoice,
        template_path: String,
        output_path: String,
        paths: Vec<PathBuf>,
    },
}
