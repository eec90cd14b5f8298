//! Czech personal income tax declaration (DAP) in the EPO XML format.

use std::path::PathBuf;

use log::{error, info};
use num_traits::Zero;

use crate::config::Config;
use crate::core::{EmptyResult, GenericResult};
use crate::currency::RateCache;
use crate::statement::{self, StatementReader};
use crate::types::Decimal;
use crate::util;
use crate::valuation::{RateChoice, Valuator};

mod aggregator;
mod builder;
mod generator;
mod mapping;
mod views;
mod xml;

pub use self::aggregator::DeclarationAggregator;
pub use self::builder::{BuilderState, DeclarationBuilder};
pub use self::generator::DeclarationGenerator;
pub use self::views::{DepositView, DividendView, EsppView, SaleView, TransactionView, Views};

/// Reads all the statements, fills the declaration template with them and saves the result.
///
/// Every statement is read and valuated on its own, so all broken statements are reported at once.
/// If any of them fails, no declaration is written since a partial declaration is worse than none.
pub fn generate_declaration(
    config: &Config, year: i32, rate_choice: RateChoice, template_path: &str, output_path: &str,
    paths: &[PathBuf],
) -> EmptyResult {
    generator::check_tax_year(year)?;
    let template = TaxDeclaration::load(template_path)?;

    let rate_cache = RateCache::from_config(config);
    let generator = DeclarationGenerator::new(Valuator::new(&rate_cache), rate_choice);
    let reader = StatementReader::new();

    let mut transactions = Vec::new();
    let mut failed = 0;

    for path in statement::resolve_file_paths(paths)? {
        match reader.read(&path).and_then(|statement| generator.valuate(&statement, year)) {
            Ok(valuated) => transactions.extend(valuated),
            Err(e) => {
                error!("Failed to process {:?}: {}.", path, e);
                failed += 1;
            },
        }
    }

    if failed != 0 {
        return Err!("Failed to process {} statement(s)", failed);
    }

    let declaration = generator.declare(template, transactions, year)?;
    declaration.save(output_path)?;
    info!("The tax declaration is saved to {:?}.", output_path);

    Ok(())
}

/// Generic EPO record (`Veta*` element) which is preserved as is.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    pub name: String,
    pub attributes: Vec<(String, String)>,
}

/// Root and form elements which wrap the records.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope {
    pub root: Record,
    pub form: Record,
}

/// Declaration header (`VetaD`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Header {
    pub year: Option<i32>,
    pub other_attributes: Vec<(String, String)>,
}

/// Section 2 of the declaration with partial tax bases (`VetaS`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Section2 {
    /// Row 38: partial tax base from capital income (§ 8)
    pub row38: Decimal,
    /// Row 40: partial tax base from other income (§ 10)
    pub row40: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// Employment income from stock: ESPP discounts and deposited stock (`VetaT`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct IncomeTableRow {
    pub kind: String,
    pub name: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// Dividend income summarized per broker and source country (`VetaN`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SecuritiesListRow {
    pub broker: String,
    pub country: String,
    pub income: Decimal,
    pub tax: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// Appendix 3: income from abroad and the tax paid there (`VetaL`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Appendix3Row {
    pub country: String,
    pub income: Decimal,
    pub tax: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// Appendix 2 row: sale of securities (`VetaJ`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Appendix2Row {
    pub code: String,
    pub name: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub difference: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// Appendix 2: other income (§ 10). Totals are stored in `VetaV`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Appendix2 {
    pub rows: Vec<Appendix2Row>,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub total_profit: Decimal,
    /// Unknown attributes of the totals record
    pub other_attributes: Vec<(String, String)>,
}

/// Appendix 2 summary of other income by type (`VetaO`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OtherIncomeRow {
    pub kind: String,
    pub income: Decimal,
    pub expenses: Decimal,
    pub other_attributes: Vec<(String, String)>,
}

/// All appendices which are generated from transactions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Appendices {
    pub income_table: Vec<IncomeTableRow>,
    pub securities_list: Vec<SecuritiesListRow>,
    pub appendix3: Vec<Appendix3Row>,
    pub appendix2: Appendix2,
    pub appendix2_other_income: Option<OtherIncomeRow>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TaxDeclaration {
    pub envelope: Envelope,
    pub header: Header,
    pub section2: Section2,
    pub appendices: Appendices,
    /// Records this module doesn't manage (taxpayer info, other sections, etc.)
    pub other_records: Vec<Record>,
}

impl TaxDeclaration {
    pub fn load(path: &str) -> GenericResult<TaxDeclaration> {
        Ok(xml::read(path).map_err(|e| format!(
            "Error while reading {:?} tax declaration: {}", path, e))?)
    }

    pub fn save(&self, path: &str) -> EmptyResult {
        xml::save(self, path)
    }

    /// Checks the arithmetic relations between summary fields and the appendices they are derived
    /// from.
    pub fn validate(&self) -> EmptyResult {
        let appendices = &self.appendices;
        let appendix2 = &appendices.appendix2;

        for row in &appendix2.rows {
            if row.difference != util::checked_sub(row.income, row.expenses)? {
                return Err!("Invalid appendix 2 {:?} row difference: {} != {} - {}",
                            row.name, row.difference, row.income, row.expenses);
            }
        }

        let total_income = util::checked_sum(appendix2.rows.iter().map(|row| row.income))?;
        let total_expenses = util::checked_sum(appendix2.rows.iter().map(|row| row.expenses))?;
        let total_profit = util::checked_sub(total_income, total_expenses)?.max(Decimal::zero());

        if appendix2.total_income != total_income || appendix2.total_expenses != total_expenses {
            return Err!("Appendix 2 totals don't match its rows: {} / {} vs {} / {}",
                        appendix2.total_income, appendix2.total_expenses, total_income, total_expenses);
        }

        if appendix2.total_profit != total_profit {
            return Err!("Invalid appendix 2 total profit: {} vs {}", appendix2.total_profit, total_profit);
        }

        let row38 = util::checked_sum(appendices.appendix3.iter().map(|row| row.income))?;
        if self.section2.row38 != row38 {
            return Err!("Row 38 ({}) doesn't match appendix 3 income ({})", self.section2.row38, row38);
        }

        if self.section2.row40 != appendix2.total_profit {
            return Err!("Row 40 ({}) doesn't match appendix 2 total profit ({})",
                        self.section2.row40, appendix2.total_profit);
        }

        Ok(())
    }
}
