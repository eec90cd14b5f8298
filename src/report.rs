//! Console, JSON and spreadsheet reports of valuated transactions.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{error, info};
use num_traits::ToPrimitive;
use rust_xlsxwriter::{Format, Workbook};

use crate::config::Config;
use crate::core::{EmptyResult, GenericResult};
use crate::currency::RateCache;
use crate::formatting::{self, table::{self, Cell, Row, Table}};
use crate::statement::{self, StatementReader};
use crate::transactions::{self, MoneyField, Transaction, TransactionGroups, TransactionKind};
use crate::types::Decimal;
use crate::valuation::{ValuatedTransaction, Valuator, YearlyAmount};

#[derive(Clone, Debug, PartialEq)]
pub enum ReportFormat {
    PlainText,
    Json,
    /// Spreadsheet saved to the specified path.
    Spreadsheet(PathBuf),
}

/// Valuated transactions of a single statement file.
pub type StatementReport = (String, Vec<ValuatedTransaction>);

/// Shows transactions of each statement. Statements are processed independently: a broken one
/// doesn't prevent others from being reported.
pub fn generate_report(config: &Config, paths: &[PathBuf], format: &ReportFormat) -> EmptyResult {
    let rate_cache = RateCache::from_config(config);
    let valuator = Valuator::new(&rate_cache);
    let reader = StatementReader::new();

    let mut statements: Vec<StatementReport> = Vec::new();
    let mut failed = 0;

    for path in statement::resolve_file_paths(paths)? {
        let name = path.display().to_string();

        match reader.read(&path).and_then(|transactions| valuator.valuate_all(&transactions)) {
            Ok(transactions) => match format {
                ReportFormat::PlainText => print_plain_text(&name, &transactions),
                _ => statements.push((name, transactions)),
            },
            Err(e) => {
                error!("Failed to process {:?}: {}.", path, e);
                failed += 1;
            },
        }
    }

    match format {
        ReportFormat::PlainText => {},
        ReportFormat::Json => print_json(&statements)?,
        ReportFormat::Spreadsheet(path) => {
            save_spreadsheet(path, &statements)?;
            info!("The report is saved to {:?}.", path);
        },
    }

    if failed != 0 {
        return Err!("Failed to process {} statement(s)", failed);
    }

    Ok(())
}

pub fn print_plain_text(title: &str, transactions: &[ValuatedTransaction]) {
    print!("{}", render_plain_text(title, transactions));
}

/// Renders a table per transaction type. Every money field is shown as is, converted using daily
/// rate and converted using yearly average rate.
pub fn render_plain_text(title: &str, transactions: &[ValuatedTransaction]) -> String {
    let groups = transactions::group(transactions.iter());
    let mut result = String::new();

    for (kind, transactions) in groups.iter() {
        let Some(first) = transactions.first() else {
            continue;
        };

        let field_titles = field_titles(&first.transaction);
        let mut titles = vec!["Date", "Broker", "Name", "Currency"];
        titles.extend(field_titles.iter().map(String::as_str));

        let mut table = Table::new();

        for valuated in transactions {
            let transaction = &valuated.transaction;

            let mut row = vec![
                Cell::new_date(transaction.date()),
                Cell::new(transaction.broker()),
                Cell::new(transaction.name()),
                Cell::new(transaction.currency()),
            ];

            for (_, amount) in valuated.valuation.fields() {
                row.push(Cell::new_amount(amount.original));
                row.push(Cell::new_amount(amount.daily));
                row.push(match amount.yearly {
                    YearlyAmount::Value(value) => Cell::new_amount(value),
                    YearlyAmount::Unavailable => Cell::new_align("N/A", table::Alignment::RIGHT),
                });
            }

            table.add_row(Row::new(&row));
        }

        let name = format!("{}: {} transactions", title, kind);
        result.push_str(&table::render_table(&name, &titles, table));
    }

    result
}

pub fn print_json(statements: &[StatementReport]) -> EmptyResult {
    println!("{}", to_json(statements)?);
    Ok(())
}

/// Renders a single document with transactions grouped by type for each statement.
pub fn to_json(statements: &[StatementReport]) -> GenericResult<String> {
    let report: BTreeMap<&str, TransactionGroups<&ValuatedTransaction>> = statements.iter()
        .map(|(name, transactions)| (name.as_str(), transactions::group(transactions.iter())))
        .collect();

    Ok(serde_json::to_string_pretty(&report)?)
}

/// Saves a sheet per transaction type with transactions of all statements.
pub fn save_spreadsheet(path: &Path, statements: &[StatementReport]) -> EmptyResult {
    let mut sheets: BTreeMap<TransactionKind, Vec<(&str, &ValuatedTransaction)>> = BTreeMap::new();

    for (name, transactions) in statements {
        for valuated in transactions {
            sheets.entry(valuated.transaction.kind()).or_default().push((name.as_str(), valuated));
        }
    }

    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();

    for (kind, transactions) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(kind.to_string())?;

        let mut titles = vec![s!("Statement"), s!("Date"), s!("Broker"), s!("Name"), s!("Currency")];
        titles.extend(field_titles(&transactions[0].1.transaction));

        for (col, title) in titles.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, title, &bold)?;
        }

        for (index, (statement, valuated)) in transactions.iter().enumerate() {
            let row = index as u32 + 1;
            let transaction = &valuated.transaction;

            worksheet.write_string(row, 0, *statement)?;
            worksheet.write_string(row, 1, formatting::format_date(transaction.date()))?;
            worksheet.write_string(row, 2, transaction.broker())?;
            worksheet.write_string(row, 3, transaction.name())?;
            worksheet.write_string(row, 4, transaction.currency())?;

            let mut col = 5;

            for (_, amount) in valuated.valuation.fields() {
                worksheet.write_number(row, col, to_number(amount.original)?)?;
                worksheet.write_number(row, col + 1, to_number(amount.daily)?)?;

                match amount.yearly {
                    YearlyAmount::Value(value) => worksheet.write_number(row, col + 2, to_number(value)?)?,
                    YearlyAmount::Unavailable => worksheet.write_string(row, col + 2, "N/A")?,
                };

                col += 3;
            }
        }

        worksheet.autofit();
    }

    workbook.save(path)?;
    Ok(())
}

fn field_titles(transaction: &Transaction) -> Vec<String> {
    let fields: Vec<MoneyField> = transaction.money_fields().into_iter()
        .map(|(field, _)| field)
        .collect();

    fields.iter().flat_map(|field| [
        field.to_string(),
        format!("{} (CNB)", field),
        format!("{} (year average)", field),
    ]).collect()
}

fn to_number(value: Decimal) -> GenericResult<f64> {
    Ok(value.to_f64().ok_or_else(|| format!("Unable to convert {} to a number", value))?)
}

#[cfg(test)]
mod tests {
    use crate::currency::{RateCache, StaticProvider};
    use crate::transactions::tests::{dividend, sale};
    use crate::valuation::Valuator;

    use super::*;

    fn valuate(yearly: &[(&'static str, crate::types::Decimal)]) -> Vec<ValuatedTransaction> {
        let cache = RateCache::new(
            Box::new(StaticProvider::new(&[("USD", dec!(23.0))])),
            Box::new(StaticProvider::new(yearly)));

        Valuator::new(&cache).valuate_all(&[
            dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15)),
            sale(date!(2019, 9, 2), dec!(50), dec!(60)),
        ]).unwrap()
    }

    #[test]
    fn plain_text() {
        let report = render_plain_text("statement.csv", &valuate(&[]));

        assert!(report.contains("statement.csv: Dividend transactions"), "{}", report);
        assert!(report.contains("statement.csv: Sale transactions"), "{}", report);
        assert!(report.contains("Income (year average)"), "{}", report);
        assert!(report.contains("2,300"), "{}", report);
        assert!(report.contains("N/A"), "{}", report);
        assert!(!report.contains("ESPP"), "{}", report);
    }

    #[test]
    fn json() {
        let data = to_json(&[(s!("statement.csv"), valuate(&[("USD", dec!(22.5))]))]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();

        let value = &value["statement.csv"];
        let dividend = &value["Dividend"][0];
        assert_eq!(dividend["date"], "2019-03-01");
        assert_eq!(dividend["currency"], "USD");
        assert_eq!(dividend["valuation"]["income"]["daily"].as_f64(), Some(2300.0));
        assert_eq!(dividend["valuation"]["tax"]["yearly"].as_f64(), Some(337.5));

        assert_eq!(value["Sale"][0]["valuation"]["sale_price"]["original"].as_f64(), Some(60.0));
        assert!(value.get("Deposit").is_none());
    }

    #[test]
    fn json_unavailable_yearly_rates() {
        let data = to_json(&[(s!("statement.csv"), valuate(&[]))]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        assert!(value["statement.csv"]["Dividend"][0]["valuation"]["income"]["yearly"].is_null());
    }

    #[test]
    fn json_multiple_statements() {
        let data = to_json(&[
            (s!("fidelity.csv"), valuate(&[])),
            (s!("morgan-stanley.csv"), valuate(&[("USD", dec!(22.5))])),
            (s!("empty.csv"), Vec::new()),
        ]).unwrap();

        let value: serde_json::Value = serde_json::from_str(&data).unwrap();
        let statements = value.as_object().unwrap();

        assert_eq!(statements.keys().map(String::as_str).collect::<Vec<_>>(),
                   vec!["empty.csv", "fidelity.csv", "morgan-stanley.csv"]);
        assert!(statements["empty.csv"].as_object().unwrap().is_empty());
        assert!(statements["fidelity.csv"]["Dividend"][0]["valuation"]["income"]["yearly"].is_null());
        assert_eq!(statements["morgan-stanley.csv"]["Dividend"][0]["valuation"]["income"]["yearly"].as_f64(),
                   Some(2250.0));
    }

    #[test]
    fn spreadsheet() {
        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join("report.xlsx");

        save_spreadsheet(&path, &[
            (s!("fidelity.csv"), valuate(&[])),
            (s!("morgan-stanley.csv"), valuate(&[("USD", dec!(22.5))])),
        ]).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert!(data.starts_with(b"PK"));
    }
}
