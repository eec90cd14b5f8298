use std::path::Path;

use serde::Deserialize;

use crate::core::GenericResult;
use crate::time;
use crate::transactions::{Deposit, Dividend, Espp, Sale, Transaction};
use crate::types::{Date, Decimal};
use crate::util::{self, DecimalRestrictions};

use super::StatementParser;

const DEFAULT_COUNTRY: &str = "US";

/// A generic statement in CSV format with the following columns (the ones that aren't used by the
/// transaction type may be empty or omitted):
/// `type,date,currency,broker,name,country,price,income,tax,purchase_price,market_price,sale_price`
pub struct CsvStatementParser;

impl StatementParser for CsvStatementParser {
    fn name(&self) -> &'static str {
        "CSV"
    }

    fn parse(&self, path: &Path) -> GenericResult<Option<Vec<Transaction>>> {
        let supported = path.extension()
            .and_then(|extension| extension.to_str())
            .map(|extension| extension.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);

        if !supported {
            return Ok(None);
        }

        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_path(path)?;

        parse_transactions(reader).map(Some)
    }
}

#[derive(Deserialize, Clone, Copy)]
#[serde(rename_all = "lowercase")]
enum RecordType {
    Deposit,
    Dividend,
    #[serde(alias = "ESPP")]
    Espp,
    Sale,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Record {
    #[serde(rename = "type")]
    kind: RecordType,
    #[serde(deserialize_with = "time::deserialize_date")]
    date: Date,
    currency: String,
    #[serde(default)]
    broker: String,
    #[serde(default)]
    name: String,
    country: Option<String>,

    price: Option<String>,
    income: Option<String>,
    tax: Option<String>,
    purchase_price: Option<String>,
    market_price: Option<String>,
    sale_price: Option<String>,
}

impl Record {
    fn into_transaction(self) -> GenericResult<Transaction> {
        let currency = self.currency.to_uppercase();
        if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err!("Invalid currency: {:?}", self.currency);
        }

        let (date, broker, name) = (self.date, self.broker.clone(), self.name.clone());

        Ok(match self.kind {
            RecordType::Deposit => Transaction::Deposit(Deposit {
                date, currency, broker, name,
                price: required(&self.price, "price")?,
            }),

            RecordType::Dividend => Transaction::Dividend(Dividend {
                date, currency, broker, name,
                country: self.country.clone()
                    .filter(|country| !country.is_empty())
                    .unwrap_or_else(|| DEFAULT_COUNTRY.to_owned()),
                income: required(&self.income, "income")?,
                tax: optional(&self.tax, "tax")?,
            }),

            RecordType::Espp => Transaction::Espp(Espp {
                date, currency, broker, name,
                purchase_price: required(&self.purchase_price, "purchase_price")?,
                market_price: required(&self.market_price, "market_price")?,
            }),

            RecordType::Sale => Transaction::Sale(Sale {
                date, currency, broker, name,
                purchase_price: required(&self.purchase_price, "purchase_price")?,
                sale_price: required(&self.sale_price, "sale_price")?,
            }),
        })
    }
}

fn parse_transactions<R: std::io::Read>(mut reader: csv::Reader<R>) -> GenericResult<Vec<Transaction>> {
    let mut transactions = Vec::new();

    for (index, record) in reader.deserialize::<Record>().enumerate() {
        // Header is the first line
        let line = index + 2;

        let transaction = record.map_err(Into::into).and_then(Record::into_transaction).map_err(|e| format!(
            "Error at line {}: {}", line, e))?;

        transactions.push(transaction);
    }

    Ok(transactions)
}

fn required(value: &Option<String>, name: &str) -> GenericResult<Decimal> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => parse_amount(value, name),
        _ => Err!("{:?} column value is missing", name),
    }
}

fn optional(value: &Option<String>, name: &str) -> GenericResult<Decimal> {
    match value.as_deref() {
        Some(value) if !value.is_empty() => parse_amount(value, name),
        _ => Ok(Decimal::ZERO),
    }
}

fn parse_amount(value: &str, name: &str) -> GenericResult<Decimal> {
    Ok(util::parse_decimal(value, DecimalRestrictions::PositiveOrZero).map_err(|_| format!(
        "Invalid {:?} column value: {:?}", name, value))?)
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use rstest::rstest;

    use crate::transactions::tests::{deposit, dividend, espp, sale};
    use super::*;

    fn parse(data: &str) -> GenericResult<Vec<Transaction>> {
        let reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(data.as_bytes());
        parse_transactions(reader)
    }

    #[test]
    fn transactions() {
        let transactions = parse(indoc!("
            type,date,currency,broker,name,country,price,income,tax,purchase_price,market_price,sale_price
            dividend,2019-03-14,USD,Morgan Stanley,MSFT,,,100,15,,,
            deposit,2019-05-15,usd,Morgan Stanley,MSFT,,1000,,,,,
            ESPP,28.06.2019,USD,Fidelity,MSFT,,,,,85,100,
            sale,2019-09-02,USD,Fidelity,MSFT,,,,,50,,60.5
        ")).unwrap();

        assert_eq!(transactions, vec![
            dividend(date!(2019, 3, 14), "USD", dec!(100), dec!(15)),
            deposit(date!(2019, 5, 15), dec!(1000)),
            espp(date!(2019, 6, 28), dec!(85), dec!(100)),
            sale(date!(2019, 9, 2), dec!(50), dec!(60.5)),
        ]);
    }

    #[test]
    fn dividend_without_tax() {
        let transactions = parse(indoc!("
            type,date,currency,broker,name,country,income
            dividend,2019-03-14,EUR,Degiro,SAP,DE,10
        ")).unwrap();

        assert_eq!(transactions, vec![Transaction::Dividend(Dividend {
            date: date!(2019, 3, 14),
            currency: s!("EUR"),
            broker: s!("Degiro"),
            name: s!("SAP"),
            country: s!("DE"),
            income: dec!(10),
            tax: dec!(0),
        })]);
    }

    #[rstest(row, error,
        case("deposit,2019-05-15,USD,,,,,,,,,",
             r#"Error at line 2: "price" column value is missing"#),
        case("sale,2019-05-15,USD,,,,,,,-1,,10",
             r#"Error at line 2: Invalid "purchase_price" column value: "-1""#),
        case("dividend,2019-05-15,US$,,,,,1,,,,",
             r#"Error at line 2: Invalid currency: "US$""#),
    )]
    fn invalid_record(row: &str, error: &str) {
        let data = format!("type,date,currency,broker,name,country,price,income,tax,purchase_price,market_price,sale_price\n{}\n", row);
        assert_eq!(parse(&data).unwrap_err().to_string(), error);
    }
}
