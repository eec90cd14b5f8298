use serde::Serialize;
use strum::Display;

use crate::types::{Date, Decimal};

mod grouping;

pub use self::grouping::{Grouped, TransactionGroups, group};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Display, Serialize)]
pub enum TransactionKind {
    Deposit,
    Dividend,
    #[strum(serialize = "ESPP")]
    #[serde(rename = "ESPP")]
    Espp,
    Sale,
}

/// Named amount of a transaction which is subject to currency conversion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MoneyField {
    #[strum(serialize = "Price")]
    Price,
    #[strum(serialize = "Income")]
    Income,
    #[strum(serialize = "Tax")]
    Tax,
    #[strum(serialize = "Purchase price")]
    PurchasePrice,
    #[strum(serialize = "Market price")]
    MarketPrice,
    #[strum(serialize = "Sale price")]
    SalePrice,
}

/// Stock deposited to the brokerage account (RSU vesting, for example).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Deposit {
    pub date: Date,
    pub currency: String,
    pub broker: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Dividend {
    pub date: Date,
    pub currency: String,
    pub broker: String,
    pub name: String,
    pub country: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub income: Decimal,
    /// Tax withheld abroad
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
}

/// Employee stock purchase: the difference between market and purchase price is an income.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Espp {
    pub date: Date,
    pub currency: String,
    pub broker: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub purchase_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub market_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Sale {
    pub date: Date,
    pub currency: String,
    pub broker: String,
    pub name: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub purchase_price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub sale_price: Decimal,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Transaction {
    Deposit(Deposit),
    Dividend(Dividend),
    Espp(Espp),
    Sale(Sale),
}

macro_rules! common_field {
    ($transaction:expr, $field:ident) => {
        match $transaction {
            Transaction::Deposit(deposit) => &deposit.$field,
            Transaction::Dividend(dividend) => &dividend.$field,
            Transaction::Espp(espp) => &espp.$field,
            Transaction::Sale(sale) => &sale.$field,
        }
    }
}

impl Transaction {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Transaction::Deposit(_) => TransactionKind::Deposit,
            Transaction::Dividend(_) => TransactionKind::Dividend,
            Transaction::Espp(_) => TransactionKind::Espp,
            Transaction::Sale(_) => TransactionKind::Sale,
        }
    }

    pub fn date(&self) -> Date {
        *common_field!(self, date)
    }

    pub fn currency(&self) -> &str {
        common_field!(self, currency)
    }

    pub fn broker(&self) -> &str {
        common_field!(self, broker)
    }

    pub fn name(&self) -> &str {
        common_field!(self, name)
    }

    /// All money fields of the transaction in their declaration order.
    pub fn money_fields(&self) -> Vec<(MoneyField, Decimal)> {
        match self {
            Transaction::Deposit(deposit) => vec![
                (MoneyField::Price, deposit.price),
            ],
            Transaction::Dividend(dividend) => vec![
                (MoneyField::Income, dividend.income),
                (MoneyField::Tax, dividend.tax),
            ],
            Transaction::Espp(espp) => vec![
                (MoneyField::PurchasePrice, espp.purchase_price),
                (MoneyField::MarketPrice, espp.market_price),
            ],
            Transaction::Sale(sale) => vec![
                (MoneyField::PurchasePrice, sale.purchase_price),
                (MoneyField::SalePrice, sale.sale_price),
            ],
        }
    }
}

impl Grouped for Transaction {
    fn kind(&self) -> TransactionKind {
        Transaction::kind(self)
    }
}
