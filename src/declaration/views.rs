//! Home currency views of valuated transactions which declaration rows are built from.

use std::collections::HashMap;

use crate::core::GenericResult;
use crate::formatting;
use crate::transactions::{MoneyField, Transaction, TransactionGroups};
use crate::types::Decimal;
use crate::util;
use crate::valuation::{RateChoice, ValuatedTransaction};

/// Dividends of one broker from one source country.
#[derive(Clone, Debug, PartialEq)]
pub struct DividendView {
    pub broker: String,
    pub country: String,
    pub income: Decimal,
    pub tax: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct EsppView {
    pub broker: String,
    pub name: String,
    pub purchase_price: Decimal,
    pub market_price: Decimal,
}

impl EsppView {
    /// The discount is the taxable income.
    pub fn income(&self) -> GenericResult<Decimal> {
        util::checked_sub(self.market_price, self.purchase_price)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DepositView {
    pub broker: String,
    pub name: String,
    pub price: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SaleView {
    pub broker: String,
    pub name: String,
    pub purchase_price: Decimal,
    pub sale_price: Decimal,
}

#[derive(Clone, Debug, PartialEq)]
pub enum TransactionView {
    Deposit(DepositView),
    Dividend(DividendView),
    Espp(EsppView),
    Sale(SaleView),
}

impl TransactionView {
    pub fn new(valuated: &ValuatedTransaction, choice: RateChoice) -> GenericResult<TransactionView> {
        let valuation = &valuated.valuation;
        let amount = |field| valuation.amount(field, choice);

        Ok(match &valuated.transaction {
            Transaction::Deposit(deposit) => TransactionView::Deposit(DepositView {
                broker: deposit.broker.clone(),
                name: deposit.name.clone(),
                price: amount(MoneyField::Price)?,
            }),
            Transaction::Dividend(dividend) => TransactionView::Dividend(DividendView {
                broker: dividend.broker.clone(),
                country: dividend.country.clone(),
                income: amount(MoneyField::Income)?,
                tax: amount(MoneyField::Tax)?,
            }),
            Transaction::Espp(espp) => TransactionView::Espp(EsppView {
                broker: espp.broker.clone(),
                name: espp.name.clone(),
                purchase_price: amount(MoneyField::PurchasePrice)?,
                market_price: amount(MoneyField::MarketPrice)?,
            }),
            Transaction::Sale(sale) => TransactionView::Sale(SaleView {
                broker: sale.broker.clone(),
                name: sale.name.clone(),
                purchase_price: amount(MoneyField::PurchasePrice)?,
                sale_price: amount(MoneyField::SalePrice)?,
            }),
        })
    }
}

/// Views of all transactions. Dividends are summarized per broker and country in order of their
/// first appearance.
#[derive(Debug, Default, PartialEq)]
pub struct Views {
    pub deposits: Vec<DepositView>,
    pub dividends: Vec<DividendView>,
    pub espp: Vec<EsppView>,
    pub sales: Vec<SaleView>,
}

impl Views {
    pub fn new(groups: &TransactionGroups<ValuatedTransaction>, choice: RateChoice) -> GenericResult<Views> {
        let mut views = Views::default();
        let mut dividend_index: HashMap<(String, String), usize> = HashMap::new();

        for (_, transactions) in groups.iter() {
            for valuated in transactions {
                let view = TransactionView::new(valuated, choice).map_err(|e| format!(
                    "{} {} transaction from {}: {}",
                    valuated.transaction.name(), valuated.transaction.kind(),
                    formatting::format_date(valuated.transaction.date()), e))?;

                match view {
                    TransactionView::Deposit(deposit) => views.deposits.push(deposit),
                    TransactionView::Dividend(dividend) => {
                        let key = (dividend.broker.clone(), dividend.country.clone());

                        match dividend_index.get(&key) {
                            Some(&index) => {
                                let summary = &mut views.dividends[index];
                                summary.income = util::checked_add(summary.income, dividend.income)?;
                                summary.tax = util::checked_add(summary.tax, dividend.tax)?;
                            },
                            None => {
                                dividend_index.insert(key, views.dividends.len());
                                views.dividends.push(dividend);
                            },
                        }
                    },
                    TransactionView::Espp(espp) => views.espp.push(espp),
                    TransactionView::Sale(sale) => views.sales.push(sale),
                }
            }
        }

        Ok(views)
    }
}
