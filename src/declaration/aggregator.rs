use log::debug;
use num_traits::Zero;

use crate::core::{EmptyResult, GenericResult};
use crate::transactions::{TransactionGroups, TransactionKind};
use crate::types::Decimal;
use crate::util;
use crate::valuation::{RateChoice, ValuatedTransaction};

use super::builder::DeclarationBuilder;
use super::views::Views;
use super::{
    Appendices, Appendix2, Appendix2Row, Appendix3Row, IncomeTableRow, OtherIncomeRow,
    SecuritiesListRow};

const SECURITIES_SALE_CODE: &str = "D";
const SECURITIES_SALE_NAME: &str = "Prodej cenných papírů";

/// Folds valuated transactions into the declaration appendices and derives the summary rows from
/// them.
pub struct DeclarationAggregator {
    rate_choice: RateChoice,
}

impl DeclarationAggregator {
    pub fn new(rate_choice: RateChoice) -> DeclarationAggregator {
        DeclarationAggregator {rate_choice}
    }

    pub fn aggregate(
        &self, builder: &mut DeclarationBuilder, transactions: &TransactionGroups<ValuatedTransaction>,
    ) -> EmptyResult {
        let views = Views::new(transactions, self.rate_choice)?;
        let appendices = self.appendices(&views)?;

        for (kind, transactions) in transactions.iter() {
            debug!("Declaring {} {} transaction(s).", transactions.len(), kind);
        }

        // Summary rows are derived from the appendices as they are in the document, so they must be
        // filled in first.
        builder.set_appendices(appendices)?;

        let (row38, row40) = {
            let appendices = &builder.document()?.appendices;
            let row38 = util::checked_sum(appendices.appendix3.iter().map(|row| row.income))?;
            (row38, appendices.appendix2.total_profit)
        };

        builder.set_row38(row38)?.set_row40(row40)?;

        Ok(())
    }

    fn appendices(&self, views: &Views) -> GenericResult<Appendices> {
        let securities_list = views.dividends.iter().map(|dividend| SecuritiesListRow {
            broker: dividend.broker.clone(),
            country: dividend.country.clone(),
            income: util::round(dividend.income),
            tax: util::round(dividend.tax),
            other_attributes: Vec::new(),
        }).collect();

        let appendix3 = views.dividends.iter().map(|dividend| Appendix3Row {
            country: dividend.country.clone(),
            income: util::round(dividend.income),
            tax: util::round(dividend.tax),
            other_attributes: Vec::new(),
        }).collect();

        let mut income_table = Vec::with_capacity(views.espp.len() + views.deposits.len());

        for espp in &views.espp {
            income_table.push(IncomeTableRow {
                kind: TransactionKind::Espp.to_string(),
                name: espp.name.clone(),
                income: util::round(espp.income()?),
                expenses: util::round(espp.purchase_price),
                other_attributes: Vec::new(),
            });
        }

        for deposit in &views.deposits {
            income_table.push(IncomeTableRow {
                kind: TransactionKind::Deposit.to_string(),
                name: deposit.name.clone(),
                income: util::round(deposit.price),
                expenses: Decimal::zero(),
                other_attributes: Vec::new(),
            });
        }

        let mut rows = Vec::with_capacity(views.sales.len());

        for sale in &views.sales {
            let income = util::round(sale.sale_price);
            let expenses = util::round(sale.purchase_price);

            rows.push(Appendix2Row {
                code: SECURITIES_SALE_CODE.to_owned(),
                name: sale.name.clone(),
                income, expenses,
                difference: util::checked_sub(income, expenses)?,
                other_attributes: Vec::new(),
            });
        }

        let total_income = util::checked_sum(rows.iter().map(|row| row.income))?;
        let total_expenses = util::checked_sum(rows.iter().map(|row| row.expenses))?;

        // Partial tax base can't be negative: the loss isn't transferred to other income
        let total_profit = util::checked_sub(total_income, total_expenses)?.max(Decimal::zero());

        let appendix2_other_income = (!rows.is_empty()).then(|| OtherIncomeRow {
            kind: SECURITIES_SALE_NAME.to_owned(),
            income: total_income,
            expenses: total_expenses,
            other_attributes: Vec::new(),
        });

        Ok(Appendices {
            income_table, securities_list, appendix3,
            appendix2: Appendix2 {rows, total_income, total_expenses, total_profit, other_attributes: Vec::new()},
            appendix2_other_income,
        })
    }
}
