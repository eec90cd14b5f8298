use chrono::Datelike;
use log::{info, warn};

use crate::core::{EmptyResult, GenericResult};
use crate::formatting;
use crate::time;
use crate::transactions::{self, Transaction};
use crate::valuation::{RateChoice, ValuatedTransaction, Valuator};

use super::{DeclarationAggregator, DeclarationBuilder, TaxDeclaration};

pub struct DeclarationGenerator<'a> {
    valuator: Valuator<'a>,
    rate_choice: RateChoice,
}

impl<'a> DeclarationGenerator<'a> {
    pub fn new(valuator: Valuator<'a>, rate_choice: RateChoice) -> DeclarationGenerator<'a> {
        DeclarationGenerator {valuator, rate_choice}
    }

    pub fn build_declaration(
        &self, template_path: &str, transactions: &[Transaction], tax_year: i32,
    ) -> GenericResult<TaxDeclaration> {
        let template = TaxDeclaration::load(template_path)?;
        self.build(template, transactions, tax_year)
    }

    /// Builds the declaration from the transactions of all statements at once.
    pub fn build(
        &self, template: TaxDeclaration, transactions: &[Transaction], tax_year: i32,
    ) -> GenericResult<TaxDeclaration> {
        check_tax_year(tax_year)?;
        let valuated = self.valuate(transactions, tax_year)?;
        self.declare(template, valuated, tax_year)
    }

    /// Valuates transactions of the tax year skipping all others.
    pub fn valuate(&self, transactions: &[Transaction], tax_year: i32) -> GenericResult<Vec<ValuatedTransaction>> {
        let (start, end) = time::year_range(tax_year)?;

        let transactions: Vec<Transaction> = transactions.iter().filter(|transaction| {
            let date = transaction.date();
            if date < start || date > end {
                warn!("Skipping {} {} transaction from {}: it's not from {} year.",
                      transaction.name(), transaction.kind(), formatting::format_date(date), tax_year);
                return false;
            }
            true
        }).cloned().collect();

        self.valuator.valuate_all(&transactions)
    }

    /// Fills the template with already valuated transactions of the tax year.
    pub fn declare(
        &self, template: TaxDeclaration, transactions: Vec<ValuatedTransaction>, tax_year: i32,
    ) -> GenericResult<TaxDeclaration> {
        check_tax_year(tax_year)?;

        let count = transactions.len();
        let groups = transactions::group(transactions);

        let mut builder = DeclarationBuilder::new(template);
        builder.with_tax_year(tax_year)?;
        DeclarationAggregator::new(self.rate_choice).aggregate(&mut builder, &groups)?;

        let declaration = builder.build()?;
        declaration.validate().map_err(|e| format!("Generated tax declaration is invalid: {}", e))?;

        info!("Declared {} transactions for {} year using {} currency rates.",
              count, tax_year, self.rate_choice);

        Ok(declaration)
    }
}

pub fn check_tax_year(tax_year: i32) -> EmptyResult {
    if tax_year > time::today().year() {
        return Err!("An attempt to generate tax declaration for the future ({})", tax_year);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::currency::{RateCache, StaticProvider};
    use crate::declaration::tests::template;
    use crate::transactions::tests::dividend;

    use super::*;

    #[test]
    fn tax_year_filtering() {
        let cache = RateCache::new(
            Box::new(StaticProvider::new(&[("USD", dec!(23))])),
            Box::new(StaticProvider::new(&[("USD", dec!(22.5))])));
        let generator = DeclarationGenerator::new(Valuator::new(&cache), RateChoice::Daily);

        let declaration = generator.build(template(), &[
            dividend(date!(2018, 12, 31), "USD", dec!(1), dec!(0)),
            dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15)),
            dividend(date!(2020, 1, 1), "USD", dec!(1), dec!(0)),
        ], 2019).unwrap();

        assert_eq!(declaration.header.year, Some(2019));
        assert_eq!(declaration.section2.row38, dec!(2300));
    }

    #[test]
    fn declaration_from_template_file() {
        let cache = RateCache::new(
            Box::new(StaticProvider::new(&[("USD", dec!(23))])),
            Box::new(StaticProvider::new(&[("USD", dec!(22.5))])));
        let generator = DeclarationGenerator::new(Valuator::new(&cache), RateChoice::YearlyAverage);

        let declaration = generator.build_declaration("testdata/declaration-template.xml", &[
            dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15)),
        ], 2019).unwrap();

        assert_eq!(declaration.header.year, Some(2019));
        assert_eq!(declaration.section2.row38, dec!(2250));

        let error = generator.build_declaration("testdata/missing.xml", &[], 2019).unwrap_err();
        assert!(error.to_string().starts_with(r#"Error while reading "testdata/missing.xml" tax declaration"#), "{}", error);
    }

    #[test]
    fn future_year() {
        let cache = RateCache::new(Box::new(StaticProvider::new(&[])), Box::new(StaticProvider::new(&[])));
        let generator = DeclarationGenerator::new(Valuator::new(&cache), RateChoice::Daily);

        let error = generator.build(template(), &[], 9999).unwrap_err();
        assert_eq!(error.to_string(), "An attempt to generate tax declaration for the future (9999)");
    }

    #[test]
    fn per_statement_valuation() {
        let cache = RateCache::new(
            Box::new(StaticProvider::new(&[("USD", dec!(23))])),
            Box::new(StaticProvider::new(&[("USD", dec!(22.5))])));
        let generator = DeclarationGenerator::new(Valuator::new(&cache), RateChoice::Daily);

        let mut valuated = generator.valuate(&[dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15))], 2019).unwrap();
        valuated.extend(generator.valuate(&[dividend(date!(2018, 3, 1), "USD", dec!(10), dec!(0))], 2019).unwrap());
        assert!(generator.valuate(&[dividend(date!(2019, 3, 1), "GBP", dec!(10), dec!(0))], 2019).is_err());

        let declaration = generator.declare(template(), valuated, 2019).unwrap();
        assert_eq!(declaration.section2.row38, dec!(2300));
        assert_eq!(declaration.appendices.appendix3.len(), 1);
    }
}
