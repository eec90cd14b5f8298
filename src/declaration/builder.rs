use strum::Display;

use crate::errors::InvalidBuilderState;
use crate::types::Decimal;

use super::{
    Appendices, Appendix2, Appendix3Row, IncomeTableRow, OtherIncomeRow, SecuritiesListRow,
    TaxDeclaration};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Display)]
pub enum BuilderState {
    Created,
    YearSet,
    Built,
}

/// Single-use accumulator of a declaration: `Created -> YearSet -> Built`.
///
/// The builder doesn't check form arithmetic. Any operation called in a wrong state is an API misuse
/// and fails with [`InvalidBuilderState`].
#[derive(Debug)]
pub struct DeclarationBuilder {
    state: BuilderState,
    declaration: TaxDeclaration,
}

impl DeclarationBuilder {
    pub fn new(template: TaxDeclaration) -> DeclarationBuilder {
        DeclarationBuilder {
            state: BuilderState::Created,
            declaration: template,
        }
    }

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn with_tax_year(&mut self, year: i32) -> Result<&mut Self, InvalidBuilderState> {
        self.check("with_tax_year", BuilderState::Created)?;
        self.declaration.header.year = Some(year);
        self.state = BuilderState::YearSet;
        Ok(self)
    }

    /// The document being accumulated.
    pub fn document(&self) -> Result<&TaxDeclaration, InvalidBuilderState> {
        self.check("document", BuilderState::YearSet)?;
        Ok(&self.declaration)
    }

    pub fn set_appendices(&mut self, appendices: Appendices) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_appendices", |declaration| declaration.appendices = appendices)
    }

    pub fn set_income_table(&mut self, rows: Vec<IncomeTableRow>) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_income_table", |declaration| declaration.appendices.income_table = rows)
    }

    pub fn set_securities_list(&mut self, rows: Vec<SecuritiesListRow>) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_securities_list", |declaration| declaration.appendices.securities_list = rows)
    }

    pub fn set_appendix3(&mut self, rows: Vec<Appendix3Row>) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_appendix3", |declaration| declaration.appendices.appendix3 = rows)
    }

    pub fn set_appendix2(&mut self, appendix: Appendix2) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_appendix2", |declaration| declaration.appendices.appendix2 = appendix)
    }

    pub fn set_appendix2_other_income(&mut self, row: Option<OtherIncomeRow>) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_appendix2_other_income", |declaration| declaration.appendices.appendix2_other_income = row)
    }

    pub fn set_row38(&mut self, value: Decimal) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_row38", |declaration| declaration.section2.row38 = value)
    }

    pub fn set_row40(&mut self, value: Decimal) -> Result<&mut Self, InvalidBuilderState> {
        self.modify("set_row40", |declaration| declaration.section2.row40 = value)
    }

    /// Finalizes the document. Any further call to the builder fails.
    pub fn build(&mut self) -> Result<TaxDeclaration, InvalidBuilderState> {
        self.check("build", BuilderState::YearSet)?;
        self.state = BuilderState::Built;
        Ok(self.declaration.clone())
    }

    fn modify<F>(&mut self, operation: &'static str, modify: F) -> Result<&mut Self, InvalidBuilderState>
        where F: FnOnce(&mut TaxDeclaration)
    {
        self.check(operation, BuilderState::YearSet)?;
        modify(&mut self.declaration);
        Ok(self)
    }

    fn check(&self, operation: &'static str, expected: BuilderState) -> Result<(), InvalidBuilderState> {
        if self.state != expected {
            return Err(InvalidBuilderState {
                operation,
                state: self.state,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;

    use crate::declaration::tests::template;

    use super::*;

    #[test]
    fn building() {
        let mut builder = DeclarationBuilder::new(template());
        assert_eq!(builder.state(), BuilderState::Created);

        builder.with_tax_year(2019).unwrap()
            .set_row38(dec!(2300)).unwrap()
            .set_row40(dec!(230)).unwrap();
        assert_eq!(builder.state(), BuilderState::YearSet);
        assert_eq!(builder.document().unwrap().header.year, Some(2019));
        assert_eq!(builder.document().unwrap().section2.row38, dec!(2300));

        let declaration = builder.build().unwrap();
        assert_eq!(builder.state(), BuilderState::Built);
        assert_eq!(declaration.header.year, Some(2019));
        assert_eq!(declaration.header.other_attributes, template().header.other_attributes);
        assert_eq!(declaration.section2.row40, dec!(230));
        assert_eq!(declaration.other_records, template().other_records);
    }

    #[test]
    fn appendix_setters() {
        let mut builder = DeclarationBuilder::new(template());
        builder.with_tax_year(2019).unwrap();

        builder
            .set_appendix3(vec![Appendix3Row {
                country: s!("US"), income: dec!(2300), tax: dec!(345), ..Default::default()
            }]).unwrap()
            .set_securities_list(vec![SecuritiesListRow {
                broker: s!("Morgan Stanley"), country: s!("US"), income: dec!(2300), tax: dec!(345),
                ..Default::default()
            }]).unwrap()
            .set_income_table(vec![IncomeTableRow {
                kind: s!("Deposit"), name: s!("MSFT"), income: dec!(23000), expenses: dec!(0),
                ..Default::default()
            }]).unwrap()
            .set_appendix2(Appendix2::default()).unwrap()
            .set_appendix2_other_income(None).unwrap();

        let appendices = &builder.build().unwrap().appendices;
        assert_eq!(appendices.appendix3.len(), 1);
        assert_eq!(appendices.securities_list[0].broker, "Morgan Stanley");
        assert_eq!(appendices.income_table[0].income, dec!(23000));
        assert_eq!(appendices.appendix2, Appendix2::default());
        assert_eq!(appendices.appendix2_other_income, None);
    }

    #[test]
    fn build_before_year() {
        let mut builder = DeclarationBuilder::new(template());
        assert_eq!(builder.build().unwrap_err(), InvalidBuilderState {
            operation: "build",
            state: BuilderState::Created,
        });
        assert_matches!(builder.set_row38(dec!(1)), Err(_));
    }

    #[test]
    fn double_build() {
        let mut builder = DeclarationBuilder::new(template());
        builder.with_tax_year(2019).unwrap();
        builder.build().unwrap();

        let error = builder.build().unwrap_err();
        assert_eq!(error.to_string(), "Invalid declaration builder usage: build is not allowed in Built state");

        assert_matches!(builder.set_row40(dec!(1)), Err(InvalidBuilderState {state: BuilderState::Built, ..}));
        assert_matches!(builder.with_tax_year(2020), Err(_));
        assert_matches!(builder.document(), Err(_));
    }
}
