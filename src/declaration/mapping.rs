//! Attribute layout of every record type the declaration is built from.
//!
//! Each table lists the record attributes once together with the row field they are read into and
//! written from, so both the importer and the exporter share a single source of truth.

use std::collections::HashSet;

use crate::core::{EmptyResult, GenericResult};
use crate::types::Decimal;
use crate::util::{self, DecimalRestrictions};

use super::{
    Appendix2, Appendix2Row, Appendix3Row, Header, IncomeTableRow, OtherIncomeRow, Record, Section2,
    SecuritiesListRow};

pub struct Column<T> {
    pub attribute: &'static str,
    pub get: fn(&T) -> Option<String>,
    pub set: fn(&mut T, &str) -> EmptyResult,
}

pub trait RecordMapping: Default + 'static {
    const RECORD: &'static str;

    fn columns() -> &'static [Column<Self>];

    /// Storage for attributes which aren't listed in the table. They are preserved as is.
    fn other_attributes(&mut self) -> &mut Vec<(String, String)>;
    fn other_attributes_ref(&self) -> &[(String, String)];
}

pub const HEADER: &str = "VetaD";
pub const SECTION2: &str = "VetaS";
pub const INCOME_TABLE: &str = "VetaT";
pub const SECURITIES_LIST: &str = "VetaN";
pub const APPENDIX3: &str = "VetaL";
pub const APPENDIX2_ROW: &str = "VetaJ";
pub const APPENDIX2_TOTALS: &str = "VetaV";
pub const APPENDIX2_OTHER_INCOME: &str = "VetaO";

pub fn from_record<T: RecordMapping>(record: &Record) -> GenericResult<T> {
    let columns = T::columns();
    let mut row = T::default();
    let mut seen = HashSet::new();

    for (name, value) in &record.attributes {
        if !seen.insert(name.as_str()) {
            return Err!("Duplicated {} attribute", name);
        }

        match columns.iter().find(|column| column.attribute == name.as_str()) {
            Some(column) => (column.set)(&mut row, value).map_err(|e| format!(
                "Invalid {} attribute value ({:?}): {}", name, value, e))?,
            None => row.other_attributes().push((name.clone(), value.clone())),
        }
    }

    Ok(row)
}

pub fn to_record<T: RecordMapping>(row: &T) -> Record {
    let mut attributes: Vec<(String, String)> = T::columns().iter()
        .filter_map(|column| (column.get)(row).map(|value| (column.attribute.to_owned(), value)))
        .collect();

    attributes.extend(row.other_attributes_ref().iter().cloned());

    Record {
        name: T::RECORD.to_owned(),
        attributes,
    }
}

fn format_amount(value: Decimal) -> Option<String> {
    Some(util::round(value).to_string())
}

fn parse_amount(value: &str) -> GenericResult<Decimal> {
    util::parse_decimal(value, DecimalRestrictions::No)
}

fn parse_year(value: &str) -> GenericResult<i32> {
    Ok(value.parse::<i32>().ok().filter(|&year| year > 0).ok_or("Invalid year")?)
}

impl RecordMapping for Header {
    const RECORD: &'static str = HEADER;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<Header>] = &[
            Column {
                attribute: "rok",
                get: |row| row.year.map(|year| year.to_string()),
                set: |row, value| {
                    row.year = Some(parse_year(value)?);
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for Section2 {
    const RECORD: &'static str = SECTION2;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<Section2>] = &[
            Column {
                attribute: "kc_zd8",
                get: |row| format_amount(row.row38),
                set: |row, value| {
                    row.row38 = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_zd10",
                get: |row| format_amount(row.row40),
                set: |row, value| {
                    row.row40 = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for IncomeTableRow {
    const RECORD: &'static str = INCOME_TABLE;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<IncomeTableRow>] = &[
            Column {
                attribute: "druh_prij",
                get: |row| Some(row.kind.clone()),
                set: |row, value| {
                    row.kind = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "nazev",
                get: |row| Some(row.name.clone()),
                set: |row, value| {
                    row.name = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "kc_prij",
                get: |row| format_amount(row.income),
                set: |row, value| {
                    row.income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_vyd",
                get: |row| format_amount(row.expenses),
                set: |row, value| {
                    row.expenses = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for SecuritiesListRow {
    const RECORD: &'static str = SECURITIES_LIST;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<SecuritiesListRow>] = &[
            Column {
                attribute: "nazev_pl",
                get: |row| Some(row.broker.clone()),
                set: |row, value| {
                    row.broker = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "stat",
                get: |row| Some(row.country.clone()),
                set: |row, value| {
                    row.country = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "kc_prij",
                get: |row| format_amount(row.income),
                set: |row, value| {
                    row.income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_dan",
                get: |row| format_amount(row.tax),
                set: |row, value| {
                    row.tax = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for Appendix3Row {
    const RECORD: &'static str = APPENDIX3;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<Appendix3Row>] = &[
            Column {
                attribute: "kod_stat",
                get: |row| Some(row.country.clone()),
                set: |row, value| {
                    row.country = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "kc_prij",
                get: |row| format_amount(row.income),
                set: |row, value| {
                    row.income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_dan_zahr",
                get: |row| format_amount(row.tax),
                set: |row, value| {
                    row.tax = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for Appendix2Row {
    const RECORD: &'static str = APPENDIX2_ROW;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<Appendix2Row>] = &[
            Column {
                attribute: "kod_dr_prij10",
                get: |row| Some(row.code.clone()),
                set: |row, value| {
                    row.code = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "druh_prij10",
                get: |row| Some(row.name.clone()),
                set: |row, value| {
                    row.name = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "prijmy10",
                get: |row| format_amount(row.income),
                set: |row, value| {
                    row.income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "vydaje10",
                get: |row| format_amount(row.expenses),
                set: |row, value| {
                    row.expenses = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "rozdil10",
                get: |row| format_amount(row.difference),
                set: |row, value| {
                    row.difference = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

/// Appendix 2 totals. Rows are stored in separate records.
impl RecordMapping for Appendix2 {
    const RECORD: &'static str = APPENDIX2_TOTALS;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<Appendix2>] = &[
            Column {
                attribute: "kc_prij10",
                get: |row| format_amount(row.total_income),
                set: |row, value| {
                    row.total_income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_vyd10",
                get: |row| format_amount(row.total_expenses),
                set: |row, value| {
                    row.total_expenses = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_zd10p",
                get: |row| format_amount(row.total_profit),
                set: |row, value| {
                    row.total_profit = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}

impl RecordMapping for OtherIncomeRow {
    const RECORD: &'static str = APPENDIX2_OTHER_INCOME;

    fn columns() -> &'static [Column<Self>] {
        static COLUMNS: &[Column<OtherIncomeRow>] = &[
            Column {
                attribute: "druh_prij",
                get: |row| Some(row.kind.clone()),
                set: |row, value| {
                    row.kind = value.to_owned();
                    Ok(())
                },
            },
            Column {
                attribute: "kc_prij",
                get: |row| format_amount(row.income),
                set: |row, value| {
                    row.income = parse_amount(value)?;
                    Ok(())
                },
            },
            Column {
                attribute: "kc_vyd",
                get: |row| format_amount(row.expenses),
                set: |row, value| {
                    row.expenses = parse_amount(value)?;
                    Ok(())
                },
            },
        ];
        COLUMNS
    }

    fn other_attributes(&mut self) -> &mut Vec<(String, String)> {
        &mut self.other_attributes
    }

    fn other_attributes_ref(&self) -> &[(String, String)] {
        &self.other_attributes
    }
}
