//! This module provides a thin wrapper around prettytable.

use num_traits::ToPrimitive;

use prettytable::{Row as RawRow, Cell as RawCell};
use prettytable::format::{FormatBuilder, LinePosition, LineSeparator};
use separator::Separatable;

use crate::types::{Date, Decimal};
use crate::util;

pub use prettytable::{Table, format::Alignment};

#[derive(Clone)]
pub struct Cell {
    text: String,
    align: Alignment,
}

impl Cell {
    pub fn new(text: &str) -> Cell {
        Cell::new_align(text, Alignment::LEFT)
    }

    pub fn new_align(text: &str, align: Alignment) -> Cell {
        Cell {
            text: text.to_owned(),
            align: align,
        }
    }

    pub fn new_date(date: Date) -> Cell {
        Cell::new_align(&super::format_date(date), Alignment::CENTER)
    }

    pub fn new_amount(value: Decimal) -> Cell {
        Cell::new_align(&format_amount(value), Alignment::RIGHT)
    }
}

pub struct Row {
}

impl Row {
    pub fn new(row: &[Cell]) -> RawRow {
        let mut cells = Vec::with_capacity(row.len());

        for cell in row {
            cells.push(RawCell::new_align(&cell.text, cell.align));
        }

        RawRow::new(cells)
    }
}

/// Rounds to cents, integers get thousands separators.
pub fn format_amount(value: Decimal) -> String {
    let value = util::round(value);

    match value.to_i64() {
        Some(integer) if value.scale() == 0 => integer.separated_string(),
        _ => value.to_string(),
    }
}

pub fn render_table(name: &str, titles: &[&str], mut table: Table) -> String {
    table.set_format(FormatBuilder::new().padding(1, 1).build());
    table.set_titles(RawRow::new(
        titles.iter().map(|name| RawCell::new_align(name, Alignment::CENTER)).collect()));

    let mut wrapping_table = Table::new();

    wrapping_table.set_format(FormatBuilder::new()
        .separator(LinePosition::Title, LineSeparator::new(' ', ' ', ' ', ' '))
        .build());

    wrapping_table.set_titles(RawRow::new(vec![
        RawCell::new_align(&("\n".to_owned() + name), Alignment::CENTER),
    ]));

    wrapping_table.add_row(RawRow::new(vec![RawCell::new(&table.to_string())]));
    wrapping_table.to_string()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    #[rstest(value, expected,
        case(dec!(2300.0), "2,300"),
        case(dec!(337.5), "337.5"),
        case(dec!(0.20215), "0.2"),
        case(dec!(23000), "23,000"),
    )]
    fn amount_formatting(value: Decimal, expected: &str) {
        assert_eq!(format_amount(value), expected);
    }
}
