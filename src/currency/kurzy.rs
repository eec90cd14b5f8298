//! Yearly average ("jednotný kurz") exchange rates published at kurzy.cz.

use chrono::Datelike;
#[cfg(test)] use indoc::indoc;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use reqwest::blocking::Client;
use scraper::{ElementRef, Html, Selector};
use scraper::node::Node;

use crate::core::GenericResult;
use crate::http;
use crate::time;
use crate::types::Date;
use crate::util::{self, DecimalRestrictions};

use super::{CurrencyRate, CurrencyRateTable, RateKey, YearlyRatesProvider};

pub struct Kurzy {
    url: String,
    client: Client,
}

impl Kurzy {
    pub fn new(url: &str) -> Kurzy {
        Kurzy {
            url: url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }

    fn get_rates(&self, year: i32, today: Date) -> GenericResult<CurrencyRateTable> {
        let key = RateKey::Year(year);

        if year > today.year() {
            debug!("There are no yearly average currency rates for {} yet.", year);
            return Ok(CurrencyRateTable::new(key));
        }

        let url = format!("{}/kurzy-men/jednotny-kurz/{}/", self.url, year);

        let get = |url: &str| -> GenericResult<CurrencyRateTable> {
            debug!("Getting yearly average currency rates for {}...", year);

            let Some(response) = http::send_optional_request(&self.client, url)? else {
                debug!("There are no yearly average currency rates for {} yet.", year);
                return Ok(CurrencyRateTable::new(key));
            };

            Ok(parse_rates(year, &response.text()?).map_err(|e| format!(
                "Rates info parsing error: {}", e))?)
        };

        Ok(get(&url).map_err(|e| format!("Failed to get currency rates from {}: {}", url, e))?)
    }
}

impl YearlyRatesProvider for Kurzy {
    fn name(&self) -> &'static str {
        "kurzy.cz"
    }

    fn get_yearly_rates(&self, year: i32) -> GenericResult<CurrencyRateTable> {
        self.get_rates(year, time::today())
    }
}

// Every rate row looks like `country | currency name | lot | code | price`. Country may look like a
// currency code too (EMU), so the last matching cell is taken. Rows without a currency code are
// titles or notes.
fn parse_rates(year: i32, data: &str) -> GenericResult<CurrencyRateTable> {
    lazy_static! {
        static ref ROW_SELECTOR: Selector = Selector::parse("tr").unwrap();
        static ref CELL_SELECTOR: Selector = Selector::parse("td").unwrap();
        static ref CODE_REGEX: Regex = Regex::new(r"^[A-Z]{3}$").unwrap();
    }

    let key = RateKey::Year(year);
    let mut table = CurrencyRateTable::new(key);
    let document = Html::parse_document(data);

    for row in document.select(&ROW_SELECTOR) {
        let cells: Vec<String> = row.select(&CELL_SELECTOR).map(textify).collect();

        let Some(index) = cells.iter().rposition(|cell| CODE_REGEX.is_match(cell)) else {
            continue;
        };

        let (Some(lot), Some(price)) = (index.checked_sub(1).map(|index| &cells[index]), cells.get(index + 1)) else {
            return Err!("Unexpected row: {:?}", cells);
        };
        let code = &cells[index];

        let lot = util::parse_decimal(lot, DecimalRestrictions::StrictlyPositive).map_err(|_| format!(
            "Invalid {} lot: {:?}", code, lot))?;

        let price = util::parse_decimal(&price.replace(',', "."), DecimalRestrictions::StrictlyPositive)
            .map_err(|_| format!("Invalid {} price: {:?}", code, price))?;

        table.add(code, CurrencyRate {
            price: price / lot,
            key: key,
        })?;
    }

    Ok(table)
}

fn textify(element: ElementRef) -> String {
    let mut text = String::new();

    for node in element.descendants() {
        if let Node::Text(inner) = node.value() {
            text.push_str(inner);
        }
    }

    text.replace('\u{a0}', " ").split_whitespace().collect::<Vec<_>>().join(" ")
}
