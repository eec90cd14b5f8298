//! Czech National Bank daily exchange rate fixing.

use lazy_static::lazy_static;
#[cfg(test)] use indoc::indoc;
use log::debug;
use regex::Regex;
use reqwest::Url;
use reqwest::blocking::Client;

use crate::core::GenericResult;
use crate::formatting;
use crate::http;
use crate::time;
use crate::types::Date;
use crate::util::{self, DecimalRestrictions};

use super::{CurrencyRate, CurrencyRateTable, DailyRatesProvider, RateKey};

const RATES_PATH: &str = "/cs/financni-trhy/devizovy-trh/kurzy-devizoveho-trhu/kurzy-devizoveho-trhu/denni_kurz.txt";
const HEADER: &str = "země|měna|množství|kód|kurz";

pub struct Cnb {
    url: String,
    client: Client,
}

impl Cnb {
    pub fn new(url: &str) -> Cnb {
        Cnb {
            url: url.trim_end_matches('/').to_owned(),
            client: Client::new(),
        }
    }
}

impl DailyRatesProvider for Cnb {
    fn name(&self) -> &'static str {
        "CNB"
    }

    fn get_daily_rates(&self, date: Date) -> GenericResult<CurrencyRateTable> {
        if date > time::today() {
            return Err!("An attempt to get currency rates for the future");
        }

        let date_string = formatting::format_date(date);
        let url = Url::parse_with_params(&format!("{}{}", self.url, RATES_PATH), &[
            ("date", date_string.as_str()),
        ])?;

        let get = |url: &Url| -> GenericResult<CurrencyRateTable> {
            debug!("Getting CNB currency rates for {}...", date_string);
            let data = http::send_request(&self.client, url)?.text()?;
            Ok(parse_rates(date, &data).map_err(|e| format!("Rates info parsing error: {}", e))?)
        };

        Ok(get(&url).map_err(|e| format!("Failed to get currency rates from {}: {}", url, e))?)
    }
}

fn parse_rates(date: Date, data: &str) -> GenericResult<CurrencyRateTable> {
    lazy_static! {
        static ref TITLE_REGEX: Regex = Regex::new(r"^(?P<date>\d{2}\.\d{2}\.\d{4}) #\d+$").unwrap();
    }

    let mut lines = data.lines().map(str::trim).filter(|line| !line.is_empty());

    let title = lines.next().ok_or("Got an empty response")?;
    let captures = TITLE_REGEX.captures(title).ok_or_else(|| format!("Unexpected title: {:?}", title))?;
    let published_date = time::parse_date(&captures["date"], "%d.%m.%Y")?;

    // The rates aren't published on weekends and holidays, so the last published rates are returned
    // instead, but they must never be from the future.
    if published_date > date {
        return Err!(
            "The server returned currency rates for {} instead of {}",
            formatting::format_date(published_date), formatting::format_date(date));
    }

    match lines.next() {
        Some(header) if header == HEADER => {},
        header => return Err!("Unexpected header: {:?}", header.unwrap_or_default()),
    }

    let key = RateKey::Date(published_date);
    let mut table = CurrencyRateTable::new(RateKey::Date(date));

    for line in lines {
        let fields: Vec<&str> = line.split('|').map(str::trim).collect();
        let &[_country, _name, lot, code, price] = fields.as_slice() else {
            return Err!("Unexpected row: {:?}", line);
        };

        let lot = util::parse_decimal(lot, DecimalRestrictions::StrictlyPositive).map_err(|_| format!(
            "Invalid lot: {:?}", lot))?;

        let price = util::parse_decimal(&price.replace(',', "."), DecimalRestrictions::StrictlyPositive)
            .map_err(|_| format!("Invalid price: {:?}", price))?;

        table.add(code, CurrencyRate {
            price: price / lot,
            key: key,
        })?;
    }

    if table.is_empty() {
        return Err!("Got an empty currency rates list");
    }

    Ok(table)
}
