use std::collections::HashMap;
use std::fmt;

use serde::Serialize;
use strum::Display;

use crate::core::GenericResult;
use crate::errors::MissingRateError;
use crate::formatting;
use crate::types::{Date, Decimal};

pub mod cnb;
pub mod kurzy;
mod rate_cache;

pub use self::rate_cache::RateCache;
#[cfg(test)] pub use self::rate_cache::tests::StaticProvider;

pub const HOME_CURRENCY: &str = "CZK";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RateKey {
    Date(Date),
    Year(i32),
}

impl fmt::Display for RateKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RateKey::Date(date) => write!(f, "{}", formatting::format_date(*date)),
            RateKey::Year(year) => write!(f, "{} year", year),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Display)]
pub enum ProviderKind {
    #[strum(serialize = "daily")]
    Daily,
    #[strum(serialize = "yearly average")]
    YearlyAverage,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CurrencyRate {
    /// Price of one currency unit in home currency
    pub price: Decimal,
    /// Actual date (or year) the rate has been published for
    pub key: RateKey,
}

/// All currency rates of a provider for one date or year.
///
/// An empty table is a valid value: the yearly average provider has nothing to return for a year
/// that hasn't been closed yet.
#[derive(Clone, Debug, PartialEq)]
pub struct CurrencyRateTable {
    key: RateKey,
    rates: HashMap<String, CurrencyRate>,
}

impl CurrencyRateTable {
    pub fn new(key: RateKey) -> CurrencyRateTable {
        CurrencyRateTable {
            key: key,
            rates: HashMap::new(),
        }
    }

    pub fn key(&self) -> RateKey {
        self.key
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn add(&mut self, currency: &str, rate: CurrencyRate) -> GenericResult<()> {
        if self.rates.insert(currency.to_owned(), rate).is_some() {
            return Err!("Got a duplicated {} currency rate for {}", currency, self.key);
        }
        Ok(())
    }

    pub fn get(&self, currency: &str) -> Option<&CurrencyRate> {
        self.rates.get(currency)
    }

    pub fn price(&self, currency: &str) -> Result<Decimal, MissingRateError> {
        self.get(currency).map(|rate| rate.price).ok_or_else(|| MissingRateError {
            currency: currency.to_owned(),
            key: self.key,
        })
    }
}

pub trait DailyRatesProvider: Send + Sync {
    fn name(&self) -> &'static str;
    fn get_daily_rates(&self, date: Date) -> GenericResult<CurrencyRateTable>;
}

pub trait YearlyRatesProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Returns an empty table if there is no data for the specified year yet.
    fn get_yearly_rates(&self, year: i32) -> GenericResult<CurrencyRateTable>;
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;
    use super::*;

    #[test]
    fn rate_table() {
        let key = RateKey::Date(date!(2019, 3, 1));

        let mut table = CurrencyRateTable::new(key);
        assert!(table.is_empty());

        table.add("USD", CurrencyRate {price: dec!(22.528), key}).unwrap();
        assert!(!table.is_empty());
        assert_eq!(table.price("USD").unwrap(), dec!(22.528));

        assert_matches!(table.add("USD", CurrencyRate {price: dec!(22.5), key}), Err(_));
        assert_eq!(table.price("EUR").unwrap_err(), MissingRateError {
            currency: s!("EUR"),
            key: key,
        });
    }

    #[test]
    fn key_formatting() {
        assert_eq!(RateKey::Date(date!(2019, 3, 1)).to_string(), "01.03.2019");
        assert_eq!(RateKey::Year(2019).to_string(), "2019 year");
        assert_eq!(ProviderKind::YearlyAverage.to_string(), "yearly average");
    }
}
