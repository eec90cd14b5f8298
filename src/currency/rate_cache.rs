use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use log::debug;

use crate::config::Config;
use crate::core::GenericResult;
use crate::errors::RateProviderError;
use crate::types::Date;

use super::cnb::Cnb;
use super::kurzy::Kurzy;
use super::{CurrencyRateTable, DailyRatesProvider, ProviderKind, RateKey, YearlyRatesProvider};

type Slot = Mutex<Option<Arc<CurrencyRateTable>>>;

/// Memoizes currency rate tables for the duration of one run.
///
/// Each `(provider, key)` pair gets its own lazily filled slot. The slot is locked during the fetch,
/// so concurrent lookups of the same key wait for the first fetch instead of issuing their own
/// requests, while lookups of other keys proceed independently. Failed fetches leave the slot empty.
pub struct RateCache {
    daily: Box<dyn DailyRatesProvider>,
    yearly: Box<dyn YearlyRatesProvider>,
    slots: Mutex<HashMap<(ProviderKind, RateKey), Arc<Slot>>>,
}

impl RateCache {
    pub fn new(daily: Box<dyn DailyRatesProvider>, yearly: Box<dyn YearlyRatesProvider>) -> RateCache {
        RateCache {
            daily, yearly,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Creates a cache backed by Czech National Bank daily rates and kurzy.cz yearly average rates.
    pub fn from_config(config: &Config) -> RateCache {
        RateCache::new(
            Box::new(Cnb::new(&config.daily_rates_url)),
            Box::new(Kurzy::new(&config.yearly_rates_url)))
    }

    pub fn get_daily_rates(&self, date: Date) -> Result<Arc<CurrencyRateTable>, RateProviderError> {
        self.get(ProviderKind::Daily, RateKey::Date(date), self.daily.name(), || {
            self.daily.get_daily_rates(date)
        })
    }

    /// Returns an empty table when the provider has no data for the year.
    pub fn get_yearly_rates(&self, year: i32) -> Result<Arc<CurrencyRateTable>, RateProviderError> {
        self.get(ProviderKind::YearlyAverage, RateKey::Year(year), self.yearly.name(), || {
            self.yearly.get_yearly_rates(year)
        })
    }

    fn get<F>(
        &self, provider: ProviderKind, key: RateKey, provider_name: &str, fetch: F,
    ) -> Result<Arc<CurrencyRateTable>, RateProviderError>
        where F: FnOnce() -> GenericResult<CurrencyRateTable>
    {
        let slot = self.slots.lock().unwrap().entry((provider, key)).or_default().clone();
        let mut slot = slot.lock().unwrap();

        if let Some(table) = slot.as_ref() {
            return Ok(table.clone());
        }

        debug!("Getting {} currency rates for {} from {}...", provider, key, provider_name);

        let table = fetch().map_err(|e| RateProviderError {
            provider, key,
            message: e.to_string(),
        })?;

        if table.key() != key {
            return Err(RateProviderError {
                provider, key,
                message: format!("{} returned currency rates for {}", provider_name, table.key()),
            });
        }

        if table.is_empty() {
            debug!("{} has no {} currency rates for {}.", provider_name, provider, key);
        }

        let table = Arc::new(table);
        *slot = Some(table.clone());

        Ok(table)
    }
}
