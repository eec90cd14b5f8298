//! Conversion of transaction amounts into home currency.

use std::fmt;

use chrono::Datelike;
use rayon::prelude::*;
use serde::{Deserialize, Serialize, Serializer};
use serde::ser::SerializeMap;
use strum::Display;

use crate::core::GenericResult;
use crate::currency::{HOME_CURRENCY, RateCache};
use crate::transactions::{Grouped, MoneyField, Transaction, TransactionKind};
use crate::types::Decimal;
use crate::util;

/// Which of the two home currency values is used when a single value is needed (declaration rows).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "kebab-case")]
pub enum RateChoice {
    #[default]
    #[strum(serialize = "daily")]
    Daily,
    #[strum(serialize = "yearly-average")]
    YearlyAverage,
}

impl RateChoice {
    pub fn parse(value: &str) -> GenericResult<RateChoice> {
        Ok(match value {
            "daily" => RateChoice::Daily,
            "yearly-average" => RateChoice::YearlyAverage,
            _ => return Err!("Invalid currency rate type: {:?}", value),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum YearlyAmount {
    Value(Decimal),
    /// There is no yearly average rate for the transaction year yet
    Unavailable,
}

impl YearlyAmount {
    pub fn value(self) -> Option<Decimal> {
        match self {
            YearlyAmount::Value(value) => Some(value),
            YearlyAmount::Unavailable => None,
        }
    }
}

impl fmt::Display for YearlyAmount {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            YearlyAmount::Value(value) => write!(f, "{}", value),
            YearlyAmount::Unavailable => write!(f, "N/A"),
        }
    }
}

impl Serialize for YearlyAmount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            YearlyAmount::Value(value) => rust_decimal::serde::float::serialize(value, serializer),
            YearlyAmount::Unavailable => serializer.serialize_none(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValuedAmount {
    #[serde(with = "rust_decimal::serde::float")]
    pub original: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub daily: Decimal,
    pub yearly: YearlyAmount,
}

/// Home currency values of all money fields of a transaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Valuation {
    fields: Vec<(MoneyField, ValuedAmount)>,
}

impl Valuation {
    pub fn fields(&self) -> &[(MoneyField, ValuedAmount)] {
        &self.fields
    }

    pub fn get(&self, field: MoneyField) -> Option<&ValuedAmount> {
        self.fields.iter().find(|(name, _)| *name == field).map(|(_, amount)| amount)
    }

    pub fn amount(&self, field: MoneyField, choice: RateChoice) -> GenericResult<Decimal> {
        let amount = self.get(field).ok_or_else(|| format!(
            "The transaction has no {:?} field", field.to_string()))?;

        Ok(match choice {
            RateChoice::Daily => amount.daily,
            RateChoice::YearlyAverage => amount.yearly.value().ok_or_else(|| format!(
                "{} can't be converted using yearly average currency rate: it's unavailable yet",
                field))?,
        })
    }
}

impl Serialize for Valuation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (field, amount) in &self.fields {
            map.serialize_entry(field, amount)?;
        }
        map.end()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ValuatedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub valuation: Valuation,
}

impl Grouped for ValuatedTransaction {
    fn kind(&self) -> TransactionKind {
        self.transaction.kind()
    }
}

pub struct Valuator<'a> {
    rate_cache: &'a RateCache,
}

impl<'a> Valuator<'a> {
    pub fn new(rate_cache: &'a RateCache) -> Valuator<'a> {
        Valuator {rate_cache}
    }

    /// Converts every money field of the transaction using both daily and yearly average rates.
    ///
    /// Yearly average value is marked as unavailable if there are no yearly rates for the
    /// transaction year yet. A currency missing in a non-empty rate table is an error.
    pub fn valuate(&self, transaction: &Transaction) -> GenericResult<Valuation> {
        let currency = transaction.currency();
        let fields = transaction.money_fields();

        if currency == HOME_CURRENCY {
            return Ok(Valuation {
                fields: fields.into_iter().map(|(field, amount)| (field, ValuedAmount {
                    original: amount,
                    daily: amount,
                    yearly: YearlyAmount::Value(amount),
                })).collect(),
            });
        }

        let date = transaction.date();
        let daily_price = self.rate_cache.get_daily_rates(date)?.price(currency)?;

        let yearly_rates = self.rate_cache.get_yearly_rates(date.year())?;
        let yearly_price = if yearly_rates.is_empty() {
            None
        } else {
            Some(yearly_rates.price(currency)?)
        };

        let mut valuated = Vec::with_capacity(fields.len());

        for (field, amount) in fields {
            let convert = |price| util::checked_mul(amount, price).map_err(|e| format!(
                "Unable to convert {} to {}: {}", field, HOME_CURRENCY, e));

            valuated.push((field, ValuedAmount {
                original: amount,
                daily: convert(daily_price)?,
                yearly: match yearly_price {
                    Some(price) => YearlyAmount::Value(convert(price)?),
                    None => YearlyAmount::Unavailable,
                },
            }));
        }

        Ok(Valuation {fields: valuated})
    }

    /// Valuates the transactions in parallel preserving their order.
    pub fn valuate_all(&self, transactions: &[Transaction]) -> GenericResult<Vec<ValuatedTransaction>> {
        transactions.par_iter().map(|transaction| -> GenericResult<ValuatedTransaction> {
            let valuation = self.valuate(transaction)?;
            Ok(ValuatedTransaction {
                transaction: transaction.clone(),
                valuation,
            })
        }).collect()
    }
}

#[cfg(test)]
mod tests {
    use matches::assert_matches;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    use crate::currency::{RateKey, StaticProvider};
    use crate::currency::cnb::Cnb;
    use crate::errors::{MissingRateError, RateProviderError};
    use crate::transactions::tests::{deposit, dividend, sale};

    use super::*;

    fn new_cache(daily: &[(&'static str, Decimal)], yearly: &[(&'static str, Decimal)]) -> RateCache {
        RateCache::new(Box::new(StaticProvider::new(daily)), Box::new(StaticProvider::new(yearly)))
    }

    #[test]
    fn valuation() {
        let cache = new_cache(&[("USD", dec!(23.0))], &[("USD", dec!(22.5))]);
        let valuator = Valuator::new(&cache);

        let valuation = valuator.valuate(&dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15))).unwrap();
        assert_eq!(valuation.fields(), &[
            (MoneyField::Income, ValuedAmount {
                original: dec!(100),
                daily: dec!(2300),
                yearly: YearlyAmount::Value(dec!(2250)),
            }),
            (MoneyField::Tax, ValuedAmount {
                original: dec!(15),
                daily: dec!(345),
                yearly: YearlyAmount::Value(dec!(337.5)),
            }),
        ]);

        assert_eq!(valuation.amount(MoneyField::Income, RateChoice::Daily).unwrap(), dec!(2300));
        assert_eq!(valuation.amount(MoneyField::Income, RateChoice::YearlyAverage).unwrap(), dec!(2250));
        assert_matches!(valuation.amount(MoneyField::SalePrice, RateChoice::Daily), Err(_));
    }

    #[test]
    fn unavailable_yearly_rates() {
        let cache = new_cache(&[("USD", dec!(23.0))], &[]);
        let valuator = Valuator::new(&cache);

        let valuation = valuator.valuate(&sale(date!(2019, 3, 1), dec!(10), dec!(12))).unwrap();
        for (_, amount) in valuation.fields() {
            assert_eq!(amount.yearly, YearlyAmount::Unavailable);
            assert_eq!(amount.yearly.to_string(), "N/A");
        }

        assert_eq!(valuation.amount(MoneyField::SalePrice, RateChoice::Daily).unwrap(), dec!(276));
        assert_eq!(
            valuation.amount(MoneyField::SalePrice, RateChoice::YearlyAverage).unwrap_err().to_string(),
            "Sale price can't be converted using yearly average currency rate: it's unavailable yet");
    }

    #[test]
    fn missing_rate() {
        let cache = new_cache(&[("USD", dec!(23.0))], &[("EUR", dec!(25.6))]);
        let valuator = Valuator::new(&cache);

        let error = valuator.valuate(&dividend(date!(2019, 3, 1), "EUR", dec!(10), dec!(0))).unwrap_err();
        assert_eq!(error.downcast_ref::<MissingRateError>(), Some(&MissingRateError {
            currency: s!("EUR"),
            key: RateKey::Date(date!(2019, 3, 1)),
        }));

        let error = valuator.valuate(&dividend(date!(2019, 3, 1), "USD", dec!(10), dec!(0))).unwrap_err();
        assert_eq!(error.downcast_ref::<MissingRateError>(), Some(&MissingRateError {
            currency: s!("USD"),
            key: RateKey::Year(2019),
        }));
    }

    #[test]
    fn overflow() {
        let cache = new_cache(&[("USD", dec!(23.0))], &[("USD", dec!(22.5))]);
        let valuator = Valuator::new(&cache);

        let error = valuator.valuate(&dividend(date!(2019, 3, 1), "USD", Decimal::MAX, dec!(0))).unwrap_err();
        assert!(error.to_string().contains("Arithmetic overflow"), "{}", error);
    }

    #[test]
    fn home_currency() {
        let cache = new_cache(&[], &[]);
        let valuator = Valuator::new(&cache);

        let valuation = valuator.valuate(&dividend(date!(2019, 3, 1), "CZK", dec!(1000), dec!(150))).unwrap();
        assert_eq!(valuation.get(MoneyField::Tax), Some(&ValuedAmount {
            original: dec!(150),
            daily: dec!(150),
            yearly: YearlyAmount::Value(dec!(150)),
        }));
    }

    #[test]
    fn provider_error() {
        let mut server = Server::new();
        let _mock = server.mock("GET", mockito::Matcher::Any).with_status(503).create();

        let cache = RateCache::new(
            Box::new(Cnb::new(&server.url())), Box::new(StaticProvider::new(&[])));
        let valuator = Valuator::new(&cache);

        let error = valuator.valuate(&deposit(date!(2019, 3, 1), dec!(1000))).unwrap_err();
        let error = error.downcast_ref::<RateProviderError>().unwrap();
        assert_eq!(error.key, RateKey::Date(date!(2019, 3, 1)));
    }

    #[test]
    fn same_date_rates_requested_once() {
        let mut server = Server::new();
        let mock = server.mock("GET", "/cs/financni-trhy/devizovy-trh/kurzy-devizoveho-trhu/kurzy-devizoveho-trhu/denni_kurz.txt?date=01.03.2019")
            .with_status(200)
            .with_body("01.03.2019 #43\nzemě|měna|množství|kód|kurz\nUSA|dolar|1|USD|23,000\n")
            .expect(1)
            .create();

        let cache = RateCache::new(
            Box::new(Cnb::new(&server.url())), Box::new(StaticProvider::new(&[("USD", dec!(22.5))])));
        let valuator = Valuator::new(&cache);

        let transactions = vec![
            dividend(date!(2019, 3, 1), "USD", dec!(100), dec!(15)),
            deposit(date!(2019, 3, 1), dec!(10)),
        ];

        let valuated = valuator.valuate_all(&transactions).unwrap();
        mock.assert();

        assert_eq!(valuated.iter().map(|item| item.transaction.clone()).collect::<Vec<_>>(), transactions);
        assert_eq!(valuated[0].valuation.amount(MoneyField::Income, RateChoice::Daily).unwrap(), dec!(2300));
        assert_eq!(valuated[1].valuation.amount(MoneyField::Price, RateChoice::YearlyAverage).unwrap(), dec!(225));
    }
}
