use chrono::Local;
use serde::Deserialize;
use serde::de::{Deserializer, Error};

use crate::core::GenericResult;
use crate::types::Date;

pub fn today() -> Date {
    Local::now().date_naive()
}

pub fn parse_date(date: &str, format: &str) -> GenericResult<Date> {
    Ok(Date::parse_from_str(date, format).map_err(|_| format!(
        "Invalid date: {:?}", date))?)
}

pub fn parse_user_date(date: &str) -> GenericResult<Date> {
    parse_date(date, "%Y-%m-%d")
        .or_else(|_| parse_date(date, "%Y.%m.%d"))
        .or_else(|_| parse_date(date, "%d.%m.%Y"))
}

pub fn deserialize_date<'de, D>(deserializer: D) -> Result<Date, D::Error>
    where D: Deserializer<'de>
{
    let date: String = Deserialize::deserialize(deserializer)?;
    parse_user_date(&date).map_err(D::Error::custom)
}

pub fn year_range(year: i32) -> GenericResult<(Date, Date)> {
    let start = Date::from_ymd_opt(year, 1, 1);
    let end = Date::from_ymd_opt(year, 12, 31);

    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err!("Invalid year: {}", year),
    }
}
