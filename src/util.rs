use std::error::Error;
use std::str::FromStr;

use rust_decimal::RoundingStrategy;

use crate::core::GenericResult;
use crate::types::Decimal;

pub enum DecimalRestrictions {
    No,
    PositiveOrZero,
    StrictlyPositive,
}

pub fn parse_decimal(string: &str, restrictions: DecimalRestrictions) -> GenericResult<Decimal> {
    let value = Decimal::from_str(string).map_err(|_| format!("Invalid decimal value: {:?}", string))?;
    validate_decimal(value, restrictions)
}

pub fn validate_decimal(value: Decimal, restrictions: DecimalRestrictions) -> GenericResult<Decimal> {
    if !match restrictions {
        DecimalRestrictions::No => true,
        DecimalRestrictions::PositiveOrZero => value.is_zero() || value.is_sign_positive(),
        DecimalRestrictions::StrictlyPositive => !value.is_zero() && value.is_sign_positive(),
    } {
        return Err!("The value doesn't comply to the specified restrictions: {}", value);
    }

    Ok(value)
}

pub fn round(value: Decimal) -> Decimal {
    round_to(value, 2)
}

pub fn round_to(value: Decimal, points: u32) -> Decimal {
    let mut value = value.round_dp_with_strategy(points, RoundingStrategy::MidpointAwayFromZero);

    if value.is_zero() && value.is_sign_negative() {
        value = -value;
    }

    value.normalize()
}

pub fn checked_mul(a: Decimal, b: Decimal) -> GenericResult<Decimal> {
    Ok(a.checked_mul(b).ok_or_else(|| format!("Arithmetic overflow: {} * {}", a, b))?)
}

pub fn checked_add(a: Decimal, b: Decimal) -> GenericResult<Decimal> {
    Ok(a.checked_add(b).ok_or_else(|| format!("Arithmetic overflow: {} + {}", a, b))?)
}

pub fn checked_sub(a: Decimal, b: Decimal) -> GenericResult<Decimal> {
    Ok(a.checked_sub(b).ok_or_else(|| format!("Arithmetic overflow: {} - {}", a, b))?)
}

pub fn checked_sum<I: IntoIterator<Item = Decimal>>(values: I) -> GenericResult<Decimal> {
    values.into_iter().try_fold(Decimal::ZERO, checked_add)
}

pub fn humanize_reqwest_error(err: reqwest::Error) -> String {
    // The underlying reason is hidden in the source chain
    let mut message = err.to_string();
    let mut source = err.source();

    while let Some(err) = source {
        message = format!("{}: {}", message, err);
        source = err.source();
    }

    message
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use super::*;

    #[rstest(value, expected,
        case(dec!(2250), dec!(2250)),
        case(dec!(337.5), dec!(337.5)),
        case(dec!(1.005), dec!(1.01)),
        case(dec!(-1.005), dec!(-1.01)),
        case(dec!(-0.001), dec!(0)),
    )]
    fn rounding(value: Decimal, expected: Decimal) {
        assert_eq!(round(value), expected);
    }

    #[rstest(value, restrictions, valid,
        case("0", DecimalRestrictions::PositiveOrZero, true),
        case("-1", DecimalRestrictions::PositiveOrZero, false),
        case("0", DecimalRestrictions::StrictlyPositive, false),
        case("22,5", DecimalRestrictions::No, false),
    )]
    fn decimal_parsing(value: &str, restrictions: DecimalRestrictions, valid: bool) {
        assert_eq!(parse_decimal(value, restrictions).is_ok(), valid);
    }

    #[test]
    fn overflow() {
        assert_eq!(checked_sum([dec!(1.5), dec!(2), dec!(0.25)]).unwrap(), dec!(3.75));
        assert_eq!(checked_mul(dec!(100), dec!(22.5)).unwrap(), dec!(2250));

        assert!(checked_sum([Decimal::MAX, dec!(1)]).is_err());
        assert!(checked_mul(Decimal::MAX, dec!(23)).is_err());
        assert!(checked_sub(Decimal::MIN, dec!(1)).is_err());
    }
}
