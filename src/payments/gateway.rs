//! Currency-aware minor unit conversion

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::{GatewayError, GatewayResult};
use crate::payments::traits::GatewayAdapter;

/// ISO 4217 currencies without a minor unit
const ZERO_DECIMAL_CURRENCIES: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "JPY", "KMF", "KRW", "PYG", "RWF", "UGX", "UYI", "VND",
    "VUV", "XAF", "XOF", "XPF",
];

/// ISO 4217 currencies with three decimal places
const THREE_DECIMAL_CURRENCIES: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];

/// Number of decimal places of an ISO 4217 currency
pub fn currency_exponent(currency: &str) -> u32 {
    let code = currency.trim().to_ascii_uppercase();
    if ZERO_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        0
    } else if THREE_DECIMAL_CURRENCIES.contains(&code.as_str()) {
        3
    } else {
        2
    }
}

/// Gateway adapter bound to a single site currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyGateway {
    currency: String,
    decimal_places: u32,
    sandbox: bool,
}

impl CurrencyGateway {
    pub fn new<C: Into<String>>(currency: C, sandbox: bool) -> Self {
        let currency = currency.into();
        let decimal_places = currency_exponent(&currency);
        Self {
            currency,
            decimal_places,
            sandbox,
        }
    }

    /// Force a decimal-place count, for sites that configure their own
    pub fn with_decimal_places(mut self, decimal_places: u32) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn decimal_places(&self) -> u32 {
        self.decimal_places
    }
}

impl GatewayAdapter for CurrencyGateway {
    fn to_minor_units(&self, amount: Decimal) -> GatewayResult<i64> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(GatewayError::invalid_amount(format!(
                "{} {} is negative",
                amount, self.currency
            )));
        }

        let factor = 10_i64
            .checked_pow(self.decimal_places)
            .map(Decimal::from)
            .ok_or_else(|| {
                GatewayError::invalid_amount(format!(
                    "{} decimal places is out of range",
                    self.decimal_places
                ))
            })?;

        amount
            .checked_mul(factor)
            .map(|scaled| scaled.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
            .and_then(|scaled| scaled.to_i64())
            .ok_or_else(|| {
                GatewayError::invalid_amount(format!(
                    "{} {} does not fit in minor units",
                    amount, self.currency
                ))
            })
    }

    fn is_sandbox(&self) -> bool {
        self.sandbox
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_two_decimal_currency() {
        let gateway = CurrencyGateway::new("USD", true);
        assert_eq!(gateway.to_minor_units(dec!(12.50)).unwrap(), 1250);
        assert_eq!(gateway.to_minor_units(dec!(0)).unwrap(), 0);
        assert!(gateway.is_sandbox());
    }

    #[test]
    fn test_zero_and_three_decimal_currencies() {
        assert_eq!(
            CurrencyGateway::new("jpy", false)
                .to_minor_units(dec!(1500))
                .unwrap(),
            1500
        );
        assert_eq!(
            CurrencyGateway::new("KWD", false)
                .to_minor_units(dec!(1.234))
                .unwrap(),
            1234
        );
    }

    #[test]
    fn test_rounds_half_away_from_zero() {
        let gateway = CurrencyGateway::new("CAD", false);
        assert_eq!(gateway.to_minor_units(dec!(10.005)).unwrap(), 1001);
        assert_eq!(gateway.to_minor_units(dec!(10.004)).unwrap(), 1000);
    }

    #[test]
    fn test_decimal_place_override() {
        let gateway = CurrencyGateway::new("USD", false).with_decimal_places(0);
        assert_eq!(gateway.decimal_places(), 0);
        assert_eq!(gateway.to_minor_units(dec!(12.50)).unwrap(), 13);
    }

    #[test]
    fn test_negative_amount_is_rejected() {
        let gateway = CurrencyGateway::new("USD", false);
        let err = gateway.to_minor_units(dec!(-1.00)).unwrap_err();
        assert!(!err.is_retryable());
        assert!(err.to_string().contains("negative"));
    }
}
