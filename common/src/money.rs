//! [`Money`]-related definitions.

use std::{fmt, str::FromStr};

use rust_decimal::{prelude::ToPrimitive as _, Decimal};

use crate::define_kind;

/// Amount of money in some [`Currency`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Money {
    /// Amount of this [`Money`].
    pub amount: Decimal,

    /// [`Currency`] of this amount.
    pub currency: Currency,
}

impl Money {
    /// Creates a zero [`Money`] amount in the provided [`Currency`].
    #[must_use]
    pub const fn zero(currency: Currency) -> Self {
        Self {
            amount: Decimal::ZERO,
            currency,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { amount, currency } = self;
        if amount.is_integer() {
            write!(f, "{}{currency}", amount.to_i128().expect("integer"))
        } else {
            write!(f, "{amount}{currency}")
        }
    }
}

impl FromStr for Money {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() < 4 {
            return Err("too short");
        }

        let (amount, currency) = s.split_at(s.len() - 3);
        let amount = Decimal::from_str(amount).map_err(|_| "invalid amount")?;
        let currency =
            Currency::from_str(currency).map_err(|_| "invalid currency")?;

        Ok(Self { amount, currency })
    }
}

define_kind! {
    #[doc = "Currency of a [`Money`] amount."]
    enum Currency {
        #[doc = "Indian Rupee."]
        Inr = 1,

        #[doc = "UAE Dirham."]
        Aed = 2,
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Money in `{major}.{minor}{currency}` format, where:
    /// - `major` is an integer;
    /// - `minor` is an optional integer;
    /// - `currency` is a three-letter currency code.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Money = super::Money;

    impl Money {
        fn to_output<S: ScalarValue>(m: &Money) -> Value<S> {
            Value::scalar(m.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Money` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Money` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use std::str::FromStr as _;

    use rust_decimal::Decimal;

    use super::{Currency, Money};

    fn decimal(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn from_str() {
        assert_eq!(
            Money::from_str("30000.50INR").unwrap(),
            Money {
                amount: decimal("30000.50"),
                currency: Currency::Inr,
            },
        );

        assert_eq!(
            Money::from_str("8500AED").unwrap(),
            Money {
                amount: decimal("8500"),
                currency: Currency::Aed,
            },
        );

        assert!(Money::from_str("123.45").is_err());
        assert!(Money::from_str("123.45In").is_err());
        assert!(Money::from_str("123.45USD").is_err());
        assert!(Money::from_str("123.45Rupees").is_err());

        assert!(Money::from_str("123.00INR").is_ok());
        assert!(Money::from_str("123.0AED").is_ok());
        assert!(Money::from_str("123INR").is_ok());
    }

    #[test]
    fn to_string() {
        assert_eq!(
            Money {
                amount: decimal("123.45"),
                currency: Currency::Inr,
            }
            .to_string(),
            "123.45INR",
        );
        assert_eq!(
            Money {
                amount: decimal("20000.00"),
                currency: Currency::Inr,
            }
            .to_string(),
            "20000INR",
        );
        assert_eq!(
            Money {
                amount: decimal("8500.0"),
                currency: Currency::Aed,
            }
            .to_string(),
            "8500AED",
        );
    }

    #[test]
    fn zero() {
        assert_eq!(Money::zero(Currency::Aed).to_string(), "0AED");
    }
}
