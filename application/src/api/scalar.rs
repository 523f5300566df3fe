//! GraphQL scalar definitions.

use std::{fmt, marker::PhantomData, str::FromStr};

use juniper::{
    GraphQLType, InputValue, ParseScalarResult, ParseScalarValue, ScalarToken,
    ScalarValue, Value,
};

/// Helper type to use in `#[graphql(with = ..)]` attribute of string-like
/// scalars wrapping a validated domain value.
///
/// Uses [`FromStr`]/[`Display`] impls of the `As` domain type to convert the
/// target type to/from GraphQL scalar, so the validation rules of the domain
/// are applied to the input as is.
///
/// Target type must implement [`TryFrom`] and [`AsRef`] for `As` type.
///
/// [`Display`]: fmt::Display
#[derive(Debug)]
pub struct Via<As>(PhantomData<As>);

impl<As> Via<As> {
    /// Converts the target type into scalar [`Value`] by using [`Display`]
    /// impl of `As` type.
    ///
    /// [`Display`]: fmt::Display
    pub fn to_output<T, S>(value: &T) -> Value<S>
    where
        As: fmt::Display,
        T: AsRef<As>,
        S: ScalarValue,
    {
        Value::from(value.as_ref().to_string())
    }

    /// Constructs the target type from scalar [`Value`] by using [`FromStr`]
    /// impl of `As` type.
    ///
    /// # Errors
    ///
    /// If the input value is not a string, or isn't a valid `As` value.
    pub fn from_input<T, S>(input: &InputValue<S>) -> Result<T, String>
    where
        As: FromStr + fmt::Display,
        As::Err: fmt::Display,
        T: TryFrom<As> + GraphQLType<S, TypeInfo = ()>,
        T::Error: fmt::Display,
        S: ScalarValue,
    {
        let name = T::name(&()).unwrap_or("scalar");
        let s = input.as_string_value().ok_or_else(|| {
            format!("`{name}` must be a string, found: {input}")
        })?;
        s.parse::<As>()
            .map_err(|e| format!("\"{s}\" is not a valid `{name}`: {e}"))?
            .try_into()
            .map_err(|e| format!("\"{s}\" is not a valid `{name}`: {e}"))
    }

    /// Parses the provided [`ScalarToken`].
    ///
    /// # Errors
    ///
    /// If the token cannot be parsed as [`String`].
    pub fn parse_token<S: ScalarValue>(
        value: ScalarToken<'_>,
    ) -> ParseScalarResult<S> {
        <String as ParseScalarValue<S>>::from_str(value)
    }
}

#[cfg(test)]
mod spec {
    use juniper::{DefaultScalarValue, InputValue};
    use rust_decimal::Decimal;

    use crate::api::payment::Amount;

    use super::Via;

    fn parse(input: &InputValue) -> Result<Amount, String> {
        Via::<Decimal>::from_input::<Amount, DefaultScalarValue>(input)
    }

    #[test]
    fn parses_exact_decimals_from_strings() {
        let amount = parse(&InputValue::scalar("1500.50")).unwrap();
        assert_eq!(*amount.as_ref(), "1500.50".parse::<Decimal>().unwrap());
    }

    #[test]
    fn rejects_non_string_and_malformed_input() {
        let err = parse(&InputValue::scalar(1500)).unwrap_err();
        assert!(err.contains("must be a string"), "{err}");

        let err = parse(&InputValue::scalar("1,500")).unwrap_err();
        assert!(err.starts_with("\"1,500\" is not a valid `Amount`"), "{err}");
    }
}
