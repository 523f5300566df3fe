//! Calendar date utilities.

#[cfg(feature = "postgres")]
use std::error::Error as StdError;
use std::{cmp::Ordering, fmt, marker::PhantomData, str::FromStr};

use derive_more::{Debug, Display, Error};
#[cfg(feature = "postgres")]
use postgres_types::{
    accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql, Type,
};
use time::{macros::format_description, Month};

/// Untyped calendar date.
pub type Date = DateOf;

/// Calendar date without a time zone.
#[derive(Debug)]
pub struct DateOf<Of: ?Sized = ()> {
    /// Inner representation of the date.
    inner: time::Date,

    /// Type parameter describing the kind of date.
    #[debug(skip)]
    _of: PhantomData<Of>,
}

/// Format of a [`Date`] in its [`String`] representation.
const FORMAT: &[time::format_description::FormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

impl<Of: ?Sized> DateOf<Of> {
    /// Creates a new [`Date`] from the provided calendar components.
    ///
    /// [`None`] is returned if the components don't form a valid date.
    #[must_use]
    pub fn from_ymd(year: i32, month: u8, day: u8) -> Option<Self> {
        let month = Month::try_from(month).ok()?;
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from_inner)
    }

    /// Creates a new [`Date`] in the provided `year` and `month` on the
    /// provided `day`, clamped to the last day of that month.
    ///
    /// [`None`] is returned if `month` is not in `1..=12` or `day` is `0`.
    #[must_use]
    pub fn clamped(year: i32, month: u8, day: u8) -> Option<Self> {
        if day == 0 {
            return None;
        }
        let month = Month::try_from(month).ok()?;
        let day = day.min(time::util::days_in_year_month(year, month));
        time::Date::from_calendar_date(year, month, day)
            .ok()
            .map(Self::from_inner)
    }

    /// Wraps the provided [`time::Date`].
    const fn from_inner(inner: time::Date) -> Self {
        Self {
            inner,
            _of: PhantomData,
        }
    }

    /// Returns the year of this [`Date`].
    #[must_use]
    pub fn year(&self) -> i32 {
        self.inner.year()
    }

    /// Returns the month of this [`Date`] in `1..=12` range.
    #[must_use]
    pub fn month(&self) -> u8 {
        self.inner.month().into()
    }

    /// Returns the day of month of this [`Date`].
    #[must_use]
    pub fn day(&self) -> u8 {
        self.inner.day()
    }

    /// Returns the number of days in the month of this [`Date`].
    #[must_use]
    pub fn days_in_month(&self) -> u8 {
        time::util::days_in_year_month(self.inner.year(), self.inner.month())
    }

    /// Returns the first day of the month of this [`Date`].
    #[must_use]
    pub fn first_of_month(self) -> Self {
        Self::from_inner(
            self.inner.replace_day(1).unwrap_or_else(|_| {
                unreachable!("every month has the first day")
            }),
        )
    }

    /// Shifts this [`Date`] by the provided number of calendar `months`,
    /// clamping the day to the length of the resulting month.
    ///
    /// [`None`] is returned on the year overflow.
    #[must_use]
    pub fn add_months(self, months: i32) -> Option<Self> {
        let index = i64::from(self.year()) * 12
            + i64::from(self.month() - 1)
            + i64::from(months);
        let year = i32::try_from(index.div_euclid(12)).ok()?;
        let month = u8::try_from(index.rem_euclid(12) + 1).ok()?;
        Self::clamped(year, month, self.day())
    }

    /// Shifts this [`Date`] by the provided number of `days`.
    ///
    /// [`None`] is returned on the date overflow.
    #[must_use]
    pub fn add_days(self, days: i64) -> Option<Self> {
        self.inner
            .checked_add(time::Duration::days(days))
            .map(Self::from_inner)
    }

    /// Coerces one kind of [`Date`] into another.
    #[must_use]
    pub fn coerce<NewOf: ?Sized>(self) -> DateOf<NewOf> {
        DateOf {
            inner: self.inner,
            _of: PhantomData,
        }
    }
}

impl<Of: ?Sized> Copy for DateOf<Of> {}
impl<Of: ?Sized> Clone for DateOf<Of> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Of: ?Sized> Eq for DateOf<Of> {}
impl<Of: ?Sized> PartialEq for DateOf<Of> {
    fn eq(&self, other: &Self) -> bool {
        self.inner == other.inner
    }
}

impl<Of: ?Sized> Ord for DateOf<Of> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.inner.cmp(&other.inner)
    }
}
impl<Of: ?Sized> PartialOrd for DateOf<Of> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<Of: ?Sized> std::hash::Hash for DateOf<Of> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.inner.hash(state);
    }
}

impl<Of: ?Sized> From<time::Date> for DateOf<Of> {
    fn from(date: time::Date) -> Self {
        Self::from_inner(date)
    }
}

impl<Of: ?Sized> From<DateOf<Of>> for time::Date {
    fn from(date: DateOf<Of>) -> Self {
        date.inner
    }
}

impl<Of: ?Sized> fmt::Display for DateOf<Of> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.inner.format(FORMAT).map_err(|_| fmt::Error)?;
        f.write_str(&s)
    }
}

impl<Of: ?Sized> FromStr for DateOf<Of> {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        time::Date::parse(s, FORMAT)
            .map(Self::from_inner)
            .map_err(ParseError)
    }
}

/// Error of parsing [`Date`] from a `YYYY-MM-DD` string.
#[derive(Clone, Copy, Debug, Display, Error)]
#[display("invalid `Date`: {_0}")]
pub struct ParseError(time::error::Parse);

#[cfg(feature = "postgres")]
impl<Of: ?Sized> FromSql<'_> for DateOf<Of> {
    accepts!(DATE);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        time::Date::from_sql(ty, raw).map(Self::from_inner)
    }
}

#[cfg(feature = "postgres")]
impl<Of: ?Sized> ToSql for DateOf<Of> {
    accepts!(DATE);
    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        w: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.inner.to_sql(ty, w)
    }
}

#[cfg(feature = "juniper")]
mod juniper {
    //! Module providing integration with [`juniper`] crate.

    use std::str::FromStr as _;

    use juniper::{graphql_scalar, InputValue, ScalarValue, Value};

    /// Calendar date in a `YYYY-MM-DD` format.
    #[graphql_scalar(with = Self, parse_token(String))]
    type Date = crate::Date;

    impl Date {
        fn to_output<S: ScalarValue>(d: &Date) -> Value<S> {
            Value::scalar(d.to_string())
        }

        fn from_input<S: ScalarValue>(
            input: &InputValue<S>,
        ) -> Result<Self, String> {
            input
                .as_string_value()
                .ok_or_else(|| {
                    format!(
                        "Cannot parse `Date` input scalar from \
                         non-string value: {input}",
                    )
                })
                .and_then(|s| {
                    Self::from_str(s).map_err(|e| {
                        format!("Cannot parse `Date` input scalar: {e}")
                    })
                })
        }
    }
}

#[cfg(test)]
mod spec {
    use super::Date;

    fn date(s: &str) -> Date {
        s.parse().unwrap()
    }

    #[test]
    fn parses_and_formats() {
        let d = date("2026-02-28");
        assert_eq!((d.year(), d.month(), d.day()), (2026, 2, 28));
        assert_eq!(d.to_string(), "2026-02-28");

        assert!("2026-02-30".parse::<Date>().is_err());
        assert!("28.02.2026".parse::<Date>().is_err());
    }

    #[test]
    fn clamps_day_to_month_length() {
        assert_eq!(Date::clamped(2026, 2, 31), Some(date("2026-02-28")));
        assert_eq!(Date::clamped(2028, 2, 30), Some(date("2028-02-29")));
        assert_eq!(Date::clamped(2026, 4, 31), Some(date("2026-04-30")));
        assert_eq!(Date::clamped(2026, 1, 31), Some(date("2026-01-31")));
        assert_eq!(Date::clamped(2026, 13, 1), None);
        assert_eq!(Date::clamped(2026, 1, 0), None);
    }

    #[test]
    fn adds_months() {
        assert_eq!(date("2026-01-31").add_months(1), Some(date("2026-02-28")));
        assert_eq!(date("2026-01-15").add_months(-1), Some(date("2025-12-15")));
        assert_eq!(date("2026-11-30").add_months(3), Some(date("2027-02-28")));
        assert_eq!(date("2026-06-01").add_months(12), Some(date("2027-06-01")));
    }

    #[test]
    fn adds_days() {
        assert_eq!(date("2026-12-31").add_days(1), Some(date("2027-01-01")));
        assert_eq!(date("2026-03-01").add_days(-1), Some(date("2026-02-28")));
        assert_eq!(date("2026-10-19").add_days(30), Some(date("2026-11-18")));
    }

    #[test]
    fn month_helpers() {
        assert_eq!(date("2026-02-14").days_in_month(), 28);
        assert_eq!(date("2026-02-14").first_of_month(), date("2026-02-01"));
    }
}
