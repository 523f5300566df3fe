//! [`Clock`] definitions.

use std::fmt;

use common::{Date, DateTime};

/// Source of the current [`Date`].
pub trait Clock: fmt::Debug + Send + Sync {
    /// Returns the current [`Date`].
    fn today(&self) -> Date;
}

/// [`Clock`] reading the current UTC date from the system.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> Date {
        DateTime::now().date()
    }
}

/// [`Clock`] always returning the same [`Date`].
#[derive(Clone, Copy, Debug)]
pub struct FixedClock(pub Date);

impl Clock for FixedClock {
    fn today(&self) -> Date {
        self.0
    }
}
