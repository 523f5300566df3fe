//! Access scope definitions.

#[cfg(doc)]
use common::DateTime;
use common::{define_kind, DateTimeOf};
use derive_more::{AsRef, Display, FromStr};
use serde::{Deserialize, Serialize};

use crate::domain::account;
#[cfg(doc)]
use crate::domain::Property;

/// Authenticated caller of the service.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Caller {
    /// ID of the account performing the call.
    pub account_id: account::Id,

    /// [`Role`] the account acts in.
    pub role: Role,
}

impl Caller {
    /// Creates a new [`Caller`] acting as a [`Role::Owner`].
    #[must_use]
    pub const fn owner(account_id: account::Id) -> Self {
        Self {
            account_id,
            role: Role::Owner,
        }
    }

    /// Creates a new [`Caller`] acting as a [`Role::Manager`].
    #[must_use]
    pub const fn manager(account_id: account::Id) -> Self {
        Self {
            account_id,
            role: Role::Manager,
        }
    }
}

define_kind! {
    #[doc = "Role of a [`Caller`]."]
    enum Role {
        #[doc = "Direct owner scope: sees the [`Property`]s it owns."]
        Owner = 1,

        #[doc = "Scoped delegate: sees the [`Property`]s it was granted."]
        Manager = 2,
    }
}

/// Claims of an access [`Token`] issued by the external access-control
/// system.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Claims {
    /// ID of the account the [`Token`] was issued to.
    #[serde(rename = "sub")]
    pub account_id: account::Id,

    /// [`Role`] of the account, as its `SCREAMING_SNAKE_CASE` name.
    pub role: String,

    /// [`DateTime`] when the [`Token`] expires.
    #[serde(rename = "exp", with = "common::datetime::serde::unix_timestamp")]
    pub expires_at: ExpirationDateTime,
}

/// Access token presented by a [`Caller`].
#[derive(AsRef, Clone, Debug, Display, FromStr)]
#[as_ref(str)]
pub struct Token(String);

impl Token {
    /// Creates a new [`Token`] without checking its contents.
    ///
    /// # Safety
    ///
    /// The provided `token` must be a valid [`Token`] representation.
    #[expect(unsafe_code, reason = "bypass")]
    #[must_use]
    pub const unsafe fn new_unchecked(token: String) -> Self {
        Self(token)
    }
}

/// Marker type describing a [`Token`] expiration.
#[derive(Clone, Copy, Debug)]
pub struct Expiration;

/// [`DateTime`] of a [`Token`] expiration.
pub type ExpirationDateTime = DateTimeOf<(Token, Expiration)>;
