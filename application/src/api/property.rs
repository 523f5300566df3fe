//! [`Property`]-related definitions.

use common::{money, DateTime};
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLEnum, GraphQLScalar};
use service::{domain, query, Query as _};
use uuid::Uuid;

use crate::{api, api::scalar, AsError, Context, Error};

/// A rented out property.
#[derive(Clone, Debug, From, Into)]
pub struct Property(domain::Property);

/// A rented out property.
#[graphql_object(context = Context)]
impl Property {
    /// Unique identifier of this `Property`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Property`.
    #[must_use]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Country this `Property` is located in.
    #[must_use]
    pub fn country(&self) -> Country {
        self.0.country.into()
    }

    /// Currency all the amounts of this `Property` are tracked in.
    #[must_use]
    pub fn currency(&self) -> Currency {
        self.0.currency.into()
    }

    /// Current occupancy of this `Property`.
    #[must_use]
    pub fn occupancy(&self) -> Occupancy {
        self.0.occupancy.into()
    }

    /// `DateTime` when this `Property` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }

    /// `Lease`s of this `Property`, including the archived ones.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "Property.leases",
            otel.name = api::Query::SPAN_NAME,
        ),
    )]
    pub async fn leases(
        &self,
        ctx: &Context,
    ) -> Result<Vec<api::Lease>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::lease::ByProperty {
                caller,
                property_id: self.0.id,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .unwrap_or_default()
            .into_iter()
            .map(Into::into)
            .collect())
    }
}

/// Unique identifier of a `Property`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::property::Id)]
#[into(domain::property::Id)]
#[graphql(name = "PropertyId", transparent)]
pub struct Id(Uuid);

/// Name of a `Property`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(
    name = "PropertyName",
    with = scalar::Via::<domain::property::Name>,
)]
pub struct Name(domain::property::Name);

/// Country a `Property` is located in.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyCountry")]
pub enum Country {
    /// India.
    India,

    /// United Arab Emirates.
    Uae,
}

impl From<domain::property::Country> for Country {
    fn from(country: domain::property::Country) -> Self {
        use domain::property::Country as C;
        match country {
            C::India => Self::India,
            C::Uae => Self::Uae,
        }
    }
}

impl From<Country> for domain::property::Country {
    fn from(country: Country) -> Self {
        match country {
            Country::India => Self::India,
            Country::Uae => Self::Uae,
        }
    }
}

/// Currency amounts are tracked in.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
pub enum Currency {
    /// Indian Rupee.
    Inr,

    /// UAE Dirham.
    Aed,
}

impl From<money::Currency> for Currency {
    fn from(currency: money::Currency) -> Self {
        use money::Currency as C;
        match currency {
            C::Inr => Self::Inr,
            C::Aed => Self::Aed,
        }
    }
}

impl From<Currency> for money::Currency {
    fn from(currency: Currency) -> Self {
        match currency {
            Currency::Inr => Self::Inr,
            Currency::Aed => Self::Aed,
        }
    }
}

/// Occupancy of a `Property`.
#[derive(Clone, Copy, Debug, GraphQLEnum)]
#[graphql(name = "PropertyOccupancy")]
pub enum Occupancy {
    /// No `Lease` is currently active.
    Vacant,

    /// At least one `Lease` is currently active.
    Occupied,
}

impl From<domain::property::Occupancy> for Occupancy {
    fn from(occupancy: domain::property::Occupancy) -> Self {
        use domain::property::Occupancy as O;
        match occupancy {
            O::Vacant => Self::Vacant,
            O::Occupied => Self::Occupied,
        }
    }
}

impl AsError for domain::property::AmountError {
    fn try_as_error(&self) -> Option<Error> {
        let error = match self {
            Self::CurrencyMismatch { .. } => {
                api::ReconciliationError::CurrencyMismatch
            }
            Self::NotPositive(_) => api::ReconciliationError::InvalidAmount,
        };
        Some(Error::from(error).with_message(self))
    }
}
