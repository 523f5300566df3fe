//! GraphQL [`Query`]s definitions.

use juniper::graphql_object;
use service::{query, Query as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL queries.
#[derive(Clone, Copy, Debug)]
pub struct Query;

impl Query {
    /// Name of the [`tracing::Span`] for the queries.
    pub(crate) const SPAN_NAME: &'static str = "GraphQL query";
}

#[graphql_object(context = Context)]
impl Query {
    /// Returns all the non-archived `Property`s accessible by the caller.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "properties",
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn properties(
        ctx: &Context,
    ) -> Result<Vec<api::Property>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::property::List::by(caller))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Returns the `Property` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Property` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "property",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn property(
        id: api::property::Id,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(query::property::ById::by((id.into(), caller)))
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| {
                api::ReconciliationError::NotFound.because(
                    &format!("`Property(id: {id})` does not exist"),
                )
            })
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns the `Lease` with the specified ID.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "lease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        api::lease::fetch(id.into(), ctx).await.map(Into::into)
    }

    /// Returns all the `Lease`s of the specified `Property`, including the
    /// archived ones.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Property` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "leases",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn leases(
        property_id: api::property::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Lease>, Error> {
        Self::property(property_id, ctx).await?.leases(ctx).await
    }

    /// Returns the rent schedule of the specified `Lease`, ordered by due
    /// date.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "schedule",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn schedule(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<Vec<api::schedule::Entry>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::schedule::ByLease {
                caller,
                lease_id: lease_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::lease::not_found(lease_id))
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Returns the balance of the rent schedule of the specified `Lease`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "leaseBalance",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn lease_balance(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::lease::Balance, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(query::lease::Balance {
                caller,
                lease_id: lease_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::lease::not_found(lease_id))
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Returns all the `Payment`s of the specified `Lease`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "payments",
            lease_id = %lease_id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn payments(
        lease_id: api::lease::Id,
        ctx: &Context,
    ) -> Result<Vec<api::Payment>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::payment::ByLease {
                caller,
                lease_id: lease_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| api::lease::not_found(lease_id))
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Returns the schedule matches of the specified `Payment`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Payment` doesn't exist or is not accessible.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "paymentMatches",
            otel.name = Self::SPAN_NAME,
            payment_id = %payment_id,
        ),
    )]
    pub async fn payment_matches(
        payment_id: api::payment::Id,
        ctx: &Context,
    ) -> Result<Vec<api::payment::Match>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::payment::Matches {
                caller,
                payment_id: payment_id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .ok_or_else(|| {
                api::ReconciliationError::NotFound.because(
                    &format!("`Payment(id: {payment_id})` does not exist"),
                )
            })
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Returns the `Cheque`s awaiting clearance and dated within the
    /// specified number of days from today, ordered by date.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `INVALID_RANGE` - `withinDays` is negative or too large.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "upcomingCheques",
            otel.name = Self::SPAN_NAME,
            within_days = within_days,
        ),
    )]
    pub async fn upcoming_cheques(
        #[graphql(default = 30)] within_days: i32,
        ctx: &Context,
    ) -> Result<Vec<api::Cheque>, Error> {
        let within_days = u16::try_from(within_days)
            .map_err(|e| {
                api::ReconciliationError::InvalidRange
                    .because(&format!("invalid `withinDays`: {e}"))
            })
            .map_err(ctx.error())?;

        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(query::cheque::Upcoming {
                caller,
                within_days,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }
}
