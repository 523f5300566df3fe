//! GraphQL [`Mutation`]s definitions.

use common::{Date, Money};
use juniper::graphql_object;
use service::{command, domain, Command as _};

use crate::{api, AsError, Context, Error};

/// Root of all GraphQL mutations.
#[derive(Clone, Copy, Debug)]
pub struct Mutation;

impl Mutation {
    /// Name of the [`tracing::Span`] for the mutations.
    const SPAN_NAME: &'static str = "GraphQL mutation";
}

#[graphql_object(context = Context)]
impl Mutation {
    /// Creates a new `Property` owned by the caller.
    ///
    /// `currency` defaults to the one of the `country`.
    #[tracing::instrument(
        skip_all,
        fields(
            country = ?country,
            gql.name = "createProperty",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_property(
        name: api::property::Name,
        country: api::property::Country,
        currency: Option<api::property::Currency>,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::CreateProperty {
                caller,
                name: name.into(),
                country: country.into(),
                currency: currency.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Tenant` with the provided contact info.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "createTenant",
            name = %name,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_tenant(
        name: api::tenant::Name,
        email: Option<api::tenant::Email>,
        phone: Option<api::tenant::Phone>,
        ctx: &Context,
    ) -> Result<api::Tenant, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::CreateTenant {
                caller,
                name: name.into(),
                email: email.map(Into::into),
                phone: phone.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Creates a new `Lease` of the `Property` and generates its rent
    /// schedule.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Property` or the `Tenant` doesn't exist;
    /// - `INVALID_RANGE` - `endDate` is not after `startDate`, or `dueDay`
    ///                     is not in `1..=31` range;
    /// - `OVERLAP` - the `Lease` overlaps another non-archived one;
    /// - `CURRENCY_MISMATCH` - amounts are not in the `Property` currency;
    /// - `INVALID_AMOUNT` - amounts are not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            end_date = %end_date,
            gql.name = "createLease",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
            start_date = %start_date,
            tenant_id = %tenant_id,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn create_lease(
        property_id: api::property::Id,
        tenant_id: api::tenant::Id,
        start_date: Date,
        end_date: Date,
        frequency: api::lease::Frequency,
        rent: Money,
        due_day: i32,
        security_deposit: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let due_day = api::lease::due_day(due_day).map_err(ctx.error())?;

        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::CreateLease {
                caller,
                property_id: property_id.into(),
                tenant_id: tenant_id.into(),
                start: start_date,
                end: end_date,
                frequency: frequency.into(),
                rent,
                due_day,
                security_deposit,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Updates the terms of the `Lease`.
    ///
    /// Changing the period, frequency, rent or due day regenerates the rent
    /// schedule, dropping all its `Payment` matches.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is archived;
    /// - `INVALID_RANGE` - `endDate` is not after `startDate`, `dueDay` is
    ///                     not in `1..=31` range, or the new period excludes
    ///                     the termination date;
    /// - `OVERLAP` - the `Lease` overlaps another non-archived one;
    /// - `CURRENCY_MISMATCH` - amounts are not in the `Property` currency;
    /// - `INVALID_AMOUNT` - amounts are not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    #[expect(clippy::too_many_arguments, reason = "GraphQL arguments")]
    pub async fn update_lease(
        id: api::lease::Id,
        start_date: Option<Date>,
        end_date: Option<Date>,
        frequency: Option<api::lease::Frequency>,
        rent: Option<Money>,
        due_day: Option<i32>,
        security_deposit: Option<Money>,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let due_day = due_day
            .map(api::lease::due_day)
            .transpose()
            .map_err(ctx.error())?;

        let caller = ctx.caller().await?;
        let mut cmd = command::UpdateLease::new(caller, id.into());
        cmd.start = start_date;
        cmd.end = end_date;
        cmd.frequency = frequency.map(Into::into);
        cmd.rent = rent;
        cmd.due_day = due_day;
        cmd.security_deposit = security_deposit;

        ctx.service()
            .execute(cmd)
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Terminates the `Lease` early on the provided date.
    ///
    /// The rent schedule is left as is.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is archived;
    /// - `INVALID_TRANSITION` - the `Lease` is terminated already;
    /// - `INVALID_RANGE` - `date` is outside the `Lease` period.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date,
            gql.name = "terminateLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn terminate_lease(
        id: api::lease::Id,
        date: Date,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::TerminateLease {
                caller,
                lease_id: id.into(),
                date,
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Archives the `Lease`, so it no longer affects the `Property`
    /// occupancy.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "archiveLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn archive_lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::ArchiveLease {
                caller,
                lease_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Restores the archived `Lease`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist;
    /// - `OVERLAP` - the `Lease` overlaps another non-archived one.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "restoreLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn restore_lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::RestoreLease {
                caller,
                lease_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Deletes the `Lease` along with its rent schedule, `Cheque`s and
    /// `Payment`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deleteLease",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_lease(
        id: api::lease::Id,
        ctx: &Context,
    ) -> Result<api::Lease, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::DeleteLease {
                caller,
                lease_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Recomputes the occupancy of the `Property` from its `Lease`s.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Property` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            excluded_lease_id = ?excluded_lease_id,
            gql.name = "recomputeOccupancy",
            otel.name = Self::SPAN_NAME,
            property_id = %property_id,
        ),
    )]
    pub async fn recompute_occupancy(
        property_id: api::property::Id,
        excluded_lease_id: Option<api::lease::Id>,
        ctx: &Context,
    ) -> Result<api::Property, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::RecomputeOccupancy {
                caller,
                property_id: property_id.into(),
                excluded_lease: excluded_lease_id.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records a new `Cheque` received for the `Lease`.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is archived;
    /// - `CURRENCY_MISMATCH` - `amount` is not in the `Property` currency;
    /// - `INVALID_AMOUNT` - `amount` is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date,
            gql.name = "createCheque",
            lease_id = %lease_id,
            number = %number,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_cheque(
        lease_id: api::lease::Id,
        number: api::cheque::Number,
        bank_name: api::cheque::BankName,
        date: Date,
        amount: Money,
        covers_period: Option<api::cheque::CoversPeriod>,
        ctx: &Context,
    ) -> Result<api::Cheque, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::CreateCheque {
                caller,
                lease_id: lease_id.into(),
                number: number.into(),
                bank_name: bank_name.into(),
                date,
                amount,
                covers_period: covers_period.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Moves the `Cheque` to the provided `ChequeStatus`.
    ///
    /// Clearing the `Cheque` records a `Payment` and auto-matches it against
    /// the rent schedule. If recording fails, the `Cheque` stays cleared and
    /// the `warning` is returned instead.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Cheque` or the replacing one doesn't exist;
    /// - `INVALID_TRANSITION` - the `Cheque` cannot move to `status`.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "updateChequeStatus",
            id = %id,
            otel.name = Self::SPAN_NAME,
            status = ?status,
        ),
    )]
    pub async fn update_cheque_status(
        id: api::cheque::Id,
        status: api::cheque::Status,
        date: Option<Date>,
        bounce_reason: Option<api::cheque::BounceReason>,
        replaced_by: Option<api::cheque::Id>,
        ctx: &Context,
    ) -> Result<api::cheque::StatusUpdate, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::UpdateChequeStatus {
                caller,
                cheque_id: id.into(),
                transition: domain::cheque::Transition {
                    to: status.into(),
                    date,
                    bounce_reason: bounce_reason.map(Into::into),
                    replaced_by: replaced_by.map(Into::into),
                },
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records the `Payment` of the cleared `Cheque`, unless it's recorded
    /// already.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Cheque` doesn't exist;
    /// - `INVALID_TRANSITION` - the `Cheque` is not cleared.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "settleCheque",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn settle_cheque(
        id: api::cheque::Id,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::SettleCheque {
                caller,
                cheque_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Records a new `Payment` for the `Lease` and auto-matches it against
    /// the rent schedule, oldest due first.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Lease` doesn't exist or is archived;
    /// - `CURRENCY_MISMATCH` - `amount` is not in the `Property` currency;
    /// - `INVALID_AMOUNT` - `amount` is not positive.
    #[tracing::instrument(
        skip_all,
        fields(
            date = %date,
            gql.name = "createPayment",
            lease_id = %lease_id,
            method = ?method,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn create_payment(
        lease_id: api::lease::Id,
        date: Date,
        amount: Money,
        method: api::payment::Method,
        reference: Option<api::payment::Reference>,
        ctx: &Context,
    ) -> Result<api::payment::Recorded, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::CreatePayment {
                caller,
                lease_id: lease_id.into(),
                date,
                amount,
                method: method.into(),
                reference: reference.map(Into::into),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }

    /// Replaces the matches of the `Payment` with the provided allocations.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Payment` or a `ScheduleEntry` doesn't exist;
    /// - `MISMATCHED_LEASE` - a `ScheduleEntry` belongs to another `Lease`;
    /// - `INVALID_AMOUNT` - an allocated amount is negative;
    /// - `OVER_ALLOCATION` - allocations exceed the `Payment` amount.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "matchPayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn match_payment(
        id: api::payment::Id,
        allocations: Vec<api::payment::AllocationInput>,
        ctx: &Context,
    ) -> Result<Vec<api::payment::Match>, Error> {
        let caller = ctx.caller().await?;
        Ok(ctx
            .service()
            .execute(command::MatchPayment {
                caller,
                payment_id: id.into(),
                allocations: allocations.into_iter().map(Into::into).collect(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Deletes the `Payment` along with its matches.
    ///
    /// # Errors
    ///
    /// Possible error codes:
    /// - `NOT_FOUND` - the `Payment` doesn't exist.
    #[tracing::instrument(
        skip_all,
        fields(
            gql.name = "deletePayment",
            id = %id,
            otel.name = Self::SPAN_NAME,
        ),
    )]
    pub async fn delete_payment(
        id: api::payment::Id,
        ctx: &Context,
    ) -> Result<api::Payment, Error> {
        let caller = ctx.caller().await?;
        ctx.service()
            .execute(command::DeletePayment {
                caller,
                payment_id: id.into(),
            })
            .await
            .map_err(AsError::into_error)
            .map_err(ctx.error())
            .map(Into::into)
    }
}

/// Builds the [`Error`] of the provided `kind` described by the `err`.
fn reconciliation(
    kind: api::ReconciliationError,
    err: &impl ToString,
) -> Option<Error> {
    Some(kind.because(err))
}

impl AsError for command::create_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::ReconciliationError as E;

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAmount(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } => reconciliation(E::InvalidRange, self),
            Self::Overlap(_) => reconciliation(E::Overlap, self),
            Self::PropertyNotExists(_) | Self::TenantNotExists(_) => {
                reconciliation(E::NotFound, self)
            }
        }
    }
}

impl AsError for command::update_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::ReconciliationError as E;

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAmount(e) => e.try_as_error(),
            Self::InvalidPeriod { .. } | Self::TerminationOutOfPeriod(_) => {
                reconciliation(E::InvalidRange, self)
            }
            Self::LeaseNotExists(_) => reconciliation(E::NotFound, self),
            Self::Overlap(_) => reconciliation(E::Overlap, self),
        }
    }
}

impl AsError for command::terminate_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
            Self::Termination(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::archive_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::restore_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::ReconciliationError as E;

        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => reconciliation(E::NotFound, self),
            Self::Overlap(_) => reconciliation(E::Overlap, self),
        }
    }
}

impl AsError for command::delete_lease::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::recompute_occupancy::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PropertyNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::create_cheque::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAmount(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::update_cheque_status::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::ChequeNotExists(_) | Self::ReplacementNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
            Self::Db(e) => e.try_as_error(),
            Self::Transition(e) => e.try_as_error(),
        }
    }
}

impl AsError for command::settle_cheque::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        use api::ReconciliationError as E;

        match self {
            Self::ChequeNotExists(_) => reconciliation(E::NotFound, self),
            Self::Db(e) => e.try_as_error(),
            Self::NotCleared(_) => reconciliation(E::InvalidTransition, self),
        }
    }
}

impl AsError for command::create_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::InvalidAmount(e) => e.try_as_error(),
            Self::LeaseNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::match_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Allocation(e) => e.try_as_error(),
            Self::Db(e) => e.try_as_error(),
            Self::PaymentNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}

impl AsError for command::delete_payment::ExecutionError {
    fn try_as_error(&self) -> Option<Error> {
        match self {
            Self::Db(e) => e.try_as_error(),
            Self::PaymentNotExists(_) => {
                reconciliation(api::ReconciliationError::NotFound, self)
            }
        }
    }
}
