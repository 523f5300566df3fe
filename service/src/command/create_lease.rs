//! [`Command`] for creating a new [`Lease`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{
        lease::{self, DueDay, Frequency, Period},
        property, schedule, tenant, Caller, Lease, Property, Tenant,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Lease`] along with its rent schedule.
#[derive(Clone, Copy, Debug)]
pub struct CreateLease {
    /// [`Caller`] creating the [`Lease`].
    pub caller: Caller,

    /// ID of the leased [`Property`].
    pub property_id: property::Id,

    /// ID of the [`Tenant`] renting the [`Property`].
    pub tenant_id: tenant::Id,

    /// First day of the new [`Lease`].
    pub start: Date,

    /// Last day of the new [`Lease`].
    pub end: Date,

    /// Rent [`Frequency`] of the new [`Lease`].
    pub frequency: Frequency,

    /// Installment amount of the new [`Lease`].
    pub rent: Money,

    /// Day of month the rent is due on.
    pub due_day: DueDay,

    /// Security deposit of the new [`Lease`], if any.
    pub security_deposit: Option<Money>,
}

impl<Db> Command<CreateLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Tenant>, tenant::Id>>,
            Ok = Option<Tenant>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: OccupancyDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Lease>, Err = Traced<database::Error>>
        + Database<Insert<Vec<schedule::Entry>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateLease {
            caller,
            property_id,
            tenant_id,
            start,
            end,
            frequency,
            rent,
            due_day,
            security_deposit,
        } = cmd;

        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new((
                property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|p| p.archived_at.is_none())
            .ok_or(E::PropertyNotExists(property_id))
            .map_err(tracerr::wrap!())?;

        // A `Tenant` is usable within the scope of the `Property` owner, or
        // of the `Caller` who registered it.
        _ = self
            .database()
            .execute(Select(By::<Option<Tenant>, _>::new(tenant_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|t| {
                t.owner_id == property.owner_id
                    || t.owner_id == caller.account_id
            })
            .ok_or(E::TenantNotExists(tenant_id))
            .map_err(tracerr::wrap!())?;

        let period = Period::new(start, end)
            .ok_or(E::InvalidPeriod { start, end })
            .map_err(tracerr::wrap!())?;

        for amount in [Some(rent), security_deposit].into_iter().flatten() {
            property
                .check_amount(amount)
                .map_err(E::InvalidAmount)
                .map_err(tracerr::wrap!())?;
        }

        let today = self.today();
        let lease = Lease {
            id: lease::Id::new(),
            property_id,
            tenant_id,
            period,
            frequency,
            rent,
            due_day,
            security_deposit,
            termination_date: None,
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };
        let entries = schedule::generate(&lease.terms())
            .into_iter()
            .map(|i| schedule::Entry::new(lease.id, i, today))
            .collect::<Vec<_>>();

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent overlapping `Lease`s of the same `Property`.
        tx.execute(Lock(By::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if let Some(existing) = tx
            .execute(Select(By::<Vec<Lease>, _>::new(property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|l| l.conflicts_with(&period))
        {
            return Err(tracerr::new!(E::Overlap(existing.id)));
        }

        tx.execute(Insert(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        tx.execute(Insert(entries))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        _ = reconcile::refresh_occupancy(&tx, property_id, today, None)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`CreateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Rent or security deposit cannot be recorded against the [`Property`].
    #[display("Invalid amount: {_0}")]
    InvalidAmount(property::AmountError),

    /// [`Lease`] doesn't end after it starts.
    #[display("`Lease` must end after it starts, but {start} >= {end}")]
    InvalidPeriod {
        /// Provided start [`Date`].
        start: Date,

        /// Provided end [`Date`].
        end: Date,
    },

    /// [`Lease`] overlaps another non-archived one of the same [`Property`].
    #[display("`Lease` overlaps the existing `Lease(id: {_0})`")]
    Overlap(#[error(not(source))] lease::Id),

    /// [`Property`] with the provided ID does not exist.
    #[display("`Property(id: {_0})` does not exist")]
    PropertyNotExists(#[error(not(source))] property::Id),

    /// [`Tenant`] with the provided ID does not exist.
    #[display("`Tenant(id: {_0})` does not exist")]
    TenantNotExists(#[error(not(source))] tenant::Id),
}

#[cfg(test)]
mod spec {
    use common::money::Currency;

    use crate::{
        command::fixture::{self, aed, date},
        domain::{
            account,
            lease::{DueDay, Frequency},
            property::{AmountError, Occupancy},
            schedule::Status,
            Caller,
        },
        query, Command as _,
    };

    use super::{CreateLease, ExecutionError};

    fn cmd(setup: &fixture::Setup, start: &str, end: &str) -> CreateLease {
        CreateLease {
            caller: setup.owner,
            property_id: setup.property.id,
            tenant_id: setup.tenant.id,
            start: date(start),
            end: date(end),
            frequency: Frequency::Monthly,
            rent: aed("50000"),
            due_day: DueDay::new(31).unwrap(),
            security_deposit: Some(aed("10000")),
        }
    }

    #[tokio::test]
    async fn creates_lease_with_schedule_and_occupies_property() {
        let setup = fixture::setup("2026-02-15").await;

        let lease = setup
            .svc
            .execute(cmd(&setup, "2026-01-01", "2026-12-31"))
            .await
            .unwrap();

        let schedule = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(schedule.len(), 12);
        assert_eq!(schedule[0].due_date, date("2026-01-31"));
        assert_eq!(schedule[1].due_date, date("2026-02-28"));
        assert_eq!(schedule[11].due_date, date("2026-12-31"));
        assert_eq!(schedule[0].status, Status::Overdue);
        assert_eq!(schedule[1].status, Status::Due);
        assert!(schedule.iter().all(|e| e.expected == aed("50000")));

        let property = setup
            .svc
            .execute(query::property::ById::by((
                setup.property.id,
                setup.owner,
            )))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(property.occupancy, Occupancy::Occupied);
    }

    #[tokio::test]
    async fn rejects_inverted_period() {
        let setup = fixture::setup("2026-01-01").await;

        for (start, end) in
            [("2026-12-31", "2026-01-01"), ("2026-05-01", "2026-05-01")]
        {
            let err = setup
                .svc
                .execute(cmd(&setup, start, end))
                .await
                .unwrap_err();
            assert!(
                matches!(err.as_ref(), ExecutionError::InvalidPeriod { .. }),
                "{start}..{end}: {err}",
            );
        }
    }

    #[tokio::test]
    async fn rejects_overlap() {
        let setup = fixture::setup("2026-01-01").await;
        let existing = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let err = setup
            .svc
            .execute(cmd(&setup, "2026-06-30", "2026-12-31"))
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::Overlap(id) if *id == existing.id,
        ));

        _ = setup
            .svc
            .execute(cmd(&setup, "2026-07-01", "2026-12-31"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn rejects_currency_mismatch() {
        let setup = fixture::setup("2026-01-01").await;
        let mut cmd = cmd(&setup, "2026-01-01", "2026-12-31");
        cmd.rent.currency = Currency::Inr;

        let err = setup.svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmount(AmountError::CurrencyMismatch {
                expected: Currency::Aed,
                actual: Currency::Inr,
            }),
        ));
    }

    #[tokio::test]
    async fn hides_inaccessible_property() {
        let setup = fixture::setup("2026-01-01").await;
        let mut cmd = cmd(&setup, "2026-01-01", "2026-12-31");
        cmd.caller = Caller::manager(account::Id::new());

        let err = setup.svc.execute(cmd).await.unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::PropertyNotExists(_),
        ));
    }

    #[tokio::test]
    async fn allows_granted_manager() {
        let setup = fixture::setup("2026-01-01").await;
        let manager = Caller::manager(account::Id::new());
        setup
            .svc
            .database()
            .grant(setup.property.id, manager.account_id)
            .await;
        let mut cmd = cmd(&setup, "2026-01-01", "2026-12-31");
        cmd.caller = manager;

        let lease = setup.svc.execute(cmd).await.unwrap();

        assert_eq!(lease.property_id, setup.property.id);
    }
}
