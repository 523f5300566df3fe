//! [`Command`] for updating the terms of an existing [`Lease`].

use common::{
    operations::{
        By, Commit, Delete, Insert, Lock, Select, Transact, Transacted, Update,
    },
    Date, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, OccupancyDatabase},
    domain::{
        lease::{self, DueDay, Frequency, Period},
        property, schedule, Caller, Lease, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for updating the terms of an existing [`Lease`].
///
/// Changing any of the [`schedule::Terms`] regenerates the whole rent
/// schedule of the [`Lease`], dropping all the [`Payment`] matches of its
/// previous entries.
///
/// [`Payment`]: crate::domain::Payment
#[derive(Clone, Copy, Debug)]
pub struct UpdateLease {
    /// [`Caller`] updating the [`Lease`].
    pub caller: Caller,

    /// ID of the [`Lease`] to update.
    pub lease_id: lease::Id,

    /// New first day of the [`Lease`], if changed.
    pub start: Option<Date>,

    /// New last day of the [`Lease`], if changed.
    pub end: Option<Date>,

    /// New rent [`Frequency`], if changed.
    pub frequency: Option<Frequency>,

    /// New installment amount, if changed.
    pub rent: Option<Money>,

    /// New day of month the rent is due on, if changed.
    pub due_day: Option<DueDay>,

    /// New security deposit, if changed.
    pub security_deposit: Option<Money>,
}

impl UpdateLease {
    /// Creates a new [`UpdateLease`] changing nothing.
    #[must_use]
    pub const fn new(caller: Caller, lease_id: lease::Id) -> Self {
        Self {
            caller,
            lease_id,
            start: None,
            end: None,
            frequency: None,
            rent: None,
            due_day: None,
            security_deposit: None,
        }
    }
}

impl<Db> Command<UpdateLease> for Service<Db>
where
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: OccupancyDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Lease>, Err = Traced<database::Error>>
        + Database<
            Delete<By<Vec<schedule::Entry>, lease::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Vec<schedule::Entry>>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Lease;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: UpdateLease) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateLease {
            caller,
            lease_id,
            start,
            end,
            frequency,
            rent,
            due_day,
            security_deposit,
        } = cmd;

        let lease = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let property = self
            .database()
            .execute(Select(By::<Option<Property>, _>::new((
                lease.property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent overlapping `Lease`s of the same `Property`.
        tx.execute(Lock(By::new(property.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        let mut lease = tx
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| !l.is_archived())
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        let terms = lease.terms();

        let (start, end) = (
            start.unwrap_or(lease.period.start()),
            end.unwrap_or(lease.period.end()),
        );
        lease.period = Period::new(start, end)
            .ok_or(E::InvalidPeriod { start, end })
            .map_err(tracerr::wrap!())?;
        if let Some(terminated) = lease.termination_date {
            if !lease.period.contains(terminated) {
                return Err(tracerr::new!(E::TerminationOutOfPeriod(
                    terminated,
                )));
            }
        }
        if let Some(frequency) = frequency {
            lease.frequency = frequency;
        }
        if let Some(rent) = rent {
            lease.rent = rent;
        }
        if let Some(due_day) = due_day {
            lease.due_day = due_day;
        }
        if let Some(deposit) = security_deposit {
            lease.security_deposit = Some(deposit);
        }
        for amount in [Some(lease.rent), lease.security_deposit]
            .into_iter()
            .flatten()
        {
            property
                .check_amount(amount)
                .map_err(E::InvalidAmount)
                .map_err(tracerr::wrap!())?;
        }

        if let Some(existing) = tx
            .execute(Select(By::<Vec<Lease>, _>::new(property.id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .into_iter()
            .find(|l| l.id != lease_id && l.conflicts_with(&lease.period))
        {
            return Err(tracerr::new!(E::Overlap(existing.id)));
        }

        tx.execute(Update(lease.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        if lease.terms() != terms {
            let today = self.today();
            let entries = schedule::generate(&lease.terms())
                .into_iter()
                .map(|i| schedule::Entry::new(lease.id, i, today))
                .collect::<Vec<_>>();

            tx.execute(Delete(By::<Vec<schedule::Entry>, _>::new(lease_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Insert(entries))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
        }

        _ = reconcile::refresh_occupancy(&tx, property.id, self.today(), None)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(lease)
    }
}

/// Error of [`UpdateLease`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Rent or security deposit cannot be recorded against the [`Property`].
    #[display("Invalid amount: {_0}")]
    InvalidAmount(property::AmountError),

    /// Updated [`Lease`] doesn't end after it starts.
    #[display("`Lease` must end after it starts, but {start} >= {end}")]
    InvalidPeriod {
        /// Resulting start [`Date`].
        start: Date,

        /// Resulting end [`Date`].
        end: Date,
    },

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),

    /// Updated [`Lease`] overlaps another non-archived one of the same
    /// [`Property`].
    #[display("`Lease` overlaps the existing `Lease(id: {_0})`")]
    Overlap(#[error(not(source))] lease::Id),

    /// Updated [`Period`] doesn't contain the termination [`Date`] of the
    /// [`Lease`].
    #[display("`Lease` is terminated on {_0}, which is outside its period")]
    TerminationOutOfPeriod(#[error(not(source))] Date),
}

#[cfg(test)]
mod spec {
    use common::money::Currency;

    use crate::{
        command::{
            fixture::{self, aed, date},
            CreatePayment, TerminateLease,
        },
        domain::{
            account,
            lease::{self, DueDay, Frequency},
            payment::Method,
            property::AmountError,
            schedule::{self, Status},
            Caller,
        },
        query, Command as _,
    };

    use super::{ExecutionError, UpdateLease};

    async fn schedule_ids(
        setup: &fixture::Setup,
        lease_id: lease::Id,
    ) -> Vec<schedule::Id> {
        setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id,
            })
            .await
            .unwrap()
            .unwrap()
            .into_iter()
            .map(|e| e.id)
            .collect()
    }

    #[tokio::test]
    async fn regenerates_schedule_dropping_matches() {
        let setup = fixture::setup("2026-01-15").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        _ = setup
            .svc
            .execute(CreatePayment {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-01-02"),
                amount: aed("5000"),
                method: Method::BankTransfer,
                reference: None,
            })
            .await
            .unwrap();

        let updated = setup
            .svc
            .execute(UpdateLease {
                end: Some(date("2026-12-31")),
                frequency: Some(Frequency::Quarterly),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.period.end(), date("2026-12-31"));
        let schedule = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        let due = schedule.iter().map(|e| e.due_date).collect::<Vec<_>>();
        assert_eq!(
            due,
            [
                date("2026-03-01"),
                date("2026-06-01"),
                date("2026-09-01"),
                date("2026-12-01"),
            ],
        );
        assert!(schedule.iter().all(|e| e.paid.is_none()));
        assert!(schedule.iter().all(|e| e.status == Status::Due));
    }

    #[tokio::test]
    async fn keeps_schedule_if_terms_unchanged() {
        let setup = fixture::setup("2026-01-15").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let before = schedule_ids(&setup, lease.id).await;

        let updated = setup
            .svc
            .execute(UpdateLease {
                security_deposit: Some(aed("10000")),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap();

        assert_eq!(updated.security_deposit, Some(aed("10000")));
        assert_eq!(schedule_ids(&setup, lease.id).await, before);
    }

    #[tokio::test]
    async fn ignores_own_window_on_overlap_check() {
        let setup = fixture::setup("2026-01-01").await;
        let first = setup.lease("2026-01-01", "2026-03-31", "5000").await;
        let second = setup.lease("2026-04-01", "2026-06-30", "5000").await;

        _ = setup
            .svc
            .execute(UpdateLease {
                start: Some(date("2026-02-01")),
                ..UpdateLease::new(setup.owner, first.id)
            })
            .await
            .unwrap();

        let err = setup
            .svc
            .execute(UpdateLease {
                end: Some(date("2026-04-01")),
                ..UpdateLease::new(setup.owner, first.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Overlap(id) if *id == second.id,
        ));
    }

    #[tokio::test]
    async fn rejects_invalid_terms() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let err = setup
            .svc
            .execute(UpdateLease {
                end: Some(date("2025-12-31")),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidPeriod { .. },
        ));

        let mut rent = aed("5000");
        rent.currency = Currency::Inr;
        let err = setup
            .svc
            .execute(UpdateLease {
                rent: Some(rent),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmount(
                AmountError::CurrencyMismatch { .. }
            ),
        ));
    }

    #[tokio::test]
    async fn keeps_termination_date_within_period() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        _ = setup
            .svc
            .execute(TerminateLease {
                caller: setup.owner,
                lease_id: lease.id,
                date: date("2026-09-30"),
            })
            .await
            .unwrap();

        let err = setup
            .svc
            .execute(UpdateLease {
                end: Some(date("2026-06-30")),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::TerminationOutOfPeriod(d)
                if *d == date("2026-09-30"),
        ));

        let err = setup
            .svc
            .execute(UpdateLease {
                start: Some(date("2026-10-01")),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::TerminationOutOfPeriod(_),
        ));

        let stored = setup
            .svc
            .execute(query::lease::ById {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.period.end(), date("2026-12-31"));

        let updated = setup
            .svc
            .execute(UpdateLease {
                end: Some(date("2026-09-30")),
                ..UpdateLease::new(setup.owner, lease.id)
            })
            .await
            .unwrap();
        assert_eq!(updated.termination_date, Some(date("2026-09-30")));
    }

    #[tokio::test]
    async fn hides_inaccessible_lease() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let err = setup
            .svc
            .execute(UpdateLease {
                due_day: DueDay::new(5),
                ..UpdateLease::new(
                    Caller::owner(account::Id::new()),
                    lease.id,
                )
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::LeaseNotExists(id) if *id == lease.id,
        ));
    }
}
