//! [`Command`] for recording a new [`Payment`].

use common::{
    operations::{By, Commit, Insert, Lock, Select, Transact, Transacted},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    command::reconcile::{self, ScheduleDatabase},
    domain::{
        lease,
        payment::{self, Method, Reference},
        property, Caller, Lease, Payment, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for recording a [`Payment`] received for a [`Lease`] and
/// auto-matching it against the rent schedule, oldest due first.
#[derive(Clone, Debug)]
pub struct CreatePayment {
    /// [`Caller`] recording the [`Payment`].
    pub caller: Caller,

    /// ID of the [`Lease`] the [`Payment`] is received for.
    pub lease_id: lease::Id,

    /// [`Date`] the funds were received on.
    pub date: Date,

    /// Received amount.
    pub amount: Money,

    /// [`Method`] the funds were received with.
    pub method: Method,

    /// [`Reference`] of the [`Payment`], if any.
    pub reference: Option<Reference>,
}

/// Result of the [`CreatePayment`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Recorded [`Payment`].
    pub payment: Payment,

    /// [`payment::Match`]es the [`Payment`] was auto-matched with.
    pub matches: Vec<payment::Match>,
}

impl<Db> Command<CreatePayment> for Service<Db>
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
    Transacted<Db>: ScheduleDatabase
        + Database<
            Lock<By<Property, property::Id>>,
            Err = Traced<database::Error>,
        > + Database<Insert<Payment>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreatePayment) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreatePayment {
            caller,
            lease_id,
            date,
            amount,
            method,
            reference,
        } = cmd;

        let lease = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| !l.is_archived())
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?;
        self.database()
            .execute(Select(By::<Option<Property>, _>::new((
                lease.property_id,
                caller,
            ))))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::LeaseNotExists(lease_id))
            .map_err(tracerr::wrap!())?
            .check_amount(amount)
            .map_err(E::InvalidAmount)
            .map_err(tracerr::wrap!())?;

        let payment = Payment {
            id: payment::Id::new(),
            lease_id,
            property_id: lease.property_id,
            tenant_id: lease.tenant_id,
            cheque_id: None,
            date,
            amount,
            method,
            reference,
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };

        let tx = self
            .database()
            .execute(Transact)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        // Avoid concurrent reconciliation of the same `Lease`.
        tx.execute(Lock(By::new(lease.property_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        tx.execute(Insert(payment.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;
        let matches = reconcile::auto_match(&tx, &payment, self.today())
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?;

        tx.execute(Commit)
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(Output { payment, matches })
    }
}

/// Error of [`CreatePayment`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Amount cannot be recorded against the [`Property`].
    #[display("Invalid amount: {_0}")]
    InvalidAmount(property::AmountError),

    /// [`Lease`] with the provided ID does not exist.
    #[display("`Lease(id: {_0})` does not exist")]
    LeaseNotExists(#[error(not(source))] lease::Id),
}

#[cfg(test)]
mod spec {
    use common::money::Currency;
    use rust_decimal::Decimal;

    use crate::{
        command::fixture::{self, aed, date, decimal},
        domain::{
            lease,
            payment::{Method, Reference},
            property::AmountError,
            schedule::Status,
        },
        query, Command as _,
    };

    use super::{CreatePayment, ExecutionError};

    fn cmd(
        setup: &fixture::Setup,
        lease_id: lease::Id,
        amount: &str,
    ) -> CreatePayment {
        CreatePayment {
            caller: setup.owner,
            lease_id,
            date: date("2026-03-01"),
            amount: aed(amount),
            method: Method::BankTransfer,
            reference: Reference::new("TRX-0042"),
        }
    }

    #[tokio::test]
    async fn auto_matches_oldest_due_first() {
        let setup = fixture::setup("2026-03-15").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let first = setup
            .svc
            .execute(cmd(&setup, lease.id, "7000"))
            .await
            .unwrap();
        assert_eq!(first.matches.len(), 2);
        assert_eq!(first.matches[0].amount, decimal("5000"));
        assert_eq!(first.matches[1].amount, decimal("2000"));

        let second = setup
            .svc
            .execute(cmd(&setup, lease.id, "4000"))
            .await
            .unwrap();
        assert_eq!(second.matches.len(), 2);
        assert_eq!(second.matches[0].amount, decimal("3000"));
        assert_eq!(second.matches[1].amount, decimal("1000"));

        let schedule = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        let statuses = schedule.iter().map(|e| e.status).collect::<Vec<_>>();
        assert_eq!(
            statuses,
            [
                Status::Paid,
                Status::Paid,
                Status::Partial,
                Status::Due,
                Status::Due,
                Status::Due,
            ],
        );
        assert_eq!(schedule[2].paid, Some(decimal("1000")));
    }

    #[tokio::test]
    async fn keeps_overpayment_unmatched() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-02-28", "5000").await;

        let out = setup
            .svc
            .execute(cmd(&setup, lease.id, "12000"))
            .await
            .unwrap();

        let matched = out.matches.iter().map(|m| m.amount).sum::<Decimal>();
        assert_eq!(matched, decimal("10000"));
        assert_eq!(out.payment.amount, aed("12000"));
    }

    #[tokio::test]
    async fn rejects_invalid_amount() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;

        let err = setup
            .svc
            .execute(cmd(&setup, lease.id, "-1"))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmount(AmountError::NotPositive(_)),
        ));

        let mut cmd = cmd(&setup, lease.id, "5000");
        cmd.amount.currency = Currency::Inr;
        let err = setup.svc.execute(cmd).await.unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmount(
                AmountError::CurrencyMismatch { .. }
            ),
        ));
    }
}
