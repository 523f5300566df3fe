//! [`Command`] for registering a new [`Cheque`].

use common::{
    operations::{By, Insert, Select},
    Date, DateTime, Money,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;

use crate::{
    domain::{
        cheque::{self, BankName, CoversPeriod, Number, Status},
        lease, property, Caller, Cheque, Lease, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for registering a new post-dated [`Cheque`] handed over for a
/// [`Lease`].
#[derive(Clone, Debug)]
pub struct CreateCheque {
    /// [`Caller`] registering the [`Cheque`].
    pub caller: Caller,

    /// ID of the [`Lease`] the [`Cheque`] pays for.
    pub lease_id: lease::Id,

    /// [`Number`] of the [`Cheque`].
    pub number: Number,

    /// [`BankName`] the [`Cheque`] is drawn on.
    pub bank_name: BankName,

    /// [`Date`] written on the [`Cheque`].
    pub date: Date,

    /// Amount of the [`Cheque`].
    pub amount: Money,

    /// Label of the rent period the [`Cheque`] covers, if any.
    pub covers_period: Option<CoversPeriod>,
}

impl<Db> Command<CreateCheque> for Service<Db>
where
    Db: Database<
            Select<By<Option<Lease>, lease::Id>>,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Property>, (property::Id, Caller)>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<Insert<Cheque>, Err = Traced<database::Error>>,
{
    type Ok = Cheque;
    type Err = Traced<ExecutionError>;

    async fn execute(&self, cmd: CreateCheque) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let CreateCheque {
            caller,
            lease_id,
            number,
            bank_name,
            date,
            amount,
            covers_period,
        } = cmd;

        let lease = self
            .database()
            .execute(Select(By::<Option<Lease>, _>::new(lease_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|l| !l.is_archived())
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

        property
            .check_amount(amount)
            .map_err(E::InvalidAmount)
            .map_err(tracerr::wrap!())?;

        let cheque = Cheque {
            id: cheque::Id::new(),
            lease_id,
            property_id: lease.property_id,
            tenant_id: lease.tenant_id,
            number,
            bank_name,
            date,
            amount,
            covers_period,
            status: Status::Received,
            deposited_on: None,
            settled_on: None,
            bounce_reason: None,
            replaced_by: None,
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };
        self.database()
            .execute(Insert(cheque.clone()))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))
            .map(drop)?;

        Ok(cheque)
    }
}

/// Error of [`CreateCheque`] [`Command`] execution.
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
    use crate::{
        command::{
            fixture::{self, aed, date},
            ArchiveLease,
        },
        domain::{
            cheque::{BankName, Number, Status},
            lease,
            property::AmountError,
        },
        Command as _,
    };

    use super::{CreateCheque, ExecutionError};

    fn cmd(setup: &fixture::Setup, lease_id: lease::Id) -> CreateCheque {
        CreateCheque {
            caller: setup.owner,
            lease_id,
            number: Number::new("000451").unwrap(),
            bank_name: BankName::new("Mashreq").unwrap(),
            date: date("2026-04-01"),
            amount: aed("15000"),
            covers_period: None,
        }
    }

    #[tokio::test]
    async fn registers_received_cheque() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;

        let cheque = setup.svc.execute(cmd(&setup, lease.id)).await.unwrap();

        assert_eq!(cheque.status, Status::Received);
        assert_eq!(cheque.tenant_id, setup.tenant.id);
        assert_eq!(cheque.property_id, setup.property.id);
    }

    #[tokio::test]
    async fn rejects_non_positive_amount() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;

        let err = setup
            .svc
            .execute(CreateCheque {
                amount: aed("0"),
                ..cmd(&setup, lease.id)
            })
            .await
            .unwrap_err();

        assert!(matches!(
            err.as_ref(),
            ExecutionError::InvalidAmount(AmountError::NotPositive(_)),
        ));
    }

    #[tokio::test]
    async fn rejects_archived_lease() {
        let setup = fixture::setup("2026-01-01").await;
        let lease = setup.lease("2026-01-01", "2026-12-31", "5000").await;
        _ = setup
            .svc
            .execute(ArchiveLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap();

        let err = setup.svc.execute(cmd(&setup, lease.id)).await.unwrap_err();

        assert!(matches!(err.as_ref(), ExecutionError::LeaseNotExists(_)));
    }
}
