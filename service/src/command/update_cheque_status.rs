//! [`Command`] for changing the [`Status`] of a [`Cheque`].

use common::operations::{
    By, Commit, Lock, Select, Transact, Transacted, Update,
};
use derive_more::{Display, Error, From};
use tracerr::Traced;
use tracing as log;

use crate::{
    command::{settle_cheque, SettleCheque},
    domain::{
        cheque::{self, Status, Transition, TransitionError},
        Caller, Cheque, Lease, Payment,
    },
    infra::{database, Database},
    query, Query, Service,
};

use super::Command;

/// [`Command`] for moving a [`Cheque`] to another [`Status`].
///
/// Clearing a [`Cheque`] produces its [`Payment`] (see [`SettleCheque`]).
/// Failing to produce it doesn't revert the [`Status`] change, but is
/// reported in [`Output::warning`].
#[derive(Clone, Debug)]
pub struct UpdateChequeStatus {
    /// [`Caller`] changing the [`Status`].
    pub caller: Caller,

    /// ID of the [`Cheque`] to change the [`Status`] of.
    pub cheque_id: cheque::Id,

    /// Requested [`Transition`].
    pub transition: Transition,
}

/// Result of the [`UpdateChequeStatus`] [`Command`].
#[derive(Clone, Debug)]
pub struct Output {
    /// Updated [`Cheque`].
    pub cheque: Cheque,

    /// [`Payment`] produced by the cleared [`Cheque`], if any.
    pub payment: Option<Payment>,

    /// Reason the [`Payment`] of the cleared [`Cheque`] was not produced.
    pub warning: Option<String>,
}

impl<Db> Command<UpdateChequeStatus> for Service<Db>
where
    Self: Query<
            query::lease::ById,
            Ok = Option<Lease>,
            Err = Traced<database::Error>,
        > + Command<
            SettleCheque,
            Ok = Payment,
            Err = Traced<settle_cheque::ExecutionError>,
        >,
    Db: Database<Transact, Err = Traced<database::Error>>
        + Database<
            Select<By<Option<Cheque>, cheque::Id>>,
            Ok = Option<Cheque>,
            Err = Traced<database::Error>,
        >,
    Transacted<Db>: Database<
            Lock<By<Cheque, cheque::Id>>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Option<Cheque>, cheque::Id>>,
            Ok = Option<Cheque>,
            Err = Traced<database::Error>,
        > + Database<Update<Cheque>, Err = Traced<database::Error>>
        + Database<Commit, Err = Traced<database::Error>>,
{
    type Ok = Output;
    type Err = Traced<ExecutionError>;

    async fn execute(
        &self,
        cmd: UpdateChequeStatus,
    ) -> Result<Self::Ok, Self::Err> {
        use ExecutionError as E;

        let UpdateChequeStatus {
            caller,
            cheque_id,
            transition,
        } = cmd;

        let lease_id = self
            .database()
            .execute(Select(By::<Option<Cheque>, _>::new(cheque_id)))
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .filter(|c| c.archived_at.is_none())
            .ok_or(E::ChequeNotExists(cheque_id))
            .map_err(tracerr::wrap!())?
            .lease_id;
        _ = self
            .execute(query::lease::ById { caller, lease_id })
            .await
            .map_err(tracerr::map_from_and_wrap!(=> E))?
            .ok_or(E::ChequeNotExists(cheque_id))
            .map_err(tracerr::wrap!())?;

        let cheque = {
            let tx = self
                .database()
                .execute(Transact)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?;

            // Avoid concurrent `Status` changes of the same `Cheque`.
            tx.execute(Lock(By::new(cheque_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            let mut cheque = tx
                .execute(Select(By::<Option<Cheque>, _>::new(cheque_id)))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))?
                .ok_or(E::ChequeNotExists(cheque_id))
                .map_err(tracerr::wrap!())?;

            if !cheque.status.allows(transition.to) {
                return Err(tracerr::new!(E::Transition(
                    TransitionError::NotAllowed {
                        from: cheque.status,
                        to: transition.to,
                    },
                )));
            }
            if let (Status::Replaced, Some(replacement)) =
                (transition.to, transition.replaced_by)
            {
                _ = tx
                    .execute(Select(By::<Option<Cheque>, _>::new(replacement)))
                    .await
                    .map_err(tracerr::map_from_and_wrap!(=> E))?
                    .filter(|r| {
                        r.id != cheque_id
                            && r.lease_id == lease_id
                            && r.archived_at.is_none()
                    })
                    .ok_or(E::ReplacementNotExists(replacement))
                    .map_err(tracerr::wrap!())?;
            }

            cheque
                .transition(transition, self.today())
                .map_err(E::Transition)
                .map_err(tracerr::wrap!())?;

            tx.execute(Update(cheque.clone()))
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;
            tx.execute(Commit)
                .await
                .map_err(tracerr::map_from_and_wrap!(=> E))
                .map(drop)?;

            cheque
        };

        let (mut payment, mut warning) = (None, None);
        if cheque.status == Status::Cleared {
            match self.execute(SettleCheque { caller, cheque_id }).await {
                Ok(p) => payment = Some(p),
                Err(e) => {
                    log::warn!(
                        "failed to produce `Payment` of cleared \
                         `Cheque(id: {cheque_id})`: {e}",
                    );
                    warning = Some(format!(
                        "`Cheque` is cleared, but its `Payment` is not \
                         recorded: {e}",
                    ));
                }
            }
        }

        Ok(Output {
            cheque,
            payment,
            warning,
        })
    }
}

/// Error of [`UpdateChequeStatus`] [`Command`] execution.
#[derive(Debug, Display, Error, From)]
pub enum ExecutionError {
    /// [`Cheque`] with the provided ID does not exist.
    #[display("`Cheque(id: {_0})` does not exist")]
    ChequeNotExists(#[error(not(source))] cheque::Id),

    /// [`Database`] error.
    #[display("`Database` operation failed: {_0}")]
    #[from]
    Db(database::Error),

    /// Replacing [`Cheque`] doesn't exist among the ones of the same
    /// [`Lease`].
    #[display("replacing `Cheque(id: {_0})` does not exist")]
    ReplacementNotExists(#[error(not(source))] cheque::Id),

    /// Requested [`Transition`] is not allowed.
    #[display("Invalid transition: {_0}")]
    Transition(cheque::TransitionError),
}

#[cfg(test)]
mod spec {
    use crate::{
        command::{
            fixture::{self, aed, date},
            CreateCheque,
        },
        domain::{
            cheque::{
                self, BankName, BounceReason, Number, Status, Transition,
                TransitionError,
            },
            lease, schedule, Cheque,
        },
        query, Command as _,
    };

    use super::{ExecutionError, UpdateChequeStatus};

    async fn cheque(
        setup: &fixture::Setup,
        lease_id: lease::Id,
        number: &str,
        amount: &str,
    ) -> Cheque {
        setup
            .svc
            .execute(CreateCheque {
                caller: setup.owner,
                lease_id,
                number: Number::new(number).unwrap(),
                bank_name: BankName::new("Emirates NBD").unwrap(),
                date: date("2026-02-01"),
                amount: aed(amount),
                covers_period: None,
            })
            .await
            .unwrap()
    }

    fn to(
        setup: &fixture::Setup,
        cheque: &Cheque,
        transition: Transition,
    ) -> UpdateChequeStatus {
        UpdateChequeStatus {
            caller: setup.owner,
            cheque_id: cheque.id,
            transition,
        }
    }

    #[tokio::test]
    async fn clearing_produces_matched_payment() {
        let setup = fixture::setup("2026-02-10").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let cheque = cheque(&setup, lease.id, "100001", "7500").await;

        let deposited = setup
            .svc
            .execute(to(&setup, &cheque, Transition::to(Status::Deposited)))
            .await
            .unwrap();
        assert_eq!(deposited.cheque.deposited_on, Some(date("2026-02-10")));
        assert!(deposited.payment.is_none());

        let cleared = setup
            .svc
            .execute(to(
                &setup,
                &cheque,
                Transition {
                    date: Some(date("2026-02-09")),
                    ..Transition::to(Status::Cleared)
                },
            ))
            .await
            .unwrap();

        assert_eq!(cleared.cheque.status, Status::Cleared);
        assert!(cleared.warning.is_none());
        let payment = cleared.payment.unwrap();
        assert_eq!(payment.cheque_id, Some(cheque.id));
        assert_eq!(payment.date, date("2026-02-09"));
        assert_eq!(payment.amount, aed("7500"));

        let schedule = setup
            .svc
            .execute(query::schedule::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(schedule[0].status, schedule::Status::Paid);
        assert_eq!(schedule[1].status, schedule::Status::Partial);
        assert_eq!(schedule[1].paid, Some(fixture::decimal("2500")));
        assert_eq!(schedule[2].status, schedule::Status::Due);
    }

    #[tokio::test]
    async fn keeps_cleared_status_if_payment_fails() {
        let setup = fixture::setup("2026-02-10").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let cheque = cheque(&setup, lease.id, "100006", "5000").await;

        _ = setup
            .svc
            .execute(to(&setup, &cheque, Transition::to(Status::Deposited)))
            .await
            .unwrap();
        setup.svc.database().fail_payment_inserts().await;

        let cleared = setup
            .svc
            .execute(to(&setup, &cheque, Transition::to(Status::Cleared)))
            .await
            .unwrap();
        assert_eq!(cleared.cheque.status, Status::Cleared);
        assert!(cleared.payment.is_none());
        assert!(cleared.warning.is_some());

        let stored = setup
            .svc
            .execute(query::cheque::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].status, Status::Cleared);
        assert_eq!(stored[0].settled_on, Some(date("2026-02-10")));

        let payments = setup
            .svc
            .execute(query::payment::ByLease {
                caller: setup.owner,
                lease_id: lease.id,
            })
            .await
            .unwrap()
            .unwrap();
        assert!(payments.is_empty());
    }

    #[tokio::test]
    async fn rejects_disallowed_transitions() {
        let setup = fixture::setup("2026-02-10").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let cheque = cheque(&setup, lease.id, "100002", "5000").await;

        let err = setup
            .svc
            .execute(to(&setup, &cheque, Transition::to(Status::Cleared)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(TransitionError::NotAllowed {
                from: Status::Received,
                to: Status::Cleared,
            }),
        ));

        for status in [Status::Deposited, Status::Cleared] {
            _ = setup
                .svc
                .execute(to(&setup, &cheque, Transition::to(status)))
                .await
                .unwrap();
        }
        let err = setup
            .svc
            .execute(to(&setup, &cheque, Transition::to(Status::Cleared)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(TransitionError::NotAllowed {
                from: Status::Cleared,
                ..
            }),
        ));

        let received = self::cheque(&setup, lease.id, "100005", "5000").await;
        let err = setup
            .svc
            .execute(to(
                &setup,
                &received,
                Transition {
                    replaced_by: Some(cheque::Id::new()),
                    ..Transition::to(Status::Replaced)
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(TransitionError::NotAllowed {
                from: Status::Received,
                to: Status::Replaced,
            }),
        ));
    }

    #[tokio::test]
    async fn replaces_bounced_cheque() {
        let setup = fixture::setup("2026-02-10").await;
        let lease = setup.lease("2026-01-01", "2026-06-30", "5000").await;
        let bounced = cheque(&setup, lease.id, "100003", "5000").await;
        let replacement = cheque(&setup, lease.id, "100004", "5000").await;

        _ = setup
            .svc
            .execute(to(&setup, &bounced, Transition::to(Status::Deposited)))
            .await
            .unwrap();
        let out = setup
            .svc
            .execute(to(
                &setup,
                &bounced,
                Transition {
                    bounce_reason: BounceReason::new("insufficient funds"),
                    ..Transition::to(Status::Bounced)
                },
            ))
            .await
            .unwrap();
        assert!(out.payment.is_none());
        assert_eq!(out.cheque.settled_on, Some(date("2026-02-10")));

        let err = setup
            .svc
            .execute(to(&setup, &bounced, Transition::to(Status::Replaced)))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::Transition(TransitionError::MissingReplacement),
        ));

        let err = setup
            .svc
            .execute(to(
                &setup,
                &bounced,
                Transition {
                    replaced_by: Some(bounced.id),
                    ..Transition::to(Status::Replaced)
                },
            ))
            .await
            .unwrap_err();
        assert!(matches!(
            err.as_ref(),
            ExecutionError::ReplacementNotExists(_),
        ));

        let out = setup
            .svc
            .execute(to(
                &setup,
                &bounced,
                Transition {
                    replaced_by: Some(replacement.id),
                    ..Transition::to(Status::Replaced)
                },
            ))
            .await
            .unwrap();
        assert_eq!(out.cheque.status, Status::Replaced);
        assert_eq!(out.cheque.replaced_by, Some(replacement.id));
    }
}
