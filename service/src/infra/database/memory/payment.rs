//! [`Payment`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::operations::{By, Delete, Insert, Select, Update};
use rust_decimal::Decimal;
use tracerr::Traced;

use crate::{
    domain::{cheque, lease, payment, schedule, Payment},
    infra::{
        database::{self, constraint, memory, Memory},
        Database,
    },
};

impl Database<Select<By<Option<Payment>, payment::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        Ok(self.state().await.payments.get(&by.into_inner()).cloned())
    }
}

impl Database<Select<By<Option<Payment>, cheque::Id>>> for Memory {
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let cheque_id = by.into_inner();
        Ok(self
            .state()
            .await
            .payments
            .values()
            .find(|p| p.cheque_id == Some(cheque_id))
            .cloned())
    }
}

impl Database<Select<By<Vec<Payment>, lease::Id>>> for Memory {
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let mut payments = self
            .state()
            .await
            .payments
            .values()
            .filter(|p| p.lease_id == lease_id)
            .cloned()
            .collect::<Vec<_>>();
        payments.sort_by_key(|p| (p.date, p.created_at));
        Ok(payments)
    }
}

impl Database<Insert<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        #[cfg(test)]
        if state.payments_unavailable {
            return Err(tracerr::new!(database::Error::from(
                memory::Error::Unavailable,
            )));
        }
        if let Some(cheque_id) = payment.cheque_id {
            if state.payments.values().any(|p| p.cheque_id == Some(cheque_id))
            {
                return Err(tracerr::new!(database::Error::from(
                    memory::Error::UniqueViolation(
                        constraint::PAYMENTS_CHEQUE_ID
                    ),
                )));
            }
        }
        _ = state.payments.insert(payment.id, payment);
        Ok(())
    }
}

impl Database<Update<Payment>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        _ = self.state().await.payments.insert(payment.id, payment);
        Ok(())
    }
}

impl Database<Delete<By<Payment, payment::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let mut state = self.state().await;
        _ = state.payments.remove(&by.into_inner());
        state.remove_orphaned_matches();
        Ok(())
    }
}

impl Database<Select<By<Vec<payment::Match>, payment::Id>>> for Memory {
    type Ok = Vec<payment::Match>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<payment::Match>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let payment_id = by.into_inner();
        let state = self.state().await;
        let mut matches = state
            .matches
            .iter()
            .filter(|((p, _), _)| *p == payment_id)
            .map(|(&(payment_id, schedule_id), &amount)| payment::Match {
                payment_id,
                schedule_id,
                amount,
            })
            .collect::<Vec<_>>();
        matches.sort_by_key(|m| {
            state.schedule.get(&m.schedule_id).map(|e| (e.due_date, e.id))
        });
        Ok(matches)
    }
}

impl Database<Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>>
    for Memory
{
    type Ok = HashMap<schedule::Id, Decimal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let lease_id = by.into_inner();
        let state = self.state().await;
        let mut paid = HashMap::new();
        for (&(_, schedule_id), &amount) in &state.matches {
            if state
                .schedule
                .get(&schedule_id)
                .is_some_and(|e| e.lease_id == lease_id)
            {
                *paid.entry(schedule_id).or_insert(Decimal::ZERO) += amount;
            }
        }
        Ok(paid)
    }
}

impl Database<Insert<Vec<payment::Match>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(matches): Insert<Vec<payment::Match>>,
    ) -> Result<Self::Ok, Self::Err> {
        self.state().await.matches.extend(
            matches
                .into_iter()
                .map(|m| ((m.payment_id, m.schedule_id), m.amount)),
        );
        Ok(())
    }
}

impl Database<Delete<By<Vec<payment::Match>, payment::Id>>> for Memory {
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<payment::Match>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        let payment_id = by.into_inner();
        self.state()
            .await
            .matches
            .retain(|(p, _), _| *p != payment_id);
        Ok(())
    }
}
