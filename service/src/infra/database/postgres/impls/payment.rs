//! [`Payment`]-related [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{cheque, lease, payment, schedule, Payment},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Payment`] out of the provided [`Row`].
fn payment(row: &Row) -> Payment {
    Payment {
        id: row.get("id"),
        lease_id: row.get("lease_id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        cheque_id: row.get("cheque_id"),
        date: row.get("date"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        method: row.get("method"),
        reference: row.get("reference"),
        created_at: row.get("created_at"),
        archived_at: row.get("archived_at"),
    }
}

impl<C> Database<Select<By<Option<Payment>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, cheque_id, \
                   date, amount, currency, method, reference, \
                   created_at, archived_at \
            FROM payments \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment))
    }
}

impl<C> Database<Select<By<Option<Payment>, cheque::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Payment>, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let cheque_id: cheque::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, cheque_id, \
                   date, amount, currency, method, reference, \
                   created_at, archived_at \
            FROM payments \
            WHERE cheque_id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&cheque_id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(payment))
    }
}

impl<C> Database<Select<By<Vec<Payment>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Payment>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Payment>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let lease_id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, cheque_id, \
                   date, amount, currency, method, reference, \
                   created_at, archived_at \
            FROM payments \
            WHERE lease_id = $1::UUID \
            ORDER BY date ASC, created_at ASC";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(payment)
            .collect())
    }
}

impl<C> Database<Insert<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(payment): Insert<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            lease_id,
            property_id,
            tenant_id,
            cheque_id,
            date,
            amount,
            method,
            reference,
            created_at,
            archived_at,
        } = payment;

        // No upsert here: a second `Payment` of the same `Cheque` must fail
        // with the `payments_cheque_id_key` unique violation.
        const SQL: &str = "\
            INSERT INTO payments (\
                id, lease_id, property_id, tenant_id, cheque_id, \
                date, amount, currency, method, reference, \
                created_at, archived_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, $5::UUID, \
                $6::DATE, $7::NUMERIC, $8::INT2, $9::INT2, $10::VARCHAR, \
                $11::TIMESTAMPTZ, $12::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[
                &id,
                &lease_id,
                &property_id,
                &tenant_id,
                &cheque_id,
                &date,
                &amount.amount,
                &amount.currency,
                &method,
                &reference,
                &created_at,
                &archived_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Update<Payment>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(payment): Update<Payment>,
    ) -> Result<Self::Ok, Self::Err> {
        let Payment {
            id,
            date,
            amount,
            method,
            reference,
            archived_at,
            ..
        } = payment;

        const SQL: &str = "\
            UPDATE payments \
            SET date = $2::DATE, \
                amount = $3::NUMERIC, \
                currency = $4::INT2, \
                method = $5::INT2, \
                reference = $6::VARCHAR, \
                archived_at = $7::TIMESTAMPTZ \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &date,
                &amount.amount,
                &amount.currency,
                &method,
                &reference,
                &archived_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Payment, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Payment, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: payment::Id = by.into_inner();

        // Matches are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM payments \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Select<By<Vec<payment::Match>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<payment::Match>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<payment::Match>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let payment_id: payment::Id = by.into_inner();

        const SQL: &str = "\
            SELECT m.payment_id, m.rent_schedule_id, m.amount \
            FROM payment_schedule_matches AS m \
            INNER JOIN rent_schedules AS s ON s.id = m.rent_schedule_id \
            WHERE m.payment_id = $1::UUID \
            ORDER BY s.due_date ASC, s.id ASC";
        Ok(self
            .query(SQL, &[&payment_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| payment::Match {
                payment_id: row.get("payment_id"),
                schedule_id: row.get("rent_schedule_id"),
                amount: row.get("amount"),
            })
            .collect())
    }
}

impl<C> Database<Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = HashMap<schedule::Id, Decimal>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let lease_id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT m.rent_schedule_id, SUM(m.amount) AS paid \
            FROM payment_schedule_matches AS m \
            INNER JOIN rent_schedules AS s ON s.id = m.rent_schedule_id \
            WHERE s.lease_id = $1::UUID \
            GROUP BY m.rent_schedule_id";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .into_iter()
            .map(|row| (row.get("rent_schedule_id"), row.get("paid")))
            .collect())
    }
}

impl<C> Database<Insert<Vec<payment::Match>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(matches): Insert<Vec<payment::Match>>,
    ) -> Result<Self::Ok, Self::Err> {
        if matches.is_empty() {
            return Ok(());
        }

        let values = (0..matches.len())
            .map(|i| {
                let n = i * 3;
                format!(
                    "(${}::UUID, ${}::UUID, ${}::NUMERIC)",
                    n + 1,
                    n + 2,
                    n + 3,
                )
            })
            .join(", ");
        let params = matches
            .iter()
            .flat_map(|m| -> [&(dyn ToSql + Sync); 3] {
                [&m.payment_id, &m.schedule_id, &m.amount]
            })
            .collect::<Vec<_>>();

        let sql = format!(
            "INSERT INTO payment_schedule_matches (\
                 payment_id, rent_schedule_id, amount \
             ) VALUES {values} \
             ON CONFLICT (payment_id, rent_schedule_id) DO UPDATE \
             SET amount = EXCLUDED.amount",
        );
        self.exec(sql.as_str(), &params)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Delete<By<Vec<payment::Match>, payment::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<payment::Match>, payment::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let payment_id: payment::Id = by.into_inner();

        const SQL: &str = "\
            DELETE FROM payment_schedule_matches \
            WHERE payment_id = $1::UUID";
        self.exec(SQL, &[&payment_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
