//! [`Cheque`]-related [`Database`] implementations.

use common::{
    operations::{By, Insert, Lock, Select, Update},
    Money,
};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{cheque, lease, Cheque},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`Cheque`] out of the provided [`Row`].
fn cheque(row: &Row) -> Cheque {
    Cheque {
        id: row.get("id"),
        lease_id: row.get("lease_id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        number: row.get("number"),
        bank_name: row.get("bank_name"),
        date: row.get("date"),
        amount: Money {
            amount: row.get("amount"),
            currency: row.get("currency"),
        },
        covers_period: row.get("covers_period"),
        status: row.get("status"),
        deposited_on: row.get("deposited_on"),
        settled_on: row.get("settled_on"),
        bounce_reason: row.get("bounce_reason"),
        replaced_by: row.get("replaced_by"),
        created_at: row.get("created_at"),
        archived_at: row.get("archived_at"),
    }
}

impl<C> Database<Select<By<Option<Cheque>, cheque::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Cheque>, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: cheque::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, \
                   number, bank_name, date, amount, currency, covers_period, \
                   status, deposited_on, settled_on, bounce_reason, \
                   replaced_by, created_at, archived_at \
            FROM cheques \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(cheque))
    }
}

impl<C> Database<Select<By<Vec<Cheque>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Cheque>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let lease_id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, property_id, tenant_id, \
                   number, bank_name, date, amount, currency, covers_period, \
                   status, deposited_on, settled_on, bounce_reason, \
                   replaced_by, created_at, archived_at \
            FROM cheques \
            WHERE lease_id = $1::UUID \
            ORDER BY date ASC, created_at ASC";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(cheque)
            .collect())
    }
}

impl<C> Database<Select<By<Vec<Cheque>, read::cheque::Upcoming>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Cheque>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Cheque>, read::cheque::Upcoming>>,
    ) -> Result<Self::Ok, Self::Err> {
        let read::cheque::Upcoming { caller, from, to } = by.into_inner();

        const SQL: &str = "\
            SELECT c.id, c.lease_id, c.property_id, c.tenant_id, \
                   c.number, c.bank_name, c.date, c.amount, c.currency, \
                   c.covers_period, c.status, c.deposited_on, c.settled_on, \
                   c.bounce_reason, c.replaced_by, c.created_at, \
                   c.archived_at \
            FROM cheques AS c \
            INNER JOIN properties AS p ON p.id = c.property_id \
            WHERE c.archived_at IS NULL \
              AND c.status IN ($3::INT2, $4::INT2) \
              AND c.date BETWEEN $5::DATE AND $6::DATE \
              AND CASE $2::INT2 \
                  WHEN 1 THEN p.owner_id = $1::UUID \
                  ELSE EXISTS (SELECT 1 \
                               FROM property_managers AS m \
                               WHERE m.property_id = p.id \
                                 AND m.manager_id = $1::UUID) \
                  END \
            ORDER BY c.date ASC, c.created_at ASC";
        Ok(self
            .query(
                SQL,
                &[
                    &caller.account_id,
                    &caller.role,
                    &cheque::Status::Received,
                    &cheque::Status::Deposited,
                    &from,
                    &to,
                ],
            )
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(cheque)
            .collect())
    }
}

impl<C> Database<Insert<Cheque>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Cheque>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(cheque): Insert<Cheque>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(cheque)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Cheque>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(cheque): Update<Cheque>,
    ) -> Result<Self::Ok, Self::Err> {
        let Cheque {
            id,
            lease_id,
            property_id,
            tenant_id,
            number,
            bank_name,
            date,
            amount,
            covers_period,
            status,
            deposited_on,
            settled_on,
            bounce_reason,
            replaced_by,
            created_at,
            archived_at,
        } = cheque;

        const SQL: &str = "\
            INSERT INTO cheques (\
                id, lease_id, property_id, tenant_id, \
                number, bank_name, date, amount, currency, covers_period, \
                status, deposited_on, settled_on, bounce_reason, \
                replaced_by, created_at, archived_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::UUID, \
                $5::VARCHAR, $6::VARCHAR, $7::DATE, \
                $8::NUMERIC, $9::INT2, $10::VARCHAR, \
                $11::INT2, $12::DATE, $13::DATE, $14::VARCHAR, \
                $15::UUID, $16::TIMESTAMPTZ, $17::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET number = EXCLUDED.number, \
                bank_name = EXCLUDED.bank_name, \
                date = EXCLUDED.date, \
                amount = EXCLUDED.amount, \
                currency = EXCLUDED.currency, \
                covers_period = EXCLUDED.covers_period, \
                status = EXCLUDED.status, \
                deposited_on = EXCLUDED.deposited_on, \
                settled_on = EXCLUDED.settled_on, \
                bounce_reason = EXCLUDED.bounce_reason, \
                replaced_by = EXCLUDED.replaced_by, \
                archived_at = EXCLUDED.archived_at";
        self.exec(
            SQL,
            &[
                &id,
                &lease_id,
                &property_id,
                &tenant_id,
                &number,
                &bank_name,
                &date,
                &amount.amount,
                &amount.currency,
                &covers_period,
                &status,
                &deposited_on,
                &settled_on,
                &bounce_reason,
                &replaced_by,
                &created_at,
                &archived_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Cheque, cheque::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Cheque, cheque::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: cheque::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id \
            FROM cheques \
            WHERE id = $1::UUID \
            FOR UPDATE";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
