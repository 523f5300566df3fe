//! [`Lease`]-related [`Database`] implementations.

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Money,
};
use rust_decimal::Decimal;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{
        lease::{self, DueDay, Period},
        property, Lease,
    },
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Lease`] out of the provided [`Row`].
fn lease(row: &Row) -> Lease {
    Lease {
        id: row.get("id"),
        property_id: row.get("property_id"),
        tenant_id: row.get("tenant_id"),
        period: Period::new(row.get("start_date"), row.get("end_date"))
            .expect("`CHECK (end_date > start_date)` constraint"),
        frequency: row.get("frequency"),
        rent: Money {
            amount: row.get("rent"),
            currency: row.get("rent_currency"),
        },
        due_day: u8::try_from(row.get::<_, i16>("due_day"))
            .ok()
            .and_then(DueDay::new)
            .expect("`CHECK (due_day BETWEEN 1 AND 31)` constraint"),
        security_deposit: row
            .get::<_, Option<Decimal>>("security_deposit")
            .map(|amount| Money {
                amount,
                currency: row.get("security_deposit_currency"),
            }),
        termination_date: row.get("termination_date"),
        created_at: row.get("created_at"),
        archived_at: row.get("archived_at"),
    }
}

impl<C> Database<Select<By<Option<Lease>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Lease>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, tenant_id, start_date, end_date, \
                   frequency, rent, rent_currency, due_day, \
                   security_deposit, security_deposit_currency, \
                   termination_date, created_at, archived_at \
            FROM leases \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(lease))
    }
}

impl<C> Database<Select<By<Vec<Lease>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Lease>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Lease>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let property_id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, property_id, tenant_id, start_date, end_date, \
                   frequency, rent, rent_currency, due_day, \
                   security_deposit, security_deposit_currency, \
                   termination_date, created_at, archived_at \
            FROM leases \
            WHERE property_id = $1::UUID \
            ORDER BY start_date ASC, created_at ASC";
        Ok(self
            .query(SQL, &[&property_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(lease)
            .collect())
    }
}

impl<C> Database<Insert<Lease>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Lease>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(lease): Insert<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(lease)).await.map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Lease>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(lease): Update<Lease>,
    ) -> Result<Self::Ok, Self::Err> {
        let Lease {
            id,
            property_id,
            tenant_id,
            period,
            frequency,
            rent,
            due_day,
            security_deposit,
            termination_date,
            created_at,
            archived_at,
        } = lease;

        let due_day = i16::from(due_day.get());
        let deposit = security_deposit.map(|m| m.amount);
        let deposit_currency = security_deposit.map(|m| m.currency);

        const SQL: &str = "\
            INSERT INTO leases (\
                id, property_id, tenant_id, start_date, end_date, \
                frequency, rent, rent_currency, due_day, \
                security_deposit, security_deposit_currency, \
                termination_date, created_at, archived_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::UUID, $4::DATE, $5::DATE, \
                $6::INT2, $7::NUMERIC, $8::INT2, $9::INT2, \
                $10::NUMERIC, $11::INT2, \
                $12::DATE, $13::TIMESTAMPTZ, $14::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET property_id = EXCLUDED.property_id, \
                tenant_id = EXCLUDED.tenant_id, \
                start_date = EXCLUDED.start_date, \
                end_date = EXCLUDED.end_date, \
                frequency = EXCLUDED.frequency, \
                rent = EXCLUDED.rent, \
                rent_currency = EXCLUDED.rent_currency, \
                due_day = EXCLUDED.due_day, \
                security_deposit = EXCLUDED.security_deposit, \
                security_deposit_currency = \
                    EXCLUDED.security_deposit_currency, \
                termination_date = EXCLUDED.termination_date, \
                created_at = EXCLUDED.created_at, \
                archived_at = EXCLUDED.archived_at";
        self.exec(
            SQL,
            &[
                &id,
                &property_id,
                &tenant_id,
                &period.start(),
                &period.end(),
                &frequency,
                &rent.amount,
                &rent.currency,
                &due_day,
                &deposit,
                &deposit_currency,
                &termination_date,
                &created_at,
                &archived_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Lease, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Lease, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: lease::Id = by.into_inner();

        // Schedule entries, cheques, payments and their matches are removed
        // by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM leases \
            WHERE id = $1::UUID";
        self.exec(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
