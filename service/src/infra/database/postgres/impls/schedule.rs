//! Rent schedule [`Database`] implementations.

use std::collections::HashMap;

use common::{
    operations::{By, Delete, Insert, Select, Update},
    Date, Money,
};
use itertools::Itertools as _;
use postgres_types::ToSql;
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{lease, schedule},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
    read,
};

/// Builds a [`schedule::Entry`] out of the provided [`Row`].
fn entry(row: &Row) -> schedule::Entry {
    schedule::Entry {
        id: row.get("id"),
        lease_id: row.get("lease_id"),
        due_date: row.get("due_date"),
        expected: Money {
            amount: row.get("expected"),
            currency: row.get("expected_currency"),
        },
        paid: row.get("paid"),
        status: row.get("status"),
    }
}

impl<C> Database<Select<By<Vec<schedule::Entry>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<schedule::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<schedule::Entry>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let lease_id: lease::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, lease_id, due_date, expected, expected_currency, \
                   paid, status \
            FROM rent_schedules \
            WHERE lease_id = $1::UUID \
            ORDER BY due_date ASC, id ASC";
        Ok(self
            .query(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(entry)
            .collect())
    }
}

impl<C, IDs> Database<Select<By<HashMap<schedule::Id, schedule::Entry>, IDs>>>
    for Postgres<C>
where
    C: Connection,
    IDs: AsRef<[schedule::Id]>,
{
    type Ok = HashMap<schedule::Id, schedule::Entry>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<HashMap<schedule::Id, schedule::Entry>, IDs>>,
    ) -> Result<Self::Ok, Self::Err> {
        let ids = by.into_inner();
        // Avoid subtle change for SQL.
        let ids: &[schedule::Id] = ids.as_ref();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        const SQL: &str = "\
            SELECT id, lease_id, due_date, expected, expected_currency, \
                   paid, status \
            FROM rent_schedules \
            WHERE id = ANY($1::UUID[])";
        Ok(self
            .query(SQL, &[&ids])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(|row| {
                let e = entry(row);
                (e.id, e)
            })
            .collect())
    }
}

impl<C> Database<Insert<Vec<schedule::Entry>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(entries): Insert<Vec<schedule::Entry>>,
    ) -> Result<Self::Ok, Self::Err> {
        if entries.is_empty() {
            return Ok(());
        }

        let values = (0..entries.len())
            .map(|i| {
                let n = i * 7;
                format!(
                    "(${}::UUID, ${}::UUID, ${}::DATE, ${}::NUMERIC, \
                      ${}::INT2, ${}::NUMERIC, ${}::INT2)",
                    n + 1,
                    n + 2,
                    n + 3,
                    n + 4,
                    n + 5,
                    n + 6,
                    n + 7,
                )
            })
            .join(", ");
        let params = entries
            .iter()
            .flat_map(|e| -> [&(dyn ToSql + Sync); 7] {
                [
                    &e.id,
                    &e.lease_id,
                    &e.due_date,
                    &e.expected.amount,
                    &e.expected.currency,
                    &e.paid,
                    &e.status,
                ]
            })
            .collect::<Vec<_>>();

        let sql = format!(
            "INSERT INTO rent_schedules (\
                 id, lease_id, due_date, expected, expected_currency, \
                 paid, status \
             ) VALUES {values}",
        );
        self.exec(sql.as_str(), &params)
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<schedule::Entry>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(entry): Update<schedule::Entry>,
    ) -> Result<Self::Ok, Self::Err> {
        let schedule::Entry {
            id,
            lease_id: _,
            due_date,
            expected,
            paid,
            status,
        } = entry;

        const SQL: &str = "\
            UPDATE rent_schedules \
            SET due_date = $2::DATE, \
                expected = $3::NUMERIC, \
                expected_currency = $4::INT2, \
                paid = $5::NUMERIC, \
                status = $6::INT2 \
            WHERE id = $1::UUID";
        self.exec(
            SQL,
            &[
                &id,
                &due_date,
                &expected.amount,
                &expected.currency,
                &paid,
                &status,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Delete<By<Vec<schedule::Entry>, lease::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Delete(by): Delete<By<Vec<schedule::Entry>, lease::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let lease_id: lease::Id = by.into_inner();

        // Matches are removed by `ON DELETE CASCADE`.
        const SQL: &str = "\
            DELETE FROM rent_schedules \
            WHERE lease_id = $1::UUID";
        self.exec(SQL, &[&lease_id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}

impl<C> Database<Update<By<read::schedule::Overdue, Date>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = u64;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(by): Update<By<read::schedule::Overdue, Date>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let today: Date = by.into_inner();

        const SQL: &str = "\
            UPDATE rent_schedules \
            SET status = $2::INT2 \
            WHERE status = $1::INT2 \
              AND paid IS NULL \
              AND due_date < $3::DATE";
        self.exec(
            SQL,
            &[
                &schedule::Status::Due,
                &schedule::Status::Overdue,
                &today,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
    }
}
