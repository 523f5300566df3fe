//! [`Property`]-related [`Database`] implementations.

use common::operations::{By, Insert, Lock, Select, Update};
use tokio_postgres::Row;
use tracerr::Traced;

use crate::{
    domain::{property, Caller, Property},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

/// Builds a [`Property`] out of the provided [`Row`].
fn property(row: &Row) -> Property {
    Property {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        country: row.get("country"),
        currency: row.get("currency"),
        occupancy: row.get("occupancy"),
        created_at: row.get("created_at"),
        archived_at: row.get("archived_at"),
    }
}

impl<C> Database<Select<By<Option<Property>, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, name, country, currency, occupancy, \
                   created_at, archived_at \
            FROM properties \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(property))
    }
}

impl<C> Database<Select<By<Option<Property>, (property::Id, Caller)>>>
    for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Property>, (property::Id, Caller)>>,
    ) -> Result<Self::Ok, Self::Err> {
        let (id, caller) = by.into_inner();

        const SQL: &str = "\
            SELECT p.id, p.owner_id, p.name, p.country, p.currency, \
                   p.occupancy, p.created_at, p.archived_at \
            FROM properties AS p \
            WHERE p.id = $1::UUID \
              AND CASE $3::INT2 \
                  WHEN 1 THEN p.owner_id = $2::UUID \
                  ELSE EXISTS (SELECT 1 \
                               FROM property_managers AS m \
                               WHERE m.property_id = p.id \
                                 AND m.manager_id = $2::UUID) \
                  END";
        Ok(self
            .query_opt(SQL, &[&id, &caller.account_id, &caller.role])
            .await
            .map_err(tracerr::wrap!())?
            .as_ref()
            .map(property))
    }
}

impl<C> Database<Select<By<Vec<Property>, Caller>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Vec<Property>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Vec<Property>, Caller>>,
    ) -> Result<Self::Ok, Self::Err> {
        let caller = by.into_inner();

        const SQL: &str = "\
            SELECT p.id, p.owner_id, p.name, p.country, p.currency, \
                   p.occupancy, p.created_at, p.archived_at \
            FROM properties AS p \
            WHERE p.archived_at IS NULL \
              AND CASE $2::INT2 \
                  WHEN 1 THEN p.owner_id = $1::UUID \
                  ELSE EXISTS (SELECT 1 \
                               FROM property_managers AS m \
                               WHERE m.property_id = p.id \
                                 AND m.manager_id = $1::UUID) \
                  END \
            ORDER BY p.created_at ASC";
        Ok(self
            .query(SQL, &[&caller.account_id, &caller.role])
            .await
            .map_err(tracerr::wrap!())?
            .iter()
            .map(property)
            .collect())
    }
}

impl<C> Database<Insert<Property>> for Postgres<C>
where
    C: Connection,
    Self: Database<Update<Property>, Ok = (), Err = Traced<database::Error>>,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(property): Insert<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        self.execute(Update(property))
            .await
            .map_err(tracerr::wrap!())
    }
}

impl<C> Database<Update<Property>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Update(property): Update<Property>,
    ) -> Result<Self::Ok, Self::Err> {
        let Property {
            id,
            owner_id,
            name,
            country,
            currency,
            occupancy,
            created_at,
            archived_at,
        } = property;

        const SQL: &str = "\
            INSERT INTO properties (\
                id, owner_id, name, country, currency, occupancy, \
                created_at, archived_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::INT2, $5::INT2, $6::INT2, \
                $7::TIMESTAMPTZ, $8::TIMESTAMPTZ \
            ) \
            ON CONFLICT (id) DO UPDATE \
            SET owner_id = EXCLUDED.owner_id, \
                name = EXCLUDED.name, \
                country = EXCLUDED.country, \
                currency = EXCLUDED.currency, \
                occupancy = EXCLUDED.occupancy, \
                created_at = EXCLUDED.created_at, \
                archived_at = EXCLUDED.archived_at";
        self.exec(
            SQL,
            &[
                &id,
                &owner_id,
                &name,
                &country,
                &currency,
                &occupancy,
                &created_at,
                &archived_at,
            ],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}

impl<C> Database<Lock<By<Property, property::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Lock(by): Lock<By<Property, property::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: property::Id = by.into_inner();

        const SQL: &str = "\
            SELECT pg_advisory_xact_lock(hashtextextended($1::UUID::TEXT, 0))";
        self.query(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())
            .map(drop)
    }
}
