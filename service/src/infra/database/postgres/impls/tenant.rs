//! [`Tenant`]-related [`Database`] implementations.

use common::operations::{By, Insert, Select};
use tracerr::Traced;

use crate::{
    domain::{tenant, Tenant},
    infra::{
        database::{self, postgres::Connection, Postgres},
        Database,
    },
};

impl<C> Database<Select<By<Option<Tenant>, tenant::Id>>> for Postgres<C>
where
    C: Connection,
{
    type Ok = Option<Tenant>;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Select(by): Select<By<Option<Tenant>, tenant::Id>>,
    ) -> Result<Self::Ok, Self::Err> {
        // Avoid subtle change for SQL.
        let id: tenant::Id = by.into_inner();

        const SQL: &str = "\
            SELECT id, owner_id, name, email, phone, created_at \
            FROM tenants \
            WHERE id = $1::UUID";
        Ok(self
            .query_opt(SQL, &[&id])
            .await
            .map_err(tracerr::wrap!())?
            .map(|row| Tenant {
                id: row.get("id"),
                owner_id: row.get("owner_id"),
                name: row.get("name"),
                email: row.get("email"),
                phone: row.get("phone"),
                created_at: row.get("created_at"),
            }))
    }
}

impl<C> Database<Insert<Tenant>> for Postgres<C>
where
    C: Connection,
{
    type Ok = ();
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        Insert(tenant): Insert<Tenant>,
    ) -> Result<Self::Ok, Self::Err> {
        let Tenant {
            id,
            owner_id,
            name,
            email,
            phone,
            created_at,
        } = tenant;

        const SQL: &str = "\
            INSERT INTO tenants (\
                id, owner_id, name, email, phone, created_at \
            ) VALUES (\
                $1::UUID, $2::UUID, $3::VARCHAR, \
                $4::VARCHAR, $5::VARCHAR, \
                $6::TIMESTAMPTZ \
            )";
        self.exec(
            SQL,
            &[&id, &owner_id, &name, &email, &phone, &created_at],
        )
        .await
        .map_err(tracerr::wrap!())
        .map(drop)
    }
}
