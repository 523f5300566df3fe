//! [`Command`] for creating a new [`Tenant`].

use common::{operations::Insert, DateTime};
use tracerr::Traced;

use crate::{
    domain::{tenant, Caller, Tenant},
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Tenant`] in the scope of the [`Caller`].
#[derive(Clone, Debug)]
pub struct CreateTenant {
    /// [`Caller`] the new [`Tenant`] is registered by.
    pub caller: Caller,

    /// [`tenant::Name`] of the new [`Tenant`].
    pub name: tenant::Name,

    /// [`tenant::Email`] of the new [`Tenant`], if any.
    pub email: Option<tenant::Email>,

    /// [`tenant::Phone`] of the new [`Tenant`], if any.
    pub phone: Option<tenant::Phone>,
}

impl<Db> Command<CreateTenant> for Service<Db>
where
    Db: Database<Insert<Tenant>, Err = Traced<database::Error>>,
{
    type Ok = Tenant;
    type Err = Traced<database::Error>;

    async fn execute(&self, cmd: CreateTenant) -> Result<Self::Ok, Self::Err> {
        let CreateTenant {
            caller,
            name,
            email,
            phone,
        } = cmd;

        let tenant = Tenant {
            id: tenant::Id::new(),
            owner_id: caller.account_id,
            name,
            email,
            phone,
            created_at: DateTime::now().coerce(),
        };

        self.database()
            .execute(Insert(tenant.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(tenant)
    }
}
