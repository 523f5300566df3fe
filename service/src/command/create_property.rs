//! [`Command`] for creating a new [`Property`].

use common::{money::Currency, operations::Insert, DateTime};
use tracerr::Traced;

use crate::{
    domain::{
        property::{self, Occupancy},
        Caller, Property,
    },
    infra::{database, Database},
    Service,
};

use super::Command;

/// [`Command`] for creating a new [`Property`] owned by the [`Caller`].
#[derive(Clone, Debug)]
pub struct CreateProperty {
    /// [`Caller`] becoming the owner of the new [`Property`].
    pub caller: Caller,

    /// [`property::Name`] of the new [`Property`].
    pub name: property::Name,

    /// [`property::Country`] the new [`Property`] is located in.
    pub country: property::Country,

    /// [`Currency`] the rent of the new [`Property`] is tracked in.
    ///
    /// Defaults to the native [`Currency`] of the [`property::Country`].
    pub currency: Option<Currency>,
}

impl<Db> Command<CreateProperty> for Service<Db>
where
    Db: Database<Insert<Property>, Err = Traced<database::Error>>,
{
    type Ok = Property;
    type Err = Traced<database::Error>;

    async fn execute(
        &self,
        cmd: CreateProperty,
    ) -> Result<Self::Ok, Self::Err> {
        let CreateProperty {
            caller,
            name,
            country,
            currency,
        } = cmd;

        let property = Property {
            id: property::Id::new(),
            owner_id: caller.account_id,
            name,
            country,
            currency: currency.unwrap_or(country.currency()),
            occupancy: Occupancy::Vacant,
            created_at: DateTime::now().coerce(),
            archived_at: None,
        };

        self.database()
            .execute(Insert(property.clone()))
            .await
            .map_err(tracerr::wrap!())
            .map(drop)?;

        Ok(property)
    }
}

#[cfg(test)]
mod spec {
    use common::money::Currency;

    use crate::{
        command::fixture,
        domain::{account, property, Caller},
        query, Command as _,
    };

    use super::CreateProperty;

    #[tokio::test]
    async fn creates_vacant_property_in_native_currency() {
        let svc = fixture::service("2026-01-01");
        let owner = Caller::owner(account::Id::new());

        let property = svc
            .execute(CreateProperty {
                caller: owner,
                name: property::Name::new("Koramangala 5th Block").unwrap(),
                country: property::Country::India,
                currency: None,
            })
            .await
            .unwrap();

        assert_eq!(property.owner_id, owner.account_id);
        assert_eq!(property.currency, Currency::Inr);
        assert_eq!(property.occupancy, property::Occupancy::Vacant);

        let listed = svc.execute(query::property::List::by(owner)).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, property.id);
    }

    #[tokio::test]
    async fn is_invisible_to_other_callers() {
        let svc = fixture::service("2026-01-01");
        let owner = Caller::owner(account::Id::new());
        let stranger = Caller::owner(account::Id::new());
        let manager = Caller::manager(account::Id::new());

        let property = svc
            .execute(CreateProperty {
                caller: owner,
                name: property::Name::new("JLT Cluster D").unwrap(),
                country: property::Country::Uae,
                currency: None,
            })
            .await
            .unwrap();

        for caller in [stranger, manager] {
            let found = svc
                .execute(query::property::ById::by((property.id, caller)))
                .await
                .unwrap();
            assert!(found.is_none(), "visible to {caller:?}");
        }

        svc.database().grant(property.id, manager.account_id).await;
        let found = svc
            .execute(query::property::ById::by((property.id, manager)))
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.id), Some(property.id));
    }
}
