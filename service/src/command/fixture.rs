//! Shared setup of [`Command`] tests.

use std::time::Duration;

use common::{money::Currency, Date, Money};
use jsonwebtoken::DecodingKey;
use rust_decimal::Decimal;

#[cfg(doc)]
use crate::Command;
use crate::{
    command::{CreateLease, CreateProperty, CreateTenant},
    domain::{
        account,
        lease::{DueDay, Frequency},
        property, tenant, Caller, Lease, Property, Tenant,
    },
    infra::Memory,
    task, Config, Command as _, FixedClock, Service,
};

/// Secret the access tokens are signed with in tests.
pub(crate) const JWT_SECRET: &[u8] = b"secret";

/// Parses the provided `YYYY-MM-DD` string as a [`Date`].
pub(crate) fn date(s: &str) -> Date {
    s.parse().unwrap()
}

/// Parses the provided string as a [`Decimal`].
pub(crate) fn decimal(s: &str) -> Decimal {
    s.parse().unwrap()
}

/// Parses the provided string as an AED [`Money`] amount.
pub(crate) fn aed(s: &str) -> Money {
    Money {
        amount: decimal(s),
        currency: Currency::Aed,
    }
}

/// Creates a new [`Service`] over an empty [`Memory`] database, living on
/// the provided `today` date.
pub(crate) fn service(today: &str) -> Service<Memory> {
    Service::with_clock(
        Config {
            jwt_decoding_key: DecodingKey::from_secret(JWT_SECRET),
            refresh_schedule_on_payment_deletion: false,
            refresh_overdue_schedules: task::refresh_overdue_schedules::Config {
                interval: Duration::from_secs(3600),
            },
        },
        Memory::new(),
        FixedClock(date(today)),
    )
}

/// Returns the same [`Service`] (sharing its database) living on another
/// `today` date.
pub(crate) fn at(svc: &Service<Memory>, today: &str) -> Service<Memory> {
    Service::with_clock(
        svc.config().clone(),
        svc.database().clone(),
        FixedClock(date(today)),
    )
}

/// Registered owner with a single Dubai [`Property`] and a [`Tenant`].
pub(crate) struct Setup {
    /// [`Service`] everything is registered in.
    pub(crate) svc: Service<Memory>,

    /// [`Caller`] owning the [`Property`].
    pub(crate) owner: Caller,

    /// Registered [`Property`].
    pub(crate) property: Property,

    /// Registered [`Tenant`].
    pub(crate) tenant: Tenant,
}

/// Registers an owner with a Dubai [`Property`] and a [`Tenant`] in a new
/// [`Service`] living on the provided `today` date.
pub(crate) async fn setup(today: &str) -> Setup {
    let svc = service(today);
    let owner = Caller::owner(account::Id::new());

    let property = svc
        .execute(CreateProperty {
            caller: owner,
            name: property::Name::new("Marina Heights 1204").unwrap(),
            country: property::Country::Uae,
            currency: None,
        })
        .await
        .unwrap();
    let tenant = svc
        .execute(CreateTenant {
            caller: owner,
            name: tenant::Name::new("Aisha Rahman").unwrap(),
            email: None,
            phone: None,
        })
        .await
        .unwrap();

    Setup {
        svc,
        owner,
        property,
        tenant,
    }
}

impl Setup {
    /// Creates a monthly [`Lease`] of the [`Property`] with the rent due on
    /// the 1st day of month.
    pub(crate) async fn lease(
        &self,
        start: &str,
        end: &str,
        rent: &str,
    ) -> Lease {
        self.svc
            .execute(CreateLease {
                caller: self.owner,
                property_id: self.property.id,
                tenant_id: self.tenant.id,
                start: date(start),
                end: date(end),
                frequency: Frequency::Monthly,
                rent: aed(rent),
                due_day: DueDay::new(1).unwrap(),
                security_deposit: None,
            })
            .await
            .unwrap()
    }
}
