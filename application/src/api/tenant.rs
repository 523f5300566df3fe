//! [`Tenant`]-related definitions.

use common::DateTime;
use derive_more::{AsRef, Display, From, Into};
use juniper::{graphql_object, GraphQLScalar};
use service::domain;
use uuid::Uuid;

use crate::{api::scalar, Context};

/// A tenant renting properties.
#[derive(Clone, Debug, From, Into)]
pub struct Tenant(domain::Tenant);

/// A tenant renting properties.
#[graphql_object(context = Context)]
impl Tenant {
    /// Unique identifier of this `Tenant`.
    #[must_use]
    pub fn id(&self) -> Id {
        self.0.id.into()
    }

    /// Name of this `Tenant`.
    #[must_use]
    pub fn name(&self) -> Name {
        self.0.name.clone().into()
    }

    /// Email of this `Tenant`, if any.
    #[must_use]
    pub fn email(&self) -> Option<Email> {
        self.0.email.clone().map(Into::into)
    }

    /// Phone of this `Tenant`, if any.
    #[must_use]
    pub fn phone(&self) -> Option<Phone> {
        self.0.phone.clone().map(Into::into)
    }

    /// `DateTime` when this `Tenant` was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime {
        self.0.created_at.coerce()
    }
}

/// Unique identifier of a `Tenant`.
#[derive(Clone, Copy, Debug, Display, Into, From, GraphQLScalar)]
#[from(domain::tenant::Id)]
#[into(domain::tenant::Id)]
#[graphql(name = "TenantId", transparent)]
pub struct Id(Uuid);

/// Name of a `Tenant`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "TenantName", with = scalar::Via::<domain::tenant::Name>)]
pub struct Name(domain::tenant::Name);

/// Email of a `Tenant`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "TenantEmail", with = scalar::Via::<domain::tenant::Email>)]
pub struct Email(domain::tenant::Email);

/// Phone of a `Tenant`.
#[derive(AsRef, Clone, Debug, Display, From, GraphQLScalar, Into)]
#[graphql(name = "TenantPhone", with = scalar::Via::<domain::tenant::Phone>)]
pub struct Phone(domain::tenant::Phone);
