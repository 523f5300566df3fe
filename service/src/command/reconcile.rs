//! Re-derivation of the stored derived state shared by [`Command`]s.
//!
//! Every function here recomputes the state fully from the persisted facts
//! (matched amounts, leases of a property) and is meant to run inside the
//! transaction of the [`Command`] that changed those facts.

use std::collections::HashMap;

use common::{
    operations::{By, Insert, Select, Update},
    Date,
};
use rust_decimal::Decimal;
use tracerr::Traced;

#[cfg(doc)]
use crate::command::Command;
use crate::{
    domain::{
        lease,
        payment::{self, allocation},
        property::{self, Occupancy},
        schedule, Lease, Payment, Property,
    },
    infra::{database, Database},
};

/// [`Database`] operations required to re-derive [`schedule::Entry`]
/// statuses and to auto-match [`Payment`]s.
pub trait ScheduleDatabase:
    Database<
        Select<By<Vec<schedule::Entry>, lease::Id>>,
        Ok = Vec<schedule::Entry>,
        Err = Traced<database::Error>,
    > + Database<
        Select<
            By<HashMap<schedule::Id, schedule::Entry>, Vec<schedule::Id>>,
        >,
        Ok = HashMap<schedule::Id, schedule::Entry>,
        Err = Traced<database::Error>,
    > + Database<
        Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>,
        Ok = HashMap<schedule::Id, Decimal>,
        Err = Traced<database::Error>,
    > + Database<
        Insert<Vec<payment::Match>>,
        Ok = (),
        Err = Traced<database::Error>,
    > + Database<Update<schedule::Entry>, Ok = (), Err = Traced<database::Error>>
{
}

impl<T> ScheduleDatabase for T where
    T: Database<
            Select<By<Vec<schedule::Entry>, lease::Id>>,
            Ok = Vec<schedule::Entry>,
            Err = Traced<database::Error>,
        > + Database<
            Select<
                By<
                    HashMap<schedule::Id, schedule::Entry>,
                    Vec<schedule::Id>,
                >,
            >,
            Ok = HashMap<schedule::Id, schedule::Entry>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<HashMap<schedule::Id, Decimal>, lease::Id>>,
            Ok = HashMap<schedule::Id, Decimal>,
            Err = Traced<database::Error>,
        > + Database<
            Insert<Vec<payment::Match>>,
            Ok = (),
            Err = Traced<database::Error>,
        > + Database<
            Update<schedule::Entry>,
            Ok = (),
            Err = Traced<database::Error>,
        >
{
}

/// [`Database`] operations required to re-derive [`Property`]
/// [`Occupancy`].
pub trait OccupancyDatabase:
    Database<
        Select<By<Option<Property>, property::Id>>,
        Ok = Option<Property>,
        Err = Traced<database::Error>,
    > + Database<
        Select<By<Vec<Lease>, property::Id>>,
        Ok = Vec<Lease>,
        Err = Traced<database::Error>,
    > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
{
}

impl<T> OccupancyDatabase for T where
    T: Database<
            Select<By<Option<Property>, property::Id>>,
            Ok = Option<Property>,
            Err = Traced<database::Error>,
        > + Database<
            Select<By<Vec<Lease>, property::Id>>,
            Ok = Vec<Lease>,
            Err = Traced<database::Error>,
        > + Database<Update<Property>, Ok = (), Err = Traced<database::Error>>
{
}

/// Re-derives the paid amount and the status of the [`schedule::Entry`]s of
/// the [`Lease`] with the provided IDs, persisting the changed ones.
///
/// IDs of missing [`schedule::Entry`]s are ignored.
pub(crate) async fn refresh_schedule<Tx: ScheduleDatabase>(
    tx: &Tx,
    lease_id: lease::Id,
    ids: impl IntoIterator<Item = schedule::Id>,
    today: Date,
) -> Result<(), Traced<database::Error>> {
    let ids = ids.into_iter().collect::<Vec<_>>();
    if ids.is_empty() {
        return Ok(());
    }

    let entries = tx
        .execute(Select(
            By::<HashMap<schedule::Id, schedule::Entry>, _>::new(ids),
        ))
        .await
        .map_err(tracerr::wrap!())?;
    let paid = tx
        .execute(Select(By::<HashMap<schedule::Id, Decimal>, _>::new(
            lease_id,
        )))
        .await
        .map_err(tracerr::wrap!())?;

    for mut entry in entries.into_values() {
        let total = paid.get(&entry.id).copied().unwrap_or_default();
        if entry.refresh(total, today) {
            tx.execute(Update(entry))
                .await
                .map_err(tracerr::wrap!())?;
        }
    }
    Ok(())
}

/// Auto-matches the provided [`Payment`] against the outstanding
/// [`schedule::Entry`]s of its [`Lease`] oldest-due-first, and re-derives
/// the statuses of the touched ones.
pub(crate) async fn auto_match<Tx: ScheduleDatabase>(
    tx: &Tx,
    payment: &Payment,
    today: Date,
) -> Result<Vec<payment::Match>, Traced<database::Error>> {
    let entries = tx
        .execute(Select(By::<Vec<schedule::Entry>, _>::new(payment.lease_id)))
        .await
        .map_err(tracerr::wrap!())?;
    let paid = tx
        .execute(Select(By::<HashMap<schedule::Id, Decimal>, _>::new(
            payment.lease_id,
        )))
        .await
        .map_err(tracerr::wrap!())?;

    let matches = allocation::auto(payment, &entries, &paid);
    if matches.is_empty() {
        return Ok(matches);
    }
    tx.execute(Insert(matches.clone()))
        .await
        .map_err(tracerr::wrap!())?;

    let applied = matches
        .iter()
        .map(|m| (m.schedule_id, m.amount))
        .collect::<HashMap<_, _>>();
    for mut entry in entries {
        let Some(amount) = applied.get(&entry.id) else {
            continue;
        };
        let total = paid.get(&entry.id).copied().unwrap_or_default() + amount;
        if entry.refresh(total, today) {
            tx.execute(Update(entry))
                .await
                .map_err(tracerr::wrap!())?;
        }
    }
    Ok(matches)
}

/// Re-derives the [`Occupancy`] of the [`Property`] with the provided ID,
/// persisting it if changed.
///
/// The [`Lease`] with the `excluded` ID is not taken into account.
///
/// Returns [`None`] if the [`Property`] doesn't exist.
pub(crate) async fn refresh_occupancy<Tx: OccupancyDatabase>(
    tx: &Tx,
    property_id: property::Id,
    today: Date,
    excluded: Option<lease::Id>,
) -> Result<Option<Property>, Traced<database::Error>> {
    let Some(mut property) = tx
        .execute(Select(By::<Option<Property>, _>::new(property_id)))
        .await
        .map_err(tracerr::wrap!())?
    else {
        return Ok(None);
    };
    let leases = tx
        .execute(Select(By::<Vec<Lease>, _>::new(property_id)))
        .await
        .map_err(tracerr::wrap!())?;

    let occupancy = Occupancy::derive(&leases, today, excluded);
    if property.occupancy != occupancy {
        property.occupancy = occupancy;
        tx.execute(Update(property.clone()))
            .await
            .map_err(tracerr::wrap!())?;
    }
    Ok(Some(property))
}
