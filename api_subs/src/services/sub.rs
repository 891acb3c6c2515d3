use common::{
    error::{AppError, Res},
    session::Principal,
};
use db::{
    Store,
    dtos::audit_log::AuditTrail,
    models::{audit_log::AuditLog, subscription::Subscription},
};
use serde_json::{Map, Value};

use crate::dtos::sub::{parse_create, parse_update};

/// How many audit events the history endpoint returns.
pub const AUDIT_LOG_LIMIT: i64 = 100;

/// Active subscriptions of `actor`, in insertion order.
pub async fn list_subscriptions(store: &dyn Store, actor: &impl Principal) -> Res<Vec<Subscription>> {
    store
        .get_active_subscriptions_by_user_id(actor.principal_id())
        .await
}

/// Loads a subscription and checks it belongs to `actor`.
///
/// A missing row is 404; somebody else's row is 403.
pub async fn get_owned_subscription(
    store: &dyn Store,
    actor: &impl Principal,
    subscription_id: i64,
) -> Res<Subscription> {
    let subscription = store
        .get_subscription_by_id(subscription_id)
        .await?
        .ok_or_else(AppError::not_found)?;

    if !subscription.is_owned_by(actor.principal_id()) {
        log::warn!(
            "User {} tried to access subscription {} owned by user {}",
            actor.principal_id(),
            subscription.id,
            subscription.user_id
        );
        return Err(AppError::forbidden());
    }

    Ok(subscription)
}

pub async fn create_subscription(
    store: &dyn Store,
    actor: &impl Principal,
    payload: &Map<String, Value>,
    trail: AuditTrail,
) -> Res<Subscription> {
    let data = parse_create(actor.principal_id(), payload)?;
    let subscription = store.insert_subscription(data, trail).await?;

    log::info!(
        "User {} created subscription {}",
        actor.principal_id(),
        subscription.id
    );
    Ok(subscription)
}

/// Ownership is checked before the payload is looked at.
pub async fn update_subscription(
    store: &dyn Store,
    actor: &impl Principal,
    subscription_id: i64,
    payload: Res<Map<String, Value>>,
    trail: AuditTrail,
) -> Res<Subscription> {
    get_owned_subscription(store, actor, subscription_id).await?;
    let data = parse_update(&payload?)?;

    store
        .update_subscription(subscription_id, data, trail)
        .await?
        .ok_or_else(AppError::not_found)
}

pub async fn delete_subscription(
    store: &dyn Store,
    actor: &impl Principal,
    subscription_id: i64,
    trail: AuditTrail,
) -> Res<()> {
    get_owned_subscription(store, actor, subscription_id).await?;

    if !store.delete_subscription(subscription_id, trail).await? {
        return Err(AppError::not_found());
    }

    log::info!(
        "User {} deleted subscription {}",
        actor.principal_id(),
        subscription_id
    );
    Ok(())
}

/// The most recent audit events performed by `actor`, newest first.
pub async fn list_audit_logs(store: &dyn Store, actor: &impl Principal) -> Res<Vec<AuditLog>> {
    store
        .get_audit_logs_by_user_id(actor.principal_id(), AUDIT_LOG_LIMIT)
        .await
}
