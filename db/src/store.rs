//! Store interface handed to request handlers.
//!
//! Every mutation takes an [`AuditTrail`] and writes its audit row in the same
//! transaction as the change itself.

use std::sync::Arc;

use async_trait::async_trait;
use common::error::Res;
use sqlx::PgPool;

use crate::{
    audit_log,
    dtos::{
        audit_log::AuditTrail,
        subscription::{SubscriptionCreateRequest, SubscriptionUpdateRequest},
        user::UserCreateRequest,
    },
    models::{
        audit_log::{AuditAction, AuditLog, ENTITY_SUBSCRIPTION, ENTITY_USER},
        subscription::Subscription,
        user::User,
    },
    subscription, user,
};

#[async_trait]
pub trait Store: Send + Sync {
    async fn exists_user_by_username(&self, username: &str) -> Res<bool>;

    async fn exists_user_by_email(&self, email: &str) -> Res<bool>;

    async fn get_user_by_id(&self, user_id: i64) -> Res<Option<User>>;

    async fn get_user_by_username(&self, username: &str) -> Res<Option<User>>;

    /// The audit row for a new user names the new user as its actor.
    async fn insert_user(&self, data: UserCreateRequest, trail: AuditTrail) -> Res<User>;

    async fn get_subscription_by_id(&self, subscription_id: i64) -> Res<Option<Subscription>>;

    async fn get_active_subscriptions_by_user_id(&self, user_id: i64) -> Res<Vec<Subscription>>;

    async fn insert_subscription(
        &self,
        data: SubscriptionCreateRequest,
        trail: AuditTrail,
    ) -> Res<Subscription>;

    async fn update_subscription(
        &self,
        subscription_id: i64,
        data: SubscriptionUpdateRequest,
        trail: AuditTrail,
    ) -> Res<Option<Subscription>>;

    async fn delete_subscription(&self, subscription_id: i64, trail: AuditTrail) -> Res<bool>;

    /// Newest first.
    async fn get_audit_logs_by_user_id(&self, user_id: i64, limit: i64) -> Res<Vec<AuditLog>>;
}

pub struct PgStore {
    pool: Arc<PgPool>,
}

impl PgStore {
    pub fn new(pool: Arc<PgPool>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn exists_user_by_username(&self, username: &str) -> Res<bool> {
        user::exists_user_by_username(&*self.pool, username).await
    }

    async fn exists_user_by_email(&self, email: &str) -> Res<bool> {
        user::exists_user_by_email(&*self.pool, email).await
    }

    async fn get_user_by_id(&self, user_id: i64) -> Res<Option<User>> {
        user::get_user_by_id(&*self.pool, user_id).await
    }

    async fn get_user_by_username(&self, username: &str) -> Res<Option<User>> {
        user::get_user_by_username(&*self.pool, username).await
    }

    async fn insert_user(&self, data: UserCreateRequest, trail: AuditTrail) -> Res<User> {
        let mut tx = self.pool.begin().await?;

        let user = user::insert_user(&mut *tx, data).await?;

        let trail = AuditTrail {
            actor_id: Some(user.id),
            ..trail
        };
        audit_log::record(&mut tx, trail.event(AuditAction::Create, ENTITY_USER, user.id)).await?;

        tx.commit().await?;
        Ok(user)
    }

    async fn get_subscription_by_id(&self, subscription_id: i64) -> Res<Option<Subscription>> {
        subscription::get_subscription_by_id(&*self.pool, subscription_id).await
    }

    async fn get_active_subscriptions_by_user_id(&self, user_id: i64) -> Res<Vec<Subscription>> {
        subscription::get_active_subscriptions_by_user_id(&*self.pool, user_id).await
    }

    async fn insert_subscription(
        &self,
        data: SubscriptionCreateRequest,
        trail: AuditTrail,
    ) -> Res<Subscription> {
        let mut tx = self.pool.begin().await?;

        let sub = subscription::insert_subscription(&mut *tx, data).await?;
        audit_log::record(
            &mut tx,
            trail.event(AuditAction::Create, ENTITY_SUBSCRIPTION, sub.id),
        )
        .await?;

        tx.commit().await?;
        Ok(sub)
    }

    async fn update_subscription(
        &self,
        subscription_id: i64,
        data: SubscriptionUpdateRequest,
        trail: AuditTrail,
    ) -> Res<Option<Subscription>> {
        let mut tx = self.pool.begin().await?;

        let Some(sub) = subscription::update_subscription(&mut *tx, subscription_id, data).await?
        else {
            return Ok(None);
        };
        audit_log::record(
            &mut tx,
            trail.event(AuditAction::Update, ENTITY_SUBSCRIPTION, sub.id),
        )
        .await?;

        tx.commit().await?;
        Ok(Some(sub))
    }

    async fn delete_subscription(&self, subscription_id: i64, trail: AuditTrail) -> Res<bool> {
        let mut tx = self.pool.begin().await?;

        if !subscription::delete_subscription(&mut *tx, subscription_id).await? {
            return Ok(false);
        }
        audit_log::record(
            &mut tx,
            trail.event(AuditAction::Delete, ENTITY_SUBSCRIPTION, subscription_id),
        )
        .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn get_audit_logs_by_user_id(&self, user_id: i64, limit: i64) -> Res<Vec<AuditLog>> {
        audit_log::get_audit_logs_by_user_id(&*self.pool, user_id, limit).await
    }
}
