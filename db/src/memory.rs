//! In-process [`Store`] with the same observable behavior as [`PgStore`](crate::store::PgStore).
//!
//! Used by the test suites. Each mutation runs under a single lock, so a
//! mutation and its audit row become visible together. Failures can be
//! injected for primary writes and for audit writes separately.

use std::{
    collections::BTreeMap,
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use common::error::{AppError, Res};
use parking_lot::Mutex;

use crate::{
    dtos::{
        audit_log::{AuditLogCreateRequest, AuditTrail},
        subscription::{SubscriptionCreateRequest, SubscriptionUpdateRequest},
        user::UserCreateRequest,
    },
    models::{
        audit_log::{AuditAction, AuditLog, ENTITY_SUBSCRIPTION, ENTITY_USER},
        subscription::Subscription,
        user::User,
    },
    store::Store,
};

#[derive(Default)]
struct Tables {
    users: BTreeMap<i64, User>,
    subscriptions: BTreeMap<i64, Subscription>,
    audit_logs: BTreeMap<i64, AuditLog>,
    last_user_id: i64,
    last_subscription_id: i64,
    last_audit_log_id: i64,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_writes: AtomicBool,
    fail_audit_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent mutation fail before touching any table.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Makes audit inserts fail while primary mutations keep succeeding.
    pub fn fail_audit_writes(&self, fail: bool) {
        self.fail_audit_writes.store(fail, Ordering::SeqCst);
    }

    pub fn subscription_count(&self) -> usize {
        self.tables.lock().subscriptions.len()
    }

    pub fn audit_log_count(&self) -> usize {
        self.tables.lock().audit_logs.len()
    }

    fn check_writable(&self) -> Res<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn record(&self, tables: &mut Tables, event: AuditLogCreateRequest) {
        if self.fail_audit_writes.load(Ordering::SeqCst) {
            log::error!(
                "Failed to write audit event {} {}:{}: audit table unavailable",
                event.action,
                event.entity_type,
                event.entity_id
            );
            return;
        }

        tables.last_audit_log_id += 1;
        let row = AuditLog {
            id: tables.last_audit_log_id,
            user_id: event.user_id,
            action: event.action.as_str().to_string(),
            entity_type: event.entity_type.to_string(),
            entity_id: event.entity_id,
            timestamp: Utc::now().naive_utc(),
            ip_address: event.ip_address,
            user_agent: event.user_agent,
        };
        tables.audit_logs.insert(row.id, row);
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists_user_by_username(&self, username: &str) -> Res<bool> {
        Ok(self.tables.lock().users.values().any(|u| u.username == username))
    }

    async fn exists_user_by_email(&self, email: &str) -> Res<bool> {
        Ok(self.tables.lock().users.values().any(|u| u.email == email))
    }

    async fn get_user_by_id(&self, user_id: i64) -> Res<Option<User>> {
        Ok(self.tables.lock().users.get(&user_id).cloned())
    }

    async fn get_user_by_username(&self, username: &str) -> Res<Option<User>> {
        Ok(self
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn insert_user(&self, data: UserCreateRequest, trail: AuditTrail) -> Res<User> {
        self.check_writable()?;
        let mut tables = self.tables.lock();

        if tables.users.values().any(|u| u.username == data.username) {
            return Err(AppError::Validation(vec![
                "A user with this username already exists".to_string(),
            ]));
        }
        if tables.users.values().any(|u| u.email == data.email) {
            return Err(AppError::Validation(vec![
                "A user with this email already exists".to_string(),
            ]));
        }

        tables.last_user_id += 1;
        let user = User {
            id: tables.last_user_id,
            username: data.username,
            email: data.email,
            password_hash: data.password_hash,
            created_at: Utc::now().naive_utc(),
        };
        tables.users.insert(user.id, user.clone());

        let trail = AuditTrail {
            actor_id: Some(user.id),
            ..trail
        };
        self.record(
            &mut tables,
            trail.event(AuditAction::Create, ENTITY_USER, user.id),
        );
        Ok(user)
    }

    async fn get_subscription_by_id(&self, subscription_id: i64) -> Res<Option<Subscription>> {
        Ok(self.tables.lock().subscriptions.get(&subscription_id).cloned())
    }

    async fn get_active_subscriptions_by_user_id(&self, user_id: i64) -> Res<Vec<Subscription>> {
        Ok(self
            .tables
            .lock()
            .subscriptions
            .values()
            .filter(|s| s.user_id == user_id && s.is_active)
            .cloned()
            .collect())
    }

    async fn insert_subscription(
        &self,
        data: SubscriptionCreateRequest,
        trail: AuditTrail,
    ) -> Res<Subscription> {
        self.check_writable()?;
        let mut tables = self.tables.lock();

        if !tables.users.contains_key(&data.user_id) {
            return Err(AppError::Database(sqlx::Error::RowNotFound));
        }

        tables.last_subscription_id += 1;
        let sub = Subscription {
            id: tables.last_subscription_id,
            user_id: data.user_id,
            name: data.name,
            amount: data.amount,
            interval: data.interval,
            next_billing_date: data.next_billing_date,
            is_active: true,
            created_at: Utc::now().naive_utc(),
        };
        tables.subscriptions.insert(sub.id, sub.clone());

        self.record(
            &mut tables,
            trail.event(AuditAction::Create, ENTITY_SUBSCRIPTION, sub.id),
        );
        Ok(sub)
    }

    async fn update_subscription(
        &self,
        subscription_id: i64,
        data: SubscriptionUpdateRequest,
        trail: AuditTrail,
    ) -> Res<Option<Subscription>> {
        self.check_writable()?;
        let mut tables = self.tables.lock();

        let Some(sub) = tables.subscriptions.get_mut(&subscription_id) else {
            return Ok(None);
        };
        if let Some(name) = data.name {
            sub.name = name;
        }
        if let Some(amount) = data.amount {
            sub.amount = amount;
        }
        if let Some(interval) = data.interval {
            sub.interval = interval;
        }
        if let Some(next_billing_date) = data.next_billing_date {
            sub.next_billing_date = next_billing_date;
        }
        if let Some(is_active) = data.is_active {
            sub.is_active = is_active;
        }
        let sub = sub.clone();

        self.record(
            &mut tables,
            trail.event(AuditAction::Update, ENTITY_SUBSCRIPTION, sub.id),
        );
        Ok(Some(sub))
    }

    async fn delete_subscription(&self, subscription_id: i64, trail: AuditTrail) -> Res<bool> {
        self.check_writable()?;
        let mut tables = self.tables.lock();

        if tables.subscriptions.remove(&subscription_id).is_none() {
            return Ok(false);
        }

        self.record(
            &mut tables,
            trail.event(AuditAction::Delete, ENTITY_SUBSCRIPTION, subscription_id),
        );
        Ok(true)
    }

    async fn get_audit_logs_by_user_id(&self, user_id: i64, limit: i64) -> Res<Vec<AuditLog>> {
        let tables = self.tables.lock();
        let mut logs: Vec<AuditLog> = tables
            .audit_logs
            .values()
            .filter(|log| log.user_id == Some(user_id))
            .cloned()
            .collect();
        logs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp).then(b.id.cmp(&a.id)));
        logs.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(logs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn trail(actor_id: i64) -> AuditTrail {
        AuditTrail {
            actor_id: Some(actor_id),
            ip_address: Some("127.0.0.1".to_string()),
            user_agent: Some("tests".to_string()),
        }
    }

    async fn seed_user(store: &MemoryStore, username: &str) -> User {
        store
            .insert_user(
                UserCreateRequest {
                    username: username.to_string(),
                    email: format!("{username}@example.com"),
                    password_hash: "hash".to_string(),
                },
                AuditTrail::default(),
            )
            .await
            .unwrap()
    }

    fn netflix(user_id: i64) -> SubscriptionCreateRequest {
        SubscriptionCreateRequest {
            user_id,
            name: "Netflix".to_string(),
            amount: BigDecimal::from_str("9.99").unwrap(),
            interval: "monthly".to_string(),
            next_billing_date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
        }
    }

    #[tokio::test]
    async fn user_creation_is_audited_with_the_new_user_as_actor() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;

        let logs = store.get_audit_logs_by_user_id(user.id, 100).await.unwrap();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].action, "create");
        assert_eq!(logs[0].entity_type, "user");
        assert_eq!(logs[0].entity_id, user.id);
    }

    #[tokio::test]
    async fn duplicate_username_and_email_are_rejected() {
        let store = MemoryStore::new();
        seed_user(&store, "alice").await;

        let err = store
            .insert_user(
                UserCreateRequest {
                    username: "alice".to_string(),
                    email: "other@example.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                AuditTrail::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = store
            .insert_user(
                UserCreateRequest {
                    username: "alice2".to_string(),
                    email: "alice@example.com".to_string(),
                    password_hash: "hash".to_string(),
                },
                AuditTrail::default(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        // usernames are unique exactly as stored
        seed_user(&store, "Alice").await;
    }

    #[tokio::test]
    async fn partial_update_keeps_unsupplied_fields() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let sub = store.insert_subscription(netflix(user.id), trail(user.id)).await.unwrap();

        let updated = store
            .update_subscription(
                sub.id,
                SubscriptionUpdateRequest {
                    name: Some("Netflix Premium".to_string()),
                    ..Default::default()
                },
                trail(user.id),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.name, "Netflix Premium");
        assert_eq!(updated.amount, sub.amount);
        assert_eq!(updated.interval, sub.interval);
        assert_eq!(updated.next_billing_date, sub.next_billing_date);
        assert!(updated.is_active);
    }

    #[tokio::test]
    async fn delete_removes_the_row_and_reports_missing_rows() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let sub = store.insert_subscription(netflix(user.id), trail(user.id)).await.unwrap();

        assert!(store.delete_subscription(sub.id, trail(user.id)).await.unwrap());
        assert!(store.get_subscription_by_id(sub.id).await.unwrap().is_none());
        assert!(!store.delete_subscription(sub.id, trail(user.id)).await.unwrap());

        let logs = store.get_audit_logs_by_user_id(user.id, 100).await.unwrap();
        let deletes: Vec<_> = logs.iter().filter(|l| l.action == "delete").collect();
        assert_eq!(deletes.len(), 1);
        assert_eq!(deletes[0].entity_id, sub.id);
    }

    #[tokio::test]
    async fn listing_only_returns_active_rows_of_the_owner() {
        let store = MemoryStore::new();
        let alice = seed_user(&store, "alice").await;
        let bob = seed_user(&store, "bob").await;
        let kept = store.insert_subscription(netflix(alice.id), trail(alice.id)).await.unwrap();
        let paused = store.insert_subscription(netflix(alice.id), trail(alice.id)).await.unwrap();
        store.insert_subscription(netflix(bob.id), trail(bob.id)).await.unwrap();

        store
            .update_subscription(
                paused.id,
                SubscriptionUpdateRequest {
                    is_active: Some(false),
                    ..Default::default()
                },
                trail(alice.id),
            )
            .await
            .unwrap();

        let listed = store.get_active_subscriptions_by_user_id(alice.id).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kept.id);
    }

    #[tokio::test]
    async fn failed_audit_write_does_not_block_the_mutation() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let audits_before = store.audit_log_count();

        store.fail_audit_writes(true);
        let sub = store.insert_subscription(netflix(user.id), trail(user.id)).await.unwrap();

        assert!(store.get_subscription_by_id(sub.id).await.unwrap().is_some());
        assert_eq!(store.audit_log_count(), audits_before);
    }

    #[tokio::test]
    async fn failed_primary_write_leaves_no_trace() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        let audits_before = store.audit_log_count();

        store.fail_writes(true);
        let err = store
            .insert_subscription(netflix(user.id), trail(user.id))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(store.subscription_count(), 0);
        assert_eq!(store.audit_log_count(), audits_before);
    }

    #[tokio::test]
    async fn audit_listing_is_newest_first_and_capped() {
        let store = MemoryStore::new();
        let user = seed_user(&store, "alice").await;
        for _ in 0..5 {
            store.insert_subscription(netflix(user.id), trail(user.id)).await.unwrap();
        }

        let logs = store.get_audit_logs_by_user_id(user.id, 3).await.unwrap();
        assert_eq!(logs.len(), 3);
        assert!(logs.windows(2).all(|w| (w[0].timestamp, w[0].id) > (w[1].timestamp, w[1].id)));
    }
}
