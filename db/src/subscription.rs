use common::error::{AppError, Res};
use sqlx::{Executor, Postgres};

use crate::{
    dtos::subscription::{SubscriptionCreateRequest, SubscriptionUpdateRequest},
    models::subscription::Subscription,
};

pub async fn get_subscription_by_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: i64,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .fetch_optional(executor)
        .await
        .map_err(AppError::from)
}

pub async fn get_active_subscriptions_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
) -> Res<Vec<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions WHERE user_id = $1 AND is_active = TRUE ORDER BY id",
    )
    .bind(user_id)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    data: SubscriptionCreateRequest,
) -> Res<Subscription> {
    sqlx::query_as::<_, Subscription>(
        r#"
        INSERT INTO subscriptions (user_id, name, amount, "interval", next_billing_date, is_active)
        VALUES ($1, $2, $3, $4, $5, TRUE)
        RETURNING *
        "#,
    )
    .bind(data.user_id)
    .bind(data.name)
    .bind(data.amount)
    .bind(data.interval)
    .bind(data.next_billing_date)
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Applies only the supplied fields. Returns `None` when the row is gone.
pub async fn update_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: i64,
    data: SubscriptionUpdateRequest,
) -> Res<Option<Subscription>> {
    sqlx::query_as::<_, Subscription>(
        r#"
        UPDATE subscriptions SET
            name = COALESCE($2, name),
            amount = COALESCE($3, amount),
            "interval" = COALESCE($4, "interval"),
            next_billing_date = COALESCE($5, next_billing_date),
            is_active = COALESCE($6, is_active)
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(subscription_id)
    .bind(data.name)
    .bind(data.amount)
    .bind(data.interval)
    .bind(data.next_billing_date)
    .bind(data.is_active)
    .fetch_optional(executor)
    .await
    .map_err(AppError::from)
}

/// Physically removes the row. Returns whether a row was removed.
pub async fn delete_subscription<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    subscription_id: i64,
) -> Res<bool> {
    let result = sqlx::query("DELETE FROM subscriptions WHERE id = $1")
        .bind(subscription_id)
        .execute(executor)
        .await
        .map_err(AppError::from)?;

    Ok(result.rows_affected() > 0)
}
