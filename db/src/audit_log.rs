use crate::{dtos::audit_log::AuditLogCreateRequest, models::audit_log::AuditLog};
use common::error::{AppError, Res};
use sqlx::{Acquire, Executor, Postgres, Transaction};

pub async fn get_audit_logs_by_user_id<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    user_id: i64,
    limit: i64,
) -> Res<Vec<AuditLog>> {
    sqlx::query_as::<_, AuditLog>(
        r#"
        SELECT * FROM audit_logs
        WHERE user_id = $1
        ORDER BY "timestamp" DESC, id DESC
        LIMIT $2
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await
    .map_err(AppError::from)
}

pub async fn insert_audit_log<'e, E: Executor<'e, Database = Postgres>>(
    executor: E,
    event: &AuditLogCreateRequest,
) -> Res<AuditLog> {
    sqlx::query_as::<_, AuditLog>(
        r#"
        INSERT INTO audit_logs (user_id, action, entity_type, entity_id, ip_address, user_agent)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(event.user_id)
    .bind(event.action.as_str())
    .bind(event.entity_type)
    .bind(event.entity_id)
    .bind(event.ip_address.as_deref())
    .bind(event.user_agent.as_deref())
    .fetch_one(executor)
    .await
    .map_err(AppError::from)
}

/// Writes an audit row inside the caller's transaction, under a savepoint.
///
/// A failed audit insert only rolls back the savepoint and is logged; the
/// surrounding mutation still commits. Errors from the savepoint bookkeeping
/// itself mean the connection is unusable and are propagated.
pub async fn record(tx: &mut Transaction<'_, Postgres>, event: AuditLogCreateRequest) -> Res<()> {
    let mut savepoint = Acquire::begin(&mut *tx).await?;

    match insert_audit_log(&mut *savepoint, &event).await {
        Ok(row) => {
            savepoint.commit().await?;
            log::debug!(
                "Audit {} {}:{} by {:?} (#{})",
                event.action,
                event.entity_type,
                event.entity_id,
                event.user_id,
                row.id
            );
        }
        Err(e) => {
            savepoint.rollback().await?;
            log::error!(
                "Failed to write audit event {} {}:{}: {}",
                event.action,
                event.entity_type,
                event.entity_id,
                e
            );
        }
    }

    Ok(())
}
