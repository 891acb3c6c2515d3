use std::sync::Arc;

use actix_web::{HttpRequest, Responder, delete, get, post, put, web};
use common::{
    error::{AppError, Res},
    http::Success,
    session::{Principal, SessionUser},
};
use db::Store;

use crate::{
    dtos::sub::{MessageResponse, SubscriptionsResponse, read_payload},
    services,
};

/// Path ids that are not integers name no subscription.
fn subscription_id(path: &str) -> Res<i64> {
    path.parse::<i64>().map_err(|_| AppError::not_found())
}

/// Lists the caller's active subscriptions.
///
/// # Input
/// - `user`: Session principal resolved by the extractor middleware
/// - `store`: Data store handle
///
/// # Output
/// - Success: 200 OK with `{subscriptions: [...]}`
/// - Error: 401 Unauthorized (or a redirect to `/login`) without a session
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subscriptions', {
///   credentials: 'include',
///   headers: { 'Accept': 'application/json' }
/// });
///
/// if (response.ok) {
///   const data = await response.json();
///   // {
///   //   subscriptions: [
///   //     {
///   //       id: 1,
///   //       user_id: 1,
///   //       name: "Netflix",
///   //       amount: 9.99,
///   //       interval: "monthly",
///   //       next_billing_date: "2030-01-15",
///   //       is_active: true,
///   //       created_at: "2026-10-18T09:30:00"
///   //     }
///   //   ]
///   // }
/// }
/// ```
#[get("")]
pub async fn get_subscriptions(
    user: web::ReqData<SessionUser>,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let subscriptions = services::sub::list_subscriptions(store.get_ref().as_ref(), &*user).await?;
    Success::ok(SubscriptionsResponse { subscriptions })
}

/// Fetches a single subscription owned by the caller.
///
/// # Output
/// - Success: 200 OK with the subscription fields
/// - Error: 404 Not Found when no such row exists,
///   403 Forbidden when it belongs to another user
#[get("/{id}")]
pub async fn get_subscription(
    user: web::ReqData<SessionUser>,
    path: web::Path<String>,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let id = subscription_id(&path)?;
    let subscription =
        services::sub::get_owned_subscription(store.get_ref().as_ref(), &*user, id).await?;
    Success::ok(subscription)
}

/// Creates a subscription for the caller.
///
/// # Input
/// - `body`: JSON object with `name`, `amount`, `interval` and `next_billing_date`
///
/// # Output
/// - Success: 201 Created with the stored subscription (`is_active: true`)
/// - Error: 400 Bad Request with `{errors: [...]}` listing every invalid field,
///   or `{error: "No data provided"}` for an empty body
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch('/api/subscriptions', {
///   method: 'POST',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({
///     name: 'Netflix',
///     amount: 9.99,
///     interval: 'monthly',
///     next_billing_date: '2030-01-15'
///   })
/// });
/// ```
#[post("")]
pub async fn post_subscription(
    req: HttpRequest,
    user: web::ReqData<SessionUser>,
    body: web::Bytes,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let payload = read_payload(&body)?;
    let trail = logger::audit::trail(&req, Some(user.principal_id()));
    let subscription =
        services::sub::create_subscription(store.get_ref().as_ref(), &*user, &payload, trail)
            .await?;
    Success::created(subscription)
}

/// Changes the supplied fields of a subscription; everything else is kept.
///
/// `is_active` pauses (`false`) or resumes (`true`) a subscription. A paused
/// subscription drops out of the list but can still be fetched by id.
///
/// # Output
/// - Success: 200 OK with the updated subscription
/// - Error: 404/403 as for a fetch, then 400 when any supplied field is invalid
///   (nothing is changed in that case)
///
/// # Frontend Example
/// ```javascript
/// const response = await fetch(`/api/subscriptions/${id}`, {
///   method: 'PUT',
///   credentials: 'include',
///   headers: { 'Content-Type': 'application/json' },
///   body: JSON.stringify({ amount: 12.99 })
/// });
/// ```
#[put("/{id}")]
pub async fn put_subscription(
    req: HttpRequest,
    user: web::ReqData<SessionUser>,
    path: web::Path<String>,
    body: web::Bytes,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let id = subscription_id(&path)?;
    let trail = logger::audit::trail(&req, Some(user.principal_id()));
    let subscription = services::sub::update_subscription(
        store.get_ref().as_ref(),
        &*user,
        id,
        read_payload(&body),
        trail,
    )
    .await?;
    Success::ok(subscription)
}

/// Permanently removes a subscription owned by the caller.
///
/// # Output
/// - Success: 200 OK with `{message: "Subscription deleted"}`
/// - Error: 404 Not Found (also for a repeated delete), 403 Forbidden for a foreign row
#[delete("/{id}")]
pub async fn delete_subscription(
    req: HttpRequest,
    user: web::ReqData<SessionUser>,
    path: web::Path<String>,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let id = subscription_id(&path)?;
    let trail = logger::audit::trail(&req, Some(user.principal_id()));
    services::sub::delete_subscription(store.get_ref().as_ref(), &*user, id, trail).await?;
    Success::ok(MessageResponse {
        message: "Subscription deleted".to_string(),
    })
}
