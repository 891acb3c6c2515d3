use std::sync::Arc;

use actix_web::{Responder, get, web};
use common::{error::Res, http::Success, session::SessionUser};
use db::Store;

use crate::{dtos::sub::AuditLogsResponse, services};

/// Returns the caller's latest audit events, newest first (at most 100).
///
/// # Output
/// - Success: 200 OK with `{audit_logs: [...]}`; each entry carries
///   `id, user_id, action, entity_type, entity_id, timestamp, ip_address, user_agent`
/// - Error: 401 Unauthorized (or a redirect to `/login`) without a session
#[get("/audit_logs")]
pub async fn get_audit_logs(
    user: web::ReqData<SessionUser>,
    store: web::Data<Arc<dyn Store>>,
) -> Res<impl Responder> {
    let audit_logs = services::sub::list_audit_logs(store.get_ref().as_ref(), &*user).await?;
    Success::ok(AuditLogsResponse { audit_logs })
}
