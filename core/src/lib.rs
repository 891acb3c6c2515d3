use actix_web::{Responder, error::InternalError, get, web};
use common::{error::AppError, http::Success, session::SessionUser};
use serde::Serialize;

pub mod cors;

const SERVICE_NAME: &str = "subtrack";

#[derive(Serialize)]
struct IndexResponse {
    service: &'static str,
    authenticated: bool,
}

/// Landing endpoint; also where `/logout` sends the browser.
#[get("/")]
async fn get_index(user: Option<web::ReqData<SessionUser>>) -> impl Responder {
    Success::ok(IndexResponse {
        service: SERVICE_NAME,
        authenticated: user.is_some(),
    })
}

/// Rejected JSON bodies answer with the usual error envelope.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        let response = AppError::BadRequest(err.to_string()).to_http_response();
        InternalError::from_response(err, response).into()
    })
}

/// Every route of the application. Session, CORS, extractor and access-log
/// middleware are wrapped around this by the caller.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .service(get_index)
        .configure(api_auth::mount_auth)
        .service(
            web::scope("/api")
                .wrap(api_auth::auth_middleware())
                .service(api_subs::mount_subs())
                .configure(api_subs::mount_audit),
        );
}
