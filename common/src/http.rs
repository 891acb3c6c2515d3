use actix_web::{HttpResponse, Responder, http::header::LOCATION};
use serde::Serialize;

use super::error::Res;

pub struct Success;
impl Success {
    pub fn created<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Created().json(body))
    }
    pub fn ok<T: Serialize>(body: T) -> Res<impl Responder> {
        Result::Ok(HttpResponse::Ok().json(body))
    }
    pub fn redirect(location: &str) -> Res<HttpResponse> {
        Result::Ok(
            HttpResponse::Found()
                .append_header((LOCATION, location))
                .finish(),
        )
    }
}

/// Whether the caller declared a JSON exchange, either by what it sends or what it accepts.
pub fn wants_json(headers: &actix_web::http::header::HeaderMap) -> bool {
    ["accept", "content-type"].iter().any(|name| {
        headers
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("application/json"))
    })
}
