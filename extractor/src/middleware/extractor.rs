use std::{future::Future, pin::Pin, rc::Rc, sync::Arc};

use actix_session::SessionExt;
use actix_web::{
    Error, HttpMessage,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use futures::future::{Ready, ok};

use common::session::{SESSION_USER_KEY, SessionUser};
use db::Store;

/// Resolves the session cookie into a [`SessionUser`] request extension.
///
/// Requests without a usable session pass through untouched; enforcing
/// authentication is left to the routes that need it.
pub struct ExtractionMiddleware {}

impl ExtractionMiddleware {
    pub fn new() -> Self {
        Self {}
    }
}

impl<S, B> Transform<S, ServiceRequest> for ExtractionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Transform = ExtractionMiddlewareService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(ExtractionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct ExtractionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for ExtractionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<actix_web::body::BoxBody>;
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let session = req.get_session();
        let store = req.app_data::<web::Data<Arc<dyn Store>>>().cloned();
        let srv = Rc::clone(&self.service);

        Box::pin(async move {
            // a tampered or stale cookie is simply an anonymous request
            let user_id = session.get::<i64>(SESSION_USER_KEY).unwrap_or_else(|e| {
                log::warn!("Unreadable session: {}", e);
                None
            });

            if let (Some(user_id), Some(store)) = (user_id, store) {
                match store.get_user_by_id(user_id).await {
                    Ok(Some(user)) => {
                        req.extensions_mut().insert(SessionUser::from(&user));
                    }
                    Ok(None) => {
                        log::info!("Session refers to missing user {}, clearing it", user_id);
                        session.purge();
                    }
                    Err(e) => return Ok(req.error_response(e).map_into_boxed_body()),
                }
            }

            srv.call(req).await.map(|res| res.map_into_boxed_body())
        })
    }
}
