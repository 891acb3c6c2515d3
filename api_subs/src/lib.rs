use actix_web::web::{self};

pub mod routes {
    pub mod audit;
    pub mod sub;
}

mod services {
    pub(crate) mod sub;
}

mod dtos {
    pub(crate) mod sub;
}

pub fn mount_subs() -> actix_web::Scope {
    web::scope("/subscriptions")
        .service(routes::sub::get_subscriptions)
        .service(routes::sub::post_subscription)
        .service(routes::sub::get_subscription)
        .service(routes::sub::put_subscription)
        .service(routes::sub::delete_subscription)
}

pub fn mount_audit(cfg: &mut web::ServiceConfig) {
    cfg.service(routes::audit::get_audit_logs);
}
