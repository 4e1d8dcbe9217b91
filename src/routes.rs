use crate::{
    api::{leave_request, overtime, timesheet},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-scope limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / requests_per_min as u64).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("rate limiter: period and burst are non-zero");
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: Config) {
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Protected routes
    cfg.service(
        web::scope(&config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/leave")
                    // /leave
                    .service(web::resource("").route(web::post().to(leave_request::create_leave)))
                    // /leave/{id}
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(leave_request::get_leave))
                            .route(web::put().to(leave_request::update_leave)),
                    )
                    .service(
                        web::resource("/{id}/submit")
                            .route(web::put().to(leave_request::submit_leave)),
                    )
                    .service(
                        web::resource("/{id}/manager-approve")
                            .route(web::put().to(leave_request::manager_approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/hr-approve")
                            .route(web::put().to(leave_request::hr_approve_leave)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(leave_request::reject_leave)),
                    ),
            )
            .service(
                web::scope("/timesheet")
                    // /timesheet
                    .service(
                        web::resource("")
                            .route(web::post().to(timesheet::create_weekly_timesheet)),
                    )
                    // must precede /{id}
                    .service(web::resource("/entry").route(web::post().to(timesheet::record_entry)))
                    .service(web::resource("/{id}").route(web::get().to(timesheet::get_timesheet)))
                    .service(
                        web::resource("/{id}/submit")
                            .route(web::put().to(timesheet::submit_timesheet)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::put().to(timesheet::approve_timesheet)),
                    )
                    .service(
                        web::resource("/{id}/reject")
                            .route(web::put().to(timesheet::reject_timesheet)),
                    )
                    // /timesheet/{id}/entry/{date}
                    .service(
                        web::resource("/{timesheet_id}/entry/{work_date}")
                            .route(web::delete().to(timesheet::remove_entry)),
                    ),
            )
            .service(
                web::scope("/overtime")
                    // batch run, must precede /{employee_id}
                    .service(web::resource("/process").route(web::post().to(overtime::process_all)))
                    .service(
                        web::resource("/{employee_id}").route(web::get().to(overtime::get_ledger)),
                    )
                    .service(
                        web::resource("/{employee_id}/process")
                            .route(web::post().to(overtime::process_employee)),
                    ),
            ),
    );
}
