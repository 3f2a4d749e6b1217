use crate::api::{attendance, reports};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::web;
use anyhow::anyhow;

pub type LimiterConfig = GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware>;

/// Per-IP limiter allowing `requests_per_min` with an equal burst.
pub fn limiter_config(requests_per_min: u32) -> anyhow::Result<LimiterConfig> {
    let per_ms = if requests_per_min == 0 {
        1
    } else {
        (60_000 / requests_per_min as u64).max(1)
    };
    GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min.max(1))
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit of {requests_per_min} requests per minute"))
}

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str, limiter: &LimiterConfig) {
    cfg.service(
        web::scope(api_prefix)
            .wrap(Governor::new(limiter)) // rate limiting
            .configure(attendance_routes),
    );
}

/// Attendance routes without the limiter, relative to the API prefix.
pub fn attendance_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/attendance")
            // lifecycle
            .route("/check-in", web::post().to(attendance::check_in))
            .route("/check-out", web::post().to(attendance::check_out))
            .route("/break/start", web::post().to(attendance::break_start))
            .route("/break/end", web::post().to(attendance::break_end))
            .route("/absence", web::post().to(attendance::record_absence))
            // reports
            .service(
                web::scope("/employees/{employee_id}")
                    .route("/history", web::get().to(reports::history))
                    .route("/percentage", web::get().to(reports::percentage))
                    .route("/anomalies", web::get().to(reports::anomalies)),
            )
            .route(
                "/records/{attendance_id}/score",
                web::get().to(reports::score),
            )
            .route("/dashboard", web::get().to(reports::dashboard))
            .route("/overview", web::get().to(reports::overview)),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limiter_accepts_configured_rates() {
        assert!(limiter_config(1000).is_ok());
        assert!(limiter_config(1).is_ok());
        assert!(limiter_config(0).is_ok());
    }
}
