use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error,
};
use futures_util::future::LocalBoxFuture;
use std::{
    future::{ready, Ready},
    rc::Rc,
};

/// Security headers middleware
pub struct SecurityHeaders;

impl<S, B> Transform<S, ServiceRequest> for SecurityHeaders
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SecurityHeadersMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityHeadersMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SecurityHeadersMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SecurityHeadersMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let srv = self.service.clone();

        Box::pin(async move {
            let mut res = srv.call(req).await?;
            let headers = res.headers_mut();

            headers.insert(
                HeaderName::from_static("x-frame-options"),
                HeaderValue::from_static("DENY"),
            );
            headers.insert(
                HeaderName::from_static("x-content-type-options"),
                HeaderValue::from_static("nosniff"),
            );
            headers.insert(
                HeaderName::from_static("referrer-policy"),
                HeaderValue::from_static("strict-origin-when-cross-origin"),
            );
            // Widgets show remote thumbnails, album art and favicons.
            headers.insert(
                HeaderName::from_static("content-security-policy"),
                HeaderValue::from_static(
                    "default-src 'self'; script-src 'self'; style-src 'self' 'unsafe-inline'; img-src 'self' data: https:; connect-src 'self'; frame-ancestors 'none'",
                ),
            );

            // Only add HSTS in production (when using HTTPS)
            if cfg!(not(debug_assertions)) {
                headers.insert(
                    HeaderName::from_static("strict-transport-security"),
                    HeaderValue::from_static("max-age=31536000; includeSubDomains"),
                );
            }

            Ok(res)
        })
    }
}

/// Input validation utilities
pub mod validation {
    use once_cell::sync::Lazy;
    use regex::Regex;

    static COLOR_REGEX: Lazy<Option<Regex>> =
        Lazy::new(|| Regex::new(r"^#(?:[0-9a-fA-F]{3}){1,2}$").ok());

    pub const MAX_URL_LENGTH: usize = 2048;
    pub const MAX_TEXT_LENGTH: usize = 500;
    pub const MAX_MEMO_LENGTH: usize = 10_000;

    /// Validate URL format and scheme
    pub fn validate_url(raw: &str) -> Result<(), String> {
        if raw.is_empty() {
            return Err("URL cannot be empty".to_string());
        }

        if raw.len() > MAX_URL_LENGTH {
            return Err(format!("URL too long (max {MAX_URL_LENGTH} characters)"));
        }

        match url::Url::parse(raw) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.host().is_some() => {
                Ok(())
            }
            _ => Err("Invalid URL format. Must be HTTP or HTTPS".to_string()),
        }
    }

    /// Non-blank, bounded, single-line text such as titles and names.
    pub fn validate_text(value: &str, max: usize) -> Result<(), String> {
        if value.trim().is_empty() {
            return Err("cannot be empty".to_string());
        }
        if value.chars().count() > max {
            return Err(format!("too long (max {max} characters)"));
        }
        Ok(())
    }

    /// Calendar date in `YYYY-MM-DD` form.
    pub fn validate_date(value: &str) -> Result<(), String> {
        chrono::NaiveDate::parse_from_str(value, "%Y-%m-%d")
            .map(|_| ())
            .map_err(|_| "must be a date in YYYY-MM-DD form".to_string())
    }

    /// CSS hex color, `#abc` or `#aabbcc`.
    pub fn validate_color(value: &str) -> Result<(), String> {
        match COLOR_REGEX.as_ref() {
            Some(re) if re.is_match(value) => Ok(()),
            _ => Err("must be a hex color like #22c55e".to_string()),
        }
    }

}

/// Rate limiting configuration for different endpoints
pub use actix_governor::{GovernorConfig, GovernorConfigBuilder};

type RateLimiterConfig = GovernorConfig<
    actix_governor::PeerIpKeyExtractor,
    actix_governor::governor::middleware::StateInformationMiddleware,
>;

pub fn create_rate_limiter() -> Option<RateLimiterConfig> {
    // Widgets poll several endpoints on every page load.
    GovernorConfigBuilder::default()
        .per_second(10)
        .burst_size(50)
        .use_headers()
        .finish()
}

pub fn create_auth_rate_limiter() -> Option<RateLimiterConfig> {
    // Very restrictive for login attempts - prevent brute force
    GovernorConfigBuilder::default()
        .per_second(1)
        .burst_size(3)
        .use_headers()
        .finish()
}
