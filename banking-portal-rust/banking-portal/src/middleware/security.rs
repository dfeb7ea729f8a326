use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{self, HeaderName, HeaderValue},
    Error, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

use crate::infrastructure::logger::Logger;

const CROSS_ORIGIN_OPENER_POLICY: &str = "cross-origin-opener-policy";

#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Host patterns: exact names, `.example.com` for a domain and its
    /// subdomains, or `*`.
    pub allowed_hosts: Vec<String>,
    pub frame_options: &'static str,
    pub referrer_policy: &'static str,
    pub cross_origin_opener_policy: &'static str,
}

impl SecurityConfig {
    pub fn new(allowed_hosts: Vec<String>) -> Self {
        Self {
            allowed_hosts,
            ..Self::default()
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            allowed_hosts: Vec::new(),
            frame_options: "DENY",
            referrer_policy: "same-origin",
            cross_origin_opener_policy: "same-origin",
        }
    }
}

/// Rejects requests for hosts outside the allow list and adds the standard
/// security headers to every response.
#[derive(Clone)]
pub struct SecurityMiddleware {
    config: Arc<SecurityConfig>,
}

impl SecurityMiddleware {
    pub fn new(config: SecurityConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SecurityMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = SecurityService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SecurityService {
            service: Arc::new(service),
            config: Arc::clone(&self.config),
        }))
    }
}

pub struct SecurityService<S> {
    service: Arc<S>,
    config: Arc<SecurityConfig>,
}

impl<S, B> Service<ServiceRequest> for SecurityService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, cx: &mut std::task::Context<'_>) -> std::task::Poll<Result<(), Self::Error>> {
        self.service.poll_ready(cx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Arc::clone(&self.service);
        let config = Arc::clone(&self.config);

        Box::pin(async move {
            let host = request_host(&req);
            if !is_allowed_host(&host, &config.allowed_hosts) {
                let client_ip = req
                    .connection_info()
                    .realip_remote_addr()
                    .unwrap_or("unknown")
                    .to_string();
                Logger::security_violation(&client_ip, &format!("disallowed host {host:?}"));
                let res = req.into_response(HttpResponse::BadRequest().body("Bad Request (400)"));
                return Ok(apply_security_headers(res, &config));
            }

            let res = service.call(req).await?;
            Ok(apply_security_headers(res.map_into_boxed_body(), &config))
        })
    }
}

fn request_host(req: &ServiceRequest) -> String {
    req.headers()
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| req.uri().authority().map(|authority| authority.to_string()))
        .unwrap_or_default()
}

/// Host name without port, lowercased, trailing dot removed.
pub fn split_host(host: &str) -> String {
    let host = host.trim().to_ascii_lowercase();
    let name = if host.starts_with('[') {
        match host.find(']') {
            Some(end) => host[..=end].to_string(),
            None => return String::new(),
        }
    } else {
        match host.rsplit_once(':') {
            Some((name, _port)) => name.to_string(),
            None => host,
        }
    };
    name.strip_suffix('.').map(str::to_string).unwrap_or(name)
}

pub fn is_allowed_host(host: &str, allowed_hosts: &[String]) -> bool {
    let host = split_host(host);
    if host.is_empty() {
        return false;
    }

    allowed_hosts.iter().any(|pattern| {
        let pattern = pattern.to_ascii_lowercase();
        if pattern == "*" {
            return true;
        }
        match pattern.strip_prefix('.') {
            Some(domain) => host == domain || host.ends_with(&pattern),
            None => host == pattern,
        }
    })
}

fn apply_security_headers(mut res: ServiceResponse<BoxBody>, config: &SecurityConfig) -> ServiceResponse<BoxBody> {
    let headers = res.headers_mut();
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static(config.frame_options));
    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::REFERRER_POLICY, HeaderValue::from_static(config.referrer_policy));
    headers.insert(
        HeaderName::from_static(CROSS_ORIGIN_OPENER_POLICY),
        HeaderValue::from_static(config.cross_origin_opener_policy),
    );
    res
}
