use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    http::header,
    Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ready, LocalBoxFuture, Ready};
use std::sync::Arc;

use crate::domain::session::{is_authenticated, SessionContext};

/// Sends anonymous callers to the login page with `302 Found`.
///
/// Wrap the protected resources with it; the inner handler only runs for
/// authenticated sessions. There is no return-path parameter.
#[derive(Clone)]
pub struct LoginRequired {
    login_url: Arc<str>,
}

impl LoginRequired {
    pub fn new(login_url: impl Into<String>) -> Self {
        Self {
            login_url: Arc::from(login_url.into()),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for LoginRequired
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: actix_web::body::MessageBody + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Transform = LoginRequiredService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(LoginRequiredService {
            service: Arc::new(service),
            login_url: Arc::clone(&self.login_url),
        }))
    }
}

pub struct LoginRequiredService<S> {
    service: Arc<S>,
    login_url: Arc<str>,
}

impl<S, B> Service<ServiceRequest> for LoginRequiredService<S>
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
        let login_url = Arc::clone(&self.login_url);

        Box::pin(async move {
            let cached = req.extensions().get::<SessionContext>().cloned();
            let context = match cached {
                Some(context) => context,
                None => {
                    let context = SessionContext::resolve(req.request()).await;
                    req.extensions_mut().insert(context.clone());
                    context
                }
            };

            if !is_authenticated(&context) {
                tracing::debug!(path = req.path(), "Anonymous request redirected to login");
                return Ok(req.into_response(
                    HttpResponse::Found()
                        .insert_header((header::LOCATION, login_url.as_ref()))
                        .finish(),
                ));
            }

            let res = service.call(req).await?;
            Ok(res.map_into_boxed_body())
        })
    }
}
