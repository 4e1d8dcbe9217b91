use crate::auth::auth::AuthUser;
use crate::config::Config;
use actix_web::http::header::{AUTHORIZATION, HeaderValue};
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};
use serde_json::json;
use tracing::debug;

/// Why a request was turned away before reaching a handler.
#[derive(Debug, PartialEq, Eq)]
pub enum Rejection {
    MissingHeader,
    BadEncoding,
    NotBearer,
    InvalidToken(String),
}

impl Rejection {
    fn message(&self) -> &'static str {
        match self {
            Rejection::MissingHeader => "Missing Authorization header",
            Rejection::BadEncoding => "Invalid Authorization header encoding",
            Rejection::NotBearer => "Authorization header must start with Bearer",
            Rejection::InvalidToken(_) => "Invalid or expired token",
        }
    }
}

/// Resolve the caller from the `Authorization` header value.
pub fn authenticate(header: Option<&HeaderValue>, secret: &str) -> Result<AuthUser, Rejection> {
    let value = header
        .ok_or(Rejection::MissingHeader)?
        .to_str()
        .map_err(|_| Rejection::BadEncoding)?;
    let token = value.strip_prefix("Bearer ").ok_or(Rejection::NotBearer)?;
    AuthUser::from_token(token, secret).map_err(Rejection::InvalidToken)
}

/// Decodes the bearer token once and stores the [`AuthUser`] in the request
/// extensions for the handlers' extractor.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let outcome = {
        let config = req
            .app_data::<Data<Config>>()
            .ok_or_else(|| actix_web::error::ErrorInternalServerError("App config missing"))?;
        authenticate(req.headers().get(AUTHORIZATION), &config.jwt_secret)
    };

    match outcome {
        Ok(user) => {
            req.extensions_mut().insert(user);
            next.call(req).await
        }
        Err(rejection) => {
            debug!(path = req.path(), reason = ?rejection, "Request rejected by auth");
            let resp = HttpResponse::Unauthorized().json(json!({ "message": rejection.message() }));
            Ok(req.into_response(resp.map_into_boxed_body()))
        }
    }
}
