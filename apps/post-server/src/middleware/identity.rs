//! Caller identity extractor.

use std::future::{Ready, ready};

use actix_web::{FromRequest, HttpRequest, dev::Payload};

use super::error::AppError;

/// Header carrying the caller identity set by the gateway.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Opaque identity of the caller.
///
/// The gateway authenticates users and forwards the identity; this service
/// only requires it to be present and non-empty:
/// ```ignore
/// async fn handler(caller: CallerId) -> impl Responder {
///     format!("Hello, {}!", caller.as_str())
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerId(String);

impl CallerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromRequest for CallerId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let caller = req
            .headers()
            .get(USER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(|v| CallerId(v.to_string()))
            .ok_or_else(|| {
                AppError::Unauthorized(format!("missing caller identity ({USER_ID_HEADER})"))
            });

        ready(caller)
    }
}
