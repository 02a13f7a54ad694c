//! Per-request deadline supplied by the gateway.

use std::future::{Future, Ready, ready};
use std::time::Duration;

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use agora_core::DomainError;

use super::error::{AppError, AppResult};

/// Header carrying the remaining time budget in milliseconds.
pub const TIMEOUT_HEADER: &str = "X-Request-Timeout-Ms";

/// Optional time budget for the service call behind a request.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestDeadline(Option<Duration>);

impl RequestDeadline {
    pub fn after(budget: Duration) -> Self {
        Self(Some(budget))
    }

    /// Drive `work` to completion or give up when the budget runs out.
    ///
    /// Giving up drops the future, which rolls back any open transaction.
    pub async fn run<T, F>(self, work: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, DomainError>>,
    {
        match self.0 {
            Some(budget) => match tokio::time::timeout(budget, work).await {
                Ok(result) => result.map_err(AppError::from),
                Err(_) => {
                    tracing::warn!(budget_ms = budget.as_millis(), "Request deadline exceeded");
                    Err(AppError::DeadlineExceeded)
                }
            },
            None => work.await.map_err(AppError::from),
        }
    }
}

impl FromRequest for RequestDeadline {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let deadline = match req.headers().get(TIMEOUT_HEADER) {
            None => Ok(Self::default()),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(|v| v.trim().parse::<u64>().ok())
                .map(|ms| Self::after(Duration::from_millis(ms)))
                .ok_or_else(|| {
                    AppError::BadRequest(format!("{TIMEOUT_HEADER} must be a whole number of milliseconds"))
                }),
        };

        ready(deadline)
    }
}
