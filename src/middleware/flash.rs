//! Flash messages.
//!
//! Handlers never touch the session to leave a message. They return an
//! [`Outcome`] (redirect target plus messages); [`persist_flashes`] moves the
//! messages into the session once the handler is done, and the next page view
//! drains them with the [`Flashes`] extractor.

use axum::{
    async_trait,
    extract::{FromRequestParts, Request},
    http::request::Parts,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use tower_sessions::Session;

pub const FLASH_KEY: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// A redirect instruction and the messages to show after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub location: String,
    pub flashes: Vec<Flash>,
}

impl Outcome {
    pub fn to(location: impl Into<String>) -> Self {
        Self {
            location: location.into(),
            flashes: Vec::new(),
        }
    }

    pub fn success(mut self, message: impl Into<String>) -> Self {
        self.flashes.push(Flash {
            kind: FlashKind::Success,
            message: message.into(),
        });
        self
    }

    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.flashes.push(Flash {
            kind: FlashKind::Error,
            message: message.into(),
        });
        self
    }
}

/// Result of a form submission: both arms are redirects.
pub type FormResult = std::result::Result<Outcome, Outcome>;

/// Messages riding on a response until [`persist_flashes`] stores them.
#[derive(Debug, Clone)]
struct PendingFlashes(Vec<Flash>);

impl IntoResponse for Outcome {
    fn into_response(self) -> Response {
        let mut response = Redirect::to(&self.location).into_response();
        if !self.flashes.is_empty() {
            response
                .extensions_mut()
                .insert(PendingFlashes(self.flashes));
        }
        response
    }
}

/// Maps any failure to a redirect carrying `message`, logging the cause.
pub trait OrRedirect<T> {
    fn or_redirect(self, location: &str, message: &str) -> std::result::Result<T, Outcome>;
}

impl<T, E: std::fmt::Display> OrRedirect<T> for std::result::Result<T, E> {
    fn or_redirect(self, location: &str, message: &str) -> std::result::Result<T, Outcome> {
        self.map_err(|err| {
            tracing::error!(error = %err, redirect = location, "{}", message);
            Outcome::to(location).error(message)
        })
    }
}

pub async fn persist_flashes(session: Session, req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;

    if let Some(PendingFlashes(flashes)) = response.extensions_mut().remove::<PendingFlashes>() {
        let mut queued = match session.get::<Vec<Flash>>(FLASH_KEY).await {
            Ok(existing) => existing.unwrap_or_default(),
            Err(err) => {
                tracing::warn!(error = %err, "Could not read queued flash messages");
                Vec::new()
            }
        };
        queued.extend(flashes);
        if let Err(err) = session.insert(FLASH_KEY, queued).await {
            tracing::warn!(error = %err, "Could not store flash messages");
        }
    }

    response
}

/// Drains the messages queued by earlier redirects.
#[derive(Debug, Clone, Default)]
pub struct Flashes(pub Vec<Flash>);

impl Flashes {
    /// Puts drained messages back ahead of `outcome`'s own, for pages that
    /// redirect after they already took the queue.
    pub fn requeue_into(&self, mut outcome: Outcome) -> Outcome {
        let mut flashes = self.0.clone();
        flashes.append(&mut outcome.flashes);
        outcome.flashes = flashes;
        outcome
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Flashes
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Ok(session) = Session::from_request_parts(parts, state).await else {
            return Ok(Flashes::default());
        };
        match session.remove::<Vec<Flash>>(FLASH_KEY).await {
            Ok(flashes) => Ok(Flashes(flashes.unwrap_or_default())),
            Err(err) => {
                tracing::warn!(error = %err, "Could not drain flash messages");
                Ok(Flashes::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, StatusCode};

    #[test]
    fn outcome_is_a_see_other_redirect() {
        let response = Outcome::to("/leads").success("Lead added successfully!").into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/leads");
        let pending = response.extensions().get::<PendingFlashes>().unwrap();
        assert_eq!(pending.0.len(), 1);
        assert_eq!(pending.0[0].kind, FlashKind::Success);
    }

    #[test]
    fn outcome_without_messages_carries_nothing() {
        let response = Outcome::to("/auth/login").into_response();
        assert!(response.extensions().get::<PendingFlashes>().is_none());
    }

    #[test]
    fn or_redirect_wraps_errors() {
        let failed: std::result::Result<(), String> = Err("boom".into());
        let outcome = failed.or_redirect("/leads/new", "Failed to add lead. Try again.").unwrap_err();
        assert_eq!(outcome.location, "/leads/new");
        assert_eq!(
            outcome.flashes,
            vec![Flash {
                kind: FlashKind::Error,
                message: "Failed to add lead. Try again.".into()
            }]
        );
    }

    #[test]
    fn requeued_messages_survive_a_failed_page_load() {
        let drained = Flashes(vec![Flash {
            kind: FlashKind::Success,
            message: "Lead updated successfully!".into(),
        }]);
        let failed: std::result::Result<(), String> = Err("db down".into());
        let outcome = failed
            .or_redirect("/dashboard", "Failed to load leads")
            .map_err(|o| drained.requeue_into(o))
            .unwrap_err();

        assert_eq!(outcome.location, "/dashboard");
        let messages: Vec<_> = outcome.flashes.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, ["Lead updated successfully!", "Failed to load leads"]);

        let response = outcome.into_response();
        assert_eq!(response.extensions().get::<PendingFlashes>().unwrap().0.len(), 2);
    }
}
