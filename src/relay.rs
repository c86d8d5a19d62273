use std::sync::Arc;

use axum::http::{HeaderMap, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::{info, warn, Instrument};

use crate::config::Config;
use crate::cors;
use crate::error::RelayError;
use crate::payload::{RequestBody, Submission};
use crate::telegram::Messenger;

/// The `{ ok, error? }` body returned on every non-preflight path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Envelope {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Envelope {
    pub fn ok() -> Self {
        Self {
            ok: true,
            error: None,
        }
    }

    pub fn error(code: String) -> Self {
        Self {
            ok: false,
            error: Some(code),
        }
    }
}

/// What the relay needs from an HTTP request, independent of the host.
#[derive(Debug)]
pub struct InboundRequest {
    pub method: Method,
    pub origin: Option<String>,
    pub body: RequestBody,
}

#[derive(Debug)]
pub struct RelayResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    /// `None` means an empty body.
    pub envelope: Option<Envelope>,
}

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        match self.envelope {
            Some(envelope) => (self.status, self.headers, Json(envelope)).into_response(),
            None => (self.status, self.headers).into_response(),
        }
    }
}

enum Outcome {
    Preflight,
    Delivered,
}

/// Contact-form relay: validates a submission and forwards it to Telegram.
pub struct Relay {
    config: Config,
    messenger: Arc<dyn Messenger>,
}

impl Relay {
    pub fn new(config: Config, messenger: Arc<dyn Messenger>) -> Self {
        Self { config, messenger }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub async fn handle(&self, request: InboundRequest) -> RelayResponse {
        let span = tracing::info_span!(
            "relay",
            request_id = %uuid::Uuid::new_v4(),
            method = %request.method,
        );
        self.handle_inner(request).instrument(span).await
    }

    async fn handle_inner(&self, request: InboundRequest) -> RelayResponse {
        let cors = cors::resolve(
            request.origin.as_deref(),
            &self.config.cors.allowed_origins,
        );
        let preflight = request.method == Method::OPTIONS;

        let (status, envelope) = match self.dispatch(request).await {
            Ok(Outcome::Preflight) => (StatusCode::NO_CONTENT, None),
            Ok(Outcome::Delivered) => {
                info!("Contact message delivered");
                (StatusCode::OK, Some(Envelope::ok()))
            }
            Err(err) => {
                warn!(status = err.status().as_u16(), "Relay request rejected: {err}");
                (err.status(), Some(Envelope::error(err.code())))
            }
        };

        let mut headers = HeaderMap::new();
        if let Some(cors) = &cors {
            cors.apply(&mut headers, preflight);
        }

        RelayResponse {
            status,
            headers,
            envelope,
        }
    }

    async fn dispatch(&self, request: InboundRequest) -> Result<Outcome, RelayError> {
        if request.method == Method::OPTIONS {
            return Ok(Outcome::Preflight);
        }
        if request.method != Method::POST {
            return Err(RelayError::MethodNotAllowed);
        }

        let credentials = self
            .config
            .telegram
            .credentials()
            .ok_or(RelayError::NotConfigured)?;

        let object = request
            .body
            .into_object(self.config.server.max_body_bytes)
            .await;
        let submission = Submission::from_object(object.as_ref());
        submission.validate().map_err(RelayError::InvalidPayload)?;

        self.messenger
            .send_message(credentials, &submission.compose())
            .await?;

        Ok(Outcome::Delivered)
    }
}
