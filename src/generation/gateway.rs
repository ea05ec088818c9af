use std::time::Duration;

/// Transport and availability failures of the generation gateway.
///
/// Malformed response text is not an error here: the gateway returns it and ingestion repairs it.
#[derive(thiserror::Error, Clone, Debug, PartialEq)]
pub enum GatewayError {
    #[error("generation gateway unavailable: {0}")]
    Unavailable(String),

    #[error("generation gateway rate limited (retry after {retry_after_s:?}s)")]
    RateLimited { retry_after_s: Option<f64> },

    #[error("generation quota exhausted")]
    QuotaExhausted,

    #[error("generation gateway timed out after {0} ms")]
    Timeout(u64),

    #[error("generation gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
}

impl GatewayError {
    /// Only transient transport failures are retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Timeout(_))
    }

    /// Stable status label for callers that message the user.
    pub fn status(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::RateLimited { .. } => "rate_limited",
            Self::QuotaExhausted => "quota_exhausted",
            Self::Timeout(_) => "timeout",
            Self::Rejected { .. } => "rejected",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestKind {
    Direction,
    AudioDna,
}

/// One call to the gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct GatewayRequest {
    pub kind: RequestKind,
    pub payload: serde_json::Value,
    /// Raw audio bytes for audio-DNA requests.
    pub attachment: Option<Vec<u8>>,
    /// Extra instruction added on resubmission.
    pub corrective_note: Option<String>,
    pub timeout: Duration,
}

impl GatewayRequest {
    pub fn new(kind: RequestKind, payload: serde_json::Value, timeout: Duration) -> Self {
        Self {
            kind,
            payload,
            attachment: None,
            corrective_note: None,
            timeout,
        }
    }

    pub fn with_attachment(mut self, bytes: Vec<u8>) -> Self {
        self.attachment = Some(bytes);
        self
    }

    pub fn with_corrective_note(mut self, note: impl Into<String>) -> Self {
        self.corrective_note = Some(note.into());
        self
    }
}

/// Text-completion backend producing direction and audio-DNA documents.
pub trait GenerationGateway {
    fn complete(&mut self, request: &GatewayRequest) -> Result<String, GatewayError>;
}

impl<G: GenerationGateway + ?Sized> GenerationGateway for Box<G> {
    fn complete(&mut self, request: &GatewayRequest) -> Result<String, GatewayError> {
        (**self).complete(request)
    }
}

impl<G: GenerationGateway + ?Sized> GenerationGateway for &mut G {
    fn complete(&mut self, request: &GatewayRequest) -> Result<String, GatewayError> {
        (**self).complete(request)
    }
}

/// Bounded retry of transient gateway failures.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts including the first (at least 1).
    pub max_attempts: u32,
    /// Per-request timeout handed to the gateway.
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 2,
            timeout_ms: 45_000,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Call `gateway` until it succeeds, fails with a non-retryable error, or attempts run out.
    pub fn complete<G: GenerationGateway + ?Sized>(
        &self,
        gateway: &mut G,
        request: &GatewayRequest,
    ) -> Result<String, GatewayError> {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match gateway.complete(request) {
                Ok(text) => return Ok(text),
                Err(e) if e.is_retryable() && attempt < attempts => {
                    tracing::warn!(
                        kind = ?request.kind,
                        attempt,
                        error = %e,
                        "gateway call failed; retrying"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    tracing::warn!(
                        kind = ?request.kind,
                        attempt,
                        status = e.status(),
                        "gateway call failed"
                    );
                    return Err(e);
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/generation/gateway.rs"]
mod tests;
