/// Raw outcome of a failed provider call. Carries what happened on the wire
/// without interpreting it; interpretation belongs to [`classify`].
#[derive(Debug, Clone)]
pub struct ProviderFailure {
    pub status: Option<u16>,
    pub body: String,
    pub timed_out: bool,
    pub connect_failed: bool,
}

impl ProviderFailure {
    pub fn from_transport(err: &reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            body: err.to_string(),
            timed_out: err.is_timeout(),
            connect_failed: err.is_connect(),
        }
    }

    pub fn from_response(status: u16, body: String) -> Self {
        Self {
            status: Some(status),
            body,
            timed_out: false,
            connect_failed: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ValidationError,
    MessageTooLong,
    InvalidAmount,
    NetworkError,
    Timeout,
    AuthError,
    RateLimited,
    BadRequest,
    UnprocessableEntity,
    UpstreamServerError,
    ApiError,
    AllProvidersUnavailable,
    Unknown,
}

impl ErrorKind {
    /// HTTP status the caller receives. This mapping is a public contract.
    pub fn http_status(&self) -> u16 {
        match self {
            Self::ValidationError => 400,
            Self::MessageTooLong => 400,
            Self::InvalidAmount => 400,
            Self::NetworkError => 503,
            Self::Timeout => 504,
            Self::AuthError => 401,
            Self::RateLimited => 429,
            Self::BadRequest => 400,
            Self::UnprocessableEntity => 422,
            Self::UpstreamServerError => 502,
            Self::ApiError => 500,
            Self::AllProvidersUnavailable => 503,
            Self::Unknown => 500,
        }
    }

    /// Stable machine-readable code surfaced as `errorCode`.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationError => "VALIDATION_ERROR",
            Self::MessageTooLong => "MESSAGE_TOO_LONG",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::NetworkError => "NETWORK_ERROR",
            Self::Timeout => "TIMEOUT",
            Self::AuthError => "AUTH_ERROR",
            Self::RateLimited => "RATE_LIMITED",
            Self::BadRequest => "BAD_REQUEST",
            Self::UnprocessableEntity => "UNPROCESSABLE_ENTITY",
            Self::UpstreamServerError => "UPSTREAM_SERVER_ERROR",
            Self::ApiError => "API_ERROR",
            Self::AllProvidersUnavailable => "ALL_PROVIDERS_UNAVAILABLE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Caller-facing sentence, independent of the provider's exact wording.
    pub fn message(&self) -> &'static str {
        match self {
            Self::ValidationError => "The request failed validation",
            Self::MessageTooLong => "The composed message exceeds the channel's length limit",
            Self::InvalidAmount => "The amount must be a positive number",
            Self::NetworkError => "Could not reach the messaging provider",
            Self::Timeout => "The messaging provider did not respond in time",
            Self::AuthError => "The messaging provider rejected our credentials",
            Self::RateLimited => "The messaging provider is rate limiting requests",
            Self::BadRequest => "The messaging provider rejected the request",
            Self::UnprocessableEntity => "The messaging provider could not process the request",
            Self::UpstreamServerError => "The messaging provider had an internal error",
            Self::ApiError => "The messaging provider returned an error",
            Self::AllProvidersUnavailable => "All messaging providers are currently unavailable",
            Self::Unknown => "Notification could not be sent",
        }
    }
}

/// Ordered classification table. The first matching predicate wins, so
/// transport-level failures shadow whatever status code came with them.
const CLASSIFICATION_TABLE: &[(fn(&ProviderFailure) -> bool, ErrorKind)] = &[
    (
        |f| f.connect_failed || f.body.contains("connection refused") || f.body.contains("dns error"),
        ErrorKind::NetworkError,
    ),
    (
        |f| f.timed_out || f.body.contains("timed out"),
        ErrorKind::Timeout,
    ),
    (|f| matches!(f.status, Some(401) | Some(403)), ErrorKind::AuthError),
    (|f| f.status == Some(429), ErrorKind::RateLimited),
    (|f| f.status == Some(400), ErrorKind::BadRequest),
    (|f| f.status == Some(422), ErrorKind::UnprocessableEntity),
    (
        |f| matches!(f.status, Some(s) if s >= 500),
        ErrorKind::UpstreamServerError,
    ),
    (|f| !f.body.is_empty(), ErrorKind::ApiError),
];

/// Maps a raw provider failure to exactly one [`ErrorKind`].
pub fn classify(failure: &ProviderFailure) -> ErrorKind {
    CLASSIFICATION_TABLE
        .iter()
        .find(|(predicate, _)| predicate(failure))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Unknown)
}
