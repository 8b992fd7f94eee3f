//! Remote error and fetch outcome types.

/// Semantic error categories for remote host calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RemoteErrorKind {
    /// Resource does not exist at the requested ref.
    NotFound,
    /// Credential missing or lacking access.
    PermissionDenied,
    /// Remote host rate limit exhausted.
    RateLimited,
    /// Remote host returned a server error.
    Unavailable,
    /// Response body could not be decoded.
    InvalidResponse,
    /// Connection, TLS or timeout failure.
    Transport,
    /// Other/unknown error category.
    Other,
}

/// Remote host error with semantic kind and optional HTTP status.
#[derive(Debug)]
pub struct RemoteError {
    /// Semantic error category.
    pub kind: RemoteErrorKind,
    /// HTTP status code, when the host answered.
    pub status: Option<u16>,
    /// Resource context (URL or `owner/repo:path`).
    pub resource: Option<String>,
    message: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl RemoteError {
    /// Create a new remote error.
    #[must_use]
    pub fn new(kind: RemoteErrorKind) -> Self {
        Self {
            kind,
            status: None,
            resource: None,
            message: None,
            source: None,
        }
    }

    /// Create a not found error for `resource`.
    #[must_use]
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new(RemoteErrorKind::NotFound)
            .with_status(404)
            .with_resource(resource)
    }

    /// Classify an HTTP error status.
    ///
    /// `rate_limit_exhausted` reflects the `x-ratelimit-remaining: 0` header,
    /// which GitHub sends with 403 and 429 when the quota is spent.
    #[must_use]
    pub fn from_status(status: u16, rate_limit_exhausted: bool) -> Self {
        let kind = match status {
            404 | 410 => RemoteErrorKind::NotFound,
            429 => RemoteErrorKind::RateLimited,
            403 if rate_limit_exhausted => RemoteErrorKind::RateLimited,
            401 | 403 => RemoteErrorKind::PermissionDenied,
            500..=599 => RemoteErrorKind::Unavailable,
            _ => RemoteErrorKind::Other,
        };
        Self::new(kind).with_status(status)
    }

    /// Attach HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Attach resource context.
    #[must_use]
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Attach a human-readable message (e.g. the response body).
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    /// Attach the underlying error source.
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Whether the resource simply does not exist.
    pub fn is_not_found(&self) -> bool {
        self.kind == RemoteErrorKind::NotFound
    }
}

impl std::fmt::Display for RemoteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Format: "Kind (HTTP 404): message (resource: owner/repo:README.md)"
        let kind_str = match self.kind {
            RemoteErrorKind::NotFound => "Not found",
            RemoteErrorKind::PermissionDenied => "Permission denied",
            RemoteErrorKind::RateLimited => "Rate limited",
            RemoteErrorKind::Unavailable => "Unavailable",
            RemoteErrorKind::InvalidResponse => "Invalid response",
            RemoteErrorKind::Transport => "Transport error",
            RemoteErrorKind::Other => "Error",
        };
        write!(f, "{kind_str}")?;

        if let Some(status) = self.status {
            write!(f, " (HTTP {status})")?;
        }
        if let Some(message) = &self.message {
            write!(f, ": {message}")?;
        } else if let Some(source) = &self.source {
            write!(f, ": {source}")?;
        }
        if let Some(resource) = &self.resource {
            write!(f, " (resource: {resource})")?;
        }
        Ok(())
    }
}

impl std::error::Error for RemoteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|s| s.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Outcome of a remote lookup that may legitimately find nothing.
///
/// `Absent` is expected (optional file missing at this ref) and must not be
/// treated as a failure. `Failed` carries the error after retries.
#[derive(Debug)]
#[must_use]
pub enum Fetched<T> {
    /// The resource exists.
    Found(T),
    /// The resource does not exist.
    Absent,
    /// The lookup failed.
    Failed(RemoteError),
}

impl<T> Fetched<T> {
    /// Build from a retried result where `None` means absent.
    pub fn from_result(result: Result<Option<T>, RemoteError>) -> Self {
        match result {
            Ok(Some(value)) => Self::Found(value),
            Ok(None) => Self::Absent,
            Err(e) => Self::Failed(e),
        }
    }

    /// Transform the found value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Fetched<U> {
        match self {
            Self::Found(value) => Fetched::Found(f(value)),
            Self::Absent => Fetched::Absent,
            Self::Failed(e) => Fetched::Failed(e),
        }
    }

    /// Whether the resource was found.
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Collapse into a result, keeping absence as `None`.
    pub fn into_result(self) -> Result<Option<T>, RemoteError> {
        match self {
            Self::Found(value) => Ok(Some(value)),
            Self::Absent => Ok(None),
            Self::Failed(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_classification() {
        assert_eq!(RemoteError::from_status(404, false).kind, RemoteErrorKind::NotFound);
        assert_eq!(RemoteError::from_status(403, true).kind, RemoteErrorKind::RateLimited);
        assert_eq!(
            RemoteError::from_status(403, false).kind,
            RemoteErrorKind::PermissionDenied
        );
        assert_eq!(RemoteError::from_status(429, false).kind, RemoteErrorKind::RateLimited);
        assert_eq!(RemoteError::from_status(502, false).kind, RemoteErrorKind::Unavailable);
        assert_eq!(RemoteError::from_status(422, false).kind, RemoteErrorKind::Other);
    }

    #[test]
    fn test_display_format() {
        let err = RemoteError::not_found("acme/widgets:README.md");
        assert_eq!(
            err.to_string(),
            "Not found (HTTP 404) (resource: acme/widgets:README.md)"
        );

        let err = RemoteError::from_status(500, false).with_message("boom");
        assert_eq!(err.to_string(), "Unavailable (HTTP 500): boom");
    }

    #[test]
    fn test_fetched_from_result() {
        assert!(Fetched::from_result(Ok(Some(1))).is_found());
        assert!(matches!(Fetched::<u8>::from_result(Ok(None)), Fetched::Absent));
        let failed = Fetched::<u8>::from_result(Err(RemoteError::new(RemoteErrorKind::Transport)));
        assert!(failed.into_result().is_err());
    }

    #[test]
    fn test_fetched_map() {
        let mapped = Fetched::Found(2).map(|v| v * 10);
        assert_eq!(mapped.into_result().unwrap(), Some(20));
    }
}
