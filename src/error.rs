//! Crate-wide error types shared by the lifecycle client, authorities, and the query facade.

// std
use std::path::PathBuf;
// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Invalid refresh-token life or connection configuration.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Token acquisition or refresh failed at the authority.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Backing resource service failed.
	#[error(transparent)]
	Service(#[from] ServiceError),

	/// A required argument was empty or malformed.
	#[error("Invalid argument: {reason}.")]
	InvalidArgument {
		/// Human-readable reason.
		reason: String,
	},
	/// No resource matched the filter.
	#[error("No resource matches the filter `{filter}`.")]
	NotFound {
		/// Rendered filter that produced no match.
		filter: String,
	},
}

/// Configuration and validation failures raised before any token is requested.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Refresh-token life must be strictly positive.
	#[error("Refresh token life must be positive, got {life}.")]
	InvalidRefreshTokenLife {
		/// Rejected duration.
		life: Duration,
	},
	/// Connection descriptor file could not be read.
	#[error("Failed to read connection descriptor {}.", path.display())]
	ReadDescriptor {
		/// Descriptor path.
		path: PathBuf,
		/// Underlying I/O failure.
		#[source]
		source: std::io::Error,
	},
	/// Connection descriptor file is not valid JSON for
	/// [`ConnectionConfig`](crate::config::ConnectionConfig).
	#[error("Failed to parse connection descriptor {}.", path.display())]
	ParseDescriptor {
		/// Descriptor path.
		path: PathBuf,
		/// Structured parsing failure pointing at the offending key.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Client identifier is empty.
	#[error("Client identifier cannot be empty.")]
	MissingClientId,
	/// Client secret is empty.
	#[error("Client secret cannot be empty.")]
	MissingClientSecret,
	/// Token endpoint was not configured.
	#[error("Missing auth endpoint.")]
	MissingAuthEndpoint,
	/// Endpoints must use HTTPS unless they point at a loopback host.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Endpoint could not be converted into an OAuth URL.
	#[error("The {endpoint} endpoint is invalid.")]
	InvalidEndpoint {
		/// Which endpoint failed conversion.
		endpoint: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures surfaced by a [`TokenAuthority`](crate::authority::TokenAuthority).
///
/// The lifecycle client never retries these; they reach the caller unchanged.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Provider rejected the grant (e.g., an expired or already-used refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Provider returned another OAuth error code.
	#[error("Provider returned `{code}`: {reason}.")]
	Rejected {
		/// OAuth `error` field.
		code: String,
		/// Provider-supplied description or the code itself.
		reason: String,
	},
	/// No refresh token is installed, so a standard refresh cannot run.
	#[error("No refresh token is available; a full renewal is required.")]
	MissingRefreshToken,
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}

/// Failures raised by a [`ResourceService`](crate::query::ResourceService).
#[derive(Debug, ThisError)]
pub enum ServiceError {
	/// Service answered with a non-success status.
	#[error("Resource service returned HTTP {status}: {message}.")]
	Status {
		/// HTTP status code.
		status: u16,
		/// Truncated response body.
		message: String,
	},
	/// Request never produced a response.
	#[error("Resource service could not be reached.")]
	Transport {
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Response body did not match the expected resource shape.
	#[error("Resource service returned an undecodable payload.")]
	Decode {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl ServiceError {
	/// Wraps a transport-specific failure.
	pub fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport { source: Box::new(src) }
	}
}
