//! Connection configuration for the OAuth authority.
//!
//! A [`ConnectionConfig`] can be assembled in memory through [`ConnectionConfig::builder`] or
//! loaded from a JSON connection descriptor with [`ConnectionConfig::from_file`]. Both paths run
//! the same validation. [`ConnectionSource`] lets constructors accept either form.

/// Builder API for assembling connection configurations in memory.
pub mod builder;

pub use builder::*;

// std
use std::{
	fs,
	net::IpAddr,
	path::{Path, PathBuf},
};
// crates.io
use url::Host;
// self
use crate::{_prelude::*, error::ConfigError, secret::TokenSecret};

/// How client credentials are presented to the token endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Validated connection settings for a single OAuth client session.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionConfig {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret used for every token request.
	pub client_secret: TokenSecret,
	/// Token endpoint that issues and refreshes tokens.
	pub auth_endpoint: Url,
	/// Base URL of the REST API the tokens authorize.
	#[serde(default)]
	pub endpoint: Option<Url>,
	/// Scopes requested during a full renewal.
	#[serde(default)]
	pub scopes: Vec<String>,
	/// Client authentication mode for the token endpoint.
	#[serde(default)]
	pub client_auth_method: ClientAuthMethod,
	/// Additional form parameters sent with every token request (e.g. `access_type=offline`).
	#[serde(default)]
	pub extra_params: BTreeMap<String, String>,
}
impl ConnectionConfig {
	/// Creates a builder for the provided client identifier.
	pub fn builder(client_id: impl Into<String>) -> ConnectionConfigBuilder {
		ConnectionConfigBuilder::new(client_id)
	}

	/// Loads and validates a JSON connection descriptor.
	pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let bytes = fs::read(path)
			.map_err(|source| ConfigError::ReadDescriptor { path: path.to_owned(), source })?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let config: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::ParseDescriptor { path: path.to_owned(), source })?;

		config.validate()?;

		Ok(config)
	}

	/// Checks credentials and endpoint invariants.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.client_id.trim().is_empty() {
			return Err(ConfigError::MissingClientId);
		}
		if self.client_secret.expose().trim().is_empty() {
			return Err(ConfigError::MissingClientSecret);
		}

		validate_endpoint("auth", &self.auth_endpoint)?;

		if let Some(endpoint) = self.endpoint.as_ref() {
			validate_endpoint("rest", endpoint)?;
		}

		Ok(())
	}
}

/// Where a client reads its connection settings from.
#[derive(Clone, Debug)]
pub enum ConnectionSource {
	/// JSON connection descriptor on disk.
	File(PathBuf),
	/// Settings already held in memory.
	Config(Box<ConnectionConfig>),
}
impl ConnectionSource {
	/// Produces a validated configuration from either source.
	pub fn resolve(self) -> Result<ConnectionConfig, ConfigError> {
		match self {
			Self::File(path) => ConnectionConfig::from_file(path),
			Self::Config(config) => {
				config.validate()?;

				Ok(*config)
			},
		}
	}
}
impl From<ConnectionConfig> for ConnectionSource {
	fn from(config: ConnectionConfig) -> Self {
		Self::Config(Box::new(config))
	}
}
impl From<PathBuf> for ConnectionSource {
	fn from(path: PathBuf) -> Self {
		Self::File(path)
	}
}
impl From<&Path> for ConnectionSource {
	fn from(path: &Path) -> Self {
		Self::File(path.to_owned())
	}
}

fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ConfigError> {
	let loopback = match url.host() {
		Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
		Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
		None => false,
	};

	match url.scheme() {
		"https" => Ok(()),
		"http" if loopback => Ok(()),
		_ => Err(ConfigError::InsecureEndpoint { endpoint: name, url: url.to_string() }),
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_descriptor(name: &str, contents: &str) -> PathBuf {
		let path = env::temp_dir().join(format!(
			"oauth2_autorefresh_{name}_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		));

		fs::write(&path, contents).expect("Failed to write descriptor fixture.");

		path
	}

	#[test]
	fn loads_descriptor_with_defaults() {
		let path = temp_descriptor(
			"defaults",
			r#"{
				"client_id": "fuel-client",
				"client_secret": "fuel-secret",
				"auth_endpoint": "https://auth.example.com/v2/token"
			}"#,
		);
		let config = ConnectionConfig::from_file(&path).expect("Descriptor should load.");

		assert_eq!(config.client_id, "fuel-client");
		assert_eq!(config.client_secret.expose(), "fuel-secret");
		assert_eq!(config.client_auth_method, ClientAuthMethod::ClientSecretBasic);
		assert!(config.endpoint.is_none());
		assert!(config.scopes.is_empty());
		assert!(config.extra_params.is_empty());

		fs::remove_file(&path).expect("Failed to remove descriptor fixture.");
	}

	#[test]
	fn parse_errors_point_at_the_offending_key() {
		let path = temp_descriptor(
			"bad_url",
			r#"{
				"client_id": "fuel-client",
				"client_secret": "fuel-secret",
				"auth_endpoint": "not a url"
			}"#,
		);
		let err = ConnectionConfig::from_file(&path).expect_err("Descriptor should be rejected.");

		match err {
			ConfigError::ParseDescriptor { source, .. } =>
				assert_eq!(source.path().to_string(), "auth_endpoint"),
			other => panic!("Unexpected error: {other:?}."),
		}

		fs::remove_file(&path).expect("Failed to remove descriptor fixture.");
	}

	#[test]
	fn unknown_descriptor_keys_are_rejected() {
		let path = temp_descriptor(
			"unknown_key",
			r#"{
				"client_id": "fuel-client",
				"client_secret": "fuel-secret",
				"auth_endpoint": "https://auth.example.com/v2/token",
				"auth_url": "https://auth.example.com/v1/token"
			}"#,
		);
		let err = ConnectionConfig::from_file(&path).expect_err("Unknown key should be rejected.");

		fs::remove_file(&path).expect("Failed to remove descriptor fixture.");

		match err {
			ConfigError::ParseDescriptor { source, .. } =>
				assert!(source.inner().to_string().contains("unknown field `auth_url`")),
			other => panic!("Unexpected error: {other:?}."),
		}
	}

	#[test]
	fn in_memory_source_is_validated_on_resolve() {
		let mut config = ConnectionConfig::builder("fuel-client")
			.client_secret("fuel-secret")
			.auth_endpoint(
				Url::parse("https://auth.example.com/v2/token").expect("Fixture URL should parse."),
			)
			.build()
			.expect("Fixture config should build.");
		let resolved = ConnectionSource::from(config.clone())
			.resolve()
			.expect("Valid in-memory config should resolve.");

		assert_eq!(resolved, config);

		config.client_id = String::new();

		assert!(matches!(
			ConnectionSource::from(config).resolve(),
			Err(ConfigError::MissingClientId)
		));
	}

	#[test]
	fn missing_descriptor_is_a_read_error() {
		let err = ConnectionConfig::from_file("/nonexistent/oauth2_autorefresh.json")
			.expect_err("Missing descriptor should be rejected.");

		assert!(matches!(err, ConfigError::ReadDescriptor { .. }));
	}

	#[test]
	fn plain_http_is_only_allowed_for_loopback() {
		let local = Url::parse("http://127.0.0.1:8080/token").expect("Fixture URL should parse.");
		let named = Url::parse("http://localhost/token").expect("Fixture URL should parse.");
		let remote =
			Url::parse("http://auth.example.com/token").expect("Fixture URL should parse.");

		assert!(validate_endpoint("auth", &local).is_ok());
		assert!(validate_endpoint("auth", &named).is_ok());
		assert!(matches!(
			validate_endpoint("auth", &remote),
			Err(ConfigError::InsecureEndpoint { endpoint: "auth", .. })
		));
	}
}
