//! Incremental construction of [`ConnectionConfig`] values.

// self
use crate::{
	_prelude::*,
	config::{ClientAuthMethod, ConnectionConfig},
	error::ConfigError,
	secret::TokenSecret,
};

/// Builder for [`ConnectionConfig`] values.
#[derive(Debug)]
pub struct ConnectionConfigBuilder {
	/// OAuth 2.0 client identifier.
	pub client_id: String,
	/// Client secret, required before [`build`](Self::build).
	pub client_secret: Option<TokenSecret>,
	/// Token endpoint, required before [`build`](Self::build).
	pub auth_endpoint: Option<Url>,
	/// Optional REST base URL.
	pub endpoint: Option<Url>,
	/// Scopes requested during a full renewal.
	pub scopes: Vec<String>,
	/// Client authentication mode for the token endpoint.
	pub client_auth_method: ClientAuthMethod,
	/// Additional token request parameters.
	pub extra_params: BTreeMap<String, String>,
}
impl ConnectionConfigBuilder {
	/// Creates a new builder seeded with the provided client identifier.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			auth_endpoint: None,
			endpoint: None,
			scopes: Vec::new(),
			client_auth_method: ClientAuthMethod::default(),
			extra_params: BTreeMap::new(),
		}
	}

	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<TokenSecret>) -> Self {
		self.client_secret = Some(secret.into());

		self
	}

	/// Sets the token endpoint.
	pub fn auth_endpoint(mut self, url: Url) -> Self {
		self.auth_endpoint = Some(url);

		self
	}

	/// Sets the REST base URL.
	pub fn endpoint(mut self, url: Url) -> Self {
		self.endpoint = Some(url);

		self
	}

	/// Appends a scope requested during full renewals.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scopes.push(scope.into());

		self
	}

	/// Overrides the client authentication mode.
	pub fn client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.client_auth_method = method;

		self
	}

	/// Adds a form parameter sent with every token request.
	pub fn extra_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.extra_params.insert(key.into(), value.into());

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ConnectionConfig, ConfigError> {
		let client_secret = self.client_secret.ok_or(ConfigError::MissingClientSecret)?;
		let auth_endpoint = self.auth_endpoint.ok_or(ConfigError::MissingAuthEndpoint)?;
		let config = ConnectionConfig {
			client_id: self.client_id,
			client_secret,
			auth_endpoint,
			endpoint: self.endpoint,
			scopes: self.scopes,
			client_auth_method: self.client_auth_method,
			extra_params: self.extra_params,
		};

		config.validate()?;

		Ok(config)
	}
}
