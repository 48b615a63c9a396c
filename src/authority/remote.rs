//! [`TokenAuthority`] backed by a real OAuth 2.0 token endpoint.
//!
//! Full renewals use the `client_credentials` grant and replace both secrets; standard
//! refreshes use the `refresh_token` grant and keep the installed refresh token unless the
//! provider rotates it. The initial token pair is requested while connecting, so a connected
//! authority is immediately usable.

// crates.io
use oauth2::{
	AuthType, ClientId, ClientSecret, EndpointNotSet, EndpointSet, HttpClientError, RefreshToken,
	RequestTokenError, Scope, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicErrorResponseType, BasicRequestTokenError},
};
use reqwest::redirect::Policy;
// self
use crate::{
	_prelude::*,
	authority::{AuthorityFuture, GrantType, TokenAuthority},
	config::{ClientAuthMethod, ConnectionConfig},
	error::{AuthError, ConfigError, TransientError, TransportError},
	secret::TokenSecret,
};

type ConfiguredBasicClient =
	BasicClient<EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type ReqwestTokenError = BasicRequestTokenError<HttpClientError<ReqwestError>>;

/// Token pair currently installed in the authority.
#[derive(Clone)]
struct IssuedTokens {
	access_token: TokenSecret,
	refresh_token: Option<TokenSecret>,
	expires_at: Option<OffsetDateTime>,
}
impl IssuedTokens {
	fn from_response(
		response: &oauth2::basic::BasicTokenResponse,
		kept_refresh: Option<TokenSecret>,
	) -> Self {
		let now = OffsetDateTime::now_utc();
		let expires_at = response
			.expires_in()
			.and_then(|ttl| Duration::try_from(ttl).ok())
			.and_then(|ttl| now.checked_add(ttl));
		let refresh_token = response
			.refresh_token()
			.map(|token| TokenSecret::new(token.secret().to_owned()))
			.or(kept_refresh);

		Self {
			access_token: TokenSecret::new(response.access_token().secret().to_owned()),
			refresh_token,
			expires_at,
		}
	}
}

/// OAuth 2.0 authority that owns the live token pair for one client session.
pub struct OAuth2Authority {
	config: ConnectionConfig,
	oauth_client: ConfiguredBasicClient,
	http_client: ReqwestClient,
	tokens: RwLock<Option<IssuedTokens>>,
}
impl OAuth2Authority {
	/// Validates `config`, provisions a reqwest transport, and requests the initial token pair.
	///
	/// Token endpoints answer directly, so the transport does not follow redirects.
	pub async fn connect(config: ConnectionConfig) -> Result<Self> {
		Self::with_http_client(config, token_http_client()?).await
	}

	/// Same as [`connect`](Self::connect) but reuses a caller-provided reqwest client.
	pub async fn with_http_client(
		config: ConnectionConfig,
		http_client: ReqwestClient,
	) -> Result<Self> {
		config.validate()?;

		let token_url = TokenUrl::new(config.auth_endpoint.to_string())
			.map_err(|source| ConfigError::InvalidEndpoint { endpoint: "auth", source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.expose().to_owned()))
			.set_token_uri(token_url);

		if matches!(config.client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		let authority = Self { config, oauth_client, http_client, tokens: RwLock::new(None) };

		authority.renew().await?;

		Ok(authority)
	}

	/// Returns the configuration this authority was built from.
	pub fn config(&self) -> &ConnectionConfig {
		&self.config
	}

	/// Returns the most recently issued access token.
	pub fn access_token(&self) -> Option<TokenSecret> {
		self.tokens.read().as_ref().map(|tokens| tokens.access_token.clone())
	}

	/// Returns the expiry of the current access token, when the provider reported one.
	pub fn access_token_expires_at(&self) -> Option<OffsetDateTime> {
		self.tokens.read().as_ref().and_then(|tokens| tokens.expires_at)
	}

	/// Returns `true` when a refresh token is installed.
	pub fn has_refresh_token(&self) -> bool {
		self.tokens.read().as_ref().is_some_and(|tokens| tokens.refresh_token.is_some())
	}

	async fn renew(&self) -> Result<(), AuthError> {
		let mut request = self.oauth_client.exchange_client_credentials();

		for scope in &self.config.scopes {
			request = request.add_scope(Scope::new(scope.to_owned()));
		}
		for (key, value) in &self.config.extra_params {
			request = request.add_extra_param(key.as_str(), value.as_str());
		}

		let response = request
			.request_async(&self.http_client)
			.await
			.map_err(|err| map_request_error(GrantType::ClientCredentials, err))?;

		*self.tokens.write() = Some(IssuedTokens::from_response(&response, None));

		Ok(())
	}

	async fn refresh(&self) -> Result<TokenSecret, AuthError> {
		let current = self
			.tokens
			.read()
			.as_ref()
			.and_then(|tokens| tokens.refresh_token.clone())
			.ok_or(AuthError::MissingRefreshToken)?;
		let refresh_secret = RefreshToken::new(current.expose().to_owned());
		let mut request = self.oauth_client.exchange_refresh_token(&refresh_secret);

		for (key, value) in &self.config.extra_params {
			request = request.add_extra_param(key.as_str(), value.as_str());
		}

		let response = request
			.request_async(&self.http_client)
			.await
			.map_err(|err| map_request_error(GrantType::RefreshToken, err))?;
		let issued = IssuedTokens::from_response(&response, Some(current));
		let access_token = issued.access_token.clone();

		*self.tokens.write() = Some(issued);

		Ok(access_token)
	}
}
impl TokenAuthority for OAuth2Authority {
	fn request_full_renewal(&self) -> AuthorityFuture<'_, ()> {
		Box::pin(self.renew())
	}

	fn refresh_access_token(&self) -> AuthorityFuture<'_, TokenSecret> {
		Box::pin(self.refresh())
	}
}
impl Debug for OAuth2Authority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Authority")
			.field("client_id", &self.config.client_id)
			.field("auth_endpoint", &self.config.auth_endpoint.as_str())
			.field("has_refresh_token", &self.has_refresh_token())
			.finish()
	}
}

/// Builds the reqwest transport used for token requests; redirects are not followed.
pub(crate) fn token_http_client() -> Result<ReqwestClient, ConfigError> {
	Ok(ReqwestClient::builder().redirect(Policy::none()).build()?)
}

fn map_request_error(grant: GrantType, err: ReqwestTokenError) -> AuthError {
	match err {
		RequestTokenError::ServerResponse(response) => map_server_response_error(grant, response),
		RequestTokenError::Request(error) => map_transport_error(grant, error),
		RequestTokenError::Parse(source, _body) =>
			TransientError::TokenResponseParse { source }.into(),
		RequestTokenError::Other(message) => TransientError::TokenEndpoint {
			message: format!("{grant} grant failed: {message}"),
			status: None,
		}
		.into(),
	}
}

fn map_server_response_error(grant: GrantType, response: BasicErrorResponse) -> AuthError {
	let code = response.error().as_ref().to_owned();
	let reason = match response.error_description() {
		Some(description) => format!("{grant} grant failed with `{code}`: {description}"),
		None => format!("{grant} grant failed with `{code}`"),
	};

	match response.error() {
		BasicErrorResponseType::InvalidGrant => AuthError::InvalidGrant { reason },
		BasicErrorResponseType::InvalidClient | BasicErrorResponseType::UnauthorizedClient =>
			AuthError::InvalidClient { reason },
		_ => AuthError::Rejected { code, reason },
	}
}

fn map_transport_error(grant: GrantType, err: HttpClientError<ReqwestError>) -> AuthError {
	match err {
		HttpClientError::Reqwest(inner) if inner.is_timeout() => TransientError::TokenEndpoint {
			message: format!("{grant} request timed out"),
			status: inner.status().map(|code| code.as_u16()),
		}
		.into(),
		HttpClientError::Reqwest(inner) => TransportError::network(*inner).into(),
		HttpClientError::Http(inner) => TransportError::network(inner).into(),
		HttpClientError::Io(inner) => TransportError::Io(inner).into(),
		HttpClientError::Other(message) => TransientError::TokenEndpoint {
			message: format!("HTTP client error during the {grant} grant: {message}"),
			status: None,
		}
		.into(),
		_ => TransientError::TokenEndpoint {
			message: format!("HTTP client error during the {grant} grant"),
			status: None,
		}
		.into(),
	}
}
