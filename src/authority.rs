//! Token authority contract and the built-in OAuth 2.0 implementation.
//!
//! A [`TokenAuthority`] owns the live access and refresh tokens and knows how to obtain new
//! ones. The lifecycle client only decides *when* each operation runs; the authority decides
//! *how*. [`OAuth2Authority`] is the production implementation, built on the `oauth2` crate
//! with a reqwest transport.

#[cfg(feature = "reqwest")] pub mod remote;

#[cfg(feature = "reqwest")] pub use remote::OAuth2Authority;

// self
use crate::{_prelude::*, error::AuthError, secret::TokenSecret};

/// Boxed future returned by [`TokenAuthority`] operations.
pub type AuthorityFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, AuthError>> + 'a + Send>>;

/// Capability interface over the component that talks to the token endpoint.
pub trait TokenAuthority
where
	Self: Send + Sync,
{
	/// Re-authenticates from client credentials, installing a brand-new access token and
	/// refresh token inside the authority.
	fn request_full_renewal(&self) -> AuthorityFuture<'_, ()>;

	/// Exchanges the currently installed refresh token for a new access token.
	fn refresh_access_token(&self) -> AuthorityFuture<'_, TokenSecret>;
}

/// OAuth 2.0 grants issued by the built-in authority.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GrantType {
	/// Client Credentials grant used for full renewals.
	ClientCredentials,
	/// Refresh Token grant used for standard refreshes.
	RefreshToken,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub fn as_str(self) -> &'static str {
		match self {
			GrantType::ClientCredentials => "client_credentials",
			GrantType::RefreshToken => "refresh_token",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
