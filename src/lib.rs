//! OAuth 2.0 client wrapper that keeps sessions alive past refresh-token expiry.
//!
//! Providers expire refresh tokens after a fixed window. [`lifecycle::AutoRefreshClient`]
//! forces one serialized full renewal per configured window and always hands back a fresh
//! access token, while [`query::QueryFacade`] looks resources up by name on top of it.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod authority;
pub mod clock;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod obs;
pub mod query;
pub mod secret;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports, test doubles, and integration-test fixtures; enabled via
	//! `cfg(test)` or the `test` crate feature.

	pub use crate::_prelude::*;

	// std
	use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
	// self
	use crate::{
		authority::{AuthorityFuture, TokenAuthority},
		error::AuthError,
		secret::TokenSecret,
	};
	#[cfg(feature = "reqwest")]
	use crate::{authority::OAuth2Authority, config::ConnectionConfig};

	/// Client identifier used by the connection fixtures.
	pub const TEST_CLIENT_ID: &str = "fuel-client";
	/// Client secret used by the connection fixtures.
	pub const TEST_CLIENT_SECRET: &str = "fuel-secret";

	/// Builds a reqwest client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	#[cfg(feature = "reqwest")]
	pub fn test_reqwest_client() -> ReqwestClient {
		ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.")
	}

	/// Builds a connection configuration with the fixture credentials and `token_url`.
	#[cfg(feature = "reqwest")]
	pub fn test_connection_config(token_url: &str) -> ConnectionConfig {
		ConnectionConfig::builder(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.auth_endpoint(Url::parse(token_url).expect("Fixture token URL should parse."))
			.build()
			.expect("Fixture connection config should build.")
	}

	/// Connects an [`OAuth2Authority`] through [`test_reqwest_client`].
	#[cfg(feature = "reqwest")]
	pub async fn connect_test_authority(config: ConnectionConfig) -> OAuth2Authority {
		OAuth2Authority::with_http_client(config, test_reqwest_client())
			.await
			.expect("Authority should connect against the test token endpoint.")
	}

	/// Renders a bearer token response, optionally carrying a refresh token.
	pub fn token_response_body(access: &str, refresh: Option<&str>) -> String {
		let mut body = serde_json::json!({
			"access_token": access,
			"token_type": "bearer",
			"expires_in": 1200,
		});

		if let Some(refresh) = refresh {
			body["refresh_token"] = refresh.into();
		}

		body.to_string()
	}

	/// Operation observed by [`RecordingAuthority`].
	#[derive(Clone, Copy, Debug, PartialEq, Eq)]
	pub enum AuthorityCall {
		/// `request_full_renewal` was invoked.
		FullRenewal,
		/// `refresh_access_token` was invoked.
		Refresh,
	}

	/// Call-counting [`TokenAuthority`] double.
	///
	/// Access tokens are minted as `access-<generation>-<refresh count>`, where the generation
	/// increments on every successful full renewal.
	#[derive(Debug, Default)]
	pub struct RecordingAuthority {
		calls: Mutex<Vec<AuthorityCall>>,
		generation: AtomicU64,
		refreshes: AtomicU64,
		fail_renewals: AtomicBool,
		fail_refreshes: AtomicBool,
		latency: std::time::Duration,
	}
	impl RecordingAuthority {
		/// Blocks the calling thread for `latency` inside every operation.
		pub fn with_latency(mut self, latency: std::time::Duration) -> Self {
			self.latency = latency;

			self
		}

		/// Makes subsequent full renewals fail with [`AuthError::InvalidClient`].
		pub fn fail_renewals(&self, fail: bool) {
			self.fail_renewals.store(fail, Ordering::SeqCst);
		}

		/// Makes subsequent refreshes fail with [`AuthError::InvalidGrant`].
		pub fn fail_refreshes(&self, fail: bool) {
			self.fail_refreshes.store(fail, Ordering::SeqCst);
		}

		/// Returns every observed call in order.
		pub fn calls(&self) -> Vec<AuthorityCall> {
			self.calls.lock().clone()
		}

		/// Returns how many full renewals were requested.
		pub fn full_renewals(&self) -> usize {
			self.count(AuthorityCall::FullRenewal)
		}

		/// Returns how many refreshes were requested.
		pub fn refreshes(&self) -> usize {
			self.count(AuthorityCall::Refresh)
		}

		fn count(&self, call: AuthorityCall) -> usize {
			self.calls.lock().iter().filter(|seen| **seen == call).count()
		}

		fn observe(&self, call: AuthorityCall) {
			self.calls.lock().push(call);

			if !self.latency.is_zero() {
				std::thread::sleep(self.latency);
			}
		}
	}
	impl TokenAuthority for RecordingAuthority {
		fn request_full_renewal(&self) -> AuthorityFuture<'_, ()> {
			Box::pin(async move {
				self.observe(AuthorityCall::FullRenewal);

				if self.fail_renewals.load(Ordering::SeqCst) {
					return Err(AuthError::InvalidClient { reason: "renewal rejected".into() });
				}

				self.generation.fetch_add(1, Ordering::SeqCst);

				Ok(())
			})
		}

		fn refresh_access_token(&self) -> AuthorityFuture<'_, TokenSecret> {
			Box::pin(async move {
				self.observe(AuthorityCall::Refresh);

				if self.fail_refreshes.load(Ordering::SeqCst) {
					return Err(AuthError::InvalidGrant { reason: "refresh token expired".into() });
				}

				let count = self.refreshes.fetch_add(1, Ordering::SeqCst) + 1;
				let generation = self.generation.load(Ordering::SeqCst);

				Ok(TokenSecret::new(format!("access-{generation}-{count}")))
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use {oauth2, time, url};
#[cfg(test)] use {color_eyre as _, httpmock as _};
