//! Refresh-token lifecycle management on top of a [`TokenAuthority`].
//!
//! Providers expire the refresh token itself after a fixed window, so a client that only
//! refreshes access tokens eventually fails outright. [`AutoRefreshClient`] tracks when the
//! refresh token was last renewed and, on every [`refresh_access_token`] call, forces a full
//! renewal once the configured life has elapsed before running the standard refresh.
//!
//! The whole check-then-act sequence runs under one lock. Providers invalidate a refresh token
//! the moment it is used, so two callers renewing concurrently would silently break the session.
//!
//! [`refresh_access_token`]: AutoRefreshClient::refresh_access_token

mod metrics;
mod session;

pub use metrics::LifecycleMetrics;

// self
use crate::{
	_prelude::*,
	authority::TokenAuthority,
	clock::{Clock, SystemClock},
	error::ConfigError,
	lifecycle::session::ClientSession,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	secret::TokenSecret,
};
#[cfg(feature = "reqwest")]
use crate::{
	authority::{OAuth2Authority, remote},
	config::ConnectionSource,
};

/// Refresh-token life used when the caller does not supply one.
pub const DEFAULT_REFRESH_TOKEN_LIFE: Duration = Duration::days(1);

#[cfg(feature = "reqwest")]
/// Lifecycle client specialized for the crate's OAuth 2.0 authority.
pub type OAuth2AutoRefreshClient = AutoRefreshClient<OAuth2Authority>;

/// Access-token provider that forces a full renewal once per refresh-token life.
///
/// Safe to share across tasks (wrap it in an [`Arc`]); all refreshes are serialized.
pub struct AutoRefreshClient<A>
where
	A: ?Sized + TokenAuthority,
{
	authority: Arc<A>,
	clock: Arc<dyn Clock>,
	session: ClientSession,
	metrics: LifecycleMetrics,
}
impl<A> AutoRefreshClient<A>
where
	A: ?Sized + TokenAuthority,
{
	/// Wraps `authority`, validating `refresh_token_life` (default: one day).
	pub fn new(authority: Arc<A>, refresh_token_life: Option<Duration>) -> Result<Self> {
		Self::with_clock(authority, refresh_token_life, Arc::new(SystemClock))
	}

	/// Same as [`new`](Self::new) but reads time from `clock`.
	pub fn with_clock(
		authority: Arc<A>,
		refresh_token_life: Option<Duration>,
		clock: Arc<dyn Clock>,
	) -> Result<Self> {
		let refresh_token_life = validate_refresh_token_life(refresh_token_life)?;

		Ok(Self::assemble(authority, refresh_token_life, clock))
	}

	fn assemble(authority: Arc<A>, refresh_token_life: Duration, clock: Arc<dyn Clock>) -> Self {
		let session = ClientSession::new(refresh_token_life, clock.now());

		obs::client_created(refresh_token_life);

		Self { authority, clock, session, metrics: LifecycleMetrics::default() }
	}

	/// Returns a currently valid access token, forcing a full renewal first when the refresh
	/// token has outlived its configured life.
	///
	/// At most one forced renewal runs per elapsed window no matter how many callers race here.
	/// The renewal timestamp is advanced *before* the renewal resolves, so a failed renewal
	/// is not retried until another full window passes. Authority failures propagate unchanged
	/// as [`Error::Auth`].
	pub async fn refresh_access_token(&self) -> Result<TokenSecret> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh_access_token");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		self.metrics.record_attempt();

		let result = span
			.instrument(async move {
				let session = self.session.lock().await;
				let now = self.clock.now();

				if session.renewal_due(now) {
					let previous = session.mark_renewed(now);

					self.force_renewal(previous).await?;
				}

				self.authority.refresh_access_token().await.map_err(Error::from)
			})
			.await;

		if result.is_err() {
			self.metrics.record_failure();
		}

		obs::record_result(KIND, &result);

		result
	}

	/// Returns the instant of the last forced renewal (construction time until one happens).
	///
	/// Does not wait for an in-flight refresh, so the value may be about to change.
	pub fn last_refresh_time(&self) -> OffsetDateTime {
		self.session.last_refresh()
	}

	/// Returns the configured refresh-token life.
	pub fn refresh_token_life(&self) -> Duration {
		self.session.refresh_token_life()
	}

	/// Returns the wrapped authority.
	pub fn authority(&self) -> &A {
		&self.authority
	}

	/// Returns refresh counters for this client.
	pub fn metrics(&self) -> &LifecycleMetrics {
		&self.metrics
	}

	async fn force_renewal(&self, previous: OffsetDateTime) -> Result<()> {
		const KIND: FlowKind = FlowKind::FullRenewal;

		let span = FlowSpan::new(KIND, "request_full_renewal");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);
		obs::forced_renewal_due(previous, self.session.refresh_token_life());
		self.metrics.record_forced_renewal();

		let result =
			span.instrument(self.authority.request_full_renewal()).await.map_err(Error::from);

		obs::record_result(KIND, &result);

		result
	}
}
#[cfg(feature = "reqwest")]
impl AutoRefreshClient<OAuth2Authority> {
	/// Connects an [`OAuth2Authority`] from a descriptor file or in-memory configuration.
	///
	/// `refresh_token_life` is validated before the configuration is read or any token is
	/// requested. Token requests do not follow redirects.
	pub async fn connect(
		source: impl Into<ConnectionSource>,
		refresh_token_life: Option<Duration>,
	) -> Result<Self> {
		let http_client = remote::token_http_client()?;

		Self::connect_with_http_client(source, refresh_token_life, http_client).await
	}

	/// Same as [`connect`](Self::connect) but reuses a caller-provided reqwest client.
	pub async fn connect_with_http_client(
		source: impl Into<ConnectionSource>,
		refresh_token_life: Option<Duration>,
		http_client: ReqwestClient,
	) -> Result<Self> {
		let refresh_token_life = validate_refresh_token_life(refresh_token_life)?;
		let config = source.into().resolve()?;
		let authority = OAuth2Authority::with_http_client(config, http_client).await?;

		Ok(Self::assemble(Arc::new(authority), refresh_token_life, Arc::new(SystemClock)))
	}
}
impl<A> Debug for AutoRefreshClient<A>
where
	A: ?Sized + TokenAuthority,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AutoRefreshClient")
			.field("refresh_token_life", &self.session.refresh_token_life())
			.field("last_refresh", &self.session.last_refresh())
			.field("metrics", &self.metrics)
			.finish()
	}
}

fn validate_refresh_token_life(
	refresh_token_life: Option<Duration>,
) -> Result<Duration, ConfigError> {
	let life = refresh_token_life.unwrap_or(DEFAULT_REFRESH_TOKEN_LIFE);

	if life.is_positive() { Ok(life) } else { Err(ConfigError::InvalidRefreshTokenLife { life }) }
}
