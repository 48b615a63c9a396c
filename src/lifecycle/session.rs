//! Refresh-window state shared by every caller of one client.

// crates.io
use async_lock::MutexGuard as AsyncMutexGuard;
// self
use crate::_prelude::*;

/// Session state: the immutable refresh-token life and the last forced renewal instant.
///
/// `last_refresh` can only be written through a [`SessionGuard`], so every mutation happens
/// inside the critical section. Reads take a short snapshot lock and never wait on a refresh
/// that is in flight.
#[derive(Debug)]
pub(crate) struct ClientSession {
	refresh_token_life: Duration,
	last_refresh: RwLock<OffsetDateTime>,
	critical: AsyncMutex<()>,
}
impl ClientSession {
	pub(crate) fn new(refresh_token_life: Duration, created_at: OffsetDateTime) -> Self {
		Self {
			refresh_token_life,
			last_refresh: RwLock::new(created_at),
			critical: AsyncMutex::new(()),
		}
	}

	pub(crate) fn refresh_token_life(&self) -> Duration {
		self.refresh_token_life
	}

	pub(crate) fn last_refresh(&self) -> OffsetDateTime {
		*self.last_refresh.read()
	}

	/// Waits for exclusive access to the decide-and-act sequence.
	pub(crate) async fn lock(&self) -> SessionGuard<'_> {
		let critical = self.critical.lock().await;

		SessionGuard { session: self, _critical: critical }
	}
}

/// Exclusive handle over the critical section of a [`ClientSession`].
pub(crate) struct SessionGuard<'a> {
	session: &'a ClientSession,
	_critical: AsyncMutexGuard<'a, ()>,
}
impl SessionGuard<'_> {
	/// Returns `true` once `now` is strictly past `last_refresh + refresh_token_life`.
	pub(crate) fn renewal_due(&self, now: OffsetDateTime) -> bool {
		// An unrepresentable deadline lies beyond any clock reading.
		self.session
			.last_refresh()
			.checked_add(self.session.refresh_token_life)
			.is_some_and(|deadline| now > deadline)
	}

	/// Records a forced renewal at `now` and returns the previous instant.
	///
	/// The timestamp never moves backwards, even if the clock does.
	pub(crate) fn mark_renewed(&self, now: OffsetDateTime) -> OffsetDateTime {
		let mut last_refresh = self.session.last_refresh.write();
		let previous = *last_refresh;

		if now > previous {
			*last_refresh = now;
		}

		previous
	}
}
