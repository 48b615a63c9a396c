// self
use crate::{_prelude::*, obs::FlowKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by lifecycle flows.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("oauth2_autorefresh.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

pub(crate) fn client_created(refresh_token_life: Duration) {
	#[cfg(feature = "tracing")]
	tracing::info!(%refresh_token_life, "Client with refresh-token auto renewal created.");
	#[cfg(not(feature = "tracing"))]
	let _ = refresh_token_life;
}

pub(crate) fn forced_renewal_due(last_refresh: OffsetDateTime, refresh_token_life: Duration) {
	#[cfg(feature = "tracing")]
	tracing::info!(
		%last_refresh,
		%refresh_token_life,
		"Refresh token outlived its configured life; forcing a full renewal.",
	);
	#[cfg(not(feature = "tracing"))]
	let _ = (last_refresh, refresh_token_life);
}

pub(crate) fn lookup_issued(filter: &dyn Display) {
	#[cfg(feature = "tracing")]
	tracing::debug!(%filter, "Retrieving named resource.");
	#[cfg(not(feature = "tracing"))]
	let _ = filter;
}
