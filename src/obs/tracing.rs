// self
use crate::{_prelude::*, auth::ConfigId, flows::SessionToken, obs::FlowKind};

/// Future returned by [`FlowSpan::instrument`]; the bare future when tracing is disabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Future returned by [`FlowSpan::instrument`]; the bare future when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// `lms_auth.flow` span carrying the flow kind and stage.
///
/// Authorization work additionally records the `config_id` being polled and the session
/// `generation`, so poll and deadline events nested under it need not repeat them.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a span for `stage` of `kind` with the session fields left unset.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			Self {
				span: tracing::info_span!(
					"lms_auth.flow",
					flow = kind.as_str(),
					stage,
					config_id = tracing::field::Empty,
					generation = tracing::field::Empty,
				),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Opens an authorization span already tagged with the polled record and session.
	pub fn for_session(stage: &'static str, config_id: ConfigId, token: SessionToken) -> Self {
		let span = Self::new(FlowKind::Authorization, stage);

		span.record_config_id(config_id);
		span.record_generation(token);

		span
	}

	/// Tags the span with the configuration record it concerns.
	pub fn record_config_id(&self, config_id: ConfigId) {
		#[cfg(feature = "tracing")]
		self.span.record("config_id", config_id.0);
		#[cfg(not(feature = "tracing"))]
		let _ = config_id;
	}

	/// Tags the span with the session generation it concerns.
	pub fn record_generation(&self, token: SessionToken) {
		#[cfg(feature = "tracing")]
		self.span.record("generation", token.generation());
		#[cfg(not(feature = "tracing"))]
		let _ = token;
	}

	/// Runs `f` with the span entered.
	pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
		#[cfg(feature = "tracing")]
		{
			self.span.in_scope(f)
		}
		#[cfg(not(feature = "tracing"))]
		{
			f()
		}
	}

	/// Attaches the span to `fut` so it is entered on every poll, never across an `.await`.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			tracing::Instrument::instrument(fut, self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}
