//! Deadline-bounded polling of a remote configuration record's authorization status.
//!
//! [`AuthorizationCoordinator::begin_authorization`] arms two tokio tasks per session: a
//! periodic poll (first tick one interval after arming) and a one-shot deadline. Both carry the
//! session's [`SessionToken`], and every state change goes through [`AuthorizationSession`],
//! which ignores callbacks from superseded generations. Poll ticks are serialized by an async
//! tick guard so a tick's remote call finishes before the next tick's body runs. The deadline
//! never waits on that guard, so a hung status check cannot postpone the timeout.

mod session;

pub use session::*;

// crates.io
use tokio::{
	sync::watch,
	task::JoinHandle,
	time::{self, Instant, MissedTickBehavior},
};
// self
use crate::{
	_prelude::*,
	auth::ConfigId,
	error::ConfigError,
	http::ConfigurationApi,
	obs::{self, FlowSpan, obs_event},
};

/// Drives one authorization session at a time for a single form instance.
///
/// Dropping the coordinator cancels any scheduled work.
pub struct AuthorizationCoordinator {
	shared: Arc<Shared>,
}
impl AuthorizationCoordinator {
	/// Creates an idle coordinator that polls through `api`.
	pub fn new(api: Arc<dyn ConfigurationApi>) -> Self {
		let (state_tx, _) = watch::channel(SessionState::Idle);

		Self {
			shared: Arc::new(Shared {
				api,
				session: Mutex::new(AuthorizationSession::default()),
				timers: Mutex::new(None),
				tick_guard: AsyncMutex::new(()),
				state_tx,
			}),
		}
	}

	/// Arms polling and the deadline for `config_id`, cancelling any prior session first.
	///
	/// Must be called from within a tokio runtime.
	pub fn begin_authorization(
		&self,
		config_id: ConfigId,
		poll_interval: Duration,
		timeout: Duration,
	) -> Result<SessionToken> {
		if poll_interval.is_zero() {
			return Err(ConfigError::NonPositiveDuration { field: "poll_interval" }.into());
		}
		if timeout.is_zero() {
			return Err(ConfigError::NonPositiveDuration { field: "timeout" }.into());
		}

		let now = Instant::now();
		let first_poll = now
			.checked_add(poll_interval)
			.ok_or(ConfigError::DurationOverflow { field: "poll_interval" })?;
		let deadline = now
			.checked_add(timeout)
			.ok_or(ConfigError::DurationOverflow { field: "timeout" })?;

		self.shared.abort_all_timers();

		let token = self.shared.session.lock().arm(config_id, timeout, deadline);
		let poll =
			tokio::spawn(poll_loop(Arc::clone(&self.shared), token, first_poll, poll_interval));
		let deadline = tokio::spawn(deadline_timer(Arc::clone(&self.shared), token, deadline));

		*self.shared.timers.lock() = Some(Timers { token, poll, deadline });

		self.shared.publish();

		FlowSpan::for_session("begin_authorization", config_id, token).in_scope(|| {
			obs_event!(
				info,
				poll_interval_ms = millis(poll_interval),
				timeout_ms = millis(timeout),
				"Authorization session armed."
			);
		});

		Ok(token)
	}

	/// Runs one poll tick for `token`; `None` when the tick no longer applies.
	pub async fn on_poll_tick(&self, token: SessionToken) -> Option<AuthorizationOutcome> {
		self.shared.poll_tick(token).await
	}

	/// Runs the deadline tick for `token`; `None` when the deadline no longer applies.
	pub fn on_timeout_tick(&self, token: SessionToken) -> Option<AuthorizationOutcome> {
		self.shared.timeout_tick(token)
	}

	/// Stops all scheduled work and returns to idle. Safe to call at any time.
	pub fn cancel(&self) {
		self.shared.abort_all_timers();

		let generation = {
			let mut session = self.shared.session.lock();

			session.disarm();

			session.generation
		};

		self.shared.publish();

		obs_event!(debug, generation, "Authorization session cancelled.");
	}

	/// Snapshot of the current session.
	pub fn session(&self) -> AuthorizationSession {
		self.shared.session.lock().clone()
	}

	/// Current lifecycle state.
	pub fn state(&self) -> SessionState {
		self.shared.session.lock().state()
	}

	/// Subscribes to lifecycle state changes.
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.shared.state_tx.subscribe()
	}

	/// Waits until the session leaves [`SessionState::Polling`].
	pub async fn wait_for_terminal(&self) -> SessionState {
		let mut rx = self.subscribe();

		match rx.wait_for(|state| *state != SessionState::Polling).await {
			Ok(state) => *state,
			Err(_) => self.state(),
		}
	}

	/// User-facing error for a session that ended without authorization.
	pub fn outcome_error(&self) -> Option<Error> {
		let session = self.shared.session.lock();

		match (session.state(), session.timeout) {
			(SessionState::TimedOut, Some(timeout)) => Some(Error::TimeoutExceeded { timeout }),
			_ => None,
		}
	}
}
impl Drop for AuthorizationCoordinator {
	fn drop(&mut self) {
		self.shared.abort_all_timers();
	}
}
impl Debug for AuthorizationCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCoordinator").field("session", &self.session()).finish()
	}
}

struct Shared {
	api: Arc<dyn ConfigurationApi>,
	session: Mutex<AuthorizationSession>,
	timers: Mutex<Option<Timers>>,
	tick_guard: AsyncMutex<()>,
	state_tx: watch::Sender<SessionState>,
}
impl Shared {
	async fn poll_tick(&self, token: SessionToken) -> Option<AuthorizationOutcome> {
		let _serial = self.tick_guard.lock().await;
		let ticket = self.session.lock().begin_poll(token, Instant::now())?;
		let span = FlowSpan::for_session("poll_tick", ticket.config_id, token);
		let result = span.instrument(self.api.fetch_configuration_status(ticket.config_id)).await;
		let outcome = self.session.lock().apply_poll(&ticket, result.as_ref());

		span.in_scope(|| match (&outcome, &result) {
			(Some(AuthorizationOutcome::Authorized), _) => {
				self.abort_timers(token);

				obs_event!(info, "Provider confirmed the authorization.");
			},
			(Some(AuthorizationOutcome::Errored), Err(err)) => {
				obs_event!(
					warn,
					error = %err,
					"Authorization status check failed; polling continues."
				);
			},
			_ => {},
		});

		self.finish_tick(outcome)
	}

	fn timeout_tick(&self, token: SessionToken) -> Option<AuthorizationOutcome> {
		let (config_id, outcome) = {
			let mut session = self.session.lock();
			let config_id = session.config_id;

			(config_id, session.apply_timeout(token))
		};

		if let (Some(_), Some(config_id)) = (outcome, config_id) {
			// An in-flight check may still authorize; only stop the poll task when idle.
			if self.tick_guard.try_lock().is_some() {
				self.abort_timers(token);
			}

			FlowSpan::for_session("timeout_tick", config_id, token).in_scope(|| {
				obs_event!(warn, "Authorization deadline elapsed before the provider confirmed.");
			});
		}

		self.finish_tick(outcome)
	}

	fn finish_tick(&self, outcome: Option<AuthorizationOutcome>) -> Option<AuthorizationOutcome> {
		if let Some(outcome) = outcome {
			obs::record_poll_outcome(outcome);
			self.publish();
		}

		outcome
	}

	fn publish(&self) {
		let state = self.session.lock().state();

		self.state_tx.send_replace(state);
	}

	fn abort_timers(&self, token: SessionToken) {
		let current = self.timers.lock().take_if(|timers| timers.token == token);

		if let Some(timers) = current {
			timers.abort();
		}
	}

	fn abort_all_timers(&self) {
		if let Some(timers) = self.timers.lock().take() {
			timers.abort();
		}
	}
}

struct Timers {
	token: SessionToken,
	poll: JoinHandle<()>,
	deadline: JoinHandle<()>,
}
impl Timers {
	fn abort(self) {
		self.poll.abort();
		self.deadline.abort();
	}
}

async fn poll_loop(shared: Arc<Shared>, token: SessionToken, first: Instant, period: Duration) {
	let mut ticker = time::interval_at(first, period);

	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

	loop {
		ticker.tick().await;

		match shared.poll_tick(token).await {
			Some(AuthorizationOutcome::StillPending | AuthorizationOutcome::Errored) => continue,
			_ => break,
		}
	}
}

fn millis(duration: Duration) -> u64 {
	u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

async fn deadline_timer(shared: Arc<Shared>, token: SessionToken, deadline: Instant) {
	time::sleep_until(deadline).await;
	shared.timeout_tick(token);
}
