// crates.io
use tokio::time::Instant;
// self
use crate::{_prelude::*, auth::ConfigId, error::ErrorDescriptor, lms::ConfigurationStatus};

/// Coarse lifecycle state derived from an [`AuthorizationSession`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
	/// Nothing armed.
	#[default]
	Idle,
	/// Poll and deadline timers are running.
	Polling,
	/// The provider issued a credential.
	Authorized,
	/// The deadline elapsed first.
	TimedOut,
}
impl SessionState {
	/// Whether the state ends the attempt.
	pub const fn is_terminal(self) -> bool {
		matches!(self, SessionState::Authorized | SessionState::TimedOut)
	}
}

/// Result of one applied poll or timeout tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthorizationOutcome {
	/// The remote record now carries a credential.
	Authorized,
	/// The remote record has no credential yet.
	StillPending,
	/// The status check failed; the session keeps polling.
	Errored,
	/// The deadline elapsed before a credential appeared.
	TimedOut,
}
impl AuthorizationOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthorizationOutcome::Authorized => "authorized",
			AuthorizationOutcome::StillPending => "still_pending",
			AuthorizationOutcome::Errored => "errored",
			AuthorizationOutcome::TimedOut => "timed_out",
		}
	}
}
impl Display for AuthorizationOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Generation token carried by every scheduled callback of one session.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SessionToken(u64);
impl SessionToken {
	/// Monotonic generation number.
	pub fn generation(self) -> u64 {
		self.0
	}
}

/// Status check dispatched by a poll tick; resolves against the session it was issued for.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PollTicket {
	pub(crate) token: SessionToken,
	pub(crate) config_id: ConfigId,
}

/// State of one attempt to link a configuration record to the provider.
#[derive(Clone, Debug, Default)]
pub struct AuthorizationSession {
	/// Record being authorized; absent while idle.
	pub config_id: Option<ConfigId>,
	/// Poll timer is scheduled.
	pub polling_active: bool,
	/// Deadline timer is scheduled.
	pub timeout_active: bool,
	/// The provider issued a credential.
	pub authorized: bool,
	/// The deadline elapsed first.
	pub timed_out: bool,
	/// Most recent failed status check.
	pub last_error: Option<ErrorDescriptor>,
	/// Generation of the current (or last) session.
	pub generation: u64,
	/// Wall-clock instant the session was armed.
	pub started_at: Option<OffsetDateTime>,
	/// Status checks dispatched in this session.
	pub poll_count: u32,
	/// Deadline duration the session was armed with.
	pub timeout: Option<Duration>,
	deadline: Option<Instant>,
}
impl AuthorizationSession {
	/// Lifecycle state derived from the flags.
	pub fn state(&self) -> SessionState {
		if self.authorized {
			SessionState::Authorized
		} else if self.timed_out {
			SessionState::TimedOut
		} else if self.polling_active || self.timeout_active {
			SessionState::Polling
		} else {
			SessionState::Idle
		}
	}

	/// Whether `token` belongs to the live generation.
	pub fn is_current(&self, token: SessionToken) -> bool {
		token.0 == self.generation
	}

	/// Discards prior state and arms a new generation that expires at `deadline`.
	pub(crate) fn arm(
		&mut self,
		config_id: ConfigId,
		timeout: Duration,
		deadline: Instant,
	) -> SessionToken {
		let generation = self.generation.wrapping_add(1);

		*self = Self {
			config_id: Some(config_id),
			polling_active: true,
			timeout_active: true,
			generation,
			started_at: Some(OffsetDateTime::now_utc()),
			timeout: Some(timeout),
			deadline: Some(deadline),
			..Self::default()
		};

		SessionToken(generation)
	}

	/// Returns to idle; every outstanding token becomes stale.
	pub(crate) fn disarm(&mut self) {
		let generation = self.generation.wrapping_add(1);

		*self = Self { generation, ..Self::default() };
	}

	/// Starts a status check unless the tick is stale, polling stopped, or the deadline passed.
	pub(crate) fn begin_poll(&mut self, token: SessionToken, now: Instant) -> Option<PollTicket> {
		if !self.is_current(token) || !self.polling_active {
			return None;
		}
		if self.deadline.is_some_and(|deadline| now >= deadline) {
			return None;
		}

		let config_id = self.config_id?;

		self.poll_count = self.poll_count.saturating_add(1);

		Some(PollTicket { token, config_id })
	}

	/// Applies a resolved status check.
	///
	/// A credential observed by a check dispatched before the deadline wins over a deadline
	/// that fired while the check was in flight.
	pub(crate) fn apply_poll(
		&mut self,
		ticket: &PollTicket,
		result: Result<&ConfigurationStatus, &ApiError>,
	) -> Option<AuthorizationOutcome> {
		if !self.is_current(ticket.token) || self.authorized {
			return None;
		}

		match result {
			Ok(status) if status.credential_present => {
				self.authorized = true;
				self.timed_out = false;
				self.polling_active = false;
				self.timeout_active = false;

				Some(AuthorizationOutcome::Authorized)
			},
			_ if !self.polling_active => None,
			Ok(_) => Some(AuthorizationOutcome::StillPending),
			Err(err) => {
				self.last_error = Some(ErrorDescriptor::capture(err));

				Some(AuthorizationOutcome::Errored)
			},
		}
	}

	/// Applies the deadline unless it is stale, already disarmed, or authorization won.
	pub(crate) fn apply_timeout(&mut self, token: SessionToken) -> Option<AuthorizationOutcome> {
		if !self.is_current(token) || !self.timeout_active || self.authorized {
			return None;
		}

		self.timed_out = true;
		self.timeout_active = false;
		self.polling_active = false;

		Some(AuthorizationOutcome::TimedOut)
	}
}
