mod common;

// std
use std::{sync::Arc, time::Duration};
// crates.io
use tokio::time::{self, Instant};
// self
use common::{ScriptedConfigurationApi, Step};
use lms_auth_coordinator::{
	auth::ConfigId,
	error::{ConfigError, Error},
	flows::{AuthorizationCoordinator, AuthorizationOutcome, SessionState},
	http::ConfigurationApi,
};

const INTERVAL: Duration = Duration::from_secs(1);
const TIMEOUT: Duration = Duration::from_secs(5);

fn secs(values: &[u64]) -> Vec<Duration> {
	values.iter().copied().map(Duration::from_secs).collect()
}

fn coordinator(api: &Arc<ScriptedConfigurationApi>) -> AuthorizationCoordinator {
	let api: Arc<dyn ConfigurationApi> = api.clone();

	AuthorizationCoordinator::new(api)
}

#[tokio::test(start_paused = true)]
async fn never_authorized_times_out_after_four_checks() {
	let api = ScriptedConfigurationApi::new([]);
	let coordinator = coordinator(&api);
	let start = Instant::now();

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.state(), SessionState::Polling);
	assert_eq!(coordinator.wait_for_terminal().await, SessionState::TimedOut);
	assert_eq!(start.elapsed(), TIMEOUT);
	assert_eq!(api.fetch_offsets(start), secs(&[1, 2, 3, 4]));

	let session = coordinator.session();

	assert!(session.timed_out && !session.authorized);
	assert!(!session.polling_active && !session.timeout_active);
	assert!(matches!(
		coordinator.outcome_error(),
		Some(Error::TimeoutExceeded { timeout }) if timeout == TIMEOUT
	));

	time::sleep(Duration::from_secs(10)).await;

	assert_eq!(api.fetch_count(), 4);
}

#[tokio::test(start_paused = true)]
async fn credential_on_third_check_stops_everything() {
	let api = ScriptedConfigurationApi::new([Step::pending(), Step::pending(), Step::authorized()]);
	let coordinator = coordinator(&api);
	let start = Instant::now();

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.wait_for_terminal().await, SessionState::Authorized);
	assert_eq!(start.elapsed(), Duration::from_secs(3));

	time::sleep(Duration::from_secs(10)).await;

	assert_eq!(api.fetch_offsets(start), secs(&[1, 2, 3]));
	assert_eq!(coordinator.state(), SessionState::Authorized);
	assert!(!coordinator.session().timed_out);
	assert!(coordinator.outcome_error().is_none());
}

#[tokio::test(start_paused = true)]
async fn failed_check_is_recorded_and_polling_continues() {
	let api = ScriptedConfigurationApi::new([Step::failure(503), Step::authorized()]);
	let coordinator = coordinator(&api);
	let mut states = coordinator.subscribe();
	let start = Instant::now();

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");
	time::sleep(Duration::from_millis(1_500)).await;

	let session = coordinator.session();

	assert_eq!(session.state(), SessionState::Polling);
	assert_eq!(session.last_error.as_ref().and_then(|e| e.status), Some(503));
	assert_eq!(*states.borrow_and_update(), SessionState::Polling);
	assert_eq!(coordinator.wait_for_terminal().await, SessionState::Authorized);
	assert_eq!(start.elapsed(), Duration::from_secs(2));
	assert_eq!(api.fetch_count(), 2);
	assert_eq!(*states.borrow_and_update(), SessionState::Authorized);
}

#[tokio::test(start_paused = true)]
async fn cancel_returns_to_idle_and_stops_checks() {
	let api = ScriptedConfigurationApi::new([]);
	let coordinator = coordinator(&api);
	let token = coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	time::sleep(Duration::from_millis(2_500)).await;
	coordinator.cancel();

	assert_eq!(coordinator.state(), SessionState::Idle);
	assert!(coordinator.session().config_id.is_none());
	assert_eq!(coordinator.wait_for_terminal().await, SessionState::Idle);

	time::sleep(Duration::from_secs(10)).await;

	assert_eq!(api.fetch_count(), 2);
	assert_eq!(coordinator.on_poll_tick(token).await, None);
	assert_eq!(coordinator.on_timeout_tick(token), None);
	assert_eq!(coordinator.state(), SessionState::Idle);

	// Cancelling an idle coordinator is a no-op.
	coordinator.cancel();

	assert_eq!(coordinator.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn second_begin_supersedes_the_first_session() {
	let api = ScriptedConfigurationApi::new([]);
	let coordinator = coordinator(&api);
	let start = Instant::now();
	let first = coordinator
		.begin_authorization(ConfigId(1), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	time::sleep(Duration::from_millis(1_500)).await;

	let second = coordinator
		.begin_authorization(ConfigId(2), INTERVAL, TIMEOUT)
		.expect("Re-arming should succeed.");

	assert_ne!(first, second);
	assert_eq!(coordinator.on_timeout_tick(first), None);
	assert_eq!(coordinator.on_poll_tick(first).await, None);
	assert_eq!(coordinator.state(), SessionState::Polling);
	assert_eq!(coordinator.wait_for_terminal().await, SessionState::TimedOut);
	assert_eq!(start.elapsed(), Duration::from_millis(6_500));

	let fetches = api.fetches();
	let first_checks = fetches.iter().filter(|fetch| fetch.config_id == ConfigId(1)).count();
	let second_checks = fetches.iter().filter(|fetch| fetch.config_id == ConfigId(2)).count();

	assert_eq!(first_checks, 1);
	assert_eq!(second_checks, 4);
	assert_eq!(coordinator.session().config_id, Some(ConfigId(2)));
}

#[tokio::test(start_paused = true)]
async fn slow_check_that_finds_a_credential_beats_the_deadline() {
	let api = ScriptedConfigurationApi::new([
		Step::pending(),
		Step::pending(),
		Step::pending(),
		Step::authorized().after(Duration::from_secs(2)),
	]);
	let coordinator = coordinator(&api);
	let start = Instant::now();

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");
	time::sleep(Duration::from_millis(5_500)).await;

	assert!(coordinator.session().timed_out);

	time::sleep(Duration::from_secs(5)).await;

	let session = coordinator.session();

	assert_eq!(session.state(), SessionState::Authorized);
	assert!(session.authorized && !session.timed_out);
	assert!(!session.polling_active && !session.timeout_active);
	assert_eq!(api.fetch_offsets(start), secs(&[1, 2, 3, 4]));
}

#[tokio::test(start_paused = true)]
async fn hung_check_does_not_delay_the_deadline() {
	let api = ScriptedConfigurationApi::new([Step::pending().after(Duration::from_secs(30))]);
	let coordinator = coordinator(&api);
	let start = Instant::now();

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.wait_for_terminal().await, SessionState::TimedOut);
	assert_eq!(start.elapsed(), TIMEOUT);

	time::sleep(Duration::from_secs(60)).await;

	assert_eq!(api.fetch_count(), 1);
	assert_eq!(coordinator.state(), SessionState::TimedOut);
}

#[tokio::test(start_paused = true)]
async fn manual_ticks_follow_the_same_rules() {
	let api = ScriptedConfigurationApi::new([Step::pending(), Step::authorized()]);
	let coordinator = coordinator(&api);
	let token = coordinator
		.begin_authorization(ConfigId(7), Duration::from_secs(60), Duration::from_secs(600))
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.on_poll_tick(token).await, Some(AuthorizationOutcome::StillPending));
	assert_eq!(coordinator.on_poll_tick(token).await, Some(AuthorizationOutcome::Authorized));
	assert_eq!(coordinator.on_poll_tick(token).await, None);
	assert_eq!(coordinator.on_timeout_tick(token), None);
	assert_eq!(coordinator.session().poll_count, 2);
	assert_eq!(api.fetch_count(), 2);
}

#[tokio::test(start_paused = true)]
async fn zero_durations_are_rejected_without_arming() {
	let api = ScriptedConfigurationApi::new([]);
	let coordinator = coordinator(&api);
	let err = coordinator
		.begin_authorization(ConfigId(7), Duration::ZERO, TIMEOUT)
		.expect_err("A zero interval should be rejected.");

	assert!(matches!(
		err,
		Error::Config(ConfigError::NonPositiveDuration { field: "poll_interval" })
	));
	assert!(coordinator.begin_authorization(ConfigId(7), INTERVAL, Duration::ZERO).is_err());
	assert_eq!(coordinator.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn unschedulable_durations_are_rejected_before_touching_the_live_session() {
	let api = ScriptedConfigurationApi::new([]);
	let coordinator = coordinator(&api);
	let start = Instant::now();
	let live = coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");
	let err = coordinator
		.begin_authorization(ConfigId(8), INTERVAL, Duration::MAX)
		.expect_err("A deadline past the clock's range should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::DurationOverflow { field: "timeout" })));

	let err = coordinator
		.begin_authorization(ConfigId(8), Duration::MAX, TIMEOUT)
		.expect_err("A first poll past the clock's range should be rejected.");

	assert!(matches!(err, Error::Config(ConfigError::DurationOverflow { field: "poll_interval" })));

	let session = coordinator.session();

	assert_eq!(session.generation, live.generation());
	assert_eq!(session.config_id, Some(ConfigId(7)));
	assert_eq!(coordinator.wait_for_terminal().await, SessionState::TimedOut);
	assert_eq!(start.elapsed(), TIMEOUT);
	assert_eq!(api.fetch_offsets(start), secs(&[1, 2, 3, 4]));
}

#[tokio::test(start_paused = true)]
async fn cancel_from_a_terminal_state_returns_to_idle() {
	let api = ScriptedConfigurationApi::new([Step::authorized()]);
	let coordinator = coordinator(&api);

	coordinator
		.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.wait_for_terminal().await, SessionState::Authorized);

	coordinator.cancel();

	let session = coordinator.session();

	assert_eq!(coordinator.state(), SessionState::Idle);
	assert_eq!(*coordinator.subscribe().borrow(), SessionState::Idle);
	assert!(session.config_id.is_none());
	assert!(!session.authorized && !session.timed_out);

	// Nothing scripted remains, so a fresh session can only end by timing out.
	coordinator
		.begin_authorization(ConfigId(9), INTERVAL, TIMEOUT)
		.expect("Positive durations should arm the session.");

	assert_eq!(coordinator.wait_for_terminal().await, SessionState::TimedOut);

	let fetches = api.fetch_count();

	coordinator.cancel();

	let session = coordinator.session();

	assert_eq!(coordinator.state(), SessionState::Idle);
	assert!(session.config_id.is_none());
	assert!(!session.authorized && !session.timed_out);
	assert!(coordinator.outcome_error().is_none());

	time::sleep(Duration::from_secs(10)).await;

	assert_eq!(api.fetch_count(), fetches);
	assert_eq!(coordinator.state(), SessionState::Idle);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_coordinator_stops_scheduled_checks() {
	let api = ScriptedConfigurationApi::new([]);

	{
		let coordinator = coordinator(&api);

		coordinator
			.begin_authorization(ConfigId(7), INTERVAL, TIMEOUT)
			.expect("Positive durations should arm the session.");
		time::sleep(Duration::from_millis(1_500)).await;
	}

	time::sleep(Duration::from_secs(10)).await;

	assert_eq!(api.fetch_count(), 1);
}
