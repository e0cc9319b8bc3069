//! Async driver for the idle session machine.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use docguard_core::{IdleSession, SessionState, Transition};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::activity::ActivitySender;
use crate::config::SessionConfig;
use crate::error::Result;
use crate::ports::{Navigator, SessionUi};
use crate::termination::{Termination, TerminationReason};

/// Builds and spawns a session.
pub struct SessionRunner {
    config: SessionConfig,
    ui: Arc<dyn SessionUi>,
    navigator: Arc<dyn Navigator>,
}

impl SessionRunner {
    pub fn new(config: SessionConfig, ui: Arc<dyn SessionUi>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            config,
            ui,
            navigator,
        }
    }

    /// Start the session in `Active` with the given idle timeout.
    pub fn spawn(self, timeout: Duration) -> Result<SessionHandle> {
        self.config.validate()?;
        let machine = IdleSession::new(timeout, self.config.warning_window, Instant::now())?;

        let (activity_tx, activity_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(SessionState::Active);
        let (deadline_tx, deadline_rx) = watch::channel(machine.deadline());
        let termination = Termination::new(self.navigator, self.config.logout_path.as_str());

        info!(
            timeout_secs = timeout.as_secs(),
            warning_secs = self.config.warning_window.as_secs(),
            "idle session started"
        );

        let status = tokio::spawn(status_display(
            self.config.tick,
            deadline_rx,
            Arc::clone(&self.ui),
        ));

        let driver = Driver {
            machine,
            tick: self.config.tick,
            ui: self.ui,
            termination: termination.clone(),
            state: state_tx,
            deadline: deadline_tx,
            generation: Arc::new(AtomicU64::new(0)),
            countdown: None,
        };
        let main = tokio::spawn(driver.run(activity_rx));

        Ok(SessionHandle {
            state: state_rx,
            activity: ActivitySender::new(activity_tx),
            termination,
            main,
            status,
        })
    }
}

/// Handle to a running session.
#[derive(Debug)]
pub struct SessionHandle {
    state: watch::Receiver<SessionState>,
    activity: ActivitySender,
    termination: Termination,
    main: JoinHandle<()>,
    status: JoinHandle<()>,
}

impl SessionHandle {
    /// Latest published state.
    pub fn state(&self) -> SessionState {
        *self.state.borrow()
    }

    /// Watch state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state.clone()
    }

    /// Sender for the host's input listeners.
    pub fn activity(&self) -> ActivitySender {
        self.activity.clone()
    }

    pub fn is_terminated(&self) -> bool {
        self.termination.is_terminated()
    }

    /// Wait until the session publishes `Expired`.
    pub async fn expired(&self) {
        let mut rx = self.state.clone();
        // An error means the driver is gone, which only happens after expiry or stop.
        let _ = rx.wait_for(SessionState::is_expired).await;
    }

    /// Stop both timers without terminating.
    pub fn stop(&self) {
        self.main.abort();
        self.status.abort();
    }
}

struct Driver {
    machine: IdleSession<Instant>,
    tick: Duration,
    ui: Arc<dyn SessionUi>,
    termination: Termination,
    state: watch::Sender<SessionState>,
    deadline: watch::Sender<Instant>,
    /// Bumped on every cancellation; a countdown only fires for its own generation.
    generation: Arc<AtomicU64>,
    countdown: Option<JoinHandle<()>>,
}

impl Driver {
    async fn run(mut self, mut activity: mpsc::UnboundedReceiver<Instant>) {
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let transition = tokio::select! {
                Some(at) = activity.recv() => {
                    let t = self.machine.record_activity(at);
                    let _ = self.deadline.send(self.machine.deadline());
                    t
                }
                _ = ticker.tick() => self.machine.poll(Instant::now()),
            };

            self.apply(transition);
            let now_state = self.machine.state(Instant::now());
            self.state.send_if_modified(|s| {
                let changed = *s != now_state;
                *s = now_state;
                changed
            });

            if now_state.is_expired() {
                break;
            }
        }
        debug!("idle session driver stopped");
    }

    fn apply(&mut self, transition: Transition) {
        match transition {
            Transition::Unchanged => {}
            Transition::EnteredWarning => {
                let remaining = self.machine.remaining(Instant::now());
                info!(remaining_secs = remaining.as_secs(), "idle warning shown");
                self.start_countdown();
            }
            Transition::ReturnedToActive => {
                info!("activity during warning, session resumed");
                self.cancel_countdown();
                self.ui.hide_countdown();
            }
            Transition::Expired => {
                self.cancel_countdown();
                self.termination.terminate(TerminationReason::IdleTimeout);
            }
        }
    }

    fn start_countdown(&mut self) {
        self.cancel_countdown();
        let generation = self.generation.load(Ordering::SeqCst);
        self.countdown = Some(tokio::spawn(countdown(
            self.machine.deadline(),
            self.tick,
            generation,
            Arc::clone(&self.generation),
            Arc::clone(&self.ui),
            self.termination.clone(),
        )));
    }

    fn cancel_countdown(&mut self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
    }
}

impl Drop for Driver {
    fn drop(&mut self) {
        if let Some(task) = self.countdown.take() {
            task.abort();
        }
    }
}

/// Overlay countdown. Fires termination at zero unless superseded.
async fn countdown(
    deadline: Instant,
    step: Duration,
    generation: u64,
    current: Arc<AtomicU64>,
    ui: Arc<dyn SessionUi>,
    termination: Termination,
) {
    loop {
        if current.load(Ordering::SeqCst) != generation {
            return;
        }
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            termination.terminate(TerminationReason::CountdownElapsed);
            return;
        }
        ui.show_countdown(remaining);
        time::sleep(remaining.min(step)).await;
    }
}

/// Diagnostic display. Reads the deadline and never changes state.
async fn status_display(step: Duration, deadline: watch::Receiver<Instant>, ui: Arc<dyn SessionUi>) {
    let mut ticker = time::interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        ticker.tick().await;
        if deadline.has_changed().is_err() {
            break;
        }
        let at = *deadline.borrow();
        ui.render_status(at.saturating_duration_since(Instant::now()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SessionError;
    use crate::ports::memory::{RecordingNavigator, RecordingUi};

    const MIN: Duration = Duration::from_secs(60);

    fn spawn(minutes: u32) -> (SessionHandle, Arc<RecordingUi>, Arc<RecordingNavigator>) {
        let ui = Arc::new(RecordingUi::new());
        let nav = Arc::new(RecordingNavigator::new());
        let handle = SessionRunner::new(SessionConfig::default(), ui.clone(), nav.clone())
            .spawn(MIN * minutes)
            .unwrap();
        (handle, ui, nav)
    }

    async fn advance_to(start: Instant, at: Duration) {
        time::sleep_until(start + at).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_five_minute_scenario() {
        let start = Instant::now();
        let (handle, ui, nav) = spawn(5);

        advance_to(start, Duration::from_millis(179_500)).await;
        assert_eq!(handle.state(), SessionState::Active);
        assert!(!ui.overlay_visible());

        advance_to(start, Duration::from_millis(180_500)).await;
        assert!(handle.state().is_warning());
        assert!(ui.overlay_visible());

        advance_to(start, Duration::from_secs(210)).await;
        assert!(handle.activity().notify("keydown"));
        advance_to(start, Duration::from_millis(210_100)).await;
        assert_eq!(handle.state(), SessionState::Active);
        assert!(!ui.overlay_visible());

        // The deadline moved to 3:30 + 5:00 = 8:30.
        advance_to(start, Duration::from_millis(389_500)).await;
        assert_eq!(handle.state(), SessionState::Active);
        advance_to(start, Duration::from_millis(390_500)).await;
        assert!(handle.state().is_warning());

        advance_to(start, Duration::from_millis(509_500)).await;
        assert!(nav.visits().is_empty());
        assert!(!handle.is_terminated());

        advance_to(start, Duration::from_millis(510_500)).await;
        assert_eq!(handle.state(), SessionState::Expired);
        assert_eq!(nav.visits(), vec!["/logout".to_string()]);

        advance_to(start, Duration::from_secs(900)).await;
        assert_eq!(nav.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_three_minute_timeout_warns_after_one_minute() {
        let start = Instant::now();
        let (handle, _ui, nav) = spawn(3);

        advance_to(start, Duration::from_millis(59_500)).await;
        assert_eq!(handle.state(), SessionState::Active);
        advance_to(start, Duration::from_millis(60_500)).await;
        assert_eq!(
            handle.state(),
            SessionState::Warning {
                seconds_remaining: 120
            }
        );

        handle.expired().await;
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(180));
        assert_eq!(nav.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_countdown_never_fires() {
        let start = Instant::now();
        let (handle, ui, nav) = spawn(3);

        advance_to(start, Duration::from_secs(90)).await;
        assert!(handle.state().is_warning());
        assert!(handle.activity().notify("mousedown"));

        // The first countdown targeted 3:00; the new deadline is 4:30.
        advance_to(start, Duration::from_secs(200)).await;
        assert!(nav.visits().is_empty());
        assert!(handle.state().is_warning());
        assert!(ui.overlay_visible());

        advance_to(start, Duration::from_millis(270_500)).await;
        assert_eq!(nav.visits().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_passive_events_do_not_extend_session() {
        let start = Instant::now();
        let (handle, _ui, nav) = spawn(3);
        let activity = handle.activity();

        for at in [10, 20, 50, 70, 120] {
            advance_to(start, Duration::from_secs(at)).await;
            assert!(!activity.notify("mousemove"));
            assert!(!activity.notify("scroll"));
            assert!(!activity.notify("wheel"));
        }

        handle.expired().await;
        assert_eq!(Instant::now().duration_since(start), Duration::from_secs(180));
        assert_eq!(nav.visits().len(), 1);
        assert!(!activity.notify("keydown"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_countdown_renders_each_second() {
        let start = Instant::now();
        let (_handle, ui, _nav) = spawn(3);

        advance_to(start, Duration::from_millis(63_500)).await;
        let shown = ui.countdown_values();
        assert_eq!(
            shown,
            vec![
                Duration::from_secs(120),
                Duration::from_secs(119),
                Duration::from_secs(118),
                Duration::from_secs(117),
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_display_is_observational() {
        let start = Instant::now();
        let (handle, ui, _nav) = spawn(3);

        advance_to(start, Duration::from_millis(10_500)).await;
        assert_eq!(ui.status_renders(), 11);
        assert_eq!(handle.state(), SessionState::Active);
        assert!(ui.countdown_values().is_empty());

        handle.stop();
        let renders = ui.status_renders();
        advance_to(start, Duration::from_secs(400)).await;
        assert_eq!(ui.status_renders(), renders);
        assert!(!handle.is_terminated());
    }

    #[tokio::test]
    async fn test_zero_tick_rejected() {
        let config = SessionConfig {
            tick: Duration::ZERO,
            ..SessionConfig::default()
        };
        let err = SessionRunner::new(
            config,
            Arc::new(RecordingUi::new()),
            Arc::new(RecordingNavigator::new()),
        )
        .spawn(MIN * 5)
        .unwrap_err();
        assert_eq!(err, SessionError::InvalidTick(Duration::ZERO));
    }

    #[tokio::test]
    async fn test_timeout_inside_window_rejected() {
        let result = SessionRunner::new(
            SessionConfig::default(),
            Arc::new(RecordingUi::new()),
            Arc::new(RecordingNavigator::new()),
        )
        .spawn(MIN * 2);
        assert!(matches!(result, Err(SessionError::Core(_))));
    }
}
