//! Expiry scheduler thread and notification dispatch.
//!
//! # Responsibility
//! - Run one tick per `SchedulerConfig::tick`: prune due timers, then notify.
//! - Stop cooperatively via an atomic flag checked at the top of each tick.
//!
//! # Invariants
//! - Notification failures are logged and never abort the loop.
//! - Shutdown latency is bounded by one tick; sleeps are not interrupted.
//! - In queued mode the prune cadence never waits on a notification.

use crate::model::timer::Timer;
use crate::registry::timer_registry::TimerRegistry;
use crossbeam_channel::{unbounded, Sender};
use log::{debug, error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Default scheduler period; slightly above one second like a wall-clock poll.
pub const DEFAULT_TICK: Duration = Duration::from_millis(1_010);
/// Upper bound accepted for the scheduler period.
pub const MAX_TICK: Duration = Duration::from_millis(1_100);
/// Lower bound for the period of a user-facing process.
///
/// `SchedulerConfig::validate` allows shorter ticks so tests can run fast;
/// `AppConfig::validate` enforces this bound.
pub const MIN_PRODUCTION_TICK: Duration = Duration::from_millis(1_000);

const SCHEDULER_THREAD_NAME: &str = "lazytimer-scheduler";
const NOTIFIER_THREAD_NAME: &str = "lazytimer-notifier";

/// Backend that surfaces one expired timer to the user.
///
/// Implementations may block (e.g. a modal dialog) until dismissed.
pub trait Notifier: Send + Sync {
    fn notify(&self, timer: &Timer) -> Result<(), NotificationError>;
}

/// Failure to display an expiry notification.
#[derive(Debug)]
pub enum NotificationError {
    Backend(String),
    Io(std::io::Error),
}

impl Display for NotificationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Backend(message) => write!(f, "notification backend failed: {message}"),
            Self::Io(err) => write!(f, "notification write failed: {err}"),
        }
    }
}

impl Error for NotificationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Backend(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for NotificationError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Where notifications run relative to the prune loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NotificationMode {
    /// Notify sequentially on the scheduler thread; a blocking alert delays
    /// the next tick until dismissed.
    #[default]
    Inline,
    /// Hand due timers to a dedicated notifier thread.
    Queued,
}

/// Scheduler tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchedulerConfig {
    pub tick: Duration,
    pub mode: NotificationMode,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick: DEFAULT_TICK,
            mode: NotificationMode::Inline,
        }
    }
}

impl SchedulerConfig {
    /// Rejects a zero tick or one longer than `MAX_TICK`.
    ///
    /// Sub-second ticks pass here; they are meant for tests only.
    pub fn validate(&self) -> Result<(), SchedulerError> {
        if self.tick.is_zero() {
            return Err(SchedulerError::InvalidConfig(
                "scheduler tick must be positive".to_string(),
            ));
        }
        if self.tick > MAX_TICK {
            return Err(SchedulerError::InvalidConfig(format!(
                "scheduler tick {}ms exceeds {}ms",
                self.tick.as_millis(),
                MAX_TICK.as_millis()
            )));
        }
        Ok(())
    }
}

/// Scheduler lifecycle errors.
#[derive(Debug)]
pub enum SchedulerError {
    InvalidConfig(String),
    Spawn(std::io::Error),
    Panicked(&'static str),
}

impl Display for SchedulerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidConfig(message) => write!(f, "invalid scheduler config: {message}"),
            Self::Spawn(err) => write!(f, "failed to spawn scheduler thread: {err}"),
            Self::Panicked(thread) => write!(f, "{thread} thread panicked"),
        }
    }
}

impl Error for SchedulerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Spawn(err) => Some(err),
            Self::InvalidConfig(_) | Self::Panicked(_) => None,
        }
    }
}

/// Outcome of one scheduler tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    /// Timers pruned as due.
    pub due: usize,
    /// Notifications shown successfully on this thread.
    pub notified: usize,
    /// Notifications that failed on this thread.
    pub failed: usize,
    /// Timers handed to the notifier thread.
    pub queued: usize,
}

/// Prunes due timers and notifies them inline.
///
/// The registry lock is released before the first notification.
pub fn run_tick(registry: &TimerRegistry, notifier: &dyn Notifier, now: Instant) -> TickReport {
    let due = registry.evaluate_and_prune(now);
    let mut report = TickReport {
        due: due.len(),
        ..TickReport::default()
    };
    for timer in &due {
        if deliver(notifier, timer) {
            report.notified += 1;
        } else {
            report.failed += 1;
        }
    }
    report
}

fn deliver(notifier: &dyn Notifier, timer: &Timer) -> bool {
    match notifier.notify(timer) {
        Ok(()) => {
            info!("event=timer_notify module=scheduler status=ok id={}", timer.id);
            true
        }
        Err(err) => {
            error!(
                "event=timer_notify module=scheduler status=error id={} error={}",
                timer.id, err
            );
            false
        }
    }
}

enum Dispatch {
    Inline(Arc<dyn Notifier>),
    Queued(Sender<Timer>),
}

impl Dispatch {
    fn tick(&self, registry: &TimerRegistry, now: Instant) -> TickReport {
        match self {
            Self::Inline(notifier) => run_tick(registry, notifier.as_ref(), now),
            Self::Queued(sender) => {
                let due = registry.evaluate_and_prune(now);
                let mut report = TickReport {
                    due: due.len(),
                    ..TickReport::default()
                };
                for timer in due {
                    let id = timer.id;
                    if sender.send(timer).is_ok() {
                        report.queued += 1;
                    } else {
                        // Receiver gone; the timer is already pruned.
                        warn!(
                            "event=timer_notify module=scheduler status=error id={} error_code=notifier_closed",
                            id
                        );
                        report.failed += 1;
                    }
                }
                report
            }
        }
    }
}

/// Entry point for the background expiry loop.
pub struct ExpiryScheduler;

impl ExpiryScheduler {
    /// Spawns the scheduler (and, in queued mode, the notifier thread).
    ///
    /// # Errors
    /// - `InvalidConfig` when `config.validate()` fails.
    /// - `Spawn` when the OS refuses a new thread.
    pub fn start(
        registry: Arc<TimerRegistry>,
        notifier: Arc<dyn Notifier>,
        config: SchedulerConfig,
    ) -> Result<SchedulerHandle, SchedulerError> {
        config.validate()?;
        let stop = Arc::new(AtomicBool::new(false));

        let (dispatch, notifier_thread) = match config.mode {
            NotificationMode::Inline => (Dispatch::Inline(notifier), None),
            NotificationMode::Queued => {
                let (sender, receiver) = unbounded::<Timer>();
                let handle = thread::Builder::new()
                    .name(NOTIFIER_THREAD_NAME.to_string())
                    .spawn(move || {
                        for timer in receiver.iter() {
                            deliver(notifier.as_ref(), &timer);
                        }
                        debug!("event=notifier_stop module=scheduler status=ok");
                    })
                    .map_err(SchedulerError::Spawn)?;
                (Dispatch::Queued(sender), Some(handle))
            }
        };

        let loop_stop = Arc::clone(&stop);
        let tick = config.tick;
        let scheduler_thread = thread::Builder::new()
            .name(SCHEDULER_THREAD_NAME.to_string())
            .spawn(move || run_loop(&registry, &dispatch, tick, &loop_stop))
            .map_err(SchedulerError::Spawn)?;

        info!(
            "event=scheduler_start module=scheduler status=ok tick_ms={} mode={:?}",
            tick.as_millis(),
            config.mode
        );

        Ok(SchedulerHandle {
            stop,
            scheduler_thread: Some(scheduler_thread),
            notifier_thread,
        })
    }
}

fn run_loop(registry: &TimerRegistry, dispatch: &Dispatch, tick: Duration, stop: &AtomicBool) {
    while !stop.load(Ordering::Acquire) {
        thread::sleep(tick);
        let report = dispatch.tick(registry, Instant::now());
        if report.due > 0 {
            debug!(
                "event=scheduler_tick module=scheduler status=ok due={} notified={} queued={} failed={}",
                report.due, report.notified, report.queued, report.failed
            );
        }
    }
    info!("event=scheduler_stop module=scheduler status=ok");
}

/// Owner handle for a running scheduler.
///
/// Dropping the handle requests a stop without waiting.
pub struct SchedulerHandle {
    stop: Arc<AtomicBool>,
    scheduler_thread: Option<JoinHandle<()>>,
    notifier_thread: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    /// Requests a stop; takes effect at the top of the next tick.
    pub fn stop(&self) {
        self.stop.store(true, Ordering::Release);
    }

    pub fn is_running(&self) -> bool {
        self.scheduler_thread
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the scheduler and waits for its threads to exit.
    ///
    /// In queued mode this also waits for pending notifications.
    pub fn join(mut self) -> Result<(), SchedulerError> {
        self.stop();
        if let Some(handle) = self.scheduler_thread.take() {
            handle
                .join()
                .map_err(|_| SchedulerError::Panicked(SCHEDULER_THREAD_NAME))?;
        }
        if let Some(handle) = self.notifier_thread.take() {
            handle
                .join()
                .map_err(|_| SchedulerError::Panicked(NOTIFIER_THREAD_NAME))?;
        }
        Ok(())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::{run_tick, NotificationError, Notifier, SchedulerConfig, SchedulerError};
    use crate::model::timer::Timer;
    use crate::registry::timer_registry::TimerRegistry;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{Duration, Instant};

    struct CountingNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl Notifier for CountingNotifier {
        fn notify(&self, _timer: &Timer) -> Result<(), NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::Backend("no display".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn config_rejects_zero_and_oversized_ticks() {
        let zero = SchedulerConfig {
            tick: Duration::ZERO,
            ..SchedulerConfig::default()
        };
        assert!(matches!(zero.validate(), Err(SchedulerError::InvalidConfig(_))));

        let slow = SchedulerConfig {
            tick: Duration::from_secs(2),
            ..SchedulerConfig::default()
        };
        assert!(matches!(slow.validate(), Err(SchedulerError::InvalidConfig(_))));

        SchedulerConfig::default()
            .validate()
            .expect("default config should be valid");
    }

    #[test]
    fn run_tick_notifies_only_due_timers() {
        let registry = TimerRegistry::new();
        let now = Instant::now();
        registry.add_at(now, Duration::from_secs(1), "due").unwrap();
        registry.add_at(now, Duration::from_secs(100), "later").unwrap();
        let notifier = CountingNotifier {
            calls: AtomicUsize::new(0),
            fail: false,
        };

        let report = run_tick(&registry, &notifier, now + Duration::from_secs(2));
        assert_eq!(report.due, 1);
        assert_eq!(report.notified, 1);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn failed_notification_still_prunes_timer() {
        let registry = TimerRegistry::new();
        let now = Instant::now();
        registry.add_at(now, Duration::ZERO, "broken").unwrap();
        let notifier = CountingNotifier {
            calls: AtomicUsize::new(0),
            fail: true,
        };

        let first = run_tick(&registry, &notifier, now);
        assert_eq!(first.failed, 1);
        assert!(registry.is_empty());

        let second = run_tick(&registry, &notifier, now + Duration::from_secs(1));
        assert_eq!(second.due, 0);
        assert_eq!(notifier.calls.load(Ordering::SeqCst), 1);
    }
}
