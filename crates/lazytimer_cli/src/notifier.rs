//! Expiry notification backends.

use crate::args::NotifierKind;
use lazytimer_core::{NotificationError, Notifier, Timer};
use log::warn;
use rfd::{MessageButtons, MessageDialog, MessageDialogResult, MessageLevel};
use std::io::Write;
use std::sync::Arc;

const NOTIFICATION_TITLE: &str = "Timer";

/// Blocking platform message box; returns once the user dismisses it.
///
/// With a single OK button, anything but `Ok` means the dialog never
/// reached the user (rfd reports backend failures as `Cancel`).
pub struct DialogNotifier;

impl Notifier for DialogNotifier {
    fn notify(&self, timer: &Timer) -> Result<(), NotificationError> {
        let result = MessageDialog::new()
            .set_title(NOTIFICATION_TITLE)
            .set_description(timer.label.as_str())
            .set_level(MessageLevel::Info)
            .set_buttons(MessageButtons::Ok)
            .show();
        result_to_outcome(result)
    }
}

fn result_to_outcome(result: MessageDialogResult) -> Result<(), NotificationError> {
    match result {
        MessageDialogResult::Ok => Ok(()),
        other => Err(NotificationError::Backend(format!(
            "message dialog was not shown (result {other:?})"
        ))),
    }
}

/// Rings the bell and prints the label to stderr.
pub struct TerminalNotifier;

impl Notifier for TerminalNotifier {
    fn notify(&self, timer: &Timer) -> Result<(), NotificationError> {
        write_alert(&mut std::io::stderr().lock(), &timer.label)?;
        Ok(())
    }
}

fn write_alert(out: &mut impl Write, label: &str) -> std::io::Result<()> {
    writeln!(out, "\x07[{NOTIFICATION_TITLE}] {label}")?;
    out.flush()
}

/// Tries `primary`, then `fallback` when the first backend fails.
///
/// Only a failure of both is reported to the scheduler.
pub struct FallbackNotifier {
    primary: Arc<dyn Notifier>,
    fallback: Arc<dyn Notifier>,
}

impl FallbackNotifier {
    pub fn new(primary: Arc<dyn Notifier>, fallback: Arc<dyn Notifier>) -> Self {
        Self { primary, fallback }
    }
}

impl Notifier for FallbackNotifier {
    fn notify(&self, timer: &Timer) -> Result<(), NotificationError> {
        match self.primary.notify(timer) {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(
                    "event=timer_notify module=cli status=fallback id={} error={}",
                    timer.id, err
                );
                self.fallback.notify(timer)
            }
        }
    }
}

pub fn build(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Dialog => Arc::new(FallbackNotifier::new(
            Arc::new(DialogNotifier),
            Arc::new(TerminalNotifier),
        )),
        NotifierKind::Terminal => Arc::new(TerminalNotifier),
    }
}

#[cfg(test)]
mod tests {
    use super::{result_to_outcome, write_alert, FallbackNotifier};
    use lazytimer_core::{NotificationError, Notifier, Timer};
    use rfd::MessageDialogResult;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    struct StubNotifier {
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubNotifier {
        fn new(fail: bool) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                fail,
            })
        }
    }

    impl Notifier for StubNotifier {
        fn notify(&self, _timer: &Timer) -> Result<(), NotificationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(NotificationError::Backend("no display".to_string()))
            } else {
                Ok(())
            }
        }
    }

    fn timer() -> Timer {
        Timer::starting_at(Instant::now(), Duration::ZERO, "Coffee").unwrap()
    }

    #[test]
    fn dismissed_dialog_counts_as_delivered() {
        assert!(result_to_outcome(MessageDialogResult::Ok).is_ok());
    }

    #[test]
    fn dialog_that_never_opened_is_an_error() {
        for result in [
            MessageDialogResult::Cancel,
            MessageDialogResult::No,
            MessageDialogResult::Yes,
            MessageDialogResult::Custom("Retry".to_string()),
        ] {
            let err = result_to_outcome(result).unwrap_err();
            assert!(matches!(err, NotificationError::Backend(_)));
        }
    }

    #[test]
    fn terminal_alert_rings_bell_and_prints_label() {
        let mut out = Vec::new();
        write_alert(&mut out, "Coffee").unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "\x07[Timer] Coffee\n");
    }

    #[test]
    fn fallback_runs_only_when_primary_fails() {
        let primary = StubNotifier::new(false);
        let fallback = StubNotifier::new(false);
        let notifier = FallbackNotifier::new(primary.clone(), fallback.clone());
        notifier.notify(&timer()).unwrap();
        assert_eq!(primary.calls.load(Ordering::SeqCst), 1);
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 0);

        let primary = StubNotifier::new(true);
        let fallback = StubNotifier::new(false);
        let notifier = FallbackNotifier::new(primary.clone(), fallback.clone());
        notifier.notify(&timer()).unwrap();
        assert_eq!(fallback.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_of_both_backends_is_reported() {
        let notifier = FallbackNotifier::new(StubNotifier::new(true), StubNotifier::new(true));
        assert!(notifier.notify(&timer()).is_err());
    }
}
