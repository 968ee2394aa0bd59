//! Terminal presentation loop for the primary instance.
//!
//! # Responsibility
//! - Own the "window" state (visible or hidden) and render the timer table.
//! - Poll the activation listener and stdin once per UI tick.
//!
//! # Invariants
//! - The UI never holds the registry lock; it only reads snapshots.
//! - Bad input is reported and discarded; it never ends the loop.

use crate::entry::{classify, EntryCommand};
use crossbeam_channel::{never, unbounded, Receiver, RecvTimeoutError};
use lazytimer_core::{
    ActivationEvent, ActivationListener, ExpiryScheduler, Notifier, SchedulerConfig, TimerService,
};
use log::{debug, info, warn};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const INPUT_POLL: Duration = Duration::from_millis(10);
const PROMPT: &str = "timer> ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Window state and rendering, independent of where input comes from.
pub struct TimerWindow<W: Write> {
    service: TimerService,
    out: W,
    visible: bool,
    last_generation: u64,
}

impl<W: Write> TimerWindow<W> {
    pub fn new(service: TimerService, out: W) -> Self {
        Self {
            service,
            out,
            visible: false,
            last_generation: 0,
        }
    }

    /// Shows the window (or brings it forward) and paints the table.
    pub fn open(&mut self) -> io::Result<()> {
        if !self.visible {
            debug!("event=window_open module=ui status=ok");
        }
        self.visible = true;
        self.render()
    }

    pub fn hide(&mut self) -> io::Result<()> {
        if self.visible {
            self.visible = false;
            debug!("event=window_hide module=ui status=ok");
            writeln!(
                self.out,
                "(hidden; timers keep running; launch lazytimer again to reopen)"
            )?;
            self.out.flush()?;
        }
        Ok(())
    }

    pub fn handle_line(&mut self, line: &str) -> io::Result<Flow> {
        match classify(line) {
            EntryCommand::Exit => return Ok(Flow::Exit),
            EntryCommand::Minimize => self.hide()?,
            EntryCommand::Refresh => self.render()?,
            EntryCommand::CreateTimer {
                input,
                minimize_after,
            } => {
                if let Err(err) = self.service.submit(&input) {
                    writeln!(self.out, "ignored: {err}")?;
                }
                if minimize_after {
                    self.hide()?;
                } else {
                    self.render()?;
                }
            }
        }
        Ok(Flow::Continue)
    }

    /// Repaints when a timer expired since the last check.
    pub fn refresh_on_expiry(&mut self) -> io::Result<()> {
        let generation = self.service.registry().expiry_generation();
        if generation != self.last_generation {
            self.last_generation = generation;
            self.render()?;
        }
        Ok(())
    }

    fn render(&mut self) -> io::Result<()> {
        if !self.visible {
            return Ok(());
        }
        let views = self.service.list(Instant::now());
        if views.is_empty() {
            writeln!(self.out, "(no timers)")?;
        }
        for view in &views {
            writeln!(self.out, "{}", view.formatted)?;
        }
        write!(self.out, "{PROMPT}")?;
        self.out.flush()
    }
}

/// Runs the primary instance until `exit` is entered.
pub fn run_primary(
    listener: ActivationListener,
    notifier: Arc<dyn Notifier>,
    scheduler_config: SchedulerConfig,
) -> anyhow::Result<()> {
    let service = TimerService::new(Arc::default());
    let scheduler = ExpiryScheduler::start(service.registry(), notifier, scheduler_config)?;

    let mut window = TimerWindow::new(service, io::stdout());
    let mut input = spawn_stdin_reader()?;
    window.open()?;

    loop {
        if listener.poll() == ActivationEvent::Activate {
            window.open()?;
        }

        match input.recv_timeout(INPUT_POLL) {
            Ok(line) => {
                if window.handle_line(&line)? == Flow::Exit {
                    break;
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("event=input_closed module=ui status=ok");
                window.hide()?;
                input = never();
            }
        }

        window.refresh_on_expiry()?;
    }

    info!("event=app_exit module=ui status=ok");
    scheduler.join()?;
    Ok(())
}

fn spawn_stdin_reader() -> io::Result<Receiver<String>> {
    let (sender, receiver) = unbounded();
    thread::Builder::new()
        .name("lazytimer-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                match line {
                    Ok(line) => {
                        if sender.send(line).is_err() {
                            return;
                        }
                    }
                    Err(err) => {
                        warn!("event=input_read module=ui status=error error={}", err);
                        return;
                    }
                }
            }
        })?;
    Ok(receiver)
}

#[cfg(test)]
mod tests {
    use super::{Flow, TimerWindow};
    use lazytimer_core::{TimerRegistry, TimerService};
    use std::sync::Arc;
    use std::time::{Duration, Instant};

    fn window() -> TimerWindow<Vec<u8>> {
        TimerWindow::new(TimerService::new(Arc::new(TimerRegistry::new())), Vec::new())
    }

    fn output(view: &TimerWindow<Vec<u8>>) -> String {
        String::from_utf8_lossy(&view.out).into_owned()
    }

    #[test]
    fn hidden_window_does_not_render() {
        let mut view = window();
        view.handle_line("5m Tea").unwrap();
        assert!(output(&view).is_empty());
        assert_eq!(view.service.registry().len(), 1);
    }

    #[test]
    fn creating_a_timer_renders_table() {
        let mut view = window();
        view.open().unwrap();
        view.handle_line("10 Coffee").unwrap();
        let text = output(&view);
        assert!(text.contains("00:00:10 Coffee"));
    }

    #[test]
    fn bad_input_is_reported_not_fatal() {
        let mut view = window();
        view.open().unwrap();
        assert_eq!(view.handle_line("abc").unwrap(), Flow::Continue);
        assert!(output(&view).contains("ignored:"));
        assert!(view.service.registry().is_empty());
    }

    #[test]
    fn trailing_marker_creates_then_hides() {
        let mut view = window();
        view.open().unwrap();
        view.handle_line("1h Oven-").unwrap();
        assert!(!view.visible);
        assert_eq!(view.service.registry().snapshot()[0].label, "Oven");
    }

    #[test]
    fn exit_ends_the_loop() {
        let mut view = window();
        assert_eq!(view.handle_line("exit").unwrap(), Flow::Exit);
    }

    #[test]
    fn expiry_triggers_a_repaint() {
        let mut view = window();
        view.open().unwrap();
        let registry = view.service.registry();
        let now = Instant::now();
        registry.add_at(now, Duration::ZERO, "Done").unwrap();
        registry.evaluate_and_prune(now + Duration::from_millis(1));

        view.out.clear();
        view.refresh_on_expiry().unwrap();
        assert!(output(&view).contains("(no timers)"));

        view.out.clear();
        view.refresh_on_expiry().unwrap();
        assert!(output(&view).is_empty());
    }
}
