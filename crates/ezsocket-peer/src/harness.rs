//! Repeated exchanges over one connection.
//!
//! A [`LoopSession`] calls an [`Exchange`] once per iteration and decides
//! when to stop according to its [`TerminationPolicy`]. Under
//! [`TerminationPolicy::Negotiated`] the client sends a status string after
//! every iteration and the server stops when it reads `"Stop"`, so both
//! ends finish on the same iteration.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::config::Role;
use crate::connection::Connection;
use crate::error::Result;
use crate::status::LoopStatus;

/// When a loop ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationPolicy {
    /// Until [`LoopSession::stop`] (or a [`StopHandle`]) is called.
    Indefinite,
    /// Until the client reports `"Stop"` after an iteration.
    Negotiated,
    /// Exactly this many iterations.
    FixedCount(u64),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}

/// Cooperative stop signal shared between a session and other code.
///
/// Observed before the next iteration, or at the next status exchange
/// under negotiated termination.
#[derive(Debug, Clone, Default)]
pub struct StopHandle {
    stopped: Arc<AtomicBool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }

    fn clear(&self) {
        self.stopped.store(false, Ordering::SeqCst);
    }
}

/// One iteration of work on a connection.
pub trait Exchange {
    fn exchange(&mut self, conn: &mut Connection, stop: &StopHandle) -> Result<()>;
}

impl<F> Exchange for F
where
    F: FnMut(&mut Connection, &StopHandle) -> Result<()>,
{
    fn exchange(&mut self, conn: &mut Connection, stop: &StopHandle) -> Result<()> {
        self(conn, stop)
    }
}

/// Outcome of a completed loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopReport {
    pub iterations: u64,
    pub elapsed: Duration,
}

impl LoopReport {
    /// Iterations per second over the whole run.
    pub fn ips(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.iterations as f64 / secs
        } else {
            0.0
        }
    }
}

/// Loop state for one connection.
#[derive(Debug)]
pub struct LoopSession {
    policy: TerminationPolicy,
    state: LoopState,
    iterations: u64,
    started: Option<Instant>,
    stop: StopHandle,
    report_ips: bool,
    last_report_sec: u64,
}

impl LoopSession {
    pub fn new(policy: TerminationPolicy) -> Self {
        Self {
            policy,
            state: LoopState::Idle,
            iterations: 0,
            started: None,
            stop: StopHandle::default(),
            report_ips: false,
            last_report_sec: 0,
        }
    }

    /// Log iterations per second once every elapsed whole second.
    pub fn with_ips_report(mut self, enabled: bool) -> Self {
        self.report_ips = enabled;
        self
    }

    /// Share an existing stop handle, e.g. one wired to a signal handler.
    ///
    /// [`LoopSession::reset`] clears the shared flag too.
    pub fn with_stop_handle(mut self, stop: StopHandle) -> Self {
        self.stop = stop;
        self
    }

    /// Run as the server until the policy ends the loop.
    ///
    /// Under negotiated termination a status string is read after every
    /// iteration.
    pub fn run_server<E: Exchange>(
        &mut self,
        conn: &mut Connection,
        exchange: &mut E,
    ) -> Result<LoopReport> {
        self.drive(Role::Server, conn, exchange)
    }

    /// Run as the client until the policy ends the loop.
    ///
    /// Under negotiated termination a status string is sent after every
    /// iteration: `"Active"`, or `"Stop"` once a stop was requested.
    pub fn run_client<E: Exchange>(
        &mut self,
        conn: &mut Connection,
        exchange: &mut E,
    ) -> Result<LoopReport> {
        self.drive(Role::Client, conn, exchange)
    }

    /// Run in whichever role `conn` was opened with.
    pub fn run<E: Exchange>(&mut self, conn: &mut Connection, exchange: &mut E) -> Result<LoopReport> {
        self.drive(conn.role(), conn, exchange)
    }

    /// Request a stop; see [`StopHandle`].
    pub fn stop(&self) {
        self.stop.stop();
    }

    /// A handle that can stop this session from a callback or another thread.
    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Back to `Idle`: zero iterations, fresh throughput clock, stop cleared.
    pub fn reset(&mut self) {
        self.state = LoopState::Idle;
        self.iterations = 0;
        self.started = None;
        self.last_report_sec = 0;
        self.stop.clear();
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn policy(&self) -> TerminationPolicy {
        self.policy
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Time since the current (or last) loop started; zero when idle.
    pub fn elapsed(&self) -> Duration {
        self.started.map(|at| at.elapsed()).unwrap_or_default()
    }

    /// True while a loop is running and no stop has been requested.
    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running && !self.stop.is_stopped()
    }

    fn drive<E: Exchange>(
        &mut self,
        role: Role,
        conn: &mut Connection,
        exchange: &mut E,
    ) -> Result<LoopReport> {
        if self.state == LoopState::Stopped {
            self.reset();
        }
        self.state = LoopState::Running;
        let started = Instant::now();
        self.started = Some(started);
        info!(%role, policy = ?self.policy, "loop started");

        let result = self.iterate(role, conn, exchange, started);
        self.state = LoopState::Stopped;

        let report = LoopReport {
            iterations: self.iterations,
            elapsed: started.elapsed(),
        };
        match &result {
            Ok(()) => info!(
                %role,
                iterations = report.iterations,
                ips = report.ips(),
                "loop finished"
            ),
            Err(err) => info!(%role, iterations = report.iterations, error = %err, "loop aborted"),
        }
        result.map(|()| report)
    }

    fn iterate<E: Exchange>(
        &mut self,
        role: Role,
        conn: &mut Connection,
        exchange: &mut E,
        started: Instant,
    ) -> Result<()> {
        loop {
            match self.policy {
                TerminationPolicy::Indefinite if self.stop.is_stopped() => return Ok(()),
                TerminationPolicy::FixedCount(n) if self.iterations >= n => return Ok(()),
                _ => {}
            }

            exchange.exchange(conn, &self.stop)?;
            self.iterations += 1;
            self.report_throughput(started);

            if self.policy == TerminationPolicy::Negotiated {
                let status = match role {
                    Role::Server => conn.read_status()?,
                    Role::Client => {
                        let status = if self.stop.is_stopped() {
                            LoopStatus::Stop
                        } else {
                            LoopStatus::Active
                        };
                        conn.send_status(status)?;
                        status
                    }
                };
                debug!(%role, iteration = self.iterations, status = status.as_str(), "status");
                if status == LoopStatus::Stop {
                    return Ok(());
                }
            }
        }
    }

    fn report_throughput(&mut self, started: Instant) {
        if !self.report_ips {
            return;
        }
        let elapsed = started.elapsed();
        let whole_secs = elapsed.as_secs();
        if whole_secs > self.last_report_sec {
            self.last_report_sec = whole_secs;
            let ips = self.iterations as f64 / elapsed.as_secs_f64();
            info!(iterations = self.iterations, ips, "IPS");
        }
    }
}
