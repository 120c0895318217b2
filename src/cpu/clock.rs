//! Clock sources and cancellation for the run loop.
//!
//! The TD4 has no internal timing; it advances one instruction per pulse of
//! an external clock. [`Clock::wait`] blocks until either the next pulse or
//! a cancellation request, whichever comes first.

use std::sync::{Arc, Condvar, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Outcome of waiting on a clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockEvent {
    /// A clock pulse arrived.
    Tick,
    /// Cancellation was requested before the next pulse.
    Cancelled,
}

/// A source of clock pulses.
pub trait Clock {
    /// Block until the next tick or until `cancel` fires.
    fn wait(&mut self, cancel: &CancelToken) -> ClockEvent;
}

/// Cooperative cancellation flag shared between the run loop and whoever
/// wants to stop it (a signal handler, a UI thread, a test).
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<bool>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake any waiting clock.
    pub fn cancel(&self) {
        let (flag, cvar) = &*self.inner;
        *flag.lock().unwrap_or_else(PoisonError::into_inner) = true;
        cvar.notify_all();
    }

    /// Has cancellation been requested?
    pub fn is_cancelled(&self) -> bool {
        *self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Sleep until `deadline` unless cancelled first.
    ///
    /// Returns `true` if cancelled.
    pub fn sleep_until(&self, deadline: Instant) -> bool {
        let (flag, cvar) = &*self.inner;
        let mut cancelled = flag.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if *cancelled {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            cancelled = cvar
                .wait_timeout(cancelled, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

/// A real-time clock that ticks at a fixed period.
///
/// Like a hardware oscillator, the first tick arrives one full period after
/// the ticker starts. Ticks that are missed because the caller was slow are
/// not replayed.
#[derive(Debug, Clone)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Create a ticker running at `hz` pulses per second.
    ///
    /// Returns `None` when `hz` does not give a representable period.
    pub fn from_hz(hz: f64) -> Option<Self> {
        if !hz.is_finite() || hz <= 0.0 {
            return None;
        }
        Duration::try_from_secs_f64(1.0 / hz).ok().map(Self::new)
    }

    pub fn period(&self) -> Duration {
        self.period
    }
}

impl Clock for Ticker {
    fn wait(&mut self, cancel: &CancelToken) -> ClockEvent {
        if cancel.sleep_until(self.next) {
            return ClockEvent::Cancelled;
        }
        let now = Instant::now();
        self.next += self.period;
        if self.next < now {
            self.next = now + self.period;
        }
        ClockEvent::Tick
    }
}

/// A clock that ticks as fast as the caller asks, optionally a limited
/// number of times. Once the limit is used up it reports cancellation.
#[derive(Debug, Clone, Default)]
pub struct Immediate {
    remaining: Option<u64>,
}

impl Immediate {
    /// Tick forever (until cancelled).
    pub fn unlimited() -> Self {
        Self { remaining: None }
    }

    /// Tick at most `ticks` times.
    pub fn limited(ticks: u64) -> Self {
        Self { remaining: Some(ticks) }
    }
}

impl Clock for Immediate {
    fn wait(&mut self, cancel: &CancelToken) -> ClockEvent {
        if cancel.is_cancelled() {
            return ClockEvent::Cancelled;
        }
        match &mut self.remaining {
            Some(0) => ClockEvent::Cancelled,
            Some(n) => {
                *n -= 1;
                ClockEvent::Tick
            }
            None => ClockEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_immediate_limited() {
        let cancel = CancelToken::new();
        let mut clock = Immediate::limited(2);
        assert_eq!(clock.wait(&cancel), ClockEvent::Tick);
        assert_eq!(clock.wait(&cancel), ClockEvent::Tick);
        assert_eq!(clock.wait(&cancel), ClockEvent::Cancelled);
    }

    #[test]
    fn test_immediate_observes_cancel() {
        let cancel = CancelToken::new();
        let mut clock = Immediate::unlimited();
        assert_eq!(clock.wait(&cancel), ClockEvent::Tick);
        cancel.cancel();
        assert_eq!(clock.wait(&cancel), ClockEvent::Cancelled);
    }

    #[test]
    fn test_ticker_ticks_after_period() {
        let cancel = CancelToken::new();
        let start = Instant::now();
        let mut ticker = Ticker::new(Duration::from_millis(20));
        assert_eq!(ticker.wait(&cancel), ClockEvent::Tick);
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_cancel_wakes_waiting_ticker() {
        let cancel = CancelToken::new();
        let remote = cancel.clone();
        let mut ticker = Ticker::new(Duration::from_secs(30));

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(20));
            remote.cancel();
        });

        let start = Instant::now();
        assert_eq!(ticker.wait(&cancel), ClockEvent::Cancelled);
        assert!(start.elapsed() < Duration::from_secs(5));
        handle.join().unwrap();
    }

    #[test]
    fn test_from_hz() {
        assert_eq!(Ticker::from_hz(2.0).unwrap().period(), Duration::from_millis(500));
        assert!(Ticker::from_hz(1e-20).is_none());
        assert!(Ticker::from_hz(0.0).is_none());
        assert!(Ticker::from_hz(f64::NAN).is_none());
    }
}
