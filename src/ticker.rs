//! Owned periodic-tick resource.
//!
//! The registry is caller-driven, so something has to deliver one tick
//! per wall-clock second while a project is tracking. `Ticker` is that
//! resource: a background thread sending unit ticks over a channel,
//! created when tracking starts and dropped when nothing tracks. All
//! registry mutation stays on the thread draining the channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

/// Nominal tick interval: one second
pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Handle to the tick-delivery thread. Dropping it stops delivery; no
/// tick is sent after `stop` returns.
pub struct Ticker {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl Ticker {
    /// Spawn the delivery thread, sending `()` on `tx` once per interval.
    ///
    /// Delivery also ends on its own if the receiving side hangs up.
    pub fn start(tx: Sender<()>) -> Self {
        Self::with_interval(tx, TICK_INTERVAL)
    }

    /// Same as `start` with a custom interval (shortened in tests)
    pub fn with_interval(tx: Sender<()>, interval: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::spawn(move || loop {
            std::thread::sleep(interval);
            if thread_stop.load(Ordering::Relaxed) {
                break;
            }
            if tx.send(()).is_err() {
                break;
            }
        });
        Self {
            stop,
            handle: Some(handle),
        }
    }

    /// Stop delivery and wait for the thread to exit
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for Ticker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_ticker_delivers_ticks() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::with_interval(tx, Duration::from_millis(5));

        // Block for a couple of deliveries.
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();

        ticker.stop();
    }

    #[test]
    fn test_no_tick_after_stop() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::with_interval(tx, Duration::from_millis(5));
        rx.recv_timeout(Duration::from_secs(1)).unwrap();

        ticker.stop();
        // Drain anything sent before the stop took effect, then confirm
        // the channel stays quiet.
        while rx.try_recv().is_ok() {}
        std::thread::sleep(Duration::from_millis(25));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_thread_exits_when_receiver_hangs_up() {
        let (tx, rx) = mpsc::channel();
        let ticker = Ticker::with_interval(tx, Duration::from_millis(5));
        drop(rx);
        // stop() joins; a thread stuck sending would hang here.
        ticker.stop();
    }
}
