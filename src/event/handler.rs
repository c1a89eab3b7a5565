use crossterm::event::{self, KeyEvent, KeyEventKind};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc;
use tracing::warn;

use crate::app::{JobMessage, Ticket};

#[derive(Debug)]
pub enum Event {
    Key(KeyEvent),
    Mouse,
    Resize(u16, u16),
    Tick,
    /// A unit of work finished
    Job { ticket: Ticket, message: JobMessage },
    /// A notification reached the end of its display time
    NotificationExpired(u64),
}

/// Handshake between the UI and the terminal reader thread. While paused,
/// the reader stays parked and never touches terminal input.
#[derive(Debug, Default)]
struct ReaderGate {
    paused: AtomicBool,
    parked: AtomicBool,
}

impl ReaderGate {
    const PARK_INTERVAL: Duration = Duration::from_millis(10);

    /// Called by the reader before every poll and read. True while paused.
    fn hold(&self) -> bool {
        if self.paused.load(Ordering::Acquire) {
            self.parked.store(true, Ordering::Release);
            std::thread::sleep(Self::PARK_INTERVAL);
            return true;
        }
        self.parked.store(false, Ordering::Release);
        false
    }

    /// Ask the reader to park and wait until it did, up to `timeout`
    fn pause(&self, timeout: Duration) -> bool {
        self.paused.store(true, Ordering::Release);
        let deadline = Instant::now() + timeout;
        while !self.parked.load(Ordering::Acquire) {
            if Instant::now() >= deadline {
                return false;
            }
            std::thread::sleep(Duration::from_millis(1));
        }
        true
    }

    fn resume(&self) {
        self.paused.store(false, Ordering::Release);
    }
}

/// Single event queue fed by the terminal reader thread, workers and timers
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<Event>,
    tx: mpsc::UnboundedSender<Event>,
    gate: Arc<ReaderGate>,
    tick_rate: Duration,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let event_tx = tx.clone();
        let gate = Arc::new(ReaderGate::default());
        let reader_gate = gate.clone();

        std::thread::spawn(move || {
            loop {
                // An external program owns the terminal; leave its input alone
                if reader_gate.hold() {
                    continue;
                }

                if event::poll(tick_rate).unwrap_or(false) {
                    // Paused while polling: the input belongs to the external program
                    if reader_gate.hold() {
                        continue;
                    }
                    match event::read() {
                        Ok(event::Event::Key(key)) if key.kind == KeyEventKind::Press => {
                            if event_tx.send(Event::Key(key)).is_err() {
                                break;
                            }
                        }
                        Ok(event::Event::Mouse(_)) => {
                            if event_tx.send(Event::Mouse).is_err() {
                                break;
                            }
                        }
                        Ok(event::Event::Resize(width, height)) => {
                            if event_tx.send(Event::Resize(width, height)).is_err() {
                                break;
                            }
                        }
                        _ => {}
                    }
                } else if event_tx.send(Event::Tick).is_err() {
                    break;
                }
            }
        });

        Self {
            rx,
            tx,
            gate,
            tick_rate,
        }
    }

    /// Handle for workers and timers to post back into the queue
    pub fn sender(&self) -> mpsc::UnboundedSender<Event> {
        self.tx.clone()
    }

    /// Park the reader thread. Returns once it stopped reading input, or
    /// false if it did not within a couple of ticks.
    pub fn pause(&self) -> bool {
        let parked = self.gate.pause(self.tick_rate * 2 + ReaderGate::PARK_INTERVAL);
        if !parked {
            warn!("Terminal reader did not park in time");
        }
        parked
    }

    pub fn resume(&self) {
        self.gate.resume();
    }

    pub async fn next(&mut self) -> Option<Event> {
        self.rx.recv().await
    }
}
