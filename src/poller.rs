//! Coil polling loop: read, decode, publish, wait.
//!
//! One cycle reads the timestamp block, then the sine block, strictly in that
//! order (the two reads share one connection and requests are not pipelined),
//! decodes both through [`crate::decode`], and hands the resulting
//! [`DecodedSample`] to the registered sink. After each cycle the loop sleeps
//! for the configured interval, so inter-sample spacing is interval plus
//! cycle latency rather than a fixed wall-clock cadence.
//!
//! Per-cycle failures go to the observer callback and never stop the loop;
//! only [`PollerHandle::stop`] does.

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::PollConfig;
use crate::decode::{self, DecodeError, DecodedSample};
use crate::transport::{CoilTransport, TransportError};

/// Consumer of decoded samples.
///
/// Invoked synchronously from the polling task, one call at a time, never
/// concurrently with itself. A slow sink delays the next cycle.
pub trait SampleSink: Send {
    fn on_sample(&mut self, sample: DecodedSample);
}

impl<F> SampleSink for F
where
    F: FnMut(DecodedSample) + Send,
{
    fn on_sample(&mut self, sample: DecodedSample) {
        self(sample)
    }
}

/// Consumer of non-fatal per-cycle failures.
pub trait PollObserver: Send {
    fn on_error(&mut self, kind: PollErrorKind, message: &str);
}

impl<F> PollObserver for F
where
    F: FnMut(PollErrorKind, &str) + Send,
{
    fn on_error(&mut self, kind: PollErrorKind, message: &str) {
        self(kind, message)
    }
}

/// Failure classification reported to the observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollErrorKind {
    /// The session dropped; the loop reconnects before the next cycle.
    ConnectionLost,
    /// The device stayed silent; the same cycle is retried after the interval.
    Timeout,
    /// The device answered with an exception or a malformed reply.
    Protocol,
    /// The transport returned the wrong number of bits for a channel.
    MalformedBitSequence,
}

/// Error type for a single poll cycle.
#[derive(Debug, Error)]
pub enum PollError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl PollError {
    /// Classification for observer reporting.
    pub fn kind(&self) -> PollErrorKind {
        match self {
            PollError::Transport(TransportError::ConnectionLost(_)) => {
                PollErrorKind::ConnectionLost
            }
            PollError::Transport(TransportError::Timeout(_)) => PollErrorKind::Timeout,
            PollError::Transport(TransportError::Protocol(_)) => PollErrorKind::Protocol,
            PollError::Decode(_) => PollErrorKind::MalformedBitSequence,
        }
    }
}

/// Lifecycle state of the polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    /// Constructed, not yet started.
    Idle,
    /// Polling cycles in progress.
    Running,
    /// Stopped by an explicit cancellation. Terminal.
    Cancelled,
}

/// Polls two coil channels and publishes decoded samples to a sink.
pub struct CoilPoller<T, S, O> {
    config: PollConfig,
    transport: T,
    sink: S,
    observer: O,
    needs_reconnect: bool,
}

impl<T, S, O> CoilPoller<T, S, O>
where
    T: CoilTransport + 'static,
    S: SampleSink + 'static,
    O: PollObserver + 'static,
{
    /// Create a poller. Sinks are registered here, before `start()`, and are
    /// owned by the poller for its lifetime.
    pub fn new(config: PollConfig, transport: T, sink: S, observer: O) -> Self {
        Self {
            config,
            transport,
            sink,
            observer,
            needs_reconnect: false,
        }
    }

    /// Spawn the polling task and return a handle for observing and stopping it.
    pub fn start(self) -> PollerHandle {
        let (state_tx, state_rx) = watch::channel(PollerState::Idle);
        let (stop_tx, stop_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(state_tx, stop_rx));

        PollerHandle {
            stop: stop_tx,
            state: state_rx,
            task,
        }
    }

    async fn run(mut self, state: watch::Sender<PollerState>, mut stop: watch::Receiver<bool>) {
        let interval = self.config.interval();
        let _ = state.send(PollerState::Running);

        info!(
            "Polling started (interval: {}ms, time @ {}, sine @ {})",
            self.config.interval_ms, self.config.time_coil_base, self.config.sine_coil_base
        );

        loop {
            // Cancellation is checked at the top of each cycle; an in-flight
            // read is allowed to complete or fail naturally.
            if *stop.borrow() {
                break;
            }

            match self.poll_once().await {
                Ok(sample) => {
                    debug!(
                        "Decoded sample: time={:.6} sin(t)={:.6}",
                        sample.epoch_time, sample.sine_value
                    );
                    self.sink.on_sample(sample);
                }
                Err(e) => {
                    warn!("Poll cycle failed: {}", e);
                    if e.kind() == PollErrorKind::ConnectionLost {
                        self.needs_reconnect = true;
                    }
                    self.observer.on_error(e.kind(), &e.to_string());
                }
            }

            tokio::select! {
                changed = stop.changed() => {
                    // A closed channel means the handle was dropped; treat it
                    // as cancellation rather than polling unsupervised.
                    if changed.is_err() || *stop.borrow() {
                        break;
                    }
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }

        let _ = state.send(PollerState::Cancelled);
        info!("Polling stopped");
    }

    /// One full sample cycle: read both channels sequentially, decode, pair.
    async fn poll_once(&mut self) -> Result<DecodedSample, PollError> {
        if self.needs_reconnect {
            self.transport.reconnect().await?;
            self.needs_reconnect = false;
            info!("Transport reconnected");
        }

        let time_bits = self.transport.read_coils(self.config.time_block()).await?;
        let sine_bits = self.transport.read_coils(self.config.sine_block()).await?;

        let epoch_time = decode::assemble_f64(&time_bits, self.config.bit_order)?;
        let sine_value = decode::assemble_f32(&sine_bits, self.config.bit_order)?;

        Ok(DecodedSample {
            epoch_time,
            sine_value,
        })
    }
}

/// Handle to a running polling task.
pub struct PollerHandle {
    stop: watch::Sender<bool>,
    state: watch::Receiver<PollerState>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    /// Current loop state.
    pub fn state(&self) -> PollerState {
        *self.state.borrow()
    }

    /// Watch receiver for observing state transitions.
    pub fn subscribe_state(&self) -> watch::Receiver<PollerState> {
        self.state.clone()
    }

    /// Request cancellation and wait for the loop to reach `Cancelled`.
    ///
    /// Interrupts an in-progress inter-cycle wait immediately; a read already
    /// on the wire completes or fails naturally first. No reads are issued
    /// after this returns. Safe to call from outside the polling task.
    pub async fn stop(self) {
        let _ = self.stop.send(true);
        let _ = self.task.await;
    }
}
