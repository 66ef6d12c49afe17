//! Session lifecycle and the stream pump
//!
//! A [`Session`] owns the device socket and exactly one background pump
//! thread. The pump does all blocking network reads: one trace per
//! iteration, inserted into the sliding window, then published as a whole
//! frame through the single-slot handoff. Consumers only ever touch the
//! window snapshots and the slot; they never see the socket.

use std::net::{Shutdown, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Receiver, Sender};

use crate::buffer::{
    create_shared_window, Frame, FrameSlot, InsertPolicy, SharedWindow, WindowStats,
};
use crate::config::DeviceConfig;
use crate::error::{Error, Result};
use crate::protocol::{self, SampleQuantity, TimeRange, Trace};

/// Connect, run the handshake, and start pumping with the default
/// fill-then-scroll window.
pub fn start_session(config: &DeviceConfig) -> Result<Session> {
    Session::start(config, InsertPolicy::FillThenScroll)
}

/// A live connection to the radar with its pump thread.
#[derive(Debug)]
pub struct Session {
    /// Control handle to the socket; the pump owns its own clone
    stream: TcpStream,

    /// Cleared by `stop()` or by the pump on a fatal read error
    running: Arc<AtomicBool>,

    window: SharedWindow,
    frames: Arc<FrameSlot>,

    pump: Option<JoinHandle<()>>,
    error_rx: Receiver<Error>,

    traces_read: Arc<AtomicU64>,
    quantity: SampleQuantity,
    range: TimeRange,
}

impl Session {
    /// Open the connection, negotiate, and launch the pump thread.
    pub fn start(config: &DeviceConfig, policy: InsertPolicy) -> Result<Self> {
        config.validate()?;

        let quantity = SampleQuantity::from_raw(config.sample_quantity);
        let range = TimeRange::from_raw(config.time_range_ns);

        let mut stream = protocol::connect(
            &config.host,
            config.port,
            config.connect_timeout(),
            config.read_timeout(),
        )?;
        protocol::negotiate(&mut stream, quantity, range)?;

        let window = create_shared_window(config.window_capacity, policy);
        let frames = Arc::new(FrameSlot::new());
        let running = Arc::new(AtomicBool::new(true));
        let traces_read = Arc::new(AtomicU64::new(0));
        let (error_tx, error_rx) = bounded::<Error>(1);

        let pump_stream = stream.try_clone()?;
        let pump = thread::Builder::new()
            .name("gpr-pump".into())
            .spawn({
                let running = running.clone();
                let window = window.clone();
                let frames = frames.clone();
                let traces_read = traces_read.clone();
                move || {
                    pump_loop(
                        pump_stream,
                        quantity,
                        running,
                        window,
                        frames,
                        traces_read,
                        error_tx,
                    )
                }
            })
            .map_err(Error::Io)?;

        Ok(Self {
            stream,
            running,
            window,
            frames,
            pump: Some(pump),
            error_rx,
            traces_read,
            quantity,
            range,
        })
    }

    /// Copy of the current window contents. Non-blocking; repeated calls may
    /// return the same data when no new trace arrived.
    pub fn snapshot(&self) -> Vec<Trace> {
        self.window.snapshot()
    }

    /// Drain the freshest published frame, if one arrived since the last
    /// take.
    pub fn take_frame(&self) -> Option<Frame> {
        self.frames.take()
    }

    /// Change the window capacity, e.g. on a consumer resize.
    pub fn resize_window(&self, new_capacity: usize) {
        self.window.resize(new_capacity);
    }

    /// Whether the pump is still streaming. `false` after `stop()` or once a
    /// fatal read error stopped the session.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// The fatal error that stopped the pump, if any.
    pub fn take_error(&self) -> Option<Error> {
        self.error_rx.try_recv().ok()
    }

    /// Total traces read this session
    pub fn traces_read(&self) -> u64 {
        self.traces_read.load(Ordering::Acquire)
    }

    pub fn quantity(&self) -> SampleQuantity {
        self.quantity
    }

    pub fn time_range(&self) -> TimeRange {
        self.range
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            traces_read: self.traces_read(),
            frames_published: self.frames.published(),
            frames_dropped: self.frames.dropped(),
            window: self.window.stats(),
        }
    }

    /// Signal the pump to stop, unblock any in-flight read, and wait for the
    /// thread to finish. Idempotent.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // Breaks a read the pump may be blocked in; harmless if the socket
        // already died.
        let _ = self.stream.shutdown(Shutdown::Both);

        if let Some(handle) = self.pump.take() {
            let _ = handle.join();
            tracing::info!("session stopped after {} traces", self.traces_read());
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Per-session counters
#[derive(Debug, Clone)]
pub struct SessionStats {
    pub traces_read: u64,
    pub frames_published: u64,
    pub frames_dropped: u64,
    pub window: WindowStats,
}

fn pump_loop(
    mut stream: TcpStream,
    quantity: SampleQuantity,
    running: Arc<AtomicBool>,
    window: SharedWindow,
    frames: Arc<FrameSlot>,
    traces_read: Arc<AtomicU64>,
    error_tx: Sender<Error>,
) {
    let mut sequence: u64 = 0;

    while running.load(Ordering::SeqCst) {
        match protocol::read_trace(&mut stream, quantity) {
            Ok(trace) => {
                window.insert(trace);
                sequence += 1;
                frames.publish(Frame {
                    columns: window.snapshot(),
                    sequence,
                });
                // Counter last, so a counter of N guarantees frame N was
                // already published.
                traces_read.store(sequence, Ordering::Release);
            }
            Err(e) => {
                // swap distinguishes a device fault from our own stop():
                // stop() clears the flag before shutting the socket down.
                if running.swap(false, Ordering::SeqCst) {
                    tracing::error!("trace stream failed: {}", e);
                    let _ = error_tx.try_send(e);
                }
                break;
            }
        }
    }
}
