use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::buffer::ChunkBuffer;
use super::state::RecorderState;
use crate::capture::{CaptureBackend, Fragment, MediaStream};
use crate::error::{Error, Result};

/// Notification delivered by a running recorder
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecorderEvent {
    /// One encoded fragment, in chronological order
    DataAvailable(Fragment),
    /// Terminal notification; nothing follows it
    Stop,
}

/// Records a bound [`MediaStream`] into a [`ChunkBuffer`]
///
/// While recording, a pump task forwards pipeline fragments as
/// [`RecorderEvent::DataAvailable`] notifications and emits
/// [`RecorderEvent::Stop`] once the pipeline has flushed.
#[derive(Debug, Default)]
pub struct Recorder {
    state: RecorderState,
    stream: Option<MediaStream>,
    stop_tx: Option<oneshot::Sender<()>>,
    events: Option<mpsc::UnboundedReceiver<RecorderEvent>>,
    pump: Option<JoinHandle<()>>,
    stop_received: bool,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Recorder in the Idle state bound to `stream`
    pub fn with_stream(stream: MediaStream) -> Self {
        Self {
            stream: Some(stream),
            ..Self::default()
        }
    }

    pub fn state(&self) -> RecorderState {
        self.state
    }

    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Bind a new stream, returning the recorder to Idle
    pub fn bind(&mut self, stream: MediaStream) -> Result<()> {
        if self.state == RecorderState::Recording {
            return Err(Error::InvalidState {
                operation: "bind a stream",
                state: self.state,
            });
        }

        self.stream = Some(stream);
        self.state = RecorderState::Idle;
        self.stop_received = false;
        Ok(())
    }

    /// Idle -> Recording
    pub async fn start(&mut self) -> Result<()> {
        if self.state != RecorderState::Idle {
            return Err(Error::InvalidState {
                operation: "start",
                state: self.state,
            });
        }

        let stream = self.stream.take().ok_or(Error::InvalidState {
            operation: "start without a bound stream",
            state: self.state,
        })?;

        info!("Starting recorder for {}", stream.source());

        let source = stream.source().clone();
        let mut backend = stream.into_backend();
        let fragments = match backend.start().await {
            Ok(fragments) => fragments,
            Err(e) => {
                // Stay bound so the same source can be retried
                warn!("{} pipeline failed to start: {}", backend.name(), e);
                self.stream = Some(MediaStream::new(source, backend));
                return Err(e);
            }
        };

        let (stop_tx, stop_rx) = oneshot::channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        self.pump = Some(tokio::spawn(pump(backend, fragments, stop_rx, event_tx)));
        self.stop_tx = Some(stop_tx);
        self.events = Some(event_rx);
        self.stop_received = false;
        self.state = RecorderState::Recording;

        Ok(())
    }

    /// Append every notification that has already arrived
    ///
    /// Returns true once the terminal Stop notification has been seen.
    pub fn drain_into(&mut self, buffer: &mut ChunkBuffer) -> bool {
        if let Some(events) = &mut self.events {
            while let Ok(event) = events.try_recv() {
                match event {
                    RecorderEvent::DataAvailable(fragment) => buffer.push(fragment),
                    RecorderEvent::Stop => {
                        self.stop_received = true;
                        break;
                    }
                }
            }
        }
        self.stop_received
    }

    /// Recording -> Stopped
    ///
    /// Waits for the pipeline to flush and appends the remaining fragments
    /// to `buffer`. Returns the number of fragments appended by this call.
    pub async fn stop(&mut self, buffer: &mut ChunkBuffer) -> Result<usize> {
        if self.state != RecorderState::Recording {
            return Err(Error::InvalidState {
                operation: "stop",
                state: self.state,
            });
        }

        info!("Stopping recorder");

        if let Some(stop_tx) = self.stop_tx.take() {
            // Err means the pump already finished because the stream ended
            let _ = stop_tx.send(());
        }

        let before = buffer.len();
        if let Some(mut events) = self.events.take() {
            while !self.stop_received {
                match events.recv().await {
                    Some(RecorderEvent::DataAvailable(fragment)) => buffer.push(fragment),
                    Some(RecorderEvent::Stop) | None => self.stop_received = true,
                }
            }
        }

        if let Some(pump) = self.pump.take() {
            if let Err(e) = pump.await {
                error!("Recorder pump panicked: {}", e);
            }
        }

        self.state = RecorderState::Stopped;
        let appended = buffer.len() - before;
        info!("Recorder stopped ({} fragments)", appended);

        Ok(appended)
    }
}

async fn pump(
    mut backend: Box<dyn CaptureBackend>,
    mut fragments: mpsc::Receiver<Fragment>,
    mut stop_rx: oneshot::Receiver<()>,
    events: mpsc::UnboundedSender<RecorderEvent>,
) {
    let mut stop_requested = false;

    loop {
        tokio::select! {
            fragment = fragments.recv() => match fragment {
                Some(fragment) => {
                    debug!("Video data available ({} bytes)", fragment.len());
                    if events.send(RecorderEvent::DataAvailable(fragment)).is_err() {
                        break;
                    }
                }
                None => break,
            },
            // A dropped sender counts as a stop request too
            _ = &mut stop_rx, if !stop_requested => {
                stop_requested = true;
                if let Err(e) = backend.stop().await {
                    error!("Failed to stop {} pipeline: {}", backend.name(), e);
                }
            }
        }
    }

    if !stop_requested {
        warn!("{} stream ended before stop was requested", backend.name());
    }
    if backend.is_capturing() {
        if let Err(e) = backend.stop().await {
            error!("Failed to stop {} pipeline: {}", backend.name(), e);
        }
    }

    let _ = events.send(RecorderEvent::Stop);
}
