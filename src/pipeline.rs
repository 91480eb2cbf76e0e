//! Two-stage acquisition: one thread fetches raw payloads from the camera
//! while another decodes the previous one.

use crate::base::{Error, Result, Transport};
use crate::frame_builder::FrameDecoder;
use crate::types::{Frame, FrameType};
use crate::TauCamera;
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender};
use log::{error, trace, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Payloads or frames buffered between stages.
const PIPELINE_DEPTH: usize = 2;

/// How often a blocked stage rechecks the shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(10);

/// Runs acquisition and decoding on two threads.
///
/// The producer owns the camera and the consumer owns the decoder; only raw
/// payload buffers cross between them. Payloads too short for a full frame
/// are dropped. `stop` hands the camera back.
///
/// # Example
/// ```ignore
/// let pipeline = FramePipeline::start(camera, FrameType::DistanceGrayscale, FrameDecoder::default());
/// for frame in pipeline.frames().iter().take(100) {
///     println!("{} points", frame.points.len());
/// }
/// let camera = pipeline.stop()?;
/// ```
#[derive(Debug)]
pub struct FramePipeline<T: ?Sized + 'static> {
    frames: Receiver<Frame>,
    shutdown: Arc<AtomicBool>,
    producer: Option<JoinHandle<TauCamera<T>>>,
    consumer: Option<JoinHandle<()>>,
}

impl<T> FramePipeline<T>
where
    T: ?Sized + Transport + Send + 'static,
{
    /// Starts both stages.
    ///
    /// # Arguments
    ///
    /// * `camera` - An opened and configured camera, moved to the producer thread.
    /// * `frame_type` - Layout to acquire on every cycle.
    /// * `decoder` - Decoder moved to the consumer thread.
    pub fn start(camera: TauCamera<T>, frame_type: FrameType, decoder: FrameDecoder) -> FramePipeline<T> {
        trace!("Starting frame pipeline for {:?} frames", frame_type);
        let shutdown = Arc::new(AtomicBool::new(false));
        let (raw_tx, raw_rx) = crossbeam_channel::bounded(PIPELINE_DEPTH);
        let (frame_tx, frame_rx) = crossbeam_channel::bounded(PIPELINE_DEPTH);

        let producer_shutdown = shutdown.clone();
        let producer =
            thread::spawn(move || produce(camera, frame_type, raw_tx, producer_shutdown));

        let consumer_shutdown = shutdown.clone();
        let consumer = thread::spawn(move || {
            consume(decoder, frame_type, raw_rx, frame_tx, consumer_shutdown)
        });

        FramePipeline {
            frames: frame_rx,
            shutdown,
            producer: Some(producer),
            consumer: Some(consumer),
        }
    }

    /// Decoded frames, oldest first. Disconnects once both stages have ended.
    #[inline]
    pub fn frames(&self) -> &Receiver<Frame> {
        &self.frames
    }

    /// Waits up to `timeout` for the next frame.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<Frame> {
        self.frames.recv_timeout(timeout).ok()
    }

    /// Returns `true` while the producer thread is still acquiring.
    pub fn is_running(&self) -> bool {
        self.producer
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    /// Stops both stages and returns the camera.
    pub fn stop(mut self) -> Result<TauCamera<T>> {
        trace!("Stopping frame pipeline");
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(consumer) = self.consumer.take() {
            if consumer.join().is_err() {
                error!("Frame decoder thread panicked");
            }
        }
        match self.producer.take().map(JoinHandle::join) {
            Some(Ok(camera)) => Ok(camera),
            _ => Err(Error::OperationFail {
                description: "acquisition thread panicked".to_owned(),
            }),
        }
    }
}

impl<T: ?Sized + 'static> Drop for FramePipeline<T> {
    fn drop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(consumer) = self.consumer.take() {
            let _ = consumer.join();
        }
        if let Some(producer) = self.producer.take() {
            let _ = producer.join();
        }
    }
}

fn produce<T>(
    mut camera: TauCamera<T>,
    frame_type: FrameType,
    raw_tx: Sender<Vec<u8>>,
    shutdown: Arc<AtomicBool>,
) -> TauCamera<T>
where
    T: ?Sized + Transport,
{
    let full_frame = frame_type.full_frame_size();
    'acquire: while !shutdown.load(Ordering::Relaxed) {
        let mut raw = match camera.read_frame_raw(frame_type) {
            Ok(raw) => raw,
            Err(Error::IoError(e)) => {
                error!("Acquisition stopped, transport failed: {}", e);
                break;
            }
            Err(e) => {
                warn!("Acquisition failed: {}", e);
                continue;
            }
        };
        if raw.len() < full_frame {
            warn!("Bad frame ignored, bytes length: {}", raw.len());
            continue;
        }

        loop {
            match raw_tx.send_timeout(raw, SHUTDOWN_POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(back)) => {
                    if shutdown.load(Ordering::Relaxed) {
                        break 'acquire;
                    }
                    raw = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => break 'acquire,
            }
        }
    }
    trace!("Acquisition thread exiting");
    camera
}

fn consume(
    decoder: FrameDecoder,
    frame_type: FrameType,
    raw_rx: Receiver<Vec<u8>>,
    frame_tx: Sender<Frame>,
    shutdown: Arc<AtomicBool>,
) {
    'decode: while !shutdown.load(Ordering::Relaxed) {
        let raw = match raw_rx.recv_timeout(SHUTDOWN_POLL) {
            Ok(raw) => raw,
            Err(RecvTimeoutError::Timeout) => continue,
            Err(RecvTimeoutError::Disconnected) => break,
        };
        let mut frame = match decoder.decode(raw, frame_type) {
            Ok(frame) => frame,
            Err(e) => {
                warn!("Frame dropped: {}", e);
                continue;
            }
        };

        loop {
            match frame_tx.send_timeout(frame, SHUTDOWN_POLL) {
                Ok(()) => break,
                Err(SendTimeoutError::Timeout(back)) => {
                    if shutdown.load(Ordering::Relaxed) {
                        break 'decode;
                    }
                    frame = back;
                }
                Err(SendTimeoutError::Disconnected(_)) => break 'decode,
            }
        }
    }
    trace!("Decoder thread exiting");
}
