//! StreamGatekeeper - exclusive continuous image delivery
//!
//! ## Responsibilities
//!
//! - One streaming session at a time (atomic check-and-set, no queueing)
//! - multipart/x-mixed-replace framing of JPEG parts
//! - Frame retry and pacing
//!
//! The session flag is cleared by `StreamSession::drop`, and frame buffers
//! go back through `FrameLease::drop`. Both happen on every exit path,
//! including the client disconnecting mid-stream (hyper drops the body).
//!
//! Single-shot capture does not pass through here and is not excluded
//! while a session runs.

use crate::hardware::{FrameLease, FrameSize, ImageSource};
use bytes::{Bytes, BytesMut};
use futures::stream::{self, BoxStream, StreamExt};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Multipart boundary token
pub const STREAM_BOUNDARY: &str = "frame";
/// Response content type for `/stream`
pub const STREAM_CONTENT_TYPE: &str = "multipart/x-mixed-replace;boundary=frame";
/// Wait before retrying when no frame is ready (ms)
pub const FRAME_RETRY_MS: u64 = 100;
/// Pacing between delivered frames (ms)
pub const FRAME_INTERVAL_MS: u64 = 50;

/// Chunked multipart body
pub type FrameStream = BoxStream<'static, std::io::Result<Bytes>>;

/// Part header preceding each JPEG payload
pub fn part_header(content_length: usize) -> String {
    format!(
        "--{}\r\nContent-Type: image/jpeg\r\nContent-Length: {}\r\n\r\n",
        STREAM_BOUNDARY, content_length
    )
}

/// StreamGatekeeper instance
pub struct StreamGatekeeper {
    active: Arc<AtomicBool>,
    camera: Arc<dyn ImageSource>,
    /// Resolution to switch to when a session starts
    stream_frame_size: Option<FrameSize>,
    frame_retry: Duration,
    frame_interval: Duration,
}

impl StreamGatekeeper {
    pub fn new(camera: Arc<dyn ImageSource>, stream_frame_size: Option<FrameSize>) -> Self {
        Self {
            active: Arc::new(AtomicBool::new(false)),
            camera,
            stream_frame_size,
            frame_retry: Duration::from_millis(FRAME_RETRY_MS),
            frame_interval: Duration::from_millis(FRAME_INTERVAL_MS),
        }
    }

    /// Override retry and pacing delays
    pub fn with_timing(mut self, frame_retry: Duration, frame_interval: Duration) -> Self {
        self.frame_retry = frame_retry;
        self.frame_interval = frame_interval;
        self
    }

    /// Whether a session currently holds the image source
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Claim the session slot without waiting
    ///
    /// - `None` immediately if another session holds it
    /// - the returned `StreamSession` frees the slot when dropped
    pub fn try_lock(&self) -> Option<StreamSession> {
        match self
            .active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {
                tracing::info!("Stream started - client locked");
                Some(StreamSession {
                    active: self.active.clone(),
                })
            }
            Err(_) => {
                tracing::warn!("Stream rejected - client already active");
                None
            }
        }
    }

    /// Lock and start the frame loop, `None` when another session is active
    pub fn open(&self) -> Option<FrameStream> {
        let session = self.try_lock()?;

        if let Some(size) = self.stream_frame_size {
            if !self.camera.set_resolution(size) {
                tracing::warn!(resolution = %size, "Stream resolution not applied");
            }
        }

        Some(frame_loop(
            session,
            self.camera.clone(),
            self.frame_retry,
            self.frame_interval,
        ))
    }
}

/// Held for the lifetime of one streaming session
pub struct StreamSession {
    active: Arc<AtomicBool>,
}

impl Drop for StreamSession {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
        tracing::info!("Stream ended - client unlocked");
    }
}

struct LoopState {
    _session: StreamSession,
    camera: Arc<dyn ImageSource>,
    first: bool,
}

fn frame_loop(
    session: StreamSession,
    camera: Arc<dyn ImageSource>,
    frame_retry: Duration,
    frame_interval: Duration,
) -> FrameStream {
    let state = LoopState {
        _session: session,
        camera,
        first: true,
    };

    stream::unfold(state, move |mut state| async move {
        if !state.first {
            tokio::time::sleep(frame_interval).await;
        }
        state.first = false;

        loop {
            let Some(lease) = FrameLease::acquire(&state.camera) else {
                tokio::time::sleep(frame_retry).await;
                continue;
            };

            match tokio::task::spawn_blocking(move || encode_part(lease)).await {
                Ok(Some(part)) => return Some((Ok(part), state)),
                // Unconvertible frame: already returned to the driver, try the next one
                Ok(None) => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Frame encode task failed");
                    return None;
                }
            }
        }
    })
    .boxed()
}

/// Header plus JPEG payload for one part. Consumes the lease, so the driver
/// buffer goes back before the part is written to the client.
fn encode_part(lease: FrameLease) -> Option<Bytes> {
    let jpeg = lease.jpeg()?;
    drop(lease);

    let header = part_header(jpeg.len());
    let mut part = BytesMut::with_capacity(header.len() + jpeg.len());
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(&jpeg);
    Some(part.freeze())
}
