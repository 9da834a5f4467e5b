//! Lock-free frame queue for composited video
//!
//! This implements a single-producer single-consumer (SPSC) queue carrying
//! rendered frames from the compositor's render loop to the output stream
//! consumer with minimal latency.

use bytes::Bytes;
use crossbeam::queue::ArrayQueue;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Bytes per RGBA pixel
pub const BYTES_PER_PIXEL: usize = 4;

/// A single video frame in RGBA8, row-major
#[derive(Clone)]
pub struct VideoFrame {
    /// Pixel data, `width * height * 4` bytes
    pub pixels: Bytes,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Timestamp in microseconds since the stream started
    pub timestamp: u64,
    /// Frame sequence number
    pub sequence: u32,
}

impl VideoFrame {
    pub fn new(pixels: Bytes, width: u32, height: u32, timestamp: u64, sequence: u32) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp,
            sequence,
        }
    }

    /// Build a frame filled with a single RGBA color
    pub fn solid(color: [u8; 4], width: u32, height: u32, timestamp: u64, sequence: u32) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * BYTES_PER_PIXEL);
        for _ in 0..(width * height) {
            pixels.extend_from_slice(&color);
        }
        Self::new(Bytes::from(pixels), width, height, timestamp, sequence)
    }

    /// Byte offset of the pixel at (x, y)
    pub fn pixel_offset(&self, x: u32, y: u32) -> usize {
        (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL
    }

    /// RGBA value of the pixel at (x, y)
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let off = self.pixel_offset(x, y);
        let mut px = [0u8; 4];
        px.copy_from_slice(&self.pixels[off..off + BYTES_PER_PIXEL]);
        px
    }
}

/// Provides the most recent frame of a live video track.
///
/// The render loop samples each source once per tick; implementations return
/// whatever frame is current without blocking. Sources may change resolution
/// between frames, the compositor scales to its fixed output geometry.
pub trait VideoSampler: Send + Sync {
    fn latest_frame(&self) -> Option<VideoFrame>;
}

/// Lock-free queue of rendered frames
pub struct FrameQueue {
    queue: ArrayQueue<VideoFrame>,
    overflow_count: AtomicUsize,
    underrun_count: AtomicUsize,
    pushed_total: AtomicUsize,
}

impl FrameQueue {
    /// Create a new frame queue with the specified capacity
    pub fn new(capacity: usize) -> Self {
        Self {
            queue: ArrayQueue::new(capacity),
            overflow_count: AtomicUsize::new(0),
            underrun_count: AtomicUsize::new(0),
            pushed_total: AtomicUsize::new(0),
        }
    }

    /// Push a frame into the queue.
    /// When full, the oldest frame is dropped so the consumer always sees
    /// the freshest output (live frames are not replayable).
    pub fn push(&self, frame: VideoFrame) {
        self.pushed_total.fetch_add(1, Ordering::Relaxed);
        let mut frame = frame;
        loop {
            match self.queue.push(frame) {
                Ok(()) => return,
                Err(rejected) => {
                    self.overflow_count.fetch_add(1, Ordering::Relaxed);
                    let _ = self.queue.pop();
                    frame = rejected;
                }
            }
        }
    }

    /// Pop a frame from the queue.
    /// Returns None if the queue is empty (underrun)
    pub fn pop(&self) -> Option<VideoFrame> {
        match self.queue.pop() {
            Some(frame) => Some(frame),
            None => {
                self.underrun_count.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Try to pop without counting underrun
    pub fn try_pop(&self) -> Option<VideoFrame> {
        self.queue.pop()
    }

    /// Check if the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Get current queue length
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Get queue capacity
    pub fn capacity(&self) -> usize {
        self.queue.capacity()
    }

    /// Get overflow count
    pub fn overflow_count(&self) -> usize {
        self.overflow_count.load(Ordering::Relaxed)
    }

    /// Get underrun count
    pub fn underrun_count(&self) -> usize {
        self.underrun_count.load(Ordering::Relaxed)
    }

    /// Total frames ever pushed, including ones later dropped on overflow
    pub fn pushed_total(&self) -> usize {
        self.pushed_total.load(Ordering::Relaxed)
    }

    /// Reset statistics
    pub fn reset_stats(&self) {
        self.overflow_count.store(0, Ordering::Relaxed);
        self.underrun_count.store(0, Ordering::Relaxed);
    }
}

/// Thread-safe handle to a frame queue
pub type SharedFrameQueue = Arc<FrameQueue>;

/// Create a new shared frame queue
pub fn create_shared_queue(capacity: usize) -> SharedFrameQueue {
    Arc::new(FrameQueue::new(capacity))
}
