use crate::input::{Button, ButtonState};
use crate::ppu::FRAME_BUFFER_LEN;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// State shared between the simulation thread and the frontend.
///
/// The frame buffer is published without a lock: individual pixels are stored with relaxed
/// ordering and the frame counter is bumped with release ordering afterwards. A reader that loads
/// the counter with acquire ordering and then copies the buffer sees at least that frame, possibly
/// mixed with pixels of a later one.
#[derive(Debug)]
pub struct SharedState {
    frame_counter: AtomicU32,
    frame_buffer: Box<[AtomicU32]>,
    buttons: Arc<ButtonState>,
    shutdown: AtomicBool,
    paused: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self {
            frame_counter: AtomicU32::new(0),
            frame_buffer: (0..FRAME_BUFFER_LEN).map(|_| AtomicU32::new(0xFFFF_FFFF)).collect(),
            buttons: Arc::new(ButtonState::default()),
            shutdown: AtomicBool::new(false),
            paused: AtomicBool::new(false),
        }
    }

    /// Number of completed frames. Wraps at `u32::MAX`.
    pub fn frame_counter(&self) -> u32 {
        self.frame_counter.load(Ordering::Acquire)
    }

    pub(crate) fn publish_frame(&self, pixels: &[u32], frame: u32) {
        for (dst, &src) in self.frame_buffer.iter().zip(pixels) {
            dst.store(src, Ordering::Relaxed);
        }
        self.frame_counter.store(frame, Ordering::Release);
    }

    /// Copy of the most recently published frame, 160x144 ARGB pixels in row-major order.
    pub fn frame_buffer(&self) -> Vec<u32> {
        self.frame_buffer.iter().map(|pixel| pixel.load(Ordering::Relaxed)).collect()
    }

    pub fn set_button(&self, button: Button, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    pub(crate) fn buttons(&self) -> Arc<ButtonState> {
        Arc::clone(&self.buttons)
    }

    pub fn request_shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    pub fn shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }

    pub fn set_paused(&self, paused: bool) {
        self.paused.store(paused, Ordering::Relaxed);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}
