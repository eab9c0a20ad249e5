//! Frame acquisition seam.
//!
//! The physical camera lives behind a vendor service and is a collaborator;
//! the engine only needs "give me one grayscale frame, optionally after a
//! one-shot white balance or refocus".

use async_trait::async_trait;
use image::GrayImage;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::error::VisionError;

/// Per-capture camera options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureOptions {
    pub white_balance: bool,
    pub one_shot_focus: bool,
}

impl CaptureOptions {
    /// Options used by the search procedure: rebalance on every capture.
    pub fn with_white_balance() -> Self {
        Self {
            white_balance: true,
            one_shot_focus: false,
        }
    }
}

/// Blocking frame acquisition. One capture per call, in lockstep with the
/// motion that positioned the camera.
#[async_trait]
pub trait FrameSource: Send {
    async fn capture(&mut self, options: &CaptureOptions) -> Result<GrayImage, VisionError>;
}

/// Frame source playing a fixed sequence, for tests and the simulated
/// backend. Once the sequence is exhausted every further capture returns a
/// black frame, which the matcher rejects at realistic frame sizes.
#[derive(Debug, Clone)]
pub struct StaticFrameSource {
    frames: VecDeque<GrayImage>,
    fallback: (u32, u32),
    captures: u32,
}

impl StaticFrameSource {
    pub fn new(frames: Vec<GrayImage>, fallback: (u32, u32)) -> Self {
        Self {
            frames: frames.into(),
            fallback,
            captures: 0,
        }
    }

    /// Captures performed so far.
    pub fn captures(&self) -> u32 {
        self.captures
    }
}

#[async_trait]
impl FrameSource for StaticFrameSource {
    async fn capture(&mut self, _options: &CaptureOptions) -> Result<GrayImage, VisionError> {
        self.captures += 1;
        Ok(self
            .frames
            .pop_front()
            .unwrap_or_else(|| GrayImage::new(self.fallback.0, self.fallback.1)))
    }
}
