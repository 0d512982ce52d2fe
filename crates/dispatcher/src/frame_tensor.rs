//! Normalized frame tensor, `(S, H, W, 3)` float32 in `[0, 1]`.

use std::path::Path;

use contracts::{ContractError, FrameSize, Stage};
use image::RgbImage;

use crate::error::DispatcherError;
use crate::frame_diff::load_rgb;

/// Min-max normalize one frame over all of its channels, `H x W x 3` order.
///
/// A constant frame has no range and maps to zeros.
pub fn normalize(frame: &RgbImage) -> Vec<f32> {
    let raw = frame.as_raw();
    let (min, max) = raw
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    if max <= min {
        return vec![0.0; raw.len()];
    }
    let range = f64::from(max - min);
    raw.iter()
        .map(|&v| (f64::from(v - min) / range) as f32)
        .collect()
}

/// Normalized frames stacked in sample order
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTensor {
    size: FrameSize,
    frames: usize,
    data: Vec<f32>,
}

impl FrameTensor {
    pub fn with_capacity(size: FrameSize, frames: usize) -> Self {
        Self {
            size,
            frames: 0,
            data: Vec::with_capacity(frames * Self::frame_len(size)),
        }
    }

    fn frame_len(size: FrameSize) -> usize {
        size.height as usize * size.width as usize * 3
    }

    /// Append one frame
    ///
    /// # Errors
    /// `ShapeMismatch` (stage `frame_tensor`) when the frame is not `size`
    pub fn push(&mut self, frame: &RgbImage) -> Result<(), ContractError> {
        let (width, height) = frame.dimensions();
        if (height, width) != (self.size.height, self.size.width) {
            return Err(ContractError::shape_mismatch(
                Stage::FrameTensor,
                [
                    ("expected_height", self.size.height as usize),
                    ("expected_width", self.size.width as usize),
                    ("frame_height", height as usize),
                    ("frame_width", width as usize),
                ],
            ));
        }
        self.data.extend(normalize(frame));
        self.frames += 1;
        Ok(())
    }

    /// Append the last frame again, for a frame selected by consecutive ticks
    fn repeat_last(&mut self) {
        let len = Self::frame_len(self.size);
        let start = self.data.len() - len;
        self.data.extend_from_within(start..);
        self.frames += 1;
    }

    pub fn len(&self) -> usize {
        self.frames
    }

    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    pub fn shape(&self) -> [usize; 4] {
        [
            self.frames,
            self.size.height as usize,
            self.size.width as usize,
            3,
        ]
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }
}

/// Load and normalize `paths` in order
pub fn pack_frames<P: AsRef<Path>>(
    paths: &[P],
    size: FrameSize,
) -> Result<FrameTensor, DispatcherError> {
    let mut tensor = FrameTensor::with_capacity(size, paths.len());
    let mut previous: Option<&Path> = None;
    for path in paths {
        let path = path.as_ref();
        if previous == Some(path) {
            tensor.repeat_last();
        } else {
            tensor.push(&load_rgb(path)?)?;
        }
        previous = Some(path);
    }
    Ok(tensor)
}
