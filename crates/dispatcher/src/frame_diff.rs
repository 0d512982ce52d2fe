//! Difference images between consecutive retained frames.

use std::path::Path;

use contracts::{ContractError, Stage};
use image::RgbImage;

use crate::error::DispatcherError;

/// Channel-first `(3, H, W)` signed difference `next - previous`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDifference {
    pub height: usize,
    pub width: usize,
    pub data: Vec<i16>,
}

impl FrameDifference {
    pub fn shape(&self) -> [usize; 3] {
        [3, self.height, self.width]
    }

    /// Per-channel difference of two RGB images of equal size
    ///
    /// # Errors
    /// `ShapeMismatch` (stage `frame_diff`) when the dimensions differ
    pub fn between(previous: &RgbImage, next: &RgbImage) -> Result<Self, ContractError> {
        if previous.dimensions() != next.dimensions() {
            return Err(ContractError::shape_mismatch(
                Stage::FrameDiff,
                [
                    ("previous_width", previous.width() as usize),
                    ("previous_height", previous.height() as usize),
                    ("next_width", next.width() as usize),
                    ("next_height", next.height() as usize),
                ],
            ));
        }

        let (width, height) = next.dimensions();
        let plane = width as usize * height as usize;
        let mut data = vec![0i16; 3 * plane];
        for (i, (p, n)) in previous.pixels().zip(next.pixels()).enumerate() {
            for c in 0..3 {
                data[c * plane + i] = i16::from(n[c]) - i16::from(p[c]);
            }
        }

        Ok(Self {
            height: height as usize,
            width: width as usize,
            data,
        })
    }
}

pub(crate) fn load_rgb(path: &Path) -> Result<RgbImage, DispatcherError> {
    let img = image::open(path).map_err(|source| DispatcherError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(img.to_rgb8())
}

/// Load two frames from disk and compute their difference
pub fn diff_files(previous: &Path, next: &Path) -> Result<FrameDifference, DispatcherError> {
    let prev = load_rgb(previous)?;
    let next = load_rgb(next)?;
    Ok(FrameDifference::between(&prev, &next)?)
}
