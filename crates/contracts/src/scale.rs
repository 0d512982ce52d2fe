//! Per-channel output scaling.

use crate::Bracket;

/// Divides each channel by its own constant.
///
/// The inertial stream keeps channel 0 as recorded and expresses channels
/// 1 and 2 in units of g, so the default inertial scale is `[1.0, 9.81, 9.81]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelScale<const D: usize> {
    divisors: [f64; D],
}

impl<const D: usize> ChannelScale<D> {
    pub fn new(divisors: [f64; D]) -> Self {
        Self { divisors }
    }

    pub fn identity() -> Self {
        Self { divisors: [1.0; D] }
    }

    pub fn divisors(&self) -> &[f64; D] {
        &self.divisors
    }

    pub fn is_identity(&self) -> bool {
        self.divisors.iter().all(|d| *d == 1.0)
    }

    pub fn apply(&self, value: &[f64; D]) -> [f64; D] {
        std::array::from_fn(|c| value[c] / self.divisors[c])
    }

    pub fn apply_bracket(&self, bracket: &Bracket<D>) -> Bracket<D> {
        Bracket::new(self.apply(&bracket.before), self.apply(&bracket.after))
    }
}

impl ChannelScale<3> {
    /// Standard gravity used for the accelerometer channels
    pub const GRAVITY: f64 = 9.81;

    pub fn inertial() -> Self {
        Self::new([1.0, Self::GRAVITY, Self::GRAVITY])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inertial_scale_leaves_first_channel() {
        let scale = ChannelScale::inertial();
        let scaled = scale.apply(&[9.81, 9.81, 19.62]);
        assert_eq!(scaled[0], 9.81);
        assert!((scaled[1] - 1.0).abs() < 1e-12);
        assert!((scaled[2] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_identity() {
        let scale = ChannelScale::<3>::identity();
        assert!(scale.is_identity());
        assert_eq!(scale.apply(&[1.5, -2.0, 3.0]), [1.5, -2.0, 3.0]);
    }

    #[test]
    fn test_apply_bracket_scales_both_samples() {
        let scale = ChannelScale::new([2.0, 4.0]);
        let out = scale.apply_bracket(&Bracket::new([2.0, 4.0], [4.0, 8.0]));
        assert_eq!(out, Bracket::new([1.0, 1.0], [2.0, 2.0]));
    }
}
