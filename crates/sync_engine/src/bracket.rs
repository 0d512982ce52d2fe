//! Bracket location with a forward-only cursor.

use contracts::{Bracket, ContractError, SensorStream, Stage, SyncFailure};

/// Finds the raw samples surrounding successive targets.
///
/// Targets must be presented in non-decreasing order. The cursor only moves
/// forward, so resolving a whole grid costs `O(n + m)`.
#[derive(Debug, Clone)]
pub struct BracketLocator<'a, const D: usize> {
    timestamps: &'a [f64],
    values: &'a [[f64; D]],
    stage: Stage,
    cursor: usize,
}

impl<'a, const D: usize> BracketLocator<'a, D> {
    pub fn new(timestamps: &'a [f64], values: &'a [[f64; D]], stage: Stage) -> Self {
        let len = timestamps.len().min(values.len());
        Self {
            timestamps: &timestamps[..len],
            values: &values[..len],
            stage,
            cursor: 1,
        }
    }

    pub fn from_stream(stream: &'a SensorStream<D>, stage: Stage) -> Self {
        Self::new(stream.timestamps(), stream.values(), stage)
    }

    /// Index of the `after` sample of the last located bracket
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Bracket `(values[i-1], values[i])` with `timestamps[i-1] <= target < timestamps[i]`
    ///
    /// # Errors
    /// - `StartsAfterTarget` when `timestamps[i-1] > target` at the cursor
    /// - `NotCovered` when the stream ends at or before `target`
    /// - `EmptyReference` when the stream has fewer than two samples
    pub fn locate(&mut self, target: f64) -> Result<Bracket<D>, ContractError> {
        let ts = self.timestamps;
        let last = match ts.last() {
            Some(last) if ts.len() >= 2 => *last,
            _ => return Err(self.fail(SyncFailure::EmptyReference { target })),
        };

        while self.cursor < ts.len() {
            let i = self.cursor;
            if ts[i - 1] > target {
                return Err(self.fail(SyncFailure::StartsAfterTarget {
                    target,
                    reference: ts[i - 1],
                }));
            }
            if target < ts[i] {
                return Ok(Bracket::new(self.values[i - 1], self.values[i]));
            }
            self.cursor += 1;
        }

        Err(self.fail(SyncFailure::NotCovered {
            target,
            reference_end: last,
        }))
    }

    fn fail(&self, reason: SyncFailure) -> ContractError {
        ContractError::sync(self.stage, reason)
    }
}

/// Single-shot bracket lookup, scanning `ref_timestamps` from the start
pub fn locate_bracket<const D: usize>(
    target: f64,
    ref_timestamps: &[f64],
    ref_values: &[[f64; D]],
    stage: Stage,
) -> Result<Bracket<D>, ContractError> {
    BracketLocator::new(ref_timestamps, ref_values, stage).locate(target)
}

/// Brackets for every target of a sorted grid, in order
pub fn locate_all<const D: usize>(
    targets: &[f64],
    stream: &SensorStream<D>,
    stage: Stage,
) -> Result<Vec<Bracket<D>>, ContractError> {
    let mut locator = BracketLocator::from_stream(stream, stage);
    let mut out = Vec::with_capacity(targets.len());
    for &target in targets {
        out.push(locator.locate(target)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    const TS: [f64; 4] = [0.0, 2.0, 4.0, 6.0];
    const VALUES: [[f64; 1]; 4] = [[0.0], [1.0], [2.0], [3.0]];

    fn reason(err: ContractError) -> SyncFailure {
        match err {
            ContractError::Sync { reason, .. } => reason,
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_locate_inside_interval() {
        let b = locate_bracket(3.0, &TS, &VALUES, Stage::PoseBracket).unwrap();
        assert_eq!(b, Bracket::new([1.0], [2.0]));

        let b = locate_bracket(5.0, &TS, &VALUES, Stage::PoseBracket).unwrap();
        assert_eq!(b, Bracket::new([2.0], [3.0]));
    }

    #[test]
    fn test_target_on_sample_uses_it_as_before() {
        let b = locate_bracket(2.0, &TS, &VALUES, Stage::PoseBracket).unwrap();
        assert_eq!(b, Bracket::new([1.0], [2.0]));
        let b = locate_bracket(0.0, &TS, &VALUES, Stage::PoseBracket).unwrap();
        assert_eq!(b, Bracket::new([0.0], [1.0]));
    }

    #[test]
    fn test_reference_starting_after_target() {
        let err = locate_bracket(0.0, &[5.0, 1.0, 2.0], &[[0.0]; 3], Stage::InertialBracket)
            .unwrap_err();
        assert_eq!(err.stage(), Some(Stage::InertialBracket));
        assert_eq!(
            reason(err),
            SyncFailure::StartsAfterTarget {
                target: 0.0,
                reference: 5.0
            }
        );
    }

    #[test]
    fn test_target_past_reference_end() {
        let err = locate_bracket(6.0, &TS, &VALUES, Stage::PoseBracket).unwrap_err();
        assert_eq!(
            reason(err),
            SyncFailure::NotCovered {
                target: 6.0,
                reference_end: 6.0
            }
        );
    }

    #[test]
    fn test_single_sample_reference() {
        let err = locate_bracket(0.0, &[0.0], &[[1.0]], Stage::PoseBracket).unwrap_err();
        assert!(matches!(reason(err), SyncFailure::EmptyReference { .. }));
    }

    #[test]
    fn test_cursor_never_rewinds() {
        let mut locator = BracketLocator::new(&TS, &VALUES, Stage::PoseBracket);
        locator.locate(5.0).unwrap();
        assert_eq!(locator.cursor(), 3);

        // an earlier target after the cursor advanced is a drift violation
        let err = locator.locate(1.0).unwrap_err();
        assert!(matches!(reason(err), SyncFailure::StartsAfterTarget { .. }));
    }

    #[test]
    fn test_repeated_target_reuses_bracket() {
        let mut locator = BracketLocator::new(&TS, &VALUES, Stage::PoseBracket);
        let a = locator.locate(3.0).unwrap();
        let b = locator.locate(3.0).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_locate_all_matches_rescan() {
        let mut rng = rand::rng();
        let mut t = 0.0;
        let ts: Vec<f64> = (0..500)
            .map(|_| {
                t += rng.random_range(0.001..0.02);
                t
            })
            .collect();
        let values: Vec<[f64; 3]> = (0..ts.len()).map(|i| [i as f64, 0.0, -(i as f64)]).collect();
        let stream = SensorStream::new(ts.clone(), values.clone()).unwrap();

        let end = ts[ts.len() - 1];
        let mut targets: Vec<f64> = (0..200).map(|_| rng.random_range(ts[0]..end)).collect();
        targets.sort_by(|a, b| a.total_cmp(b));

        let all = locate_all(&targets, &stream, Stage::InertialBracket).unwrap();
        for (target, bracket) in targets.iter().zip(&all) {
            let single = locate_bracket(*target, &ts, &values, Stage::InertialBracket).unwrap();
            assert_eq!(*bracket, single);
        }
    }
}
