//! Sliding-window packing of per-sample brackets.

use contracts::{Bracket, ContractError, SlidingWindows, Stage};

/// Window `j` holds `brackets[j .. j + window_size]`, the history preceding
/// logical sample `j + window_size`.
///
/// Produces `brackets.len() - window_size` windows, none when both are equal.
///
/// # Errors
/// `Range` when fewer than `window_size` brackets are available or
/// `window_size` is zero.
pub fn pack_windows<const D: usize>(
    brackets: &[Bracket<D>],
    window_size: usize,
) -> Result<SlidingWindows<D>, ContractError> {
    if window_size == 0 || brackets.len() < window_size {
        return Err(ContractError::range(
            Stage::Windowing,
            brackets.len(),
            window_size.max(1),
        ));
    }

    let count = brackets.len() - window_size;
    let mut windows = SlidingWindows::with_capacity(window_size, count);
    for j in 0..count {
        windows.push_window(&brackets[j..j + window_size]);
    }
    Ok(windows)
}
