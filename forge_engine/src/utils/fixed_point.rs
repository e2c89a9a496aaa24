//! Bounded fixed-point iteration
//!
//! Several stages of the engine re-apply a text transform until it stops
//! changing: outer-paren stripping, threshold-call rewriting, constant
//! inlining and expectation-factor removal. All of them share this one
//! driver so the pass bound is enforced uniformly and a non-terminating
//! step function cannot loop the process.

/// Re-apply `step` until it reports no further change or `max_passes` is
/// reached. `step` returns `Some(next)` when it changed the text and `None`
/// when the input is already at a fixed point.
///
/// Returns the final text plus the number of passes that produced a change.
/// A step that returns `Some` with text identical to its input is treated as
/// no progress, so a misbehaving step still terminates.
pub fn iterate_until_fixed_point<F>(initial: String, max_passes: usize, step: F) -> (String, usize)
where
    F: Fn(&str) -> Option<String>,
{
    let mut current = initial;
    let mut passes = 0;

    while passes < max_passes {
        match step(&current) {
            Some(next) if next != current => {
                current = next;
                passes += 1;
            }
            _ => break,
        }
    }

    (current, passes)
}
