//! Raw rows → normalized [`Dataset`](crate::Dataset).
//!
//! 1. **Classify**: does the row name a country, and is it a reference-group member?
//! 2. **Aggregate**: signed column sums per category for one year window.
//! 3. **Carry forward**: walk the year range, reusing the previous record for unpopulated years.

/// Signed per-category column sums.
pub mod aggregate;
/// Year walk with carry-forward, and whole-sheet extraction.
pub mod carry_forward;
/// Country identity and group membership of a row.
pub mod classify;
