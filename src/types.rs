//! BLOOMFILE - Core Type Definitions
//! Small status types returned by filter operations.

/// Outcome of a successful insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertStatus {
    /// Inserted within the configured capacity.
    Inserted,
    /// Inserted, but more items than `capacity` are now in the filter,
    /// so the false-positive rate is above its target.
    OverCapacity,
}

impl InsertStatus {
    /// Returns true if the filter has exceeded its planned capacity.
    pub fn is_over_capacity(self) -> bool {
        self == InsertStatus::OverCapacity
    }
}

/// Where a filter is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterState {
    /// Buffers allocated and zeroed or populated; safe to query.
    Ready,
    /// Lazily reset: buffers still hold old bits until the next insert clears them.
    Stale,
    /// No buffers held.
    Released,
}
