//! Debug assertion macros for the shared buffer's invariants.
//!
//! These are only active in debug builds (`#[cfg(debug_assertions)]` via the
//! standard `debug_assert!` family), so there is zero overhead in release
//! builds. Each macro documents the invariant it checks and where it's used.

/// INV-SBUF-01: `closed` only ever transitions `false -> true`, never back.
macro_rules! debug_assert_closed_monotonic {
    ($old:expr, $new:expr) => {
        debug_assert!(
            !$old || $new,
            "INV-SBUF-01 violated: closed flipped from true back to false"
        )
    };
}

/// INV-SBUF-02: a cursor is only repointed to a fresh node when it was empty.
/// A non-empty cursor must advance only via its own `successor` link.
macro_rules! debug_assert_cursor_was_empty {
    ($name:literal, $cursor:expr) => {
        debug_assert!(
            $cursor.is_none(),
            "INV-SBUF-02 violated: {} cursor repointed on insert while non-empty",
            $name
        )
    };
}

/// INV-SBUF-03: a node is only reclaimed once both consumers have observed it.
macro_rules! debug_assert_reclaim_requires_both_seen {
    ($seen_data:expr, $seen_storage:expr) => {
        debug_assert!(
            $seen_data && $seen_storage,
            "INV-SBUF-03 violated: reclaiming a node before both consumers observed it"
        )
    };
}

/// INV-SBUF-04: the buffer is torn down only once every node has been reclaimed
/// and both cursors have caught up.
macro_rules! debug_assert_destroy_empty {
    ($head:expr, $cur_data:expr, $cur_storage:expr) => {
        debug_assert!(
            $head.is_none() && $cur_data.is_none() && $cur_storage.is_none(),
            "INV-SBUF-04 violated: sbuf torn down while nodes were still live"
        )
    };
}

/// INV-SBUF-05: once closed, `insert` leaves the node arena untouched.
macro_rules! debug_assert_no_mutation_when_closed {
    ($before_len:expr, $after_len:expr) => {
        debug_assert_eq!(
            $before_len, $after_len,
            "INV-SBUF-05 violated: insert mutated buffer state after close"
        )
    };
}

pub(crate) use debug_assert_closed_monotonic;
pub(crate) use debug_assert_cursor_was_empty;
pub(crate) use debug_assert_destroy_empty;
pub(crate) use debug_assert_no_mutation_when_closed;
pub(crate) use debug_assert_reclaim_requires_both_seen;
