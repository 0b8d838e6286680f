//! # Configuration Constants
//!
//! Field widths, stuck capacities, pool sentinels and the step budget of a
//! stucktree. Constants that constrain each other sit next to each other.
//!
//! ## Dependency Graph
//!
//! ```text
//! MAX_FIELD_WIDTH (64 bits)
//!       │
//!       ├─> MAX_KEY_BITS (must be <)
//!       │     Leaf splits compute the separator as the floor average of two
//!       │     keys. The sum is held in a field one bit wider than a key, so
//!       │     a key must leave one spare bit below MAX_FIELD_WIDTH.
//!       │
//!       └─> every field width is in 1..=MAX_FIELD_WIDTH
//!
//! MIN_STUCK_CAPACITY (4)
//!       │
//!       └─> DEFAULT_STUCK_CAPACITY (must be >= and even)
//!             A full branch holds capacity-1 keys. Splitting it around the
//!             median must leave at least one key on each side.
//!
//! ROOT_NODE (0) == FREE_CHAIN_END (0)
//!       The root slot is never on the free chain, so its index doubles as
//!       the end-of-chain sentinel.
//! ```
//!
//! ## Critical Invariants
//!
//! These invariants are enforced by compile-time assertions:
//!
//! 1. `MAX_KEY_BITS < MAX_FIELD_WIDTH`
//! 2. `DEFAULT_STUCK_CAPACITY >= MIN_STUCK_CAPACITY` and even
//! 3. `FREE_CHAIN_END == ROOT_NODE`
//! 4. the default tree satisfies `bits_per_data > log2(node_count)`, that is
//!    `bits_per_data >= bits_for(node_count)`
//!
//! ## Step Budget
//!
//! The tape interpreter has no unbounded loops: every run is bounded by a
//! step budget. `DEFAULT_MAX_STEPS` must be large enough for the deepest
//! `put` on the default tree, which copies whole node slots in and out of the
//! pool several times per level.
//!
//! Pool setup is the exception. It writes every slot once, so its budget is
//! raised to its own length when the pool outgrows `DEFAULT_MAX_STEPS`.

// ============================================================================
// FIELD CONSTANTS
// ============================================================================

/// Widest field the store can hold. Values are kept in a `u64`.
pub const MAX_FIELD_WIDTH: u32 = 64;

/// Widest key a tree accepts.
pub const MAX_KEY_BITS: u32 = MAX_FIELD_WIDTH - 1;

const _: () = assert!(
    MAX_KEY_BITS < MAX_FIELD_WIDTH,
    "MAX_KEY_BITS must leave a spare bit for separator averaging"
);

// ============================================================================
// TAPE CONSTANTS
// ============================================================================

/// Default instruction budget for one run of a program.
pub const DEFAULT_MAX_STEPS: u64 = 250_000;

// ============================================================================
// STUCK CONSTANTS
// ============================================================================

/// Smallest capacity a stuck may have.
pub const MIN_STUCK_CAPACITY: usize = 4;

// ============================================================================
// BTREE CONSTANTS
// ============================================================================

/// Index of the permanent root slot.
pub const ROOT_NODE: u64 = 0;

/// Value of `freeNext` marking the end of the free chain.
pub const FREE_CHAIN_END: u64 = 0;

/// Default number of node slots in a pool.
pub const DEFAULT_NODE_COUNT: usize = 16;

/// Default number of entries per node slot.
pub const DEFAULT_STUCK_CAPACITY: usize = 4;

/// Default key width in bits.
pub const DEFAULT_BITS_PER_KEY: u32 = 8;

/// Default data width in bits.
pub const DEFAULT_BITS_PER_DATA: u32 = 8;

const _: () = assert!(
    FREE_CHAIN_END == ROOT_NODE,
    "the root slot doubles as the free chain terminator"
);

const _: () = assert!(
    DEFAULT_STUCK_CAPACITY >= MIN_STUCK_CAPACITY && DEFAULT_STUCK_CAPACITY % 2 == 0,
    "DEFAULT_STUCK_CAPACITY must be even and at least MIN_STUCK_CAPACITY"
);

const _: () = assert!(
    DEFAULT_BITS_PER_KEY <= MAX_KEY_BITS,
    "DEFAULT_BITS_PER_KEY exceeds MAX_KEY_BITS"
);

const _: () = assert!(
    DEFAULT_BITS_PER_DATA >= bits_for(DEFAULT_NODE_COUNT as u64),
    "DEFAULT_BITS_PER_DATA cannot address every node slot"
);

/// Number of bits needed to hold any value in `0..=n`.
pub const fn bits_for(n: u64) -> u32 {
    let bits = u64::BITS - n.leading_zeros();
    if bits == 0 {
        1
    } else {
        bits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bits_for_covers_small_values() {
        assert_eq!(bits_for(0), 1);
        assert_eq!(bits_for(1), 1);
        assert_eq!(bits_for(4), 3);
        assert_eq!(bits_for(16), 5);
        assert_eq!(bits_for(u64::MAX), 64);
    }
}
