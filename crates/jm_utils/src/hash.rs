//! Hash states and container aliases, re-exports *hashbrown* and *foldhash*.
//!
//! `FixedHashState` is based on `foldhash` with a fixed seed, so results only
//! depend on the input. `NoOpHashState` passes a written `u64` straight
//! through, which is all a [`TypeId`](core::any::TypeId) key needs.

use core::hash::{BuildHasher, Hasher};

use foldhash::fast::{FixedState, FoldHasher};

// -----------------------------------------------------------------------------
// FixedHashState

const FIXED_HASH_STATE: FixedState = FixedState::with_seed(0x6A09E667F3BCC908);

/// Hasher produced by [`FixedHashState`].
pub type FixedHasher = FoldHasher<'static>;

/// Hash state with a fixed seed.
///
/// # Examples
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use jm_utils::hash::FixedHashState;
///
/// let mut a = FixedHashState.build_hasher();
/// let mut b = FixedHashState.build_hasher();
/// "name".hash(&mut a);
/// "name".hash(&mut b);
/// assert_eq!(a.finish(), b.finish());
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct FixedHashState;

impl BuildHasher for FixedHashState {
    type Hasher = FixedHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        FIXED_HASH_STATE.build_hasher()
    }
}

// -----------------------------------------------------------------------------
// NoOpHashState

/// Hasher that keeps the last written `u64` as its hash.
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHasher {
    hash: u64,
}

impl Hasher for NoOpHasher {
    #[inline]
    fn finish(&self) -> u64 {
        self.hash
    }

    fn write(&mut self, bytes: &[u8]) {
        for byte in bytes.iter().rev() {
            self.hash = self.hash.rotate_left(8).wrapping_add(*byte as u64);
        }
    }

    #[inline]
    fn write_u64(&mut self, i: u64) {
        self.hash = i;
    }
}

/// Hash state for keys that are already well distributed, such as `TypeId`.
///
/// ```
/// use core::hash::{BuildHasher, Hash, Hasher};
/// use jm_utils::hash::NoOpHashState;
///
/// let mut hasher = NoOpHashState.build_hasher();
/// 7_u64.hash(&mut hasher);
/// assert_eq!(hasher.finish(), 7);
/// ```
#[derive(Copy, Clone, Default, Debug)]
pub struct NoOpHashState;

impl BuildHasher for NoOpHashState {
    type Hasher = NoOpHasher;

    #[inline(always)]
    fn build_hasher(&self) -> Self::Hasher {
        NoOpHasher { hash: 0 }
    }
}

// -----------------------------------------------------------------------------
// Aliases

/// A [`hashbrown::HashMap`] using [`FixedHashState`] by default.
pub type HashMap<K, V, S = FixedHashState> = hashbrown::HashMap<K, V, S>;

/// A [`hashbrown::HashSet`] using [`FixedHashState`] by default.
pub type HashSet<T, S = FixedHashState> = hashbrown::HashSet<T, S>;

pub use foldhash;
pub use hashbrown;
