//! Keyed stock counters.
//!
//! A [`Ledger`] holds one non-negative count for every key of a closed
//! catalog (coins or products). Every key is always present, and iteration
//! follows the catalog's declaration order.

use std::fmt;
use std::marker::PhantomData;

use crate::Amount;
use crate::model::Coin;

/// A closed, ordered key set a [`Ledger`] can count.
pub trait LedgerKey: Copy + Eq + fmt::Debug + 'static {
    /// Every key, in declaration order.
    const ALL: &'static [Self];

    /// Dense position of the key in [`LedgerKey::ALL`].
    fn index(self) -> usize;
}

#[derive(Clone, PartialEq, Eq)]
pub struct Ledger<K: LedgerKey> {
    counts: Vec<u32>,
    _key: PhantomData<K>,
}

impl<K: LedgerKey> Ledger<K> {
    pub fn new() -> Self {
        Self::filled(0)
    }

    /// A ledger holding `level` of every key.
    pub fn filled(level: u32) -> Self {
        Self {
            counts: vec![level; K::ALL.len()],
            _key: PhantomData,
        }
    }

    pub fn set_all(&mut self, level: u32) {
        self.counts.fill(level);
    }

    pub fn set(&mut self, key: K, value: u32) {
        self.counts[key.index()] = value;
    }

    pub fn get(&self, key: K) -> u32 {
        self.counts[key.index()]
    }

    pub fn increment(&mut self, key: K) {
        self.add(key, 1);
    }

    /// Callers must check the key is in stock first.
    pub fn decrement(&mut self, key: K) {
        self.remove(key, 1);
    }

    /// Callers must check the count has room for `n` more.
    pub fn add(&mut self, key: K, n: u32) {
        let count = &mut self.counts[key.index()];
        debug_assert!(
            count.checked_add(n).is_some(),
            "adding {n} {key:?} to a count of {count}"
        );
        *count = count.saturating_add(n);
    }

    /// Callers must check at least `n` are held.
    pub fn remove(&mut self, key: K, n: u32) {
        let count = &mut self.counts[key.index()];
        debug_assert!(*count >= n, "removing {n} {key:?} from a count of {count}");
        *count = count.saturating_sub(n);
    }

    /// `(key, count)` pairs in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (K, u32)> + '_ {
        K::ALL.iter().map(|&key| (key, self.get(key)))
    }

    /// True when every count is zero.
    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn total_count(&self) -> u64 {
        self.counts.iter().map(|&c| u64::from(c)).sum()
    }

    /// Move every count from `other` into this ledger, leaving `other` empty.
    pub fn absorb(&mut self, other: &mut Ledger<K>) {
        for (count, moved) in self.counts.iter_mut().zip(other.counts.iter_mut()) {
            debug_assert!(count.checked_add(*moved).is_some(), "absorbing past u32::MAX");
            *count = count.saturating_add(*moved);
            *moved = 0;
        }
    }

    /// Hand out every held item, one entry per unit in declaration order, and
    /// zero the ledger.
    pub fn drain(&mut self) -> Vec<K> {
        let items = self
            .iter()
            .flat_map(|(key, count)| std::iter::repeat_n(key, count as usize))
            .collect();
        self.set_all(0);
        items
    }
}

impl Ledger<Coin> {
    /// Sum of `count × face value` over every coin.
    pub fn total_value(&self) -> Amount {
        self.iter().map(|(coin, count)| coin.face_value() * count).sum()
    }
}

impl<K: LedgerKey> Default for Ledger<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: LedgerKey> fmt::Debug for Ledger<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
