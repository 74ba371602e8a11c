//! Hash map whose buckets are runs of one shared [`List`].
//!
//! All entries live in a single ring list. Entries that fall into the same
//! bucket (`hash % bucket_count`) are adjacent in that list, and the bucket
//! index records only the first node of each run. A lookup jumps to the
//! run's start and walks forward until the stored hash maps to a different
//! bucket, so it never visits another bucket's entries.
//!
//! Each node caches its key's full hash, which makes a rehash a pure
//! relinking pass: no node is reallocated and the hasher is not called.

use std::borrow::Borrow;
use std::collections::hash_map::RandomState;
use std::fmt;
use std::hash::{BuildHasher, Hash};
use std::iter::FusedIterator;
use std::ops::Index;

use coffer_core::{handle_alloc_error, AccessError, AllocError, Global, RawAlloc};

use crate::config::{validate_load_factor, MapConfig};
use crate::error::ConfigError;
use crate::iter::{Iter as ListIter, IterMut as ListIterMut};
use crate::list::List;
use crate::node::{Node, NodePtr};

#[derive(Clone)]
struct Entry<K, V> {
    hash: u64,
    key: K,
    value: V,
}

type EntryPtr<K, V> = NodePtr<Entry<K, V>>;

/// # Safety
///
/// `node` must be a live value node, valid and unaliased by `&mut` for `'a`.
unsafe fn entry<'a, K, V>(node: EntryPtr<K, V>) -> &'a Entry<K, V> {
    // SAFETY: caller contract.
    match unsafe { Node::value(node) } {
        Some(entry) => entry,
        None => unreachable!("bucket index points at the sentinel"),
    }
}

/// # Safety
///
/// `node` must be a live value node, exclusively borrowed for `'a`.
unsafe fn entry_mut<'a, K, V>(node: EntryPtr<K, V>) -> &'a mut Entry<K, V> {
    // SAFETY: caller contract.
    match unsafe { Node::value_mut(node) } {
        Some(entry) => entry,
        None => unreachable!("bucket index points at the sentinel"),
    }
}

/// A hash map with unique keys, separate chaining realised as list runs.
///
/// Inserting a key that is already present keeps the existing value and
/// reports `false`. Growth happens before an insertion would push the
/// load factor past [`max_load_factor`](Self::max_load_factor): the bucket
/// count becomes `(2 * bucket_count + 1) / max_load_factor + 1`.
///
/// Entry nodes come from the allocator `A`; the bucket index itself is a
/// plain `Vec`.
pub struct UnorderedMap<K, V, S = RandomState, A: RawAlloc = Global> {
    entries: List<Entry<K, V>, A>,
    /// First node of each bucket's run, `None` for an empty bucket.
    buckets: Vec<Option<EntryPtr<K, V>>>,
    hasher: S,
    max_load_factor: f32,
}

// SAFETY: the bucket index only points into `entries`, which the map owns.
unsafe impl<K: Send, V: Send, S: Send, A: RawAlloc + Send> Send for UnorderedMap<K, V, S, A> {}

// SAFETY: shared access only reads entries, the hasher and the allocator.
unsafe impl<K: Sync, V: Sync, S: Sync, A: RawAlloc + Sync> Sync for UnorderedMap<K, V, S, A> {}

impl<K, V> UnorderedMap<K, V> {
    /// An empty map with default config and a random hasher.
    pub fn new() -> Self {
        Self::with_hasher_in(RandomState::new(), Global)
    }

    /// An empty map configured by `config`.
    pub fn with_config(config: MapConfig) -> Result<Self, ConfigError> {
        Self::with_config_in(config, RandomState::new(), Global)
    }
}

impl<K, V> Default for UnorderedMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S, A: RawAlloc> UnorderedMap<K, V, S, A> {
    /// An empty map using `hasher` and allocating nodes through `alloc`.
    pub fn with_hasher_in(hasher: S, alloc: A) -> Self {
        let config = MapConfig::default();
        Self {
            entries: List::new_in(alloc),
            buckets: vec![None; config.initial_buckets],
            hasher,
            max_load_factor: config.max_load_factor,
        }
    }

    /// An empty map from a validated `config`.
    pub fn with_config_in(config: MapConfig, hasher: S, alloc: A) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            entries: List::new_in(alloc),
            buckets: vec![None; config.initial_buckets],
            hasher,
            max_load_factor: config.max_load_factor,
        })
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of buckets in the index.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Current `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.len() as f32 / self.bucket_count() as f32
    }

    /// Threshold the load factor may not exceed after an insertion.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Change the threshold. Takes effect at the next insertion.
    pub fn set_max_load_factor(&mut self, value: f32) -> Result<(), ConfigError> {
        validate_load_factor(value)?;
        self.max_load_factor = value;
        Ok(())
    }

    /// The allocator entry nodes are drawn from.
    pub fn allocator(&self) -> &A {
        self.entries.allocator()
    }

    /// The map's hasher.
    pub fn hasher(&self) -> &S {
        &self.hasher
    }

    /// Remove every entry. The bucket count is kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.buckets.fill(None);
    }

    /// Iterate over `(key, value)` pairs in list order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    /// Iterate over `(key, value)` pairs with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }

    /// Iterate over keys.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    /// Iterate over values.
    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }

    fn bucket_of(&self, hash: u64) -> usize {
        (hash % self.buckets.len() as u64) as usize
    }

    /// Where a new entry with `hash` belongs: just after its bucket's run,
    /// or at the list front when the bucket is empty (`true`).
    fn insertion_point(&self, hash: u64) -> (EntryPtr<K, V>, bool) {
        let bucket = self.bucket_of(hash);
        let Some(mut node) = self.buckets[bucket] else {
            return (self.entries.first(), true);
        };
        let end = self.entries.end();
        // SAFETY: every node before `end` is a live value node.
        while node != end && self.bucket_of(unsafe { entry(node) }.hash) == bucket {
            node = unsafe { Node::next(node) };
        }
        (node, false)
    }

    /// Rebuild the index with `bucket_count` buckets by relinking every
    /// node into its new run.
    fn rehash_to(&mut self, bucket_count: usize) {
        let old = self.buckets.len();
        self.buckets = vec![None; bucket_count];
        for node in self.entries.detach_ring() {
            // SAFETY: `node` is a detached value node; the ring it is relinked
            // into holds only nodes already placed.
            unsafe {
                let hash = entry(node).hash;
                let (pos, opens) = self.insertion_point(hash);
                Node::link_before(node, pos);
                if opens {
                    let bucket = self.bucket_of(hash);
                    self.buckets[bucket] = Some(node);
                }
            }
        }
        tracing::debug!(
            old_buckets = old,
            new_buckets = bucket_count,
            len = self.len(),
            "map rehashed"
        );
    }

    /// Ensure `count` entries fit without exceeding the load factor
    /// threshold. Grows to `count / max_load_factor + 1` buckets if needed.
    pub fn reserve(&mut self, count: usize) {
        // `as` saturates, so an oversized quotient clamps to `usize::MAX`.
        let needed = (load_quotient(count, self.max_load_factor) as usize).saturating_add(1);
        if needed > self.buckets.len() {
            self.rehash_to(needed);
        }
    }

    /// Rebuild the index with at least `bucket_count` buckets, and at least
    /// enough for the current entries under the load factor threshold.
    pub fn rehash(&mut self, bucket_count: usize) {
        let minimum = load_quotient(self.len(), self.max_load_factor).ceil() as usize;
        let target = bucket_count.max(minimum).max(1);
        if target != self.buckets.len() {
            self.rehash_to(target);
        }
    }

    fn grow_for_one_more(&mut self) {
        let prospective = (self.len() + 1) as f32 / self.buckets.len() as f32;
        if prospective > self.max_load_factor {
            self.reserve(2 * self.buckets.len() + 1);
        }
    }
}

/// Buckets that hold `count` entries exactly at `max_load_factor`.
fn load_quotient(count: usize, max_load_factor: f32) -> f64 {
    count as f64 / f64::from(max_load_factor)
}

impl<K, V, S, A> UnorderedMap<K, V, S, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    A: RawAlloc,
{
    fn hash_of<Q: Hash + ?Sized>(&self, key: &Q) -> u64 {
        self.hasher.hash_one(key)
    }

    /// Walk `key`'s bucket run, stopping at the first node of another
    /// bucket.
    fn find_node<Q>(&self, hash: u64, key: &Q) -> Option<EntryPtr<K, V>>
    where
        K: Borrow<Q>,
        Q: Eq + ?Sized,
    {
        let bucket = self.bucket_of(hash);
        let end = self.entries.end();
        let mut node = self.buckets[bucket]?;
        while node != end {
            // SAFETY: `node` is a live value node of `entries`.
            let e = unsafe { entry(node) };
            if self.bucket_of(e.hash) != bucket {
                break;
            }
            if e.hash == hash && e.key.borrow() == key {
                return Some(node);
            }
            // SAFETY: as above.
            node = unsafe { Node::next(node) };
        }
        None
    }

    /// Index of the bucket `key` falls into.
    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: Hash + ?Sized,
    {
        self.bucket_of(self.hash_of(key))
    }

    /// The stored key and value for `key`.
    pub fn find<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let node = self.find_node(self.hash_of(key), key)?;
        // SAFETY: found nodes are live for as long as `self` is borrowed.
        let e = unsafe { entry(node) };
        Some((&e.key, &e.value))
    }

    /// The value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).map(|(_, v)| v)
    }

    /// The value for `key`, mutably.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let node = self.find_node(self.hash_of(key), key)?;
        // SAFETY: `&mut self` makes the access exclusive.
        Some(&mut unsafe { entry_mut(node) }.value)
    }

    /// Whether `key` is present.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.find(key).is_some()
    }

    /// Checked lookup.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, AccessError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(AccessError::KeyNotFound)
    }

    /// Checked mutable lookup.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, AccessError>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(AccessError::KeyNotFound)
    }

    /// Insert `value` under `key` unless the key is present.
    ///
    /// Returns the stored value and whether an insertion took place; an
    /// existing value is left untouched and `value` is dropped.
    ///
    /// # Panics
    ///
    /// Panics if the entry node cannot be allocated.
    pub fn insert(&mut self, key: K, value: V) -> (&mut V, bool) {
        self.insert_with(key, || value)
    }

    /// [`insert`](Self::insert), reporting allocation failure.
    pub fn try_insert(&mut self, key: K, value: V) -> Result<(&mut V, bool), AllocError> {
        self.try_insert_with(key, || value)
    }

    /// Insert a value built by `f` unless `key` is present. `f` runs only
    /// if an entry is actually created, after its node is allocated.
    ///
    /// # Panics
    ///
    /// Panics if the entry node cannot be allocated.
    pub fn insert_with<F>(&mut self, key: K, f: F) -> (&mut V, bool)
    where
        F: FnOnce() -> V,
    {
        match self.try_insert_with(key, f) {
            Ok(inserted) => inserted,
            Err(err) => handle_alloc_error(err),
        }
    }

    /// [`insert_with`](Self::insert_with), reporting allocation failure.
    ///
    /// If `f` panics, the node is released and the map is unchanged
    /// (apart from a growth step that may already have happened).
    pub fn try_insert_with<F>(&mut self, key: K, f: F) -> Result<(&mut V, bool), AllocError>
    where
        F: FnOnce() -> V,
    {
        let hash = self.hash_of(&key);
        if let Some(node) = self.find_node(hash, &key) {
            // SAFETY: `&mut self` makes the access exclusive.
            return Ok((&mut unsafe { entry_mut(node) }.value, false));
        }

        self.grow_for_one_more();
        let (pos, opens) = self.insertion_point(hash);
        let node = self
            .entries
            .try_insert_with(pos, || Entry { hash, key, value: f() })?;
        if opens {
            let bucket = self.bucket_of(hash);
            self.buckets[bucket] = Some(node);
        }
        // SAFETY: the node was just linked and `&mut self` is held.
        Ok((&mut unsafe { entry_mut(node) }.value, true))
    }

    /// The value for `key`, inserting `V::default()` first if absent.
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.insert_with(key, V::default).0
    }

    /// Remove `key`, returning its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Remove `key`, returning the stored key and value.
    ///
    /// If the removed node started its bucket's run, the bucket start moves
    /// to the following node when that node is in the same bucket; otherwise
    /// the bucket becomes empty.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = self.hash_of(key);
        let node = self.find_node(hash, key)?;
        let bucket = self.bucket_of(hash);

        if self.buckets[bucket] == Some(node) {
            // SAFETY: `node` is live, so its successor is a live ring member.
            let next = unsafe { Node::next(node) };
            let continues = next != self.entries.end()
                // SAFETY: `next` is a value node, checked just above.
                && self.bucket_of(unsafe { entry(next) }.hash) == bucket;
            self.buckets[bucket] = continues.then_some(next);
        }

        // SAFETY: `node` is a value node of `entries`.
        let Entry { key, value, .. } = unsafe { self.entries.remove_node(node) };
        Some((key, value))
    }
}

impl<K, V, S, A> Clone for UnorderedMap<K, V, S, A>
where
    K: Clone,
    V: Clone,
    S: Clone,
    A: RawAlloc,
{
    /// Copies the entry list in order, then rebuilds the index from it.
    fn clone(&self) -> Self {
        let entries = self.entries.clone();
        let mut out = Self {
            entries,
            buckets: vec![None; self.buckets.len()],
            hasher: self.hasher.clone(),
            max_load_factor: self.max_load_factor,
        };
        let end = out.entries.end();
        let mut node = out.entries.first();
        while node != end {
            // SAFETY: walking the live value nodes of `out.entries`.
            let bucket = out.bucket_of(unsafe { entry(node) }.hash);
            out.buckets[bucket].get_or_insert(node);
            node = unsafe { Node::next(node) };
        }
        out
    }
}

impl<K, Q, V, S, A> Index<&Q> for UnorderedMap<K, V, S, A>
where
    K: Hash + Eq + Borrow<Q>,
    Q: Hash + Eq + ?Sized,
    S: BuildHasher,
    A: RawAlloc,
{
    type Output = V;

    fn index(&self, key: &Q) -> &V {
        match self.get(key) {
            Some(value) => value,
            None => panic!("{}", AccessError::KeyNotFound),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug, S, A: RawAlloc> fmt::Debug for UnorderedMap<K, V, S, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S, A> Extend<(K, V)> for UnorderedMap<K, V, S, A>
where
    K: Hash + Eq,
    S: BuildHasher,
    A: RawAlloc,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S, A> FromIterator<(K, V)> for UnorderedMap<K, V, S, A>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
    A: RawAlloc + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::with_hasher_in(S::default(), A::default());
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S, A: RawAlloc> IntoIterator for &'a UnorderedMap<K, V, S, A> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Iter<'a, K, V> {
        self.iter()
    }
}

impl<'a, K, V, S, A: RawAlloc> IntoIterator for &'a mut UnorderedMap<K, V, S, A> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> IterMut<'a, K, V> {
        self.iter_mut()
    }
}

/// Entries in list order, bucket by bucket.
pub struct Iter<'a, K, V> {
    inner: ListIter<'a, Entry<K, V>>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for Iter<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.clone()).finish()
    }
}

/// Entries in list order with mutable values.
pub struct IterMut<'a, K, V> {
    inner: ListIterMut<'a, Entry<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|e| (&e.key, &mut e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

impl<K, V> fmt::Debug for IterMut<'_, K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IterMut").field("len", &self.inner.len()).finish()
    }
}
