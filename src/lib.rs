#![doc = include_str!("../README.md")]

#![no_std]

#![warn(
    anonymous_parameters,
    missing_copy_implementations,
    missing_debug_implementations,
    nonstandard_style,
    rust_2018_idioms,
    single_use_lifetimes,
    trivial_casts,
    trivial_numeric_casts,
    unreachable_pub,
    unused_extern_crates,
    unused_qualifications,
    variant_size_differences
)]

extern crate alloc;

#[cfg(test)]
extern crate std;

use core::{fmt, mem};
use core::hash::BuildHasher;
use core::iter::FusedIterator;
use core::ops::Index;

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use hashbrown::{DefaultHashBuilder, HashMap};

mod key;

#[cfg(test)]
mod proptests;

pub use key::Key;

/// A storage slot for one distinct folded key.
///
/// `value` doubles as the tombstone flag: a removed entry keeps its slot
/// (and its mapping in the hash index) with `value = None` until the map is
/// compacted.
#[derive(Debug)]
struct Slot<V> {
    folded: String,
    /// Casing of the key used by the write that produced `value`.
    /// `None` for keyless appends.
    original: Option<String>,
    value: Option<V>,

    // doubly linked list pointers (indexes into the slot vec)
    prev: Option<usize>,
    next: Option<usize>,
}

impl<V> Clone for Slot<V>
where
    V: Clone
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            prev: self.prev,
            next: self.next,
            folded: self.folded.clone(),
            original: self.original.clone(),
            value: self.value.clone(),
        }
    }
}

impl<V> Slot<V> {
    #[inline(always)]
    fn new(folded: String, original: Option<String>, value: V) -> Self {
        let value = Some(value);
        Self { folded, original, value, prev: None, next: None }
    }

    /// The key reported on iteration: the preserved casing, or the folded
    /// key itself for appended entries (where it is the decimal index).
    #[inline(always)]
    fn reported_key(&self) -> &str {
        self.original.as_deref().unwrap_or(&self.folded)
    }
}

/// An insertion-order-preserving map with case-insensitive string keys.
///
/// Keys that differ only by letter case address the same entry. Each entry
/// remembers the exact casing used by the most recent write and keeps the
/// position of its first write; overwriting never moves an entry, while
/// removing and re-adding places it at the end like a fresh insert.
///
/// Lookup misses are not errors: `get` returns `None` and `remove` of an
/// absent key is a no-op.
pub struct CaseFoldMap<V, S = DefaultHashBuilder> {
    index_map: HashMap<String, usize, S>, // folded key -> index in slots
    slots: Vec<Slot<V>>, // all slots in first-write order

    // doubly linked list of live slots
    head: Option<usize>, // first live slot
    tail: Option<usize>, // last live slot

    live_count: usize,

    /// Next index handed out by [`append`](Self::append). Kept ahead of
    /// every integer-like key ever written so appends cannot collide with
    /// explicit integer keys.
    next_index: u64,
}

impl<V> CaseFoldMap<V, DefaultHashBuilder> {
    /// Creates an empty `CaseFoldMap`.
    ///
    /// The map is initially created with a capacity of 0, so it will not
    /// allocate until it is first inserted into.
    #[inline]
    pub fn new() -> Self {
        Self {
            index_map: HashMap::new(),
            head: None,
            tail: None,
            slots: Vec::new(),
            live_count: 0,
            next_index: 0,
        }
    }

    /// Creates an empty `CaseFoldMap` with the specified capacity.
    ///
    /// The map will be able to hold at least `capacity` entries without
    /// reallocating. If `capacity` is 0, the map will not allocate.
    #[inline]
    pub fn with_capacity(n: usize) -> Self {
        Self {
            head: None,
            tail: None,
            index_map: HashMap::with_capacity(n),
            slots: Vec::with_capacity(n),
            live_count: 0,
            next_index: 0,
        }
    }
}

impl<V, S> CaseFoldMap<V, S>
where
    S: BuildHasher,
{
    /// Creates an empty `CaseFoldMap` using the provided hasher `h`.
    #[inline]
    pub fn with_hasher(h: S) -> Self {
        Self::with_capacity_and_hasher(0, h)
    }

    /// Creates an empty `CaseFoldMap` with the specified initial capacity
    /// `n` and hasher `h`.
    #[inline]
    pub fn with_capacity_and_hasher(n: usize, h: S) -> Self {
        Self {
            index_map: HashMap::with_capacity_and_hasher(n, h),
            slots: Vec::with_capacity(n),
            live_count: 0,
            head: None,
            tail: None,
            next_index: 0,
        }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// The key is folded to lowercase for identity, so any casing of an
    /// existing key overwrites that entry. An overwrite updates the value
    /// and the remembered casing in place without moving the entry; a new
    /// key goes to the end of the iteration order.
    ///
    /// Integer keys coerce through their decimal form (see [`Key`]) and
    /// advance the [`append`](Self::append) counter past themselves.
    ///
    /// Returns the displaced value, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use casefold_map::CaseFoldMap;
    ///
    /// let mut map = CaseFoldMap::new();
    /// map.insert("Foo", "Bar");
    /// assert_eq!(map.get("fOo"), Some(&"Bar"));
    /// assert_eq!(map.insert("FOO", "Baz"), Some("Bar"));
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn insert<K>(&mut self, key: &K, value: V) -> Option<V>
    where
        K: Key + ?Sized,
    {
        let folded = key.fold();
        if let Some(n) = key::auto_index_value(&folded) {
            self.next_index = self.next_index.max(n.saturating_add(1));
        }
        self.insert_folded(folded, Some(key.original()), value)
    }

    /// Appends a value without an explicit key.
    ///
    /// The entry is stored under the next free integer index, as a native
    /// array would assign it, and reports that index as its key on
    /// iteration. Appends never collide with existing entries: the index
    /// counter stays ahead of every integer-like key ever inserted.
    ///
    /// A key at `u64::MAX` pins the counter and exhausts the index space;
    /// appends past that point are dropped rather than overwriting the
    /// pinned entry, the way a native array refuses to append once its
    /// largest index is taken.
    ///
    /// # Examples
    ///
    /// ```
    /// use casefold_map::CaseFoldMap;
    ///
    /// let mut map = CaseFoldMap::new();
    /// map.append("Foo");
    /// map.append("Bar");
    /// assert_eq!(map.get("0"), Some(&"Foo"));
    /// assert_eq!(map.get(&1), Some(&"Bar"));
    /// assert_eq!(map.get("2"), None);
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn append(&mut self, value: V) {
        let folded = self.next_index.to_string();
        // the counter can only point at an occupied slot once it has
        // saturated at u64::MAX; the index space is exhausted then
        if self.index_map.contains_key(&folded) {
            return;
        }
        self.next_index = self.next_index.saturating_add(1);
        self.insert_folded(folded, None, value);
    }

    fn insert_folded(
        &mut self,
        folded: String,
        original: Option<String>,
        value: V,
    ) -> Option<V> {
        if let Some(&idx) = self.index_map.get(&folded) {
            let slot = &mut self.slots[idx];
            let old = slot.value.replace(value);
            slot.original = original;

            if old.is_none() {
                // tombstoned slot: the entry was removed earlier, so
                // re-adding it re-enters the order at the end
                self.live_count += 1;
                self.link_tail(idx);
            }
            return old;
        }

        // append to the end
        let idx = self.slots.len();
        self.index_map.insert(folded.clone(), idx);
        self.slots.push(Slot::new(folded, original, value));
        self.link_tail(idx);
        self.live_count += 1;
        None
    }

    /// Removes a key from the map, returning its value if it was present.
    ///
    /// Removal of an absent key is a silent no-op. The slot is tombstoned
    /// rather than removed from internal storage; see
    /// [`shrink_to_fit_live`](Self::shrink_to_fit_live).
    ///
    /// # Examples
    ///
    /// ```
    /// use casefold_map::CaseFoldMap;
    ///
    /// let mut map = CaseFoldMap::new();
    /// map.insert("Foo", "Bar");
    /// assert_eq!(map.remove("FOO"), Some("Bar"));
    /// assert_eq!(map.get("Foo"), None);
    /// assert_eq!(map.remove("Foo"), None);
    /// ```
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn remove<K>(&mut self, key: &K) -> Option<V>
    where
        K: Key + ?Sized,
    {
        let idx = *self.index_map.get(&key.fold())?;

        let value = self.slots[idx].value.take()?;

        self.unlink(idx);
        self.live_count -= 1;

        Some(value)
    }

    /// Returns a reference to the value stored under any casing of `key`.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get<K>(&self, key: &K) -> Option<&V>
    where
        K: Key + ?Sized,
    {
        let idx = *self.index_map.get(&key.fold())?;
        self.slots[idx].value.as_ref()
    }

    /// Returns a mutable reference to the value stored under any casing
    /// of `key`.
    #[cfg_attr(feature = "inline-more", inline)]
    pub fn get_mut<K>(&mut self, key: &K) -> Option<&mut V>
    where
        K: Key + ?Sized,
    {
        let idx = *self.index_map.get(&key.fold())?;
        self.slots[idx].value.as_mut()
    }

    /// Returns `true` if the map contains a value for any casing of `key`.
    #[inline]
    pub fn contains_key<K>(&self, key: &K) -> bool
    where
        K: Key + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns the number of entries in the map.
    ///
    /// Distinct folded keys are counted, not write operations: writing the
    /// same key under four casings yields a length of 1.
    #[inline(always)]
    pub const fn len(&self) -> usize {
        self.live_count
    }

    /// Returns `true` if the map contains no entries.
    #[inline(always)]
    pub const fn is_empty(&self) -> bool {
        self.live_count == 0
    }

    /// Removes all entries and resets the append counter.
    #[inline]
    pub fn clear(&mut self) {
        self.index_map.clear();
        self.slots.clear();
        self.head = None;
        self.tail = None;
        self.live_count = 0;
        self.next_index = 0;
    }

    /// Compacts internal storage, dropping the tombstoned slots left
    /// behind by removals while preserving iteration order.
    ///
    /// # Examples
    ///
    /// ```
    /// use casefold_map::CaseFoldMap;
    ///
    /// let mut map = CaseFoldMap::new();
    /// map.insert("Foo", 1);
    /// map.insert("Bar", 2);
    /// map.insert("Baz", 3);
    /// map.remove("BAR");
    ///
    /// map.shrink_to_fit_live();
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get("baz"), Some(&3));
    ///
    /// let pairs: Vec<_> = map.iter().collect();
    /// assert_eq!(pairs, vec![("Foo", &1), ("Baz", &3)]);
    /// ```
    pub fn shrink_to_fit_live(&mut self) {
        if self.live_count == self.slots.len() {
            self.index_map.shrink_to_fit();
            self.slots.shrink_to_fit();
            return
        }

        let old_head = self.head;
        let mut old_slots = mem::take(&mut self.slots);

        let mut slots = Vec::with_capacity(self.live_count);

        self.index_map.clear();
        self.head = None;
        self.tail = None;

        let mut curr = old_head;
        while let Some(old_idx) = curr {
            let old = &mut old_slots[old_idx];
            curr = old.next;

            let value = match old.value.take() {
                Some(value) => value,
                None => continue,
            };

            let idx = slots.len();
            let folded = mem::take(&mut old.folded);

            // update the hash index
            self.index_map.insert(folded.clone(), idx);

            slots.push(Slot {
                folded,
                original: old.original.take(),
                value: Some(value),
                prev: self.tail,
                next: None,
            });

            if let Some(tail) = self.tail {
                slots[tail].next = Some(idx)
            } else {
                self.head = Some(idx)
            }

            self.tail = Some(idx);
        }

        self.slots = slots;
    }

    /// Reserves capacity for at least `additional` more entries.
    #[inline]
    pub fn reserve(&mut self, additional: usize) {
        self.index_map.reserve(additional);
        self.slots.reserve(additional);
    }

    /// Returns an iterator over the entries in order.
    ///
    /// Each entry reports the casing of its most recent write as the key,
    /// or its decimal index if it was appended without a key. The iterator
    /// implements `ExactSizeIterator` and `FusedIterator`; call `iter`
    /// again to restart traversal from the first entry.
    #[inline]
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            slots: &self.slots,
            curr: self.head,
            remaining: self.live_count,
        }
    }

    /// Returns an iterator over the reported keys in order.
    #[inline]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.iter().map(|(k, _)| k)
    }

    /// Returns an iterator over the values in order.
    #[inline]
    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }

    /// Returns the ordered reported-key to value pairs, for inspection
    /// and debug output.
    #[inline]
    pub fn to_ordered_pairs(&self) -> Vec<(&str, &V)> {
        self.iter().collect()
    }

    /// Removes a slot from the internal linked list.
    #[cfg_attr(feature = "inline-more", inline)]
    fn unlink(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];

        let prev = slot.prev;
        let next = slot.next;

        slot.prev = None;
        slot.next = None;

        if let Some(prev_idx) = prev {
            self.slots[prev_idx].next = next
        } else {
            // this was the head
            self.head = next
        }

        if let Some(next_idx) = next {
            self.slots[next_idx].prev = prev
        } else {
            // this was the tail
            self.tail = prev
        }
    }

    /// Adds a slot to the end of the internal linked list.
    #[cfg_attr(feature = "inline-more", inline)]
    fn link_tail(&mut self, idx: usize) {
        let slot = &mut self.slots[idx];
        slot.prev = self.tail;
        slot.next = None;

        if let Some(tail_idx) = self.tail {
            self.slots[tail_idx].next = Some(idx)
        } else {
            self.head = Some(idx)
        }

        self.tail = Some(idx)
    }
}

/// Interface of an ordered map with case-insensitive keys.
///
/// [`CaseFoldMap`] is the one concrete implementation; the trait exists so
/// hosts can abstract over the storage (for instance to wrap it behind
/// external synchronization) without committing to a type.
pub trait CaseInsensitiveMap<V> {
    /// Borrowing iterator over `(reported key, value)` pairs in order.
    type Iter<'a>: Iterator<Item = (&'a str, &'a V)>
    where
        Self: 'a,
        V: 'a;

    /// Inserts or overwrites the entry for any casing of `key`.
    fn insert<K: Key + ?Sized>(&mut self, key: &K, value: V) -> Option<V>;

    /// Appends a value under the next free integer index.
    fn append(&mut self, value: V);

    /// Looks up the entry for any casing of `key`; a miss is not an error.
    fn get<K: Key + ?Sized>(&self, key: &K) -> Option<&V>;

    /// Returns `true` if an entry exists for any casing of `key`.
    fn contains_key<K: Key + ?Sized>(&self, key: &K) -> bool;

    /// Removes the entry for any casing of `key`, if present.
    fn remove<K: Key + ?Sized>(&mut self, key: &K) -> Option<V>;

    /// Number of entries (distinct folded keys).
    fn len(&self) -> usize;

    /// Returns `true` if there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the entries in order.
    fn iter(&self) -> Self::Iter<'_>;
}

impl<V, S> CaseInsensitiveMap<V> for CaseFoldMap<V, S>
where
    S: BuildHasher,
{
    type Iter<'a>
        = Iter<'a, V>
    where
        Self: 'a,
        V: 'a;

    #[inline]
    fn insert<K: Key + ?Sized>(&mut self, key: &K, value: V) -> Option<V> {
        CaseFoldMap::insert(self, key, value)
    }

    #[inline]
    fn append(&mut self, value: V) {
        CaseFoldMap::append(self, value)
    }

    #[inline]
    fn get<K: Key + ?Sized>(&self, key: &K) -> Option<&V> {
        CaseFoldMap::get(self, key)
    }

    #[inline]
    fn contains_key<K: Key + ?Sized>(&self, key: &K) -> bool {
        CaseFoldMap::contains_key(self, key)
    }

    #[inline]
    fn remove<K: Key + ?Sized>(&mut self, key: &K) -> Option<V> {
        CaseFoldMap::remove(self, key)
    }

    #[inline]
    fn len(&self) -> usize {
        CaseFoldMap::len(self)
    }

    #[inline]
    fn iter(&self) -> Iter<'_, V> {
        CaseFoldMap::iter(self)
    }
}

/// Borrowing iterator over entries in order.
#[derive(Debug)]
pub struct Iter<'a, V> {
    slots: &'a Vec<Slot<V>>,
    curr: Option<usize>,
    remaining: usize,
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = (&'a str, &'a V);

    #[cfg_attr(feature = "inline-more", inline)]
    fn next(&mut self) -> Option<Self::Item> {
        let idx = self.curr?;
        let slot = &self.slots[idx];
        self.curr = slot.next;
        self.remaining = self.remaining.saturating_sub(1);
        slot.value.as_ref().map(|v| (slot.reported_key(), v))
    }

    #[inline(always)]
    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {
    #[inline(always)]
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<V> FusedIterator for Iter<'_, V> {}

impl<'a, V, S> IntoIterator for &'a CaseFoldMap<V, S>
where
    S: BuildHasher,
{
    type Item = (&'a str, &'a V);
    type IntoIter = Iter<'a, V>;

    #[inline]
    fn into_iter(self) -> Iter<'a, V> {
        self.iter()
    }
}

impl<K, V, S> FromIterator<(K, V)> for CaseFoldMap<V, S>
where
    K: Key,
    S: Default + BuildHasher,
{
    /// Seeds a map from ordered pairs, applied as repeated
    /// [`insert`](CaseFoldMap::insert) calls: later pairs whose keys fold
    /// the same overwrite earlier ones.
    #[cfg_attr(feature = "inline-more", inline)]
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let iter = iter.into_iter();
        let mut map = CaseFoldMap::with_capacity_and_hasher(
            iter.size_hint().0,
            S::default()
        );
        iter.for_each(|(k, v)| _ = map.insert(&k, v));
        map
    }
}

impl<K, V, S> Extend<(K, V)> for CaseFoldMap<V, S>
where
    K: Key,
    S: Default + BuildHasher,
{
    #[cfg_attr(feature = "inline-more", inline)]
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        let iter = iter.into_iter();
        let reserve = if self.is_empty() {
            iter.size_hint().0
        } else {
            (iter.size_hint().0 + 1) / 2
        };
        self.reserve(reserve);
        iter.for_each(move |(k, v)| _ = self.insert(&k, v));
    }
}

impl<V, S> Default for CaseFoldMap<V, S>
where
    S: Default + BuildHasher,
{
    #[inline]
    fn default() -> Self {
        Self::with_capacity_and_hasher(0, S::default())
    }
}

impl<V, S> Clone for CaseFoldMap<V, S>
where
    V: Clone,
    S: Clone,
{
    #[inline]
    fn clone(&self) -> Self {
        Self {
            head: self.head,
            tail: self.tail,
            index_map: self.index_map.clone(),
            slots: self.slots.clone(),
            live_count: self.live_count,
            next_index: self.next_index,
        }
    }
}

impl<V, S> PartialEq for CaseFoldMap<V, S>
where
    V: PartialEq,
    S: BuildHasher,
{
    /// Maps are equal when their ordered `(reported key, value)` sequences
    /// are equal. Reported keys carry casing, so two maps holding the same
    /// entry under different casings compare unequal even though lookups
    /// on either are case-insensitive.
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter().eq(other.iter())
    }
}

impl<V, S> Eq for CaseFoldMap<V, S>
where
    V: Eq,
    S: BuildHasher,
{
}

/// Read-only index sugar. Panics on a missing key, like the std maps; use
/// [`get`](CaseFoldMap::get) for the non-panicking lookup.
impl<K, V, S> Index<&K> for CaseFoldMap<V, S>
where
    K: Key + ?Sized,
    S: BuildHasher,
{
    type Output = V;

    #[inline]
    fn index(&self, key: &K) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<V, S> fmt::Debug for CaseFoldMap<V, S>
where
    V: fmt::Debug,
    S: BuildHasher,
{
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
