//! Chain: singly-linked list of entries that share one bucket.
//!
//! Each bucket slot owns the head entry; each entry owns its successor.
//! Traversal only ever borrows. Structural edits (`push_front`,
//! `pop_front`, `remove`) move a `Box` out of its owning link with
//! `Option::take` before storing it anywhere else, so no entry is ever
//! owned twice.

use core::borrow::Borrow;

pub(crate) type Link<K, V> = Option<Box<Entry<K, V>>>;

pub(crate) struct Entry<K, V> {
    pub(crate) key: K,
    pub(crate) value: V,
    /// Hash computed once at insertion. Bucket addressing after insertion,
    /// rehash included, reads this instead of calling `K: Hash` again.
    pub(crate) hash: u64,
    next: Link<K, V>,
}

impl<K, V> Entry<K, V> {
    pub(crate) fn new(key: K, value: V, hash: u64) -> Box<Self> {
        Box::new(Self {
            key,
            value,
            hash,
            next: None,
        })
    }

    #[inline]
    fn matches<Q>(&self, hash: u64, q: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.hash == hash && self.key.borrow() == q
    }

    pub(crate) fn into_pair(self: Box<Self>) -> (K, V) {
        debug_assert!(self.next.is_none(), "entry unlinked with a live successor");
        let Entry { key, value, .. } = *self;
        (key, value)
    }
}

pub(crate) struct Chain<K, V> {
    head: Link<K, V>,
}

impl<K, V> Chain<K, V> {
    pub(crate) const fn new() -> Self {
        Self { head: None }
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    /// Head insertion: the new entry takes over the former head as its
    /// successor. O(1), never scans.
    #[inline]
    pub(crate) fn push_front(&mut self, mut entry: Box<Entry<K, V>>) {
        debug_assert!(entry.next.is_none());
        entry.next = self.head.take();
        self.head = Some(entry);
    }

    /// Detach the head entry, leaving its successor as the new head.
    #[inline]
    pub(crate) fn pop_front(&mut self) -> Option<Box<Entry<K, V>>> {
        let mut entry = self.head.take()?;
        self.head = entry.next.take();
        Some(entry)
    }

    pub(crate) fn find<Q>(&self, hash: u64, q: &Q) -> Option<&Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        self.iter().find(|e| e.matches(hash, q))
    }

    pub(crate) fn find_mut<Q>(&mut self, hash: u64, q: &Q) -> Option<&mut Entry<K, V>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut cur = self.head.as_deref_mut();
        while let Some(entry) = cur {
            if entry.matches(hash, q) {
                return Some(entry);
            }
            cur = entry.next.as_deref_mut();
        }
        None
    }

    /// Unlink the first entry matching `q`. `link` always refers to the
    /// owner of the entry under inspection: the slot itself for the head,
    /// otherwise the predecessor's `next`. Splicing the match out is then a
    /// single reassignment of that owner.
    pub(crate) fn remove<Q>(&mut self, hash: u64, q: &Q) -> Option<Box<Entry<K, V>>>
    where
        K: Borrow<Q>,
        Q: ?Sized + Eq,
    {
        let mut link = &mut self.head;
        while link.as_deref().map_or(false, |e| !e.matches(hash, q)) {
            link = &mut link.as_mut()?.next;
        }
        let mut removed = link.take()?;
        *link = removed.next.take();
        Some(removed)
    }

    pub(crate) fn iter(&self) -> ChainIter<'_, K, V> {
        ChainIter {
            next: self.head.as_deref(),
        }
    }

    pub(crate) fn iter_mut(&mut self) -> ChainIterMut<'_, K, V> {
        ChainIterMut {
            next: self.head.as_deref_mut(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.iter().count()
    }

    /// Drop every entry, one link at a time.
    pub(crate) fn clear(&mut self) {
        let mut cur = self.head.take();
        while let Some(mut entry) = cur {
            cur = entry.next.take();
        }
    }
}

impl<K, V> Default for Chain<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

// The derived drop would recurse once per entry; a long chain (e.g. every key
// colliding) must not exhaust the stack.
impl<K, V> Drop for Chain<K, V> {
    fn drop(&mut self) {
        self.clear();
    }
}

pub(crate) struct ChainIter<'a, K, V> {
    next: Option<&'a Entry<K, V>>,
}

impl<'a, K, V> Iterator for ChainIter<'a, K, V> {
    type Item = &'a Entry<K, V>;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let entry = self.next?;
        self.next = entry.next.as_deref();
        Some(entry)
    }
}

pub(crate) struct ChainIterMut<'a, K, V> {
    next: Option<&'a mut Entry<K, V>>,
}

impl<'a, K, V> Iterator for ChainIterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let Entry {
            key, value, next, ..
        } = self.next.take()?;
        self.next = next.as_deref_mut();
        Some((&*key, value))
    }
}
