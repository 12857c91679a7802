use crate::invariants::{
    debug_assert_closed_monotonic, debug_assert_cursor_was_empty, debug_assert_destroy_empty,
    debug_assert_no_mutation_when_closed, debug_assert_reclaim_requires_both_seen,
};
use crate::{Closed, Terminated};
use slab::Slab;
use std::sync::{Condvar, Mutex};

type NodeKey = usize;

/// Identifies one of the two fixed consumer classes. No other values exist;
/// the consumer set is not extensible at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Consumer {
    /// The data manager: domain validation / threshold monitoring.
    Data,
    /// The storage manager: persistence to a relational store.
    Storage,
}

struct Node<T> {
    record: T,
    seen_data: bool,
    seen_storage: bool,
    /// The node that took over as `head` immediately after this one was
    /// inserted, i.e. this node's successor in producer insertion order.
    /// `None` while this node is still the newest live node.
    successor: Option<NodeKey>,
}

struct Inner<T> {
    nodes: Slab<Node<T>>,
    /// Newest live node, or `None` if the buffer holds nothing.
    head: Option<NodeKey>,
    /// Oldest node the data manager has not yet observed.
    cur_data: Option<NodeKey>,
    /// Oldest node the storage manager has not yet observed.
    cur_storage: Option<NodeKey>,
    closed: bool,
}

impl<T> Inner<T> {
    fn cursor(&self, who: Consumer) -> Option<NodeKey> {
        match who {
            Consumer::Data => self.cur_data,
            Consumer::Storage => self.cur_storage,
        }
    }

    fn set_cursor(&mut self, who: Consumer, key: Option<NodeKey>) {
        match who {
            Consumer::Data => self.cur_data = key,
            Consumer::Storage => self.cur_storage = key,
        }
    }
}

/// A shared buffer mediating one producer thread and two independent
/// consumer threads (the data manager and the storage manager).
///
/// Every record inserted is delivered to both consumers, each walking the
/// buffer at its own pace via a private cursor; a record is only freed once
/// both cursors have advanced past it. `Sbuf` never inspects the records it
/// holds — `T` is carried by value and returned by value.
///
/// All mutable state lives behind a single [`Mutex`]; two [`Condvar`]s (one
/// per consumer identity) let `insert` wake exactly the consumers whose
/// cursor was empty, avoiding a thundering herd when only one consumer is
/// behind.
pub struct Sbuf<T> {
    inner: Mutex<Inner<T>>,
    cv_data: Condvar,
    cv_storage: Condvar,
}

impl<T> Default for Sbuf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Sbuf<T> {
    /// Creates an empty, open buffer.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                nodes: Slab::new(),
                head: None,
                cur_data: None,
                cur_storage: None,
                closed: false,
            }),
            cv_data: Condvar::new(),
            cv_storage: Condvar::new(),
        }
    }

    /// Inserts `record` at the head of the buffer.
    ///
    /// Returns [`Closed`] without any side effect if the buffer has already
    /// been closed. Otherwise wakes both consumer condition variables; a
    /// consumer whose cursor was empty is guaranteed to find it repointed by
    /// the time it re-checks its wait predicate.
    pub fn insert(&self, record: T) -> Result<(), Closed> {
        let mut inner = self.inner.lock().unwrap();

        let before_len = inner.nodes.len();
        if inner.closed {
            debug_assert_no_mutation_when_closed!(before_len, inner.nodes.len());
            return Err(Closed);
        }

        let key = inner.nodes.insert(Node {
            record,
            seen_data: false,
            seen_storage: false,
            successor: None,
        });
        if let Some(old_head) = inner.head.replace(key) {
            inner.nodes[old_head].successor = Some(key);
        }
        if inner.cur_data.is_none() {
            debug_assert_cursor_was_empty!("data", inner.cur_data);
            inner.cur_data = Some(key);
        }
        if inner.cur_storage.is_none() {
            debug_assert_cursor_was_empty!("storage", inner.cur_storage);
            inner.cur_storage = Some(key);
        }

        drop(inner);
        self.cv_data.notify_one();
        self.cv_storage.notify_one();
        Ok(())
    }

    /// Returns the next record for `who`, blocking while `who` has nothing
    /// unobserved and the buffer is still open.
    ///
    /// Wakes on a matching `insert` or on `close`; re-checks its predicate
    /// on every wake, so spurious wakeups are harmless. Returns
    /// [`Terminated`] once `who`'s cursor is empty and the buffer is closed
    /// — the signal for that consumer's loop to exit.
    pub fn remove(&self, who: Consumer) -> Result<T, Terminated>
    where
        T: Clone,
    {
        let cv = match who {
            Consumer::Data => &self.cv_data,
            Consumer::Storage => &self.cv_storage,
        };

        let mut inner = self.inner.lock().unwrap();
        loop {
            if let Some(key) = inner.cursor(who) {
                let record = inner.nodes[key].record.clone();
                let successor = inner.nodes[key].successor;
                match who {
                    Consumer::Data => inner.nodes[key].seen_data = true,
                    Consumer::Storage => inner.nodes[key].seen_storage = true,
                }
                inner.set_cursor(who, successor);

                let node = &inner.nodes[key];
                if node.seen_data && node.seen_storage {
                    debug_assert_reclaim_requires_both_seen!(node.seen_data, node.seen_storage);
                    if inner.head == Some(key) {
                        inner.head = None;
                    }
                    inner.nodes.remove(key);
                }
                return Ok(record);
            }

            if inner.closed {
                return Err(Terminated);
            }

            inner = cv.wait(inner).unwrap();
        }
    }

    /// Marks the buffer closed: no further `insert` will succeed. Wakes both
    /// consumers so each can re-evaluate termination. Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.lock().unwrap();
        let was_closed = inner.closed;
        inner.closed = true;
        debug_assert_closed_monotonic!(was_closed, inner.closed);
        drop(inner);

        self.cv_data.notify_all();
        self.cv_storage.notify_all();
    }

    /// Returns `true` once `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.lock().unwrap().closed
    }
}

impl<T> Drop for Sbuf<T> {
    /// Tearing down a buffer with live nodes is a caller bug: every consumer
    /// must have drained and returned before the buffer is dropped, which in
    /// practice means joining both consumer threads before dropping the last
    /// `Arc<Sbuf<_>>`.
    fn drop(&mut self) {
        let inner = self.inner.get_mut().unwrap();
        debug_assert_destroy_empty!(inner.head, inner.cur_data, inner.cur_storage);
    }
}
