//! Message identity allocation.
//!
//! A [`SessionCounter`] is owned by a test case context and shared with the
//! senders it creates. Each burst of messages consumes the current session
//! value and advances it, so two bursts never share an identity. Tests that
//! need deterministic identities pin the counter with [`SessionCounter::pin`];
//! the previous value comes back when the guard is dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::types::MessageIdentity;

/// First session value handed out by a fresh counter.
pub const FIRST_SESSION: u32 = 1;

/// Session counter shared by every sender of one test case.
#[derive(Debug, Clone)]
pub struct SessionCounter {
    next: Arc<AtomicU32>,
}

impl SessionCounter {
    /// Creates a counter starting at [`FIRST_SESSION`].
    #[must_use]
    pub fn new() -> Self {
        Self::starting_at(FIRST_SESSION)
    }

    /// Creates a counter starting at `session`.
    #[must_use]
    pub fn starting_at(session: u32) -> Self {
        Self {
            next: Arc::new(AtomicU32::new(session)),
        }
    }

    /// Returns the session the next burst will use.
    #[must_use]
    pub fn peek(&self) -> u32 {
        self.next.load(Ordering::SeqCst)
    }

    /// Reserves a session for a burst of `len` messages.
    #[must_use]
    pub fn begin_burst(&self, len: u32) -> Burst {
        let session = self.next.fetch_add(1, Ordering::SeqCst);
        tracing::trace!(session = session, len = len, "allocated burst");
        Burst {
            session,
            next: 1,
            len,
        }
    }

    /// Forces the session counter to `session` until the guard drops.
    ///
    /// Bursts started while the guard is alive still advance the counter;
    /// dropping the guard restores the value seen when it was created.
    #[must_use = "the previous session is restored as soon as the guard drops"]
    pub fn pin(&self, session: u32) -> SessionPin {
        let previous = self.next.swap(session, Ordering::SeqCst);
        SessionPin {
            next: Arc::clone(&self.next),
            previous,
        }
    }
}

impl Default for SessionCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// Restores the pinned counter on drop.
#[derive(Debug)]
pub struct SessionPin {
    next: Arc<AtomicU32>,
    previous: u32,
}

impl SessionPin {
    /// The value the counter returns to.
    #[must_use]
    pub const fn previous(&self) -> u32 {
        self.previous
    }
}

impl Drop for SessionPin {
    fn drop(&mut self) {
        self.next.store(self.previous, Ordering::SeqCst);
    }
}

/// Identities of one burst: `(session, 1..=len)` with no gaps or repeats.
#[derive(Debug, Clone)]
pub struct Burst {
    session: u32,
    next: u32,
    len: u32,
}

impl Burst {
    /// The session shared by every identity in the burst.
    #[must_use]
    pub const fn session(&self) -> u32 {
        self.session
    }

    /// Number of identities in the burst (the sender's repeat count).
    #[must_use]
    pub const fn repeat(&self) -> u32 {
        self.len
    }

    /// Returns true for a zero-length burst.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Iterator for Burst {
    type Item = MessageIdentity;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.len || self.next == 0 {
            return None;
        }
        let id = MessageIdentity::new(self.session, self.next);
        self.next = self.next.wrapping_add(1);
        Some(id)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next == 0 {
            0
        } else {
            (u64::from(self.len) + 1).saturating_sub(u64::from(self.next)) as usize
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Burst {}
