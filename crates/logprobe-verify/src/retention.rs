//! Bounded-retention evaluation of a queried feed.
//!
//! After `N` entries were sent to a sink keeping at most `K`, ids
//! `N-K..N` must be observable and every id below `N-K` must be gone. The
//! check works on ids only; ordering among entries that arrived over
//! different transports is not asserted.

use std::fmt;

use logprobe_core::{MessageIdentity, Outcome, RetentionPolicy};

use crate::feed::FeedDocument;

/// Result of checking a feed against a [`RetentionPolicy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetentionReport {
    /// Policy that was applied.
    pub policy: RetentionPolicy,
    /// Entries sent to the sink.
    pub total: u64,
    /// Entries the feed returned.
    pub observed: u64,
    /// Ids that must be present but are not.
    pub missing: Vec<u64>,
    /// Ids that must have been evicted but are still present.
    pub unexpected: Vec<u64>,
    /// Identity of the newest sent message, when it was not found in the newest entry.
    pub newest_absent: Option<MessageIdentity>,
}

impl RetentionReport {
    /// Checks `feed` after `total` entries were sent.
    ///
    /// When `newest` is given, the entry with the highest id must also carry
    /// that identity in its text.
    #[must_use]
    pub fn check(
        policy: RetentionPolicy,
        total: u64,
        feed: &FeedDocument,
        newest: Option<MessageIdentity>,
    ) -> Self {
        let retained = policy.retained(total);
        let evicted = policy.evicted(total);

        let missing = retained.filter(|id| !feed.contains_id(*id)).collect();
        let mut unexpected: Vec<u64> = feed.ids().filter(|id| evicted.contains(id)).collect();
        unexpected.sort_unstable();
        unexpected.dedup();

        let newest_absent = newest.filter(|identity| {
            let tag = identity.to_string();
            total
                .checked_sub(1)
                .and_then(|id| feed.entry(id))
                .is_none_or(|entry| !entry.title.contains(&tag))
        });

        Self {
            policy,
            total,
            observed: feed.entries.len() as u64,
            missing,
            unexpected,
            newest_absent,
        }
    }

    /// Entries beyond what the policy allows.
    #[must_use]
    pub fn excess(&self) -> u64 {
        self.observed
            .saturating_sub(self.policy.max_entries(self.total))
    }

    /// Returns true if the feed satisfies the policy.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
            && self.unexpected.is_empty()
            && self.newest_absent.is_none()
            && self.excess() == 0
    }

    /// Converts into a test outcome.
    #[must_use]
    pub fn into_outcome(self) -> Outcome {
        if self.is_satisfied() {
            Outcome::Pass
        } else {
            Outcome::fail(self.to_string())
        }
    }
}

impl fmt::Display for RetentionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "retention check after {} sent, {} observed",
            self.total, self.observed
        )?;
        if !self.missing.is_empty() {
            write!(f, "; missing ids {}", summarize(&self.missing))?;
        }
        if !self.unexpected.is_empty() {
            write!(f, "; evicted ids still present {}", summarize(&self.unexpected))?;
        }
        if let Some(identity) = self.newest_absent {
            write!(f, "; newest message {identity} not in newest entry")?;
        }
        let excess = self.excess();
        if excess > 0 {
            write!(f, "; {excess} entries over capacity")?;
        }
        Ok(())
    }
}

fn summarize(ids: &[u64]) -> String {
    const SHOWN: usize = 8;
    let head = ids
        .iter()
        .take(SHOWN)
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",");
    if ids.len() > SHOWN {
        format!("[{head},... {} total]", ids.len())
    } else {
        format!("[{head}]")
    }
}
