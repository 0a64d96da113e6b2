//! # Token Counter

use crate::types::{WFHashMap, hash_map_with_capacity};

/// Count entry; the insertion ordinal breaks frequency ties.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CountEntry {
    count: usize,
    first_seen: usize,
}

/// Insertion-ordered frequency counter.
///
/// [`TokenCounter::most_common`] orders tokens by descending count,
/// and tokens with equal counts by the order in which they were first seen.
#[derive(Debug, Clone, Default)]
pub struct TokenCounter {
    counts: WFHashMap<String, CountEntry>,
}

impl<S: AsRef<str>> FromIterator<S> for TokenCounter {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut counter = Self::default();
        counter.update(iter);
        counter
    }
}

impl TokenCounter {
    /// Create a new empty counter.
    pub fn new() -> Self {
        Self {
            counts: hash_map_with_capacity(1024),
        }
    }

    /// Count one occurrence of `token`.
    pub fn add<S: AsRef<str>>(
        &mut self,
        token: S,
    ) {
        self.add_count(token, 1);
    }

    /// Count `count` occurrences of `token`.
    pub fn add_count<S: AsRef<str>>(
        &mut self,
        token: S,
        count: usize,
    ) {
        let next = self.counts.len();
        let token = token.as_ref();
        match self.counts.get_mut(token) {
            Some(entry) => entry.count += count,
            None => {
                self.counts.insert(
                    token.to_string(),
                    CountEntry {
                        count,
                        first_seen: next,
                    },
                );
            }
        }
    }

    /// Update counts inplace from a token iterator.
    pub fn update<I>(
        &mut self,
        tokens: I,
    ) where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        for token in tokens {
            self.add(token);
        }
    }

    /// The count of `token`; 0 if never seen.
    pub fn get(
        &self,
        token: &str,
    ) -> usize {
        self.counts.get(token).map_or(0, |e| e.count)
    }

    /// The number of distinct tokens.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// Check if the counter is empty.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All ``(token, count)`` pairs, most frequent first.
    ///
    /// Ties are broken by first-seen order.
    pub fn most_common(&self) -> Vec<(&str, usize)> {
        let mut entries: Vec<(&str, CountEntry)> = self
            .counts
            .iter()
            .map(|(token, &entry)| (token.as_str(), entry))
            .collect();
        entries.sort_by(|(_, a), (_, b)| {
            b.count
                .cmp(&a.count)
                .then_with(|| a.first_seen.cmp(&b.first_seen))
        });
        entries
            .into_iter()
            .map(|(token, entry)| (token, entry.count))
            .collect()
    }
}
