//! Bookkeeping for producer threads.
//!
//! A producer is *resolving* from the moment intake accepts its URL until
//! metadata comes back, and *running* after it claims its ticket. The pool
//! waits for running producers at shutdown; resolving ones can be abandoned,
//! and a producer whose ticket was abandoned reports nothing.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct State {
    next_ticket: u64,
    resolving: HashMap<u64, String>,
    running: usize,
}

#[derive(Debug, Default)]
pub(crate) struct Producers {
    state: Mutex<State>,
}

/// Held by a producer that owns its URL's outcome. Dropping it marks the producer done.
#[derive(Debug)]
pub(crate) struct Running<'a> {
    producers: &'a Producers,
}

impl Drop for Running<'_> {
    fn drop(&mut self) {
        let mut state = self.producers.lock();
        state.running = state.running.saturating_sub(1);
    }
}

impl Producers {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers an accepted URL before its producer starts.
    pub(crate) fn register(&self, url: &str) -> u64 {
        let mut state = self.lock();
        let ticket = state.next_ticket;
        state.next_ticket += 1;
        state.resolving.insert(ticket, url.to_string());
        ticket
    }

    /// Takes ownership of the URL's outcome. `None` if the ticket was abandoned.
    pub(crate) fn claim(&self, ticket: u64) -> Option<Running<'_>> {
        let mut state = self.lock();
        state.resolving.remove(&ticket)?;
        state.running += 1;
        Some(Running { producers: self })
    }

    pub(crate) fn running(&self) -> usize {
        self.lock().running
    }

    pub(crate) fn resolving(&self) -> usize {
        self.lock().resolving.len()
    }

    /// Drops every unclaimed ticket and returns their URLs in acceptance order.
    pub(crate) fn abandon_resolving(&self) -> Vec<String> {
        let mut pending: Vec<(u64, String)> = self.lock().resolving.drain().collect();
        pending.sort_by_key(|(ticket, _)| *ticket);
        pending.into_iter().map(|(_, url)| url).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_then_drop_counts_running() {
        let producers = Producers::default();
        let t = producers.register("http://x/a");
        assert_eq!(producers.resolving(), 1);

        let running = producers.claim(t).unwrap();
        assert_eq!(producers.resolving(), 0);
        assert_eq!(producers.running(), 1);
        assert!(producers.claim(t).is_none());

        drop(running);
        assert_eq!(producers.running(), 0);
    }

    #[test]
    fn abandoned_ticket_cannot_be_claimed() {
        let producers = Producers::default();
        let a = producers.register("http://x/a");
        let b = producers.register("http://x/b");
        assert_eq!(
            producers.abandon_resolving(),
            vec!["http://x/a".to_string(), "http://x/b".to_string()]
        );
        assert!(producers.claim(a).is_none());
        assert!(producers.claim(b).is_none());
        assert_eq!(producers.running(), 0);
    }
}
