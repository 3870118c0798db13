//! Crawl frontier: visited set + FIFO queue
//!
//! The frontier is an explicit value owned by the run controller. It tracks
//! every URL the crawl has ever seen together with its state, and hands out
//! pending pages in strict breadth-first order. Links discovered on a page
//! are enqueued in markup order behind everything already queued, which makes
//! traversal order deterministic on a static site.

use std::collections::{HashMap, VecDeque};
use url::Url;

/// State of a URL in the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CrawlState {
    /// Discovered and queued, not yet dequeued
    Pending,

    /// Dequeued and currently being processed
    InFlight,

    /// Fetched and processed successfully
    Done,

    /// Dropped: fetch failure, non-HTML content, or language-filter rejection
    Skipped,
}

impl CrawlState {
    /// Returns true once no further processing will happen for the URL
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Skipped)
    }
}

/// A page waiting in the queue
#[derive(Debug, Clone)]
pub struct PendingPage {
    pub url: Url,
    pub depth: u32,
}

/// Visited-set + pending-queue state machine driving breadth-first traversal
#[derive(Debug, Default)]
pub struct Frontier {
    states: HashMap<String, CrawlState>,
    queue: VecDeque<PendingPage>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts the entry URL as Pending at depth 0
    pub fn seed(&mut self, url: Url) {
        self.enqueue(url, 0);
    }

    /// Adds a URL to the queue unless it has ever been seen before.
    ///
    /// Membership is checked here, at enqueue time, not at dequeue time:
    /// a URL enters the queue at most once across the whole run.
    pub fn enqueue(&mut self, url: Url, depth: u32) -> bool {
        let key = url.as_str().to_string();
        if self.states.contains_key(&key) {
            return false;
        }
        self.states.insert(key, CrawlState::Pending);
        self.queue.push_back(PendingPage { url, depth });
        true
    }

    /// Marks a URL Skipped without ever queueing it (language filter)
    pub fn skip(&mut self, url: &Url) -> bool {
        let key = url.as_str().to_string();
        if self.states.contains_key(&key) {
            return false;
        }
        self.states.insert(key, CrawlState::Skipped);
        true
    }

    /// Dequeues the next pending page, marking it InFlight
    pub fn next(&mut self) -> Option<PendingPage> {
        let page = self.queue.pop_front()?;
        self.states
            .insert(page.url.as_str().to_string(), CrawlState::InFlight);
        Some(page)
    }

    pub fn mark_done(&mut self, url: &Url) {
        self.states
            .insert(url.as_str().to_string(), CrawlState::Done);
    }

    pub fn mark_skipped(&mut self, url: &Url) {
        self.states
            .insert(url.as_str().to_string(), CrawlState::Skipped);
    }

    /// Returns true if the URL has been seen in any state
    pub fn is_known(&self, url: &Url) -> bool {
        self.states.contains_key(url.as_str())
    }

    pub fn state_of(&self, url: &Url) -> Option<CrawlState> {
        self.states.get(url.as_str()).copied()
    }

    /// Number of pages still waiting in the queue
    pub fn pending_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_exhausted(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total number of URLs ever admitted to the frontier
    pub fn seen_len(&self) -> usize {
        self.states.len()
    }

    fn count_state(&self, state: CrawlState) -> usize {
        self.states.values().filter(|s| **s == state).count()
    }

    pub fn done_count(&self) -> usize {
        self.count_state(CrawlState::Done)
    }

    pub fn skipped_count(&self) -> usize {
        self.count_state(CrawlState::Skipped)
    }
}
