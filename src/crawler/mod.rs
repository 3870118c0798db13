//! Crawler module: fetching, parsing, frontier management and orchestration
//!
//! This module contains the crawl engine:
//! - HTTP fetching with the mandatory inter-request delay
//! - HTML parsing into the [`parser::DomNode`] tree
//! - The breadth-first [`frontier::Frontier`]
//! - The run controller driving a whole mirroring operation

pub mod coordinator;
pub mod fetcher;
pub mod frontier;
pub mod parser;

pub use coordinator::{run_mirror, Crawler};
pub use fetcher::{build_http_client, FetchResult, Fetcher};
pub use frontier::{CrawlState, Frontier, PendingPage};
pub use parser::{parse_document, DomNode, LinkRef, ParsedPage, RefKind};
