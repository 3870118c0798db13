//! Run controller: the main crawl loop
//!
//! Owns every piece of run state — frontier, path mapping, manifest, output
//! sink, statistics — and processes exactly one frontier item at a time:
//! fetch, parse, filter, rewrite, persist, then discover. The loop ends when
//! the frontier is empty or an unrecoverable error occurs.

use crate::config::Options;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Frontier, PendingPage};
use crate::crawler::parser::{parse_document, LinkRef, ParsedPage, RefKind};
use crate::output::manifest::{ManifestWriter, MANIFEST_FILE};
use crate::output::markdown::{render_markdown, MarkdownDocument};
use crate::output::mirror::MirrorWriter;
use crate::output::stats::RunStats;
use crate::rewrite::{rewrite_markup, PathMap};
use crate::url::{classify, is_non_primary_locale, normalize_url, UrlClass};
use crate::{ConfigError, KagamiError, Result};
use std::collections::HashSet;
use std::fs;
use url::Url;

/// Where processed pages end up
enum Sink {
    Mirror(MirrorWriter),
    Markdown(MarkdownDocument),
}

/// Outcome of processing one frontier item
enum PageOutcome {
    Processed,
    Skipped(String),
}

/// Main crawler structure owning all run state
pub struct Crawler {
    options: Options,
    site_host: String,
    fetcher: Fetcher,
    frontier: Frontier,
    paths: PathMap,
    manifest: ManifestWriter,
    sink: Sink,
    fetched_resources: HashSet<String>,
    stats: RunStats,
}

impl Crawler {
    /// Sets up the output root, manifest and sink. Every failure here is a
    /// configuration error: nothing has been crawled yet.
    pub fn new(options: Options) -> Result<Self> {
        let site_host = options.site_host().to_string();

        fs::create_dir_all(&options.output_dir).map_err(|source| {
            KagamiError::Config(ConfigError::OutputDir {
                path: options.output_dir.display().to_string(),
                source,
            })
        })?;

        let manifest = ManifestWriter::create(&options.output_dir.join(MANIFEST_FILE))?;

        let sink = if options.markdown {
            Sink::Markdown(MarkdownDocument::new(
                &site_host,
                options.entry.as_str(),
                &options.output_dir,
            )?)
        } else {
            Sink::Mirror(MirrorWriter::create(&options.output_dir)?)
        };

        let fetcher = Fetcher::new(options.delay)?;

        Ok(Self {
            options,
            site_host,
            fetcher,
            frontier: Frontier::new(),
            paths: PathMap::new(),
            manifest,
            sink,
            fetched_resources: HashSet::new(),
            stats: RunStats::new(),
        })
    }

    /// Runs the crawl to completion and returns the run statistics.
    ///
    /// An entry page that cannot be fetched as HTML aborts the run with
    /// [`KagamiError::EntryUnreachable`]; any later page failure is logged,
    /// counted, and skipped.
    pub async fn run(mut self) -> Result<RunStats> {
        let entry = self.options.entry.clone();
        tracing::info!("Starting download of {}", entry);
        tracing::info!(
            "All files will be saved to: {}",
            self.options.output_dir.display()
        );
        if self.options.english_only {
            tracing::info!("English-only mode: non-English pages will be skipped");
        }
        if self.options.markdown {
            tracing::info!("Markdown export mode: creating a single markdown file");
        }
        if self.options.page_only {
            tracing::info!("Page-only mode: links will not be followed");
        }

        self.manifest.record(&entry)?;
        self.frontier.seed(entry.clone());

        while let Some(pending) = self.frontier.next() {
            match self.process_page(&pending).await? {
                PageOutcome::Processed => self.frontier.mark_done(&pending.url),
                PageOutcome::Skipped(reason) => {
                    if pending.url == entry && pending.depth == 0 {
                        return Err(KagamiError::EntryUnreachable {
                            url: entry.to_string(),
                            reason,
                        });
                    }
                    tracing::warn!("Skipping {}: {}", pending.url, reason);
                    self.stats.pages_failed += 1;
                    self.frontier.mark_skipped(&pending.url);
                }
            }
        }

        if let Sink::Markdown(doc) = &self.sink {
            let path = doc.write(&self.options.output_dir)?;
            tracing::info!(
                "Markdown export completed: {} ({} sections)",
                path.display(),
                doc.section_count()
            );
        }

        self.stats.urls_discovered = self.manifest.len();
        tracing::info!(
            "Crawl complete: {} pages, {} URLs discovered",
            self.stats.pages_downloaded,
            self.stats.urls_discovered
        );

        Ok(self.stats)
    }

    /// Fetches and processes a single page
    async fn process_page(&mut self, pending: &PendingPage) -> Result<PageOutcome> {
        let url = &pending.url;
        tracing::info!("Processing: {}", url);

        let body = match self.fetcher.fetch_page(url).await {
            FetchResult::Html { body, .. } => body,
            FetchResult::NotHtml { content_type } => {
                return Ok(PageOutcome::Skipped(format!(
                    "not HTML (content-type: {})",
                    content_type
                )))
            }
            FetchResult::HttpError { status } => {
                return Ok(PageOutcome::Skipped(format!("HTTP {}", status)))
            }
            FetchResult::NetworkError { error } => return Ok(PageOutcome::Skipped(error)),
        };

        let parsed = parse_document(&body);
        let refs = parsed.link_refs();

        // Discovery runs in every mode: the manifest and the frontier see a
        // page's links whether or not the mirror materializes them.
        let resources = self.discover(url, pending.depth, &refs)?;

        if self.options.markdown {
            self.fetch_images(url, &parsed).await;
            self.export_section(url, &parsed);
        } else {
            self.materialize_page(url, &body, &refs)?;
            self.fetch_resources(resources).await;
        }

        self.stats.pages_downloaded += 1;
        Ok(PageOutcome::Processed)
    }

    /// Normalizes and routes every reference found on a page: manifest for
    /// all, frontier for internal pages, the returned list for same-site
    /// resources. Links are enqueued in markup order.
    fn discover(&mut self, page_url: &Url, depth: u32, refs: &[LinkRef]) -> Result<Vec<Url>> {
        let mut resources = Vec::new();

        for link in refs {
            let Ok(normalized) = normalize_url(&link.value, Some(page_url)) else {
                continue;
            };

            self.manifest.record(&normalized)?;

            match link.kind {
                RefKind::Hyperlink => match classify(&normalized, &self.site_host) {
                    UrlClass::Internal => {
                        if self.options.page_only {
                            continue;
                        }
                        if self.options.english_only && is_non_primary_locale(&normalized) {
                            if self.frontier.skip(&normalized) {
                                tracing::info!("Skipping non-English page: {}", normalized);
                                self.stats.pages_skipped_language += 1;
                            }
                            continue;
                        }
                        self.frontier.enqueue(normalized, depth + 1);
                    }
                    UrlClass::Resource => resources.push(normalized),
                    UrlClass::External => {}
                },
                RefKind::Image | RefKind::Stylesheet | RefKind::Script => {
                    if normalized.host_str() == Some(self.site_host.as_str()) {
                        resources.push(normalized);
                    }
                }
            }
        }

        Ok(resources)
    }

    /// Rewrites a page's markup and writes it to its assigned local path
    fn materialize_page(&mut self, url: &Url, body: &str, refs: &[LinkRef]) -> Result<()> {
        let page_local = self.paths.page_path(url);
        let rewritten = rewrite_markup(
            body,
            url,
            &page_local,
            &self.site_host,
            refs,
            &mut self.paths,
        );

        let Sink::Mirror(mirror) = &mut self.sink else {
            return Ok(());
        };
        if mirror.write_page(&page_local, &rewritten)? {
            tracing::debug!("Saved {} with updated links", page_local);
        }
        Ok(())
    }

    /// Fetches each newly discovered resource at most once and writes it
    /// into the mirror. Failures here are logged and counted, never fatal.
    async fn fetch_resources(&mut self, resources: Vec<Url>) {
        for url in resources {
            if !self.fetched_resources.insert(url.as_str().to_string()) {
                continue;
            }

            let local = self.paths.resource_path(&url);
            match self.fetcher.fetch_resource(&url).await {
                Ok(fetched) => {
                    let Sink::Mirror(mirror) = &mut self.sink else {
                        return;
                    };
                    match mirror.write_resource(&local, &fetched.bytes) {
                        Ok(_) => self.stats.resources_downloaded += 1,
                        Err(e) => {
                            tracing::warn!("Failed to write resource {}: {}", url, e);
                            self.stats.resources_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.stats.resources_failed += 1;
                }
            }
        }
    }

    /// Downloads a page's same-site images into the shared folder
    /// (markdown mode)
    async fn fetch_images(&mut self, page_url: &Url, parsed: &ParsedPage) {
        for src in parsed.image_sources() {
            let Ok(normalized) = normalize_url(&src, Some(page_url)) else {
                continue;
            };
            if normalized.host_str() != Some(self.site_host.as_str()) {
                continue;
            }

            let Sink::Markdown(doc) = &mut self.sink else {
                return;
            };
            if doc.images().contains(normalized.as_str()) {
                continue;
            }

            match self.fetcher.fetch_resource(&normalized).await {
                Ok(fetched) => {
                    let Sink::Markdown(doc) = &mut self.sink else {
                        return;
                    };
                    match doc
                        .images_mut()
                        .store(&normalized, &fetched.bytes, &fetched.content_type)
                    {
                        Ok(_) => self.stats.images_downloaded += 1,
                        Err(e) => {
                            tracing::warn!("Failed to store image {}: {}", normalized, e);
                            self.stats.resources_failed += 1;
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    self.stats.resources_failed += 1;
                }
            }
        }
    }

    /// Renders a page into its markdown section (markdown mode)
    fn export_section(&mut self, url: &Url, parsed: &ParsedPage) {
        let title = parsed
            .title
            .clone()
            .unwrap_or_else(|| derive_title(url));

        let Sink::Markdown(doc) = &mut self.sink else {
            return;
        };
        let body = render_markdown(parsed.content_root(), url, doc.images());
        doc.push_section(&title, url.as_str(), body);
        tracing::info!("Added '{}' to markdown content", title);
    }
}

/// Title fallback for pages without a `<title>`: the last path segment,
/// or the host for the root page
fn derive_title(url: &Url) -> String {
    url.path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
        .map(str::to_string)
        .unwrap_or_else(|| url.host_str().unwrap_or("page").to_string())
}

/// Runs a complete mirroring operation with the given options
pub async fn run_mirror(options: Options) -> Result<RunStats> {
    let crawler = Crawler::new(options)?;
    crawler.run().await
}
