//! Single-document markdown export
//!
//! Alternate sink for markdown mode: every successfully processed page
//! contributes one section, images are downloaded once into a shared
//! `images/` folder, and the finished document carries a table of contents
//! in visit order followed by the concatenated sections.
//!
//! Markdown rendering walks the parsed [`DomNode`] tree directly — the same
//! contract the link rewriter consumes — translating headings, paragraphs,
//! lists, emphasis, code, links and images.

use crate::crawler::parser::DomNode;
use crate::url::normalize_url;
use crate::{KagamiError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use url::Url;

/// Folder shared by every section's downloaded images
pub const IMAGE_DIR: &str = "images";

/// Assigns stable, collision-free local filenames to downloaded images
pub struct ImageStore {
    dir: PathBuf,
    by_url: HashMap<String, String>,
    used: HashMap<String, String>,
}

impl ImageStore {
    /// Creates the shared image folder under the output root
    pub fn create(output_root: &Path) -> Result<Self> {
        let dir = output_root.join(IMAGE_DIR);
        fs::create_dir_all(&dir).map_err(|source| KagamiError::Write {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            by_url: HashMap::new(),
            used: HashMap::new(),
        })
    }

    /// Local filename previously assigned to a normalized URL
    pub fn local_name(&self, url_str: &str) -> Option<&str> {
        self.by_url.get(url_str).map(String::as_str)
    }

    pub fn contains(&self, url_str: &str) -> bool {
        self.by_url.contains_key(url_str)
    }

    pub fn len(&self) -> usize {
        self.by_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_url.is_empty()
    }

    /// Stores an image's bytes under a name derived from its URL, appending
    /// a numeric suffix when distinct URLs collide on the same name.
    /// Storing the same URL twice returns the original name without
    /// rewriting the file.
    pub fn store(&mut self, url: &Url, bytes: &[u8], content_type: &str) -> Result<String> {
        if let Some(existing) = self.by_url.get(url.as_str()) {
            return Ok(existing.clone());
        }

        let name = self.assign_name(url, content_type);
        let full = self.dir.join(&name);
        fs::write(&full, bytes).map_err(|source| KagamiError::Write {
            path: full.display().to_string(),
            source,
        })?;

        self.by_url.insert(url.as_str().to_string(), name.clone());
        Ok(name)
    }

    fn assign_name(&mut self, url: &Url, content_type: &str) -> String {
        let basename = url
            .path()
            .rsplit('/')
            .next()
            .unwrap_or_default();
        let mut base = sanitize_filename(basename);
        if base.is_empty() {
            base = "image".to_string();
        }

        if !base.contains('.') {
            if let Some(ext) = extension_for(content_type) {
                base.push('.');
                base.push_str(ext);
            }
        }

        let (stem, ext) = match base.rsplit_once('.') {
            Some((s, e)) if !s.is_empty() => (s.to_string(), Some(e.to_string())),
            _ => (base.clone(), None),
        };

        let mut candidate = base;
        let mut counter = 1;
        while self.used.contains_key(&candidate) {
            candidate = match &ext {
                Some(e) => format!("{}-{}.{}", stem, counter, e),
                None => format!("{}-{}", stem, counter),
            };
            counter += 1;
        }

        self.used.insert(candidate.clone(), url.as_str().to_string());
        candidate
    }
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect::<String>()
        .trim_matches('.')
        .to_string()
}

fn extension_for(content_type: &str) -> Option<&'static str> {
    let essence = content_type.split(';').next().unwrap_or("").trim();
    match essence {
        "image/png" => Some("png"),
        "image/jpeg" => Some("jpg"),
        "image/gif" => Some("gif"),
        "image/svg+xml" => Some("svg"),
        "image/webp" => Some("webp"),
        "image/x-icon" | "image/vnd.microsoft.icon" => Some("ico"),
        _ => None,
    }
}

/// One page's contribution to the document
#[derive(Debug, Clone)]
struct Section {
    title: String,
    url: String,
    body: String,
}

/// The growing markdown document; flushed once after traversal
pub struct MarkdownDocument {
    host: String,
    entry_url: String,
    sections: Vec<Section>,
    images: ImageStore,
}

impl MarkdownDocument {
    pub fn new(host: &str, entry_url: &str, output_root: &Path) -> Result<Self> {
        Ok(Self {
            host: host.to_string(),
            entry_url: entry_url.to_string(),
            sections: Vec::new(),
            images: ImageStore::create(output_root)?,
        })
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageStore {
        &mut self.images
    }

    /// Appends a section in visit order
    pub fn push_section(&mut self, title: &str, url: &str, body: String) {
        self.sections.push(Section {
            title: title.to_string(),
            url: url.to_string(),
            body,
        });
    }

    pub fn section_count(&self) -> usize {
        self.sections.len()
    }

    /// File the rendered document is written to, named after the host
    pub fn document_file_name(&self) -> String {
        format!("{}.md", self.host)
    }

    /// Renders the full document: title, table of contents in visit order,
    /// sections, dated footer.
    pub fn render(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {} Website Content\n\n", self.host));

        md.push_str("## Table of Contents\n\n");
        for (i, section) in self.sections.iter().enumerate() {
            md.push_str(&format!(
                "{}. [{}](#{})\n",
                i + 1,
                section.title,
                heading_slug(&section.title)
            ));
        }
        md.push_str("\n---\n\n");

        for section in &self.sections {
            md.push_str(&format!("# {}\n\n", section.title));
            if !section.body.is_empty() {
                md.push_str(&section.body);
                md.push_str("\n\n");
            }
            md.push_str(&format!(
                "*Source: [{}]({})*\n\n---\n\n",
                section.url, section.url
            ));
        }

        md.push_str(&format!(
            "*Generated from {} on {}*\n",
            self.entry_url,
            chrono::Local::now().format("%Y-%m-%d")
        ));

        md
    }

    /// Writes the rendered document under the output root
    pub fn write(&self, output_root: &Path) -> Result<PathBuf> {
        let path = output_root.join(self.document_file_name());
        fs::write(&path, self.render()).map_err(|source| KagamiError::Write {
            path: path.display().to_string(),
            source,
        })?;
        Ok(path)
    }
}

/// GitHub-style anchor slug for a heading
fn heading_slug(title: &str) -> String {
    let mut slug = String::new();
    let mut last_dash = true;
    for c in title.to_lowercase().chars() {
        if c.is_alphanumeric() {
            slug.push(c);
            last_dash = false;
        } else if c.is_whitespace() || c == '-' {
            if !last_dash {
                slug.push('-');
                last_dash = true;
            }
        }
    }
    slug.trim_end_matches('-').to_string()
}

// ---------------------------------------------------------------------------
// DomNode -> markdown rendering

struct RenderCtx<'a> {
    page_url: &'a Url,
    images: &'a ImageStore,
}

impl RenderCtx<'_> {
    fn link_target(&self, href: &str) -> String {
        if href.starts_with('#') {
            return href.to_string();
        }
        match self.page_url.join(href) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => href.to_string(),
        }
    }

    fn image_target(&self, src: &str) -> String {
        if let Ok(resolved) = normalize_url(src, Some(self.page_url)) {
            if let Some(name) = self.images.local_name(resolved.as_str()) {
                return format!("{}/{}", IMAGE_DIR, name);
            }
            return resolved.to_string();
        }
        src.to_string()
    }
}

/// Renders a subtree of the page to markdown.
///
/// Links point at their original absolute targets; images point into the
/// shared image folder when the store has them, or at their absolute URL
/// otherwise.
pub fn render_markdown(node: &DomNode, page_url: &Url, images: &ImageStore) -> String {
    let ctx = RenderCtx { page_url, images };
    let mut out = String::new();
    render_block(node, &mut out, &ctx);
    tidy(&out)
}

const SKIPPED_TAGS: &[&str] = &["script", "style", "noscript", "template", "svg", "iframe"];

fn is_block(node: &DomNode) -> bool {
    match node.name() {
        Some(name) => matches!(
            name,
            "h1" | "h2"
                | "h3"
                | "h4"
                | "h5"
                | "h6"
                | "p"
                | "div"
                | "section"
                | "article"
                | "main"
                | "header"
                | "footer"
                | "aside"
                | "nav"
                | "ul"
                | "ol"
                | "li"
                | "pre"
                | "blockquote"
                | "hr"
                | "table"
                | "thead"
                | "tbody"
                | "tr"
                | "figure"
                | "figcaption"
                | "body"
        ),
        None => false,
    }
}

fn render_block(node: &DomNode, out: &mut String, ctx: &RenderCtx) {
    let Some(name) = node.name() else {
        // bare text at block level becomes its own paragraph
        let mut para = String::new();
        render_inline(node, &mut para, ctx);
        flush_paragraph(&mut para, out);
        return;
    };

    if SKIPPED_TAGS.contains(&name) {
        return;
    }

    match name {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            let level = name[1..].parse::<usize>().unwrap_or(1);
            let mut text = String::new();
            render_inline_children(node, &mut text, ctx);
            let text = text.trim();
            if !text.is_empty() {
                out.push_str(&"#".repeat(level));
                out.push(' ');
                out.push_str(text);
                out.push_str("\n\n");
            }
        }
        "p" | "figcaption" => {
            let mut para = String::new();
            render_inline_children(node, &mut para, ctx);
            flush_paragraph(&mut para, out);
        }
        "ul" => render_list(node, out, ctx, 0, false),
        "ol" => render_list(node, out, ctx, 0, true),
        "pre" => {
            let code = node.text_content();
            let code = code.trim_matches('\n');
            out.push_str("```\n");
            out.push_str(code);
            out.push_str("\n```\n\n");
        }
        "blockquote" => {
            let mut inner = String::new();
            render_children(node, &mut inner, ctx);
            for line in inner.trim_end().lines() {
                out.push_str("> ");
                out.push_str(line);
                out.push('\n');
            }
            out.push('\n');
        }
        "hr" => out.push_str("---\n\n"),
        "br" => out.push('\n'),
        _ => render_children(node, out, ctx),
    }
}

/// Renders mixed children: consecutive inline runs merge into one paragraph,
/// block children stand on their own.
fn render_children(node: &DomNode, out: &mut String, ctx: &RenderCtx) {
    let mut para = String::new();
    for child in node.children() {
        if is_block(child) {
            flush_paragraph(&mut para, out);
            render_block(child, out, ctx);
        } else {
            render_inline(child, &mut para, ctx);
        }
    }
    flush_paragraph(&mut para, out);
}

fn flush_paragraph(para: &mut String, out: &mut String) {
    let text = para.trim();
    if !text.is_empty() {
        out.push_str(text);
        out.push_str("\n\n");
    }
    para.clear();
}

fn render_list(node: &DomNode, out: &mut String, ctx: &RenderCtx, depth: usize, ordered: bool) {
    let mut index = 1;
    for child in node.children() {
        if child.name() != Some("li") {
            continue;
        }

        let mut line = String::new();
        let mut nested = String::new();
        for part in child.children() {
            match part.name() {
                Some("ul") => render_list(part, &mut nested, ctx, depth + 1, false),
                Some("ol") => render_list(part, &mut nested, ctx, depth + 1, true),
                Some("p") => render_inline_children(part, &mut line, ctx),
                _ => render_inline(part, &mut line, ctx),
            }
        }

        out.push_str(&"  ".repeat(depth));
        if ordered {
            out.push_str(&format!("{}. ", index));
        } else {
            out.push_str("- ");
        }
        out.push_str(line.trim());
        out.push('\n');
        out.push_str(&nested);
        index += 1;
    }
    if depth == 0 {
        out.push('\n');
    }
}

fn render_inline_children(node: &DomNode, out: &mut String, ctx: &RenderCtx) {
    for child in node.children() {
        render_inline(child, out, ctx);
    }
}

fn render_inline(node: &DomNode, out: &mut String, ctx: &RenderCtx) {
    match node {
        DomNode::Text(text) => collapse_whitespace(text, out),
        DomNode::Element { name, .. } => {
            if SKIPPED_TAGS.contains(&name.as_str()) {
                return;
            }
            match name.as_str() {
                "a" => {
                    let mut text = String::new();
                    render_inline_children(node, &mut text, ctx);
                    let text = text.trim().to_string();
                    match node.attr("href") {
                        Some(href) => {
                            let label = if text.is_empty() { href } else { text.as_str() };
                            out.push_str(&format!("[{}]({})", label, ctx.link_target(href)));
                        }
                        None => out.push_str(&text),
                    }
                }
                "img" => {
                    if let Some(src) = node.attr("src") {
                        let alt = node.attr("alt").unwrap_or_default();
                        out.push_str(&format!("![{}]({})", alt, ctx.image_target(src)));
                    }
                }
                "strong" | "b" => wrap_inline(node, out, ctx, "**"),
                "em" | "i" => wrap_inline(node, out, ctx, "*"),
                "code" => {
                    let code = node.text_content();
                    let code = code.trim();
                    if !code.is_empty() {
                        out.push_str(&format!("`{}`", code));
                    }
                }
                "br" => out.push('\n'),
                _ => render_inline_children(node, out, ctx),
            }
        }
    }
}

fn wrap_inline(node: &DomNode, out: &mut String, ctx: &RenderCtx, marker: &str) {
    let mut inner = String::new();
    render_inline_children(node, &mut inner, ctx);
    let inner = inner.trim();
    if !inner.is_empty() {
        out.push_str(marker);
        out.push_str(inner);
        out.push_str(marker);
    }
}

fn collapse_whitespace(text: &str, out: &mut String) {
    let mut last_space = out.is_empty() || out.ends_with([' ', '\n']);
    for c in text.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
                last_space = true;
            }
        } else {
            out.push(c);
            last_space = false;
        }
    }
}

fn tidy(text: &str) -> String {
    let mut result = text.replace("\r\n", "\n");
    while result.contains("\n\n\n") {
        result = result.replace("\n\n\n", "\n\n");
    }
    result.trim().to_string()
}
