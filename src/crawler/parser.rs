//! HTML parser adapter
//!
//! Wraps the HTML parsing capability behind a small, stable node model: a
//! [`DomNode`] tree with Element and Text variants. The link rewriter and
//! the markdown exporter are both written against this tree, never against
//! the parsing library directly. Parsing is lenient; any byte soup yields a
//! tree.

use scraper::node::Node;
use scraper::{ElementRef, Html};

/// A node in the parsed document tree
#[derive(Debug, Clone, PartialEq)]
pub enum DomNode {
    Element {
        name: String,
        attrs: Vec<(String, String)>,
        children: Vec<DomNode>,
    },
    Text(String),
}

impl DomNode {
    /// Element name, lowercased by the parser; None for text nodes
    pub fn name(&self) -> Option<&str> {
        match self {
            DomNode::Element { name, .. } => Some(name),
            DomNode::Text(_) => None,
        }
    }

    /// First attribute with the given name
    pub fn attr(&self, attr_name: &str) -> Option<&str> {
        match self {
            DomNode::Element { attrs, .. } => attrs
                .iter()
                .find(|(k, _)| k == attr_name)
                .map(|(_, v)| v.as_str()),
            DomNode::Text(_) => None,
        }
    }

    pub fn children(&self) -> &[DomNode] {
        match self {
            DomNode::Element { children, .. } => children,
            DomNode::Text(_) => &[],
        }
    }

    /// Visits every element in document (pre-)order
    pub fn walk_elements<'a>(&'a self, visit: &mut dyn FnMut(&'a DomNode)) {
        if let DomNode::Element { children, .. } = self {
            visit(self);
            for child in children {
                child.walk_elements(visit);
            }
        }
    }

    /// Depth-first search for the first element matching the predicate
    pub fn find_element(&self, pred: &dyn Fn(&DomNode) -> bool) -> Option<&DomNode> {
        if let DomNode::Element { children, .. } = self {
            if pred(self) {
                return Some(self);
            }
            for child in children {
                if let Some(found) = child.find_element(pred) {
                    return Some(found);
                }
            }
        }
        None
    }

    /// Concatenated text content of the subtree
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            DomNode::Text(text) => out.push_str(text),
            DomNode::Element { children, .. } => {
                for child in children {
                    child.collect_text(out);
                }
            }
        }
    }

    fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .map(|v| v.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }
}

/// What role a link-bearing attribute plays in the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    /// `a[href]`: a hyperlink to follow or rewrite
    Hyperlink,
    /// `img[src]`
    Image,
    /// `link[href]` carrying a stylesheet or icon
    Stylesheet,
    /// `script[src]`
    Script,
}

/// One link-bearing attribute found in the markup, in document order
#[derive(Debug, Clone)]
pub struct LinkRef {
    pub kind: RefKind,
    pub attr: &'static str,
    pub value: String,
}

/// A parsed page: title plus the full node tree
#[derive(Debug, Clone)]
pub struct ParsedPage {
    pub title: Option<String>,
    pub root: DomNode,
}

impl ParsedPage {
    /// Collects every rewritable link-bearing attribute in document order.
    ///
    /// Bare fragments (`#top`) and non-navigational schemes (`javascript:`,
    /// `mailto:`, `tel:`, `data:`) are excluded; the rewriter leaves them
    /// untouched and the crawl never follows them.
    pub fn link_refs(&self) -> Vec<LinkRef> {
        let mut refs = Vec::new();
        self.root.walk_elements(&mut |node| {
            let Some(name) = node.name() else { return };
            let (kind, attr) = match name {
                "a" => (RefKind::Hyperlink, "href"),
                "img" => (RefKind::Image, "src"),
                "script" => (RefKind::Script, "src"),
                "link" => {
                    let rel = node.attr("rel").unwrap_or_default().to_lowercase();
                    if !rel.split_whitespace().any(|r| r == "stylesheet" || r == "icon") {
                        return;
                    }
                    (RefKind::Stylesheet, "href")
                }
                _ => return,
            };
            if let Some(value) = node.attr(attr) {
                if is_rewritable_reference(value) {
                    refs.push(LinkRef {
                        kind,
                        attr,
                        value: value.to_string(),
                    });
                }
            }
        });
        refs
    }

    /// Raw `img[src]` values in document order, deduplicated
    pub fn image_sources(&self) -> Vec<String> {
        let mut seen = std::collections::HashSet::new();
        self.link_refs()
            .into_iter()
            .filter(|r| r.kind == RefKind::Image)
            .filter(|r| seen.insert(r.value.clone()))
            .map(|r| r.value)
            .collect()
    }

    /// Picks the most content-like subtree for markdown export:
    /// `main`, then `article`, then `div.content`, then `body`, then the root.
    pub fn content_root(&self) -> &DomNode {
        self.root
            .find_element(&|n| n.name() == Some("main"))
            .or_else(|| self.root.find_element(&|n| n.name() == Some("article")))
            .or_else(|| {
                self.root
                    .find_element(&|n| n.name() == Some("div") && n.has_class("content"))
            })
            .or_else(|| self.root.find_element(&|n| n.name() == Some("body")))
            .unwrap_or(&self.root)
    }
}

/// Parses HTML into a [`ParsedPage`]. Never fails: malformed markup yields
/// whatever tree the lenient parser can recover.
pub fn parse_document(html: &str) -> ParsedPage {
    let document = Html::parse_document(html);
    let root = build_node(document.root_element());

    let title = root
        .find_element(&|n| n.name() == Some("title"))
        .map(|n| n.text_content().trim().to_string())
        .filter(|t| !t.is_empty());

    ParsedPage { title, root }
}

fn build_node(element: ElementRef) -> DomNode {
    let value = element.value();
    let name = value.name().to_string();
    let attrs = value
        .attrs()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    let mut children = Vec::new();
    for child in element.children() {
        match child.value() {
            Node::Element(_) => {
                if let Some(child_ref) = ElementRef::wrap(child) {
                    children.push(build_node(child_ref));
                }
            }
            Node::Text(text) => children.push(DomNode::Text(text.text.to_string())),
            _ => {}
        }
    }

    DomNode::Element {
        name,
        attrs,
        children,
    }
}

fn is_rewritable_reference(value: &str) -> bool {
    let value = value.trim();
    if value.is_empty() || value.starts_with('#') {
        return false;
    }
    let lower = value.to_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_title() {
        let page = parse_document("<html><head><title>  My Page </title></head><body></body></html>");
        assert_eq!(page.title, Some("My Page".to_string()));
    }

    #[test]
    fn test_missing_title() {
        let page = parse_document("<html><body><p>hi</p></body></html>");
        assert_eq!(page.title, None);
    }

    #[test]
    fn test_link_refs_in_document_order() {
        let html = r#"<html><head>
            <link rel="stylesheet" href="/site.css">
            <script src="/app.js"></script>
        </head><body>
            <a href="/one">one</a>
            <img src="/pic.png">
            <a href="/two">two</a>
        </body></html>"#;
        let page = parse_document(html);
        let refs = page.link_refs();

        let values: Vec<&str> = refs.iter().map(|r| r.value.as_str()).collect();
        assert_eq!(values, vec!["/site.css", "/app.js", "/one", "/pic.png", "/two"]);
        assert_eq!(refs[0].kind, RefKind::Stylesheet);
        assert_eq!(refs[1].kind, RefKind::Script);
        assert_eq!(refs[2].kind, RefKind::Hyperlink);
        assert_eq!(refs[3].kind, RefKind::Image);
    }

    #[test]
    fn test_non_stylesheet_link_tags_ignored() {
        let html = r#"<html><head>
            <link rel="canonical" href="https://example.com/page">
            <link rel="icon" href="/favicon.ico">
        </head><body></body></html>"#;
        let page = parse_document(html);
        let refs = page.link_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].value, "/favicon.ico");
    }

    #[test]
    fn test_skip_fragments_and_special_schemes() {
        let html = r##"<html><body>
            <a href="#section">anchor</a>
            <a href="javascript:void(0)">js</a>
            <a href="mailto:x@example.com">mail</a>
            <a href="tel:+123">tel</a>
            <a href="data:text/plain,hi">data</a>
            <a href="/kept">kept</a>
        </body></html>"##;
        let page = parse_document(html);
        let refs = page.link_refs();
        assert_eq!(refs.len(), 1);
        assert_eq!(refs[0].value, "/kept");
    }

    #[test]
    fn test_image_sources_deduplicated() {
        let html = r#"<html><body>
            <img src="/a.png"><img src="/b.png"><img src="/a.png">
        </body></html>"#;
        let page = parse_document(html);
        assert_eq!(page.image_sources(), vec!["/a.png", "/b.png"]);
    }

    #[test]
    fn test_content_root_prefers_main() {
        let html = r#"<html><body>
            <nav>menu</nav>
            <main><p>real content</p></main>
        </body></html>"#;
        let page = parse_document(html);
        assert_eq!(page.content_root().name(), Some("main"));
    }

    #[test]
    fn test_content_root_div_content_fallback() {
        let html = r#"<html><body>
            <div class="sidebar">x</div>
            <div class="content main-area"><p>hello</p></div>
        </body></html>"#;
        let page = parse_document(html);
        let root = page.content_root();
        assert_eq!(root.name(), Some("div"));
        assert!(root.attr("class").unwrap().contains("content"));
    }

    #[test]
    fn test_content_root_body_fallback() {
        let page = parse_document("<html><body><p>plain</p></body></html>");
        assert_eq!(page.content_root().name(), Some("body"));
    }

    #[test]
    fn test_text_content_concatenates() {
        let page = parse_document("<html><body><p>a<b>b</b>c</p></body></html>");
        assert_eq!(page.content_root().text_content(), "abc");
    }

    #[test]
    fn test_malformed_markup_still_parses() {
        let page = parse_document("<p>unclosed <a href='/x'>link");
        assert_eq!(page.link_refs().len(), 1);
    }
}
