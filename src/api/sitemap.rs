//! Sitemap `<loc>` extraction
//!
//! Only the URLs matter here; `lastmod`, `changefreq` and `priority` are
//! ignored.

use quick_xml::events::Event;
use quick_xml::Reader;

/// URLs found in one sitemap document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SitemapDocument {
    /// Page URLs from `<urlset><url><loc>`
    pub page_urls: Vec<String>,
    /// Child sitemap URLs from `<sitemapindex><sitemap><loc>`
    pub child_sitemaps: Vec<String>,
}

/// Parses a sitemap or sitemap index
///
/// # Examples
///
/// ```
/// use gsc_indexer::api::parse_sitemap;
///
/// let xml = r#"<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
///   <url><loc>https://example.com/page1</loc></url>
/// </urlset>"#;
///
/// let doc = parse_sitemap(xml).unwrap();
/// assert_eq!(doc.page_urls, vec!["https://example.com/page1"]);
/// ```
pub fn parse_sitemap(xml: &str) -> Result<SitemapDocument, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut doc = SitemapDocument::default();
    let mut buf = Vec::new();
    let mut parent: Option<String> = None;
    let mut in_loc = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" | "sitemap" => parent = Some(name),
                    "loc" if parent.is_some() => in_loc = true,
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                let name = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                match name.as_str() {
                    "url" | "sitemap" => parent = None,
                    "loc" => in_loc = false,
                    _ => {}
                }
            }
            Ok(Event::Text(e)) if in_loc => {
                let text = e.unescape().map_err(|e| e.to_string())?;
                push_loc(&mut doc, parent.as_deref(), text.trim());
            }
            Ok(Event::CData(e)) if in_loc => {
                let text = String::from_utf8_lossy(&e.into_inner()).to_string();
                push_loc(&mut doc, parent.as_deref(), text.trim());
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(format!("XML parse error: {}", e)),
            _ => {}
        }
        buf.clear();
    }

    Ok(doc)
}

fn push_loc(doc: &mut SitemapDocument, parent: Option<&str>, loc: &str) {
    if loc.is_empty() {
        return;
    }
    match parent {
        Some("url") => doc.page_urls.push(loc.to_string()),
        Some("sitemap") => doc.child_sitemaps.push(loc.to_string()),
        _ => {}
    }
}
