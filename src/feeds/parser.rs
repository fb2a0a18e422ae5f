//! RSS 2.0 and Atom normalization.
//!
//! The document is read into a small element tree first so that the field
//! fallbacks below can be expressed as lookups. Anything that is not a
//! well-formed `rss/channel` or `feed` document parses to no articles.

use serde::Serialize;
use xml::reader::{ParserConfig, XmlEvent};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParsedArticle {
    pub guid: String,
    pub title: String,
    pub link: String,
    /// Date as written in the document.
    pub published_at: Option<String>,
    pub author: Option<String>,
}

impl ParsedArticle {
    /// Articles without a guid or a title cannot be stored or shown.
    pub fn is_usable(&self) -> bool {
        !self.guid.is_empty() && !self.title.is_empty()
    }

    /// `published_at` as unix seconds, for RFC 2822 (RSS) or RFC 3339 (Atom).
    pub fn published_timestamp(&self) -> Option<i64> {
        let raw = self.published_at.as_deref()?;
        chrono::DateTime::parse_from_rfc2822(raw)
            .or_else(|_| chrono::DateTime::parse_from_rfc3339(raw))
            .map(|date| date.timestamp())
            .ok()
    }
}

pub fn parse_feed(xml: &str) -> Vec<ParsedArticle> {
    let root = match read_tree(xml) {
        Some(root) => root,
        None => {
            log::debug!("Feed document is not well-formed XML");
            return Vec::new();
        }
    };

    match (root.prefix.as_deref(), root.name.as_str()) {
        (None, "rss") => match root.child("channel") {
            Some(channel) => channel.children_named("item").map(rss_item).collect(),
            None => Vec::new(),
        },
        (None, "feed") => root.children_named("entry").map(atom_entry).collect(),
        (_, other) => {
            log::debug!("Unsupported feed root element <{other}>");
            Vec::new()
        }
    }
}

/// Title of the feed itself, used when a feed is added without one.
pub fn discover_title(xml: &str) -> Option<String> {
    match feed_rs::parser::parse(xml.as_bytes()) {
        Ok(feed) => feed
            .title
            .map(|title| title.content.trim().to_string())
            .filter(|title| !title.is_empty()),
        Err(e) => {
            log::debug!("Could not read feed metadata: {e}");
            None
        }
    }
}

fn rss_item(item: &Node) -> ParsedArticle {
    let link = item.child_text("link").unwrap_or_default();
    let guid = item
        .child_text("guid")
        .unwrap_or_else(|| link.clone());
    let author = item
        .child_ns("dc", "creator")
        .map(Node::text)
        .filter(|author| !author.is_empty())
        .or_else(|| item.child_text("author"));

    ParsedArticle {
        guid,
        title: item.child_text("title").unwrap_or_default(),
        link,
        published_at: item.child_text("pubDate"),
        author,
    }
}

fn atom_entry(entry: &Node) -> ParsedArticle {
    let link = atom_link(entry).unwrap_or_default();
    let guid = entry.child_text("id").unwrap_or_else(|| link.clone());
    let author = entry.child("author").and_then(|author| {
        match author.child_text("name") {
            Some(name) => Some(name),
            // Bare `<author>Name</author>`; an author with only `<email>` or
            // `<uri>` has no usable name.
            None if author.children.is_empty() => {
                Some(author.text()).filter(|text| !text.is_empty())
            }
            None => None,
        }
    });

    ParsedArticle {
        guid,
        title: entry.child_text("title").unwrap_or_default(),
        link,
        published_at: entry
            .child_text("published")
            .or_else(|| entry.child_text("updated")),
        author,
    }
}

fn atom_link(entry: &Node) -> Option<String> {
    let links: Vec<&Node> = entry.children_named("link").collect();
    let chosen = match links.as_slice() {
        [] => return None,
        [only] => *only,
        [first, ..] => links
            .iter()
            .copied()
            .find(|link| link.attr("rel") == Some("alternate"))
            .unwrap_or(*first),
    };
    chosen
        .attr("href")
        .map(|href| href.trim().to_string())
        .filter(|href| !href.is_empty())
}

#[derive(Debug, Default)]
struct Node {
    name: String,
    prefix: Option<String>,
    attributes: Vec<(String, String)>,
    children: Vec<Node>,
    text: String,
}

impl Node {
    fn child<'a>(&'a self, name: &'a str) -> Option<&'a Node> {
        self.children_named(name).next()
    }

    fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Node> + 'a {
        self.children
            .iter()
            .filter(move |child| child.prefix.is_none() && child.name == name)
    }

    fn child_ns(&self, prefix: &str, name: &str) -> Option<&Node> {
        self.children
            .iter()
            .find(|child| child.prefix.as_deref() == Some(prefix) && child.name == name)
    }

    /// Trimmed text of a child, `None` when missing or blank.
    fn child_text(&self, name: &str) -> Option<String> {
        self.child(name)
            .map(Node::text)
            .filter(|text| !text.is_empty())
    }

    fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// All character data below this node, trimmed.
    fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out.trim().to_string()
    }

    fn collect_text(&self, out: &mut String) {
        out.push_str(&self.text);
        for child in &self.children {
            child.collect_text(out);
        }
    }
}

fn read_tree(xml: &str) -> Option<Node> {
    let reader = ParserConfig::new()
        .cdata_to_characters(true)
        .create_reader(xml.as_bytes());

    let mut stack: Vec<Node> = Vec::new();
    let mut root = None;

    for event in reader {
        match event.ok()? {
            XmlEvent::StartElement {
                name, attributes, ..
            } => {
                stack.push(Node {
                    name: name.local_name,
                    prefix: name.prefix,
                    attributes: attributes
                        .into_iter()
                        .filter(|attr| attr.name.prefix.is_none())
                        .map(|attr| (attr.name.local_name, attr.value))
                        .collect(),
                    ..Default::default()
                });
            }
            XmlEvent::EndElement { .. } => {
                let node = stack.pop()?;
                match stack.last_mut() {
                    Some(parent) => parent.children.push(node),
                    None => root = Some(node),
                }
            }
            XmlEvent::Characters(text) | XmlEvent::CData(text) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&text);
                }
            }
            _ => {}
        }
    }

    root
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:dc="http://purl.org/dc/elements/1.1/">
  <channel>
    <title>Example</title>
    <item>
      <title>Article 1</title>
      <link>https://example.com/1</link>
      <guid>guid-1</guid>
      <pubDate>Mon, 01 Jan 2024 00:00:00 GMT</pubDate>
      <dc:creator>Author 1</dc:creator>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_rss_item_fields() {
        let articles = parse_feed(RSS);
        assert_eq!(
            articles,
            vec![ParsedArticle {
                guid: "guid-1".into(),
                title: "Article 1".into(),
                link: "https://example.com/1".into(),
                published_at: Some("Mon, 01 Jan 2024 00:00:00 GMT".into()),
                author: Some("Author 1".into()),
            }]
        );
        assert_eq!(articles[0].published_timestamp(), Some(1_704_067_200));
    }

    #[test]
    fn test_malformed_input_is_empty() {
        assert!(parse_feed("this is not xml at all <><>").is_empty());
        assert!(parse_feed("").is_empty());
        assert!(parse_feed("<rss><channel><item></channel></rss>").is_empty());
    }

    #[test]
    fn test_unknown_root_is_empty() {
        let rdf = r#"<rdf:RDF xmlns:rdf="http://www.w3.org/1999/02/22-rdf-syntax-ns#"><item><title>x</title></item></rdf:RDF>"#;
        assert!(parse_feed(rdf).is_empty());
        assert!(parse_feed("<rss version=\"2.0\"></rss>").is_empty());
    }

    #[test]
    fn test_rss_fallbacks() {
        let xml = r#"<rss version="2.0"><channel>
            <item>
              <title><![CDATA[ Cdata title ]]></title>
              <link>https://example.com/a</link>
              <author>someone@example.com</author>
            </item>
            <item>
              <title>Permalink guid</title>
              <guid isPermaLink="true">https://example.com/b</guid>
            </item>
            <item>
              <link>https://example.com/c</link>
            </item>
        </channel></rss>"#;

        let articles = parse_feed(xml);
        assert_eq!(articles.len(), 3);

        assert_eq!(articles[0].title, "Cdata title");
        assert_eq!(articles[0].guid, "https://example.com/a");
        assert_eq!(articles[0].author.as_deref(), Some("someone@example.com"));
        assert_eq!(articles[0].published_at, None);

        assert_eq!(articles[1].guid, "https://example.com/b");
        assert_eq!(articles[1].link, "");
        assert_eq!(articles[1].author, None);

        assert_eq!(articles[2].title, "");
        assert!(!articles[2].is_usable());
    }

    #[test]
    fn test_atom_alternate_link() {
        let xml = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Example Atom</title>
  <entry>
    <title>Entry 1</title>
    <link href="https://example.com/entry-1" rel="alternate"/>
    <id>urn:uuid:1</id>
    <updated>2024-01-02T00:00:00Z</updated>
  </entry>
</feed>"#;

        let articles = parse_feed(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].link, "https://example.com/entry-1");
        assert_eq!(articles[0].guid, "urn:uuid:1");
        assert_eq!(articles[0].published_at.as_deref(), Some("2024-01-02T00:00:00Z"));
        assert_eq!(articles[0].published_timestamp(), Some(1_704_153_600));
    }

    #[test]
    fn test_atom_link_choice_and_fallbacks() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <title type="html">Typed &amp; escaped</title>
    <link rel="replies" href="https://example.com/2/comments"/>
    <link rel="alternate" href="https://example.com/2"/>
    <author><name>Jane</name><email>jane@example.com</email></author>
    <published>2024-02-01T10:00:00+01:00</published>
    <updated>2024-02-03T10:00:00Z</updated>
  </entry>
  <entry>
    <title>No alternate</title>
    <link rel="enclosure" href="https://example.com/3.mp3"/>
    <link rel="related" href="https://example.com/3"/>
    <author>Bare Author</author>
  </entry>
</feed>"#;

        let articles = parse_feed(xml);
        assert_eq!(articles.len(), 2);

        assert_eq!(articles[0].title, "Typed & escaped");
        assert_eq!(articles[0].link, "https://example.com/2");
        assert_eq!(articles[0].guid, "https://example.com/2");
        assert_eq!(articles[0].author.as_deref(), Some("Jane"));
        assert_eq!(
            articles[0].published_at.as_deref(),
            Some("2024-02-01T10:00:00+01:00")
        );

        assert_eq!(articles[1].link, "https://example.com/3.mp3");
        assert_eq!(articles[1].guid, "https://example.com/3.mp3");
        assert_eq!(articles[1].author.as_deref(), Some("Bare Author"));
        assert_eq!(articles[1].published_at, None);
    }

    #[test]
    fn test_atom_author_without_name_is_none() {
        let xml = r#"<feed xmlns="http://www.w3.org/2005/Atom">
  <entry>
    <id>urn:1</id>
    <title>Email only</title>
    <author><email>x@y.example</email></author>
  </entry>
</feed>"#;

        let articles = parse_feed(xml);
        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].author, None);
    }

    #[test]
    fn test_discover_title() {
        assert_eq!(discover_title(RSS).as_deref(), Some("Example"));
        assert_eq!(discover_title("nope"), None);
    }
}
