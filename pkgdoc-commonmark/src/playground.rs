//! "Open in playground" link detection.
use std::collections::HashSet;

use kuchikikiki::{NodeData, NodeRef};
use markup5ever::local_name;
use tendril::TendrilSink;
use url::Url;

use crate::types::{PlaygroundLink, PlaygroundProvider};

/// Collect links to known playground sites from a sanitized document.
///
/// Links are deduplicated by URL and returned in first-occurrence order.
#[must_use]
pub fn collect_playground_links(document: &NodeRef) -> Vec<PlaygroundLink> {
  let mut seen = HashSet::new();
  let mut links = Vec::new();

  for anchor in document.descendants() {
    let Some(element) = anchor.as_element() else {
      continue;
    };
    if element.name.local != local_name!("a") {
      continue;
    }
    let Some(href) = element.attributes.borrow().get("href").map(str::to_string)
    else {
      continue;
    };
    let Some(provider) = playground_provider(&href) else {
      continue;
    };
    if !seen.insert(href.clone()) {
      continue;
    }

    let label = link_label(&anchor)
      .unwrap_or_else(|| provider.name().to_string());
    log::debug!("Found {} playground link: {href}", provider.name());
    links.push(PlaygroundLink {
      provider,
      provider_name: provider.name().to_string(),
      label,
      url: href,
    });
  }

  links
}

/// Collect playground links from an HTML string.
#[must_use]
pub fn extract_playground_links(html: &str) -> Vec<PlaygroundLink> {
  collect_playground_links(&kuchikikiki::parse_html().one(html))
}

fn playground_provider(href: &str) -> Option<PlaygroundProvider> {
  let url = Url::parse(href).ok()?;
  if !matches!(url.scheme(), "http" | "https") {
    return None;
  }
  PlaygroundProvider::from_host(url.host_str()?)
}

/// Alt text of a lone wrapped image, else the anchor text.
fn link_label(anchor: &NodeRef) -> Option<String> {
  let meaningful: Vec<_> = anchor
    .children()
    .filter(|child| {
      !matches!(child.data(), NodeData::Text(text) if text.borrow().trim().is_empty())
    })
    .collect();

  if let [only] = meaningful.as_slice()
    && let Some(element) = only.as_element()
    && element.name.local == local_name!("img")
  {
    let alt = element
      .attributes
      .borrow()
      .get("alt")
      .map(|alt| alt.trim().to_string())
      .unwrap_or_default();
    if !alt.is_empty() {
      return Some(alt);
    }
  }

  let text = anchor.text_contents();
  let text = text.split_whitespace().collect::<Vec<_>>().join(" ");
  (!text.is_empty()).then_some(text)
}
