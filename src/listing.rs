//! Directory listing discovery.
//!
//! A listing page is any HTML page whose `href="..."` anchors name the files
//! of one directory. Only direct children are kept: a link containing a `/`
//! points somewhere else (a parent, a subdirectory or another host) and is
//! dropped. Subdirectories are never followed.
//!
//! ```rust
//! use regex::Regex;
//! use slurp::listing::filter_and_qualify;
//!
//! let links = vec!["a.txt".to_string(), "b.txt".to_string(), "sub/c.txt".to_string()];
//! let pattern = Regex::new(r".*\.txt$").unwrap();
//! let urls = filter_and_qualify(&links, &pattern, "http://example/dir/");
//! let urls: Vec<_> = urls.iter().map(|u| u.as_str()).collect();
//! assert_eq!(urls, ["http://example/dir/a.txt", "http://example/dir/b.txt"]);
//! ```

use crate::download::Download;
use crate::error::{Error, Result};

use regex::Regex;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::collections::HashSet;
use std::convert::TryFrom;
use std::sync::LazyLock;
use tracing::{debug, info, warn};

static LINK_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"href="([^"]+)""#).expect("link regex is valid"));

/// Compile the file name filter. An empty expression matches every name.
pub fn pattern(expr: &str) -> Result<Regex> {
    Ok(Regex::new(expr)?)
}

/// Fetch a listing page and return its link targets, as written, without
/// duplicates and in page order.
pub async fn list(client: &ClientWithMiddleware, url: &str) -> Result<Vec<String>> {
    let listing_error = |message: String| Error::Listing {
        url: url.to_string(),
        message,
    };

    debug!("Listing {}", url);
    let res = client
        .get(url)
        .send()
        .await
        .map_err(|e| listing_error(e.to_string()))?;

    let status = res.status();
    if !status.is_success() {
        return Err(listing_error(format!("server answered {}", status)));
    }

    let page = res.text().await.map_err(|e| listing_error(e.to_string()))?;
    Ok(extract_links(&page))
}

/// Every `href="..."` target of `page`, first occurrence only.
pub fn extract_links(page: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    LINK_PATTERN
        .captures_iter(page)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .filter(|link| seen.insert(link.clone()))
        .collect()
}

/// Keep the direct children of `base` matching `pattern` and turn them into
/// absolute addresses.
pub fn filter_and_qualify(links: &[String], pattern: &Regex, base: &str) -> Vec<Url> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }

    links
        .iter()
        .filter(|link| !link.contains('/'))
        // Sort and fragment links point back at the listing itself.
        .filter(|link| !link.starts_with('?') && !link.starts_with('#'))
        .filter(|link| pattern.is_match(link))
        .filter_map(|link| {
            let address = format!("{}{}", base, link);
            match Url::parse(&address) {
                Ok(url) => Some(url),
                Err(e) => {
                    warn!(%address, error = %e, "Skipping unparsable link");
                    None
                }
            }
        })
        .collect()
}

/// List every address in turn and build the downloads of the whole run.
///
/// The first listing that cannot be fetched aborts the resolution.
pub async fn resolve(
    client: &ClientWithMiddleware,
    addresses: &[String],
    pattern: &Regex,
) -> Result<Vec<Download>> {
    let mut downloads = Vec::new();
    for address in addresses {
        let links = list(client, address).await?;
        let urls = filter_and_qualify(&links, pattern, address);
        info!(listing = %address, links = links.len(), files = urls.len(), "Listed");

        for url in urls {
            match Download::try_from(&url) {
                Ok(d) => downloads.push(d),
                Err(e) => warn!(%url, error = %e, "Skipping link"),
            }
        }
    }
    Ok(downloads)
}
