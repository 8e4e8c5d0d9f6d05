//! The file descriptor handed through the order queue.
//!
//! A [`Download`] pairs an absolute address with the file name the output
//! sink stores it under.
//!
//! ```rust
//! use slurp::download::Download;
//! use std::convert::TryFrom;
//!
//! let download = Download::try_from("http://example.com/pub/file-0.1.2.tar.gz")?;
//! assert_eq!(download.filename, "file-0.1.2.tar.gz");
//! # Ok::<(), slurp::Error>(())
//! ```

use crate::error::Error;

use percent_encoding::percent_decode_str;
use reqwest::Url;
use std::convert::TryFrom;

/// Represents a file to be downloaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Download {
    /// URL of the file to download.
    pub url: Url,
    /// File name used to store the file in the output sink.
    pub filename: String,
}

impl Download {
    /// Creates a new [`Download`].
    ///
    /// When using the [`Download::try_from`] method, the file name is
    /// automatically extracted from the URL.
    pub fn new(url: &Url, filename: &str) -> Self {
        Self {
            url: url.clone(),
            filename: String::from(filename),
        }
    }
}

impl TryFrom<&Url> for Download {
    type Error = crate::error::Error;

    fn try_from(value: &Url) -> Result<Self, Self::Error> {
        value
            .path_segments()
            .ok_or_else(|| {
                Error::InvalidUrl(format!(
                    "The url \"{}\" does not contain a valid path",
                    value
                ))
            })?
            .next_back()
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| {
                Error::InvalidUrl(format!("The url \"{}\" does not contain a filename", value))
            })
            .and_then(|segment| {
                let filename = percent_decode_str(segment).decode_utf8().map_err(|e| {
                    Error::InvalidUrl(format!(
                        "The url \"{}\" has a file name that is not UTF-8: {}",
                        value, e
                    ))
                })?;
                if !is_plain_filename(&filename) {
                    return Err(Error::InvalidUrl(format!(
                        "The url \"{}\" does not name a plain file: \"{}\"",
                        value, filename
                    )));
                }
                Ok(Download {
                    url: value.clone(),
                    filename: filename.into_owned(),
                })
            })
    }
}

/// A name that stays inside the output root once joined to it.
fn is_plain_filename(name: &str) -> bool {
    !matches!(name, "" | "." | "..") && !name.contains(['/', '\\', '\0'])
}

impl TryFrom<&str> for Download {
    type Error = crate::error::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Url::parse(value)
            .map_err(|e| {
                Error::InvalidUrl(format!("The url \"{}\" cannot be parsed: {}", value, e))
            })
            .and_then(|u| Download::try_from(&u))
    }
}
