//! Local file fetcher.
//!
//! Accepts plain paths (with `~` expansion) and `file://` URLs. Remote
//! schemes are rejected; plug a network-capable [`Fetcher`] in for those.

use futures_util::future::BoxFuture;
use std::path::{Path, PathBuf};

use crate::error::BoxError;
use crate::options::FetchParams;
use crate::player::{Blob, Fetcher};

#[derive(Debug, Clone, Default)]
pub struct FileFetcher;

impl FileFetcher {
    pub fn new() -> Self {
        Self
    }

    /// Resolve `url` to a local path.
    pub fn resolve(url: &str) -> Result<PathBuf, BoxError> {
        let path = match url.split_once("://") {
            Some(("file", rest)) => rest,
            Some((scheme, _)) => return Err(format!("Unsupported URL scheme: {scheme}").into()),
            None => url,
        };
        if path.is_empty() {
            return Err("Empty audio URL".into());
        }
        Ok(PathBuf::from(shellexpand::tilde(path).as_ref()))
    }
}

fn mime_for(path: &Path) -> Option<String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())?;
    match ext.as_str() {
        "wav" => Some("audio/wav".to_string()),
        "flac" => Some("audio/flac".to_string()),
        _ => None,
    }
}

impl Fetcher for FileFetcher {
    fn fetch_blob<'a>(
        &'a self,
        url: &'a str,
        params: &'a FetchParams,
    ) -> BoxFuture<'a, Result<Blob, BoxError>> {
        Box::pin(async move {
            if params.method.is_some() || !params.headers.is_empty() {
                log::debug!("Request parameters are ignored for local files");
            }
            let path = Self::resolve(url)?;
            let bytes = tokio::fs::read(&path)
                .await
                .map_err(|e| format!("Could not read {}: {e}", path.display()))?;
            Ok(Blob {
                bytes,
                mime: mime_for(&path),
            })
        })
    }
}
