use std::fs;
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result, anyhow};
use log::debug;
use once_cell::sync::OnceCell;
use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::{ETAG, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED, USER_AGENT};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

const REQUEST_TIMEOUT_SECS: u64 = 30;
const CACHE_DIR: &str = "gridiron_sync";
const AGENT: &str = concat!("gridiron_sync/", env!("CARGO_PKG_VERSION"));

static CLIENT: OnceCell<Client> = OnceCell::new();

pub fn client() -> Result<&'static Client> {
    CLIENT.get_or_try_init(|| {
        Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("failed to build http client")
    })
}

/// Validators and bookkeeping for one cached body; stored as a sidecar next
/// to the body file so a large season payload never rewrites anything else.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheMeta {
    url: String,
    etag: Option<String>,
    last_modified: Option<String>,
    fetched_at: u64,
}

/// Conditional GET: revalidates with ETag/Last-Modified when we have a
/// cached copy, and serves the cached body on 304.
pub fn fetch_cached(client: &Client, url: &str) -> Result<String> {
    let cached = load_cached(url);

    let mut req = client.get(url).header(USER_AGENT, AGENT);
    if let Some((meta, _)) = cached.as_ref() {
        if let Some(etag) = meta.etag.as_ref() {
            req = req.header(IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = meta.last_modified.as_ref() {
            req = req.header(IF_MODIFIED_SINCE, last_modified);
        }
    }

    let resp = req.send().with_context(|| format!("request failed: {url}"))?;
    let status = resp.status();
    let headers = resp.headers().clone();

    if status == StatusCode::NOT_MODIFIED {
        if let Some((_, body)) = cached {
            debug!("http cache revalidated: {url}");
            return Ok(body);
        }
        return Err(anyhow!("received 304 without a cached body: {url}"));
    }

    let body = resp.text().context("failed reading response body")?;
    if !status.is_success() {
        return Err(anyhow!("http {status}: {url}"));
    }

    let meta = CacheMeta {
        url: url.to_string(),
        etag: headers
            .get(ETAG)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        last_modified: headers
            .get(LAST_MODIFIED)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        fetched_at: unix_now(),
    };
    store_cached(url, &meta, &body);
    Ok(body)
}

fn load_cached(url: &str) -> Option<(CacheMeta, String)> {
    let (meta_path, body_path) = cache_paths(url)?;
    let meta: CacheMeta = serde_json::from_str(&fs::read_to_string(meta_path).ok()?).ok()?;
    let body = fs::read_to_string(body_path).ok()?;
    Some((meta, body))
}

// Cache writes are best-effort: a failed write only costs a refetch.
fn store_cached(url: &str, meta: &CacheMeta, body: &str) {
    let Some((meta_path, body_path)) = cache_paths(url) else {
        return;
    };
    let Some(dir) = body_path.parent() else {
        return;
    };
    let _ = fs::create_dir_all(dir);

    let tmp = body_path.with_extension("body.tmp");
    if fs::write(&tmp, body).is_ok() && fs::rename(&tmp, &body_path).is_ok() {
        if let Ok(json) = serde_json::to_string(meta) {
            let tmp = meta_path.with_extension("meta.tmp");
            if fs::write(&tmp, json).is_ok() {
                let _ = fs::rename(&tmp, &meta_path);
            }
        }
    }
}

fn cache_paths(url: &str) -> Option<(PathBuf, PathBuf)> {
    let dir = app_cache_dir()?.join("http");
    let key = cache_key(url);
    Some((dir.join(format!("{key}.meta")), dir.join(format!("{key}.body"))))
}

fn cache_key(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    let mut out = String::with_capacity(32);
    for byte in digest.iter().take(16) {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = std::env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = std::env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::cache_key;

    #[test]
    fn cache_keys_are_stable_and_distinct() {
        let a = cache_key("https://example.com/a.json");
        let b = cache_key("https://example.com/b.json");
        assert_eq!(a, cache_key("https://example.com/a.json"));
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
