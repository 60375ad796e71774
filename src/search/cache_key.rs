use super::request::SearchRequest;
use sha2::{Digest, Sha256};

pub const CACHE_KEY_PREFIX: &str = "tools:v1:";

/// Longer keys are replaced by a digest of their body.
pub const MAX_STRUCTURED_KEY_BYTES: usize = 256;

/// Derives the canonical cache key of a search.
///
/// Fields are written in sorted-by-name order and tags are already held in a
/// sorted set, so two equal requests always yield the same key no matter how
/// they were built.
pub fn derive_key(request: &SearchRequest) -> String {
    let tags = request
        .tag_slugs
        .iter()
        .map(|t| urlencoding::encode(t).into_owned())
        .collect::<Vec<_>>()
        .join(",");

    let body = format!(
        "category={}&page={}&pageSize={}&q={}&sort={}&tags={}",
        urlencoding::encode(request.category_slug.as_deref().unwrap_or("")),
        request.page,
        request.page_size,
        urlencoding::encode(request.query.as_deref().unwrap_or("")),
        request.sort.as_str(),
        tags,
    );

    if CACHE_KEY_PREFIX.len() + body.len() <= MAX_STRUCTURED_KEY_BYTES {
        format!("{}{}", CACHE_KEY_PREFIX, body)
    } else {
        let digest = Sha256::digest(body.as_bytes());
        let hex: String = digest.iter().map(|b| format!("{:02x}", b)).collect();
        format!("{}sha256:{}", CACHE_KEY_PREFIX, hex)
    }
}
