//! Asset identifiers and cache keys.
//!
//! Media reference their bytes through identifiers of several historical
//! shapes: bare ids, ids carrying a legacy `local_`/`photo_` prefix, and
//! remote CDN URLs. [`AssetId::parse`] classifies an identifier once, and
//! [`AssetId::cache_key`] reduces every shape to a single [`CacheKey`] so the
//! media cache sees one key space no matter which scheme produced the id.
//!
//! # Example
//!
//! ```
//! use spotlens_types::{AssetId, normalize};
//!
//! assert_eq!(normalize("local_abc"), normalize("abc"));
//! assert_eq!(normalize("photo_abc"), normalize("abc"));
//!
//! let id = AssetId::parse("https://cdn.example.com/spots/abc123_1699999999.jpg");
//! assert!(id.is_remote());
//! assert_eq!(id.cache_key().as_str(), "abc123");
//! ```

use core::fmt;

use uuid::Uuid;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Longest cache key in bytes, leaving room for the extension within the
/// usual 255-byte file name limit.
pub const MAX_KEY_LEN: usize = 200;

/// File extension of cached blobs.
pub const CACHE_FILE_EXTENSION: &str = "jpg";

/// Prefixes used by older identifier schemes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegacyPrefix {
    /// `local_<id>`: photos captured on device before upload.
    Local,
    /// `photo_<id>`: ids minted by the first media table.
    Photo,
}

impl LegacyPrefix {
    /// All recognized prefixes, in matching order.
    pub const ALL: [LegacyPrefix; 2] = [LegacyPrefix::Local, LegacyPrefix::Photo];

    /// The literal prefix, including the trailing underscore.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            LegacyPrefix::Local => "local_",
            LegacyPrefix::Photo => "photo_",
        }
    }
}

/// A classified asset identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetId {
    /// A bare id, used as-is.
    Local(String),
    /// An id wrapped in a legacy prefix.
    Legacy { prefix: LegacyPrefix, id: String },
    /// A fully-qualified `http(s)` URL.
    Remote(String),
}

impl AssetId {
    /// Classify an identifier. Never fails and performs no I/O.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        if is_remote_url(identifier) {
            return AssetId::Remote(identifier.to_string());
        }

        for prefix in LegacyPrefix::ALL {
            if let Some(rest) = identifier.strip_prefix(prefix.as_str())
                && !rest.is_empty()
            {
                return AssetId::Legacy {
                    prefix,
                    id: rest.to_string(),
                };
            }
        }

        AssetId::Local(identifier.to_string())
    }

    /// The canonical cache key for this asset.
    ///
    /// Remote URLs yield the id token embedded in their last path segment
    /// (`<id>_<suffix>.<ext>`), or a sanitized copy of the whole URL when no
    /// such token is present. Keys longer than [`MAX_KEY_LEN`] bytes are
    /// shortened to a prefix plus a digest of the full key.
    #[must_use]
    pub fn cache_key(&self) -> CacheKey {
        let key = match self {
            AssetId::Local(id) | AssetId::Legacy { id, .. } => id.clone(),
            AssetId::Remote(url) => match url_token(url) {
                Some(token) => token.to_string(),
                None => sanitize_url(url),
            },
        };
        CacheKey(bounded(key))
    }

    /// The URL to fetch on a cache miss, for remote identifiers.
    #[must_use]
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            AssetId::Remote(url) => Some(url),
            _ => None,
        }
    }

    /// Whether this identifier has a known network origin.
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, AssetId::Remote(_))
    }
}

impl From<&str> for AssetId {
    fn from(identifier: &str) -> Self {
        AssetId::parse(identifier)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssetId::Local(id) => f.write_str(id),
            AssetId::Legacy { prefix, id } => write!(f, "{}{}", prefix.as_str(), id),
            AssetId::Remote(url) => f.write_str(url),
        }
    }
}

/// Reduce any identifier shape to its canonical cache key.
///
/// Shorthand for `AssetId::parse(identifier).cache_key()`.
#[must_use]
pub fn normalize(identifier: &str) -> CacheKey {
    AssetId::parse(identifier).cache_key()
}

/// Canonical key under which an asset is cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CacheKey(String);

impl CacheKey {
    /// Wrap an already-normalized key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Recover a key from a cache file name (`<key>.jpg`).
    #[must_use]
    pub fn from_file_name(name: &str) -> Option<Self> {
        let key = name.strip_suffix(CACHE_FILE_EXTENSION)?.strip_suffix('.')?;
        if key.is_empty() || key.starts_with('.') {
            return None;
        }
        Some(Self(key.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// File name of the cached blob for this key.
    #[must_use]
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CACHE_FILE_EXTENSION)
    }

    /// Whether the key can be used as a single file name without escaping
    /// the cache directory.
    #[must_use]
    pub fn is_path_safe(&self) -> bool {
        !self.0.is_empty()
            && !self.0.starts_with('.')
            && !self.0.contains(['/', '\\', '\0'])
            && !self.0.contains("..")
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Length of the `http://` or `https://` scheme, case-insensitive.
fn scheme_len(s: &str) -> Option<usize> {
    ["https://", "http://"].into_iter().find_map(|scheme| {
        s.get(..scheme.len())
            .filter(|head| head.eq_ignore_ascii_case(scheme))
            .map(|_| scheme.len())
    })
}

fn is_remote_url(s: &str) -> bool {
    let Some(len) = scheme_len(s) else {
        return false;
    };
    let rest = &s[len..];
    let host_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
    host_end > 0
}

/// Extract the id token from a URL's last path segment.
fn url_token(url: &str) -> Option<&str> {
    let rest = &url[scheme_len(url)?..];
    let without_query = rest.split(['?', '#']).next()?;
    let path = &without_query[without_query.find('/')?..];
    let segment = path.rsplit('/').next()?;
    let first = segment.split('_').next()?;
    let stem = first.split('.').next()?;

    let valid = !stem.is_empty()
        && stem
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
    valid.then_some(stem)
}

fn sanitize_url(url: &str) -> String {
    url.replace(['/', ':', '.'], "_")
}

/// Cap `key` at [`MAX_KEY_LEN`] bytes: `<prefix>_<v5 digest of key>`.
fn bounded(key: String) -> String {
    if key.len() <= MAX_KEY_LEN {
        return key;
    }
    let digest = Uuid::new_v5(&Uuid::NAMESPACE_URL, key.as_bytes()).simple().to_string();
    let budget = MAX_KEY_LEN - digest.len() - 1;
    let cut = (0..=budget)
        .rev()
        .find(|&i| key.is_char_boundary(i))
        .unwrap_or(0);
    format!("{}_{}", &key[..cut], digest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_legacy_prefixes_share_key() {
        assert_eq!(normalize("local_abc"), normalize("abc"));
        assert_eq!(normalize("photo_abc"), normalize("abc"));
        assert_eq!(normalize("abc").as_str(), "abc");
    }

    #[test]
    fn test_remote_url_token() {
        let key = normalize("https://cdn.example.com/spots/abc123_1699999999.jpg");
        assert_eq!(key.as_str(), "abc123");
    }

    #[test]
    fn test_remote_uuid_matches_local_id() {
        let uuid = "6f1c2b1e-8c4d-4a63-9d1f-3b2a1c0e9f77";
        let url = format!("https://cdn.example.com/media/{uuid}_1700000000.jpg?w=800");
        assert_eq!(normalize(&url), normalize(&format!("photo_{uuid}")));
        assert_eq!(normalize(&url), normalize(&format!("local_{uuid}")));
    }

    #[test]
    fn test_remote_without_suffix_strips_extension() {
        assert_eq!(normalize("http://x.io/a/xyz789.png").as_str(), "xyz789");
    }

    #[test]
    fn test_remote_fallback_sanitizes() {
        let key = normalize("https://cdn.example.com/");
        assert_eq!(key.as_str(), "https___cdn_example_com_");

        let key = normalize("https://cdn.example.com/img/%20weird_1.jpg");
        assert_eq!(key.as_str(), "https___cdn_example_com_img_%20weird_1_jpg");
        assert!(key.is_path_safe());
    }

    #[test]
    fn test_long_fallback_key_is_bounded() {
        let url = format!("https://cdn.example.com/u/my%20photo.jpg?sig={}", "a".repeat(300));
        let key = normalize(&url);

        assert!(key.as_str().len() <= MAX_KEY_LEN);
        assert!(key.as_str().starts_with("https___cdn_example_com_u_my%20photo_jpg?sig=aaa"));
        assert!(key.is_path_safe());
        assert_eq!(normalize(&url), key);

        let other = format!("{url}b");
        assert_ne!(normalize(&other), key);
    }

    #[test]
    fn test_long_key_cut_on_char_boundary() {
        let id = "é".repeat(150);
        let key = normalize(&id);
        assert!(key.as_str().len() <= MAX_KEY_LEN);
        assert_eq!(normalize(&format!("photo_{id}")), key);
    }

    #[test]
    fn test_remote_without_path_falls_back() {
        let key = normalize("https://example.com");
        assert_eq!(key.as_str(), "https___example_com");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        let id = AssetId::parse("HTTPS://CDN.example.com/p/AB12_9.jpg");
        assert!(id.is_remote());
        assert_eq!(id.cache_key().as_str(), "AB12");
    }

    #[test]
    fn test_scheme_without_host_is_not_remote() {
        assert_eq!(
            AssetId::parse("https:///nohost"),
            AssetId::Local("https:///nohost".to_string())
        );
    }

    #[test]
    fn test_bare_prefix_is_kept() {
        assert_eq!(AssetId::parse("local_"), AssetId::Local("local_".to_string()));
        assert_eq!(normalize("photo_").as_str(), "photo_");
    }

    #[test]
    fn test_parse_variants() {
        assert_eq!(
            AssetId::parse("photo_42"),
            AssetId::Legacy {
                prefix: LegacyPrefix::Photo,
                id: "42".to_string()
            }
        );
        assert!(AssetId::parse("http://a.b/c.jpg").remote_url().is_some());
        assert!(AssetId::parse("local_42").remote_url().is_none());
    }

    #[test]
    fn test_display_preserves_identifier() {
        for raw in ["abc", "local_abc", "https://cdn.example.com/x_1.jpg"] {
            assert_eq!(AssetId::parse(raw).to_string(), raw);
        }
    }

    #[test]
    fn test_cache_key_file_name() {
        let key = CacheKey::new("abc123");
        assert_eq!(key.file_name(), "abc123.jpg");
        assert_eq!(CacheKey::from_file_name("abc123.jpg"), Some(key));
        assert_eq!(CacheKey::from_file_name(".abc.jpg"), None);
        assert_eq!(CacheKey::from_file_name("abc.png"), None);
        assert_eq!(CacheKey::from_file_name(".jpg"), None);
    }

    #[test]
    fn test_path_safety() {
        assert!(CacheKey::new("abc-123").is_path_safe());
        assert!(!CacheKey::new("").is_path_safe());
        assert!(!CacheKey::new("../etc/passwd").is_path_safe());
        assert!(!CacheKey::new("a/b").is_path_safe());
        assert!(!CacheKey::new(".hidden").is_path_safe());
    }
}
