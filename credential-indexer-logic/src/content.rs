use url::Url;

pub const IPFS_SCHEME: &str = "ipfs://";

/// Maps a content locator to a URL a browser can fetch. Pure, no I/O.
pub trait ContentResolver: Send + Sync {
    fn resolve_content_locator(&self, locator: &str) -> String;
}

/// `ipfs://<cid>`. Already prefixed input is returned unchanged; an empty cid stays empty.
pub fn to_ipfs_uri(cid: &str) -> String {
    if cid.is_empty() || cid.starts_with(IPFS_SCHEME) {
        cid.to_string()
    } else {
        format!("{IPFS_SCHEME}{cid}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpfsGateway {
    base: Url,
}

impl IpfsGateway {
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Self { base }
    }

    /// Accepts either a bare cid or an `ipfs://` uri.
    pub fn to_gateway_url(&self, locator: &str) -> String {
        let cid = locator.strip_prefix(IPFS_SCHEME).unwrap_or(locator);
        format!("{}{cid}", self.base)
    }
}

impl ContentResolver for IpfsGateway {
    fn resolve_content_locator(&self, locator: &str) -> String {
        self.to_gateway_url(locator)
    }
}
