//! Local cache of downloaded icons, banners and fonts.
//!
//! Files live under `{data_dir}/{category}/{filename}` and are downloaded at
//! most once. The upstream CDN answers missing icons with a tiny placeholder
//! image, so an image file smaller than [`CORRUPT_IMAGE_THRESHOLD`] is treated
//! as absent and fetched again.

use futures::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

use crate::config::{AppConfig, NetworkConfig};
use crate::models::ItemKind;
use crate::retry::RetryPolicy;

/// Image files below this many bytes are broken placeholders.
pub const CORRUPT_IMAGE_THRESHOLD: u64 = 6144;

/// Font used for every label.
pub const FONT_FILE: &str = "HYWH-65W.ttf";

/// Files fetched into `draw/` at startup.
pub const DRAW_ASSETS: [&str; 3] = [FONT_FILE, "avatar.png", "weapon.png"];

/// Error from a single download attempt.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum AssetError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

/// Asset directory, which also decides how a download is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetCategory {
    /// Fonts and banners, copied byte for byte
    Draw,
    /// Material icons
    Item,
    /// Character icons
    Avatar,
    /// Weapon icons
    Weapon,
}

impl AssetCategory {
    pub fn dir_name(self) -> &'static str {
        match self {
            AssetCategory::Draw => "draw",
            AssetCategory::Item => "item",
            AssetCategory::Avatar => "avatar",
            AssetCategory::Weapon => "weapon",
        }
    }

    /// Icons are decoded and re-encoded to normalize their format.
    pub fn transcodes(self) -> bool {
        !matches!(self, AssetCategory::Draw)
    }
}

impl From<ItemKind> for AssetCategory {
    fn from(kind: ItemKind) -> Self {
        match kind {
            ItemKind::Avatar => AssetCategory::Avatar,
            ItemKind::Weapon => AssetCategory::Weapon,
        }
    }
}

/// Where an asset comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AssetSource {
    /// Absolute URL
    Url(String),
    /// UI icon name on the data API, e.g. `UI_ItemIcon_104303`
    UiIcon(String),
}

/// One file to make available locally.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetRequest {
    pub source: AssetSource,
    pub category: AssetCategory,
    pub filename: String,
}

impl AssetRequest {
    pub fn icon(icon: impl Into<String>, category: AssetCategory, filename: impl Into<String>) -> Self {
        Self { source: AssetSource::UiIcon(icon.into()), category, filename: filename.into() }
    }
}

/// Local file name of an item, character or weapon icon.
pub fn icon_filename(id: u32) -> String {
    format!("{}.png", id)
}

/// Whether a path names an image file.
pub fn is_image_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()).map(|e| e.to_ascii_lowercase()).as_deref(),
        Some("png" | "jpg" | "jpeg" | "webp")
    )
}

/// Whether a local file can be used as-is.
///
/// Missing files are unusable; image files below the placeholder threshold
/// are unusable; anything else present is reused.
pub fn is_usable(path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) if meta.is_file() => {
            !is_image_path(path) || meta.len() >= CORRUPT_IMAGE_THRESHOLD
        }
        _ => false,
    }
}

/// Download-once cache rooted at the data directory.
pub struct AssetCache {
    root: PathBuf,
    http: reqwest::Client,
    network: NetworkConfig,
    retry: RetryPolicy,
}

impl AssetCache {
    pub fn new(config: &AppConfig, http: reqwest::Client) -> Self {
        Self {
            root: config.data_dir().to_path_buf(),
            http,
            network: config.network.clone(),
            retry: config.network.retry_policy(),
        }
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn path_for(&self, category: AssetCategory, filename: &str) -> PathBuf {
        self.root.join(category.dir_name()).join(filename)
    }

    /// Absolute download URL, through the mirror when one is configured.
    pub fn resolve_url(&self, source: &AssetSource) -> String {
        let url = match source {
            AssetSource::Url(url) => url.clone(),
            AssetSource::UiIcon(icon) => format!(
                "{}/assets/UI/{}.png",
                self.network.api_base.trim_end_matches('/'),
                icon
            ),
        };
        self.network.mirrored(&url)
    }

    /// Make an asset available locally.
    ///
    /// Returns `None` when the download fails after all retries; the caller
    /// renders without that element.
    pub async fn ensure(
        &self,
        source: &AssetSource,
        category: AssetCategory,
        filename: &str,
    ) -> Option<PathBuf> {
        let path = self.path_for(category, filename);
        if is_usable(&path) {
            return Some(path);
        }

        let url = self.resolve_url(source);
        match self.retry.run(filename, || self.download(&url, category, &path)).await {
            Ok(()) => {
                tracing::debug!(file = %path.display(), "Asset downloaded");
                Some(path)
            }
            Err(e) => {
                tracing::error!(url, error = %e, "Asset download failed");
                None
            }
        }
    }

    /// Ensure a batch concurrently; resolves once every download is done.
    pub async fn ensure_all(&self, requests: &[AssetRequest]) -> Vec<Option<PathBuf>> {
        futures::future::join_all(
            requests.iter().map(|r| self.ensure(&r.source, r.category, &r.filename)),
        )
        .await
    }

    /// Font and header banners needed by the compositor.
    pub async fn ensure_draw_assets(&self) -> Vec<Option<PathBuf>> {
        let base = self.network.assets_base.trim_end_matches('/').to_string();
        let requests: Vec<AssetRequest> = DRAW_ASSETS
            .iter()
            .map(|file| AssetRequest {
                source: AssetSource::Url(format!("{}/{}", base, file)),
                category: AssetCategory::Draw,
                filename: file.to_string(),
            })
            .collect();
        self.ensure_all(&requests).await
    }

    async fn download(
        &self,
        url: &str,
        category: AssetCategory,
        path: &Path,
    ) -> Result<(), AssetError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let response = self.http.get(url).send().await?.error_for_status()?;

        if category.transcodes() {
            let bytes = response.bytes().await?;
            let decoded = image::load_from_memory(&bytes)?;
            decoded.save(path)?;
            return Ok(());
        }

        // Raw copy through a partial file so an interrupted stream never
        // leaves a truncated asset behind.
        let partial = path.with_extension("part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            file.write_all(&chunk?).await?;
        }
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&partial, path).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn offline_cache(root: &Path) -> AssetCache {
        let mut config = AppConfig::with_data_dir(root);
        config.network.api_base = "http://127.0.0.1:9".to_string();
        config.network.timeout_secs = 2;
        let http = reqwest::Client::new();
        AssetCache::new(&config, http).with_retry(RetryPolicy::immediate(1))
    }

    fn write_file(path: &Path, len: usize) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, vec![0u8; len]).unwrap();
    }

    #[test]
    fn test_small_png_is_unusable() {
        let temp = TempDir::new().unwrap();
        let small = temp.path().join("item").join("104303.png");
        write_file(&small, 5000);
        assert!(!is_usable(&small));

        let big = temp.path().join("item").join("104304.png");
        write_file(&big, 6144);
        assert!(is_usable(&big));
    }

    #[test]
    fn test_small_font_is_usable() {
        let temp = TempDir::new().unwrap();
        let font = temp.path().join("draw").join(FONT_FILE);
        write_file(&font, 100);
        assert!(is_usable(&font));
        assert!(!is_usable(&temp.path().join("draw").join("missing.ttf")));
    }

    #[tokio::test]
    async fn test_ensure_reuses_valid_file_without_network() {
        let temp = TempDir::new().unwrap();
        let cache = offline_cache(temp.path());
        let path = cache.path_for(AssetCategory::Avatar, "10000003.png");
        write_file(&path, 8192);

        let source = AssetSource::UiIcon("UI_AvatarIcon_Qin".to_string());
        let found = cache.ensure(&source, AssetCategory::Avatar, "10000003.png").await;
        assert_eq!(found, Some(path.clone()));
        assert_eq!(fs::metadata(&path).unwrap().len(), 8192);
    }

    #[tokio::test]
    async fn test_ensure_refetches_placeholder() {
        let temp = TempDir::new().unwrap();
        let cache = offline_cache(temp.path());
        let path = cache.path_for(AssetCategory::Item, "104303.png");
        write_file(&path, 5000);

        // The placeholder is not trusted; the download is attempted and fails offline.
        let source = AssetSource::UiIcon("UI_ItemIcon_104303".to_string());
        assert_eq!(cache.ensure(&source, AssetCategory::Item, "104303.png").await, None);
    }

    #[test]
    fn test_resolve_url_with_mirror() {
        let temp = TempDir::new().unwrap();
        let mut config = AppConfig::with_data_dir(temp.path());
        config.network.mirror = Some("https://proxy.example/".to_string());
        let cache = AssetCache::new(&config, reqwest::Client::new());

        assert_eq!(
            cache.resolve_url(&AssetSource::UiIcon("UI_ItemIcon_104303".to_string())),
            "https://proxy.example/https://api.ambr.top/assets/UI/UI_ItemIcon_104303.png"
        );
        assert_eq!(
            cache.resolve_url(&AssetSource::Url("https://cdn.example/a.ttf".to_string())),
            "https://proxy.example/https://cdn.example/a.ttf"
        );
    }

    #[test]
    fn test_categories() {
        assert!(!AssetCategory::Draw.transcodes());
        assert!(AssetCategory::Weapon.transcodes());
        assert_eq!(AssetCategory::from(ItemKind::Avatar).dir_name(), "avatar");
    }
}
