/// Remote image publishing, the one outward-facing collaborator
///
/// The archive can push attached images to a GitHub repository through
/// the contents API so they get a stable public URL. The core only
/// depends on the `Uploader` seam: bytes + metadata in, public URL or
/// failure out. Credentials come from the environment; without them the
/// app simply keeps attachments local.

use base64::Engine;
use chrono::Utc;
use tracing::{info, warn};

use crate::state::annotations::ContributionImage;

/// Target repository configuration, read from the environment.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub owner: String,
    pub repo: String,
    pub token: String,
    pub branch: String,
}

impl UploadConfig {
    /// MUSEUM_ARCHIVE_GITHUB_OWNER / _REPO / _TOKEN, optional _BRANCH
    /// (defaults to "main"). Returns None unless all three required
    /// variables are set and non-empty.
    pub fn from_env() -> Option<Self> {
        let read = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(UploadConfig {
            owner: read("MUSEUM_ARCHIVE_GITHUB_OWNER")?,
            repo: read("MUSEUM_ARCHIVE_GITHUB_REPO")?,
            token: read("MUSEUM_ARCHIVE_GITHUB_TOKEN")?,
            branch: read("MUSEUM_ARCHIVE_GITHUB_BRANCH").unwrap_or_else(|| "main".into()),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("upload request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote storage rejected the upload: HTTP {0}")]
    Status(u16),
}

/// A successfully published asset.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadedImage {
    pub url: String,
    pub filename: String,
    pub upload_date: String,
}

/// The seam the rest of the app sees: store some bytes remotely, get a
/// public URL back.
#[allow(async_fn_in_trait)]
pub trait Uploader {
    async fn upload(
        &self,
        bytes: &[u8],
        original_filename: &str,
        object_id: i64,
    ) -> Result<UploadedImage, UploadError>;
}

/// Uploads through the GitHub contents API: one PUT per image with a
/// base64 payload and a commit message, answered with the raw-content
/// URL of the committed file.
#[derive(Debug, Clone)]
pub struct GithubUploader {
    config: UploadConfig,
    client: reqwest::Client,
}

impl GithubUploader {
    pub fn new(config: UploadConfig) -> Self {
        GithubUploader {
            config,
            client: reqwest::Client::new(),
        }
    }
}

impl Uploader for GithubUploader {
    async fn upload(
        &self,
        bytes: &[u8],
        original_filename: &str,
        object_id: i64,
    ) -> Result<UploadedImage, UploadError> {
        let filename = asset_filename(object_id, Utc::now().timestamp_millis(), original_filename);
        let path = format!("images/{filename}");
        let api_url = format!(
            "https://api.github.com/repos/{}/{}/contents/{}",
            self.config.owner, self.config.repo, path
        );

        let body = serde_json::json!({
            "message": format!("Add image for object {object_id}"),
            "content": base64::engine::general_purpose::STANDARD.encode(bytes),
            "branch": self.config.branch,
        });

        let response = self
            .client
            .put(&api_url)
            .header("Authorization", format!("token {}", self.config.token))
            .header("User-Agent", "museum-archive")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(UploadError::Status(status.as_u16()));
        }

        Ok(UploadedImage {
            url: format!(
                "https://raw.githubusercontent.com/{}/{}/{}/{}",
                self.config.owner, self.config.repo, self.config.branch, path
            ),
            filename,
            upload_date: Utc::now().to_rfc3339(),
        })
    }
}

/// Publish any images that only exist locally. Successes gain a public
/// URL next to their local copy; failures keep the local copy and are
/// reported once. Order is preserved either way.
pub async fn publish_images<U: Uploader>(
    uploader: &U,
    object_id: i64,
    mut images: Vec<ContributionImage>,
) -> (Vec<ContributionImage>, Option<String>) {
    let mut first_error = None;

    for image in images.iter_mut().filter(|img| img.url.is_none()) {
        let Some(bytes) = image.local_bytes() else {
            continue;
        };
        match uploader.upload(&bytes, &image.filename, object_id).await {
            Ok(uploaded) => {
                info!("published {} as {}", image.filename, uploaded.url);
                image.url = Some(uploaded.url);
            }
            Err(e) => {
                warn!("upload failed for {}: {e}", image.filename);
                first_error.get_or_insert_with(|| e.to_string());
            }
        }
    }

    (images, first_error)
}

/// Remote filenames are prefixed with the object id and upload time so
/// repeated uploads of the same photo never collide.
fn asset_filename(object_id: i64, timestamp_millis: i64, original: &str) -> String {
    format!(
        "{object_id}_{timestamp_millis}_{}",
        sanitize_filename(original)
    )
}

fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("IMG 0123 (2).jpg"), "IMG_0123__2_.jpg");
        assert_eq!(sanitize_filename("plain.png"), "plain.png");
    }

    #[test]
    fn test_asset_filename_is_prefixed() {
        assert_eq!(
            asset_filename(42, 1700000000000, "front view.jpg"),
            "42_1700000000000_front_view.jpg"
        );
    }

    #[test]
    fn test_config_requires_all_three_vars() {
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_OWNER");
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_REPO");
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_TOKEN");
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_BRANCH");
        assert!(UploadConfig::from_env().is_none());

        std::env::set_var("MUSEUM_ARCHIVE_GITHUB_OWNER", "adair");
        std::env::set_var("MUSEUM_ARCHIVE_GITHUB_REPO", "museum-archive-images");
        assert!(UploadConfig::from_env().is_none());

        std::env::set_var("MUSEUM_ARCHIVE_GITHUB_TOKEN", "secret");
        let config = UploadConfig::from_env().unwrap();
        assert_eq!(config.branch, "main");

        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_OWNER");
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_REPO");
        std::env::remove_var("MUSEUM_ARCHIVE_GITHUB_TOKEN");
    }

    struct FakeUploader {
        fail_on: Option<&'static str>,
    }

    impl Uploader for FakeUploader {
        async fn upload(
            &self,
            _bytes: &[u8],
            original_filename: &str,
            object_id: i64,
        ) -> Result<UploadedImage, UploadError> {
            if self.fail_on == Some(original_filename) {
                return Err(UploadError::Status(507));
            }
            Ok(UploadedImage {
                url: format!("https://example.com/{object_id}/{original_filename}"),
                filename: original_filename.to_string(),
                upload_date: Utc::now().to_rfc3339(),
            })
        }
    }

    fn local_image(filename: &str) -> ContributionImage {
        ContributionImage {
            data_url: Some("data:image/jpeg;base64,aGVsbG8=".into()),
            url: None,
            filename: filename.into(),
            upload_date: Utc::now().to_rfc3339(),
        }
    }

    #[tokio::test]
    async fn test_publish_attaches_urls_in_order() {
        let uploader = FakeUploader { fail_on: None };
        let (images, error) = publish_images(
            &uploader,
            7,
            vec![local_image("a.jpg"), local_image("b.jpg")],
        )
        .await;

        assert!(error.is_none());
        assert_eq!(images[0].url.as_deref(), Some("https://example.com/7/a.jpg"));
        assert_eq!(images[1].url.as_deref(), Some("https://example.com/7/b.jpg"));
        // Local copies are kept alongside the published URLs
        assert!(images.iter().all(|img| img.data_url.is_some()));
    }

    #[tokio::test]
    async fn test_publish_failure_keeps_local_copy() {
        let uploader = FakeUploader {
            fail_on: Some("b.jpg"),
        };
        let (images, error) = publish_images(
            &uploader,
            7,
            vec![local_image("a.jpg"), local_image("b.jpg")],
        )
        .await;

        assert!(error.is_some());
        assert!(images[0].url.is_some());
        assert!(images[1].url.is_none());
        assert!(images[1].data_url.is_some());
    }

    #[tokio::test]
    async fn test_publish_skips_already_remote_images() {
        let uploader = FakeUploader { fail_on: None };
        let mut remote = local_image("old.jpg");
        remote.url = Some("https://example.com/existing".into());

        let (images, error) = publish_images(&uploader, 7, vec![remote.clone()]).await;
        assert!(error.is_none());
        assert_eq!(images[0], remote);
    }
}
