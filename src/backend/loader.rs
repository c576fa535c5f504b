use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::Cursor;
use tokio::task::JoinHandle;

use super::error::{ApiError, LoadError};
use super::mangadex::MangaDexClient;

const COVERS_URL: &str = "https://uploads.mangadex.org/covers";

/// A fetchable image, without its bytes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceRef {
    Cover { manga_id: String, file_name: String },
    Page { url: String },
}

/// Which pre-generated remote variant to ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeHint {
    Original,
    #[default]
    Small,
    Medium,
}

impl ResourceRef {
    /// Covers have 256px and 512px thumbnails. Page URLs already carry their
    /// quality, so the hint does not apply to them.
    pub fn url(&self, size: SizeHint) -> String {
        match self {
            ResourceRef::Cover { manga_id, file_name } => {
                let base = format!("{}/{}/{}", COVERS_URL, manga_id, file_name);
                match size {
                    SizeHint::Original => base,
                    SizeHint::Small => format!("{}.256.jpg", base),
                    SizeHint::Medium => format!("{}.512.jpg", base),
                }
            }
            ResourceRef::Page { url } => url.clone(),
        }
    }
}

pub fn decode(bytes: &[u8]) -> Result<DynamicImage, image::ImageError> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()
}

/// Anything that can download raw image bytes.
pub trait ByteSource {
    fn fetch_bytes(&self, url: &str) -> impl Future<Output = Result<Vec<u8>, ApiError>>;
}

impl ByteSource for MangaDexClient {
    async fn fetch_bytes(&self, url: &str) -> Result<Vec<u8>, ApiError> {
        MangaDexClient::fetch_bytes(self, url).await
    }
}

pub async fn fetch_and_decode<B: ByteSource>(
    source: &B,
    resource: &ResourceRef,
    size: SizeHint,
) -> Result<DynamicImage, LoadError> {
    let url = resource.url(size);
    let bytes = source
        .fetch_bytes(&url)
        .await
        .map_err(|source| LoadError::FetchFailed {
            url: url.clone(),
            source,
        })?;
    decode(&bytes).map_err(|source| LoadError::DecodeFailed { url, source })
}

/// Tracks the one image load allowed in flight for a display slot.
///
/// Starting a new load aborts the previous task, and results are tagged with
/// a generation so anything that still slips through can be recognised as
/// stale.
#[derive(Debug, Default)]
pub struct InFlight {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl InFlight {
    pub fn begin(&mut self) -> u64 {
        self.cancel();
        self.generation += 1;
        self.generation
    }

    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.handle = Some(handle);
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbImage};

    #[test]
    fn test_cover_urls_by_size() {
        let cover = ResourceRef::Cover {
            manga_id: "m".to_string(),
            file_name: "c.jpg".to_string(),
        };
        assert_eq!(
            cover.url(SizeHint::Original),
            "https://uploads.mangadex.org/covers/m/c.jpg"
        );
        assert_eq!(
            cover.url(SizeHint::Small),
            "https://uploads.mangadex.org/covers/m/c.jpg.256.jpg"
        );
        assert_eq!(
            cover.url(SizeHint::Medium),
            "https://uploads.mangadex.org/covers/m/c.jpg.512.jpg"
        );

        let page = ResourceRef::Page {
            url: "https://node/data/h/1.png".to_string(),
        };
        assert_eq!(page.url(SizeHint::Medium), "https://node/data/h/1.png");
    }

    #[test]
    fn test_decode_png() {
        let img = RgbImage::from_pixel(3, 2, image::Rgb([7, 8, 9]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let decoded = decode(&bytes).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (3, 2));
    }

    #[test]
    fn test_decode_garbage_fails() {
        assert!(decode(b"definitely not an image").is_err());
        assert!(decode(&[]).is_err());
    }

    /// Serves fixed bytes, or a 404 when there are none.
    struct FixedBytes(Option<Vec<u8>>);

    impl ByteSource for FixedBytes {
        async fn fetch_bytes(&self, _url: &str) -> Result<Vec<u8>, ApiError> {
            self.0
                .clone()
                .ok_or(ApiError::Status(reqwest::StatusCode::NOT_FOUND))
        }
    }

    fn cover() -> ResourceRef {
        ResourceRef::Cover {
            manga_id: "m".to_string(),
            file_name: "c.jpg".to_string(),
        }
    }

    #[tokio::test]
    async fn test_fetch_and_decode_maps_fetch_errors() {
        let err = fetch_and_decode(&FixedBytes(None), &cover(), SizeHint::Small)
            .await
            .unwrap_err();
        match err {
            LoadError::FetchFailed { url, source } => {
                assert_eq!(url, "https://uploads.mangadex.org/covers/m/c.jpg.256.jpg");
                assert!(matches!(source, ApiError::Status(s) if s == reqwest::StatusCode::NOT_FOUND));
            }
            other => panic!("expected FetchFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_and_decode_maps_decode_errors() {
        let source = FixedBytes(Some(b"not an image".to_vec()));
        let err = fetch_and_decode(&source, &cover(), SizeHint::Medium)
            .await
            .unwrap_err();
        match err {
            LoadError::DecodeFailed { url, .. } => {
                assert_eq!(url, "https://uploads.mangadex.org/covers/m/c.jpg.512.jpg");
            }
            other => panic!("expected DecodeFailed, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_and_decode_success() {
        let img = RgbImage::from_pixel(2, 2, image::Rgb([1, 2, 3]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();

        let page = ResourceRef::Page {
            url: "https://node/data/h/1.png".to_string(),
        };
        let decoded = fetch_and_decode(&FixedBytes(Some(bytes)), &page, SizeHint::Original)
            .await
            .unwrap();
        assert_eq!((decoded.width(), decoded.height()), (2, 2));
    }

    #[tokio::test]
    async fn test_in_flight_aborts_previous_load() {
        let mut in_flight = InFlight::default();
        let first = in_flight.begin();

        let (tx, rx) = tokio::sync::oneshot::channel::<()>();
        in_flight.track(tokio::spawn(async move {
            let _tx = tx;
            std::future::pending::<()>().await;
        }));

        let second = in_flight.begin();
        assert_ne!(first, second);
        assert!(in_flight.is_current(second));
        assert!(!in_flight.is_current(first));

        // The aborted task drops its sender.
        assert!(rx.await.is_err());
    }
}
