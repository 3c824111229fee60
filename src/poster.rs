use anyhow::{bail, Context, Result};
use image::{DynamicImage, ImageFormat};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::PosterConfig;

/// Decoded poster scaled to fit the configured box.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    image: DynamicImage,
}

impl Thumbnail {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn save_png(&self, path: &Path) -> Result<()> {
        self.image
            .save_with_format(path, ImageFormat::Png)
            .with_context(|| format!("writing poster to {}", path.display()))
    }
}

/// Outcome of a poster lookup. Failures never escape as errors.
#[derive(Debug, Clone)]
pub enum Poster {
    Present(Thumbnail),
    Absent(String),
}

impl Poster {
    pub fn is_present(&self) -> bool {
        matches!(self, Poster::Present(_))
    }
}

pub trait PosterSource: Send + Sync {
    fn enhance(&self, url: &str) -> Poster;
}

/// Fetches posters over HTTP and thumbnails them.
pub struct HttpPosterSource {
    agent: ureq::Agent,
    max_width: u32,
    max_height: u32,
    max_bytes: u64,
}

impl HttpPosterSource {
    pub fn new(config: &PosterConfig) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(config.timeout_secs)))
            .build()
            .into();
        Self {
            agent,
            max_width: config.max_width,
            max_height: config.max_height,
            max_bytes: config.max_bytes,
        }
    }

    fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let mut response = match self.agent.get(url).call() {
            Ok(r) => r,
            Err(ureq::Error::StatusCode(code)) => bail!("poster host returned HTTP {code}"),
            Err(e) => return Err(anyhow::anyhow!(e).context("poster request failed")),
        };
        response
            .body_mut()
            .with_config()
            .limit(self.max_bytes)
            .read_to_vec()
            .context("reading poster body")
    }
}

impl PosterSource for HttpPosterSource {
    fn enhance(&self, url: &str) -> Poster {
        let url = url.trim();
        if url.is_empty() {
            return Poster::Absent("no poster link".into());
        }
        let poster = match self.fetch(url) {
            Ok(bytes) => thumbnail(&bytes, self.max_width, self.max_height),
            Err(e) => Poster::Absent(format!("{e:#}")),
        };
        match &poster {
            Poster::Present(t) => debug!(url, width = t.width(), height = t.height(), "poster fetched"),
            Poster::Absent(reason) => warn!(url, reason = reason.as_str(), "poster unavailable"),
        }
        poster
    }
}

/// Decode image bytes and shrink them to fit `max_width × max_height`,
/// keeping the aspect ratio. Smaller images are left as they are.
pub fn thumbnail(bytes: &[u8], max_width: u32, max_height: u32) -> Poster {
    let image = match image::load_from_memory(bytes) {
        Ok(img) => img,
        Err(e) => return Poster::Absent(format!("cannot decode poster: {e}")),
    };
    let image = if image.width() > max_width || image.height() > max_height {
        image.thumbnail(max_width, max_height)
    } else {
        image
    };
    Poster::Present(Thumbnail { image })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use std::io::Cursor;

    fn png(width: u32, height: u32) -> Vec<u8> {
        let img = DynamicImage::ImageRgb8(RgbImage::new(width, height));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png).unwrap();
        buf
    }

    #[test]
    fn large_poster_fits_box_keeping_aspect() {
        match thumbnail(&png(600, 900), 150, 200) {
            Poster::Present(t) => {
                assert!(t.width() <= 150 && t.height() <= 200);
                assert_eq!((t.width(), t.height()), (133, 200));
            }
            Poster::Absent(reason) => panic!("unexpected absent: {reason}"),
        }
    }

    #[test]
    fn small_poster_is_not_enlarged() {
        match thumbnail(&png(67, 98), 150, 200) {
            Poster::Present(t) => assert_eq!((t.width(), t.height()), (67, 98)),
            Poster::Absent(reason) => panic!("unexpected absent: {reason}"),
        }
    }

    #[test]
    fn garbage_bytes_are_absent() {
        assert!(!thumbnail(b"<html>not an image</html>", 150, 200).is_present());
    }

    #[test]
    fn empty_link_is_absent_without_network() {
        let source = HttpPosterSource::new(&PosterConfig::default());
        assert!(matches!(source.enhance("  "), Poster::Absent(_)));
    }

    #[test]
    fn unreachable_host_is_absent() {
        let config = PosterConfig {
            timeout_secs: 1,
            ..PosterConfig::default()
        };
        let source = HttpPosterSource::new(&config);
        assert!(!source.enhance("http://127.0.0.1:1/poster.jpg").is_present());
    }

    #[test]
    fn saves_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("p.png");
        if let Poster::Present(t) = thumbnail(&png(10, 10), 150, 200) {
            t.save_png(&path).unwrap();
        }
        assert!(path.exists());
    }
}
