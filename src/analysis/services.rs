use std::io::Cursor;

use anyhow::Context;
use bytes::Bytes;
use image::ImageFormat;
use tracing::{info, warn};

use super::client::NutritionModel;

pub const ERROR_PREFIX: &str = "Error generating response: ";

/// A file as it arrived from the upload form.
pub struct Upload {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Image attachment in the shape the model call expects.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: Bytes,
}

#[derive(Debug, thiserror::Error)]
#[error("No file uploaded")]
pub struct MissingFileError;

/// Result of one model call. Only `text` is ever shown or stored, so a
/// failed analysis looks exactly like a report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisOutcome {
    pub ok: bool,
    pub text: String,
}

/// Browsers submit an empty file part when nothing was picked; that counts
/// as no file.
pub fn prepare_image(upload: Option<Upload>) -> Result<ImagePart, MissingFileError> {
    let upload = upload.filter(|u| !u.body.is_empty()).ok_or(MissingFileError)?;
    let mime_type = upload
        .content_type
        .filter(|ct| ct.starts_with("image/"))
        .unwrap_or_else(|| mime_from_name(upload.file_name.as_deref()).to_string());
    Ok(ImagePart {
        mime_type,
        data: upload.body,
    })
}

fn mime_from_name(name: Option<&str>) -> &'static str {
    let ext = name
        .and_then(|n| n.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase());
    match ext.as_deref() {
        Some("png") => "image/png",
        _ => "image/jpeg",
    }
}

/// Decodes the uploaded image and re-encodes it as PNG for the history store.
/// CPU-bound; async callers go through [`encode_png_blocking`].
pub fn encode_png(data: &[u8]) -> anyhow::Result<Vec<u8>> {
    let img = image::load_from_memory(data).context("decode uploaded image")?;
    let mut out = Vec::new();
    img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

pub async fn encode_png_blocking(data: Bytes) -> anyhow::Result<Vec<u8>> {
    tokio::task::spawn_blocking(move || encode_png(&data))
        .await
        .context("png encoder task")?
}

pub async fn analyze(
    model: &dyn NutritionModel,
    prompt: &str,
    image: &ImagePart,
) -> AnalysisOutcome {
    match model.generate(prompt, image).await {
        Ok(text) => {
            info!(chars = text.len(), "analysis complete");
            AnalysisOutcome { ok: true, text }
        }
        Err(e) => {
            warn!(error = %format!("{e:#}"), "analysis failed");
            AnalysisOutcome {
                ok: false,
                text: format!("{ERROR_PREFIX}{e:#}"),
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;

    /// Scripted model: returns `Ok(text)` or fails with `error`.
    pub(crate) struct FakeModel {
        pub reply: Result<String, String>,
        pub calls: AtomicUsize,
    }

    impl FakeModel {
        pub(crate) fn ok(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn failing(error: &str) -> Self {
            Self {
                reply: Err(error.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl NutritionModel for FakeModel {
        async fn generate(&self, _prompt: &str, _image: &ImagePart) -> anyhow::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(e) => Err(anyhow::anyhow!(e.clone())),
            }
        }
    }

    pub(crate) fn tiny_png() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(2, 2, image::Rgb([200, 120, 40]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Png)
            .unwrap();
        out
    }

    pub(crate) fn tiny_jpeg() -> Vec<u8> {
        let img = image::RgbImage::from_pixel(4, 4, image::Rgb([10, 200, 30]));
        let mut out = Vec::new();
        img.write_to(&mut Cursor::new(&mut out), ImageFormat::Jpeg)
            .unwrap();
        out
    }

    fn upload(name: &str, ct: Option<&str>, body: &[u8]) -> Upload {
        Upload {
            file_name: Some(name.to_string()),
            content_type: ct.map(str::to_string),
            body: Bytes::copy_from_slice(body),
        }
    }

    #[test]
    fn prepare_image_without_file_fails() {
        let err = prepare_image(None).unwrap_err();
        assert_eq!(err.to_string(), "No file uploaded");
    }

    #[test]
    fn prepare_image_with_empty_part_fails() {
        assert!(prepare_image(Some(upload("", Some("application/octet-stream"), b""))).is_err());
    }

    #[test]
    fn prepare_image_keeps_bytes_and_mime() {
        let part = prepare_image(Some(upload("meal.png", Some("image/png"), b"abc"))).unwrap();
        assert_eq!(part.mime_type, "image/png");
        assert_eq!(&part.data[..], b"abc");
    }

    #[test]
    fn prepare_image_falls_back_to_extension() {
        let png = prepare_image(Some(upload("MEAL.PNG", None, b"x"))).unwrap();
        assert_eq!(png.mime_type, "image/png");
        let jpg = prepare_image(Some(upload("meal.jpeg", Some("application/octet-stream"), b"x")))
            .unwrap();
        assert_eq!(jpg.mime_type, "image/jpeg");
    }

    #[test]
    fn encode_png_reencodes_jpeg() {
        let png = encode_png(&tiny_jpeg()).unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);
        let decoded = image::load_from_memory(&png).unwrap();
        assert_eq!((decoded.width(), decoded.height()), (4, 4));
    }

    #[test]
    fn encode_png_rejects_garbage() {
        assert!(encode_png(b"definitely not an image").is_err());
    }

    #[tokio::test(flavor = "current_thread")]
    async fn encode_png_blocking_runs_off_the_runtime() {
        let png = encode_png_blocking(Bytes::from(tiny_jpeg())).await.unwrap();
        assert_eq!(image::guess_format(&png).unwrap(), ImageFormat::Png);

        let err = encode_png_blocking(Bytes::from_static(b"garbage")).await.unwrap_err();
        assert!(format!("{err:#}").starts_with("decode uploaded image"));
    }

    #[tokio::test]
    async fn analyze_returns_model_text() {
        let model = FakeModel::ok("1. Rice - 200 cal\n---\nTotal: 200 calories");
        let part = prepare_image(Some(upload("a.png", Some("image/png"), &tiny_png()))).unwrap();
        let outcome = analyze(&model, "prompt", &part).await;
        assert!(outcome.ok);
        assert_eq!(outcome.text, "1. Rice - 200 cal\n---\nTotal: 200 calories");
        assert_eq!(model.calls(), 1);
    }

    #[tokio::test]
    async fn analyze_turns_failure_into_text() {
        let model = FakeModel::failing("operation timed out");
        let part = prepare_image(Some(upload("a.png", Some("image/png"), &tiny_png()))).unwrap();
        let outcome = analyze(&model, "prompt", &part).await;
        assert!(!outcome.ok);
        assert_eq!(outcome.text, "Error generating response: operation timed out");
        assert!(outcome.text.starts_with(ERROR_PREFIX));
    }
}
