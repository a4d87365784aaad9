//! Frame source and sink collaborators.
//!
//! The pipeline never decodes containers. A [`FrameSource`] hands over
//! decoded frames in presentation order and a [`FrameSink`] receives the
//! enhanced frames in the same order. Image sequences and in-memory queues
//! are provided; video decoders and encoders plug in behind the same traits.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{ColorType, DynamicImage, ImageBuffer, Rgb, Rgba};
use tracing::debug;

use lumen_models::{Frame, PixelBuffer, PixelLayout};

use crate::error::{WorkerError, WorkerResult};

/// Producer of decoded frames.
#[async_trait]
pub trait FrameSource: Send {
    /// Next frame, or `None` at end of stream.
    async fn next_frame(&mut self) -> WorkerResult<Option<Frame>>;

    /// Number of frames left, when known.
    fn remaining_hint(&self) -> Option<usize> {
        None
    }
}

/// Consumer of enhanced frames.
#[async_trait]
pub trait FrameSink: Send {
    async fn write_frame(&mut self, frame: Frame) -> WorkerResult<()>;

    /// Flush once the stream has ended or was cancelled.
    async fn finish(&mut self) -> WorkerResult<()> {
        Ok(())
    }
}

/// Frames held in memory.
#[derive(Debug, Default)]
pub struct MemorySource {
    frames: VecDeque<Frame>,
}

impl MemorySource {
    pub fn new(frames: impl IntoIterator<Item = Frame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }
}

#[async_trait]
impl FrameSource for MemorySource {
    async fn next_frame(&mut self) -> WorkerResult<Option<Frame>> {
        Ok(self.frames.pop_front())
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.frames.len())
    }
}

/// Collects frames in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    frames: Vec<Frame>,
    finished: bool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn write_frame(&mut self, frame: Frame) -> WorkerResult<()> {
        self.frames.push(frame);
        Ok(())
    }

    async fn finish(&mut self) -> WorkerResult<()> {
        self.finished = true;
        Ok(())
    }
}

const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

/// Reads a directory of still images in file name order.
///
/// Frame `i` is stamped `i / fps` seconds. A file that fails to decode
/// yields [`WorkerError::Decode`] and the sequence moves on to the next one.
#[derive(Debug)]
pub struct ImageSequenceSource {
    files: Vec<PathBuf>,
    index: usize,
    fps: f64,
}

impl ImageSequenceSource {
    pub async fn open(dir: impl AsRef<Path>, fps: f64) -> WorkerResult<Self> {
        if !(fps.is_finite() && fps > 0.0) {
            return Err(WorkerError::config_error(format!(
                "frame rate must be positive, got {}",
                fps
            )));
        }
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir).await.map_err(|e| {
            WorkerError::source_failed(format!("cannot read {}: {}", dir.display(), e))
        })?;

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
                .unwrap_or(false);
            if is_image {
                files.push(path);
            }
        }
        files.sort();

        debug!(dir = %dir.display(), frames = files.len(), "Opened image sequence");
        Ok(Self {
            files,
            index: 0,
            fps,
        })
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Duration covered by the sequence in seconds.
    pub fn duration_secs(&self) -> f64 {
        self.files.len() as f64 / self.fps
    }
}

#[async_trait]
impl FrameSource for ImageSequenceSource {
    async fn next_frame(&mut self) -> WorkerResult<Option<Frame>> {
        let Some(path) = self.files.get(self.index).cloned() else {
            return Ok(None);
        };
        let index = self.index;
        let timestamp = index as f64 / self.fps;
        self.index += 1;

        let decode_path = path.clone();
        let image = tokio::task::spawn_blocking(move || image::open(decode_path))
            .await?
            .map_err(|e| WorkerError::decode_failed(index, path, e))?;
        Ok(Some(frame_from_image(image, timestamp)))
    }

    fn remaining_hint(&self) -> Option<usize> {
        Some(self.files.len() - self.index)
    }
}

/// Convert a decoded image, keeping 16-bit precision and alpha.
pub fn frame_from_image(image: DynamicImage, timestamp: f64) -> Frame {
    let (width, height) = (image.width(), image.height());
    let color = image.color();
    let high_depth = matches!(
        color,
        ColorType::L16 | ColorType::La16 | ColorType::Rgb16 | ColorType::Rgba16
    );

    match (high_depth, color.has_alpha()) {
        (true, true) => Frame::from_rgb16(
            width,
            height,
            PixelLayout::Rgba,
            16,
            timestamp,
            image.to_rgba16().into_raw(),
        ),
        (true, false) => Frame::from_rgb16(
            width,
            height,
            PixelLayout::Rgb,
            16,
            timestamp,
            image.to_rgb16().into_raw(),
        ),
        (false, true) => Frame::from_rgb8(
            width,
            height,
            PixelLayout::Rgba,
            timestamp,
            image.to_rgba8().into_raw(),
        ),
        (false, false) => Frame::from_rgb8(
            width,
            height,
            PixelLayout::Rgb,
            timestamp,
            image.to_rgb8().into_raw(),
        ),
    }
}

/// Writes frames as numbered PNG files.
#[derive(Debug)]
pub struct ImageSequenceSink {
    dir: PathBuf,
    index: usize,
}

impl ImageSequenceSink {
    pub async fn create(dir: impl Into<PathBuf>) -> WorkerResult<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir, index: 0 })
    }

    pub fn written(&self) -> usize {
        self.index
    }

    fn next_path(&mut self) -> PathBuf {
        let path = self.dir.join(format!("frame_{:06}.png", self.index));
        self.index += 1;
        path
    }
}

#[async_trait]
impl FrameSink for ImageSequenceSink {
    async fn write_frame(&mut self, frame: Frame) -> WorkerResult<()> {
        let path = self.next_path();
        tokio::task::spawn_blocking(move || save_png(&frame, &path)).await?
    }
}

/// Save a frame as PNG. Depths between 9 and 15 bits are scaled to 16.
pub fn save_png(frame: &Frame, path: &Path) -> WorkerResult<()> {
    frame.validate().map_err(WorkerError::sink_failed)?;
    let (width, height) = (frame.width, frame.height);
    let mismatch = || WorkerError::sink_failed("pixel buffer does not match frame size");

    match (&frame.data, frame.layout) {
        (PixelBuffer::U8(data), PixelLayout::Rgb) => {
            ImageBuffer::<Rgb<u8>, _>::from_raw(width, height, data.clone())
                .ok_or_else(mismatch)?
                .save(path)?
        }
        (PixelBuffer::U8(data), PixelLayout::Rgba) => {
            ImageBuffer::<Rgba<u8>, _>::from_raw(width, height, data.clone())
                .ok_or_else(mismatch)?
                .save(path)?
        }
        (PixelBuffer::U16(data), layout) => {
            let max = frame.max_code();
            let scaled: Vec<u16> = data
                .iter()
                .map(|&v| ((v as u32 * 65535 + max / 2) / max) as u16)
                .collect();
            match layout {
                PixelLayout::Rgb => ImageBuffer::<Rgb<u16>, _>::from_raw(width, height, scaled)
                    .ok_or_else(mismatch)?
                    .save(path)?,
                PixelLayout::Rgba => ImageBuffer::<Rgba<u16>, _>::from_raw(width, height, scaled)
                    .ok_or_else(mismatch)?
                    .save(path)?,
            }
        }
    }
    Ok(())
}
