use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Context as _;
use image::codecs::gif::{GifEncoder, Repeat};

use crate::chart::raster::FrameRGBA;
use crate::encode::sink::{FrameIndex, FrameSink, SinkConfig};
use crate::foundation::error::{TaxcompError, TaxcompResult};

/// Background used when flattening translucent pixels; GIF has no partial alpha.
const BACKGROUND: [u8; 4] = [255, 255, 255, 255];

/// Quantizer speed passed to the GIF encoder (1 = best quality, 30 = fastest).
const QUANTIZE_SPEED: i32 = 10;

/// Writes frames to an animated GIF file.
///
/// Frames are encoded into memory and the file is written in [`FrameSink::end`], so a failed
/// write of the body or trailer surfaces as an error instead of being lost when the encoder drops.
pub struct GifSink {
    path: PathBuf,
    state: Option<GifState>,
    frames_written: u64,
}

struct GifState {
    cfg: SinkConfig,
    file: File,
    encoded: SharedBuffer,
    encoder: GifEncoder<SharedBuffer>,
    last: Option<FrameIndex>,
    scratch: Vec<u8>,
}

/// Growable byte buffer the encoder writes into while the sink keeps a handle to the bytes.
#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn take(&self) -> Vec<u8> {
        std::mem::take(&mut *self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl GifSink {
    /// Sink writing to `path`; nothing is created until [`FrameSink::begin`].
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            state: None,
            frames_written: 0,
        }
    }

    /// Output path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of frames encoded so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }
}

impl FrameSink for GifSink {
    #[tracing::instrument(skip(self), fields(path = %self.path.display()))]
    fn begin(&mut self, cfg: SinkConfig) -> TaxcompResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(TaxcompError::validation(
                "gif width/height must be non-zero",
            ));
        }
        if cfg.width > u32::from(u16::MAX) || cfg.height > u32::from(u16::MAX) {
            return Err(TaxcompError::validation(format!(
                "gif frames are limited to 65535x65535, got {}x{}",
                cfg.width, cfg.height
            )));
        }
        if cfg.frame_delay_ms == 0 {
            return Err(TaxcompError::validation("gif frame delay must be > 0 ms"));
        }

        ensure_parent_dir(&self.path)?;
        let file = File::create(&self.path)
            .with_context(|| format!("create gif '{}'", self.path.display()))?;
        let encoded = SharedBuffer::default();
        let mut encoder = GifEncoder::new_with_speed(encoded.clone(), QUANTIZE_SPEED);
        if cfg.looping {
            encoder
                .set_repeat(Repeat::Infinite)
                .map_err(|e| TaxcompError::render(format!("gif loop extension: {e}")))?;
        }

        let scratch = vec![0u8; (cfg.width as usize) * (cfg.height as usize) * 4];
        self.frames_written = 0;
        self.state = Some(GifState {
            cfg,
            file,
            encoded,
            encoder,
            last: None,
            scratch,
        });
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> TaxcompResult<()> {
        let Some(state) = self.state.as_mut() else {
            return Err(TaxcompError::validation(
                "gif sink received a frame before begin",
            ));
        };
        if let Some(last) = state.last
            && idx <= last
        {
            return Err(TaxcompError::validation(format!(
                "frame {idx} pushed after frame {last}"
            )));
        }
        if frame.width != state.cfg.width || frame.height != state.cfg.height {
            return Err(TaxcompError::render(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, state.cfg.width, state.cfg.height
            )));
        }

        flatten_to_opaque_rgba8(
            &mut state.scratch,
            &frame.data,
            frame.premultiplied,
            BACKGROUND,
        )?;
        let buffer = image::RgbaImage::from_raw(
            state.cfg.width,
            state.cfg.height,
            state.scratch.clone(),
        )
        .ok_or_else(|| TaxcompError::render("frame buffer has the wrong length"))?;
        let delay = image::Delay::from_numer_denom_ms(state.cfg.frame_delay_ms, 1);
        state
            .encoder
            .encode_frame(image::Frame::from_parts(buffer, 0, 0, delay))
            .map_err(|e| TaxcompError::render(format!("encode gif frame {idx}: {e}")))?;

        state.last = Some(idx);
        self.frames_written += 1;
        Ok(())
    }

    fn end(&mut self) -> TaxcompResult<()> {
        let Some(state) = self.state.take() else {
            return Err(TaxcompError::validation("gif sink ended before begin"));
        };
        let GifState {
            mut file,
            encoded,
            encoder,
            ..
        } = state;
        // Dropping the encoder appends the trailer to the in-memory stream.
        drop(encoder);
        let bytes = encoded.take();
        file.write_all(&bytes)
            .and_then(|()| file.flush())
            .with_context(|| format!("write gif '{}'", self.path.display()))?;
        if self.frames_written == 0 {
            return Err(TaxcompError::render(format!(
                "no frames were written to '{}'",
                self.path.display()
            )));
        }
        tracing::info!(
            path = %self.path.display(),
            frames = self.frames_written,
            "wrote gif"
        );
        Ok(())
    }
}

/// Create the parent directory of `path` when it has one.
pub fn ensure_parent_dir(path: &Path) -> TaxcompResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

fn flatten_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> TaxcompResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(TaxcompError::render(
            "frame data does not match the configured frame size",
        ));
    }

    let bg = [bg_rgba[0] as u16, bg_rgba[1] as u16, bg_rgba[2] as u16];
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let a = s[3] as u16;
        if a == 255 {
            d.copy_from_slice(s);
            continue;
        }
        let inv = 255 - a;
        for c in 0..3 {
            let fg = if src_is_premul {
                s[c] as u16
            } else {
                mul_div255(s[c] as u16, a)
            };
            d[c] = (fg + mul_div255(bg[c], inv)).min(255) as u8;
        }
        d[3] = 255;
    }
    Ok(())
}

fn mul_div255(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

#[cfg(test)]
#[path = "../../tests/unit/encode/gif.rs"]
mod tests;
