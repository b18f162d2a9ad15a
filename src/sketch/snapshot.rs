use anyhow::{anyhow, Context, Result};
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat, RgbaImage};

/// PNG-encoded copy of the canvas at one moment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    width: u32,
    height: u32,
    png: Vec<u8>,
}

impl Snapshot {
    pub fn encode_rgba(width: u32, height: u32, rgba: &[u8]) -> Result<Self> {
        let expected = (width as usize) * (height as usize) * 4;
        if rgba.len() != expected {
            return Err(anyhow!(
                "snapshot buffer is {} bytes, expected {expected} for {width}x{height}",
                rgba.len()
            ));
        }
        let mut png = Vec::new();
        PngEncoder::new(&mut png)
            .write_image(rgba, width, height, ColorType::Rgba8)
            .context("encode canvas snapshot as png")?;
        Ok(Self { width, height, png })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn png_bytes(&self) -> &[u8] {
        &self.png
    }

    pub fn decode_rgba(&self) -> Result<RgbaImage> {
        decode_png(&self.png)
    }
}

fn decode_png(png: &[u8]) -> Result<RgbaImage> {
    let image = image::load_from_memory_with_format(png, ImageFormat::Png)
        .context("decode png snapshot")?;
    Ok(image.to_rgba8())
}
