//! Tile image codec: block-compressed DDS with generated mipmaps.

use std::io::Cursor;

use image::imageops::FilterType;
use image::{DynamicImage, RgbaImage};
use image_dds::ddsfile::Dds;
use image_dds::{ImageFormat, Mipmaps, Quality};
use mosaic_asset::SourcePath;

use crate::error::{Result, TileError};
use crate::{TILE_EXTENSION, TILE_SIZE};

/// Resize decoded pixels to the tile resolution.
///
/// Triangle filtering with exact dimensions; aspect ratio is not preserved
/// because tiles are always square.
pub fn resize_to_tile(image: &DynamicImage) -> RgbaImage {
    image
        .resize_exact(TILE_SIZE, TILE_SIZE, FilterType::Triangle)
        .to_rgba8()
}

/// Encode a color tile as four-channel block compression (BC3) with a full
/// generated mipmap chain, at the slowest, quality-maximizing setting.
pub fn encode_color_tile(image: &RgbaImage) -> Result<Vec<u8>> {
    encode(image, ImageFormat::BC3RgbaUnorm)
}

/// Encode single-channel data as BC4. Cubemap-derived tiles (irradiance and
/// reflection captures) go through this path; only the red channel of
/// `image` is kept.
pub fn encode_mask_tile(image: &RgbaImage) -> Result<Vec<u8>> {
    encode(image, ImageFormat::BC4RUnorm)
}

/// Encode tightly packed RGBA8 tile pixels, as produced by a readback.
pub fn encode_tile_pixels(pixels: Vec<u8>) -> Result<Vec<u8>> {
    let image = RgbaImage::from_raw(TILE_SIZE, TILE_SIZE, pixels)
        .ok_or_else(|| TileError::EncodeFailed("readback pixel count mismatch".into()))?;
    encode_color_tile(&image)
}

fn encode(image: &RgbaImage, format: ImageFormat) -> Result<Vec<u8>> {
    let dds = image_dds::dds_from_image(image, format, Quality::Slow, Mipmaps::GeneratedAutomatic)
        .map_err(|e| TileError::EncodeFailed(e.to_string()))?;
    let mut bytes = Vec::new();
    dds.write(&mut bytes)
        .map_err(|e| TileError::EncodeFailed(e.to_string()))?;
    Ok(bytes)
}

/// Decode the top mip of a DDS container to RGBA8.
pub fn decode_tile_container(bytes: &[u8]) -> Result<RgbaImage> {
    let dds = Dds::read(Cursor::new(bytes)).map_err(|e| TileError::DecodeFailed(e.to_string()))?;
    image_dds::image_from_dds(&dds, 0).map_err(|e| TileError::DecodeFailed(e.to_string()))
}

/// Decode source bytes by extension: DDS through the container decoder,
/// everything else through the image crate.
pub fn decode_source(path: &SourcePath, bytes: &[u8]) -> Result<DynamicImage> {
    let is_dds = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case(TILE_EXTENSION));
    if is_dds {
        decode_tile_container(bytes).map(DynamicImage::ImageRgba8)
    } else {
        image::load_from_memory(bytes).map_err(|e| TileError::DecodeFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn red_tile() -> RgbaImage {
        RgbaImage::from_pixel(TILE_SIZE, TILE_SIZE, Rgba([220, 30, 30, 255]))
    }

    #[test]
    fn color_tile_round_trips_through_dds() {
        let encoded = encode_color_tile(&red_tile()).expect("encode");
        let decoded = decode_tile_container(&encoded).expect("decode");
        assert_eq!(decoded.dimensions(), (TILE_SIZE, TILE_SIZE));

        // BC3 is lossy; just check the hue survived.
        let px = decoded.get_pixel(TILE_SIZE / 2, TILE_SIZE / 2);
        assert!(px[0] > 180, "red channel lost: {px:?}");
        assert!(px[1] < 90, "green channel gained: {px:?}");
    }

    #[test]
    fn encode_generates_full_mip_chain() {
        let encoded = encode_color_tile(&red_tile()).expect("encode");
        let dds = Dds::read(Cursor::new(encoded.as_slice())).expect("container");
        // 64x64 -> 7 mips down to 1x1
        assert_eq!(dds.get_num_mipmap_levels(), 7);
    }

    #[test]
    fn mask_tile_encodes_single_channel() {
        let encoded = encode_mask_tile(&red_tile()).expect("encode");
        let decoded = decode_tile_container(&encoded).expect("decode");
        assert_eq!(decoded.dimensions(), (TILE_SIZE, TILE_SIZE));
    }

    #[test]
    fn encode_tile_pixels_checks_length() {
        let short = vec![0u8; 16];
        assert!(encode_tile_pixels(short).is_err());

        let exact = vec![128u8; (TILE_SIZE * TILE_SIZE * 4) as usize];
        assert!(encode_tile_pixels(exact).is_ok());
    }

    #[test]
    fn decode_source_dispatches_on_extension() {
        let dds_path = SourcePath::new("textures/sky.dds");
        let encoded = encode_color_tile(&red_tile()).expect("encode");
        let via_container = decode_source(&dds_path, &encoded).expect("dds decode");
        assert_eq!(via_container.to_rgba8().dimensions(), (TILE_SIZE, TILE_SIZE));

        let png_path = SourcePath::new("textures/sky.png");
        let mut png_bytes = Vec::new();
        DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 8, Rgba([10, 200, 10, 255])))
            .write_to(&mut Cursor::new(&mut png_bytes), image::ImageFormat::Png)
            .expect("png encode");
        let via_image = decode_source(&png_path, &png_bytes).expect("png decode");
        assert_eq!(via_image.to_rgba8().dimensions(), (8, 8));
    }

    #[test]
    fn resize_is_exact() {
        let small = DynamicImage::ImageRgba8(RgbaImage::from_pixel(8, 3, Rgba([0, 0, 255, 255])));
        let resized = resize_to_tile(&small);
        assert_eq!(resized.dimensions(), (TILE_SIZE, TILE_SIZE));
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let path = SourcePath::new("textures/broken.png");
        assert!(decode_source(&path, b"not an image").is_err());
        assert!(decode_tile_container(b"not a dds").is_err());
    }
}
