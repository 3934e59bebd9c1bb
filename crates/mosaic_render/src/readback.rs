//! GPU-to-CPU pixel readback for the tile target.
//!
//! Texture-to-buffer copies require the row stride to be a multiple of
//! `COPY_BYTES_PER_ROW_ALIGNMENT`, so the staging buffer holds padded rows
//! and the padding is stripped when the pixels are taken.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Round a row byte count up to the copy alignment wgpu requires.
pub fn align_copy_bytes_per_row(unpadded: u32) -> u32 {
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    ((unpadded + align - 1) / align) * align
}

const MAP_IDLE: u32 = 0;
const MAP_PENDING: u32 = 1;
const MAP_READY: u32 = 2;
const MAP_FAILED: u32 = 3;

/// Staging buffer for reading one RGBA8 render target back to the CPU.
///
/// The buffer is created once and reused across tiles. A readback runs in
/// three steps spread over frames: [`copy_from`](Self::copy_from) inside a
/// command encoder, [`begin_map`](Self::begin_map) after that encoder is
/// submitted, and [`take`](Self::take) once the GPU has had time to finish.
pub struct TileReadback {
    buffer: wgpu::Buffer,
    width: u32,
    height: u32,
    padded_bytes_per_row: u32,
    map_state: Arc<AtomicU32>,
}

impl TileReadback {
    pub fn new(device: &wgpu::Device, width: u32, height: u32) -> Self {
        let padded_bytes_per_row = align_copy_bytes_per_row(width * 4);
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Tile Readback Buffer"),
            size: padded_bytes_per_row as u64 * height as u64,
            usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        Self {
            buffer,
            width,
            height,
            padded_bytes_per_row,
            map_state: Arc::new(AtomicU32::new(MAP_IDLE)),
        }
    }

    /// Record the copy of `texture` into the staging buffer.
    pub fn copy_from(&self, encoder: &mut wgpu::CommandEncoder, texture: &wgpu::Texture) {
        encoder.copy_texture_to_buffer(
            wgpu::ImageCopyTexture {
                texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            wgpu::ImageCopyBuffer {
                buffer: &self.buffer,
                layout: wgpu::ImageDataLayout {
                    offset: 0,
                    bytes_per_row: Some(self.padded_bytes_per_row),
                    rows_per_image: Some(self.height),
                },
            },
            wgpu::Extent3d {
                width: self.width,
                height: self.height,
                depth_or_array_layers: 1,
            },
        );
    }

    /// Ask the driver to map the staging buffer. Must run after the encoder
    /// holding the copy was submitted; completion lands whenever the device
    /// is next polled.
    pub fn begin_map(&mut self) {
        self.map_state.store(MAP_PENDING, Ordering::Release);
        let map_state = Arc::clone(&self.map_state);
        self.buffer
            .slice(..)
            .map_async(wgpu::MapMode::Read, move |result| match result {
                Ok(()) => map_state.store(MAP_READY, Ordering::Release),
                Err(err) => {
                    log::error!("tile readback mapping failed: {err}");
                    map_state.store(MAP_FAILED, Ordering::Release);
                }
            });
    }

    /// Tightly packed RGBA8 pixels of the last copy, or `None` when no
    /// readback is in flight or mapping failed.
    pub fn take(&mut self, device: &wgpu::Device) -> Option<Vec<u8>> {
        if self.map_state.load(Ordering::Acquire) == MAP_IDLE {
            return None;
        }

        // Frames have passed since the map was requested, so this usually
        // returns immediately.
        let _ = device.poll(wgpu::Maintain::Wait);

        match self.map_state.swap(MAP_IDLE, Ordering::AcqRel) {
            MAP_READY => {}
            MAP_PENDING => {
                // The wait above should have fired the callback. Cancel the
                // outstanding request so the buffer stays reusable.
                log::error!("tile readback did not complete");
                self.buffer.unmap();
                return None;
            }
            _ => return None,
        }

        let row = (self.width * 4) as usize;
        let stride = self.padded_bytes_per_row as usize;
        let pixels = {
            let view = self.buffer.slice(..).get_mapped_range();
            let mut pixels = Vec::with_capacity(row * self.height as usize);
            for y in 0..self.height as usize {
                let start = y * stride;
                pixels.extend_from_slice(&view[start..start + row]);
            }
            pixels
        };
        self.buffer.unmap();
        Some(pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_align_up_to_256() {
        assert_eq!(align_copy_bytes_per_row(100), 256);
        assert_eq!(align_copy_bytes_per_row(256), 256);
        assert_eq!(align_copy_bytes_per_row(300), 512);
    }

    #[test]
    fn tile_rows_are_already_aligned() {
        // 64 pixels of RGBA8 is exactly one alignment unit.
        assert_eq!(align_copy_bytes_per_row(mosaic_tiles::TILE_SIZE * 4), 256);
    }
}
