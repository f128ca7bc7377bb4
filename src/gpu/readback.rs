use crate::error::BlurError;

/// Row pitch of a texture-to-buffer copy: tight bytes per row and the same
/// rounded up to wgpu's copy alignment.
pub(super) fn padded_bytes_per_row(width: u32, bytes_per_pixel: u32) -> (u32, u32) {
    let unpadded = width * bytes_per_pixel;
    let align = wgpu::COPY_BYTES_PER_ROW_ALIGNMENT;
    let padded = unpadded.div_ceil(align) * align;
    (unpadded, padded)
}

pub(super) fn create_readback_buffer(device: &wgpu::Device, size: u64) -> wgpu::Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("blur_readback_buffer"),
        size,
        usage: wgpu::BufferUsages::MAP_READ | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

pub(super) fn encode_copy_texture_to_buffer(
    encoder: &mut wgpu::CommandEncoder,
    texture: &wgpu::Texture,
    buffer: &wgpu::Buffer,
    size: (u32, u32),
    padded_bytes_per_row: u32,
) {
    encoder.copy_texture_to_buffer(
        wgpu::TexelCopyTextureInfo {
            texture,
            mip_level: 0,
            origin: wgpu::Origin3d::ZERO,
            aspect: wgpu::TextureAspect::All,
        },
        wgpu::TexelCopyBufferInfo {
            buffer,
            layout: wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(padded_bytes_per_row),
                rows_per_image: Some(size.1),
            },
        },
        wgpu::Extent3d {
            width: size.0,
            height: size.1,
            depth_or_array_layers: 1,
        },
    );
}

/// Blocks until `buffer` is mapped and appends its contents to `mapped_bytes`.
pub(super) fn map_buffer_into(
    device: &wgpu::Device,
    buffer: &wgpu::Buffer,
    mapped_bytes: &mut Vec<u8>,
) -> Result<(), BlurError> {
    mapped_bytes.clear();

    let buffer_slice = buffer.slice(..);
    let (sender, receiver) = std::sync::mpsc::channel();
    buffer_slice.map_async(wgpu::MapMode::Read, move |result| {
        if sender.send(result).is_err() {
            tracing::warn!("readback receiver dropped before the buffer was mapped");
        }
    });

    let _ = device.poll(wgpu::MaintainBase::Wait);

    receiver
        .recv()
        .map_err(|e| BlurError::Readback(e.to_string()))??;

    let mapped_range = buffer_slice.get_mapped_range();
    mapped_bytes.extend_from_slice(&mapped_range);
    drop(mapped_range);
    buffer.unmap();

    Ok(())
}

/// Copies `height` rows of `unpadded_bytes_per_row` out of padded rows.
pub(super) fn strip_row_padding(
    data: &[u8],
    height: u32,
    unpadded_bytes_per_row: u32,
    padded_bytes_per_row: u32,
    output: &mut Vec<u8>,
) {
    output.clear();
    output.reserve((unpadded_bytes_per_row * height) as usize);

    for row in data
        .chunks(padded_bytes_per_row as usize)
        .take(height as usize)
    {
        output.extend_from_slice(&row[..unpadded_bytes_per_row as usize]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_are_padded_to_copy_alignment() {
        assert_eq!(padded_bytes_per_row(64, 4), (256, 256));
        assert_eq!(padded_bytes_per_row(3, 4), (12, 256));
        assert_eq!(padded_bytes_per_row(65, 4), (260, 512));
    }

    #[test]
    fn unpadded_rows_pass_through() {
        let data = vec![1, 2, 3, 4, 5, 6, 7, 8];
        let mut output = Vec::new();
        strip_row_padding(&data, 2, 4, 4, &mut output);
        assert_eq!(output, data);
    }

    #[test]
    fn padding_is_stripped() {
        let data = vec![1, 2, 3, 4, 9, 9, 9, 9, 5, 6, 7, 8, 9, 9, 9, 9];
        let mut output = vec![42];
        strip_row_padding(&data, 2, 4, 8, &mut output);
        assert_eq!(output, vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }
}
