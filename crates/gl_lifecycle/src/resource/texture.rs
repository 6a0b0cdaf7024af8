//! 2D textures
//!
//! A texture is uploaded once from RGBA8 pixels and afterwards only bound,
//! unbound and deleted. Images can optionally be resampled to power-of-two
//! dimensions on upload for drivers that require it.

use image::imageops::{self, FilterType};
use image::RgbaImage;

use crate::assets::TextureData;
use crate::backend::GpuApi;
use crate::error::{GfxError, GfxResult};

/// Number of texture units addressable through [`TextureSlot`]
pub const MAX_TEXTURE_SLOTS: u32 = 32;

/// Texture unit a texture is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TextureSlot(u32);

impl TextureSlot {
    /// Texture unit 0
    pub const T0: Self = Self(0);

    /// Texture unit `index`, which must be below [`MAX_TEXTURE_SLOTS`]
    pub fn new(index: u32) -> GfxResult<Self> {
        if index >= MAX_TEXTURE_SLOTS {
            return Err(GfxError::invalid_argument(format!(
                "texture slot {index} is out of range (max {})",
                MAX_TEXTURE_SLOTS - 1
            )));
        }
        Ok(Self(index))
    }

    /// Unit index
    pub const fn index(self) -> u32 {
        self.0
    }

    /// OpenGL enum value (`GL_TEXTURE0 + index`)
    pub const fn gl_enum(self) -> u32 {
        0x84C0 + self.0
    }
}

/// Behavior when sampling outside of the texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WrapMode {
    /// Clamp coordinates to the edge
    Clamp,
    /// Tile the texture
    #[default]
    Repeat,
}

impl WrapMode {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Clamp => 0x2900,
            Self::Repeat => 0x2901,
        }
    }
}

/// Interpolation used when the texture is drawn at another size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResizeFilter {
    /// Nearest texel
    Nearest,
    /// Bilinear interpolation
    #[default]
    Linear,
}

impl ResizeFilter {
    /// OpenGL enum value
    pub const fn gl_enum(self) -> u32 {
        match self {
            Self::Nearest => 0x2600,
            Self::Linear => 0x2601,
        }
    }

    fn resample_filter(self) -> FilterType {
        match self {
            Self::Nearest => FilterType::Nearest,
            Self::Linear => FilterType::Triangle,
        }
    }
}

/// Sampling parameters chosen at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TextureOptions {
    /// Out-of-bounds behavior
    pub wrap: WrapMode,
    /// Minification and magnification filter
    pub filter: ResizeFilter,
    /// Resample to power-of-two dimensions before upload
    pub force_power_of_two: bool,
}

/// GPU-side 2D texture
#[derive(Debug, PartialEq, Eq)]
pub struct Texture {
    handle: u32,
    width: u32,
    height: u32,
    last_slot: TextureSlot,
}

impl Texture {
    pub(crate) fn create<G: GpuApi>(gpu: &mut G, data: &TextureData, options: TextureOptions) -> GfxResult<Self> {
        data.validate()?;

        let resampled;
        let data = if options.force_power_of_two {
            resampled = resample_to_power_of_two(data, options.filter)?;
            &resampled
        } else {
            data
        };

        let handle = gpu.gen_texture();
        if handle == 0 {
            return Err(GfxError::NativeCallFailed("glGenTextures returned no name".to_string()));
        }

        let mut texture = Self {
            handle,
            width: data.width,
            height: data.height,
            last_slot: TextureSlot::T0,
        };
        texture.bind(gpu, TextureSlot::T0);
        gpu.set_texture_parameters(options.wrap, options.filter);
        gpu.upload_texture_rgba8(data.width, data.height, &data.pixels);
        texture.unbind(gpu);

        log::debug!("Uploaded texture {} ({}x{})", handle, data.width, data.height);
        Ok(texture)
    }

    /// Width in texels, `0` once released
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in texels, `0` once released
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Native texture name
    pub fn native_handle(&self) -> u32 {
        self.handle
    }

    /// Slot of the most recent bind
    pub fn last_slot(&self) -> TextureSlot {
        self.last_slot
    }

    pub(crate) fn bind<G: GpuApi>(&mut self, gpu: &mut G, slot: TextureSlot) {
        gpu.active_texture(slot);
        gpu.bind_texture(self.handle);
        self.last_slot = slot;
    }

    /// Unbinds whatever texture occupies the last slot this one was bound to
    pub(crate) fn unbind<G: GpuApi>(&self, gpu: &mut G) {
        gpu.active_texture(self.last_slot);
        gpu.bind_texture(0);
    }

    pub(crate) fn release<G: GpuApi>(&mut self, gpu: &mut G) {
        gpu.delete_texture(self.handle);
        self.width = 0;
        self.height = 0;
    }
}

/// Smallest power of two that is at least `value`, never below 2
pub fn next_power_of_two(value: u32) -> u32 {
    value.max(2).next_power_of_two()
}

fn resample_to_power_of_two(data: &TextureData, filter: ResizeFilter) -> GfxResult<TextureData> {
    let width = next_power_of_two(data.width);
    let height = next_power_of_two(data.height);
    if width == data.width && height == data.height {
        return Ok(data.clone());
    }

    let image = RgbaImage::from_raw(data.width, data.height, data.pixels.clone())
        .ok_or_else(|| GfxError::invalid_argument("pixel buffer does not match texture dimensions"))?;
    let resized = imageops::resize(&image, width, height, filter.resample_filter());

    log::trace!("Resampled texture {}x{} -> {}x{}", data.width, data.height, width, height);
    Ok(TextureData {
        width,
        height,
        pixels: resized.into_raw(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::headless::{GpuCall, RecordingGpu};

    #[test]
    fn test_next_power_of_two() {
        assert_eq!(next_power_of_two(0), 2);
        assert_eq!(next_power_of_two(1), 2);
        assert_eq!(next_power_of_two(2), 2);
        assert_eq!(next_power_of_two(3), 4);
        assert_eq!(next_power_of_two(100), 128);
        assert_eq!(next_power_of_two(256), 256);
    }

    #[test]
    fn test_slot_bounds() {
        assert_eq!(TextureSlot::new(31).unwrap().gl_enum(), 0x84C0 + 31);
        assert!(TextureSlot::new(32).is_err());
    }

    #[test]
    fn test_create_issues_upload_sequence() {
        let mut gpu = RecordingGpu::new();
        let data = TextureData::solid_color(4, 2, [255, 0, 0, 255]);
        let options = TextureOptions {
            wrap: WrapMode::Clamp,
            filter: ResizeFilter::Nearest,
            force_power_of_two: false,
        };
        let texture = Texture::create(&mut gpu, &data, options).unwrap();

        let name = texture.native_handle();
        assert_eq!(
            gpu.calls(),
            &[
                GpuCall::GenTexture(name),
                GpuCall::ActiveTexture(TextureSlot::T0),
                GpuCall::BindTexture(name),
                GpuCall::TextureParameters { wrap: WrapMode::Clamp, filter: ResizeFilter::Nearest },
                GpuCall::UploadTexture { width: 4, height: 2, bytes: 32 },
                GpuCall::ActiveTexture(TextureSlot::T0),
                GpuCall::BindTexture(0),
            ]
        );
    }

    #[test]
    fn test_power_of_two_resample() {
        let mut gpu = RecordingGpu::new();
        let data = TextureData::solid_color(3, 5, [10, 20, 30, 255]);
        let options = TextureOptions { force_power_of_two: true, ..TextureOptions::default() };
        let texture = Texture::create(&mut gpu, &data, options).unwrap();

        assert_eq!((texture.width(), texture.height()), (4, 8));
        assert!(gpu
            .calls()
            .contains(&GpuCall::UploadTexture { width: 4, height: 8, bytes: 4 * 8 * 4 }));
    }

    #[test]
    fn test_mismatched_pixels_rejected_before_native_calls() {
        let mut gpu = RecordingGpu::new();
        let data = TextureData { width: 2, height: 2, pixels: vec![0; 3] };
        assert!(Texture::create(&mut gpu, &data, TextureOptions::default()).is_err());
        assert_eq!(gpu.call_count(), 0);
    }

    #[test]
    fn test_release_zeroes_size() {
        let mut gpu = RecordingGpu::new();
        let mut texture =
            Texture::create(&mut gpu, &TextureData::solid_color(2, 2, [0; 4]), TextureOptions::default()).unwrap();
        texture.release(&mut gpu);
        assert_eq!((texture.width(), texture.height()), (0, 0));
        assert_eq!(gpu.live_object_count(), 0);
    }
}
