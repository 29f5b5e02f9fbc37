//! Texture loading with procedural fallbacks.
//!
//! Loading never fails from the caller's point of view: a missing or broken
//! file is replaced by a generated placeholder and a warning in the log.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, warn};

/// Why a texture file could not be used.
#[derive(Debug)]
pub enum AssetError {
    Io(std::io::Error),
    Decode(image::ImageError),
    NotFound(PathBuf),
}

impl std::fmt::Display for AssetError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetError::Io(e) => write!(f, "IO error: {}", e),
            AssetError::Decode(e) => write!(f, "Decode error: {}", e),
            AssetError::NotFound(path) => write!(f, "Not found: '{}'", path.display()),
        }
    }
}

impl std::error::Error for AssetError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AssetError::Io(e) => Some(e),
            AssetError::Decode(e) => Some(e),
            AssetError::NotFound(_) => None,
        }
    }
}

impl From<std::io::Error> for AssetError {
    fn from(e: std::io::Error) -> Self {
        AssetError::Io(e)
    }
}

impl From<image::ImageError> for AssetError {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => AssetError::Io(io),
            other => AssetError::Decode(other),
        }
    }
}

/// Decoded RGBA8 pixels, ready for upload.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    /// `true` when this is a generated placeholder.
    pub fallback: bool,
}

impl ImageData {
    pub fn decode(bytes: &[u8]) -> Result<Self, AssetError> {
        let img = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = img.dimensions();
        Ok(Self {
            width,
            height,
            pixels: img.into_raw(),
            fallback: false,
        })
    }

    pub fn open(path: &Path) -> Result<Self, AssetError> {
        if !path.exists() {
            return Err(AssetError::NotFound(path.to_path_buf()));
        }
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }

    /// A banded value-noise texture tinted from `name`, so each missing
    /// texture still looks distinct and vaguely planetary.
    pub fn placeholder(name: &str, width: u32, height: u32) -> Self {
        let seed = name_seed(name);
        let tint = tint_for(seed);
        let mut pixels = vec![0u8; (width * height * 4) as usize];

        for y in 0..height {
            let v = y as f32 / height.max(1) as f32;
            for x in 0..width {
                let u = x as f32 / width.max(1) as f32;
                let n = value_noise(u * 8.0, v * 8.0, seed) * 0.6
                    + value_noise(u * 32.0, v * 32.0, seed ^ 0x9E37) * 0.4;
                let band = 0.5 + 0.5 * (v * 18.0 + n * 4.0).sin();
                let shade = 0.35 + 0.65 * (0.6 * band + 0.4 * n);

                let idx = ((y * width + x) * 4) as usize;
                for c in 0..3 {
                    pixels[idx + c] = (tint[c] * shade * 255.0).clamp(0.0, 255.0) as u8;
                }
                pixels[idx + 3] = 255;
            }
        }

        Self {
            width,
            height,
            pixels,
            fallback: true,
        }
    }
}

/// Loads textures by name, caching results and substituting placeholders on failure.
#[derive(Debug)]
pub struct TextureProvider {
    root: PathBuf,
    placeholder_size: u32,
    cache: HashMap<String, Arc<ImageData>>,
}

impl TextureProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            placeholder_size: 256,
            cache: HashMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load `path` (relative paths resolve against the provider root) under `name`.
    ///
    /// Always returns an image; failures yield a placeholder.
    pub fn load_texture(&mut self, name: &str, path: impl AsRef<Path>) -> Arc<ImageData> {
        if let Some(image) = self.cache.get(name) {
            return Arc::clone(image);
        }

        let path = self.resolve(path.as_ref());
        let image = match ImageData::open(&path) {
            Ok(image) => {
                debug!(target: "stellar::assets", "loaded '{name}' from {}", path.display());
                image
            }
            Err(e) => {
                warn!(target: "stellar::assets", "texture '{name}': {e}; using placeholder");
                ImageData::placeholder(name, self.placeholder_size, self.placeholder_size / 2)
            }
        };

        let image = Arc::new(image);
        self.cache.insert(name.to_string(), Arc::clone(&image));
        image
    }

    /// Load `<root>/<name>.png`, falling back to `.jpg`, then to a placeholder.
    pub fn load_named(&mut self, name: &str) -> Arc<ImageData> {
        let png = PathBuf::from(format!("{name}.png"));
        let jpg = PathBuf::from(format!("{name}.jpg"));
        let path = if self.resolve(&png).exists() { png } else { jpg };
        self.load_texture(name, path)
    }

    pub fn cached(&self, name: &str) -> Option<Arc<ImageData>> {
        self.cache.get(name).cloned()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

fn name_seed(name: &str) -> u32 {
    name.bytes()
        .fold(0x811C_9DC5_u32, |h, b| (h ^ b as u32).wrapping_mul(0x0100_0193))
}

fn tint_for(seed: u32) -> [f32; 3] {
    let hue = (seed % 360) as f32 / 360.0;
    let channel = |offset: f32| 0.55 + 0.45 * ((hue + offset) * std::f32::consts::TAU).cos();
    [channel(0.0), channel(1.0 / 3.0), channel(2.0 / 3.0)]
}

fn hash(x: i32, y: i32, seed: u32) -> u32 {
    let mut h = seed;
    h = h.wrapping_add((x as u32).wrapping_mul(374_761_393));
    h = h.wrapping_add((y as u32).wrapping_mul(668_265_263));
    h ^= h >> 13;
    h = h.wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    h
}

/// Smoothly interpolated lattice noise in [0, 1].
fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let (x0, y0) = (x.floor() as i32, y.floor() as i32);
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);
    let lattice = |i: i32, j: i32| (hash(i, j, seed) & 0xFFFF) as f32 / 65535.0;
    let smooth = |t: f32| t * t * (3.0 - 2.0 * t);
    let (sx, sy) = (smooth(fx), smooth(fy));

    let top = lattice(x0, y0) + (lattice(x0 + 1, y0) - lattice(x0, y0)) * sx;
    let bottom = lattice(x0, y0 + 1) + (lattice(x0 + 1, y0 + 1) - lattice(x0, y0 + 1)) * sx;
    top + (bottom - top) * sy
}
