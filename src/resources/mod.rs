//! Asset loading.
//!
//! Texture requests are issued as one batch and each request settles
//! individually: a failed fetch or decode resolves to a deterministic 1×1
//! placeholder instead of failing the batch, so scene construction proceeds
//! unconditionally once everything has settled. Fetched bytes land in a
//! process-wide cache keyed by path, so a secondary scene requesting the same
//! resource reuses it instead of re-fetching.

pub mod texture;

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, OnceLock},
};

use image::DynamicImage;

/// Logical texture roles of the planet scene.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureRole {
    Day,
    Night,
    Clouds,
    Stars,
    Normal,
    Specular,
}

/// Resource identifiers, resolved relative to the static asset root.
#[derive(Clone, Debug)]
pub struct TexturePaths {
    pub day: String,
    pub night: String,
    pub clouds: String,
    pub stars: String,
    pub normal: String,
    pub specular: String,
}

impl Default for TexturePaths {
    fn default() -> Self {
        Self {
            day: "textures/earth/day.webp".into(),
            night: "textures/earth/night.webp".into(),
            clouds: "textures/earth/clouds.webp".into(),
            stars: "textures/earth/stars_milkyway.webp".into(),
            normal: "textures/earth/normal.png".into(),
            specular: "textures/earth/specular.png".into(),
        }
    }
}

/// A decoded image, or the placeholder standing in for a failed load.
#[derive(Clone, Debug)]
pub struct LoadedImage {
    pub image: DynamicImage,
    pub placeholder: bool,
}

impl LoadedImage {
    /// Decode fetched bytes, falling back to the placeholder on any error.
    pub fn resolve(role: TextureRole, fetched: anyhow::Result<Arc<Vec<u8>>>) -> Self {
        let decoded = fetched.and_then(|bytes| Ok(image::load_from_memory(&bytes)?));
        match decoded {
            Ok(image) => Self {
                image,
                placeholder: false,
            },
            Err(e) => {
                log::warn!("texture {role:?} failed to load, using placeholder: {e}");
                Self::placeholder()
            }
        }
    }

    /// The deterministic stand-in: a single blank pixel.
    pub fn placeholder() -> Self {
        Self {
            image: DynamicImage::new_rgba8(1, 1),
            placeholder: true,
        }
    }
}

/// One decoded (or placeholder) image per texture role.
#[derive(Clone, Debug)]
pub struct TextureSet {
    pub day: LoadedImage,
    pub night: LoadedImage,
    pub clouds: LoadedImage,
    pub stars: LoadedImage,
    pub normal: LoadedImage,
    pub specular: LoadedImage,
}

impl TextureSet {
    /// Fetch and decode every role. Resolves once all requests have settled;
    /// never errors, per-role failures degrade to placeholders.
    pub async fn load(paths: &TexturePaths) -> Self {
        let order = [
            paths.day.as_str(),
            paths.night.as_str(),
            paths.clouds.as_str(),
            paths.stars.as_str(),
            paths.normal.as_str(),
            paths.specular.as_str(),
        ];
        let mut fetched =
            futures::future::join_all(order.iter().map(|path| load_binary(path))).await;
        let mut next = |role| LoadedImage::resolve(role, fetched.remove(0));
        Self {
            day: next(TextureRole::Day),
            night: next(TextureRole::Night),
            clouds: next(TextureRole::Clouds),
            stars: next(TextureRole::Stars),
            normal: next(TextureRole::Normal),
            specular: next(TextureRole::Specular),
        }
    }

}

fn fetch_cache() -> &'static Mutex<HashMap<String, Arc<Vec<u8>>>> {
    static CACHE: OnceLock<Mutex<HashMap<String, Arc<Vec<u8>>>>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("no origin"))?;
    let base = reqwest::Url::parse(&format!("{}/assets/", origin))?;
    Ok(base.join(file_name)?)
}

/// Fetch a resource by path, serving repeated requests from the cache.
pub async fn load_binary(file_name: &str) -> anyhow::Result<Arc<Vec<u8>>> {
    if let Some(bytes) = fetch_cache()
        .lock()
        .expect("fetch cache poisoned")
        .get(file_name)
    {
        return Ok(bytes.clone());
    }

    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        reqwest::get(url).await?.bytes().await?.to_vec()
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        let path = std::path::Path::new("./").join("assets").join(file_name);
        std::fs::read(path)?
    };

    let data = Arc::new(data);
    fetch_cache()
        .lock()
        .expect("fetch cache poisoned")
        .insert(file_name.to_string(), data.clone());
    Ok(data)
}
