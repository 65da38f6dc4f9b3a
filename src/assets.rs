//! Asset registry and loading barrier
//!
//! Loads run concurrently and report back into an [`AssetPool`], which keeps a
//! pending counter. PNGs are decoded on arrival and held as RGBA until the
//! driver uploads them with [`AssetPool::upload_decoded`]; the simulation then
//! looks textures up by name.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::renderer::Texture;

/// Textures the game needs, by name and path relative to the page
pub const TEXTURE_MANIFEST: &[(&str, &str)] = &[
    ("player", "assets/images/yellowbird.png"),
    ("pipe", "assets/images/pipe-green.png"),
    ("background", "assets/images/background-day.png"),
    ("background-night", "assets/images/background-night.png"),
    ("ground", "assets/images/base.png"),
    ("digits", "assets/images/digits.png"),
    ("gameover", "assets/images/gameover.png"),
];

/// Sound clips, keyed by cue name
pub const SOUND_MANIFEST: &[(&str, &str)] = &[
    ("wing", "assets/audio/audio_wing.ogg"),
    ("point", "assets/audio/audio_point.ogg"),
    ("hit", "assets/audio/audio_hit.ogg"),
    ("die", "assets/audio/audio_die.ogg"),
    ("swoosh", "assets/audio/audio_swoosh.ogg"),
];

/// How often the load barrier re-checks the pending count
pub const LOAD_POLL_MS: i32 = 250;

#[derive(Debug, Error)]
pub enum AssetError {
    #[error("asset '{name}' unavailable: {reason}")]
    Unavailable { name: String, reason: String },
    #[error("failed to decode '{name}'")]
    Decode {
        name: String,
        #[source]
        source: image::ImageError,
    },
}

impl AssetError {
    pub fn unavailable(name: &str, reason: impl Into<String>) -> Self {
        Self::Unavailable {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    /// Name of the asset that failed
    pub fn name(&self) -> &str {
        match self {
            Self::Unavailable { name, .. } | Self::Decode { name, .. } => name,
        }
    }
}

/// RGBA8 pixels waiting for GPU upload
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

pub fn decode_png(name: &str, bytes: &[u8]) -> Result<DecodedImage, AssetError> {
    let image = image::load_from_memory_with_format(bytes, image::ImageFormat::Png).map_err(
        |source| AssetError::Decode {
            name: name.to_string(),
            source,
        },
    )?;
    let rgba = image.to_rgba8();
    Ok(DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    })
}

#[derive(Debug, Default)]
pub struct AssetPool {
    textures: HashMap<String, Texture>,
    decoded: Vec<(String, DecodedImage)>,
    sounds: HashSet<String>,
    pending: usize,
    failures: Vec<AssetError>,
}

impl AssetPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an in-flight load
    pub fn begin_load(&mut self) {
        self.pending += 1;
    }

    fn complete(&mut self) {
        self.pending = self.pending.saturating_sub(1);
    }

    pub fn finish_texture(&mut self, name: &str, image: DecodedImage) {
        log::debug!("Decoded {name} ({}x{})", image.width, image.height);
        self.decoded.push((name.to_string(), image));
        self.complete();
    }

    pub fn finish_sound(&mut self, name: &str) {
        log::debug!("Decoded sound {name}");
        self.sounds.insert(name.to_string());
        self.complete();
    }

    pub fn fail(&mut self, error: AssetError) {
        log::error!("{error}");
        self.failures.push(error);
        self.complete();
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn is_loaded(&self) -> bool {
        self.pending == 0
    }

    pub fn failures(&self) -> &[AssetError] {
        &self.failures
    }

    /// Register an already uploaded texture
    pub fn insert_texture(&mut self, name: &str, texture: Texture) {
        self.textures.insert(name.to_string(), texture);
    }

    /// Hand decoded images to `upload` and register the returned handles
    pub fn upload_decoded<F>(&mut self, mut upload: F) -> usize
    where
        F: FnMut(&str, &DecodedImage) -> Texture,
    {
        let decoded = std::mem::take(&mut self.decoded);
        let count = decoded.len();
        for (name, image) in decoded {
            let texture = upload(&name, &image);
            self.textures.insert(name, texture);
        }
        count
    }

    pub fn texture(&self, name: &str) -> Result<Texture, AssetError> {
        self.textures
            .get(name)
            .copied()
            .ok_or_else(|| AssetError::unavailable(name, "not loaded"))
    }

    pub fn has_sound(&self, name: &str) -> bool {
        self.sounds.contains(name)
    }

    /// Check that every named asset arrived; reports the first that did not
    pub fn require(&self, textures: &[&str], sounds: &[&str]) -> Result<(), AssetError> {
        if let Some(failure) = self.failures.first() {
            return Err(AssetError::unavailable(failure.name(), failure.to_string()));
        }
        if self.pending > 0 {
            return Err(AssetError::unavailable(
                "*",
                format!("{} loads still pending", self.pending),
            ));
        }
        for name in textures {
            self.texture(name)?;
        }
        match sounds.iter().find(|name| !self.has_sound(name)) {
            Some(name) => Err(AssetError::unavailable(name, "sound not loaded")),
            None => Ok(()),
        }
    }
}

#[cfg(target_arch = "wasm32")]
pub use web::{load_audio, load_texture, wait_for_all};

#[cfg(target_arch = "wasm32")]
mod web {
    use std::cell::RefCell;
    use std::rc::Rc;

    use wasm_bindgen::JsCast;
    use wasm_bindgen::prelude::*;
    use wasm_bindgen_futures::{JsFuture, spawn_local};
    use web_sys::Response;

    use super::{AssetError, AssetPool, LOAD_POLL_MS, decode_png};
    use crate::audio::AudioManager;

    async fn fetch_buffer(url: &str) -> Result<JsValue, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window"))?;
        let response: Response = JsFuture::from(window.fetch_with_str(url))
            .await?
            .dyn_into()?;
        if !response.ok() {
            return Err(JsValue::from_str(&format!("HTTP {}", response.status())));
        }
        JsFuture::from(response.array_buffer()?).await
    }

    fn js_error(name: &str, err: JsValue) -> AssetError {
        AssetError::unavailable(name, format!("{err:?}"))
    }

    /// Fetch and decode a PNG in the background
    pub fn load_texture(pool: &Rc<RefCell<AssetPool>>, name: &str, url: &str) {
        pool.borrow_mut().begin_load();
        let pool = Rc::clone(pool);
        let name = name.to_string();
        let url = url.to_string();

        spawn_local(async move {
            let result = match fetch_buffer(&url).await {
                Ok(buffer) => decode_png(&name, &js_sys::Uint8Array::new(&buffer).to_vec()),
                Err(e) => Err(js_error(&name, e)),
            };
            let mut pool = pool.borrow_mut();
            match result {
                Ok(image) => pool.finish_texture(&name, image),
                Err(e) => pool.fail(e),
            }
        });
    }

    /// Fetch a clip and decode it with the audio context
    pub fn load_audio(
        pool: &Rc<RefCell<AssetPool>>,
        audio: &Rc<RefCell<AudioManager>>,
        name: &str,
        url: &str,
    ) {
        pool.borrow_mut().begin_load();
        let pool = Rc::clone(pool);
        let audio = Rc::clone(audio);
        let name = name.to_string();
        let url = url.to_string();

        spawn_local(async move {
            let result = async {
                let buffer: js_sys::ArrayBuffer = fetch_buffer(&url).await?.dyn_into()?;
                let promise = {
                    let audio = audio.borrow();
                    let ctx = audio
                        .context()
                        .ok_or_else(|| JsValue::from_str("audio disabled"))?;
                    ctx.decode_audio_data(&buffer)?
                };
                let clip: web_sys::AudioBuffer = JsFuture::from(promise).await?.dyn_into()?;
                Ok::<_, JsValue>(clip)
            }
            .await;

            match result {
                Ok(clip) => {
                    audio.borrow_mut().insert_clip(&name, clip);
                    pool.borrow_mut().finish_sound(&name);
                }
                Err(e) => pool.borrow_mut().fail(js_error(&name, e)),
            }
        });
    }

    async fn sleep(ms: i32) {
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            if let Some(window) = web_sys::window() {
                let _ = window
                    .set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, ms);
            }
        });
        let _ = JsFuture::from(promise).await;
    }

    /// Resolve once no loads are pending
    pub async fn wait_for_all(pool: &Rc<RefCell<AssetPool>>) {
        loop {
            let pending = pool.borrow().pending();
            if pending == 0 {
                break;
            }
            log::debug!("Waiting on {pending} assets");
            sleep(LOAD_POLL_MS).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::renderer::TextureId;
    use std::io::Cursor;

    fn png_bytes(w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(w, h, image::Rgba([10, 20, 30, 255]));
        let mut bytes = Vec::new();
        img.write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn test_decode_png_to_rgba() {
        let image = decode_png("test", &png_bytes(3, 2)).unwrap();
        assert_eq!((image.width, image.height), (3, 2));
        assert_eq!(image.rgba.len(), 3 * 2 * 4);
        assert_eq!(&image.rgba[..4], &[10, 20, 30, 255]);
    }

    #[test]
    fn test_decode_garbage_is_decode_error() {
        let err = decode_png("broken", b"definitely not a png").unwrap_err();
        assert!(matches!(err, AssetError::Decode { .. }));
        assert_eq!(err.name(), "broken");
    }

    #[test]
    fn test_barrier_counts_and_upload() {
        let mut pool = AssetPool::new();
        pool.begin_load();
        pool.begin_load();
        assert_eq!(pool.pending(), 2);
        assert!(pool.require(&["player"], &[]).is_err());

        pool.finish_texture("player", decode_png("player", &png_bytes(34, 72)).unwrap());
        pool.finish_sound("wing");
        assert!(pool.is_loaded());

        let mut next = 0;
        let uploaded = pool.upload_decoded(|_, img| {
            next += 1;
            Texture::new(TextureId(next), img.width, img.height)
        });
        assert_eq!(uploaded, 1);
        let tex = pool.texture("player").unwrap();
        assert_eq!((tex.width(), tex.height()), (34, 72));
        assert!(pool.require(&["player"], &["wing"]).is_ok());
        assert!(pool.require(&["pipe"], &[]).is_err());
        assert!(pool.require(&[], &["die"]).is_err());
    }

    #[test]
    fn test_failure_blocks_require() {
        let mut pool = AssetPool::new();
        pool.begin_load();
        pool.fail(AssetError::unavailable("pipe", "HTTP 404"));
        assert!(pool.is_loaded());
        let err = pool.require(&[], &[]).unwrap_err();
        assert_eq!(err.name(), "pipe");
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_manifest_covers_every_cue() {
        for cue in crate::audio::Cue::ALL {
            assert!(SOUND_MANIFEST.iter().any(|(name, _)| *name == cue.name()));
        }
    }
}
