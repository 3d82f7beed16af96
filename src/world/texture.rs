// Format-agnostic repository of texture descriptors.
// The visual engine only needs sizes, scale and load state; pixels live
// with the renderer.  Everything else talks through `TextureId`.

use std::collections::HashMap;

use glam::DVec2;

use super::NO_TEXTURE_NAME;

/// Runtime handle for a texture in this bank.
///
/// *Guaranteed* to remain stable for the lifetime of the bank.
pub type TextureId = u16;

/// Shown where a part has no texture name at all.
/// Always = 0 because `TextureBank::new()` inserts it first.
pub const MISSING_TEXTURE: TextureId = 0;

/// Placeholder for a name that is unknown or still loading.
/// Always = 1.
pub const UNKNOWN_TEXTURE: TextureId = 1;

/// Image descriptor as the texture loader reports it.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    pub name: String,
    /// Native size in pixels.
    pub w: u32,
    pub h: u32,
    /// Native → scaled ratio (1 / TEXTURES `XScale`, `YScale`).
    pub scale: DVec2,
    /// Offsets are in world units rather than texture pixels.
    pub world_panning: bool,
    /// A hi-res replacement standing in for a lower resolution original.
    pub hires: bool,
    /// Pixel data has finished loading.
    pub loaded: bool,
}

impl Texture {
    pub fn new(name: &str, w: u32, h: u32) -> Self {
        Texture {
            name: name.to_string(),
            w,
            h,
            scale: DVec2::ONE,
            world_panning: false,
            hires: false,
            loaded: true,
        }
    }

    #[inline]
    pub fn scaled_w(&self) -> f64 {
        f64::from(self.w) * self.scale.x
    }

    #[inline]
    pub fn scaled_h(&self) -> f64 {
        f64::from(self.h) * self.scale.y
    }
}

/// Things that can go wrong when using the bank.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    /// Attempted to insert a second texture with an existing name.
    #[error("texture name `{0}` already present in bank")]
    Duplicate(String),

    /// Requested ID is outside `0 .. bank.len()`.
    #[error("texture id {0} out of range")]
    BadId(TextureId),

    #[error("no texture named `{0}` in bank")]
    UnknownName(String),
}

/// Outcome of looking a sidedef texture name up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextureLookup {
    /// Part has no texture set (`-` or empty).
    Missing,
    /// Name not in the bank.
    Unknown,
    /// Known, pixels not loaded yet.
    Loading(TextureId),
    Ready(TextureId),
}

/// A palette-agnostic, format-agnostic cache of texture descriptors.
///
/// * Does **not** know about WADs, PNG or OpenGL; the loader handles those.
/// * Stores exactly one copy of every name (case-insensitive).
/// * ID **0** is always the “missing” sentinel, ID **1** the “unknown” one.
///
/// **Thread-safety:** access `TextureBank` from a single thread or wrap it
/// in `RwLock`; the struct itself is not `Sync`.
pub struct TextureBank {
    by_name: HashMap<String, TextureId>,
    data: Vec<Texture>,
}

impl TextureBank {
    // ---------------------------------------------------------------------
    // Constructors
    // ---------------------------------------------------------------------

    /// Create a bank holding only the two sentinels.
    pub fn new(missing_tex: Texture, unknown_tex: Texture) -> Self {
        let mut by_name = HashMap::new();
        by_name.insert("MISSING".into(), MISSING_TEXTURE);
        by_name.insert("UNKNOWN".into(), UNKNOWN_TEXTURE);
        Self {
            by_name,
            data: vec![missing_tex, unknown_tex],
        }
    }

    pub fn with_sentinels() -> Self {
        Self::new(Texture::new("MISSING", 64, 64), Texture::new("UNKNOWN", 64, 64))
    }

    // ---------------------------------------------------------------------
    // Query helpers
    // ---------------------------------------------------------------------

    /// Number of textures stored (including both sentinels).
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.len() == 2
    }

    /// Obtain the id for a texture by name.
    pub fn id(&self, name: &str) -> Option<TextureId> {
        self.by_name.get(&name.to_ascii_uppercase()).copied()
    }

    /// Borrow a texture by id, with bounds-checking.
    pub fn texture(&self, id: TextureId) -> Result<&Texture, TextureError> {
        self.data.get(id as usize).ok_or(TextureError::BadId(id))
    }

    pub fn texture_mut(&mut self, id: TextureId) -> Result<&mut Texture, TextureError> {
        self.data
            .get_mut(id as usize)
            .ok_or(TextureError::BadId(id))
    }

    /// Sentinel-safe borrow; out-of-range ids fall back to "unknown".
    pub fn get_or_unknown(&self, id: TextureId) -> &Texture {
        self.data
            .get(id as usize)
            .unwrap_or(&self.data[UNKNOWN_TEXTURE as usize])
    }

    /// Classify a sidedef texture name.
    pub fn resolve(&self, name: &str) -> TextureLookup {
        if name.is_empty() || name == NO_TEXTURE_NAME {
            return TextureLookup::Missing;
        }
        match self.id(name) {
            None => TextureLookup::Unknown,
            Some(id) if self.data[id as usize].loaded => TextureLookup::Ready(id),
            Some(id) => TextureLookup::Loading(id),
        }
    }

    // ---------------------------------------------------------------------
    // Mutations
    // ---------------------------------------------------------------------

    /// Insert a texture under `name`.
    ///
    /// * Returns the newly assigned `TextureId`.
    /// * Fails if the name already exists (`Duplicate`).
    pub fn insert<S: Into<String>>(
        &mut self,
        name: S,
        tex: Texture,
    ) -> Result<TextureId, TextureError> {
        let name = name.into().to_ascii_uppercase();
        if self.by_name.contains_key(&name) {
            return Err(TextureError::Duplicate(name));
        }
        let id = self.data.len() as TextureId;
        self.data.push(tex);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Loader callback: pixels for `name` are now available.
    pub fn mark_loaded(&mut self, name: &str) -> Result<TextureId, TextureError> {
        let id = self
            .id(name)
            .ok_or_else(|| TextureError::UnknownName(name.to_string()))?;
        self.data[id as usize].loaded = true;
        Ok(id)
    }
}

impl Default for TextureBank {
    fn default() -> Self {
        Self::with_sentinels()
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
#[cfg(test)]
mod tests {
    use super::*;

    fn dummy_tex(name: &str, w: u32) -> Texture {
        Texture::new(name, w, 128)
    }

    #[test]
    fn insert_and_lookup() {
        let mut bank = TextureBank::with_sentinels();
        let red = bank.insert("RED", dummy_tex("RED", 64)).unwrap();
        let blue = bank.insert("blue", dummy_tex("BLUE", 256)).unwrap();

        assert_ne!(red, MISSING_TEXTURE);
        assert_ne!(red, UNKNOWN_TEXTURE);
        assert_ne!(blue, red);
        assert_eq!(bank.id("red"), Some(red));
        assert_eq!(bank.id("BLUE"), Some(blue));
        assert_eq!(bank.id("NOPE"), None);

        assert_eq!(bank.texture(red).unwrap().w, 64);
        assert_eq!(bank.texture(blue).unwrap().w, 256);
    }

    #[test]
    fn duplicate_name_rejected() {
        let mut bank = TextureBank::with_sentinels();
        bank.insert("WOOD", dummy_tex("WOOD", 64)).unwrap();
        let err = bank.insert("wood", dummy_tex("WOOD", 64)).unwrap_err();
        assert_eq!(err, TextureError::Duplicate("WOOD".into()));
        // sentinels + first WOOD
        assert_eq!(bank.len(), 3);
    }

    #[test]
    fn bad_id_guard() {
        let bank = TextureBank::with_sentinels();
        let bad = TextureId::MAX;
        assert_eq!(bank.texture(bad).unwrap_err(), TextureError::BadId(bad));
        assert_eq!(bank.get_or_unknown(bad).name, "UNKNOWN");
    }

    #[test]
    fn resolve_classifies_names() {
        let mut bank = TextureBank::with_sentinels();
        let mut slow = dummy_tex("SLOW", 64);
        slow.loaded = false;
        let slow_id = bank.insert("SLOW", slow).unwrap();
        let fast_id = bank.insert("FAST", dummy_tex("FAST", 64)).unwrap();

        assert_eq!(bank.resolve("-"), TextureLookup::Missing);
        assert_eq!(bank.resolve(""), TextureLookup::Missing);
        assert_eq!(bank.resolve("NOSUCH"), TextureLookup::Unknown);
        assert_eq!(bank.resolve("SLOW"), TextureLookup::Loading(slow_id));
        assert_eq!(bank.resolve("FAST"), TextureLookup::Ready(fast_id));

        assert_eq!(bank.mark_loaded("slow"), Ok(slow_id));
        assert_eq!(bank.resolve("SLOW"), TextureLookup::Ready(slow_id));
        assert_eq!(
            bank.mark_loaded("NOSUCH"),
            Err(TextureError::UnknownName("NOSUCH".into()))
        );
    }

    #[test]
    fn scaled_size_applies_ratio() {
        let mut t = dummy_tex("HIRES", 256);
        t.scale = DVec2::new(0.25, 0.5);
        assert_eq!(t.scaled_w(), 64.0);
        assert_eq!(t.scaled_h(), 64.0);
    }
}
