use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Content-addressed asset ID computed from the asset data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssetId(pub u64);

/// Axis-aligned box mesh, sized in world units.
#[derive(Debug, Clone, PartialEq)]
pub struct BoxMesh {
    pub name: String,
    pub extents: [f32; 3],
}

/// Flat-shaded material.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub name: String,
    pub base_color: [f32; 4],
}

impl Material {
    /// Opaque material from a `0xRRGGBB` colour.
    pub fn from_rgb(name: impl Into<String>, rgb: u32) -> Self {
        let channel = |shift: u32| ((rgb >> shift) & 0xff) as f32 / 255.0;
        Self {
            name: name.into(),
            base_color: [channel(16), channel(8), channel(0), 1.0],
        }
    }
}

impl Default for Material {
    fn default() -> Self {
        Self {
            name: "default".into(),
            base_color: [0.8, 0.8, 0.8, 1.0],
        }
    }
}

/// An asset entry in the registry.
#[derive(Debug, Clone, PartialEq)]
pub enum Asset {
    Mesh(BoxMesh),
    Material(Material),
}

/// Errors from asset operations.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("asset not found: {0:?}")]
    NotFound(AssetId),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Content-addressed asset registry.
///
/// Registering identical content twice yields the same id and one entry.
#[derive(Debug, Clone, Default)]
pub struct AssetStore {
    assets: BTreeMap<AssetId, Asset>,
}

impl AssetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mesh and return its asset ID.
    pub fn register_mesh(&mut self, mesh: BoxMesh) -> AssetId {
        let mut hasher = Sha256::new();
        hasher.update(b"mesh");
        hasher.update(mesh.name.as_bytes());
        for e in mesh.extents {
            hasher.update(e.to_le_bytes());
        }
        let id = AssetId(digest_prefix(hasher));
        self.assets.insert(id, Asset::Mesh(mesh));
        id
    }

    /// Register a material and return its asset ID.
    pub fn register_material(&mut self, material: Material) -> AssetId {
        let mut hasher = Sha256::new();
        hasher.update(b"material");
        hasher.update(material.name.as_bytes());
        for c in material.base_color {
            hasher.update(c.to_le_bytes());
        }
        let id = AssetId(digest_prefix(hasher));
        self.assets.insert(id, Asset::Material(material));
        id
    }

    /// Get an asset by ID.
    pub fn get(&self, id: AssetId) -> Result<&Asset, AssetError> {
        self.assets.get(&id).ok_or(AssetError::NotFound(id))
    }

    /// Get a mesh by ID.
    pub fn get_mesh(&self, id: AssetId) -> Option<&BoxMesh> {
        match self.assets.get(&id) {
            Some(Asset::Mesh(m)) => Some(m),
            _ => None,
        }
    }

    /// Get a material by ID.
    pub fn get_material(&self, id: AssetId) -> Option<&Material> {
        match self.assets.get(&id) {
            Some(Asset::Material(m)) => Some(m),
            _ => None,
        }
    }

    /// Number of registered assets.
    pub fn len(&self) -> usize {
        self.assets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assets.is_empty()
    }
}

/// First 8 bytes of a SHA-256 digest as a little-endian integer.
pub(crate) fn digest_prefix(hasher: Sha256) -> u64 {
    let result = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&result[..8]);
    u64::from_le_bytes(bytes)
}
