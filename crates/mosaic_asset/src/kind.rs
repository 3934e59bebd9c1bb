//! Asset kinds recognized by the tile pipelines.

use crate::path::SourcePath;

/// Kind of asset based on file extension.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Texture,
    Model,
    Prefab,
    Material,
    Shader,
    Audio,
    Script,
    Unknown,
}

impl AssetKind {
    /// Determine asset kind from a file extension (without the dot).
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_ascii_lowercase().as_str() {
            // Texture formats
            "png" | "jpg" | "jpeg" | "bmp" | "tga" | "dds" | "hdr" | "exr" => AssetKind::Texture,

            // Model formats
            "obj" | "gltf" | "glb" | "fbx" | "dae" => AssetKind::Model,

            // Prefab formats
            "fab" | "prefab" => AssetKind::Prefab,

            // Material formats
            "mat" | "material" => AssetKind::Material,

            // Shader formats
            "wgsl" | "glsl" | "vert" | "frag" | "comp" | "spv" | "hlsl" | "shd" => AssetKind::Shader,

            // Audio formats
            "wav" | "mp3" | "ogg" | "flac" => AssetKind::Audio,

            // Script formats
            "lua" | "js" | "wasm" => AssetKind::Script,

            _ => AssetKind::Unknown,
        }
    }

    /// Determine asset kind from a normalized source path.
    pub fn from_path(path: &SourcePath) -> Self {
        match path.extension() {
            Some(ext) => Self::from_extension(ext),
            None => AssetKind::Unknown,
        }
    }

    /// Kinds whose tiles are produced by rendering an offscreen scene.
    pub fn is_scene_rendered(&self) -> bool {
        matches!(self, AssetKind::Model | AssetKind::Prefab)
    }

    /// Kinds the tile dispatcher accepts at all.
    pub fn has_tile_support(&self) -> bool {
        matches!(
            self,
            AssetKind::Texture
                | AssetKind::Model
                | AssetKind::Prefab
                | AssetKind::Material
                | AssetKind::Shader
        )
    }

    /// Get display name for this asset kind.
    pub fn name(&self) -> &'static str {
        match self {
            AssetKind::Texture => "Texture",
            AssetKind::Model => "Model",
            AssetKind::Prefab => "Prefab",
            AssetKind::Material => "Material",
            AssetKind::Shader => "Shader",
            AssetKind::Audio => "Audio",
            AssetKind::Script => "Script",
            AssetKind::Unknown => "Unknown",
        }
    }
}
