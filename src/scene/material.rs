use crate::scene::texture::{Texture, TextureHandle, TextureMap};
use log::{debug, warn};
use nalgebra::Vector3;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::Path;
use std::sync::{Arc, OnceLock};

/// Name of the material every unmatched geometry falls back to.
pub const DEFAULT_MATERIAL: &str = "default";

/// A texture map slot: a file name read from MTL until resolution binds it.
#[derive(Debug, Clone)]
pub enum TextureSlot {
    File(String),
    Bound(TextureHandle),
}

impl TextureSlot {
    pub fn handle(&self) -> Option<&TextureHandle> {
        match self {
            TextureSlot::Bound(handle) => Some(handle),
            TextureSlot::File(_) => None,
        }
    }
}

/// Built-in 1x1 textures shared by every default material.
struct DefaultMaps {
    diffuse: TextureHandle,
    specular: TextureHandle,
    normal: TextureHandle,
}

fn default_maps() -> &'static DefaultMaps {
    static MAPS: OnceLock<DefaultMaps> = OnceLock::new();
    MAPS.get_or_init(|| DefaultMaps {
        diffuse: Arc::new(Texture::solid("default_diffuse", [255, 255, 255, 255])),
        specular: Arc::new(Texture::solid("default_specular", [255, 255, 255, 255])),
        normal: Arc::new(Texture::solid("default_normal", [128, 128, 255, 255])),
    })
}

/// Shading parameters of one MTL material.
#[derive(Debug, Clone)]
pub struct Material {
    pub name: String,
    /// `Ka`
    pub ambient: Vector3<f32>,
    /// `Kd`
    pub diffuse: Vector3<f32>,
    /// `Ks`
    pub specular: Vector3<f32>,
    /// `Ke`
    pub emissive: Vector3<f32>,
    /// `Ns`
    pub shininess: f32,
    /// `d`, or `1 - Tr`
    pub opacity: f32,
    /// `Ni`
    pub optical_density: f32,
    /// `illum`
    pub illumination: u32,
    /// `map_Kd`
    pub diffuse_map: TextureSlot,
    /// `map_Ns`
    pub specular_map: TextureSlot,
    /// `mapBump` / `map_Bump` / `bump`
    pub normal_map: TextureSlot,
}

impl Default for Material {
    fn default() -> Self {
        let maps = default_maps();
        Self {
            name: DEFAULT_MATERIAL.to_string(),
            ambient: Vector3::new(0.1, 0.1, 0.1),
            diffuse: Vector3::new(0.8, 0.8, 0.8),
            specular: Vector3::new(0.5, 0.5, 0.5),
            emissive: Vector3::zeros(),
            shininess: 32.0,
            opacity: 1.0,
            optical_density: 1.0,
            illumination: 2,
            diffuse_map: TextureSlot::Bound(maps.diffuse.clone()),
            specular_map: TextureSlot::Bound(maps.specular.clone()),
            normal_map: TextureSlot::Bound(maps.normal.clone()),
        }
    }
}

impl Material {
    /// Binds every map still holding a file name, falling back to the
    /// corresponding slot of `fallback` when the name cannot be found.
    pub fn resolve_textures(&mut self, textures: &TextureMap, fallback: &Material) {
        let name = self.name.clone();
        resolve_slot(&name, "map_Kd", &mut self.diffuse_map, &fallback.diffuse_map, textures);
        resolve_slot(&name, "map_Ns", &mut self.specular_map, &fallback.specular_map, textures);
        resolve_slot(&name, "mapBump", &mut self.normal_map, &fallback.normal_map, textures);
    }
}

fn resolve_slot(
    material: &str,
    keyword: &str,
    slot: &mut TextureSlot,
    fallback: &TextureSlot,
    textures: &TextureMap,
) {
    let TextureSlot::File(file) = slot else {
        return;
    };
    let file = file.clone();

    // Maps often carry a relative path while uploads are keyed by bare name.
    let found = textures.get(file.as_str()).or_else(|| {
        Path::new(file.as_str())
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| textures.get(n))
    });

    match found {
        Some(handle) => {
            debug!("Material '{}': bound {} '{}'", material, keyword, file);
            *slot = TextureSlot::Bound(handle.clone());
        }
        None => {
            warn!(
                "Material '{}': texture '{}' for {} not found, using default",
                material, file, keyword
            );
            *slot = match fallback {
                TextureSlot::Bound(_) => fallback.clone(),
                // The fallback itself was never resolved; use the built-in map.
                TextureSlot::File(_) => builtin_slot(keyword),
            };
        }
    }
}

fn builtin_slot(keyword: &str) -> TextureSlot {
    let maps = default_maps();
    let handle = match keyword {
        "map_Kd" => &maps.diffuse,
        "map_Ns" => &maps.specular,
        _ => &maps.normal,
    };
    TextureSlot::Bound(handle.clone())
}

/// Materials keyed by name. Always contains [`DEFAULT_MATERIAL`].
#[derive(Debug, Clone)]
pub struct MaterialTable {
    materials: HashMap<String, Material>,
}

impl Default for MaterialTable {
    fn default() -> Self {
        let mut materials = HashMap::new();
        materials.insert(DEFAULT_MATERIAL.to_string(), Material::default());
        Self { materials }
    }
}

impl MaterialTable {
    /// Inserts a fresh copy of the default material named `name`, replacing
    /// any previous definition, and returns it for editing.
    pub fn create(&mut self, name: &str) -> &mut Material {
        let material = Material {
            name: name.to_string(),
            ..self.default_material().clone()
        };
        match self.materials.entry(name.to_string()) {
            Entry::Occupied(mut entry) => {
                entry.insert(material);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(material),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Material> {
        self.materials.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Material> {
        self.materials.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.materials.contains_key(name)
    }

    /// The material for `name`, or the default one when it is unknown.
    pub fn get_or_default(&self, name: &str) -> &Material {
        self.get(name).unwrap_or_else(|| self.default_material())
    }

    pub fn default_material(&self) -> &Material {
        static FALLBACK: OnceLock<Material> = OnceLock::new();
        self.materials
            .get(DEFAULT_MATERIAL)
            .unwrap_or_else(|| FALLBACK.get_or_init(Material::default))
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.materials.keys().map(String::as_str)
    }

    /// Resolves the texture maps of every material. The default material is
    /// resolved first so the others can fall back to its bound maps.
    pub fn resolve_textures(&mut self, textures: &TextureMap) {
        let builtin = Material::default();
        if let Some(default) = self.materials.get_mut(DEFAULT_MATERIAL) {
            default.resolve_textures(textures, &builtin);
        }
        let fallback = self.default_material().clone();
        for (name, material) in self.materials.iter_mut() {
            if name != DEFAULT_MATERIAL {
                material.resolve_textures(textures, &fallback);
            }
        }
    }
}
