use crate::core::error::{ViewerError, ViewerResult};
use crate::io::obj_parser::parse;
use crate::scene::mesh::Mesh;
use crate::scene::texture::{TextureMap, load_texture_dir};
use log::{info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Loads an OBJ file together with its materials and textures.
///
/// # Arguments
/// * `path` - The .obj file.
/// * `extra_mtl` - MTL files to read in addition to the `mtllib` references.
/// * `texture_dir` - Directory whose images become the texture map.
///
/// `mtllib` libraries are looked up next to the OBJ. A missing library is
/// logged and skipped; a missing OBJ is an error.
pub fn load_obj<P: AsRef<Path>>(
    path: P,
    extra_mtl: &[PathBuf],
    texture_dir: Option<&Path>,
) -> ViewerResult<Mesh> {
    let path = path.as_ref();
    info!("Loading OBJ file: {}", path.display());
    let obj_text = fs::read_to_string(path).map_err(|e| ViewerError::io(path, e))?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut mtl_paths: Vec<PathBuf> = referenced_libraries(&obj_text)
        .map(|name| base_dir.join(name))
        .collect();
    mtl_paths.extend(extra_mtl.iter().cloned());

    // Materials go first so they exist before `usemtl` refers to them.
    let mut text = String::new();
    for mtl in &mtl_paths {
        match fs::read_to_string(mtl) {
            Ok(content) => {
                info!("Reading material library: {}", mtl.display());
                text.push_str(&content);
                text.push('\n');
            }
            Err(e) => warn!("Skipping material library '{}': {}", mtl.display(), e),
        }
    }
    text.push_str(&obj_text);

    let textures = match texture_dir {
        Some(dir) => load_texture_dir(dir)?,
        None => TextureMap::new(),
    };

    let mesh = parse(&text, &textures);
    info!(
        "Loaded '{}': {} geometries, {} triangles",
        path.display(),
        mesh.geometries.len(),
        mesh.triangle_count()
    );
    Ok(mesh)
}

/// Library names from `mtllib` lines, names with spaces kept intact.
fn referenced_libraries(obj_text: &str) -> impl Iterator<Item = &str> {
    obj_text.lines().filter_map(|line| {
        line.trim()
            .strip_prefix("mtllib")
            .filter(|rest| rest.starts_with(char::is_whitespace))
            .map(str::trim)
            .filter(|name| !name.is_empty())
    })
}
