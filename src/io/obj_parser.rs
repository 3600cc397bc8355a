//! Streaming OBJ/MTL parser.
//!
//! OBJ and MTL text arrive as one stream. Each line is tokenized into a
//! keyword, its whitespace-separated arguments and the raw remainder (object,
//! material and library names may contain spaces), then handed to the handler
//! registered for the keyword. Handlers are plain functions over
//! [`ObjParser`]; unknown keywords and malformed lines are skipped.
//!
//! Faces are fan-triangulated and expanded into flat per-geometry arrays. A
//! new geometry starts at the first face after `o`, `usemtl` or `mtllib`.

use crate::core::geometry::{AttributePools, GeometryAccumulator, resolve_index};
use crate::core::math::tangent::{generate_tangents, placeholder_tangents};
use crate::scene::material::{DEFAULT_MATERIAL, Material, MaterialTable, TextureSlot};
use crate::scene::mesh::{Geometry, Mesh};
use crate::scene::texture::TextureMap;
use log::{debug, info, warn};
use nalgebra::{Vector2, Vector3};

const DEFAULT_TEXCOORD: [f32; 2] = [0.0, 0.0];
const DEFAULT_NORMAL: [f32; 3] = [0.0, 1.0, 0.0];
const DEFAULT_COLOR: [f32; 3] = [1.0, 1.0, 1.0];

/// Parses concatenated OBJ + MTL text into a [`Mesh`], centered through its model matrix.
///
/// Texture maps named in the MTL are bound from `textures`; names that are not
/// found fall back to the default material's maps.
pub fn parse(text: &str, textures: &TextureMap) -> Mesh {
    let mut parser = ObjParser::new();
    parser.parse_text(text);
    parser.finish(textures)
}

/// One tokenized line.
#[derive(Debug)]
struct Line<'a> {
    keyword: &'a str,
    args: Vec<&'a str>,
    /// Everything after the keyword, trimmed.
    rest: &'a str,
}

fn tokenize(line: &str) -> Option<Line<'_>> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return None;
    }
    let (keyword, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim()),
        None => (trimmed, ""),
    };
    Some(Line {
        keyword,
        args: rest.split_whitespace().collect(),
        rest,
    })
}

fn parse_floats(args: &[&str]) -> Option<Vec<f32>> {
    args.iter().map(|a| a.parse::<f32>().ok()).collect()
}

type Handler = fn(&mut ObjParser, &Line<'_>);

/// Keyword dispatch table.
fn handler_for(keyword: &str) -> Option<Handler> {
    let handler: Handler = match keyword {
        // OBJ
        "v" => handle_vertex,
        "vn" => handle_normal,
        "vt" => handle_texcoord,
        "f" => handle_face,
        "o" => handle_object,
        "usemtl" => handle_use_material,
        "mtllib" => handle_material_library,
        // MTL
        "newmtl" => handle_new_material,
        "Ns" => handle_shininess,
        "Ka" => handle_ambient,
        "Kd" => handle_diffuse,
        "Ks" => handle_specular,
        "Ke" => handle_emissive,
        "Ni" => handle_optical_density,
        "d" => handle_dissolve,
        "Tr" => handle_transparency,
        "illum" => handle_illumination,
        "map_Kd" => handle_diffuse_map,
        "map_Ns" => handle_specular_map,
        "mapBump" | "map_Bump" | "bump" => handle_normal_map,
        _ => return None,
    };
    Some(handler)
}

/// A face corner with each sub-index resolved against the pools.
#[derive(Debug, Clone, Copy, PartialEq)]
struct FaceVertex {
    position: usize,
    texcoord: Option<usize>,
    normal: Option<usize>,
}

/// Geometry under construction. Optional attributes are kept aligned with
/// the positions by back-filling defaults when a vertex lacks them.
#[derive(Debug, Default)]
struct GeometryBuilder {
    object: String,
    material: String,
    positions: Vec<f32>,
    texcoords: Vec<f32>,
    normals: Vec<f32>,
    colors: Vec<f32>,
}

/// Appends `value` as the entry of vertex `vertex`, first padding any
/// vertices before it that never got one.
fn push_aligned(array: &mut Vec<f32>, vertex: usize, value: &[f32], default: &[f32]) {
    let width = default.len();
    while array.len() < vertex * width {
        array.extend_from_slice(default);
    }
    array.extend_from_slice(value);
}

/// Pads a non-empty array up to `count` entries. Empty arrays stay empty.
fn fill_to(array: &mut Vec<f32>, count: usize, default: &[f32]) {
    if array.is_empty() {
        return;
    }
    while array.len() < count * default.len() {
        array.extend_from_slice(default);
    }
}

fn non_empty(array: Vec<f32>) -> Option<Vec<f32>> {
    (!array.is_empty()).then_some(array)
}

impl GeometryBuilder {
    fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    fn push_vertex(&mut self, pools: &AttributePools, corner: &FaceVertex) {
        let vertex = self.vertex_count();
        self.positions.extend_from_slice(pools.position(corner.position).as_slice());
        if let Some(t) = corner.texcoord {
            push_aligned(&mut self.texcoords, vertex, pools.texcoord(t).as_slice(), &DEFAULT_TEXCOORD);
        }
        if let Some(n) = corner.normal {
            push_aligned(&mut self.normals, vertex, pools.normal(n).as_slice(), &DEFAULT_NORMAL);
        }
        if pools.has_colors() {
            push_aligned(&mut self.colors, vertex, pools.color(corner.position).as_slice(), &DEFAULT_COLOR);
        }
    }

    fn finalize(mut self, materials: &MaterialTable) -> Option<Geometry> {
        if self.positions.is_empty() {
            debug!("Dropping empty geometry '{}' ({})", self.object, self.material);
            return None;
        }
        if !materials.contains(&self.material) {
            warn!(
                "Geometry '{}' uses unknown material '{}', falling back to '{}'",
                self.object, self.material, DEFAULT_MATERIAL
            );
            self.material = DEFAULT_MATERIAL.to_string();
        }

        let count = self.vertex_count();
        fill_to(&mut self.texcoords, count, &DEFAULT_TEXCOORD);
        fill_to(&mut self.normals, count, &DEFAULT_NORMAL);
        fill_to(&mut self.colors, count, &DEFAULT_COLOR);

        let tangents = if !self.texcoords.is_empty() && !self.normals.is_empty() {
            generate_tangents(&self.positions, &self.texcoords)
        } else {
            placeholder_tangents(count)
        };

        Some(Geometry {
            object: self.object,
            material: self.material,
            positions: self.positions,
            texcoords: non_empty(self.texcoords),
            normals: non_empty(self.normals),
            colors: non_empty(self.colors),
            tangents,
        })
    }
}

/// Line counters reported once parsing finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines: usize,
    pub faces: usize,
    pub triangles: usize,
    pub skipped: usize,
}

/// Parser state: the accumulated pools and materials, the geometry arena and
/// the names that the next geometry will inherit.
#[derive(Debug)]
pub struct ObjParser {
    accumulator: GeometryAccumulator,
    geometries: Vec<GeometryBuilder>,
    current: Option<usize>,
    object_name: String,
    material_name: String,
    material_libraries: Vec<String>,
    /// Target of MTL directives, set by `newmtl`.
    editing_material: Option<String>,
    stats: ParseStats,
}

impl Default for ObjParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjParser {
    pub fn new() -> Self {
        Self {
            accumulator: GeometryAccumulator::default(),
            geometries: Vec::new(),
            current: None,
            object_name: String::new(),
            material_name: DEFAULT_MATERIAL.to_string(),
            material_libraries: Vec::new(),
            editing_material: None,
            stats: ParseStats::default(),
        }
    }

    pub fn parse_text(&mut self, text: &str) {
        for line in text.lines() {
            self.parse_line(line);
        }
    }

    pub fn parse_line(&mut self, line: &str) {
        let Some(tokens) = tokenize(line) else {
            return;
        };
        self.stats.lines += 1;
        match handler_for(tokens.keyword) {
            Some(handler) => handler(self, &tokens),
            None => debug!("Ignoring unsupported keyword '{}'", tokens.keyword),
        }
    }

    pub fn pools(&self) -> &AttributePools {
        &self.accumulator.pools
    }

    pub fn materials(&self) -> &MaterialTable {
        &self.accumulator.materials
    }

    /// Library names collected from `mtllib`, in order.
    pub fn material_libraries(&self) -> &[String] {
        &self.material_libraries
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Finalizes geometries, resolves textures and builds the mesh.
    pub fn finish(self, textures: &TextureMap) -> Mesh {
        let ObjParser {
            accumulator,
            geometries,
            stats,
            ..
        } = self;
        let mut materials = accumulator.materials;
        materials.resolve_textures(textures);

        let geometries: Vec<Geometry> = geometries
            .into_iter()
            .filter_map(|g| g.finalize(&materials))
            .collect();

        info!(
            "Parsed {} lines: {} faces -> {} triangles in {} geometries, {} materials ({} lines skipped)",
            stats.lines,
            stats.faces,
            stats.triangles,
            geometries.len(),
            materials.len(),
            stats.skipped
        );
        Mesh::new(geometries, materials)
    }

    fn skip(&mut self, line: &Line<'_>, reason: &str) {
        self.stats.skipped += 1;
        debug!("Skipping '{} {}': {}", line.keyword, line.rest, reason);
    }

    /// Index of the geometry faces go to, creating it on first use.
    fn current_geometry(&mut self) -> usize {
        match self.current {
            Some(index) => index,
            None => {
                self.geometries.push(GeometryBuilder {
                    object: self.object_name.clone(),
                    material: self.material_name.clone(),
                    ..GeometryBuilder::default()
                });
                let index = self.geometries.len() - 1;
                self.current = Some(index);
                index
            }
        }
    }

    /// Makes the next face start a new geometry. A current geometry without
    /// any positions is renamed and kept instead.
    fn break_geometry(&mut self) {
        let Some(index) = self.current else {
            return;
        };
        let geometry = &mut self.geometries[index];
        if geometry.positions.is_empty() {
            geometry.object = self.object_name.clone();
            geometry.material = self.material_name.clone();
        } else {
            self.current = None;
        }
    }

    fn resolve_corner(&self, token: &str) -> Option<FaceVertex> {
        let pools = &self.accumulator.pools;
        let mut parts = token.split('/');

        let position = parts
            .next()
            .and_then(|p| p.parse::<i64>().ok())
            .and_then(|i| resolve_index(i, pools.positions.len()))?;

        let mut optional = |len: usize| {
            parts
                .next()
                .filter(|p| !p.is_empty())
                .and_then(|p| p.parse::<i64>().ok())
                .and_then(|i| resolve_index(i, len))
        };
        let texcoord = optional(pools.texcoords.len());
        let normal = optional(pools.normals.len());

        Some(FaceVertex {
            position,
            texcoord,
            normal,
        })
    }

    /// Applies `edit` to the material opened by the last `newmtl`.
    fn edit_material(&mut self, line: &Line<'_>, edit: impl FnOnce(&mut Material)) {
        let target = self
            .editing_material
            .as_deref()
            .and_then(|name| self.accumulator.materials.get_mut(name));
        match target {
            Some(material) => edit(material),
            None => self.skip(line, "no material is being defined"),
        }
    }
}

fn vector3(values: &[f32]) -> Vector3<f32> {
    let at = |i: usize| values.get(i).copied().unwrap_or(0.0);
    Vector3::new(at(0), at(1), at(2))
}

fn handle_vertex(parser: &mut ObjParser, line: &Line<'_>) {
    let Some(values) = parse_floats(&line.args) else {
        return parser.skip(line, "non-numeric vertex");
    };
    if values.is_empty() {
        return parser.skip(line, "empty vertex");
    }

    let pools = &mut parser.accumulator.pools;
    pools.positions.push(vector3(&values));
    // Anything past xyz is a color; missing channels read as 0.
    if values.len() > 3 {
        pools.colors.push(vector3(&values[3..]));
    }
}

fn handle_normal(parser: &mut ObjParser, line: &Line<'_>) {
    match parse_floats(&line.args) {
        Some(values) if !values.is_empty() => parser.accumulator.pools.normals.push(vector3(&values)),
        _ => parser.skip(line, "malformed normal"),
    }
}

fn handle_texcoord(parser: &mut ObjParser, line: &Line<'_>) {
    match parse_floats(&line.args) {
        Some(values) if values.len() == 2 => parser
            .accumulator
            .pools
            .texcoords
            .push(Vector2::new(values[0], values[1])),
        _ => parser.skip(line, "texture coordinates need exactly 2 components"),
    }
}

fn handle_face(parser: &mut ObjParser, line: &Line<'_>) {
    let corners: Vec<FaceVertex> = line
        .args
        .iter()
        .filter_map(|token| {
            let corner = parser.resolve_corner(token);
            if corner.is_none() {
                debug!("Dropping unresolvable face vertex '{}'", token);
            }
            corner
        })
        .collect();

    parser.stats.faces += 1;
    let index = parser.current_geometry();
    let pools = &parser.accumulator.pools;
    let geometry = &mut parser.geometries[index];

    // Fan from the first corner; fewer than 3 corners emit nothing.
    let mut triangles = 0;
    for k in 1..corners.len().saturating_sub(1) {
        for corner in [&corners[0], &corners[k], &corners[k + 1]] {
            geometry.push_vertex(pools, corner);
        }
        triangles += 1;
    }
    parser.stats.triangles += triangles;
}

fn handle_object(parser: &mut ObjParser, line: &Line<'_>) {
    parser.object_name = line.rest.to_string();
    parser.break_geometry();
}

fn handle_use_material(parser: &mut ObjParser, line: &Line<'_>) {
    parser.material_name = line.rest.to_string();
    parser.break_geometry();
}

fn handle_material_library(parser: &mut ObjParser, line: &Line<'_>) {
    parser.material_libraries.push(line.rest.to_string());
    parser.break_geometry();
}

fn handle_new_material(parser: &mut ObjParser, line: &Line<'_>) {
    if line.rest.is_empty() {
        return parser.skip(line, "material needs a name");
    }
    parser.accumulator.materials.create(line.rest);
    parser.editing_material = Some(line.rest.to_string());
}

fn scalar(parser: &mut ObjParser, line: &Line<'_>) -> Option<f32> {
    let value = line.args.first().and_then(|a| a.parse::<f32>().ok());
    if value.is_none() {
        parser.skip(line, "expected a number");
    }
    value
}

/// `K* r g b`; a single value is read as grey.
fn color(parser: &mut ObjParser, line: &Line<'_>) -> Option<Vector3<f32>> {
    match parse_floats(&line.args).as_deref() {
        Some([v]) => Some(Vector3::new(*v, *v, *v)),
        Some([r, g, b, ..]) => Some(Vector3::new(*r, *g, *b)),
        _ => {
            parser.skip(line, "expected a color");
            None
        }
    }
}

fn map_file(parser: &mut ObjParser, line: &Line<'_>) -> Option<TextureSlot> {
    // Options such as `-bm 1.0` come first; the file name is last.
    let file = line.args.last().map(|f| TextureSlot::File(f.to_string()));
    if file.is_none() {
        parser.skip(line, "texture map needs a file name");
    }
    file
}

fn handle_shininess(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(v) = scalar(parser, line) {
        parser.edit_material(line, |m| m.shininess = v);
    }
}

fn handle_optical_density(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(v) = scalar(parser, line) {
        parser.edit_material(line, |m| m.optical_density = v);
    }
}

fn handle_dissolve(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(v) = scalar(parser, line) {
        parser.edit_material(line, |m| m.opacity = v);
    }
}

fn handle_transparency(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(v) = scalar(parser, line) {
        parser.edit_material(line, |m| m.opacity = 1.0 - v);
    }
}

fn handle_illumination(parser: &mut ObjParser, line: &Line<'_>) {
    match line.args.first().and_then(|a| a.parse::<u32>().ok()) {
        Some(v) => parser.edit_material(line, |m| m.illumination = v),
        None => parser.skip(line, "expected an illumination model"),
    }
}

fn handle_ambient(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(c) = color(parser, line) {
        parser.edit_material(line, |m| m.ambient = c);
    }
}

fn handle_diffuse(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(c) = color(parser, line) {
        parser.edit_material(line, |m| m.diffuse = c);
    }
}

fn handle_specular(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(c) = color(parser, line) {
        parser.edit_material(line, |m| m.specular = c);
    }
}

fn handle_emissive(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(c) = color(parser, line) {
        parser.edit_material(line, |m| m.emissive = c);
    }
}

fn handle_diffuse_map(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(slot) = map_file(parser, line) {
        parser.edit_material(line, |m| m.diffuse_map = slot);
    }
}

fn handle_specular_map(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(slot) = map_file(parser, line) {
        parser.edit_material(line, |m| m.specular_map = slot);
    }
}

fn handle_normal_map(parser: &mut ObjParser, line: &Line<'_>) {
    if let Some(slot) = map_file(parser, line) {
        parser.edit_material(line, |m| m.normal_map = slot);
    }
}
