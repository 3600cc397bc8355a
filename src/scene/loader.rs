use crate::core::error::ViewerResult;
use crate::io::config::{CameraConfig, Config, GridConfig, LightConfig, SceneConfig};
use crate::io::obj_loader::load_obj;
use crate::scene::camera::{Camera, Orientation, Projection};
use crate::scene::context::SceneContext;
use crate::scene::light::Light;
use crate::scene::light_field::CameraGrid;
use crate::scene::mesh::Mesh;
use crate::scene::transform::Transform;
use log::{info, warn};
use nalgebra::{Point3, Vector3};

/// Builds the light described by the `[light]` section.
pub fn build_light(config: &LightConfig) -> Light {
    let color = Vector3::from(config.color);
    match config.r#type.as_str() {
        "directional" => Light::new_directional(Vector3::from(config.direction), color, config.intensity),
        "point" => Light::new_point(Point3::from(config.position), color, config.intensity),
        other => {
            warn!("Unknown light type '{}', using a point light", other);
            Light::new_point(Point3::from(config.position), color, config.intensity)
        }
    }
}

/// The main camera, with a perspective for the given aspect ratio.
pub fn build_camera(config: &CameraConfig, aspect_ratio: f32) -> Camera {
    let position = Point3::from(config.position);
    let orientation = match config.target {
        Some(target) => Orientation::Target(Point3::from(target)),
        None => Orientation::Angles {
            pitch: config.pitch.to_radians(),
            yaw: config.yaw.to_radians(),
        },
    };
    let mut camera = Camera::new(position, orientation);
    camera.set_perspective(config.fov.to_radians(), aspect_ratio, config.near, config.far);
    camera
}

/// A populated camera grid; every camera shares one projection.
pub fn build_grid(config: &GridConfig, camera: &CameraConfig, aspect_ratio: f32) -> CameraGrid {
    let mut grid = CameraGrid::new(
        Point3::from(config.anchor),
        config.horizontal_spacing,
        config.vertical_spacing,
    )
    .with_max_dimension(config.max_dimension);
    grid.set_projection(Projection {
        fov_y_rad: config.fov.to_radians(),
        aspect_ratio,
        near: camera.near,
        far: camera.far,
    });
    grid.init_cameras(config.cols, config.rows);
    grid
}

/// Loads the `[scene]` model, if one is configured, and places it.
pub fn load_scene_mesh(config: &SceneConfig) -> ViewerResult<Option<Mesh>> {
    let Some(obj) = &config.obj else {
        info!("No model configured; starting with an empty scene");
        return Ok(None);
    };
    let mut mesh = load_obj(obj, &config.mtl, config.texture_dir.as_deref())?;
    mesh.transform = scene_transform(config);
    Ok(Some(mesh))
}

pub fn scene_transform(config: &SceneConfig) -> Transform {
    Transform {
        position: Point3::from(config.position),
        rotation: Vector3::from(config.rotation),
        scale: Vector3::from(config.scale),
    }
}

/// Initializes every scene resource from the configuration.
pub fn init_scene_context(config: &Config) -> ViewerResult<SceneContext> {
    let aspect_ratio = config.export.width as f32 / config.export.height.max(1) as f32;
    let camera = build_camera(&config.camera, aspect_ratio);
    let grid = build_grid(&config.grid, &config.camera, aspect_ratio);
    info!(
        "Camera grid: {} x {} at {:?}",
        grid.rows(),
        grid.cols(),
        grid.anchor()
    );

    Ok(SceneContext {
        camera,
        light: build_light(&config.light),
        ambient: Vector3::from(config.light.ambient),
        mesh: load_scene_mesh(&config.scene)?,
        grid,
    })
}
