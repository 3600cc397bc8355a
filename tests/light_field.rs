use futures::executor::block_on;
use lightfield_viewer::core::color::{Rgba, SELECTION_HIGHLIGHT};
use lightfield_viewer::core::error::ViewerError;
use lightfield_viewer::core::math::transform::project_to_screen;
use lightfield_viewer::pipeline::capture::export_light_field;
use lightfield_viewer::pipeline::pick_buffer::PickBuffer;
use lightfield_viewer::pipeline::preview::PreviewSettings;
use lightfield_viewer::scene::camera::{Camera, Projection};
use lightfield_viewer::scene::light::Light;
use lightfield_viewer::scene::light_field::{CameraGrid, GridIndex};
use lightfield_viewer::scene::material::MaterialTable;
use lightfield_viewer::scene::mesh::{Geometry, Mesh};
use lightfield_viewer::scene::transform::Transformable;
use nalgebra::Point3;
use std::collections::HashSet;

fn grid(cols: usize, rows: usize) -> CameraGrid {
    let mut grid = CameraGrid::new(Point3::new(-0.5, 0.5, 2.0), 0.5, 0.5);
    grid.set_projection(Projection {
        fov_y_rad: 50f32.to_radians(),
        aspect_ratio: 1.0,
        near: 0.1,
        far: 50.0,
    });
    grid.init_cameras(cols, rows);
    grid
}

#[test]
fn selection_survives_resize_when_in_range() {
    let mut grid = grid(2, 2);
    assert_eq!(grid.selected_camera_index(), Some(GridIndex::ORIGIN));

    grid.set_selected_camera(1, 1).unwrap();
    assert_eq!(grid.init_cameras(2, 3), Some(GridIndex::new(1, 1)));

    grid.set_selected_camera(2, 1).unwrap();
    assert_eq!(grid.init_cameras(2, 2), Some(GridIndex::ORIGIN));
    assert_eq!(grid.iter().filter(|v| v.camera.is_selected()).count(), 1);
}

#[test]
fn colors_are_unique_and_never_the_highlight() {
    let grid = grid(16, 16);
    let colors: Vec<Rgba> = grid
        .iter()
        .filter(|v| !v.camera.is_selected())
        .map(|v| v.camera.color())
        .collect();
    let unique: HashSet<Rgba> = colors.iter().copied().collect();
    assert_eq!(unique.len(), colors.len());
    assert!(!unique.contains(&SELECTION_HIGHLIGHT));
    assert_eq!(grid.selected_camera().unwrap().color(), SELECTION_HIGHLIGHT);
}

#[test]
fn out_of_range_selection_is_a_typed_error() {
    let mut grid = grid(2, 2);
    let err = grid.set_selected_camera(5, 0).unwrap_err();
    assert!(matches!(err, ViewerError::CameraIndex { row: 5, col: 0, rows: 2, cols: 2 }));
    assert_eq!(grid.selected_camera_index(), Some(GridIndex::ORIGIN));
}

#[test]
fn view_projection_before_perspective_fails() {
    let camera = Camera::looking_at(Point3::new(0.0, 0.0, 3.0), Point3::origin());
    assert!(matches!(camera.view_projection_matrix(), Err(ViewerError::InvalidState(_))));
    let world = camera.world_matrix();
    assert!(matches!(
        camera.world_view_projection_matrix(&world),
        Err(ViewerError::InvalidState(_))
    ));
}

#[test]
fn pick_then_select_round_trip() {
    let mut grid = grid(3, 2);
    let mut main = Camera::looking_at(Point3::new(0.0, 0.0, 5.0), Point3::origin());
    main.set_perspective(45f32.to_radians(), 1.0, 0.1, 100.0);
    let vp = main.view_projection_matrix().unwrap();

    let mut buffer = PickBuffer::new(256, 256, 6.0);
    assert_eq!(buffer.render(&grid, &vp), 6);

    let target = grid.camera(1, 2).unwrap().position();
    let (screen, _) = project_to_screen(&vp, &target, 256, 256).unwrap();
    let index = buffer.pick(&grid, screen.x as usize, screen.y as usize).unwrap();
    assert_eq!(index, GridIndex::new(1, 2));

    grid.set_selected_camera(index.row, index.col).unwrap();
    buffer.render(&grid, &vp);
    assert_eq!(
        buffer.pick(&grid, screen.x as usize, screen.y as usize),
        Some(GridIndex::new(1, 2))
    );
}

#[test]
fn async_iteration_visits_row_major_one_at_a_time() {
    let grid = grid(3, 2);
    let mut order = Vec::new();
    let visited = block_on(grid.iterate_cameras_async(|visit| {
        order.push((visit.row, visit.col, visit.ordinal));
        async { Ok::<(), ViewerError>(()) }
    }))
    .unwrap();
    assert_eq!(visited, 6);
    assert_eq!(
        order,
        [(0, 0, 0), (0, 1, 1), (0, 2, 2), (1, 0, 3), (1, 1, 4), (1, 2, 5)]
    );
}

#[test]
fn export_writes_every_view() {
    let geometry = Geometry {
        material: "default".into(),
        positions: vec![-1.0, -1.0, 0.0, 1.0, -1.0, 0.0, 0.0, 1.0, 0.0],
        tangents: vec![1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0],
        ..Geometry::default()
    };
    let mesh = Mesh::new(vec![geometry], MaterialTable::default());
    let settings = PreviewSettings {
        width: 24,
        height: 24,
        ..PreviewSettings::default()
    };
    let dir = std::env::temp_dir().join(format!("lfv-it-export-{}", std::process::id()));

    let written = block_on(export_light_field(&grid(2, 2), &mesh, &Light::default(), &settings, &dir)).unwrap();
    assert_eq!(written.len(), 4);
    assert_eq!(written[3], dir.join("cam_1_1.png"));
    for path in &written {
        let img = image::open(path).unwrap();
        assert_eq!((img.width(), img.height()), (24, 24));
    }
    std::fs::remove_dir_all(&dir).ok();
}
