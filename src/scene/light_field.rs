//! The light-field camera grid.
//!
//! A regular rows x columns array of cameras laid out in a plane, each with a
//! unique pick color so a single pixel read from an offscreen buffer
//! identifies the camera that was clicked. At most one camera is selected; the
//! selected camera is drawn in a reserved highlight color instead of its own.

use crate::core::color::{PICK_COLOR_CAPACITY, Rgba, SELECTION_HIGHLIGHT, pick_color, pick_ordinal};
use crate::core::error::{ViewerError, ViewerResult};
use crate::scene::camera::{Camera, Orientation, Projection};
use crate::scene::transform::{Transform, Transformable};
use futures::{Stream, StreamExt};
use log::{debug, warn};
use nalgebra::Point3;
use std::future::Future;

/// Hard upper bound for rows and for columns.
pub const MAX_GRID_DIMENSION: usize = 16;

const _: () = assert!(MAX_GRID_DIMENSION * MAX_GRID_DIMENSION <= PICK_COLOR_CAPACITY);

/// A `(row, column)` position in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GridIndex {
    pub row: usize,
    pub col: usize,
}

impl GridIndex {
    pub const ORIGIN: GridIndex = GridIndex { row: 0, col: 0 };

    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

/// A camera in the grid: a plain [`Camera`] plus its pick color and
/// selection flag.
#[derive(Debug, Clone)]
pub struct GridCamera {
    pub camera: Camera,
    index: GridIndex,
    ordinal: usize,
    color: Rgba,
    selected: bool,
}

impl GridCamera {
    pub fn index(&self) -> GridIndex {
        self.index
    }

    /// Position in row-major order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Color this camera is currently drawn with in the pick buffer.
    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn is_selected(&self) -> bool {
        self.selected
    }
}

impl Transformable for GridCamera {
    fn transform(&self) -> &Transform {
        &self.camera.transform
    }

    fn transform_mut(&mut self) -> &mut Transform {
        &mut self.camera.transform
    }
}

/// One step of a row-major traversal.
#[derive(Debug, Clone, Copy)]
pub struct GridVisit<'a> {
    pub camera: &'a GridCamera,
    pub row: usize,
    pub col: usize,
    pub ordinal: usize,
}

#[derive(Debug, Clone)]
pub struct CameraGrid {
    anchor: Point3<f32>,
    horizontal_spacing: f32,
    vertical_spacing: f32,
    max_dimension: usize,
    orientation: Orientation,
    projection: Option<Projection>,
    rows: usize,
    cols: usize,
    cameras: Vec<Vec<GridCamera>>,
}

impl CameraGrid {
    /// An empty grid. Call [`CameraGrid::init_cameras`] to populate it.
    pub fn new(anchor: Point3<f32>, horizontal_spacing: f32, vertical_spacing: f32) -> Self {
        Self {
            anchor,
            horizontal_spacing,
            vertical_spacing,
            max_dimension: MAX_GRID_DIMENSION,
            orientation: Orientation::default(),
            projection: None,
            rows: 0,
            cols: 0,
            cameras: Vec::new(),
        }
    }

    /// Lowers the row/column bound below [`MAX_GRID_DIMENSION`].
    pub fn with_max_dimension(mut self, max_dimension: usize) -> Self {
        self.max_dimension = max_dimension.clamp(1, MAX_GRID_DIMENSION);
        self
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn len(&self) -> usize {
        self.rows * self.cols
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn anchor(&self) -> Point3<f32> {
        self.anchor
    }

    pub fn spacing(&self) -> (f32, f32) {
        (self.horizontal_spacing, self.vertical_spacing)
    }

    pub fn max_dimension(&self) -> usize {
        self.max_dimension
    }

    /// Discards all cameras and rebuilds a `cols` x `rows` grid.
    ///
    /// Positions walk row-major from the anchor: x grows by the horizontal
    /// spacing per column, y drops by the vertical spacing per row. The
    /// previous selection is kept when it still fits, otherwise `(0, 0)` is
    /// selected. Returns the selection after the rebuild.
    pub fn init_cameras(&mut self, cols: usize, rows: usize) -> Option<GridIndex> {
        let previous = self.selected_camera_index().unwrap_or(GridIndex::ORIGIN);

        let cols = self.clamp_dimension("columns", cols);
        let rows = self.clamp_dimension("rows", rows);
        self.rows = rows;
        self.cols = cols;

        let cameras: Vec<Vec<GridCamera>> = (0..rows)
            .map(|row| {
                (0..cols)
                    .map(|col| self.create_camera(GridIndex::new(row, col)))
                    .collect()
            })
            .collect();
        self.cameras = cameras;
        debug!("Rebuilt camera grid: {} rows x {} columns", rows, cols);

        if let Err(e) = self.set_selected_camera(previous.row, previous.col) {
            warn!("{}; selecting (0, 0) instead", e);
            if let Err(e) = self.set_selected_camera(0, 0) {
                debug!("Grid has no cameras to select: {}", e);
            }
        }
        self.selected_camera_index()
    }

    /// Changes the spacing and rebuilds the grid.
    pub fn set_spacing(&mut self, horizontal: f32, vertical: f32) -> Option<GridIndex> {
        self.horizontal_spacing = horizontal;
        self.vertical_spacing = vertical;
        self.init_cameras(self.cols, self.rows)
    }

    /// Moves the anchor and rebuilds the grid.
    pub fn set_anchor(&mut self, anchor: Point3<f32>) -> Option<GridIndex> {
        self.anchor = anchor;
        self.init_cameras(self.cols, self.rows)
    }

    /// Points every camera the same way. Does not rebuild.
    pub fn set_orientation(&mut self, orientation: Orientation) {
        self.orientation = orientation;
        for camera in self.cameras.iter_mut().flatten() {
            camera.camera.orientation = orientation;
        }
    }

    /// Gives every camera the same projection. Does not rebuild.
    pub fn set_projection(&mut self, projection: Projection) {
        self.projection = Some(projection);
        for camera in self.cameras.iter_mut().flatten() {
            camera.camera.set_projection(projection);
        }
    }

    pub fn camera(&self, row: usize, col: usize) -> Option<&GridCamera> {
        self.cameras.get(row).and_then(|r| r.get(col))
    }

    pub fn camera_mut(&mut self, row: usize, col: usize) -> Option<&mut GridCamera> {
        self.cameras.get_mut(row).and_then(|r| r.get_mut(col))
    }

    /// Selects the camera at `(row, col)` and repaints every camera's color.
    ///
    /// Fails with [`ViewerError::CameraIndex`] when the index is out of bounds;
    /// the previous selection is left untouched in that case.
    pub fn set_selected_camera(&mut self, row: usize, col: usize) -> ViewerResult<()> {
        if row >= self.rows || col >= self.cols {
            return Err(ViewerError::CameraIndex {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            });
        }

        let target = GridIndex::new(row, col);
        for camera in self.cameras.iter_mut().flatten() {
            camera.selected = camera.index == target;
            camera.color = if camera.selected {
                SELECTION_HIGHLIGHT
            } else {
                pick_color(camera.ordinal)
            };
        }
        Ok(())
    }

    pub fn selected_camera(&self) -> Option<&GridCamera> {
        self.cameras.iter().flatten().find(|c| c.selected)
    }

    pub fn selected_camera_index(&self) -> Option<GridIndex> {
        self.selected_camera().map(GridCamera::index)
    }

    /// Row-major traversal.
    pub fn iter(&self) -> impl Iterator<Item = GridVisit<'_>> {
        self.cameras.iter().enumerate().flat_map(|(row, cameras)| {
            cameras.iter().enumerate().map(move |(col, camera)| GridVisit {
                camera,
                row,
                col,
                ordinal: camera.ordinal,
            })
        })
    }

    /// Calls `visit(camera, row, col, ordinal)` for every camera, row-major.
    pub fn iterate_cameras<F>(&self, mut visit: F)
    where
        F: FnMut(&GridCamera, usize, usize, usize),
    {
        for v in self.iter() {
            visit(v.camera, v.row, v.col, v.ordinal);
        }
    }

    /// The row-major traversal as a stream.
    pub fn stream(&self) -> impl Stream<Item = GridVisit<'_>> {
        futures::stream::iter(self.iter())
    }

    /// Awaits `visit` for each camera in row-major order, one at a time.
    ///
    /// A visit is not started before the previous one has completed, so each
    /// camera's capture can finish before the next begins. Stops at the first
    /// error; otherwise returns the number of cameras visited.
    pub async fn iterate_cameras_async<'a, F, Fut, E>(&'a self, mut visit: F) -> Result<usize, E>
    where
        F: FnMut(GridVisit<'a>) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let mut visited = 0;
        let mut stream = std::pin::pin!(self.stream());
        while let Some(step) = stream.next().await {
            visit(step).await?;
            visited += 1;
        }
        Ok(visited)
    }

    /// Identifies the camera drawn with `color`, as read back from a pick buffer.
    pub fn camera_by_color(&self, color: Rgba) -> Option<GridIndex> {
        if color == SELECTION_HIGHLIGHT {
            return self.selected_camera_index();
        }
        let ordinal = pick_ordinal(color)?;
        if self.cols == 0 || ordinal >= self.len() {
            return None;
        }
        Some(GridIndex::new(ordinal / self.cols, ordinal % self.cols))
    }

    fn clamp_dimension(&self, what: &str, requested: usize) -> usize {
        if requested > self.max_dimension {
            warn!(
                "Requested {} grid {} exceeds the maximum of {}; clamping",
                requested, what, self.max_dimension
            );
            self.max_dimension
        } else {
            requested
        }
    }

    fn create_camera(&self, index: GridIndex) -> GridCamera {
        let position = Point3::new(
            self.anchor.x + index.col as f32 * self.horizontal_spacing,
            self.anchor.y - index.row as f32 * self.vertical_spacing,
            self.anchor.z,
        );
        let mut camera = Camera::new(position, self.orientation);
        if let Some(projection) = self.projection {
            camera.set_projection(projection);
        }
        let ordinal = index.row * self.cols + index.col;
        GridCamera {
            camera,
            index,
            ordinal,
            color: pick_color(ordinal),
            selected: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::executor::block_on;
    use std::collections::HashSet;

    fn grid(cols: usize, rows: usize) -> CameraGrid {
        let mut grid = CameraGrid::new(Point3::new(-1.0, 1.0, 4.0), 0.5, 0.25);
        grid.init_cameras(cols, rows);
        grid
    }

    fn selected_count(grid: &CameraGrid) -> usize {
        grid.iter().filter(|v| v.camera.is_selected()).count()
    }

    #[test]
    fn test_empty_grid_has_no_selection() {
        let grid = CameraGrid::new(Point3::origin(), 1.0, 1.0);
        assert!(grid.is_empty());
        assert!(grid.selected_camera().is_none());
    }

    #[test]
    fn test_positions_walk_from_anchor() {
        let grid = grid(3, 2);
        let p = grid.camera(1, 2).unwrap().position();
        assert_eq!(p, Point3::new(-1.0 + 2.0 * 0.5, 1.0 - 0.25, 4.0));
        assert_eq!(grid.camera(0, 0).unwrap().position(), Point3::new(-1.0, 1.0, 4.0));
    }

    #[test]
    fn test_first_init_selects_origin() {
        let grid = grid(2, 2);
        assert_eq!(grid.selected_camera_index(), Some(GridIndex::ORIGIN));
        assert_eq!(selected_count(&grid), 1);
    }

    #[test]
    fn test_out_of_range_selection_is_an_error() {
        let mut grid = grid(2, 2);
        grid.set_selected_camera(1, 1).unwrap();
        let err = grid.set_selected_camera(2, 0).unwrap_err();
        assert!(matches!(err, ViewerError::CameraIndex { row: 2, col: 0, rows: 2, cols: 2 }));
        assert_eq!(grid.selected_camera_index(), Some(GridIndex::new(1, 1)));
    }

    #[test]
    fn test_reinit_keeps_selection_in_range() {
        let mut grid = grid(2, 2);
        grid.set_selected_camera(1, 1).unwrap();
        let selected = grid.init_cameras(2, 3);
        assert_eq!(selected, Some(GridIndex::new(1, 1)));
        assert_eq!(selected_count(&grid), 1);
    }

    #[test]
    fn test_reinit_falls_back_to_origin() {
        let mut grid = grid(3, 3);
        grid.set_selected_camera(2, 2).unwrap();
        let selected = grid.init_cameras(2, 2);
        assert_eq!(selected, Some(GridIndex::ORIGIN));
        assert_eq!(selected_count(&grid), 1);
    }

    #[test]
    fn test_spacing_change_rebuilds_positions() {
        let mut grid = grid(2, 2);
        grid.set_selected_camera(0, 1).unwrap();
        grid.set_spacing(2.0, 3.0);
        assert_eq!(grid.camera(1, 1).unwrap().position(), Point3::new(1.0, -2.0, 4.0));
        assert_eq!(grid.selected_camera_index(), Some(GridIndex::new(0, 1)));
    }

    #[test]
    fn test_dimensions_are_clamped() {
        let mut grid = CameraGrid::new(Point3::origin(), 1.0, 1.0).with_max_dimension(4);
        grid.init_cameras(10, 2);
        assert_eq!((grid.rows(), grid.cols()), (2, 4));
    }

    #[test]
    fn test_colors_unique_and_distinct_from_highlight() {
        let mut grid = grid(4, 3);
        grid.set_selected_camera(1, 2).unwrap();

        let others: Vec<Rgba> = grid
            .iter()
            .filter(|v| !v.camera.is_selected())
            .map(|v| v.camera.color())
            .collect();
        let unique: HashSet<Rgba> = others.iter().copied().collect();
        assert_eq!(unique.len(), others.len());
        assert!(!unique.contains(&SELECTION_HIGHLIGHT));
        assert_eq!(grid.selected_camera().unwrap().color(), SELECTION_HIGHLIGHT);
    }

    #[test]
    fn test_color_lookup_finds_every_camera() {
        let mut grid = grid(3, 3);
        grid.set_selected_camera(2, 0).unwrap();
        for v in grid.iter() {
            assert_eq!(
                grid.camera_by_color(v.camera.color()),
                Some(GridIndex::new(v.row, v.col))
            );
        }
        assert_eq!(grid.camera_by_color(Rgba::TRANSPARENT), None);
        assert_eq!(grid.camera_by_color(pick_color(9)), None);
    }

    #[test]
    fn test_iteration_is_row_major() {
        let grid = grid(3, 2);
        let mut seen = Vec::new();
        grid.iterate_cameras(|camera, row, col, ordinal| {
            assert_eq!(camera.index(), GridIndex::new(row, col));
            seen.push((row, col, ordinal));
        });
        assert_eq!(
            seen,
            vec![(0, 0, 0), (0, 1, 1), (0, 2, 2), (1, 0, 3), (1, 1, 4), (1, 2, 5)]
        );
    }

    #[test]
    fn test_async_iteration_visits_in_order() {
        let grid = grid(2, 2);
        let mut order = Vec::new();
        let visited = block_on(grid.iterate_cameras_async(|v| {
            order.push(v.ordinal);
            async { Ok::<(), ()>(()) }
        }))
        .unwrap();
        assert_eq!(visited, 4);
        assert_eq!(order, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_async_iteration_stops_on_error() {
        let grid = grid(2, 2);
        let result = block_on(grid.iterate_cameras_async(|v| async move {
            if v.ordinal == 2 { Err(v.ordinal) } else { Ok(()) }
        }));
        assert_eq!(result, Err(2));
    }

    #[test]
    fn test_projection_reaches_rebuilt_cameras() {
        let mut grid = grid(1, 1);
        let projection = Projection {
            fov_y_rad: 0.8,
            aspect_ratio: 1.0,
            near: 0.1,
            far: 50.0,
        };
        grid.set_projection(projection);
        grid.init_cameras(2, 2);
        for v in grid.iter() {
            assert_eq!(v.camera.camera.projection(), Some(&projection));
        }
    }
}
