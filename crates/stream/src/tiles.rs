use sidescroll_common::{SectionGrid, SectionIndex, TileLayer, TilePlacement};
use sidescroll_level::LevelDescription;
use std::collections::BTreeMap;
use std::ops::Range;
use std::sync::Arc;

/// Destination for decoded tiles. Engine backends implement this over their
/// tilemap; [`TileMap`] is the headless implementation.
pub trait TileSurface {
    fn put_tile(&mut self, layer: TileLayer, x: i32, y: i32, tile_id: u32, collidable: bool);

    /// Remove the tile at a cell. Returns whether a tile was present.
    fn clear_tile(&mut self, layer: TileLayer, x: i32, y: i32) -> bool;
}

/// A placed tile as stored by [`TileMap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileCell {
    pub tile_id: u32,
    pub collidable: bool,
}

/// In-memory tile surface keyed by layer and world tile coordinate.
#[derive(Debug, Clone, Default)]
pub struct TileMap {
    cells: BTreeMap<(TileLayer, i32, i32), TileCell>,
}

impl TileMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, layer: TileLayer, x: i32, y: i32) -> Option<TileCell> {
        self.cells.get(&(layer, x, y)).copied()
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn layer_len(&self, layer: TileLayer) -> usize {
        self.cells.keys().filter(|(l, _, _)| *l == layer).count()
    }

    /// Number of tiles in columns `[first_x, last_x]` on any layer.
    pub fn count_in_columns(&self, first_x: i32, last_x: i32) -> usize {
        self.cells
            .keys()
            .filter(|(_, x, _)| (first_x..=last_x).contains(x))
            .count()
    }

    /// Every tile in key order, as placements.
    pub fn placements(&self) -> impl Iterator<Item = TilePlacement> + '_ {
        self.cells.iter().map(|(&(layer, tile_x, tile_y), cell)| TilePlacement {
            tile_x,
            tile_y,
            tile_id: cell.tile_id,
            layer,
            solid: cell.collidable,
        })
    }
}

impl TileSurface for TileMap {
    fn put_tile(&mut self, layer: TileLayer, x: i32, y: i32, tile_id: u32, collidable: bool) {
        self.cells.insert((layer, x, y), TileCell { tile_id, collidable });
    }

    fn clear_tile(&mut self, layer: TileLayer, x: i32, y: i32) -> bool {
        self.cells.remove(&(layer, x, y)).is_some()
    }
}

/// Decodes sub-level tile data for one section and writes it to a surface.
///
/// The loader keeps no residency state; the streaming controller decides
/// which sections to load and unload.
#[derive(Debug, Clone)]
pub struct TileLoader {
    level: Arc<LevelDescription>,
    grid: SectionGrid,
    tile_size: f32,
}

impl TileLoader {
    pub fn new(level: Arc<LevelDescription>, grid: SectionGrid) -> Self {
        let tile_size = level.grid_size() as f32;
        Self {
            level,
            grid,
            tile_size,
        }
    }

    pub fn tile_size(&self) -> f32 {
        self.tile_size
    }

    /// World tile column containing world x.
    pub fn column_of(&self, world_x: f32) -> i32 {
        (world_x / self.tile_size).floor() as i32
    }

    /// World tile columns owned by the section, inclusive: those whose left
    /// edge lies in the section range. Every column belongs to one section.
    pub fn column_span(&self, section: SectionIndex) -> (i32, i32) {
        let range = self.grid.world_range(section);
        let first = (range.start / self.tile_size).ceil() as i32;
        let last = (range.end / self.tile_size).ceil() as i32 - 1;
        (first, last)
    }

    /// World tile rows covered by the level, top to bottom. Rows above the
    /// world origin are negative.
    pub fn row_span(&self) -> Range<i32> {
        let extent = self.level.vertical_extent();
        let top = (extent.start / self.tile_size).floor() as i32;
        let bottom = (extent.end / self.tile_size).ceil() as i32;
        top..bottom
    }

    /// Decode the tiles of `section` without touching any surface. A tile is
    /// placed by the section owning its column, so unloading any other
    /// section never clears it.
    pub fn placements_for_section(&self, section: SectionIndex) -> Vec<TilePlacement> {
        let (first, last) = self.column_span(section);
        let owned = first..=last;
        let start_x = first as f32 * self.tile_size;
        let end_x = (last + 1) as f32 * self.tile_size;
        let mut placements = Vec::new();

        for (index, origin_x, sub_level) in self.level.overlapping(start_x, end_x) {
            let Some(layer) = sub_level.solid_layer() else {
                tracing::warn!(section, sub_level = index, "sub-level has no solid layer");
                continue;
            };
            let cell_size = layer.grid_size as f32;
            let top = sub_level.world_y as f32;

            for cx in 0..layer.c_wid {
                let tile_x = self.column_of(origin_x + cx as f32 * cell_size);
                if !owned.contains(&tile_x) {
                    continue;
                }
                for cy in 0..layer.c_hei {
                    let value = layer.cell(cx, cy);
                    if value <= 0 {
                        continue;
                    }
                    placements.push(TilePlacement {
                        tile_x,
                        tile_y: ((top + cy as f32 * cell_size) / self.tile_size).floor() as i32,
                        tile_id: (value - 1) as u32,
                        layer: TileLayer::Ground,
                        solid: true,
                    });
                }
            }

            for tile in &layer.auto_layer_tiles {
                let tile_x = self.column_of(origin_x + tile.px[0] as f32);
                if !owned.contains(&tile_x) {
                    continue;
                }
                placements.push(TilePlacement {
                    tile_x,
                    tile_y: ((top + tile.px[1] as f32) / self.tile_size).floor() as i32,
                    tile_id: tile.t,
                    layer: TileLayer::Platform,
                    solid: true,
                });
            }
        }

        placements
    }

    /// Write the tiles of `section` to `surface`. Returns the number placed.
    pub fn load_section(&self, section: SectionIndex, surface: &mut dyn TileSurface) -> usize {
        let placements = self.placements_for_section(section);
        for p in &placements {
            surface.put_tile(p.layer, p.tile_x, p.tile_y, p.tile_id, p.solid);
        }
        tracing::debug!(section, tiles = placements.len(), "section tiles loaded");
        placements.len()
    }

    /// Clear every cell of the section's columns on both layers across the
    /// full world height. Returns the number of tiles removed.
    pub fn unload_section(&self, section: SectionIndex, surface: &mut dyn TileSurface) -> usize {
        let (first, last) = self.column_span(section);
        let rows = self.row_span();
        let mut cleared = 0;
        for layer in TileLayer::ALL {
            for x in first..=last {
                for y in rows.clone() {
                    if surface.clear_tile(layer, x, y) {
                        cleared += 1;
                    }
                }
            }
        }
        tracing::debug!(section, tiles = cleared, "section tiles unloaded");
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sidescroll_level::{AutoTile, LayerInstance, SubLevel};

    /// A 2048x64 sub-level: one solid row at the bottom, tile ids cycling 1..=3.
    fn sub_level(name: &str) -> SubLevel {
        let c_wid = 64;
        let mut csv = vec![0; c_wid * 2];
        for x in 0..c_wid {
            csv[c_wid + x] = (x % 3) as i32 + 1;
        }
        SubLevel::new(name, 2048, 64).with_layer(LayerInstance::int_grid("Solid", c_wid, 2, 32, csv))
    }

    fn loader(levels: Vec<SubLevel>) -> TileLoader {
        let level = Arc::new(LevelDescription::from_sub_levels(levels).unwrap());
        let grid = SectionGrid::for_world(level.world_width(), 640.0);
        TileLoader::new(level, grid)
    }

    #[test]
    fn int_grid_values_are_one_based() {
        let loader = loader(vec![sub_level("L0")]);
        let placements = loader.placements_for_section(0);
        assert_eq!(placements.len(), 20);
        let first = placements[0];
        assert_eq!((first.tile_x, first.tile_y), (0, 1));
        assert_eq!(first.tile_id, 0);
        assert_eq!(first.layer, TileLayer::Ground);
        assert!(placements.iter().all(|p| p.solid));
        assert_eq!(placements[2].tile_id, 2);
    }

    #[test]
    fn straddling_section_reads_both_sub_levels() {
        let loader = loader(vec![sub_level("L0"), sub_level("L1")]);
        // Section 3 covers [1920, 2560): 4 columns from L0, 16 from L1.
        let placements = loader.placements_for_section(3);
        assert_eq!(placements.len(), 20);
        let xs: Vec<i32> = placements.iter().map(|p| p.tile_x).collect();
        assert_eq!(xs.first(), Some(&60));
        assert_eq!(xs.last(), Some(&79));
        assert!(xs.contains(&63) && xs.contains(&64));
    }

    #[test]
    fn auto_tiles_go_to_platform_layer() {
        let level = SubLevel::new("L0", 2048, 64).with_layer(
            LayerInstance::int_grid("Solid", 64, 2, 32, vec![0; 128])
                .with_auto_tiles(vec![AutoTile { px: [96, 32], t: 7 }, AutoTile { px: [700, 0], t: 8 }]),
        );
        let loader = loader(vec![level]);
        let placements = loader.placements_for_section(0);
        assert_eq!(placements.len(), 1);
        assert_eq!(placements[0].layer, TileLayer::Platform);
        assert_eq!((placements[0].tile_x, placements[0].tile_y, placements[0].tile_id), (3, 1, 7));
    }

    #[test]
    fn missing_solid_layer_yields_no_tiles() {
        let loader = loader(vec![SubLevel::new("Empty", 2048, 64)]);
        assert!(loader.placements_for_section(0).is_empty());
    }

    #[test]
    fn unload_then_reload_round_trips() {
        let loader = loader(vec![sub_level("L0"), sub_level("L1")]);
        let mut surface = TileMap::new();
        loader.load_section(2, &mut surface);
        loader.load_section(3, &mut surface);
        let before: Vec<TilePlacement> = surface.placements().collect();

        let cleared = loader.unload_section(3, &mut surface);
        assert_eq!(cleared, 20);
        let (first, last) = loader.column_span(3);
        assert_eq!(surface.count_in_columns(first, last), 0);
        assert_eq!(surface.len(), 20);

        loader.load_section(3, &mut surface);
        let after: Vec<TilePlacement> = surface.placements().collect();
        assert_eq!(before, after);
    }

    #[test]
    fn unload_clears_foreign_tiles_in_section_columns() {
        let loader = loader(vec![sub_level("L0")]);
        let mut surface = TileMap::new();
        surface.put_tile(TileLayer::Platform, 5, 0, 99, false);
        surface.put_tile(TileLayer::Platform, 20, 0, 99, false);
        assert_eq!(loader.unload_section(0, &mut surface), 1);
        assert!(surface.get(TileLayer::Platform, 20, 0).is_some());
    }

    #[test]
    fn unload_clears_rows_above_world_origin() {
        let mut raised = SubLevel::new("Raised", 640, 64)
            .with_layer(LayerInstance::int_grid("Solid", 20, 2, 32, vec![1; 40]));
        raised.world_y = -64;
        let loader = loader(vec![raised]);
        assert_eq!(loader.row_span(), -2..0);

        let mut surface = TileMap::new();
        assert_eq!(loader.load_section(0, &mut surface), 40);
        assert!(surface.get(TileLayer::Ground, 0, -2).is_some());
        assert_eq!(loader.unload_section(0, &mut surface), 40);
        assert!(surface.is_empty());
    }

    #[test]
    fn unaligned_sections_own_disjoint_columns() {
        let tiles = |x: i64| AutoTile { px: [x, 0], t: 1 };
        let level = Arc::new(
            LevelDescription::from_sub_levels(vec![SubLevel::new("L0", 2048, 64).with_layer(
                LayerInstance::int_grid("Solid", 64, 2, 32, vec![1; 128])
                    .with_auto_tiles(vec![tiles(645), tiles(1290), tiles(1312)]),
            )])
            .unwrap(),
        );
        let grid = SectionGrid::for_world(level.world_width(), 650.0);
        let loader = TileLoader::new(level, grid);

        let mut surface = TileMap::new();
        let mut placed = 0;
        for section in 0..=grid.max_section() {
            let placements = loader.placements_for_section(section);
            let (first, last) = loader.column_span(section);
            assert!(placements.iter().all(|p| (first..=last).contains(&p.tile_x)));
            placed += loader.load_section(section, &mut surface);
        }
        assert_eq!(placed, 128 + 3);
        assert_eq!(surface.len(), 128 + 3);

        // The auto tile at x = 645 lies in column 20, owned by section 0.
        let before = loader.placements_for_section(0).len();
        assert_eq!(loader.unload_section(1, &mut surface), loader.placements_for_section(1).len());
        assert_eq!(loader.unload_section(0, &mut surface), before);
        assert!(surface.get(TileLayer::Platform, 20, 0).is_none());
    }
}
