//! Dense tile grid with occupancy and smoke layers.

use terror_site_core::{OccupancyView, SmokeView, TerrainView, Tile, TilePos, UnitId};

/// Terrain, occupancy and smoke stored row-major at `y * width + x`.
#[derive(Clone, Debug)]
pub(crate) struct Grid {
    width: u32,
    height: u32,
    tiles: Vec<Tile>,
    occupancy: Vec<Option<UnitId>>,
    smoke: Vec<u8>,
}

impl Grid {
    /// Creates a grid from row-major tiles. The tile count must equal
    /// `width * height`.
    pub(crate) fn new(width: u32, height: u32, tiles: Vec<Tile>) -> Self {
        let cells = tiles.len();
        Self {
            width,
            height,
            tiles,
            occupancy: vec![None; cells],
            smoke: vec![0; cells],
        }
    }

    pub(crate) fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub(crate) fn in_bounds(&self, pos: TilePos) -> bool {
        pos.x() < self.width && pos.y() < self.height
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if !self.in_bounds(pos) {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(pos.y()).ok()?;
        let column = usize::try_from(pos.x()).ok()?;
        Some(row * width + column)
    }

    pub(crate) fn terrain_view(&self) -> TerrainView<'_> {
        TerrainView::new(&self.tiles, self.width, self.height)
    }

    pub(crate) fn occupancy_view(&self) -> OccupancyView<'_> {
        OccupancyView::new(&self.occupancy, self.width, self.height)
    }

    pub(crate) fn smoke_view(&self) -> SmokeView<'_> {
        SmokeView::new(&self.smoke, self.width, self.height)
    }

    pub(crate) fn tile(&self, pos: TilePos) -> Option<&Tile> {
        self.index(pos).and_then(|index| self.tiles.get(index))
    }

    pub(crate) fn tile_mut(&mut self, pos: TilePos) -> Option<&mut Tile> {
        self.index(pos).and_then(|index| self.tiles.get_mut(index))
    }

    pub(crate) fn occupant(&self, pos: TilePos) -> Option<UnitId> {
        self.index(pos)
            .and_then(|index| self.occupancy.get(index).copied().flatten())
    }

    /// Reports whether a unit could be placed on the tile right now.
    pub(crate) fn is_open(&self, pos: TilePos) -> bool {
        self.tile(pos).is_some_and(|tile| tile.passable) && self.occupant(pos).is_none()
    }

    pub(crate) fn occupy(&mut self, pos: TilePos, unit: UnitId) {
        if let Some(slot) = self.index(pos).and_then(|index| self.occupancy.get_mut(index)) {
            *slot = Some(unit);
        }
    }

    pub(crate) fn vacate(&mut self, pos: TilePos) {
        if let Some(slot) = self.index(pos).and_then(|index| self.occupancy.get_mut(index)) {
            *slot = None;
        }
    }

    /// Lays smoke on the tile, keeping the longer of the two timers.
    pub(crate) fn add_smoke(&mut self, pos: TilePos, turns: u8) {
        if let Some(slot) = self.index(pos).and_then(|index| self.smoke.get_mut(index)) {
            *slot = (*slot).max(turns);
        }
    }

    /// Decrements every smoke timer by one turn.
    pub(crate) fn decay_smoke(&mut self) {
        for turns in &mut self.smoke {
            *turns = turns.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terror_site_core::TerrainKind;

    #[test]
    fn occupancy_tracks_units() {
        let mut grid = Grid::new(2, 2, vec![Tile::of(TerrainKind::Floor); 4]);
        let pos = TilePos::new(1, 1);
        assert!(grid.is_open(pos));
        grid.occupy(pos, UnitId::new(3));
        assert_eq!(grid.occupant(pos), Some(UnitId::new(3)));
        assert!(!grid.is_open(pos));
        grid.vacate(pos);
        assert!(grid.is_open(pos));
        assert!(!grid.is_open(TilePos::new(2, 0)));
    }

    #[test]
    fn smoke_decays_to_zero() {
        let mut grid = Grid::new(1, 1, vec![Tile::of(TerrainKind::Floor)]);
        let pos = TilePos::new(0, 0);
        grid.add_smoke(pos, 2);
        grid.add_smoke(pos, 1);
        grid.decay_smoke();
        assert!(grid.smoke_view().has_smoke(pos));
        grid.decay_smoke();
        grid.decay_smoke();
        assert_eq!(grid.smoke_view().turns_left(pos), 0);
    }
}
