#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Line-of-sight tests and squad field-of-view computation.

use terror_site_core::{TerrainView, TilePos};

/// Reports whether `to` can be seen from `from`.
///
/// The test walks an integer Bresenham line between the two tiles. Every tile
/// strictly between the endpoints must lie on the map and be passable; the
/// endpoints themselves are never tested, so the face of a wall is visible.
/// The walk is not symmetric: swapping the endpoints may visit different
/// intermediate tiles when the offsets differ in parity.
#[must_use]
pub fn has_line_of_sight(terrain: &TerrainView<'_>, from: TilePos, to: TilePos) -> bool {
    BresenhamWalk::new(from, to).all(|tile| tile.is_some_and(|pos| terrain.is_passable(pos)))
}

/// Tiles visited strictly between `from` and `to`, in walk order.
///
/// Tiles that would fall off the top or left edge of the map are reported as
/// `None`.
#[must_use]
pub fn line_between(from: TilePos, to: TilePos) -> Vec<Option<TilePos>> {
    BresenhamWalk::new(from, to).collect()
}

struct BresenhamWalk {
    x: i64,
    y: i64,
    target: (i64, i64),
    dx: i64,
    dy: i64,
    sx: i64,
    sy: i64,
    err: i64,
}

impl BresenhamWalk {
    fn new(from: TilePos, to: TilePos) -> Self {
        let (x0, y0) = (i64::from(from.x()), i64::from(from.y()));
        let (x1, y1) = (i64::from(to.x()), i64::from(to.y()));
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        Self {
            x: x0,
            y: y0,
            target: (x1, y1),
            dx,
            dy,
            sx: if x0 < x1 { 1 } else { -1 },
            sy: if y0 < y1 { 1 } else { -1 },
            err: dx + dy,
        }
    }
}

impl Iterator for BresenhamWalk {
    type Item = Option<TilePos>;

    fn next(&mut self) -> Option<Self::Item> {
        if (self.x, self.y) == self.target {
            return None;
        }
        let doubled = 2 * self.err;
        if doubled >= self.dy {
            self.err += self.dy;
            self.x += self.sx;
        }
        if doubled <= self.dx {
            self.err += self.dx;
            self.y += self.sy;
        }
        if (self.x, self.y) == self.target {
            return None;
        }
        let pos = u32::try_from(self.x)
            .ok()
            .zip(u32::try_from(self.y).ok())
            .map(|(x, y)| TilePos::new(x, y));
        Some(pos)
    }
}

/// Configuration parameters required to compute the field of view.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    sight_radius: u32,
}

impl Config {
    /// Creates a new configuration with the provided Manhattan sight radius.
    #[must_use]
    pub const fn new(sight_radius: u32) -> Self {
        Self { sight_radius }
    }

    /// Manhattan distance beyond which observers see nothing.
    #[must_use]
    pub const fn sight_radius(&self) -> u32 {
        self.sight_radius
    }
}

/// Dense set of tiles visible to at least one observer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VisibleSet {
    width: u32,
    height: u32,
    tiles: Vec<bool>,
    count: usize,
}

impl VisibleSet {
    /// Creates an empty set for a map of the provided dimensions.
    #[must_use]
    pub fn empty(width: u32, height: u32) -> Self {
        let cells = usize::try_from(u64::from(width) * u64::from(height)).unwrap_or(0);
        Self {
            width,
            height,
            tiles: vec![false; cells],
            count: 0,
        }
    }

    /// Reports whether the tile is visible.
    #[must_use]
    pub fn contains(&self, pos: TilePos) -> bool {
        self.index(pos)
            .and_then(|index| self.tiles.get(index).copied())
            .unwrap_or(false)
    }

    /// Number of visible tiles.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Reports whether no tile is visible.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Iterator over the visible tiles in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = TilePos> + '_ {
        let width = self.width;
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, visible)| **visible)
            .filter_map(move |(index, _)| {
                let index = u32::try_from(index).ok()?;
                Some(TilePos::new(index % width, index / width))
            })
    }

    fn insert(&mut self, pos: TilePos) {
        if let Some(slot) = self.index(pos).and_then(|index| self.tiles.get_mut(index)) {
            if !*slot {
                *slot = true;
                self.count += 1;
            }
        }
    }

    fn index(&self, pos: TilePos) -> Option<usize> {
        if pos.x() >= self.width || pos.y() >= self.height {
            return None;
        }
        let width = usize::try_from(self.width).ok()?;
        let row = usize::try_from(pos.y()).ok()?;
        let column = usize::try_from(pos.x()).ok()?;
        Some(row * width + column)
    }
}

/// Computes the tiles visible to the provided observers.
///
/// Every tile within the configured Manhattan radius of an observer that
/// passes [`has_line_of_sight`] is included. Observer tiles are always
/// visible.
#[must_use]
pub fn calculate<I>(terrain: &TerrainView<'_>, observers: I, config: Config) -> VisibleSet
where
    I: IntoIterator<Item = TilePos>,
{
    let (width, height) = terrain.dimensions();
    let mut visible = VisibleSet::empty(width, height);
    let radius = i64::from(config.sight_radius);

    for observer in observers {
        if !terrain.in_bounds(observer) {
            continue;
        }
        visible.insert(observer);
        for dy in -radius..=radius {
            let span = radius - dy.abs();
            for dx in -span..=span {
                let Some(pos) = observer.offset(dx, dy) else {
                    continue;
                };
                if !terrain.in_bounds(pos) || visible.contains(pos) {
                    continue;
                }
                if has_line_of_sight(terrain, observer, pos) {
                    visible.insert(pos);
                }
            }
        }
    }

    tracing::trace!(tiles = visible.len(), "field of view recomputed");
    visible
}
