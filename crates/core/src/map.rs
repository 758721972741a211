//! Tile grid with visibility bookkeeping for a single floor.
//! This module exists to keep terrain queries and the visible/explored bitmaps together.
//! It does not own entities or decide what is visible; see `world` and `visibility`.

use serde::{Deserialize, Serialize};

use crate::types::{Pos, Rgb};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Wall,
    Floor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TileGraphic {
    pub glyph: char,
    pub fg: Rgb,
    pub bg: Rgb,
}

/// Drawn for cells that have never been explored.
pub const SHROUD: TileGraphic =
    TileGraphic { glyph: ' ', fg: Rgb(255, 255, 255), bg: Rgb(0, 0, 0) };

impl TileKind {
    pub fn walkable(self) -> bool {
        matches!(self, Self::Floor)
    }

    pub fn transparent(self) -> bool {
        matches!(self, Self::Floor)
    }

    pub fn light(self) -> TileGraphic {
        match self {
            Self::Wall => {
                TileGraphic { glyph: ' ', fg: Rgb(255, 255, 255), bg: Rgb(130, 110, 50) }
            }
            Self::Floor => {
                TileGraphic { glyph: ' ', fg: Rgb(255, 255, 255), bg: Rgb(200, 180, 50) }
            }
        }
    }

    pub fn dark(self) -> TileGraphic {
        match self {
            Self::Wall => TileGraphic { glyph: ' ', fg: Rgb(255, 255, 255), bg: Rgb(0, 0, 100) },
            Self::Floor => TileGraphic { glyph: ' ', fg: Rgb(255, 255, 255), bg: Rgb(50, 50, 150) },
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameMap {
    pub width: usize,
    pub height: usize,
    pub tiles: Vec<TileKind>,
    pub visible: Vec<bool>,
    pub explored: Vec<bool>,
    pub downstairs: Pos,
}

impl GameMap {
    /// A solid block of wall; the generator carves floor out of it.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            tiles: vec![TileKind::Wall; width * height],
            visible: vec![false; width * height],
            explored: vec![false; width * height],
            downstairs: Pos { y: 0, x: 0 },
        }
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    pub fn tile_at(&self, pos: Pos) -> TileKind {
        if !self.in_bounds(pos) {
            return TileKind::Wall;
        }
        self.tiles[self.index(pos)]
    }

    pub fn set_tile(&mut self, pos: Pos, tile: TileKind) {
        if !self.in_bounds(pos) {
            return;
        }
        let idx = self.index(pos);
        self.tiles[idx] = tile;
    }

    pub fn is_walkable(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.tile_at(pos).walkable()
    }

    pub fn is_visible(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.visible[self.index(pos)]
    }

    pub fn is_explored(&self, pos: Pos) -> bool {
        self.in_bounds(pos) && self.explored[self.index(pos)]
    }

    /// Replaces the visible set and folds it into the explored set, which only grows.
    pub fn apply_visibility(&mut self, visible: Vec<bool>) {
        debug_assert_eq!(visible.len(), self.tiles.len());
        for (explored, &seen) in self.explored.iter_mut().zip(&visible) {
            *explored |= seen;
        }
        self.visible = visible;
    }

    pub fn transparency(&self) -> TransparencyGrid<'_> {
        TransparencyGrid { map: self }
    }

    /// Light palette when visible, dark palette when explored, otherwise shroud.
    pub fn graphic_at(&self, pos: Pos) -> TileGraphic {
        let tile = self.tile_at(pos);
        if self.is_visible(pos) {
            tile.light()
        } else if self.is_explored(pos) {
            tile.dark()
        } else {
            SHROUD
        }
    }

    pub fn floor_count(&self) -> usize {
        self.tiles.iter().filter(|tile| tile.walkable()).count()
    }

    pub(crate) fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.width + (pos.x as usize)
    }
}

/// Read-only view handed to the visibility service.
#[derive(Clone, Copy)]
pub struct TransparencyGrid<'a> {
    map: &'a GameMap,
}

impl TransparencyGrid<'_> {
    pub fn width(&self) -> usize {
        self.map.width
    }

    pub fn height(&self) -> usize {
        self.map.height
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        self.map.in_bounds(pos)
    }

    pub fn is_transparent(&self, pos: Pos) -> bool {
        self.map.in_bounds(pos) && self.map.tile_at(pos).transparent()
    }
}
