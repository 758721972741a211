//! Field of view as a pluggable service.
//! The session only depends on `VisibilityService`; `Shadowcast` is the stock implementation.
//! This module does not touch the explored set; `GameMap::apply_visibility` owns that union.

use crate::map::TransparencyGrid;
use crate::types::Pos;

pub trait VisibilityService {
    /// Row-major visible flags for every cell of `grid`. Opaque cells that bound the view
    /// are themselves visible.
    fn compute_visible(&self, grid: &TransparencyGrid<'_>, origin: Pos, radius: u32) -> Vec<bool>;
}

/// Recursive shadowcasting over eight octants with a circular radius.
#[derive(Clone, Copy, Debug, Default)]
pub struct Shadowcast;

impl VisibilityService for Shadowcast {
    fn compute_visible(&self, grid: &TransparencyGrid<'_>, origin: Pos, radius: u32) -> Vec<bool> {
        let visible = vec![false; grid.width() * grid.height()];
        let mut fov = Fov { grid, origin, radius: radius as i32, visible };
        if !grid.in_bounds(origin) {
            return fov.visible;
        }
        fov.mark(origin);
        for octant in 0..8 {
            fov.scan(1, Slope::new(1, 1), Slope::new(0, 1), octant);
        }
        fov.drop_unsighted();
        fov.visible
    }
}

struct Fov<'g, 'm> {
    grid: &'g TransparencyGrid<'m>,
    origin: Pos,
    radius: i32,
    visible: Vec<bool>,
}

#[derive(Clone, Copy)]
struct Slope {
    y: i32,
    x: i32,
}

impl Slope {
    fn new(y: i32, x: i32) -> Self {
        Self { y, x }
    }

    fn at_least(self, other: Slope) -> bool {
        self.y * other.x >= other.y * self.x
    }

    fn above(self, other: Slope) -> bool {
        self.y * other.x > other.y * self.x
    }
}

fn transform_octant(origin: Pos, col: i32, row: i32, octant: u8) -> Pos {
    match octant {
        0 => Pos { y: origin.y - row, x: origin.x + col },
        1 => Pos { y: origin.y - col, x: origin.x + row },
        2 => Pos { y: origin.y - col, x: origin.x - row },
        3 => Pos { y: origin.y - row, x: origin.x - col },
        4 => Pos { y: origin.y + row, x: origin.x - col },
        5 => Pos { y: origin.y + col, x: origin.x - row },
        6 => Pos { y: origin.y + col, x: origin.x + row },
        _ => Pos { y: origin.y + row, x: origin.x + col },
    }
}

impl Fov<'_, '_> {
    fn index(&self, pos: Pos) -> usize {
        (pos.y as usize) * self.grid.width() + (pos.x as usize)
    }

    fn mark(&mut self, pos: Pos) {
        if self.grid.in_bounds(pos) {
            let idx = self.index(pos);
            self.visible[idx] = true;
        }
    }

    fn within_radius(&self, pos: Pos) -> bool {
        let (dx, dy) = (pos.x - self.origin.x, pos.y - self.origin.y);
        dx * dx + dy * dy <= self.radius * self.radius
    }

    fn scan(&mut self, distance: i32, start: Slope, end: Slope, octant: u8) {
        if distance > self.radius {
            return;
        }
        let mut blocked = false;
        let mut current_start = start;
        for row in (0..=distance).rev() {
            let top = Slope::new(2 * row + 1, 2 * distance - 1);
            let bottom = Slope::new(2 * row - 1, 2 * distance + 1);
            if !(current_start.at_least(bottom) && top.above(end)) {
                continue;
            }
            let pos = transform_octant(self.origin, distance, row, octant);
            if self.within_radius(pos) {
                self.mark(pos);
            }
            if !self.grid.is_transparent(pos) {
                if !blocked {
                    self.scan(distance + 1, current_start, top, octant);
                    blocked = true;
                }
                current_start = bottom;
            } else {
                blocked = false;
            }
        }
        if !blocked {
            self.scan(distance + 1, current_start, end, octant);
        }
    }

    /// Clears cells the octant scan lit but a straight sight line cannot reach.
    fn drop_unsighted(&mut self) {
        for idx in 0..self.visible.len() {
            if !self.visible[idx] {
                continue;
            }
            let width = self.grid.width();
            let pos = Pos { y: (idx / width) as i32, x: (idx % width) as i32 };
            if pos != self.origin && !self.has_line_of_sight(pos) {
                self.visible[idx] = false;
            }
        }
    }

    fn has_line_of_sight(&self, target: Pos) -> bool {
        let (dx, dy) = (target.x - self.origin.x, target.y - self.origin.y);
        let (step_x, step_y) = (dx.signum(), dy.signum());
        let (span_x, span_y) = (dx.abs(), dy.abs());
        let mut pos = self.origin;
        let (mut taken_x, mut taken_y) = (0, 0);

        while taken_x < span_x || taken_y < span_y {
            let lhs = (1 + 2 * taken_x) * span_y;
            let rhs = (1 + 2 * taken_y) * span_x;
            if lhs == rhs {
                pos = pos.offset(step_x, step_y);
                taken_x += 1;
                taken_y += 1;
            } else if lhs < rhs {
                pos = pos.offset(step_x, 0);
                taken_x += 1;
            } else {
                pos = pos.offset(0, step_y);
                taken_y += 1;
            }
            if pos == target {
                break;
            }
            if !self.grid.is_transparent(pos) {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{GameMap, TileKind};

    fn walled_room(size: i32) -> GameMap {
        let mut map = GameMap::new(20, 20);
        for y in 1..=size {
            for x in 1..=size {
                map.set_tile(Pos::new(x, y), TileKind::Floor);
            }
        }
        map
    }

    fn visible(map: &GameMap, origin: Pos, radius: u32) -> Vec<bool> {
        Shadowcast.compute_visible(&map.transparency(), origin, radius)
    }

    fn at(map: &GameMap, flags: &[bool], pos: Pos) -> bool {
        flags[map.index(pos)]
    }

    #[test]
    fn open_room_is_visible_up_to_the_radius() {
        let map = walled_room(12);
        let origin = Pos::new(6, 6);
        let flags = visible(&map, origin, 3);

        assert!(at(&map, &flags, origin));
        assert!(at(&map, &flags, Pos::new(9, 6)));
        assert!(at(&map, &flags, Pos::new(8, 8)));
        assert!(!at(&map, &flags, Pos::new(10, 6)));
        assert!(!at(&map, &flags, Pos::new(9, 9)));
    }

    #[test]
    fn walls_are_lit_but_hide_what_is_behind_them() {
        let mut map = walled_room(12);
        map.set_tile(Pos::new(6, 4), TileKind::Wall);
        let flags = visible(&map, Pos::new(6, 6), 8);

        assert!(at(&map, &flags, Pos::new(6, 4)), "the wall face is visible");
        assert!(!at(&map, &flags, Pos::new(6, 3)), "the cell behind it is not");
        assert!(!at(&map, &flags, Pos::new(6, 0)));
        assert!(at(&map, &flags, Pos::new(0, 6)), "outer wall is lit");
    }

    #[test]
    fn light_never_leaks_out_of_a_closed_room() {
        let map = walled_room(5);
        for y in 1..=5 {
            for x in 1..=5 {
                let flags = visible(&map, Pos::new(x, y), 15);
                for (idx, &seen) in flags.iter().enumerate() {
                    let pos = Pos { y: (idx / 20) as i32, x: (idx % 20) as i32 };
                    let inside_ring = pos.x <= 6 && pos.y <= 6;
                    assert!(!seen || inside_ring, "light leaked to {pos:?} from ({x}, {y})");
                }
            }
        }
    }

    #[test]
    fn repeat_computation_is_deterministic() {
        let mut map = walled_room(12);
        map.set_tile(Pos::new(7, 5), TileKind::Wall);
        map.set_tile(Pos::new(7, 6), TileKind::Wall);
        let origin = Pos::new(4, 5);
        assert_eq!(visible(&map, origin, 8), visible(&map, origin, 8));
    }
}
