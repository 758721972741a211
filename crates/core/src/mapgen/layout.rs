//! Room placement and corridor carving.

use rand_chacha::ChaCha8Rng;

use crate::config::GeneratorConfig;
use crate::map::{GameMap, TileKind};
use crate::types::Pos;

use super::seed::{coin_flip, roll};

/// Floor area of a room; its wall ring is the one-tile border around it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RoomRect {
    pub(crate) x: usize,
    pub(crate) y: usize,
    pub(crate) width: usize,
    pub(crate) height: usize,
}

impl RoomRect {
    pub(crate) fn right(self) -> usize {
        self.x + self.width - 1
    }

    pub(crate) fn bottom(self) -> usize {
        self.y + self.height - 1
    }

    pub(crate) fn center(self) -> Pos {
        Pos { y: (self.y + (self.height / 2)) as i32, x: (self.x + (self.width / 2)) as i32 }
    }

    pub(crate) fn expanded(self, margin: usize) -> Self {
        let expanded_x = self.x.saturating_sub(margin);
        let expanded_y = self.y.saturating_sub(margin);
        Self {
            x: expanded_x,
            y: expanded_y,
            width: self.right() + margin - expanded_x + 1,
            height: self.bottom() + margin - expanded_y + 1,
        }
    }

    pub(crate) fn intersects(self, other: &Self) -> bool {
        self.x <= other.right()
            && self.right() >= other.x
            && self.y <= other.bottom()
            && self.bottom() >= other.y
    }

    #[cfg(test)]
    pub(crate) fn contains(self, pos: Pos) -> bool {
        if pos.x < 0 || pos.y < 0 {
            return false;
        }
        let (px, py) = (pos.x as usize, pos.y as usize);
        px >= self.x && px <= self.right() && py >= self.y && py <= self.bottom()
    }

    pub(crate) fn cells(self) -> impl Iterator<Item = Pos> {
        (self.y..=self.bottom()).flat_map(move |y| {
            (self.x..=self.right()).map(move |x| Pos { y: y as i32, x: x as i32 })
        })
    }
}

/// One sampling attempt per `max_rooms`; rejected candidates are not retried.
pub(crate) fn place_rooms(rng: &mut ChaCha8Rng, config: &GeneratorConfig) -> Vec<RoomRect> {
    let mut rooms: Vec<RoomRect> = Vec::new();
    for _ in 0..config.max_rooms {
        let room_width = roll(rng, config.room_min_size, config.room_max_size);
        let room_height = roll(rng, config.room_min_size, config.room_max_size);
        if room_width + 2 > config.map_width || room_height + 2 > config.map_height {
            continue;
        }
        let x = roll(rng, 1, config.map_width - room_width - 1);
        let y = roll(rng, 1, config.map_height - room_height - 1);
        let candidate = RoomRect { x, y, width: room_width, height: room_height };
        let candidate_with_margin = candidate.expanded(1);
        if rooms.iter().any(|existing| existing.expanded(1).intersects(&candidate_with_margin)) {
            continue;
        }
        rooms.push(candidate);
    }
    rooms
}

pub(crate) fn carve_room(map: &mut GameMap, room: &RoomRect) {
    for pos in room.cells() {
        map.set_tile(pos, TileKind::Floor);
    }
}

/// Carves an L from `start` to `end`; returns every cell it touched.
pub(crate) fn carve_l_shaped_corridor(
    map: &mut GameMap,
    start: Pos,
    end: Pos,
    horizontal_first: bool,
) -> Vec<Pos> {
    let corner = if horizontal_first {
        Pos { y: start.y, x: end.x }
    } else {
        Pos { y: end.y, x: start.x }
    };
    let mut carved = line(start, corner);
    carved.extend(line(corner, end));
    for &pos in &carved {
        map.set_tile(pos, TileKind::Floor);
    }
    carved
}

/// Links each room to the one placed before it, bending at a random corner.
pub(crate) fn connect_rooms(
    map: &mut GameMap,
    rng: &mut ChaCha8Rng,
    rooms: &[RoomRect],
) -> Vec<Pos> {
    let mut carved = Vec::new();
    for pair in rooms.windows(2) {
        let horizontal_first = coin_flip(rng);
        carved.extend(carve_l_shaped_corridor(
            map,
            pair[1].center(),
            pair[0].center(),
            horizontal_first,
        ));
    }
    carved
}

fn line(from: Pos, to: Pos) -> Vec<Pos> {
    let (dx, dy) = ((to.x - from.x).signum(), (to.y - from.y).signum());
    let mut cells = vec![from];
    let mut pos = from;
    while pos != to {
        pos = pos.offset(dx, dy);
        cells.push(pos);
    }
    cells
}
