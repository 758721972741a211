//! A* over walkable cells with eight-way steps.
//! Cells held by a blocking entity stay passable but cost extra, so crowds get routed around.

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{DIRECTIONS, Pos};
use crate::world::World;

const STEP_COST: u32 = 1;
const CROWD_COST: u32 = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
struct OpenNode {
    f: u32,
    h: u32,
    y: i32,
    x: i32,
}

/// Cells from `start` (exclusive) to `goal` (inclusive), or `None` when unreachable.
pub(crate) fn path_to(world: &World, start: Pos, goal: Pos) -> Option<Vec<Pos>> {
    if !world.is_walkable(start) || !world.is_walkable(goal) {
        return None;
    }
    if start == goal {
        return Some(Vec::new());
    }

    let mut open_set = BTreeSet::new();
    let mut g_score = BTreeMap::new();
    let mut came_from = BTreeMap::new();
    let h = start.chebyshev(goal);
    open_set.insert(OpenNode { f: h, h, y: start.y, x: start.x });
    g_score.insert(start, 0);

    while let Some(current) = open_set.pop_first() {
        let pos = Pos { y: current.y, x: current.x };
        if pos == goal {
            return Some(reconstruct_path(&came_from, start, goal));
        }
        let Some(&current_g) = g_score.get(&pos) else {
            continue;
        };
        for (dx, dy) in DIRECTIONS {
            let next = pos.offset(dx, dy);
            if !world.is_walkable(next) {
                continue;
            }
            let crowd = if next != goal && world.blocking_entity_at(next).is_some() {
                CROWD_COST
            } else {
                0
            };
            let tentative = current_g + STEP_COST + crowd;
            if tentative < *g_score.get(&next).unwrap_or(&u32::MAX) {
                came_from.insert(next, pos);
                g_score.insert(next, tentative);
                let h = next.chebyshev(goal);
                open_set.insert(OpenNode { f: tentative + h, h, y: next.y, x: next.x });
            }
        }
    }
    None
}

fn reconstruct_path(came_from: &BTreeMap<Pos, Pos>, start: Pos, goal: Pos) -> Vec<Pos> {
    let mut pos = goal;
    let mut path = vec![pos];
    while let Some(&previous) = came_from.get(&pos) {
        if previous == start {
            break;
        }
        path.push(previous);
        pos = previous;
    }
    path.reverse();
    path
}
