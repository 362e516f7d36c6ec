//! Layout module - pure coordinate math for the board and inventory
//!
//! Maps between flat slot indices and virtual-canvas rectangles, and
//! resolves pointer positions back to slots. Holds no state; everything is
//! deterministic given the constants in `merge-manor-types`.
//!
//! The inventory is one flat sequence of slots shown 15 per page; "global"
//! indices address the full sequence, "local" indices address the visible
//! page grid.

use merge_manor_types::{
    Rect, BOARD_COLS, BOARD_GAP, BOARD_ROWS, BOARD_SLOT_COUNT, BOARD_SLOT_SIZE, BOARD_X, BOARD_Y,
    INVENTORY_COLS, INVENTORY_GAP, INVENTORY_PAGE_SIZE, INVENTORY_SLOT_SIZE, INVENTORY_X,
    INVENTORY_Y, SNAP_DISTANCE,
};

/// Rectangle of a board slot
pub fn board_slot_to_rect(slot: usize) -> Rect {
    let col = slot % BOARD_COLS;
    let row = slot / BOARD_COLS;
    Rect::new(
        BOARD_X + col as f32 * (BOARD_SLOT_SIZE + BOARD_GAP),
        BOARD_Y + row as f32 * (BOARD_SLOT_SIZE + BOARD_GAP),
        BOARD_SLOT_SIZE,
        BOARD_SLOT_SIZE,
    )
}

/// Rectangle of a local (on-page) inventory slot
pub fn inventory_slot_to_rect(local_slot: usize) -> Rect {
    let col = local_slot % INVENTORY_COLS;
    let row = local_slot / INVENTORY_COLS;
    Rect::new(
        INVENTORY_X + col as f32 * (INVENTORY_SLOT_SIZE + INVENTORY_GAP),
        INVENTORY_Y + row as f32 * (INVENTORY_SLOT_SIZE + INVENTORY_GAP),
        INVENTORY_SLOT_SIZE,
        INVENTORY_SLOT_SIZE,
    )
}

/// Board slot under a point, if any (gaps between slots resolve to none)
pub fn point_to_board_slot(x: f32, y: f32) -> Option<usize> {
    if x < BOARD_X || y < BOARD_Y {
        return None;
    }
    let col = ((x - BOARD_X) / (BOARD_SLOT_SIZE + BOARD_GAP)) as usize;
    let row = ((y - BOARD_Y) / (BOARD_SLOT_SIZE + BOARD_GAP)) as usize;
    if col >= BOARD_COLS || row >= BOARD_ROWS {
        return None;
    }
    let slot = row * BOARD_COLS + col;
    if !board_slot_to_rect(slot).contains(x, y) {
        return None;
    }
    Some(slot)
}

/// Global inventory slot under a point for the given page, bounded by the
/// current capacity
pub fn point_to_inventory_slot(x: f32, y: f32, capacity: usize, page: usize) -> Option<usize> {
    if x < INVENTORY_X || y < INVENTORY_Y {
        return None;
    }
    let col = ((x - INVENTORY_X) / (INVENTORY_SLOT_SIZE + INVENTORY_GAP)) as usize;
    let row = ((y - INVENTORY_Y) / (INVENTORY_SLOT_SIZE + INVENTORY_GAP)) as usize;
    if col >= INVENTORY_COLS {
        return None;
    }
    let local_slot = row * INVENTORY_COLS + col;
    if local_slot >= INVENTORY_PAGE_SIZE {
        return None;
    }
    let global_slot = page * INVENTORY_PAGE_SIZE + local_slot;
    if global_slot >= capacity {
        return None;
    }
    if !inventory_slot_to_rect(local_slot).contains(x, y) {
        return None;
    }
    Some(global_slot)
}

/// Local page index for a global inventory slot, or `None` when the slot is
/// not on the given page
pub fn inventory_global_to_visible(global_slot: usize, page: usize) -> Option<usize> {
    let offset = page * INVENTORY_PAGE_SIZE;
    if global_slot < offset {
        return None;
    }
    let local = global_slot - offset;
    if local >= INVENTORY_PAGE_SIZE {
        return None;
    }
    Some(local)
}

fn distance_to_center(rect: Rect, x: f32, y: f32) -> f32 {
    let (cx, cy) = rect.center();
    (cx - x).hypot(cy - y)
}

/// Nearest board slot whose center is within the snap radius
pub fn nearest_board_slot(x: f32, y: f32) -> Option<usize> {
    let mut best: Option<(usize, f32)> = None;
    for slot in 0..BOARD_SLOT_COUNT {
        let distance = distance_to_center(board_slot_to_rect(slot), x, y);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((slot, distance));
        }
    }
    best.filter(|&(_, d)| d <= SNAP_DISTANCE).map(|(s, _)| s)
}

/// Nearest visible inventory slot (global index) within the snap radius
pub fn nearest_inventory_slot(x: f32, y: f32, capacity: usize, page: usize) -> Option<usize> {
    let start = page * INVENTORY_PAGE_SIZE;
    let end = capacity.min(start + INVENTORY_PAGE_SIZE);
    let mut best: Option<(usize, f32)> = None;
    for global_slot in start..end {
        let Some(local) = inventory_global_to_visible(global_slot, page) else {
            continue;
        };
        let distance = distance_to_center(inventory_slot_to_rect(local), x, y);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((global_slot, distance));
        }
    }
    best.filter(|&(_, d)| d <= SNAP_DISTANCE).map(|(s, _)| s)
}
