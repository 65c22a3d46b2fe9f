/*!
layout.rs - tile-grid layout for up to sixteen console framebuffers.

Grounded in `original_source/multi/layout.h`: the tile-count tables for
`DistributeProportionsHorizontally`/`Vertically`, `Layout::PositionOfPlayer`,
and `Layout::FramebufferOffsetForPlayer` are reproduced exactly. Horizontal
orientations (`None`, `Flip`) prefer `cols >= rows`; vertical orientations
(`Left`, `Right`) prefer `rows >= cols`, matching `Layout::IsVertical`.
*/

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    None,
    Left,
    Flip,
    Right,
    /// Caller has not picked one yet; treated as `None` for grid purposes.
    Auto,
}

impl Orientation {
    pub fn is_vertical(self) -> bool {
        matches!(self, Orientation::Left | Orientation::Right)
    }
}

/// `(cols, rows)` for a horizontal-biased layout, `players` in `1..=16`.
fn distribute_horizontally(players: u32) -> (u32, u32) {
    match players {
        1 => (1, 1),
        2 => (2, 1),
        3 | 4 => (2, 2),
        5 | 6 => (3, 2),
        7 | 8 => (4, 2),
        9 => (3, 3),
        10..=12 => (4, 3),
        13..=15 => (5, 3),
        16 => (4, 4),
        _ => (1, 1),
    }
}

/// `(cols, rows)` for a vertical-biased layout, `players` in `1..=16`.
fn distribute_vertically(players: u32) -> (u32, u32) {
    match players {
        1 => (1, 1),
        2 => (1, 2),
        3 | 4 => (2, 2),
        5 | 6 => (2, 3),
        7 | 8 => (2, 4),
        9 => (3, 3),
        10..=12 => (3, 4),
        13..=15 => (3, 5),
        16 => (4, 4),
        _ => (1, 1),
    }
}

fn distribute_proportions(players: u32, vertical: bool) -> (u32, u32) {
    if vertical {
        distribute_vertically(players)
    } else {
        distribute_horizontally(players)
    }
}

/// Tile-grid layout for `players` consoles, each contributing a
/// `single_tile` pixel rectangle, onto one shared framebuffer.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    players: u32,
    single_tile: (u32, u32),
    grid: (u32, u32),
}

impl Layout {
    pub fn new(players: u32, single_tile_width: u32, single_tile_height: u32, orientation: Orientation) -> Self {
        assert!(players > 0 && players <= 16, "layout supports 1..=16 players");
        let grid = distribute_proportions(players, orientation.is_vertical());
        Self {
            players,
            single_tile: (single_tile_width, single_tile_height),
            grid,
        }
    }

    pub fn players(&self) -> u32 {
        self.players
    }

    /// `(cols, rows)` of the tile grid.
    pub fn grid(&self) -> (u32, u32) {
        self.grid
    }

    /// Total pixel dimensions of the shared framebuffer.
    pub fn total_pixels(&self) -> (u32, u32) {
        (self.grid.0 * self.single_tile.0, self.grid.1 * self.single_tile.1)
    }

    /// `(col, row)` of the tile assigned to `player`.
    pub fn position_of_player(&self, player: u32) -> (u32, u32) {
        let rows = self.grid.1;
        (player / rows, player % rows)
    }

    pub fn framebuffer_pitch(&self, single_tile_pitch: u32) -> u32 {
        self.grid.0 * single_tile_pitch
    }

    /// Byte offset of `player`'s tile into a caller-supplied framebuffer
    /// base, given the pitch of a single tile's own pixel row.
    pub fn framebuffer_offset_for_player(&self, player: u32, single_tile_pitch: u32) -> u32 {
        let (col, row) = self.position_of_player(player);
        let host_pitch = self.framebuffer_pitch(single_tile_pitch);
        (self.single_tile.1 * host_pitch * row) + (single_tile_pitch * col)
    }

    pub fn for_orientation(&self, orientation: Orientation) -> Layout {
        Layout::new(self.players, self.single_tile.0, self.single_tile.1, orientation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn horizontal_grid_matches_reference_table() {
        assert_eq!(distribute_horizontally(1), (1, 1));
        assert_eq!(distribute_horizontally(2), (2, 1));
        assert_eq!(distribute_horizontally(4), (2, 2));
        assert_eq!(distribute_horizontally(8), (4, 2));
        assert_eq!(distribute_horizontally(9), (3, 3));
        assert_eq!(distribute_horizontally(12), (4, 3));
        assert_eq!(distribute_horizontally(15), (5, 3));
        assert_eq!(distribute_horizontally(16), (4, 4));
    }

    #[test]
    fn vertical_grid_matches_reference_table() {
        assert_eq!(distribute_vertically(2), (1, 2));
        assert_eq!(distribute_vertically(8), (2, 4));
        assert_eq!(distribute_vertically(12), (3, 4));
        assert_eq!(distribute_vertically(16), (4, 4));
    }

    #[test]
    fn two_player_horizontal_layout_places_second_player_to_the_right() {
        let layout = Layout::new(2, 160, 102, Orientation::None);
        assert_eq!(layout.grid(), (2, 1));
        assert_eq!(layout.position_of_player(0), (0, 0));
        assert_eq!(layout.position_of_player(1), (1, 0));
    }

    #[test]
    fn four_player_grid_places_players_in_two_rows() {
        let layout = Layout::new(4, 160, 102, Orientation::None);
        assert_eq!(layout.grid(), (2, 2));
        assert_eq!(layout.position_of_player(0), (0, 0));
        assert_eq!(layout.position_of_player(1), (0, 1));
        assert_eq!(layout.position_of_player(2), (1, 0));
        assert_eq!(layout.position_of_player(3), (1, 1));
    }

    #[test]
    fn framebuffer_offset_matches_reference_formula() {
        let layout = Layout::new(4, 160, 102, Orientation::None);
        let pitch = 160u32;
        // player 3 is at (col=1, row=1): host_pitch = 2*160 = 320
        let offset = layout.framebuffer_offset_for_player(3, pitch);
        assert_eq!(offset, (102 * 320 * 1) + (160 * 1));
    }

    #[test]
    fn vertical_orientation_prefers_taller_grid() {
        let layout = Layout::new(8, 160, 102, Orientation::Left);
        assert_eq!(layout.grid(), (2, 4));
    }
}
