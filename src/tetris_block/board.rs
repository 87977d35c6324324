use std::fmt;

use bevy::math::IVec2;

/// Handle naming one block from the moment it spawns until its row is cleared.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u32);

type BoardCell = Option<BlockId>;

/// Blocks that moved during a compaction, with the vertical shift applied to each.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Compaction {
    pub shift: usize,
    pub moved: Vec<(BlockId, IVec2)>,
}

/// Result of clearing the full rows touched by a landed piece.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct LineClear {
    pub rows: usize,
    pub cleared: Vec<BlockId>,
    pub moved: Vec<(BlockId, IVec2)>,
}

pub struct Board {
    width: usize,
    height: usize,
    cells: Vec<BoardCell>,
    row_counts: Vec<usize>,
    // one past the highest row holding a block
    highest_occupied_row: usize,
}
impl Board {
    pub fn new(width: usize, height: usize) -> Board {
        assert!(width > 0 && height > 0);

        Board {
            width,
            height,
            cells: vec![None; width * height],
            row_counts: vec![0; height],
            highest_occupied_row: 0,
        }
    }

    #[cfg(test)]
    pub fn width(&self) -> usize {
        self.width
    }
    #[cfg(test)]
    pub fn height(&self) -> usize {
        self.height
    }
    #[cfg(test)]
    pub fn highest_occupied_row(&self) -> usize {
        self.highest_occupied_row
    }
    #[cfg(test)]
    pub fn row_count(&self, row: usize) -> usize {
        self.row_counts[row]
    }

    pub fn in_bounds(&self, loc: IVec2) -> bool {
        loc.x >= 0 && loc.y >= 0 && loc.x < self.width as i32 && loc.y < self.height as i32
    }

    fn to_idx(&self, loc: IVec2) -> usize {
        (self.width as i32 * loc.y + loc.x) as usize
    }
    #[cfg(test)]
    fn to_ivec(&self, idx: usize) -> IVec2 {
        IVec2::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    #[cfg(test)]
    pub fn get(&self, loc: IVec2) -> BoardCell {
        if self.in_bounds(loc) {
            self.cells[self.to_idx(loc)]
        } else {
            None
        }
    }

    /// Cells outside the grid count as occupied; they are never a valid target.
    pub fn is_occupied(&self, loc: IVec2) -> bool {
        !self.in_bounds(loc) || self.cells[self.to_idx(loc)].is_some()
    }

    pub fn can_place(&self, mut locs: impl Iterator<Item = IVec2>) -> bool {
        locs.all(|loc| !self.is_occupied(loc))
    }

    #[cfg(test)]
    pub fn iter_blocks(&self) -> impl Iterator<Item = (IVec2, BlockId)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(idx, &block)| block.map(|block| (self.to_ivec(idx), block)))
    }

    pub fn place(&mut self, block: BlockId, loc: IVec2) {
        assert!(self.in_bounds(loc), "placing {:?} outside the grid at {}", block, loc);
        let idx = self.to_idx(loc);
        assert!(self.cells[idx].is_none(), "placing {:?} onto occupied {}", block, loc);

        self.cells[idx] = Some(block);
        let row = loc.y as usize;
        self.row_counts[row] += 1;
        if row + 1 > self.highest_occupied_row {
            self.highest_occupied_row = row + 1;
        }
    }

    pub fn is_row_full(&self, row: usize) -> bool {
        self.row_counts[row] == self.width
    }

    pub fn clear_row(&mut self, row: usize) -> Vec<BlockId> {
        let start = row * self.width;
        let removed = self.cells[start..start + self.width]
            .iter_mut()
            .filter_map(Option::take)
            .collect();
        self.row_counts[row] = 0;
        removed
    }

    /// Walks `[from_row, to_row)` bottom to top. Every empty row grows the shift,
    /// every non-empty row drops by the shift accumulated below it. The walk never
    /// goes past the highest occupied row.
    pub fn compact(&mut self, from_row: usize, to_row: usize) -> Compaction {
        let mut compaction = Compaction::default();

        for row in from_row..to_row.min(self.highest_occupied_row) {
            if self.row_counts[row] == 0 {
                compaction.shift += 1;
                continue;
            }
            if compaction.shift == 0 {
                continue;
            }

            let shift = compaction.shift;
            let delta = IVec2::new(0, -(shift as i32));
            for col in 0..self.width {
                let from = self.to_idx(IVec2::new(col as i32, row as i32));
                let to = self.to_idx(IVec2::new(col as i32, (row - shift) as i32));
                if let Some(block) = self.cells[from].take() {
                    compaction.moved.push((block, delta));
                    self.cells[to] = Some(block);
                }
            }
            self.row_counts[row - shift] = self.row_counts[row];
            self.row_counts[row] = 0;
        }

        self.highest_occupied_row -= compaction.shift;
        compaction
    }

    /// Clears every listed row that is full, then closes the gaps above the lowest
    /// cleared row.
    pub fn clear_full_rows(&mut self, rows: impl IntoIterator<Item = usize>) -> LineClear {
        let mut clear = LineClear::default();
        let mut lowest_cleared = self.highest_occupied_row;

        for row in rows {
            if row >= self.height || !self.is_row_full(row) {
                continue;
            }
            clear.cleared.extend(self.clear_row(row));
            clear.rows += 1;
            lowest_cleared = lowest_cleared.min(row);
        }

        if clear.rows > 0 {
            clear.moved = self.compact(lowest_cleared, self.highest_occupied_row).moved;
        }
        clear
    }

    fn rows(
        &self,
    ) -> impl Iterator<Item = &[BoardCell]>
           + DoubleEndedIterator<Item = &[BoardCell]>
           + ExactSizeIterator<Item = &[BoardCell]>
           + '_ {
        self.cells.chunks(self.width)
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_fmt(format_args!(
            "Board State({} rows, highest {})\n",
            self.rows().len(),
            self.highest_occupied_row
        ))?;
        let spacer = "-".repeat(self.width * 2) + "\n";
        f.write_str(spacer.as_str())?;

        for row in self.rows().take(self.highest_occupied_row).rev() {
            let r = row
                .iter()
                .map(|elem| match elem {
                    Some(_) => "██",
                    None => "..",
                })
                .collect::<String>();

            f.write_str(r.as_str())?;
            f.write_str("\n")?
        }
        f.write_str(spacer.as_str())?;
        Ok(())
    }
}
