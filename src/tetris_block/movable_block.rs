use bevy::math::IVec2;

use super::block_shape::Shape;
use super::board::BlockId;

pub const PIVOT_INDEX: usize = 1;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RotDir {
    Clockwise,
    Anticlockwise,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Cell {
    pub id: BlockId,
    pub pos: IVec2,
}

/// The piece under player control: four blocks of one shape.
#[derive(Debug, Clone)]
pub struct MovableBlock {
    shape: Shape,
    cells: [Cell; 4],
}

impl MovableBlock {
    pub fn new(shape: Shape, positions: [IVec2; 4], first_id: u32) -> MovableBlock {
        let mut next = first_id;
        let cells = positions.map(|pos| {
            let id = BlockId(next);
            next += 1;
            Cell { id, pos }
        });
        MovableBlock { shape, cells }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn cells(&self) -> &[Cell; 4] {
        &self.cells
    }

    pub fn positions(
        &self,
    ) -> impl ExactSizeIterator<Item = IVec2> + DoubleEndedIterator<Item = IVec2> + '_ {
        self.cells.iter().map(|cell| cell.pos)
    }

    pub fn pivot(&self) -> IVec2 {
        self.cells[PIVOT_INDEX].pos
    }

    pub fn at_nudged(&self, by: IVec2) -> [IVec2; 4] {
        self.cells.map(|cell| cell.pos + by)
    }

    /// Rotates every cell a quarter turn around the pivot cell.
    pub fn at_rotated(&self, dir: RotDir) -> [IVec2; 4] {
        let pivot = self.pivot();
        self.cells.map(|cell| pivot + rotate_offset(cell.pos - pivot, dir))
    }

    /// Moves every cell to its new position, returning the per-block deltas.
    pub fn move_to(&mut self, positions: [IVec2; 4]) -> [(BlockId, IVec2); 4] {
        let mut deltas = [(BlockId(0), IVec2::ZERO); 4];
        for (i, (cell, pos)) in self.cells.iter_mut().zip(positions).enumerate() {
            deltas[i] = (cell.id, pos - cell.pos);
            cell.pos = pos;
        }
        deltas
    }
}

pub fn rotate_offset(offset: IVec2, dir: RotDir) -> IVec2 {
    match dir {
        RotDir::Clockwise => IVec2::new(offset.y, -offset.x),
        RotDir::Anticlockwise => IVec2::new(-offset.y, offset.x),
    }
}

#[cfg(test)]
mod test {
    use bevy::math::IVec2;

    use super::{rotate_offset, RotDir};
    use crate::tetris_block::block_shape::Shape;
    use crate::tetris_block::board::BlockId;

    #[test]
    fn ids_are_allocated_in_spawn_order() {
        let block = Shape::S.create_movable(IVec2::new(4, 10), 12);
        let ids: Vec<_> = block.cells().iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![BlockId(12), BlockId(13), BlockId(14), BlockId(15)]);
    }

    #[test]
    fn quarter_turns_compose() {
        let v = IVec2::new(2, 1);
        assert_eq!(rotate_offset(v, RotDir::Clockwise), IVec2::new(1, -2));
        assert_eq!(rotate_offset(v, RotDir::Anticlockwise), IVec2::new(-1, 2));

        let mut w = v;
        for _ in 0..4 {
            w = rotate_offset(w, RotDir::Clockwise);
        }
        assert_eq!(w, v);
        assert_eq!(
            rotate_offset(rotate_offset(v, RotDir::Clockwise), RotDir::Anticlockwise),
            v
        );
    }

    #[test]
    fn t_rotates_around_its_second_cell() {
        let block = Shape::T.create_movable(IVec2::new(5, 10), 0);
        assert_eq!(block.pivot(), IVec2::new(5, 10));

        // T cells: (4,10) (5,10) (5,11) (6,10)
        let cw = block.at_rotated(RotDir::Clockwise);
        assert_eq!(
            cw,
            [
                IVec2::new(5, 11),
                IVec2::new(5, 10),
                IVec2::new(6, 10),
                IVec2::new(5, 9)
            ]
        );

        let ccw = block.at_rotated(RotDir::Anticlockwise);
        assert_eq!(
            ccw,
            [
                IVec2::new(5, 9),
                IVec2::new(5, 10),
                IVec2::new(4, 10),
                IVec2::new(5, 11)
            ]
        );
    }

    #[test]
    fn moving_reports_deltas() {
        let mut block = Shape::Long.create_movable(IVec2::new(4, 5), 0);
        let target = block.at_nudged(IVec2::new(-1, 0));
        let deltas = block.move_to(target);
        assert!(deltas.iter().all(|&(_, d)| d == IVec2::new(-1, 0)));
        assert_eq!(block.positions().next(), Some(IVec2::new(2, 5)));
    }
}
