use bevy::math::IVec2;
use lazy_static::lazy_static;

use super::movable_block::MovableBlock;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    Long,
    Block,
    T,
    S,
}
impl Shape {
    pub const ALL: [Shape; 4] = [Shape::Long, Shape::Block, Shape::T, Shape::S];

    /// Cell offsets from the spawn anchor, in spawn order. Index 1 is the rotation pivot.
    pub fn offsets(&self) -> &'static [IVec2; 4] {
        match self {
            Shape::Long => &LONG_SHAPE_CONFIG,
            Shape::Block => &BLOCK_SHAPE_CONFIG,
            Shape::T => &T_SHAPE_CONFIG,
            Shape::S => &S_SHAPE_CONFIG,
        }
    }

    pub fn cells_at(&self, anchor: IVec2) -> [IVec2; 4] {
        let offsets = *self.offsets();
        offsets.map(|offset| anchor + offset)
    }

    pub fn create_movable(&self, anchor: IVec2, first_id: u32) -> MovableBlock {
        MovableBlock::new(*self, self.cells_at(anchor), first_id)
    }
}

lazy_static! {
    #[rustfmt::skip]
    static ref LONG_SHAPE_CONFIG: [IVec2; 4] = checked_offsets([
        (-1, 0), (0, 0), (1, 0), (2, 0)
    ]);

    #[rustfmt::skip]
    static ref BLOCK_SHAPE_CONFIG: [IVec2; 4] = checked_offsets([
        (0, 0), (1, 0),
        (1, 1), (0, 1)
    ]);

    #[rustfmt::skip]
    static ref T_SHAPE_CONFIG: [IVec2; 4] = checked_offsets([
        (-1, 0), (0, 0),
        (0, 1),
        (1, 0)
    ]);

    #[rustfmt::skip]
    static ref S_SHAPE_CONFIG: [IVec2; 4] = checked_offsets([
        (-1, 0), (0, 0),
        (0, 1), (1, 1)
    ]);
}

fn checked_offsets(list: [(i32, i32); 4]) -> [IVec2; 4] {
    let offsets = list.map(|(x, y)| IVec2::new(x, y));
    for (i, a) in offsets.iter().enumerate() {
        assert!(
            offsets[i + 1..].iter().all(|b| a != b),
            "shape offsets must be distinct: {:?}",
            list
        );
    }
    offsets
}

#[cfg(test)]
mod test {
    use bevy::math::IVec2;

    use super::Shape;

    fn tuples(cells: [IVec2; 4]) -> Vec<(i32, i32)> {
        cells.iter().map(|c| (c.x, c.y)).collect()
    }

    #[test]
    fn spawn_offsets_match_the_shape_table() {
        let anchor = IVec2::new(4, 29);
        #[rustfmt::skip]
        assert_eq!(tuples(Shape::Long.cells_at(anchor)), vec![(3, 29), (4, 29), (5, 29), (6, 29)]);
        #[rustfmt::skip]
        assert_eq!(tuples(Shape::Block.cells_at(anchor)), vec![(4, 29), (5, 29), (5, 30), (4, 30)]);
        #[rustfmt::skip]
        assert_eq!(tuples(Shape::T.cells_at(anchor)), vec![(3, 29), (4, 29), (4, 30), (5, 29)]);
        #[rustfmt::skip]
        assert_eq!(tuples(Shape::S.cells_at(anchor)), vec![(3, 29), (4, 29), (4, 30), (5, 30)]);
    }

    #[test]
    fn pivot_sits_on_the_anchor_except_for_block() {
        for shape in Shape::ALL {
            let pivot = shape.offsets()[1];
            match shape {
                Shape::Block => assert_eq!(pivot, IVec2::new(1, 0)),
                _ => assert_eq!(pivot, IVec2::ZERO),
            }
        }
    }

    #[test]
    #[should_panic]
    fn duplicate_offsets_are_rejected() {
        super::checked_offsets([(0, 0), (1, 0), (1, 0), (0, 1)]);
    }
}
