use bevy::math::IVec2;

use super::block_shape::Shape;
use super::board::BlockId;

/// Discrete player intents, one per key press.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Command {
    MoveLeft,
    MoveRight,
    RotateCw,
    RotateCcw,
}

/// What the presentation layer has to mirror, in the order it happened.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BoardEvent {
    Spawned {
        block: BlockId,
        shape: Shape,
        at: IVec2,
    },
    Moved {
        block: BlockId,
        delta: IVec2,
    },
    Destroyed {
        block: BlockId,
    },
    RowsCleared(usize),
}
