use std::{error::Error, fmt, time::Duration};

use bevy::log::{debug, info, warn};
use bevy::math::IVec2;

use crate::config::GameConfig;

use super::board::Board;
use super::events::{BoardEvent, Command};
use super::gravity_timer::GravityTimer;
use super::movable_block::{MovableBlock, RotDir};
use super::shape_generator::{RandomGenerator, ShapeGenerator};

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineState {
    /// Waiting to spawn the next piece.
    Idle,
    Falling,
    /// Merge and row clear in progress.
    Landing,
    GameOver,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Direction {
    Left,
    Right,
    Down,
}
impl Direction {
    fn offset(self) -> IVec2 {
        match self {
            Direction::Left => IVec2::new(-1, 0),
            Direction::Right => IVec2::new(1, 0),
            Direction::Down => IVec2::new(0, -1),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Target cell is outside the grid or already taken.
    InvalidMove,
    NoActivePiece,
    Paused,
    /// The next piece has nowhere to go: game over.
    SpawnBlocked,
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EngineError::InvalidMove => "target cell is out of bounds or occupied",
            EngineError::NoActivePiece => "no piece is falling",
            EngineError::Paused => "game is paused",
            EngineError::SpawnBlocked => "spawn cells are occupied",
        };
        write!(f, "{s}")
    }
}

impl Error for EngineError {}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum MoveOutcome {
    Moved,
    Landed { rows_cleared: usize },
}

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct FrameReport {
    pub spawned: bool,
    pub landings: usize,
    pub rows_cleared: usize,
}

impl FrameReport {
    fn record(&mut self, outcome: MoveOutcome) {
        if let MoveOutcome::Landed { rows_cleared } = outcome {
            self.landings += 1;
            self.rows_cleared += rows_cleared;
        }
    }
}

pub struct Engine<G: ShapeGenerator = RandomGenerator> {
    board: Board,
    active: Option<MovableBlock>,
    state: EngineState,
    paused: bool,
    gravity: GravityTimer,
    generator: G,
    spawn_anchor: IVec2,
    next_block_id: u32,
    lines_cleared: usize,
    events: Vec<BoardEvent>,
}

impl<G: ShapeGenerator> Engine<G> {
    pub fn new(config: &GameConfig, generator: G) -> Engine<G> {
        let columns = config.columns;
        // centred, leaning left on even widths
        let spawn_anchor = IVec2::new(
            (columns / 2 - 1 + columns % 2) as i32,
            (config.rows + 1) as i32,
        );

        Engine {
            board: Board::new(columns, config.grid_height()),
            active: None,
            state: EngineState::Idle,
            paused: false,
            gravity: GravityTimer::new(config.wait_time()),
            generator,
            spawn_anchor,
            next_block_id: 0,
            lines_cleared: 0,
            events: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn board(&self) -> &Board {
        &self.board
    }
    #[cfg(test)]
    pub fn active(&self) -> Option<&MovableBlock> {
        self.active.as_ref()
    }
    #[cfg(test)]
    pub fn state(&self) -> EngineState {
        self.state
    }
    #[cfg(test)]
    pub fn spawn_anchor(&self) -> IVec2 {
        self.spawn_anchor
    }
    #[cfg(test)]
    pub fn lines_cleared(&self) -> usize {
        self.lines_cleared
    }
    #[cfg(test)]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn toggle_pause(&mut self) -> bool {
        self.paused = !self.paused;
        info!("game {}", if self.paused { "paused" } else { "resumed" });
        self.paused
    }

    /// Presentation events queued since the last drain.
    pub fn drain_events(&mut self) -> Vec<BoardEvent> {
        std::mem::take(&mut self.events)
    }

    /// One frame: spawn if needed, apply the player's commands, then let gravity act.
    /// Nothing happens while paused or after the game has ended.
    pub fn update(
        &mut self,
        delta: Duration,
        commands: &[Command],
    ) -> Result<FrameReport, EngineError> {
        let mut report = FrameReport::default();
        if self.paused || self.state == EngineState::GameOver {
            return Ok(report);
        }

        if self.state == EngineState::Idle {
            self.spawn()?;
            report.spawned = true;
        }

        for &command in commands {
            match self.apply(command) {
                Ok(outcome) => report.record(outcome),
                Err(err) => debug!("ignoring {:?}: {}", command, err),
            }
        }

        // time that passed before this frame's spawn does not count against the new piece
        let due = if report.spawned {
            0
        } else {
            self.gravity.tick(delta)
        };
        for _ in 0..due {
            // a landing earlier in this frame stops the timer
            if !self.gravity.is_running() {
                break;
            }
            match self.try_move(Direction::Down) {
                Ok(outcome) => report.record(outcome),
                Err(err) => debug!("gravity step skipped: {}", err),
            }
        }

        Ok(report)
    }

    pub fn apply(&mut self, command: Command) -> Result<MoveOutcome, EngineError> {
        if self.paused {
            return Err(EngineError::Paused);
        }
        match command {
            Command::MoveLeft => self.try_move(Direction::Left),
            Command::MoveRight => self.try_move(Direction::Right),
            Command::RotateCw => self.try_rotate(RotDir::Clockwise),
            Command::RotateCcw => self.try_rotate(RotDir::Anticlockwise),
        }
    }

    pub fn spawn(&mut self) -> Result<(), EngineError> {
        if self.state == EngineState::GameOver {
            return Err(EngineError::SpawnBlocked);
        }
        debug_assert!(self.active.is_none(), "spawning over a falling piece");

        let shape = self.generator.next_shape();
        if !self.board.can_place(shape.cells_at(self.spawn_anchor).into_iter()) {
            warn!("cannot spawn {:?} at {}: game over", shape, self.spawn_anchor);
            self.state = EngineState::GameOver;
            return Err(EngineError::SpawnBlocked);
        }

        let piece = shape.create_movable(self.spawn_anchor, self.next_block_id);
        self.next_block_id += piece.cells().len() as u32;
        for cell in piece.cells() {
            self.events.push(BoardEvent::Spawned {
                block: cell.id,
                shape,
                at: cell.pos,
            });
        }
        debug!("spawned {:?} at {}", shape, self.spawn_anchor);

        self.active = Some(piece);
        self.state = EngineState::Falling;
        self.gravity.start();
        Ok(())
    }

    fn falling_piece(&self) -> Result<&MovableBlock, EngineError> {
        match (&self.active, self.state) {
            (Some(piece), EngineState::Falling) => Ok(piece),
            _ => Err(EngineError::NoActivePiece),
        }
    }

    pub fn try_move(&mut self, direction: Direction) -> Result<MoveOutcome, EngineError> {
        let candidate = self.falling_piece()?.at_nudged(direction.offset());

        if !self.board.can_place(candidate.into_iter()) {
            // a piece that cannot fall any further is resting on something
            if direction == Direction::Down {
                if let Some(rows_cleared) = self.check_landing() {
                    return Ok(MoveOutcome::Landed { rows_cleared });
                }
            }
            return Err(EngineError::InvalidMove);
        }

        self.commit(candidate);
        if direction == Direction::Down {
            if let Some(rows_cleared) = self.check_landing() {
                return Ok(MoveOutcome::Landed { rows_cleared });
            }
        }
        Ok(MoveOutcome::Moved)
    }

    /// Quarter turn around the piece's second cell. All four cells move or none do.
    pub fn try_rotate(&mut self, dir: RotDir) -> Result<MoveOutcome, EngineError> {
        let candidate = self.falling_piece()?.at_rotated(dir);

        if !self.board.can_place(candidate.into_iter()) {
            return Err(EngineError::InvalidMove);
        }

        self.commit(candidate);
        match self.check_landing() {
            Some(rows_cleared) => Ok(MoveOutcome::Landed { rows_cleared }),
            None => Ok(MoveOutcome::Moved),
        }
    }

    fn commit(&mut self, candidate: [IVec2; 4]) {
        if let Some(piece) = self.active.as_mut() {
            for (block, delta) in piece.move_to(candidate) {
                self.events.push(BoardEvent::Moved { block, delta });
            }
        }
    }

    /// Lands the piece if any of its cells sits on the floor or on a landed block.
    /// Returns the number of rows cleared by the landing, `None` if nothing landed.
    pub fn check_landing(&mut self) -> Option<usize> {
        let piece = self.falling_piece().ok()?;
        let below = IVec2::new(0, 1);
        let resting = piece
            .positions()
            .any(|pos| pos.y == 0 || self.board.is_occupied(pos - below));

        if resting {
            Some(self.on_land())
        } else {
            None
        }
    }

    fn on_land(&mut self) -> usize {
        self.state = EngineState::Landing;
        self.gravity.stop();

        let rows_cleared = match self.active.take() {
            Some(piece) => {
                self.merge(&piece);
                self.clear_and_compact(&piece)
            }
            None => 0,
        };

        self.state = EngineState::Idle;
        rows_cleared
    }

    fn merge(&mut self, piece: &MovableBlock) {
        for cell in piece.cells() {
            self.board.place(cell.id, cell.pos);
        }
        debug!("{:?} landed at {:?}", piece.shape(), piece.cells());
    }

    fn clear_and_compact(&mut self, piece: &MovableBlock) -> usize {
        let mut rows: Vec<usize> = piece.positions().map(|pos| pos.y as usize).collect();
        rows.sort_unstable();
        rows.dedup();

        let clear = self.board.clear_full_rows(rows);
        if clear.rows == 0 {
            return 0;
        }

        self.events.extend(
            clear
                .cleared
                .iter()
                .map(|&block| BoardEvent::Destroyed { block }),
        );
        self.events.extend(
            clear
                .moved
                .iter()
                .map(|&(block, delta)| BoardEvent::Moved { block, delta }),
        );
        self.events.push(BoardEvent::RowsCleared(clear.rows));
        self.lines_cleared += clear.rows;
        info!(
            "cleared {} row(s), {} in total",
            clear.rows, self.lines_cleared
        );

        clear.rows
    }

    #[cfg(test)]
    fn board_mut(&mut self) -> &mut Board {
        &mut self.board
    }
}

impl Engine<RandomGenerator> {
    pub fn from_config(config: &GameConfig) -> Self {
        let generator = match config.seed {
            Some(seed) => RandomGenerator::seeded(seed),
            None => RandomGenerator::from_entropy(),
        };
        Engine::new(config, generator)
    }
}

impl<G: ShapeGenerator> fmt::Debug for Engine<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("state", &self.state)
            .field("paused", &self.paused)
            .field("active", &self.active.as_ref().map(MovableBlock::shape))
            .field("lines_cleared", &self.lines_cleared)
            .finish()?;
        write!(f, "\n{:?}", self.board)
    }
}
