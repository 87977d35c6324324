mod block_shape;
mod board;
mod engine;
mod events;
mod gravity_timer;
mod movable_block;
mod shape_generator;

use std::collections::HashMap;

use bevy::prelude::*;

use crate::config::GameConfig;

use self::block_shape::Shape;
use self::board::BlockId;
use self::engine::{Engine, EngineError};
use self::events::{BoardEvent, Command};

/// Flips the pause gate. Sent on Escape, or by anything else that wants to halt play.
pub struct TogglePause;

/// Rows removed by one landing.
pub struct RowsCleared(pub usize);

/// The next piece could not be spawned.
pub struct GameOver;

#[derive(Default)]
pub struct Score {
    pub rows_cleared: usize,
}

/// Commands decoded from this frame's key presses, consumed by the engine step.
#[derive(Default)]
struct PendingCommands(Vec<Command>);

/// Sprite and current grid cell of every block on screen.
#[derive(Default)]
struct BlockSprites(HashMap<BlockId, (Entity, IVec2)>);

#[derive(Component)]
struct TetrisBlock(BlockId);

#[derive(SystemLabel, Debug, Clone, PartialEq, Eq, Hash)]
enum TetrisSystem {
    Input,
    Pause,
    Step,
}

const KEY_BINDINGS: &[(KeyCode, Command)] = &[
    (KeyCode::Left, Command::MoveLeft),
    (KeyCode::Right, Command::MoveRight),
    (KeyCode::A, Command::RotateCw),
    (KeyCode::D, Command::RotateCcw),
];

fn loc_to_translation(loc: IVec2, config: &GameConfig) -> Vec3 {
    let side = config.cell_side_len;
    let screen_dims = Vec2::new(config.columns as f32, config.grid_height() as f32) * side;
    // offset to apply to move center (0, 0) to the bottom left of the screen
    let offset = -screen_dims / 2.;
    let this = Vec2::new(loc.x as f32, loc.y as f32) * side;
    let shifted = this + offset + Vec2::new(side / 2., side / 2.);
    Vec3::new(shifted.x, shifted.y, 0.)
}

pub struct TetrisBlockPlugin;
impl Plugin for TetrisBlockPlugin {
    fn build(&self, app: &mut bevy::prelude::App) {
        let config = match app.world.get_resource::<GameConfig>() {
            Some(config) => config.clone(),
            None => {
                let config = GameConfig::default();
                app.insert_resource(config.clone());
                config
            }
        };
        info!(
            "{}x{} grid, gravity every {:?}",
            config.columns,
            config.rows,
            config.wait_time()
        );

        app.insert_resource(Engine::from_config(&config))
            .init_resource::<PendingCommands>()
            .init_resource::<BlockSprites>()
            .init_resource::<Score>()
            .add_event::<TogglePause>()
            .add_event::<RowsCleared>()
            .add_event::<GameOver>();

        let mut step_simulation = SystemStage::parallel();
        step_simulation
            .add_system(read_player_input.label(TetrisSystem::Input))
            .add_system(
                apply_pause_toggles
                    .label(TetrisSystem::Pause)
                    .after(TetrisSystem::Input),
            )
            .add_system(
                step_engine
                    .label(TetrisSystem::Step)
                    .after(TetrisSystem::Pause),
            )
            .add_system(mirror_board_events.after(TetrisSystem::Step));

        // sprites spawned while mirroring exist once the previous stage has applied its commands
        let mut present_board = SystemStage::parallel();
        present_board
            .add_system(place_block_sprites)
            .add_system(tally_score)
            .add_system(announce_game_over);

        app.add_stage_after(CoreStage::Update, "step_simulation", step_simulation);
        app.add_stage_after("step_simulation", "present_board", present_board);
    }
}

fn read_player_input(
    kb: Res<Input<KeyCode>>,
    mut pending: ResMut<PendingCommands>,
    mut toggle_pause: EventWriter<TogglePause>,
) {
    if kb.just_pressed(KeyCode::Escape) {
        toggle_pause.send(TogglePause);
    }

    for &(key, command) in KEY_BINDINGS {
        if kb.just_pressed(key) {
            pending.0.push(command);
        }
    }
}

fn apply_pause_toggles(mut toggles: EventReader<TogglePause>, mut engine: ResMut<Engine>) {
    for _ in toggles.iter() {
        engine.toggle_pause();
    }
}

fn step_engine(
    time: Res<Time>,
    mut engine: ResMut<Engine>,
    mut pending: ResMut<PendingCommands>,
    mut game_over: EventWriter<GameOver>,
) {
    // commands offered while paused are dropped, not replayed on resume
    let commands = std::mem::take(&mut pending.0);

    match engine.update(time.delta(), &commands) {
        Ok(report) => {
            if report.landings > 0 {
                debug!("{:?}", report);
            }
        }
        Err(EngineError::SpawnBlocked) => game_over.send(GameOver),
        Err(err) => warn!("engine step failed: {}", err),
    }
}

const COLORS: &[Color] = &[Color::CYAN, Color::YELLOW, Color::PURPLE, Color::GREEN];

fn shape_color(shape: Shape) -> Color {
    let idx = Shape::ALL.iter().position(|&s| s == shape).unwrap_or(0);
    COLORS[idx % COLORS.len()]
}

fn at_z_pixel(z: f32) -> Transform {
    Transform {
        translation: Vec3::new(0., 0., z),
        ..default()
    }
}

fn spawn_block_sprite(
    commands: &mut Commands,
    block: BlockId,
    shape: Shape,
    at: IVec2,
    config: &GameConfig,
) -> Entity {
    let color = shape_color(shape);
    let side = config.cell_side_len;

    let big_sprite = || Sprite {
        color,
        custom_size: Some(Vec2::new(side, side)),
        ..default()
    };
    let little_sprite = || Sprite {
        color: color * 0.5,
        custom_size: Some(Vec2::new(side * 0.9, side * 0.9)),
        ..default()
    };

    commands
        .spawn()
        .insert_bundle(TransformBundle::from_transform(Transform::from_translation(
            loc_to_translation(at, config),
        )))
        .with_children(|p| {
            p.spawn_bundle(SpriteBundle {
                sprite: big_sprite(),
                transform: at_z_pixel(10.),
                ..default()
            });
            p.spawn_bundle(SpriteBundle {
                sprite: little_sprite(),
                transform: at_z_pixel(11.),
                ..default()
            });
        })
        .insert(TetrisBlock(block))
        .id()
}

// turn the engine's queued changes into sprite bookkeeping
fn mirror_board_events(
    mut commands: Commands,
    mut engine: ResMut<Engine>,
    mut sprites: ResMut<BlockSprites>,
    config: Res<GameConfig>,
    mut rows_cleared: EventWriter<RowsCleared>,
) {
    for event in engine.drain_events() {
        match event {
            BoardEvent::Spawned { block, shape, at } => {
                let entity = spawn_block_sprite(&mut commands, block, shape, at, &config);
                sprites.0.insert(block, (entity, at));
            }
            BoardEvent::Moved { block, delta } => {
                if let Some((_, loc)) = sprites.0.get_mut(&block) {
                    *loc += delta;
                }
            }
            BoardEvent::Destroyed { block } => {
                if let Some((entity, _)) = sprites.0.remove(&block) {
                    commands.entity(entity).despawn_recursive();
                }
            }
            BoardEvent::RowsCleared(rows) => rows_cleared.send(RowsCleared(rows)),
        }
    }
}

// move the sprites around according to the mirrored grid cells
fn place_block_sprites(
    config: Res<GameConfig>,
    sprites: Res<BlockSprites>,
    mut query: Query<(&TetrisBlock, &mut Transform)>,
) {
    for (block, mut tx) in query.iter_mut() {
        if let Some(&(_, loc)) = sprites.0.get(&block.0) {
            let translation = loc_to_translation(loc, &config);
            if translation != tx.translation {
                tx.translation = translation;
            }
        }
    }
}

fn tally_score(mut cleared: EventReader<RowsCleared>, mut score: ResMut<Score>) {
    for RowsCleared(rows) in cleared.iter() {
        score.rows_cleared += rows;
        info!("score: {} rows", score.rows_cleared);
    }
}

fn announce_game_over(mut game_over: EventReader<GameOver>, score: Res<Score>) {
    for _ in game_over.iter() {
        info!("game over with {} rows cleared", score.rows_cleared);
    }
}

#[cfg(test)]
mod test {
    use bevy::ecs::event::Events;
    use bevy::prelude::*;

    use super::{
        loc_to_translation, BlockSprites, PendingCommands, TetrisBlock, TetrisBlockPlugin,
        TogglePause,
    };
    use crate::config::GameConfig;
    use crate::tetris_block::engine::{Engine, EngineState};
    use crate::tetris_block::events::Command;

    fn app() -> App {
        let mut app = App::new();
        app.insert_resource(GameConfig {
            seed: Some(11),
            ..GameConfig::default()
        })
        .add_plugins(MinimalPlugins)
        .add_plugin(bevy::input::InputPlugin)
        .add_plugin(TetrisBlockPlugin);
        app
    }

    #[test]
    fn bottom_left_cell_sits_in_the_corner() {
        let config = GameConfig {
            columns: 10,
            rows: 17,
            cell_side_len: 10.,
            ..GameConfig::default()
        };
        // 10 x 20 cells of 10 px, centred on the origin
        assert_eq!(loc_to_translation(IVec2::new(0, 0), &config), Vec3::new(-45., -95., 0.));
        assert_eq!(loc_to_translation(IVec2::new(9, 19), &config), Vec3::new(45., 95., 0.));
    }

    #[test]
    fn first_frame_spawns_four_block_sprites() {
        let mut app = app();
        app.update();

        let engine = app.world.get_resource::<Engine>().unwrap();
        assert_eq!(engine.state(), EngineState::Falling);
        assert_eq!(app.world.get_resource::<BlockSprites>().unwrap().0.len(), 4);

        app.update();
        let mut query = app.world.query::<&TetrisBlock>();
        assert_eq!(query.iter(&app.world).count(), 4);
    }

    #[test]
    fn pending_commands_reach_the_engine() {
        let mut app = app();
        app.update();
        let before: Vec<_> = app
            .world
            .get_resource::<Engine>()
            .unwrap()
            .active()
            .unwrap()
            .positions()
            .collect();

        app.world
            .get_resource_mut::<PendingCommands>()
            .unwrap()
            .0
            .push(Command::MoveLeft);
        app.update();

        let after: Vec<_> = app
            .world
            .get_resource::<Engine>()
            .unwrap()
            .active()
            .unwrap()
            .positions()
            .collect();
        assert_eq!(after[1].x, before[1].x - 1);
        assert!(app
            .world
            .get_resource::<PendingCommands>()
            .unwrap()
            .0
            .is_empty());
    }

    #[test]
    fn pause_event_reaches_the_engine() {
        let mut app = app();
        app.update();
        app.world
            .get_resource_mut::<Events<TogglePause>>()
            .unwrap()
            .send(TogglePause);
        app.update();
        assert!(app.world.get_resource::<Engine>().unwrap().is_paused());
    }
}
