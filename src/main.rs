mod config;
mod tetris_block;

use bevy::prelude::*;

use config::GameConfig;
use tetris_block::TetrisBlockPlugin;

fn main() -> anyhow::Result<()> {
    let config = GameConfig::load()?;

    App::new()
        .insert_resource(WindowDescriptor {
            width: config.columns as f32 * config.cell_side_len,
            height: config.grid_height() as f32 * config.cell_side_len,
            title: "Falling Blocks".to_string(),
            resizable: false,
            decorations: true,
            ..default()
        })
        .insert_resource(ClearColor(Color::rgb(0.5, 0.5, 0.5)))
        .insert_resource(config)
        .add_startup_system(setup_camera)
        .add_plugins(DefaultPlugins)
        .add_plugin(TetrisBlockPlugin)
        .run();

    Ok(())
}

fn setup_camera(mut commands: Commands) {
    commands.spawn_bundle(OrthographicCameraBundle::new_2d());
}
