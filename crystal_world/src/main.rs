use anyhow::Result;
use arcade2d::{Engine, StateMachine};
use crystal_world::{GameConfig, PreloadScene};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = GameConfig::load()?;
    let window = config.window.clone();
    log::info!("starting {} ({}x{})", window.title, window.width, window.height);

    Engine::new()
        .with_title(window.title)
        .with_size(window.width, window.height)
        .with_vsync(window.vsync)
        .run(StateMachine::with_initial_state(Box::new(PreloadScene::new(config))))
}
