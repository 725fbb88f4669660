use anyhow::{Context, Result};
use arcade2d::{AssetManager, Canvas, Color, EngineContext, State, StateMachineLike};

use super::PlayScene;
use crate::config::GameConfig;

const LOADING_COLOR: Color = Color::rgb(0x14, 0x14, 0x2b);

/// Loads everything listed in the asset manifest, then hands over to the
/// play scene.
pub struct PreloadScene {
    config: GameConfig,
    /// Taken by the play scene once loading is done.
    assets: Option<AssetManager>,
}

impl PreloadScene {
    pub fn new(config: GameConfig) -> Self {
        Self {
            config,
            assets: Some(AssetManager::new()),
        }
    }
}

impl State for PreloadScene {
    fn on_enter(&mut self, _ctx: &mut EngineContext) -> Result<()> {
        let manifest = self.config.manifest_path();
        let Some(assets) = self.assets.as_mut() else {
            return Ok(());
        };
        assets
            .load_manifest(&manifest)
            .with_context(|| format!("preloading assets from {}", manifest.display()))?;
        Ok(())
    }

    fn update(&mut self, _ctx: &mut EngineContext, state_machine: &mut dyn StateMachineLike) -> Result<()> {
        if let Some(assets) = self.assets.take() {
            state_machine.replace(Box::new(PlayScene::new(self.config.clone(), assets)));
        }
        Ok(())
    }

    fn draw(&mut self, canvas: &mut Canvas<'_>) -> Result<()> {
        canvas.clear(LOADING_COLOR);
        Ok(())
    }

    fn name(&self) -> &str {
        "preload"
    }
}
