use tracing::debug;

use crate::error::ChartResult;
use crate::render::RasterContext;

use super::{
    ChartEngine, ChartEngineConfig, chart_model::ChartModel,
    chart_presentation::ChartPresentationState, chart_runtime::ChartRuntimeState,
    engine_core::EngineCore,
};

impl<C: RasterContext> ChartEngine<C> {
    /// Creates an engine with no panes and sizes the context to the
    /// viewport at the configured pixel ratio.
    pub fn new(mut context: C, config: ChartEngineConfig) -> ChartResult<Self> {
        config.validate()?;

        let mut presentation = ChartPresentationState::new(&config)?;
        let (width, height) = presentation.renderer.size();
        presentation
            .renderer
            .resize(&mut context, width, height, config.pixel_ratio)?;
        let runtime = ChartRuntimeState::new(config.resize_throttle_ms);
        let model = ChartModel::new(config)?;

        let mut engine = Self {
            context,
            core: EngineCore {
                model,
                presentation,
                runtime,
            },
        };
        engine.sync_scene_nodes()?;
        debug!(
            width = engine.core.model.viewport.width,
            height = engine.core.model.viewport.height,
            pixel_ratio = engine.core.model.pixel_ratio,
            interval = %engine.core.model.config.interval,
            "chart engine initialized"
        );
        Ok(engine)
    }
}
