pub mod types;
pub mod config;
pub mod data;
pub mod layout;
pub mod scale;
pub mod svg;
pub mod projection;
pub mod legend;
pub mod map;
pub mod chart;
pub mod ui;
pub mod render;
pub mod server;

use anyhow::Result;

/// Load the configured data and build everything that is drawn, ready for
/// writing to disk or serving.
pub fn build_scene(config: &config::AppConfig) -> Result<ui::Scene> {
    let neighborhoods = data::load_data(config)?;
    let layout = layout::Layout::from_display(&config.display)?;
    let map = map::ChoroplethMap::build(&neighborhoods, layout.map, config.legend.price_step)?;
    Ok(ui::Scene { neighborhoods, map, layout })
}
