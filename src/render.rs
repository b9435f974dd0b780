use crate::chart::BarChart;
use crate::layout::Canvas;
use crate::svg;
use crate::ui::Scene;
use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::Path;
use tracing::info;

const PAGE_SCRIPT: &str = include_str!("../static/page.js");

const TOOLTIP_STYLE: &str = "visibility:hidden;position:absolute;pointer-events:none;\
background-color:white;border:solid;border-width:1px;border-radius:5px;padding:2px 4px";

/// Write `map.svg`, `index.html` and one `charts/<id>.svg` per neighborhood.
pub fn write_outputs(scene: &Scene, dir: &Path) -> Result<()> {
    let charts_dir = dir.join("charts");
    fs::create_dir_all(&charts_dir)
        .with_context(|| format!("Failed to create output directory: {:?}", charts_dir))?;

    let map_path = dir.join("map.svg");
    fs::write(&map_path, scene.map.to_svg())
        .with_context(|| format!("Failed to write {:?}", map_path))?;

    let page_path = dir.join("index.html");
    fs::write(&page_path, page(scene))
        .with_context(|| format!("Failed to write {:?}", page_path))?;

    scene.neighborhoods.par_iter().try_for_each(|n| {
        let path = charts_dir.join(format!("{}.svg", n.id));
        let chart = BarChart::build(n, scene.layout.chart);
        fs::write(&path, chart.to_svg()).with_context(|| format!("Failed to write {:?}", path))
    })?;

    info!(
        "Wrote map, page and {} charts to {:?}",
        scene.neighborhoods.len(),
        dir
    );
    Ok(())
}

pub fn empty_chart_svg(canvas: Canvas) -> String {
    format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" id=\"chart\" width=\"{}\" height=\"{}\"></svg>",
        svg::num(canvas.width),
        svg::num(canvas.height)
    )
}

/// The interactive page: map canvas, empty chart canvas and tooltip in one
/// container, wired to the event API.
pub fn page(scene: &Scene) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Average rental price by neighborhood</title>\n</head>\n<body>\n\
         <div>\n{}\n<span id=\"chart-container\">{}</span>\n\
         <div id=\"tooltip\" class=\"tooltip\" style=\"{}\"></div>\n</div>\n\
         <script>\n{}</script>\n</body>\n</html>\n",
        scene.map.to_svg(),
        empty_chart_svg(scene.layout.chart),
        TOOLTIP_STYLE,
        PAGE_SCRIPT
    )
}
