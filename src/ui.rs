//! Pointer interaction on the map and the chart.
//!
//! The page reports pointer events; [`Interaction::handle`] updates the UI
//! state and answers with the attribute patches, tooltip and chart changes
//! the page should apply. Shape fills are always derived from `selected`,
//! never read back from what is painted.

use crate::chart::{Bar, BarChart};
use crate::layout::Layout;
use crate::map::{ChoroplethMap, Shape};
use crate::types::Neighborhood;
use anyhow::{Result, anyhow};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const HIGHLIGHT: &str = "yellow";
pub const SHAPE_FADE_MS: u64 = 500;
pub const BAR_FADE_MS: u64 = 500;
pub const LABEL_FADE_MS: u64 = 400;
pub const HOVER_OPACITY: f64 = 0.5;
pub const TOOLTIP_OFFSET: (f64, f64) = (20.0, -30.0);

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PointerEvent {
    ShapeEnter { id: usize, page_x: f64, page_y: f64 },
    ShapeLeave { id: usize },
    ShapeClick { id: usize },
    BarEnter { key: f64 },
    BarLeave { key: f64 },
}

impl PointerEvent {
    fn is_hover(&self) -> bool {
        !matches!(self, PointerEvent::ShapeClick { .. })
    }
}

/// A pointer event as posted by the page, numbered in the order it fired.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct EventRequest {
    pub seq: u64,
    #[serde(flatten)]
    pub event: PointerEvent,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventResponse {
    pub seq: u64,
    #[serde(flatten)]
    pub effects: Effects,
}

/// Set `attribute` on element `target`, transitioning over `duration_ms`
/// (0 means immediately).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patch {
    pub target: String,
    pub attribute: &'static str,
    pub value: String,
    pub duration_ms: u64,
}

impl Patch {
    fn fill(id: usize, value: String) -> Self {
        Self { target: Shape::element_id(id), attribute: "fill", value, duration_ms: 0 }
    }

    fn opacity(target: String, value: f64, duration_ms: u64) -> Self {
        Self { target, attribute: "opacity", value: value.to_string(), duration_ms }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tooltip {
    pub visible: bool,
    pub left: f64,
    pub top: f64,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ChartChange {
    Clear,
    Show { svg: String },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Effects {
    pub patches: Vec<Patch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tooltip: Option<Tooltip>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartChange>,
}

/// Immutable inputs the interaction reads from.
#[derive(Debug, Clone)]
pub struct Scene {
    pub neighborhoods: Vec<Neighborhood>,
    pub map: ChoroplethMap,
    pub layout: Layout,
}

impl Scene {
    pub fn neighborhood(&self, id: usize) -> Result<&Neighborhood> {
        self.neighborhoods
            .get(id)
            .filter(|n| n.id == id)
            .ok_or_else(|| anyhow!("unknown neighborhood id {}", id))
    }
}

#[derive(Debug, Default)]
pub struct Interaction {
    selected: Option<usize>,
    chart: Option<BarChart>,
    tooltip: Tooltip,
    /// Highest sequence number of a hover event applied so far.
    hover_seq: Option<u64>,
}

impl Interaction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn chart(&self) -> Option<&BarChart> {
        self.chart.as_ref()
    }

    pub fn tooltip(&self) -> &Tooltip {
        &self.tooltip
    }

    /// Current fill of a shape: the highlight when selected, its price
    /// color otherwise.
    pub fn fill(&self, scene: &Scene, id: usize) -> Result<String> {
        if self.selected == Some(id) {
            return Ok(HIGHLIGHT.to_string());
        }
        scene
            .map
            .shape(id)
            .map(|s| s.base_fill.to_string())
            .ok_or_else(|| anyhow!("unknown neighborhood id {}", id))
    }

    /// Like [`Interaction::handle`], but a hover event older than one
    /// already applied is dropped, so a late enter cannot undo a leave.
    pub fn handle_request(
        &mut self,
        scene: &Scene,
        request: EventRequest,
    ) -> Result<EventResponse> {
        let EventRequest { seq, event } = request;
        if event.is_hover() && self.hover_seq.is_some_and(|last| seq <= last) {
            debug!("Dropping stale hover event #{} {:?}", seq, event);
            return Ok(EventResponse { seq, effects: Effects::default() });
        }
        let effects = self.handle(scene, event)?;
        if event.is_hover() {
            self.hover_seq = Some(seq);
        }
        Ok(EventResponse { seq, effects })
    }

    pub fn handle(&mut self, scene: &Scene, event: PointerEvent) -> Result<Effects> {
        match event {
            PointerEvent::ShapeEnter { id, page_x, page_y } => {
                let n = scene.neighborhood(id)?;
                self.tooltip = Tooltip {
                    visible: true,
                    left: page_x + TOOLTIP_OFFSET.0,
                    top: page_y + TOOLTIP_OFFSET.1,
                    text: format!("{}: {}", n.name, n.avg_price),
                };
                Ok(Effects {
                    patches: vec![Patch::opacity(
                        Shape::element_id(id),
                        HOVER_OPACITY,
                        SHAPE_FADE_MS,
                    )],
                    tooltip: Some(self.tooltip.clone()),
                    chart: None,
                })
            }
            PointerEvent::ShapeLeave { id } => {
                scene.neighborhood(id)?;
                self.tooltip.visible = false;
                Ok(Effects {
                    patches: vec![Patch::opacity(Shape::element_id(id), 1.0, SHAPE_FADE_MS)],
                    tooltip: Some(self.tooltip.clone()),
                    chart: None,
                })
            }
            PointerEvent::ShapeClick { id } => self.click(scene, id),
            PointerEvent::BarEnter { key } => Ok(self.bar_hover(key, true)),
            PointerEvent::BarLeave { key } => Ok(self.bar_hover(key, false)),
        }
    }

    fn click(&mut self, scene: &Scene, id: usize) -> Result<Effects> {
        let neighborhood = scene.neighborhood(id)?;
        self.chart = None;
        let mut effects = Effects { chart: Some(ChartChange::Clear), ..Effects::default() };

        if self.selected == Some(id) {
            self.selected = None;
            effects.patches.push(Patch::fill(id, self.fill(scene, id)?));
            debug!("Deselected {}", neighborhood.name);
            return Ok(effects);
        }

        if let Some(previous) = self.selected.replace(id) {
            effects.patches.push(Patch::fill(previous, self.fill(scene, previous)?));
        }
        effects.patches.push(Patch::fill(id, HIGHLIGHT.to_string()));

        let chart = BarChart::build(neighborhood, scene.layout.chart);
        effects.chart = Some(ChartChange::Show { svg: chart.to_svg() });
        self.chart = Some(chart);
        debug!("Selected {}", neighborhood.name);
        Ok(effects)
    }

    fn bar_hover(&self, key: f64, entering: bool) -> Effects {
        let Some(bar) = self.chart.as_ref().and_then(|c| c.bar(key)) else {
            debug!("Ignoring hover on bar {} that is no longer drawn", key);
            return Effects::default();
        };
        let (bar_opacity, label_opacity) =
            if entering { (HOVER_OPACITY, 1.0) } else { (1.0, 0.0) };
        Effects {
            patches: vec![
                Patch::opacity(Bar::element_id(bar.key), bar_opacity, BAR_FADE_MS),
                Patch::opacity(Bar::label_element_id(bar.key), label_opacity, LABEL_FADE_MS),
            ],
            tooltip: None,
            chart: None,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::layout::Canvas;
    use crate::map::tests::sample;

    pub(crate) fn scene() -> Scene {
        let neighborhoods = sample();
        let layout = Layout {
            map: Canvas { width: 800.0, height: 600.0 },
            chart: Canvas { width: 600.0, height: 500.0 },
        };
        let map = ChoroplethMap::build(&neighborhoods, layout.map, 15.0).unwrap();
        Scene { neighborhoods, map, layout }
    }

    fn click(ui: &mut Interaction, scene: &Scene, id: usize) -> Effects {
        ui.handle(scene, PointerEvent::ShapeClick { id }).unwrap()
    }

    #[test]
    fn click_selects_and_draws_chart() {
        let scene = scene();
        let mut ui = Interaction::new();
        let effects = click(&mut ui, &scene, 0);

        assert_eq!(ui.selected(), Some(0));
        assert_eq!(ui.fill(&scene, 0).unwrap(), HIGHLIGHT);
        assert_eq!(effects.patches, vec![Patch::fill(0, HIGHLIGHT.to_string())]);
        match effects.chart {
            Some(ChartChange::Show { svg }) => assert!(svg.contains(">Sol<")),
            other => panic!("expected a chart, got {:?}", other),
        }
        assert_eq!(ui.chart().map(|c| c.title.as_str()), Some("Sol"));
    }

    #[test]
    fn second_click_deselects() {
        let scene = scene();
        let mut ui = Interaction::new();
        let before = ui.fill(&scene, 1).unwrap();
        click(&mut ui, &scene, 1);
        let effects = click(&mut ui, &scene, 1);

        assert_eq!(ui.selected(), None);
        assert!(ui.chart().is_none());
        assert_eq!(effects.chart, Some(ChartChange::Clear));
        assert_eq!(effects.patches, vec![Patch::fill(1, before.clone())]);
        assert_eq!(ui.fill(&scene, 1).unwrap(), before);
    }

    #[test]
    fn selecting_another_shape_resets_the_previous_one() {
        let scene = scene();
        let mut ui = Interaction::new();
        click(&mut ui, &scene, 0);
        let effects = click(&mut ui, &scene, 2);

        assert_eq!(ui.selected(), Some(2));
        assert_eq!(
            effects.patches,
            vec![
                Patch::fill(0, scene.map.shapes[0].base_fill.to_string()),
                Patch::fill(2, HIGHLIGHT.to_string()),
            ]
        );
        assert_eq!(ui.fill(&scene, 0).unwrap(), "rgb(255, 0, 0)");
        assert_eq!(ui.chart().map(|c| c.title.as_str()), Some("Chamberí"));
    }

    #[test]
    fn hover_shows_tooltip_offset_from_pointer() {
        let scene = scene();
        let mut ui = Interaction::new();
        let effects = ui
            .handle(&scene, PointerEvent::ShapeEnter { id: 2, page_x: 100.0, page_y: 200.0 })
            .unwrap();
        assert_eq!(
            effects.tooltip,
            Some(Tooltip { visible: true, left: 120.0, top: 170.0, text: "Chamberí: 70".into() })
        );
        assert_eq!(effects.patches, vec![Patch::opacity("shape-2".into(), 0.5, SHAPE_FADE_MS)]);

        let effects = ui.handle(&scene, PointerEvent::ShapeLeave { id: 2 }).unwrap();
        assert!(!ui.tooltip().visible);
        assert_eq!(effects.patches, vec![Patch::opacity("shape-2".into(), 1.0, SHAPE_FADE_MS)]);
    }

    #[test]
    fn bar_hover_toggles_label_with_same_key() {
        let scene = scene();
        let mut ui = Interaction::new();
        click(&mut ui, &scene, 0);

        let enter = ui.handle(&scene, PointerEvent::BarEnter { key: 2.0 }).unwrap();
        assert_eq!(
            enter.patches,
            vec![
                Patch::opacity("bar-2".into(), 0.5, BAR_FADE_MS),
                Patch::opacity("text-2".into(), 1.0, LABEL_FADE_MS),
            ]
        );
        let leave = ui.handle(&scene, PointerEvent::BarLeave { key: 2.0 }).unwrap();
        assert_eq!(leave.patches[1], Patch::opacity("text-2".into(), 0.0, LABEL_FADE_MS));
    }

    #[test]
    fn stale_bar_events_are_ignored() {
        let scene = scene();
        let mut ui = Interaction::new();
        let effects = ui.handle(&scene, PointerEvent::BarEnter { key: 1.0 }).unwrap();
        assert_eq!(effects, Effects::default());
    }

    #[test]
    fn unknown_shape_is_an_error() {
        let scene = scene();
        let mut ui = Interaction::new();
        assert!(ui.handle(&scene, PointerEvent::ShapeClick { id: 42 }).is_err());
        assert_eq!(ui.selected(), None);
    }

    #[test]
    fn events_deserialize_from_page_json() {
        let request: EventRequest = serde_json::from_str(
            r#"{"seq":7,"type":"shape_enter","id":1,"page_x":3,"page_y":4}"#,
        )
        .unwrap();
        assert_eq!(request.seq, 7);
        assert_eq!(request.event, PointerEvent::ShapeEnter { id: 1, page_x: 3.0, page_y: 4.0 });
    }

    #[test]
    fn late_enter_cannot_reopen_tooltip_after_leave() {
        let scene = scene();
        let mut ui = Interaction::new();
        let enter = PointerEvent::ShapeEnter { id: 2, page_x: 10.0, page_y: 10.0 };

        // Fired enter (#1) then leave (#2), but the leave is handled first.
        let leave = EventRequest { seq: 2, event: PointerEvent::ShapeLeave { id: 2 } };
        let leave = ui.handle_request(&scene, leave).unwrap();
        assert_eq!(leave.effects.tooltip.map(|t| t.visible), Some(false));

        let late = ui.handle_request(&scene, EventRequest { seq: 1, event: enter }).unwrap();
        assert_eq!(late.seq, 1);
        assert_eq!(late.effects, Effects::default());
        assert!(!ui.tooltip().visible);

        let fresh = ui.handle_request(&scene, EventRequest { seq: 3, event: enter }).unwrap();
        assert_eq!(fresh.effects.tooltip.map(|t| t.visible), Some(true));
    }

    #[test]
    fn clicks_are_never_dropped_as_stale() {
        let scene = scene();
        let mut ui = Interaction::new();
        let leave = EventRequest { seq: 5, event: PointerEvent::ShapeLeave { id: 0 } };
        ui.handle_request(&scene, leave).unwrap();
        let click = EventRequest { seq: 4, event: PointerEvent::ShapeClick { id: 0 } };
        let response = ui.handle_request(&scene, click).unwrap();
        assert!(matches!(response.effects.chart, Some(ChartChange::Show { .. })));
        assert_eq!(ui.selected(), Some(0));
    }
}
