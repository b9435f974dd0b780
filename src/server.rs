use crate::config::AppConfig;
use crate::map::Shape;
use crate::render;
use crate::types::NeighborhoodSummary;
use crate::ui::{EventRequest, EventResponse, Interaction, Scene};
use anyhow::Result;
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{get, post},
    Router,
};
use geo::algorithm::contains::Contains;
use geo::bounding_rect::BoundingRect;
use geo::Point;
use rstar::{RTree, RTreeObject, AABB};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tracing::{info, warn};

// Wrapper for RTree indexing
pub struct ShapeIndex {
    id: usize,
    aabb: AABB<[f64; 2]>,
}

impl RTreeObject for ShapeIndex {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        self.aabb
    }
}

pub struct AppState {
    pub scene: Scene,
    pub tree: RTree<ShapeIndex>,
    pub ui: Mutex<Interaction>,
    pub page: String,
}

impl AppState {
    pub fn new(scene: Scene) -> Self {
        let tree = build_index(&scene.map.shapes);
        let page = render::page(&scene);
        Self {
            scene,
            tree,
            ui: Mutex::new(Interaction::new()),
            page,
        }
    }

    /// Neighborhood whose projected shape contains the map canvas point.
    pub fn locate(&self, x: f64, y: f64) -> Option<NeighborhoodSummary> {
        let point = Point::new(x, y);
        let envelope = AABB::from_point([x, y]);

        self.tree
            .locate_in_envelope_intersecting(&envelope)
            .filter_map(|candidate| self.scene.map.shape(candidate.id))
            .find(|shape| shape.projected.contains(&point))
            .and_then(|shape| self.scene.neighborhoods.get(shape.id))
            .map(NeighborhoodSummary::from)
    }
}

pub fn build_index(shapes: &[Shape]) -> RTree<ShapeIndex> {
    let items = shapes
        .iter()
        .filter_map(|shape| {
            let rect = shape.projected.bounding_rect()?;
            Some(ShapeIndex {
                id: shape.id,
                aabb: AABB::from_corners(
                    [rect.min().x, rect.min().y],
                    [rect.max().x, rect.max().y],
                ),
            })
        })
        .collect();
    RTree::bulk_load(items)
}

#[derive(Deserialize)]
pub struct QueryParams {
    x: f64,
    y: f64,
}

pub fn router(state: Arc<AppState>, output_dir: &std::path::Path) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/api/event", post(event_handler))
        .route("/api/query", get(query_handler))
        .nest_service("/output", ServeDir::new(output_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn start_server(config: AppConfig, scene: Scene) -> Result<()> {
    info!("Building spatial index for {} shapes...", scene.map.shapes.len());
    let state = Arc::new(AppState::new(scene));

    let addr = SocketAddr::from(([127, 0, 0, 1], config.server.port));
    info!("Starting server on http://{}", addr);

    let app = router(state, &config.output.dir);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn poisoned<T>(_: T) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, "interaction state poisoned".to_string())
}

/// A freshly loaded page shows every shape at its base fill with no chart, so
/// the interaction starts over to match it.
async fn index_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Html<String>, (StatusCode, String)> {
    *state.ui.lock().map_err(poisoned)? = Interaction::new();
    Ok(Html(state.page.clone()))
}

async fn event_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<EventRequest>,
) -> Result<Json<EventResponse>, (StatusCode, String)> {
    let mut ui = state.ui.lock().map_err(poisoned)?;

    let result = ui.handle_request(&state.scene, request);
    result.map(Json).map_err(|e| {
        warn!("Rejected {:?}: {}", request.event, e);
        (StatusCode::NOT_FOUND, e.to_string())
    })
}

async fn query_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QueryParams>,
) -> Json<Option<NeighborhoodSummary>> {
    Json(state.locate(params.x, params.y))
}
