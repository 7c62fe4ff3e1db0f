//! HTTP query API over the normalized sales table.
//!
//! Serves the aggregate queries a chart front end calls on every interaction.
//! Rendering is left to the client.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                              |
//! |--------|-------------------|------------------------------------------|
//! | GET    | `/health`         | Health check                             |
//! | GET    | `/api/regions`    | Regions present in the table             |
//! | GET    | `/api/daily`      | Sales per day (`?region=`)               |
//! | GET    | `/api/summary`    | Total / mean / count (`?region=`)        |
//! | GET    | `/api/comparison` | Before/after mean (`?region=&threshold=`)|
//! | POST   | `/api/process`    | Re-run ingestion and reload the table    |
//! | GET    | `/api/logs`       | SSE stream of pipeline logs              |

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio::sync::RwLock;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{
    error_response, ComparisonQuery, ComparisonResponse, DailySalesResponse, ProcessResponse,
    RegionQuery, SummaryResponse,
};
use crate::aggregate::{
    compare_before_after, daily_totals, date_range, filter_by_region, regions, summary_stats,
};
use crate::config::{parse_date, Settings};
use crate::error::{ErrorKind, PipelineError, ServerError, ServerResult};
use crate::models::{RegionFilter, SalesRecord};
use crate::transform::pipeline::{load_sales_table, run_pipeline, PipelineOptions};

/// Shared server state
#[derive(Clone)]
pub struct AppState {
    pub settings: Settings,
    pub table: Arc<RwLock<Vec<SalesRecord>>>,
}

impl AppState {
    pub fn new(settings: Settings, table: Vec<SalesRecord>) -> Self {
        Self {
            settings,
            table: Arc::new(RwLock::new(table)),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, kind) = match &self {
            ServerError::BadRequest(_) => (StatusCode::BAD_REQUEST, "badRequest"),
            ServerError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal"),
            ServerError::Pipeline(e) => match e.kind() {
                ErrorKind::MissingResource => (StatusCode::NOT_FOUND, "missingResource"),
                ErrorKind::EmptyResult => (StatusCode::UNPROCESSABLE_ENTITY, "emptyResult"),
                ErrorKind::MalformedInput => (StatusCode::UNPROCESSABLE_ENTITY, "malformedInput"),
                ErrorKind::Io => (StatusCode::INTERNAL_SERVER_ERROR, "io"),
            },
        };
        (status, Json(error_response(kind, &self.to_string()))).into_response()
    }
}

/// Build the router for a given state
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/regions", get(list_regions))
        .route("/api/daily", get(daily_sales))
        .route("/api/summary", get(summary))
        .route("/api/comparison", get(comparison))
        .route("/api/process", post(process))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(
    settings: Settings,
    table: Vec<SalesRecord>,
) -> Result<(), Box<dyn std::error::Error>> {
    let port = settings.port;
    let app = router(AppState::new(settings, table));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Morsel sales API running on http://localhost:{}", port);
    println!("   GET  /api/daily       - Sales per day");
    println!("   GET  /api/summary     - Summary statistics");
    println!("   GET  /api/comparison  - Before/after price increase");
    println!("   POST /api/process     - Re-run ingestion");
    println!("   GET  /api/logs        - SSE log stream");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    let rows = state.table.read().await.len();
    Json(json!({
        "status": "ok",
        "service": "morsel",
        "version": env!("CARGO_PKG_VERSION"),
        "rows": rows,
    }))
}

async fn list_regions(State(state): State<AppState>) -> Json<Vec<String>> {
    let table = state.table.read().await;
    Json(regions(&table))
}

async fn daily_sales(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> Json<DailySalesResponse> {
    let filter = RegionFilter::from(query.region);
    let table = state.table.read().await;
    let subset = filter_by_region(&table, &filter);

    Json(DailySalesResponse {
        region: filter.to_string(),
        points: daily_totals(&subset),
    })
}

async fn summary(
    State(state): State<AppState>,
    Query(query): Query<RegionQuery>,
) -> Json<SummaryResponse> {
    let filter = RegionFilter::from(query.region);
    let table = state.table.read().await;
    let subset = filter_by_region(&table, &filter);

    Json(SummaryResponse::new(
        filter.to_string(),
        summary_stats(&subset),
        date_range(&subset),
    ))
}

async fn comparison(
    State(state): State<AppState>,
    Query(query): Query<ComparisonQuery>,
) -> ServerResult<Json<ComparisonResponse>> {
    let threshold = match query.threshold.as_deref() {
        Some(raw) => parse_date(raw)
            .map_err(|e| ServerError::BadRequest(format!("threshold '{}': {}", raw, e)))?,
        None => state.settings.threshold_date,
    };

    let filter = RegionFilter::from(query.region);
    let table = state.table.read().await;
    let subset = filter_by_region(&table, &filter);

    Ok(Json(ComparisonResponse::new(
        filter.to_string(),
        threshold,
        compare_before_after(&subset, threshold),
    )))
}

/// Re-run ingestion; the table is replaced only on success.
async fn process(State(state): State<AppState>) -> ServerResult<Json<ProcessResponse>> {
    let options = PipelineOptions {
        data_dir: state.settings.data_dir.clone(),
        output_file: state.settings.output_file.clone(),
    };

    log_info(format!("🔄 Reprocessing {}", options.data_dir.display()));
    let output = tokio::task::spawn_blocking(move || run_pipeline(&options))
        .await
        .map_err(|e| ServerError::Internal(e.to_string()))?
        .map_err(ServerError::from)?;

    let response = ProcessResponse::from(&output);
    *state.table.write().await = output.records;

    Ok(Json(response))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Load the artifact for serving, with a hint when it is absent.
pub fn load_for_serving(settings: &Settings) -> Result<Vec<SalesRecord>, PipelineError> {
    load_sales_table(&settings.output_file).map_err(|e| {
        if e.kind() == ErrorKind::MissingResource {
            log_error(format!(
                "{} not found! Run `morsel process` first.",
                settings.output_file.display()
            ));
        }
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use tempfile::tempdir;

    fn record(sales: &str, date: (i32, u32, u32), region: &str) -> SalesRecord {
        SalesRecord::new(
            Decimal::from_str(sales).unwrap(),
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            region,
        )
    }

    fn state() -> AppState {
        AppState::new(
            Settings::default(),
            vec![
                record("10.00", (2021, 1, 10), "north"),
                record("7.50", (2021, 1, 20), "south"),
            ],
        )
    }

    fn region(value: &str) -> Query<RegionQuery> {
        Query(RegionQuery {
            region: Some(value.to_string()),
        })
    }

    #[tokio::test]
    async fn test_daily_all_regions() {
        let Json(response) = daily_sales(State(state()), region("all")).await;
        assert_eq!(response.region, "all");
        assert_eq!(response.points.len(), 2);
        assert!(response.points[0].date < response.points[1].date);
    }

    #[tokio::test]
    async fn test_unknown_region_is_empty_not_error() {
        let Json(response) = summary(State(state()), region("east")).await;
        assert_eq!(response.transaction_count, 0);
        assert_eq!(response.mean_sale, None);
    }

    #[tokio::test]
    async fn test_comparison_default_threshold() {
        let query = Query(ComparisonQuery::default());
        let Json(response) = comparison(State(state()), query).await.unwrap();
        assert_eq!(response.comparison.percent_change(), Some(Decimal::from(-25)));
        assert!(response.headline.contains("LOWER"));
    }

    #[tokio::test]
    async fn test_comparison_bad_threshold() {
        let query = Query(ComparisonQuery {
            region: None,
            threshold: Some("yesterday".into()),
        });
        let err = comparison(State(state()), query).await.unwrap_err();
        assert!(matches!(err, ServerError::BadRequest(_)));
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_process_swaps_table() {
        let data = tempdir().unwrap();
        std::fs::write(
            data.path().join("a.csv"),
            "product,quantity,price,date,region\npink morsel,2,$3.00,2021-02-01,east\n",
        )
        .unwrap();

        let settings = Settings {
            data_dir: data.path().to_path_buf(),
            output_file: data.path().join("formatted.csv"),
            ..Settings::default()
        };
        let state = AppState::new(settings, Vec::new());

        let Json(response) = process(State(state.clone())).await.unwrap();
        assert_eq!(response.row_count, 1);
        assert_eq!(state.table.read().await.len(), 1);

        let Json(names) = list_regions(State(state)).await;
        assert_eq!(names, vec!["east"]);
    }

    #[test]
    fn test_load_for_serving_missing_artifact() {
        let dir = tempdir().unwrap();
        let settings = Settings {
            output_file: dir.path().join("absent.csv"),
            ..Settings::default()
        };
        let err = load_for_serving(&settings).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingResource);
    }

    #[tokio::test]
    async fn test_process_failure_keeps_table() {
        let data = tempdir().unwrap();
        let settings = Settings {
            data_dir: data.path().join("missing"),
            output_file: data.path().join("formatted.csv"),
            ..Settings::default()
        };
        let state = AppState::new(settings, vec![record("1.00", (2021, 1, 1), "west")]);

        let err = process(State(state.clone())).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(state.table.read().await.len(), 1);
    }
}
