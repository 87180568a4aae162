use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Json, Router, routing::get};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};

use crate::construct::{Field, Record, Schema};
use crate::datatype::{RecordId, Value, ValueKind};
use crate::engine::QueryEngine;
use crate::error::PagewiseError;
use crate::filter::{FilterCriteria, Predicate};
use crate::page::{PageRequest, PageResult};
use crate::settings::Settings;
use crate::sort::{Direction, SortSpec};
use crate::source::DataSourceProvider;

#[derive(Clone)]
pub struct AppState {
    provider: Arc<dyn DataSourceProvider>,
    settings: Arc<Settings>,
}

impl AppState {
    pub fn new(provider: Arc<dyn DataSourceProvider>, settings: Settings) -> Self {
        Self {
            provider,
            settings: Arc::new(settings),
        }
    }
}

#[derive(Serialize)]
struct EntitiesResponse {
    entities: Vec<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    status: u16,
    error: String,
}

pub struct ApiError(PagewiseError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PagewiseError::UnknownEntity(_) => StatusCode::NOT_FOUND,
            e if e.is_caller_error() => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PagewiseError> for ApiError {
    fn from(e: PagewiseError) -> Self {
        ApiError(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let msg = self.0.to_string();
        warn!(%msg, code = %status.as_u16(), "query error");
        let body = ErrorResponse {
            status: status.as_u16(),
            error: msg,
        };
        (status, Json(body)).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([axum::http::Method::GET])
        .allow_headers(Any);
    Router::new()
        .route("/v1", get(list_entities))
        .route("/v1/:entity", get(query_entity))
        .layer(cors)
        .with_state(state)
}

async fn list_entities(State(state): State<AppState>) -> Result<Json<EntitiesResponse>, ApiError> {
    let provider = Arc::clone(&state.provider);
    let entities = tokio::task::spawn_blocking(move || provider.entities())
        .await
        .map_err(|e| PagewiseError::Source(format!("join error: {e}")))??;
    Ok(Json(EntitiesResponse { entities }))
}

async fn query_entity(
    State(state): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<PageResult<Record>>, ApiError> {
    let started = std::time::Instant::now();
    // the engine is synchronous, so queries run on the blocking pool
    let page = tokio::task::spawn_blocking(move || {
        let source = state.provider.source(&entity)?;
        let query = QueryParams::parse(source.schema(), &params, &state.settings)?;
        QueryEngine::new().query(&source, Some(&query.filter), query.sort.as_ref(), query.page)
    })
    .await
    .map_err(|e| PagewiseError::Source(format!("join error: {e}")))??;
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    info!(
        ms = elapsed_ms,
        returned = page.items().len(),
        total = page.total_records(),
        "query complete"
    );
    Ok(Json(page))
}

// ------------- QueryParams -------------
/// A query string translated against an entity's schema.
///
/// Recognised parameters are `pageNumber`, `pageSize`, `sortBy` and
/// `sortDirection`. Every other parameter filters on the attribute it names:
/// `Name=bike` is a substring match for text attributes and an exact match
/// otherwise, while `Name.exact=`, `ListPrice.min=` and `ListPrice.max=`
/// pick the predicate explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryParams {
    pub filter: FilterCriteria,
    pub sort: Option<SortSpec>,
    pub page: PageRequest,
}

impl QueryParams {
    pub fn parse(schema: &Schema, params: &[(String, String)], settings: &Settings) -> Result<Self, PagewiseError> {
        let mut page_number = None;
        let mut page_size = None;
        let mut sort_by = None;
        let mut direction = None;
        let mut filter = FilterCriteria::new();
        let mut ranges: BTreeMap<String, (Bound<Value>, Bound<Value>)> = BTreeMap::new();

        for (key, raw) in params {
            match key.as_str() {
                "pageNumber" => page_number = Some(parse_number(key, raw)?),
                "pageSize" => page_size = Some(parse_number(key, raw)?),
                "sortBy" => sort_by = Some(raw.clone()),
                "sortDirection" => direction = Some(raw.parse::<Direction>()?),
                _ => {
                    let (name, operator) = match key.rsplit_once('.') {
                        Some((name, operator)) => (name, Some(operator)),
                        None => (key.as_str(), None),
                    };
                    let field = schema.resolve(name)?;
                    let duplicate = || {
                        PagewiseError::InvalidArgument(format!("more than one filter given for '{name}'"))
                    };
                    if filter.get(name).is_some() {
                        return Err(duplicate());
                    }
                    match operator {
                        None | Some("exact") if ranges.contains_key(name) => return Err(duplicate()),
                        None => {
                            let predicate = match field.kind() {
                                Some(ValueKind::Text) => Predicate::contains(raw.as_str()),
                                _ => Predicate::Exact(parse_value(field, raw)?),
                            };
                            filter.insert(name, predicate);
                        }
                        Some("exact") => {
                            filter.insert(name, Predicate::Exact(parse_value(field, raw)?));
                        }
                        Some("min") => {
                            let bounds = ranges.entry(name.to_string()).or_insert((Bound::Unbounded, Bound::Unbounded));
                            if !matches!(bounds.0, Bound::Unbounded) {
                                return Err(duplicate());
                            }
                            bounds.0 = Bound::Included(parse_value(field, raw)?);
                        }
                        Some("max") => {
                            let bounds = ranges.entry(name.to_string()).or_insert((Bound::Unbounded, Bound::Unbounded));
                            if !matches!(bounds.1, Bound::Unbounded) {
                                return Err(duplicate());
                            }
                            bounds.1 = Bound::Included(parse_value(field, raw)?);
                        }
                        Some(other) => {
                            return Err(PagewiseError::InvalidArgument(format!(
                                "unknown filter operator '{other}' in '{key}'"
                            )));
                        }
                    }
                }
            }
        }
        for (name, (lower, upper)) in ranges {
            filter.insert(name, Predicate::range(lower, upper));
        }
        let sort = match (sort_by, direction) {
            (Some(attribute), direction) => Some(SortSpec::new(attribute, direction.unwrap_or_default())),
            (None, Some(direction)) => Some(SortSpec::new(schema.identifier(), direction)),
            (None, None) => None,
        };
        Ok(QueryParams {
            filter,
            sort,
            page: settings.page_request(page_number, page_size)?,
        })
    }
}

fn parse_number(key: &str, raw: &str) -> Result<i64, PagewiseError> {
    raw.trim()
        .parse()
        .map_err(|_| PagewiseError::InvalidArgument(format!("{key} must be an integer, got '{raw}'")))
}

fn parse_value(field: Field<'_>, raw: &str) -> Result<Value, PagewiseError> {
    match field.kind() {
        Some(kind) => Value::parse(kind, raw),
        None => Ok(RecordId::parse(raw).to_value()),
    }
}
