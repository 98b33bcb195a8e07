//! World clock API methods

use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use super::{ApiError, Result, parse_optional_params, parse_params};
use crate::world_clock::ClockRegistry;

#[derive(Debug, Default, Deserialize)]
struct DirectoryParams {
    #[serde(default)]
    query: String,
}

#[derive(Debug, Deserialize)]
struct AddParams {
    zones: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ZoneIdParams {
    zone_id: String,
}

#[derive(Debug, Deserialize)]
struct CompareParams {
    from_id: String,
    to_id: String,
}

/// Search the built-in zone directory
pub async fn directory(params: Option<Value>) -> Result<Value> {
    let params: DirectoryParams = parse_optional_params(params)?;
    let zones = ClockRegistry::search(&params.query);
    Ok(json!({ "zones": zones }))
}

pub async fn add(registry: &Arc<ClockRegistry>, params: Option<Value>) -> Result<Value> {
    let params: AddParams = parse_params(params)?;

    let zones = registry
        .add_zones(&params.zones)
        .await
        .map_err(|e| ApiError::Zone(e.to_string()))?;

    Ok(json!({ "zones": zones }))
}

pub async fn remove(registry: &Arc<ClockRegistry>, params: Option<Value>) -> Result<Value> {
    let params: ZoneIdParams = parse_params(params)?;
    let removed = registry.remove_zone(&params.zone_id).await;
    Ok(json!({ "removed": removed }))
}

pub async fn list(registry: &Arc<ClockRegistry>) -> Result<Value> {
    let zones = registry.list().await;
    Ok(json!({ "zones": zones }))
}

pub async fn compare(registry: &Arc<ClockRegistry>, params: Option<Value>) -> Result<Value> {
    let params: CompareParams = parse_params(params)?;

    let comparison = registry
        .compare(&params.from_id, &params.to_id)
        .await
        .map_err(|e| ApiError::Zone(e.to_string()))?;

    Ok(serde_json::to_value(&comparison)?)
}
