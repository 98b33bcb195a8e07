//! Countdown API methods

use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, Result, parse_params};
use crate::countdown::CountdownManager;

#[derive(Debug, Deserialize)]
struct SetParams {
    #[serde(default)]
    hours: u32,
    #[serde(default)]
    minutes: u32,
    #[serde(default)]
    seconds: u32,
}

pub async fn set(manager: &Arc<CountdownManager>, params: Option<Value>) -> Result<Value> {
    let params: SetParams = parse_params(params)?;

    let status = manager
        .set_duration(params.hours, params.minutes, params.seconds)
        .await
        .map_err(|e| ApiError::Countdown(e.to_string()))?;

    Ok(serde_json::to_value(&status)?)
}

pub async fn start(manager: &Arc<CountdownManager>) -> Result<Value> {
    let status = manager
        .start()
        .await
        .map_err(|e| ApiError::Countdown(e.to_string()))?;
    Ok(serde_json::to_value(&status)?)
}

pub async fn pause(manager: &Arc<CountdownManager>) -> Result<Value> {
    let status = manager
        .pause()
        .await
        .map_err(|e| ApiError::Countdown(e.to_string()))?;
    Ok(serde_json::to_value(&status)?)
}

pub async fn lap(manager: &Arc<CountdownManager>) -> Result<Value> {
    let lap = manager
        .add_lap()
        .await
        .map_err(|e| ApiError::Countdown(e.to_string()))?;
    Ok(serde_json::to_value(&lap)?)
}

pub async fn reset(manager: &Arc<CountdownManager>) -> Result<Value> {
    Ok(serde_json::to_value(manager.reset().await)?)
}

pub async fn get(manager: &Arc<CountdownManager>) -> Result<Value> {
    Ok(serde_json::to_value(manager.status().await)?)
}
