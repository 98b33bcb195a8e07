//! Stopwatch API methods

use serde_json::Value;
use std::sync::Arc;

use super::{ApiError, Result};
use crate::stopwatch::StopwatchManager;

pub async fn start(manager: &Arc<StopwatchManager>) -> Result<Value> {
    let status = manager
        .start()
        .await
        .map_err(|e| ApiError::Stopwatch(e.to_string()))?;
    Ok(serde_json::to_value(&status)?)
}

pub async fn pause(manager: &Arc<StopwatchManager>) -> Result<Value> {
    let status = manager
        .pause()
        .await
        .map_err(|e| ApiError::Stopwatch(e.to_string()))?;
    Ok(serde_json::to_value(&status)?)
}

pub async fn lap(manager: &Arc<StopwatchManager>) -> Result<Value> {
    let lap = manager
        .add_lap()
        .await
        .map_err(|e| ApiError::Stopwatch(e.to_string()))?;
    Ok(serde_json::to_value(&lap)?)
}

pub async fn reset(manager: &Arc<StopwatchManager>) -> Result<Value> {
    Ok(serde_json::to_value(manager.reset().await)?)
}

pub async fn get(manager: &Arc<StopwatchManager>) -> Result<Value> {
    Ok(serde_json::to_value(manager.status().await)?)
}
