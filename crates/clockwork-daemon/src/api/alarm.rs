//! Alarm API methods

use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;

use clockwork_core::models::RecurrenceKind;

use super::{ApiError, Result, parse_params};
use crate::alarm::{AlarmScheduler, NewAlarm};

#[derive(Debug, Deserialize)]
struct AlarmIdParams {
    alarm_id: String,
}

#[derive(Debug, Deserialize)]
struct SetRecurrenceParams {
    alarm_id: String,
    recurrence: RecurrenceKind,
    #[serde(default)]
    days: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ToggleDayParams {
    alarm_id: String,
    day: u8,
}

pub async fn add(scheduler: &Arc<AlarmScheduler>, params: Option<Value>) -> Result<Value> {
    let params: NewAlarm = parse_params(params)?;

    let alarm = scheduler
        .add(params)
        .await
        .map_err(|e| ApiError::Alarm(e.to_string()))?;

    Ok(serde_json::to_value(&alarm)?)
}

pub async fn list(scheduler: &Arc<AlarmScheduler>) -> Result<Value> {
    let alarms = scheduler.list().await;
    Ok(json!({ "alarms": alarms }))
}

pub async fn toggle(scheduler: &Arc<AlarmScheduler>, params: Option<Value>) -> Result<Value> {
    let params: AlarmIdParams = parse_params(params)?;

    let alarm = scheduler
        .toggle(&params.alarm_id)
        .await
        .map_err(|e| ApiError::Alarm(e.to_string()))?;

    Ok(serde_json::to_value(&alarm)?)
}

pub async fn delete(scheduler: &Arc<AlarmScheduler>, params: Option<Value>) -> Result<Value> {
    let params: AlarmIdParams = parse_params(params)?;
    let deleted = scheduler.delete(&params.alarm_id).await;
    Ok(json!({ "deleted": deleted }))
}

pub async fn set_recurrence(
    scheduler: &Arc<AlarmScheduler>,
    params: Option<Value>,
) -> Result<Value> {
    let params: SetRecurrenceParams = parse_params(params)?;

    let alarm = scheduler
        .set_recurrence(&params.alarm_id, params.recurrence, &params.days)
        .await
        .map_err(|e| ApiError::Alarm(e.to_string()))?;

    Ok(serde_json::to_value(&alarm)?)
}

pub async fn toggle_day(scheduler: &Arc<AlarmScheduler>, params: Option<Value>) -> Result<Value> {
    let params: ToggleDayParams = parse_params(params)?;

    let alarm = scheduler
        .toggle_day(&params.alarm_id, params.day)
        .await
        .map_err(|e| ApiError::Alarm(e.to_string()))?;

    Ok(serde_json::to_value(&alarm)?)
}
