pub mod manager;

pub use manager::{AlarmScheduler, NewAlarm};
