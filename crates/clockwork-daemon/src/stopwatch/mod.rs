pub mod manager;

pub use manager::StopwatchManager;
