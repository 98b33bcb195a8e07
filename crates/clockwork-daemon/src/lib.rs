//! Clockwork daemon library
//!
//! World clocks, alarms, a countdown and a stopwatch driven by one shared
//! scheduler, served over JSON-RPC on a Unix socket.

pub mod alarm;
pub mod api;
pub mod config;
pub mod countdown;
pub mod daemon;
pub mod event_manager;
pub mod events;
pub mod ipc;
pub mod notify;
pub mod scheduler;
pub mod stopwatch;
pub mod world_clock;

pub use alarm::AlarmScheduler;
pub use api::ApiHandler;
pub use config::ConfigManager;
pub use countdown::CountdownManager;
pub use daemon::Daemon;
pub use event_manager::EventManager;
pub use events::DaemonEvent;
pub use ipc::{IpcServer, Notification, Request, Response};
pub use notify::{DesktopNotifier, MemoryNotifier, Notifier, Permission};
pub use scheduler::{Clock, ManualClock, Scheduler, SystemClock, Tick, TickHandle};
pub use stopwatch::StopwatchManager;
pub use world_clock::ClockRegistry;
