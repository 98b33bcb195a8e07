//! Command line front end for the Clockwork daemon

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use clockwork_client::ClockworkClient;
use clockwork_core::models::{
    Alarm, CountdownStatus, DaemonConfig, DisplaySettings, LapEntry, StopwatchStatus,
    TimeZoneEntry, ZoneComparison,
};
use clockwork_core::storage::{ConfigStorage, get_config_dir};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "clockwork")]
#[command(about = "World clocks, alarms and timers from the terminal", long_about = None)]
struct Cli {
    /// Daemon socket (defaults to the configured path)
    #[arg(short, long, global = true)]
    socket: Option<String>,

    /// Print raw JSON results
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// World clock cards
    #[command(subcommand)]
    Zones(ZonesCommand),
    /// Alarms
    #[command(subcommand)]
    Alarm(AlarmCommand),
    /// Countdown timer
    #[command(subcommand)]
    Timer(TimerCommand),
    /// Stopwatch
    #[command(subcommand)]
    Stopwatch(StopwatchCommand),
    /// Display settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Print daemon events as they happen
    Watch,
}

#[derive(Subcommand, Debug)]
enum ZonesCommand {
    /// Search the zone directory by city or country
    Search { query: Option<String> },
    /// Show tracked zones
    List,
    /// Track one or more IANA zones
    Add {
        #[arg(required = true)]
        zones: Vec<String>,
    },
    /// Stop tracking a zone
    Remove { zone_id: String },
    /// Time difference of TO relative to FROM
    Compare { from_id: String, to_id: String },
}

#[derive(Subcommand, Debug)]
enum AlarmCommand {
    /// Add an alarm at HH:MM
    Add {
        time: String,
        /// once, daily or weekly
        #[arg(short, long)]
        repeat: Option<String>,
        /// IANA zone or "local"
        #[arg(short = 'z', long)]
        time_zone: Option<String>,
        /// Weekdays for weekly alarms, e.g. mon,wed or 1,3
        #[arg(short, long, value_delimiter = ',', value_parser = parse_day)]
        days: Vec<u8>,
    },
    List,
    /// Switch an alarm on or off
    Toggle { alarm_id: String },
    Delete { alarm_id: String },
    /// Change how an alarm repeats
    Recurrence {
        alarm_id: String,
        repeat: String,
        #[arg(short, long, value_delimiter = ',', value_parser = parse_day)]
        days: Vec<u8>,
    },
    /// Add or remove one weekday of a weekly alarm
    Day {
        alarm_id: String,
        #[arg(value_parser = parse_day)]
        day: u8,
    },
}

#[derive(Subcommand, Debug)]
enum TimerCommand {
    /// Configure the countdown duration
    Set {
        #[arg(short = 'H', long, default_value_t = 0)]
        hours: u32,
        #[arg(short = 'M', long, default_value_t = 0)]
        minutes: u32,
        #[arg(short = 'S', long, default_value_t = 0)]
        seconds: u32,
    },
    Start,
    Pause,
    Lap,
    Reset,
    Status,
}

#[derive(Subcommand, Debug)]
enum StopwatchCommand {
    Start,
    Pause,
    Lap,
    Reset,
    Status,
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    Show,
    /// Set or toggle the hour format (h12, h24)
    HourFormat { value: Option<String> },
    /// Set or toggle the theme (light, dark)
    Theme { value: Option<String> },
}

const DAY_NAMES: [&str; 7] = ["sun", "mon", "tue", "wed", "thu", "fri", "sat"];

fn parse_day(value: &str) -> std::result::Result<u8, String> {
    let value = value.trim().to_lowercase();
    if let Ok(day) = value.parse::<u8>() {
        return if day <= 6 {
            Ok(day)
        } else {
            Err(format!("day {} out of range 0-6", day))
        };
    }
    DAY_NAMES
        .iter()
        .position(|name| value.starts_with(name))
        .map(|index| index as u8)
        .ok_or_else(|| format!("unknown day '{}'", value))
}

fn default_socket() -> String {
    let path = get_config_dir().join("config.json");
    if path.exists()
        && let Ok(config) = ConfigStorage::at_path(path).load()
    {
        return config.daemon.socket_path;
    }
    DaemonConfig::default().socket_path
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).context("Unexpected response from daemon")
}

fn print_zone(entry: &TimeZoneEntry) {
    let icon = if entry.is_daytime { "day  " } else { "night" };
    let place = if entry.country.is_empty() {
        entry.city.clone()
    } else {
        format!("{}, {}", entry.city, entry.country)
    };
    println!(
        "{}  {}  UTC{}  {}  {}",
        entry.id, entry.current_time, entry.offset, icon, place
    );
}

fn print_alarm(alarm: &Alarm) {
    let state = if alarm.is_active { "on " } else { "off" };
    let repeat = match alarm.recurrence.days() {
        Some(days) => days
            .iter()
            .map(|day| DAY_NAMES[usize::from(day)])
            .collect::<Vec<_>>()
            .join(","),
        None => format!("{:?}", alarm.recurrence.kind()).to_lowercase(),
    };
    let next = alarm
        .next_due
        .map(|due| due.with_timezone(&chrono::Local).format("%a %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "{}  {}  [{}]  {}  {}  next: {}",
        alarm.id, alarm.time, state, repeat, alarm.time_zone, next
    );
}

fn print_laps(laps: &[LapEntry]) {
    for lap in laps {
        println!("  lap {:>3}  {}  (+{})", lap.number, lap.cumulative, lap.split);
    }
}

fn print_countdown(status: &CountdownStatus) {
    println!(
        "{}  {:?}  {:.0}%",
        status.display, status.phase, status.progress
    );
    print_laps(&status.laps);
}

fn print_stopwatch(status: &StopwatchStatus) {
    let state = if status.is_running { "running" } else { "stopped" };
    println!("{}  {}", status.display, state);
    print_laps(&status.laps);
}

fn print_settings(settings: &DisplaySettings) {
    println!(
        "hour format: {:?}  theme: {:?}",
        settings.hour_format, settings.theme
    );
}

async fn run_zones(client: &ClockworkClient, command: ZonesCommand, raw: bool) -> Result<()> {
    let result = match command {
        ZonesCommand::Search { query } => client.zone_directory(query.as_deref()).await?,
        ZonesCommand::List => client.zone_list().await?,
        ZonesCommand::Add { zones } => client.zone_add(&zones).await?,
        ZonesCommand::Remove { zone_id } => client.zone_remove(&zone_id).await?,
        ZonesCommand::Compare { from_id, to_id } => {
            let result = client.zone_compare(&from_id, &to_id).await?;
            if !raw {
                let comparison: ZoneComparison = decode(result)?;
                println!("{}", comparison.delta);
                return Ok(());
            }
            result
        }
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(removed) = result.get("removed") {
        println!("removed: {}", removed);
    } else if result.get("zones").is_some_and(|z| z.get(0).is_some_and(|e| e.get("id").is_some())) {
        let zones: Vec<TimeZoneEntry> = decode(result["zones"].clone())?;
        zones.iter().for_each(print_zone);
    } else if let Some(zones) = result.get("zones").and_then(Value::as_array) {
        for zone in zones {
            println!(
                "{:<32} {}, {}",
                zone["name"].as_str().unwrap_or_default(),
                zone["city"].as_str().unwrap_or_default(),
                zone["country"].as_str().unwrap_or_default()
            );
        }
    }
    Ok(())
}

async fn run_alarm(client: &ClockworkClient, command: AlarmCommand, raw: bool) -> Result<()> {
    let result = match command {
        AlarmCommand::Add {
            time,
            repeat,
            time_zone,
            days,
        } => {
            client
                .alarm_add(&time, repeat.as_deref(), time_zone.as_deref(), &days)
                .await?
        }
        AlarmCommand::List => client.alarm_list().await?,
        AlarmCommand::Toggle { alarm_id } => client.alarm_toggle(&alarm_id).await?,
        AlarmCommand::Delete { alarm_id } => client.alarm_delete(&alarm_id).await?,
        AlarmCommand::Recurrence {
            alarm_id,
            repeat,
            days,
        } => {
            client
                .alarm_set_recurrence(&alarm_id, &repeat, &days)
                .await?
        }
        AlarmCommand::Day { alarm_id, day } => client.alarm_toggle_day(&alarm_id, day).await?,
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else if let Some(alarms) = result.get("alarms") {
        let alarms: Vec<Alarm> = decode(alarms.clone())?;
        if alarms.is_empty() {
            println!("No alarms");
        }
        alarms.iter().for_each(print_alarm);
    } else if let Some(deleted) = result.get("deleted") {
        println!("deleted: {}", deleted);
    } else {
        print_alarm(&decode(result)?);
    }
    Ok(())
}

async fn run_timer(client: &ClockworkClient, command: TimerCommand, raw: bool) -> Result<()> {
    let result = match command {
        TimerCommand::Set {
            hours,
            minutes,
            seconds,
        } => client.countdown_set(hours, minutes, seconds).await?,
        TimerCommand::Start => client.countdown_start().await?,
        TimerCommand::Pause => client.countdown_pause().await?,
        TimerCommand::Lap => {
            let lap = client.countdown_lap().await?;
            if raw {
                println!("{}", serde_json::to_string_pretty(&lap)?);
            } else {
                print_laps(&[decode(lap)?]);
            }
            return Ok(());
        }
        TimerCommand::Reset => client.countdown_reset().await?,
        TimerCommand::Status => client.countdown_get().await?,
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_countdown(&decode(result)?);
    }
    Ok(())
}

async fn run_stopwatch(client: &ClockworkClient, command: StopwatchCommand, raw: bool) -> Result<()> {
    let result = match command {
        StopwatchCommand::Start => client.stopwatch_start().await?,
        StopwatchCommand::Pause => client.stopwatch_pause().await?,
        StopwatchCommand::Lap => {
            let lap = client.stopwatch_lap().await?;
            if raw {
                println!("{}", serde_json::to_string_pretty(&lap)?);
            } else {
                print_laps(&[decode(lap)?]);
            }
            return Ok(());
        }
        StopwatchCommand::Reset => client.stopwatch_reset().await?,
        StopwatchCommand::Status => client.stopwatch_get().await?,
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_stopwatch(&decode(result)?);
    }
    Ok(())
}

async fn run_settings(client: &ClockworkClient, command: SettingsCommand, raw: bool) -> Result<()> {
    let result = match command {
        SettingsCommand::Show => client.settings_get().await?,
        SettingsCommand::HourFormat { value: Some(value) } => {
            client.settings_set_hour_format(&value).await?
        }
        SettingsCommand::HourFormat { value: None } => client.settings_toggle_hour_format().await?,
        SettingsCommand::Theme { value: Some(value) } => client.settings_set_theme(&value).await?,
        SettingsCommand::Theme { value: None } => client.settings_toggle_theme().await?,
    };

    if raw {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_settings(&decode(result)?);
    }
    Ok(())
}

async fn watch(client: &ClockworkClient) -> Result<()> {
    let mut notifications = client.subscribe_notifications().await?;
    eprintln!("Watching {} (Ctrl-C to stop)", client.socket_path());

    loop {
        tokio::select! {
            notification = notifications.recv() => {
                let Some(notification) = notification else {
                    anyhow::bail!("Daemon closed the connection");
                };
                // Stopwatch ticks arrive every few milliseconds
                if notification.method == "stopwatch.event"
                    && notification.params["event_type"]["type"] == "tick"
                {
                    continue;
                }
                println!("{} {}", notification.method, notification.params);
            }
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let socket = cli.socket.unwrap_or_else(default_socket);
    tracing::debug!("Using socket {}", socket);
    let client = ClockworkClient::new(socket);

    match cli.command {
        Command::Zones(command) => run_zones(&client, command, cli.json).await,
        Command::Alarm(command) => run_alarm(&client, command, cli.json).await,
        Command::Timer(command) => run_timer(&client, command, cli.json).await,
        Command::Stopwatch(command) => run_stopwatch(&client, command, cli.json).await,
        Command::Settings(command) => run_settings(&client, command, cli.json).await,
        Command::Watch => watch(&client).await,
    }
}
