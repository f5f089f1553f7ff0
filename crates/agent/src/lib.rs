//! `tempwatch-agent` -- CPU temperature watchdog with a Telegram bot.
//!
//! Samples the CPU temperature on a fixed schedule, runs each reading
//! through the hysteresis engine from `tempwatch-core` and delivers alerts
//! to a Telegram chat. The same chat can query and control the host through
//! a handful of bot commands.

pub mod announce;
pub mod collector;
pub mod commands;
pub mod config;
pub mod monitor;
pub mod scheduler;
pub mod system;
