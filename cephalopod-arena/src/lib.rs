//! Cephalopod AI 对战
//!
//! 包含:
//! - 对战配置（JSON 持久化）
//! - 对局循环与战绩统计

pub mod arena;
pub mod config;

pub use arena::{Arena, GameReport, Scoreboard};
pub use config::{ArenaConfig, DEFAULT_BLOCKING_THREADS, DEFAULT_MAX_PLIES};
