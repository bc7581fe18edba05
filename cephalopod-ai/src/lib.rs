//! Cephalopod AI 引擎
//!
//! 包含:
//! - 局面评估函数
//! - Minimax / Alpha-Beta / 记忆化 Alpha-Beta / 截断深度的启发式 Alpha-Beta
//! - 蒙特卡洛树搜索
//! - 随机走子基准
//! - Zobrist 哈希
//! - 有界缓存
//! - 限时执行器

mod config;
mod evaluate;
mod executor;
mod mcts;
mod random;
mod search;
mod transposition;
mod zobrist;

pub use config::{AiConfig, Difficulty, StrategyKind};
pub use evaluate::{Evaluator, EvaluatorKind, FeatureEvaluator, PositionalEvaluator};
pub use executor::{MoveSelection, MoveSource, TimeBoundedExecutor};
pub use mcts::{MctsConfig, MonteCarlo};
pub use random::RandomMove;
pub use search::{
    AlphaBeta, AlphaBetaMemo, CancelToken, Cutoff, HeuristicAlphaBeta, Minimax, SearchError,
    SearchOutcome, Strategy,
};
pub use transposition::{
    BoundedCache, CacheKeyPolicy, CacheStats, SimulationCache, TranspositionCache,
    DEFAULT_SIMULATION_CAPACITY, DEFAULT_TRANSPOSITION_CAPACITY,
};
pub use zobrist::ZobristTable;
