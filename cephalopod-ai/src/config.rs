//! AI 配置

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::evaluate::EvaluatorKind;
use crate::executor::TimeBoundedExecutor;
use crate::mcts::{MctsConfig, MonteCarlo};
use crate::random::RandomMove;
use crate::search::{AlphaBeta, AlphaBetaMemo, Cutoff, HeuristicAlphaBeta, Minimax, Strategy};
use crate::transposition::DEFAULT_TRANSPOSITION_CAPACITY;

/// AI 难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl std::fmt::Display for Difficulty {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Difficulty::Easy => write!(f, "easy"),
            Difficulty::Medium => write!(f, "medium"),
            Difficulty::Hard => write!(f, "hard"),
        }
    }
}

/// 搜索策略种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    /// 完整 Minimax（只适合很小的棋盘）
    Minimax,
    /// 完整 Alpha-Beta
    AlphaBeta,
    /// 记忆化 Alpha-Beta
    AlphaBetaMemo,
    /// 截断深度 + 评估函数
    HeuristicAlphaBeta,
    /// 蒙特卡洛树搜索
    MonteCarlo,
    /// 均匀随机走子
    Random,
}

/// AI 配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AiConfig {
    pub strategy: StrategyKind,
    pub evaluator: EvaluatorKind,
    /// 启发式 Alpha-Beta 的截断深度
    pub cutoff_depth: u32,
    /// 置换缓存容量
    pub cache_capacity: usize,
    /// 执行器超时（毫秒），超时后随机落子
    pub timeout_ms: u64,
    /// 蒙特卡洛参数；其中的种子也用于随机走子和执行器的回退走法
    pub mcts: MctsConfig,
}

impl AiConfig {
    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Easy => Self {
                strategy: StrategyKind::HeuristicAlphaBeta,
                evaluator: EvaluatorKind::Positional,
                cutoff_depth: 1,
                timeout_ms: 1000,
                ..Self::base()
            },
            Difficulty::Medium => Self {
                strategy: StrategyKind::HeuristicAlphaBeta,
                evaluator: EvaluatorKind::Feature,
                cutoff_depth: 2,
                timeout_ms: 3000,
                ..Self::base()
            },
            Difficulty::Hard => Self {
                strategy: StrategyKind::MonteCarlo,
                timeout_ms: 3000,
                ..Self::base()
            },
        }
    }

    fn base() -> Self {
        Self {
            strategy: StrategyKind::HeuristicAlphaBeta,
            evaluator: EvaluatorKind::Positional,
            cutoff_depth: Cutoff::DEFAULT_DEPTH,
            cache_capacity: DEFAULT_TRANSPOSITION_CAPACITY,
            timeout_ms: 3000,
            mcts: MctsConfig::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// 按配置构造搜索策略
    pub fn build_strategy(&self) -> Box<dyn Strategy> {
        match self.strategy {
            StrategyKind::Minimax => Box::new(Minimax::new()),
            StrategyKind::AlphaBeta => Box::new(AlphaBeta::new()),
            StrategyKind::AlphaBetaMemo => {
                Box::new(AlphaBetaMemo::with_capacity(self.cache_capacity))
            }
            StrategyKind::HeuristicAlphaBeta => Box::new(HeuristicAlphaBeta::with_capacity(
                Cutoff::depth(self.cutoff_depth),
                self.evaluator.build(),
                self.cache_capacity,
            )),
            StrategyKind::MonteCarlo => Box::new(MonteCarlo::new(self.mcts.clone())),
            StrategyKind::Random => match self.mcts.seed {
                Some(seed) => Box::new(RandomMove::with_seed(seed)),
                None => Box::new(RandomMove::new()),
            },
        }
    }

    /// 按配置构造限时执行器
    ///
    /// 配置了 MCTS 种子时，随机回退走法也用同一个种子。
    pub fn build_executor(&self) -> TimeBoundedExecutor {
        let strategy = self.build_strategy();
        match self.mcts.seed {
            Some(seed) => TimeBoundedExecutor::with_seed(strategy, self.timeout(), seed),
            None => TimeBoundedExecutor::new(strategy, self.timeout()),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self::from_difficulty(Difficulty::Medium)
    }
}
