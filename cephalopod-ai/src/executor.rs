//! 限时执行器
//!
//! 在 tokio 的阻塞线程池里运行搜索策略，超时后取消搜索并随机选一个合法走法。
//! 策略的错误、panic、非法走法都降级为同样的随机走法，不会向上传播。

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use cephalopod::{BoardState, CephalopodGame, Move, MoveGenerator};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::search::{CancelToken, SearchError, Strategy};

/// 走法来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveSource {
    /// 搜索按时给出的走法
    Search,
    /// 超时后的随机走法
    Timeout,
    /// 搜索失败（错误、panic、非法走法）后的随机走法
    Failed,
}

impl std::fmt::Display for MoveSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MoveSource::Search => write!(f, "search"),
            MoveSource::Timeout => write!(f, "timeout"),
            MoveSource::Failed => write!(f, "failed"),
        }
    }
}

/// 执行器选出的走法
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MoveSelection {
    pub mv: Move,
    pub source: MoveSource,
    pub elapsed: Duration,
}

/// 限时执行器
///
/// 同一个执行器同时最多只有一次搜索在进行（策略放在互斥锁里）。
pub struct TimeBoundedExecutor {
    strategy: Arc<Mutex<Box<dyn Strategy>>>,
    name: &'static str,
    timeout: Duration,
    fallback_rng: Mutex<ChaCha8Rng>,
}

impl TimeBoundedExecutor {
    /// 创建执行器
    pub fn new(strategy: Box<dyn Strategy>, timeout: Duration) -> Self {
        Self::with_rng(strategy, timeout, ChaCha8Rng::from_entropy())
    }

    /// 创建执行器（随机回退走法使用固定种子）
    pub fn with_seed(strategy: Box<dyn Strategy>, timeout: Duration, seed: u64) -> Self {
        Self::with_rng(strategy, timeout, ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(strategy: Box<dyn Strategy>, timeout: Duration, rng: ChaCha8Rng) -> Self {
        Self {
            name: strategy.name(),
            strategy: Arc::new(Mutex::new(strategy)),
            timeout,
            fallback_rng: Mutex::new(rng),
        }
    }

    /// 策略名称
    pub fn strategy_name(&self) -> &'static str {
        self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// 选择走法
    ///
    /// 只有终局时返回 None。
    pub async fn select_move(
        &self,
        game: &CephalopodGame,
        state: &BoardState,
    ) -> Option<MoveSelection> {
        let moves = game.actions(state);
        if game.is_terminal(state) || moves.is_empty() {
            return None;
        }

        let started = Instant::now();
        let cancel = CancelToken::with_deadline(started + self.timeout);

        let strategy = Arc::clone(&self.strategy);
        let task_cancel = cancel.clone();
        let task_game = *game;
        let task_state = state.clone();
        let handle = tokio::task::spawn_blocking(move || {
            // 上一次搜索 panic 过也继续使用同一个策略
            let mut strategy = strategy.lock().unwrap_or_else(PoisonError::into_inner);
            strategy.choose(&task_game, &task_state, &task_cancel)
        });

        let source = match tokio::time::timeout(self.timeout, handle).await {
            Ok(Ok(Ok(outcome))) => match outcome.best_move {
                Some(mv) if MoveGenerator::is_legal(state, &mv) => {
                    let elapsed = started.elapsed();
                    debug!(
                        strategy = self.name,
                        mv = %mv,
                        value = outcome.value,
                        nodes = outcome.nodes,
                        elapsed_ms = elapsed.as_millis() as u64,
                        "搜索给出走法"
                    );
                    return Some(MoveSelection {
                        mv,
                        source: MoveSource::Search,
                        elapsed,
                    });
                }
                Some(mv) => {
                    warn!(strategy = self.name, mv = %mv, "搜索返回了非法走法");
                    MoveSource::Failed
                }
                None => {
                    warn!(strategy = self.name, "搜索没有返回走法");
                    MoveSource::Failed
                }
            },
            Ok(Ok(Err(SearchError::Cancelled))) => {
                warn!(strategy = self.name, "搜索超时被取消");
                MoveSource::Timeout
            }
            Ok(Ok(Err(e))) => {
                warn!(strategy = self.name, "搜索失败: {}", e);
                MoveSource::Failed
            }
            Ok(Err(e)) => {
                warn!(strategy = self.name, "搜索任务异常: {}", e);
                MoveSource::Failed
            }
            Err(_) => {
                // 通知仍在运行的搜索尽快退出
                cancel.cancel();
                warn!(
                    strategy = self.name,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "搜索超时"
                );
                MoveSource::Timeout
            }
        };

        let mv = self.random_move(&moves)?;
        Some(MoveSelection {
            mv,
            source,
            elapsed: started.elapsed(),
        })
    }

    /// 均匀随机选一个合法走法
    fn random_move(&self, moves: &[Move]) -> Option<Move> {
        let mut rng = self.fallback_rng.lock().unwrap_or_else(PoisonError::into_inner);
        moves.choose(&mut *rng).copied()
    }
}
