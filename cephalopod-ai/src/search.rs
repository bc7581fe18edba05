//! 搜索引擎
//!
//! 实现 Minimax、Alpha-Beta 剪枝、记忆化 Alpha-Beta 和截断深度的启发式 Alpha-Beta。
//! 所有策略都从根局面走子方的视角给出分值。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use cephalopod::{BoardState, CephalopodGame, Move, Side};
use thiserror::Error;
use tracing::debug;

use crate::evaluate::Evaluator;
use crate::transposition::{TranspositionCache, DEFAULT_TRANSPOSITION_CAPACITY};

/// 搜索错误
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    /// 搜索被取消（超时或调用方取消），结果不完整
    #[error("Search was cancelled before completion")]
    Cancelled,

    /// 预算内没有得到任何可用结果
    #[error("Search finished without a usable result")]
    Incomplete,

    /// 根局面没有合法走法
    #[error("No legal moves in the root position")]
    NoLegalMoves,
}

/// 取消令牌
///
/// 克隆后共享同一个取消标志；递归搜索在每次进入节点时检查。
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
    deadline: Option<Instant>,
}

impl CancelToken {
    /// 创建永不过期的令牌
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带截止时间的令牌
    pub fn with_deadline(deadline: Instant) -> Self {
        Self {
            cancelled: Arc::new(AtomicBool::new(false)),
            deadline: Some(deadline),
        }
    }

    /// 取消搜索
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Relaxed);
    }

    /// 是否已取消（或已过截止时间）
    pub fn is_cancelled(&self) -> bool {
        if self.cancelled.load(Ordering::Relaxed) {
            return true;
        }
        matches!(self.deadline, Some(deadline) if Instant::now() >= deadline)
    }

    /// 截止时间
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// 已取消时返回 `SearchError::Cancelled`
    #[inline]
    pub fn check(&self) -> Result<(), SearchError> {
        if self.is_cancelled() {
            Err(SearchError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// 搜索结果
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchOutcome {
    /// 根局面走子方视角的分值
    pub value: f64,
    /// 最佳走法（根局面为终局时为 None）
    pub best_move: Option<Move>,
    /// 展开的节点数（蒙特卡洛为迭代次数）
    pub nodes: u64,
}

/// 搜索策略
pub trait Strategy: Send {
    /// 策略名称（用于日志）
    fn name(&self) -> &'static str;

    /// 搜索最佳走法
    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError>;
}

/// 截断条件：深度超过 `max_depth` 时停止展开
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cutoff {
    max_depth: u32,
}

impl Cutoff {
    /// 默认截断深度
    pub const DEFAULT_DEPTH: u32 = 3;

    pub fn depth(max_depth: u32) -> Self {
        Self { max_depth }
    }

    /// 当前深度是否应该停止展开
    #[inline]
    pub fn should_stop(&self, depth: u32) -> bool {
        depth > self.max_depth
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }
}

impl Default for Cutoff {
    fn default() -> Self {
        Self::depth(Self::DEFAULT_DEPTH)
    }
}

/// 节点分值与对应的走法
type Scored = (f64, Option<Move>);

/// Minimax 搜索（搜到终局，用作正确性基准）
#[derive(Debug, Default)]
pub struct Minimax {
    nodes: u64,
}

impl Minimax {
    pub fn new() -> Self {
        Self::default()
    }

    fn max_value(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        root: Side,
        cancel: &CancelToken,
    ) -> Result<Scored, SearchError> {
        cancel.check()?;
        self.nodes += 1;

        if game.is_terminal(state) {
            return Ok((game.utility(state, root) as f64, None));
        }

        let mut best: Scored = (f64::NEG_INFINITY, None);
        for mv in game.actions(state) {
            let (value, _) = self.min_value(game, &game.result(state, &mv), root, cancel)?;
            if value > best.0 {
                best = (value, Some(mv));
            }
        }
        Ok(best)
    }

    fn min_value(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        root: Side,
        cancel: &CancelToken,
    ) -> Result<Scored, SearchError> {
        cancel.check()?;
        self.nodes += 1;

        if game.is_terminal(state) {
            return Ok((game.utility(state, root) as f64, None));
        }

        let mut best: Scored = (f64::INFINITY, None);
        for mv in game.actions(state) {
            let (value, _) = self.max_value(game, &game.result(state, &mv), root, cancel)?;
            if value < best.0 {
                best = (value, Some(mv));
            }
        }
        Ok(best)
    }
}

impl Strategy for Minimax {
    fn name(&self) -> &'static str {
        "minimax"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        self.nodes = 0;
        let (value, best_move) = self.max_value(game, state, state.to_move(), cancel)?;
        debug!(strategy = self.name(), nodes = self.nodes, value, "搜索完成");

        Ok(SearchOutcome {
            value,
            best_move,
            nodes: self.nodes,
        })
    }
}

/// 一次 Alpha-Beta 搜索的上下文
///
/// 三个 Alpha-Beta 变体共用这份递归，区别只在是否带缓存、是否有截断评估。
struct AlphaBetaSearch<'a> {
    game: &'a CephalopodGame,
    root: Side,
    cancel: &'a CancelToken,
    cache: Option<&'a mut TranspositionCache>,
    horizon: Option<(Cutoff, &'a dyn Evaluator)>,
    nodes: u64,
}

impl<'a> AlphaBetaSearch<'a> {
    fn new(game: &'a CephalopodGame, root: Side, cancel: &'a CancelToken) -> Self {
        Self {
            game,
            root,
            cancel,
            cache: None,
            horizon: None,
            nodes: 0,
        }
    }

    fn with_cache(mut self, cache: &'a mut TranspositionCache) -> Self {
        self.cache = Some(cache);
        self
    }

    fn with_horizon(mut self, cutoff: Cutoff, evaluator: &'a dyn Evaluator) -> Self {
        self.horizon = Some((cutoff, evaluator));
        self
    }

    fn run(&mut self, state: &BoardState) -> Result<Scored, SearchError> {
        self.value(state, f64::NEG_INFINITY, f64::INFINITY, 0, true)
    }

    /// 查缓存，未命中时展开并写回
    fn value(
        &mut self,
        state: &BoardState,
        alpha: f64,
        beta: f64,
        depth: u32,
        maximizing: bool,
    ) -> Result<Scored, SearchError> {
        self.cancel.check()?;

        let key = self.cache.as_ref().map(|_| state.key());
        if let (Some(cache), Some(key)) = (self.cache.as_ref(), key.as_ref()) {
            if let Some(&hit) = cache.get(key) {
                return Ok(hit);
            }
        }

        let scored = self.expand(state, alpha, beta, depth, maximizing)?;

        if let (Some(cache), Some(key)) = (self.cache.as_mut(), key) {
            cache.insert(key, scored);
        }
        Ok(scored)
    }

    fn expand(
        &mut self,
        state: &BoardState,
        mut alpha: f64,
        mut beta: f64,
        depth: u32,
        maximizing: bool,
    ) -> Result<Scored, SearchError> {
        self.nodes += 1;

        if self.game.is_terminal(state) {
            return Ok((self.game.utility(state, self.root) as f64, None));
        }
        if let Some((cutoff, evaluator)) = self.horizon {
            if cutoff.should_stop(depth) {
                return Ok((evaluator.evaluate(state, self.root), None));
            }
        }

        let mut best: Scored = if maximizing {
            (f64::NEG_INFINITY, None)
        } else {
            (f64::INFINITY, None)
        };

        for mv in self.game.actions(state) {
            let next = self.game.result(state, &mv);
            let (value, _) = self.value(&next, alpha, beta, depth + 1, !maximizing)?;

            if maximizing {
                if value > best.0 {
                    best = (value, Some(mv));
                    alpha = alpha.max(value);
                }
                if best.0 >= beta {
                    return Ok(best);
                }
            } else {
                if value < best.0 {
                    best = (value, Some(mv));
                    beta = beta.min(value);
                }
                if best.0 <= alpha {
                    return Ok(best);
                }
            }
        }

        Ok(best)
    }
}

/// Alpha-Beta 剪枝（搜到终局）
#[derive(Debug, Default)]
pub struct AlphaBeta;

impl AlphaBeta {
    pub fn new() -> Self {
        Self
    }
}

impl Strategy for AlphaBeta {
    fn name(&self) -> &'static str {
        "alphabeta"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        let mut search = AlphaBetaSearch::new(game, state.to_move(), cancel);
        let (value, best_move) = search.run(state)?;
        debug!(strategy = self.name(), nodes = search.nodes, value, "搜索完成");

        Ok(SearchOutcome {
            value,
            best_move,
            nodes: search.nodes,
        })
    }
}

/// 记忆化 Alpha-Beta（搜到终局）
///
/// 缓存键只含局面（[`CacheKeyPolicy::StateOnly`](crate::CacheKeyPolicy::StateOnly)），
/// 缓存属于策略实例，每次搜索开始时清空。
pub struct AlphaBetaMemo {
    cache: TranspositionCache,
}

impl AlphaBetaMemo {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_TRANSPOSITION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: TranspositionCache::new(capacity),
        }
    }

    /// 置换缓存（用于统计）
    pub fn cache(&self) -> &TranspositionCache {
        &self.cache
    }
}

impl Default for AlphaBetaMemo {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for AlphaBetaMemo {
    fn name(&self) -> &'static str {
        "alphabeta-memo"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        // 缓存值相对于根走子方，换一次搜索就失效
        self.cache.clear();

        let mut search =
            AlphaBetaSearch::new(game, state.to_move(), cancel).with_cache(&mut self.cache);
        let (value, best_move) = search.run(state)?;
        let nodes = search.nodes;

        let stats = self.cache.stats();
        debug!(
            strategy = self.name(),
            nodes,
            value,
            cache_used = stats.used,
            cache_hit_rate = stats.hit_rate(),
            "搜索完成"
        );

        Ok(SearchOutcome {
            value,
            best_move,
            nodes,
        })
    }
}

/// 截断深度的启发式 Alpha-Beta
///
/// 终局返回真实效用；达到截断深度时返回评估器的分值。缓存与深度无关：
/// 浅层算出的值会被深层复用，反之亦然。
pub struct HeuristicAlphaBeta {
    cutoff: Cutoff,
    evaluator: Box<dyn Evaluator>,
    cache: TranspositionCache,
}

impl HeuristicAlphaBeta {
    pub fn new(cutoff: Cutoff, evaluator: Box<dyn Evaluator>) -> Self {
        Self::with_capacity(cutoff, evaluator, DEFAULT_TRANSPOSITION_CAPACITY)
    }

    pub fn with_capacity(cutoff: Cutoff, evaluator: Box<dyn Evaluator>, capacity: usize) -> Self {
        Self {
            cutoff,
            evaluator,
            cache: TranspositionCache::new(capacity),
        }
    }

    pub fn cutoff(&self) -> Cutoff {
        self.cutoff
    }

    /// 置换缓存（用于统计）
    pub fn cache(&self) -> &TranspositionCache {
        &self.cache
    }
}

impl Strategy for HeuristicAlphaBeta {
    fn name(&self) -> &'static str {
        "heuristic-alphabeta"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        self.cache.clear();

        let mut search = AlphaBetaSearch::new(game, state.to_move(), cancel)
            .with_cache(&mut self.cache)
            .with_horizon(self.cutoff, self.evaluator.as_ref());
        let (value, best_move) = search.run(state)?;
        let nodes = search.nodes;

        debug!(
            strategy = self.name(),
            evaluator = self.evaluator.name(),
            depth = self.cutoff.max_depth(),
            nodes,
            value,
            cache_used = self.cache.len(),
            "搜索完成"
        );

        Ok(SearchOutcome {
            value,
            best_move,
            nodes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluate::{FeatureEvaluator, PositionalEvaluator};
    use cephalopod::{Notation, Position};
    use std::collections::HashSet;
    use std::time::Duration;

    fn game(size: usize) -> CephalopodGame {
        CephalopodGame::new(size, Side::Blue).unwrap()
    }

    /// 已穷举验证无循环的小局面（蓝、红各自走子）
    const ORACLE_POSITIONS: [&str; 7] = [
        "b6r1b6/r6.r6/b1r1. b",
        "b2r6b6/..r6/b6r1. b",
        "b6r6b6/r6.r6/b6r1. b",
        "b6r1b6/r6.r6/b1r1. r",
        "b2r6b6/..r6/b6r1. r",
        "b6r6b6/r6.r6/b6r1. r",
        "../.. r",
    ];

    /// 从初始局面可达的所有不同局面
    fn reachable_states(game: &CephalopodGame) -> Vec<BoardState> {
        let mut seen = HashSet::new();
        let mut states = Vec::new();
        let mut stack = vec![game.initial()];

        while let Some(state) = stack.pop() {
            if !seen.insert(state.key()) {
                continue;
            }
            if !game.is_terminal(&state) {
                for mv in game.actions(&state) {
                    stack.push(game.result(&state, &mv));
                }
            }
            states.push(state);
        }
        states
    }

    fn assert_same_result(game: &CephalopodGame, state: &BoardState) {
        let cancel = CancelToken::new();
        let minimax = Minimax::new().choose(game, state, &cancel).unwrap();
        let alphabeta = AlphaBeta::new().choose(game, state, &cancel).unwrap();

        let text = Notation::to_string(state);
        assert_eq!(minimax.value, alphabeta.value, "value mismatch on {}", text);
        assert_eq!(minimax.best_move, alphabeta.best_move, "move mismatch on {}", text);
        assert!(alphabeta.nodes <= minimax.nodes);
    }

    #[test]
    fn test_minimax_empty_two_by_two() {
        let game = game(2);
        let state = game.initial();
        let outcome = Minimax::new().choose(&game, &state, &CancelToken::new()).unwrap();

        // 2×2 空棋盘先手蓝方拿不到多数
        assert_eq!(outcome.value, -1.0);
        assert_eq!(outcome.best_move, Some(Move::placement(Position::new_unchecked(0, 0))));
        assert_eq!(outcome.nodes, 86_865);
    }

    #[test]
    fn test_alphabeta_matches_minimax_on_every_reachable_state() {
        for first in [Side::Blue, Side::Red] {
            let game = CephalopodGame::new(2, first).unwrap();
            let states = reachable_states(&game);
            assert_eq!(states.len(), 301);

            for state in &states {
                assert_same_result(&game, state);
            }
        }
    }

    #[test]
    fn test_alphabeta_matches_minimax_on_small_positions() {
        for text in ORACLE_POSITIONS {
            let state = Notation::parse(text).unwrap();
            assert_same_result(&game(state.size()), &state);
        }
    }

    #[test]
    fn test_alphabeta_prunes() {
        let game = game(2);
        let state = game.initial();
        let cancel = CancelToken::new();

        let alphabeta = AlphaBeta::new().choose(&game, &state, &cancel).unwrap();
        let memo = AlphaBetaMemo::new().choose(&game, &state, &cancel).unwrap();

        assert_eq!(alphabeta.nodes, 1_701);
        assert_eq!(memo.nodes, 156);
        assert_eq!(memo.value, alphabeta.value);
    }

    #[test]
    fn test_memo_on_known_positions() {
        let mut memo = AlphaBetaMemo::new();
        let cancel = CancelToken::new();

        let state = Notation::parse("b6r1b6/r6.r6/b1r1. b").unwrap();
        let outcome = memo.choose(&game(3), &state, &cancel).unwrap();
        assert_eq!(outcome.value, 1.0);
        assert_eq!(outcome.best_move, Some(Move::placement(Position::new_unchecked(2, 2))));

        // 第二次搜索前缓存被清空，结果一致
        let again = memo.choose(&game(3), &state, &cancel).unwrap();
        assert_eq!(again, outcome);
    }

    #[test]
    fn test_memo_cache_respects_capacity() {
        let mut memo = AlphaBetaMemo::with_capacity(32);
        let state = Notation::parse("b2r6b6/..r6/b6r1. b").unwrap();

        for _ in 0..5 {
            memo.choose(&game(3), &state, &CancelToken::new()).unwrap();
            assert!(memo.cache().len() <= 32);
        }
        assert!(memo.cache().stats().evictions > 0);
    }

    #[test]
    fn test_terminal_root() {
        let state = Notation::parse("b1r1/b2b3 r").unwrap();
        let outcome = AlphaBeta::new().choose(&game(2), &state, &CancelToken::new()).unwrap();
        assert_eq!(outcome.best_move, None);
        assert_eq!(outcome.value, -1.0);
    }

    #[test]
    fn test_cancelled_search() {
        let game = CephalopodGame::default();
        let state = game.initial();
        let cancel = CancelToken::new();
        cancel.cancel();

        assert_eq!(
            Minimax::new().choose(&game, &state, &cancel),
            Err(SearchError::Cancelled)
        );
        assert_eq!(
            AlphaBetaMemo::new().choose(&game, &state, &cancel),
            Err(SearchError::Cancelled)
        );
    }

    #[test]
    fn test_deadline_stops_full_search() {
        // 5×5 空棋盘的完整搜索不可能在 50ms 内结束
        let game = CephalopodGame::default();
        let state = game.initial();
        let cancel = CancelToken::with_deadline(Instant::now() + Duration::from_millis(50));

        let started = Instant::now();
        assert_eq!(
            AlphaBeta::new().choose(&game, &state, &cancel),
            Err(SearchError::Cancelled)
        );
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn test_cutoff() {
        let cutoff = Cutoff::default();
        assert_eq!(cutoff.max_depth(), 3);
        assert!(!cutoff.should_stop(3));
        assert!(cutoff.should_stop(4));
    }

    #[test]
    fn test_heuristic_search_on_full_board_size() {
        let game = CephalopodGame::default();
        let state = game.initial();
        let mut search = HeuristicAlphaBeta::new(Cutoff::depth(1), Box::new(PositionalEvaluator));

        let outcome = search.choose(&game, &state, &CancelToken::new()).unwrap();
        let mv = outcome.best_move.unwrap();
        assert!(game.actions(&state).contains(&mv));
        assert!(outcome.value.is_finite());
        assert!(search.cache().len() > 0);
    }

    #[test]
    fn test_heuristic_prefers_largest_capture() {
        // 截断深度 0：直接评估子局面，吃掉四个红子的格子差最大
        let state = Notation::parse("b1r1b1/r1.r1/b1r1b1 b").unwrap();
        let game = game(3);
        let mut search = HeuristicAlphaBeta::new(Cutoff::depth(0), Box::new(FeatureEvaluator));

        let outcome = search.choose(&game, &state, &CancelToken::new()).unwrap();
        let mv = outcome.best_move.unwrap();
        assert_eq!(mv.target, Position::new_unchecked(1, 1));
        assert_eq!(mv.capture_count(), 4);
    }

    #[test]
    fn test_heuristic_terminal_children_use_utility() {
        // 中心四周都是 6 点，只能落子；落子后棋盘填满，蓝方 5 格胜
        let state = Notation::parse("b6r6b6/r6.r6/b6r6b6 b").unwrap();
        let game = game(3);
        let mut search = HeuristicAlphaBeta::new(Cutoff::depth(0), Box::new(PositionalEvaluator));

        let outcome = search.choose(&game, &state, &CancelToken::new()).unwrap();
        assert_eq!(outcome.value, 1.0);
        assert_eq!(outcome.best_move, Some(Move::placement(Position::new_unchecked(1, 1))));
    }
}
