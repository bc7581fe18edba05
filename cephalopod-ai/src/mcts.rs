//! 蒙特卡洛树搜索
//!
//! 节点存放在一次搜索独占的数组里，用 `NodeId` 下标互相引用；
//! 子节点到父节点的链接只在反向传播时使用。
//!
//! 模拟结果以蓝方视角记录（1 为蓝方胜，0 为红方胜，0.5 为平），
//! 每个节点再按自己的走子方换算后累加。

use std::cmp::Reverse;
use std::time::{Duration, Instant};

use cephalopod::{BoardState, CephalopodGame, Move, MoveGenerator, Position, Side};
use rand::distributions::{Distribution, WeightedIndex};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::search::{CancelToken, SearchError, SearchOutcome, Strategy};
use crate::transposition::{SimulationCache, DEFAULT_SIMULATION_CAPACITY};
use crate::zobrist::ZobristTable;

/// 蒙特卡洛搜索配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MctsConfig {
    /// UCB1 探索常数
    pub exploration: f64,
    /// 单次模拟的最大步数
    pub rollout_depth: u32,
    /// 每次搜索的时间预算（毫秒）
    pub time_limit_ms: u64,
    /// 迭代次数上限（测试中用来得到可复现的结果）
    pub max_iterations: Option<u64>,
    /// 模拟缓存容量
    pub simulation_cache_capacity: usize,
    /// 随机种子（None 时从系统熵初始化）
    pub seed: Option<u64>,
    /// 只有一两个吃子走法时直接走吃子最多的，不做搜索
    pub capture_shortcut: bool,
}

impl Default for MctsConfig {
    fn default() -> Self {
        Self {
            exploration: std::f64::consts::SQRT_2,
            rollout_depth: 25,
            time_limit_ms: 2700,
            max_iterations: None,
            simulation_cache_capacity: DEFAULT_SIMULATION_CAPACITY,
            seed: None,
            capture_shortcut: true,
        }
    }
}

impl MctsConfig {
    pub fn time_limit(&self) -> Duration {
        Duration::from_millis(self.time_limit_ms)
    }
}

/// 节点下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct NodeId(u32);

/// 搜索树节点
#[derive(Debug)]
struct Node {
    state: BoardState,
    /// 父节点（根节点为 None）
    parent: Option<NodeId>,
    /// 按创建顺序排列的子节点
    children: Vec<(Move, NodeId)>,
    visits: u32,
    /// 按本节点走子方换算后的累计结果
    score: f64,
    /// 尚未展开的走法，首次需要时才生成（吃子多的排前面）
    untried: Option<Vec<Move>>,
    mover: Side,
    terminal: bool,
}

impl Node {
    fn new(game: &CephalopodGame, state: BoardState, parent: Option<NodeId>) -> Self {
        Self {
            mover: state.to_move(),
            terminal: game.is_terminal(&state),
            state,
            parent,
            children: Vec::new(),
            visits: 0,
            score: 0.0,
            untried: None,
        }
    }

    /// `side` 视角的胜率
    fn rate_for(&self, side: Side) -> f64 {
        if self.visits == 0 {
            return 0.0;
        }
        let rate = self.score / self.visits as f64;
        if side == self.mover {
            rate
        } else {
            1.0 - rate
        }
    }

    fn has_untried(&self) -> bool {
        self.untried.as_ref().is_some_and(|moves| !moves.is_empty())
    }
}

/// 一次搜索的树
struct SearchTree {
    nodes: Vec<Node>,
}

impl SearchTree {
    fn new(game: &CephalopodGame, root: BoardState) -> Self {
        Self {
            nodes: vec![Node::new(game, root, None)],
        }
    }

    #[inline]
    fn root(&self) -> NodeId {
        NodeId(0)
    }

    #[inline]
    fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0 as usize]
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 生成未展开走法（稳定排序，吃子数多的在前）
    fn ensure_untried(&mut self, id: NodeId, game: &CephalopodGame) {
        let node = self.get_mut(id);
        if node.untried.is_none() {
            let mut moves = game.actions(&node.state);
            moves.sort_by_key(|mv| Reverse(mv.capture_count()));
            node.untried = Some(moves);
        }
    }

    /// 选择：沿 UCB1 最大的子节点下降，直到遇到终局、可展开或无子节点的节点
    fn select(&mut self, game: &CephalopodGame, exploration: f64) -> NodeId {
        let mut current = self.root();
        loop {
            if self.get(current).terminal {
                return current;
            }
            self.ensure_untried(current, game);

            let node = self.get(current);
            if node.has_untried() || node.children.is_empty() {
                return current;
            }
            match self.select_child(current, exploration) {
                Some(child) => current = child,
                None => return current,
            }
        }
    }

    /// UCB1 选子节点，平分时取先创建的
    fn select_child(&self, id: NodeId, exploration: f64) -> Option<NodeId> {
        let node = self.get(id);
        let log_visits = if node.visits > 0 {
            (node.visits as f64).ln()
        } else {
            0.0
        };

        let mut best: Option<(f64, NodeId)> = None;
        for &(_, child_id) in &node.children {
            let child = self.get(child_id);
            let value = if child.visits == 0 {
                f64::INFINITY
            } else {
                // 换算到选择方视角，蓝方父节点也不直接用子节点的原始胜率
                let exploit = child.rate_for(node.mover);
                exploit + exploration * (log_visits / child.visits as f64).sqrt()
            };

            if best.map_or(true, |(best_value, _)| value > best_value) {
                best = Some((value, child_id));
            }
        }
        best.map(|(_, child_id)| child_id)
    }

    /// 展开：取第一个未展开的走法生成子节点
    fn expand(&mut self, id: NodeId, game: &CephalopodGame) -> NodeId {
        let mv = match self.get_mut(id).untried.as_mut() {
            Some(untried) if !untried.is_empty() => untried.remove(0),
            _ => return id,
        };

        let state = game.result(&self.get(id).state, &mv);
        let child_id = NodeId(self.nodes.len() as u32);
        self.nodes.push(Node::new(game, state, Some(id)));
        self.get_mut(id).children.push((mv, child_id));
        child_id
    }

    /// 反向传播蓝方视角的模拟结果
    fn backpropagate(&mut self, from: NodeId, outcome: f64) {
        let mut current = Some(from);
        while let Some(id) = current {
            let node = self.get_mut(id);
            node.visits += 1;
            node.score += match node.mover {
                Side::Blue => outcome,
                Side::Red => 1.0 - outcome,
            };
            current = node.parent;
        }
    }

    /// 访问次数最多的根子节点，平分时取先创建的
    fn most_visited(&self) -> Option<(Move, NodeId)> {
        let mut best: Option<(u32, Move, NodeId)> = None;
        for &(mv, child_id) in &self.get(self.root()).children {
            let visits = self.get(child_id).visits;
            if best.map_or(true, |(best_visits, _, _)| visits > best_visits) {
                best = Some((visits, mv, child_id));
            }
        }
        best.map(|(_, mv, child_id)| (mv, child_id))
    }
}

/// 蒙特卡洛树搜索
///
/// 搜索树每次重建；模拟缓存属于实例，跨搜索保留。
pub struct MonteCarlo {
    config: MctsConfig,
    rng: ChaCha8Rng,
    zobrist: ZobristTable,
    simulations: SimulationCache,
}

impl MonteCarlo {
    pub fn new(config: MctsConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };
        let simulations = SimulationCache::new(config.simulation_cache_capacity);

        Self {
            config,
            rng,
            zobrist: ZobristTable::new(),
            simulations,
        }
    }

    pub fn config(&self) -> &MctsConfig {
        &self.config
    }

    /// 模拟缓存（用于统计）
    pub fn simulation_cache(&self) -> &SimulationCache {
        &self.simulations
    }

    /// 不需要搜索就能确定的走法
    ///
    /// - 只有一个合法走法
    /// - 只有一个吃子走法
    /// - 两到三个吃子走法，其中吃子最多的（取第一个）至少吃三格
    /// - 开启 `capture_shortcut` 时，两个吃子走法取吃子多的（平分取第一个）
    fn fast_path(moves: &[Move], capture_shortcut: bool) -> Option<Move> {
        if moves.len() == 1 {
            return Some(moves[0]);
        }

        let captures = MoveGenerator::captures(moves);
        match captures.len() {
            1 => Some(captures[0]),
            2..=3 => {
                let mut best = captures[0];
                for mv in &captures[1..] {
                    if mv.capture_count() > best.capture_count() {
                        best = *mv;
                    }
                }
                (best.capture_count() >= 3 || (capture_shortcut && captures.len() == 2))
                    .then_some(best)
            }
            _ => None,
        }
    }

    /// 带缓存的模拟
    fn simulate(&mut self, game: &CephalopodGame, state: &BoardState) -> f64 {
        let key = self.zobrist.hash(state);
        if let Some(&outcome) = self.simulations.get(&key) {
            return outcome;
        }

        let outcome = self.rollout(game, state);
        self.simulations.insert(key, outcome);
        outcome
    }

    /// 半随机模拟，返回蓝方视角的结果
    fn rollout(&mut self, game: &CephalopodGame, state: &BoardState) -> f64 {
        let mut current = state.clone();
        let mut depth = 0;

        while !game.is_terminal(&current) && depth < self.config.rollout_depth {
            depth += 1;
            let moves = game.actions(&current);
            let mv = self.rollout_move(&current, &moves);
            current = game.result(&current, &mv);
        }

        if game.is_terminal(&current) {
            return if game.utility(&current, Side::Blue) > 0 { 1.0 } else { 0.0 };
        }

        let blue = current.count(Side::Blue);
        let red = current.count(Side::Red);
        match blue.cmp(&red) {
            std::cmp::Ordering::Greater => 1.0,
            std::cmp::Ordering::Less => 0.0,
            std::cmp::Ordering::Equal => 0.5,
        }
    }

    /// 模拟策略
    ///
    /// 走法不超过两个时取第一个；有吃子时按吃子数平方加权抽取；
    /// 否则按离中心的距离排序，在较近的一半里均匀抽取。
    fn rollout_move(&mut self, state: &BoardState, moves: &[Move]) -> Move {
        if moves.len() <= 2 {
            return moves[0];
        }

        let captures = MoveGenerator::captures(moves);
        if !captures.is_empty() {
            let weights = captures.iter().map(|mv| mv.capture_count().pow(2));
            return match WeightedIndex::new(weights) {
                Ok(dist) => captures[dist.sample(&mut self.rng)],
                Err(_) => captures[0],
            };
        }

        let center = state.board().center();
        let ranked = Self::rank_by_center(moves, center);
        let top = (ranked.len() / 2).max(1);
        ranked[..top].choose(&mut self.rng).copied().unwrap_or(ranked[0])
    }

    /// 按离中心的距离升序排列，距离相同时坐标大的在前
    fn rank_by_center(moves: &[Move], center: Position) -> Vec<Move> {
        let mut ranked = moves.to_vec();
        ranked.sort_by_key(|mv| (mv.target.manhattan(center), Reverse(mv.target)));
        ranked
    }

    /// 截止时间：取时间预算与取消令牌中较早的一个
    fn deadline(&self, started: Instant, cancel: &CancelToken) -> Instant {
        let budget = started + self.config.time_limit();
        match cancel.deadline() {
            Some(deadline) if deadline < budget => deadline,
            _ => budget,
        }
    }
}

impl Default for MonteCarlo {
    fn default() -> Self {
        Self::new(MctsConfig::default())
    }
}

impl Strategy for MonteCarlo {
    fn name(&self) -> &'static str {
        "mcts"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        let moves = game.actions(state);
        if moves.is_empty() {
            return Err(SearchError::NoLegalMoves);
        }

        if let Some(mv) = Self::fast_path(&moves, self.config.capture_shortcut) {
            debug!(strategy = self.name(), mv = %mv, "快速路径");
            // 没有模拟，分值未知
            return Ok(SearchOutcome {
                value: 0.5,
                best_move: Some(mv),
                nodes: 0,
            });
        }

        // 缓存过半时在搜索开始前清空
        if self.simulations.len() > self.simulations.capacity() / 2 {
            self.simulations.clear();
        }

        let started = Instant::now();
        let deadline = self.deadline(started, cancel);
        let max_iterations = self.config.max_iterations.unwrap_or(u64::MAX);
        let exploration = self.config.exploration;

        let mut tree = SearchTree::new(game, state.clone());
        let mut iterations = 0u64;

        while iterations < max_iterations && Instant::now() < deadline && !cancel.is_cancelled() {
            let mut node = tree.select(game, exploration);
            if !tree.get(node).terminal && tree.get(node).has_untried() {
                node = tree.expand(node, game);
            }

            let leaf = tree.get(node).state.clone();
            let outcome = self.simulate(game, &leaf);
            tree.backpropagate(node, outcome);
            iterations += 1;
        }

        let (best_move, child) = tree.most_visited().ok_or(SearchError::Incomplete)?;
        let value = tree.get(child).rate_for(state.to_move());

        let stats = self.simulations.stats();
        debug!(
            strategy = self.name(),
            iterations,
            tree_size = tree.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            cache_used = stats.used,
            cache_hit_rate = stats.hit_rate(),
            "搜索完成"
        );

        Ok(SearchOutcome {
            value,
            best_move: Some(best_move),
            nodes: iterations,
        })
    }
}
