//! 局面评估函数
//!
//! 截断搜索在非终局节点上调用评估器，分值越高对 `perspective` 越有利。

use cephalopod::{Board, BoardState, MoveGenerator, Position, Side};
use serde::{Deserialize, Serialize};

/// 评估器
///
/// 以参数形式显式传给搜索，不依赖任何全局可替换的绑定。
pub trait Evaluator: Send + Sync {
    /// 评估非终局局面（`perspective` 视角）
    fn evaluate(&self, state: &BoardState, perspective: Side) -> f64;

    /// 评估器名称（用于日志）
    fn name(&self) -> &'static str;
}

/// 评估器种类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluatorKind {
    /// 位置评估（格子差 + 中心控制 + 吃子潜力，按进度加权）
    #[default]
    Positional,
    /// 特征评估（格子、骰点、中心、机动性、威胁的线性组合）
    Feature,
}

impl EvaluatorKind {
    /// 构造评估器
    pub fn build(self) -> Box<dyn Evaluator> {
        match self {
            EvaluatorKind::Positional => Box::new(PositionalEvaluator),
            EvaluatorKind::Feature => Box::new(FeatureEvaluator),
        }
    }
}

/// 位置评估器
///
/// 开局重视中心控制和吃子潜力，随着棋盘填满逐渐转向格子数差。
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionalEvaluator;

impl PositionalEvaluator {
    /// 中心控制分（己方为正，对方为负，再按格子总数归一化）
    fn center_control(board: &Board, perspective: Side) -> f64 {
        let size = board.size() as f64;
        let center = board.center();

        let total: f64 = board
            .occupied()
            .map(|(pos, token)| {
                let value = (size - pos.manhattan(center) as f64) / size;
                if token.side == perspective {
                    value
                } else {
                    -value
                }
            })
            .sum();

        total / (size * size)
    }

    /// 吃子潜力：至少挨着两个对方格子的空格
    fn capture_potential(board: &Board, perspective: Side) -> f64 {
        let enemy = perspective.opponent();

        board
            .empty_cells()
            .map(|pos| {
                board
                    .neighbors(pos)
                    .filter(|n| matches!(board.get(*n), Some(token) if token.side == enemy))
                    .count()
            })
            .filter(|&adjacent| adjacent >= 2)
            .map(|adjacent| adjacent as f64 / 4.0)
            .sum()
    }
}

impl Evaluator for PositionalEvaluator {
    fn evaluate(&self, state: &BoardState, perspective: Side) -> f64 {
        let board = state.board();
        let own = board.count(perspective) as f64;
        let enemy = board.count(perspective.opponent()) as f64;

        let progress = (own + enemy) / board.area() as f64;
        let piece_diff = (own - enemy) / (own + enemy + 1.0);
        let center = Self::center_control(board, perspective);
        let capture = Self::capture_potential(board, perspective);

        piece_diff * (0.4 + 0.4 * progress)
            + center * (0.4 - 0.2 * progress)
            + capture * (0.2 - 0.1 * progress)
    }

    fn name(&self) -> &'static str {
        "positional"
    }
}

/// 特征评估器
#[derive(Debug, Clone, Copy, Default)]
pub struct FeatureEvaluator;

/// 单个阵营的特征统计
#[derive(Debug, Default)]
struct SideFeatures {
    cells: i32,
    pips: i32,
    center: i32,
    /// 本方格子旁边骰点 ≤ 5 的对方格子（本方的吃子目标）
    targets: i32,
}

impl FeatureEvaluator {
    fn collect(board: &Board, side: Side) -> SideFeatures {
        let center = board.center();
        let mut features = SideFeatures::default();

        for (pos, token) in board.occupied().filter(|(_, t)| t.side == side) {
            features.cells += 1;
            features.pips += token.pip as i32;
            features.center += (3 - pos.manhattan(center) as i32).max(0);
            features.targets += Self::target_neighbors(board, pos, side) as i32;
        }

        features
    }

    /// `pos` 周围骰点 ≤ 5 的对方格子数
    fn target_neighbors(board: &Board, pos: Position, side: Side) -> usize {
        board
            .neighbors(pos)
            .filter(|n| {
                matches!(
                    board.get(*n),
                    Some(token) if token.side == side.opponent() && token.pip <= 5
                )
            })
            .count()
    }
}

impl Evaluator for FeatureEvaluator {
    fn evaluate(&self, state: &BoardState, perspective: Side) -> f64 {
        let board = state.board();
        let own = Self::collect(board, perspective);
        let enemy = Self::collect(board, perspective.opponent());
        let mobility = MoveGenerator::generate(state).len() as f64;

        // 对方的吃子目标扣分，本方的吃子目标加分
        4.0 * (own.cells - enemy.cells) as f64
            + 1.5 * (own.pips - enemy.pips) as f64
            + 0.5 * own.center as f64
            + 0.2 * mobility
            - 1.0 * enemy.targets as f64
            + 1.0 * own.targets as f64
    }

    fn name(&self) -> &'static str {
        "feature"
    }
}
