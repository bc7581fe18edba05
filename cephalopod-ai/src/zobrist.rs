//! Zobrist 哈希
//!
//! 用于蒙特卡洛模拟缓存的局面键

use cephalopod::{BoardState, Position, Side, Token, MAX_BOARD_SIZE, MAX_PIP};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// 格子数上限（按最大棋盘分配）
const MAX_CELLS: usize = MAX_BOARD_SIZE * MAX_BOARD_SIZE;

/// Zobrist 哈希表
///
/// 为每个格子上的每种（阵营, 骰点）组合生成一个随机值
pub struct ZobristTable {
    /// 棋子哈希值 [cell][side][pip - 1]
    /// cell 按最大棋盘的行优先索引，与实际棋盘尺寸无关
    tokens: Vec<[[u64; MAX_PIP as usize]; 2]>,
    /// 红方走子时的哈希值
    side_to_move: u64,
}

impl ZobristTable {
    /// 创建新的 Zobrist 表（使用固定种子保证确定性）
    pub fn new() -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(0xDEADBEEF_CAFE_1234);

        let mut tokens = vec![[[0u64; MAX_PIP as usize]; 2]; MAX_CELLS];
        for cell in tokens.iter_mut() {
            for side in cell.iter_mut() {
                for value in side.iter_mut() {
                    *value = rng.gen();
                }
            }
        }

        Self {
            tokens,
            side_to_move: rng.gen(),
        }
    }

    /// 计算局面（棋盘 + 走子方）的完整哈希值
    pub fn hash(&self, state: &BoardState) -> u64 {
        let mut hash = 0u64;

        for (pos, token) in state.board().occupied() {
            hash ^= self.token_hash(pos, token);
        }

        if state.to_move() == Side::Red {
            hash ^= self.side_to_move;
        }

        hash
    }

    /// 获取棋子的哈希值
    #[inline]
    pub fn token_hash(&self, pos: Position, token: Token) -> u64 {
        let cell = pos.to_index(MAX_BOARD_SIZE);
        self.tokens[cell][token.side.index()][(token.pip - 1) as usize]
    }

    /// 获取走子方切换的哈希值
    #[inline]
    pub fn side_hash(&self) -> u64 {
        self.side_to_move
    }
}

impl Default for ZobristTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cephalopod::{CephalopodGame, Move, Notation};

    #[test]
    fn test_zobrist_deterministic() {
        let table1 = ZobristTable::new();
        let table2 = ZobristTable::new();

        let state = Notation::parse("b1../.r3./..b6 r").unwrap();
        assert_eq!(table1.hash(&state), table2.hash(&state), "Zobrist 哈希应该是确定性的");
    }

    #[test]
    fn test_zobrist_different_positions() {
        let table = ZobristTable::new();
        let game = CephalopodGame::default();

        let state1 = game.initial();
        let state2 = game.result(&state1, &Move::placement(Position::new_unchecked(2, 2)));
        assert_ne!(table.hash(&state1), table.hash(&state2), "不同局面应该有不同的哈希值");

        // 同一格子不同骰点
        let a = Notation::parse("b2../.../... b").unwrap();
        let b = Notation::parse("b3../.../... b").unwrap();
        assert_ne!(table.hash(&a), table.hash(&b));
    }

    #[test]
    fn test_zobrist_side_matters() {
        let table = ZobristTable::new();
        let blue = Notation::parse("b1../.../... b").unwrap();
        let red = Notation::parse("b1../.../... r").unwrap();

        assert_eq!(table.hash(&blue) ^ table.side_hash(), table.hash(&red));
        assert_ne!(table.hash(&blue), table.hash(&red), "不同走子方应该有不同的哈希值");
    }

    #[test]
    fn test_zobrist_ignores_last_move() {
        let table = ZobristTable::new();
        let game = CephalopodGame::new(3, Side::Blue).unwrap();
        let played = game.result(&game.initial(), &Move::placement(Position::new_unchecked(0, 0)));
        let parsed = Notation::parse("b1../.../... r").unwrap();

        assert_eq!(table.hash(&played), table.hash(&parsed));
    }
}
