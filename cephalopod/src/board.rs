//! 棋盘状态

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_BOARD_SIZE, MIN_BOARD_SIZE, ORTHOGONAL_DIRECTIONS};
use crate::error::GameError;
use crate::piece::{Position, Side, Token};

/// 棋盘
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    /// 边长
    size: usize,
    /// size×size 个格子，索引为 row * size + col
    cells: Vec<Option<Token>>,
}

impl Board {
    /// 创建空棋盘
    pub fn new(size: usize) -> Result<Self, GameError> {
        if !(MIN_BOARD_SIZE..=MAX_BOARD_SIZE).contains(&size) {
            return Err(GameError::InvalidBoardSize(size));
        }
        Ok(Self::empty_unchecked(size))
    }

    /// 创建空棋盘（不检查尺寸，内部使用）
    pub(crate) fn empty_unchecked(size: usize) -> Self {
        Self {
            size,
            cells: vec![None; size * size],
        }
    }

    /// 棋盘边长
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    /// 格子总数
    #[inline]
    pub fn area(&self) -> usize {
        self.size * self.size
    }

    /// 获取指定位置的棋子
    pub fn get(&self, pos: Position) -> Option<Token> {
        if pos.is_valid(self.size) {
            self.cells[pos.to_index(self.size)]
        } else {
            None
        }
    }

    /// 设置指定位置的棋子（用于摆局面，越界时忽略）
    pub fn set(&mut self, pos: Position, token: Option<Token>) {
        if pos.is_valid(self.size) {
            let index = pos.to_index(self.size);
            self.cells[index] = token;
        }
    }

    /// 检查棋盘是否已满
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_some())
    }

    /// 统计指定阵营占据的格子数
    pub fn count(&self, side: Side) -> usize {
        self.cells
            .iter()
            .filter(|cell| matches!(cell, Some(token) if token.side == side))
            .count()
    }

    /// 空格数量
    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|cell| cell.is_none()).count()
    }

    /// 指定阵营的骰点总和
    pub fn pip_sum(&self, side: Side) -> u32 {
        self.occupied()
            .filter(|(_, token)| token.side == side)
            .map(|(_, token)| token.pip as u32)
            .sum()
    }

    /// 所有位置（行优先）
    pub fn positions(&self) -> impl Iterator<Item = Position> + '_ {
        (0..self.area()).filter_map(move |index| Position::from_index(index, self.size))
    }

    /// 所有被占据的格子（行优先）
    pub fn occupied(&self) -> impl Iterator<Item = (Position, Token)> + '_ {
        self.positions()
            .filter_map(move |pos| self.get(pos).map(|token| (pos, token)))
    }

    /// 所有空格（行优先）
    pub fn empty_cells(&self) -> impl Iterator<Item = Position> + '_ {
        self.positions().filter(move |pos| self.get(*pos).is_none())
    }

    /// 正交相邻位置（上、下、左、右）
    pub fn neighbors(&self, pos: Position) -> impl Iterator<Item = Position> + '_ {
        ORTHOGONAL_DIRECTIONS
            .iter()
            .filter_map(move |&(dr, dc)| pos.offset(dr, dc, self.size))
    }

    /// 中心位置（偶数边长时取右下方那一格）
    pub fn center(&self) -> Position {
        let c = (self.size / 2) as u8;
        Position::new_unchecked(c, c)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for row in 0..self.size {
            let line: Vec<String> = (0..self.size)
                .map(|col| {
                    match self.get(Position::new_unchecked(row as u8, col as u8)) {
                        Some(token) => token.to_notation(),
                        None => " .".to_string(),
                    }
                })
                .collect();
            writeln!(f, "{}", line.join(" "))?;
        }
        Ok(())
    }
}

/// 上一步记录（仅用于显示和审计，搜索不会读取）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    /// 落子位置
    pub placed: Position,
    /// 被吃掉的格子
    pub captured: Vec<Position>,
}

/// 完整的棋盘状态（棋盘 + 走子方 + 上一步记录）
///
/// 状态是不可变值：每次走子都产生新实例，递归搜索分支之间不会共享可变数据。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoardState {
    board: Board,
    to_move: Side,
    last_move: Option<LastMove>,
}

impl BoardState {
    /// 从棋盘创建状态
    pub fn new(board: Board, to_move: Side) -> Self {
        Self {
            board,
            to_move,
            last_move: None,
        }
    }

    /// 创建空棋盘的初始状态
    pub fn initial(size: usize, first_player: Side) -> Result<Self, GameError> {
        Ok(Self::new(Board::new(size)?, first_player))
    }

    /// 走子后构造新状态
    pub(crate) fn after_move(board: Board, to_move: Side, last_move: LastMove) -> Self {
        Self {
            board,
            to_move,
            last_move: Some(last_move),
        }
    }

    /// 棋盘
    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    /// 当前走子方
    #[inline]
    pub fn to_move(&self) -> Side {
        self.to_move
    }

    /// 上一步记录
    pub fn last_move(&self) -> Option<&LastMove> {
        self.last_move.as_ref()
    }

    /// 棋盘边长
    #[inline]
    pub fn size(&self) -> usize {
        self.board.size()
    }

    /// 指定阵营占据的格子数
    pub fn count(&self, side: Side) -> usize {
        self.board.count(side)
    }

    /// 规范化键（棋盘 + 走子方，不含上一步记录）
    pub fn key(&self) -> StateKey {
        let mut bytes = Vec::with_capacity(self.board.area() + 1);
        for cell in &self.board.cells {
            bytes.push(match cell {
                None => 0,
                Some(token) => token.side.index() as u8 * 6 + token.pip,
            });
        }
        bytes.push(self.to_move.index() as u8);
        StateKey(bytes.into_boxed_slice())
    }
}

/// 局面的规范化编码：每格一个字节加一个走子方字节，无碰撞
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StateKey(Box<[u8]>);

impl StateKey {
    /// 原始字节
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}
