//! 棋子、阵营与位置定义

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_PIP, MIN_PIP};
use crate::error::GameError;

/// 阵营
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// 蓝方（追求多数格子的一方，效用函数以蓝方为准）
    Blue,
    /// 红方
    Red,
}

impl Side {
    /// 获取对方阵营
    pub fn opponent(&self) -> Side {
        match self {
            Side::Blue => Side::Red,
            Side::Red => Side::Blue,
        }
    }

    /// 获取记谱字符
    pub fn to_notation_char(&self) -> char {
        match self {
            Side::Blue => 'b',
            Side::Red => 'r',
        }
    }

    /// 从记谱字符解析
    pub fn from_notation_char(c: char) -> Option<Side> {
        match c {
            'b' | 'B' => Some(Side::Blue),
            'r' | 'R' => Some(Side::Red),
            _ => None,
        }
    }

    /// 数组索引（蓝 0，红 1）
    #[inline]
    pub fn index(&self) -> usize {
        match self {
            Side::Blue => 0,
            Side::Red => 1,
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Blue => write!(f, "Blue"),
            Side::Red => write!(f, "Red"),
        }
    }
}

/// 棋子：所属阵营 + 骰点
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Token {
    pub side: Side,
    pub pip: u8,
}

impl Token {
    /// 创建新棋子（检查骰点范围）
    pub fn new(side: Side, pip: u8) -> Result<Self, GameError> {
        if (MIN_PIP..=MAX_PIP).contains(&pip) {
            Ok(Self { side, pip })
        } else {
            Err(GameError::InvalidPip(pip))
        }
    }

    /// 创建新棋子（不检查骰点，内部使用）
    pub const fn new_unchecked(side: Side, pip: u8) -> Self {
        Self { side, pip }
    }

    /// 获取记谱字符串，例如 `b3`
    pub fn to_notation(&self) -> String {
        format!("{}{}", self.side.to_notation_char(), self.pip)
    }
}

/// 棋盘位置（行、列均从 0 开始）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub row: u8,
    pub col: u8,
}

impl Position {
    /// 创建新位置（检查是否在 size×size 棋盘内）
    pub fn new(row: u8, col: u8, size: usize) -> Option<Self> {
        if (row as usize) < size && (col as usize) < size {
            Some(Self { row, col })
        } else {
            None
        }
    }

    /// 创建新位置（不检查边界，内部使用）
    pub const fn new_unchecked(row: u8, col: u8) -> Self {
        Self { row, col }
    }

    /// 检查位置是否在 size×size 棋盘内
    pub fn is_valid(&self, size: usize) -> bool {
        (self.row as usize) < size && (self.col as usize) < size
    }

    /// 获取偏移后的位置
    pub fn offset(&self, dr: i8, dc: i8, size: usize) -> Option<Position> {
        let row = self.row as i16 + dr as i16;
        let col = self.col as i16 + dc as i16;
        if row >= 0 && (row as usize) < size && col >= 0 && (col as usize) < size {
            Some(Position {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    /// 曼哈顿距离
    pub fn manhattan(&self, other: Position) -> u32 {
        self.row.abs_diff(other.row) as u32 + self.col.abs_diff(other.col) as u32
    }

    /// 转换为数组索引（行优先）
    pub fn to_index(&self, size: usize) -> usize {
        self.row as usize * size + self.col as usize
    }

    /// 从数组索引转换
    pub fn from_index(index: usize, size: usize) -> Option<Self> {
        if index < size * size {
            Some(Position {
                row: (index / size) as u8,
                col: (index % size) as u8,
            })
        } else {
            None
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}
