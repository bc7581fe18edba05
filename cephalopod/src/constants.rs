//! 规则常量定义

/// 默认棋盘边长
pub const DEFAULT_BOARD_SIZE: usize = 5;

/// 支持的最小棋盘边长
pub const MIN_BOARD_SIZE: usize = 1;

/// 支持的最大棋盘边长（行列坐标用 u8 表示）
pub const MAX_BOARD_SIZE: usize = 16;

/// 骰点最小值
pub const MIN_PIP: u8 = 1;

/// 骰点最大值
pub const MAX_PIP: u8 = 6;

/// 吃子时被吃格子的骰点和下限
pub const MIN_CAPTURE_SUM: u8 = 2;

/// 吃子时被吃格子的骰点和上限
pub const MAX_CAPTURE_SUM: u8 = 6;

/// 一次吃子至少吃掉的格子数
pub const MIN_CAPTURE_CELLS: usize = 2;

/// 一个格子最多的正交相邻格子数
pub const MAX_NEIGHBORS: usize = 4;

/// 正交方向（上、下、左、右），顺序决定走法生成顺序
pub const ORTHOGONAL_DIRECTIONS: [(i8, i8); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
