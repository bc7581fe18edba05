//! 错误类型定义

use thiserror::Error;

/// 规则错误
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GameError {
    /// 无效的骰点
    #[error("Invalid pip value: {0} (expected 1-6)")]
    InvalidPip(u8),

    /// 无效的棋盘尺寸
    #[error("Invalid board size: {0}")]
    InvalidBoardSize(usize),

    /// 无效的棋盘记谱字符串
    #[error("Invalid board notation: {reason}")]
    InvalidNotation { reason: String },

    /// 非法走法
    #[error("Illegal move: {0}")]
    IllegalMove(String),

    /// 游戏已结束
    #[error("Game is already over")]
    GameOver,
}

/// 规则操作结果类型
pub type Result<T> = std::result::Result<T, GameError>;
