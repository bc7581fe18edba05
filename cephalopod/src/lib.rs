//! Cephalopod 规则库
//!
//! 包含:
//! - 阵营、棋子、位置、棋盘等核心数据结构
//! - 走法生成（含吃子组合枚举）
//! - 状态转移、终局判定与效用
//! - 棋盘记谱格式

mod board;
mod constants;
mod error;
mod game;
mod moves;
mod notation;
mod piece;

pub use board::{Board, BoardState, LastMove, StateKey};
pub use constants::*;
pub use error::{GameError, Result};
pub use game::CephalopodGame;
pub use moves::{Captures, Move, MoveGenerator};
pub use notation::Notation;
pub use piece::{Position, Side, Token};
