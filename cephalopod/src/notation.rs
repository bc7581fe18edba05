//! 棋盘记谱格式解析和生成
//!
//! 格式：`<棋盘> <走子方>`，棋盘按行用 `/` 分隔，每格为 `.`（空）或
//! `b<骰点>` / `r<骰点>`。
//!
//! 示例：
//! `...../...../r2.r3../...../..... b`

use crate::board::{Board, BoardState};
use crate::error::GameError;
use crate::piece::{Position, Side, Token};

/// 棋盘记谱处理
pub struct Notation;

impl Notation {
    /// 解析记谱字符串为棋盘状态（走子方缺省为蓝方）
    pub fn parse(text: &str) -> Result<BoardState, GameError> {
        let parts: Vec<&str> = text.split_whitespace().collect();
        if parts.is_empty() {
            return Err(GameError::InvalidNotation {
                reason: "Empty notation string".to_string(),
            });
        }

        let board = Self::parse_board(parts[0])?;

        let to_move = match parts.get(1) {
            Some(part) => {
                let c = part.chars().next().unwrap_or('b');
                Side::from_notation_char(c).ok_or_else(|| GameError::InvalidNotation {
                    reason: format!("Invalid side to move: {}", part),
                })?
            }
            None => Side::Blue,
        };

        Ok(BoardState::new(board, to_move))
    }

    /// 解析棋盘部分
    fn parse_board(board_str: &str) -> Result<Board, GameError> {
        let rows: Vec<&str> = board_str.split('/').collect();
        let size = rows.len();
        let mut board = Board::new(size).map_err(|_| GameError::InvalidNotation {
            reason: format!("Unsupported board size: {}", size),
        })?;

        for (row_idx, row) in rows.iter().enumerate() {
            let mut col = 0usize;
            let mut chars = row.chars();

            while let Some(c) = chars.next() {
                if col >= size {
                    return Err(GameError::InvalidNotation {
                        reason: format!("Row {} has too many columns", row_idx),
                    });
                }

                if c == '.' {
                    col += 1;
                    continue;
                }

                let side = Side::from_notation_char(c).ok_or_else(|| GameError::InvalidNotation {
                    reason: format!("Invalid cell character: {}", c),
                })?;
                let pip = chars
                    .next()
                    .and_then(|d| d.to_digit(10))
                    .ok_or_else(|| GameError::InvalidNotation {
                        reason: format!("Missing pip after '{}' in row {}", c, row_idx),
                    })?;
                let token = Token::new(side, pip as u8)?;
                board.set(Position::new_unchecked(row_idx as u8, col as u8), Some(token));
                col += 1;
            }

            if col != size {
                return Err(GameError::InvalidNotation {
                    reason: format!("Row {} has {} columns, expected {}", row_idx, col, size),
                });
            }
        }

        Ok(board)
    }

    /// 将棋盘状态转换为记谱字符串
    pub fn to_string(state: &BoardState) -> String {
        format!(
            "{} {}",
            Self::board_to_string(state.board()),
            state.to_move().to_notation_char()
        )
    }

    /// 将棋盘转换为记谱的棋盘部分
    pub fn board_to_string(board: &Board) -> String {
        let size = board.size();
        let mut rows = Vec::with_capacity(size);

        for row in 0..size {
            let mut line = String::new();
            for col in 0..size {
                match board.get(Position::new_unchecked(row as u8, col as u8)) {
                    Some(token) => line.push_str(&token.to_notation()),
                    None => line.push('.'),
                }
            }
            rows.push(line);
        }

        rows.join("/")
    }
}
