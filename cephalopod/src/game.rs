//! 游戏规则：走法、状态转移、终局判定与效用

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardState, LastMove};
use crate::constants::DEFAULT_BOARD_SIZE;
use crate::error::GameError;
use crate::moves::{Move, MoveGenerator};
use crate::piece::{Side, Token};

/// Cephalopod 规则
///
/// 只保存不可变配置（边长、先手），本身没有可变状态。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CephalopodGame {
    size: usize,
    first_player: Side,
}

impl CephalopodGame {
    /// 创建规则实例
    pub fn new(size: usize, first_player: Side) -> Result<Self, GameError> {
        // 借用棋盘构造做尺寸校验
        BoardState::initial(size, first_player)?;
        Ok(Self { size, first_player })
    }

    /// 棋盘边长
    pub fn size(&self) -> usize {
        self.size
    }

    /// 先手方
    pub fn first_player(&self) -> Side {
        self.first_player
    }

    /// 初始状态（空棋盘，先手方走子）
    pub fn initial(&self) -> BoardState {
        // 尺寸在构造时已校验
        BoardState::new(Board::empty_unchecked(self.size), self.first_player)
    }

    /// 合法走法（非终局时不为空）
    pub fn actions(&self, state: &BoardState) -> Vec<Move> {
        MoveGenerator::generate(state)
    }

    /// 执行走法，返回新状态
    ///
    /// 调用方负责保证走法合法；非法走法的结果没有意义（但不会越界）。
    pub fn result(&self, state: &BoardState, mv: &Move) -> BoardState {
        let mover = state.to_move();
        let mut board = state.board().clone();

        board.set(mv.target, Some(Token::new_unchecked(mover, mv.pip)));
        for &pos in mv.captured.iter() {
            board.set(pos, None);
        }

        let last_move = LastMove {
            placed: mv.target,
            captured: mv.captured.as_slice().to_vec(),
        };
        BoardState::after_move(board, mover.opponent(), last_move)
    }

    /// 校验后执行走法
    pub fn try_result(&self, state: &BoardState, mv: &Move) -> Result<BoardState, GameError> {
        if self.is_terminal(state) {
            return Err(GameError::GameOver);
        }
        if !MoveGenerator::is_legal(state, mv) {
            return Err(GameError::IllegalMove(mv.to_string()));
        }
        Ok(self.result(state, mv))
    }

    /// 终局：棋盘没有空格
    pub fn is_terminal(&self, state: &BoardState) -> bool {
        state.board().is_full()
    }

    /// 效用值
    ///
    /// 只有视角为蓝方且蓝方格子数严格多于红方时为 +1，其余情况（包括平局、
    /// 红方视角）一律为 -1。
    pub fn utility(&self, state: &BoardState, perspective: Side) -> i32 {
        let blue = state.count(Side::Blue);
        let red = state.count(Side::Red);
        if perspective == Side::Blue && blue > red {
            1
        } else {
            -1
        }
    }

    /// 终局胜者（按蓝方视角的效用判定，平局算红方）
    pub fn winner(&self, state: &BoardState) -> Side {
        if self.utility(state, Side::Blue) == 1 {
            Side::Blue
        } else {
            Side::Red
        }
    }
}

impl Default for CephalopodGame {
    fn default() -> Self {
        Self {
            size: DEFAULT_BOARD_SIZE,
            first_player: Side::Blue,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::Position;

    fn pos(row: u8, col: u8) -> Position {
        Position::new_unchecked(row, col)
    }

    fn fill(board: &mut Board, blue: usize) {
        let positions: Vec<_> = board.positions().collect();
        for (i, p) in positions.into_iter().enumerate() {
            let side = if i < blue { Side::Blue } else { Side::Red };
            board.set(p, Some(Token::new_unchecked(side, 1)));
        }
    }

    #[test]
    fn test_initial_state() {
        let game = CephalopodGame::default();
        let state = game.initial();
        assert_eq!(state.size(), 5);
        assert_eq!(state.to_move(), Side::Blue);
        assert!(state.last_move().is_none());
        assert!(!game.is_terminal(&state));
        assert_eq!(game.actions(&state).len(), 25);
    }

    #[test]
    fn test_invalid_game_size() {
        assert_eq!(
            CephalopodGame::new(0, Side::Blue),
            Err(GameError::InvalidBoardSize(0))
        );
        assert_eq!(CephalopodGame::new(3, Side::Red).unwrap().initial().to_move(), Side::Red);
    }

    #[test]
    fn test_result_places_and_flips() {
        let game = CephalopodGame::default();
        let state = game.initial();
        let mv = Move::placement(pos(2, 2));
        let next = game.result(&state, &mv);

        assert_eq!(next.to_move(), Side::Red);
        assert_eq!(
            next.board().get(pos(2, 2)),
            Some(Token::new_unchecked(Side::Blue, 1))
        );
        assert_eq!(next.board().empty_count(), 24);
        assert_eq!(next.last_move().unwrap().placed, pos(2, 2));
        // 原状态不变
        assert_eq!(state.board().empty_count(), 25);
    }

    #[test]
    fn test_result_captures() {
        let game = CephalopodGame::default();
        let mut board = Board::new(5).unwrap();
        board.set(pos(2, 0), Some(Token::new_unchecked(Side::Red, 2)));
        board.set(pos(2, 2), Some(Token::new_unchecked(Side::Blue, 3)));
        let state = BoardState::new(board, Side::Blue);

        let mv = Move::capture(pos(2, 1), 5, &[pos(2, 0), pos(2, 2)]);
        let next = game.try_result(&state, &mv).unwrap();

        assert_eq!(next.board().get(pos(2, 0)), None);
        assert_eq!(next.board().get(pos(2, 2)), None);
        assert_eq!(next.board().get(pos(2, 1)), Some(Token::new_unchecked(Side::Blue, 5)));
        assert_eq!(next.last_move().unwrap().captured, vec![pos(2, 0), pos(2, 2)]);
    }

    #[test]
    fn test_empty_cell_delta_over_playout() {
        let game = CephalopodGame::new(3, Side::Blue).unwrap();
        let mut state = game.initial();

        // 每一步都取最后一个走法（偏向多吃子），检查空格变化
        for _ in 0..200 {
            if game.is_terminal(&state) {
                break;
            }
            let moves = game.actions(&state);
            assert!(!moves.is_empty());
            let mv = *moves.last().unwrap();
            let next = game.result(&state, &mv);

            let before = state.board().empty_count() as i64;
            let after = next.board().empty_count() as i64;
            assert_eq!(before - after, 1 - mv.capture_count() as i64);
            assert_eq!(next.to_move(), state.to_move().opponent());
            state = next;
        }
    }

    #[test]
    fn test_try_result_rejects_illegal() {
        let game = CephalopodGame::default();
        let state = game.initial();
        let bogus = Move::capture(pos(0, 0), 2, &[pos(0, 1), pos(1, 0)]);
        assert!(matches!(
            game.try_result(&state, &bogus),
            Err(GameError::IllegalMove(_))
        ));

        let mut board = Board::new(1).unwrap();
        board.set(pos(0, 0), Some(Token::new_unchecked(Side::Blue, 1)));
        let full = BoardState::new(board, Side::Red);
        assert_eq!(
            game.try_result(&full, &Move::placement(pos(0, 0))),
            Err(GameError::GameOver)
        );
    }

    #[test]
    fn test_utility_blue_majority() {
        let game = CephalopodGame::new(3, Side::Blue).unwrap();
        let mut board = Board::new(3).unwrap();
        fill(&mut board, 5);
        let state = BoardState::new(board, Side::Red);

        assert!(game.is_terminal(&state));
        assert_eq!(game.utility(&state, Side::Blue), 1);
        // 红方视角一律 -1
        assert_eq!(game.utility(&state, Side::Red), -1);
        assert_eq!(game.winner(&state), Side::Blue);
    }

    #[test]
    fn test_utility_red_majority() {
        let game = CephalopodGame::new(3, Side::Blue).unwrap();
        let mut board = Board::new(3).unwrap();
        fill(&mut board, 4);
        let state = BoardState::new(board, Side::Blue);

        assert_eq!(game.utility(&state, Side::Blue), -1);
        assert_eq!(game.utility(&state, Side::Red), -1);
        assert_eq!(game.winner(&state), Side::Red);
    }

    #[test]
    fn test_utility_tie_goes_against_blue() {
        let game = CephalopodGame::new(2, Side::Blue).unwrap();
        let mut board = Board::new(2).unwrap();
        fill(&mut board, 2);
        let state = BoardState::new(board, Side::Blue);

        assert!(game.is_terminal(&state));
        assert_eq!(game.utility(&state, Side::Blue), -1);
        assert_eq!(game.winner(&state), Side::Red);
    }
}
