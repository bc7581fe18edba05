//! 走法生成

use serde::{Deserialize, Serialize};

use crate::board::{Board, BoardState};
use crate::constants::{MAX_CAPTURE_SUM, MAX_NEIGHBORS, MIN_CAPTURE_CELLS, MIN_CAPTURE_SUM, MIN_PIP};
use crate::piece::Position;

/// 被吃格子集合（最多 4 个，内联存储以保持 `Move: Copy`）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Captures {
    cells: [Position; MAX_NEIGHBORS],
    len: u8,
}

impl Captures {
    /// 空集合
    pub const fn none() -> Self {
        Self {
            cells: [Position::new_unchecked(0, 0); MAX_NEIGHBORS],
            len: 0,
        }
    }

    /// 从切片创建（超出 4 个的部分被忽略）
    pub fn from_slice(cells: &[Position]) -> Self {
        let mut captures = Self::none();
        for &pos in cells.iter().take(MAX_NEIGHBORS) {
            captures.cells[captures.len as usize] = pos;
            captures.len += 1;
        }
        captures
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_slice(&self) -> &[Position] {
        &self.cells[..self.len as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.as_slice().iter()
    }

    pub fn contains(&self, pos: &Position) -> bool {
        self.as_slice().contains(pos)
    }
}

/// 走法
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Move {
    /// 落子位置
    pub target: Position,
    /// 落下的骰点
    pub pip: u8,
    /// 被吃掉的格子（为空或至少 2 个）
    pub captured: Captures,
}

impl Move {
    /// 不吃子的落子（骰点固定为 1）
    pub fn placement(target: Position) -> Self {
        Self {
            target,
            pip: MIN_PIP,
            captured: Captures::none(),
        }
    }

    /// 吃子走法
    pub fn capture(target: Position, pip: u8, captured: &[Position]) -> Self {
        Self {
            target,
            pip,
            captured: Captures::from_slice(captured),
        }
    }

    /// 是否吃子
    #[inline]
    pub fn is_capture(&self) -> bool {
        !self.captured.is_empty()
    }

    /// 吃掉的格子数
    #[inline]
    pub fn capture_count(&self) -> usize {
        self.captured.len()
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}={}", self.target, self.pip)?;
        if self.is_capture() {
            let cells: Vec<String> = self.captured.iter().map(|p| p.to_string()).collect();
            write!(f, " x[{}]", cells.join(" "))?;
        }
        Ok(())
    }
}

/// 走法生成器
pub struct MoveGenerator;

impl MoveGenerator {
    /// 生成所有合法走法
    ///
    /// 顺序固定：格子按行优先；同一格内按子集大小递增、再按相邻列表下标字典序。
    /// 搜索中的平局取舍依赖这个顺序。
    pub fn generate(state: &BoardState) -> Vec<Move> {
        let board = state.board();
        let mut moves = Vec::with_capacity(board.empty_count() * 2);

        for pos in board.empty_cells() {
            Self::generate_at(board, pos, &mut moves);
        }

        moves
    }

    /// 生成指定空格上的走法
    fn generate_at(board: &Board, target: Position, moves: &mut Vec<Move>) {
        let adjacent: Vec<(Position, u8)> = board
            .neighbors(target)
            .filter_map(|pos| board.get(pos).map(|token| (pos, token.pip)))
            .collect();

        if adjacent.len() < MIN_CAPTURE_CELLS {
            moves.push(Move::placement(target));
            return;
        }

        let before = moves.len();
        let mut indices = Vec::with_capacity(MAX_NEIGHBORS);
        for size in MIN_CAPTURE_CELLS..=adjacent.len() {
            Self::for_each_subset(adjacent.len(), size, 0, &mut indices, &mut |subset| {
                let sum: u8 = subset.iter().map(|&i| adjacent[i].1).sum();
                if (MIN_CAPTURE_SUM..=MAX_CAPTURE_SUM).contains(&sum) {
                    let cells: Vec<Position> = subset.iter().map(|&i| adjacent[i].0).collect();
                    moves.push(Move::capture(target, sum, &cells));
                }
            });
        }

        // 没有可吃的组合时退化为普通落子
        if moves.len() == before {
            moves.push(Move::placement(target));
        }
    }

    /// 按字典序枚举 `0..n` 中大小为 `size` 的下标组合
    fn for_each_subset(
        n: usize,
        size: usize,
        start: usize,
        current: &mut Vec<usize>,
        visit: &mut dyn FnMut(&[usize]),
    ) {
        if current.len() == size {
            visit(current.as_slice());
            return;
        }
        for i in start..n {
            current.push(i);
            Self::for_each_subset(n, size, i + 1, current, visit);
            current.pop();
        }
    }

    /// 筛选出吃子走法（保持原顺序）
    pub fn captures(moves: &[Move]) -> Vec<Move> {
        moves.iter().filter(|mv| mv.is_capture()).copied().collect()
    }

    /// 检查走法是否合法
    pub fn is_legal(state: &BoardState, mv: &Move) -> bool {
        Self::generate(state).contains(mv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::piece::{Side, Token};

    fn pos(row: u8, col: u8) -> Position {
        Position::new_unchecked(row, col)
    }

    fn state_with(size: usize, tokens: &[(Position, Side, u8)]) -> BoardState {
        let mut board = Board::new(size).unwrap();
        for &(p, side, pip) in tokens {
            board.set(p, Some(Token::new_unchecked(side, pip)));
        }
        BoardState::new(board, Side::Blue)
    }

    #[test]
    fn test_empty_board_moves() {
        let state = BoardState::initial(5, Side::Blue).unwrap();
        let moves = MoveGenerator::generate(&state);

        assert_eq!(moves.len(), 25);
        assert!(moves.iter().all(|m| m.pip == 1 && m.captured.is_empty()));
        // 行优先
        assert_eq!(moves[0].target, pos(0, 0));
        assert_eq!(moves[1].target, pos(0, 1));
        assert_eq!(moves[24].target, pos(4, 4));
    }

    #[test]
    fn test_capture_both_flanking_tokens() {
        let state = state_with(5, &[(pos(2, 0), Side::Red, 2), (pos(2, 2), Side::Red, 3)]);
        let moves = MoveGenerator::generate(&state);
        let at_target: Vec<_> = moves.iter().filter(|m| m.target == pos(2, 1)).collect();

        assert_eq!(at_target.len(), 1);
        let mv = at_target[0];
        assert_eq!(mv.pip, 5);
        assert_eq!(mv.capture_count(), 2);
        assert!(mv.captured.contains(&pos(2, 0)));
        assert!(mv.captured.contains(&pos(2, 2)));
    }

    #[test]
    fn test_single_neighbor_only_places_pip_one() {
        // (2,2) 与 (2,3) 相邻，但 (2,1) 只挨着 (2,2)
        let state = state_with(5, &[(pos(2, 2), Side::Red, 2), (pos(2, 3), Side::Red, 3)]);
        let moves = MoveGenerator::generate(&state);
        let at_target: Vec<_> = moves.iter().filter(|m| m.target == pos(2, 1)).collect();

        assert_eq!(at_target, vec![&Move::placement(pos(2, 1))]);
    }

    #[test]
    fn test_overweight_neighbors_fall_back_to_placement() {
        let state = state_with(3, &[(pos(0, 1), Side::Red, 4), (pos(1, 0), Side::Blue, 5)]);
        let moves = MoveGenerator::generate(&state);
        let at_corner: Vec<_> = moves.iter().filter(|m| m.target == pos(0, 0)).collect();

        assert_eq!(at_corner, vec![&Move::placement(pos(0, 0))]);
    }

    #[test]
    fn test_full_power_set_order() {
        // 中心四周各放一个 1 点：6 个二元组合、4 个三元组合、1 个四元组合
        let state = state_with(
            3,
            &[
                (pos(0, 1), Side::Red, 1),
                (pos(2, 1), Side::Blue, 1),
                (pos(1, 0), Side::Red, 1),
                (pos(1, 2), Side::Blue, 1),
            ],
        );
        let moves = MoveGenerator::generate(&state);
        let center: Vec<_> = moves.iter().filter(|m| m.target == pos(1, 1)).collect();

        assert_eq!(center.len(), 11);
        let sizes: Vec<usize> = center.iter().map(|m| m.capture_count()).collect();
        assert_eq!(sizes, vec![2, 2, 2, 2, 2, 2, 3, 3, 3, 3, 4]);

        // 上+下 排在最前，左+右 排在二元组合最后
        assert_eq!(center[0].captured.as_slice(), &[pos(0, 1), pos(2, 1)]);
        assert_eq!(center[5].captured.as_slice(), &[pos(1, 0), pos(1, 2)]);
        assert_eq!(center[10].pip, 4);
    }

    #[test]
    fn test_capture_invariants() {
        let state = state_with(
            5,
            &[
                (pos(1, 1), Side::Red, 1),
                (pos(1, 3), Side::Blue, 2),
                (pos(2, 2), Side::Red, 3),
                (pos(3, 1), Side::Blue, 4),
                (pos(0, 2), Side::Red, 6),
            ],
        );
        let board = state.board();

        for mv in MoveGenerator::generate(&state) {
            assert!(board.get(mv.target).is_none());
            if mv.is_capture() {
                assert!(mv.capture_count() >= 2);
                let sum: u8 = mv.captured.iter().map(|p| board.get(*p).unwrap().pip).sum();
                assert_eq!(sum, mv.pip);
                assert!((2..=6).contains(&mv.pip));
                for cell in mv.captured.iter() {
                    assert_eq!(cell.manhattan(mv.target), 1);
                }
            } else {
                assert_eq!(mv.pip, 1);
            }
        }
    }

    #[test]
    fn test_captures_filter() {
        let state = state_with(5, &[(pos(2, 0), Side::Red, 2), (pos(2, 2), Side::Red, 3)]);
        let moves = MoveGenerator::generate(&state);
        let captures = MoveGenerator::captures(&moves);
        assert_eq!(captures.len(), 1);
        assert!(MoveGenerator::is_legal(&state, &captures[0]));
        assert!(!MoveGenerator::is_legal(&state, &Move::placement(pos(2, 1))));
    }

    #[test]
    fn test_move_display() {
        let mv = Move::capture(pos(2, 1), 5, &[pos(2, 0), pos(2, 2)]);
        assert_eq!(mv.to_string(), "(2, 1)=5 x[(2, 0) (2, 2)]");
        assert_eq!(Move::placement(pos(0, 0)).to_string(), "(0, 0)=1");
    }
}
