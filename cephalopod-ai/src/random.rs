//! 随机走子（对战基准）

use cephalopod::{BoardState, CephalopodGame};
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::search::{CancelToken, SearchError, SearchOutcome, Strategy};

/// 均匀随机选一个合法走法
pub struct RandomMove {
    rng: ChaCha8Rng,
}

impl RandomMove {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for RandomMove {
    fn default() -> Self {
        Self::new()
    }
}

impl Strategy for RandomMove {
    fn name(&self) -> &'static str {
        "random"
    }

    fn choose(
        &mut self,
        game: &CephalopodGame,
        state: &BoardState,
        cancel: &CancelToken,
    ) -> Result<SearchOutcome, SearchError> {
        cancel.check()?;

        let moves = game.actions(state);
        let mv = moves
            .choose(&mut self.rng)
            .copied()
            .ok_or(SearchError::NoLegalMoves)?;
        debug!(strategy = self.name(), mv = %mv, "随机走子");

        Ok(SearchOutcome {
            value: 0.0,
            best_move: Some(mv),
            nodes: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cephalopod::{Notation, Side};

    #[test]
    fn test_random_move_is_legal() {
        let game = CephalopodGame::default();
        let mut state = game.initial();
        let mut strategy = RandomMove::with_seed(5);

        for _ in 0..30 {
            if game.is_terminal(&state) {
                break;
            }
            let outcome = strategy.choose(&game, &state, &CancelToken::new()).unwrap();
            let mv = outcome.best_move.unwrap();
            assert!(game.actions(&state).contains(&mv));
            state = game.result(&state, &mv);
        }
    }

    #[test]
    fn test_random_move_seeded() {
        let game = CephalopodGame::default();
        let state = game.initial();
        let cancel = CancelToken::new();

        let first = RandomMove::with_seed(9).choose(&game, &state, &cancel).unwrap();
        let second = RandomMove::with_seed(9).choose(&game, &state, &cancel).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_random_move_terminal_and_cancelled() {
        let game = CephalopodGame::new(2, Side::Blue).unwrap();
        let full = Notation::parse("b1r1/b2b3 r").unwrap();
        let mut strategy = RandomMove::with_seed(1);
        assert_eq!(
            strategy.choose(&game, &full, &CancelToken::new()),
            Err(SearchError::NoLegalMoves)
        );

        let cancel = CancelToken::new();
        cancel.cancel();
        assert_eq!(
            strategy.choose(&game, &game.initial(), &cancel),
            Err(SearchError::Cancelled)
        );
    }
}
