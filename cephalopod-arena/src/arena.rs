//! AI 对战
//!
//! 两个限时执行器轮流走子，直到终局或达到步数上限。

use anyhow::{Context, Result};
use cephalopod::{BoardState, Notation, Side};
use cephalopod_ai::{MoveSource, TimeBoundedExecutor};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::ArenaConfig;

/// 单局结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameReport {
    /// 对局序号（从 0 开始）
    pub index: u32,
    pub first_player: Side,
    pub winner: Side,
    /// 总步数
    pub plies: u32,
    pub blue_cells: usize,
    pub red_cells: usize,
    /// 因超时或搜索失败而随机走子的次数（蓝、红）
    pub fallbacks: [u32; 2],
    /// 达到步数上限被截断
    pub truncated: bool,
    /// 终局局面记谱
    pub final_position: String,
}

/// 累计战绩
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scoreboard {
    pub games: u32,
    pub blue_wins: u32,
    pub red_wins: u32,
    /// 被截断的对局数
    pub truncated: u32,
    pub total_plies: u64,
    /// 随机走子次数（蓝、红）
    pub fallbacks: [u32; 2],
}

impl Scoreboard {
    pub fn record(&mut self, report: &GameReport) {
        self.games += 1;
        match report.winner {
            Side::Blue => self.blue_wins += 1,
            Side::Red => self.red_wins += 1,
        }
        if report.truncated {
            self.truncated += 1;
        }
        self.total_plies += u64::from(report.plies);
        self.fallbacks[0] += report.fallbacks[0];
        self.fallbacks[1] += report.fallbacks[1];
    }

    pub fn wins(&self, side: Side) -> u32 {
        match side {
            Side::Blue => self.blue_wins,
            Side::Red => self.red_wins,
        }
    }

    /// 平均步数
    pub fn average_plies(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.total_plies as f64 / f64::from(self.games)
        }
    }
}

impl std::fmt::Display for Scoreboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "共 {} 局: 蓝方胜 {} 局, 红方胜 {} 局, 截断 {} 局, 平均 {:.1} 步, 随机走子 蓝 {} / 红 {}",
            self.games,
            self.blue_wins,
            self.red_wins,
            self.truncated,
            self.average_plies(),
            self.fallbacks[0],
            self.fallbacks[1],
        )
    }
}

/// 对战场
pub struct Arena {
    config: ArenaConfig,
    blue: TimeBoundedExecutor,
    red: TimeBoundedExecutor,
}

impl Arena {
    pub fn new(config: ArenaConfig) -> Result<Self> {
        config.validate()?;
        let blue = config.blue.build_executor();
        let red = config.red.build_executor();
        Ok(Self { config, blue, red })
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    fn executor(&self, side: Side) -> &TimeBoundedExecutor {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }

    /// 第 `index` 局的先手方
    pub fn first_player(&self, index: u32) -> Side {
        if self.config.alternate_first && index % 2 == 1 {
            self.config.first_player.opponent()
        } else {
            self.config.first_player
        }
    }

    /// 下一局
    pub async fn play_game(&self, index: u32) -> Result<GameReport> {
        let mut config = self.config.clone();
        config.first_player = self.first_player(index);
        let game = config.game()?;

        info!(
            game = index,
            first = %config.first_player,
            blue = self.blue.strategy_name(),
            red = self.red.strategy_name(),
            "对局开始"
        );

        let mut state: BoardState = game.initial();
        let mut plies = 0u32;
        let mut fallbacks = [0u32; 2];

        while !game.is_terminal(&state) && plies < self.config.max_plies {
            let side = state.to_move();
            let Some(selection) = self.executor(side).select_move(&game, &state).await else {
                warn!(game = index, ply = plies, "非终局却没有可选走法");
                break;
            };

            if selection.source != MoveSource::Search {
                fallbacks[side.index()] += 1;
            }

            state = game
                .try_result(&state, &selection.mv)
                .with_context(|| format!("第 {} 局第 {} 步走法无效", index, plies))?;
            plies += 1;

            info!(
                game = index,
                ply = plies,
                side = %side,
                mv = %selection.mv,
                source = %selection.source,
                elapsed_ms = selection.elapsed.as_millis() as u64,
                "走子"
            );
            debug!("\n{}", state.board());
        }

        let truncated = !game.is_terminal(&state);
        let report = GameReport {
            index,
            first_player: config.first_player,
            winner: game.winner(&state),
            plies,
            blue_cells: state.count(Side::Blue),
            red_cells: state.count(Side::Red),
            fallbacks,
            truncated,
            final_position: Notation::to_string(&state),
        };

        if truncated {
            warn!(game = index, plies, "达到步数上限，按当前局面判定");
        }
        info!(
            game = index,
            winner = %report.winner,
            plies,
            blue = report.blue_cells,
            red = report.red_cells,
            "对局结束"
        );
        Ok(report)
    }

    /// 按配置连续进行所有对局
    pub async fn run(&self) -> Result<Scoreboard> {
        let mut scoreboard = Scoreboard::default();
        for index in 0..self.config.games {
            let report = self.play_game(index).await?;
            scoreboard.record(&report);
        }
        info!("{}", scoreboard);
        Ok(scoreboard)
    }
}
