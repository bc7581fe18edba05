//! 对战配置
//!
//! JSON 文件，默认位于 `<config_dir>/cephalopod/arena.json`。

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cephalopod::{CephalopodGame, Side, DEFAULT_BOARD_SIZE};
use cephalopod_ai::{AiConfig, Difficulty};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// 阻塞线程池默认大小
pub const DEFAULT_BLOCKING_THREADS: usize = 4;

/// 单局步数上限
pub const DEFAULT_MAX_PLIES: u32 = 500;

/// 对战配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    /// 棋盘边长
    pub board_size: usize,
    /// 先手方
    pub first_player: Side,
    /// 对局数
    pub games: u32,
    /// 每局交换先后手
    pub alternate_first: bool,
    /// 搜索用的阻塞线程数
    pub blocking_threads: usize,
    /// 单局步数上限，超过后按当前局面判定胜负
    pub max_plies: u32,
    /// 蓝方 AI
    pub blue: AiConfig,
    /// 红方 AI
    pub red: AiConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            board_size: DEFAULT_BOARD_SIZE,
            first_player: Side::Blue,
            games: 10,
            alternate_first: true,
            blocking_threads: DEFAULT_BLOCKING_THREADS,
            max_plies: DEFAULT_MAX_PLIES,
            blue: AiConfig::from_difficulty(Difficulty::Hard),
            red: AiConfig::from_difficulty(Difficulty::Medium),
        }
    }
}

impl ArenaConfig {
    /// 默认配置文件路径
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut path| {
            path.push("cephalopod");
            path.push("arena.json");
            path
        })
    }

    /// 加载配置
    ///
    /// 未指定路径时使用默认路径；文件不存在时使用默认配置。
    /// 文件存在但无法读取或解析时报错。
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) => path,
                None => {
                    warn!("无法获取配置目录，使用默认配置");
                    return Ok(Self::default());
                }
            },
        };

        if !path.exists() {
            info!("配置文件不存在，使用默认配置: {:?}", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("读取配置文件失败: {:?}", path))?;
        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("配置文件格式无效: {:?}", path))?;
        config.validate()?;

        info!("已加载配置: {:?}", path);
        Ok(config)
    }

    /// 保存配置
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("无法创建配置目录: {:?}", parent))?;
        }

        let content = serde_json::to_string_pretty(self).context("序列化配置失败")?;
        fs::write(path, content).with_context(|| format!("写入配置文件失败: {:?}", path))?;

        info!("配置已保存: {:?}", path);
        Ok(())
    }

    /// 校验配置
    pub fn validate(&self) -> Result<()> {
        self.game()?;
        if self.blocking_threads == 0 {
            anyhow::bail!("阻塞线程数必须大于 0");
        }
        if self.max_plies == 0 {
            anyhow::bail!("步数上限必须大于 0");
        }
        Ok(())
    }

    /// 按配置创建规则实例
    pub fn game(&self) -> Result<CephalopodGame> {
        CephalopodGame::new(self.board_size, self.first_player)
            .with_context(|| format!("无效的棋盘尺寸: {}", self.board_size))
    }

    /// 双方 AI 配置
    pub fn ai(&self, side: Side) -> &AiConfig {
        match side {
            Side::Blue => &self.blue,
            Side::Red => &self.red,
        }
    }

    /// 给双方设置随机种子
    ///
    /// 蓝方用 `seed`，红方用 `seed + 1`，避免双方走出同样的随机序列。
    pub fn apply_seed(&mut self, seed: u64) {
        self.blue.mcts.seed = Some(seed);
        self.red.mcts.seed = Some(seed.wrapping_add(1));
    }
}
