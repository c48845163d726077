//! Level progress math and the level path

use crate::{theme_for_level, Theme};
use serde::{Deserialize, Serialize};

/// Last level on the path
pub const MAX_LEVEL: u32 = 100;

/// Points between consecutive levels
pub const POINTS_PER_LEVEL: i64 = 10;

/// Every n-th level carries a bonus marker
pub const BONUS_INTERVAL: u32 = 7;

/// Points threshold at which `level` starts
pub fn points_for_level(level: u32) -> i64 {
    i64::from(level) * POINTS_PER_LEVEL
}

/// Percentage progress from `level` toward `level + 1`.
///
/// Not clamped: point totals below the level floor give negative values and
/// totals past the next threshold give values above 100. Use
/// [`progress_bar_width`] for rendering.
pub fn progress_percent(level: u32, points: u32) -> f64 {
    let floor = points_for_level(level);
    (i64::from(points) - floor) as f64 / POINTS_PER_LEVEL as f64 * 100.0
}

/// Progress clamped to `[0, 100]` for a progress bar
pub fn progress_bar_width(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    percent.clamp(0.0, 100.0)
}

/// Whether the level shows a bonus gift marker (display only)
pub fn has_reward(level: u32) -> bool {
    level % BONUS_INTERVAL == 0
}

/// Resolve a level-path click.
///
/// Levels already reached (`1..=user_level`) are browsable; anything else
/// leaves `current` unchanged.
pub fn select_level(requested: u32, user_level: u32, current: u32) -> u32 {
    if requested >= 1 && requested <= user_level {
        requested
    } else {
        current
    }
}

/// Where a node sits relative to the selected level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LevelPosition {
    Passed,
    Current,
    Upcoming,
}

/// One stop on the level path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelNode {
    pub level: u32,
    pub theme_id: Option<u32>,
    pub has_reward: bool,
    pub position: LevelPosition,
    /// Theme name, set on the first level of each theme
    pub theme_label: Option<String>,
}

/// Build the full 1..=100 path around the selected level
pub fn level_path(themes: &[Theme], selected: u32) -> Vec<LevelNode> {
    (1..=MAX_LEVEL)
        .map(|level| {
            let theme = theme_for_level(level, themes);
            let position = match level.cmp(&selected) {
                std::cmp::Ordering::Less => LevelPosition::Passed,
                std::cmp::Ordering::Equal => LevelPosition::Current,
                std::cmp::Ordering::Greater => LevelPosition::Upcoming,
            };
            LevelNode {
                level,
                theme_id: theme.map(|t| t.id),
                has_reward: has_reward(level),
                position,
                theme_label: theme
                    .filter(|t| t.start_level == level)
                    .map(|t| t.name.clone()),
            }
        })
        .collect()
}
