//! Read-only projections of the application state for rendering

use aimi_core::{
    progress_bar_width, progress_percent, Reward, StatusColor, Theme, User, DEFAULT_THEME_NAME,
};
use serde::{Deserialize, Serialize};

/// Header card: who is signed in and how far along the level is
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub username: String,
    pub initial: Option<char>,
    pub level: u32,
    pub points: u32,
    /// Unclamped, may fall outside 0..=100
    pub progress_percent: f64,
    /// Clamped to 0..=100
    pub bar_width: f64,
}

impl Dashboard {
    pub fn for_user(user: &User) -> Self {
        let progress = progress_percent(user.level, user.points);
        Self {
            username: user.username.clone(),
            initial: user.initial(),
            level: user.level,
            points: user.points,
            progress_percent: progress,
            bar_width: progress_bar_width(progress),
        }
    }
}

/// Theme card for the level being viewed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSummary {
    pub name: String,
    pub blurb: String,
    pub background_image: Option<String>,
}

impl ThemeSummary {
    pub fn new(theme: Option<&Theme>, viewed_level: u32, user_level: u32) -> Self {
        let name = theme
            .map(|t| t.name.clone())
            .unwrap_or_else(|| DEFAULT_THEME_NAME.to_string());

        let blurb = if viewed_level == user_level {
            format!(
                "You're currently at level {} in the {} zone. Keep collecting points to progress further!",
                viewed_level, name
            )
        } else {
            format!(
                "This is level {} in the {} zone. You've already passed this level!",
                viewed_level, name
            )
        };

        Self {
            name,
            blurb,
            background_image: theme.map(|t| t.background_image.clone()),
        }
    }

    /// Card title ("Carrot Farm Theme")
    pub fn title(&self) -> String {
        format!("{} Theme", self.name)
    }
}

/// One reward as the rewards grid shows it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RewardCard {
    pub reward: Reward,
    pub color: StatusColor,
    pub can_redeem: bool,
}

impl RewardCard {
    pub fn new(reward: &Reward, user_level: u32) -> Self {
        Self {
            color: reward.display_color(user_level),
            can_redeem: reward.status.can_redeem(),
            reward: reward.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimi_core::{catalog, RewardStatus};

    #[test]
    fn test_dashboard_for_demo_user() {
        let dashboard = Dashboard::for_user(&catalog::demo_user());
        assert_eq!(dashboard.initial, Some('A'));
        assert_eq!(dashboard.progress_percent, -1250.0);
        assert_eq!(dashboard.bar_width, 0.0);
    }

    #[test]
    fn test_theme_summary_blurbs() {
        let themes = catalog::themes();
        let farm = &themes[1];

        let current = ThemeSummary::new(Some(farm), 15, 15);
        assert_eq!(current.title(), "Carrot Farm Theme");
        assert!(current.blurb.starts_with("You're currently at level 15 in the Carrot Farm zone"));

        let passed = ThemeSummary::new(Some(farm), 12, 15);
        assert_eq!(
            passed.blurb,
            "This is level 12 in the Carrot Farm zone. You've already passed this level!"
        );
    }

    #[test]
    fn test_theme_summary_defaults_name() {
        let summary = ThemeSummary::new(None, 3, 3);
        assert_eq!(summary.name, "Adventure");
        assert!(summary.background_image.is_none());
    }

    #[test]
    fn test_reward_cards() {
        let cards: Vec<RewardCard> = catalog::rewards()
            .iter()
            .map(|r| RewardCard::new(r, 15))
            .collect();

        for card in &cards {
            assert_eq!(card.can_redeem, card.reward.status == RewardStatus::Available);
        }
        let locked_above = cards
            .iter()
            .find(|c| c.reward.status == RewardStatus::Locked && c.reward.required_level > 15)
            .unwrap();
        assert_eq!(locked_above.color, StatusColor::Muted);
    }
}
