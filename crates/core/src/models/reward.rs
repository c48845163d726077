//! Reward catalog models and redemption rules

use crate::{Error, RawId, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-user status of a reward
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewardStatus {
    Locked,
    Available,
    Redeemed,
}

impl RewardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardStatus::Locked => "Locked",
            RewardStatus::Available => "Available",
            RewardStatus::Redeemed => "Redeemed",
        }
    }

    /// Parse a backend status string; anything unrecognized counts as Locked
    pub fn parse_lenient(raw: &str) -> Self {
        match raw.trim() {
            "Available" => RewardStatus::Available,
            "Redeemed" => RewardStatus::Redeemed,
            _ => RewardStatus::Locked,
        }
    }

    /// Redemption is gated by status only
    pub fn can_redeem(&self) -> bool {
        *self == RewardStatus::Available
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Colour class for a reward's status label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusColor {
    Muted,
    Positive,
    Pending,
}

/// Classify a reward for display
pub fn display_color(status: RewardStatus, required_level: u32, user_level: u32) -> StatusColor {
    match status {
        RewardStatus::Redeemed => StatusColor::Muted,
        RewardStatus::Available => StatusColor::Positive,
        RewardStatus::Locked if user_level < required_level => StatusColor::Muted,
        RewardStatus::Locked => StatusColor::Pending,
    }
}

/// A redeemable catalog item with the signed-in user's status
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    pub id: String,
    pub name: String,
    pub description: String,
    pub required_level: u32,
    pub status: RewardStatus,
    pub image_url: String,
}

impl Reward {
    pub fn display_color(&self, user_level: u32) -> StatusColor {
        display_color(self.status, self.required_level, user_level)
    }

    /// Move Available → Redeemed.
    ///
    /// Returns `Ok(false)` when already redeemed (no-op) and an error while
    /// still locked.
    pub fn redeem(&mut self) -> Result<bool> {
        match self.status {
            RewardStatus::Available => {
                self.status = RewardStatus::Redeemed;
                Ok(true)
            }
            RewardStatus::Redeemed => Ok(false),
            RewardStatus::Locked => Err(Error::RewardNotRedeemable {
                id: self.id.clone(),
                status: self.status,
            }),
        }
    }
}

/// Result of a redemption request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RedeemOutcome {
    /// Status changed from Available to Redeemed
    Redeemed(Reward),
    /// Reward was already redeemed; nothing changed
    AlreadyRedeemed(Reward),
}

impl RedeemOutcome {
    pub fn reward(&self) -> &Reward {
        match self {
            RedeemOutcome::Redeemed(r) | RedeemOutcome::AlreadyRedeemed(r) => r,
        }
    }
}

/// Check that a reward in `rewards` may be redeemed, without changing it.
///
/// `Ok(true)` means the status is Available, `Ok(false)` that it is already
/// Redeemed.
pub fn check_redeemable(rewards: &[Reward], reward_id: &str) -> Result<bool> {
    let reward = rewards
        .iter()
        .find(|r| r.id == reward_id)
        .ok_or_else(|| Error::RewardNotFound(reward_id.to_string()))?;
    match reward.status {
        RewardStatus::Available => Ok(true),
        RewardStatus::Redeemed => Ok(false),
        RewardStatus::Locked => Err(Error::RewardNotRedeemable {
            id: reward.id.clone(),
            status: reward.status,
        }),
    }
}

/// Redeem one reward in place. No other entry is touched.
pub fn apply_redemption(rewards: &mut [Reward], reward_id: &str) -> Result<RedeemOutcome> {
    let reward = rewards
        .iter_mut()
        .find(|r| r.id == reward_id)
        .ok_or_else(|| Error::RewardNotFound(reward_id.to_string()))?;

    if reward.redeem()? {
        Ok(RedeemOutcome::Redeemed(reward.clone()))
    } else {
        Ok(RedeemOutcome::AlreadyRedeemed(reward.clone()))
    }
}

/// Row from `rewards` joined with `user_rewards!inner(status)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardRow {
    pub id: RawId,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub required_level: i64,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub user_rewards: Vec<UserRewardStatus>,
}

/// Joined per-user status
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRewardStatus {
    #[serde(default)]
    pub status: Option<String>,
}

impl RewardRow {
    /// Convert to Reward; a missing join row or status means Locked
    pub fn into_reward(self) -> Reward {
        let status = self
            .user_rewards
            .first()
            .and_then(|ur| ur.status.as_deref())
            .map(RewardStatus::parse_lenient)
            .unwrap_or(RewardStatus::Locked);

        Reward {
            id: self.id.into_string(),
            name: self.name,
            description: self.description.unwrap_or_default(),
            required_level: u32::try_from(self.required_level.max(0)).unwrap_or(u32::MAX),
            status,
            image_url: self.image_url.unwrap_or_default(),
        }
    }
}

/// Body of the `user_rewards` update sent on redemption
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedeemUpdate {
    pub status: RewardStatus,
    pub redeemed_at: DateTime<Utc>,
}

impl RedeemUpdate {
    pub fn at(redeemed_at: DateTime<Utc>) -> Self {
        Self {
            status: RewardStatus::Redeemed,
            redeemed_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog;

    #[test]
    fn test_display_color_cases() {
        assert_eq!(display_color(RewardStatus::Redeemed, 5, 15), StatusColor::Muted);
        assert_eq!(display_color(RewardStatus::Available, 30, 15), StatusColor::Positive);
        assert_eq!(display_color(RewardStatus::Locked, 20, 15), StatusColor::Muted);
        assert_eq!(display_color(RewardStatus::Locked, 15, 15), StatusColor::Pending);
    }

    #[test]
    fn test_redeem_available_changes_only_that_reward() {
        let mut rewards = catalog::rewards();
        let before = rewards.clone();

        let outcome = apply_redemption(&mut rewards, "2").unwrap();
        assert!(matches!(outcome, RedeemOutcome::Redeemed(ref r) if r.id == "2"));

        for (old, new) in before.iter().zip(rewards.iter()) {
            if new.id == "2" {
                assert_eq!(new.status, RewardStatus::Redeemed);
            } else {
                assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn test_redeem_twice_is_noop() {
        let mut rewards = catalog::rewards();
        apply_redemption(&mut rewards, "3").unwrap();
        let snapshot = rewards.clone();

        let outcome = apply_redemption(&mut rewards, "3").unwrap();
        assert!(matches!(outcome, RedeemOutcome::AlreadyRedeemed(_)));
        assert_eq!(rewards, snapshot);
    }

    #[test]
    fn test_locked_and_unknown_rewards_rejected() {
        let mut rewards = catalog::rewards();
        let snapshot = rewards.clone();

        assert!(matches!(
            apply_redemption(&mut rewards, "4"),
            Err(Error::RewardNotRedeemable { status: RewardStatus::Locked, .. })
        ));
        assert!(matches!(
            apply_redemption(&mut rewards, "99"),
            Err(Error::RewardNotFound(_))
        ));
        assert_eq!(rewards, snapshot);
    }

    #[test]
    fn test_check_redeemable_matches_apply() {
        let rewards = catalog::rewards();
        assert!(!check_redeemable(&rewards, "1").unwrap());
        assert!(check_redeemable(&rewards, "2").unwrap());
        assert!(check_redeemable(&rewards, "5").is_err());
    }

    #[test]
    fn test_reward_row_defaults_to_locked() {
        let rows: Vec<RewardRow> = serde_json::from_str(
            r#"[
                {"id": 7, "name": "Tote", "description": null, "required_level": 5,
                 "image_url": null, "user_rewards": []},
                {"id": "8", "name": "Voucher", "description": "10% off", "required_level": 10,
                 "image_url": "v.jpg", "user_rewards": [{"status": "Available"}]},
                {"id": "9", "name": "Kit", "required_level": 15,
                 "user_rewards": [{"status": "Expired"}]}
            ]"#,
        )
        .unwrap();
        let rewards: Vec<Reward> = rows.into_iter().map(RewardRow::into_reward).collect();

        assert_eq!(rewards[0].id, "7");
        assert_eq!(rewards[0].status, RewardStatus::Locked);
        assert_eq!(rewards[0].description, "");
        assert_eq!(rewards[1].status, RewardStatus::Available);
        assert_eq!(rewards[1].image_url, "v.jpg");
        assert_eq!(rewards[2].status, RewardStatus::Locked);
    }

    #[test]
    fn test_redeem_update_serializes_status_name() {
        let at = DateTime::parse_from_rfc3339("2026-03-01T10:00:00Z")
            .unwrap()
            .with_timezone(&Utc);
        let json = serde_json::to_value(RedeemUpdate::at(at)).unwrap();
        assert_eq!(json["status"], "Redeemed");
        assert_eq!(json["redeemed_at"], "2026-03-01T10:00:00Z");
    }
}
