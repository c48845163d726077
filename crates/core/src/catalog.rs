//! Built-in catalog used by the in-memory backend: demo account, level
//! themes, rewards and points history.

use crate::{Idr, PointsRecord, Reward, RewardStatus, Theme, User};
use chrono::{DateTime, Utc};

/// Demo login accepted by the in-memory backend
pub const DEMO_USERNAME: &str = "aimi_user";
pub const DEMO_PASSWORD: &str = "password";

/// The demo account. Level and points are intentionally inconsistent with
/// the 10-points-per-level rule.
pub fn demo_user() -> User {
    User {
        id: "1".to_string(),
        username: DEMO_USERNAME.to_string(),
        points: 25,
        level: 15,
        mobile: "+62123456789".to_string(),
    }
}

/// Level themes, ten levels each, covering 1..=100
pub fn themes() -> Vec<Theme> {
    const THEMES: [(&str, &str); 10] = [
        (
            "Meadow Garden",
            "https://images.pexels.com/photos/1146708/pexels-photo-1146708.jpeg",
        ),
        (
            "Carrot Farm",
            "https://images.pexels.com/photos/2280549/pexels-photo-2280549.jpeg",
        ),
        (
            "Cherry Blossom",
            "https://images.pexels.com/photos/757889/pexels-photo-757889.jpeg",
        ),
        (
            "Summer Meadow",
            "https://images.pexels.com/photos/158063/bellingrath-gardens-alabama-landscape-scenic-158063.jpeg",
        ),
        (
            "Autumn Forest",
            "https://images.pexels.com/photos/1006121/pexels-photo-1006121.jpeg",
        ),
        ("Winter Wonderland", "/assets/themes/winter-wonderland.jpg"),
        ("Moonlit Pond", "/assets/themes/moonlit-pond.jpg"),
        ("Rose Garden", "/assets/themes/rose-garden.jpg"),
        ("Bamboo Grove", "/assets/themes/bamboo-grove.jpg"),
        ("Rainbow Valley", "/assets/themes/rainbow-valley.jpg"),
    ];

    THEMES
        .iter()
        .zip(0u32..)
        .map(|((name, image), i)| Theme {
            id: i + 1,
            name: (*name).to_string(),
            start_level: i * 10 + 1,
            end_level: i * 10 + 10,
            background_image: (*image).to_string(),
        })
        .collect()
}

/// Reward catalog with the demo account's statuses
pub fn rewards() -> Vec<Reward> {
    vec![
        reward(
            "1",
            "Exclusive Tote Bag",
            "A beautiful, high-quality tote bag with the Aimi logo.",
            5,
            RewardStatus::Redeemed,
            "https://images.pexels.com/photos/5946706/pexels-photo-5946706.jpeg",
        ),
        reward(
            "2",
            "10% Discount Voucher",
            "Get 10% off your next purchase.",
            10,
            RewardStatus::Available,
            "https://images.pexels.com/photos/4386342/pexels-photo-4386342.jpeg",
        ),
        reward(
            "3",
            "Premium Makeup Kit",
            "A collection of high-quality makeup products.",
            15,
            RewardStatus::Available,
            "https://images.pexels.com/photos/4041392/pexels-photo-4041392.jpeg",
        ),
        reward(
            "4",
            "Fashion Consultation",
            "A one-hour personal fashion consultation session.",
            20,
            RewardStatus::Locked,
            "https://images.pexels.com/photos/5709661/pexels-photo-5709661.jpeg",
        ),
        reward(
            "5",
            "Luxury Handbag",
            "An elegant designer handbag for special occasions.",
            30,
            RewardStatus::Locked,
            "https://images.pexels.com/photos/10873788/pexels-photo-10873788.jpeg",
        ),
    ]
}

/// Purchases behind the demo account's 25 points, newest first
pub fn points_history() -> Vec<PointsRecord> {
    let user = demo_user();
    [
        ("3", 7_200_000u64, "Online order #A-1093", 1_770_026_400i64),
        ("2", 8_750_000, "Store purchase, Senayan City", 1_768_827_600),
        ("1", 10_000_000, "Store purchase, Grand Indonesia", 1_767_600_000),
    ]
    .into_iter()
    .map(|(id, amount, description, ts)| {
        let purchase_amount = Idr::new(amount);
        PointsRecord {
            id: id.to_string(),
            user_id: user.id.clone(),
            username: Some(user.username.clone()),
            points_earned: purchase_amount.points(),
            purchase_amount,
            description: description.to_string(),
            created_at: DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_default(),
        }
    })
    .collect()
}

fn reward(
    id: &str,
    name: &str,
    description: &str,
    required_level: u32,
    status: RewardStatus,
    image_url: &str,
) -> Reward {
    Reward {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        required_level,
        status,
        image_url: image_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_adds_up_to_demo_points() {
        let total: u32 = points_history().iter().map(|r| r.points_earned).sum();
        assert_eq!(total, demo_user().points);
    }

    #[test]
    fn test_history_is_newest_first() {
        let history = points_history();
        assert!(history.windows(2).all(|w| w[0].created_at > w[1].created_at));
    }

    #[test]
    fn test_reward_ids_unique() {
        let rewards = rewards();
        let mut ids: Vec<&str> = rewards.iter().map(|r| r.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), rewards.len());
    }
}
