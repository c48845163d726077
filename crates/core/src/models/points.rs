//! Points history (purchases that earned loyalty points)

use crate::{Idr, RawId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One entry of the points history listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointsRecord {
    pub id: String,
    pub user_id: String,
    /// Joined from `profiles`; absent when the profile is gone
    pub username: Option<String>,
    pub points_earned: u32,
    pub purchase_amount: Idr,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

/// Row from `points_history` joined with `profiles(username)`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointsHistoryRow {
    pub id: RawId,
    pub user_id: String,
    #[serde(default)]
    pub points_earned: i64,
    #[serde(default)]
    pub purchase_amount: i64,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profiles: Option<JoinedUsername>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoinedUsername {
    pub username: String,
}

impl PointsHistoryRow {
    pub fn into_record(self) -> PointsRecord {
        PointsRecord {
            id: self.id.into_string(),
            user_id: self.user_id,
            username: self.profiles.map(|p| p.username),
            points_earned: u32::try_from(self.points_earned.max(0)).unwrap_or(u32::MAX),
            purchase_amount: Idr::new(u64::try_from(self.purchase_amount).unwrap_or(0)),
            description: self.description.unwrap_or_default(),
            created_at: self.created_at,
        }
    }
}

/// Format an IDR amount with thousands separators ("IDR 12,500,000")
pub fn format_idr(amount: Idr) -> String {
    let digits = amount.as_u64().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("IDR {}", grouped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_row_with_join() {
        let row: PointsHistoryRow = serde_json::from_str(
            r#"{"id": 41, "user_id": "u-1", "points_earned": 12, "purchase_amount": 12500000,
                "description": "Store purchase", "created_at": "2026-02-11T08:30:00Z",
                "profiles": {"username": "aimi_user"}}"#,
        )
        .unwrap();
        let record = row.into_record();
        assert_eq!(record.id, "41");
        assert_eq!(record.username.as_deref(), Some("aimi_user"));
        assert_eq!(record.purchase_amount.points(), record.points_earned);
    }

    #[test]
    fn test_format_idr() {
        assert_eq!(format_idr(Idr::new(0)), "IDR 0");
        assert_eq!(format_idr(Idr::new(999)), "IDR 999");
        assert_eq!(format_idr(Idr::new(1_000)), "IDR 1,000");
        assert_eq!(format_idr(Idr::new(12_500_000)), "IDR 12,500,000");
    }
}
