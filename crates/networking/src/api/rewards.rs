//! Reward API operations

use crate::AimiClient;
use aimi_core::{Error, Result};
use chrono::{DateTime, Utc};
use tracing::info;

/// Mark a reward redeemed for a user, stamped with the current time
///
/// # Returns
/// The timestamp written as `redeemed_at`
pub async fn redeem_reward(
    client: &AimiClient,
    user_id: &str,
    reward_id: &str,
) -> Result<DateTime<Utc>> {
    if user_id.is_empty() || reward_id.is_empty() {
        return Err(Error::InvalidData(
            "User id and reward id are required".to_string(),
        ));
    }

    let redeemed_at = Utc::now();
    info!("Redeeming reward {} for {}", reward_id, user_id);
    client
        .update_user_reward_redeemed(user_id, reward_id, redeemed_at)
        .await?;
    Ok(redeemed_at)
}
