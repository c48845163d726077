//! Plain-text rendering of controller views

use aimi_app::{Controller, Notice};
use aimi_core::{format_idr, LevelNode, LevelPosition, StatusColor, MAX_LEVEL};

/// Levels shown on each side of the viewed one
const PATH_RADIUS: u32 = 5;

/// Print and clear the pending notice. Returns whether there was one.
pub async fn notice(controller: &Controller) -> bool {
    match controller.take_notice().await {
        Some(Notice::Info(message)) => {
            println!("{}", message);
            true
        }
        Some(Notice::Alert(message)) => {
            println!("! {}", message);
            true
        }
        None => false,
    }
}

pub async fn status(controller: &Controller) {
    let Some(dashboard) = controller.dashboard().await else {
        println!("Not signed in");
        return;
    };

    let initial = dashboard.initial.map(String::from).unwrap_or_default();
    println!(
        "[{}] {}  Level {}  {} points  progress {:.0}%",
        initial, dashboard.username, dashboard.level, dashboard.points, dashboard.progress_percent
    );

    let filled = (dashboard.bar_width / 5.0).round() as usize;
    println!("[{}{}]", "#".repeat(filled), ".".repeat(20 - filled.min(20)));

    theme(controller).await;
}

pub async fn theme(controller: &Controller) {
    if let Some(summary) = controller.theme_summary().await {
        println!("{}", summary.title());
        println!("  {}", summary.blurb);
    }
}

/// Level the printed window centres on.
///
/// A viewed level past the end of the path has no `Current` node; the
/// window then sits on the last level.
fn window_center(nodes: &[LevelNode]) -> Option<u32> {
    if nodes.is_empty() {
        return None;
    }
    let center = nodes
        .iter()
        .find(|n| n.position == LevelPosition::Current)
        .map_or(MAX_LEVEL, |n| n.level);
    Some(center)
}

pub async fn path(controller: &Controller) {
    let nodes = controller.level_path().await;
    let Some(current) = window_center(&nodes) else {
        println!("Not signed in");
        return;
    };
    if nodes.iter().all(|n| n.position == LevelPosition::Passed) {
        println!("Every level on the path is behind you");
    }

    let low = current.saturating_sub(PATH_RADIUS).max(1);
    let high = current + PATH_RADIUS;
    for node in nodes.iter().filter(|n| n.level >= low && n.level <= high) {
        let marker = match node.position {
            LevelPosition::Passed => " ",
            LevelPosition::Current => ">",
            LevelPosition::Upcoming => ".",
        };
        let bonus = if node.has_reward { " (bonus)" } else { "" };
        let label = node
            .theme_label
            .as_ref()
            .map(|l| format!("  -- {}", l))
            .unwrap_or_default();
        println!("{} {:>3}{}{}", marker, node.level, bonus, label);
    }
}

pub async fn rewards(controller: &Controller) {
    let cards = controller.reward_cards().await;
    if cards.is_empty() {
        println!("No rewards available");
        return;
    }

    for card in cards {
        let tag = match card.color {
            StatusColor::Positive => "+",
            StatusColor::Pending => "~",
            StatusColor::Muted => "-",
        };
        println!(
            "{} [{}] {} (level {}) {}",
            tag,
            card.reward.id,
            card.reward.name,
            card.reward.required_level,
            card.reward.status
        );
        if !card.reward.description.is_empty() {
            println!("      {}", card.reward.description);
        }
    }
}

pub async fn history(controller: &Controller) {
    match controller.points_history().await {
        Ok(records) if records.is_empty() => println!("No points history yet"),
        Ok(records) => {
            for record in records {
                println!(
                    "{}  {:<12} +{:<3} {}  {}",
                    record.created_at.format("%Y-%m-%d"),
                    record.username.as_deref().unwrap_or("-"),
                    record.points_earned,
                    format_idr(record.purchase_amount),
                    record.description
                );
            }
        }
        Err(e) => println!("Error: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aimi_core::{catalog, level_path};

    #[test]
    fn test_window_follows_current_level() {
        let nodes = level_path(&catalog::themes(), 15);
        assert_eq!(window_center(&nodes), Some(15));
        assert_eq!(window_center(&[]), None);
    }

    #[test]
    fn test_window_past_last_level() {
        let nodes = level_path(&catalog::themes(), 150);
        assert!(nodes.iter().all(|n| n.position == LevelPosition::Passed));
        assert_eq!(window_center(&nodes), Some(MAX_LEVEL));
    }
}
