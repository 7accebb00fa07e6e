//! Terminal front-end
//!
//! A [`UiHost`] that prints prompts and progress to the terminal, plus the
//! controller listing used by `--list-controllers`.

use anyhow::Result;
use colored::*;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, trace};

use crate::input::host::{CursorState, UiHost};
use crate::input::subsystem::ControllerOption;
use crate::input::types::{InstanceId, MAX_PLAYERS};
use crate::input::PlatformEvent;

/// Terminal stand-in for the game's menu layer
#[derive(Debug, Default)]
pub struct ConsoleUi {
    capturing: AtomicBool,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the terminal as holding input focus (menus open)
    pub fn set_capturing(&self, capturing: bool) {
        self.capturing.store(capturing, Ordering::SeqCst);
    }
}

impl UiHost for ConsoleUi {
    fn queue_event(&self, event: PlatformEvent) {
        trace!("UI event: {:?}", event);
    }

    fn is_context_capturing_input(&self) -> bool {
        self.capturing.load(Ordering::SeqCst)
    }

    fn open_notification(&self, title: &str, message: &str) {
        println!("\n{}", format!("=== {} ===", title).bold().cyan());
        println!("{}", message);
    }

    fn set_prompt_progress(&self, completed: usize, total: usize) {
        println!("  {}", progress_bar(completed, total));
    }

    fn clear_prompt_progress(&self) {}

    fn close_prompt(&self) {
        println!("{}", "Prompt closed".dimmed());
    }

    fn toggle_fullscreen(&self) {
        debug!("Fullscreen toggle requested");
    }

    fn drop_files(&self, files: Vec<PathBuf>) {
        for file in files {
            println!("  {} {}", "[DROPPED]".yellow(), file.display());
        }
    }

    fn apply_cursor(&self, cursor: CursorState) {
        trace!("Cursor visible={} locked={}", cursor.visible, cursor.locked);
    }
}

/// Progress icons: lit for players done, dim for the rest
pub fn progress_bar(completed: usize, total: usize) -> String {
    let lit = completed.min(total);
    format!(
        "{}{}",
        "●".repeat(lit).green(),
        "○".repeat(total - lit).dimmed()
    )
}

/// One row of the controller listing
#[derive(Debug, Clone, Serialize)]
pub struct ControllerListing {
    #[serde(flatten)]
    pub option: ControllerOption,
    /// Player slot (1-based) the controller currently drives
    pub player: Option<usize>,
}

/// Join controller options with the current slot assignment
pub fn controller_listing(
    options: Vec<ControllerOption>,
    assignments: &[Option<InstanceId>; MAX_PLAYERS],
) -> Vec<ControllerListing> {
    options
        .into_iter()
        .map(|option| {
            let player = assignments
                .iter()
                .position(|slot| *slot == Some(option.instance_id))
                .map(|slot| slot + 1);
            ControllerListing { option, player }
        })
        .collect()
}

/// Print the controller listing as a table or as JSON
pub fn print_controllers(listing: &[ControllerListing], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(listing)?);
        return Ok(());
    }

    println!("\n{}", "=== Connected Controllers ===".bold().cyan());
    if listing.is_empty() {
        println!("  {}", "No controllers found".dimmed());
        return Ok(());
    }

    for entry in listing {
        let marker = match entry.player {
            Some(player) => format!("[P{}]", player).green(),
            None => "[--]".yellow(),
        };
        println!(
            "  {} {} {}",
            marker,
            entry.option.name,
            format!("({})", entry.option.identity).dimmed()
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::identity::ControllerIdentity;

    fn option(instance_id: InstanceId, name: &str) -> ControllerOption {
        ControllerOption {
            instance_id,
            name: name.to_string(),
            identity: ControllerIdentity {
                vendor: 0x045e,
                product: 0x02ea,
                ..Default::default()
            },
        }
    }

    #[test]
    fn test_progress_bar_counts_icons() {
        colored::control::set_override(false);
        assert_eq!(progress_bar(2, 4), "●●○○");
        assert_eq!(progress_bar(5, 3), "●●●");
    }

    #[test]
    fn test_listing_marks_assigned_player() {
        let listing = controller_listing(
            vec![option(3, "Pad"), option(8, "Other")],
            &[Some(8), Some(3), None, None],
        );

        assert_eq!(listing[0].player, Some(2));
        assert_eq!(listing[1].player, Some(1));
    }

    #[test]
    fn test_listing_json_is_flat() {
        let listing = controller_listing(vec![option(1, "Pad")], &[None; MAX_PLAYERS]);
        let json = serde_json::to_value(&listing).unwrap();

        assert_eq!(json[0]["name"], "Pad");
        assert_eq!(json[0]["instance_id"], 1);
        assert!(json[0]["player"].is_null());
        assert_eq!(json[0]["identity"]["vendor"], 0x045e);
    }
}
