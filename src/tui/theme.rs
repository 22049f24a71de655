//! Shared colours

use ratatui::style::Color;

/// Accent (titles, active tab)
pub const ACCENT: Color = Color::Rgb(91, 206, 250);
/// Selected row background
pub const SEL_BG: Color = Color::Rgb(35, 45, 60);
pub const BRIGHT_WHITE: Color = Color::Rgb(255, 255, 255);
/// Secondary text
pub const DIM: Color = Color::Rgb(130, 130, 140);
pub const SUCCESS: Color = Color::Rgb(120, 220, 140);
pub const ERROR: Color = Color::Rgb(240, 110, 110);
/// Upgrade available / pending
pub const WARN: Color = Color::Rgb(240, 200, 90);
