//! ayu-tui: Terminal UI components
//!
//! A small terminal UI layer built on ratatui and crossterm, shaped around
//! the intake conversation: chat bubbles, option chips, a type-aware input
//! bar, and the assistant activity strip.

pub mod input;
pub mod theme;
pub mod widgets;

pub use theme::Theme;
