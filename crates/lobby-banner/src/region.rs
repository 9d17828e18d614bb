//! Banner regions and per-region aggregation
//!
//! The banner has three regions. Each region may hold one message per owner;
//! what a region shows is the aggregate of all of them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

// ═══════════════════════════════════════════════════════════════════════════════
// TYPES
// ═══════════════════════════════════════════════════════════════════════════════

/// Banner display region
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BannerRegion {
    Left,
    Center,
    Right,
}

impl BannerRegion {
    pub const ALL: [BannerRegion; 3] = [BannerRegion::Left, BannerRegion::Center, BannerRegion::Right];
}

/// RGBA color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::new(0, 0, 0, 255);
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const RED: Rgba = Rgba::new(255, 0, 0, 255);
    pub const YELLOW: Rgba = Rgba::new(255, 255, 0, 255);
    pub const BLUE: Rgba = Rgba::new(0, 0, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// Text and background color of a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageStyle {
    pub text_color: Rgba,
    pub background_color: Rgba,
}

impl Default for MessageStyle {
    fn default() -> Self {
        Self {
            text_color: Rgba::WHITE,
            background_color: Rgba::BLACK,
        }
    }
}

impl MessageStyle {
    pub fn text(color: Rgba) -> Self {
        Self {
            text_color: color,
            ..Self::default()
        }
    }
}

/// Key of a message: one message per owner per region
pub type MessageKey = (String, BannerRegion);

/// A message placed in one region by one owner
#[derive(Debug, Clone, PartialEq)]
pub struct RegionMessage {
    pub owner: String,
    pub region: BannerRegion,
    pub text: String,
    pub style: MessageStyle,
    /// Set for transient messages
    pub duration: Option<Duration>,
    /// Identifies this particular display; a newer display gets a larger value
    pub generation: u64,
}

impl RegionMessage {
    pub fn key(&self) -> MessageKey {
        (self.owner.clone(), self.region)
    }

    fn matches(&self, owner: &str, region: BannerRegion) -> bool {
        self.owner == owner && self.region == region
    }
}

/// What one region shows
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionDisplay {
    pub text: String,
    /// Color of the most recently added message
    pub text_color: Rgba,
    /// Duration of the most recently added message
    pub duration: Option<Duration>,
}

impl Default for RegionDisplay {
    fn default() -> Self {
        Self {
            text: String::new(),
            text_color: Rgba::WHITE,
            duration: None,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// BOARD
// ═══════════════════════════════════════════════════════════════════════════════

/// All messages of all regions, oldest first
#[derive(Debug, Clone)]
pub struct BannerBoard {
    messages: Vec<RegionMessage>,
    separator: String,
}

impl BannerBoard {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            separator: separator.into(),
        }
    }

    /// Insert a message, replacing any message with the same key
    ///
    /// The new message always counts as the most recently added one.
    pub fn upsert(&mut self, message: RegionMessage) -> Option<RegionMessage> {
        let replaced = self.remove(&message.owner, message.region);
        self.messages.push(message);
        replaced
    }

    /// Remove the message for `(owner, region)`
    pub fn remove(&mut self, owner: &str, region: BannerRegion) -> Option<RegionMessage> {
        let index = self.messages.iter().position(|m| m.matches(owner, region))?;
        Some(self.messages.remove(index))
    }

    pub fn get(&self, owner: &str, region: BannerRegion) -> Option<&RegionMessage> {
        self.messages.iter().find(|m| m.matches(owner, region))
    }

    /// Messages of one region, oldest first
    pub fn messages_in(&self, region: BannerRegion) -> impl Iterator<Item = &RegionMessage> {
        self.messages.iter().filter(move |m| m.region == region)
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Aggregate of one region: texts joined in insertion order, color and
    /// duration from the newest message
    pub fn display(&self, region: BannerRegion) -> RegionDisplay {
        let mut display = RegionDisplay::default();
        let mut texts = Vec::new();

        for message in self.messages_in(region) {
            if !message.text.is_empty() {
                texts.push(message.text.as_str());
            }
            display.text_color = message.style.text_color;
            display.duration = message.duration;
        }

        display.text = texts.join(&self.separator);
        display
    }

    /// Background of the whole banner: newest message across all regions
    pub fn background(&self) -> Option<Rgba> {
        self.messages.last().map(|m| m.style.background_color)
    }

    /// True when every region shows empty text
    pub fn is_info_bar_empty(&self) -> bool {
        BannerRegion::ALL
            .iter()
            .all(|region| self.display(*region).text.is_empty())
    }
}
