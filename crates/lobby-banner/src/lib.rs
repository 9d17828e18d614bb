//! Cabinet Lobby Banner
//!
//! Timed, cancellable banner messages in three display regions:
//! - One message per (owner, region); a new display replaces the old one
//! - Transient messages expire on a timer unless superseded or cancelled
//! - Per-region aggregation of text, color and duration
//! - Open/close notifications as the banner fills and empties
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lobby_banner::{BannerRegion, BannerScheduler, MessageStyle};
//! use lobby_core::BannerConfig;
//!
//! let banner = BannerScheduler::new(&BannerConfig::default());
//! let mut events = banner.subscribe();
//!
//! banner.display_static("bank", BannerRegion::Left, "Credits 100", MessageStyle::default()).await;
//! banner.spawn_transient("bank", BannerRegion::Center, "Bill accepted", MessageStyle::default(), None, None);
//! ```

pub mod cancel;
pub mod region;
pub mod scheduler;

pub use cancel::{CancelSource, CancelToken};
pub use region::{
    BannerBoard, BannerRegion, MessageKey, MessageStyle, RegionDisplay, RegionMessage, Rgba,
};
pub use scheduler::{BannerEvent, BannerScheduler, TimerOutcome};
