//! Watches a Mastodon hashtag timeline and boosts original public posts.
//!
//! A scan pages backwards from the newest post until it runs out, boosting
//! every eligible post on the way, and returns the cursor to resume from.
//! The cursor can be fed straight back into the next scan, either by the
//! built-in polling loop or by an external scheduler between single-shot
//! invocations.

pub mod booster;
pub mod cli;
pub mod config;
pub mod eligibility;
pub mod error;
pub mod mastodon;
pub mod models;
pub mod telemetry;
pub mod testing;
pub mod timeline;

pub use booster::{BatchOutcome, Booster, BoosterSettings};
pub use config::BotConfig;
pub use eligibility::is_eligible;
pub use error::{BotError, ClientError, ConfigError};
pub use mastodon::{MastodonClient, MastodonCredentials};
pub use models::{PageQuery, Status, StatusId, Visibility};
pub use timeline::Timeline;
