//! Matcher Core - trigger windows, directory cache, event matching
//!
//! # Architecture
//!
//! ```text
//! LogEvent (timestamp + path)
//!     ↓
//! WindowMatcher (sweep → touch → get_or_load → containment test)
//!     ↓
//! DirectoryTriggerCache (per-directory TTL cache)
//!     ↓
//! TriggerFileLoader (glob + PatternExtractor + timestamp parsing)
//! ```

pub mod cache;
pub mod config;
pub mod extractor;
pub mod loader;
pub mod matcher;
pub mod trigger;

pub use cache::DirectoryTriggerCache;
pub use config::{ConfigError, TriggerConfig};
pub use extractor::{PatternExtractor, RegexExtractor};
pub use loader::TriggerFileLoader;
pub use matcher::{MatchOutcome, WindowMatcher};
pub use trigger::{parse_timespan_lossy, TriggerRecord};
