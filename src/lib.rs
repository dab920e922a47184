//! Self-discovering image carousel.
//!
//! Assets are found at runtime by probing `base_path/N.ext` candidates,
//! merged behind an explicitly configured list and rotated with timed
//! auto-advance, manual navigation, pause on hover and fade transitions.

pub mod asset;
pub mod asset_list;
pub mod carousel;
pub mod config;
pub mod constants;
pub mod decode;
pub mod discovery;
pub mod notifier;
pub mod preload;
pub mod prober;
pub mod state;

pub use asset::AssetRef;
pub use asset_list::AssetList;
pub use carousel::{Carousel, Direction, Indicator, Timing};
pub use config::CarouselConfig;
