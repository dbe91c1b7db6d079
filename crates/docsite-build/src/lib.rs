//! Static site builds for docsite.
//!
//! [`StaticSiteBuilder`] constructs the site tree from the configured content
//! directory, builds every page sequentially or on a bounded thread pool and
//! then mirrors the static assets into the output directory.

mod assets;
mod builder;

pub use assets::{ASSET_DIRS, AssetError, copy_assets};
pub use builder::{BuildError, BuildMode, BuildReport, StaticSiteBuilder};
