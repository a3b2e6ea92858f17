//! podimage
//!
//! Copies a community gallery image into a private shared image gallery so
//! confidential peer-pod VMs can boot from it.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{
    CopyConfig, CopyImageArgs, DEFAULT_TARGET_REGIONS, normalize_flag_style, parse_target_regions,
};
pub use error::{ConfigError, Phase, PipelineError, Resource, Result};
pub use pipeline::{CopyImagePipeline, ImageVersionRef};
