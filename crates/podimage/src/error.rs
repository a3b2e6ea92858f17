//! podimage error types

use podimage_azure::ArmError;
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "subscription-id, resource-group, location and community-image-id are required (missing: {})",
        .0.join(", ")
    )]
    MissingRequired(Vec<&'static str>),
}

/// Remote resource touched by a pipeline step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Disk,
    ManagedImage,
    Gallery,
    ImageDefinition,
    ImageVersion,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Disk => "disk",
            Self::ManagedImage => "managed image",
            Self::Gallery => "gallery",
            Self::ImageDefinition => "image definition",
            Self::ImageVersion => "image version",
        };
        f.write_str(s)
    }
}

/// Submitting the request, or waiting for the operation it started
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Create,
    Wait,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Create => "creating",
            Self::Wait => "waiting for",
        })
    }
}

/// A fatal pipeline failure; renders as e.g. `waiting for disk: <cause>`
#[derive(Error, Debug)]
#[error("{phase} {resource}: {source}")]
pub struct PipelineError {
    pub phase: Phase,
    pub resource: Resource,
    #[source]
    pub source: ArmError,
}

pub type Result<T> = std::result::Result<T, PipelineError>;
