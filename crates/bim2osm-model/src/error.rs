// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for loading the IFC entity graph

use crate::EntityId;
use thiserror::Error;

/// Result type alias for loader operations
pub type Result<T> = std::result::Result<T, ParseError>;

/// Errors that can occur while loading an IFC file
#[derive(Error, Debug)]
pub enum ParseError {
    /// Invalid STEP structure (missing sections, stray content)
    #[error("Invalid IFC format: {0}")]
    InvalidFormat(String),

    /// Failed to parse header section
    #[error("Invalid header: {0}")]
    InvalidHeader(String),

    /// Failed to parse entity
    #[error("Failed to parse entity {0}: {1}")]
    EntityParse(EntityId, String),

    /// The same id is defined twice in the DATA section
    #[error("Entity {0} defined more than once")]
    DuplicateEntity(EntityId),

    /// Unsupported IFC schema version
    #[error("Unsupported schema version: {0}")]
    UnsupportedSchema(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// Create a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        ParseError::InvalidFormat(msg.into())
    }

    /// Create a new header error
    pub fn header(msg: impl Into<String>) -> Self {
        ParseError::InvalidHeader(msg.into())
    }

    /// Create a new entity parse error
    pub fn entity_parse(id: EntityId, msg: impl Into<String>) -> Self {
        ParseError::EntityParse(id, msg.into())
    }
}
