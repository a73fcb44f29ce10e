//! Media configuration

use serde::{Deserialize, Serialize};

/// Media parameters for the engine
///
/// The native media block is used with its defaults; this type exists so the
/// builder has a slot for it and so settings files can carry a `[media]`
/// table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MediaConfiguration {}

impl MediaConfiguration {
    pub fn new() -> Self {
        Self::default()
    }
}
