// SPDX-FileCopyrightText: 2026 Engram Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Engine tuning knobs.

use serde::{Deserialize, Serialize};

fn default_candidate_limit() -> usize {
    5
}

fn default_result_limit() -> usize {
    100
}

/// Tuning configuration for the reconciliation engine.
///
/// All fields default to the reference behavior; unknown keys are
/// rejected at load time.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Nearest-neighbor candidates retrieved per new fact.
    #[serde(default = "default_candidate_limit")]
    pub candidate_limit: usize,

    /// Default result limit for `search` and `get_all`.
    #[serde(default = "default_result_limit")]
    pub result_limit: usize,

    /// Caller-supplied extraction instruction replacing the built-in one.
    #[serde(default)]
    pub custom_extraction_prompt: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            candidate_limit: default_candidate_limit(),
            result_limit: default_result_limit(),
            custom_extraction_prompt: None,
        }
    }
}
