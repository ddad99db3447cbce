//! Identifier generation.

use crate::error::{CoreError, CoreResult};
use std::collections::HashSet;

pub const CLIENT_PREFIX: &str = "cli";
pub const ENGAGEMENT_PREFIX: &str = "eng";
pub const TASK_PREFIX: &str = "task";
pub const INTERACTION_PREFIX: &str = "int";
pub const USER_PREFIX: &str = "usr";
pub const REPORT_PREFIX: &str = "rpt";

/// Words per generated external id.
const EXTERNAL_ID_WORDS: u8 = 3;
const MAX_EXTERNAL_ID_ATTEMPTS: usize = 100;

/// A fresh record id such as `eng-8c1d...`.
pub fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4())
}

fn petname_candidate() -> String {
    use petname::{Generator, Petnames};

    Petnames::medium()
        .generate_one(EXTERNAL_ID_WORDS, "-")
        .unwrap_or_else(|| new_id(USER_PREFIX))
}

/// Generate a user external id not present in `taken`, retrying on collision.
pub fn generate_external_id(taken: &HashSet<&str>) -> CoreResult<String> {
    for _ in 0..MAX_EXTERNAL_ID_ATTEMPTS {
        let candidate = petname_candidate();
        if !taken.contains(candidate.as_str()) {
            return Ok(candidate);
        }
    }
    Err(CoreError::internal(format!(
        "Failed to generate a unique externalId after {} attempts",
        MAX_EXTERNAL_ID_ATTEMPTS
    )))
}
