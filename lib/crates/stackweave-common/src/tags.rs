//! Resource tag keys applied to every stack.
//!
//! | Tag Key | Description |
//! |---------|-------------|
//! | `Application` | Application name from configuration |
//! | `Environment` | Environment tag resolved at composition start |

use std::collections::BTreeMap;

pub const TAG_APPLICATION: &str = "Application";

pub const TAG_ENVIRONMENT: &str = "Environment";

/// Build the tag set for a stack.
///
/// Extra tags cannot override the two standard keys.
#[must_use]
pub fn standard_tags(
    application: &str,
    environment: &str,
    extra: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut tags = extra.clone();
    tags.insert(TAG_APPLICATION.to_string(), application.to_string());
    tags.insert(TAG_ENVIRONMENT.to_string(), environment.to_string());
    tags
}
