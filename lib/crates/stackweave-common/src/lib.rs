pub mod manifest;
pub mod tags;
pub mod template;
pub mod types;

pub use manifest::{Manifest, ManifestEntry};
pub use tags::{TAG_APPLICATION, TAG_ENVIRONMENT, standard_tags};
pub use template::{Export, Output, Resource, Template, TemplateError, intrinsic};
pub use types::*;
