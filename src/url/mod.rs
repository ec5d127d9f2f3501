//! URL handling module
//!
//! This module provides URL normalization, deduplication keys and same-site
//! checks used by discovery and the page audit.

mod domain;
mod normalize;

pub use domain::{extract_domain, same_origin, site_root};
pub use normalize::{dedup_key, normalize_url};
