//! Page auditing and run orchestration
//!
//! [`audit_page`] audits one URL in both document states. [`run_audit`] drives
//! a complete run: discovery, well-known file checks, bounded concurrent page
//! audits, output files and pattern extraction.

mod page;
mod runner;

pub use page::{audit_page, PageAuditResult, PageStatus, PerformanceMetrics};
pub use runner::{discover_urls, run_audit, AuditRun};
