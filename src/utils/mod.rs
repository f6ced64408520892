pub mod file_utils;
pub mod log_utils;
pub mod url_utils;

pub use file_utils::{
    default_job_id, sanitize_filename, unique_page_stem, validate_job_id, ReportStore,
    PAGE_ORDER_FILE, STATS_FILE,
};
pub use log_utils::init_logging;
pub use url_utils::{extract_domain, parse_audit_source, read_audit_source, AuditPage};
