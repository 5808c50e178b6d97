//! Matchday engine: fetching, page extraction, match assembly, the batch
//! runner and everything that touches the filesystem.
mod assemble;
mod columnar;
mod commentary;
mod decode;
mod export;
mod fetch;
mod filename;
mod listing;
mod page;
mod persist;
mod result;
mod runner;
mod stats;
mod types;

pub use assemble::{
    extract_match_info, match_from_detail, parse_status, statistics_url, team_id_from_href,
    AssemblyOptions, MatchAssembler,
};
pub use columnar::write_parquet;
pub use commentary::{extract_commentary, parse_minute};
pub use decode::{decode_html, DecodedHtml};
pub use export::{
    render_json, write_csv, DatasetLabel, ExportError, ExportFormat, ExportSummary, Exporter,
    CHECKPOINT_FILENAME,
};
pub use fetch::{
    redact_proxy, FetchSettings, Fetcher, ReqwestFetcher, RetrySettings, RetryingFetcher,
};
pub use filename::{export_filename, sanitize_part};
pub use listing::{discover_match_links, parse_match_list, MatchLink};
pub use page::{element_text, Page};
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use result::{
    extract_result, first_success, full_time_from_score_elements, full_time_from_wrapper_spans,
    half_time_from_class_variants, half_time_from_element, half_time_from_info_rows,
    half_time_from_page_text, ScoreStrategy, FULL_TIME_STRATEGIES, HALF_TIME_STRATEGIES,
};
pub use runner::{BatchOutcome, BatchRunner, RunnerSettings};
pub use stats::extract_statistics;
pub use types::{AssemblyError, FailureKind, FetchError, FetchMetadata, FetchedPage, MatchTarget};
