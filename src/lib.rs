//! # SciPAn
//!
//! Builds a weekly Markdown digest of recent arXiv papers on one topic.
//!
//! ## Pipeline
//!
//! - **Fetch**: query the arXiv Atom API, newest submissions first
//! - **Summarize**: condense each abstract through a chat-completion API, or
//!   keep its first three sentences when that is unavailable
//! - **Write**: render the digest and save it as `digest_<date>.md`

pub mod agent;
pub mod arxiv;
pub mod config;
pub mod digest;
pub mod paper;
pub mod run;
pub mod storage;

pub use agent::{Summarize, Summarizer, SummaryOutcome};
pub use config::Config;
pub use digest::{build_digest, Digest};
pub use paper::PaperRecord;
pub use run::RunReport;
pub use storage::DigestStore;
