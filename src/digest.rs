//! Markdown digest assembly.

use crate::agent::Summarize;
use crate::paper::PaperRecord;
use chrono::NaiveDate;
use tracing::debug;

/// A rendered digest and what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Digest {
    pub markdown: String,
    /// Number of paper sections
    pub papers: usize,
    /// Papers whose summary came from the extractive fallback
    pub fallbacks: usize,
}

/// Title line shared by every digest
pub fn digest_title(topic: &str, date: NaiveDate) -> String {
    format!("# Weekly Digest: {} ({})\n", topic, date.format("%Y-%m-%d"))
}

fn render_entry(index: usize, paper: &PaperRecord, summary: &str) -> [String; 4] {
    [
        format!("### {}. {}", index, paper.title),
        format!("**Authors:** {}", paper.authors),
        format!("**Summary:** {}", summary),
        format!("[Read on arXiv]({})\n", paper.link),
    ]
}

/// Summarize each paper in order and render the digest.
///
/// Papers are neither reordered nor filtered: section `i` is `papers[i - 1]`.
pub async fn build_digest<S: Summarize>(
    papers: &[PaperRecord],
    topic: &str,
    date: NaiveDate,
    summarizer: &S,
) -> Digest {
    let mut lines = vec![digest_title(topic, date)];
    let mut fallbacks = 0;

    for (i, paper) in papers.iter().enumerate() {
        debug!(index = i + 1, title = %paper.title, "summarizing paper");
        let outcome = summarizer.summarize(&paper.summary).await;
        if outcome.is_fallback() {
            fallbacks += 1;
        }
        lines.extend(render_entry(i + 1, paper, outcome.text()));
    }

    Digest {
        markdown: lines.join("\n"),
        papers: papers.len(),
        fallbacks,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{SummarizeError, SummaryOutcome};

    struct Echo;

    impl Summarize for Echo {
        async fn summarize(&self, text: &str) -> SummaryOutcome {
            SummaryOutcome::Generated(text.to_string())
        }
    }

    struct AlwaysFallback;

    impl Summarize for AlwaysFallback {
        async fn summarize(&self, text: &str) -> SummaryOutcome {
            SummaryOutcome::Fallback {
                text: format!("fallback: {}", text),
                reason: SummarizeError::MissingCredential,
            }
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 10, 7).unwrap()
    }

    #[tokio::test]
    async fn empty_digest_is_title_only() {
        let digest = build_digest(&[], "diamond", date(), &Echo).await;
        assert_eq!(digest.markdown, "# Weekly Digest: diamond (2024-10-07)\n");
        assert_eq!(digest.papers, 0);
        assert_eq!(digest.fallbacks, 0);
    }

    #[tokio::test]
    async fn single_paper_layout() {
        let paper = PaperRecord::new("T", "S", "http://x/abs/1", "A, B");
        let digest = build_digest(&[paper], "diamond", date(), &Echo).await;

        assert_eq!(
            digest.markdown,
            "# Weekly Digest: diamond (2024-10-07)\n\n\
             ### 1. T\n\
             **Authors:** A, B\n\
             **Summary:** S\n\
             [Read on arXiv](http://x/abs/1)\n"
        );
    }

    #[tokio::test]
    async fn fallbacks_are_counted() {
        let papers = vec![
            PaperRecord::new("One", "a", "l1", "x"),
            PaperRecord::new("Two", "b", "l2", "y"),
        ];
        let digest = build_digest(&papers, "t", date(), &AlwaysFallback).await;

        assert_eq!(digest.papers, 2);
        assert_eq!(digest.fallbacks, 2);
        assert!(digest.markdown.contains("**Summary:** fallback: b"));
    }
}
