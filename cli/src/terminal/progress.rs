use colored::*;
use expandr_core::ProgressReporter;
use indicatif::ProgressStyle;
use tracing::Span;
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TEMPLATE: &str =
    "{spinner:.blue} {msg} [{bar:32.cyan/blue}] {human_pos}/{human_len} ({per_sec}, eta {eta})";

/// Drives the progress bar attached to a region's span.
pub struct SpanProgress {
    span: Span,
}

impl SpanProgress {
    pub fn new(span: Span, region_id: &str) -> Self {
        let style = ProgressStyle::with_template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .tick_strings(&[
                "▁▁▁▁▁",
                "▁▂▂▂▁",
                "▁▄▂▄▁",
                "▂▄▆▄▂",
                "▄▆█▆▄",
                "▂▄▆▄▂",
                "▁▄▂▄▁",
                "▁▂▂▂▁",
            ])
            .progress_chars("━╸ ");

        span.pb_set_style(&style);
        span.pb_set_message(&format!("Expanding {}", region_id.green().bold()));
        Self { span }
    }
}

impl ProgressReporter for SpanProgress {
    fn start(&self, total: u64) {
        self.span.pb_set_length(total);
    }

    fn advance(&self, addresses: u64) {
        self.span.pb_inc(addresses);
    }

    fn finish(&self) {
        self.span.pb_set_message("Merging temp files...");
    }
}
