use std::fs::File;
use std::io::Write;
use std::path::Path;

use futures::stream::{self, StreamExt};
use indicatif::style::TemplateError;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use super::{CollectionPipeline, CompanyTask, PatentRecord};
use crate::detail::PatentDetails;
use crate::search::PatentSearch;

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("failed to write output: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

/// CSV writer whose columns are fixed by the first non-empty batch it sees.
pub struct RowSink<W: Write> {
    writer: csv::Writer<W>,
    schema: Option<Vec<&'static str>>,
}

impl RowSink<File> {
    pub fn create(path: &Path) -> Result<Self, SinkError> {
        Ok(Self::new(File::create(path)?))
    }
}

impl<W: Write> RowSink<W> {
    pub fn new(inner: W) -> Self {
        Self {
            writer: csv::WriterBuilder::new()
                .has_headers(false)
                .from_writer(inner),
            schema: None,
        }
    }

    /// Writes one company's records and flushes. Returns the number of rows written.
    ///
    /// The header goes out with the first non-empty batch; empty batches write nothing.
    pub fn write_batch(&mut self, batch: &[PatentRecord]) -> Result<usize, SinkError> {
        let Some(first) = batch.first() else {
            return Ok(0);
        };

        if self.schema.is_none() {
            let columns: Vec<&'static str> =
                first.fields().into_iter().map(|(name, _)| name).collect();
            self.writer.write_record(&columns)?;
            self.schema = Some(columns);
        }
        let schema = self.schema.as_deref().unwrap_or_default();

        for record in batch {
            let fields = record.fields();
            let row = schema.iter().map(|column| {
                fields
                    .iter()
                    .find(|(name, _)| name == column)
                    .map_or("", |(_, value)| value.as_str())
            });
            self.writer.write_record(row)?;
        }
        self.writer.flush()?;
        Ok(batch.len())
    }

    #[cfg(test)]
    pub(crate) fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|e| SinkError::Io(e.into_error()))
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub companies: usize,
    pub empty_companies: usize,
    pub rows: usize,
}

/// Runs the pipeline for many companies at once and streams batches to a sink.
///
/// Progress is tracked on a hidden bar unless [`with_progress`](Self::with_progress) is used.
pub struct ConcurrentAggregator {
    width: usize,
    progress: ProgressBar,
}

impl ConcurrentAggregator {
    pub fn new(width: usize) -> Self {
        Self {
            width: width.max(1),
            progress: ProgressBar::hidden(),
        }
    }

    /// Draws a progress bar on stderr, one step per finished company.
    pub fn with_progress(mut self) -> Result<Self, TemplateError> {
        let bar = ProgressBar::new(0);
        bar.set_style(ProgressStyle::with_template(
            "{bar:40.cyan/blue} {pos}/{len} companies [{elapsed_precise}<{eta_precise}]",
        )?);
        self.progress = bar;
        Ok(self)
    }

    /// Batches are written in completion order; rows within a batch keep hit order.
    ///
    /// Company futures are polled concurrently on the calling task. Network waits
    /// overlap; page scans go to the blocking pool (see `DetailExtractor`), while
    /// CSV writes happen here on the single consumer.
    ///
    /// Only sink failures abort the run.
    pub async fn run<S, D, W>(
        &self,
        pipeline: &CollectionPipeline<S, D>,
        tasks: Vec<CompanyTask>,
        sink: &mut RowSink<W>,
    ) -> Result<RunSummary, SinkError>
    where
        S: PatentSearch,
        D: PatentDetails,
        W: Write,
    {
        let total = tasks.len();
        self.progress.set_length(total as u64);
        let mut batches = stream::iter(tasks)
            .map(|task| async move {
                let records = pipeline.collect(&task).await;
                (task, records)
            })
            .buffer_unordered(self.width);

        let mut summary = RunSummary::default();
        while let Some((task, records)) = batches.next().await {
            summary.companies += 1;
            if records.is_empty() {
                summary.empty_companies += 1;
            }
            summary.rows += sink.write_batch(&records)?;
            self.progress.inc(1);
            self.progress.suspend(|| {
                info!(
                    company = %task.company_name,
                    deal = %task.deal_id,
                    rows = records.len(),
                    done = summary.companies,
                    total,
                    "company complete"
                )
            });
        }
        self.progress.finish();
        Ok(summary)
    }
}
