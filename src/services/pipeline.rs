use crate::config::{FlagPolicy, HeaderPolicy};
use crate::error::AppError;
use crate::models::{RawTable, Summaries};
use crate::services::aggregator::Aggregator;
use crate::services::charts::{self, ChartSpec};
use crate::services::normalizer::Normalizer;
use crate::services::page::{self, MapDescriptor, PageOptions};

#[derive(Debug, Clone, Copy, Default)]
pub struct PipelineOptions {
    pub header_policy: HeaderPolicy,
    pub flag_policy: FlagPolicy,
}

/// Everything the page is built from, computed once at startup.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub summaries: Summaries,
    pub charts: Vec<ChartSpec>,
    pub map: MapDescriptor,
}

impl Dashboard {
    pub fn render(&self, options: &PageOptions) -> String {
        page::render(&self.charts, &self.map, options)
    }
}

/// Normalizer -> Aggregator -> Chart Binder over an already fetched table.
pub fn build_dashboard(table: &RawTable, options: PipelineOptions) -> Result<Dashboard, AppError> {
    let start = std::time::Instant::now();

    let survey = Normalizer::new(options.header_policy).normalize(table)?;
    let summaries = Aggregator::new(&survey, options.flag_policy).aggregate()?;
    if summaries.all_empty() {
        tracing::warn!("No survey responses found, charts will be empty");
    }
    let charts = charts::bind(&summaries);

    tracing::info!(
        "Built {} charts from {} responses in {:?}",
        charts.len(),
        survey.len(),
        start.elapsed()
    );

    Ok(Dashboard {
        summaries,
        charts,
        map: MapDescriptor::diber_tic(),
    })
}
