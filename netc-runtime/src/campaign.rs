//! Campaign orchestrator
//!
//! Runs every (test_server, profile, target_server) combination of the roster through the remote
//! measurement client. Each success is persisted as it arrives; failures are logged and skipped.
//! The report is written once all attempts are done.
use crate::{client::ClientError, traits::MeasurementClient};
use async_channel::{Receiver, Sender};
use futures_util::future::join_all;
use metrics::counter;
use netc_core::{
    timestamp, CampaignConfig, MeasureErrorCode, MeasureRequest, MeasurementResult, Report,
    TestRecord, RETRY_BACKOFF,
};
use std::path::PathBuf;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn};

mod error;
mod store;
mod work;

pub use error::CampaignError;
pub use store::{RecordStore, StoreError};
pub use work::WorkItem;

/// A pair that produced no record, with enough context to rerun it by hand.
#[derive(Clone, Debug, PartialEq)]
pub struct FailedAttempt {
    pub test_server: String,
    pub target_server: String,
    pub profile: String,
    pub reason: String,
}

#[derive(Clone, Debug)]
pub struct CampaignSummary {
    pub start_timestamp: String,
    pub attempted: usize,
    pub succeeded: usize,
    pub failures: Vec<FailedAttempt>,
    pub report_path: PathBuf,
}

struct Outcome<'a> {
    item: WorkItem<'a>,
    result: Result<MeasurementResult, ClientError>,
}

pub struct Campaign<C> {
    config: CampaignConfig,
    client: C,
}

impl<C: MeasurementClient> Campaign<C> {
    pub fn new(config: CampaignConfig, client: C) -> Result<Self, CampaignError> {
        let config = config.trim_hosts();
        config.validate()?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &CampaignConfig {
        &self.config
    }

    pub fn work_list(&self) -> Vec<WorkItem<'_>> {
        work::generate(&self.config.hosts, &self.config.profiles)
    }

    #[instrument(name = "campaign", skip_all, fields(hosts = self.config.hosts.len()))]
    pub async fn run(&self) -> Result<CampaignSummary, CampaignError> {
        let store = RecordStore::create(&self.config.output_dir).await?;
        let report = Report::new(timestamp::now());

        let items = self.work_list();
        let attempted = items.len();
        info!(
            "Starting campaign {} with {attempted} attempts over {} profiles.",
            report.start_timestamp,
            self.config.profiles.len()
        );

        let lanes = work::lanes(items, self.config.parallel);
        let (tx, rx) = async_channel::unbounded();

        let runners = join_all(lanes.into_iter().map(|lane| self.run_lane(lane, tx.clone())));
        // The writer finishes once every lane has dropped its sender.
        drop(tx);
        let (_, (report, failures)) = tokio::join!(runners, collect(&store, rx, report));

        let report_path = store.write_report(&report).await?;
        info!(
            "Campaign {} done: {} of {attempted} succeeded. Report at {}.",
            report.start_timestamp,
            report.len(),
            report_path.display()
        );

        Ok(CampaignSummary {
            start_timestamp: report.start_timestamp.clone(),
            attempted,
            succeeded: report.len(),
            failures,
            report_path,
        })
    }

    async fn run_lane<'a>(&'a self, lane: Vec<WorkItem<'a>>, outcomes: Sender<Outcome<'a>>) {
        for item in lane {
            let result = self.attempt(&item).await;
            if outcomes.send(Outcome { item, result }).await.is_err() {
                error!("Result writer is gone; abandoning lane.");
                return;
            }
        }
    }

    /// One pair under one profile, retried on transient failures.
    #[instrument(skip_all, fields(
        test_server = item.test_server,
        target_server = item.target_server,
        profile = %item.profile.name,
    ))]
    async fn attempt(&self, item: &WorkItem<'_>) -> Result<MeasurementResult, ClientError> {
        let request = MeasureRequest::for_profile(item.target_server, item.profile);
        let timeout = item.profile.duration + self.config.timeout_margin;

        let mut retries = 0;
        loop {
            counter!("netc.campaign.attempts").increment(1);
            match self.client.measure(item.test_server, &request, timeout).await {
                Ok(result) => return Ok(result),
                Err(err) if retries < self.config.retries && is_retryable(&err) => {
                    retries += 1;
                    warn!(
                        "Attempt failed ({err}); retry {retries} of {} in {}.",
                        self.config.retries,
                        humantime::format_duration(RETRY_BACKOFF)
                    );
                    tokio::time::sleep(RETRY_BACKOFF).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// The agent rejecting the request itself will not change on a second try.
fn is_retryable(err: &ClientError) -> bool {
    match err {
        ClientError::Agent { code, .. } => *code == MeasureErrorCode::MeasurementFailed,
        ClientError::Timeout | ClientError::Transport(_) | ClientError::Status(_) => true,
    }
}

/// The single writer: stamps and persists successes, and gathers both successes and failures.
async fn collect(
    store: &RecordStore,
    outcomes: Receiver<Outcome<'_>>,
    mut report: Report,
) -> (Report, Vec<FailedAttempt>) {
    let mut records = vec![];
    let mut failures = vec![];

    while let Ok(Outcome { item, result }) = outcomes.recv().await {
        match result {
            Ok(result) => {
                counter!("netc.campaign.succeeded").increment(1);
                let record = TestRecord {
                    test_server: item.test_server.to_string(),
                    target_server: item.target_server.to_string(),
                    test_type: item.profile.name.clone(),
                    timestamp: timestamp::now(),
                    result,
                };
                if let Err(err) = store.write_record(&record).await {
                    error!("Unable to persist result of {item}: {err}");
                }
                records.push((item.index, record));
            }
            Err(err) => {
                counter!("netc.campaign.failed").increment(1);
                warn!("No result for {item}: {err}");
                failures.push(FailedAttempt {
                    test_server: item.test_server.to_string(),
                    target_server: item.target_server.to_string(),
                    profile: item.profile.name.clone(),
                    reason: err.to_string(),
                });
            }
        }
    }

    // Parallel lanes finish out of order.
    records.sort_by_key(|(index, _)| *index);
    for (_, record) in records {
        report.push(record);
    }
    (report, failures)
}
