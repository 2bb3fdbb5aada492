//! Periodic analysis of the default dataset.

use crate::app_state::SharedAppState;
use crate::error::AnalyticsError;
use crate::models::{RequestData, ResultEnvelope};
use crate::pipeline::{self, Trigger};

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{error, info, warn};

/// Runs the pipeline over the default dataset at a fixed interval and optionally publishes the
/// result to the object store.
pub struct Scheduler {
    state: SharedAppState,
    request_data: RequestData,
    interval: Duration,
}

impl Scheduler {
    /// Return a scheduler for the configured interval and default dataset.
    ///
    /// Returns `None` if scheduling is disabled, or if no default dataset is configured.
    pub fn from_state(state: &SharedAppState) -> Option<Self> {
        let seconds = state.args.schedule_interval.filter(|seconds| *seconds > 0)?;
        let Some(request_data) = state.default_request.clone() else {
            warn!("Schedule interval set without a default dataset, scheduler disabled");
            return None;
        };
        info!(
            interval = seconds,
            bucket = %request_data.bucket,
            object = %request_data.object,
            "Scheduler: created with interval {}s",
            seconds
        );
        Some(Self {
            state: state.clone(),
            request_data,
            interval: Duration::from_secs(seconds),
        })
    }

    /// Start the scheduler on a new task. The first run happens immediately.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                if let Err(err) = self.tick().await {
                    error!(error = %err, "Scheduler: run failed");
                }
            }
        })
    }

    /// Run the pipeline once and publish the result if a publish key is configured.
    pub async fn tick(&self) -> Result<ResultEnvelope, AnalyticsError> {
        let credentials = pipeline::credentials(None, &self.state.args);
        let envelope = pipeline::run(
            &self.state,
            &self.request_data,
            credentials.clone(),
            Trigger::Schedule,
        )
        .await?;
        let kpis = &envelope.data.kpis;
        info!(
            total_revenue = kpis.total_revenue,
            total_orders = kpis.total_orders,
            average_order_value = kpis.average_order_value,
            "Scheduler: run complete"
        );
        if let Some(key) = &self.state.args.publish_key {
            pipeline::publish(&self.state, &self.request_data, credentials, &envelope, key)
                .await?;
        }
        Ok(envelope)
    }
}
