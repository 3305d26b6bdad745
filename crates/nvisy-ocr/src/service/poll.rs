//! Job status polling.

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::{OcrService, guarded};
use crate::{Error, JobHandle, JobStatus, Result, TRACING_TARGET_POLL, TerminalResponse};

impl OcrService {
    /// Polls a job until it leaves the running state.
    ///
    /// Each iteration reads the whole status document and inspects its top-level
    /// `status` field. Only the literal `"Running"` keeps the loop going; any other
    /// value ends it and the current response is returned. A document without a
    /// status ends the loop on the first poll but is a serialization error once the
    /// job was seen running. The wait between polls follows the configured
    /// [`PollPolicy`](crate::PollPolicy) and ends early when `cancel` fires.
    pub async fn poll(
        &self,
        job: &JobHandle,
        api_key: &str,
        cancel: &CancellationToken,
    ) -> Result<TerminalResponse> {
        let credential = self.credential(api_key);
        let policy = self.poll_policy();
        let started_at = Instant::now();
        let deadline = policy.deadline.map(|budget| started_at + budget);

        let mut attempts: u32 = 0;
        let mut seen_running = false;

        loop {
            let response = guarded(
                self.transport().fetch(job, &credential),
                cancel,
                deadline,
                "status request",
            )
            .await?;
            attempts += 1;

            let document: serde_json::Value =
                serde_json::from_str(&response.body).map_err(|e| {
                    Error::from(e).with_message(format!(
                        "Malformed status document for job {job} (HTTP {})",
                        response.status_code
                    ))
                })?;

            match JobStatus::from_document(&document) {
                Some(JobStatus::Running) => {
                    seen_running = true;
                }
                None if seen_running => {
                    return Err(Error::serialization().with_message(format!(
                        "Status document for job {job} lost its status field after running"
                    )));
                }
                status => {
                    tracing::debug!(
                        target: TRACING_TARGET_POLL,
                        job = %job,
                        status = status.as_ref().map(JobStatus::as_str),
                        status_code = response.status_code,
                        attempts,
                        elapsed_ms = started_at.elapsed().as_millis(),
                        "Job reached terminal state"
                    );

                    return Ok(TerminalResponse {
                        body: response.body,
                        status_code: response.status_code,
                        status,
                        attempts,
                    });
                }
            }

            if !policy.allows_attempt(attempts) {
                return Err(Error::job_timeout().with_message(format!(
                    "Job {job} still running after {attempts} status requests"
                )));
            }

            let delay = policy.delay_for(attempts - 1);
            if deadline.is_some_and(|deadline| Instant::now() + delay >= deadline) {
                return Err(Error::job_timeout().with_message(format!(
                    "Job {job} still running after {:?}",
                    started_at.elapsed()
                )));
            }

            tracing::trace!(
                target: TRACING_TARGET_POLL,
                job = %job,
                attempts,
                delay_ms = delay.as_millis(),
                "Job still running"
            );

            tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    return Err(Error::cancelled().with_message(format!(
                        "Cancelled while waiting for job {job}"
                    )));
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
    }
}
