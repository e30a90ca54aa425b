// crates/auditproof-orchestrator/src/finalizer.rs
//
// Finalizer: background finalization of auditor approvals.
//
// The admission path enqueues a FinalizeJob as soon as the approval
// transaction is accepted and returns to its caller. A dispatcher task pulls
// jobs off a bounded queue and runs each on its own task, at most
// `concurrency` at a time. Per job:
//
//   Submitted -> ApprovalConfirmed | ApprovalTimedOut
//             -> ReputationComputed -> CredentialIssued
//             -> [ScoreDeferred] -> ScoreSubmitted -> ScoreConfirmed | ScoreTimedOut
//
// Every failure inside a job is sent to the error sink and recorded on the
// job's report. Nothing is surfaced to the original caller, and a panicking
// job only takes down its own task.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};

use auditproof_core::chain::{Confirmation, ContractCall};
use auditproof_core::error::AuditProofError;
use auditproof_core::types::{Address, TxHash};
use auditproof_reputation::{AuditorProfile, Reputation, ReputationSource};

use crate::issuance::IssuanceService;
use crate::signing::SigningContext;

/// Pending jobs the queue holds before enqueue starts dropping.
const QUEUE_CAPACITY: usize = 256;

/// Bounded retry for the credibility-score submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total submission attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts, also used to defer submission when the
    /// approval did not confirm in time.
    pub delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizerConfig {
    pub confirmation_timeout: Duration,
    pub retry: RetryPolicy,
    pub concurrency: usize,
}

impl Default for FinalizerConfig {
    fn default() -> Self {
        Self {
            confirmation_timeout: Duration::from_secs(60),
            retry: RetryPolicy::default(),
            concurrency: 4,
        }
    }
}

/// Work item produced by a successful approval submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeJob {
    pub auditor: Address,
    pub approval_tx: TxHash,
    pub github_handle: String,
    pub code4rena_handle: String,
    pub immunefi_handle: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stage {
    Submitted { tx: TxHash },
    ApprovalConfirmed { block_number: u64 },
    ApprovalTimedOut,
    ReputationComputed { score: u64 },
    CredentialIssued { credential_id: String },
    ScoreDeferred,
    ScoreRetryScheduled { attempt: u32 },
    ScoreSubmitted { tx: TxHash },
    ScoreConfirmed { block_number: u64 },
    ScoreTimedOut,
}

/// A failure contained inside a background job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackgroundError {
    pub auditor: Address,
    pub stage: &'static str,
    pub message: String,
}

/// Trace of one finished job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeReport {
    pub auditor: Address,
    pub stages: Vec<Stage>,
    pub errors: Vec<BackgroundError>,
}

impl FinalizeReport {
    fn new(auditor: Address) -> Self {
        Self {
            auditor,
            stages: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn reached(&self, stage: &Stage) -> bool {
        self.stages.contains(stage)
    }
}

/// Cloneable producer side of the finalizer queue.
#[derive(Debug, Clone)]
pub struct FinalizerHandle {
    jobs: mpsc::Sender<FinalizeJob>,
    errors: mpsc::UnboundedSender<BackgroundError>,
}

impl FinalizerHandle {
    /// Queue a job without waiting. Returns false if the queue is full or the
    /// finalizer has stopped; the dropped job is reported to the error sink.
    pub fn enqueue(&self, job: FinalizeJob) -> bool {
        let auditor = job.auditor;
        match self.jobs.try_send(job) {
            Ok(()) => {
                tracing::debug!("Queued finalization for {}", auditor);
                true
            }
            Err(e) => {
                let _ = self.errors.send(BackgroundError {
                    auditor,
                    stage: "enqueue",
                    message: format!("Finalization dropped: {}", e),
                });
                false
            }
        }
    }
}

pub struct Finalizer {
    signer: Arc<SigningContext>,
    reputation: Arc<dyn ReputationSource>,
    issuance: Option<Arc<IssuanceService>>,
    config: FinalizerConfig,
    errors: mpsc::UnboundedSender<BackgroundError>,
    error_rx: Option<mpsc::UnboundedReceiver<BackgroundError>>,
    reports: Option<mpsc::UnboundedSender<FinalizeReport>>,
}

impl Finalizer {
    pub fn new(
        signer: Arc<SigningContext>,
        reputation: Arc<dyn ReputationSource>,
        config: FinalizerConfig,
    ) -> Self {
        let (errors, error_rx) = mpsc::unbounded_channel();
        Self {
            signer,
            reputation,
            issuance: None,
            config,
            errors,
            error_rx: Some(error_rx),
            reports: None,
        }
    }

    /// Issue a credibility credential for every approved auditor.
    pub fn with_issuance(mut self, issuance: Arc<IssuanceService>) -> Self {
        self.issuance = Some(issuance);
        self
    }

    /// Publish a report for every finished job.
    pub fn with_reports(mut self, reports: mpsc::UnboundedSender<FinalizeReport>) -> Self {
        self.reports = Some(reports);
        self
    }

    /// Start the dispatcher and the error-sink logger. Both stop once every
    /// handle has been dropped and the queue has drained.
    pub fn spawn(mut self) -> FinalizerHandle {
        let (jobs, job_rx) = mpsc::channel(QUEUE_CAPACITY);
        let errors = self.errors.clone();
        if let Some(error_rx) = self.error_rx.take() {
            tokio::spawn(drain_error_sink(error_rx));
        }
        tracing::info!(
            "Finalizer started (concurrency {}, confirmation timeout {:?}, {} score attempts)",
            self.config.concurrency,
            self.config.confirmation_timeout,
            self.config.retry.max_attempts
        );
        tokio::spawn(Arc::new(self).dispatch(job_rx));
        FinalizerHandle { jobs, errors }
    }

    async fn dispatch(self: Arc<Self>, mut job_rx: mpsc::Receiver<FinalizeJob>) {
        let permits = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        while let Some(job) = job_rx.recv().await {
            let permit = match permits.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => break,
            };
            let worker = self.clone();
            tokio::spawn(async move {
                let _permit = permit;
                let auditor = job.auditor;
                match tokio::spawn(worker.clone().finalize(job)).await {
                    Ok(report) => {
                        if let Some(reports) = &worker.reports {
                            let _ = reports.send(report);
                        }
                    }
                    Err(e) => {
                        let error = BackgroundError {
                            auditor,
                            stage: "task",
                            message: e.to_string(),
                        };
                        let _ = worker.errors.send(error);
                    }
                }
            });
        }
        tracing::debug!("Finalizer queue closed");
    }

    async fn finalize(self: Arc<Self>, job: FinalizeJob) -> FinalizeReport {
        let mut report = FinalizeReport::new(job.auditor);
        let timeout = self.config.confirmation_timeout;
        report.stages.push(Stage::Submitted { tx: job.approval_tx });

        let approval_confirmed = match self.signer.confirm(&job.approval_tx, timeout).await {
            Confirmation::Confirmed { block_number } => {
                tracing::info!("Approval of {} confirmed in block {}", job.auditor, block_number);
                report.stages.push(Stage::ApprovalConfirmed { block_number });
                true
            }
            Confirmation::TimedOut => {
                tracing::warn!(
                    "Approval of {} not confirmed within {:?}; continuing",
                    job.auditor,
                    timeout
                );
                report.stages.push(Stage::ApprovalTimedOut);
                false
            }
        };

        let profile = AuditorProfile {
            address: job.auditor,
            github_handle: job.github_handle.clone(),
            code4rena_handle: job.code4rena_handle.clone(),
            immunefi_handle: job.immunefi_handle.clone(),
            credential_count: 0,
        };
        let reputation = match self.reputation.reputation(&profile).await {
            Ok(reputation) => reputation,
            Err(e) => {
                self.fail(&mut report, "reputation", e);
                Reputation {
                    address: job.auditor,
                    credibility_score: 0,
                    signals: Vec::new(),
                }
            }
        };
        let score = reputation.credibility_score;
        tracing::info!("Computed credibility score {} for {}", score, job.auditor);
        report.stages.push(Stage::ReputationComputed { score });

        if let Some(issuance) = &self.issuance {
            match issuance
                .issue_credibility(self.signer.address(), &reputation)
                .await
            {
                Ok(credential) => report.stages.push(Stage::CredentialIssued {
                    credential_id: credential.id,
                }),
                Err(e) => self.fail(&mut report, "credential", e),
            }
        }

        if score == 0 {
            return report;
        }

        if !approval_confirmed {
            tracing::info!(
                "Deferring score submission for {} by {:?}",
                job.auditor,
                self.config.retry.delay
            );
            report.stages.push(Stage::ScoreDeferred);
            tokio::time::sleep(self.config.retry.delay).await;
        }

        let tx = match self.submit_score(&mut report, job.auditor, score).await {
            Ok(tx) => tx,
            Err(e) => {
                self.fail(&mut report, "score", e);
                return report;
            }
        };
        report.stages.push(Stage::ScoreSubmitted { tx });

        match self.signer.confirm(&tx, timeout).await {
            Confirmation::Confirmed { block_number } => {
                tracing::info!("Score update for {} confirmed in block {}", job.auditor, block_number);
                report.stages.push(Stage::ScoreConfirmed { block_number });
            }
            Confirmation::TimedOut => {
                tracing::warn!(
                    "Score update {} for {} not confirmed within {:?}",
                    tx,
                    job.auditor,
                    timeout
                );
                report.stages.push(Stage::ScoreTimedOut);
            }
        }
        report
    }

    async fn submit_score(
        &self,
        report: &mut FinalizeReport,
        auditor: Address,
        score: u64,
    ) -> Result<TxHash, AuditProofError> {
        let policy = self.config.retry;
        let max_attempts = policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            let call = ContractCall::UpdateCredibilityScore { auditor, score };
            match self.signer.send(call).await {
                Ok(tx) => return Ok(tx),
                Err(e) if e.is_state_conflict() || attempt >= max_attempts => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        "Score submission for {} failed (attempt {}/{}): {}",
                        auditor,
                        attempt,
                        max_attempts,
                        e
                    );
                    attempt += 1;
                    report.stages.push(Stage::ScoreRetryScheduled { attempt });
                    tokio::time::sleep(policy.delay).await;
                }
            }
        }
    }

    fn fail(&self, report: &mut FinalizeReport, stage: &'static str, e: AuditProofError) {
        let error = BackgroundError {
            auditor: report.auditor,
            stage,
            message: e.to_string(),
        };
        let _ = self.errors.send(error.clone());
        report.errors.push(error);
    }
}

/// Log every background failure. Runs until all senders are gone.
async fn drain_error_sink(mut error_rx: mpsc::UnboundedReceiver<BackgroundError>) {
    while let Some(error) = error_rx.recv().await {
        tracing::warn!(
            "Background finalization for {} failed at {}: {}",
            error.auditor,
            error.stage,
            error.message
        );
    }
}
