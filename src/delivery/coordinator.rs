//! DeliveryCoordinator: sends a plan through a transport, one call at a time.
//!
//! Calls are awaited in sequence order and never overlap: chunk envelopes
//! trigger independent workflow runs that may merge into the same file, so
//! their arrival order matters. The first failed call stops the delivery;
//! nothing is retried.

use std::sync::Arc;

use token_dispatch_core::{DeliveryPlan, Envelope, FileContent, StrategyKind};
use tracing::{debug, info, warn};

use super::types::{
    CoordinatorOptions, DeliveryFailure, DeliveryOutcome, DeliveryProgress, DeliveryResult,
    TokenTransport, TransportError, TransportErrorKind,
};

/// One transport call of a delivery.
enum Step<'a> {
    Dispatch(&'a Envelope),
    Upload(&'a FileContent),
}

impl Step<'_> {
    fn label(&self) -> &str {
        match self {
            Step::Dispatch(envelope) => envelope.category(),
            Step::Upload(file) => file.path.as_str(),
        }
    }
}

pub struct DeliveryCoordinator {
    transport: Arc<dyn TokenTransport>,
    options: CoordinatorOptions,
}

impl DeliveryCoordinator {
    pub fn new(transport: Arc<dyn TokenTransport>) -> Self {
        Self::with_options(transport, CoordinatorOptions::default())
    }

    pub fn with_options(transport: Arc<dyn TokenTransport>, options: CoordinatorOptions) -> Self {
        Self { transport, options }
    }

    /// Send every envelope of `plan` and report the first failure, if any.
    pub async fn deliver(&self, plan: &DeliveryPlan) -> DeliveryResult {
        let steps = match self.steps(plan) {
            Ok(steps) => steps,
            Err(failure) => {
                warn!(strategy = %plan.kind, error = %failure.message, "plan cannot be delivered");
                return DeliveryResult {
                    outcome: DeliveryOutcome::Failure,
                    succeeded: 0,
                    total: 1,
                    first_failure: Some(failure),
                };
            }
        };

        let total = steps.len();
        let mut succeeded = 0;

        for (i, step) in steps.iter().enumerate() {
            let index = i + 1;
            debug!(index, total, category = step.label(), "sending");

            if let Err(err) = self.send(step).await {
                warn!(
                    index,
                    total,
                    succeeded,
                    category = step.label(),
                    status = ?err.status,
                    error = %err,
                    "delivery stopped"
                );
                let outcome = if succeeded == 0 {
                    DeliveryOutcome::Failure
                } else {
                    DeliveryOutcome::PartialFailure
                };
                return DeliveryResult {
                    outcome,
                    succeeded,
                    total,
                    first_failure: Some(DeliveryFailure {
                        index,
                        category: step.label().to_string(),
                        status: err.status,
                        kind: err.kind,
                        message: err.message,
                    }),
                };
            }

            succeeded += 1;
            if let Some(ref cb) = self.options.on_progress {
                cb(&DeliveryProgress {
                    index,
                    total,
                    category: step.label().to_string(),
                });
            }
        }

        info!(strategy = %plan.kind, delivered = succeeded, "delivery complete");
        DeliveryResult {
            outcome: DeliveryOutcome::Success,
            succeeded,
            total,
            first_failure: None,
        }
    }

    fn steps<'a>(&self, plan: &'a DeliveryPlan) -> Result<Vec<Step<'a>>, DeliveryFailure> {
        if plan.kind != StrategyKind::FileUpload {
            if plan.is_empty() {
                return Err(DeliveryFailure {
                    index: 1,
                    category: String::new(),
                    status: None,
                    kind: TransportErrorKind::Rejected,
                    message: format!("{} plan carries no envelopes", plan.kind),
                });
            }
            return Ok(plan
                .envelopes
                .iter()
                .map(|p| Step::Dispatch(&p.envelope))
                .collect());
        }

        let file = plan.file.as_ref().ok_or_else(|| DeliveryFailure {
            index: 1,
            category: String::new(),
            status: None,
            kind: TransportErrorKind::Rejected,
            message: "file upload plan carries no file content".to_string(),
        })?;

        let mut steps = vec![Step::Upload(file)];
        if self.options.notify_after_upload {
            steps.extend(plan.envelopes.iter().map(|p| Step::Dispatch(&p.envelope)));
        }
        Ok(steps)
    }

    async fn send(&self, step: &Step<'_>) -> Result<(), TransportError> {
        match step {
            Step::Dispatch(envelope) => {
                let response = self.transport.dispatch_event(envelope).await?;
                if response.is_dispatch_success() {
                    Ok(())
                } else {
                    Err(TransportError::from_response(&response))
                }
            }
            Step::Upload(file) => {
                let response = self.transport.put_file(file).await?;
                if response.is_upload_success() {
                    Ok(())
                } else {
                    Err(TransportError::from_response(&response))
                }
            }
        }
    }
}
