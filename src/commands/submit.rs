use crate::backend::ClientAccessor;
use crate::commands::Notice;
use crate::error::StoryError;
use crate::submission::{FailurePolicy, SubmissionForm, SubmissionPipeline};
use tracing::{error, info};

pub const SUBMITTED: &str =
    "Your story has been submitted successfully! It will be reviewed before publishing.";
pub const SUBMIT_FAILED: &str =
    "An error occurred while submitting your story. Please try again.";

/// Handles the public submission form. The returned banner stays until the
/// next submission.
pub async fn handle_submit(
    accessor: &ClientAccessor,
    form: &SubmissionForm,
    policy: FailurePolicy,
) -> Notice {
    if let Err(e) = form.validate() {
        return Notice::error(e.user_message());
    }

    let Some(client) = accessor.get_client() else {
        return Notice::error(
            StoryError::Configuration("Backend client not initialized".to_string()).user_message(),
        );
    };

    let result = SubmissionPipeline::new(client.as_ref(), accessor.config())
        .with_policy(policy)
        .submit(form)
        .await;

    match result {
        Ok(receipt) => {
            if !receipt.is_complete() {
                info!(
                    "Story {} stored with {} skipped step(s)",
                    receipt.story_id,
                    receipt.skipped.len()
                );
            }
            Notice::success(SUBMITTED)
        }
        Err(e) => {
            error!("Submission error: {}", e);
            match e {
                StoryError::Validation(_) | StoryError::Backend(_) => Notice::error(e.user_message()),
                _ => Notice::error(SUBMIT_FAILED),
            }
        }
    }
}
