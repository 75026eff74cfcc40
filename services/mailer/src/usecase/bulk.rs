use crate::domain::repository::{CompletionPort, MailProvider, RecipientRepository};
use crate::domain::types::{OutgoingMessage, Participant};
use crate::error::{ExternalError, MailerError};
use crate::usecase::assist::AssistUseCase;
use crate::usecase::campaign::resolve_body;

pub struct BulkSendInput {
    pub subject: String,
    pub body: Option<String>,
    pub prompt: Option<String>,
}

#[derive(Debug)]
pub struct BulkSendFailure {
    pub email: String,
    pub error: ExternalError,
}

#[derive(Debug, Default)]
pub struct BulkSendReport {
    pub sent: usize,
    pub failed: usize,
    pub errors: Vec<BulkSendFailure>,
}

/// Immediate send to every stored recipient, reporting per-recipient failures.
pub struct BulkSendUseCase<R, M, P>
where
    R: RecipientRepository,
    M: MailProvider,
    P: CompletionPort,
{
    pub recipients: R,
    pub provider: M,
    pub assist: AssistUseCase<P>,
    pub sender: Option<Participant>,
}

impl<R, M, P> BulkSendUseCase<R, M, P>
where
    R: RecipientRepository,
    M: MailProvider,
    P: CompletionPort,
{
    pub async fn execute(
        &self,
        grant_id: &str,
        input: BulkSendInput,
    ) -> Result<BulkSendReport, MailerError> {
        let subject = input.subject.trim();
        if subject.is_empty() {
            return Err(MailerError::MissingField("subject"));
        }
        let body = resolve_body(&self.assist, input.body, input.prompt).await?;
        let recipients = self.recipients.list().await?;

        let mut report = BulkSendReport::default();
        for recipient in recipients {
            let message = OutgoingMessage {
                subject: subject.to_owned(),
                body: body.clone(),
                to: vec![Participant::new(&recipient.name, &recipient.email)],
                reply_to: self.sender.iter().cloned().collect(),
                ..Default::default()
            };
            match self.provider.send_message(grant_id, &message).await {
                Ok(_) => report.sent += 1,
                Err(error) => {
                    tracing::warn!(recipient = %recipient.email, error = %error, "bulk send failed");
                    report.failed += 1;
                    report.errors.push(BulkSendFailure {
                        email: recipient.email,
                        error,
                    });
                }
            }
        }
        Ok(report)
    }
}
