use serde::Serialize;

use crate::domain::repository::{MailProvider, RecipientRepository};
use crate::domain::types::{NewRecipient, Recipient};
use crate::error::MailerError;

#[derive(Debug, Default, Serialize, PartialEq, Eq)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
}

pub struct RecipientUseCase<R: RecipientRepository> {
    pub recipients: R,
}

impl<R: RecipientRepository> RecipientUseCase<R> {
    pub async fn list(&self) -> Result<Vec<Recipient>, MailerError> {
        self.recipients.list().await
    }

    pub async fn count(&self) -> Result<u64, MailerError> {
        self.recipients.count().await
    }

    /// Add a recipient, or rename the one already holding `email`.
    pub async fn upsert(&self, name: &str, email: &str) -> Result<Recipient, MailerError> {
        let recipient = normalize(name, email).ok_or(MailerError::MissingField("email"))?;
        self.recipients.upsert(&recipient).await
    }

    /// Upsert every `name,email` line of `text`; malformed lines are skipped.
    pub async fn import_csv(&self, text: &str) -> Result<ImportReport, MailerError> {
        let mut report = ImportReport::default();
        for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
            match parse_line(line) {
                Some(recipient) => {
                    self.recipients.upsert(&recipient).await?;
                    report.imported += 1;
                }
                None if is_header(line) => {}
                None => {
                    tracing::debug!(line, "skipping malformed recipient line");
                    report.skipped += 1;
                }
            }
        }
        Ok(report)
    }
}

pub struct ImportContactsUseCase<R: RecipientRepository, M: MailProvider> {
    pub recipients: R,
    pub provider: M,
}

impl<R: RecipientRepository, M: MailProvider> ImportContactsUseCase<R, M> {
    /// Upsert every provider contact that has an email address.
    pub async fn execute(&self, grant_id: &str) -> Result<ImportReport, MailerError> {
        let contacts = self
            .provider
            .list_contacts(grant_id)
            .await
            .map_err(MailerError::ProviderFailed)?;
        let mut report = ImportReport::default();
        for contact in &contacts {
            let recipient = contact
                .primary_email()
                .and_then(|email| normalize(&contact.display_name(), email));
            match recipient {
                Some(recipient) => {
                    self.recipients.upsert(&recipient).await?;
                    report.imported += 1;
                }
                None => report.skipped += 1,
            }
        }
        Ok(report)
    }
}

/// Trimmed recipient; the email doubles as the name when none is given.
fn normalize(name: &str, email: &str) -> Option<NewRecipient> {
    let email = email.trim();
    if !email.contains('@') || email.contains(char::is_whitespace) {
        return None;
    }
    let name = name.trim();
    Some(NewRecipient {
        name: (if name.is_empty() { email } else { name }).to_owned(),
        email: email.to_owned(),
    })
}

/// Split at the last comma so names may themselves contain commas.
fn parse_line(line: &str) -> Option<NewRecipient> {
    let (name, email) = line.rsplit_once(',')?;
    normalize(name.trim_matches('"'), email.trim_matches('"'))
}

fn is_header(line: &str) -> bool {
    line.replace(' ', "").eq_ignore_ascii_case("name,email")
}
