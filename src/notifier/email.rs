//! Summary email over SMTP

use super::Notifier;
use crate::config::EmailConfig;
use crate::error::ErrorKind;
use crate::ingest::BatchResult;
use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use log::{error, info};

/// Sends one plain-text message per batch to a fixed recipient list
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    recipients: Vec<Mailbox>,
    subject: String,
}

impl EmailNotifier {
    pub fn from_config(config: &EmailConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| format!("Invalid sender address {:?}: {}", config.from, e))?;
        let recipients = config
            .recipients
            .iter()
            .map(|r| r.parse::<Mailbox>().map_err(|e| format!("Invalid recipient {:?}: {}", r, e)))
            .collect::<Result<Vec<_>, _>>()?;
        if recipients.is_empty() {
            return Err("No email recipients configured".into());
        }

        let builder = if config.starttls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
        };
        let mut builder = builder.port(config.smtp_port);
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            builder = builder.credentials(Credentials::new(username.clone(), password.clone()));
            if config.xoauth2 {
                builder = builder.authentication(vec![Mechanism::Xoauth2]);
            }
        }
        info!(
            "Email notifier using {}:{} ({} recipients)",
            config.smtp_host,
            config.smtp_port,
            recipients.len()
        );

        Ok(Self {
            mailer: builder.build(),
            from,
            recipients,
            subject: config.subject.clone(),
        })
    }
}

/// `Upload <id>: <title>` followed by one `<file name>: <caption>` line per photo
pub fn compose_summary(batch: &BatchResult) -> String {
    let mut body = format!("Upload {}: {}\n\n", batch.upload_identifier, batch.title);
    for result in &batch.photo_results {
        let file_name = result.file_name().unwrap_or_else(|| format!("photo{}", result.index));
        body.push_str(&format!("{}: {}\n", file_name, result.caption));
    }
    body
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, batch: &BatchResult) -> Result<(), ErrorKind> {
        let mut builder = Message::builder().from(self.from.clone()).subject(&self.subject);
        for recipient in &self.recipients {
            builder = builder.to(recipient.clone());
        }
        let message = builder
            .header(ContentType::TEXT_PLAIN)
            .body(compose_summary(batch))
            .map_err(|e| {
                error!("Could not build summary email: {}", e);
                ErrorKind::NotificationFailed
            })?;

        self.mailer.send(message).await.map_err(|e| {
            error!("Could not send summary email for upload {}: {}", batch.upload_identifier, e);
            ErrorKind::NotificationFailed
        })?;
        info!("Sent summary email for upload {}", batch.upload_identifier);
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::{ImageExtension, PhotoResult};

    #[test]
    fn test_summary_lists_photos_in_order() {
        let mut first = PhotoResult::new(0, "Tulips by the fence".to_string());
        first.resolved_extension = Some(ImageExtension::Jpg);
        let mut second = PhotoResult::new(1, "".to_string());
        second.resolved_extension = Some(ImageExtension::Png);
        let batch = BatchResult {
            upload_identifier: 12,
            title: "Spring".to_string(),
            photo_results: vec![first, second],
            overall_error: None,
        };

        assert_eq!(
            compose_summary(&batch),
            "Upload 12: Spring\n\nphoto0.jpg: Tulips by the fence\nphoto1.png: \n"
        );
    }

    #[test]
    fn test_unresolved_photo_has_bare_name() {
        let batch = BatchResult {
            upload_identifier: 3,
            title: "Autumn".to_string(),
            photo_results: vec![PhotoResult::failed(0, "leaves".to_string(), ErrorKind::UnsupportedType)],
            overall_error: Some(ErrorKind::UnsupportedType),
        };
        assert!(compose_summary(&batch).ends_with("photo0: leaves\n"));
    }

    #[test]
    fn test_invalid_recipient_rejected() {
        let config = EmailConfig {
            from: "uploader@example.com".to_string(),
            recipients: vec!["not an address".to_string()],
            ..EmailConfig::default()
        };
        assert!(EmailNotifier::from_config(&config).is_err());
    }
}
