//! Email service for sign-in codes and order mail.
//!
//! Uses SMTP via lettre for delivery with Askama templates. Sign-in
//! codes go out as multipart HTML plus plain text; order mail is plain
//! text only, which is what the fulfillment inbox expects.

use std::time::Duration;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use perkstore_core::Points;

use crate::config::EmailConfig;
use crate::models::OrderItem;

/// SMTP connection timeout. A slow relay must not stall checkout.
const SMTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTML template for the sign-in code email.
#[derive(Template)]
#[template(path = "email/login_code.html")]
struct LoginCodeEmailHtml<'a> {
    code: &'a str,
}

/// Plain text template for the sign-in code email.
#[derive(Template)]
#[template(path = "email/login_code.txt")]
struct LoginCodeEmailText<'a> {
    code: &'a str,
}

/// Plain text template for the buyer's order receipt.
#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationEmailText<'a> {
    lines: &'a [OrderEmailLine],
    total: Points,
}

/// Plain text template for the fulfillment inbox notification.
#[derive(Template)]
#[template(path = "email/order_notification.txt")]
struct OrderNotificationEmailText<'a> {
    buyer_name: &'a str,
    buyer_email: &'a str,
    lines: &'a [OrderEmailLine],
    total: Points,
}

/// One rendered line of an order email.
#[derive(Debug, Clone)]
pub struct OrderEmailLine {
    /// Product display name.
    pub name: String,
    /// Units ordered.
    pub quantity: i32,
    /// Line cost (unit price times quantity).
    pub cost: Points,
}

impl From<&OrderItem> for OrderEmailLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.name.clone(),
            quantity: item.quantity,
            cost: item.line_cost(),
        }
    }
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
    fulfillment_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
            fulfillment_address: config.fulfillment_address.clone(),
        })
    }

    /// Send a sign-in code to an employee.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_login_code(&self, to: &str, code: &str) -> Result<(), EmailError> {
        let html = LoginCodeEmailHtml { code }.render()?;
        let text = LoginCodeEmailText { code }.render()?;

        self.send_multipart_email(to, "Your Perkstore sign-in code", &text, &html)
            .await
    }

    /// Send the buyer their order receipt.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        lines: &[OrderEmailLine],
        total: Points,
    ) -> Result<(), EmailError> {
        let text = OrderConfirmationEmailText { lines, total }.render()?;

        self.send_plain_email(to, "Your Perkstore order", &text).await
    }

    /// Notify the fulfillment inbox about a new order.
    ///
    /// # Errors
    ///
    /// Returns error if email fails to send or template fails to render.
    pub async fn send_order_notification(
        &self,
        buyer_name: &str,
        buyer_email: &str,
        lines: &[OrderEmailLine],
        total: Points,
    ) -> Result<(), EmailError> {
        let text = OrderNotificationEmailText {
            buyer_name,
            buyer_email,
            lines,
            total,
        }
        .render()?;

        let to = self.fulfillment_address.clone();
        self.send_plain_email(&to, &format!("Perkstore order from {buyer_name}"), &text)
            .await
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }

    /// Send a plain text email.
    async fn send_plain_email(&self, to: &str, subject: &str, body: &str) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .singlepart(
                SinglePart::builder()
                    .header(ContentType::TEXT_PLAIN)
                    .body(body.to_string()),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

/// Generate a 6-digit verification code.
#[must_use]
pub fn generate_verification_code() -> String {
    use rand::Rng;
    let code: u32 = rand::rng().random_range(100_000..1_000_000);
    code.to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_verification_code_format() {
        let code = generate_verification_code();
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_generate_verification_code_range() {
        for _ in 0..100 {
            let code: u32 = generate_verification_code().parse().expect("valid number");
            assert!(code >= 100_000);
            assert!(code < 1_000_000);
        }
    }

    #[test]
    fn test_login_code_templates_render_the_code() {
        let html = LoginCodeEmailHtml { code: "483920" }.render().unwrap();
        let text = LoginCodeEmailText { code: "483920" }.render().unwrap();

        assert!(html.contains("483920"));
        assert!(text.contains("483920"));
    }

    #[test]
    fn test_order_confirmation_lists_numbered_lines_and_total() {
        let lines = vec![
            OrderEmailLine {
                name: "Branded cap".to_string(),
                quantity: 2,
                cost: Points::new(1400),
            },
            OrderEmailLine {
                name: "Water bottle".to_string(),
                quantity: 1,
                cost: Points::new(350),
            },
        ];

        let text = OrderConfirmationEmailText {
            lines: &lines,
            total: Points::new(1750),
        }
        .render()
        .unwrap();

        assert!(text.contains("1. Branded cap - 2 pcs."));
        assert!(text.contains("2. Water bottle - 1 pcs."));
        assert!(text.contains("Cost: 1400 points"));
        assert!(text.contains("Total: 1750 points"));
    }

    #[test]
    fn test_order_notification_names_the_buyer() {
        let lines = vec![OrderEmailLine {
            name: "Branded cap".to_string(),
            quantity: 1,
            cost: Points::new(700),
        }];

        let text = OrderNotificationEmailText {
            buyer_name: "Jamie Fox",
            buyer_email: "jamie@example.com",
            lines: &lines,
            total: Points::new(700),
        }
        .render()
        .unwrap();

        assert!(text.contains("Jamie Fox"));
        assert!(text.contains("jamie@example.com"));
        assert!(text.contains("Total: 700 points"));
    }
}
