//! Email service for order confirmations and contact form notifications.
//!
//! Every message is sent as multipart plain text + HTML. Callers treat delivery as best effort:
//! sends happen in background tasks and failures are logged, never surfaced to the customer.

use chrono::{DateTime, Datelike, Utc};
use lettre::{
    Address, AsyncFileTransport, AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart},
    transport::smtp::authentication::Credentials,
};
use rust_decimal::Decimal;
use std::path::Path;

use crate::{
    config::{Config, EmailTransportConfig},
    db::models::{contact_messages::ContactMessageDBResponse, orders::OrderDBResponse},
    errors::Error,
    types::ProductType,
};

pub struct EmailService {
    transport: EmailTransport,
    from_email: String,
    from_name: String,
    reply_to: Option<String>,
    admin_email: Option<String>,
}

enum EmailTransport {
    Smtp(AsyncSmtpTransport<Tokio1Executor>),
    File(AsyncFileTransport<Tokio1Executor>),
}

/// A rendered email, before addressing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailContent {
    pub subject: String,
    pub text: String,
    pub html: String,
}

impl EmailService {
    pub fn new(config: &Config) -> Result<Self, Error> {
        let email_config = &config.email;

        let transport = match &email_config.transport {
            EmailTransportConfig::Smtp {
                host,
                port,
                username,
                password,
                use_tls,
            } => {
                if !use_tls {
                    tracing::warn!("SMTP TLS is disabled - this is not recommended for production");
                }

                let smtp_builder = if *use_tls {
                    AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                } else {
                    Ok(AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host))
                }
                .map_err(|e| Error::Internal {
                    operation: format!("create SMTP transport: {e}"),
                })?
                .port(*port)
                .credentials(Credentials::new(username.clone(), password.clone()));

                EmailTransport::Smtp(smtp_builder.build())
            }
            EmailTransportConfig::File { path } => {
                let emails_dir = Path::new(path);
                if !emails_dir.exists() {
                    std::fs::create_dir_all(emails_dir).map_err(|e| Error::Internal {
                        operation: format!("create emails directory: {e}"),
                    })?;
                }
                EmailTransport::File(AsyncFileTransport::<Tokio1Executor>::new(emails_dir))
            }
        };

        Ok(Self {
            transport,
            from_email: email_config.from_email.clone(),
            from_name: email_config.from_name.clone(),
            reply_to: email_config.reply_to.clone(),
            admin_email: email_config.admin_email.clone(),
        })
    }

    /// Thank the customer once their payment has cleared.
    pub async fn send_purchase_confirmation(&self, order: &OrderDBResponse, product_title: Option<&str>) -> Result<(), Error> {
        let content = self.purchase_confirmation_content(order, product_title);
        self.send_email(&order.customer_email, Some(&order.customer_name), &content).await
    }

    /// Acknowledge a contact form submission to the sender.
    pub async fn send_contact_confirmation(&self, submission: &ContactMessageDBResponse) -> Result<(), Error> {
        let content = self.contact_confirmation_content(submission);
        self.send_email(&submission.email, Some(&submission.name), &content).await
    }

    /// Forward a contact form submission to the site admin. A no-op when no admin address is set.
    pub async fn send_contact_notification(&self, submission: &ContactMessageDBResponse) -> Result<(), Error> {
        let Some(admin_email) = self.admin_email.as_deref() else {
            tracing::debug!("No admin email configured, skipping contact notification");
            return Ok(());
        };
        let content = self.contact_notification_content(submission);
        self.send_email(admin_email, None, &content).await
    }

    async fn send_email(&self, to_email: &str, to_name: Option<&str>, content: &EmailContent) -> Result<(), Error> {
        let from_address = self.from_email.parse::<Address>().map_err(|e| Error::Internal {
            operation: format!("parse from email: {e}"),
        })?;
        let from = Mailbox::new(Some(self.from_name.clone()), from_address);

        // Display names come from form input, so build the mailbox rather than parsing "Name <addr>"
        let to_address = to_email.parse::<Address>().map_err(|e| Error::Internal {
            operation: format!("parse to email: {e}"),
        })?;
        let to = Mailbox::new(to_name.map(str::to_string), to_address);

        let mut builder = Message::builder().from(from).to(to).subject(&content.subject);

        if let Some(reply_to) = &self.reply_to {
            let reply_to = reply_to.parse::<Mailbox>().map_err(|e| Error::Internal {
                operation: format!("parse reply-to email: {e}"),
            })?;
            builder = builder.reply_to(reply_to);
        }

        let message = builder
            .multipart(MultiPart::alternative_plain_html(content.text.clone(), content.html.clone()))
            .map_err(|e| Error::Internal {
                operation: format!("build email message: {e}"),
            })?;

        match &self.transport {
            EmailTransport::Smtp(smtp) => {
                smtp.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send SMTP email: {e}"),
                })?;
            }
            EmailTransport::File(file) => {
                file.send(message).await.map_err(|e| Error::Internal {
                    operation: format!("send file email: {e}"),
                })?;
            }
        }

        tracing::debug!(subject = %content.subject, "Email sent");
        Ok(())
    }

    fn purchase_confirmation_content(&self, order: &OrderDBResponse, product_title: Option<&str>) -> EmailContent {
        let kind = match order.product_type {
            ProductType::Coaching => "Coaching Package",
            ProductType::Plan => "Fitness Plan",
        };
        let product_name = product_title.unwrap_or(kind);
        let amount = format_amount(order.amount);
        let date = order.purchase_date.format("%B %-d, %Y");
        let brand = &self.from_name;

        let text = format!(
            "Thank You for Your Purchase!\n\n\
             Hello {name},\n\n\
             Thank you for purchasing the {product_name}.\n\n\
             Order Details:\n\
             Order ID: {id}\n\
             Product: {kind} - {product_name}\n\
             Amount: {amount}\n\
             Date: {date}\n\n\
             If you have any questions about your purchase, please don't hesitate to contact us.\n\n\
             Best regards,\n\
             {brand} Team\n",
            name = order.customer_name,
            id = order.id,
        );

        let body = format!(
            r#"<p>Hello {name},</p>
<p>Thank you for purchasing the <strong>{product}</strong>.</p>
<div class="panel">
  <h3>Order Details:</h3>
  <p><strong>Order ID:</strong> {id}</p>
  <p><strong>Product:</strong> {kind} - {product}</p>
  <p><strong>Amount:</strong> {amount}</p>
  <p><strong>Date:</strong> {date}</p>
</div>
<p>If you have any questions about your purchase, please don't hesitate to contact us.</p>
<p>Best regards,<br>{brand} Team</p>"#,
            name = escape_html(&order.customer_name),
            product = escape_html(product_name),
            id = order.id,
            brand = escape_html(brand),
        );

        EmailContent {
            subject: format!("Order Confirmation - {product_name}"),
            text,
            html: self.wrap_html("Thank You for Your Purchase!", &body, order.purchase_date),
        }
    }

    fn contact_confirmation_content(&self, submission: &ContactMessageDBResponse) -> EmailContent {
        let brand = &self.from_name;

        let text = format!(
            "We've Received Your Message\n\n\
             Hello {name},\n\n\
             Thank you for contacting {brand}. We've received your message and will get back to you as soon as possible.\n\n\
             Your Message:\n\
             Subject: {subject}\n\
             Message: {message}\n\n\
             If you have any additional questions, please don't hesitate to reach out.\n\n\
             Best regards,\n\
             {brand} Team\n",
            name = submission.name,
            subject = submission.subject,
            message = submission.message,
        );

        let body = format!(
            r#"<p>Hello {name},</p>
<p>Thank you for contacting {brand}. We've received your message and will get back to you as soon as possible.</p>
<div class="panel">
  <h3>Your Message:</h3>
  <p><strong>Subject:</strong> {subject}</p>
  <p><strong>Message:</strong> {message}</p>
</div>
<p>If you have any additional questions, please don't hesitate to reach out.</p>
<p>Best regards,<br>{brand} Team</p>"#,
            name = escape_html(&submission.name),
            brand = escape_html(brand),
            subject = escape_html(&submission.subject),
            message = escape_html(&submission.message),
        );

        EmailContent {
            subject: format!("Thank you for contacting {brand}"),
            text,
            html: self.wrap_html("We've Received Your Message", &body, submission.created_at),
        }
    }

    fn contact_notification_content(&self, submission: &ContactMessageDBResponse) -> EmailContent {
        let date = submission.created_at.format("%Y-%m-%d %H:%M UTC");

        let text = format!(
            "New Contact Form Submission\n\n\
             A new contact form submission has been received:\n\n\
             Name: {name}\n\
             Email: {email}\n\
             Subject: {subject}\n\
             Message: {message}\n\
             Date: {date}\n",
            name = submission.name,
            email = submission.email,
            subject = submission.subject,
            message = submission.message,
        );

        let body = format!(
            r#"<p>A new contact form submission has been received:</p>
<div class="panel">
  <p><strong>Name:</strong> {name}</p>
  <p><strong>Email:</strong> {email}</p>
  <p><strong>Subject:</strong> {subject}</p>
  <p><strong>Message:</strong> {message}</p>
  <p><strong>Date:</strong> {date}</p>
</div>
<p>Message ID: {id}</p>"#,
            name = escape_html(&submission.name),
            email = escape_html(&submission.email),
            subject = escape_html(&submission.subject),
            message = escape_html(&submission.message),
            id = submission.id,
        );

        EmailContent {
            subject: format!("New Contact Form Submission: {}", submission.subject),
            text,
            html: self.wrap_html("New Contact Form Submission", &body, submission.created_at),
        }
    }

    fn wrap_html(&self, heading: &str, body: &str, sent_at: DateTime<Utc>) -> String {
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{heading}</title>
    <style>
        body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
        .container {{ max-width: 600px; margin: 0 auto; }}
        .header {{ background-color: #8CDCD9; color: #000; padding: 20px; text-align: center; }}
        .content {{ padding: 20px; }}
        .panel {{ background-color: #f5f5f5; padding: 15px; margin: 20px 0; border-radius: 5px; }}
        .footer {{ background-color: #E686D3; color: #fff; padding: 15px; text-align: center; font-size: 12px; }}
    </style>
</head>
<body>
    <div class="container">
        <div class="header"><h1>{heading}</h1></div>
        <div class="content">
{body}
        </div>
        <div class="footer"><p>&copy; {year} {brand}. All rights reserved.</p></div>
    </div>
</body>
</html>"#,
            heading = escape_html(heading),
            year = sent_at.year(),
            brand = escape_html(&self.from_name),
        )
    }
}

fn format_amount(amount: Decimal) -> String {
    format!("${:.2}", amount.round_dp(2))
}

/// Minimal escaping for user-supplied text interpolated into HTML bodies.
fn escape_html(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
