//! Transactional email over SMTP

use std::fmt::Write as _;

use async_trait::async_trait;
use lettre::message::{header::ContentType, Mailbox};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::info;

use crate::config::SmtpConfig;
use crate::domain::aggregates::{Order, User};
use crate::ports::Notifier;
use crate::NotifyError;

const SIGNATURE: &str = "Best regards,\nShoeShop Team";

/// Rendered email ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Letter {
    pub subject: String,
    pub body: String,
}

pub fn registration_letter(user: &User) -> Letter {
    Letter {
        subject: "Welcome to ShoeShop".into(),
        body: format!(
            "Welcome to ShoeShop, {}!\n\n\
             Thank you for registering with us. We're excited to have you as our customer.\n\
             You can now browse our collection and make purchases.\n\n{SIGNATURE}",
            user.username
        ),
    }
}

pub fn order_confirmation_letter(order: &Order) -> Letter {
    let mut lines = String::new();
    for item in &order.items {
        let _ = writeln!(lines, "  - {} x {} at ${}", item.product_id, item.quantity, item.price);
    }
    Letter {
        subject: format!("Order Confirmation #{}", order.id),
        body: format!(
            "Thank you for your order #{}!\n\n\
             Order details:\n{lines}\n\
             Total amount: ${}\n\n\
             We'll notify you when your order ships.\n\n{SIGNATURE}",
            order.id, order.total_amount
        ),
    }
}

pub fn status_update_letter(order: &Order) -> Letter {
    Letter {
        subject: format!("Order Status Update #{}", order.id),
        body: format!(
            "Your order #{} status has been updated to: {}\n\n\
             If you have any questions, please contact our support team.\n\n{SIGNATURE}",
            order.id, order.status
        ),
    }
}

pub fn password_reset_letter(user: &User, token: &str) -> Letter {
    Letter {
        subject: "Password Reset Request".into(),
        body: format!(
            "Hello {},\n\n\
             We received a request to reset your password. Use the following token to reset your password:\n\n\
             {token}\n\n\
             If you didn't request this, please ignore this email.\n\n{SIGNATURE}",
            user.username
        ),
    }
}

pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpNotifier {
    pub fn new(config: &SmtpConfig) -> Result<Self, NotifyError> {
        let from = config.from_email.parse::<Mailbox>().map_err(|e| NotifyError::Build(e.to_string()))?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| NotifyError::Transport(e.to_string()))?
            .port(config.port)
            .credentials(Credentials::new(config.user.clone(), config.pass.clone()))
            .build();
        Ok(Self { transport, from })
    }

    async fn deliver(&self, to: &str, letter: Letter) -> Result<(), NotifyError> {
        let recipient = to.parse::<Mailbox>().map_err(|e| NotifyError::Build(format!("recipient {to}: {e}")))?;
        let message = Message::builder()
            .from(self.from.clone())
            .to(recipient)
            .subject(letter.subject.as_str())
            .header(ContentType::TEXT_PLAIN)
            .body(letter.body)
            .map_err(|e| NotifyError::Build(e.to_string()))?;

        self.transport.send(message).await.map_err(|e| NotifyError::Transport(e.to_string()))?;
        info!(to = to, subject = %letter.subject, "email sent");
        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn send_order_confirmation(&self, to: &str, order: &Order) -> Result<(), NotifyError> {
        self.deliver(to, order_confirmation_letter(order)).await
    }

    async fn send_order_status_update(&self, to: &str, order: &Order) -> Result<(), NotifyError> {
        self.deliver(to, status_update_letter(order)).await
    }

    async fn send_registration_confirmation(&self, user: &User) -> Result<(), NotifyError> {
        self.deliver(&user.email, registration_letter(user)).await
    }

    async fn send_password_reset(&self, user: &User, token: &str) -> Result<(), NotifyError> {
        self.deliver(&user.email, password_reset_letter(user, token)).await
    }
}
