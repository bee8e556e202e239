use crate::config::{ConfigError, EmailConfig};
use async_trait::async_trait;
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::{
        authentication::Credentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use tracing::{error, info, instrument};

/// Email service errors
#[derive(Debug, thiserror::Error)]
pub enum EmailError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("SMTP error: {0}")]
    SmtpError(String),

    #[error("Message building error: {0}")]
    MessageError(String),

    #[error("Address error: {0}")]
    AddressError(String),
}

impl From<ConfigError> for EmailError {
    fn from(err: ConfigError) -> Self {
        EmailError::ConfigError(err.to_string())
    }
}

/// Email message builder
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub text_body: Option<String>,
    pub html_body: Option<String>,
}

impl EmailMessage {
    pub fn new(to: String, subject: String) -> Self {
        Self { to, subject, text_body: None, html_body: None }
    }

    pub fn with_text_body(mut self, body: String) -> Self {
        self.text_body = Some(body);
        self
    }

    pub fn with_html_body(mut self, body: String) -> Self {
        self.html_body = Some(body);
        self
    }
}

/// Every transactional email the platform sends. Services depend on this
/// trait so tests can swap in a recording fake.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_welcome_email(&self, to: &str, full_name: &str) -> Result<(), EmailError>;
    /// Investor confirmation plus the operator notification for a deposit request.
    async fn send_deposit_request_emails(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
        coin: &str,
        plan: &str,
    ) -> Result<(), EmailError>;
    async fn send_deposit_settled_email(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
    ) -> Result<(), EmailError>;
    /// Investor confirmation plus the operator notification for a withdrawal request.
    async fn send_withdrawal_request_emails(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
        coin: &str,
        wallet_address: &str,
    ) -> Result<(), EmailError>;
    async fn send_withdrawal_settled_email(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
    ) -> Result<(), EmailError>;
    async fn send_password_reset_email(
        &self,
        to: &str,
        full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailError>;
    /// Forwards a support request from an investor to the operator inbox.
    async fn send_support_email(
        &self,
        from_email: &str,
        from_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError>;
    async fn send_broadcast_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError>;
}

/// SMTP email service implementation
pub struct SmtpEmailService {
    pub config: EmailConfig,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpEmailService {
    /// Create a new SMTP email service
    #[instrument(skip(config), fields(host = %config.smtp_host, port = config.smtp_port))]
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        info!("Initializing SMTP email service");

        config.validate().map_err(EmailError::from)?;

        let mut transport_builder =
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.smtp_host)
                .port(config.smtp_port)
                .timeout(Some(std::time::Duration::from_secs(config.connection_timeout_secs)));

        if config.use_tls {
            let tls_parameters = TlsParameters::new(config.smtp_host.clone())
                .map_err(|e| EmailError::ConfigError(format!("TLS configuration error: {}", e)))?;

            if config.use_starttls {
                transport_builder = transport_builder.tls(Tls::Required(tls_parameters));
            } else {
                transport_builder = transport_builder.tls(Tls::Wrapper(tls_parameters));
            }
        } else {
            transport_builder = transport_builder.tls(Tls::None);
        }

        if !config.smtp_username.is_empty() && !config.smtp_password.is_empty() {
            let credentials =
                Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());
            transport_builder = transport_builder.credentials(credentials);
        }

        let transport = transport_builder.build();

        info!("SMTP email service initialized successfully");
        Ok(Self { config, transport })
    }

    /// Send an email message
    #[instrument(skip(self, message), fields(to = %message.to, subject = %message.subject))]
    pub async fn send_email(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!("Sending email to: {}", message.to);

        self.validate_email_address(&message.to)?;

        let email_message = self.build_message(message)?;

        self.transport.send(email_message).await.map_err(|e| {
            error!("Failed to send email: {}", e);
            EmailError::SmtpError(format!("Failed to send email: {}", e))
        })?;

        info!("Email sent successfully");
        Ok(())
    }

    /// Wrap body paragraphs in the branded HTML shell. Inputs are escaped here.
    fn branded_html(&self, heading: &str, paragraphs: &[String]) -> String {
        let body: String = paragraphs
            .iter()
            .map(|p| format!("        <p>{}</p>\n", html_escape::encode_text(p)))
            .collect();
        format!(
            r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{heading}</title>
    <style>
        body {{
            font-family: Arial, sans-serif;
            line-height: 1.6;
            color: #333;
            max-width: 600px;
            margin: 0 auto;
            padding: 20px;
        }}
        .header {{
            background-color: #0b1c2d;
            color: #ffffff;
            padding: 20px;
            text-align: center;
            border-radius: 8px 8px 0 0;
        }}
        .content {{
            background-color: #ffffff;
            padding: 30px;
            border: 1px solid #dee2e6;
        }}
        .footer {{
            background-color: #f8f9fa;
            padding: 15px;
            text-align: center;
            font-size: 12px;
            color: #6c757d;
            border-radius: 0 0 8px 8px;
        }}
    </style>
</head>
<body>
    <div class="header">
        <h1>CryptFX Plc</h1>
        <h2>{heading}</h2>
    </div>

    <div class="content">
{body}        <p>Best regards,<br>The CryptFX Team</p>
    </div>

    <div class="footer">
        <p>This is an automated message. Please do not reply to this email.</p>
        <p>&copy; CryptFX Plc. All rights reserved.</p>
    </div>
</body>
</html>"#,
            heading = html_escape::encode_text(heading),
            body = body,
        )
    }

    async fn send_branded(
        &self,
        to: &str,
        subject: &str,
        heading: &str,
        paragraphs: &[String],
    ) -> Result<(), EmailError> {
        let text_body = paragraphs.join("\n\n");
        let html_body = self.branded_html(heading, paragraphs);
        let message = EmailMessage::new(to.to_string(), subject.to_string())
            .with_text_body(text_body)
            .with_html_body(html_body);
        self.send_email(message).await
    }

    /// Build a lettre Message from EmailMessage
    fn build_message(&self, email_message: EmailMessage) -> Result<Message, EmailError> {
        let from_mailbox: Mailbox =
            format!("{} <{}>", self.config.from_name, self.config.from_email)
                .parse()
                .map_err(|e| EmailError::AddressError(format!("Invalid from address: {}", e)))?;

        let to_mailbox: Mailbox = email_message
            .to
            .parse()
            .map_err(|e| EmailError::AddressError(format!("Invalid to address: {}", e)))?;

        let message_builder = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(&email_message.subject);

        match (email_message.text_body, email_message.html_body) {
            (Some(text), Some(html)) => {
                let message = message_builder
                    .multipart(
                        lettre::message::MultiPart::alternative()
                            .singlepart(
                                lettre::message::SinglePart::builder()
                                    .header(ContentType::TEXT_PLAIN)
                                    .body(text),
                            )
                            .singlepart(
                                lettre::message::SinglePart::builder()
                                    .header(ContentType::TEXT_HTML)
                                    .body(html),
                            ),
                    )
                    .map_err(|e| {
                        EmailError::MessageError(format!("Failed to build multipart message: {}", e))
                    })?;
                Ok(message)
            }
            (Some(text), None) => {
                let message = message_builder.body(text).map_err(|e| {
                    EmailError::MessageError(format!("Failed to build text message: {}", e))
                })?;
                Ok(message)
            }
            (None, Some(html)) => {
                let message = message_builder
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    )
                    .map_err(|e| {
                        EmailError::MessageError(format!("Failed to build HTML message: {}", e))
                    })?;
                Ok(message)
            }
            (None, None) => Err(EmailError::MessageError("No message body provided".to_string())),
        }
    }

    /// Validate email address format
    fn validate_email_address(&self, email: &str) -> Result<(), EmailError> {
        if email.is_empty() {
            return Err(EmailError::AddressError("Email address cannot be empty".to_string()));
        }

        let parts: Vec<&str> = email.split('@').collect();
        if parts.len() != 2 || parts[0].is_empty() || parts[1].is_empty() {
            return Err(EmailError::AddressError("Invalid email format".to_string()));
        }

        Ok(())
    }
}

#[async_trait]
impl Notifier for SmtpEmailService {
    #[instrument(skip(self), fields(to = %to))]
    async fn send_welcome_email(&self, to: &str, full_name: &str) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Welcome to CryptFX",
            "Welcome to CryptFX",
            &[
                format!("Hello {},", full_name),
                "Your CryptFX account has been created successfully.".to_string(),
                "Sign in to your dashboard to choose an investment plan and make your first deposit.".to_string(),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(to = %to, amount = amount))]
    async fn send_deposit_request_emails(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
        coin: &str,
        plan: &str,
    ) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Deposit Request Received",
            "Deposit Request Received",
            &[
                format!("Hello {},", full_name),
                format!(
                    "We have received your deposit request of {} {} on the {} plan.",
                    amount, coin, plan
                ),
                "Your deposit will be credited to your balance once it is confirmed.".to_string(),
            ],
        )
        .await?;

        self.send_branded(
            &self.config.admin_email,
            "New Deposit Request",
            "New Deposit Request",
            &[format!(
                "{} ({}) requested a deposit of {} {} on the {} plan.",
                full_name, to, amount, coin, plan
            )],
        )
        .await
    }

    #[instrument(skip(self), fields(to = %to, amount = amount))]
    async fn send_deposit_settled_email(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
    ) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Deposit Confirmed",
            "Deposit Confirmed",
            &[
                format!("Hello {},", full_name),
                format!("Your deposit of {} has been confirmed and credited to your balance.", amount),
                "Your investment plan is now active and daily returns will begin to accrue.".to_string(),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(to = %to, amount = amount))]
    async fn send_withdrawal_request_emails(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
        coin: &str,
        wallet_address: &str,
    ) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Withdrawal Request Received",
            "Withdrawal Request Received",
            &[
                format!("Hello {},", full_name),
                format!("We have received your withdrawal request of {} {}.", amount, coin),
                "Your withdrawal will be processed shortly.".to_string(),
            ],
        )
        .await?;

        self.send_branded(
            &self.config.admin_email,
            "New Withdrawal Request",
            "New Withdrawal Request",
            &[format!(
                "{} ({}) requested a withdrawal of {} {} to wallet {}.",
                full_name, to, amount, coin, wallet_address
            )],
        )
        .await
    }

    #[instrument(skip(self), fields(to = %to, amount = amount))]
    async fn send_withdrawal_settled_email(
        &self,
        to: &str,
        full_name: &str,
        amount: f64,
    ) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Withdrawal Processed",
            "Withdrawal Processed",
            &[
                format!("Hello {},", full_name),
                format!("Your withdrawal of {} has been processed and sent to your wallet.", amount),
            ],
        )
        .await
    }

    #[instrument(skip(self, reset_token), fields(to = %to))]
    async fn send_password_reset_email(
        &self,
        to: &str,
        full_name: &str,
        reset_token: &str,
    ) -> Result<(), EmailError> {
        self.send_branded(
            to,
            "Password Reset Request",
            "Password Reset Request",
            &[
                format!("Hello {},", full_name),
                "We received a request to reset the password for your CryptFX account.".to_string(),
                format!("Your reset code is: {}", reset_token),
                "This code expires in 30 minutes. If you did not request a reset, ignore this email and your password will remain unchanged.".to_string(),
            ],
        )
        .await
    }

    #[instrument(skip(self, body), fields(from = %from_email, subject = %subject))]
    async fn send_support_email(
        &self,
        from_email: &str,
        from_name: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        self.send_branded(
            &self.config.admin_email,
            &format!("Support: {}", subject),
            "Support Request",
            &[
                format!("From: {} ({})", from_name, from_email),
                body.to_string(),
            ],
        )
        .await
    }

    #[instrument(skip(self, body), fields(to = %to, subject = %subject))]
    async fn send_broadcast_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
    ) -> Result<(), EmailError> {
        self.send_branded(to, subject, subject, &[body.to_string()]).await
    }
}
