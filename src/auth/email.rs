//! Email sending for verification and password reset

use lettre::{
    message::header::ContentType,
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

/// Email configuration
#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_email: String,
    pub from_name: String,
}

impl EmailConfig {
    pub fn from_env() -> Option<Self> {
        Some(Self {
            smtp_host: std::env::var("SMTP_HOST").ok()?,
            smtp_port: std::env::var("SMTP_PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(587),
            smtp_username: std::env::var("SMTP_USERNAME").ok()?,
            smtp_password: std::env::var("SMTP_PASSWORD").ok()?,
            from_email: std::env::var("FROM_EMAIL").ok()?,
            from_name: std::env::var("FROM_NAME").unwrap_or_else(|_| "UniStay".to_string()),
        })
    }
}

/// Email service backed by a real SMTP relay
pub struct EmailService {
    config: EmailConfig,
    mailer: AsyncSmtpTransport<Tokio1Executor>,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Result<Self, lettre::transport::smtp::Error> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { config, mailer })
    }

    async fn send(
        &self,
        to: &str,
        subject: &str,
        text: String,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let email = Message::builder()
            .from(format!("{} <{}>", self.config.from_name, self.config.from_email).parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(text)?;

        self.mailer.send(email).await?;
        Ok(())
    }
}

/// Mock email sender for development and tests: logs instead of sending.
pub struct MockEmailService;

/// Unified email sender
pub enum EmailSender {
    Real(EmailService),
    Mock(MockEmailService),
}

impl EmailSender {
    pub fn from_env() -> Self {
        match EmailConfig::from_env() {
            Some(config) => match EmailService::new(config) {
                Ok(service) => EmailSender::Real(service),
                Err(e) => {
                    log::warn!("Failed to initialize email service: {}. Using mock.", e);
                    EmailSender::Mock(MockEmailService)
                }
            },
            None => {
                log::info!("Email not configured. Using mock email service.");
                EmailSender::Mock(MockEmailService)
            }
        }
    }

    pub fn mock() -> Self {
        EmailSender::Mock(MockEmailService)
    }

    /// Send the verification code issued at registration. Delivery is
    /// fire-and-forget: callers log failures and move on, nothing retries.
    pub async fn send_verification_email(
        &self,
        to: &str,
        user_id: &str,
        code: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let text = format!("Verification code: {}. Id: {}", code, user_id);
        match self {
            EmailSender::Real(service) => service.send(to, "Verify your email", text).await,
            EmailSender::Mock(_) => {
                log::info!("[MOCK EMAIL] to {}: {}", to, text);
                Ok(())
            }
        }
    }

    /// Send a pending password-reset code.
    pub async fn send_password_reset_email(
        &self,
        to: &str,
        user_id: &str,
        code: &str,
    ) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let text = format!("Password reset code: {}. Id: {}", code, user_id);
        match self {
            EmailSender::Real(service) => service.send(to, "Reset your password", text).await,
            EmailSender::Mock(_) => {
                log::info!("[MOCK EMAIL] to {}: {}", to, text);
                Ok(())
            }
        }
    }
}
