use crate::render;
use async_trait::async_trait;
use kawase_core::common::tls::ensure_crypto_provider;
use kawase_core::config::EmailConfig;
use kawase_core::notify::entity::AlertReport;
use kawase_core::notify::error::NotifyError;
use kawase_core::notify::port::Notifier;
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, Message, MultiPart, SinglePart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Tokio1Executor};
use tracing::info;

const ATTACHMENT_NAME: &str = "report.json";

/// # Summary
/// 通过 SMTP 发送提醒报告的邮件渠道。
///
/// # Invariants
/// - 地址在构造时解析，非法地址不会拖到发送阶段才暴露。
/// - `AsyncSmtpTransport` 在多次投递间复用。
pub struct EmailNotifier {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

/// 解析逗号分隔的收件人列表，至少需要一个地址。
fn parse_recipients(to: &str) -> Result<Vec<Mailbox>, NotifyError> {
    let recipients = to
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<Mailbox>()
                .map_err(|e| NotifyError::Config(format!("Invalid to address {}: {}", s, e)))
        })
        .collect::<Result<Vec<_>, _>>()?;

    if recipients.is_empty() {
        return Err(NotifyError::Config("No recipients configured".to_string()));
    }
    Ok(recipients)
}

/// # Summary
/// 构造报告邮件：纯文本正文加 `report.json` 附件。
fn build_message(from: &Mailbox, to: &[Mailbox], report: &AlertReport) -> Result<Message, NotifyError> {
    let json_type = ContentType::parse("application/json")
        .map_err(|e| NotifyError::Render(format!("Invalid content type: {}", e)))?;
    let attachment = Attachment::new(ATTACHMENT_NAME.to_string()).body(render::render_json(report)?, json_type);

    let mut builder = Message::builder().from(from.clone()).subject(render::subject(report));
    for mailbox in to {
        builder = builder.to(mailbox.clone());
    }

    builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(render::render_text(report)))
                .singlepart(attachment),
        )
        .map_err(|e| NotifyError::Render(format!("Failed to build email: {}", e)))
}

impl EmailNotifier {
    /// # Summary
    /// 创建邮件渠道。
    ///
    /// # Logic
    /// 1. 解析发件人与收件人地址（收件人可用逗号分隔多个）。
    /// 2. 使用 STARTTLS 中继（587 端口）与账号密码构造传输层。
    ///
    /// # Arguments
    /// * `host` - SMTP 服务器，例如 `smtp.gmail.com`。
    /// * `user` - SMTP 用户名。
    /// * `pass` - SMTP 密码或应用专用密码。
    /// * `from` - 发件人地址。
    /// * `to` - 收件人地址列表。
    pub fn new(host: &str, user: &str, pass: &str, from: &str, to: &str) -> Result<Self, NotifyError> {
        let from = from
            .parse::<Mailbox>()
            .map_err(|e| NotifyError::Config(format!("Invalid from address: {}", e)))?;
        let to = parse_recipients(to)?;

        ensure_crypto_provider();
        let creds = Credentials::new(user.to_string(), pass.to_string());
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(host)
            .map_err(|e| NotifyError::Config(format!("Invalid SMTP host: {}", e)))?
            .credentials(creds)
            .build();

        Ok(Self { mailer, from, to })
    }

    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        Self::new(&config.host, &config.user, &config.password, &config.from, &config.to)
    }
}

#[async_trait]
impl Notifier for EmailNotifier {
    async fn notify(&self, report: &AlertReport) -> Result<(), NotifyError> {
        let email = build_message(&self.from, &self.to, report)?;

        self.mailer
            .send(email)
            .await
            .map_err(|e| NotifyError::Network(format!("SMTP error: {}", e)))?;

        info!("Report email sent to {} recipient(s)", self.to.len());
        Ok(())
    }
}
