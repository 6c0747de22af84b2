use std::fs;

use color_eyre::Result;
use eyre::WrapErr;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde_json::Value;
use tracing::info;

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    pub fn new(smtp_host: &str, smtp_user: &str, smtp_pass: &str) -> Result<Self> {
        let creds = Credentials::new(smtp_user.to_string(), smtp_pass.to_string());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(smtp_host)
            .wrap_err("Building SMTP transport")?
            .credentials(creds)
            .build();

        Ok(Self {
            mailer,
            from_address: smtp_user.to_string(),
        })
    }

    fn load_template(&self, path: &str) -> Result<String> {
        let template = fs::read_to_string(path)?;
        Ok(template)
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        template_path: &str,
        data: &Value,
    ) -> Result<()> {
        let body = render_template(&self.load_template(template_path)?, data);

        let email = Message::builder()
            .from(self.from_address.parse()?)
            .to(to.parse()?)
            .subject(subject)
            .header(ContentType::TEXT_HTML)
            .body(body)?;

        let response = self.mailer.send(email).await?;
        info!(%to, code = %response.code(), "Email accepted by relay");

        Ok(())
    }
}

/// `{{key}}` substitution against a flat JSON object. Unknown
/// placeholders are left in place; non-string values substitute as empty.
fn render_template(template: &str, data: &Value) -> String {
    let mut body = template.to_string();
    for (key, value) in data.as_object().into_iter().flatten() {
        let placeholder = format!("{{{{{key}}}}}");
        body = body.replace(&placeholder, value.as_str().unwrap_or_default());
    }
    body
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn render_substitutes_every_placeholder() {
        let template = "<p>{{platformName}}: code {{otp}} for {{phone}}</p>";
        let data = json!({
            "platformName": "BoltPay",
            "otp": "123456",
            "phone": "+919876543210",
        });
        assert_eq!(
            render_template(template, &data),
            "<p>BoltPay: code 123456 for +919876543210</p>"
        );
    }

    #[test]
    fn shipped_template_has_no_leftover_placeholders() {
        let template = fs::read_to_string("templates/otp_email.html").unwrap();
        let data = json!({
            "platformName": "BoltPay",
            "otp": "123456",
            "phone": "+919876543210",
        });
        let rendered = render_template(&template, &data);
        assert!(!rendered.contains("{{"));
        assert!(rendered.contains("123456"));
    }
}
