use async_trait::async_trait;
use serde::Serialize;

use super::{ContactNotifier, http_client};
use crate::{content::Contact, error::Result};

const RESEND_API: &str = "https://api.resend.com/emails";

/// 通过 Resend HTTP API 发送联系请求邮件
#[derive(Clone)]
pub struct ResendMailer {
    client: reqwest::Client,
    api_key: String,
    from: String,
    to: String,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: String,
    html: String,
}

impl ResendMailer {
    pub fn new(
        api_key: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            client: http_client()?,
            api_key: api_key.into(),
            from: from.into(),
            to: to.into(),
        })
    }
}

#[async_trait]
impl ContactNotifier for ResendMailer {
    async fn contact_submitted(&self, contact: &Contact) -> Result<()> {
        let body = EmailBody {
            from: &self.from,
            to: [&self.to],
            subject: subject(contact),
            html: render_html(contact),
        };

        self.client
            .post(RESEND_API)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?;

        tracing::info!(email = %contact.email, "contact notification sent");
        Ok(())
    }
}

fn subject(contact: &Contact) -> String {
    format!(
        "New PsyTech Inquiry from {} ({})",
        contact.name,
        contact.company_type_label()
    )
}

fn render_html(contact: &Contact) -> String {
    let row = |label: &str, value: &str| {
        format!(
            "<tr><td><strong>{label}:</strong></td><td>{}</td></tr>",
            escape(value)
        )
    };

    format!(
        "<div><h1>New Contact Form Submission</h1><table>{}{}{}{}{}</table>\
         <h2>Message</h2><p style=\"white-space: pre-wrap;\">{}</p>\
         <p>Submitted on {}</p></div>",
        row("Name", &contact.name),
        row("Email", &contact.email),
        row("Phone", contact.phone.as_deref().unwrap_or("Not provided")),
        row("Company", contact.company.as_deref().unwrap_or("Not provided")),
        row("Organization Type", contact.company_type_label()),
        escape(&contact.message),
        contact.created_at.format("%B %d, %Y at %H:%M UTC"),
    )
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
