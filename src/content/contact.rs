use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 联系表单提交内容
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub company_type: String,
    pub message: String,
}

/// 已保存的联系请求
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub company_type: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub status: String,
}

impl Contact {
    pub fn submit(new: NewContact, now: DateTime<Utc>) -> Result<Contact> {
        let name = bounded("name", new.name, 2, 100)?;
        let email = new.email.trim().to_string();
        if email.is_empty() {
            return Err(Error::validation("email", "field required"));
        }
        if !looks_like_email(&email) {
            return Err(Error::validation("email", "not a valid email address"));
        }
        let company_type = bounded("company_type", new.company_type, 1, 100)?;
        let message = bounded("message", new.message, 10, 2000)?;
        let phone = optional("phone", new.phone, 20)?;
        let company = optional("company", new.company, 200)?;

        Ok(Contact {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            email,
            phone,
            company,
            company_type,
            message,
            created_at: now,
            status: "new".to_string(),
        })
    }

    /// 机构类型的展示名称，未知类型原样返回
    pub fn company_type_label(&self) -> &str {
        match self.company_type.as_str() {
            "mental_health_clinic" => "Mental Health Clinic / Practice",
            "hospital" => "Hospital / Healthcare System",
            "university" => "University / Educational Institution",
            "corporate" => "Corporation / Enterprise",
            "hr_recruitment" => "HR / Recruitment Agency",
            "research" => "Research Organization",
            "government" => "Government / Public Sector",
            "investor" => "Investor / VC",
            "individual" => "Individual / Personal Use",
            "other" => "Other",
            other => other,
        }
    }
}

fn bounded(field: &'static str, value: String, min: usize, max: usize) -> Result<String> {
    let value = value.trim();
    let len = value.chars().count();
    if len == 0 {
        return Err(Error::validation(field, "field required"));
    }
    if len < min || len > max {
        return Err(Error::validation(
            field,
            format!("length must be between {min} and {max} characters"),
        ));
    }
    Ok(value.to_string())
}

fn optional(field: &'static str, value: Option<String>, max: usize) -> Result<Option<String>> {
    match value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) {
        Some(v) if v.chars().count() > max => Err(Error::validation(
            field,
            format!("must be at most {max} characters"),
        )),
        other => Ok(other),
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
