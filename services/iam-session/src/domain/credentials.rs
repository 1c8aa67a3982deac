//! 登录凭证输入

use std::fmt;

use email_address::EmailAddress;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::error::SessionError;

/// 单个字段的最大长度
pub const MAX_FIELD_LEN: usize = 255;

/// 登录标识：用户名或邮箱，二选一
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginIdentifier {
    Username(String),
    Email(String),
}

impl fmt::Display for LoginIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Username(u) => write!(f, "username:{}", u),
            Self::Email(e) => write!(f, "email:{}", e),
        }
    }
}

/// 创建会话的凭证
#[derive(Debug, Deserialize)]
pub struct CredentialInput {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub password: Secret<String>,
}

impl CredentialInput {
    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: None,
            password: Secret::new(password.into()),
        }
    }

    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: None,
            email: Some(email.into()),
            password: Secret::new(password.into()),
        }
    }

    /// 校验输入并返回登录标识
    pub fn validate(&self) -> Result<LoginIdentifier, SessionError> {
        let username = non_blank(self.username.as_deref());
        let email = non_blank(self.email.as_deref());

        let identifier = match (username, email) {
            (Some(_), Some(_)) => {
                return Err(SessionError::Validation(
                    "only one of username or email may be provided".into(),
                ));
            }
            (None, None) => {
                return Err(SessionError::Validation(
                    "username or email is required".into(),
                ));
            }
            (Some(username), None) => {
                check_len("username", username)?;
                LoginIdentifier::Username(username.to_string())
            }
            (None, Some(email)) => {
                check_len("email", email)?;
                if !EmailAddress::is_valid(email) {
                    return Err(SessionError::Validation(format!(
                        "invalid email address: {}",
                        email
                    )));
                }
                LoginIdentifier::Email(email.to_string())
            }
        };

        let password = self.password.expose_secret();
        if password.is_empty() {
            return Err(SessionError::Validation("password is required".into()));
        }
        check_len("password", password)?;

        Ok(identifier)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn check_len(field: &str, value: &str) -> Result<(), SessionError> {
    if value.chars().count() > MAX_FIELD_LEN {
        return Err(SessionError::Validation(format!(
            "{} must be at most {} characters",
            field, MAX_FIELD_LEN
        )));
    }
    Ok(())
}
