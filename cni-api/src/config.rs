use anyhow::Context;
use std::env;
use std::path::PathBuf;

/// SMTP relay credentials. Absent in development, where outbound mail is
/// logged instead of sent.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Server configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub jwt_secret: String,
    pub access_ttl_minutes: i64,
    pub refresh_ttl_days: i64,
    pub smtp: Option<SmtpConfig>,
    pub email_from: String,
    pub admin_email: String,
    pub media_dir: PathBuf,
    pub use_memory_storage: bool,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let port = match env::var("PORT") {
            Ok(raw) => raw.parse().context("PORT must be a number")?,
            Err(_) => 8080,
        };

        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET must be set")?;

        let access_ttl_minutes = match env::var("ACCESS_TOKEN_TTL_MINUTES") {
            Ok(raw) => raw
                .parse()
                .context("ACCESS_TOKEN_TTL_MINUTES must be a number")?,
            Err(_) => 30,
        };
        let refresh_ttl_days = match env::var("REFRESH_TOKEN_TTL_DAYS") {
            Ok(raw) => raw
                .parse()
                .context("REFRESH_TOKEN_TTL_DAYS must be a number")?,
            Err(_) => 14,
        };

        let smtp = match (
            env::var("SMTP_HOST"),
            env::var("SMTP_USERNAME"),
            env::var("SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
                host,
                username,
                password,
            }),
            _ => None,
        };

        let email_from =
            env::var("EMAIL_FROM").unwrap_or_else(|_| "no-reply@connectinspire.org".to_string());
        let admin_email =
            env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@connectinspire.org".to_string());

        let media_dir = PathBuf::from(env::var("MEDIA_DIR").unwrap_or_else(|_| "media".to_string()));

        let use_memory_storage = env::var("STORAGE")
            .map(|s| s.eq_ignore_ascii_case("memory"))
            .unwrap_or(false);

        Ok(Self {
            port,
            jwt_secret,
            access_ttl_minutes,
            refresh_ttl_days,
            smtp,
            email_from,
            admin_email,
            media_dir,
            use_memory_storage,
        })
    }
}
