use anyhow::Context;
use serde::Serialize;
use serde_json::json;

use crate::auth::{sign_init_data, INIT_DATA_HEADER};
use crate::cli::utils::output_report;
use crate::cli::OutputFormat;

#[derive(Debug, Serialize)]
pub struct SignedInitData {
    pub header: &'static str,
    pub init_data: String,
    pub user_id: i64,
    pub auth_date: i64,
}

pub fn sign(bot_token: &str, user_id: i64, first_name: &str, auth_date: i64) -> SignedInitData {
    let user = json!({ "id": user_id, "first_name": first_name }).to_string();
    let auth_date_field = auth_date.to_string();
    let init_data = sign_init_data(bot_token, &[("auth_date", auth_date_field.as_str()), ("user", user.as_str())]);

    SignedInitData {
        header: INIT_DATA_HEADER,
        init_data,
        user_id,
        auth_date,
    }
}

/// Print a signed init-data string to paste into `X-Telegram-Init-Data`.
pub fn handle(
    user_id: i64,
    first_name: String,
    auth_date: Option<i64>,
    bot_token: Option<String>,
    output_format: OutputFormat,
) -> anyhow::Result<()> {
    let bot_token = match bot_token {
        Some(token) => token,
        None => std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN is not set and --bot-token was not given")?,
    };
    let auth_date = auth_date.unwrap_or_else(|| chrono::Utc::now().timestamp());

    let signed = sign(&bot_token, user_id, &first_name, auth_date);

    // Text mode prints only the value so it can be captured by a shell.
    output_report(&output_format, &signed, |signed| vec![signed.init_data.clone()])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::InitDataVerifier;

    #[test]
    fn signed_value_verifies_for_the_same_bot() {
        let signed = sign("123:abc", 42, "Ann", 1_700_000_000);

        let principal = InitDataVerifier::new("123:abc").verify(&signed.init_data).unwrap();
        assert_eq!(principal.id, Some(42));
        assert_eq!(principal.first_name.as_deref(), Some("Ann"));
        assert!(InitDataVerifier::new("999:other").verify(&signed.init_data).is_err());
        assert_eq!(signed.header, "x-telegram-init-data");
    }
}
