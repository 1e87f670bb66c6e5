use reqwest::Client;
use serde::Deserialize;
use tracing::{error, warn};

const VERIFY_URL: &str = "https://www.google.com/recaptcha/api/siteverify";

/// Client for Google's reCAPTCHA siteverify endpoint.
///
/// Verification is best-effort on purpose: any transport or parse failure is
/// logged and reported as a failed check so a misconfigured deployment never
/// lets automated submissions through.
#[derive(Clone)]
pub struct RecaptchaClient {
    http: Client,
    secret_key: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SiteverifyResponse {
    #[serde(default)]
    success: bool,
    #[serde(rename = "error-codes", default)]
    error_codes: Vec<String>,
}

impl RecaptchaClient {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            http: Client::new(),
            secret_key,
        }
    }

    /// Verify a challenge token for the given submitter IP.
    pub async fn verify(&self, token: &str, remote_ip: Option<&str>) -> bool {
        if token.trim().is_empty() {
            return false;
        }

        let Some(secret) = self.secret_key.as_deref() else {
            warn!("recaptcha verification requested without a configured secret key");
            return false;
        };

        let mut params = vec![("secret", secret), ("response", token)];
        if let Some(ip) = remote_ip {
            params.push(("remoteip", ip));
        }

        let response = match self.http.post(VERIFY_URL).form(&params).send().await {
            Ok(response) => response,
            Err(err) => {
                error!(?err, "recaptcha siteverify request failed");
                return false;
            }
        };

        let body = match response.json::<SiteverifyResponse>().await {
            Ok(body) => body,
            Err(err) => {
                error!(?err, "failed to parse recaptcha siteverify response");
                return false;
            }
        };

        evaluate_response(body, remote_ip)
    }
}

fn evaluate_response(body: SiteverifyResponse, remote_ip: Option<&str>) -> bool {
    if body.success {
        return true;
    }

    if !body.error_codes.is_empty() {
        warn!(
            error_codes = ?body.error_codes,
            ip = remote_ip.unwrap_or("unknown"),
            "recaptcha verification failed"
        );
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> SiteverifyResponse {
        serde_json::from_str(json).expect("siteverify payload should parse")
    }

    #[test]
    fn successful_response_passes() {
        let body = parse(r#"{"success": true, "challenge_ts": "2026-01-01T00:00:00Z"}"#);
        assert!(evaluate_response(body, Some("203.0.113.7")));
    }

    #[test]
    fn failed_response_with_error_codes_is_rejected() {
        let body = parse(r#"{"success": false, "error-codes": ["invalid-input-response"]}"#);
        assert!(!evaluate_response(body, None));
    }

    #[test]
    fn missing_success_field_is_rejected() {
        let body = parse(r#"{}"#);
        assert!(!evaluate_response(body, None));
    }

    #[tokio::test]
    async fn empty_token_short_circuits() {
        let client = RecaptchaClient::new(Some("secret".to_string()));
        assert!(!client.verify("", None).await);
        assert!(!client.verify("   ", None).await);
    }

    #[tokio::test]
    async fn missing_secret_fails_closed() {
        let client = RecaptchaClient::new(None);
        assert!(!client.verify("token", Some("203.0.113.7")).await);
    }
}
