//! AniList login through the OAuth2 authorization-code grant.
//!
//! The consent page redirects to a one-shot listener on localhost, which
//! hands the code back for the token exchange.

use std::io::{Read, Write};
use std::net::TcpListener;

use serde::Deserialize;
use url::Url;

use super::error::AniListError;

const AUTH_URL: &str = "https://anilist.co/api/v2/oauth/authorize";
const TOKEN_URL: &str = "https://anilist.co/api/v2/oauth/token";
const REDIRECT_ADDR: &str = "127.0.0.1:19742";
const REDIRECT_URI: &str = "http://localhost:19742";

const PAGE_OK: &str = "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h2>Logged in to AniList</h2>\
    <p>You can close this tab.</p></body></html>";
const PAGE_FAILED: &str = "HTTP/1.1 400 Bad Request\r\nContent-Type: text/html\r\n\r\n\
    <html><body><h2>AniList login failed</h2>\
    <p>Check the terminal for details.</p></body></html>";

#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<u64>,
}

/// Credentials of an AniList API client.
pub struct OAuthApp<'a> {
    pub client_id: &'a str,
    pub client_secret: &'a str,
}

impl OAuthApp<'_> {
    /// Open the consent page, wait for the redirect, and trade the code for
    /// an access token.
    pub async fn login(&self) -> Result<TokenResponse, AniListError> {
        let consent = self.authorization_url()?;
        tracing::info!(url = %consent, "opening AniList consent page");
        open::that(consent.as_str())
            .map_err(|e| AniListError::Auth(format!("failed to open browser: {e}")))?;

        let code = tokio::task::spawn_blocking(wait_for_redirect)
            .await
            .map_err(|e| AniListError::Auth(format!("redirect listener stopped: {e}")))??;
        self.exchange_code(&code).await
    }

    fn authorization_url(&self) -> Result<Url, AniListError> {
        Url::parse_with_params(
            AUTH_URL,
            &[
                ("client_id", self.client_id),
                ("redirect_uri", REDIRECT_URI),
                ("response_type", "code"),
            ],
        )
        .map_err(|e| AniListError::Auth(format!("invalid authorization URL: {e}")))
    }

    async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AniListError> {
        let resp = reqwest::Client::new()
            .post(TOKEN_URL)
            .header("Accept", "application/json")
            .json(&serde_json::json!({
                "grant_type": "authorization_code",
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "redirect_uri": REDIRECT_URI,
                "code": code,
            }))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(AniListError::Api {
                status: status.as_u16(),
                message: resp.text().await.unwrap_or_default(),
            });
        }
        resp.json::<TokenResponse>()
            .await
            .map_err(|e| AniListError::Parse(e.to_string()))
    }
}

/// Serve exactly one request on the redirect address.
fn wait_for_redirect() -> Result<String, AniListError> {
    let listener = TcpListener::bind(REDIRECT_ADDR)
        .map_err(|e| AniListError::Auth(format!("failed to bind {REDIRECT_ADDR}: {e}")))?;
    tracing::info!("waiting for the AniList redirect on {REDIRECT_ADDR}");

    let (mut stream, _) = listener
        .accept()
        .map_err(|e| AniListError::Auth(format!("redirect connection failed: {e}")))?;
    let mut buf = [0u8; 4096];
    let n = stream
        .read(&mut buf)
        .map_err(|e| AniListError::Auth(format!("failed to read redirect: {e}")))?;

    let result = code_from_request(&String::from_utf8_lossy(&buf[..n]));
    let page = if result.is_ok() { PAGE_OK } else { PAGE_FAILED };
    if let Err(e) = stream.write_all(page.as_bytes()) {
        tracing::warn!(error = %e, "could not answer the redirect");
    }
    result
}

/// The `code` query parameter of the redirect's request line. A redirect
/// carrying `error` means the user declined.
fn code_from_request(request: &str) -> Result<String, AniListError> {
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| AniListError::Auth("malformed redirect request".into()))?;
    let url = Url::parse(&format!("http://localhost{target}"))
        .map_err(|e| AniListError::Auth(format!("malformed redirect URL: {e}")))?;

    let mut code = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => {
                return Err(AniListError::Auth(format!(
                    "AniList refused authorization: {value}"
                )));
            }
            _ => {}
        }
    }
    code.ok_or_else(|| AniListError::Auth("redirect carried no code".into()))
}
