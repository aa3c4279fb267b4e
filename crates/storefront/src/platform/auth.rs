//! Auth API calls.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::instrument;

use greenbasket_core::Email;

use super::PlatformError;
use super::client::{PlatformClient, check_auth};
use super::types::{AuthSession, AuthUser, SignUpOutcome, UserAttributes};

/// Client for `/auth/v1`. Obtained from [`PlatformClient::auth`].
#[derive(Clone, Copy)]
pub struct AuthClient<'a> {
    client: &'a PlatformClient,
}

impl<'a> AuthClient<'a> {
    pub(super) const fn new(client: &'a PlatformClient) -> Self {
        Self { client }
    }

    /// Register a new account. `metadata` becomes the user's profile data.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` with the platform's message if the
    /// account cannot be created (e.g. "User already registered").
    #[instrument(skip(self, password, metadata), fields(email = %email))]
    pub async fn sign_up(
        &self,
        email: &Email,
        password: &str,
        metadata: &serde_json::Value,
    ) -> Result<SignUpOutcome, PlatformError> {
        let body = json!({
            "email": email.as_str(),
            "password": password,
            "data": metadata,
        });
        self.send(Method::POST, "auth/v1/signup", &[], None, Some(&body))
            .await
    }

    /// Exchange email and password for a session.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` (e.g. "Invalid login credentials").
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn sign_in_with_password(
        &self,
        email: &Email,
        password: &str,
    ) -> Result<AuthSession, PlatformError> {
        let body = json!({ "email": email.as_str(), "password": password });
        self.send(
            Method::POST,
            "auth/v1/token",
            &[("grant_type", "password")],
            None,
            Some(&body),
        )
        .await
    }

    /// Exchange a refresh token for a new session.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` if the refresh token was revoked or
    /// already used.
    #[instrument(skip_all)]
    pub async fn refresh_session(&self, refresh_token: &str) -> Result<AuthSession, PlatformError> {
        let body = json!({ "refresh_token": refresh_token });
        self.send(
            Method::POST,
            "auth/v1/token",
            &[("grant_type", "refresh_token")],
            None,
            Some(&body),
        )
        .await
    }

    /// Look up the user an access token belongs to.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` if the token is invalid or expired.
    #[instrument(skip_all)]
    pub async fn get_user(&self, access_token: &str) -> Result<AuthUser, PlatformError> {
        self.send(Method::GET, "auth/v1/user", &[], Some(access_token), None)
            .await
    }

    /// Revoke the session behind an access token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it.
    #[instrument(skip_all)]
    pub async fn sign_out(&self, access_token: &str) -> Result<(), PlatformError> {
        let url = self.client.endpoint("auth/v1/logout")?;
        let response = self
            .client
            .request(Method::POST, url, Some(access_token))
            .send()
            .await?;
        check_auth(response).await?;
        Ok(())
    }

    /// Send a password recovery email whose link lands on `redirect_to`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the platform rejects it
    /// (e.g. rate limiting).
    #[instrument(skip(self), fields(email = %email))]
    pub async fn reset_password_for_email(
        &self,
        email: &Email,
        redirect_to: &str,
    ) -> Result<(), PlatformError> {
        let mut url = self.client.endpoint("auth/v1/recover")?;
        url.query_pairs_mut().append_pair("redirect_to", redirect_to);
        let response = self
            .client
            .request(Method::POST, url, None)
            .json(&json!({ "email": email.as_str() }))
            .send()
            .await?;
        check_auth(response).await?;
        Ok(())
    }

    /// Change the password and/or profile data of the token's user.
    ///
    /// # Errors
    ///
    /// Returns `PlatformError::Auth` if the token is invalid or the new
    /// password is rejected.
    #[instrument(skip(self, access_token))]
    pub async fn update_user(
        &self,
        access_token: &str,
        attributes: &UserAttributes,
    ) -> Result<AuthUser, PlatformError> {
        let body = serde_json::to_value(attributes)?;
        self.send(
            Method::PUT,
            "auth/v1/user",
            &[],
            Some(access_token),
            Some(&body),
        )
        .await
    }

    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        bearer: Option<&str>,
        body: Option<&serde_json::Value>,
    ) -> Result<T, PlatformError> {
        let mut url = self.client.endpoint(path)?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }

        let mut request = self.client.request(method, url, bearer);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = check_auth(request.send().await?).await?;
        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::PlatformConfig;

    fn client(server: &MockServer) -> PlatformClient {
        PlatformClient::new(&PlatformConfig {
            url: Url::parse(&server.uri()).unwrap(),
            anon_key: "anon".to_string(),
            service_role_key: None,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    fn session_json() -> serde_json::Value {
        json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 3600,
            "user": {
                "id": "7c4b7a0e-4b7e-4d55-9d2b-0d3b1f1e8a11",
                "email": "ann@example.com",
                "user_metadata": {}
            }
        })
    }

    #[tokio::test]
    async fn test_sign_in_with_password() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .and(query_param("grant_type", "password"))
            .and(header("apikey", "anon"))
            .and(body_json(json!({ "email": "ann@example.com", "password": "secret1" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let email = Email::parse("ann@example.com").unwrap();
        let session = client
            .auth()
            .sign_in_with_password(&email, "secret1")
            .await
            .unwrap();

        assert_eq!(session.access_token, "at-1");
        assert_eq!(session.user.email.as_deref(), Some("ann@example.com"));
    }

    #[tokio::test]
    async fn test_auth_error_message_is_verbatim() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "error": "invalid_grant",
                "error_description": "Invalid login credentials"
            })))
            .mount(&server)
            .await;

        let client = client(&server);
        let email = Email::parse("ann@example.com").unwrap();
        let err = client
            .auth()
            .sign_in_with_password(&email, "wrong-password")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid login credentials");
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_auth_error_falls_back_to_msg_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/signup"))
            .respond_with(
                ResponseTemplate::new(422).set_body_json(json!({ "msg": "User already registered" })),
            )
            .mount(&server)
            .await;

        let client = client(&server);
        let email = Email::parse("ann@example.com").unwrap();
        let err = client
            .auth()
            .sign_up(&email, "secret1", &json!({}))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "User already registered");
    }

    #[tokio::test]
    async fn test_reset_password_sends_redirect() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/auth/v1/recover"))
            .and(query_param("redirect_to", "http://shop.test/reset-password"))
            .and(body_json(json!({ "email": "ann@example.com" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let email = Email::parse("ann@example.com").unwrap();
        client
            .auth()
            .reset_password_for_email(&email, "http://shop.test/reset-password")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_get_user_uses_access_token() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/auth/v1/user"))
            .and(header("authorization", "Bearer at-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(session_json()["user"].clone()))
            .expect(1)
            .mount(&server)
            .await;

        let client = client(&server);
        let user = client.auth().get_user("at-1").await.unwrap();
        assert_eq!(user.email.as_deref(), Some("ann@example.com"));
    }
}
