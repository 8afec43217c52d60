use harvestgate_domain::{Session, SessionPayload};
use http::Method;
use serde::Serialize;
use tracing::{info, warn};

use crate::HttpRequest;

use super::*;

#[derive(Serialize)]
struct SsoExchange<'a> {
    code: &'a str,
}

impl AuthService {
    /// Signs in with email and password and replaces the session wholesale.
    ///
    /// Backend validation failures come back as `AppError::FieldValidation`
    /// and inactive accounts as `AppError::Forbidden`.
    pub async fn login(&self, credentials: &LoginCredentials) -> AppResult<Session> {
        let endpoint = self.client.config().endpoints.login.clone();
        let session = self.establish(&endpoint, credentials).await?;

        info!(email = %credentials.email(), "signed in");
        Ok(session)
    }

    /// Exchanges a one-time SSO code for a session.
    pub async fn login_with_sso(&self, exchange_code: &str) -> AppResult<Session> {
        let code = NonEmptyString::new(exchange_code)
            .map_err(|_| AppError::Validation("SSO exchange code is required".to_owned()))?;
        let endpoint = self.client.config().endpoints.sso_exchange.clone();
        let session = self
            .establish(&endpoint, &SsoExchange {
                code: code.as_str(),
            })
            .await?;

        info!("signed in through SSO exchange");
        Ok(session)
    }

    /// Drops the local session, then tells the backend.
    ///
    /// The local session stays cleared even when the backend call fails.
    pub async fn logout(&self) {
        self.client.forget_refresh().await;
        self.store().clear(None);
        info!("signed out locally");

        let endpoint = self.client.config().endpoints.logout.as_str();
        if let Err(error) = self.client.request(HttpRequest::post(endpoint)).await {
            warn!(error = %error, "logout notification failed; local session already cleared");
        }
    }

    async fn establish<B>(&self, endpoint: &str, body: &B) -> AppResult<Session>
    where
        B: Serialize + ?Sized,
    {
        let store = self.store();
        store.begin_loading();

        match self
            .client
            .send_json::<B, SessionPayload>(Method::POST, endpoint, body)
            .await
        {
            Ok(payload) => {
                self.client.forget_refresh().await;
                Ok(store.apply_payload(&payload))
            }
            Err(error) => {
                store.finish_loading(Some(error.clone()));
                Err(error)
            }
        }
    }
}
