use super::error::{self, Error, ErrorResp};
use super::{
    forgot_password, me, profile, refresh, register, reset_password, token, users, whoami,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

/// Client for the accounts API
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Client {
    /// The server to connect to. Should only be the protocol and domain, e.g.
    /// `https://accounts.your-domain.com`.
    pub server: String,

    /// Access token. Set this by logging in or refreshing.
    pub access: Option<String>,

    /// Refresh token. Set this by logging in.
    pub refresh: Option<String>,
}

impl Client {
    /// Construct a new client
    pub fn new(server: String) -> Self {
        Self {
            server,
            access: None,
            refresh: None,
        }
    }

    /// Register with the server. The new account is inactive until an
    /// administrator activates it.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn register(
        &self,
        client: &reqwest::Client,
        req: &register::Req,
    ) -> error::Result<register::Resp> {
        let url = self.url(register::PATH)?;

        Self::handle_response(client.post(url).json(req)).await
    }

    /// Log into the server, storing both tokens for later requests.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn login(
        &mut self,
        client: &reqwest::Client,
        req: &token::Req,
    ) -> error::Result<token::Resp> {
        let url = self.url(token::PATH)?;

        let resp: token::Resp = Self::handle_response(client.post(url).json(req)).await?;
        self.access = Some(resp.access.clone());
        self.refresh = Some(resp.refresh.clone());

        Ok(resp)
    }

    /// Trade the stored refresh token for a new access token.
    ///
    /// ## Errors
    ///
    /// `Error::Client` if we have not logged in yet. Otherwise the same as
    /// `handle_response`.
    pub async fn refresh(&mut self, client: &reqwest::Client) -> error::Result<refresh::Resp> {
        let url = self.url(refresh::PATH)?;

        let Some(refresh) = self.refresh.clone() else {
            return Err(Self::unauthorized());
        };

        let resp: refresh::Resp =
            Self::handle_response(client.post(url).json(&refresh::Req { refresh })).await?;
        self.access = Some(resp.access.clone());

        Ok(resp)
    }

    /// Check that your auth works.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn whoami(&self, client: &reqwest::Client) -> error::Result<whoami::Resp> {
        let url = self.url(whoami::PATH)?;

        self.authenticated(|jwt| client.get(url).bearer_auth(jwt))
            .await
    }

    /// Get your own profile.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn me(&self, client: &reqwest::Client) -> error::Result<me::Resp> {
        let url = self.url(me::PATH)?;

        self.authenticated(|jwt| client.get(url).bearer_auth(jwt))
            .await
    }

    /// Update your own profile.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn update_me(
        &self,
        client: &reqwest::Client,
        req: &me::Req,
    ) -> error::Result<me::Resp> {
        let url = self.url(me::PATH)?;

        self.authenticated(|jwt| client.patch(url).bearer_auth(jwt).json(req))
            .await
    }

    /// List every user. Only works for administrators.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn users(&self, client: &reqwest::Client) -> error::Result<users::ListResp> {
        let url = self.url(users::PATH)?;

        self.authenticated(|jwt| client.get(url).bearer_auth(jwt))
            .await
    }

    /// Update any user's profile. Only works for administrators.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn update_user(
        &self,
        client: &reqwest::Client,
        pk: i64,
        req: &profile::Changes,
    ) -> error::Result<users::Resp> {
        let url = self.url(&users::item_path(pk))?;

        self.authenticated(|jwt| client.patch(url).bearer_auth(jwt).json(req))
            .await
    }

    /// Ask the server to send a password reset token to the account's owner.
    /// Succeeds whether or not the account exists.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn forgot_password(
        &self,
        client: &reqwest::Client,
        req: &forgot_password::Req,
    ) -> error::Result<forgot_password::Resp> {
        let url = self.url(forgot_password::PATH)?;

        Self::handle_response(client.post(url).json(req)).await
    }

    /// Set a new password with a reset token. Existing tokens are not
    /// touched, so log in again afterwards.
    ///
    /// ## Errors
    ///
    /// Errors are the same as `handle_response`.
    pub async fn reset_password(
        &self,
        client: &reqwest::Client,
        req: &reset_password::Req,
    ) -> error::Result<reset_password::Resp> {
        let url = self.url(reset_password::PATH)?;

        Self::handle_response(client.post(url).json(req)).await
    }

    /// Join a path onto the configured server.
    fn url(&self, path: &str) -> error::Result<Url> {
        Ok(Url::parse(&self.server)?.join(path)?)
    }

    /// The error we return when a call needs tokens we don't have.
    fn unauthorized() -> Error {
        Error::Client {
            message: "Unauthorized".to_string(),
            fields: error::FieldMessages::new(),
        }
    }

    /// Send a request with our access token, if we have one.
    async fn authenticated<CB, T>(&self, cb: CB) -> Result<T, Error>
    where
        CB: FnOnce(&str) -> reqwest::RequestBuilder,
        T: DeserializeOwned,
    {
        match &self.access {
            Some(access) => Self::handle_response(cb(access)).await,
            None => Err(Self::unauthorized()),
        }
    }

    /// Convert an HTTP response into a result, interpreting errors in a
    /// standard way.
    ///
    /// ## Errors
    ///
    /// - `Ok(..)` if the server returned a success (2xx)
    /// - `Error::Client` if the server returned a client error (4xx)
    /// - `Error::Server` if the server returned a server error (5xx)
    /// - `Error::Unexpected` if the server returned something else (the server is
    ///   not supposed to issue redirects or informational responses.)
    async fn handle_response<T>(resp: reqwest::RequestBuilder) -> error::Result<T>
    where
        T: DeserializeOwned,
    {
        let resp = resp.send().await?;

        let status = resp.status();

        if status.is_success() {
            Ok(resp.json().await?)
        } else if status.is_client_error() {
            let err: ErrorResp = resp.json().await?;
            Err(Error::Client {
                message: err.error,
                fields: err.fields,
            })
        } else if status.is_server_error() {
            Err(Error::Server)
        } else {
            Err(Error::Unexpected(status))
        }
    }
}
