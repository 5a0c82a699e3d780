//! Profit watch command.
//!
//! Logs in as an admin over HTTP and logs the profit summary on a fixed
//! interval until Ctrl-C. A rejected poll (expired session, lost admin
//! rights) stops the watch; network errors are logged and retried on the
//! next tick.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::poller::Poller;

/// Errors that can occur while watching.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("login failed ({status}): {message}")]
    Login { status: StatusCode, message: String },

    #[error("account is not an admin")]
    NotAdmin,

    #[error("failed to listen for Ctrl-C: {0}")]
    Signal(#[from] std::io::Error),
}

/// Profit summary as served by `/api/admin/profit`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfitReport {
    total_profit: f64,
    total_quantity_sold: i64,
}

#[derive(Debug, Deserialize)]
struct LoginReply {
    user: LoginUser,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginUser {
    war_name: String,
    is_admin: bool,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorReply {
    error: String,
}

/// Log in and poll the profit summary every `period` until Ctrl-C.
///
/// # Errors
///
/// Returns `WatchError::Login` or `WatchError::NotAdmin` if the credentials
/// do not open an admin session.
pub async fn watch_profit(
    base_url: &str,
    login: &str,
    password: &SecretString,
    period: Duration,
) -> Result<(), WatchError> {
    let base_url = base_url.trim_end_matches('/').to_owned();
    let client = Client::builder()
        .cookie_store(true)
        .timeout(Duration::from_secs(10))
        .build()?;

    let response = client
        .post(format!("{base_url}/api/auth/login"))
        .json(&serde_json::json!({
            "email": login,
            "password": password.expose_secret(),
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let message = response
            .json::<ErrorReply>()
            .await
            .unwrap_or_default()
            .error;
        return Err(WatchError::Login { status, message });
    }
    let reply: LoginReply = response.json().await?;
    if !reply.user.is_admin {
        return Err(WatchError::NotAdmin);
    }
    tracing::info!(admin = %reply.user.war_name, "Logged in, watching profit");

    let url = format!("{base_url}/api/admin/profit");
    let stop = CancellationToken::new();
    let poll_stop = stop.clone();
    let poller = Poller::spawn(stop.clone(), period, move || {
        let (client, url, stop) = (client.clone(), url.clone(), poll_stop.clone());
        async move {
            poll_once(&client, &url, &stop).await;
        }
    });

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result?;
            tracing::info!("Ctrl-C received, stopping");
        }
        () = stop.cancelled() => {}
    }

    poller.stop().await;
    Ok(())
}

async fn poll_once(client: &Client, url: &str, stop: &CancellationToken) {
    let response = match client.get(url).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(error = %e, "Profit poll failed");
            return;
        }
    };

    if response.status() == StatusCode::UNAUTHORIZED {
        tracing::error!("Session rejected by server, stopping");
        stop.cancel();
        return;
    }

    match response.error_for_status() {
        Ok(response) => match response.json::<ProfitReport>().await {
            Ok(report) => tracing::info!(
                total_profit = report.total_profit,
                total_quantity_sold = report.total_quantity_sold,
                "Profit"
            ),
            Err(e) => tracing::warn!(error = %e, "Unreadable profit response"),
        },
        Err(e) => tracing::warn!(error = %e, "Profit poll failed"),
    }
}
