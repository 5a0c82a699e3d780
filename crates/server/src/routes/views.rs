//! View routes.
//!
//! Page rendering lives in the client; these handlers apply the role
//! redirects and return the data each page needs.

use axum::{
    Json,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Serialize;

use crate::error::Result;
use crate::middleware::OptionalAuth;
use crate::models::{Caller, PublicUser, SessionClaims};
use crate::services::aggregate::{self, ProductSales, ProfitSummary};
use crate::services::ledger::{Ledger, UserLedger};
use crate::state::AppState;

const LOGIN_PATH: &str = "/login";

/// Dashboard data for a user.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub user: PublicUser,
    #[serde(flatten)]
    pub ledger: UserLedger,
}

/// Admin console data.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminView {
    pub user: PublicUser,
    pub profit: ProfitSummary,
    pub products_sold: Vec<ProductSales>,
}

async fn current_user(state: &AppState, claims: &SessionClaims) -> Result<Option<PublicUser>> {
    Ok(state
        .store()
        .get_user(claims.id)
        .await?
        .map(|u| u.public()))
}

/// GET /
pub async fn root(OptionalAuth(caller): OptionalAuth) -> Redirect {
    Redirect::to(caller.role().map_or(LOGIN_PATH, |role| role.home_path()))
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
) -> Result<Response> {
    let claims = match caller {
        Caller::User(claims) => claims,
        Caller::Admin(_) => return Ok(Redirect::to("/admin").into_response()),
        Caller::Anonymous => return Ok(Redirect::to(LOGIN_PATH).into_response()),
    };

    let Some(user) = current_user(&state, &claims).await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let ledger = Ledger::new(state.store()).for_user(claims.id).await?;

    Ok(Json(DashboardView { user, ledger }).into_response())
}

/// GET /admin
pub async fn admin(
    State(state): State<AppState>,
    OptionalAuth(caller): OptionalAuth,
) -> Result<Response> {
    let Caller::Admin(claims) = caller else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };

    let Some(user) = current_user(&state, &claims).await? else {
        return Ok(Redirect::to(LOGIN_PATH).into_response());
    };
    let entries = state.store().list_consumptions_for_admin(claims.id).await?;

    Ok(Json(AdminView {
        user,
        profit: aggregate::profit_summary(&entries, claims.id)?,
        products_sold: aggregate::products_sold(&entries, claims.id)?,
    })
    .into_response())
}
