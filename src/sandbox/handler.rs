use super::error::SandboxError;
use super::state::{Grant, SandboxState, Trip};
use crate::logger::*;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use warp::http::StatusCode;
use warp::reply::Response;
use warp::Reply;

pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Debug, Deserialize)]
pub struct LoginBody {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
struct Envelope<T> {
    message: &'static str,
    data: T,
}

fn refresh_cookie(value: &str) -> String {
    format!("{REFRESH_COOKIE}={value}; HttpOnly; Path=/; SameSite=Strict")
}

fn with_cookie(reply: impl Reply, cookie: String) -> Response {
    warp::reply::with_header(reply, "set-cookie", cookie).into_response()
}

fn grant_reply(message: &'static str, grant: Grant, status: StatusCode) -> Response {
    let cookie = refresh_cookie(&grant.refresh_token);
    let body = warp::reply::json(&Envelope {
        message,
        data: grant,
    });
    with_cookie(warp::reply::with_status(body, status), cookie)
}

pub async fn login(
    body: LoginBody,
    state: Arc<SandboxState>,
) -> Result<Response, warp::Rejection> {
    match state.login(&body.email, &body.password) {
        Ok(grant) => {
            info!(user_id = %grant.user_id, "sandbox login");
            Ok(grant_reply("Login successful", grant, StatusCode::OK))
        }
        Err(e) => {
            debug!(email = %body.email, error = %e, "sandbox login refused");
            Ok(e.into_response())
        }
    }
}

pub async fn refresh(
    cookie: Option<String>,
    state: Arc<SandboxState>,
) -> Result<Response, warp::Rejection> {
    match state.refresh(cookie).await {
        Ok(grant) => Ok(grant_reply("Token refreshed", grant, StatusCode::CREATED)),
        Err(e) => {
            debug!(error = %e, "sandbox refresh refused");
            Ok(e.into_response())
        }
    }
}

pub async fn logout(
    session: Result<String, SandboxError>,
    cookie: Option<String>,
    state: Arc<SandboxState>,
) -> Result<Response, warp::Rejection> {
    let user_id = match session {
        Ok(user_id) => user_id,
        Err(e) => return Ok(e.into_response()),
    };
    state.logout(&user_id, cookie);
    let body = warp::reply::json(&json!({ "message": "Logged out" }));
    Ok(with_cookie(
        body,
        format!("{REFRESH_COOKIE}=; Max-Age=0; Path=/"),
    ))
}

pub async fn list_trips(
    session: Result<String, SandboxError>,
    state: Arc<SandboxState>,
) -> Result<Response, warp::Rejection> {
    let reply = match session {
        Ok(user_id) => warp::reply::json(&json!({ "data": state.trips(&user_id) })).into_response(),
        Err(e) => e.into_response(),
    };
    Ok(reply)
}

pub async fn create_trip(
    trip: Trip,
    session: Result<String, SandboxError>,
    state: Arc<SandboxState>,
) -> Result<Response, warp::Rejection> {
    let reply = match session.and_then(|user_id| state.add_trip(&user_id, trip)) {
        Ok(trip) => warp::reply::with_status(
            warp::reply::json(&Envelope {
                message: "Trip created",
                data: trip,
            }),
            StatusCode::CREATED,
        )
        .into_response(),
        Err(e) => e.into_response(),
    };
    Ok(reply)
}
