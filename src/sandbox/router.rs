use super::error::SandboxError;
use super::handler::{self, REFRESH_COOKIE};
use super::state::SandboxState;
use std::convert::Infallible;
use std::sync::Arc;
use warp::Filter;

pub fn routes(
    state: Arc<SandboxState>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let login = warp::post()
        .and(warp::path!("auth" / "login"))
        .and(warp::body::json())
        .and(with(state.clone()))
        .and_then(handler::login);

    let refresh = warp::post()
        .and(warp::path!("auth" / "refresh"))
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(state.clone()))
        .and_then(handler::refresh);

    let logout = warp::post()
        .and(warp::path!("auth" / "logout"))
        .and(with_session(state.clone()))
        .and(warp::cookie::optional::<String>(REFRESH_COOKIE))
        .and(with(state.clone()))
        .and_then(handler::logout);

    let list_trips = warp::get()
        .and(warp::path!("trips"))
        .and(with_session(state.clone()))
        .and(with(state.clone()))
        .and_then(handler::list_trips);

    let create_trip = warp::post()
        .and(warp::path!("trips"))
        .and(warp::body::json())
        .and(with_session(state.clone()))
        .and(with(state))
        .and_then(handler::create_trip);

    warp::path("api").and(
        login
            .or(refresh)
            .or(logout)
            .or(list_trips)
            .or(create_trip),
    )
}

fn with<T>(value: Arc<T>) -> impl Filter<Extract = (Arc<T>,), Error = Infallible> + Clone
where
    T: Send + Sync + ?Sized,
{
    warp::any().map(move || value.clone())
}

/// Resolves the bearer token into a result rather than a rejection, so
/// handlers can answer 401 with a body instead of falling through to other
/// routes.
fn with_session(
    state: Arc<SandboxState>,
) -> impl Filter<Extract = (Result<String, SandboxError>,), Error = warp::Rejection> + Clone {
    warp::header::optional::<String>("authorization")
        .map(move |header: Option<String>| state.authorize(header))
}
