use askama::Template;
use diesel::result::Error as DieselError;
use futures::{future, Future, Stream};
use gotham::{
    handler::{HandlerFuture, IntoHandlerError},
    state::{FromState, State},
};
use gotham_derive::{StateData, StaticResponseExtender};
use http::{Response, StatusCode};
use hyper::Body;

use crate::{
    document::{flash_redirect, TemplateExt},
    error::Error,
    user::User,
    DbConnection,
};

/// Path parameter for routes addressing a single project.
#[derive(Deserialize, StateData, StaticResponseExtender)]
pub struct ProjectPath {
    pub id: i32,
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate {
    user: Option<User>,
    error: String,
}

/// Creates a `HandlerFuture` that runs the given function
pub fn body_handler<F>(mut state: State, op: F) -> Box<HandlerFuture>
where
    F: FnOnce(&State, Vec<u8>) -> Response<Body> + Send + 'static,
{
    let f = Body::take_from(&mut state)
        .concat2()
        .then(|result| match result {
            Ok(body) => {
                let response = op(&state, body.to_vec());
                future::ok((state, response))
            }
            Err(e) => future::err((state, e.into_handler_error())),
        });

    Box::new(f)
}

fn error_page(state: &State, status: StatusCode, error: impl std::fmt::Display) -> Response<Body> {
    let user = DbConnection::borrow_from(state)
        .lock()
        .ok()
        .and_then(|connection| crate::user::current(state, &connection).ok())
        .and_then(|user| user);
    let mut response = ErrorTemplate {
        user,
        error: error.to_string(),
    }
    .to_response(state);
    *response.status_mut() = status;
    response
}

/// Maps a handler failure to its response: guard failures become a login
/// redirect or a 403, missing rows a 404, anything else a 500.
pub fn error_response(state: &State, error: failure::Error) -> Response<Body> {
    if let Some(app) = error.downcast_ref::<Error>() {
        let message = app.to_string();
        return match app {
            Error::AuthRequired => flash_redirect(state, "/login", &message)
                .unwrap_or_else(|e| error_page(state, StatusCode::INTERNAL_SERVER_ERROR, e)),
            Error::Forbidden => error_page(state, StatusCode::FORBIDDEN, message),
        };
    }
    if let Some(DieselError::NotFound) = error.downcast_ref::<DieselError>() {
        return error_page(state, StatusCode::NOT_FOUND, "Not found");
    }
    log::error!("request failed: {}", error);
    error_page(state, StatusCode::INTERNAL_SERVER_ERROR, error)
}

pub fn response(state: &State, result: Result<Response<Body>, failure::Error>) -> Response<Body> {
    match result {
        Ok(response) => response,
        Err(error) => error_response(state, error),
    }
}

/// Fallback body for paths the router doesn't know.
pub struct NotFound;

impl gotham::router::response::extender::ResponseExtender<Body> for NotFound {
    fn extend(&self, _state: &mut State, res: &mut Response<Body>) {
        let body = res.body_mut();
        *body = "404 File not found".into();
    }
}

#[macro_export]
macro_rules! handler {
    ($handler_fn:path) => {
        |state| {
            let r = crate::handler::response(&state, $handler_fn(&state));
            (state, r)
        }
    };
}

#[macro_export]
macro_rules! body_handler {
    ($handler_fn:path) => {
        |state| {
            crate::handler::body_handler(state, |state, post| {
                crate::handler::response(&state, $handler_fn(state, post))
            })
        }
    };
}
