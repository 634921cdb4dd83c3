use failure::Fail;

/// Request-scoped failures raised by the route guards. Everything else rides
/// on `failure::Error` directly; diesel's `NotFound` is mapped to a 404 by
/// the central responder in `handler`.
#[derive(Debug, Fail)]
pub enum Error {
    /// The action needs a logged in user. Recovered with a flash message and
    /// a redirect to the login page.
    #[fail(display = "You need to login or register to comment.")]
    AuthRequired,
    /// The action needs the admin role. Surfaced as HTTP 403.
    #[fail(display = "Permission denied")]
    Forbidden,
}
