use bcrypt::BcryptError;
use chrono::{Duration, NaiveDateTime, Utc};
use cookie::CookieJar;
use diesel::prelude::*;
use diesel::Connection as _;
use diesel_derive_enum::DbEnum;
use futures::future;
use gotham::{
    handler::HandlerFuture,
    helpers::http::response::create_response,
    middleware::Middleware,
    state::{FromState, State},
};
use gotham_derive::{NewMiddleware, StateData};
use rand::prelude::*;
use sha2::{Digest, Sha256};

use crate::{
    db::{Connection, DieselResult},
    error::Error,
    schema::{sessions, users},
    DbConnection,
};

const SALT_LEN: usize = 16;
const SESSION_LEN: usize = 24;

/// What a user account is allowed to do. The first registered account gets
/// `Admin`, everyone signing up after that is a `Member`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, DbEnum)]
pub enum Role {
    Member,
    Admin,
}

#[derive(Debug, Queryable, Identifiable)]
pub struct User {
    /// The unique numeric id
    pub id: i32,
    /// The email address the user logs in with
    pub email: String,
    /// The user's display name
    pub name: String,
    /// The hashed password
    hash: String,
    /// The salt for the password
    salt: Vec<u8>,
    /// The user's role
    pub role: Role,
}

impl User {
    /// Verify the supplied password matches the user's
    pub fn verify(&self, password: &str) -> Result<bool, BcryptError> {
        verify(password, &self.salt, &self.hash)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// A to be created user.
///
/// NOTE: This structure contains the user's unencrypted password, handle it with great care!
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Insertable)]
#[table_name = "users"]
struct InsertUser {
    email: String,
    name: String,
    hash: String,
    salt: Vec<u8>,
    role: Role,
}

impl NewUser {
    /// Converts the structure into an insertable row, generating a salt and
    /// hashing the password.
    fn into_insert(self, role: Role) -> InsertUser {
        let salt: Box<[u8]> = Box::new(generate_salt());
        InsertUser {
            email: self.email,
            name: self.name,
            hash: hash(&self.password, &salt).unwrap(),
            salt: salt.into_vec(),
            role,
        }
    }
}

/// Login credentials
pub struct Login {
    pub email: String,
    pub password: String,
}

/// What came of a login attempt. The two failure cases are deliberately kept
/// apart so the login page can tell the visitor which one they hit, matching
/// the site's historical behavior.
pub enum LoginOutcome {
    Session(Session),
    UnknownEmail,
    WrongPassword,
}

impl Login {
    /// Create a session if email and password are valid
    pub fn login(&self, connection: &Connection) -> Result<LoginOutcome, failure::Error> {
        let user = match by_email(connection, &self.email)? {
            Some(user) => user,
            None => return Ok(LoginOutcome::UnknownEmail),
        };
        if !user.verify(&self.password)? {
            return Ok(LoginOutcome::WrongPassword);
        }
        Ok(LoginOutcome::Session(start_session(connection, user.id)?))
    }
}

#[derive(Clone, Queryable, Insertable, StateData)]
pub struct Session {
    pub id: String,
    pub user: i32,
    pub expires: NaiveDateTime,
}

impl Session {
    /// Generates a new session.
    ///
    /// NB: Must be inserted into the database for the session to be valid.
    pub fn new(user: i32) -> Session {
        // Fill array with random data
        let mut id = [0u8; SESSION_LEN];
        StdRng::from_entropy().fill(&mut id[..]);
        Session {
            id: base64::encode(&id),
            user,
            expires: Utc::now().naive_utc() + Duration::days(30),
        }
    }

    /// Get the unexpired session with the specified id
    pub fn from_id(id: &str, connection: &Connection) -> DieselResult<Option<Session>> {
        use crate::schema::sessions::dsl;

        dsl::sessions
            .find(id)
            .filter(dsl::expires.gt(Utc::now().naive_utc()))
            .first(connection)
            .optional()
    }

    pub fn user(&self, connection: &Connection) -> DieselResult<User> {
        get(connection, self.user)
    }
}

/// Resolves the session cookie to a `Session` state entry before the route
/// handler runs. Anonymous requests pass through without one.
#[derive(Clone, NewMiddleware)]
pub struct SessionMiddleware;

impl Middleware for SessionMiddleware {
    fn call<C>(self, mut state: State, chain: C) -> Box<HandlerFuture>
    where
        C: FnOnce(State) -> Box<HandlerFuture>,
    {
        let put_session = |state: &mut State| -> Result<(), failure::Error> {
            let connection = DbConnection::borrow_from(&state).lock()?;
            let cookie = CookieJar::borrow_from(&state)
                .get("session")
                .map(|cookie| cookie.value());
            if let Some(id) = cookie {
                if let Some(session) = Session::from_id(id, &connection)? {
                    std::mem::drop(connection);
                    state.put(session);
                }
            }
            Ok(())
        };
        match put_session(&mut state) {
            Ok(()) => Box::new(chain(state)),
            Err(e) => {
                let response = create_response(
                    &state,
                    http::StatusCode::INTERNAL_SERVER_ERROR,
                    mime::TEXT_PLAIN,
                    e.to_string(),
                );
                Box::new(future::ok((state, response)))
            }
        }
    }
}

/// The user attached to the request's session, if any.
pub fn current(state: &State, connection: &Connection) -> DieselResult<Option<User>> {
    match Session::try_borrow_from(state) {
        Some(session) => session.user(connection).optional(),
        None => Ok(None),
    }
}

/// Guard for routes that need a logged in user. Fails with `AuthRequired`,
/// which the central responder turns into a flash and a login redirect.
pub fn require_user(state: &State, connection: &Connection) -> Result<User, failure::Error> {
    match current(state, connection)? {
        Some(user) => Ok(user),
        None => Err(Error::AuthRequired.into()),
    }
}

/// Guard for admin gated routes. Fails with `Forbidden`, surfaced as a 403.
pub fn require_admin(state: &State, connection: &Connection) -> Result<User, failure::Error> {
    match current(state, connection)? {
        Some(user) if user.is_admin() => Ok(user),
        _ => Err(Error::Forbidden.into()),
    }
}

/// Password hashing function. Inspired by [Dropbox's password storage policy][1].
///
/// First the password and salt are combined, then hashed with SHA256 to prevent DoS attacks. The
/// password is then hashed with bcrypt.
///
/// [1]: https://blogs.dropbox.com/tech/2016/09/how-dropbox-securely-stores-your-passwords/
fn hash(key: &str, salt: &[u8]) -> Result<String, BcryptError> {
    // digest the password and salt
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    // Hash the password with bcrypt (base64 encode to avoid zero-bytes).
    let hash = bcrypt::hash(base64::encode(&digest), bcrypt::DEFAULT_COST)?;
    Ok(hash)
}

fn verify(key: &str, salt: &[u8], hash: &str) -> Result<bool, BcryptError> {
    let digest = Sha256::new().chain(key).chain(salt).finalize();
    let matches = bcrypt::verify(&base64::encode(&digest), hash)?;
    Ok(matches)
}

/// Generates a new salt of length `SALT_LEN`
fn generate_salt() -> [u8; SALT_LEN] {
    let mut bytes = [0u8; SALT_LEN];

    StdRng::from_entropy().fill(&mut bytes[..]);

    bytes
}

/// Creates a user, returning the stored row. The first account created on
/// the site gets the admin role.
pub fn create(connection: &Connection, user: NewUser) -> DieselResult<User> {
    let role = if count(connection)? == 0 {
        Role::Admin
    } else {
        Role::Member
    };
    diesel::insert_into(users::table)
        .values(&user.into_insert(role))
        .get_result(connection)
}

pub fn get(connection: &Connection, id: i32) -> DieselResult<User> {
    use crate::schema::users::dsl;

    dsl::users.find(id).first(connection)
}

/// Exact match lookup on the login email.
pub fn by_email(connection: &Connection, email: &str) -> DieselResult<Option<User>> {
    use crate::schema::users::dsl;

    dsl::users
        .filter(dsl::email.eq(email))
        .first(connection)
        .optional()
}

/// Opens a session for the given user and stores it.
/// Creates the account and opens its first session in one transaction, so a
/// failed session insert doesn't leave a half-registered account behind.
pub fn register(connection: &Connection, user: NewUser) -> DieselResult<Session> {
    connection.transaction(|| {
        let created = create(connection, user)?;
        start_session(connection, created.id)
    })
}

pub fn start_session(connection: &Connection, user: i32) -> DieselResult<Session> {
    use crate::schema::sessions::dsl;

    // Stale rows never match `from_id`, so reap them while we're here
    diesel::delete(dsl::sessions.filter(dsl::expires.le(Utc::now().naive_utc())))
        .execute(connection)?;

    let session = Session::new(user);
    diesel::insert_into(sessions::table)
        .values(&session)
        .execute(connection)?;
    Ok(session)
}

pub fn logout(connection: &Connection, session: &str) -> DieselResult<usize> {
    use crate::schema::sessions::dsl;

    diesel::delete(dsl::sessions.find(session)).execute(connection)
}

pub fn count(connection: &Connection) -> DieselResult<i64> {
    use crate::schema::users::dsl::*;

    users.count().first(connection)
}

#[cfg(test)]
mod tests {
    use super::{generate_salt, hash, verify, Session, SALT_LEN};

    #[test]
    fn hash_is_not_plaintext() {
        let salt = generate_salt();
        let hashed = hash("secret1", &salt).unwrap();
        assert_ne!(hashed, "secret1");
        assert!(!hashed.contains("secret1"));
    }

    #[test]
    fn verify_roundtrip() {
        let salt = generate_salt();
        let hashed = hash("secret1", &salt).unwrap();
        assert!(verify("secret1", &salt, &hashed).unwrap());
        assert!(!verify("secret2", &salt, &hashed).unwrap());
    }

    #[test]
    fn salt_has_expected_length() {
        assert_eq!(generate_salt().len(), SALT_LEN);
    }

    #[test]
    fn session_tokens_are_unique() {
        let a = Session::new(1);
        let b = Session::new(1);
        assert_ne!(a.id, b.id);
        assert!(a.expires > chrono::Utc::now().naive_utc());
    }

    #[test]
    fn fresh_sessions_outlive_the_reap_cutoff() {
        // `start_session` deletes rows with expires <= now; a session minted
        // in the same call must never match its own cutoff.
        let session = Session::new(1);
        let cutoff = chrono::Utc::now().naive_utc();
        assert!(session.expires > cutoff);
    }
}
