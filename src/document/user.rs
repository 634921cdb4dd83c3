//! Login, registration and logout.

use askama::Template;
use cookie::Cookie;
use gotham::state::{FromState, State};

use super::{
    clear_flash, flash_message, flash_redirect, see_other, session_cookie, set_cookie,
    DocumentResult, TemplateExt,
};
use crate::{
    forms::{FieldErrors, LoginForm, RegisterForm},
    user::{self, Login, LoginOutcome, Session, User},
    DbConnection,
};

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    user: Option<User>,
    form: LoginForm,
    errors: FieldErrors,
    flash: Option<String>,
}

fn login_page(state: &State, form: LoginForm, errors: FieldErrors) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let flash = flash_message(state);
    let had_flash = flash.is_some();

    let template = LoginTemplate {
        user: user::current(state, connection)?,
        form: LoginForm {
            password: String::new(),
            ..form
        },
        errors,
        flash,
    };
    let mut response = template.to_response(state);
    if had_flash {
        clear_flash(&mut response)?;
    }
    Ok(response)
}

pub fn login(state: &State) -> DocumentResult {
    login_page(state, LoginForm::default(), FieldErrors::new())
}

pub fn login_post(state: &State, post: Vec<u8>) -> DocumentResult {
    let form: LoginForm = serde_urlencoded::from_bytes(&post)?;
    if let Err(errors) = form.validate() {
        return login_page(state, form, errors);
    }

    let outcome = {
        let connection = &DbConnection::from_state(state)?;
        Login::from(form).login(connection)?
    };
    match outcome {
        LoginOutcome::UnknownEmail => {
            flash_redirect(state, "/login", "That email does not exist, please try again.")
        }
        LoginOutcome::WrongPassword => {
            flash_redirect(state, "/login", "Password is incorrect, please try again.")
        }
        LoginOutcome::Session(session) => {
            let mut response = see_other(state, "/".to_owned());
            set_cookie(&mut response, session_cookie(state, &session.id))?;
            Ok(response)
        }
    }
}

#[derive(Template)]
#[template(path = "register.html")]
pub struct RegisterTemplate {
    user: Option<User>,
    form: RegisterForm,
    errors: FieldErrors,
}

fn register_page(state: &State, form: RegisterForm, errors: FieldErrors) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let template = RegisterTemplate {
        user: user::current(state, connection)?,
        form: RegisterForm {
            password: String::new(),
            ..form
        },
        errors,
    };
    Ok(template.to_response(state))
}

pub fn register(state: &State) -> DocumentResult {
    register_page(state, RegisterForm::default(), FieldErrors::new())
}

/// Creates the account and logs it straight in. A taken email sends the
/// visitor to the login page instead of creating a duplicate row.
pub fn register_post(state: &State, post: Vec<u8>) -> DocumentResult {
    let form: RegisterForm = serde_urlencoded::from_bytes(&post)?;
    if let Err(errors) = form.validate() {
        return register_page(state, form, errors);
    }

    let session = {
        let connection = &DbConnection::from_state(state)?;
        if user::by_email(connection, &form.email)?.is_some() {
            return flash_redirect(
                state,
                "/login",
                "You've already signed up using this email, log in instead!",
            );
        }
        user::register(connection, form.into())?
    };

    let mut response = see_other(state, "/".to_owned());
    set_cookie(&mut response, session_cookie(state, &session.id))?;
    Ok(response)
}

/// Safe to hit without a session; the cookie gets cleared either way.
pub fn logout(state: &State) -> DocumentResult {
    {
        let connection = &DbConnection::from_state(state)?;
        if let Some(session) = Session::try_borrow_from(state) {
            user::logout(connection, &session.id)?;
        }
    }

    let mut response = see_other(state, "/".to_owned());
    // Delete session cookie with Max-Age=0
    let cookie = Cookie::build("session", "")
        .max_age(time::Duration::zero())
        .path("/")
        .finish();
    set_cookie(&mut response, cookie)?;
    Ok(response)
}
