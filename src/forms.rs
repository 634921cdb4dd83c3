//! Typed contracts for the site's HTML forms.
//!
//! Each form decodes from an urlencoded request body and checks its own
//! fields. A failed check produces field level errors that the originating
//! view renders next to the submitted values.

use url::Url;

use crate::user::{Login, NewUser};

/// A single rejected field and the reason it was rejected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

pub type FieldErrors = Vec<FieldError>;

fn reject(errors: &mut FieldErrors, field: &'static str, message: &'static str) {
    errors.push(FieldError { field, message });
}

fn check_present(errors: &mut FieldErrors, field: &'static str, value: &str) {
    if value.trim().is_empty() {
        reject(errors, field, "This field is required.");
    }
}

/// Loose syntactic check on an email address: something before and after a
/// single separating `@`, and a dot somewhere in the domain part.
fn valid_email(address: &str) -> bool {
    let mut parts = address.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    !local.is_empty()
        && !domain.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !address.contains(char::is_whitespace)
}

fn valid_image_url(address: &str) -> bool {
    match Url::parse(address) {
        Ok(url) => url.scheme() == "http" || url.scheme() == "https",
        Err(_) => false,
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_present(&mut errors, "email", &self.email);
        if !self.email.trim().is_empty() && !valid_email(&self.email) {
            reject(&mut errors, "email", "Enter a valid email address.");
        }
        check_present(&mut errors, "password", &self.password);
        check_present(&mut errors, "name", &self.name);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<RegisterForm> for NewUser {
    fn from(form: RegisterForm) -> Self {
        NewUser {
            email: form.email,
            password: form.password,
            name: form.name,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl LoginForm {
    /// Presence only; the password gets no format check.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_present(&mut errors, "email", &self.email);
        check_present(&mut errors, "password", &self.password);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl From<LoginForm> for Login {
    fn from(form: LoginForm) -> Self {
        Login {
            email: form.email,
            password: form.password,
        }
    }
}

#[derive(Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub body: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_present(&mut errors, "body", &self.body);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Shared by the new-project and edit-project views.
#[derive(Clone, Default, Deserialize)]
pub struct ProjectForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub img_url: String,
    #[serde(default)]
    pub body: String,
}

impl ProjectForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        check_present(&mut errors, "title", &self.title);
        check_present(&mut errors, "subtitle", &self.subtitle);
        check_present(&mut errors, "img_url", &self.img_url);
        if !self.img_url.trim().is_empty() && !valid_image_url(&self.img_url) {
            reject(&mut errors, "img_url", "Enter a valid http(s) URL.");
        }
        check_present(&mut errors, "body", &self.body);
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_accepts_complete_input() {
        let form = RegisterForm {
            email: "a@x.com".into(),
            password: "secret1".into(),
            name: "A".into(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn register_rejects_missing_fields() {
        let errors = RegisterForm::default().validate().unwrap_err();
        let fields: Vec<_> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["email", "password", "name"]);
    }

    #[test]
    fn register_rejects_malformed_email() {
        for email in &["nodomain", "@x.com", "a@", "a@x", "a b@x.com"] {
            let form = RegisterForm {
                email: (*email).into(),
                password: "secret1".into(),
                name: "A".into(),
            };
            let errors = form.validate().unwrap_err();
            assert_eq!(errors[0].field, "email", "accepted {:?}", email);
        }
    }

    #[test]
    fn login_checks_presence_only() {
        let form = LoginForm {
            email: "not-an-email".into(),
            password: "x".into(),
        };
        assert!(form.validate().is_ok());
        assert!(LoginForm::default().validate().is_err());
    }

    #[test]
    fn comment_rejects_blank_body() {
        let form = CommentForm { body: "  ".into() };
        assert!(form.validate().is_err());
        let form = CommentForm {
            body: "nice post".into(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn project_rejects_bad_image_url() {
        let mut form = ProjectForm {
            title: "Hello".into(),
            subtitle: "sub".into(),
            img_url: "ftp://example.com/x.png".into(),
            body: "text".into(),
        };
        assert_eq!(form.validate().unwrap_err()[0].field, "img_url");
        form.img_url = "https://example.com/x.png".into();
        assert!(form.validate().is_ok());
    }

    #[test]
    fn urlencoded_bodies_decode() {
        let form: ProjectForm =
            serde_urlencoded::from_bytes(b"title=Hello&subtitle=Sub&img_url=https%3A%2F%2Fx.com%2Fa.png&body=Text")
                .unwrap();
        assert_eq!(form.title, "Hello");
        assert!(form.validate().is_ok());
    }
}
