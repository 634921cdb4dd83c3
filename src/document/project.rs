//! Admin gated project authoring: create, edit, delete.

use askama::Template;
use gotham::state::{FromState, State};

use super::{see_other, DocumentResult, TemplateExt};
use crate::{
    forms::{FieldErrors, ProjectForm},
    handler::ProjectPath,
    project::{self, ProjectChanges},
    user::{self, User},
    DbConnection,
};

#[derive(Template)]
#[template(path = "make-project.html")]
pub struct ProjectFormTemplate {
    user: Option<User>,
    form: ProjectForm,
    errors: FieldErrors,
    is_edit: bool,
    action: String,
}

fn form_page(
    state: &State,
    user: User,
    form: ProjectForm,
    errors: FieldErrors,
    edit_id: Option<i32>,
) -> DocumentResult {
    let template = ProjectFormTemplate {
        is_edit: edit_id.is_some(),
        action: match edit_id {
            Some(id) => format!("/edit-project/{}", id),
            None => "/new-project".to_owned(),
        },
        user: Some(user),
        form,
        errors,
    };
    Ok(template.to_response(state))
}

pub fn new(state: &State) -> DocumentResult {
    let admin = {
        let connection = &DbConnection::from_state(state)?;
        user::require_admin(state, connection)?
    };
    form_page(state, admin, ProjectForm::default(), FieldErrors::new(), None)
}

pub fn new_post(state: &State, post: Vec<u8>) -> DocumentResult {
    let form: ProjectForm = serde_urlencoded::from_bytes(&post)?;
    {
        let connection = &DbConnection::from_state(state)?;
        let admin = user::require_admin(state, connection)?;

        if let Err(errors) = form.validate() {
            return form_page(state, admin, form, errors, None);
        }

        project::submit(
            connection,
            &ProjectChanges {
                title: form.title,
                subtitle: form.subtitle,
                body: form.body,
                date: project::stamp_date(),
                img_url: form.img_url,
                author: admin.id,
            },
        )?;
    }
    Ok(see_other(state, "/".to_owned()))
}

/// Prefills the authoring form with the stored project.
pub fn edit(state: &State) -> DocumentResult {
    let id = ProjectPath::borrow_from(state).id;
    let (admin, form) = {
        let connection = &DbConnection::from_state(state)?;
        let admin = user::require_admin(state, connection)?;
        let project = project::get(connection, id)?;
        let form = ProjectForm {
            title: project.title,
            subtitle: project.subtitle,
            img_url: project.img_url,
            body: project.body,
        };
        (admin, form)
    };
    form_page(state, admin, form, FieldErrors::new(), Some(id))
}

/// Rewrites the project's fields in place; the display date stays as it was
/// stamped at creation, while authorship moves to the editing user.
pub fn edit_post(state: &State, post: Vec<u8>) -> DocumentResult {
    let id = ProjectPath::borrow_from(state).id;
    let form: ProjectForm = serde_urlencoded::from_bytes(&post)?;
    {
        let connection = &DbConnection::from_state(state)?;
        let admin = user::require_admin(state, connection)?;
        let project = project::get(connection, id)?;

        if let Err(errors) = form.validate() {
            return form_page(state, admin, form, errors, Some(id));
        }

        project::edit(
            connection,
            id,
            &ProjectChanges {
                title: form.title,
                subtitle: form.subtitle,
                body: form.body,
                date: project.date,
                img_url: form.img_url,
                author: admin.id,
            },
        )?;
    }
    Ok(see_other(state, format!("/project/{}", id)))
}

pub fn delete(state: &State) -> DocumentResult {
    let id = ProjectPath::borrow_from(state).id;
    {
        let connection = &DbConnection::from_state(state)?;
        user::require_admin(state, connection)?;
        // get-or-fail keeps the 404 behavior for stale ids
        project::get(connection, id)?;
        project::delete(connection, id)?;
    }
    Ok(see_other(state, "/".to_owned()))
}
