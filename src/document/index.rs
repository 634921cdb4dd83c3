//! The public pages: project list, project detail with comments, about and
//! contact.

use askama::Template;
use gotham::state::{FromState, State};

use super::{clear_flash, flash_message, see_other, DocumentResult, TemplateExt};
use crate::{
    comment::{self, NewComment},
    forms::{CommentForm, FieldErrors},
    handler::ProjectPath,
    project::{self, Project},
    user::{self, User},
    DbConnection,
};

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    user: Option<User>,
    projects: Vec<ProjectEntry>,
}

pub struct ProjectEntry {
    pub project: Project,
    pub author: String,
}

pub fn index(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let user = user::current(state, connection)?;

    let projects = project::list_with_authors(connection)?
        .into_iter()
        .map(|(project, author)| ProjectEntry { project, author })
        .collect();

    let template = IndexTemplate { user, projects };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "about.html")]
pub struct AboutTemplate {
    user: Option<User>,
}

pub fn about(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let template = AboutTemplate {
        user: user::current(state, connection)?,
    };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "contact.html")]
pub struct ContactTemplate {
    user: Option<User>,
}

pub fn contact(state: &State) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let template = ContactTemplate {
        user: user::current(state, connection)?,
    };
    Ok(template.to_response(state))
}

#[derive(Template)]
#[template(path = "project.html")]
pub struct ProjectTemplate {
    user: Option<User>,
    project: Project,
    author: String,
    comments: Vec<CommentView>,
    form: CommentForm,
    errors: FieldErrors,
    flash: Option<String>,
}

pub struct CommentView {
    pub author: String,
    pub html: String,
}

fn project_page(
    state: &State,
    id: i32,
    form: CommentForm,
    errors: FieldErrors,
) -> DocumentResult {
    let connection = &DbConnection::from_state(state)?;
    let user = user::current(state, connection)?;

    let project = project::get(connection, id)?;
    let author = project::author_name(connection, &project)?;
    let comments = comment::for_project(connection, project.id)?
        .into_iter()
        .map(|(comment, author)| CommentView {
            author,
            html: comment.formatted(),
        })
        .collect();

    let flash = flash_message(state);
    let had_flash = flash.is_some();
    let template = ProjectTemplate {
        user,
        project,
        author,
        comments,
        form,
        errors,
        flash,
    };
    let mut response = template.to_response(state);
    if had_flash {
        clear_flash(&mut response)?;
    }
    Ok(response)
}

pub fn project(state: &State) -> DocumentResult {
    let id = ProjectPath::borrow_from(state).id;
    project_page(state, id, CommentForm::default(), FieldErrors::new())
}

/// Comment submission on the detail page. Validation failures re-render the
/// page with the submitted text; anonymous submitters get bounced to login by
/// the `require_user` guard.
pub fn comment_post(state: &State, post: Vec<u8>) -> DocumentResult {
    let id = ProjectPath::borrow_from(state).id;
    let form: CommentForm = serde_urlencoded::from_bytes(&post)?;

    if let Err(errors) = form.validate() {
        return project_page(state, id, form, errors);
    }

    {
        let connection = &DbConnection::from_state(state)?;
        let user = user::require_user(state, connection)?;
        // 404 before insert when the project id is stale
        let project = project::get(connection, id)?;

        comment::submit(
            connection,
            &NewComment {
                body: form.body,
                author: user.id,
                project: project.id,
            },
        )?;
    }

    Ok(see_other(state, format!("/project/{}", id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_page_escapes_user_supplied_names() {
        let template = ProjectTemplate {
            user: None,
            project: Project {
                id: 1,
                title: "Announcing".into(),
                subtitle: "A start".into(),
                body: "Plain text".into(),
                date: "August 29, 2026".into(),
                img_url: "https://example.com/banner.png".into(),
                author: 1,
            },
            author: "Admin".into(),
            comments: vec![CommentView {
                author: "<script>alert(1)</script>".into(),
                html: "<p>Looks good</p>\n".into(),
            }],
            form: CommentForm::default(),
            errors: FieldErrors::new(),
            flash: None,
        };

        let html = template.render().unwrap();
        // Display names render inert while rendered comment bodies stay HTML
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(html.contains("<p>Looks good</p>"));
    }
}
