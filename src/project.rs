use chrono::Utc;
use comrak::markdown_to_html;
use diesel::prelude::*;
use diesel::Connection as _;

use crate::{
    config::COMRAK_PROJECT_OPTS,
    db::{Connection, DieselResult},
    schema::projects,
};

#[derive(Debug, Queryable, Identifiable)]
pub struct Project {
    /// The project's numeric id
    pub id: i32,
    /// The title of the project, unique across the site
    pub title: String,
    pub subtitle: String,
    /// The body, markdown with embedded HTML allowed
    pub body: String,
    /// Display date, stamped once at creation
    pub date: String,
    /// Address of the project's banner image
    pub img_url: String,
    /// Id of the authoring user
    pub author: i32,
}

impl Project {
    /// Renders the body for display.
    pub fn formatted(&self) -> String {
        markdown_to_html(&self.body, &COMRAK_PROJECT_OPTS)
    }
}

/// Field set shared by project creation and editing.
#[derive(Insertable, AsChangeset)]
#[table_name = "projects"]
pub struct ProjectChanges {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub date: String,
    pub img_url: String,
    pub author: i32,
}

/// The display date stored on newly created projects, e.g. "August 29, 2026".
pub fn stamp_date() -> String {
    Utc::now().format("%B %d, %Y").to_string()
}

/// All projects in insertion order, with each author's display name.
pub fn list_with_authors(connection: &Connection) -> DieselResult<Vec<(Project, String)>> {
    use crate::schema::projects::dsl as p;
    use crate::schema::users::dsl as u;

    p::projects
        .inner_join(u::users)
        .order(p::id.asc())
        .select((projects::all_columns, u::name))
        .load(connection)
}

/// The project with the given id, `NotFound` otherwise.
pub fn get(connection: &Connection, id: i32) -> DieselResult<Project> {
    use crate::schema::projects::dsl;

    dsl::projects.find(id).first(connection)
}

/// Display name of the project's author.
pub fn author_name(connection: &Connection, project: &Project) -> DieselResult<String> {
    use crate::schema::users::dsl;

    dsl::users
        .find(project.author)
        .select(dsl::name)
        .first(connection)
}

pub fn submit(connection: &Connection, project: &ProjectChanges) -> DieselResult<usize> {
    diesel::insert_into(projects::table)
        .values(project)
        .execute(connection)
}

pub fn edit(connection: &Connection, id: i32, changes: &ProjectChanges) -> DieselResult<usize> {
    use crate::schema::projects::dsl;

    diesel::update(dsl::projects.find(id))
        .set(changes)
        .execute(connection)
}

/// Removes a project and its comments. Both deletes happen in one
/// transaction so a failure can't leave orphaned comment rows behind.
pub fn delete(connection: &Connection, id: i32) -> DieselResult<usize> {
    use crate::schema::comments::dsl as c;
    use crate::schema::projects::dsl as p;

    connection.transaction(|| {
        diesel::delete(c::comments.filter(c::project.eq(id))).execute(connection)?;
        diesel::delete(p::projects.find(id)).execute(connection)
    })
}

#[cfg(test)]
mod tests {
    use super::stamp_date;

    #[test]
    fn stamped_date_parses_back() {
        let stamped = stamp_date();
        assert!(chrono::NaiveDate::parse_from_str(&stamped, "%B %d, %Y").is_ok());
    }
}
