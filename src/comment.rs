use comrak::markdown_to_html;
use diesel::prelude::*;

use crate::{
    config::COMRAK_OPTS,
    db::{Connection, DieselResult},
    schema::comments,
};

#[derive(Clone, Debug, Queryable, Identifiable)]
pub struct Comment {
    /// The unique id of this comment
    pub id: i32,
    /// The comment's content
    pub body: String,
    /// The user who submitted the comment
    pub author: i32,
    /// The id of the project this comment belongs to
    pub project: i32,
}

impl Comment {
    /// Renders the body for display. Raw HTML from commenters is stripped.
    pub fn formatted(&self) -> String {
        markdown_to_html(&self.body, &COMRAK_OPTS)
    }
}

#[derive(Clone, Debug, Insertable)]
#[table_name = "comments"]
pub struct NewComment {
    pub body: String,
    pub author: i32,
    pub project: i32,
}

/// A project's comments in insertion order, with each author's display name.
pub fn for_project(
    connection: &Connection,
    project: i32,
) -> DieselResult<Vec<(Comment, String)>> {
    use crate::schema::comments::dsl as c;
    use crate::schema::users::dsl as u;

    c::comments
        .inner_join(u::users)
        .filter(c::project.eq(project))
        .order(c::id.asc())
        .select((comments::all_columns, u::name))
        .load(connection)
}

pub fn submit(connection: &Connection, comment: &NewComment) -> DieselResult<usize> {
    diesel::insert_into(comments::table)
        .values(comment)
        .execute(connection)
}
