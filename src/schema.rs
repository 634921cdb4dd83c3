table! {
    comments (id) {
        id -> Int4,
        body -> Text,
        author -> Int4,
        project -> Int4,
    }
}

table! {
    projects (id) {
        id -> Int4,
        title -> Varchar,
        subtitle -> Varchar,
        body -> Text,
        date -> Varchar,
        img_url -> Varchar,
        author -> Int4,
    }
}

table! {
    sessions (id) {
        id -> Varchar,
        user -> Int4,
        expires -> Timestamp,
    }
}

table! {
    use diesel::sql_types::*;
    use crate::user::RoleMapping;

    users (id) {
        id -> Int4,
        email -> Varchar,
        name -> Varchar,
        hash -> Varchar,
        salt -> Bytea,
        role -> RoleMapping,
    }
}

joinable!(comments -> projects (project));
joinable!(comments -> users (author));
joinable!(projects -> users (author));
joinable!(sessions -> users (user));

allow_tables_to_appear_in_same_query!(comments, projects, sessions, users,);
