//! A portfolio blog engine.
//!
//! It has the following address scheme:
//! * `/` - List of all projects
//! * `/project/<id>` - Project detail with comments; POST submits a comment
//! * `/about`, `/contact` - Static pages
//! * `/login`, `/register`, `/logout` - Account handling
//! * `/new-project` - Create a project (admin only)
//! * `/edit-project/<id>` - Edit a project (admin only)
//! * `/delete/<id>` - Delete a project and its comments (admin only)

#[macro_use]
extern crate diesel;
#[macro_use]
extern crate diesel_migrations;
#[macro_use]
extern crate serde;

pub mod comment;
pub mod config;
pub mod db;
pub mod document;
pub mod error;
pub mod forms;
pub mod handler;
pub mod project;
pub mod schema;
pub mod user;

pub use crate::db::DbConnection;

use gotham::{
    middleware::cookie::CookieParser,
    middleware::state::StateMiddleware,
    pipeline::new_pipeline,
    pipeline::single::single_pipeline,
    router::builder::{build_router, DefineSingleRoute, DrawRoutes},
    router::Router,
};
use http::status::StatusCode;

use std::path::Path;

use crate::{
    config::Settings,
    handler::{NotFound, ProjectPath},
    user::SessionMiddleware,
};

/// Builds the request router
fn router(settings: Settings) -> Router {
    // Set up shared state
    let connection = DbConnection::from_url(&settings.database_url);
    // Build pipeline
    let (chain, pipelines) = single_pipeline(
        new_pipeline()
            .add(StateMiddleware::new(connection))
            .add(StateMiddleware::new(settings))
            .add(CookieParser)
            .add(SessionMiddleware)
            .build(),
    );

    build_router(chain, pipelines, |route| {
        route.get("/").to(handler!(document::index::index));

        route
            .get("/project/:id")
            .with_path_extractor::<ProjectPath>()
            .to(handler!(document::index::project));
        route
            .post("/project/:id")
            .with_path_extractor::<ProjectPath>()
            .to(body_handler!(document::index::comment_post));

        route.get("/about").to(handler!(document::index::about));
        route.get("/contact").to(handler!(document::index::contact));

        route.get("/login").to(handler!(document::user::login));
        route
            .post("/login")
            .to(body_handler!(document::user::login_post));

        route.get("/register").to(handler!(document::user::register));
        route
            .post("/register")
            .to(body_handler!(document::user::register_post));

        route.get("/logout").to(handler!(document::user::logout));

        route
            .get("/new-project")
            .to(handler!(document::project::new));
        route
            .post("/new-project")
            .to(body_handler!(document::project::new_post));

        route
            .get("/edit-project/:id")
            .with_path_extractor::<ProjectPath>()
            .to(handler!(document::project::edit));
        route
            .post("/edit-project/:id")
            .with_path_extractor::<ProjectPath>()
            .to(body_handler!(document::project::edit_post));

        route
            .get("/delete/:id")
            .with_path_extractor::<ProjectPath>()
            .to(handler!(document::project::delete));

        // Error responders
        route.add_response_extender(StatusCode::NOT_FOUND, NotFound);
    })
}

fn main() -> Result<(), failure::Error> {
    env_logger::init();

    // Read settings
    let path = if Path::new("/etc/folio/folio.toml").is_file() {
        Path::new("/etc/folio/folio.toml")
    } else {
        Path::new("folio.toml")
    };
    let data = std::fs::read(path)?;
    let settings = Settings::from_slice(&data)?;
    let address = settings.host_address.clone();

    log::info!("Running at {}", address);
    gotham::start(address, router(settings));
    Ok(())
}
