use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::config::AppConfig;
use crate::handlers;
use crate::state::AppState;

pub fn routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .merge(auth_routes())
        .merge(user_routes())
        .merge(collection_routes())
        .merge(photo_routes())
        .merge(upload_routes(config))
        .routes(routes!(handlers::titles::generate_title))
}

fn auth_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::auth::register))
        .routes(routes!(handlers::auth::login))
        .routes(routes!(handlers::auth::logout))
        .routes(routes!(handlers::auth::me))
        .routes(routes!(handlers::auth::change_password))
}

fn user_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::users::list_users))
        .routes(routes!(handlers::users::delete_user))
}

fn collection_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::collections::list_collections,
            handlers::collections::create_collection
        ))
        .routes(routes!(handlers::collections::collection_events))
        .routes(routes!(
            handlers::collections::get_collection,
            handlers::collections::update_collection,
            handlers::collections::delete_collection
        ))
}

fn photo_routes() -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(handlers::photos::add_photos))
        .routes(routes!(handlers::photos::reorder_photos))
        .routes(routes!(
            handlers::photos::update_photo,
            handlers::photos::delete_photo
        ))
        .routes(routes!(handlers::photos::add_variants))
        .routes(routes!(handlers::photos::delete_variant))
}

fn upload_routes(config: &AppConfig) -> OpenApiRouter<AppState> {
    OpenApiRouter::new()
        .routes(routes!(
            handlers::upload::upload_files,
            handlers::upload::delete_uploads
        ))
        .layer(handlers::upload::upload_body_limit(
            config.storage.max_blob_size,
        ))
}
