use actix_cors::Cors;
use actix_web::{App, HttpServer, http::header, middleware, web};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use inkpress::{
    api::{
        self, admin, auth, comments, health,
        helpers::{self, AuthorSummary},
        middleware::RequestTagging,
        newsletter, posts, upload, users,
    },
    app_state::AppState,
    config::Config,
    database::{self, models},
};

struct AdminBasicAuth;

impl Modify for AdminBasicAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "admin_basic",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Basic).build()),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        // Auth
        auth::register,
        auth::sign_in,
        auth::sign_out,
        auth::current_session,
        // Posts
        posts::list_posts,
        posts::search_posts,
        posts::get_post_by_slug,
        posts::get_post,
        posts::create_post,
        posts::update_post,
        posts::delete_post,
        // Comments
        comments::list_comments,
        comments::create_comment,
        // Newsletter
        newsletter::subscribe,
        newsletter::list_subscribers,
        // Users
        users::list_users,
        users::list_user_posts,
        // Upload
        upload::upload_image,
        // Admin
        admin::get_site_stats,
        health::health,
    ),
    components(
        schemas(
            // --- Models ---
            models::users::Model,
            models::posts::Model,
            models::comments::Model,
            models::newsletter_subscribers::Model,

            // --- DTOs ---
            AuthorSummary,
            auth::RegisterRequest,
            auth::SignInRequest,
            auth::SessionResponse,
            posts::CreatePostRequest,
            posts::UpdatePostRequest,
            posts::PostView,
            posts::MessageResponse,
            comments::CreateCommentRequest,
            comments::CommentView,
            newsletter::SubscribeRequest,
            newsletter::SubscribeResponse,
            users::UserOverview,
            users::ActivityCounts,
            users::UserPostSummary,
            upload::UploadResponse,
            admin::SiteStats,
            health::HealthResponse,
        )
    ),
    modifiers(&AdminBasicAuth),
    tags(
        (name = "Auth", description = "Account registration and sessions"),
        (name = "Posts", description = "Blog posts"),
        (name = "Comments", description = "Comments on posts"),
        (name = "Newsletter", description = "Newsletter subscriptions"),
        (name = "Users", description = "User listings"),
        (name = "Upload", description = "Image upload"),
        (name = "Admin", description = "Admin dashboard"),
        (name = "Health", description = "Liveness")
    )
)]
struct ApiDoc;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    let config = Config::from_env()
        .map_err(|e| std::io::Error::other(format!("Failed to load configuration: {}", e)))?;
    let db = database::connect().await?;

    if config.admin_credentials().is_none() {
        log::warn!("ADMIN_USERNAME/ADMIN_PASSWORD not set; admin endpoints are disabled");
    }

    let host = config.host.clone();
    let port = config.port;
    let state = web::Data::new(AppState {
        db,
        config: config.clone(),
    });

    log::info!("Starting server at http://{}:{}", host, port);
    log::info!("Swagger UI available at http://{}:{}/swagger-ui/", host, port);

    HttpServer::new(move || {
        let cors = match config.cors_origin.as_deref() {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
                .allowed_headers(vec![header::CONTENT_TYPE, header::AUTHORIZATION])
                .supports_credentials()
                .max_age(3600),
            None => Cors::default(),
        };

        App::new()
            .wrap(middleware::NormalizePath::trim())
            .wrap(RequestTagging)
            .wrap(middleware::Logger::default())
            .wrap(cors)
            .app_data(state.clone())
            .app_data(helpers::json_config(config.effective_max_body_bytes()))
            .app_data(helpers::query_config())
            .service(web::scope("/api").configure(api::init_routes))
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-docs/openapi.json", ApiDoc::openapi()),
            )
    })
    .workers(num_cpus::get())
    .bind((host, port))?
    .run()
    .await
}
