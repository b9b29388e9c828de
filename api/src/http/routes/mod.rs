/// Route modules

pub mod auth;
pub mod dashboard;
pub mod listings;
pub mod pages;
pub mod purchases;
pub mod system;
pub mod transactions;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/healthz", web::get().to(system::healthz))
        .route("/readyz", web::get().to(system::readyz))
        .route("/version", web::get().to(system::version))
        .service(
            web::scope("/api-docs").route("/openapi.json", web::get().to(system::openapi_json)),
        )
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .route("/register", web::post().to(auth::register))
                        .route("/login", web::post().to(auth::login))
                        .route("/logout", web::post().to(auth::logout))
                        .route("/refresh", web::post().to(auth::refresh))
                        .route("/session", web::get().to(auth::session))
                        .route("/verify", web::get().to(auth::verify)),
                )
                .service(
                    web::scope("/listings")
                        .route("", web::get().to(listings::list_listings))
                        .route("", web::post().to(listings::create_listing))
                        .route("/categories", web::get().to(listings::list_categories))
                        .route("/mine", web::get().to(listings::my_listings))
                        .route("/{id}", web::get().to(listings::get_listing)),
                )
                .service(
                    web::scope("/purchases")
                        .route("", web::post().to(purchases::open_purchase))
                        .route("/{id}", web::get().to(purchases::get_purchase))
                        .route("/{id}", web::delete().to(purchases::close_purchase))
                        .route("/{id}/wallet", web::post().to(purchases::connect_wallet))
                        .route("/{id}/payment", web::post().to(purchases::pay))
                        .route("/{id}/reset", web::post().to(purchases::reset_purchase)),
                )
                .route("/transactions", web::get().to(transactions::list_transactions))
                .route("/dashboard", web::get().to(dashboard::dashboard))
                .route("/pages/resolve", web::get().to(pages::resolve_page)),
        );
}
