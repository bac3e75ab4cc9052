use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use env_logger::Env;

mod config;
mod models;
mod routes;
mod services;

use config::PlannerConfig;
use services::planner_service::TripPlanner;

const HOST: &str = "0.0.0.0";
const PORT: u16 = 8080;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    println!("Application starting...");

    env_logger::init_from_env(Env::default().default_filter_or("info"));

    if cfg!(debug_assertions) {
        dotenv::dotenv().ok();
    }

    let host = std::env::var("HOST").unwrap_or_else(|_| HOST.to_string());
    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| PORT.to_string())
        .parse()
        .unwrap_or(PORT);

    let config = PlannerConfig::from_env().expect("Planner configuration incomplete");
    let planner =
        web::Data::new(TripPlanner::new(config).expect("Failed to initialize planner services"));

    println!("Attempting to bind to {}:{}", host, port);

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header(),
            )
            .route("/health", web::get().to(|| async { "OK" }))
            .app_data(planner.clone())
            .service(
                web::scope("/api").service(
                    web::scope("/itineraries")
                        .route("/build", web::post().to(routes::planner::build))
                        .route("/replan", web::post().to(routes::planner::replan)),
                ),
            )
    })
    .bind((host, port))?
    .run()
    .await
}
