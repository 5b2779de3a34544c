use actix_files as fs;
use actix_web::{get, middleware::Logger, web, App, HttpResponse, HttpServer, Result as ActixResult};
use clap::Parser;
use filedeck::{HostConfig, DEFAULT_API_BASE};

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Serves the filedeck browser client and tells it where the file API lives.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Address to listen on
    #[arg(long, env = "FILEDECK_BIND", default_value = "127.0.0.1:3000")]
    bind: String,

    /// Base URL of the file server; the client appends /files
    #[arg(long, env = "FILEDECK_API_BASE", default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Directory with static assets served under /static
    #[arg(long, env = "FILEDECK_STATIC_DIR", default_value = "./static")]
    static_dir: String,

    /// Directory with the wasm-pack output served under /pkg
    #[arg(long, env = "FILEDECK_PKG_DIR", default_value = "./pkg")]
    pkg_dir: String,

    /// Enable debug mode in the client
    #[arg(long, env = "FILEDECK_DEBUG")]
    debug: bool,
}

impl Args {
    fn host_config(&self) -> HostConfig {
        HostConfig {
            api_base: self.api_base.trim().trim_end_matches('/').to_string(),
            debug_mode: self.debug,
        }
    }
}

// Client routes are resolved in the browser, so every unknown path gets the app shell.
async fn index() -> HttpResponse {
    HttpResponse::Ok().content_type("text/html; charset=utf-8").body(INDEX_HTML)
}

#[get("/config")]
async fn get_config(config: web::Data<HostConfig>) -> ActixResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(config.get_ref()))
}

fn configure(
    config: HostConfig,
    static_dir: String,
    pkg_dir: String,
) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(web::Data::new(config))
            .service(get_config)
            .service(fs::Files::new("/pkg", pkg_dir))
            .service(fs::Files::new("/static", static_dir))
            .default_service(web::route().to(index));
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = args.host_config();
    log::info!("serving filedeck at http://{}", args.bind);
    log::info!("file API: {}/files", config.api_base);
    if config.debug_mode {
        log::info!("debug mode enabled");
    }

    let Args {
        bind,
        static_dir,
        pkg_dir,
        ..
    } = args;

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .configure(configure(config.clone(), static_dir.clone(), pkg_dir.clone()))
    })
    .bind(bind)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::StatusCode;
    use actix_web::test::{
        call_and_read_body_json, call_service, init_service, read_body, TestRequest,
    };

    fn app_config(debug: bool) -> impl FnOnce(&mut web::ServiceConfig) {
        configure(
            HostConfig {
                api_base: "http://files.local:8080".to_string(),
                debug_mode: debug,
            },
            "./static".to_string(),
            "./pkg".to_string(),
        )
    }

    #[test]
    fn args_normalise_api_base() {
        let args = Args::parse_from([
            "filedeck",
            "--api-base",
            "http://files.local:8080/",
            "--debug",
        ]);
        assert_eq!(
            args.host_config(),
            HostConfig {
                api_base: "http://files.local:8080".to_string(),
                debug_mode: true,
            }
        );
        assert_eq!(args.bind, "127.0.0.1:3000");
    }

    #[actix_web::test]
    async fn config_endpoint_reports_api_base_and_debug() {
        let app = init_service(App::new().configure(app_config(true))).await;

        let req = TestRequest::get().uri("/config").to_request();
        let config: HostConfig = call_and_read_body_json(&app, req).await;

        assert_eq!(config.api_base, "http://files.local:8080");
        assert!(config.debug_mode);
    }

    #[actix_web::test]
    async fn client_routes_fall_back_to_index() {
        let app = init_service(App::new().configure(app_config(false))).await;

        for path in ["/", "/upload", "/preview/a.txt"] {
            let req = TestRequest::get().uri(path).to_request();
            let resp = call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK, "{path}");

            let body = read_body(resp).await;
            assert!(std::str::from_utf8(&body).unwrap().contains("filedeck"));
        }
    }
}
