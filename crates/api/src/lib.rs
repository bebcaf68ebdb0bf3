mod error;
mod job_schedulers;
mod reminder;
mod shared;
mod status;

pub use job_schedulers::ReminderJobScheduler;

use actix_cors::Cors;
use actix_web::{dev::Server, middleware, web, App, HttpServer};
use callme_infra::CallmeContext;
use std::net::TcpListener;
use tracing_actix_web::TracingLogger;

pub fn configure_server_api(cfg: &mut web::ServiceConfig) {
    job_schedulers::configure_routes(cfg);
    reminder::configure_routes(cfg);
    status::configure_routes(cfg);
}

pub struct Application {
    server: Server,
    port: u16,
    scheduler: ReminderJobScheduler,
}

impl Application {
    pub async fn new(context: CallmeContext) -> Result<Self, std::io::Error> {
        let scheduler = ReminderJobScheduler::new(context.clone());
        let (server, port) = Application::configure_server(context, scheduler.clone()).await?;
        scheduler.start();

        Ok(Self {
            server,
            port,
            scheduler,
        })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    async fn configure_server(
        context: CallmeContext,
        scheduler: ReminderJobScheduler,
    ) -> Result<(Server, u16), std::io::Error> {
        let port = context.config.port;
        let address = format!("0.0.0.0:{}", port);
        let listener = TcpListener::bind(&address)?;
        let port = listener.local_addr()?.port();

        let server = HttpServer::new(move || {
            let ctx = context.clone();
            let scheduler = scheduler.clone();

            App::new()
                .wrap(Cors::permissive())
                .wrap(middleware::Compress::default())
                .wrap(TracingLogger::default())
                .app_data(web::Data::new(ctx))
                .app_data(web::Data::new(scheduler))
                .service(web::scope("/api/v1").configure(configure_server_api))
        })
        .listen(listener)?
        .workers(4)
        .run();

        Ok((server, port))
    }

    pub async fn start(self) -> Result<(), std::io::Error> {
        let res = self.server.await;
        // Let the poll loop wind down before the process exits
        self.scheduler.stop();
        res
    }
}
