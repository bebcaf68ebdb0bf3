use crate::job_schedulers::ReminderJobScheduler;
use actix_web::{web, HttpResponse};
use callme_api_structs::get_service_health::*;
use callme_infra::CallmeContext;

async fn status(
    ctx: web::Data<CallmeContext>,
    scheduler: web::Data<ReminderJobScheduler>,
) -> HttpResponse {
    let call_client_configured = ctx.call_client.is_configured();
    let call_client_reachable = ctx.call_client.health_check().await;
    HttpResponse::Ok().json(APIResponse {
        message: "Yo! We are up!\r\n".into(),
        scheduler_running: scheduler.is_running(),
        call_client_configured,
        call_client_reachable,
    })
}

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(status));
}
