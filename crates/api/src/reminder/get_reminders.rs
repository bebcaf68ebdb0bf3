use crate::error::CallmeError;
use crate::shared::usecase::{execute, UseCase};
use actix_web::{web, HttpResponse};
use callme_api_structs::get_reminders::*;
use callme_domain::{Reminder, ReminderStatus};
use callme_infra::{CallmeContext, ReminderFindQuery};

const DEFAULT_PER_PAGE: usize = 10;
const MAX_PER_PAGE: usize = 100;

fn handle_error(e: UseCaseError) -> CallmeError {
    match e {
        UseCaseError::InvalidPagination => CallmeError::BadClientData(format!(
            "page must be >= 1 and perPage must be between 1 and {}",
            MAX_PER_PAGE
        )),
        UseCaseError::StorageError => CallmeError::InternalError,
    }
}

pub async fn get_reminders_controller(
    query_params: web::Query<QueryParams>,
    ctx: web::Data<CallmeContext>,
) -> Result<HttpResponse, CallmeError> {
    let query_params = query_params.0;
    let page = query_params.page.unwrap_or(1);
    let per_page = query_params.per_page.unwrap_or(DEFAULT_PER_PAGE);

    let usecase = GetRemindersUseCase {
        page,
        per_page,
        status: query_params.status,
        search: query_params.search,
    };

    execute(usecase, &ctx)
        .await
        .map(|paged| {
            HttpResponse::Ok().json(APIResponse::new(paged.reminders, paged.total, page, per_page))
        })
        .map_err(handle_error)
}

#[derive(Debug)]
pub struct GetRemindersUseCase {
    /// 1-based page number
    pub page: usize,
    pub per_page: usize,
    pub status: Option<ReminderStatus>,
    pub search: Option<String>,
}

#[derive(Debug)]
pub struct PagedReminders {
    pub reminders: Vec<Reminder>,
    pub total: usize,
}

#[derive(Debug, PartialEq)]
pub enum UseCaseError {
    InvalidPagination,
    StorageError,
}

#[async_trait::async_trait(?Send)]
impl UseCase for GetRemindersUseCase {
    type Response = PagedReminders;

    type Error = UseCaseError;

    const NAME: &'static str = "GetReminders";

    async fn execute(&mut self, ctx: &CallmeContext) -> Result<Self::Response, Self::Error> {
        if self.page < 1 || self.per_page < 1 || self.per_page > MAX_PER_PAGE {
            return Err(UseCaseError::InvalidPagination);
        }

        let query = ReminderFindQuery {
            status: self.status,
            search: self.search.clone(),
            skip: (self.page - 1) * self.per_page,
            limit: self.per_page,
        };
        let (reminders, total) = ctx
            .repos
            .reminders
            .find_by_query(query)
            .await
            .map_err(|_| UseCaseError::StorageError)?;

        Ok(PagedReminders { reminders, total })
    }
}
