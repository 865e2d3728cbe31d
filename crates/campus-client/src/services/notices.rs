use campus_models::{CreateNoticeDto, NewNotice, Notice, NoticeId, Role, UserId};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

#[derive(Clone)]
pub struct NoticeService {
    client: BackendClient,
}

impl NoticeService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Newest first. With `audience`, only notices addressed to that role.
    #[instrument(skip(self))]
    pub async fn list(&self, audience: Option<Role>) -> Result<Vec<Notice>, ServiceError> {
        Ok(self.client.select(&list_query(audience)).await?)
    }

    #[instrument(skip(self, dto))]
    pub async fn create(&self, author: UserId, dto: CreateNoticeDto) -> Result<Notice, ServiceError> {
        let dto = dto.normalized();
        dto.validate()?;
        let notice: Notice = self
            .client
            .insert(tables::NOTICES, &NewNotice::from_dto(dto, author))
            .await?;
        info!(notice_id = %notice.id, "notice published");
        Ok(notice)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: NoticeId) -> Result<(), ServiceError> {
        self.client
            .delete(&TableQuery::from(tables::NOTICES).eq("id", id))
            .await?;
        info!(notice_id = %id, "notice deleted");
        Ok(())
    }
}

fn list_query(audience: Option<Role>) -> TableQuery {
    let query = TableQuery::from(tables::NOTICES).select("*");
    let query = match audience {
        Some(role) => query.contains("target_audience", [role]),
        None => query,
    };
    query.order_desc("created_at")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query() {
        assert_eq!(
            list_query(None).path(),
            "notices?select=*&order=created_at.desc"
        );
        assert_eq!(
            list_query(Some(Role::Student)).path(),
            "notices?select=*&target_audience=cs.{student}&order=created_at.desc"
        );
    }
}
