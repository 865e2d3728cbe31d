use campus_models::AuditLog;
use campus_models::audit::AUDIT_LOG_PAGE_LIMIT;
use tracing::instrument;

use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

#[derive(Clone)]
pub struct AuditService {
    client: BackendClient,
}

impl AuditService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    /// Most recent entries, filtered locally by `search` on action, role or user id.
    #[instrument(skip(self))]
    pub async fn list(&self, search: &str) -> Result<Vec<AuditLog>, ServiceError> {
        let query = TableQuery::from(tables::AUDIT_LOGS)
            .select("*")
            .order_desc("created_at")
            .limit(AUDIT_LOG_PAGE_LIMIT);
        let logs: Vec<AuditLog> = self.client.select(&query).await?;
        Ok(filter_logs(logs, search))
    }
}

fn filter_logs(logs: Vec<AuditLog>, search: &str) -> Vec<AuditLog> {
    logs.into_iter().filter(|log| log.matches(search)).collect()
}
