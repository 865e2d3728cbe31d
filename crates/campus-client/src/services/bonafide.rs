use campus_models::{
    BonafideRequest, BonafideRequestId, BonafideReview, CreateBonafideRequestDto,
    NewBonafideRequest, ReviewDecision, UserId,
};
use tracing::{info, instrument};
use validator::Validate;

use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};

/// Bonafide certificate requests. Students see their own, faculty see all.
#[derive(Clone)]
pub struct BonafideService {
    client: BackendClient,
}

impl BonafideService {
    pub fn new(client: BackendClient) -> Self {
        Self { client }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<BonafideRequest>, ServiceError> {
        let query = TableQuery::from(tables::BONAFIDE_REQUESTS)
            .select("*")
            .order_desc("created_at");
        Ok(self.client.select(&query).await?)
    }

    #[instrument(skip(self, dto))]
    pub async fn submit(
        &self,
        student: UserId,
        dto: CreateBonafideRequestDto,
    ) -> Result<BonafideRequest, ServiceError> {
        let dto = dto.normalized();
        dto.validate()?;
        let request: BonafideRequest = self
            .client
            .insert(
                tables::BONAFIDE_REQUESTS,
                &NewBonafideRequest::from_dto(dto, student),
            )
            .await?;
        info!(request_id = %request.id, "bonafide request submitted");
        Ok(request)
    }

    #[instrument(skip(self, remarks))]
    pub async fn review(
        &self,
        id: BonafideRequestId,
        decision: ReviewDecision,
        remarks: &str,
        reviewer: UserId,
    ) -> Result<BonafideRequest, ServiceError> {
        let review = BonafideReview::new(decision, remarks, reviewer);
        let query = TableQuery::from(tables::BONAFIDE_REQUESTS).eq("id", id);
        let updated: Vec<BonafideRequest> = self.client.update(&query, &review).await?;
        let request = updated
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("Request"))?;
        info!(request_id = %id, status = request.status.as_str(), "bonafide request reviewed");
        Ok(request)
    }
}
