use std::sync::Arc;

use campus_models::receipts::{FEE_RECEIPTS_BUCKET, receipt_storage_path};
use campus_models::{FeeReceipt, FeeReceiptId, NewFeeReceipt, UploadReceiptDto, UserId};
use chrono::Utc;
use tracing::{info, instrument, warn};
use validator::Validate;

use crate::error::ServiceError;
use crate::http::BackendClient;
use crate::query::{TableQuery, tables};
use crate::storage::ObjectStorage;

/// Fee receipts: a table row plus the uploaded file in the receipts bucket.
#[derive(Clone)]
pub struct ReceiptService {
    client: BackendClient,
    storage: Arc<dyn ObjectStorage>,
}

impl ReceiptService {
    pub fn new(client: BackendClient, storage: Arc<dyn ObjectStorage>) -> Self {
        Self { client, storage }
    }

    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<FeeReceipt>, ServiceError> {
        let query = TableQuery::from(tables::FEE_RECEIPTS)
            .select("*")
            .order_desc("created_at");
        Ok(self.client.select(&query).await?)
    }

    /// Stores the file, then records it. The file is removed again if the
    /// row cannot be written.
    #[instrument(skip(self, dto, content), fields(student_id = %dto.student_id, bytes = content.len()))]
    pub async fn upload(
        &self,
        uploader: UserId,
        dto: UploadReceiptDto,
        content: Vec<u8>,
    ) -> Result<FeeReceipt, ServiceError> {
        let dto = dto.normalized();
        dto.validate()?;

        let file_path = receipt_storage_path(dto.student_id, Utc::now(), &dto.file_name);
        self.storage
            .upload(FEE_RECEIPTS_BUCKET, &file_path, content)
            .await?;

        let row = NewFeeReceipt {
            student_id: dto.student_id,
            receipt_name: dto.receipt_name,
            amount: dto.amount,
            file_path: file_path.clone(),
            uploaded_by: uploader,
        };
        match self.client.insert::<_, FeeReceipt>(tables::FEE_RECEIPTS, &row).await {
            Ok(receipt) => {
                info!(receipt_id = %receipt.id, "fee receipt uploaded");
                Ok(receipt)
            }
            Err(e) => {
                if let Err(cleanup) = self.storage.delete(FEE_RECEIPTS_BUCKET, &file_path).await {
                    warn!(error = %cleanup, %file_path, "orphaned receipt file");
                }
                Err(e.into())
            }
        }
    }

    /// Receipt row and file contents.
    #[instrument(skip(self))]
    pub async fn download(&self, id: FeeReceiptId) -> Result<(FeeReceipt, Vec<u8>), ServiceError> {
        let query = TableQuery::from(tables::FEE_RECEIPTS)
            .select("*")
            .eq("id", id);
        let receipt = self
            .client
            .select::<FeeReceipt>(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(ServiceError::NotFound("Receipt"))?;
        let content = self
            .storage
            .download(FEE_RECEIPTS_BUCKET, &receipt.file_path)
            .await?;
        Ok((receipt, content))
    }
}
