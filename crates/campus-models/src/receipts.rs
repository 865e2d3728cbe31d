//! Fee receipt models.

use crate::ids::{FeeReceiptId, UserId};
use crate::serde::truncate_chars;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Object storage bucket holding receipt files.
pub const FEE_RECEIPTS_BUCKET: &str = "fee-receipts";
pub const MAX_RECEIPT_NAME_CHARS: usize = 200;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FeeReceipt {
    pub id: FeeReceiptId,
    pub student_id: UserId,
    pub receipt_name: String,
    pub amount: f64,
    pub file_path: String,
    #[serde(default)]
    pub uploaded_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl FeeReceipt {
    /// File name shown to the user when downloading.
    pub fn download_name(&self) -> &str {
        self.file_path
            .rsplit('/')
            .next()
            .and_then(|name| name.split_once('_').map(|(_, original)| original))
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.receipt_name)
    }
}

/// Admin upload form.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct UploadReceiptDto {
    pub student_id: UserId,
    #[validate(length(min = 1, message = "Receipt name is required"))]
    pub receipt_name: String,
    #[validate(range(min = 0.01, message = "Amount must be greater than zero"))]
    pub amount: f64,
    #[validate(length(min = 1, message = "A file is required"))]
    pub file_name: String,
}

impl UploadReceiptDto {
    pub fn normalized(mut self) -> Self {
        self.receipt_name = truncate_chars(self.receipt_name.trim(), MAX_RECEIPT_NAME_CHARS);
        self.file_name = self.file_name.trim().to_string();
        self
    }
}

/// Object key for an uploaded receipt: `<student_id>/<unix_millis>_<file_name>`.
pub fn receipt_storage_path(
    student_id: UserId,
    uploaded_at: DateTime<Utc>,
    file_name: &str,
) -> String {
    let file_name = file_name.rsplit(['/', '\\']).next().unwrap_or(file_name);
    format!(
        "{}/{}_{}",
        student_id,
        uploaded_at.timestamp_millis(),
        file_name
    )
}

/// Insert body for `fee_receipts`.
#[derive(Debug, Clone, Serialize)]
pub struct NewFeeReceipt {
    pub student_id: UserId,
    pub receipt_name: String,
    pub amount: f64,
    pub file_path: String,
    pub uploaded_by: UserId,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_storage_path_layout() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        let path = receipt_storage_path(UserId::from_u128(5), at, "fees.pdf");
        assert_eq!(
            path,
            "00000000-0000-0000-0000-000000000005/1700000000123_fees.pdf"
        );
    }

    #[test]
    fn test_storage_path_strips_directories() {
        let at = Utc.timestamp_millis_opt(1).unwrap();
        let path = receipt_storage_path(UserId::from_u128(5), at, "/home/admin/fees.pdf");
        assert!(path.ends_with("/1_fees.pdf"));
    }

    #[test]
    fn test_upload_validation() {
        let dto = UploadReceiptDto {
            student_id: UserId::from_u128(1),
            receipt_name: format!("  {}  ", "n".repeat(300)),
            amount: 1500.0,
            file_name: "fees.pdf".into(),
        }
        .normalized();
        assert_eq!(dto.receipt_name.chars().count(), 200);
        assert!(dto.validate().is_ok());

        let dto = UploadReceiptDto {
            student_id: UserId::from_u128(1),
            receipt_name: "Term 1".into(),
            amount: 0.0,
            file_name: "fees.pdf".into(),
        };
        assert!(dto.validate().is_err());
    }

    #[test]
    fn test_download_name() {
        let receipt = FeeReceipt {
            id: FeeReceiptId::from_u128(1),
            student_id: UserId::from_u128(2),
            receipt_name: "Term 1".into(),
            amount: 10.0,
            file_path: "abc/1700_term_one.pdf".into(),
            uploaded_by: None,
            created_at: Utc::now(),
        };
        assert_eq!(receipt.download_name(), "term_one.pdf");
    }
}
