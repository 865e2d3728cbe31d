pub mod users;

pub use self::users::store::{CredentialAdmin, PgProvisioningStore, ProvisionedUser, ProvisioningStore};
