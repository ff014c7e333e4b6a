pub use super::admin_audit::Entity as AdminAudit;
pub use super::flat_requests::Entity as FlatRequests;
pub use super::flats::Entity as Flats;
pub use super::setup_codes::Entity as SetupCodes;
