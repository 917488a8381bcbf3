mod ids;
mod package;
pub mod payload;
mod redemption;
mod settings;
mod status;

pub use ids::{
    BookingId, PackageId, ParseIdError, ReadableId, ReadableIdError, RedemptionId, StudentId,
    SubjectId, TeacherId,
};
pub use package::{Package, PackageDraft, PackageError, Pricing};
pub use payload::{PackagePayload, PayloadError};
pub use redemption::{BookingSnapshot, Redemption};
pub use settings::{
    DEFAULT_EXPIRING_SOON_DAYS, ExpiryWindow, MAX_EXPIRING_SOON_DAYS, ReportSettings,
    ReportSettingsDraft, ReportSettingsError,
};
pub use status::{BookingStatus, PackageStatus, StatusParseError};
