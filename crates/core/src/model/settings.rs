use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default size of the "expiring soon" window, in whole days.
pub const DEFAULT_EXPIRING_SOON_DAYS: u32 = 7;
/// Largest accepted "expiring soon" window.
pub const MAX_EXPIRING_SOON_DAYS: u32 = 90;

/// Whether an active package that is already past its expiry date still counts
/// as "expiring soon".
///
/// Tutor-facing listings use `FutureOnly`; the student package page has no
/// lower bound, which is `IncludeOverdue`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpiryWindow {
    /// Flag only packages with `0 < days_until_expiry <= window`.
    #[default]
    FutureOnly,
    /// Flag every active package with `days_until_expiry <= window`.
    IncludeOverdue,
}

impl ExpiryWindow {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ExpiryWindow::FutureOnly => "future_only",
            ExpiryWindow::IncludeOverdue => "include_overdue",
        }
    }
}

impl fmt::Display for ExpiryWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExpiryWindow {
    type Err = ReportSettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "future_only" => Ok(ExpiryWindow::FutureOnly),
            "include_overdue" => Ok(ExpiryWindow::IncludeOverdue),
            other => Err(ReportSettingsError::UnknownExpiryWindow(other.to_owned())),
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ReportSettingsError {
    #[error("expiring-soon window must be between 1 and {max} days, got {got}")]
    WindowOutOfRange { got: u32, max: u32 },
    #[error("unknown expiry window: {0}")]
    UnknownExpiryWindow(String),
}

/// Tunables for package reports.
///
/// Deserialization goes through [`ReportSettingsDraft::validate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ReportSettingsDraft")]
pub struct ReportSettings {
    expiring_soon_days: u32,
    expiry_window: ExpiryWindow,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ReportSettingsDraft {
    pub expiring_soon_days: Option<u32>,
    pub expiry_window: Option<ExpiryWindow>,
}

impl ReportSettingsDraft {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the draft, filling unset fields with defaults.
    ///
    /// # Errors
    ///
    /// Returns `ReportSettingsError::WindowOutOfRange` if the window is 0 or
    /// larger than `MAX_EXPIRING_SOON_DAYS`.
    pub fn validate(self) -> Result<ReportSettings, ReportSettingsError> {
        let expiring_soon_days = self
            .expiring_soon_days
            .unwrap_or(DEFAULT_EXPIRING_SOON_DAYS);
        if expiring_soon_days == 0 || expiring_soon_days > MAX_EXPIRING_SOON_DAYS {
            return Err(ReportSettingsError::WindowOutOfRange {
                got: expiring_soon_days,
                max: MAX_EXPIRING_SOON_DAYS,
            });
        }

        Ok(ReportSettings {
            expiring_soon_days,
            expiry_window: self.expiry_window.unwrap_or_default(),
        })
    }
}

impl TryFrom<ReportSettingsDraft> for ReportSettings {
    type Error = ReportSettingsError;

    fn try_from(draft: ReportSettingsDraft) -> Result<Self, Self::Error> {
        draft.validate()
    }
}

impl ReportSettings {
    /// Rehydrate settings from persisted values.
    ///
    /// # Errors
    ///
    /// Returns `ReportSettingsError` if stored values are out of range.
    pub fn from_persisted(
        expiring_soon_days: u32,
        expiry_window: ExpiryWindow,
    ) -> Result<Self, ReportSettingsError> {
        ReportSettingsDraft {
            expiring_soon_days: Some(expiring_soon_days),
            expiry_window: Some(expiry_window),
        }
        .validate()
    }

    #[must_use]
    pub fn expiring_soon_days(&self) -> u32 {
        self.expiring_soon_days
    }

    #[must_use]
    pub fn expiry_window(&self) -> ExpiryWindow {
        self.expiry_window
    }
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            expiring_soon_days: DEFAULT_EXPIRING_SOON_DAYS,
            expiry_window: ExpiryWindow::FutureOnly,
        }
    }
}
