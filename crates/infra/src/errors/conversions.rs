//! Conversions from external infrastructure errors into domain errors.

use faxgate_domain::FaxError;
use keyring::Error as KeyringError;
use reqwest::Error as HttpError;
use rusqlite::Error as SqlError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub FaxError);

impl From<InfraError> for FaxError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<FaxError> for InfraError {
    fn from(value: FaxError) -> Self {
        InfraError(value)
    }
}

/// Extension trait to make the conversion logic explicit in tests and within
/// this module.
trait IntoFaxError {
    fn into_fax(self) -> FaxError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → FaxError */
/* -------------------------------------------------------------------------- */

impl IntoFaxError for SqlError {
    fn into_fax(self) -> FaxError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        fn looks_like_wrong_key(message: &str) -> bool {
            let lower = message.to_ascii_lowercase();
            lower.contains("not a database") || lower.contains("encrypted")
        }

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => FaxError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        FaxError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 2067) => {
                        FaxError::Database("unique constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        FaxError::Database("foreign key constraint violation".into())
                    }
                    (_, _) if looks_like_wrong_key(&message) => FaxError::Database(
                        "SQLCipher key rejected or database not encrypted".into(),
                    ),
                    _ => FaxError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => FaxError::Database("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                FaxError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                FaxError::Database(format!("invalid column type: {ty}"))
            }
            RE::Utf8Error(_) => FaxError::Database("invalid UTF-8 returned from sqlite".into()),
            RE::InvalidParameterName(parameter_name) => {
                FaxError::Database(format!("invalid parameter name: {parameter_name}"))
            }
            RE::InvalidPath(path) => {
                FaxError::Database(format!("invalid database path: {}", path.to_string_lossy()))
            }
            RE::InvalidQuery => FaxError::Database("invalid SQL query".into()),
            other => FaxError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_fax())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → FaxError */
/* -------------------------------------------------------------------------- */

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(FaxError::Database(format!("connection pool error: {value}")))
    }
}

/* -------------------------------------------------------------------------- */
/* keyring::Error → FaxError */
/* -------------------------------------------------------------------------- */

impl IntoFaxError for KeyringError {
    fn into_fax(self) -> FaxError {
        use KeyringError::*;

        let description = self.to_string();

        match self {
            NoEntry => FaxError::Config("keychain entry not found".into()),
            BadEncoding(_) => FaxError::Config("credential in keychain is not valid UTF-8".into()),
            TooLong(name, limit) => FaxError::Config(format!(
                "keychain attribute '{name}' exceeds platform limit ({limit})"
            )),
            Invalid(attr, reason) => {
                FaxError::Config(format!("keychain attribute '{attr}' is invalid: {reason}"))
            }
            Ambiguous(entries) => FaxError::Config(format!(
                "multiple keychain entries matched request ({} results)",
                entries.len()
            )),
            PlatformFailure(err) => FaxError::Config(format!("keychain platform error: {err}")),
            NoStorageAccess(err) => {
                FaxError::Config(format!("unable to access secure storage: {err}"))
            }
            _ => FaxError::Config(description),
        }
    }
}

impl From<KeyringError> for InfraError {
    fn from(value: KeyringError) -> Self {
        InfraError(value.into_fax())
    }
}

/* -------------------------------------------------------------------------- */
/* reqwest::Error → FaxError */
/* -------------------------------------------------------------------------- */

impl IntoFaxError for HttpError {
    fn into_fax(self) -> FaxError {
        if self.is_timeout() {
            return FaxError::provider_transport("HTTP request timed out");
        }

        if self.is_connect() {
            return FaxError::provider_transport("HTTP connection failure");
        }

        if let Some(status) = self.status() {
            let code = status.as_u16();
            let message =
                format!("HTTP {} {}", code, status.canonical_reason().unwrap_or("unknown status"));
            return FaxError::provider_status(code, message);
        }

        FaxError::provider_transport(self.to_string())
    }
}

impl From<HttpError> for InfraError {
    fn from(value: HttpError) -> Self {
        InfraError(value.into_fax())
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
