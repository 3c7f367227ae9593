//! Typed identity-server errors.
//!
//! Every classified response becomes an [`IdentityError`] whose
//! [`ErrorCategory`] is drawn from a fixed catalog. Categories are split by
//! tier: protocol/session failures reported by the identity server itself
//! ([`IdsErrorKind`]) and business-rule failures reported by the account API
//! ([`ApiErrorKind`]).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The rule tier a category belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Protocol and session layer: lockouts, credentials, token grants.
    Ids,
    /// Application layer: validation, duplicate resources, action tokens.
    Api,
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Ids => write!(f, "ids"),
            Tier::Api => write!(f, "api"),
        }
    }
}

/// Protocol/session-layer error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdsErrorKind {
    /// The two-factor code was rejected.
    InvalidTwoFaCode,
    /// The account is locked out.
    LockedAccount,
    /// The profile has no password set.
    NoPassword,
    /// The account has not been activated yet.
    NotActivated,
    /// Username or password is wrong.
    InvalidCredentials,
    /// The refresh token grant was rejected.
    InvalidRefreshToken,
    /// A two-factor code must be supplied.
    UseTwoFa,
    /// An authenticator app code must be supplied.
    UseAuthenticator,
}

impl IdsErrorKind {
    /// All kinds, in default catalog order.
    pub const ALL: [IdsErrorKind; 8] = [
        IdsErrorKind::InvalidTwoFaCode,
        IdsErrorKind::LockedAccount,
        IdsErrorKind::NoPassword,
        IdsErrorKind::NotActivated,
        IdsErrorKind::InvalidCredentials,
        IdsErrorKind::InvalidRefreshToken,
        IdsErrorKind::UseTwoFa,
        IdsErrorKind::UseAuthenticator,
    ];

    /// Fixed human-readable message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            IdsErrorKind::InvalidTwoFaCode => "2FA code is invalid",
            IdsErrorKind::LockedAccount => "Account is locked",
            IdsErrorKind::NoPassword => "Profile password is not set",
            IdsErrorKind::NotActivated => "Account is not activated",
            IdsErrorKind::InvalidCredentials => "Account credentials are not valid",
            IdsErrorKind::InvalidRefreshToken => "Refresh token is invalid",
            IdsErrorKind::UseTwoFa => "2FA code is required",
            IdsErrorKind::UseAuthenticator => "Authenticator code is required",
        }
    }

    /// Coarse grouping of this kind.
    pub fn error_type(self) -> IdsErrorType {
        match self {
            IdsErrorKind::InvalidTwoFaCode | IdsErrorKind::UseTwoFa => IdsErrorType::TwoFa,
            IdsErrorKind::LockedAccount => IdsErrorType::Locked,
            IdsErrorKind::NoPassword => IdsErrorType::NoPassword,
            IdsErrorKind::NotActivated => IdsErrorType::NotActivated,
            IdsErrorKind::InvalidCredentials | IdsErrorKind::InvalidRefreshToken => {
                IdsErrorType::InvalidCredentials
            }
            IdsErrorKind::UseAuthenticator => IdsErrorType::Authenticator,
        }
    }

    /// Snake-case identifier, as used in catalog files.
    pub fn name(self) -> &'static str {
        match self {
            IdsErrorKind::InvalidTwoFaCode => "invalid_two_fa_code",
            IdsErrorKind::LockedAccount => "locked_account",
            IdsErrorKind::NoPassword => "no_password",
            IdsErrorKind::NotActivated => "not_activated",
            IdsErrorKind::InvalidCredentials => "invalid_credentials",
            IdsErrorKind::InvalidRefreshToken => "invalid_refresh_token",
            IdsErrorKind::UseTwoFa => "use_two_fa",
            IdsErrorKind::UseAuthenticator => "use_authenticator",
        }
    }
}

/// Application-layer error kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorKind {
    /// The new password failed validation.
    PasswordNotStrongEnough,
    /// No profile exists for the given identity.
    ProfileNotExist,
    /// The profile was activated before.
    ProfileAlreadyActivated,
    /// The activation token was rejected.
    InvalidActivationCode,
    /// The password reset token was rejected.
    InvalidResetPasswordCode,
    /// The contact change token was rejected.
    InvalidChangeContactsCode,
    /// The authenticator code was rejected.
    InvalidAuthenticatorCode,
    /// The profile is bound and already active.
    ProfileAlreadyRegisteredAndActivated,
    /// The profile is bound but still awaits activation.
    ProfileAlreadyRegisteredNotActivated,
    /// A profile with the same identity already exists.
    ProfileAlreadyExists,
    /// The account request was malformed.
    IncorrectAccountRequest,
    /// The profile is already bound.
    ProfileAlreadyRegistered,
}

impl ApiErrorKind {
    /// All kinds, in default catalog order.
    pub const ALL: [ApiErrorKind; 12] = [
        ApiErrorKind::PasswordNotStrongEnough,
        ApiErrorKind::ProfileNotExist,
        ApiErrorKind::ProfileAlreadyActivated,
        ApiErrorKind::InvalidActivationCode,
        ApiErrorKind::InvalidResetPasswordCode,
        ApiErrorKind::InvalidChangeContactsCode,
        ApiErrorKind::InvalidAuthenticatorCode,
        ApiErrorKind::ProfileAlreadyRegisteredAndActivated,
        ApiErrorKind::ProfileAlreadyRegisteredNotActivated,
        ApiErrorKind::ProfileAlreadyExists,
        ApiErrorKind::IncorrectAccountRequest,
        ApiErrorKind::ProfileAlreadyRegistered,
    ];

    /// Fixed human-readable message for this kind.
    pub fn message(self) -> &'static str {
        match self {
            ApiErrorKind::PasswordNotStrongEnough => "Password is not strong enough",
            ApiErrorKind::ProfileNotExist => "Profile does not exist",
            ApiErrorKind::ProfileAlreadyActivated => "Profile is already activated",
            ApiErrorKind::InvalidActivationCode => "Activation code is invalid",
            ApiErrorKind::InvalidResetPasswordCode => "Reset password code is invalid",
            ApiErrorKind::InvalidChangeContactsCode => "Change contacts code is invalid",
            ApiErrorKind::InvalidAuthenticatorCode => "AUTHENTICATOR code is invalid",
            ApiErrorKind::ProfileAlreadyRegisteredAndActivated => {
                "Profile is already registered and activated"
            }
            ApiErrorKind::ProfileAlreadyRegisteredNotActivated => {
                "Profile is already registered but not activated"
            }
            ApiErrorKind::ProfileAlreadyExists => "Profile already exists",
            ApiErrorKind::IncorrectAccountRequest => "Account request is incorrect",
            ApiErrorKind::ProfileAlreadyRegistered => "Profile is already registered",
        }
    }

    /// Coarse grouping of this kind.
    pub fn error_type(self) -> ApiErrorType {
        match self {
            ApiErrorKind::PasswordNotStrongEnough => ApiErrorType::PasswordIsNotStrongEnough,
            ApiErrorKind::ProfileNotExist => ApiErrorType::ProfileNotExist,
            ApiErrorKind::ProfileAlreadyActivated => ApiErrorType::ProfileIsAlreadyActivated,
            ApiErrorKind::InvalidActivationCode
            | ApiErrorKind::InvalidResetPasswordCode
            | ApiErrorKind::InvalidChangeContactsCode => ApiErrorType::InvalidCode,
            ApiErrorKind::InvalidAuthenticatorCode => ApiErrorType::AuthenticatorCodeIsInvalid,
            ApiErrorKind::ProfileAlreadyRegisteredAndActivated
            | ApiErrorKind::ProfileAlreadyRegisteredNotActivated
            | ApiErrorKind::ProfileAlreadyExists
            | ApiErrorKind::ProfileAlreadyRegistered => ApiErrorType::ProfileIsAlreadyRegistered,
            ApiErrorKind::IncorrectAccountRequest => ApiErrorType::Unknown,
        }
    }

    /// Snake-case identifier, as used in catalog files.
    pub fn name(self) -> &'static str {
        match self {
            ApiErrorKind::PasswordNotStrongEnough => "password_not_strong_enough",
            ApiErrorKind::ProfileNotExist => "profile_not_exist",
            ApiErrorKind::ProfileAlreadyActivated => "profile_already_activated",
            ApiErrorKind::InvalidActivationCode => "invalid_activation_code",
            ApiErrorKind::InvalidResetPasswordCode => "invalid_reset_password_code",
            ApiErrorKind::InvalidChangeContactsCode => "invalid_change_contacts_code",
            ApiErrorKind::InvalidAuthenticatorCode => "invalid_authenticator_code",
            ApiErrorKind::ProfileAlreadyRegisteredAndActivated => {
                "profile_already_registered_and_activated"
            }
            ApiErrorKind::ProfileAlreadyRegisteredNotActivated => {
                "profile_already_registered_not_activated"
            }
            ApiErrorKind::ProfileAlreadyExists => "profile_already_exists",
            ApiErrorKind::IncorrectAccountRequest => "incorrect_account_request",
            ApiErrorKind::ProfileAlreadyRegistered => "profile_already_registered",
        }
    }
}

/// Coarse grouping of protocol/session errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdsErrorType {
    /// Profile password is not set.
    NoPassword,
    /// Account is locked.
    Locked,
    /// Account is not activated.
    NotActivated,
    /// Account credentials are not valid.
    InvalidCredentials,
    /// Two-factor authentication problem.
    TwoFa,
    /// Authenticator app problem.
    Authenticator,
    /// Anything else.
    Unknown,
}

/// Coarse grouping of application errors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiErrorType {
    /// Profile is already activated.
    ProfileIsAlreadyActivated,
    /// Profile is already registered.
    ProfileIsAlreadyRegistered,
    /// Password is not strong enough.
    PasswordIsNotStrongEnough,
    /// Profile does not exist.
    ProfileNotExist,
    /// A one-time code or token is invalid.
    InvalidCode,
    /// Authenticator code is invalid.
    AuthenticatorCodeIsInvalid,
    /// Anything else.
    Unknown,
}

/// The category of a classified error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "tier", content = "kind", rename_all = "snake_case")]
pub enum ErrorCategory {
    /// A protocol/session error.
    Ids(IdsErrorKind),
    /// An application error.
    Api(ApiErrorKind),
}

impl ErrorCategory {
    /// Fixed human-readable message for this category.
    pub fn message(&self) -> &'static str {
        match self {
            ErrorCategory::Ids(kind) => kind.message(),
            ErrorCategory::Api(kind) => kind.message(),
        }
    }

    /// The tier this category belongs to.
    pub fn tier(&self) -> Tier {
        match self {
            ErrorCategory::Ids(_) => Tier::Ids,
            ErrorCategory::Api(_) => Tier::Api,
        }
    }

    /// Snake-case identifier of the kind.
    pub fn name(&self) -> &'static str {
        match self {
            ErrorCategory::Ids(kind) => kind.name(),
            ErrorCategory::Api(kind) => kind.name(),
        }
    }
}

impl From<IdsErrorKind> for ErrorCategory {
    fn from(kind: IdsErrorKind) -> Self {
        ErrorCategory::Ids(kind)
    }
}

impl From<ApiErrorKind> for ErrorCategory {
    fn from(kind: ApiErrorKind) -> Self {
        ErrorCategory::Api(kind)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tier(), self.name())
    }
}

/// Underlying fault chained to an [`IdentityError`].
pub type ErrorSource = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// A classified identity-server error.
#[derive(Clone, Debug)]
pub struct IdentityError {
    category: ErrorCategory,
    status_code: Option<u16>,
    original_message: Option<String>,
    source: Option<ErrorSource>,
}

impl IdentityError {
    /// Creates a new error of the given category.
    pub fn new(category: impl Into<ErrorCategory>) -> Self {
        Self {
            category: category.into(),
            status_code: None,
            original_message: None,
            source: None,
        }
    }

    /// Creates an error carrying the response that triggered it.
    pub fn from_response(
        category: impl Into<ErrorCategory>,
        original_message: Option<&str>,
        status_code: u16,
    ) -> Self {
        Self::new(category)
            .with_status_code(status_code)
            .with_original_message(original_message.map(str::to_owned))
    }

    /// Sets the HTTP status code.
    pub fn with_status_code(mut self, status_code: u16) -> Self {
        self.status_code = Some(status_code);
        self
    }

    /// Sets the upstream message text.
    pub fn with_original_message(mut self, original_message: Option<String>) -> Self {
        self.original_message = original_message;
        self
    }

    /// Chains an underlying fault.
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// The error category.
    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    /// The tier of the error category.
    pub fn tier(&self) -> Tier {
        self.category.tier()
    }

    /// HTTP status code of the triggering response, if known.
    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    /// Fixed human-readable category message.
    pub fn message(&self) -> &'static str {
        self.category.message()
    }

    /// Upstream message text, if any.
    pub fn original_message(&self) -> Option<&str> {
        self.original_message.as_deref()
    }

    /// Returns true if this is a protocol/session error.
    pub fn is_ids(&self) -> bool {
        matches!(self.category, ErrorCategory::Ids(_))
    }

    /// Returns true if this is an application error.
    pub fn is_api(&self) -> bool {
        matches!(self.category, ErrorCategory::Api(_))
    }
}

impl PartialEq for IdentityError {
    fn eq(&self, other: &Self) -> bool {
        self.category == other.category
            && self.status_code == other.status_code
            && self.original_message == other.original_message
            && self.source.is_some() == other.source.is_some()
    }
}

impl Eq for IdentityError {}

impl fmt::Display for IdentityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.category.message())
    }
}

impl std::error::Error for IdentityError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|source| source as &(dyn std::error::Error + 'static))
    }
}
