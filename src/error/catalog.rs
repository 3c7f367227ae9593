//! Built-in rule catalog for identity-server responses.
//!
//! Order matters: earlier entries win when several would match.

use super::classification::{ApiErrorKind, IdsErrorKind};
use super::matcher::RegexMatcher;
use super::rule::Rule;

/// Protocol/session patterns, in precedence order.
const IDS_CATALOG: &[(IdsErrorKind, &[&str])] = &[
    (
        IdsErrorKind::InvalidTwoFaCode,
        &[
            r".*The Code must be at least.*",
            r".*invalid_grant.*Invalid code.*",
            r".*Invalid code.*invalid_grant.*",
        ],
    ),
    (IdsErrorKind::LockedAccount, &[r".*User is locked out.*"]),
    (IdsErrorKind::NoPassword, &[r".*Password not set.*"]),
    (
        IdsErrorKind::NotActivated,
        &[
            r".*Account hasn't been activated.*",
            // JSON-escaped apostrophe, matched literally
            r".*Account hasn\\u0027t been activated.*",
        ],
    ),
    (
        IdsErrorKind::InvalidCredentials,
        &[r".*Invalid username or password.*"],
    ),
    (
        IdsErrorKind::InvalidRefreshToken,
        &[r#".*\{"error":"invalid_grant"\}.*"#],
    ),
    (IdsErrorKind::UseTwoFa, &[r".*Must be use 2FA code.*"]),
    (
        IdsErrorKind::UseAuthenticator,
        &[r".*Must use the code from the authenticator.*"],
    ),
];

/// Application patterns, in precedence order.
const API_CATALOG: &[(ApiErrorKind, &[&str])] = &[
    (
        ApiErrorKind::PasswordNotStrongEnough,
        &[r".*Password_Validation_Failed.*"],
    ),
    (ApiErrorKind::ProfileNotExist, &[r".*User_Not_Found.*"]),
    (
        ApiErrorKind::ProfileAlreadyActivated,
        &[r".*Account_Already_Activated.*"],
    ),
    (
        ApiErrorKind::InvalidActivationCode,
        &[r".*User_Activation_Fail: Invalid token.*"],
    ),
    (
        ApiErrorKind::InvalidResetPasswordCode,
        &[r".*Reset_Password_Fail: Invalid token.*"],
    ),
    (
        ApiErrorKind::InvalidChangeContactsCode,
        &[r".*Update_Profile_Fail: Invalid token.*"],
    ),
    (
        ApiErrorKind::InvalidAuthenticatorCode,
        &[r".*Authenticator_Fail.*"],
    ),
    (
        ApiErrorKind::ProfileAlreadyRegisteredAndActivated,
        &[r".*User_Already_Binded_Activated.*"],
    ),
    (
        ApiErrorKind::ProfileAlreadyRegisteredNotActivated,
        &[r".*User_Already_Binded_Not_Activated.*"],
    ),
    (ApiErrorKind::ProfileAlreadyExists, &[r".*User_Already_Exists.*"]),
    (
        ApiErrorKind::IncorrectAccountRequest,
        &[r".*Incorrect_Account_Request.*"],
    ),
    // Must stay after the more specific User_Already_Binded_* entries.
    (
        ApiErrorKind::ProfileAlreadyRegistered,
        &[
            r".*User_Already_Binded:.*",
            r".*User_Already_Binded .*",
            r".*User_Already_Binded",
        ],
    ),
];

/// Returns the default protocol/session rules.
pub fn default_ids_rules() -> Vec<Rule> {
    IDS_CATALOG
        .iter()
        .map(|(kind, patterns)| Rule::for_category(RegexMatcher::from_static(patterns), *kind))
        .collect()
}

/// Returns the default application rules.
pub fn default_api_rules() -> Vec<Rule> {
    API_CATALOG
        .iter()
        .map(|(kind, patterns)| Rule::for_category(RegexMatcher::from_static(patterns), *kind))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_entries_have_patterns() {
        assert!(IDS_CATALOG.iter().all(|(_, patterns)| !patterns.is_empty()));
        assert!(API_CATALOG.iter().all(|(_, patterns)| !patterns.is_empty()));
    }

    #[test]
    fn test_catalog_covers_every_kind_once() {
        let ids: Vec<IdsErrorKind> = IDS_CATALOG.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(ids, IdsErrorKind::ALL.to_vec());

        let api: Vec<ApiErrorKind> = API_CATALOG.iter().map(|(kind, _)| *kind).collect();
        assert_eq!(api, ApiErrorKind::ALL.to_vec());
    }

    #[test]
    fn test_catalog_patterns_compile() {
        let all = IDS_CATALOG
            .iter()
            .map(|(_, patterns)| *patterns)
            .chain(API_CATALOG.iter().map(|(_, patterns)| *patterns));
        for patterns in all {
            assert_eq!(RegexMatcher::from_static(patterns).invalid_pattern_count(), 0);
        }
    }

    #[test]
    fn test_default_rules_descriptions() {
        let ids = default_ids_rules();
        assert_eq!(ids.len(), IDS_CATALOG.len());
        assert_eq!(ids[0].description(), "ids/invalid_two_fa_code");

        let api = default_api_rules();
        assert_eq!(api.len(), API_CATALOG.len());
        assert_eq!(api[11].description(), "api/profile_already_registered");
    }

    #[test]
    fn test_escaped_apostrophe_pattern() {
        let rules = default_ids_rules();
        let not_activated = &rules[3];
        assert!(not_activated
            .matcher()
            .vote(Some(r#"{"error":"Account hasn\u0027t been activated"}"#), 400));
        assert!(not_activated
            .matcher()
            .vote(Some("Account hasn't been activated"), 400));
    }
}
