use tracing::{debug, info, warn};

use super::init_data::InitDataVerifier;
use super::principal::Principal;
use crate::config::{AdminAllowList, AppConfig, Environment};

/// Why a request was not authenticated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnauthenticatedReason {
    MissingInitData,
    InvalidInitData,
}

/// Outcome of one pass through the gate. Exactly one is produced per request.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthorizationResult {
    Authorized(Principal),
    Unauthenticated(UnauthenticatedReason),
    Forbidden(Principal),
    ServerMisconfigured,
}

/// Admin allow-list check on top of init-data verification.
#[derive(Debug, Clone)]
pub struct AdminGate {
    verifier: InitDataVerifier,
    allow_list: AdminAllowList,
    environment: Environment,
}

impl AdminGate {
    pub fn new(verifier: InitDataVerifier, allow_list: AdminAllowList, environment: Environment) -> Self {
        Self {
            verifier,
            allow_list,
            environment,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut verifier = InitDataVerifier::new(config.telegram.bot_token.expose());
        if let Some(max_age) = config.telegram.init_data_max_age {
            verifier = verifier.with_max_age(max_age);
        }
        Self::new(verifier, config.telegram.admin_ids.clone(), config.environment)
    }

    pub fn authorize(&self, init_data: Option<&str>) -> AuthorizationResult {
        let init_data = match init_data {
            Some(raw) if !raw.is_empty() => raw,
            _ => {
                if self.environment.is_development() {
                    warn!("No init data in development mode, using dev principal");
                    return AuthorizationResult::Authorized(Principal::development());
                }
                info!("Rejected request without Telegram init data");
                return AuthorizationResult::Unauthenticated(UnauthenticatedReason::MissingInitData);
            }
        };

        let principal = match self.verifier.verify(init_data) {
            Ok(principal) => principal,
            Err(e) => {
                warn!("Telegram init data verification failed: {}", e);
                return AuthorizationResult::Unauthenticated(UnauthenticatedReason::InvalidInitData);
            }
        };

        debug!(
            "Telegram user verified: {} ({})",
            principal.id_label(),
            principal.first_name.as_deref().unwrap_or("")
        );

        if self.allow_list.is_empty() {
            warn!("ADMIN_TELEGRAM_IDS is not configured, refusing admin access");
            return AuthorizationResult::ServerMisconfigured;
        }

        match principal.id {
            Some(id) if self.allow_list.contains(id) => {
                info!("Admin access granted for user_id {}", id);
                AuthorizationResult::Authorized(principal)
            }
            _ => {
                warn!("Access denied: user_id {} not in admin list", principal.id_label());
                AuthorizationResult::Forbidden(principal)
            }
        }
    }

    /// Verification without the allow-list; never fails, `None` on any problem.
    pub fn optional(&self, init_data: Option<&str>) -> Option<Principal> {
        let init_data = init_data.filter(|raw| !raw.is_empty())?;
        self.verifier.verify(init_data).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::init_data::sign_init_data;
    use crate::auth::principal::DEV_PRINCIPAL_ID;

    const TOKEN: &str = "T";

    fn payload() -> String {
        sign_init_data(TOKEN, &[("user", r#"{"id":42}"#), ("auth_date", "1700000000")])
    }

    fn gate(ids: &[i64], environment: Environment) -> AdminGate {
        AdminGate::new(
            InitDataVerifier::new(TOKEN),
            AdminAllowList::new(ids.iter().copied()),
            environment,
        )
    }

    #[test]
    fn admin_in_allow_list_is_authorized() {
        match gate(&[42], Environment::Production).authorize(Some(&payload())) {
            AuthorizationResult::Authorized(principal) => assert_eq!(principal.id, Some(42)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn non_admin_is_forbidden_with_principal() {
        match gate(&[7], Environment::Production).authorize(Some(&payload())) {
            AuthorizationResult::Forbidden(principal) => assert_eq!(principal.id, Some(42)),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn truncated_hash_is_unauthenticated() {
        let mut tampered = payload();
        tampered.pop();
        assert_eq!(
            gate(&[42], Environment::Production).authorize(Some(&tampered)),
            AuthorizationResult::Unauthenticated(UnauthenticatedReason::InvalidInitData)
        );
    }

    #[test]
    fn empty_allow_list_is_misconfiguration() {
        for env in [Environment::Production, Environment::Staging, Environment::Development] {
            assert_eq!(
                gate(&[], env).authorize(Some(&payload())),
                AuthorizationResult::ServerMisconfigured
            );
        }
    }

    #[test]
    fn invalid_payload_checked_before_allow_list() {
        assert_eq!(
            gate(&[], Environment::Production).authorize(Some("auth_date=1&hash=00")),
            AuthorizationResult::Unauthenticated(UnauthenticatedReason::InvalidInitData)
        );
    }

    #[test]
    fn missing_header_outside_development_is_unauthenticated() {
        for env in [Environment::Production, Environment::Staging] {
            assert_eq!(
                gate(&[42], env).authorize(None),
                AuthorizationResult::Unauthenticated(UnauthenticatedReason::MissingInitData)
            );
            assert_eq!(
                gate(&[42], env).authorize(Some("")),
                AuthorizationResult::Unauthenticated(UnauthenticatedReason::MissingInitData)
            );
        }
    }

    #[test]
    fn missing_header_in_development_yields_dev_principal() {
        match gate(&[42], Environment::Development).authorize(None) {
            AuthorizationResult::Authorized(principal) => {
                assert_eq!(principal.id, Some(DEV_PRINCIPAL_ID));
                assert!(principal.is_dev);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn development_still_verifies_present_header() {
        let dev = gate(&[42], Environment::Development);
        assert!(matches!(
            dev.authorize(Some("user=%7B%7D&hash=abc")),
            AuthorizationResult::Unauthenticated(UnauthenticatedReason::InvalidInitData)
        ));
        assert!(matches!(dev.authorize(Some(&payload())), AuthorizationResult::Authorized(_)));
    }

    #[test]
    fn principal_without_id_is_forbidden() {
        let anonymous = sign_init_data(TOKEN, &[("auth_date", "1700000000")]);
        match gate(&[42], Environment::Production).authorize(Some(&anonymous)) {
            AuthorizationResult::Forbidden(principal) => assert!(principal.id.is_none()),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn optional_never_fails() {
        let g = gate(&[], Environment::Production);
        assert!(g.optional(None).is_none());
        assert!(g.optional(Some("garbage")).is_none());
        assert_eq!(g.optional(Some(&payload())).and_then(|p| p.id), Some(42));
    }
}
