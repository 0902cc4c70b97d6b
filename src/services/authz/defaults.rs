//! Built-in rule set for the storefront API.
//!
//! Rule order is significant and kept exactly as declared. The `/**` entry in the
//! first group grants public access to every path, which leaves every later group
//! unreachable; `RuleSet::shadowing_rule` reports it at startup.
use super::rule::{RuleError, RuleSet};

const DEV: &str = "/v1/dev";

pub const AUTH: &str = "/v1/dev/auth";
pub const USER: &str = "/v1/dev/user";
pub const IMAGE: &str = "/v1/dev/image";

pub const REGISTER: &str = "/register";
pub const LOGIN: &str = "/login";
pub const VERIFY_ACCOUNT: &str = "/verify-account";
pub const UPLOAD_PHOTO: &str = "/upload-photo";

pub fn storefront_rules() -> Result<RuleSet, RuleError> {
    RuleSet::builder()
        .request_matchers([
            "/swagger-ui/**".to_string(),
            "/v3/api-docs/**".to_string(),
            "/**".to_string(),
            format!("{AUTH}{REGISTER}"),
            format!("{AUTH}{LOGIN}"),
            format!("{USER}{VERIFY_ACCOUNT}"),
            // declared without a leading slash upstream; normalized by PathPattern
            "v1/dev/shopping-cart/add-product-to-cart".to_string(),
        ])
        .permit_all()
        .request_matchers(["/admin/**".to_string(), format!("{DEV}/post/get-all-posts")])
        .has_authority("ADMIN")
        .request_matchers([
            format!("{DEV}/product/add-product"),
            format!("{IMAGE}{UPLOAD_PHOTO}"),
        ])
        .has_authority("SELLER")
        .request_matchers([format!("{DEV}/shopping-cart/add-product-to-cart")])
        .has_authority("USER")
        .any_request()
        .authenticated()
        .build()
}

#[cfg(test)]
mod tests {
    use axum::http::Method;

    use super::*;
    use crate::services::auth::Principal;
    use crate::services::authz::DecisionReason;
    use crate::services::authz::rule::Requirement;

    #[test]
    fn builds_all_groups_in_order() {
        let rules = storefront_rules().unwrap();
        assert_eq!(rules.len(), 12);
        assert_eq!(rules.rules()[2].pattern().as_str(), "/**");
        assert_eq!(
            rules.rules()[6].pattern().as_str(),
            "/v1/dev/shopping-cart/add-product-to-cart"
        );
        assert_eq!(
            rules.rules()[11].requirement(),
            &Requirement::HasAuthority("USER".into())
        );
        assert_eq!(rules.any_request(), &Requirement::Authenticated);
    }

    #[test]
    fn catch_all_public_rule_shadows_authority_rules() {
        let rules = storefront_rules().unwrap();
        assert_eq!(rules.shadowing_rule(), Some(2));

        let buyer = Principal::new("buyer", ["USER"]);
        for path in ["/admin/users", "/v1/dev/product/add-product", "/anything"] {
            let anonymous = rules.decide(&Method::POST, path, None);
            assert!(anonymous.is_allowed(), "{path}");
            assert_eq!(anonymous.reason, DecisionReason::RulePublic);

            let d = rules.decide(&Method::POST, path, Some(&buyer));
            assert!(d.is_allowed(), "{path}");
        }

        // the swagger rule is declared before `/**` and decides its own paths
        let d = rules.decide(&Method::GET, "/swagger-ui/index.html", None);
        assert_eq!(d.matched_rule, Some(0));
    }
}
