//! Property-based tests for auth module.

use proptest::prelude::*;

use crate::auth::AuthProvider;

/// Generate OAuth2 scope strings.
fn scope_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("https://www.googleapis.com/auth/cloud-platform".to_string()),
        "[a-z]{3,20}".prop_map(|s| format!("https://www.googleapis.com/auth/{}", s)),
    ]
}

/// Generate a vector of scopes.
fn scopes_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(scope_strategy(), 0..5)
}

proptest! {
    /// A static token is returned unchanged for every call and every scope set.
    #[test]
    fn static_token_is_stable_across_calls(
        token in "[a-zA-Z0-9._-]{32,64}",
        scopes in scopes_strategy(),
        num_calls in 1..8usize
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();

        rt.block_on(async {
            let auth = AuthProvider::with_static_token(token.clone());
            let scope_refs: Vec<&str> = scopes.iter().map(|s| s.as_str()).collect();

            for _ in 0..num_calls {
                let result = auth.get_token(&scope_refs).await;
                prop_assert!(result.is_ok(), "get_token should succeed");
                prop_assert_eq!(&result.unwrap(), &token, "Token should be consistent");
            }
            Ok(())
        })?;
    }
}
