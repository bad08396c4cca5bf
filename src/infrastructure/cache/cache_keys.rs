const NAMESPACE: &str = "dongip";

/// Key of a user's aggregated balances across all currencies.
pub fn user_balances_key(user_id: &str) -> String {
    format!("{}:balances:user:{}", NAMESPACE, user_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_namespaced_per_user() {
        assert_eq!(user_balances_key("42"), "dongip:balances:user:42");
        assert_ne!(user_balances_key("1"), user_balances_key("11"));
    }
}
