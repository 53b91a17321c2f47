use std::borrow::Cow;

use crate::{substitute, SymbolResolver};

const ENV_PREFIX: &str = "env:";

/// Substitutes `${env:NAME}` with the value of environment variable `NAME`.
///
/// Unset (or non-UTF-8) variables leave the token verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvSymbolResolver;

impl EnvSymbolResolver {
    /// Create the resolver.
    pub fn new() -> Self {
        Self
    }
}

impl SymbolResolver for EnvSymbolResolver {
    fn name(&self) -> &str {
        "env"
    }

    fn resolve<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        substitute(raw, |token| {
            let var = token.strip_prefix(ENV_PREFIX)?;
            match std::env::var(var) {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::trace!(
                        target: "hotconf::resolve",
                        var,
                        "environment variable not set; leaving placeholder"
                    );
                    None
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hotconf_test_utils::{env_guard, set_env_var};

    #[test]
    fn substitutes_set_variable() {
        let _g = env_guard();
        let _v = set_env_var("HOTCONF_RESOLVE_TEST_HOME", Some("/home/tester"));

        let out = EnvSymbolResolver::new().resolve("${env:HOTCONF_RESOLVE_TEST_HOME}/.cache");
        assert_eq!(out, "/home/tester/.cache");
    }

    #[test]
    fn unset_variable_is_left_verbatim() {
        let _g = env_guard();
        let _v = set_env_var("HOTCONF_RESOLVE_TEST_UNSET", None);

        let out = EnvSymbolResolver::new().resolve("${env:HOTCONF_RESOLVE_TEST_UNSET}");
        assert_eq!(out, "${env:HOTCONF_RESOLVE_TEST_UNSET}");
    }

    #[test]
    fn ignores_non_env_tokens() {
        let out = EnvSymbolResolver::new().resolve("${workspaceFolder}");
        assert!(matches!(out, Cow::Borrowed(_)));
    }
}
