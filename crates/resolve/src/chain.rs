use std::borrow::Cow;
use std::sync::Arc;

use crate::SymbolResolver;

/// An ordered sequence of resolvers applied left to right.
///
/// Cloning is cheap: resolvers are shared behind `Arc`.
#[derive(Debug, Clone, Default)]
pub struct ResolverChain {
    resolvers: Vec<Arc<dyn SymbolResolver>>,
}

impl ResolverChain {
    /// An empty chain; resolving through it is the identity.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a resolver (builder style).
    pub fn with<R>(mut self, resolver: R) -> Self
    where
        R: SymbolResolver + 'static,
    {
        self.resolvers.push(Arc::new(resolver));
        self
    }

    /// Append an already shared resolver.
    pub fn push(&mut self, resolver: Arc<dyn SymbolResolver>) {
        self.resolvers.push(resolver);
    }

    /// `self` followed by `inner`: the outer chain's resolvers run first.
    pub fn then(&self, inner: &ResolverChain) -> ResolverChain {
        let mut resolvers = Vec::with_capacity(self.resolvers.len() + inner.resolvers.len());
        resolvers.extend(self.resolvers.iter().cloned());
        resolvers.extend(inner.resolvers.iter().cloned());
        ResolverChain { resolvers }
    }

    /// Run `raw` through every resolver in order.
    pub fn resolve_str<'a>(&self, raw: &'a str) -> Cow<'a, str> {
        let mut current = Cow::Borrowed(raw);
        for resolver in &self.resolvers {
            let next = match resolver.resolve(&current) {
                Cow::Owned(s) => Some(s),
                Cow::Borrowed(_) => None,
            };
            if let Some(s) = next {
                current = Cow::Owned(s);
            }
        }
        current
    }

    /// Names of the resolvers, in application order.
    pub fn names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Iterate over the resolvers in application order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn SymbolResolver>> {
        self.resolvers.iter()
    }

    /// Number of resolvers.
    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    /// Whether the chain has no resolvers.
    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

impl FromIterator<Arc<dyn SymbolResolver>> for ResolverChain {
    fn from_iter<I: IntoIterator<Item = Arc<dyn SymbolResolver>>>(iter: I) -> Self {
        Self {
            resolvers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{VariableResolver, WorkspaceSymbolResolver};

    #[test]
    fn empty_chain_is_identity() {
        let chain = ResolverChain::new();
        assert!(matches!(chain.resolve_str("${x}"), Cow::Borrowed("${x}")));
        assert!(chain.is_empty());
    }

    #[test]
    fn outer_runs_before_inner() {
        let outer = ResolverChain::new().with(WorkspaceSymbolResolver::new("/ws"));
        let inner = ResolverChain::new().with(VariableResolver::new("p").with("x", "42"));

        let combined = outer.then(&inner);

        assert_eq!(combined.names(), vec!["workspace", "p"]);
        assert_eq!(combined.resolve_str("${workspaceFolder}/${x}"), "/ws/42");
        // Neither input chain is modified.
        assert_eq!(outer.len(), 1);
        assert_eq!(inner.len(), 1);
    }

    #[test]
    fn later_resolver_sees_earlier_output() {
        let chain = ResolverChain::new()
            .with(VariableResolver::new("first").with("a", "${b}"))
            .with(VariableResolver::new("second").with("b", "done"));
        assert_eq!(chain.resolve_str("${a}"), "done");
    }

    #[test]
    fn earlier_resolver_does_not_see_later_output() {
        let chain = ResolverChain::new()
            .with(VariableResolver::new("first").with("b", "done"))
            .with(VariableResolver::new("second").with("a", "${b}"));
        assert_eq!(chain.resolve_str("${a}"), "${b}");
    }

    #[test]
    fn inner_cannot_bypass_workspace_substitution() {
        // A property-level table that tries to redefine the workspace token
        // never sees it: the outer resolver has already replaced it.
        let outer = ResolverChain::new().with(WorkspaceSymbolResolver::new("/ws"));
        let inner =
            ResolverChain::new().with(VariableResolver::new("p").with("workspaceFolder", "/evil"));
        assert_eq!(outer.then(&inner).resolve_str("${workspaceFolder}"), "/ws");
    }

    #[test]
    fn collects_shared_resolvers() {
        let shared: Arc<dyn SymbolResolver> = Arc::new(VariableResolver::new("v").with("k", "v"));
        let chain: ResolverChain = vec![Arc::clone(&shared), shared].into_iter().collect();
        assert_eq!(chain.len(), 2);
        assert_eq!(chain.iter().count(), 2);
    }
}
