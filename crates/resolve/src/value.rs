use std::borrow::Cow;
use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::PathBuf;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::ResolverChain;

/// Values that can be passed through a [`ResolverChain`].
///
/// Strings are rewritten; containers recurse into their elements; anything
/// else is returned unchanged. Map keys are never rewritten.
pub trait Resolve: Sized {
    /// Resolve every string leaf of `self` through `chain`.
    fn resolve_with(self, chain: &ResolverChain) -> Self;
}

/// Resolve `value` through `chain`.
pub fn resolve<V: Resolve>(value: V, chain: &ResolverChain) -> V {
    value.resolve_with(chain)
}

/// Resolve a serde type by passing its JSON form through `chain`.
///
/// This is the usual body of [`Resolve::resolve_with`] for
/// `#[derive(Serialize, Deserialize)]` structs. If the rewritten JSON no
/// longer decodes, `value` is returned unchanged.
///
/// ```
/// use hotconf_resolve::{resolve_via_json, Resolve, ResolverChain, VariableResolver};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Serialize, Deserialize)]
/// struct Build {
///     out_dir: String,
///     jobs: u32,
/// }
///
/// impl Resolve for Build {
///     fn resolve_with(self, chain: &ResolverChain) -> Self {
///         resolve_via_json(self, chain)
///     }
/// }
///
/// let chain = ResolverChain::new().with(VariableResolver::new("v").with("mode", "release"));
/// let build = Build { out_dir: "target/${mode}".into(), jobs: 4 }.resolve_with(&chain);
/// assert_eq!(build.out_dir, "target/release");
/// ```
pub fn resolve_via_json<V: Serialize + DeserializeOwned>(value: V, chain: &ResolverChain) -> V {
    let json = match serde_json::to_value(&value) {
        Ok(json) => json,
        Err(error) => {
            tracing::warn!(target: "hotconf::resolve", %error, "Value does not encode; left unresolved");
            return value;
        }
    };
    match serde_json::from_value(json.resolve_with(chain)) {
        Ok(resolved) => resolved,
        Err(error) => {
            tracing::warn!(target: "hotconf::resolve", %error, "Resolved value does not decode; left unresolved");
            value
        }
    }
}

impl Resolve for String {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        let rewritten = match chain.resolve_str(&self) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        };
        rewritten.unwrap_or(self)
    }
}

impl Resolve for PathBuf {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        // Non-UTF-8 paths cannot carry placeholders and pass through.
        let rewritten = self.to_str().and_then(|s| match chain.resolve_str(s) {
            Cow::Owned(s) => Some(s),
            Cow::Borrowed(_) => None,
        });
        rewritten.map(PathBuf::from).unwrap_or(self)
    }
}

impl Resolve for Value {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        match self {
            Value::String(s) => Value::String(s.resolve_with(chain)),
            Value::Array(items) => Value::Array(items.resolve_with(chain)),
            Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(k, v)| (k, v.resolve_with(chain)))
                    .collect(),
            ),
            other => other,
        }
    }
}

impl<T: Resolve> Resolve for Option<T> {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        self.map(|v| v.resolve_with(chain))
    }
}

impl<T: Resolve> Resolve for Vec<T> {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        self.into_iter().map(|v| v.resolve_with(chain)).collect()
    }
}

impl<T: Resolve> Resolve for Box<T> {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        Box::new((*self).resolve_with(chain))
    }
}

impl<K: Eq + Hash, T: Resolve> Resolve for HashMap<K, T> {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        self.into_iter()
            .map(|(k, v)| (k, v.resolve_with(chain)))
            .collect()
    }
}

impl<K: Ord, T: Resolve> Resolve for BTreeMap<K, T> {
    fn resolve_with(self, chain: &ResolverChain) -> Self {
        self.into_iter()
            .map(|(k, v)| (k, v.resolve_with(chain)))
            .collect()
    }
}

macro_rules! passthrough {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Resolve for $ty {
                #[inline]
                fn resolve_with(self, _chain: &ResolverChain) -> Self {
                    self
                }
            }
        )*
    };
}

passthrough!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64
);
