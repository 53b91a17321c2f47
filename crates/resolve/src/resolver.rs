use std::borrow::Cow;
use std::fmt;
use std::sync::LazyLock;

use regex::{Captures, Regex};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^{}]+)\}").expect("Invalid placeholder pattern"));

/// A transform that rewrites placeholder tokens inside a string.
///
/// Implementations must be best-effort: a token they do not recognise stays
/// in the output unchanged.
pub trait SymbolResolver: Send + Sync + fmt::Debug {
    /// Stable name used in diagnostics.
    fn name(&self) -> &str;

    /// Rewrite the tokens this resolver knows. Returns `Cow::Borrowed` when
    /// nothing changed.
    fn resolve<'a>(&self, raw: &'a str) -> Cow<'a, str>;
}

/// Replace every `${token}` in `raw` for which `lookup` returns a value.
///
/// `lookup` receives the text between the braces. Tokens it returns `None`
/// for are kept verbatim.
///
/// ```
/// use hotconf_resolve::substitute;
///
/// let out = substitute("${a}-${b}", |t| (t == "a").then(|| "1".to_string()));
/// assert_eq!(out, "1-${b}");
/// ```
pub fn substitute<'a, F>(raw: &'a str, mut lookup: F) -> Cow<'a, str>
where
    F: FnMut(&str) -> Option<String>,
{
    if !raw.contains("${") {
        return Cow::Borrowed(raw);
    }
    let mut replaced = false;
    let out = PLACEHOLDER.replace_all(raw, |caps: &Captures<'_>| match lookup(&caps[1]) {
        Some(value) => {
            replaced = true;
            value
        }
        None => caps[0].to_string(),
    });
    if replaced {
        Cow::Owned(out.into_owned())
    } else {
        Cow::Borrowed(raw)
    }
}
