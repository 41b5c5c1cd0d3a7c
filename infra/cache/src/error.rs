use std::borrow::Cow;

/// Errors that can occur during cache operations.
///
/// Absence is never an error here: a miss, an unknown key on
/// [`del`](crate::Cache::del), and an expired entry are all normal returns.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// The cache key failed validation before any store mutation.
    #[error("Invalid cache key{}: {message}", format_context(.context))]
    InvalidKey { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

/// Adds `.context(...)` to results carrying a [`CacheError`].
pub trait CacheErrorExt<T> {
    fn context(self, context: impl Into<Cow<'static, str>>) -> Result<T, CacheError>;
}

impl<T> CacheErrorExt<T> for Result<T, CacheError> {
    #[inline]
    fn context(self, context: impl Into<Cow<'static, str>>) -> Self {
        self.map_err(|mut e| {
            match &mut e {
                CacheError::InvalidKey { context: c, .. } => *c = Some(context.into()),
            }
            e
        })
    }
}

fn format_context(context: &Option<Cow<'static, str>>) -> Cow<'static, str> {
    context.as_ref().map_or(Cow::Borrowed(""), |c| Cow::Owned(format!(" ({c})")))
}
