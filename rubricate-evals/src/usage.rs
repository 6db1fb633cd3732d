//! Provider usage normalization.

use rubricate_core::TokenUsage;
use rubricate_providers::ProviderTokenUsage;

/// Convert provider-reported usage into [`TokenUsage`].
///
/// Missing counts become 0. A cache hit counts the whole total as cached.
pub fn tokens_used(usage: Option<ProviderTokenUsage>, cache_hit: bool) -> TokenUsage {
    let usage = usage.unwrap_or_default();
    let total = usage.total.unwrap_or(0);
    TokenUsage {
        total,
        prompt: usage.prompt.unwrap_or(0),
        completion: usage.completion.unwrap_or(0),
        cached: if cache_hit {
            total
        } else {
            usage.cached.unwrap_or(0)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_missing_usage_is_zero() {
        assert_eq!(tokens_used(None, false), TokenUsage::default());
    }

    #[test]
    fn test_reported_usage() {
        let usage = tokens_used(Some(ProviderTokenUsage::new(10, 5, 5)), false);
        assert_eq!(
            usage,
            TokenUsage {
                total: 10,
                prompt: 5,
                completion: 5,
                cached: 0
            }
        );
    }

    #[test]
    fn test_cache_hit() {
        let usage = tokens_used(Some(ProviderTokenUsage::new(10, 5, 5)), true);
        assert_eq!(usage.cached, 10);
    }

    #[test]
    fn test_partial_usage() {
        let partial = ProviderTokenUsage {
            total: Some(7),
            ..Default::default()
        };
        let usage = tokens_used(Some(partial), false);
        assert_eq!((usage.total, usage.prompt, usage.completion), (7, 0, 0));
    }
}
