pub mod api;
pub mod evaluate;
pub mod style_check;

use crate::cli::ProviderArgs;
use crate::embedding::{ProviderCredentials, ProviderKind, ProviderSettings};

pub(crate) fn provider_settings(
    provider: ProviderKind,
    credentials: ProviderCredentials,
    args: &ProviderArgs,
) -> ProviderSettings {
    ProviderSettings {
        model: args.model.clone(),
        gemini_base_url: args.gemini_base_url.clone(),
        openai_base_url: args.openai_base_url.clone(),
        requests_per_minute: args.requests_per_minute,
        ..ProviderSettings::new(provider, credentials)
    }
}
