//! Wiring of the provider, cache and language model clients.

use anyhow::{Context, Result};
use chrono::Local;
use screener_ai::{LlmSentimentClassifier, OllamaClient, OpenAiClient, OpenAiConfig, ResponseCache};
use screener_config::{AiProvider, AiSettings, AppConfig};
use screener_core::traits::TextGenerator;
use screener_data::{ArticleFetcher, CachedSource, FileCache, FmpClient, FmpConfig, IndexConstituentsLoader};
use screener_finders::FinderContext;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Create the output directories.
pub fn create_directories(config: &AppConfig) -> Result<()> {
    for dir in config.paths.all() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory {}", dir.display()))?;
    }
    Ok(())
}

/// Build a finder context backed by the cached FMP client.
pub fn build_context(config: &AppConfig) -> Result<FinderContext> {
    create_directories(config)?;
    let timeout = Duration::from_secs(config.fmp.timeout_secs);

    let mut fmp_config = FmpConfig::from_env(&config.fmp.api_key_env)
        .context("FMP API key missing")?
        .with_base_url(&config.fmp.base_url)
        .with_calls_per_minute(config.fmp.calls_per_minute);
    fmp_config.timeout = timeout;
    let fmp = FmpClient::new(fmp_config).context("Failed to create FMP client")?;

    let cache = FileCache::new(config.paths.cache_dir.clone());
    let source = CachedSource::new(fmp, cache.clone()).with_intervals(config.cache);

    let index_loader = IndexConstituentsLoader::new()
        .context("Failed to create index loader")?
        .with_cache(cache);
    let articles = ArticleFetcher::new(timeout).context("Failed to create article fetcher")?;

    let mut ctx = FinderContext::new(Arc::new(source), config.clone(), Local::now().date_naive())
        .with_index_loader(index_loader)
        .with_article_fetcher(articles);

    if config.ai.enabled {
        let generator = build_generator(&config.ai, config)?;
        if config.ai.classify_news {
            let classifier = LlmSentimentClassifier::new(Arc::clone(&generator))
                .with_max_input_tokens(config.ai.max_prompt_tokens);
            ctx = ctx.with_classifier(Arc::new(classifier));
        }
        ctx = ctx.with_generator(generator);
    }

    Ok(ctx)
}

fn build_generator(ai: &AiSettings, config: &AppConfig) -> Result<Arc<dyn TextGenerator>> {
    let generator: Arc<dyn TextGenerator> = match ai.provider {
        AiProvider::OpenAi => {
            let client_config = OpenAiConfig::from_env(&ai.api_key_env)
                .context("OpenAI API key missing")?
                .with_model(&ai.model)
                .with_base_url(&ai.base_url);
            let mut client = OpenAiClient::new(client_config).context("Failed to create OpenAI client")?;
            if ai.cache_responses {
                client = client.with_cache(ResponseCache::new(config.paths.cache_dir.join("openai")));
            }
            Arc::new(client)
        }
        AiProvider::Ollama => Arc::new(
            OllamaClient::new(&ai.ollama_url, &ai.ollama_model).context("Failed to create Ollama client")?,
        ),
    };
    info!(provider = generator.name(), "Language model enabled");
    Ok(generator)
}
