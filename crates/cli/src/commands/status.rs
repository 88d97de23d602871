//! `smartmeds status`: show the effective configuration.

use smartmeds_config::AppConfig;

pub async fn run(demo: bool, check: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(demo)?;

    println!("💊 SmartMeds Status");
    println!("==================");
    println!("  Config dir:   {}", AppConfig::config_dir().display());
    println!("  Store:        {}", config.store.backend);
    if config.store.backend == "sheets" {
        println!(
            "  Spreadsheet:  {}",
            config.store.spreadsheet_id.as_deref().unwrap_or("(not set)")
        );
        println!("  Worksheet:    {}", config.store.worksheet);
        println!(
            "  Sheets token: {}",
            if config.store.access_token.is_some() { "set" } else { "not set" }
        );
    }
    println!("  Columns:      {} → {}", config.columns.medication, config.columns.risk);
    println!(
        "  Labels:       HIGH={} MEDIUM={} LOW={}",
        config.labels.high, config.labels.medium, config.labels.low
    );
    println!("  Classifier:   {:?}", config.classifier.kind);
    println!("  High list:    {}", config.risk_lists.high.join(", "));
    println!("  Medium list:  {}", config.risk_lists.medium.join(", "));
    println!("  Provider:     {}", config.default_provider);
    println!("  Models:       classify={} advise={}", config.classifier_model(), config.advice_model());
    println!("  API key:      {}", if config.has_api_key() { "set" } else { "not set" });
    println!("  Concurrency:  {}", config.sync.concurrency);

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("\n  ✅ Config file found");
    } else {
        println!("\n  ⚠️  No config file: run `smartmeds onboard` first");
    }

    if check {
        println!();
        match super::open_session(&config).await {
            Ok(session) => println!("  ✅ Store reachable ({} records)", session.snapshot().len()),
            Err(e) => println!("  ❌ Store: {e}"),
        }
        if config.has_api_key() || config.default_provider == "ollama" {
            let router = smartmeds_providers::build_from_config(&config);
            match router.default() {
                Some(provider) => match provider.health_check().await {
                    Ok(true) => println!("  ✅ Provider '{}' reachable", provider.name()),
                    Ok(false) => println!("  ⚠️  Provider '{}' answered but rejected the request", provider.name()),
                    Err(e) => println!("  ❌ Provider '{}': {e}", provider.name()),
                },
                None => println!("  ❌ Provider '{}' is not a known endpoint", config.default_provider),
            }
        } else {
            println!("  ⚠️  No API key: model-based classification and advice are unavailable");
        }
    }

    Ok(())
}
