//! `smartmeds onboard`: first-time setup.

use smartmeds_config::AppConfig;

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = AppConfig::config_dir();
    let config_path = config_dir.join("config.toml");

    println!("💊 SmartMeds: First-Time Setup");
    println!("==============================\n");

    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir)?;
        println!("✅ Created config directory: {}", config_dir.display());
    } else {
        println!("  Config directory exists: {}", config_dir.display());
    }

    if config_path.exists() {
        println!("\n⚠️  Config already exists at: {}", config_path.display());
        println!("   Edit it manually or delete and re-run onboard.\n");
        return Ok(());
    }

    std::fs::write(&config_path, AppConfig::default_toml())?;
    println!("✅ Created config.toml at: {}", config_path.display());
    println!("\n📝 Next steps:");
    println!("   1. Set store.spreadsheet_id and store.access_token (or SMARTMEDS_SPREADSHEET_ID / SMARTMEDS_SHEETS_TOKEN)");
    println!("   2. Add an API key for model-based classification and advice");
    println!("   3. Run: smartmeds show");
    println!("\n   Try it offline first: smartmeds --demo classify\n");

    Ok(())
}
