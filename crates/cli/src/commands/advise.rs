//! `smartmeds advise`: medication-safety advice for one case.

use smartmeds_core::advisory::AdvisoryRequest;
use smartmeds_triage::AdviceGenerator;

pub async fn run(demo: bool, drugs: &str, age: &str, conditions: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(demo)?;

    // Reject bad input before touching the network.
    let request = AdvisoryRequest::parse(drugs, age, conditions)?;
    let provider = super::require_provider(&config)?;
    let generator = AdviceGenerator::from_config(provider, &config);

    println!("💡 {} 歲，共病：{}", request.age, request.condition_list());
    println!("   用藥：{}\n", request.drug_list());

    eprint!("  Thinking...");
    let advice = generator.generate(&request).await;
    eprint!("\r              \r");

    println!("{}", advice?);
    Ok(())
}
