//! `smartmeds classify`: classify every record and write the risk column back.

use smartmeds_config::ClassifierKind;
use smartmeds_core::record::RiskTier;
use smartmeds_triage::{SyncReport, build_classifier};

pub async fn run(demo: bool, classifier: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = super::load_config(demo)?;
    if let Some(kind) = classifier {
        config.classifier.kind = kind.parse()?;
    }

    let provider = match config.classifier.kind {
        ClassifierKind::Model => Some(super::require_provider(&config)?),
        ClassifierKind::Rule => None,
    };
    let classifier = build_classifier(&config, provider)?;

    let mut session = super::open_session(&config).await?;
    println!(
        "🩺 Classifying {} record(s) with the {} classifier...\n",
        session.snapshot().len(),
        classifier.name()
    );

    let report = session.sync(classifier.as_ref()).await?;

    let snapshot = session.snapshot();
    let records: Vec<_> = snapshot.records.iter().collect();
    super::print_records(&snapshot.columns(session.schema()), &records, session.schema());
    println!();
    print_report(&report, &config.labels);
    Ok(())
}

fn print_report(report: &SyncReport, labels: &smartmeds_core::record::TierLabels) {
    println!("  Written:  {} cell(s) to {}", report.write.cells_written, report.write.range);
    if report.write.header_written {
        println!("  Created the risk column header");
    }
    for tier in RiskTier::ASSIGNABLE {
        println!("  {:<6}   {} {}", tier.as_str(), labels.label(tier), report.count(tier));
    }
    println!("  UNSET    {}", report.count(RiskTier::Unset));

    if report.is_clean() {
        println!("\n  ✅ All records classified");
    } else {
        println!("\n  ⚠️  {} record(s) could not be classified and were left blank:", report.failures.len());
        for failure in &report.failures {
            println!("     row {}: {}", failure.row, failure.reason);
        }
    }
}
