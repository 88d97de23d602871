//! `smartmeds search`: filter records by medication names.

use smartmeds_triage::SearchQuery;

pub async fn run(demo: bool, query: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(demo)?;
    let session = super::open_session(&config).await?;
    let snapshot = session.snapshot();

    let parsed = SearchQuery::parse(query);
    let found = parsed.filter(&snapshot.records);

    if parsed.is_empty() {
        println!("🔍 No search terms; showing all {} record(s)\n", found.len());
    } else {
        println!(
            "🔍 {} of {} record(s) mention any of: {}\n",
            found.len(),
            snapshot.len(),
            parsed.terms().join(", ")
        );
    }

    if !found.is_empty() {
        super::print_records(&snapshot.columns(session.schema()), &found, session.schema());
    }
    Ok(())
}
