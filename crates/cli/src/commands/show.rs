//! `smartmeds show`: print every record of the store.

pub async fn run(demo: bool, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(demo)?;
    let session = super::open_session(&config).await?;
    let snapshot = session.snapshot();

    if json {
        println!("{}", serde_json::to_string_pretty(snapshot)?);
        return Ok(());
    }

    println!("📋 {} record(s) from {}\n", snapshot.len(), session.store().name());
    let records: Vec<_> = snapshot.records.iter().collect();
    super::print_records(&snapshot.columns(session.schema()), &records, session.schema());
    Ok(())
}
