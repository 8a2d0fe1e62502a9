use crate::error::Result;
use crate::github::ReleaseSource;
use crate::resolver;
use colored::Colorize;

pub async fn search(query: &str, source: &impl ReleaseSource) -> Result<()> {
    let results = resolver::search_candidates(source, query).await?;

    println!(
        "Found {} repositories matching '{}':",
        results.total_count,
        query.bold()
    );
    for repo in results.items.iter().take(25) {
        let desc = repo.description.as_deref().unwrap_or("");
        println!(
            "  {:<36} {} {:<8} {}",
            repo.full_name.bold(),
            "⭐".yellow(),
            repo.stars,
            desc.dimmed()
        );
    }
    if results.items.len() > 25 {
        println!("  ... and {} more", results.items.len() - 25);
    }

    Ok(())
}
