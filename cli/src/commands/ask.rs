use anyhow::Result;

use crate::chef::ChefClient;

pub(crate) async fn cmd_chef(client: &ChefClient, question: &str, json: bool) -> Result<()> {
    let answer = client.ask(question).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&answer)?);
        return Ok(());
    }
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!("\nSources:");
        for source in &answer.sources {
            match &source.title {
                Some(title) => println!("  - {title}: {}", source.url),
                None => println!("  - {}", source.url),
            }
        }
    }
    Ok(())
}
