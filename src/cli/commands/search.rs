use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_search(config: Config, query: &str) -> anyhow::Result<()> {
    let min_chars = config.catalog.search_min_chars;
    let state = SharedState::new(config).await?;

    let Some(results) = state.catalog_store.fetch_search_results(query).await? else {
        println!("Search needs at least {min_chars} characters.");
        return Ok(());
    };

    if results.is_empty() {
        println!("Nothing found matching '{}'", query.trim());
        return Ok(());
    }

    println!("Search results for '{}'", query.trim());
    println!("{:-<60}", "");

    for category in &results.categories {
        println!("[category] {} (/{})", category.title, category.slug);
    }
    for model in &results.models {
        println!("[model]    {} (/{})", model.title, model.slug);
    }
    for product in &results.products {
        println!("[product]  {} (/{})", product.title, product.slug);
    }
    for product in &results.products_by_rating {
        let rating = [product.rating_value.as_deref(), product.rating_unit.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        println!("[rating]   {} {}", product.title, rating);
    }

    Ok(())
}
