//! Catalog listing command handlers

use crate::config::Config;
use crate::state::SharedState;

pub async fn cmd_categories(config: Config) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let categories = state.catalog_store.fetch_categories().await?;

    if categories.is_empty() {
        println!("No categories yet.");
        return Ok(());
    }

    println!("Categories ({} total)", categories.len());
    println!("{:-<60}", "");
    for category in categories {
        println!("{:>4}  {:<30} /{}", category.id, category.title, category.slug);
    }

    Ok(())
}

pub async fn cmd_models(config: Config, category: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let page = state.catalog.category_models_page(category).await?;

    println!("{} - models", page.category.title);
    println!("{:-<60}", "");

    if page.models.is_empty() {
        println!("No models linked to this category.");
        return Ok(());
    }

    for model in page.models {
        let rating = match (&model.rating_value, &model.rating_unit) {
            (Some(value), Some(unit)) => format!("{value} {unit}"),
            (Some(value), None) => value.clone(),
            _ => String::new(),
        };
        println!("{:>4}  {:<30} {}", model.id, model.title, rating);
    }

    Ok(())
}

pub async fn cmd_products(config: Config, category: &str) -> anyhow::Result<()> {
    let state = SharedState::new(config).await?;
    let page = state.catalog.category_products_page(category).await?;

    println!("{} - products", page.category.title);
    println!("{:-<60}", "");

    if let Some(message) = page.empty_message {
        println!("{message}");
        return Ok(());
    }

    for group in page.groups {
        println!("{}", group.model.title);
        for product in group.products {
            let price = product
                .price
                .map_or_else(|| "-".to_string(), |p| format!("{p:.2}"));
            println!("  • {:<40} {:>10}", product.title, price);
        }
        println!();
    }

    Ok(())
}
