//! CLI module - Command-line interface for voltshop
//!
//! This module provides a structured CLI using clap for argument parsing.

mod commands;

use clap::{Parser, Subcommand};

/// voltshop - electronics catalog storefront and admin API
#[derive(Parser)]
#[command(name = "voltshop")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    #[command(alias = "daemon", alias = "-d", alias = "--daemon")]
    Serve,

    /// Create default config file
    #[command(alias = "--init")]
    Init,

    /// List all categories
    #[command(alias = "ls")]
    Categories,

    /// List the models of a category
    Models {
        /// Category slug
        category: String,
    },

    /// Show a category's products grouped by model
    Products {
        /// Category slug
        category: String,
    },

    /// Search categories, models and products
    #[command(alias = "s")]
    Search {
        /// Search query
        #[arg(required = true)]
        query: Vec<String>,
    },
}

pub use commands::*;
