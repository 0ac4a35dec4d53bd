mod chef;
mod commands;
mod config;
mod server;
mod tls;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::process;

use crate::chef::ChefClient;
use crate::commands::{
    RecipeFields, build_query, cmd_chef, cmd_list_add, cmd_list_check, cmd_list_cleanup,
    cmd_list_clear, cmd_list_clear_checked, cmd_list_delete, cmd_list_show, cmd_list_sync,
    cmd_plan_add, cmd_plan_clear, cmd_plan_move, cmd_plan_remove, cmd_plan_week, cmd_recipe_add,
    cmd_recipe_delete, cmd_recipe_edit, cmd_recipe_favorite, cmd_recipe_image, cmd_recipe_import,
    cmd_recipe_list, cmd_recipe_show, cmd_user_add, cmd_whoami,
};
use crate::config::{Config, DEFAULT_PUBLIC_URL};
use recipebox_core::error::RecipeBoxError;
use recipebox_core::service::RecipeBoxService;
use recipebox_core::storage::ImageStore;

#[derive(Parser)]
#[command(
    name = "recipebox",
    version,
    about = "Recipes, a weekly meal plan, and a shopping list that keeps up"
)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Act as this local user (default: $RECIPEBOX_USER or "local")
    #[arg(long, global = true)]
    user: Option<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage users and API tokens
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
    /// Manage recipes
    Recipe {
        #[command(subcommand)]
        command: RecipeCommands,
    },
    /// Manage the weekly meal plan
    Plan {
        #[command(subcommand)]
        command: PlanCommands,
    },
    /// Manage the shopping list
    List {
        #[command(subcommand)]
        command: ListCommands,
    },
    /// Ask the AI Chef for a recipe
    Chef {
        /// Dish or cooking question
        #[arg(required = true, num_args = 1..)]
        question: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Start the REST API server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,
        /// Address to bind to (default: 127.0.0.1, use 0.0.0.0 to expose to network)
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
        /// Disable token authentication and act as the local user (for development/testing)
        #[arg(long)]
        no_auth: bool,
        /// Enable TLS (HTTPS). Generates a self-signed certificate on first use.
        #[arg(long)]
        tls: bool,
        /// Path to TLS certificate file (PEM). Implies --tls.
        #[arg(long, value_name = "PATH")]
        tls_cert: Option<std::path::PathBuf>,
        /// Path to TLS private key file (PEM). Implies --tls.
        #[arg(long, value_name = "PATH")]
        tls_key: Option<std::path::PathBuf>,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print its API token
    Add {
        /// Username (no whitespace)
        username: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the current user and its API token
    Whoami {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum RecipeCommands {
    /// Add a recipe
    Add {
        /// Recipe title
        title: String,
        #[command(flatten)]
        fields: RecipeFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Browse recipes (search, filter, sort, page)
    List {
        /// Match title or ingredient name
        #[arg(short, long)]
        search: Option<String>,
        /// Only favorites
        #[arg(short, long)]
        favorites: bool,
        /// Category filter: breakfast, lunch, dinner, dessert, all
        #[arg(short, long)]
        category: Option<String>,
        /// Sort: servings_asc, time_asc, ingredients_asc
        #[arg(long)]
        sort: Option<String>,
        /// Page number (6 recipes per page)
        #[arg(short, long)]
        page: Option<usize>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show a recipe
    Show {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit a recipe (only the given fields change)
    Edit {
        /// Recipe ID
        id: i64,
        /// New title
        #[arg(long)]
        title: Option<String>,
        #[command(flatten)]
        fields: RecipeFields,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete a recipe and its meal plan placements
    Delete {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle a recipe's favorite flag
    Favorite {
        /// Recipe ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload a photo for a recipe
    Image {
        /// Recipe ID
        id: i64,
        /// Image file
        file: std::path::PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Import a recipe from a Cooklang (.cook) file
    Import {
        /// Path to the .cook file
        file: std::path::PathBuf,
        /// Title override (defaults to metadata title or filename)
        #[arg(long)]
        title: Option<String>,
        /// Category: breakfast, lunch, dinner, dessert (default: dinner)
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum PlanCommands {
    /// Place a recipe in a meal slot
    Add {
        /// Recipe ID
        recipe_id: i64,
        /// Date (YYYY-MM-DD or today/yesterday/tomorrow)
        date: String,
        /// Meal: breakfast, lunch, dinner, dessert
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move a placement to another slot
    Move {
        /// Meal plan item ID
        id: i64,
        /// Target date
        date: String,
        /// Target meal
        meal: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a placement
    Remove {
        /// Meal plan item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show the week containing a date (default: this week)
    Week {
        /// Any date in the week
        date: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear the meal plan, optionally only a date range
    Clear {
        /// Range start (requires --end)
        #[arg(long)]
        start: Option<String>,
        /// Range end (requires --start)
        #[arg(long)]
        end: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ListCommands {
    /// Show the shopping list grouped by category
    Show {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Add an item manually
    Add {
        /// Item text
        name: String,
        /// Category (default: Other)
        #[arg(short, long)]
        category: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Toggle an item's checked state
    Check {
        /// Item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Delete an item
    Delete {
        /// Item ID
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove every item
    Clear {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Rebuild recipe items from the meal plan (default: this week)
    Sync {
        /// Range start (requires --end)
        #[arg(long)]
        start: Option<String>,
        /// Range end (requires --start)
        #[arg(long)]
        end: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove items whose meal plan placement is gone
    Cleanup {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove checked items
    ClearChecked {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e:#}");
        let code = match RecipeBoxError::classify(&e) {
            Some(RecipeBoxError::NotFound(_)) => 2,
            _ => 1,
        };
        process::exit(code);
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    let username = cli.user.unwrap_or_else(|| config.username.clone());

    match cli.command {
        Commands::Serve {
            port,
            bind,
            no_auth,
            tls,
            tls_cert,
            tls_key,
        } => {
            let tls_config = if tls || tls_cert.is_some() || tls_key.is_some() {
                Some(tls::CertPaths::resolve(tls_cert, tls_key)?)
            } else {
                None
            };
            let scheme = if tls_config.is_some() { "https" } else { "http" };
            let public_url = config.public_url_or(&format!("{scheme}://{bind}:{port}"));
            let svc = RecipeBoxService::new(&config.db_path)?
                .with_images(ImageStore::new(&config.images_dir, &public_url)?);
            let default_session = if no_auth {
                Some(svc.local_session(&username)?)
            } else {
                None
            };
            let chef = ChefClient::new(config.chef.clone())?;
            server::start_server(svc, chef, port, &bind, default_session, tls_config).await
        }
        command => run_local(&config, &username, command).await,
    }
}

#[allow(clippy::too_many_lines)]
async fn run_local(config: &Config, username: &str, command: Commands) -> Result<()> {
    let svc = RecipeBoxService::new(&config.db_path)?.with_images(ImageStore::new(
        &config.images_dir,
        &config.public_url_or(DEFAULT_PUBLIC_URL),
    )?);

    match command {
        Commands::Serve { .. } => unreachable!("serve is handled by run"),
        Commands::User { command } => match command {
            UserCommands::Add { username, json } => cmd_user_add(&svc, &username, json),
            UserCommands::Whoami { json } => {
                let session = svc.local_session(username)?;
                cmd_whoami(&svc, &session, json)
            }
        },
        Commands::Chef { question, json } => {
            let client = ChefClient::new(config.chef.clone())?;
            cmd_chef(&client, &question.join(" "), json).await
        }
        Commands::Recipe { command } => {
            let session = svc.local_session(username)?;
            match command {
                RecipeCommands::Add {
                    title,
                    fields,
                    json,
                } => cmd_recipe_add(&svc, &session, &title, &fields, json),
                RecipeCommands::List {
                    search,
                    favorites,
                    category,
                    sort,
                    page,
                    json,
                } => {
                    let query = build_query(search, favorites, category, sort.as_deref(), page)?;
                    cmd_recipe_list(&svc, &session, query, json)
                }
                RecipeCommands::Show { id, json } => cmd_recipe_show(&svc, &session, id, json),
                RecipeCommands::Edit {
                    id,
                    title,
                    fields,
                    json,
                } => cmd_recipe_edit(&svc, &session, id, title, &fields, json),
                RecipeCommands::Delete { id, json } => cmd_recipe_delete(&svc, &session, id, json),
                RecipeCommands::Favorite { id, json } => {
                    cmd_recipe_favorite(&svc, &session, id, json)
                }
                RecipeCommands::Image { id, file, json } => {
                    cmd_recipe_image(&svc, &session, id, &file, json)
                }
                RecipeCommands::Import {
                    file,
                    title,
                    category,
                    json,
                } => cmd_recipe_import(&svc, &session, &file, title, category.as_deref(), json),
            }
        }
        Commands::Plan { command } => {
            let session = svc.local_session(username)?;
            match command {
                PlanCommands::Add {
                    recipe_id,
                    date,
                    meal,
                    json,
                } => cmd_plan_add(&svc, &session, recipe_id, &date, &meal, json),
                PlanCommands::Move {
                    id,
                    date,
                    meal,
                    json,
                } => cmd_plan_move(&svc, &session, id, &date, &meal, json),
                PlanCommands::Remove { id, json } => cmd_plan_remove(&svc, &session, id, json),
                PlanCommands::Week { date, json } => cmd_plan_week(&svc, &session, date, json),
                PlanCommands::Clear { start, end, json } => {
                    cmd_plan_clear(&svc, &session, start, end, json)
                }
            }
        }
        Commands::List { command } => {
            let session = svc.local_session(username)?;
            match command {
                ListCommands::Show { json } => cmd_list_show(&svc, &session, json),
                ListCommands::Add {
                    name,
                    category,
                    json,
                } => cmd_list_add(&svc, &session, &name, category.as_deref(), json),
                ListCommands::Check { id, json } => cmd_list_check(&svc, &session, id, json),
                ListCommands::Delete { id, json } => cmd_list_delete(&svc, &session, id, json),
                ListCommands::Clear { json } => cmd_list_clear(&svc, &session, json),
                ListCommands::Sync { start, end, json } => {
                    cmd_list_sync(&svc, &session, start, end, json)
                }
                ListCommands::Cleanup { json } => cmd_list_cleanup(&svc, &session, json),
                ListCommands::ClearChecked { json } => {
                    cmd_list_clear_checked(&svc, &session, json)
                }
            }
        }
    }
}
