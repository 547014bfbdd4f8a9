mod app;
mod cache;
mod config;
mod error;
mod recipe;
mod remote;
mod store;

use clap::{Parser, Subcommand};
use color_eyre::{eyre::eyre, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

use app::{AppState, DataSource, MutationOutcome};
use cache::CacheStore;
use recipe::filter::SortOrder;
use recipe::types::{Difficulty, Recipe, RecipeDraft, RecipePatch};
use remote::ApiClient;
use store::RecipeStore;

#[derive(Parser, Debug)]
#[command(name = "pantry")]
#[command(about = "A personal recipe catalog that works with or without its server")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pantry/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  /// API base URL, overriding the configured one
  #[arg(long)]
  api_url: Option<String>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// List recipes, with optional filters
  List {
    /// Only this category
    #[arg(short, long)]
    category: Option<String>,
    /// Only favorites
    #[arg(short, long)]
    favorites: bool,
    /// Text search over titles, ingredients, and directions
    #[arg(short, long)]
    query: Option<String>,
    /// Only this difficulty (easy, medium, hard)
    #[arg(short, long)]
    difficulty: Option<String>,
    /// Only recipes using this ingredient
    #[arg(short, long)]
    ingredient: Option<String>,
    /// Sort order: title-asc, title-desc, newest, oldest
    #[arg(short, long)]
    sort: Option<String>,
    /// Only recipes that have images
    #[arg(long)]
    with_images: bool,
  },
  /// Show one recipe in full
  Show { id: String },
  /// Add a recipe from a YAML or JSON file
  Add { file: PathBuf },
  /// Apply changes from a YAML or JSON file to a recipe
  Edit { id: String, file: PathBuf },
  /// Delete a recipe
  Rm { id: String },
  /// Toggle a recipe's favorite flag
  Fav { id: String },
  /// Report server reachability and data source
  Status,
  /// Wipe the local cache and offline mirror
  CacheClear,
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;
  let _guard = init_tracing()?;

  let args = Args::parse();

  // Load configuration
  let mut config = config::Config::load(args.config.as_deref())?;
  if let Some(api_url) = args.api_url {
    config.api.base_url = api_url;
  }

  let remote = ApiClient::new(&config.api.base_url, config::Config::api_token())?;
  let cache = match &config.cache.path {
    Some(path) => CacheStore::open(path)?,
    None => CacheStore::open_default()?,
  };
  let cache = Arc::new(cache.with_default_ttl(config.cache.ttl_seconds));
  let store = RecipeStore::new(remote, Arc::clone(&cache));
  let mut state = AppState::new(store)
    .with_stale_after(Duration::from_secs(config.cache.stale_after_seconds));

  match args.command {
    Command::List {
      category,
      favorites,
      query,
      difficulty,
      ingredient,
      sort,
      with_images,
    } => {
      state.filters.category = category.unwrap_or_default();
      state.filters.favorites_only = favorites;
      state.filters.query = query.unwrap_or_default();
      state.filters.ingredient = ingredient.unwrap_or_default();
      state.filters.has_images = with_images.then_some(true);
      if let Some(d) = difficulty {
        state.filters.difficulty =
          Some(Difficulty::parse(&d).ok_or_else(|| eyre!("Unknown difficulty: {}", d))?);
      }
      if let Some(s) = sort {
        state.filters.sort =
          Some(SortOrder::parse(&s).ok_or_else(|| eyre!("Unknown sort order: {}", s))?);
      }

      state.refresh(true).await;
      print_source(state.source());
      for recipe in state.filtered() {
        print_row(&recipe);
      }
    }

    Command::Show { id } => {
      state.refresh(true).await;
      match state.find(&id) {
        Some(recipe) => print_full(recipe),
        None => return Err(eyre!("Recipe {} not found", id)),
      }
    }

    Command::Add { file } => {
      let draft: RecipeDraft = read_document(&file)?;
      let outcome = state.create(draft).await?;
      report(outcome, "Added");
    }

    Command::Edit { id, file } => {
      let patch: RecipePatch = read_document(&file)?;
      state.refresh(true).await;
      let outcome = state.update(&id, patch).await?;
      report(outcome, "Updated");
    }

    Command::Rm { id } => {
      state.refresh(true).await;
      let outcome = state.delete(&id).await?;
      report(outcome, "Deleted");
    }

    Command::Fav { id } => {
      state.refresh(true).await;
      let outcome = state.toggle_favorite(&id).await?;
      if let MutationOutcome::Committed(recipe) = &outcome {
        let verb = if recipe.is_favorite {
          "Favorited"
        } else {
          "Unfavorited"
        };
        println!("{} {} ({})", verb, recipe.title, recipe.id);
      } else {
        report(outcome, "Updated");
      }
    }

    Command::Status => {
      let reachable = state.probe().await;
      println!(
        "server: {}",
        if reachable { "reachable" } else { "unreachable" }
      );
      state.refresh(true).await;
      print_source(state.source());
      println!("{} recipes loaded", state.recipes().len());
    }

    Command::CacheClear => {
      cache.clear();
      println!("Cache and offline mirror cleared");
    }
  }

  Ok(())
}

/// Log to a daily file under the data directory so command output stays
/// clean. Filter via PANTRY_LOG.
fn init_tracing() -> Result<tracing_appender::non_blocking::WorkerGuard> {
  let log_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?
    .join("pantry")
    .join("logs");
  std::fs::create_dir_all(&log_dir)
    .map_err(|e| eyre!("Failed to create log directory: {}", e))?;

  let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::daily(
    log_dir,
    "pantry.log",
  ));
  let filter = EnvFilter::try_from_env("PANTRY_LOG").unwrap_or_else(|_| EnvFilter::new("info"));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(writer)
    .with_ansi(false)
    .init();

  Ok(guard)
}

/// Parse a recipe document, YAML by default, JSON for .json files.
fn read_document<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
  let contents = std::fs::read_to_string(path)
    .map_err(|e| eyre!("Failed to read {}: {}", path.display(), e))?;

  if path.extension().is_some_and(|ext| ext == "json") {
    serde_json::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse {}: {}", path.display(), e))
  } else {
    serde_yaml::from_str(&contents)
      .map_err(|e| eyre!("Failed to parse {}: {}", path.display(), e))
  }
}

fn report(outcome: MutationOutcome, verb: &str) {
  match outcome {
    MutationOutcome::Committed(recipe) => {
      println!("{} {} ({})", verb, recipe.title, recipe.id);
    }
    MutationOutcome::RolledBack(reason) => {
      println!("Change was rolled back: {}", reason);
    }
  }
}

fn print_source(source: DataSource) {
  match source {
    DataSource::Connected => println!("[online]"),
    DataSource::Disconnected => println!("[offline, showing local data]"),
    DataSource::Checking => println!("[checking]"),
  }
}

fn print_row(recipe: &Recipe) {
  let marker = if recipe.is_favorite { "*" } else { " " };
  let difficulty = recipe
    .difficulty
    .map(|d| d.as_str())
    .unwrap_or("-");
  println!(
    "{} {:<24} {:<12} {:<8} {}",
    marker,
    recipe.id,
    recipe.category,
    difficulty,
    recipe.title
  );
}

fn print_full(recipe: &Recipe) {
  println!("{}", recipe.title);
  println!("  id:         {}", recipe.id);
  println!(
    "  category:   {}",
    recipe::categories::label(&recipe.category).unwrap_or(&recipe.category)
  );
  if let Some(difficulty) = recipe.difficulty {
    println!("  difficulty: {}", difficulty.as_str());
  }
  if !recipe.prep_time.is_empty() {
    println!("  prep time:  {}", recipe.prep_time);
  }
  if recipe.is_favorite {
    println!("  favorite:   yes");
  }
  if !recipe.description.is_empty() {
    println!("\n{}", recipe.description);
  }

  println!("\nIngredients:");
  for ingredient in &recipe.ingredients {
    println!("  - {}", ingredient);
  }

  println!("\nDirections:");
  for (i, step) in recipe.directions.iter().enumerate() {
    println!("  {}. {}", i + 1, step);
  }

  for (section, steps) in &recipe.additional_instructions {
    println!("\n{}:", section);
    for (i, step) in steps.iter().enumerate() {
      println!("  {}. {}", i + 1, step);
    }
  }

  if !recipe.images.is_empty() {
    println!("\nImages: {}", recipe.images.len());
  }
}
