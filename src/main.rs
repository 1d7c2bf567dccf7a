use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Confirm, InquireError, Select, Text};
use pricehub::api::NaverShopping;
use pricehub::bulk::{self, DuplicatePolicy, ExportRange};
use pricehub::prices::{self, CollectionSummary, ProbeOutcome};
use pricehub::spreadsheet::{self, ImportMode};
use pricehub::store::{DeleteConfirmation, DeleteScope};
use pricehub::yuyutei::YuyuTei;
use pricehub::{expansions, report, CatalogStore, Config, Game, MatchRules, PriceHubError, Result};
use std::error::Error;
use std::path::{Path, PathBuf};

/// Collects card prices from Naver shopping and yuyu-tei into a JSON catalog.
#[derive(Parser, Debug)]
#[command(name = "pricehub")]
#[command(version, about, long_about = None)]
struct Args {
    /// Catalog store file (overrides PRICEHUB_STORE)
    #[arg(short, long)]
    store: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Collect prices for every card of a game
    Collect {
        #[arg(long, value_enum)]
        game: Game,
        /// Only this expansion
        #[arg(long)]
        expansion: Option<String>,
    },
    /// Price a single card and ask before saving
    Probe { product_code: String },
    /// Import Korean Pokémon cards from the product spreadsheet
    ImportSheet {
        path: PathBuf,
        /// Write to the store (default is a dry run)
        #[arg(long, default_value_t = false)]
        apply: bool,
        /// Rewrite cards that already exist
        #[arg(long, default_value_t = false)]
        update: bool,
    },
    /// Export catalog and prices to a JSON file
    Export {
        file: PathBuf,
        /// today, a number of days, or all
        #[arg(long, default_value = "all")]
        range: String,
        #[arg(long, value_enum)]
        game: Option<Game>,
    },
    /// Import a JSON export
    Import {
        file: PathBuf,
        /// Replace prices recorded at the same instant instead of skipping them
        #[arg(long, default_value_t = false)]
        overwrite: bool,
    },
    /// Delete data of one game
    Delete {
        #[arg(long, value_enum)]
        game: Game,
        #[arg(long, value_enum)]
        scope: ScopeArg,
        /// Expansion code, for --scope expansion
        #[arg(long)]
        expansion: Option<String>,
    },
    /// Show the latest prices
    Report {
        #[arg(long, value_enum)]
        game: Game,
        #[arg(long)]
        expansion: Option<String>,
    },
    /// Add or update an expansion
    AddExpansion,
    /// Add a card missing from the catalog
    AddCard,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeArg {
    Prices,
    Cards,
    All,
    Expansion,
}

fn delete_scope(scope: ScopeArg, expansion: Option<String>) -> Result<DeleteScope> {
    Ok(match scope {
        ScopeArg::Prices => DeleteScope::PricesOnly,
        ScopeArg::Cards => DeleteScope::CardsAndPrices,
        ScopeArg::All => DeleteScope::Everything,
        ScopeArg::Expansion => DeleteScope::Expansion(expansion.ok_or_else(|| {
            PriceHubError::InvalidInput("--scope expansion needs --expansion".to_string())
        })?),
    })
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mut config = Config::from_env()?;
    if let Some(path) = args.store {
        config.store_path = path;
    }
    let rules = MatchRules::default();
    let mut store = CatalogStore::open(&config.store_path)?;
    log::info!("Using store {}", store.path().display());

    match args.command {
        Some(command) => run(command, &config, &rules, &mut store).await?,
        None => menu(&config, &rules, &mut store).await?,
    }
    Ok(())
}

async fn run(command: Command, config: &Config, rules: &MatchRules, store: &mut CatalogStore) -> Result<()> {
    match command {
        Command::Collect { game, expansion } => collect(config, rules, store, game, expansion.as_deref()).await,
        Command::Probe { product_code } => probe(config, rules, store, &product_code).await,
        Command::ImportSheet { path, apply, update } => import_sheet(rules, store, &path, !apply, update),
        Command::Export { file, range, game } => {
            let range: ExportRange = range.parse()?;
            let document = bulk::export(store, range, game);
            bulk::write_document(&file, &document)?;
            println!(
                "Exported {} expansions, {} cards, {} prices ({}) to {}",
                document.expansions.len(),
                document.cards.len(),
                document.prices.len(),
                document.date_range,
                file.display()
            );
            Ok(())
        }
        Command::Import { file, overwrite } => {
            let policy = if overwrite {
                DuplicatePolicy::Overwrite
            } else {
                DuplicatePolicy::Skip
            };
            import_dump(store, &file, policy)
        }
        Command::Delete { game, scope, expansion } => delete(store, game, delete_scope(scope, expansion)?),
        Command::Report { game, expansion } => {
            print!("{}", report::render(&report::latest_prices(store, game, expansion.as_deref())));
            Ok(())
        }
        Command::AddExpansion => {
            expansions::add_expansion(store, rules)?;
            store.save()
        }
        Command::AddCard => {
            expansions::add_card(store)?;
            store.save()
        }
    }
}

async fn menu(config: &Config, rules: &MatchRules, store: &mut CatalogStore) -> Result<()> {
    let user_name = whoami::username();
    println!("Hi, {}! welcome to PriceHub.", user_name);

    loop {
        let menu_options: Vec<&str> = vec![
            "Collect prices",
            "Probe a single card",
            "Import spreadsheet",
            "Export data",
            "Import data",
            "Show latest prices",
            "Add expansion",
            "Add card",
            "Delete data (Danger)",
            "Exit",
        ];
        let menu_ans: std::result::Result<&str, InquireError> =
            Select::new("What would you like to do?", menu_options.clone()).prompt();

        let outcome = match menu_ans {
            Ok(choice) => match choice {
                "Collect prices" => menu_collect(config, rules, store).await,
                "Probe a single card" => match Text::new("Product code:").prompt() {
                    Ok(code) => probe(config, rules, store, &code).await,
                    Err(e) => Err(e.into()),
                },
                "Import spreadsheet" => menu_import_sheet(rules, store),
                "Export data" => menu_export(store),
                "Import data" => menu_import(store),
                "Show latest prices" => menu_report(store),
                "Add expansion" => expansions::add_expansion(store, rules).and_then(|_| store.save()),
                "Add card" => expansions::add_card(store).and_then(|_| store.save()),
                "Delete data (Danger)" => menu_delete(store),
                "Exit" => break,
                _ => {
                    println!("Invalid choice");
                    Ok(())
                }
            },
            Err(_) => {
                println!("There was an error, please try again");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            log::error!("{}", e);
        }
    }

    Ok(())
}

async fn menu_collect(config: &Config, rules: &MatchRules, store: &mut CatalogStore) -> Result<()> {
    let game = expansions::select_game()?;
    let expansion = expansions::select_expansion(store, game, true)?;
    collect(config, rules, store, game, expansion.as_deref()).await
}

fn menu_import_sheet(rules: &MatchRules, store: &mut CatalogStore) -> Result<()> {
    let path = PathBuf::from(Text::new("Spreadsheet path:").prompt()?.trim());
    let update = Confirm::new("Update cards that already exist?").with_default(false).prompt()?;
    import_sheet(rules, store, &path, true, update)?;
    if Confirm::new("Apply this import?").with_default(false).prompt()? {
        import_sheet(rules, store, &path, false, update)?;
    }
    Ok(())
}

fn menu_export(store: &CatalogStore) -> Result<()> {
    let ranges = vec!["today", "7", "30", "all"];
    let range: ExportRange = Select::new("Price range (days):", ranges).prompt()?.parse()?;
    let name = format!("pricehub_export_{}.json", chrono::Local::now().format("%Y%m%d_%H%M%S"));
    let file = PathBuf::from(Text::new("Output file:").with_default(&name).prompt()?.trim());
    let document = bulk::export(store, range, None);
    bulk::write_document(&file, &document)?;
    println!("Exported {} prices ({}) to {}", document.prices.len(), document.date_range, file.display());
    Ok(())
}

fn menu_import(store: &mut CatalogStore) -> Result<()> {
    let file = PathBuf::from(Text::new("Export file:").prompt()?.trim());
    let policies = vec!["Skip duplicates", "Overwrite duplicates"];
    let policy = match Select::new("Duplicate prices:", policies).prompt()? {
        "Overwrite duplicates" => DuplicatePolicy::Overwrite,
        _ => DuplicatePolicy::Skip,
    };
    import_dump(store, &file, policy)
}

fn menu_report(store: &CatalogStore) -> Result<()> {
    let game = expansions::select_game()?;
    let expansion = expansions::select_expansion(store, game, true)?;
    print!("{}", report::render(&report::latest_prices(store, game, expansion.as_deref())));
    Ok(())
}

fn menu_delete(store: &mut CatalogStore) -> Result<()> {
    let game = expansions::select_game()?;
    let scopes = vec!["Prices only", "Cards and prices", "Everything", "One expansion"];
    let scope = match Select::new("What should be deleted?", scopes).prompt()? {
        "Prices only" => DeleteScope::PricesOnly,
        "Cards and prices" => DeleteScope::CardsAndPrices,
        "Everything" => DeleteScope::Everything,
        _ => match expansions::select_expansion(store, game, false)? {
            Some(code) => DeleteScope::Expansion(code),
            None => return Ok(()),
        },
    };
    delete(store, game, scope)
}

fn naver_source(config: &Config, rules: &MatchRules) -> Result<NaverShopping> {
    let (id, secret) = config.naver_credentials()?;
    Ok(NaverShopping::new(id, secret, config.request_timeout, config.naver_display)?
        .with_unknown_seller(&rules.unknown_seller))
}

fn print_collection(game: Game, summary: &CollectionSummary) {
    println!("{} collection finished", game.label());
    println!("  processed: {}", summary.processed);
    println!("  general price found: {}", summary.general_found);
    println!("  target store price found: {}", summary.target_found);
    println!("  both / neither: {} / {}", summary.both_found, summary.neither_found);
    println!("  fetches: {}, records saved: {}", summary.fetches, summary.records_saved);
    if summary.skipped_pages > 0 {
        println!("  skipped storefront pages: {}", summary.skipped_pages);
    }
}

async fn collect(
    config: &Config,
    rules: &MatchRules,
    store: &mut CatalogStore,
    game: Game,
    expansion: Option<&str>,
) -> Result<()> {
    let summary = match game {
        Game::Japan => {
            let source = YuyuTei::new(config.request_timeout)?;
            prices::collect_japan(store, &source, rules, expansion, config.expansion_pacing).await?
        }
        Game::Pokemon | Game::OnePiece => {
            let source = naver_source(config, rules)?;
            prices::collect_naver(store, &source, rules, game, expansion, config.pacing).await?
        }
    };
    print_collection(game, &summary);
    Ok(())
}

fn print_probe(outcome: &ProbeOutcome) {
    let card = &outcome.card;
    println!("[{}] {} {} ({})", card.product_code, card.card_number, card.name, card.rarity);
    println!("  search: {}", outcome.search);
    println!("  valid listings: {}", outcome.valid_listings);
    if outcome.prices.is_empty() {
        println!("  no price found");
    }
    for price in &outcome.prices {
        println!("  {}: {} ({})", price.channel, price.price, price.source);
    }
}

async fn probe(config: &Config, rules: &MatchRules, store: &mut CatalogStore, product_code: &str) -> Result<()> {
    let game = store
        .find_card(product_code)
        .map(|c| c.game)
        .ok_or_else(|| PriceHubError::NotFound(format!("card {}", product_code)))?;

    let outcome = match game {
        Game::Japan => {
            let source = YuyuTei::new(config.request_timeout)?;
            prices::probe_japan(store, &source, rules, product_code).await?
        }
        Game::Pokemon | Game::OnePiece => {
            let source = naver_source(config, rules)?;
            prices::probe_naver(store, &source, rules, product_code).await?
        }
    };
    print_probe(&outcome);

    if !outcome.prices.is_empty() && Confirm::new("Save these prices?").with_default(false).prompt()? {
        let saved = prices::save_probe(store, &outcome);
        store.save()?;
        println!("Saved {} price records", saved);
    }
    Ok(())
}

fn import_sheet(rules: &MatchRules, store: &mut CatalogStore, path: &Path, dry_run: bool, update: bool) -> Result<()> {
    let rows = spreadsheet::read_workbook(path)?;
    let summary = spreadsheet::import_rows(store, rules, &rows, ImportMode { dry_run, update });
    if !dry_run {
        store.save()?;
    }

    println!("Spreadsheet {}{}", path.display(), if dry_run { " (dry run)" } else { "" });
    println!("  rows: {}", summary.rows);
    println!("  created / updated / unchanged: {} / {} / {}", summary.created, summary.updated, summary.unchanged);
    println!(
        "  skipped: {} empty, {} japanese, {} existing, {} missing expansion",
        summary.skipped_empty, summary.skipped_japanese, summary.skipped_existing, summary.missing_expansion
    );
    println!("  stored as {} (no rarity in name): {}", spreadsheet::DEFAULT_RARITY, summary.defaulted_rarity);
    println!("  errors: {}", summary.errors);
    Ok(())
}

fn import_dump(store: &mut CatalogStore, file: &Path, policy: DuplicatePolicy) -> Result<()> {
    let document = bulk::read_document(file)?;
    println!(
        "{}: exported {} ({}), {} expansions, {} cards, {} prices",
        file.display(),
        document.export_date.as_deref().unwrap_or("?"),
        document.date_range.as_deref().unwrap_or("?"),
        document.expansions.len(),
        document.cards.len(),
        document.prices.len()
    );
    let summary = bulk::import(store, document, policy);
    store.save()?;

    println!("  expansions created / updated: {} / {}", summary.expansions_created, summary.expansions_updated);
    println!("  cards created / updated: {} / {}", summary.cards_created, summary.cards_updated);
    println!(
        "  prices created / skipped / overwritten: {} / {} / {}",
        summary.prices_created, summary.prices_skipped, summary.prices_overwritten
    );
    println!("  prices without card: {}", summary.not_found);
    println!("  errors: {}", summary.errors);
    Ok(())
}

fn delete(store: &mut CatalogStore, game: Game, scope: DeleteScope) -> Result<()> {
    let counts = store.counts(game);
    println!(
        "{}: {} expansions, {} cards, {} prices",
        game.label(),
        counts.expansions,
        counts.cards,
        counts.prices
    );

    let answer = Text::new(&format!("Delete {:?} for {}? (yes/no)", scope, game)).prompt()?;
    let token = if answer.trim().eq_ignore_ascii_case("yes") {
        Text::new(&format!("This cannot be undone. Type {} to continue:", DeleteConfirmation::TOKEN)).prompt()?
    } else {
        String::new()
    };

    let confirmation = match DeleteConfirmation::from_answers(&answer, &token) {
        Some(confirmation) => confirmation,
        None => {
            println!("Cancelled.");
            return Ok(());
        }
    };

    let summary = store.delete(game, &scope, confirmation)?;
    store.save()?;
    println!(
        "Deleted {} expansions, {} cards, {} prices",
        summary.expansions, summary.cards, summary.prices
    );
    Ok(())
}
