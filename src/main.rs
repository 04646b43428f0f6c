use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use flexicards::config::Config;
use flexicards::storage::{CardPack, CardRow};
use flexicards::{logging, seed, StorageManager};

#[derive(Parser)]
#[command(name = "flexicards", about = "FlexiCards local flashcard store", version)]
struct Cli {
    /// Database file (overrides FLEXICARDS_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create missing tables
    Init,

    /// Drop and recreate all tables
    Reset,

    /// Import the demo packs into an empty store
    Seed,

    /// Import a card pack from a JSON file
    Import {
        /// Pack file: {categoryName, language, moduleName, cardList: [[front, back], ...]}
        pack: PathBuf,
        /// Add cards to an existing module instead of replacing its membership
        #[arg(long)]
        append: bool,
    },

    /// List categories
    Categories,

    /// List modules of a category
    Modules {
        category_id: i64,
    },

    /// List cards of a category
    Dictionary {
        category_id: i64,
        /// Only cards whose front or back contains this text
        #[arg(long)]
        filter: Option<String>,
    },

    /// List cards of a module
    Cards {
        module_id: i64,
        #[arg(long)]
        random: bool,
        /// Only cards left unanswered in the last session
        #[arg(long)]
        unanswered: bool,
    },

    /// Record the unanswered cards of a module
    Progress {
        module_id: i64,
        card_ids: Vec<i64>,
    },
}

fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(db) = cli.db {
        config.storage.db_path = db;
    }
    let _log_guard = logging::init_tracing(&config.log);

    let storage = StorageManager::open(&config.storage).with_context(|| {
        format!(
            "failed to open database {}",
            config.storage.db_path.display()
        )
    })?;

    match cli.command {
        Command::Init => {
            storage.init()?;
            println!("initialized {}", storage.db_path());
        }
        Command::Reset => {
            storage.reset_all()?;
            println!("all data removed");
        }
        Command::Seed => {
            let imported = seed::seed_stub_data(&storage)?;
            println!("imported {imported} packs");
        }
        Command::Import { pack, append } => {
            let raw = std::fs::read_to_string(&pack)
                .with_context(|| format!("failed to read {}", pack.display()))?;
            let card_pack: CardPack = serde_json::from_str(&raw)
                .with_context(|| format!("invalid pack file {}", pack.display()))?;

            let applied = storage.insert_card_pack(&card_pack, append)?;
            if !applied {
                anyhow::bail!("pack imported but module was not updated");
            }
            println!("imported {} cards", card_pack.card_list.len());
        }
        Command::Categories => {
            let categories = storage.get_categories()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&categories)?);
            } else {
                for category in categories {
                    println!("{:>5}  [{}] {}", category.id, category.language, category.name);
                }
            }
        }
        Command::Modules { category_id } => {
            let modules = storage.get_modules(category_id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&modules)?);
            } else {
                for module in modules {
                    println!("{:>5}  {}", module.id, module.name);
                }
            }
        }
        Command::Dictionary {
            category_id,
            filter,
        } => {
            let cards = match filter {
                Some(constraint) => storage.filter_dictionary(category_id, &constraint)?,
                None => storage.get_dictionary(category_id)?,
            };
            print_cards(&cards, cli.json)?;
        }
        Command::Cards {
            module_id,
            random,
            unanswered,
        } => {
            let result = storage.get_module_cards(module_id, random, unanswered)?;
            if result.is_fallback() {
                eprintln!("no progress recorded yet, showing all cards");
            }
            print_cards(&result.cards, cli.json)?;
        }
        Command::Progress {
            module_id,
            card_ids,
        } => {
            storage.update_module_progress(module_id, &card_ids)?;
            println!("recorded {} unanswered cards", card_ids.len());
        }
    }

    Ok(())
}

fn print_cards(cards: &[CardRow], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(cards)?);
    } else {
        for card in cards {
            println!("{:>5}  {}  |  {}", card.id, card.front, card.back);
        }
    }
    Ok(())
}
