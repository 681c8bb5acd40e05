// src/main.rs
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dedupe_lib::store::{CachedPeopleStore, LocalCache, MemoryPeopleStore, PeopleStore, PgPeopleStore};
use dedupe_lib::tree::{build_family_tree, children_of, find_person, search_people, FamilyNode};
use dedupe_lib::utils::db_connect::{connect, DbSettings};
use dedupe_lib::utils::detection_config::DetectionConfig;
use dedupe_lib::utils::env::load_env;
use dedupe_lib::{Caller, CandidatePerson, DedupeError, DuplicateDetectionResult, Person, PersonUpdate};
use log::{info, warn};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "dedupe", about = "Family tree duplicate detection and guarded writes")]
struct Cli {
    /// Acting user id; without it commands run as a guest
    #[arg(long, global = true)]
    uid: Option<String>,

    /// Acting user's email, used to grant the admin role
    #[arg(long, global = true)]
    email: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List everyone, newest first
    List,
    /// Print the family tree
    Tree,
    /// Find people whose name contains the query
    Search { query: String },
    /// List a person's children
    Children { id: String },
    /// Check a name for duplicates without writing anything
    Check {
        name: String,
        #[arg(long)]
        father_name: Option<String>,
        #[arg(long)]
        father_id: Option<String>,
    },
    /// Add a person after a duplicate check
    Add {
        name: String,
        #[arg(long)]
        father_name: Option<String>,
        #[arg(long)]
        father_id: Option<String>,
        /// Add even though a possible duplicate was reported for review
        #[arg(long)]
        force: bool,
    },
    /// Edit a person (admin only)
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        father_name: Option<String>,
        #[arg(long)]
        father_id: Option<String>,
    },
    /// Delete a person (admin only)
    Delete { id: String },
    /// Delete everyone (admin only)
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    fn is_read_only(&self) -> bool {
        matches!(
            self,
            Command::List
                | Command::Tree
                | Command::Search { .. }
                | Command::Children { .. }
                | Command::Check { .. }
        )
    }
}

const EXIT_NEEDS_REVIEW: u8 = 2;
const EXIT_BLOCKED: u8 = 3;

fn caller_from_cli(cli: &Cli) -> Caller {
    let admin_email = std::env::var("DEDUPE_ADMIN_EMAIL").ok();
    match &cli.uid {
        Some(uid) => Caller::signed_in(uid, cli.email.as_deref().unwrap_or_default(), admin_email.as_deref()),
        None => Caller::guest(),
    }
}

fn print_tree(root: &FamilyNode) {
    for (depth, node) in root.walk() {
        println!("{}{} [{}]", "  ".repeat(depth), node.person.name, node.person.id);
    }
}

fn print_people(people: &[&Person], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(people)?);
        return Ok(());
    }
    for person in people {
        let father = person.father_name.as_deref().unwrap_or("-");
        println!("{}\t{}\tfather: {}", person.id, person.name, father);
    }
    Ok(())
}

fn print_detection(result: &DuplicateDetectionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("Suggested action: {}", result.suggested_action);
    match result.top_match() {
        Some(top) => {
            println!("Closest match: {} [{}]", top.person.name, top.person.id);
            println!("  {}", top.describe());
            for reason in top.reasons.iter().skip(1) {
                println!("  - {}", reason);
            }
        }
        None => println!("No similar people found"),
    }
    Ok(())
}

async fn run<S: PeopleStore>(store: &S, caller: &Caller, command: Command, json: bool) -> Result<(), DedupeError> {
    match command {
        Command::List => {
            let people = store.list_people().await?;
            print_people(&people.iter().collect::<Vec<_>>(), json)?;
            info!("{} people in the tree", people.len());
        }
        Command::Tree => {
            let people = store.list_people().await?;
            let forest = build_family_tree(&people);
            if json {
                println!("{}", serde_json::to_string_pretty(&forest).context("Failed to encode tree")?);
            } else {
                for root in &forest {
                    print_tree(root);
                }
            }
        }
        Command::Search { query } => {
            let people = store.list_people().await?;
            let hits = search_people(&people, &query);
            print_people(&hits, json)?;
            info!("{} people match '{}'", hits.len(), query.trim());
        }
        Command::Children { id } => {
            let people = store.list_people().await?;
            let parent = find_person(&people, &id).ok_or_else(|| DedupeError::PersonNotFound(id.clone()))?;
            info!("Children of {} [{}]", parent.name, parent.id);
            print_people(&children_of(&people, &id), json)?;
        }
        Command::Check {
            name,
            father_name,
            father_id,
        } => {
            let candidate = CandidatePerson::new(&name, father_name.as_deref(), father_id.as_deref())?;
            let result = store.preview_duplicates(&candidate).await?;
            print_detection(&result, json)?;
        }
        Command::Add {
            name,
            father_name,
            father_id,
            force,
        } => {
            let candidate = CandidatePerson::new(&name, father_name.as_deref(), father_id.as_deref())?;
            let id = if force {
                store.add_person_with_override(caller, candidate).await?
            } else {
                store.add_person_checked(caller, candidate).await?
            };
            println!("{}", id);
        }
        Command::Update {
            id,
            name,
            father_name,
            father_id,
        } => {
            let update = PersonUpdate {
                name,
                father_name,
                father_id,
            };
            if update.is_empty() {
                return Err(DedupeError::InvalidInput(
                    "nothing to update: pass --name, --father-name or --father-id".to_string(),
                ));
            }
            store.update_person(caller, &id, update).await?;
        }
        Command::Delete { id } => store.delete_person(caller, &id).await?,
        Command::Clear { yes } => {
            if !yes {
                return Err(DedupeError::InvalidInput(
                    "refusing to clear the tree without --yes".to_string(),
                ));
            }
            let removed = store.clear_all(caller).await?;
            println!("Removed {} people", removed);
        }
    }
    Ok(())
}

fn finish(outcome: Result<(), DedupeError>, json: bool) -> Result<ExitCode> {
    match outcome {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(DedupeError::DuplicateNeedsReview(result)) => {
            info!("Possible duplicate found; waiting for confirmation");
            print_detection(&result, json)?;
            println!("Re-run with --force to add anyway.");
            Ok(ExitCode::from(EXIT_NEEDS_REVIEW))
        }
        Err(err @ DedupeError::DuplicateBlocked { .. }) => {
            warn!("{}", err);
            println!("{}", err);
            Ok(ExitCode::from(EXIT_BLOCKED))
        }
        Err(err) => Err(err.into()),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    load_env();

    let cli = Cli::parse();
    let caller = caller_from_cli(&cli);
    let json = cli.json;

    let config = DetectionConfig::from_env();
    config.log_config();

    let pool = match connect(&DbSettings::from_env()).await {
        Ok(pool) => pool,
        Err(e) if cli.command.is_read_only() => {
            warn!("⚠️ Database unreachable ({:#}); reading from the local cache", e);
            let cache = LocalCache::from_env();
            let people = cache
                .load()
                .await?
                .with_context(|| format!("No local cache at {}", cache.path().display()))?;
            let store = MemoryPeopleStore::with_people(config, people);
            return finish(run(&store, &caller, cli.command, json).await, json);
        }
        Err(e) => return Err(e.context("Failed to connect to database")),
    };

    let pg_store = PgPeopleStore::new(pool, config).with_max_retries(PgPeopleStore::max_retries_from_env());
    pg_store
        .ensure_schema()
        .await
        .context("Failed to prepare the person table")?;
    let store = CachedPeopleStore::new(pg_store, LocalCache::from_env());

    finish(run(&store, &caller, cli.command, json).await, json)
}
