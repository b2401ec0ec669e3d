//! Auth Service Administration CLI
//!
//! Operator tooling for the profile store: inspect identity provider accounts
//! left without a profile, mark them resolved once cleaned up by hand, and
//! look up stored profiles without going through the HTTP API.

use clap::{Args, Parser, Subcommand};
use dotenv::dotenv;
use uuid::Uuid;

use auth_service::{
    database::{run_migrations, DatabaseConfig},
    models::UserProfile,
    service::{PgProfileRepository, ProfileRepository},
    utils::validation::normalize_email,
};

/// Auth service administration CLI
#[derive(Parser)]
#[command(name = "auth-admin", about = "Auth service administration CLI", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List unresolved orphaned identity provider accounts
    Orphans,
    /// Mark an orphaned account as resolved
    Resolve(ResolveArgs),
    /// Show the stored profile for an email address
    Lookup(LookupArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Orphan record ID
    id: Uuid,
}

#[derive(Args)]
struct LookupArgs {
    /// Email address of the profile
    email: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    // Only the profile store is needed here
    let db_config = DatabaseConfig::from_env()?;
    let database_pool = db_config.create_pool().await?;

    // Run migrations to ensure database is up to date
    run_migrations(&database_pool).await?;

    let repository = PgProfileRepository::new(database_pool);

    match cli.command {
        Commands::Orphans => list_orphans(&repository).await?,
        Commands::Resolve(args) => resolve_orphan(&repository, args).await?,
        Commands::Lookup(args) => lookup_profile(&repository, args).await?,
    }

    Ok(())
}

async fn list_orphans(repository: &dyn ProfileRepository) -> Result<(), Box<dyn std::error::Error>> {
    println!("📋 Listing unresolved orphaned accounts...");

    let orphans = repository.unresolved_orphans().await?;

    if orphans.is_empty() {
        println!("No unresolved orphans. 🎉");
        return Ok(());
    }

    println!();
    println!(
        "{:<38} {:<30} {:<30} {:<17}",
        "ID", "Provider UID", "Email", "Created"
    );
    println!("{}", "-".repeat(118));

    for orphan in &orphans {
        println!(
            "{:<38} {:<30} {:<30} {:<17}",
            orphan.id,
            truncate_string(orphan.identity_provider_id.as_deref().unwrap_or("(unknown)"), 29),
            truncate_string(&orphan.email, 29),
            orphan.created_at.format("%Y-%m-%d %H:%M")
        );
        println!("   reason: {}", orphan.reason);
    }

    println!();
    println!(
        "Delete each account in the identity provider console, then run 'auth-admin resolve <id>'."
    );

    Ok(())
}

async fn resolve_orphan(
    repository: &dyn ProfileRepository,
    args: ResolveArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    if repository.resolve_orphan(args.id).await? {
        println!("✅ Orphan {} marked as resolved", args.id);
    } else {
        println!("❌ No unresolved orphan with ID {}", args.id);
    }

    Ok(())
}

async fn lookup_profile(
    repository: &dyn ProfileRepository,
    args: LookupArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let email = normalize_email(&args.email);
    println!("🔍 Looking up profile for {}...", email);

    let Some(record) = repository.find_by_email(&email).await? else {
        println!("❌ No profile found");
        return Ok(());
    };

    let profile = UserProfile::from(record);

    println!();
    println!("📋 Profile Details:");
    println!("   ID: {}", profile.id);
    println!("   Display name: {}", profile.display_name);
    println!(
        "   Username: {}",
        profile.username.as_deref().unwrap_or("(none)")
    );
    println!("   Email: {}", profile.email);
    println!("   Role: {}", profile.role);
    println!("   Provider UID: {}", profile.identity_provider_id);
    println!("   Created: {}", profile.created_at);

    Ok(())
}

fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
