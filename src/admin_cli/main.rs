use chrono::Utc;
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter, Statement};

use inkpress::{
    api::{newsletter::load_subscribers, users::load_user_overviews},
    config::Config,
    database::{self, models::sessions},
    formatting::format_date,
};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None, verbatim_doc_comment)]
/// Operator tool for the inkpress blog backend.
/// Bootstraps the schema and prints the admin listings.
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Schema management.
    Db {
        #[command(subcommand)]
        db_command: DbCommand,
    },
    /// Registered users.
    Users {
        #[command(subcommand)]
        users_command: UsersCommand,
    },
    /// Newsletter subscribers.
    Subscribers {
        #[command(subcommand)]
        subscribers_command: SubscribersCommand,
    },
    /// Sign-in sessions.
    Sessions {
        #[command(subcommand)]
        sessions_command: SessionsCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DbCommand {
    /// Creates missing tables and indexes.
    Init,
    /// Drops every application table. Requires --yes.
    Wipe {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand, Debug)]
enum UsersCommand {
    /// Prints users with their post and comment counts.
    List {
        /// Case-insensitive filter on name or email.
        #[arg(short, long)]
        search: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum SubscribersCommand {
    /// Prints subscribers, newest first.
    List {
        /// Case-insensitive filter on name or email.
        #[arg(short, long)]
        search: Option<String>,

        /// Emit JSON instead of a table.
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SessionsCommand {
    /// Deletes sessions past their expiry.
    Purge,
}

const TABLES: [&str; 5] = [
    "comments",
    "posts",
    "sessions",
    "newsletter_subscribers",
    "users",
];

async fn wipe(db: &DatabaseConnection) -> Result<(), Box<dyn std::error::Error>> {
    for table in TABLES {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            format!("DROP TABLE IF EXISTS \"{}\" CASCADE", table),
        ))
        .await?;
        println!("Dropped table: {}", table);
    }
    Ok(())
}

fn print_users_table(
    users: &[inkpress::api::users::UserOverview],
    tz: &Tz,
) {
    println!(
        "{:<36}  {:<24}  {:<32}  {:<20}  {:>5}  {:>8}",
        "ID", "NAME", "EMAIL", "JOINED", "POSTS", "COMMENTS"
    );
    for user in users {
        println!(
            "{:<36}  {:<24}  {:<32}  {:<20}  {:>5}  {:>8}",
            user.id,
            user.name.as_deref().unwrap_or("-"),
            user.email,
            format_date(&user.created_at, tz),
            user.counts.posts,
            user.counts.comments
        );
    }
    println!("{} user(s)", users.len());
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));

    let config = Config::from_env()?;
    let tz = config.get_timezone()?;
    let cli = Cli::parse();
    let db = database::connect().await?;

    match cli.command {
        Commands::Db { db_command } => match db_command {
            DbCommand::Init => {
                database::create_schema(&db).await?;
                println!("Schema is up to date.");
            }
            DbCommand::Wipe { yes } => {
                if !yes {
                    return Err("Refusing to drop tables without --yes".into());
                }
                wipe(&db).await?;
            }
        },
        Commands::Users { users_command } => match users_command {
            UsersCommand::List { search } => {
                let users = load_user_overviews(&db, search.as_deref()).await?;
                print_users_table(&users, &tz);
            }
        },
        Commands::Subscribers {
            subscribers_command,
        } => match subscribers_command {
            SubscribersCommand::List { search, json } => {
                let subscribers = load_subscribers(&db, search.as_deref()).await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&subscribers)?);
                } else {
                    println!("{:<32}  {:<40}  {:<20}", "NAME", "EMAIL", "SUBSCRIBED");
                    for subscriber in &subscribers {
                        println!(
                            "{:<32}  {:<40}  {:<20}",
                            subscriber.name,
                            subscriber.email,
                            format_date(&subscriber.created_at, &tz)
                        );
                    }
                    println!("{} subscriber(s)", subscribers.len());
                }
            }
        },
        Commands::Sessions { sessions_command } => match sessions_command {
            SessionsCommand::Purge => {
                let result = sessions::Entity::delete_many()
                    .filter(sessions::Column::ExpiresAt.lte(Utc::now()))
                    .exec(&db)
                    .await?;
                println!("Removed {} expired session(s).", result.rows_affected);
            }
        },
    }

    Ok(())
}
