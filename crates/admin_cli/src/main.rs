use std::{error::Error, io::Write};

use clap::{Args, Parser, Subcommand};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    style::Print,
    terminal,
};
use engine::{Engine, EngineError};
use migration::MigratorTrait;

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "mercato_admin")]
#[command(about = "Admin utilities for Mercato (bootstrap users, categories and balances)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./mercato.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Category(Category),
    Balance(Balance),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create(UserCreateArgs),
}

#[derive(Args, Debug)]
struct UserCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    Create(CategoryCreateArgs),
}

#[derive(Args, Debug)]
struct CategoryCreateArgs {
    #[arg(long)]
    name: String,
}

#[derive(Args, Debug)]
struct Balance {
    #[command(subcommand)]
    command: BalanceCommand,
}

#[derive(Subcommand, Debug)]
enum BalanceCommand {
    Add(BalanceAddArgs),
}

#[derive(Args, Debug)]
struct BalanceAddArgs {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    amount: i64,
}

/// Keeps the terminal in raw mode while a secret is typed.
struct RawTerminal;

impl RawTerminal {
    fn enable() -> std::io::Result<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self)
    }
}

impl Drop for RawTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Read a line from the terminal without echoing it. Esc and Ctrl-C abort.
fn read_secret(label: &str) -> CliResult<String> {
    let mut err = std::io::stderr();
    crossterm::execute!(err, Print(label))?;

    let secret = {
        let _raw = RawTerminal::enable()?;
        let mut secret = String::new();
        loop {
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => break Some(secret),
                KeyCode::Esc => break None,
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => break None,
                KeyCode::Backspace => {
                    secret.pop();
                }
                KeyCode::Char(ch) => secret.push(ch),
                _ => {}
            }
        }
    };

    writeln!(err)?;
    secret.ok_or_else(|| "aborted".into())
}

/// Ask for the password of a new account, once more to confirm it.
fn new_account_password(name: &str) -> CliResult<String> {
    let password = read_secret(&format!("Password for {name}: "))?;
    if password.is_empty() {
        return Err("password must not be empty".into());
    }
    if read_secret("Repeat password: ")? != password {
        return Err("passwords do not match".into());
    }
    Ok(password)
}

async fn open_engine(database_url: &str) -> CliResult<Engine> {
    let db = sea_orm::Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(Engine::builder().database(db).build().await?)
}

async fn create_user(engine: &Engine, args: UserCreateArgs) -> CliResult<()> {
    let name = args.name.trim();
    let password = new_account_password(name)?;
    let user_id = engine.register(name, &password).await?;
    println!("created user: {name} ({user_id})");
    Ok(())
}

async fn create_category(engine: &Engine, args: CategoryCreateArgs) -> CliResult<()> {
    match engine.create_category(&args.name).await {
        Ok(category_id) => {
            println!("created category: {} ({category_id})", args.name.trim());
            Ok(())
        }
        Err(EngineError::InvalidArgument(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => Err(err.into()),
    }
}

/// Top-ups run under a short-lived session of the user being credited.
async fn add_balance(engine: &Engine, args: BalanceAddArgs) -> CliResult<()> {
    let password = read_secret(&format!("Password of user {}: ", args.user_id))?;
    let token = match engine.login(args.user_id, &password).await {
        Ok(token) => token,
        Err(EngineError::Unauthorized(_)) => {
            eprintln!("invalid credentials for user {}", args.user_id);
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };

    let user = engine.authenticate(token.as_str()).await?;
    let balance = engine.add_balance(&user, args.amount).await;
    engine.logout(&user, token.as_str()).await?;

    println!("balance of user {}: {}", args.user_id, balance?);
    Ok(())
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();
    let engine = open_engine(&cli.database_url).await?;

    match cli.command {
        Command::User(User {
            command: UserCommand::Create(args),
        }) => create_user(&engine, args).await,
        Command::Category(Category {
            command: CategoryCommand::Create(args),
        }) => create_category(&engine, args).await,
        Command::Balance(Balance {
            command: BalanceCommand::Add(args),
        }) => add_balance(&engine, args).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn balance_add_takes_user_and_amount() {
        let cli = Cli::try_parse_from([
            "mercato_admin",
            "--database-url",
            "sqlite::memory:",
            "balance",
            "add",
            "--user-id",
            "7",
            "--amount",
            "250",
        ])
        .unwrap();

        let Command::Balance(Balance {
            command: BalanceCommand::Add(args),
        }) = cli.command
        else {
            panic!("expected balance add");
        };
        assert_eq!(args.user_id, 7);
        assert_eq!(args.amount, 250);
    }

    #[test]
    fn user_create_requires_a_name() {
        assert!(Cli::try_parse_from(["mercato_admin", "user", "create"]).is_err());

        let cli = Cli::try_parse_from(["mercato_admin", "user", "create", "--name", "alice"])
            .unwrap();
        assert!(matches!(
            cli.command,
            Command::User(User {
                command: UserCommand::Create(UserCreateArgs { ref name })
            }) if name == "alice"
        ));
    }
}
