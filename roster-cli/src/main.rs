#[macro_use]
extern crate tracing;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tracing::level_filters::LevelFilter;

use roster_lib::auth::login::LoginFlow;
use roster_lib::auth::password::PasswordHasher;
use roster_lib::auth::register::RegisterFlow;
use roster_lib::config::Config;
use roster_lib::event::{EventReceiver, UiEvent};
use roster_lib::repository::{StoreUserRepository, UserRepository};
use roster_lib::user::list::{UserListFlow, UserListUiState};
use roster_repo::user_repo::User;

#[derive(Parser)]
#[command(name = "roster")]
#[command(about = "Register, log in and manage users in a local store", long_about = None)]
struct Cli {
    /// Config file. Defaults to config.toml in the current directory or $CONFIGURATION_DIRECTORY,
    /// then to environment variables.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a user, replacing any user with the same NIM
    Register {
        #[arg(long)]
        nim: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        password: String,
    },
    /// Check a NIM and password
    Login {
        #[arg(long)]
        nim: String,
        #[arg(long)]
        password: String,
    },
    /// List users ordered by name
    List {
        /// Keep printing the list as it changes
        #[arg(long)]
        watch: bool,
    },
    /// Change a user's name
    Rename {
        #[arg(long)]
        nim: String,
        #[arg(long)]
        name: String,
    },
    /// Delete a user
    Delete {
        #[arg(long)]
        nim: String,
    },
}

#[actix_rt::main]
async fn main() -> Result<(), anyhow::Error> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    roster_lib::tracing::init(level)?;
    debug!("tracing initialized");

    let config = load_config(cli.config)?;
    let store = roster_repo::sqlx_repo::create_repos(&config.database_url, config.max_pool_size)
        .await
        .context("Unable to open user store")?;
    let repository: Arc<dyn UserRepository> = Arc::new(StoreUserRepository::new(store));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(config.password.hasher());

    match cli.command {
        Commands::Register {
            nim,
            name,
            password,
        } => {
            let flow = RegisterFlow::new(repository, hasher);
            let mut events = flow.events();
            flow.on_nim_changed(&nim);
            flow.on_name_changed(&name);
            flow.on_password_changed(&password);
            flow.on_register_clicked().await;

            let state = flow.state().borrow().clone();
            let field_errors = [state.nim_error, state.name_error, state.password_error];
            for error in field_errors.iter().flatten() {
                eprintln!("{}", error);
            }
            if !print_events(&mut events) {
                bail!("Registration failed");
            }
        }
        Commands::Login { nim, password } => {
            let flow = LoginFlow::new(repository, hasher);
            let mut events = flow.events();
            flow.on_nim_changed(&nim);
            flow.on_password_changed(&password);
            flow.on_login_clicked().await;

            if let Some(error) = flow.state().borrow().error.clone() {
                eprintln!("{}", error);
            }
            if !print_events(&mut events) {
                bail!("Login failed");
            }
            println!("Logged in as {}", nim);
        }
        Commands::List { watch } => {
            let flow = UserListFlow::new(repository, config.user_list_grace_period());
            let mut ui_state = flow.ui_state();
            loop {
                ui_state.changed().await?;
                print_users(&ui_state.get());
                if !watch {
                    break;
                }
            }
        }
        Commands::Rename { nim, name } => {
            let flow = UserListFlow::new(repository.clone(), config.user_list_grace_period());
            let user = find_user(&flow, &nim).await?;
            flow.on_update_user_clicked(user);
            flow.on_edit_dialog_name_changed(&name);
            flow.on_edit_dialog_confirm().await;

            match repository.get_user_with_nim(&nim).await? {
                Some(user) if user.name == name => println!("Renamed {} to {}", nim, name),
                _ => bail!("Unable to rename user {}", nim),
            }
        }
        Commands::Delete { nim } => {
            let flow = UserListFlow::new(repository.clone(), config.user_list_grace_period());
            let user = find_user(&flow, &nim).await?;
            flow.delete_user(user).await?;

            if repository.get_user_with_nim(&nim).await?.is_some() {
                bail!("Unable to delete user {}", nim);
            }
            println!("Deleted {}", nim);
        }
    }

    Ok(())
}

fn load_config(path: Option<PathBuf>) -> Result<Config, anyhow::Error> {
    if let Some(path) = path {
        return Config::from_file(path);
    }
    match get_config_file() {
        Ok(path) => {
            info!(?path, "Using config file");
            Config::from_file(path)
        }
        Err(e) => {
            info!("{}, reading config from environment", e);
            Config::from_env()
        }
    }
}

fn get_config_file() -> Result<PathBuf, &'static str> {
    let config_current_dir = PathBuf::from("config.toml");
    if config_current_dir.exists() {
        return Ok(config_current_dir);
    }
    if let Ok(config_env) = std::env::var("CONFIGURATION_DIRECTORY") {
        let config_path = PathBuf::from(config_env).join("config.toml");
        if config_path.exists() {
            return Ok(config_path);
        }
    }

    Err("Config file not found")
}

/// Prints the flow's messages and returns whether it navigated on.
fn print_events(events: &mut EventReceiver) -> bool {
    let mut navigated = false;
    for event in events.drain() {
        match event {
            UiEvent::ShowMessage(message) => println!("{}", message),
            UiEvent::NavigationSuccess => navigated = true,
        }
    }
    navigated
}

fn print_users(state: &UserListUiState) {
    if state.users.is_empty() {
        println!("No users");
        return;
    }
    for user in &state.users {
        println!("{}\t{}", user.nim, user.name);
    }
}

async fn find_user(flow: &UserListFlow, nim: &str) -> Result<User, anyhow::Error> {
    let mut ui_state = flow.ui_state();
    ui_state.changed().await?;
    let user = ui_state.borrow().users.iter().find(|u| u.nim == nim).cloned();
    match user {
        Some(user) => Ok(user),
        None => bail!("No user with NIM {}", nim),
    }
}
