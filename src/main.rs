mod api;
mod config;
mod error;
mod flows;
mod model;
mod session;

use api::ApiClient;
use clap::{Parser, Subcommand};
use config::Config;
use error::FlowError;
use log::{debug, error};
use model::*;
use serde::Serialize;
use session::Session;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "myflix", about = "Browse the myFlix movie catalog and manage your favorites")]
struct Cli {
    /// Base address of the movie API (overrides MYFLIX_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the saved session (overrides MYFLIX_SESSION_DIR)
    #[arg(long, global = true)]
    session_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and log in
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        birthday: Option<String>,
    },
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    Movies,
    Movie { title: String },
    Director { name: String },
    Genre { name: String },
    Profile,
    Favorites,
    AddFavorite { movie_id: String },
    RemoveFavorite { movie_id: String },
    EditProfile {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        birthday: Option<String>,
    },
    DeleteProfile,
}

fn print<T: Serialize>(value: &T) -> Result<(), FlowError> {
    let json = serde_json::to_string_pretty(value).map_err(|err| {
        error!("Could not print response: {}", err);
        FlowError::Output(err)
    })?;
    println!("{}", json);
    Ok(())
}

async fn run(config: Config, command: Command) -> Result<(), FlowError> {
    let db = sled::open(&config.session_dir).map_err(error::StoreError::from)?;
    let api = ApiClient::from_config(&config);
    debug!("Using API at {}", api.base_url());
    let session = Session::load(&db)?;

    match command {
        Command::Register {
            username,
            password,
            email,
            birthday,
        } => {
            let registration = Registration {
                username,
                password,
                email,
                birthday,
            };
            print(&flows::register(&api, &db, &registration).await?)?;
        }
        Command::Login { username, password } => {
            let credentials = Credentials { username, password };
            let response = flows::login(&api, &db, &credentials).await?;
            println!("Logged in as {}", response.user.username);
        }
        Command::Logout => flows::logout(&db)?,
        Command::Movies => print(&api.list_movies(&session).await?)?,
        Command::Movie { title } => print(&api.get_movie(&session, &title).await?)?,
        Command::Director { name } => print(&api.get_director(&session, &name).await?)?,
        Command::Genre { name } => print(&api.get_genre(&session, &name).await?)?,
        Command::Profile => print(&api.get_profile(&session).await?)?,
        Command::Favorites => print(&api.list_favorites(&session).await?)?,
        Command::AddFavorite { movie_id } => {
            print(&api.add_favorite(&session, &movie_id).await?)?
        }
        Command::RemoveFavorite { movie_id } => {
            print(&api.remove_favorite(&session, &movie_id).await?)?
        }
        Command::EditProfile {
            username,
            password,
            email,
            birthday,
        } => {
            let update = ProfileUpdate {
                username,
                password,
                email,
                birthday,
            };
            if update.is_empty() {
                println!("Nothing to update");
                return Ok(());
            }
            print(&flows::edit_profile(&api, &db, &session, &update).await?)?;
            println!("Successfully updated profile!");
        }
        Command::DeleteProfile => {
            let message = flows::delete_profile(&api, &db, &session).await?;
            println!("{}", message);
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config, error::ConfigError> {
    let mut config = Config::load()?;
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url)?;
    }
    if let Some(session_dir) = &cli.session_dir {
        config.session_dir = session_dir.clone();
    }
    Ok(config)
}

#[actix_rt::main]
async fn main() {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "myflix=info");
    }
    env_logger::init();

    let cli = Cli::parse();
    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}", err);
            std::process::exit(2);
        }
    };
    if let Err(err) = run(config, cli.command).await {
        if let FlowError::Api(api_err) = &err {
            debug!(
                "Request failed (status {:?}, retryable {})",
                api_err.status(),
                api_err.is_retryable()
            );
        }
        eprintln!("{}", err.user_message());
        std::process::exit(1);
    }
}
