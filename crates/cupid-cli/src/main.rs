mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};
use tracing::{debug, info};

use cupid_api::ApiClient;
use cupid_app::dashboard::Dashboard;
use cupid_app::login::LoginController;
use cupid_app::routes::{Resolution, Route, Routes};
use cupid_app::submission::{PrankForm, SubmissionController, TracingSink};
use cupid_app::view;
use cupid_session::{SessionRepository, SessionStore};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "cupid")]
#[command(about = "Cupid's Cal from the terminal")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the love calculator
    Submit { name: String, crush: String },
    /// Sign in as admin
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// Browse submissions (admins only)
    Dashboard {
        /// Page to open; the server's page count has the final say
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
}

type Input = Lines<BufReader<Stdin>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "cupid=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    debug!("Using API at {}", config.api_url);

    let api = Arc::new(ApiClient::new(&config.api())?);
    let session = Arc::new(
        SessionStore::open(&config.session_path)
            .with_context(|| format!("opening session at {}", config.session_path.display()))?,
    );
    let routes = Routes::new(config.login_path.clone());
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    match cli.command {
        Command::Submit { name, crush } => {
            let controller = SubmissionController::new(api, Arc::new(TracingSink));
            let mut form = PrankForm::new();
            form.submitter_name = name;
            form.target_name = crush;

            if !form.submit(&controller) {
                if let Some(error) = form.error() {
                    println!("{}", error);
                }
                return Ok(());
            }
            if form.is_modal_open() {
                println!("{}", view::prank_modal());
            }
            // Let the request finish before the runtime goes away.
            if let Some(pending) = form.take_delivery() {
                pending.settled().await;
            }
        }

        Command::Login { username, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt(&mut input, "Password: ").await?,
            };
            let login = LoginController::new(api, session.clone());
            match login.login(&username, &password).await {
                Ok(user) => {
                    println!("{}", view::navbar(&session.read()));
                    println!("Signed in as {}", user.username);
                }
                Err(e) => println!("{}", e),
            }
        }

        Command::Logout => {
            let login = LoginController::new(api, session.clone())
                .with_login_path(routes.login_path());
            let next = login.logout()?;
            println!("{}", view::navbar(&session.read()));
            println!("Signed out. Sign in again at {}", next);
        }

        Command::Status => {
            let current = session.read();
            println!("{}", view::navbar(&current));
            match routes.resolve(Route::Admin.path(), &current) {
                Resolution::Render(_) => println!("Dashboard available at {}", Route::Admin.path()),
                Resolution::Redirect(to) => println!("Dashboard locked; sign in at {}", to),
                Resolution::NotFound => {}
            }
        }

        Command::Dashboard { page } => {
            let current = session.read();
            println!("{}", view::navbar(&current));
            match routes.resolve(Route::Admin.path(), &current) {
                Resolution::Render(_) => {
                    let mut dashboard = Dashboard::new(api, session.clone());
                    dashboard.mount_at(page).await;
                    browse(&mut dashboard, &mut input).await?;
                }
                Resolution::Redirect(to) => {
                    info!("Dashboard requires admin, redirecting to {}", to);
                    println!("Please log in as admin first ({}).", to);
                }
                Resolution::NotFound => println!("Not found"),
            }
        }
    }

    Ok(())
}

async fn browse<R: SessionRepository>(
    dashboard: &mut Dashboard<ApiClient, R>,
    input: &mut Input,
) -> anyhow::Result<()> {
    loop {
        println!(
            "\n{}",
            view::dashboard(&dashboard.state(), dashboard.cursor(), dashboard.total_count())
        );
        let Some(line) = prompt_line(input, "\n[n]ext [p]revious [r]eload [q]uit > ").await? else {
            return Ok(());
        };
        match line.trim() {
            "n" => {
                dashboard.next_page().await;
            }
            "p" => {
                dashboard.previous_page().await;
            }
            "r" => dashboard.reload().await,
            "q" => return Ok(()),
            other => println!("Unknown command: {}", other),
        }
    }
}

async fn prompt(input: &mut Input, text: &str) -> anyhow::Result<String> {
    prompt_line(input, text)
        .await?
        .context("no input on stdin")
}

async fn prompt_line(input: &mut Input, text: &str) -> anyhow::Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(text.as_bytes()).await?;
    stdout.flush().await?;
    Ok(input.next_line().await?)
}
