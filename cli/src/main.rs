//! Aimi Point - Terminal client entry point

mod commands;
mod render;

use aimi_app::{build_backend, AppConfig, Controller};
use aimi_core::{Credentials, RedeemOutcome};
use anyhow::Context;
use commands::{Command, HELP};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aimi_point=info,aimi_app=info,aimi_networking=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::info!("Starting Aimi Point");

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    let backend = build_backend(&config)
        .await
        .context("Failed to initialize backend")?;
    let controller: Controller = Controller::new(backend);

    if let Some(user) = controller.start().await {
        println!("Welcome back, {}!", user.username);
        render::status(&controller).await;
    } else {
        println!("Not signed in. Type 'help' for commands.");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt().await?;
        let Some(line) = lines.next_line().await? else {
            break;
        };

        let command = match Command::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("{}", message);
                continue;
            }
        };

        if command == Command::Quit {
            break;
        }
        run(&controller, command).await;
    }

    tracing::info!("Exiting");
    Ok(())
}

async fn prompt() -> std::io::Result<()> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"aimi> ").await?;
    stdout.flush().await
}

async fn run(controller: &Controller, command: Command) {
    match command {
        Command::Login {
            identifier,
            password,
        } => match controller
            .login(&Credentials::new(identifier, password))
            .await
        {
            Ok(user) => {
                println!("Signed in as {}", user.username);
                render::status(controller).await;
            }
            Err(_) => {
                if let Some(message) = controller.snapshot().await.login_error {
                    println!("{}", message);
                }
            }
        },
        Command::Logout => {
            controller.logout().await;
            println!("Signed out");
        }
        Command::Reset { contact } => {
            if let Err(e) = controller.request_password_reset(&contact).await {
                println!("{}", e);
            }
            render::notice(controller).await;
        }
        Command::Status => render::status(controller).await,
        Command::Path => render::path(controller).await,
        Command::Level(level) => match controller.select_level(level).await {
            Ok(viewed) => {
                if viewed != level {
                    println!("Level {} is not unlocked yet", level);
                }
                render::theme(controller).await;
            }
            Err(e) => println!("{}", e),
        },
        Command::Rewards => render::rewards(controller).await,
        Command::Redeem(id) => {
            let result = controller.redeem(&id).await;
            // Backend failures come back as an alert notice instead
            let shown = render::notice(controller).await;
            match result {
                Ok(RedeemOutcome::AlreadyRedeemed(reward)) => {
                    println!("{} is already redeemed", reward.name)
                }
                Err(e) if !shown => println!("{}", e),
                _ => {}
            }
        }
        Command::History => render::history(controller).await,
        Command::Refresh => match controller.refresh().await {
            Ok(()) => render::rewards(controller).await,
            Err(e) => println!("{}", e),
        },
        Command::Help => println!("{}", HELP),
        Command::Quit => {}
    }
}
