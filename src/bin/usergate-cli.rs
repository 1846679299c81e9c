//! CLI usergate
//!
//! Операторские утилиты для паролей: генерация, хеширование, проверка и
//! проверка необходимости перехеширования по текущей политике.

use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use usergate::{
    auth::{self, HashAlgorithm, HashOptions},
    init_logging, LoggingConfig, Settings,
};

/// Основная структура CLI аргументов
#[derive(Parser)]
#[command(name = "usergate-cli")]
#[command(author = "Usergate Contributors")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "usergate CLI - password generation, hashing and verification", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Включить подробный вывод (debug)
    #[arg(short, long, help = "Включить подробный вывод для отладки")]
    verbose: bool,
    /// Подкоманда для выполнения
    #[command(subcommand)]
    command: Commands,
}

/// Алгоритм хеширования
#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgoArg {
    Bcrypt,
    Argon2i,
    Argon2id,
}

/// Подкоманды CLI
#[derive(Subcommand)]
enum Commands {
    /// Сгенерировать случайный пароль
    Genpass {
        /// Длина пароля (по умолчанию из настроек)
        #[arg(short, long)]
        length: Option<usize>,
    },
    /// Захешировать пароль
    Hash {
        password: String,
        /// Алгоритм (по умолчанию из настроек)
        #[arg(short, long, value_enum)]
        algo: Option<AlgoArg>,
        /// Стоимость bcrypt
        #[arg(short, long)]
        cost: Option<u32>,
    },
    /// Проверить пароль по хешу; код выхода 1 при несовпадении
    Verify { password: String, hash: String },
    /// Проверить, нужно ли перехешировать по текущей политике
    NeedsRehash { hash: String },
}

impl From<AlgoArg> for HashAlgorithm {
    fn from(arg: AlgoArg) -> Self {
        match arg {
            AlgoArg::Bcrypt => HashAlgorithm::Bcrypt,
            AlgoArg::Argon2i => HashAlgorithm::Argon2i,
            AlgoArg::Argon2id => HashAlgorithm::Argon2id,
        }
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    let settings = Settings::load().context("Failed to load settings")?;

    init_logging(logging_config(cli.verbose, &settings)).map_err(|e| anyhow::anyhow!(e))?;

    debug!(?settings, "Settings loaded");
    run(cli.command, &settings)
}

/// Уровень из настроек; `--verbose` поднимает его до `debug`.
fn logging_config(
    verbose: bool,
    settings: &Settings,
) -> LoggingConfig {
    let config = settings.logging();
    if verbose {
        LoggingConfig {
            level: "debug".to_string(),
            ..config
        }
    } else {
        config
    }
}

fn run(
    command: Commands,
    settings: &Settings,
) -> Result<ExitCode> {
    let policy = settings.password_policy();

    match command {
        Commands::Genpass { length } => {
            let length = length.unwrap_or(policy.random_length);
            println!("{}", auth::gen_random_password(length));
        }
        Commands::Hash {
            password,
            algo,
            cost,
        } => {
            let algorithm = algo.map(HashAlgorithm::from).unwrap_or(policy.algorithm);
            let options = HashOptions {
                cost: cost.unwrap_or(policy.options.cost),
                ..policy.options.clone()
            };
            let hash = auth::crypt_password(&password, algorithm, &options)
                .context("Failed to hash password")?;
            println!("{hash}");
        }
        Commands::Verify { password, hash } => {
            if auth::verify_password(&password, &hash) {
                println!("OK");
            } else {
                println!("MISMATCH");
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::NeedsRehash { hash } => {
            let needed = policy.needs_rehash(&hash);
            println!("{}", if needed { "yes" } else { "no" });
        }
    }

    Ok(ExitCode::SUCCESS)
}
