use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::BufReader;
use tokio::signal;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::Config;
use services::{create_document_store, write_messages, DefaultFocusTracker, ShellBridge, WindowRegistry};

#[derive(Parser, Debug)]
#[command(name = "mdpad")]
#[command(about = "Бэкенд markdown-редактора: сессии окон, отслеживание изменений, открытие и сохранение")]
struct Args {
    /// Файл для первого окна
    file: Option<PathBuf>,

    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "mdpad.toml")]
    config: String,

    /// Режим dry-run (документы не пишутся на диск)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает logging.level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Arc::new(Config::load(&args.config)?);

    init_tracing(&config, args.log_level.as_deref())?;

    info!("Запуск mdpad v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим dry-run - документы не пишутся на диск");
    }

    let (outbound, messages) = tokio::sync::mpsc::unbounded_channel();
    let writer_handle = tokio::spawn(async move {
        if let Err(e) = write_messages(messages, tokio::io::stdout()).await {
            error!("Ошибка записи во фронтенд: {}", e);
        }
    });

    let bridge = Arc::new(ShellBridge::new(
        config.clone(),
        Arc::new(WindowRegistry::new()),
        create_document_store(args.dry_run),
        Arc::new(DefaultFocusTracker::new()),
        outbound,
    ));

    let first_window = bridge.open_window(args.file.as_deref())?;
    info!("Первое окно: {}", first_window);

    let reader = BufReader::new(tokio::io::stdin());

    let signal_bridge = Arc::clone(&bridge);
    let signal_handle = tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Получен сигнал завершения (Ctrl+C)");
                signal_bridge.shutdown();
            }
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        }
    });

    // run сам дожидается начатых команд, в том числе после Ctrl+C
    if let Err(e) = Arc::clone(&bridge).run(reader).await {
        error!("Ошибка в ShellBridge: {}", e);
    }
    signal_handle.abort();
    let _ = signal_handle.await;

    info!("Завершение работы...");

    for snapshot in bridge.sessions().unsaved() {
        let target = snapshot
            .file_path
            .as_ref()
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "без имени".to_string());
        warn!("В окне {} есть несохранённые правки ({}, {:?})", snapshot.id, target, snapshot.state);
    }

    // Сессии и мост держат отправителей; после их удаления writer дописывает очередь и завершается
    let closed = bridge.sessions().close_all();
    info!("Закрыто сессий окон: {}", closed);
    drop(bridge);
    let shutdown_timeout = tokio::time::Duration::from_secs(5);
    match tokio::time::timeout(shutdown_timeout, writer_handle).await {
        Ok(_) => info!("Канал фронтенда закрыт"),
        Err(_) => warn!("Таймаут при отправке сообщений фронтенду"),
    }

    info!("mdpad завершил работу");
    Ok(())
}

fn init_tracing(config: &Config, level_override: Option<&str>) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let level = level_override.unwrap_or(&config.logging.level);
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(format!("{},{}", level, config.logging.filter)))?;

    // stdout занят протоколом, логи идут в stderr
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    if config.logging.format == "pretty" {
        registry.with(fmt_layer.pretty()).init();
    } else {
        registry.with(fmt_layer.compact()).init();
    }

    Ok(())
}
