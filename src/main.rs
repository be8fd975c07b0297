use clap::Parser;
use clap::error::ErrorKind;
use console::style;
use log::{error, info};
use std::io::{self, IsTerminal, Write};
use std::process::ExitCode;
use thumbgrid::cli::{Cli, EXIT_CANCELLED, EXIT_DATA_ERROR, EXIT_NO_INPUT, EXIT_USAGE};
use thumbgrid::component::{BrowseOutcome, GridBrowser};
use thumbgrid::config::Settings;
use thumbgrid::init;
use thumbgrid::signal::setup_shutdown_signal;
use thumbgrid::tools::{absolute, scan_media, sort_candidates, validate_path_exists};

fn main() -> ExitCode {
    let settings = Settings::load();
    init::init(&settings);

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => e.exit(),
        Err(e) => {
            let _ = e.print();
            return exit(EXIT_USAGE);
        }
    };

    exit(run(&cli, settings))
}

fn exit(code: i32) -> ExitCode {
    ExitCode::from(u8::try_from(code).unwrap_or(1))
}

fn run(cli: &Cli, settings: Settings) -> i32 {
    let settings = settings.with_cache_dir(cli.cache_dir.clone());

    if let Err(e) = validate_path_exists(&cli.path) {
        eprintln!("{} {e:#}", style("錯誤:").red().bold());
        return EXIT_DATA_ERROR;
    }

    let mut candidates = match scan_media(&cli.path, &settings.cache_dir, cli.filter) {
        Ok(candidates) => candidates,
        Err(e) => {
            error!("掃描失敗: {e:#}");
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            return EXIT_DATA_ERROR;
        }
    };
    sort_candidates(&mut candidates, cli.sort, cli.order);

    if candidates.is_empty() {
        eprintln!(
            "{}",
            style(format!(
                "在 {} 找不到符合條件 ({:?}) 的檔案",
                absolute(&cli.path).display(),
                cli.filter
            ))
            .yellow()
        );
        return EXIT_NO_INPUT;
    }

    // 非互動模式：直接列出所有絕對路徑
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        let mut out = io::stdout().lock();
        for candidate in &candidates {
            if writeln!(out, "{}", absolute(&candidate.path).display()).is_err() {
                return EXIT_DATA_ERROR;
            }
        }
        return 0;
    }

    let shutdown_signal = match setup_shutdown_signal() {
        Ok(signal) => signal,
        Err(e) => {
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            return EXIT_DATA_ERROR;
        }
    };

    let browser = GridBrowser::new(candidates, settings, &cli.backend, shutdown_signal);
    match browser.run() {
        Ok(BrowseOutcome::Selected(path)) => {
            println!("{}", path.display());
            info!("已選取: {}", path.display());
            0
        }
        Ok(BrowseOutcome::Cancelled) => EXIT_CANCELLED,
        Err(e) => {
            error!("瀏覽器錯誤: {e:#}");
            eprintln!("{} {e:#}", style("錯誤:").red().bold());
            EXIT_DATA_ERROR
        }
    }
}
