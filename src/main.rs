#[macro_use]
extern crate clap;

#[macro_use]
extern crate slog;

use clap::ArgAction;
use clap_complete::{generate, Shell};
use slog::Drain;
use std::io;
use std::path::PathBuf;

fn main() {
    let args = command!()
        .about("Trace the blame ancestry of lines deleted by bug-fixing commits")
        .arg(
            clap::Arg::new("repo")
                .help("Path to the repository to analyze")
                .short('C')
                .long("repo")
                .required(true),
        )
        .arg(
            clap::Arg::new("issues")
                .help("Path to the bug-fix commit export")
                .long("issues")
                .required(true),
        )
        .arg(
            clap::Arg::new("depth")
                .help("Maximum recursion depth")
                .long("depth")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("context")
                .help("Diff context width, in lines")
                .long("context")
                .value_parser(clap::value_parser!(u32)),
        )
        .arg(
            clap::Arg::new("result-path")
                .help("Directory to write results into")
                .long("result-path"),
        )
        .arg(
            clap::Arg::new("continue-past-none")
                .help("Keep tracing siblings after an ancestor trace comes back empty")
                .long("continue-past-none")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("verbose")
                .help("Display more output")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue),
        )
        .arg(
            clap::Arg::new("gen-completions")
                .help("Generate completions")
                .long("gen-completions")
                .value_parser(["bash", "fish", "zsh", "powershell", "elvish", "nushell"]),
        );
    let mut args_clone = args.clone();
    let args = args.get_matches();

    if let Some(shell) = args.get_one::<String>("gen-completions") {
        let app_name = "szz-trace";
        match shell.as_str() {
            "bash" => {
                generate(Shell::Bash, &mut args_clone, app_name, &mut io::stdout());
            }
            "fish" => {
                generate(Shell::Fish, &mut args_clone, app_name, &mut io::stdout());
            }
            "zsh" => {
                generate(Shell::Zsh, &mut args_clone, app_name, &mut io::stdout());
            }
            "powershell" => {
                generate(
                    Shell::PowerShell,
                    &mut args_clone,
                    app_name,
                    &mut io::stdout(),
                );
            }
            "elvish" => {
                generate(Shell::Elvish, &mut args_clone, app_name, &mut io::stdout());
            }
            "nushell" => {
                generate(
                    clap_complete_nushell::Nushell,
                    &mut args_clone,
                    app_name,
                    &mut io::stdout(),
                );
            }
            _ => unreachable!(),
        }
        return;
    }

    let decorator = slog_term::TermDecorator::new().build();
    let drain = slog_term::FullFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    let drain = slog::LevelFilter::new(
        drain,
        if args.get_flag("verbose") {
            slog::Level::Debug
        } else {
            slog::Level::Info
        },
    )
    .fuse();
    let mut logger = slog::Logger::root(drain, o!());
    if args.get_flag("verbose") {
        logger = logger.new(o!(
            "module" => slog::FnValue(|record| record.module()),
            "line" => slog::FnValue(|record| record.line()),
        ));
    }

    let mut config = szz_trace::Config::default();
    if let Some(depth) = args.get_one::<u32>("depth") {
        config.depth = *depth;
    }
    if let Some(context) = args.get_one::<u32>("context") {
        config.custom_context = *context;
    }
    if let Some(result_path) = args.get_one::<String>("result-path") {
        config.result_path = PathBuf::from(result_path);
    }
    config.continue_past_none = args.get_flag("continue-past-none");

    let repo_path = PathBuf::from(args.get_one::<String>("repo").unwrap());
    let issues_path = PathBuf::from(args.get_one::<String>("issues").unwrap());

    if let Err(e) = szz_trace::run(&logger, &config, &repo_path, &issues_path) {
        crit!(logger, "trace failed"; "err" => e.to_string());
        // wait for async logger to finish writing messages
        drop(logger);
        ::std::process::exit(1);
    }
}
