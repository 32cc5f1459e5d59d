use std::io::Read;

use clap::Parser;
use den::Shell;

/// `den` — an interactive POSIX-flavoured shell (SPEC_FULL.md §6).
#[derive(Parser)]
#[command(name = "den")]
#[command(about = "An interactive POSIX-flavoured shell")]
#[command(version)]
struct Cli {
    /// Execute COMMAND and exit (`-c`)
    #[arg(short = 'c', value_name = "COMMAND")]
    command_string: Option<String>,

    /// Force interactive mode even when stdin isn't a terminal
    #[arg(short = 'i', long = "interactive")]
    interactive: bool,

    /// Read the script from stdin
    #[arg(short = 's')]
    read_stdin: bool,

    /// Script file (when no `-c`/`-s`) followed by its positional
    /// parameters (`$1`, `$2`, ...), or (with `-c`) `$0` followed by `$1`...
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    script_and_args: Vec<String>,
}

/// Shell-option flags (`-e -u -x -o NAME +o NAME -n --`) are handled
/// outside clap: `+o` isn't a clap-representable prefix, and these all
/// funnel into the `set` builtin's own option table rather than being
/// re-parsed here (SPEC_FULL.md §4.5 "unchanged" dispatch).
fn split_set_flags(argv: Vec<String>) -> (Vec<String>, Vec<String>) {
    let mut set_flags = Vec::new();
    let mut remaining = Vec::new();
    let mut i = 0;
    let mut past_double_dash = false;

    while i < argv.len() {
        let arg = &argv[i];
        if past_double_dash {
            remaining.push(arg.clone());
            i += 1;
            continue;
        }
        match arg.as_str() {
            "--" => {
                past_double_dash = true;
                remaining.push(arg.clone());
            }
            "-e" | "-u" | "-x" | "-n" | "+e" | "+u" | "+x" | "+n" => set_flags.push(arg.clone()),
            "-o" | "+o" => {
                set_flags.push(arg.clone());
                if i + 1 < argv.len() {
                    i += 1;
                    set_flags.push(argv[i].clone());
                }
            }
            _ => remaining.push(arg.clone()),
        }
        i += 1;
    }

    (set_flags, remaining)
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("DEN_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (set_flags, remaining) = split_set_flags(argv);

    let mut cli_args = vec!["den".to_string()];
    cli_args.extend(remaining);
    let cli = Cli::parse_from(cli_args);

    let mut shell = Shell::new();
    shell.apply_startup_set_flags(&set_flags);

    let exit_code = if let Some(command) = cli.command_string {
        if let Some(name) = cli.script_and_args.first() {
            shell.state.shell_name = name.clone();
        }
        shell.state.positional_params = cli.script_and_args.into_iter().skip(1).collect();
        shell.run_script(&command)
    } else if cli.read_stdin {
        shell.state.positional_params = cli.script_and_args;
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("den: error reading stdin: {}", e);
            std::process::exit(1);
        }
        shell.run_script(&buf)
    } else if let Some(file) = cli.script_and_args.first().cloned() {
        shell.state.shell_name = file.clone();
        shell.state.positional_params = cli.script_and_args.into_iter().skip(1).collect();
        match std::fs::read_to_string(&file) {
            Ok(source) => shell.run_script(&source),
            Err(e) => {
                eprintln!("den: {}: {}", file, e);
                std::process::exit(127);
            }
        }
    } else if cli.interactive || Shell::stdin_is_terminal() {
        shell.run_interactive()
    } else {
        let mut buf = String::new();
        if let Err(e) = std::io::stdin().read_to_string(&mut buf) {
            eprintln!("den: error reading stdin: {}", e);
            std::process::exit(1);
        }
        shell.run_script(&buf)
    };

    std::process::exit(exit_code);
}
