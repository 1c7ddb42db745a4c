use std::path::PathBuf;

use clap::Parser;
use rumake::build::{make, BuildContext, BuildOptions};
use rumake::engine::Engine;
use rumake::error::MakeError;
use rumake::makeflags::{encode_makeflags, split_makeflags};
use rumake::pragma::{Pragma, Standard};
use rumake::signals;

/// `make [--posix] [-C dir] [-f file] [-j N] [-x pragma] [-ehiknpqrsSt]
/// [NAME=value ...] [target ...]`
#[derive(Parser)]
#[command(name = "make")]
#[command(about = "Rebuild targets according to a makefile's dependency rules")]
#[command(version)]
struct Cli {
    /// Enforce strict POSIX.1-2017 conformance.
    #[arg(long = "posix")]
    posix: bool,

    /// Change to `dir` before reading any makefile.
    #[arg(short = 'C')]
    directory: Option<PathBuf>,

    /// Read `file` as a makefile ('-' means stdin). Repeatable.
    #[arg(short = 'f')]
    file: Vec<String>,

    /// Accepted and ignored: no parallel job scheduler is implemented.
    #[arg(short = 'j')]
    jobs: Option<u32>,

    /// Enable a named pragma (`macro_name`, `target_name`,
    /// `command_comment`, `empty_suffix`, `posix_202x`). Repeatable.
    #[arg(short = 'x')]
    pragma: Vec<String>,

    /// Environment beats makefile assignments.
    #[arg(short = 'e')]
    use_env: bool,
    /// Ignore command errors globally, as if every recipe began with `-`.
    #[arg(short = 'i')]
    ignore_errors: bool,
    /// Continue processing unrelated targets after an error.
    #[arg(short = 'k')]
    keep_going: bool,
    /// Dry run: print commands without executing them.
    #[arg(short = 'n')]
    pretend: bool,
    /// Dump macro and rule definitions after parsing, then build as usual.
    #[arg(short = 'p')]
    print: bool,
    /// Question mode: don't build anything, just report whether targets
    /// are up to date.
    #[arg(short = 'q')]
    question: bool,
    /// Skip the built-in inference rules (built-in macros are kept).
    #[arg(short = 'r')]
    no_builtin_rules: bool,
    /// Don't echo commands before running them.
    #[arg(short = 's')]
    silent: bool,
    /// Stop immediately on the first error (overrides `-k` if both given).
    #[arg(short = 'S')]
    stop: bool,
    /// Touch targets instead of running their recipes.
    #[arg(short = 't')]
    touch: bool,

    /// `NAME=value` macro definitions and target names, in any order.
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    free: Vec<String>,
}

fn myname() -> String {
    std::env::args()
        .next()
        .map(|a| {
            PathBuf::from(a)
                .file_name()
                .map(|f| f.to_string_lossy().into_owned())
                .unwrap_or_else(|| "make".to_string())
        })
        .unwrap_or_else(|| "make".to_string())
}

fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_env("RUST_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn exit_code_for(err: &MakeError) -> i32 {
    match err {
        MakeError::FailedExit(..) | MakeError::FailedSignal(..) | MakeError::NotBuiltDueToErrors(..) => 2,
        _ => 2,
    }
}

fn run() -> Result<i32, MakeError> {
    let cli = Cli::parse();
    let progname = myname();

    if let Some(dir) = &cli.directory {
        std::env::set_current_dir(dir).map_err(|e| MakeError::Other(format!("can't chdir to {}: {}", dir.display(), e)))?;
    }

    let posix = cli.posix || std::env::var("PDPMAKE_POSIXLY_CORRECT").is_ok();
    let mut standard = if posix { Standard::Posix2017 } else { Standard::Extended };

    let mut pragma = Pragma::default();
    for word in &cli.pragma {
        if word == "posix_202x" {
            if standard == Standard::Posix2017 {
                standard = Standard::Posix2024;
            }
        } else {
            pragma.apply(word);
        }
    }

    let mut engine = Engine::new(standard, cli.use_env);
    engine.pragma = pragma;

    engine.set_makeflags_macro("MAKE", &progname);
    if let Ok(cwd) = std::env::current_dir() {
        engine.set_makeflags_macro("CURDIR", &cwd.to_string_lossy());
    }

    let mut active_letters = String::new();
    for (flag, letter) in [
        (cli.use_env, 'e'),
        (cli.ignore_errors, 'i'),
        (cli.keep_going && !cli.stop, 'k'),
        (cli.pretend, 'n'),
        (cli.question, 'q'),
        (cli.silent, 's'),
        (cli.touch, 't'),
    ] {
        if flag {
            active_letters.push(letter);
        }
    }

    let mut macro_args: Vec<(String, String)> = Vec::new();
    let mut targets: Vec<String> = Vec::new();
    for token in &cli.free {
        if let Some(eq) = token.find('=') {
            let (name, value) = token.split_at(eq);
            macro_args.push((name.to_string(), value[1..].to_string()));
        } else {
            targets.push(token.clone());
        }
    }
    for (name, value) in &macro_args {
        engine.set_cmdline_macro(name, value);
    }

    if let Ok(makeflags_env) = std::env::var("MAKEFLAGS") {
        if let Ok(tokens) = split_makeflags(&makeflags_env) {
            for tok in tokens {
                if let Some(eq) = tok.find('=') {
                    let (name, value) = tok.split_at(eq);
                    engine.set_makeflags_macro(name, &value[1..]);
                }
            }
        }
    }

    for (name, value) in std::env::vars() {
        if name == "MAKEFLAGS" || name == "SHELL" {
            continue;
        }
        engine.set_env_macro(&name, &value);
    }

    engine.read_builtin_rules(cli.no_builtin_rules)?;

    let files: Vec<String> = if cli.file.is_empty() {
        default_makefile()?
    } else {
        cli.file.clone()
    };
    for file in &files {
        if file == "-" {
            engine.read_stdin()?;
        } else {
            engine.read_file(file)?;
        }
    }

    engine.finish(cli.silent, cli.ignore_errors, false);

    if cli.print {
        print_details(&engine);
    }

    if let Some(flags) = encode_makeflags(&active_letters, &engine.macros) {
        std::env::set_var("MAKEFLAGS", flags);
    }

    let build_opts = BuildOptions {
        pretend: cli.pretend,
        touch: cli.touch,
        question: cli.question,
        keep_going: cli.keep_going && !cli.stop,
        ignore_errors: cli.ignore_errors || engine.ignore_global,
        silent: cli.silent || engine.silent_global,
        standard: engine.standard,
    };

    signals::install_handlers();

    let goal_targets: Vec<rumake::symtab::NameId> = if targets.is_empty() {
        match engine.names.first_name {
            Some(id) => vec![id],
            None => return Err(MakeError::NoTargetsDefined),
        }
    } else {
        targets.iter().map(|t| engine.names.intern_target(t)).collect::<Result<_, _>>()?
    };

    let mut any_failed = false;
    let mut any_out_of_date = false;
    for target in goal_targets {
        let mut ctx = BuildContext::new(&mut engine.names, &engine.rules, &mut engine.macros, &build_opts)
            .with_myname(progname.clone());
        let outcome = make(&mut ctx, target, 0)?;
        any_failed |= ctx.any_failed;
        any_out_of_date |= outcome.out_of_date;
    }

    if cli.question {
        return Ok(if any_out_of_date { 1 } else { 0 });
    }
    Ok(if any_failed { 2 } else { 0 })
}

/// Default makefile lookup: `makefile` then `Makefile`, matching
/// `main.c`'s fixed search order.
fn default_makefile() -> Result<Vec<String>, MakeError> {
    for candidate in ["makefile", "Makefile"] {
        if std::path::Path::new(candidate).is_file() {
            return Ok(vec![candidate.to_string()]);
        }
    }
    Err(MakeError::NoMakefileFound)
}

/// `-p`: dump every known macro and rule, in declaration order, the way
/// `check.c`'s `print_details` does.
fn print_details(engine: &Engine) {
    for m in engine.macros.iter() {
        println!("{} = {}", m.name, m.value);
    }
    for name in engine.names.iter() {
        if name.rules.is_empty() {
            continue;
        }
        for &rule_id in &name.rules {
            let rule = engine.rules.rule(rule_id);
            let sep = if rule.double_colon { "::" } else { ":" };
            let deps: Vec<&str> = rule.deps.iter().map(|d| engine.names.get(*d).name.as_str()).collect();
            println!("{}{} {}", name.name, sep, deps.join(" "));
            for &cmd_id in &rule.cmds {
                println!("\t{}", engine.rules.cmd(cmd_id).text);
            }
        }
    }
}

fn main() {
    init_logging();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("{}: {}", myname(), e);
            std::process::exit(exit_code_for(&e));
        }
    }
}
