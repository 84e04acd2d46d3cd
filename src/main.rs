// tally: time-travel counter-machine interpreter

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_subscriber::EnvFilter;

use tally::interpreter::config::{parse_input, MachineConfig, DEFAULT_MAX_STEPS};
use tally::interpreter::engine::Machine;
use tally::program::{library, Instruction};
use tally::ui::App;

/// Run a counter-machine macro and browse its execution history.
///
/// The named library macro becomes the whole program, called with its own
/// parameter names as arguments, so `tally add x1=2 x2=3` computes
/// `add(y, x1, x2)`.
///
/// EXAMPLES:
///     tally add x1=2 x2=3          Browse the history of 2 + 3
///     tally fact x=3 --plain       Print 3! without the viewer
///     tally --show equals          Print a macro definition
///
/// ENVIRONMENT VARIABLES:
///     TALLY_MAX_STEPS   Default step budget
///     TALLY_LOG         tracing filter directives (e.g. "debug")
#[derive(Parser)]
#[command(name = "tally")]
#[command(version)]
struct Cli {
    /// Library macro to run (goto, zeros, equals, add, subtract, mul, fact)
    #[arg(required_unless_present_any = ["list", "show"])]
    macro_name: Option<String>,

    /// Inputs as NAME=VALUE pairs
    inputs: Vec<String>,

    /// Step budget before the run is abandoned
    #[arg(long, env = "TALLY_MAX_STEPS", default_value_t = DEFAULT_MAX_STEPS)]
    max_steps: usize,

    /// Log a record of every step to stderr
    #[arg(long)]
    trace: bool,

    /// Print the result instead of opening the viewer
    #[arg(long)]
    plain: bool,

    /// Print every library macro and exit
    #[arg(long)]
    list: bool,

    /// Print one macro definition and exit
    #[arg(long, value_name = "MACRO")]
    show: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.trace);

    let config = MachineConfig {
        max_steps: cli.max_steps,
        ..MachineConfig::default()
    };
    let output_variable = config.output_variable.clone();
    let mut machine = Machine::with_config(config);
    machine.register_macros(library::standard_macros(), false)?;

    if cli.list {
        println!("{}", machine.describe_macros());
        return Ok(());
    }
    if let Some(name) = &cli.show {
        println!("{}", machine.describe_macro(name)?);
        return Ok(());
    }

    let name = cli.macro_name.context("no macro given")?;
    let params = machine.get_macro(&name)?.params.clone();
    let inputs = cli
        .inputs
        .iter()
        .map(|assignment| parse_input(assignment))
        .collect::<Result<Vec<_>, _>>()?;

    machine.set_inputs(inputs);
    machine.set_program(vec![Instruction::call(name.as_str(), params)])?;

    // Run execution to build history
    let result = machine.run_default(cli.trace);

    if cli.plain {
        let output = result?;
        println!("{} = {}", output_variable, output);
        eprintln!(
            "{} steps, {} snapshots",
            machine.step_count(),
            machine.history_len()
        );
        return Ok(());
    }

    let run_error = match result {
        Ok(output) => {
            eprintln!("Execution completed: {} = {}", output_variable, output);
            None
        }
        Err(e) => {
            eprintln!("Runtime error: {}", e);
            eprintln!("Entering viewer with partial execution history...");
            Some(e.to_string())
        }
    };

    // Rewind to the beginning for the viewer
    if let Err(e) = machine.rewind_to_start() {
        eprintln!("Warning: Failed to rewind to start: {}", e);
    }

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(machine, run_error);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res.context("viewer failed")
}

fn init_tracing(trace: bool) {
    let default = if trace {
        "warn,tally::trace=info"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_env("TALLY_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
