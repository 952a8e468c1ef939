mod app;
pub use app::App;

use anyhow::{Context, Result};
use clap::Parser;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use rating_core::RatingResult;
use rating_experiment::plugin::simulate_data_only;
use rating_experiment::{
    RecordingHost, ResponseSimulator, RngRandomization, SimulationConfig, SimulationMode,
    SimulationOptions, TrialParameters,
};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "confidence-rating")]
#[command(about = "Runs one confidence-rating trial and prints its result as JSON")]
struct Cli {
    /// Trial parameters as a JSON object; defaults apply when omitted
    params: Option<PathBuf>,

    /// Produce the result without a participant
    #[arg(long, value_name = "data-only|visual")]
    simulate: Option<SimulationMode>,

    /// TrueType/OpenType font for the prompt and labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Seed for simulated responses
    #[arg(long)]
    seed: Option<u64>,

    /// Simulated response tick, overriding the random draw
    #[arg(long)]
    response: Option<i64>,

    /// Simulated reaction time in ms, overriding the random draw
    #[arg(long)]
    rt: Option<i64>,
}

impl Cli {
    fn simulation_options(&self) -> SimulationOptions {
        let mut options = SimulationOptions::default();
        if let Some(response) = self.response {
            options = options.with_response(response);
        }
        if let Some(rt) = self.rt {
            options = options.with_rt(rt);
        }
        options
    }

    fn simulator(&self) -> ResponseSimulator<RngRandomization<Pcg32>> {
        let rng = match self.seed {
            Some(seed) => Pcg32::seed_from_u64(seed),
            None => Pcg32::from_rng(&mut rand::rng()),
        };
        ResponseSimulator::new(SimulationConfig::default(), RngRandomization::new(rng))
    }
}

fn load_parameters(path: Option<&Path>) -> Result<TrialParameters> {
    let Some(path) = path else {
        return Ok(TrialParameters::default());
    };
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("reading trial parameters from {}", path.display()))?;
    TrialParameters::from_json_str(&json)
        .with_context(|| format!("parsing trial parameters in {}", path.display()))
}

fn print_result(result: &RatingResult) -> Result<()> {
    println!("{}", serde_json::to_string(result)?);
    Ok(())
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let params = load_parameters(cli.params.as_deref())?;
    let options = cli.simulation_options();
    let mut simulator = cli.simulator();

    let result = match cli.simulate {
        Some(SimulationMode::DataOnly) => {
            let mut host = RecordingHost::new();
            Some(simulate_data_only(&params, &options, &mut simulator, &mut host))
        }
        Some(SimulationMode::Visual) => {
            App::new(params, cli.font, Some((simulator, options)))?.run()?
        }
        None => App::new(params, cli.font, None)?.run()?,
    };

    match result {
        Some(result) => print_result(&result)?,
        None => log::info!("Trial closed without a response"),
    }
    Ok(())
}
