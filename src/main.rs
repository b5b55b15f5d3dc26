use anyhow::{Error, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use rtstat::{
    cli::*, context::StatContext, processors::report::Reporter, report::write_catalog, run,
    trace::reader::TraceFileSource,
};

#[cfg(target_os = "linux")]
use rtstat::{
    acquisition::{
        serial::TtySerialChannel, CmakeBuilder, DeviceSettings, DeviceSource, MassStorageFlasher,
    },
    io::CaptureDirectory,
    processors::save_trace::TraceWriter,
};

#[cfg(target_os = "linux")]
type PicoSource = DeviceSource<CmakeBuilder, MassStorageFlasher, TtySerialChannel>;

#[cfg(target_os = "linux")]
fn device_source(args: &DeviceArgs) -> PicoSource {
    DeviceSource::new(
        CmakeBuilder::new(),
        MassStorageFlasher,
        DeviceSettings::from(args),
    )
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Error> {
    let opts = CLI::parse();
    init_logging(opts.verbose);

    let ctx = StatContext::try_from(&opts)?;

    match &opts.command {
        #[cfg(target_os = "linux")]
        StatSubCommand::Run { device, .. } => {
            let processor = Reporter::from(&ctx);

            run(device_source(device), processor, &ctx)
        }
        #[cfg(target_os = "linux")]
        StatSubCommand::Capture { device, output, .. } => {
            let processor = TraceWriter::new(CaptureDirectory::new(output));

            run(device_source(device), processor, &ctx)
        }
        #[cfg(not(target_os = "linux"))]
        StatSubCommand::Run { .. } | StatSubCommand::Capture { .. } => {
            anyhow::bail!("device acquisition is only supported on Linux")
        }
        StatSubCommand::Analyze { from, .. } => {
            let processor = Reporter::from(&ctx);

            run(TraceFileSource::new(from), processor, &ctx)
        }
        StatSubCommand::Tasks => {
            let stdout = std::io::stdout();
            write_catalog(&mut stdout.lock(), &ctx.registry)
        }
    }
}
