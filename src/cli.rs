//! Command line interface.
//!
//! Default capture parameters match the pico demo firmware: the runtime
//! stats are printed on a 115200 baud console, and four 6 s intervals are
//! read.

use std::{path::PathBuf, time::Duration};

use clap::{Args, Parser, Subcommand};

use crate::{
    acquisition::{DeviceSettings, SerialSettings},
    analysis::SamplingWindow,
    report::ReportFormat,
};

fn parse_duration(s: &str) -> Result<Duration, String> {
    duration_str::parse(s).map_err(|e| e.to_string())
}

#[derive(Parser, Debug)]
#[command(author, version, about = "RTOS runtime-stats utilization analyzer")]
pub struct CLI {
    #[command(subcommand)]
    pub command: StatSubCommand,

    /// Log every pipeline step
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Task catalog (JSON) replacing the built-in FreeRTOS demo catalog
    #[arg(long, global = true, value_name = "FILE")]
    tasks: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum StatSubCommand {
    /// Build, flash, capture and report
    Run {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },

    /// Build, flash and save the captured trace for later analysis
    Capture {
        #[command(flatten)]
        device: DeviceArgs,

        #[command(flatten)]
        window: WindowArgs,

        /// Directory receiving the trace file
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Report on a saved trace
    Analyze {
        /// Trace file
        #[arg(value_name = "TRACE")]
        from: PathBuf,

        #[command(flatten)]
        window: WindowArgs,

        /// Report format
        #[arg(long, value_enum, default_value_t = ReportFormat::Table)]
        format: ReportFormat,
    },

    /// List the task catalog
    Tasks,
}

/// Sampling window of the capture.
#[derive(Args, Debug, Clone)]
pub struct WindowArgs {
    /// Number of sampling intervals. Only the last one is analyzed
    #[arg(long, default_value_t = 4, value_parser = clap::value_parser!(u32).range(1..))]
    pub intervals: u32,

    /// Duration of one sampling interval
    #[arg(long, default_value = "6s", value_parser = parse_duration)]
    pub interval: Duration,
}

impl From<&WindowArgs> for SamplingWindow {
    fn from(args: &WindowArgs) -> Self {
        SamplingWindow::new(args.intervals, args.interval)
    }
}

/// Target board parameters.
#[derive(Args, Debug, Clone)]
pub struct DeviceArgs {
    /// Configured CMake build directory of the firmware
    pub build_dir: PathBuf,

    /// Mount point of the board's mass-storage volume
    pub mount_dir: PathBuf,

    /// Serial console device
    pub serial_port: PathBuf,

    /// Firmware image, as a glob pattern relative to the build directory
    #[arg(long, default_value = "demo.uf2")]
    pub artifact: String,

    /// Serial console baud rate
    #[arg(long, default_value_t = 115_200)]
    pub baud: u32,

    /// Timeout of one serial read
    #[arg(long, default_value = "500ms", value_parser = parse_duration)]
    pub read_timeout: Duration,

    /// Maximum number of bytes read per interval
    #[arg(long, default_value_t = 4000)]
    pub chunk_size: usize,

    /// Delay between flashing and opening the serial port
    #[arg(long, default_value = "2s", value_parser = parse_duration)]
    pub connection_delay: Duration,

    /// Do not rebuild the firmware
    #[arg(long)]
    pub skip_build: bool,

    /// Do not flash the device (implies the firmware is already running)
    #[arg(long)]
    pub skip_flash: bool,

    /// Do not require root privileges
    #[arg(long)]
    pub allow_non_root: bool,
}

impl From<&DeviceArgs> for DeviceSettings {
    fn from(args: &DeviceArgs) -> Self {
        Self {
            build_dir: args.build_dir.clone(),
            mount_dir: args.mount_dir.clone(),
            artifact: args.artifact.clone(),
            serial: SerialSettings {
                port: args.serial_port.clone(),
                baud_rate: args.baud,
                timeout: args.read_timeout,
            },
            chunk_size: args.chunk_size,
            connection_delay: args.connection_delay,
            skip_build: args.skip_build,
            skip_flash: args.skip_flash,
            allow_non_root: args.allow_non_root,
        }
    }
}

impl CLI {
    pub fn tasks(&self) -> Option<&PathBuf> {
        self.tasks.as_ref()
    }

    pub fn window(&self) -> SamplingWindow {
        match &self.command {
            StatSubCommand::Run { window, .. }
            | StatSubCommand::Capture { window, .. }
            | StatSubCommand::Analyze { window, .. } => SamplingWindow::from(window),
            StatSubCommand::Tasks => SamplingWindow::default(),
        }
    }

    pub fn report_format(&self) -> ReportFormat {
        match &self.command {
            StatSubCommand::Run { format, .. } | StatSubCommand::Analyze { format, .. } => *format,
            _ => ReportFormat::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use clap::{CommandFactory, Parser};

    use super::{StatSubCommand, CLI};
    use crate::{acquisition::DeviceSettings, analysis::SamplingWindow, report::ReportFormat};

    #[test]
    fn test_cli_definition() {
        CLI::command().debug_assert();
    }

    #[test]
    fn test_run_defaults() {
        let cli = CLI::parse_from(["rtstat", "run", "build", "/media/RPI-RP2", "/dev/ttyACM0"]);

        assert_eq!(cli.window(), SamplingWindow::new(4, Duration::from_secs(6)));
        assert_eq!(cli.report_format(), ReportFormat::Table);

        let StatSubCommand::Run { device, .. } = &cli.command else {
            panic!("expected run");
        };
        let settings = DeviceSettings::from(device);

        assert_eq!(settings.build_dir, PathBuf::from("build"));
        assert_eq!(settings.artifact, "demo.uf2");
        assert_eq!(settings.serial.port, PathBuf::from("/dev/ttyACM0"));
        assert_eq!(settings.serial.baud_rate, 115_200);
        assert_eq!(settings.serial.timeout, Duration::from_millis(500));
        assert_eq!(settings.chunk_size, 4000);
        assert_eq!(settings.connection_delay, Duration::from_secs(2));
        assert!(!settings.skip_build && !settings.skip_flash && !settings.allow_non_root);
    }

    #[test]
    fn test_analyze_options() {
        let cli = CLI::parse_from([
            "rtstat",
            "analyze",
            "capture.trace",
            "--intervals",
            "2",
            "--interval",
            "1500ms",
            "--format",
            "json",
            "--tasks",
            "tasks.json",
        ]);

        assert_eq!(cli.window().total_elapsed_us(), 3_000_000);
        assert_eq!(cli.report_format(), ReportFormat::Json);
        assert_eq!(cli.tasks(), Some(&PathBuf::from("tasks.json")));
    }

    #[test]
    fn test_zero_intervals_rejected() {
        assert!(CLI::try_parse_from(["rtstat", "analyze", "t", "--intervals", "0"]).is_err());
        assert!(CLI::try_parse_from(["rtstat", "analyze", "t", "--interval", "soon"]).is_err());
    }
}
