//! Hardware bring-up collaborators.
//!
//! A capture on real hardware goes through three external steps: build the
//! firmware image, copy it onto the board's mass-storage volume, then read
//! the runtime-stats output on the serial console across the sampling window.
//! Each step sits behind a trait so the workflow can run against mocks.

use std::{
    marker::PhantomData,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Duration, Instant},
};

use tracing::{info, warn};

use crate::{
    analysis::SamplingWindow,
    context::StatContext,
    error::{AcquisitionStage, Result, StatError},
    TraceSource,
};

pub mod cmake;
pub mod flasher;
#[cfg(target_os = "linux")]
pub mod serial;

pub use cmake::CmakeBuilder;
pub use flasher::{resolve_artifact, MassStorageFlasher};

pub trait FirmwareBuilder {
    fn build(&self, project_dir: &Path) -> Result<()>;
}

pub trait DeviceFlasher {
    fn flash(&self, artifact: &Path, mount_dir: &Path) -> Result<()>;
}

/// Serial port parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SerialSettings {
    pub port: PathBuf,
    pub baud_rate: u32,
    /// Upper bound of a single `read_chunk` call.
    pub timeout: Duration,
}

pub trait SerialChannel: Sized {
    fn open(settings: &SerialSettings) -> Result<Self>;

    /// Reads at most `max_bytes`. Returns early, possibly with no data at
    /// all, when the read timeout expires.
    fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>>;
}

/// Device and capture parameters of the `run` and `capture` commands.
#[derive(Debug, Clone)]
pub struct DeviceSettings {
    pub build_dir: PathBuf,
    pub mount_dir: PathBuf,
    /// Glob pattern of the firmware image, relative to `build_dir`.
    pub artifact: String,
    pub serial: SerialSettings,
    pub chunk_size: usize,
    /// Time left to the board to reboot and enumerate after flashing.
    pub connection_delay: Duration,
    pub skip_build: bool,
    pub skip_flash: bool,
    pub allow_non_root: bool,
}

const SLEEP_SLICE: Duration = Duration::from_millis(100);

fn interruptible_sleep(duration: Duration, stop: &AtomicBool) -> Result<()> {
    let deadline = Instant::now() + duration;

    loop {
        if stop.load(Ordering::Relaxed) {
            return Err(StatError::acquisition(
                AcquisitionStage::Read,
                "capture interrupted",
            ));
        }

        let now = Instant::now();
        if now >= deadline {
            return Ok(());
        }

        std::thread::sleep(SLEEP_SLICE.min(deadline - now));
    }
}

/// Reads one chunk per interval of `window` and returns the last one.
///
/// Earlier chunks only drain the channel: the firmware prints cumulative
/// counters, so the final block covers the whole window.
pub fn capture_final_interval<C: SerialChannel>(
    channel: &mut C,
    window: &SamplingWindow,
    chunk_size: usize,
    stop: &AtomicBool,
) -> Result<String> {
    let mut last = None;

    for i in 0..window.interval_count {
        interruptible_sleep(window.interval, stop)?;

        let chunk = channel.read_chunk(chunk_size)?;

        info!(
            "record ({}/{}) received, {} bytes",
            i + 1,
            window.interval_count,
            chunk.len()
        );

        last = Some(chunk);
    }

    let data = last.ok_or_else(|| {
        StatError::acquisition(AcquisitionStage::Read, "sampling window has no interval")
    })?;

    if data.is_empty() {
        warn!("final interval read returned no data");
    }

    if !data.is_ascii() {
        return Err(StatError::acquisition(
            AcquisitionStage::Read,
            "trace is not ASCII text",
        ));
    }

    String::from_utf8(data).map_err(|e| StatError::acquisition(AcquisitionStage::Read, e))
}

fn check_root(allow_non_root: bool) -> Result<()> {
    if allow_non_root || nix::unistd::geteuid().is_root() {
        return Ok(());
    }

    Err(StatError::acquisition(
        AcquisitionStage::Flash,
        "root privilege required (use --allow-non-root to bypass)",
    ))
}

/// Full hardware workflow: build, flash, then capture the serial output.
pub struct DeviceSource<B, F, C> {
    builder: B,
    flasher: F,
    settings: DeviceSettings,
    stop: Arc<AtomicBool>,
    channel: PhantomData<C>,
}

impl<B, F, C> DeviceSource<B, F, C>
where
    B: FirmwareBuilder,
    F: DeviceFlasher,
    C: SerialChannel,
{
    pub fn new(builder: B, flasher: F, settings: DeviceSettings) -> Self {
        Self {
            builder,
            flasher,
            settings,
            stop: Arc::new(AtomicBool::new(false)),
            channel: PhantomData,
        }
    }

    fn prepare_device(&self) -> Result<()> {
        let s = &self.settings;

        if s.skip_build {
            info!("firmware build skipped");
        } else {
            self.builder.build(&s.build_dir)?;
            info!("project built");
        }

        if s.skip_flash {
            info!("device flash skipped");
        } else {
            let artifact = resolve_artifact(&s.build_dir, &s.artifact)?;
            self.flasher.flash(&artifact, &s.mount_dir)?;
            info!("project loaded from {}", artifact.display());
        }

        Ok(())
    }

    fn capture(&self, window: &SamplingWindow) -> Result<String> {
        let s = &self.settings;

        info!("waiting for connection setup");
        interruptible_sleep(s.connection_delay, &self.stop)?;

        let mut channel = C::open(&s.serial)?;
        info!("connected to {}", s.serial.port.display());

        capture_final_interval(&mut channel, window, s.chunk_size, &self.stop)
    }
}

impl<B, F, C> TraceSource for DeviceSource<B, F, C>
where
    B: FirmwareBuilder,
    F: DeviceFlasher,
    C: SerialChannel,
{
    fn acquire(&mut self, ctx: &StatContext) -> anyhow::Result<String> {
        check_root(self.settings.allow_non_root)?;

        self.prepare_device()?;

        signal_hook::flag::register(signal_hook::consts::SIGINT, Arc::clone(&self.stop))?;

        Ok(self.capture(&ctx.window)?)
    }
}

#[cfg(test)]
mod tests {
    use std::{
        cell::RefCell,
        path::{Path, PathBuf},
        rc::Rc,
        sync::atomic::{AtomicBool, Ordering},
        time::Duration,
    };

    use super::{
        capture_final_interval, DeviceFlasher, DeviceSettings, DeviceSource, FirmwareBuilder,
        SerialChannel, SerialSettings,
    };
    use crate::{
        analysis::SamplingWindow,
        error::{AcquisitionStage, Result, StatError},
    };

    /// Replays canned chunks, then times out with empty reads.
    struct ScriptedChannel {
        chunks: Vec<Vec<u8>>,
        reads: usize,
    }

    impl ScriptedChannel {
        fn new(chunks: &[&str]) -> Self {
            Self {
                chunks: chunks.iter().map(|c| c.as_bytes().to_vec()).collect(),
                reads: 0,
            }
        }
    }

    impl SerialChannel for ScriptedChannel {
        /// Numbers each read after the port name.
        fn open(settings: &SerialSettings) -> Result<Self> {
            let port = settings.port.display().to_string();
            let chunks: Vec<String> = (1..=8).map(|i| format!("{} read {}", port, i)).collect();
            let refs: Vec<&str> = chunks.iter().map(String::as_str).collect();

            Ok(Self::new(&refs))
        }

        fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
            let mut chunk = self.chunks.get(self.reads).cloned().unwrap_or_default();
            chunk.truncate(max_bytes);
            self.reads += 1;
            Ok(chunk)
        }
    }

    fn window(count: u32) -> SamplingWindow {
        SamplingWindow::new(count, Duration::ZERO)
    }

    #[test]
    fn test_only_final_interval_kept() {
        let mut channel = ScriptedChannel::new(&["first", "second", "final"]);
        let stop = AtomicBool::new(false);

        let text = capture_final_interval(&mut channel, &window(3), 4000, &stop).unwrap();

        assert_eq!(text, "final");
        assert_eq!(channel.reads, 3);
    }

    #[test]
    fn test_chunk_size_bound() {
        let mut channel = ScriptedChannel::new(&["0123456789"]);
        let stop = AtomicBool::new(false);

        let text = capture_final_interval(&mut channel, &window(1), 4, &stop).unwrap();

        assert_eq!(text, "0123");
    }

    #[test]
    fn test_stalled_device_yields_empty_trace() {
        let mut channel = ScriptedChannel::new(&["partial"]);
        let stop = AtomicBool::new(false);

        let text = capture_final_interval(&mut channel, &window(2), 4000, &stop).unwrap();

        assert!(text.is_empty());
    }

    #[test]
    fn test_non_ascii_rejected() {
        let mut channel = ScriptedChannel {
            chunks: vec![vec![b'I', 0xff, b'E']],
            reads: 0,
        };
        let stop = AtomicBool::new(false);

        assert!(matches!(
            capture_final_interval(&mut channel, &window(1), 4000, &stop),
            Err(StatError::Acquisition {
                stage: AcquisitionStage::Read,
                ..
            })
        ));
    }

    #[test]
    fn test_interrupted_capture() {
        let mut channel = ScriptedChannel::new(&["a", "b"]);
        let stop = AtomicBool::new(false);
        stop.store(true, Ordering::Relaxed);

        assert!(capture_final_interval(&mut channel, &window(2), 4000, &stop).is_err());
        assert_eq!(channel.reads, 0);
    }

    #[test]
    fn test_empty_window() {
        let mut channel = ScriptedChannel::new(&["a"]);
        let stop = AtomicBool::new(false);

        assert!(capture_final_interval(&mut channel, &window(0), 4000, &stop).is_err());
    }

    #[derive(Clone, Default)]
    struct Calls(Rc<RefCell<Vec<String>>>);

    impl Calls {
        fn push(&self, call: String) {
            self.0.borrow_mut().push(call);
        }

        fn get(&self) -> Vec<String> {
            self.0.borrow().clone()
        }
    }

    struct MockBuilder(Calls, bool);

    impl FirmwareBuilder for MockBuilder {
        fn build(&self, project_dir: &Path) -> Result<()> {
            self.0.push(format!("build {}", project_dir.display()));
            if self.1 {
                Ok(())
            } else {
                Err(StatError::acquisition(AcquisitionStage::Build, "exit 2"))
            }
        }
    }

    struct MockFlasher(Calls);

    impl DeviceFlasher for MockFlasher {
        fn flash(&self, artifact: &Path, mount_dir: &Path) -> Result<()> {
            let name = artifact.file_name().unwrap().to_string_lossy().to_string();
            self.0.push(format!("flash {} {}", name, mount_dir.display()));
            Ok(())
        }
    }

    fn settings(build_dir: &Path) -> DeviceSettings {
        DeviceSettings {
            build_dir: build_dir.to_path_buf(),
            mount_dir: PathBuf::from("/media/RPI-RP2"),
            artifact: "*.uf2".to_string(),
            serial: SerialSettings {
                port: PathBuf::from("/dev/ttyACM0"),
                baud_rate: 115_200,
                timeout: Duration::from_millis(500),
            },
            chunk_size: 4000,
            connection_delay: Duration::ZERO,
            skip_build: false,
            skip_flash: false,
            allow_non_root: true,
        }
    }

    #[test]
    fn test_device_workflow() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("demo.uf2"), b"image").unwrap();

        let calls = Calls::default();
        let source: DeviceSource<_, _, ScriptedChannel> = DeviceSource::new(
            MockBuilder(calls.clone(), true),
            MockFlasher(calls.clone()),
            settings(dir.path()),
        );

        source.prepare_device().unwrap();
        let text = source.capture(&window(3)).unwrap();

        assert_eq!(
            calls.get(),
            vec![
                format!("build {}", dir.path().display()),
                "flash demo.uf2 /media/RPI-RP2".to_string(),
            ]
        );
        assert_eq!(text, "/dev/ttyACM0 read 3");
    }

    #[test]
    fn test_build_failure_stops_workflow() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Calls::default();
        let source: DeviceSource<_, _, ScriptedChannel> = DeviceSource::new(
            MockBuilder(calls.clone(), false),
            MockFlasher(calls.clone()),
            settings(dir.path()),
        );

        assert!(matches!(
            source.prepare_device(),
            Err(StatError::Acquisition {
                stage: AcquisitionStage::Build,
                ..
            })
        ));
        assert_eq!(calls.get().len(), 1);
    }

    #[test]
    fn test_skip_build_and_flash() {
        let dir = tempfile::tempdir().unwrap();
        let calls = Calls::default();
        let mut s = settings(dir.path());
        s.skip_build = true;
        s.skip_flash = true;

        let source: DeviceSource<_, _, ScriptedChannel> =
            DeviceSource::new(MockBuilder(calls.clone(), false), MockFlasher(calls.clone()), s);

        source.prepare_device().unwrap();
        assert!(calls.get().is_empty());
    }
}
