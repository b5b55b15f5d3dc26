//! Serial console over a tty device.

use std::{
    fs::{File, OpenOptions},
    io::{ErrorKind, Read},
    os::unix::{fs::OpenOptionsExt, io::AsRawFd},
    time::{Duration, Instant},
};

use nix::sys::termios::{
    cfmakeraw, cfsetspeed, tcflush, tcgetattr, tcsetattr, BaudRate, ControlFlags, FlushArg,
    SetArg, SpecialCharacterIndices,
};
use tracing::debug;

use super::{SerialChannel, SerialSettings};
use crate::error::{AcquisitionStage, Result, StatError};

fn connect_error<R: std::fmt::Display>(settings: &SerialSettings, reason: R) -> StatError {
    StatError::acquisition(
        AcquisitionStage::Connect,
        format!("{}: {}", settings.port.display(), reason),
    )
}

fn baud_rate(rate: u32) -> Option<BaudRate> {
    let b = match rate {
        9600 => BaudRate::B9600,
        19200 => BaudRate::B19200,
        38400 => BaudRate::B38400,
        57600 => BaudRate::B57600,
        115_200 => BaudRate::B115200,
        230_400 => BaudRate::B230400,
        460_800 => BaudRate::B460800,
        921_600 => BaudRate::B921600,
        _ => return None,
    };

    Some(b)
}

/// Read timeout in the termios `VTIME` unit (tenths of a second).
fn vtime(timeout: Duration) -> u8 {
    (timeout.as_millis() / 100).clamp(1, 255) as u8
}

/// Raw-mode tty. A read returns as soon as data is available, or with
/// nothing once `VTIME` expires.
pub struct TtySerialChannel {
    file: File,
    timeout: Duration,
}

impl TtySerialChannel {
    fn configure(file: &File, settings: &SerialSettings) -> Result<()> {
        let fd = file.as_raw_fd();
        let speed = baud_rate(settings.baud_rate).ok_or_else(|| {
            connect_error(
                settings,
                format!("unsupported baud rate {}", settings.baud_rate),
            )
        })?;

        let mut termios = tcgetattr(fd).map_err(|e| connect_error(settings, e))?;

        cfmakeraw(&mut termios);
        cfsetspeed(&mut termios, speed).map_err(|e| connect_error(settings, e))?;
        termios.control_flags |= ControlFlags::CLOCAL | ControlFlags::CREAD;
        termios.control_chars[SpecialCharacterIndices::VMIN as usize] = 0;
        termios.control_chars[SpecialCharacterIndices::VTIME as usize] = vtime(settings.timeout);

        tcsetattr(fd, SetArg::TCSANOW, &termios).map_err(|e| connect_error(settings, e))?;
        tcflush(fd, FlushArg::TCIFLUSH).map_err(|e| connect_error(settings, e))?;

        Ok(())
    }
}

impl SerialChannel for TtySerialChannel {
    fn open(settings: &SerialSettings) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(&settings.port)
            .map_err(|e| connect_error(settings, e))?;

        Self::configure(&file, settings)?;

        debug!(
            "{} configured at {} baud",
            settings.port.display(),
            settings.baud_rate
        );

        Ok(Self {
            file,
            timeout: settings.timeout,
        })
    }

    fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; max_bytes];
        let mut filled = 0;
        let deadline = Instant::now() + self.timeout;

        while filled < max_bytes && Instant::now() < deadline {
            match self.file.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StatError::acquisition(AcquisitionStage::Read, e)),
            }
        }

        buf.truncate(filled);

        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use std::{path::PathBuf, time::Duration};

    use super::{baud_rate, vtime, TtySerialChannel};
    use crate::{
        acquisition::{SerialChannel, SerialSettings},
        error::{AcquisitionStage, StatError},
    };

    #[test]
    fn test_baud_rates() {
        assert!(baud_rate(115_200).is_some());
        assert!(baud_rate(9600).is_some());
        assert!(baud_rate(12_345).is_none());
    }

    #[test]
    fn test_vtime() {
        assert_eq!(vtime(Duration::from_millis(500)), 5);
        assert_eq!(vtime(Duration::ZERO), 1);
        assert_eq!(vtime(Duration::from_secs(60)), 255);
    }

    #[test]
    fn test_open_missing_port() {
        let settings = SerialSettings {
            port: PathBuf::from("/dev/rtstat-no-such-tty"),
            baud_rate: 115_200,
            timeout: Duration::from_millis(500),
        };

        assert!(matches!(
            TtySerialChannel::open(&settings),
            Err(StatError::Acquisition {
                stage: AcquisitionStage::Connect,
                ..
            })
        ));
    }
}
