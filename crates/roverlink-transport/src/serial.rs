use std::ffi::CString;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd, RawFd};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{DataBits, Parity, SerialConfig, StopBits};
use crate::error::{Result, TransportError};

/// An open serial device.
///
/// The receiver and sender sides of a session each hold their own handle
/// (see [`SerialStream::try_clone`]); the tty is full duplex, so reads and
/// writes need no mutual exclusion between them. The descriptor is closed
/// when the last handle drops.
pub struct SerialStream {
    fd: OwnedFd,
    path: PathBuf,
}

impl SerialStream {
    /// Open and configure a serial device.
    ///
    /// The port is put into raw mode with `VMIN = 0` and
    /// `VTIME = read_timeout_ds`, so reads return zero after the timeout
    /// when no data has arrived. Any pending bytes from before the open
    /// are flushed.
    pub fn open(path: impl AsRef<Path>, config: &SerialConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let speed = baud_to_speed(config.baud_rate)?;

        let c_path =
            CString::new(path.as_os_str().as_bytes()).map_err(|_| TransportError::Open {
                path: path.clone(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "path contains NUL byte"),
            })?;

        // SAFETY: `c_path` is a valid NUL-terminated string for the duration
        // of the call.
        let raw = unsafe { libc::open(c_path.as_ptr(), libc::O_RDWR | libc::O_NOCTTY) };
        if raw < 0 {
            return Err(TransportError::Open {
                path,
                source: io::Error::last_os_error(),
            });
        }
        // SAFETY: `raw` is a freshly opened descriptor owned by this process.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };

        configure_tty(fd.as_raw_fd(), config, speed).map_err(|source| TransportError::Configure {
            path: path.clone(),
            source,
        })?;

        info!(?path, baud = config.baud_rate, "opened serial device");
        Ok(Self { fd, path })
    }

    /// Duplicate the handle (new file descriptor, same device).
    pub fn try_clone(&self) -> Result<Self> {
        // SAFETY: `self.fd` is an open descriptor owned by this process.
        let raw = unsafe { libc::dup(self.fd.as_raw_fd()) };
        if raw < 0 {
            return Err(TransportError::Io(io::Error::last_os_error()));
        }
        // SAFETY: `dup` returned a fresh descriptor we now own.
        let fd = unsafe { OwnedFd::from_raw_fd(raw) };
        Ok(Self {
            fd,
            path: self.path.clone(),
        })
    }

    /// Device path this stream was opened from.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Read for SerialStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // SAFETY: `buf` is a valid writable region of `buf.len()` bytes.
        let n = unsafe {
            libc::read(
                self.fd.as_raw_fd(),
                buf.as_mut_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }
}

impl Write for SerialStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        // SAFETY: `buf` is a valid readable region of `buf.len()` bytes.
        let n = unsafe {
            libc::write(
                self.fd.as_raw_fd(),
                buf.as_ptr().cast::<libc::c_void>(),
                buf.len(),
            )
        };
        if n < 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(n as usize)
    }

    fn flush(&mut self) -> io::Result<()> {
        // SAFETY: `self.fd` is an open tty descriptor.
        let rc = unsafe { libc::tcdrain(self.fd.as_raw_fd()) };
        if rc != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }
}

impl std::fmt::Debug for SerialStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialStream")
            .field("path", &self.path)
            .finish()
    }
}

fn configure_tty(fd: RawFd, config: &SerialConfig, speed: libc::speed_t) -> io::Result<()> {
    // SAFETY: zeroed termios is a valid initial value for tcgetattr to fill.
    let mut tio: libc::termios = unsafe { std::mem::zeroed() };

    // SAFETY: `fd` is open and `tio` is a valid writable termios.
    if unsafe { libc::tcgetattr(fd, &mut tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // SAFETY: `tio` is a valid termios obtained from tcgetattr.
    unsafe {
        libc::cfmakeraw(&mut tio);
        libc::cfsetispeed(&mut tio, speed);
        libc::cfsetospeed(&mut tio, speed);
    }

    tio.c_cflag |= libc::CLOCAL | libc::CREAD;

    tio.c_cflag &= !libc::CSIZE;
    tio.c_cflag |= match config.data_bits {
        DataBits::Seven => libc::CS7,
        DataBits::Eight => libc::CS8,
    };

    match config.parity {
        Parity::None => tio.c_cflag &= !(libc::PARENB | libc::PARODD),
        Parity::Even => {
            tio.c_cflag |= libc::PARENB;
            tio.c_cflag &= !libc::PARODD;
        }
        Parity::Odd => tio.c_cflag |= libc::PARENB | libc::PARODD,
    }

    match config.stop_bits {
        StopBits::One => tio.c_cflag &= !libc::CSTOPB,
        StopBits::Two => tio.c_cflag |= libc::CSTOPB,
    }

    // Timed reads: return whatever arrived within the window, or nothing.
    tio.c_cc[libc::VMIN] = 0;
    tio.c_cc[libc::VTIME] = config.read_timeout_ds as libc::cc_t;

    // SAFETY: `fd` is open and `tio` holds the fully populated settings.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(io::Error::last_os_error());
    }

    // Drop anything the device queued before we were listening.
    // SAFETY: `fd` is an open tty descriptor.
    if unsafe { libc::tcflush(fd, libc::TCIOFLUSH) } != 0 {
        return Err(io::Error::last_os_error());
    }

    debug!("serial device configured");
    Ok(())
}

fn baud_to_speed(baud: u32) -> Result<libc::speed_t> {
    let speed = match baud {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        other => return Err(TransportError::UnsupportedBaudRate(other)),
    };
    Ok(speed)
}
