//! # XSTOOLs API
//!
//! Bindings to the vendor-supplied XSTOOLs API library that talks to XESS FPGA boards over USB.
//! The library exposes six entry points, three for word-addressable memories and three for
//! generic devices-under-test (DUTs). This crate loads them at runtime and wraps them in safe
//! methods on [`Api`].

#![deny(clippy::all)]
#![warn(clippy::pedantic)]

use libloading::Library;
use std::{
    ffi::{
        c_uchar,
        c_uint,
        c_ulonglong,
        c_void,
        OsString,
    },
    path::{
        Path,
        PathBuf,
    },
    ptr::NonNull,
};
use tracing::{
    debug,
    trace,
    warn,
};

/// The environment variable that overrides the location of the vendor library
pub const LIBRARY_ENV: &str = "XSTOOLS_API";

/// The base name of the vendor library, decorated per platform by [`default_library`]
pub const LIBRARY_NAME: &str = "XstoolsApi";

type InitFn = unsafe extern "C" fn(c_uint, c_uint, *mut c_uint, *mut c_uint) -> *mut c_void;
type MemWriteFn = unsafe extern "C" fn(*mut c_void, c_uint, *const c_ulonglong, c_uint);
type MemReadFn = unsafe extern "C" fn(*mut c_void, c_uint, *mut c_ulonglong, c_uint);
type DutWriteFn = unsafe extern "C" fn(*mut c_void, *const c_uchar, c_uint);
type DutReadFn = unsafe extern "C" fn(*mut c_void, *mut c_uchar, c_uint);

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Failed to load the XSTOOLs API library `{}`", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: libloading::Error,
    },
    #[error("The XSTOOLs API library is missing the `{name}` entry point")]
    Symbol {
        name: &'static str,
        #[source]
        source: libloading::Error,
    },
    #[error("{kind} module {module} on USB port {usb} returned a null handle")]
    NullHandle {
        kind: Kind,
        usb: u32,
        module: u32,
    },
    #[error("{0} is too large to pass to the driver")]
    TooLarge(usize),
}

/// The two kinds of modules the driver knows how to open
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Kind {
    Memory,
    Dut,
}

impl std::fmt::Display for Kind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Kind::Memory => "Memory",
                Kind::Dut => "DUT",
            }
        )
    }
}

/// An opaque session handle returned by one of the driver's `Init` calls. Never null.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Handle(NonNull<c_void>);

impl Handle {
    fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// A module opened by the driver, along with the two widths it reported
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Opened {
    pub handle: Handle,
    /// Address width for memories, number of inputs for DUTs
    pub first: u32,
    /// Data width for memories, number of outputs for DUTs
    pub second: u32,
}

/// The platform-specific file name of the vendor library
#[must_use]
pub fn default_library() -> OsString {
    libloading::library_filename(LIBRARY_NAME)
}

fn to_uint(n: usize) -> Result<c_uint, Error> {
    c_uint::try_from(n).map_err(|_| Error::TooLarge(n))
}

/// The loaded vendor library and its six entry points
#[derive(Debug)]
pub struct Api {
    path: PathBuf,
    mem_init: InitFn,
    mem_write: MemWriteFn,
    mem_read: MemReadFn,
    dut_init: InitFn,
    dut_write: DutWriteFn,
    dut_read: DutReadFn,
    // Must outlive every function pointer above
    _library: Library,
}

impl Api {
    /// Load the vendor library from `path` and resolve all six entry points
    /// # Errors
    /// Returns an error if the library can't be loaded or an entry point is missing
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref().to_path_buf();
        // Safety: loading the library runs its initializers. We trust the vendor library.
        let library = unsafe { Library::new(&path) }.map_err(|source| Error::Load {
            path: path.clone(),
            source,
        })?;
        debug!(path = %path.display(), "Loaded XSTOOLs API library");

        macro_rules! symbol {
            ($ty:ty, $name:literal) => {
                // Safety: the signatures above match the vendor's C prototypes
                *unsafe { library.get::<$ty>(concat!($name, "\0").as_bytes()) }.map_err(
                    |source| Error::Symbol {
                        name: $name,
                        source,
                    },
                )?
            };
        }

        let mem_init = symbol!(InitFn, "XsMemInit");
        let mem_write = symbol!(MemWriteFn, "XsMemWrite");
        let mem_read = symbol!(MemReadFn, "XsMemRead");
        let dut_init = symbol!(InitFn, "XsDutInit");
        let dut_write = symbol!(DutWriteFn, "XsDutWrite");
        let dut_read = symbol!(DutReadFn, "XsDutRead");

        Ok(Self {
            path,
            mem_init,
            mem_write,
            mem_read,
            dut_init,
            dut_write,
            dut_read,
            _library: library,
        })
    }

    /// Load the vendor library named by the `XSTOOLS_API` environment variable, falling back to
    /// [`default_library`] on the usual search path
    /// # Errors
    /// Returns an error if the library can't be loaded or an entry point is missing
    pub fn from_env() -> Result<Self, Error> {
        let path = std::env::var_os(LIBRARY_ENV).unwrap_or_else(default_library);
        Self::load(path)
    }

    /// The path the library was loaded from
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn init(&self, kind: Kind, usb: u32, module: u32) -> Result<Opened, Error> {
        let f = match kind {
            Kind::Memory => self.mem_init,
            Kind::Dut => self.dut_init,
        };
        let mut first: c_uint = 0;
        let mut second: c_uint = 0;
        // Safety: both out-pointers are valid for the duration of the call
        let raw = unsafe { f(usb, module, &mut first, &mut second) };
        let Some(ptr) = NonNull::new(raw) else {
            warn!(%kind, usb, module, "Driver returned a null handle");
            return Err(Error::NullHandle { kind, usb, module });
        };
        debug!(%kind, usb, module, first, second, "Opened module");
        Ok(Opened {
            handle: Handle(ptr),
            first,
            second,
        })
    }

    /// Open the memory module `module` on USB port `usb`, returning its address and data widths
    /// # Errors
    /// Returns [`Error::NullHandle`] if the module isn't available
    pub fn mem_init(&self, usb: u32, module: u32) -> Result<Opened, Error> {
        self.init(Kind::Memory, usb, module)
    }

    /// Write `data` to consecutive words starting at `addr`
    /// # Errors
    /// Returns an error if `addr` or the length of `data` doesn't fit the driver's integer width
    pub fn mem_write(&self, handle: Handle, addr: usize, data: &[u64]) -> Result<(), Error> {
        let n = to_uint(data.len())?;
        let addr_c = to_uint(addr)?;
        trace!(addr, n, "XsMemWrite");
        // Safety: the handle came from a successful init and `data` holds `n` words
        unsafe { (self.mem_write)(handle.as_ptr(), addr_c, data.as_ptr(), n) };
        Ok(())
    }

    /// Fill `data` with consecutive words starting at `addr`
    /// # Errors
    /// Returns an error if `addr` or the length of `data` doesn't fit the driver's integer width
    pub fn mem_read(&self, handle: Handle, addr: usize, data: &mut [u64]) -> Result<(), Error> {
        let n = to_uint(data.len())?;
        let addr_c = to_uint(addr)?;
        trace!(addr, n, "XsMemRead");
        // Safety: the handle came from a successful init and `data` has room for `n` words
        unsafe { (self.mem_read)(handle.as_ptr(), addr_c, data.as_mut_ptr(), n) };
        Ok(())
    }

    /// Open the DUT module `module` on USB port `usb`, returning its input and output counts
    /// # Errors
    /// Returns [`Error::NullHandle`] if the module isn't available
    pub fn dut_init(&self, usb: u32, module: u32) -> Result<Opened, Error> {
        self.init(Kind::Dut, usb, module)
    }

    /// Drive the DUT inputs with `lines` (one byte per input, index 0 is the LSB)
    /// # Errors
    /// Returns an error if the length of `lines` doesn't fit the driver's integer width
    pub fn dut_write(&self, handle: Handle, lines: &[u8]) -> Result<(), Error> {
        let n = to_uint(lines.len())?;
        trace!(n, "XsDutWrite");
        // Safety: the handle came from a successful init and `lines` holds `n` bytes
        unsafe { (self.dut_write)(handle.as_ptr(), lines.as_ptr(), n) };
        Ok(())
    }

    /// Sample the DUT outputs into `lines` (one byte per output, index 0 is the LSB)
    /// # Errors
    /// Returns an error if the length of `lines` doesn't fit the driver's integer width
    pub fn dut_read(&self, handle: Handle, lines: &mut [u8]) -> Result<(), Error> {
        let n = to_uint(lines.len())?;
        trace!(n, "XsDutRead");
        // Safety: the handle came from a successful init and `lines` has room for `n` bytes
        unsafe { (self.dut_read)(handle.as_ptr(), lines.as_mut_ptr(), n) };
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_library_name() {
        let name = default_library().into_string().unwrap();
        assert!(name.contains(LIBRARY_NAME));
    }

    #[test]
    fn test_missing_library() {
        let err = Api::load("/nonexistent/libXstoolsApi.so").unwrap_err();
        assert!(matches!(err, Error::Load { .. }));
        assert!(err.to_string().contains("/nonexistent/libXstoolsApi.so"));
    }

    #[test]
    fn test_to_uint() {
        assert_eq!(to_uint(1024).unwrap(), 1024);
        #[cfg(target_pointer_width = "64")]
        assert!(matches!(to_uint(usize::MAX), Err(Error::TooLarge(_))));
    }

    #[test]
    fn test_null_handle_message() {
        let err = Error::NullHandle {
            kind: Kind::Dut,
            usb: 0,
            module: 3,
        };
        assert_eq!(
            err.to_string(),
            "DUT module 3 on USB port 0 returned a null handle"
        );
    }
}
