//! Framebuffer device access: open, ioctl probing, scoped memory mapping.

use std::{
    fs::File,
    os::unix::io::AsRawFd,
    path::{Path, PathBuf},
};

use fbrec_types::{
    geometry::DisplayGeometry,
    pixel::{ChannelField, PixelFormat},
    FbrecError, Result,
};
use tracing::info;

use crate::capture_error;

const FBIOGET_VSCREENINFO: u64 = 0x4600;
const FBIOGET_FSCREENINFO: u64 = 0x4602;

/// `struct fb_bitfield` from linux/fb.h.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FbBitfield {
    offset: u32,
    length: u32,
    msb_right: u32,
}

/// `struct fb_var_screeninfo` from linux/fb.h.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FbVarScreeninfo {
    xres: u32,
    yres: u32,
    xres_virtual: u32,
    yres_virtual: u32,
    xoffset: u32,
    yoffset: u32,
    bits_per_pixel: u32,
    grayscale: u32,
    red: FbBitfield,
    green: FbBitfield,
    blue: FbBitfield,
    transp: FbBitfield,
    nonstd: u32,
    activate: u32,
    height: u32,
    width: u32,
    accel_flags: u32,
    pixclock: u32,
    left_margin: u32,
    right_margin: u32,
    upper_margin: u32,
    lower_margin: u32,
    hsync_len: u32,
    vsync_len: u32,
    sync: u32,
    vmode: u32,
    rotate: u32,
    colorspace: u32,
    reserved: [u32; 4],
}

/// `struct fb_fix_screeninfo` from linux/fb.h.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default)]
struct FbFixScreeninfo {
    id: [u8; 16],
    smem_start: libc::c_ulong,
    smem_len: u32,
    type_: u32,
    type_aux: u32,
    visual: u32,
    xpanstep: u16,
    ypanstep: u16,
    ywrapstep: u16,
    line_length: u32,
    mmio_start: libc::c_ulong,
    mmio_len: u32,
    accel: u32,
    capabilities: u16,
    reserved: [u16; 2],
}

/// An opened framebuffer device. The descriptor is held for the process
/// lifetime: probed once at startup, memory-mapped once per tick.
pub struct FramebufferDevice {
    file: File,
    path: PathBuf,
}

impl FramebufferDevice {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();
        let file = File::open(path_ref)
            .map_err(|err| FbrecError::DeviceOpen(format!("{}: {err}", path_ref.display())))?;
        Ok(Self {
            file,
            path: path_ref.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Query fixed and variable screen info. Both results are immutable for
    /// the rest of the run.
    pub fn probe(&self) -> Result<(DisplayGeometry, PixelFormat)> {
        let fd = self.file.as_raw_fd();
        let mut var = FbVarScreeninfo::default();
        let mut fix = FbFixScreeninfo::default();
        // SAFETY: both structs are #[repr(C)] images of the kernel ABI and
        // outlive the ioctl calls.
        let failed = unsafe {
            libc::ioctl(fd, FBIOGET_VSCREENINFO as _, &mut var) != 0
                || libc::ioctl(fd, FBIOGET_FSCREENINFO as _, &mut fix) != 0
        };
        if failed {
            return Err(FbrecError::DeviceQuery(format!(
                "{}: {}",
                self.path.display(),
                std::io::Error::last_os_error()
            )));
        }
        if var.bits_per_pixel != 32 {
            return Err(FbrecError::DeviceQuery(format!(
                "{} reports {} bits per pixel, only 32 is supported",
                self.path.display(),
                var.bits_per_pixel
            )));
        }

        let geometry = DisplayGeometry {
            width: var.xres,
            height: var.yres,
            line_length: fix.line_length,
            x_offset: var.xoffset,
            y_offset: var.yoffset,
        };
        geometry.validate()?;
        let format = PixelFormat {
            red: ChannelField::new(var.red.offset, var.red.length),
            green: ChannelField::new(var.green.offset, var.green.length),
            blue: ChannelField::new(var.blue.offset, var.blue.length),
            transp: ChannelField::new(var.transp.offset, var.transp.length),
        };
        format.validate()?;
        info!(
            "framebuffer {}: {}x{} @ 32bpp, line length {}, pan offset ({}, {})",
            self.path.display(),
            geometry.width,
            geometry.height,
            geometry.line_length,
            geometry.x_offset,
            geometry.y_offset
        );
        Ok((geometry, format))
    }

    /// Map the pixel region read-only for the duration of one tick.
    pub fn map(&self, length: usize) -> Result<MappedRegion<'_>> {
        MappedRegion::new(&self.file, length)
    }
}

/// Scoped read-only shared mapping of the device's pixel memory, released on
/// drop no matter how the tick ends.
pub struct MappedRegion<'a> {
    ptr: *mut libc::c_void,
    length: usize,
    _device: &'a File,
}

impl<'a> MappedRegion<'a> {
    fn new(file: &'a File, length: usize) -> Result<Self> {
        if length == 0 {
            return Err(capture_error("cannot map an empty region"));
        }
        // SAFETY: read-only shared mapping; on success the pointer is valid
        // for `length` bytes until munmap in drop.
        let ptr = unsafe {
            libc::mmap(
                std::ptr::null_mut(),
                length,
                libc::PROT_READ,
                libc::MAP_SHARED,
                file.as_raw_fd(),
                0,
            )
        };
        if ptr == libc::MAP_FAILED {
            return Err(capture_error(format!(
                "mmap of {length} bytes failed: {}",
                std::io::Error::last_os_error()
            )));
        }
        Ok(Self {
            ptr,
            length,
            _device: file,
        })
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        // SAFETY: the mapping stays valid for `length` bytes until drop.
        unsafe { std::slice::from_raw_parts(self.ptr as *const u8, self.length) }
    }
}

impl Drop for MappedRegion<'_> {
    fn drop(&mut self) {
        // SAFETY: ptr/length came from a successful mmap.
        unsafe {
            libc::munmap(self.ptr, self.length);
        }
    }
}
