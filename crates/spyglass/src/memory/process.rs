//! Live process transport (Windows).
//!
//! Opens a target process by name or PID and serves reads through
//! `ReadProcessMemory`. Live reads are always fresh, so the `use_cache`
//! hint is ignored here; caching transports sit behind the same trait.

use core::ffi::c_void;

use tracing::debug;

use windows::Win32::Foundation::{CloseHandle, HANDLE};
use windows::Win32::System::Diagnostics::Debug::ReadProcessMemory;
use windows::Win32::System::Diagnostics::ToolHelp::{
    CreateToolhelp32Snapshot, MODULEENTRY32W, Module32FirstW, PROCESSENTRY32W, Process32FirstW,
    Process32NextW, TH32CS_SNAPMODULE, TH32CS_SNAPMODULE32, TH32CS_SNAPPROCESS,
};
use windows::Win32::System::Threading::{
    OpenProcess, PROCESS_QUERY_INFORMATION, PROCESS_VM_READ,
};

use crate::error::{Error, Result};
use crate::memory::ReadMemory;

/// Read-only handle to a running process.
pub struct ProcessHandle {
    handle: HANDLE,
    pub pid: u32,
    pub name: String,
    /// Base address of the process's main module.
    pub base_address: u64,
    /// Size of the main module in bytes.
    pub module_size: u64,
}

fn utf16_to_string(buf: &[u16]) -> String {
    let len = buf.iter().position(|&c| c == 0).unwrap_or(buf.len());
    String::from_utf16_lossy(&buf[..len])
}

fn find_pid_by_name(name: &str) -> Result<u32> {
    // SAFETY: Toolhelp snapshot of the process list; the handle is closed
    // before returning on every path.
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPPROCESS, 0)
            .map_err(|e| Error::ProcessNotFound(format!("{}: snapshot failed: {}", name, e)))?;

        let mut entry = PROCESSENTRY32W {
            dwSize: size_of::<PROCESSENTRY32W>() as u32,
            ..Default::default()
        };

        let mut result = Process32FirstW(snapshot, &mut entry);
        while result.is_ok() {
            if utf16_to_string(&entry.szExeFile).eq_ignore_ascii_case(name) {
                let pid = entry.th32ProcessID;
                let _ = CloseHandle(snapshot);
                return Ok(pid);
            }
            result = Process32NextW(snapshot, &mut entry);
        }

        let _ = CloseHandle(snapshot);
        Err(Error::ProcessNotFound(name.to_string()))
    }
}

fn find_main_module(pid: u32) -> Result<(u64, u64)> {
    // SAFETY: Toolhelp module snapshot; the first module of a process is
    // its main executable image.
    unsafe {
        let snapshot = CreateToolhelp32Snapshot(TH32CS_SNAPMODULE | TH32CS_SNAPMODULE32, pid)
            .map_err(|e| Error::ProcessOpenFailed(format!("module snapshot failed: {}", e)))?;

        let mut entry = MODULEENTRY32W {
            dwSize: size_of::<MODULEENTRY32W>() as u32,
            ..Default::default()
        };

        let result = Module32FirstW(snapshot, &mut entry);
        let _ = CloseHandle(snapshot);
        result
            .map_err(|e| Error::ProcessOpenFailed(format!("module enumeration failed: {}", e)))?;

        Ok((entry.modBaseAddr as u64, entry.modBaseSize as u64))
    }
}

impl ProcessHandle {
    /// Find a process by executable name and open it for reading.
    pub fn find_and_open(name: &str) -> Result<Self> {
        let pid = find_pid_by_name(name)?;
        Self::open(pid, name)
    }

    /// Open a process by PID for reading.
    pub fn open(pid: u32, name: &str) -> Result<Self> {
        // SAFETY: OpenProcess with read-only access rights; the handle is
        // owned by the returned value and closed on drop.
        let handle = unsafe {
            OpenProcess(PROCESS_QUERY_INFORMATION | PROCESS_VM_READ, false, pid)
                .map_err(|e| Error::ProcessOpenFailed(format!("pid {}: {}", pid, e)))?
        };

        let (base_address, module_size) = find_main_module(pid)?;
        debug!(
            "Opened process {} (pid {}, base {:#x}, module size {:#x})",
            name, pid, base_address, module_size
        );

        Ok(Self {
            handle,
            pid,
            name: name.to_string(),
            base_address,
            module_size,
        })
    }

    /// Cheap liveness probe: the process is gone once its image base is
    /// no longer readable.
    pub fn is_alive(&self) -> bool {
        let mut probe = [0u8; 4];
        self.read_buf(self.base_address, &mut probe, false).is_ok()
    }
}

impl Drop for ProcessHandle {
    fn drop(&mut self) {
        // SAFETY: handle was opened by us and is closed exactly once.
        unsafe {
            let _ = CloseHandle(self.handle);
        }
    }
}

impl ReadMemory for ProcessHandle {
    fn read_buf(&self, address: u64, buf: &mut [u8], _use_cache: bool) -> Result<()> {
        let mut bytes_read = 0usize;
        // SAFETY: destination pointer and length come from a live slice;
        // the handle has PROCESS_VM_READ access.
        unsafe {
            ReadProcessMemory(
                self.handle,
                address as *const c_void,
                buf.as_mut_ptr() as *mut c_void,
                buf.len(),
                Some(&mut bytes_read),
            )
            .map_err(|e| Error::MemoryReadFailed {
                address,
                message: e.to_string(),
            })?;
        }
        if bytes_read != buf.len() {
            return Err(Error::MemoryReadFailed {
                address,
                message: format!("short read: {} of {} bytes", bytes_read, buf.len()),
            });
        }
        Ok(())
    }
}
