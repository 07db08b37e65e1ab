//! Host discovery: the native separator and the well-known directories an
//! instance exposes.

use std::path::{Path, PathBuf};

use crate::error::{map_io_error, ErrorCode, Result};

/// Separator of the host filesystem.
pub fn dir_separator() -> char {
    std::path::MAIN_SEPARATOR
}

fn with_trailing_separator(path: &Path) -> String {
    let mut out = path.to_string_lossy().into_owned();
    if !out.ends_with(dir_separator()) {
        out.push(dir_separator());
    }
    out
}

/// Directory containing the running binary, with a trailing separator.
///
/// `argv0` is the fallback when the OS cannot report the binary path.
pub fn base_dir(argv0: Option<&str>) -> Result<String> {
    if let Ok(exe) = std::env::current_exe() {
        if let Some(parent) = exe.parent() {
            return Ok(with_trailing_separator(parent));
        }
    }
    let argv0 = argv0.ok_or(ErrorCode::Argv0IsNull)?;
    match Path::new(argv0).parent() {
        Some(parent) if !parent.as_os_str().is_empty() => Ok(with_trailing_separator(parent)),
        _ => Err(ErrorCode::Argv0IsNull),
    }
}

#[cfg(unix)]
fn passwd_home() -> Option<PathBuf> {
    use std::ffi::CStr;

    let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
    let mut buf = vec![0u8; 2048];
    let mut result: *mut libc::passwd = std::ptr::null_mut();
    let rc = unsafe {
        libc::getpwuid_r(
            libc::getuid(),
            &mut pwd,
            buf.as_mut_ptr() as *mut libc::c_char,
            buf.len(),
            &mut result,
        )
    };
    if rc != 0 || result.is_null() || pwd.pw_dir.is_null() {
        return None;
    }
    let home = unsafe { CStr::from_ptr(pwd.pw_dir) };
    home.to_str().ok().map(PathBuf::from)
}

fn home_dir() -> Option<PathBuf> {
    #[cfg(unix)]
    {
        std::env::var_os("HOME").map(PathBuf::from).or_else(passwd_home)
    }
    #[cfg(not(unix))]
    {
        std::env::var_os("USERPROFILE").map(PathBuf::from)
    }
}

/// The user's home directory, with a trailing separator. Falls back to the
/// current directory when the host reports nothing.
pub fn user_dir() -> String {
    let home = home_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    with_trailing_separator(&home)
}

fn pref_root() -> Result<PathBuf> {
    #[cfg(unix)]
    {
        if let Some(data) = std::env::var_os("XDG_DATA_HOME") {
            return Ok(PathBuf::from(data));
        }
        let home = home_dir().ok_or(ErrorCode::OsError)?;
        Ok(home.join(".local").join("share"))
    }
    #[cfg(not(unix))]
    {
        std::env::var_os("APPDATA").map(PathBuf::from).ok_or(ErrorCode::OsError)
    }
}

/// Per-user, per-application writable directory, created on demand, with a
/// trailing separator.
pub async fn pref_dir(org: &str, app: &str) -> Result<String> {
    if org.is_empty() || app.is_empty() {
        return Err(ErrorCode::InvalidArgument);
    }
    let dir = pref_root()?.join(org).join(app);
    tokio::fs::create_dir_all(&dir).await.map_err(map_io_error)?;
    Ok(with_trailing_separator(&dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_dir_ends_with_separator() {
        let dir = base_dir(None).expect("test binaries have a path");
        assert!(dir.ends_with(dir_separator()));
    }

    #[test]
    fn user_dir_is_never_empty() {
        let dir = user_dir();
        assert!(!dir.is_empty());
        assert!(dir.ends_with(dir_separator()));
    }
}
