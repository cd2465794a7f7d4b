//! C FFI: lets native hosts drive a render without linking a Rust toolchain.
//!
//! Functions are `#[no_mangle] extern "C"` and take UTF-8 paths.
//!
//! ## Memory contract
//!
//! | Function                          | Caller frees with           |
//! |-----------------------------------|-----------------------------|
//! | [`stitchcast_render_manifest`]    | [`stitchcast_free_string`]  |
//! | [`stitchcast_verify_file`]        | [`stitchcast_free_string`]  |

use std::ffi::{CStr, CString, c_char};
use std::path::Path;

use crate::manifest::{render, RenderManifest};
use crate::verify::verify_mp3;

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// Convert a non-null `*const c_char` to an owned `String`.
/// Returns `None` if `ptr` is null.  Invalid UTF-8 is replaced lossily.
unsafe fn cstr_to_string(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
}

/// Heap-allocate an owned C string.  Returns null on interior nul bytes.
fn to_c_str(s: &str) -> *const c_char {
    match CString::new(s) {
        Ok(cs) => cs.into_raw(),
        Err(_) => std::ptr::null(),
    }
}

// ─── Public API ──────────────────────────────────────────────────────────────

/// Render a manifest to an MP3 file and verify the result.
///
/// @param manifest_path  UTF-8 path to the JSON render manifest.
/// @param output_path    Writable path for the output `.mp3`.
/// @return               `NULL` on success; on failure (including a failed
///                       format check) a heap-allocated UTF-8 message that the
///                       caller must release with [`stitchcast_free_string`].
#[no_mangle]
pub unsafe extern "C" fn stitchcast_render_manifest(
    manifest_path: *const c_char,
    output_path: *const c_char,
) -> *const c_char {
    let (Some(manifest), Some(out)) = (
        unsafe { cstr_to_string(manifest_path) },
        unsafe { cstr_to_string(output_path) },
    ) else {
        return to_c_str("null argument (manifest_path or output_path)");
    };

    let manifest = match RenderManifest::load(Path::new(&manifest)) {
        Ok(m) => m,
        Err(e) => return to_c_str(&format!("{e:#}")),
    };

    match render(&manifest, Path::new(&out), true) {
        Ok(rendered) => match rendered.verification {
            Some(v) if !v.passed => to_c_str(&format!("verification failed: {}", v.issues.join("; "))),
            _ => std::ptr::null(),
        },
        Err(e) => to_c_str(&format!("{e:#}")),
    }
}

/// Verify an MP3 file.
///
/// Example return value: `{"passed":false,"issues":["ID3v1 tag present at end of file"]}`
///
/// @param path  UTF-8 path to the `.mp3` file.
/// @return      Heap-allocated UTF-8 JSON string, or `NULL` if the file cannot
///              be read.  Free with [`stitchcast_free_string`].
#[no_mangle]
pub unsafe extern "C" fn stitchcast_verify_file(path: *const c_char) -> *const c_char {
    let Some(path) = (unsafe { cstr_to_string(path) }) else {
        return std::ptr::null();
    };
    let data = match std::fs::read(&path) {
        Ok(d) => d,
        Err(e) => {
            tracing::error!("cannot read {path}: {e}");
            return std::ptr::null();
        }
    };
    match serde_json::to_string(&verify_mp3(&data)) {
        Ok(json) => to_c_str(&json),
        Err(_) => std::ptr::null(),
    }
}

/// Free a string returned by any `stitchcast_*` function.
#[no_mangle]
pub unsafe extern "C" fn stitchcast_free_string(s: *const c_char) {
    if !s.is_null() {
        drop(unsafe { CString::from_raw(s as *mut c_char) });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn owned(ptr: *const c_char) -> Option<String> {
        let s = unsafe { cstr_to_string(ptr) };
        unsafe { stitchcast_free_string(ptr) };
        s
    }

    #[test]
    fn test_null_arguments() {
        let err = unsafe { stitchcast_render_manifest(std::ptr::null(), std::ptr::null()) };
        assert!(owned(err).unwrap().contains("null argument"));
        assert!(unsafe { stitchcast_verify_file(std::ptr::null()) }.is_null());
    }

    #[test]
    fn test_missing_manifest_reports_error() {
        let manifest = CString::new("/nonexistent/stitchcast/manifest.json").unwrap();
        let out = CString::new("/tmp/never.mp3").unwrap();
        let err = unsafe { stitchcast_render_manifest(manifest.as_ptr(), out.as_ptr()) };
        assert!(owned(err).unwrap().contains("manifest.json"));
    }

    #[test]
    fn test_verify_file_json() {
        let path = std::env::temp_dir().join(format!("stitchcast-ffi-{}.mp3", std::process::id()));
        let mut data = vec![0xFF, 0xFB, 0x90, 0xC0];
        data.extend([0u8; 100]);
        std::fs::write(&path, &data).unwrap();

        let c_path = CString::new(path.to_string_lossy().into_owned()).unwrap();
        let json = owned(unsafe { stitchcast_verify_file(c_path.as_ptr()) }).unwrap();
        assert_eq!(json, r#"{"passed":true,"issues":[]}"#);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_free_null_is_noop() {
        unsafe { stitchcast_free_string(std::ptr::null()) };
    }
}
