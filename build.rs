//! Build script for softvdec
//!
//! With the `ffmpeg` feature enabled:
//! 1. Compiling the C accessor library via `cc`
//! 2. Linking libavcodec, libavutil and libswscale
//!
//! Without it nothing native is built; the crate then only carries the
//! engine-neutral component and the scripted engine.

use std::env;
use std::path::{Path, PathBuf};

fn main() {
  println!("cargo:rerun-if-changed=build.rs");
  println!("cargo:rerun-if-changed=src/ffi/accessors.c");
  println!("cargo:rerun-if-env-changed=FFMPEG_DIR");

  if env::var_os("CARGO_FEATURE_FFMPEG").is_none() {
    return;
  }
  let hwaccel = env::var_os("CARGO_FEATURE_HWACCEL").is_some();

  let target_os = env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
  let target_arch = env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

  let ffmpeg_dir = get_ffmpeg_dir(&target_os, &target_arch);

  compile_accessors(&ffmpeg_dir, &target_os);
  link_ffmpeg(&ffmpeg_dir.join("lib"), &target_os);
  link_platform_libraries(&target_os, hwaccel);
}

/// Get FFmpeg installation directory
fn get_ffmpeg_dir(target_os: &str, target_arch: &str) -> PathBuf {
  if let Ok(dir) = env::var("FFMPEG_DIR") {
    return PathBuf::from(dir);
  }

  #[cfg(unix)]
  {
    if let Ok(output) = std::process::Command::new("pkg-config")
      .args(["--variable=prefix", "libavcodec"])
      .output()
    {
      if output.status.success() {
        let prefix = String::from_utf8_lossy(&output.stdout);
        let path = PathBuf::from(prefix.trim());
        if path.exists() {
          return path;
        }
      }
    }
  }

  let common_paths: &[&str] = match target_os {
    "macos" => &["/opt/homebrew", "/usr/local", "/opt/local"],
    "linux" => &["/usr", "/usr/local", "/opt/ffmpeg"],
    "windows" => &["C:\\ffmpeg", "C:\\Program Files\\ffmpeg"],
    _ => &[],
  };

  for path in common_paths {
    let p = PathBuf::from(path);
    if p.join("include/libavcodec/avcodec.h").exists() {
      return p;
    }
  }

  // Prebuilt FFmpeg dropped into the project directory
  if let Some(manifest_dir) = env::var_os("CARGO_MANIFEST_DIR") {
    let platform = match (target_os, target_arch) {
      ("macos", "aarch64") => "darwin-arm64",
      ("macos", "x86_64") => "darwin-x64",
      ("linux", "x86_64") => "linux-x64",
      ("linux", "aarch64") => "linux-arm64",
      ("windows", "x86_64") => "win32-x64",
      _ => "unknown",
    };
    let bundled = PathBuf::from(manifest_dir).join("ffmpeg").join(platform);
    if bundled.exists() {
      return bundled;
    }
  }

  println!(
    "cargo:warning=FFmpeg not found. Set FFMPEG_DIR environment variable or install FFmpeg."
  );
  PathBuf::from("/usr/local")
}

/// Compile the C accessor library
fn compile_accessors(ffmpeg_dir: &Path, target_os: &str) {
  let mut build = cc::Build::new();
  build
    .file("src/ffi/accessors.c")
    .include(ffmpeg_dir.join("include"))
    .warnings(true)
    .extra_warnings(true);

  if target_os == "macos" {
    build.flag("-Wno-deprecated-declarations");
  }

  build.compile("ffmpeg_accessors");
}

/// Link the FFmpeg libraries the decoder needs
///
/// Static archives are preferred when present; otherwise the shared
/// libraries are linked from the same directory.
fn link_ffmpeg(lib_dir: &Path, target_os: &str) {
  // Dependents before dependencies
  let ffmpeg_libs = ["avcodec", "swscale", "avutil"];

  let all_static = ffmpeg_libs
    .iter()
    .all(|lib| lib_dir.join(format!("lib{}.a", lib)).exists());

  if !all_static {
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    for lib in &ffmpeg_libs {
      println!("cargo:rustc-link-lib=dylib={}", lib);
    }
    return;
  }

  for lib in &ffmpeg_libs {
    let static_lib = lib_dir.join(format!("lib{}.a", lib));
    println!("cargo:rustc-link-arg={}", static_lib.display());
  }

  // Decoder libraries a static libavcodec may have been configured with
  let codec_lib_paths = get_codec_library_paths(target_os);
  let codec_libs = ["dav1d", "vpx", "aom", "zimg"];
  for lib in &codec_libs {
    if let Some(path) = find_static_lib_path(lib, &codec_lib_paths) {
      println!("cargo:rustc-link-arg={}", path.display());
    }
  }
}

/// Get codec library search paths
fn get_codec_library_paths(target_os: &str) -> Vec<PathBuf> {
  let mut paths = Vec::new();

  if let Ok(lib_path) = env::var("LIBRARY_PATH") {
    paths.extend(lib_path.split(':').map(PathBuf::from));
  }

  match target_os {
    "macos" => {
      paths.push(PathBuf::from("/opt/homebrew/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
    }
    "linux" => {
      paths.push(PathBuf::from("/usr/lib"));
      paths.push(PathBuf::from("/usr/local/lib"));
      paths.push(PathBuf::from("/usr/lib/x86_64-linux-gnu"));
      paths.push(PathBuf::from("/usr/lib/aarch64-linux-gnu"));
    }
    _ => {}
  }

  if let Ok(ffmpeg_dir) = env::var("FFMPEG_DIR") {
    paths.push(PathBuf::from(ffmpeg_dir).join("lib"));
  }

  paths
}

/// Find static library path if it exists
fn find_static_lib_path(name: &str, paths: &[PathBuf]) -> Option<PathBuf> {
  let static_name = format!("lib{}.a", name);
  paths
    .iter()
    .map(|path| path.join(&static_name))
    .find(|full_path| full_path.exists())
}

/// Link platform-specific system libraries
fn link_platform_libraries(target_os: &str, hwaccel: bool) {
  match target_os {
    "macos" => {
      let frameworks = ["CoreFoundation", "CoreVideo", "CoreMedia", "Security"];
      for framework in &frameworks {
        println!("cargo:rustc-link-lib=framework={}", framework);
      }
      if hwaccel {
        println!("cargo:rustc-link-lib=framework=VideoToolbox");
      }
      println!("cargo:rustc-link-lib=iconv");
    }

    "linux" => {
      println!("cargo:rustc-link-lib=m");
      println!("cargo:rustc-link-lib=pthread");
      println!("cargo:rustc-link-lib=dl");

      if hwaccel {
        println!("cargo:rustc-link-lib=va");
        println!("cargo:rustc-link-lib=va-drm");
      }
    }

    "windows" => {
      let libs = ["bcrypt", "ole32", "user32", "advapi32"];
      for lib in &libs {
        println!("cargo:rustc-link-lib={}", lib);
      }
    }

    _ => {
      println!("cargo:warning=Unknown target OS: {}", target_os);
    }
  }
}
