use std::env;
use std::path::Path;

fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET", "PKG_CONFIG_PATH"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    if env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    // ffmpeg-sys-next finds system installs through pkg-config everywhere
    // except Windows, where a vcpkg tree has to be pointed at explicitly.
    if env::var("CARGO_CFG_TARGET_OS").as_deref() != Ok("windows") {
        return;
    }

    let Ok(vcpkg_root) = env::var("VCPKG_ROOT") else {
        println!("cargo:warning=Set FFMPEG_DIR (or VCPKG_ROOT) so ffmpeg-sys-next can find FFmpeg.");
        return;
    };
    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = Path::new(&vcpkg_root).join("installed").join(triplet);

    if candidate.is_dir() {
        println!(
            "cargo:warning=Found FFmpeg under {0}; export FFMPEG_DIR={0} to use it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=No FFmpeg install under {}; install it with `vcpkg install ffmpeg`.",
            candidate.display()
        );
    }
}
