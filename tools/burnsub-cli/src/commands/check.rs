//! Check that the external tools are available.

use burnsub_common::config::{config_file_path, AppConfig};
use burnsub_render_engine::probe::command_exists;

pub fn run(config: &AppConfig) -> anyhow::Result<()> {
    println!("burnsub System Check");
    println!("{}", "=".repeat(50));

    let config_path = config_file_path();
    if config_path.exists() {
        println!("[OK] Config: {}", config_path.display());
    } else {
        println!("[--] Config: {} (not present, using defaults)", config_path.display());
    }

    let tools = [
        ("Encoder", &config.encoder.ffmpeg_path),
        ("Probe", &config.encoder.ffprobe_path),
    ];
    let mut all_ok = true;
    for (label, binary) in tools {
        if command_exists(binary) {
            println!("[OK] {label}: {}", binary.display());
        } else {
            println!("[MISSING] {label}: {}", binary.display());
            all_ok = false;
        }
    }

    println!();
    if all_ok {
        println!("All required tools are available. burnsub is ready.");
    } else {
        println!("Install ffmpeg (with libass) or set encoder paths in the config file.");
    }

    Ok(())
}
