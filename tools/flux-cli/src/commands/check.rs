//! Check for the external tools the CLI relies on.

use flux_scene_detect::backend::ffmpeg::command_exists;

pub fn run() -> anyhow::Result<()> {
    println!("Flux System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffprobe", "reads video duration and frame size"),
        ("ffmpeg", "decodes frames for scene detection"),
    ];

    let mut all_ok = true;
    for (binary, purpose) in tools {
        if command_exists(binary) {
            println!("[OK]   {binary}: {purpose}");
        } else {
            all_ok = false;
            println!("[MISS] {binary}: {purpose}");
        }
    }

    println!();
    if all_ok {
        println!("All tools are available. `flux detect` is ready.");
    } else {
        println!("Install ffmpeg (which ships ffprobe) to enable `flux detect`.");
        println!("Watermark and background removal work without it.");
    }

    Ok(())
}
