pub mod check;
pub mod detect;
pub mod erase_watermark;
pub mod remove_bg;

use std::path::{Path, PathBuf};

/// `<dir>/<stem>-<suffix>.png`, where `dir` defaults to the input's parent.
pub(crate) fn derived_png_path(input: &Path, dir: Option<&Path>, suffix: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let dir = dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_default();
    dir.join(format!("{stem}-{suffix}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_path_defaults_to_input_dir() {
        let path = derived_png_path(Path::new("/tmp/pages/p1.jpg"), None, "clean");
        assert_eq!(path, PathBuf::from("/tmp/pages/p1-clean.png"));

        let path = derived_png_path(Path::new("p1.png"), Some(Path::new("out")), "clean");
        assert_eq!(path, PathBuf::from("out/p1-clean.png"));
    }
}
